//! # Base types for duelchess
//!
//! This is an auxiliary crate for `duelchess`, which contains the plain value types: squares,
//! pieces, sprite-encoded cells and square sets.
//!
//! Normally you don't want to use this crate directly. Use `duelchess` instead.

pub mod bitboard;
pub mod geometry;
pub mod types;
