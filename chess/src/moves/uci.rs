//! Utilities to work with moves in UCI format

use super::base;
use crate::board::Board;
use crate::types::{Coord, CoordParseError};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error creating a parsed UCI representation from string
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawParseError {
    /// Bad string length
    ///
    /// Only four-character moves are accepted, so promotion suffixes end up here as well.
    #[error("bad string length")]
    BadLength,
    /// Bad source square
    #[error("bad source: {0}")]
    BadSrc(CoordParseError),
    /// Bad destination square
    #[error("bad destination: {0}")]
    BadDst(CoordParseError),
}

/// Error converting the parsed UCI move into a [`moves::Move`](super::Move)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CreateError {
    /// There is no piece on the source square
    #[error("source square {0} is empty")]
    EmptySource(Coord),
}

/// Error parsing UCI into a [`moves::Move`](super::Move)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseError {
    /// Error parsing move
    #[error("cannot parse move: {0}")]
    Parse(#[from] RawParseError),
    /// Error converting the parsed move into a move
    #[error("cannot create move: {0}")]
    Create(#[from] CreateError),
}

/// Parsed move in UCI format
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Move {
    /// Source square
    pub src: Coord,
    /// Destination square
    pub dst: Coord,
}

impl Move {
    /// Converts the UCI move into [`moves::Move`](super::Move), taking the moved piece from `b`
    pub fn into_move(self, b: &Board) -> Result<base::Move, CreateError> {
        if b.get(self.src).is_empty() {
            return Err(CreateError::EmptySource(self.src));
        }
        Ok(base::Move::from_board(b, self.src, self.dst))
    }
}

impl From<base::Move> for Move {
    #[inline]
    fn from(mv: base::Move) -> Move {
        mv.uci()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.src, self.dst)
    }
}

impl FromStr for Move {
    type Err = RawParseError;

    fn from_str(s: &str) -> Result<Move, Self::Err> {
        if s.len() != 4 || !s.is_ascii() {
            return Err(RawParseError::BadLength);
        }
        let src = Coord::from_str(&s[0..2]).map_err(RawParseError::BadSrc)?;
        let dst = Coord::from_str(&s[2..4]).map_err(RawParseError::BadDst)?;
        Ok(Move { src, dst })
    }
}
