//! Append-only record of played moves

use crate::moves::Move;
use crate::types::Coord;

use std::fmt::Write;
use std::slice;

/// Ordered sequence of moves played in the game
///
/// The history can only grow: there is no API to remove or reorder moves. Castling rights and
/// enpassant are derived from it, so it must never be rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MoveHistory(Vec<Move>);

impl MoveHistory {
    #[inline]
    pub fn new() -> MoveHistory {
        MoveHistory(Vec::new())
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        self.0.push(mv);
    }

    /// Returns the most recent move
    #[inline]
    pub fn last(&self) -> Option<&Move> {
        self.0.last()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Move> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.0
    }

    /// Returns `true` if any move in the history started from square `c`
    pub fn has_moved_from(&self, c: Coord) -> bool {
        self.0.iter().any(|mv| mv.src() == c)
    }

    /// Renders all the moves in UCI notation, each followed by a single space
    ///
    /// # Example
    ///
    /// ```
    /// # use duelchess::{Board, Move, MoveHistory};
    /// let b = Board::initial();
    /// let mut h = MoveHistory::new();
    /// h.push(Move::from_uci("e2e4", &b).unwrap());
    /// assert_eq!(h.uci_list(), "e2e4 ");
    /// ```
    pub fn uci_list(&self) -> String {
        let mut res = String::with_capacity(self.0.len() * 5);
        for mv in &self.0 {
            // Writing into a `String` never fails
            let _ = write!(res, "{} ", mv);
        }
        res
    }
}

impl<'a> IntoIterator for &'a MoveHistory {
    type Item = &'a Move;
    type IntoIter = slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
