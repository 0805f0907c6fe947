//! Game session: the authoritative board together with its move history

use crate::board::Board;
use crate::history::MoveHistory;
use crate::movegen::{self, DestList};
use crate::moves::{self, Move};
use crate::types::{Color, Coord, Outcome};
use crate::{attack, legal};

use thiserror::Error;

/// Error returned when a requested move is rejected
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum IllegalMoveError {
    /// There is no piece on the source square
    #[error("no piece on {0}")]
    EmptySource(Coord),
    /// The piece on the source square belongs to the side which is not to move
    #[error("piece on {coord} belongs to {color}, but it is not their turn")]
    NotYourTurn { coord: Coord, color: Color },
    /// The destination is not among the legal destinations of the piece
    #[error("piece on {src} cannot legally move to {dst}")]
    Unreachable { src: Coord, dst: Coord },
}

/// State of a single game
///
/// Apart from the board and the move history, the session remembers the currently selected square
/// together with its legal destinations, so they can be displayed by a front end.
///
/// Cloning the session is deep: the clone shares nothing with the original. Hypothetical moves
/// used by legality checks are always played on such clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    board: Board,
    history: MoveHistory,
    selected: Option<Coord>,
    available: DestList,
}

impl GameSession {
    /// Creates a session with the initial position and empty history
    pub fn new() -> GameSession {
        GameSession::from_board(Board::initial())
    }

    /// Creates a session from an arbitrary position with empty history
    ///
    /// White moves first regardless of the position.
    pub fn from_board(board: Board) -> GameSession {
        GameSession {
            board,
            history: MoveHistory::new(),
            selected: None,
            available: DestList::new(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[inline]
    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    #[inline]
    pub(crate) fn history_mut(&mut self) -> &mut MoveHistory {
        &mut self.history
    }

    /// Returns the side to move, derived from the number of moves played
    #[inline]
    pub fn side(&self) -> Color {
        match self.history.len() % 2 {
            0 => Color::White,
            _ => Color::Black,
        }
    }

    /// Selects the piece on square `c` and computes its legal destinations
    ///
    /// Selecting an empty square yields no destinations.
    pub fn select(&mut self, c: Coord) -> &DestList {
        self.available = movegen::gen_legal(self, c);
        self.selected = Some(c);
        &self.available
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.available.clear();
    }

    #[inline]
    pub fn selected(&self) -> Option<Coord> {
        self.selected
    }

    /// Returns the legal destinations of the selected piece
    #[inline]
    pub fn available(&self) -> &DestList {
        &self.available
    }

    /// Checks that the piece on `src` may legally move to `dst` now
    ///
    /// On success, returns the move which can be passed to [`moves::complete_move`].
    pub fn check_move(&self, src: Coord, dst: Coord) -> Result<Move, IllegalMoveError> {
        let cell = self.board.get(src);
        let color = cell.color().ok_or(IllegalMoveError::EmptySource(src))?;
        if color != self.side() {
            return Err(IllegalMoveError::NotYourTurn { coord: src, color });
        }
        if !movegen::gen_legal(self, src).contains(&dst) {
            return Err(IllegalMoveError::Unreachable { src, dst });
        }
        Ok(Move::new(src, dst, cell))
    }

    /// Validates and applies the move from `src` to `dst`
    ///
    /// Returns the outcome if the move ends the game.
    pub fn make_move(
        &mut self,
        src: Coord,
        dst: Coord,
    ) -> Result<Option<Outcome>, IllegalMoveError> {
        let mv = self.check_move(src, dst)?;
        Ok(moves::complete_move(self, mv))
    }

    /// Returns the outcome of the game if `color` has no legal moves
    pub fn calc_outcome(&self, color: Color) -> Option<Outcome> {
        if movegen::has_legal_moves(self, color) {
            return None;
        }
        if attack::is_check(self, color) {
            Some(Outcome::Checkmate {
                winner: color.inv(),
            })
        } else {
            Some(Outcome::Stalemate)
        }
    }

    /// Returns `true` if `color` is checkmated
    #[inline]
    pub fn is_checkmate(&self, color: Color) -> bool {
        legal::is_checkmate(self, color)
    }
}

impl Default for GameSession {
    #[inline]
    fn default() -> GameSession {
        GameSession::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, File, Piece, Rank};

    fn sq(s: &str) -> Coord {
        s.parse().unwrap()
    }

    #[test]
    fn test_clone_independent() {
        let mut s = GameSession::new();
        s.make_move(sq("e2"), sq("e4")).unwrap();
        let board = *s.board();
        let history = s.history().clone();

        let mut hyp = s.clone();
        hyp.board_mut().clear(sq("d1"));
        hyp.board_mut()
            .put(sq("d5"), Cell::from_parts(Color::White, Piece::Queen));
        hyp.make_move(sq("e7"), sq("e5")).unwrap();

        assert_eq!(s.board().sprites(), board.sprites());
        assert_eq!(s.history(), &history);
        assert_eq!(s.history().len(), 1);
        assert_ne!(hyp.board(), s.board());
    }

    #[test]
    fn test_select() {
        let mut s = GameSession::new();
        let dsts = s.select(sq("e2")).iter().copied().collect::<Vec<_>>();
        assert_eq!(dsts.len(), 2);
        assert!(dsts.contains(&sq("e3")));
        assert!(dsts.contains(&sq("e4")));
        assert_eq!(s.selected(), Some(sq("e2")));
        assert_eq!(s.available().len(), 2);

        assert!(s.select(sq("e5")).is_empty());
        s.clear_selection();
        assert_eq!(s.selected(), None);
        assert!(s.available().is_empty());
    }

    #[test]
    fn test_make_move() {
        let mut s = GameSession::new();
        assert_eq!(
            s.make_move(sq("e4"), sq("e5")),
            Err(IllegalMoveError::EmptySource(sq("e4")))
        );
        assert_eq!(
            s.make_move(sq("e7"), sq("e5")),
            Err(IllegalMoveError::NotYourTurn {
                coord: sq("e7"),
                color: Color::Black
            })
        );
        assert_eq!(
            s.make_move(sq("e2"), sq("e5")),
            Err(IllegalMoveError::Unreachable {
                src: sq("e2"),
                dst: sq("e5")
            })
        );
        assert!(s.history().is_empty());

        assert_eq!(s.make_move(sq("e2"), sq("e4")), Ok(None));
        assert_eq!(s.side(), Color::Black);
        assert_eq!(
            s.board().get2(File::E, Rank::R4),
            Cell::from_parts(Color::White, Piece::Pawn)
        );
        assert!(s.board().get2(File::E, Rank::R2).is_empty());
    }

    #[test]
    fn test_outcome() {
        let s = GameSession::new();
        assert_eq!(s.calc_outcome(Color::White), None);
        assert_eq!(s.calc_outcome(Color::Black), None);

        let s = GameSession::from_board(Board::from_placement("7k/5Q2/6K1/8/8/8/8/8").unwrap());
        assert_eq!(s.calc_outcome(Color::Black), Some(Outcome::Stalemate));
        assert!(!s.is_checkmate(Color::Black));

        let s = GameSession::from_board(Board::from_placement("7k/6Q1/6K1/8/8/8/8/8").unwrap());
        assert_eq!(
            s.calc_outcome(Color::Black),
            Some(Outcome::Checkmate {
                winner: Color::White
            })
        );
        assert!(s.is_checkmate(Color::Black));
    }
}
