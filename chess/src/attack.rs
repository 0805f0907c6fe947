//! Check detection
//!
//! Attacks are found by generating pseudo-legal moves of the attacking pieces and looking whether
//! any of them lands on the target square. Castling and pawn pushes are never generated here, as
//! they cannot capture.

use crate::bitboard::Bitboard;
use crate::movegen::{self, MaybeDstPush};
use crate::session::GameSession;
use crate::types::{Color, Coord};

struct HitSink {
    target: Coord,
}

impl MaybeDstPush for HitSink {
    type Err = ();

    fn push(&mut self, dst: Coord) -> Result<(), ()> {
        match dst == self.target {
            true => Err(()),
            false => Ok(()),
        }
    }

    fn wants_castling(&self) -> bool {
        false
    }

    fn wants_pushes(&self) -> bool {
        false
    }
}

fn attacks(session: &GameSession, src: Coord, target: Coord) -> bool {
    movegen::gen_pseudo_legal_into(session, src, &mut HitSink { target }).is_err()
}

/// Returns the squares of all the pieces of color `by` which attack `coord`
///
/// A pawn attacks the square only if it can capture there, so an empty square is attacked by a
/// pawn only via enpassant. Pawn pushes never count as attacks.
pub fn cell_attackers(session: &GameSession, coord: Coord, by: Color) -> Bitboard {
    session
        .board()
        .pieces(by)
        .map(|(src, _)| src)
        .filter(|&src| attacks(session, src, coord))
        .collect()
}

/// Returns `true` if any piece of color `by` attacks `coord`
pub fn is_cell_attacked(session: &GameSession, coord: Coord, by: Color) -> bool {
    session
        .board()
        .pieces(by)
        .any(|(src, _)| attacks(session, src, coord))
}

/// Returns the number of enemy pieces attacking the king on square `king`
///
/// The enemy is determined by the color of the piece on `king`. Returns zero for an empty square.
pub fn check_count(session: &GameSession, king: Coord) -> u32 {
    match session.board().get(king).color() {
        Some(c) => cell_attackers(session, king, c.inv()).popcount(),
        None => 0,
    }
}

/// Returns the squares of all the pieces giving check to the king of color `c`
pub fn checkers(session: &GameSession, c: Color) -> Bitboard {
    match session.board().king_pos(c) {
        Some(king) => cell_attackers(session, king, c.inv()),
        None => Bitboard::EMPTY,
    }
}

/// Returns `true` if the king of color `c` is in check
pub fn is_check(session: &GameSession, c: Color) -> bool {
    match session.board().king_pos(c) {
        Some(king) => is_cell_attacked(session, king, c.inv()),
        None => false,
    }
}

/// Returns `true` if the king of color `c` is attacked by more than one piece
pub fn is_double_check(session: &GameSession, c: Color) -> bool {
    checkers(session, c).popcount() > 1
}
