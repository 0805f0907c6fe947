//! Castling validation

use crate::session::GameSession;
use crate::types::{CastlingSide, Cell, Color, Coord, File, Piece};
use crate::{attack, geometry, legal};

/// Returns `true` if color `c` may castle on side `s` now
///
/// The following conditions must hold:
/// - the king and the rook stand on their home squares
/// - all the squares between them are empty
/// - neither the king nor the rook has ever moved from its home square
/// - the king is not in check
/// - the king doesn't pass through or land on an attacked square
pub fn can_castle(session: &GameSession, c: Color, s: CastlingSide) -> bool {
    let board = session.board();
    let rank = geometry::castling_rank(c);
    let king_src = Coord::from_parts(File::E, rank);
    let rook_src = Coord::from_parts(geometry::castling_rook_file(s), rank);
    if board.get(king_src) != Cell::from_parts(c, Piece::King)
        || board.get(rook_src) != Cell::from_parts(c, Piece::Rook)
    {
        return false;
    }

    let (lo, hi) = match s {
        CastlingSide::King => (king_src.file().index(), rook_src.file().index()),
        CastlingSide::Queen => (rook_src.file().index(), king_src.file().index()),
    };
    if (lo + 1..hi).any(|f| board.get2(File::from_index(f), rank).is_occupied()) {
        return false;
    }

    let history = session.history();
    if history.has_moved_from(king_src) || history.has_moved_from(rook_src) {
        return false;
    }

    if attack::check_count(session, king_src) > 0 {
        return false;
    }

    let dir = match s {
        CastlingSide::King => 1,
        CastlingSide::Queen => -1,
    };
    (1..=2).all(|step| match king_src.try_shift(dir * step, 0) {
        Some(dst) => !legal::is_moving_into_check(session, king_src, dst),
        None => false,
    })
}
