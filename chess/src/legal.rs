//! Legality checks performed on hypothetical positions

use crate::session::GameSession;
use crate::types::{Color, Coord};
use crate::{attack, movegen};

/// Returns `true` if moving the piece from `src` to `dst` leaves its own king in check
///
/// The move is played on a clone of the session by plain relocation of the piece, without any
/// special handling of castling or enpassant. If `src` is empty, returns `false`.
pub fn is_moving_into_check(session: &GameSession, src: Coord, dst: Coord) -> bool {
    let color = match session.board().get(src).color() {
        Some(c) => c,
        None => return false,
    };
    let mut hyp = session.clone();
    let board = hyp.board_mut();
    let cell = board.get(src);
    board.put(dst, cell);
    board.clear(src);
    match hyp.board().king_pos(color) {
        Some(king) => attack::check_count(&hyp, king) > 0,
        None => false,
    }
}

/// Returns `true` if the king of color `c` is in check and `c` has no legal moves
pub fn is_checkmate(session: &GameSession, c: Color) -> bool {
    attack::is_check(session, c) && !movegen::has_legal_moves(session, c)
}

/// Returns `true` if the king of color `c` is not in check, but `c` has no legal moves
pub fn is_stalemate(session: &GameSession, c: Color) -> bool {
    !attack::is_check(session, c) && !movegen::has_legal_moves(session, c)
}
