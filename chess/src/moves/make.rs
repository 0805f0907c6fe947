use super::base::Move;
use crate::geometry;
use crate::session::GameSession;
use crate::types::{Coord, Outcome};

use tracing::{debug, info};

/// Applies the move to the session, assuming it's legal
///
/// The move is appended to history, the enpassant victim is removed, and the rook is relocated
/// on castling. Then the opponent's outcome is calculated and returned if the game is over.
///
/// The move is not validated. Use [`GameSession::make_move()`] for untrusted input.
pub fn complete_move(session: &mut GameSession, mv: Move) -> Option<Outcome> {
    let victim = mv.enpassant_victim(session.board());
    session.history_mut().push(mv);

    let board = session.board_mut();
    if let Some(victim) = victim {
        board.clear(victim);
    }
    board.put(mv.dst(), mv.cell());
    board.clear(mv.src());

    let color = mv.color()?;
    if let Some(side) = mv.castling_side() {
        let rank = geometry::castling_rank(color);
        let rook_src = Coord::from_parts(geometry::castling_rook_file(side), rank);
        let rook_dst = Coord::from_parts(geometry::castling_rook_dst_file(side), rank);
        let rook = board.get(rook_src);
        board.clear(rook_src);
        board.put(rook_dst, rook);
    }
    session.clear_selection();
    debug!(%mv, %color, enpassant = victim.is_some(), "move completed");

    let outcome = session.calc_outcome(color.inv());
    if let Some(outcome) = outcome {
        info!(%outcome, "game over");
    }
    outcome
}
