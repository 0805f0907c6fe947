//! Enpassant validation

use crate::session::GameSession;
use crate::types::{Cell, Coord, Piece};
use crate::geometry;

/// Returns the enpassant destination of the pawn on `src`, if it can capture enpassant now
///
/// The pawn must stand on its enpassant rank, and the most recent move in history must be a
/// double push of an enemy pawn which landed on an adjacent file of the same rank.
pub fn enpassant_dst(session: &GameSession, src: Coord) -> Option<Coord> {
    let board = session.board();
    let cell = board.get(src);
    let color = cell.color()?;
    if cell.piece() != Some(Piece::Pawn) || src.rank() != geometry::enpassant_src_rank(color) {
        return None;
    }

    let last = session.history().last()?;
    let enemy_pawn = Cell::from_parts(color.inv(), Piece::Pawn);
    let file_dist = last.dst().file().index().abs_diff(src.file().index());
    if last.cell() != enemy_pawn
        || last.src().rank() != geometry::double_move_src_rank(color.inv())
        || last.src().file() != last.dst().file()
        || last.dst().rank() != src.rank()
        || file_dist != 1
        || board.get(last.dst()) != enemy_pawn
    {
        return None;
    }
    last.dst().try_shift(0, geometry::pawn_forward_delta(color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::moves::Move;
    use crate::types::Color;

    fn sq(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn play(s: &mut GameSession, moves: &[&str]) {
        for mv in moves {
            let mv = Move::from_uci(mv, s.board()).unwrap();
            s.make_move(mv.src(), mv.dst()).unwrap();
        }
    }

    #[test]
    fn test_white() {
        let mut s = GameSession::new();
        play(&mut s, &["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert_eq!(enpassant_dst(&s, sq("e5")), Some(sq("d6")));
        assert!(s.select(sq("e5")).contains(&sq("d6")));

        play(&mut s, &["e5d6"]);
        assert!(s.board().get(sq("d5")).is_empty());
        assert_eq!(
            s.board().get(sq("d6")),
            Cell::from_parts(Color::White, Piece::Pawn)
        );
    }

    #[test]
    fn test_expires() {
        let mut s = GameSession::new();
        play(&mut s, &["e2e4", "a7a6", "e4e5", "d7d5", "h2h3", "a6a5"]);
        assert_eq!(enpassant_dst(&s, sq("e5")), None);
        assert!(!s.select(sq("e5")).contains(&sq("d6")));
    }

    #[test]
    fn test_single_steps() {
        let mut s = GameSession::new();
        play(&mut s, &["e2e4", "d7d6", "e4e5", "d6d5"]);
        assert_eq!(enpassant_dst(&s, sq("e5")), None);
    }

    #[test]
    fn test_black() {
        let mut s = GameSession::new();
        play(&mut s, &["a2a3", "d7d5", "a3a4", "d5d4", "c2c4"]);
        assert_eq!(enpassant_dst(&s, sq("d4")), Some(sq("c3")));
        play(&mut s, &["d4c3"]);
        assert!(s.board().get(sq("c4")).is_empty());

        let mut s = GameSession::new();
        play(&mut s, &["a2a3", "d7d5", "a3a4", "d5d4", "f2f4"]);
        assert_eq!(enpassant_dst(&s, sq("d4")), None);
    }

    #[test]
    fn test_wrong_rank() {
        let s = GameSession::from_board(Board::from_placement("4k3/8/8/8/3Pp3/8/8/4K3").unwrap());
        assert_eq!(enpassant_dst(&s, sq("e4")), None);
        assert_eq!(enpassant_dst(&s, sq("d4")), None);
    }
}
