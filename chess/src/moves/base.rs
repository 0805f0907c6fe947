use super::uci;
use crate::board::Board;
use crate::types::{CastlingSide, Cell, Color, Coord, File, Piece};
use crate::geometry;

use std::fmt;

/// Chess move
///
/// Apart from source and destination squares, the move remembers the piece which was moved
/// (as it was on the board when the move was recorded). Moves stored in
/// [`MoveHistory`](crate::history::MoveHistory) are never changed afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    src: Coord,
    dst: Coord,
    cell: Cell,
}

impl Move {
    /// Creates a move of piece `cell` from `src` to `dst`
    #[inline]
    pub const fn new(src: Coord, dst: Coord, cell: Cell) -> Move {
        Move { src, dst, cell }
    }

    /// Creates a move from `src` to `dst`, taking the moved piece from board `b`
    #[inline]
    pub fn from_board(b: &Board, src: Coord, dst: Coord) -> Move {
        Move::new(src, dst, b.get(src))
    }

    /// Parses a move in UCI notation, taking the moved piece from board `b`
    ///
    /// The source square must be occupied. The move is not checked for legality.
    pub fn from_uci(s: &str, b: &Board) -> Result<Move, uci::ParseError> {
        Ok(s.parse::<uci::Move>()?.into_move(b)?)
    }

    #[inline]
    pub const fn src(&self) -> Coord {
        self.src
    }

    #[inline]
    pub const fn dst(&self) -> Coord {
        self.dst
    }

    /// Returns the moved piece
    #[inline]
    pub const fn cell(&self) -> Cell {
        self.cell
    }

    /// Returns the color of the moved piece
    #[inline]
    pub const fn color(&self) -> Option<Color> {
        self.cell.color()
    }

    /// Returns the castling side if the move is castling
    ///
    /// A move is castling if the king moves from its home square two files towards one of the
    /// corners.
    pub fn castling_side(&self) -> Option<CastlingSide> {
        let color = self.cell.color()?;
        if self.cell.piece() != Some(Piece::King) {
            return None;
        }
        let rank = geometry::castling_rank(color);
        if self.src != Coord::from_parts(File::E, rank) || self.dst.rank() != rank {
            return None;
        }
        [CastlingSide::King, CastlingSide::Queen]
            .into_iter()
            .find(|&side| self.dst.file() == geometry::castling_king_dst_file(side))
    }

    #[inline]
    pub fn is_castle(&self) -> bool {
        self.castling_side().is_some()
    }

    /// Returns the square of the pawn captured by enpassant, if this move is enpassant on board `b`
    ///
    /// The detection is structural: a pawn moves diagonally to an empty square, and there is
    /// an enemy pawn right behind the destination square.
    pub fn enpassant_victim(&self, b: &Board) -> Option<Coord> {
        let moving = b.get(self.src);
        let color = moving.color()?;
        if moving.piece() != Some(Piece::Pawn)
            || self.src.file() == self.dst.file()
            || b.get(self.dst).is_occupied()
        {
            return None;
        }
        let victim = Coord::from_parts(self.dst.file(), self.src.rank());
        match b.get(victim) == Cell::from_parts(color.inv(), Piece::Pawn) {
            true => Some(victim),
            false => None,
        }
    }

    #[inline]
    pub fn is_enpassant(&self, b: &Board) -> bool {
        self.enpassant_victim(b).is_some()
    }

    /// Converts the move into UCI representation
    #[inline]
    pub fn uci(&self) -> uci::Move {
        uci::Move {
            src: self.src,
            dst: self.dst,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.uci())
    }
}

/// Returns the king move which performs castling for color `c` on side `s`
pub fn castle_move(c: Color, s: CastlingSide) -> Move {
    let rank = geometry::castling_rank(c);
    Move::new(
        Coord::from_parts(File::E, rank),
        Coord::from_parts(geometry::castling_king_dst_file(s), rank),
        Cell::from_parts(c, Piece::King),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rank;

    #[test]
    fn test_castle_detection() {
        let b = Board::initial();
        for color in [Color::White, Color::Black] {
            for side in [CastlingSide::King, CastlingSide::Queen] {
                let mv = castle_move(color, side);
                assert!(mv.is_castle());
                assert_eq!(mv.castling_side(), Some(side));
            }
        }
        assert_eq!(castle_move(Color::White, CastlingSide::King).to_string(), "e1g1");
        assert_eq!(castle_move(Color::Black, CastlingSide::Queen).to_string(), "e8c8");

        // A king step is not castling
        let mv = Move::from_uci("e1f1", &b).unwrap();
        assert!(!mv.is_castle());

        // A rook moving from e1 to g1 is not castling
        let mv = Move::new(
            Coord::from_parts(File::E, Rank::R1),
            Coord::from_parts(File::G, Rank::R1),
            Cell::from_parts(Color::White, Piece::Rook),
        );
        assert!(!mv.is_castle());

        // The black king can't castle on the first rank
        let mv = Move::new(
            Coord::from_parts(File::E, Rank::R1),
            Coord::from_parts(File::G, Rank::R1),
            Cell::from_parts(Color::Black, Piece::King),
        );
        assert!(!mv.is_castle());
    }

    #[test]
    fn test_enpassant_detection() {
        let b = Board::from_placement("4k3/8/8/3pP3/8/8/8/4K3").unwrap();
        let ep = Move::from_uci("e5d6", &b).unwrap();
        assert!(ep.is_enpassant(&b));
        assert_eq!(ep.enpassant_victim(&b), Some(Coord::from_parts(File::D, Rank::R5)));

        let push = Move::from_uci("e5e6", &b).unwrap();
        assert!(!push.is_enpassant(&b));
        let diag = Move::from_uci("e5f6", &b).unwrap();
        assert!(!diag.is_enpassant(&b));

        let b = Board::from_placement("4k3/8/8/3PP3/8/8/8/4K3").unwrap();
        let mv = Move::from_uci("e5d6", &b).unwrap();
        assert!(!mv.is_enpassant(&b));
    }
}
