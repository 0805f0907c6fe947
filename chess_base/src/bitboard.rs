use crate::types::Coord;
use std::fmt;

/// Set of squares, one bit per square index
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    pub const fn with(self, coord: Coord) -> Bitboard {
        Bitboard(self.0 | (1_u64 << coord.index()))
    }

    pub const fn has(&self, coord: Coord) -> bool {
        ((self.0 >> coord.index()) & 1) != 0
    }

    pub const fn popcount(&self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates over the squares in the order of their indices
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        Coord::iter().filter(|&c| self.has(c))
    }
}

impl FromIterator<Coord> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Bitboard {
        iter.into_iter().fold(Bitboard::EMPTY, Bitboard::with)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    #[test]
    fn test_set() {
        let a4 = Coord::from_parts(File::A, Rank::R4);
        let e2 = Coord::from_parts(File::E, Rank::R2);
        let f3 = Coord::from_parts(File::F, Rank::R3);
        let bb: Bitboard = [f3, a4, e2, f3].into_iter().collect();
        assert_eq!(bb.popcount(), 3);
        assert!(bb.has(a4) && bb.has(e2) && bb.has(f3));
        assert!(!bb.has(Coord::from_parts(File::E, Rank::R4)));
        assert_eq!(bb.iter().collect::<Vec<_>>(), vec![e2, f3, a4]);
        assert!(Bitboard::EMPTY.is_empty());
        assert!(!bb.is_empty());
        assert_eq!(format!("{:?}", Bitboard::EMPTY.with(e2)), format!("{{{:?}}}", e2));
    }
}
