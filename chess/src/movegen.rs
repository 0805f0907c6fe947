//! Move generation
//!
//! There are two generation modes. Pseudo-legal generation follows the movement rules of the
//! pieces and the board occupancy, but doesn't verify whether the mover's king remains safe.
//! Legal generation additionally filters each candidate through [`legal::is_moving_into_check`].
//!
//! Attack detection in [`attack`](crate::attack) always uses pseudo-legal generation, so legal
//! generation never recurses into itself.

use crate::moves::Move;
use crate::session::GameSession;
use crate::types::{CastlingSide, Color, Coord, Piece};
use crate::{attack, castling, geometry, legal, pawns};

use std::convert::Infallible;
use std::ops::{Deref, DerefMut};
use std::slice;

use arrayvec::ArrayVec;

const ROOK_DIRS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const QUEEN_DIRS: [(isize, isize); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(isize, isize); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_JUMPS: [(isize, isize); 8] = QUEEN_DIRS;

/// List of destination squares of a single piece
///
/// A single piece never has more than 27 destinations, so the list is stored inline.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct DestList(ArrayVec<Coord, 32>);

impl Deref for DestList {
    type Target = ArrayVec<Coord, 32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DestList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a DestList {
    type Item = &'a Coord;
    type IntoIter = slice::Iter<'a, Coord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for DestList {
    type Item = Coord;
    type IntoIter = arrayvec::IntoIter<Coord, 32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl DestList {
    pub fn new() -> DestList {
        DestList(ArrayVec::new())
    }
}

/// Receiver of generated destination squares
pub trait DstPush {
    fn push(&mut self, dst: Coord);
}

impl<const N: usize> DstPush for ArrayVec<Coord, N> {
    fn push(&mut self, dst: Coord) {
        self.push(dst);
    }
}

impl DstPush for DestList {
    fn push(&mut self, dst: Coord) {
        self.0.push(dst);
    }
}

impl DstPush for Vec<Coord> {
    fn push(&mut self, dst: Coord) {
        self.push(dst);
    }
}

/// Receiver of generated destination squares which may stop the generation early
pub(crate) trait MaybeDstPush {
    type Err;

    fn push(&mut self, dst: Coord) -> Result<(), Self::Err>;

    /// Returns `false` if castling destinations must not be generated
    ///
    /// Castling validation needs attack detection, so attack detection itself declines them.
    fn wants_castling(&self) -> bool {
        true
    }

    /// Returns `false` if non-capturing pawn moves must not be generated
    fn wants_pushes(&self) -> bool {
        true
    }
}

impl<T: DstPush> MaybeDstPush for T {
    type Err = Infallible;

    fn push(&mut self, dst: Coord) -> Result<(), Self::Err> {
        <Self as DstPush>::push(self, dst);
        Ok(())
    }
}

struct LegalFilter<'a, P> {
    session: &'a GameSession,
    src: Coord,
    inner: &'a mut P,
}

impl<'a, P: MaybeDstPush> LegalFilter<'a, P> {
    fn new(session: &'a GameSession, src: Coord, inner: &'a mut P) -> Self {
        Self {
            session,
            src,
            inner,
        }
    }
}

impl<'a, P: MaybeDstPush> MaybeDstPush for LegalFilter<'a, P> {
    type Err = P::Err;

    fn push(&mut self, dst: Coord) -> Result<(), Self::Err> {
        match legal::is_moving_into_check(self.session, self.src, dst) {
            true => Ok(()),
            false => self.inner.push(dst),
        }
    }

    fn wants_castling(&self) -> bool {
        self.inner.wants_castling()
    }

    fn wants_pushes(&self) -> bool {
        self.inner.wants_pushes()
    }
}

struct MoveGenImpl<'a, P> {
    session: &'a GameSession,
    src: Coord,
    color: Color,
    dst: &'a mut P,
}

impl<'a, P: MaybeDstPush> MoveGenImpl<'a, P> {
    fn new(session: &'a GameSession, src: Coord, color: Color, dst: &'a mut P) -> Self {
        MoveGenImpl {
            session,
            src,
            color,
            dst,
        }
    }

    #[inline]
    fn add_move(&mut self, dst: Coord) -> Result<(), P::Err> {
        self.dst.push(dst)
    }

    fn gen_slider(&mut self, dirs: &[(isize, isize)]) -> Result<(), P::Err> {
        let board = self.session.board();
        for &(df, dr) in dirs {
            let mut cur = self.src;
            while let Some(next) = cur.try_shift(df, dr) {
                match board.get(next).color() {
                    None => self.add_move(next)?,
                    Some(c) if c != self.color => {
                        self.add_move(next)?;
                        break;
                    }
                    Some(_) => break,
                }
                cur = next;
            }
        }
        Ok(())
    }

    fn gen_jump(&mut self, jumps: &[(isize, isize)]) -> Result<(), P::Err> {
        let board = self.session.board();
        for &(df, dr) in jumps {
            if let Some(dst) = self.src.try_shift(df, dr) {
                if board.get(dst).color() != Some(self.color) {
                    self.add_move(dst)?;
                }
            }
        }
        Ok(())
    }

    fn gen_pawn(&mut self) -> Result<(), P::Err> {
        let board = self.session.board();
        let forward = geometry::pawn_forward_delta(self.color);

        let single = match self.dst.wants_pushes() {
            true => self.src.try_shift(0, forward),
            false => None,
        };
        if let Some(single) = single {
            if board.get(single).is_empty() {
                self.add_move(single)?;
                if self.src.rank() == geometry::double_move_src_rank(self.color) {
                    if let Some(double) = single.try_shift(0, forward) {
                        if board.get(double).is_empty() {
                            self.add_move(double)?;
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            if let Some(dst) = self.src.try_shift(df, forward) {
                if board.get(dst).color() == Some(self.color.inv()) {
                    self.add_move(dst)?;
                }
            }
        }

        if let Some(dst) = pawns::enpassant_dst(self.session, self.src) {
            self.add_move(dst)?;
        }
        Ok(())
    }

    fn gen_king(&mut self) -> Result<(), P::Err> {
        self.gen_jump(&KING_JUMPS)?;
        if !self.dst.wants_castling() {
            return Ok(());
        }
        let rank = geometry::castling_rank(self.color);
        for side in [CastlingSide::King, CastlingSide::Queen] {
            if castling::can_castle(self.session, self.color, side) {
                let file = geometry::castling_king_dst_file(side);
                self.add_move(Coord::from_parts(file, rank))?;
            }
        }
        Ok(())
    }

    fn gen(&mut self, piece: Piece) -> Result<(), P::Err> {
        match piece {
            Piece::King => self.gen_king(),
            Piece::Queen => self.gen_slider(&QUEEN_DIRS),
            Piece::Bishop => self.gen_slider(&BISHOP_DIRS),
            Piece::Knight => self.gen_jump(&KNIGHT_JUMPS),
            Piece::Rook => self.gen_slider(&ROOK_DIRS),
            Piece::Pawn => self.gen_pawn(),
        }
    }
}

/// Generates pseudo-legal destinations of the piece on `src` into `dst`
///
/// Does nothing if `src` is empty.
pub(crate) fn gen_pseudo_legal_into<P: MaybeDstPush>(
    session: &GameSession,
    src: Coord,
    dst: &mut P,
) -> Result<(), P::Err> {
    let cell = session.board().get(src);
    match (cell.color(), cell.piece()) {
        (Some(color), Some(piece)) => MoveGenImpl::new(session, src, color, dst).gen(piece),
        _ => Ok(()),
    }
}

fn gen_legal_into<P: MaybeDstPush>(
    session: &GameSession,
    src: Coord,
    double_check: bool,
    dst: &mut P,
) -> Result<(), P::Err> {
    let cell = session.board().get(src);
    let (color, piece) = match (cell.color(), cell.piece()) {
        (Some(color), Some(piece)) => (color, piece),
        _ => return Ok(()),
    };
    // Only the king can escape double check
    if piece != Piece::King && double_check {
        return Ok(());
    }
    let mut filter = LegalFilter::new(session, src, dst);
    MoveGenImpl::new(session, src, color, &mut filter).gen(piece)
}

/// Returns pseudo-legal destinations of the piece on `src`
///
/// Such destinations may leave the mover's own king under attack.
pub fn gen_pseudo_legal(session: &GameSession, src: Coord) -> DestList {
    let mut res = DestList::new();
    let _ = gen_pseudo_legal_into(session, src, &mut res);
    res
}

/// Returns legal destinations of the piece on `src`
///
/// If `src` is empty, the list is empty. The side to move is not taken into account.
///
/// # Example
///
/// ```
/// # use duelchess::{movegen, GameSession};
/// let session = GameSession::new();
/// let dsts = movegen::gen_legal(&session, "b1".parse().unwrap());
/// let mut dsts: Vec<_> = dsts.iter().map(ToString::to_string).collect();
/// dsts.sort();
/// assert_eq!(dsts, vec!["a3", "c3"]);
/// ```
pub fn gen_legal(session: &GameSession, src: Coord) -> DestList {
    let double_check = match session.board().get(src).color() {
        Some(color) => attack::is_double_check(session, color),
        None => return DestList::new(),
    };
    let mut res = DestList::new();
    let _ = gen_legal_into(session, src, double_check, &mut res);
    res
}

/// Returns all the legal moves of color `c`
pub fn legal_moves(session: &GameSession, c: Color) -> Vec<Move> {
    let board = session.board();
    let double_check = attack::is_double_check(session, c);
    let mut res = Vec::new();
    for (src, _) in board.pieces(c) {
        let mut dsts = DestList::new();
        let _ = gen_legal_into(session, src, double_check, &mut dsts);
        res.extend(dsts.iter().map(|&dst| Move::from_board(board, src, dst)));
    }
    res
}

struct ErrOnFirst;

impl MaybeDstPush for ErrOnFirst {
    type Err = ();

    fn push(&mut self, _dst: Coord) -> Result<(), ()> {
        Err(())
    }
}

/// Returns `true` if color `c` has at least one legal move
pub fn has_legal_moves(session: &GameSession, c: Color) -> bool {
    let double_check = attack::is_double_check(session, c);
    session
        .board()
        .pieces(c)
        .any(|(src, _)| gen_legal_into(session, src, double_check, &mut ErrOnFirst).is_err())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn sq(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn dsts(list: &DestList) -> BTreeSet<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn session(placement: &str) -> GameSession {
        GameSession::from_board(Board::from_placement(placement).unwrap())
    }

    #[test]
    fn test_initial() {
        let s = GameSession::new();
        assert_eq!(dsts(&gen_legal(&s, sq("e2"))), set(&["e3", "e4"]));
        assert_eq!(dsts(&gen_legal(&s, sq("b1"))), set(&["a3", "c3"]));
        assert_eq!(dsts(&gen_legal(&s, sq("g8"))), set(&["f6", "h6"]));
        assert!(gen_legal(&s, sq("a1")).is_empty());
        assert!(gen_legal(&s, sq("e1")).is_empty());
        assert!(gen_legal(&s, sq("e4")).is_empty());
        assert_eq!(legal_moves(&s, Color::White).len(), 20);
        assert_eq!(legal_moves(&s, Color::Black).len(), 20);
        assert!(has_legal_moves(&s, Color::White));
    }

    #[test]
    fn test_sliders() {
        let s = session("4k3/8/8/3p4/8/1Q3n2/8/4K3");
        assert_eq!(
            dsts(&gen_pseudo_legal(&s, sq("b3"))),
            set(&[
                "a3", "c3", "d3", "e3", "f3", "b1", "b2", "b4", "b5", "b6", "b7", "b8", "a2", "c4",
                "d5", "a4", "c2", "d1"
            ])
        );
        assert_eq!(
            dsts(&gen_pseudo_legal(&s, sq("f3"))),
            set(&["e1", "g1", "d2", "h2", "d4", "h4", "e5", "g5"])
        );
    }

    #[test]
    fn test_pinned() {
        let s = session("4k3/4r3/8/8/8/8/4B3/4K3");
        assert!(!gen_pseudo_legal(&s, sq("e2")).is_empty());
        assert!(gen_legal(&s, sq("e2")).is_empty());

        let s = session("4k3/4r3/8/8/8/8/4R3/4K3");
        assert_eq!(
            dsts(&gen_legal(&s, sq("e2"))),
            set(&["e3", "e4", "e5", "e6", "e7"])
        );
    }

    #[test]
    fn test_king_safety() {
        let s = session("4k3/8/8/8/8/8/3r4/4K3");
        assert_eq!(dsts(&gen_legal(&s, sq("e1"))), set(&["d2", "f1"]));
        assert_eq!(
            dsts(&gen_pseudo_legal(&s, sq("e1"))),
            set(&["d1", "f1", "d2", "e2", "f2"])
        );
    }

    #[test]
    fn test_king_before_pawn() {
        let s = session("4k3/8/8/8/8/4p3/8/4K3");
        assert_eq!(dsts(&gen_legal(&s, sq("e1"))), set(&["d1", "f1", "e2"]));
    }

    #[test]
    fn test_double_check() {
        let s = session("k3r3/8/8/8/8/3n4/8/3QK3");
        assert_eq!(attack::check_count(&s, sq("e1")), 2);
        assert!(!gen_pseudo_legal(&s, sq("d1")).is_empty());
        assert!(gen_legal(&s, sq("d1")).is_empty());
        assert_eq!(dsts(&gen_legal(&s, sq("e1"))), set(&["d2", "f1"]));
        assert_eq!(legal_moves(&s, Color::White).len(), 2);

        // With a single check, capturing the checker is fine
        let s = session("k7/8/8/8/8/3n4/8/3QK3");
        assert_eq!(attack::check_count(&s, sq("e1")), 1);
        assert_eq!(dsts(&gen_legal(&s, sq("d1"))), set(&["d3"]));
    }

    #[test]
    fn test_castling_dsts() {
        let s = session("r3k2r/8/8/8/8/8/8/R3K2R");
        assert_eq!(
            dsts(&gen_legal(&s, sq("e1"))),
            set(&["c1", "d1", "d2", "e2", "f2", "f1", "g1"])
        );
        assert_eq!(
            dsts(&gen_legal(&s, sq("e8"))),
            set(&["c8", "d8", "d7", "e7", "f7", "f8", "g8"])
        );
    }

    #[test]
    fn test_random_playouts() {
        let mut rng = StdRng::seed_from_u64(0x5eed_c0de);
        for _ in 0..4 {
            let mut s = GameSession::new();
            for _ in 0..120 {
                let side = s.side();
                let moves = legal_moves(&s, side);
                assert_eq!(has_legal_moves(&s, side), !moves.is_empty());
                if moves.is_empty() {
                    assert!(s.calc_outcome(side).is_some());
                    break;
                }
                for mv in &moves {
                    assert_eq!(mv.color(), Some(side));
                }
                let mv = moves[rng.gen_range(0..moves.len())];
                s.make_move(mv.src(), mv.dst()).unwrap();
                s.board().validate().unwrap();
                assert!(!attack::is_check(&s, side));
            }
        }
    }
}
