use std::fmt;
use std::hint;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordParseError {
    #[error("unexpected file char {0:?}")]
    UnexpectedFileChar(char),
    #[error("unexpected rank char {0:?}")]
    UnexpectedRankChar(char),
    #[error("invalid string length")]
    BadLength,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CellParseError {
    #[error("unexpected cell char {0:?}")]
    UnexpectedChar(char),
    #[error("invalid string length")]
    BadLength,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl File {
    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Self {
        match val {
            0 => File::A,
            1 => File::B,
            2 => File::C,
            3 => File::D,
            4 => File::E,
            5 => File::F,
            6 => File::G,
            7 => File::H,
            _ => hint::unreachable_unchecked(),
        }
    }

    pub const fn from_index(val: usize) -> Self {
        assert!(val < 8, "file index must be between 0 and 7");
        unsafe { Self::from_index_unchecked(val) }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..8).map(|x| unsafe { Self::from_index_unchecked(x) })
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='h' => Some(Self::from_index((u32::from(c) - u32::from('a')) as usize)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        (b'a' + *self as u8) as char
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

/// Board rank
///
/// Ranks are numbered from White's side, so [`Rank::R1`] has index 0 and the square
/// index is `rank * 8 + file`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum Rank {
    R1 = 0,
    R2 = 1,
    R3 = 2,
    R4 = 3,
    R5 = 4,
    R6 = 5,
    R7 = 6,
    R8 = 7,
}

impl Rank {
    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Self {
        match val {
            0 => Rank::R1,
            1 => Rank::R2,
            2 => Rank::R3,
            3 => Rank::R4,
            4 => Rank::R5,
            5 => Rank::R6,
            6 => Rank::R7,
            7 => Rank::R8,
            _ => hint::unreachable_unchecked(),
        }
    }

    pub const fn from_index(val: usize) -> Self {
        assert!(val < 8, "rank index must be between 0 and 7");
        unsafe { Self::from_index_unchecked(val) }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..8).map(|x| unsafe { Self::from_index_unchecked(x) })
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1'..='8' => Some(Self::from_index((u32::from(c) - u32::from('1')) as usize)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        (b'1' + *self as u8) as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

/// Square on the board, stored as `rank * 8 + file`
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord(u8);

impl Coord {
    pub const fn from_index(val: usize) -> Coord {
        assert!(val < 64, "coord must be between 0 and 63");
        Coord(val as u8)
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Coord {
        Coord(val as u8)
    }

    pub const fn from_parts(file: File, rank: Rank) -> Coord {
        Coord(((rank as u8) << 3) | file as u8)
    }

    pub const fn file(&self) -> File {
        unsafe { File::from_index_unchecked((self.0 & 7) as usize) }
    }

    pub const fn rank(&self) -> Rank {
        unsafe { Rank::from_index_unchecked((self.0 >> 3) as usize) }
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn try_shift(self, delta_file: isize, delta_rank: isize) -> Option<Coord> {
        let new_file = self.file().index().wrapping_add(delta_file as usize);
        let new_rank = self.rank().index().wrapping_add(delta_rank as usize);
        if new_file >= 8 || new_rank >= 8 {
            return None;
        }
        unsafe {
            Some(Coord::from_parts(
                File::from_index_unchecked(new_file),
                Rank::from_index_unchecked(new_rank),
            ))
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0_u8..64_u8).map(Coord)
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.0 < 64 {
            return write!(f, "Coord({})", self);
        }
        write!(f, "Coord(?{:?})", self.0)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.file().as_char(), self.rank().as_char())
    }
}

impl FromStr for Coord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file_ch), Some(rank_ch), None) = (chars.next(), chars.next(), chars.next())
        else {
            return Err(CoordParseError::BadLength);
        };
        Ok(Coord::from_parts(
            File::from_char(file_ch).ok_or(CoordParseError::UnexpectedFileChar(file_ch))?,
            Rank::from_char(rank_ch).ok_or(CoordParseError::UnexpectedRankChar(rank_ch))?,
        ))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const fn inv(&self) -> Color {
        match *self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// Piece kind
///
/// The discriminants are the offsets of the pieces inside the sprite id ranges of [`Cell`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    King = 0,
    Queen = 1,
    Bishop = 2,
    Knight = 3,
    Rook = 4,
    Pawn = 5,
}

impl Piece {
    pub const COUNT: usize = 6;

    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const fn from_index(val: usize) -> Piece {
        match val {
            0 => Piece::King,
            1 => Piece::Queen,
            2 => Piece::Bishop,
            3 => Piece::Knight,
            4 => Piece::Rook,
            5 => Piece::Pawn,
            _ => panic!("piece index must be between 0 and 5"),
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self::from_index)
    }
}

/// Contents of a single square, encoded as a sprite id
///
/// White pieces occupy ids `8..=13`, Black pieces occupy ids `24..=29` (in the order of [`Piece`]),
/// and any negative id denotes an empty square. The color is determined by comparing the id
/// with [`Cell::COLOR_THRESHOLD`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cell(i8);

impl Cell {
    pub const EMPTY: Cell = Cell(-1);
    pub const COLOR_THRESHOLD: i32 = 23;

    const WHITE_BASE: i8 = 8;
    const BLACK_BASE: i8 = 24;

    pub const fn is_empty(&self) -> bool {
        self.0 < 0
    }

    pub const fn is_occupied(&self) -> bool {
        self.0 >= 0
    }

    pub const fn from_parts(c: Color, p: Piece) -> Cell {
        Cell(match c {
            Color::White => Self::WHITE_BASE + p as i8,
            Color::Black => Self::BLACK_BASE + p as i8,
        })
    }

    /// Decodes a sprite id, returning `None` if the id denotes neither a piece nor an empty square
    pub const fn from_sprite(id: i32) -> Option<Cell> {
        match id {
            i32::MIN..=-1 => Some(Cell::EMPTY),
            8..=13 | 24..=29 => Some(Cell(id as i8)),
            _ => None,
        }
    }

    pub const fn sprite(&self) -> i32 {
        self.0 as i32
    }

    pub const fn color(&self) -> Option<Color> {
        if self.is_empty() {
            None
        } else if self.0 as i32 > Self::COLOR_THRESHOLD {
            Some(Color::Black)
        } else {
            Some(Color::White)
        }
    }

    pub const fn piece(&self) -> Option<Piece> {
        match self.color() {
            None => None,
            Some(Color::White) => Some(Piece::from_index((self.0 - Self::WHITE_BASE) as usize)),
            Some(Color::Black) => Some(Piece::from_index((self.0 - Self::BLACK_BASE) as usize)),
        }
    }

    pub const fn has(&self, c: Color, p: Piece) -> bool {
        self.0 == Self::from_parts(c, p).0
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        [Cell::EMPTY].into_iter().chain(
            [Color::White, Color::Black]
                .into_iter()
                .flat_map(|c| Piece::iter().map(move |p| Cell::from_parts(c, p))),
        )
    }

    pub fn as_char(&self) -> char {
        let Some(piece) = self.piece() else {
            return '.';
        };
        let c = match piece {
            Piece::King => 'k',
            Piece::Queen => 'q',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            Piece::Rook => 'r',
            Piece::Pawn => 'p',
        };
        match self.color() {
            Some(Color::White) => c.to_ascii_uppercase(),
            _ => c,
        }
    }

    pub fn as_utf8_char(&self) -> char {
        let Some(piece) = self.piece() else {
            return '.';
        };
        let (white, black) = match piece {
            Piece::King => ('♔', '♚'),
            Piece::Queen => ('♕', '♛'),
            Piece::Bishop => ('♗', '♝'),
            Piece::Knight => ('♘', '♞'),
            Piece::Rook => ('♖', '♜'),
            Piece::Pawn => ('♙', '♟'),
        };
        match self.color() {
            Some(Color::White) => white,
            _ => black,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        if c == '.' {
            return Some(Cell::EMPTY);
        }
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'k' => Piece::King,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            _ => return None,
        };
        Some(Cell::from_parts(color, piece))
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Cell {
        Cell::EMPTY
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Cell({})", self.as_char())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Cell {
    type Err = CellParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return Err(CellParseError::BadLength);
        };
        Cell::from_char(ch).ok_or(CellParseError::UnexpectedChar(ch))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CastlingSide {
    Queen = 0,
    King = 1,
}

/// Final result of the game
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
}

impl Outcome {
    pub fn winner(&self) -> Option<Color> {
        match *self {
            Self::Checkmate { winner } => Some(winner),
            Self::Stalemate => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            Self::Checkmate { winner } => write!(f, "{} wins by checkmate", winner),
            Self::Stalemate => write!(f, "draw by stalemate"),
        }
    }
}
