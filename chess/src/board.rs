//! Board and related things

use crate::types::{Cell, Color, Coord, File, Piece, Rank};

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

/// Board validation error
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// A sprite id that denotes neither a piece nor an empty square
    #[error("bad sprite id {id} at {coord}")]
    BadSprite { coord: Coord, id: i32 },
    /// One of the sides doesn't have a king
    #[error("no king of color {0:?}")]
    NoKing(Color),
    /// One of the sides has more than one king
    #[error("more than one king of color {0:?}")]
    TooManyKings(Color),
}

/// Error parsing piece placement (i.e. the first part of FEN)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum PlacementParseError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
    /// Placement was parsed, but it's invalid
    #[error("invalid position: {0}")]
    Valid(#[from] ValidateError),
}

const R_W: i32 = 12;
const N_W: i32 = 11;
const B_W: i32 = 10;
const Q_W: i32 = 9;
const K_W: i32 = 8;
const P_W: i32 = 13;
const R_B: i32 = 28;
const N_B: i32 = 27;
const B_B: i32 = 26;
const Q_B: i32 = 25;
const K_B: i32 = 24;
const P_B: i32 = 29;
const NONE: i32 = -1;

/// Sprite ids of the initial position, indexed by `rank * 8 + file`
#[rustfmt::skip]
pub const INITIAL_SPRITES: [i32; 64] = [
    R_W,  N_W,  B_W,  Q_W,  K_W,  B_W,  N_W,  R_W,
    P_W,  P_W,  P_W,  P_W,  P_W,  P_W,  P_W,  P_W,
    NONE, NONE, NONE, NONE, NONE, NONE, NONE, NONE,
    NONE, NONE, NONE, NONE, NONE, NONE, NONE, NONE,
    NONE, NONE, NONE, NONE, NONE, NONE, NONE, NONE,
    NONE, NONE, NONE, NONE, NONE, NONE, NONE, NONE,
    P_B,  P_B,  P_B,  P_B,  P_B,  P_B,  P_B,  P_B,
    R_B,  N_B,  B_B,  Q_B,  K_B,  B_B,  N_B,  R_B,
];

/// Chess board
///
/// The board is a plain array of 64 cells indexed by [`Coord::index()`]. It doesn't know whose
/// turn it is and doesn't remember previous moves, see [`GameSession`](crate::session::GameSession)
/// for that.
///
/// Boards created via [`Board::initial()`], [`Board::from_sprites()`] or
/// [`Board::from_placement()`]
/// contain exactly one king of each color. Moves made by the game logic preserve this invariant, as
/// kings are never captured.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Board {
    cells: [Cell; 64],
}

impl Board {
    /// Returns a board without any pieces
    ///
    /// Such board doesn't satisfy the king invariant, so you must put both kings before
    /// using it for the game.
    #[inline]
    pub const fn empty() -> Board {
        Board {
            cells: [Cell::EMPTY; 64],
        }
    }

    /// Returns a board with the initial position
    pub fn initial() -> Board {
        let mut res = Board::empty();
        for (i, &id) in INITIAL_SPRITES.iter().enumerate() {
            // `INITIAL_SPRITES` contains only valid ids.
            res.cells[i] = Cell::from_sprite(id).unwrap_or(Cell::EMPTY);
        }
        res
    }

    /// Builds the board from sprite ids indexed by `rank * 8 + file`
    pub fn from_sprites(sprites: &[i32; 64]) -> Result<Board, ValidateError> {
        let mut res = Board::empty();
        for (i, &id) in sprites.iter().enumerate() {
            let coord = Coord::from_index(i);
            res.cells[i] = Cell::from_sprite(id).ok_or(ValidateError::BadSprite { coord, id })?;
        }
        res.validate()?;
        Ok(res)
    }

    /// Parses the board from the piece placement part of FEN
    ///
    /// # Example
    ///
    /// ```
    /// # use duelchess::{Board, Cell, Color, Piece, File, Rank};
    /// #
    /// let b = Board::from_placement("4k3/8/8/8/8/8/8/4K2R").unwrap();
    /// assert_eq!(b.get2(File::H, Rank::R1), Cell::from_parts(Color::White, Piece::Rook));
    /// assert_eq!(b.as_placement(), "4k3/8/8/8/8/8/8/4K2R");
    /// ```
    pub fn from_placement(s: &str) -> Result<Board, PlacementParseError> {
        let res = Board {
            cells: parse_cells(s)?,
        };
        res.validate()?;
        Ok(res)
    }

    /// Returns sprite ids of all the cells, indexed by `rank * 8 + file`
    pub fn sprites(&self) -> [i32; 64] {
        self.cells.map(|c| c.sprite())
    }

    /// Returns the contents of the square with coordinate `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        self.cells[c.index()]
    }

    /// Returns the contents of the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.get(Coord::from_parts(file, rank))
    }

    /// Puts `cell` to the square with coordinate `c`
    ///
    /// The function doesn't verify the king invariant.
    #[inline]
    pub fn put(&mut self, c: Coord, cell: Cell) {
        self.cells[c.index()] = cell;
    }

    /// Puts `cell` to the square with file `file` and rank `rank`
    #[inline]
    pub fn put2(&mut self, file: File, rank: Rank, cell: Cell) {
        self.put(Coord::from_parts(file, rank), cell);
    }

    /// Makes the square with coordinate `c` empty
    #[inline]
    pub fn clear(&mut self, c: Coord) {
        self.put(c, Cell::EMPTY);
    }

    /// Returns the position of the king of color `c`
    ///
    /// Only a board which was edited manually via [`Board::put()`] may have no king.
    pub fn king_pos(&self, c: Color) -> Option<Coord> {
        let king = Cell::from_parts(c, Piece::King);
        Coord::iter().find(|&p| self.get(p) == king)
    }

    /// Iterates over all the occupied squares with pieces of color `c`
    pub fn pieces(&self, c: Color) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        Coord::iter().filter_map(move |p| {
            let cell = self.get(p);
            match cell.color() {
                Some(color) if color == c => cell.piece().map(|piece| (p, piece)),
                _ => None,
            }
        })
    }

    /// Verifies that the board contains exactly one king of each color
    pub fn validate(&self) -> Result<(), ValidateError> {
        for color in [Color::White, Color::Black] {
            let king = Cell::from_parts(color, Piece::King);
            match self.cells.iter().filter(|&&c| c == king).count() {
                0 => return Err(ValidateError::NoKing(color)),
                1 => {}
                _ => return Err(ValidateError::TooManyKings(color)),
            }
        }
        Ok(())
    }

    /// Wraps the board to allow pretty-printing with the given style `Style`
    ///
    /// The resulting wrapper implements [`fmt::Display`], so can be used with
    /// `write!()`, `println!()`, or `ToString::to_string`.
    ///
    /// # Example
    ///
    /// ```
    /// # use duelchess::{Board, board::PrettyStyle};
    /// #
    /// let b = Board::initial();
    ///
    /// let res = r#"
    /// 8|rnbqkbnr
    /// 7|pppppppp
    /// 6|........
    /// 5|........
    /// 4|........
    /// 3|........
    /// 2|PPPPPPPP
    /// 1|RNBQKBNR
    /// -+--------
    ///  |abcdefgh
    /// "#;
    /// assert_eq!(b.pretty(PrettyStyle::Ascii).to_string().trim(), res.trim());
    /// ```
    #[inline]
    pub fn pretty(&self, style: PrettyStyle) -> Pretty<'_> {
        Pretty { board: self, style }
    }

    /// Converts the board into the piece placement part of FEN
    ///
    /// Does the same as `Board::to_string()`.
    #[inline]
    pub fn as_placement(&self) -> String {
        self.to_string()
    }
}

impl Default for Board {
    #[inline]
    fn default() -> Board {
        Board::initial()
    }
}

fn parse_cells(s: &str) -> Result<[Cell; 64], PlacementParseError> {
    type Error = PlacementParseError;

    let mut file = 0_usize;
    let mut rank = 7_usize;
    let mut pos_overflow = false;
    let mut cells = [Cell::EMPTY; 64];
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                if pos_overflow {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                file += add;
                if file == 8 {
                    pos_overflow = true;
                }
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(Rank::from_index(rank)));
                }
                if rank == 0 {
                    return Err(Error::Overflow);
                }
                rank -= 1;
                file = 0;
                pos_overflow = false;
            }
            _ => {
                if pos_overflow {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                let cell = Cell::from_char(b as char).ok_or(Error::UnexpectedChar(b as char))?;
                if cell.is_empty() {
                    return Err(Error::UnexpectedChar(b as char));
                }
                cells[Coord::from_parts(File::from_index(file), Rank::from_index(rank)).index()] =
                    cell;
                file += 1;
                if file == 8 {
                    pos_overflow = true;
                }
            }
        }
    }

    if file < 8 {
        return Err(Error::RankUnderflow(Rank::from_index(rank)));
    }
    if rank > 0 {
        return Err(Error::Underflow);
    }
    Ok(cells)
}

impl FromStr for Board {
    type Err = PlacementParseError;

    fn from_str(s: &str) -> Result<Board, Self::Err> {
        Board::from_placement(s)
    }
}

fn format_cells(cells: &[Cell; 64], f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for (i, rank) in (0..8).rev().map(Rank::from_index).enumerate() {
        if i != 0 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for file in File::iter() {
            let cell = cells[Coord::from_parts(file, rank).index()];
            if cell.is_empty() {
                empty += 1;
                continue;
            }
            if empty != 0 {
                write!(f, "{}", (b'0' + empty) as char)?;
                empty = 0;
            }
            write!(f, "{}", cell)?;
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.cells, f)
    }
}

/// Style for [`Board::pretty()`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrettyStyle {
    /// Use only ASCII characters
    Ascii,
    /// Use fancy Unicode characters for pieces and frames
    Utf8,
}

/// Wrapper to pretty-print the board
///
/// See [`Board::pretty()`] doc for details.
pub struct Pretty<'a> {
    board: &'a Board,
    style: PrettyStyle,
}

trait StyleTable {
    const HORZ_FRAME: char;
    const VERT_FRAME: char;
    const ANGLE_FRAME: char;

    fn cell(c: Cell) -> char;

    fn fmt(b: &Board, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for rank in (0..8).rev().map(Rank::from_index) {
            write!(f, "{}{}", rank.as_char(), Self::VERT_FRAME)?;
            for file in File::iter() {
                write!(f, "{}", Self::cell(b.get2(file, rank)))?;
            }
            writeln!(f)?;
        }
        write!(f, "{}{}", Self::HORZ_FRAME, Self::ANGLE_FRAME)?;
        for _ in File::iter() {
            write!(f, "{}", Self::HORZ_FRAME)?;
        }
        writeln!(f)?;
        write!(f, " {}", Self::VERT_FRAME)?;
        for file in File::iter() {
            write!(f, "{}", file.as_char())?;
        }
        writeln!(f)?;
        Ok(())
    }
}

struct AsciiStyleTable;
struct Utf8StyleTable;

impl StyleTable for AsciiStyleTable {
    const HORZ_FRAME: char = '-';
    const VERT_FRAME: char = '|';
    const ANGLE_FRAME: char = '+';

    fn cell(c: Cell) -> char {
        c.as_char()
    }
}

impl StyleTable for Utf8StyleTable {
    const HORZ_FRAME: char = '─';
    const VERT_FRAME: char = '│';
    const ANGLE_FRAME: char = '┼';

    fn cell(c: Cell) -> char {
        c.as_utf8_char()
    }
}

impl<'a> Display for Pretty<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.style {
            PrettyStyle::Ascii => AsciiStyleTable::fmt(self.board, f),
            PrettyStyle::Utf8 => Utf8StyleTable::fmt(self.board, f),
        }
    }
}
