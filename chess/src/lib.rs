//! # duelchess
//!
//! Chess rules together with a client for external engines, to play a game of chess against
//! an engine speaking UCI.
//!
//! The crate consists of:
//!
//! - board model ([`Board`]), which stores pieces as sprite ids ([`Cell`])
//! - move generation ([`movegen`]), with pseudo-legal and legal flavors
//! - check detection ([`attack`]) and legality checks ([`legal`], [`castling`], [`pawns`])
//! - game session ([`GameSession`]), which applies moves and records them into [`MoveHistory`]
//! - engine client ([`engine`]) and the turn machine ([`turn`]) which drives the game
//!
//! # Example
//!
//! ```
//! use duelchess::{Color, GameSession, Outcome};
//!
//! let mut session = GameSession::new();
//! for (src, dst) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4")] {
//!     session.make_move(src.parse().unwrap(), dst.parse().unwrap()).unwrap();
//! }
//! let outcome = session.make_move("d8".parse().unwrap(), "h4".parse().unwrap()).unwrap();
//! assert_eq!(outcome, Some(Outcome::Checkmate { winner: Color::Black }));
//! ```

pub mod attack;
pub mod board;
pub mod castling;
pub mod engine;
pub mod history;
pub mod legal;
pub mod movegen;
pub mod moves;
pub mod pawns;
pub mod session;
pub mod turn;

pub use duelchess_base::{bitboard, geometry, types};

pub use bitboard::Bitboard;
pub use board::Board;
pub use engine::{Engine, EngineError, EngineOptions};
pub use history::MoveHistory;
pub use movegen::DestList;
pub use moves::{Move, UciMove};
pub use session::{GameSession, IllegalMoveError};
pub use turn::{Game, Opponent, TurnError, TurnState};
pub use types::{CastlingSide, Cell, Color, Coord, File, Outcome, Piece, Rank};
