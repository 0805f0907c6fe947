//! Client for external engines speaking UCI
//!
//! The engine runs as a child process. Commands are written into its standard input, and its
//! standard output is read line by line by a separate thread. All the public methods are blocking,
//! but each wait is bounded by [`EngineOptions::timeout`].

mod client;
mod process;

pub use client::Engine;

use crate::history::MoveHistory;
use crate::moves::uci;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default search depth passed to `go depth`
pub const DEFAULT_DEPTH: u32 = 10;

/// Default bound for a single wait for the engine reply
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error communicating with the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process cannot be started
    #[error("cannot spawn engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Reading or writing the pipes failed
    #[error("engine i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The expected reply didn't arrive in time
    #[error("engine didn't reply {expected:?} in {after:?}")]
    Timeout {
        expected: &'static str,
        after: Duration,
    },
    /// The engine closed its output before sending the expected reply
    #[error("engine closed its output while {expected:?} was expected")]
    Closed { expected: &'static str },
    /// The engine replied with a move which cannot be applied to the current board
    #[error("bad move {text:?} from engine: {source}")]
    BadMove {
        text: String,
        #[source]
        source: uci::ParseError,
    },
    /// The engine has no move to play
    #[error("engine has no move")]
    NoMove,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Path to the engine executable, which is started without arguments
    pub path: PathBuf,
    /// Search depth
    pub depth: u32,
    /// Bound for a single wait for the engine reply, `None` to wait forever
    pub timeout: Option<Duration>,
}

impl EngineOptions {
    pub fn new(path: impl Into<PathBuf>) -> EngineOptions {
        EngineOptions {
            path: path.into(),
            depth: DEFAULT_DEPTH,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Builds the `position` command which replays `history` from the initial position
///
/// Each move is followed by a single space, so the command ends with a space if history is
/// non-empty.
pub fn position_command(history: &MoveHistory) -> String {
    format!("position startpos moves {}", history.uci_list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::moves::Move;

    #[test]
    fn test_position_command() {
        let b = Board::initial();
        let mut h = MoveHistory::new();
        assert_eq!(position_command(&h), "position startpos moves ");
        h.push(Move::from_uci("e2e4", &b).unwrap());
        assert_eq!(position_command(&h), "position startpos moves e2e4 ");
        h.push(Move::from_uci("c7c5", &b).unwrap());
        assert_eq!(position_command(&h), "position startpos moves e2e4 c7c5 ");
    }

    #[test]
    fn test_options() {
        let o = EngineOptions::new("/usr/bin/stockfish");
        assert_eq!(o.path, PathBuf::from("/usr/bin/stockfish"));
        assert_eq!(o.depth, 10);
        assert_eq!(o.timeout, Some(Duration::from_secs(30)));
    }
}
