mod base;
mod make;

pub mod uci;

pub use base::*;
pub use make::complete_move;

pub type UciMove = uci::Move;
