//! Turn-taking between the player and the opponent
//!
//! The player always plays White. Each move is animated for a fixed time window before it's applied
//! to the board. The state machine doesn't read the clock itself: the current time is passed into
//! each call, so the front end decides how often to poll it.

use crate::engine::EngineError;
use crate::movegen::DestList;
use crate::moves::{self, Move};
use crate::session::{GameSession, IllegalMoveError};
use crate::types::{Color, Coord, Outcome};

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// Default duration of the move animation
pub const DEFAULT_ANIMATION: Duration = Duration::from_millis(500);

/// Color played by the human
pub const PLAYER: Color = Color::White;

/// Source of the opponent's moves
pub trait Opponent {
    /// Returns the move to play in the current position of `session`
    fn reply(&mut self, session: &GameSession) -> Result<Move, EngineError>;
}

/// State of the turn machine
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// Waiting for the player to choose a move
    AwaitingMove,
    /// The player's move is being animated
    MovingPlayer,
    /// The opponent's move is being animated
    MovingOpponent,
    /// The game ended with checkmate
    Checkmate,
    /// The game ended with stalemate
    Stalemate,
}

impl TurnState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Checkmate | TurnState::Stalemate)
    }
}

/// Error returned by [`Game`]
#[derive(Debug, Error)]
pub enum TurnError {
    /// The player cannot move in this state
    #[error("cannot move in state {0:?}")]
    Busy(TurnState),
    /// No piece is selected
    #[error("no piece selected")]
    NoSelection,
    /// The player's move is illegal
    #[error("illegal move: {0}")]
    Illegal(#[from] IllegalMoveError),
    /// The opponent failed to reply
    #[error("opponent failed: {0}")]
    Opponent(#[from] EngineError),
    /// The opponent replied with an illegal move
    #[error("opponent replied with illegal move {mv}: {source}")]
    IllegalReply {
        mv: Move,
        #[source]
        source: IllegalMoveError,
    },
}

/// Game between the player and an [`Opponent`]
pub struct Game<O> {
    session: GameSession,
    state: TurnState,
    pending: Option<Move>,
    started: Option<Instant>,
    animation: Duration,
    outcome: Option<Outcome>,
    opponent: O,
}

impl<O: Opponent> Game<O> {
    /// Starts a new game from the initial position
    pub fn new(opponent: O) -> Game<O> {
        Game::with_session(GameSession::new(), opponent)
    }

    /// Starts a game from the given session, which must have White to move
    pub fn with_session(session: GameSession, opponent: O) -> Game<O> {
        Game {
            session,
            state: TurnState::AwaitingMove,
            pending: None,
            started: None,
            animation: DEFAULT_ANIMATION,
            outcome: None,
            opponent,
        }
    }

    /// Sets the duration of the move animation
    pub fn with_animation(mut self, animation: Duration) -> Game<O> {
        self.animation = animation;
        self
    }

    #[inline]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    #[inline]
    pub fn state(&self) -> TurnState {
        self.state
    }

    #[inline]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[inline]
    pub fn opponent(&self) -> &O {
        &self.opponent
    }

    #[inline]
    pub fn opponent_mut(&mut self) -> &mut O {
        &mut self.opponent
    }

    /// Returns the move being animated
    #[inline]
    pub fn pending(&self) -> Option<Move> {
        self.pending
    }

    /// Selects the piece on `c` and returns its legal destinations
    pub fn select(&mut self, c: Coord) -> Result<&DestList, TurnError> {
        if self.state != TurnState::AwaitingMove {
            return Err(TurnError::Busy(self.state));
        }
        Ok(self.session.select(c))
    }

    /// Moves the selected piece to `dst`
    pub fn submit(&mut self, dst: Coord, now: Instant) -> Result<(), TurnError> {
        let src = self.session.selected().ok_or(TurnError::NoSelection)?;
        self.play(src, dst, now)
    }

    /// Starts the player's move from `src` to `dst`
    ///
    /// The move is validated immediately, but applied to the board only after the animation.
    pub fn play(&mut self, src: Coord, dst: Coord, now: Instant) -> Result<(), TurnError> {
        if self.state != TurnState::AwaitingMove {
            return Err(TurnError::Busy(self.state));
        }
        let mv = self.session.check_move(src, dst)?;
        self.session.clear_selection();
        self.start(mv, TurnState::MovingPlayer, now);
        Ok(())
    }

    /// Advances the game to time `now` and returns the new state
    ///
    /// When the player's animation ends, the move is applied and the opponent is asked for the
    /// reply. If the opponent fails, the error is returned and the next call asks it again.
    pub fn tick(&mut self, now: Instant) -> Result<TurnState, TurnError> {
        match self.state {
            TurnState::MovingPlayer => {
                if let Some(mv) = self.pending {
                    if !self.is_animation_done(now) {
                        return Ok(self.state);
                    }
                    self.pending = None;
                    if self.apply(mv) {
                        return Ok(self.state);
                    }
                }
                let reply = self.opponent.reply(&self.session)?;
                let mv = self
                    .session
                    .check_move(reply.src(), reply.dst())
                    .map_err(|source| TurnError::IllegalReply { mv: reply, source })?;
                self.start(mv, TurnState::MovingOpponent, now);
            }
            TurnState::MovingOpponent => {
                if self.is_animation_done(now) {
                    if let Some(mv) = self.pending.take() {
                        if !self.apply(mv) {
                            self.set_state(TurnState::AwaitingMove);
                        }
                    }
                }
            }
            TurnState::AwaitingMove | TurnState::Checkmate | TurnState::Stalemate => {}
        }
        Ok(self.state)
    }

    /// Returns the move being animated together with the animation progress from 0 to 1
    pub fn progress(&self, now: Instant) -> Option<(Move, f32)> {
        let mv = self.pending?;
        let started = self.started?;
        if self.animation.is_zero() {
            return Some((mv, 1.0));
        }
        let elapsed = now.saturating_duration_since(started);
        let frac = elapsed.as_secs_f32() / self.animation.as_secs_f32();
        Some((mv, frac.min(1.0)))
    }

    fn is_animation_done(&self, now: Instant) -> bool {
        match self.started {
            Some(started) => now.saturating_duration_since(started) >= self.animation,
            None => true,
        }
    }

    fn start(&mut self, mv: Move, state: TurnState, now: Instant) {
        self.pending = Some(mv);
        self.started = Some(now);
        self.set_state(state);
        debug!(%mv, "animation started");
    }

    fn set_state(&mut self, state: TurnState) {
        debug!(from = ?self.state, to = ?state, "turn state changed");
        self.state = state;
    }

    /// Applies the move, returns `true` if the game is over
    fn apply(&mut self, mv: Move) -> bool {
        let outcome = match moves::complete_move(&mut self.session, mv) {
            Some(outcome) => outcome,
            None => return false,
        };
        self.outcome = Some(outcome);
        self.set_state(match outcome {
            Outcome::Checkmate { .. } => TurnState::Checkmate,
            Outcome::Stalemate => TurnState::Stalemate,
        });
        true
    }
}
