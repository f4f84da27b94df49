//! # Board Arena
//!
//! Rule engines and AI opponents for ten two-player board games. Each game
//! implements the [`GameState`] trait so that front-ends, the
//! [`game_controller::GameController`] and the [`search`] module can drive any
//! of them through one interface.
//!
//! Rendering, input handling and animation live outside this crate; a front-end
//! asks for legal moves, submits one, and renders the returned effects.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

pub mod config;
pub mod error;
pub mod game_controller;
pub mod game_wrapper;
pub mod games;
pub mod rng;
pub mod search;

pub use error::MoveError;
pub use rng::GameRng;

/// Player identifier. Two-player games use `1` and `-1`; Ludo numbers its colors `1..=4`.
pub type Player = i32;

/// Board coordinate as `(row, col)`.
pub type Coord = (usize, usize);

/// Why a finished game has no winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawReason {
    /// No empty cell remains and nobody completed a line.
    BoardFull,
    /// Final counts (pieces, stones, points) are tied.
    EqualScore,
    /// The side to move has no legal move but is not in check.
    Stalemate,
    /// Neither side has enough material left to force a win.
    InsufficientMaterial,
    /// Too many plies passed without a capture or pawn move.
    NoProgress,
}

/// Answer of the terminal-state detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Win(Player),
    Draw(DrawReason),
}

impl Outcome {
    /// Returns true once the game has ended, with or without a winner.
    pub fn is_over(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// The winning player, if there is one.
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Win(p) => Some(*p),
            _ => None,
        }
    }
}

/// The state of a game. Must be cloneable so search can explore copies.
/// `Send` and `Sync` are required for parallel search.
pub trait GameState: Clone + Send + Sync {
    /// The type of a move in the game.
    type Move: Clone + Eq + Hash + Debug + Send + Sync;
    /// Structured description of what a move changed, for the front-end to animate.
    type Effects: Clone + Debug + Send;

    /// Number of players seated at this game.
    fn get_num_players(&self) -> i32 {
        2
    }

    /// Returns the player whose turn it is to move.
    fn get_current_player(&self) -> Player;

    /// Returns every legal move for the player to move. Empty once the game is over.
    fn get_possible_moves(&self) -> Vec<Self::Move>;

    /// The board cell a move starts from, for games where pieces move.
    /// Placement and action games return `None`.
    fn move_origin(&self, _mv: &Self::Move) -> Option<Coord> {
        None
    }

    /// Legal moves for the piece standing on `origin`.
    fn get_moves_from(&self, origin: Coord) -> Vec<Self::Move> {
        self.get_possible_moves()
            .into_iter()
            .filter(|mv| self.move_origin(mv) == Some(origin))
            .collect()
    }

    /// Legal moves, optionally restricted to a selected origin.
    fn legal_moves(&self, origin: Option<Coord>) -> Vec<Self::Move> {
        match origin {
            Some(o) => self.get_moves_from(o),
            None => self.get_possible_moves(),
        }
    }

    /// Checks if a move is legal in the current state.
    fn is_legal(&self, mv: &Self::Move) -> bool {
        !self.is_terminal() && self.get_possible_moves().contains(mv)
    }

    /// Applies a move without validating it.
    ///
    /// Deterministic given the state and the move; search replays it on clones.
    /// Callers outside search must go through [`GameState::make_move`].
    fn apply_move(&mut self, mv: &Self::Move) -> Self::Effects;

    /// Validates and applies a move. On error the state is left untouched.
    fn make_move(&mut self, mv: &Self::Move) -> Result<Self::Effects, MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if !self.is_legal(mv) {
            return Err(MoveError::IllegalMove(format!("{:?}", mv)));
        }
        Ok(self.apply_move(mv))
    }

    /// Terminal-state detector.
    fn outcome(&self) -> Outcome;

    /// Returns true if the game is over.
    fn is_terminal(&self) -> bool {
        self.outcome().is_over()
    }

    /// Returns the winner of the game, if any.
    fn get_winner(&self) -> Option<Player> {
        self.outcome().winner()
    }
}

/// Games that can be set up from a configuration.
pub trait NewGame: GameState + Sized {
    type Config: Default + Clone;

    fn new_game(config: &Self::Config) -> Self;
}

/// Games with a computer opponent.
pub trait AiPlayer: GameState {
    /// Chooses a move for the player to move.
    ///
    /// Returns `None` when the player has nothing to play; callers treat that as a
    /// pass or turn skip, never as a failure.
    fn ai_move(&self, rng: &mut GameRng) -> Option<Self::Move>;
}

/// Static evaluation used at the leaves of [`search::AlphaBeta`].
pub trait Evaluate: GameState {
    /// Heuristic score of the position from `player`'s point of view.
    fn evaluate(&self, player: Player) -> i32;
}
