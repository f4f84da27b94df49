//! # Game Controller Module - Central Game State Management
//!
//! The `GameController` owns the authoritative game state. Front-ends and AI
//! workers never mutate it directly:
//!
//! - **Authoritative state**: owned here, every human move is validated first
//! - **Search states**: clones handed out by [`GameController::get_state_for_search`]
//! - **Render states**: borrowed through [`GameController::get_render_state`]
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      GameController                        │
//! │   authoritative GameWrapper · history · undo snapshots     │
//! │                            │                               │
//! │            ┌───────────────┼───────────────┐               │
//! │            ▼               ▼               ▼               │
//! │      AI (clone)     front-end (view)   input (requests)    │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected move comes back as [`MoveResult::Invalid`] and leaves the state,
//! the history and the undo stack untouched.

use crate::game_wrapper::{EffectsWrapper, GameKind, GameWrapper, MoveWrapper};
use crate::{Coord, GameRng, GameState, MoveError, Outcome, Player};
use std::time::SystemTime;
use tracing::{debug, info};

/// Result of attempting to apply a move
#[derive(Debug, Clone, PartialEq)]
pub enum MoveResult {
    /// Move was applied
    Success {
        move_made: MoveWrapper,
        /// Player who made the move
        player: Player,
        /// What the move changed, for animation
        effects: EffectsWrapper,
        /// Game outcome after the move
        outcome: Outcome,
    },
    /// Move was rejected; nothing changed
    Invalid { reason: MoveError },
    /// Game is already over, no more moves allowed
    GameOver,
}

impl MoveResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MoveResult::Success { .. })
    }
}

/// A single entry in the move history
#[derive(Debug, Clone, PartialEq)]
pub struct MoveHistoryEntry {
    pub timestamp: SystemTime,
    pub player: Player,
    pub move_made: MoveWrapper,
    pub effects: EffectsWrapper,
    /// 1-indexed
    pub move_number: usize,
}

/// Owner of the authoritative game state.
///
/// ```rust,ignore
/// let mut controller = GameController::new(GameWrapper::new_game(GameKind::Chess, &config));
/// match controller.try_make_move(mv) {
///     MoveResult::Success { effects, outcome, .. } => { /* animate effects */ }
///     MoveResult::Invalid { reason } => { /* show reason */ }
///     MoveResult::GameOver => {}
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GameController {
    game_state: GameWrapper,
    /// Position the game started from, for restarts
    initial_state: GameWrapper,
    move_history: Vec<MoveHistoryEntry>,
    /// State before each recorded move, parallel to `move_history`
    undo_stack: Vec<GameWrapper>,
    status: Outcome,
}

impl GameController {
    pub fn new(initial_state: GameWrapper) -> Self {
        let status = initial_state.outcome();
        info!(game = %initial_state.kind(), "game started");
        Self {
            initial_state: initial_state.clone(),
            game_state: initial_state,
            move_history: Vec::new(),
            undo_stack: Vec::new(),
            status,
        }
    }

    pub fn kind(&self) -> GameKind {
        self.game_state.kind()
    }

    /// Validates a move without applying it.
    pub fn validate_move(&self, mv: &MoveWrapper) -> Result<(), MoveError> {
        if self.status.is_over() {
            return Err(MoveError::GameOver);
        }
        if mv.kind() != self.game_state.kind() {
            return Err(MoveError::MismatchedGameType);
        }
        if !self.game_state.is_legal(mv) {
            return Err(MoveError::IllegalMove(mv.to_string()));
        }
        Ok(())
    }

    /// Validates and applies a move.
    pub fn try_make_move(&mut self, mv: MoveWrapper) -> MoveResult {
        if self.status.is_over() {
            return MoveResult::GameOver;
        }
        let before = self.game_state.clone();
        let player = self.game_state.get_current_player();
        match self.game_state.make_move(&mv) {
            Ok(effects) => self.record(before, player, mv, effects),
            Err(MoveError::GameOver) => MoveResult::GameOver,
            Err(reason) => {
                debug!(%mv, %reason, "move rejected");
                MoveResult::Invalid { reason }
            }
        }
    }

    /// Applies a move produced by the engine's own AI without a legality check.
    ///
    /// Moves of another game are still rejected.
    pub fn apply_trusted_move(&mut self, mv: MoveWrapper) -> MoveResult {
        if self.status.is_over() {
            return MoveResult::GameOver;
        }
        if mv.kind() != self.game_state.kind() {
            return MoveResult::Invalid {
                reason: MoveError::MismatchedGameType,
            };
        }
        let before = self.game_state.clone();
        let player = self.game_state.get_current_player();
        let effects = self.game_state.apply_move(&mv);
        self.record(before, player, mv, effects)
    }

    fn record(&mut self, before: GameWrapper, player: Player, mv: MoveWrapper, effects: EffectsWrapper) -> MoveResult {
        let move_number = self.move_history.len() + 1;
        debug!(move_number, player, %mv, "move applied");
        self.undo_stack.push(before);
        self.move_history.push(MoveHistoryEntry {
            timestamp: SystemTime::now(),
            player,
            move_made: mv.clone(),
            effects: effects.clone(),
            move_number,
        });
        self.status = self.game_state.outcome();
        if self.status.is_over() {
            info!(game = %self.kind(), outcome = ?self.status, moves = move_number, "game finished");
        }
        MoveResult::Success {
            move_made: mv,
            player,
            effects,
            outcome: self.status,
        }
    }

    /// Takes back the last move, returning it.
    pub fn undo(&mut self) -> Result<MoveWrapper, MoveError> {
        let previous = self.undo_stack.pop().ok_or(MoveError::NothingToUndo)?;
        let entry = self.move_history.pop().ok_or(MoveError::NothingToUndo)?;
        self.game_state = previous;
        self.status = self.game_state.outcome();
        debug!(move_number = entry.move_number, mv = %entry.move_made, "move undone");
        Ok(entry.move_made)
    }

    /// Computer move for the side to move on a clone of the state.
    pub fn ai_move(&self, rng: &mut GameRng) -> Option<MoveWrapper> {
        if self.status.is_over() {
            return None;
        }
        self.game_state.ai_move(rng)
    }

    /// Suggested move for a human player.
    pub fn hint(&self, rng: &mut GameRng) -> Option<MoveWrapper> {
        if self.status.is_over() {
            return None;
        }
        self.game_state.hint(rng)
    }

    /// Clone of the state that search may modify freely.
    pub fn get_state_for_search(&self) -> GameWrapper {
        self.game_state.clone()
    }

    pub fn get_render_state(&self) -> &GameWrapper {
        &self.game_state
    }

    pub fn get_current_player(&self) -> Player {
        self.game_state.get_current_player()
    }

    pub fn get_status(&self) -> Outcome {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_over()
    }

    pub fn get_winner(&self) -> Option<Player> {
        self.status.winner()
    }

    pub fn get_move_history(&self) -> &[MoveHistoryEntry] {
        &self.move_history
    }

    pub fn move_count(&self) -> usize {
        self.move_history.len()
    }

    pub fn get_last_move(&self) -> Option<&MoveHistoryEntry> {
        self.move_history.last()
    }

    /// Legal moves for the side to move, optionally only those of the piece on `origin`.
    pub fn get_legal_moves(&self, origin: Option<Coord>) -> Vec<MoveWrapper> {
        if self.status.is_over() {
            Vec::new()
        } else {
            self.game_state.legal_moves(origin)
        }
    }

    /// Starts over from the position this controller was created with.
    pub fn restart(&mut self) {
        let initial = self.initial_state.clone();
        self.reset(initial);
    }

    /// Replaces the game, clearing history and undo snapshots.
    pub fn reset(&mut self, new_state: GameWrapper) {
        info!(game = %new_state.kind(), "game started");
        self.status = new_state.outcome();
        self.initial_state = new_state.clone();
        self.game_state = new_state;
        self.move_history.clear();
        self.undo_stack.clear();
    }

    pub fn player_name(&self, player: Player) -> String {
        self.game_state.player_name(player)
    }

    /// Move list as plain text, one numbered line per move, with the result.
    pub fn format_history(&self) -> String {
        if self.move_history.is_empty() {
            return String::from("No moves made yet.");
        }

        let mut output = format!("=== {} Game History ===\n\n", self.kind());
        for entry in &self.move_history {
            output.push_str(&format!(
                "{}. {} - {} ({})\n",
                entry.move_number,
                self.player_name(entry.player),
                entry.move_made,
                entry.effects
            ));
        }

        match self.status {
            Outcome::Win(winner) => {
                output.push_str(&format!("\nResult: {} wins!\n", self.player_name(winner)));
            }
            Outcome::Draw(reason) => {
                output.push_str(&format!("\nResult: Draw ({:?})\n", reason));
            }
            Outcome::InProgress => {
                output.push_str(&format!(
                    "\n(Game in progress - {} to move)\n",
                    self.player_name(self.get_current_player())
                ));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::games::connect4::Connect4Move;

    fn connect4() -> GameController {
        GameController::new(GameWrapper::new_game(GameKind::Connect4, &ArenaConfig::default()))
    }

    fn drop_in(col: usize) -> MoveWrapper {
        MoveWrapper::Connect4(Connect4Move(col))
    }

    #[test]
    fn test_valid_move() {
        let mut controller = connect4();
        match controller.try_make_move(drop_in(3)) {
            MoveResult::Success { player, outcome, .. } => {
                assert_eq!(player, 1);
                assert_eq!(outcome, Outcome::InProgress);
            }
            other => panic!("Expected successful move, got {:?}", other),
        }
        assert_eq!(controller.get_current_player(), -1);
    }

    #[test]
    fn test_invalid_move_leaves_everything() {
        let mut controller = connect4();
        controller.try_make_move(drop_in(0));
        let before = controller.get_state_for_search();

        match controller.try_make_move(drop_in(9)) {
            MoveResult::Invalid { .. } => {}
            other => panic!("Expected invalid move, got {:?}", other),
        }
        let wrong_game = MoveWrapper::Chess("e2e4".parse().unwrap());
        assert_eq!(
            controller.try_make_move(wrong_game.clone()),
            MoveResult::Invalid {
                reason: MoveError::MismatchedGameType
            }
        );
        assert!(!controller.apply_trusted_move(wrong_game).is_success());
        assert_eq!(controller.get_render_state(), &before);
        assert_eq!(controller.move_count(), 1);
    }

    #[test]
    fn test_move_history() {
        let mut controller = connect4();
        controller.try_make_move(drop_in(3));
        controller.try_make_move(drop_in(4));

        let history = controller.get_move_history();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].player, history[0].move_number), (1, 1));
        assert_eq!((history[1].player, history[1].move_number), (-1, 2));
    }

    #[test]
    fn test_undo_restores_state() {
        let mut controller = connect4();
        let start = controller.get_state_for_search();
        controller.try_make_move(drop_in(3));
        controller.try_make_move(drop_in(3));

        assert_eq!(controller.undo(), Ok(drop_in(3)));
        assert_eq!(controller.undo(), Ok(drop_in(3)));
        assert_eq!(controller.undo(), Err(MoveError::NothingToUndo));
        assert_eq!(controller.get_render_state(), &start);
        assert_eq!(controller.move_count(), 0);
    }

    #[test]
    fn test_win_then_game_over() {
        let mut controller = connect4();
        for col in [0, 1, 0, 1, 0, 1] {
            assert!(controller.try_make_move(drop_in(col)).is_success());
        }
        match controller.try_make_move(drop_in(0)) {
            MoveResult::Success { outcome, .. } => assert_eq!(outcome, Outcome::Win(1)),
            other => panic!("Expected winning move, got {:?}", other),
        }
        assert_eq!(controller.get_winner(), Some(1));
        assert_eq!(controller.try_make_move(drop_in(2)), MoveResult::GameOver);
        assert!(controller.get_legal_moves(None).is_empty());
        assert!(controller.hint(&mut GameRng::new(0)).is_none());

        controller.undo().unwrap();
        assert!(!controller.is_game_over());
    }

    #[test]
    fn test_restart() {
        let mut controller = connect4();
        controller.try_make_move(drop_in(3));
        controller.restart();
        assert_eq!(controller.move_count(), 0);
        assert_eq!(controller.get_status(), Outcome::InProgress);
        assert_eq!(controller.undo(), Err(MoveError::NothingToUndo));
    }

    #[test]
    fn test_format_history() {
        let mut controller = connect4();
        assert_eq!(controller.format_history(), "No moves made yet.");
        controller.try_make_move(drop_in(3));

        let history = controller.format_history();
        assert!(history.contains("Connect 4 Game History"));
        assert!(history.contains("1. Red - 3"));
        assert!(history.contains("Yellow to move"));
    }
}
