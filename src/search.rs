//! Adversarial search and single-ply move ranking.
//!
//! [`AlphaBeta`] is a fixed-depth minimax with alpha-beta pruning. Root moves are
//! scored in parallel on the rayon pool; scores come back in move-generation order
//! and the first maximum wins, so the chosen move never depends on thread timing.
//!
//! [`pick_best`] is the greedy counterpart used by the heuristic opponents.

use crate::{Evaluate, GameState, Outcome, Player};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

/// Score of a won position. Wins found sooner score higher.
pub const WIN_SCORE: i32 = 1_000_000;

/// Configures the global rayon pool used by root-parallel search.
///
/// `0` means one thread per logical CPU. Can only take effect once per process;
/// later calls are ignored.
pub fn init_thread_pool(num_threads: usize) {
    let threads = if num_threads == 0 { num_cpus::get() } else { num_threads };
    match ThreadPoolBuilder::new().num_threads(threads).build_global() {
        Ok(()) => debug!(threads, "search thread pool ready"),
        Err(e) => debug!(error = %e, "search thread pool already initialised"),
    }
}

/// Fixed-depth minimax with alpha-beta pruning.
#[derive(Debug, Clone, Copy)]
pub struct AlphaBeta {
    depth: u32,
    parallel: bool,
}

impl AlphaBeta {
    /// Creates a searcher looking `depth` plies ahead, scoring root moves in parallel.
    pub fn new(depth: u32) -> Self {
        Self {
            depth: depth.max(1),
            parallel: true,
        }
    }

    /// Same search on the calling thread only.
    pub fn sequential(depth: u32) -> Self {
        Self {
            parallel: false,
            ..Self::new(depth)
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Scores every legal root move from the mover's point of view, in generation order.
    pub fn score_moves<S: Evaluate>(&self, state: &S) -> Vec<(S::Move, i32)> {
        let root = state.get_current_player();
        let moves = state.get_possible_moves();
        let score = |mv: &S::Move| {
            let mut child = state.clone();
            child.apply_move(mv);
            minimax(&child, self.depth - 1, i32::MIN + 1, i32::MAX - 1, root)
        };
        let scores: Vec<i32> = if self.parallel && moves.len() > 1 {
            moves.par_iter().map(score).collect()
        } else {
            moves.iter().map(score).collect()
        };
        moves.into_iter().zip(scores).collect()
    }

    /// Returns the best move for the player to move, or `None` when there is none.
    pub fn best_move<S: Evaluate>(&self, state: &S) -> Option<S::Move> {
        let scored = self.score_moves(state);
        let best = first_max(scored.iter().map(|(_, s)| *s))?;
        let (mv, score) = scored.into_iter().nth(best)?;
        debug!(?mv, score, depth = self.depth, "alpha-beta choice");
        Some(mv)
    }
}

/// Minimax value of `state` for `root`. Handles games where a player may move twice
/// in a row: a node maximizes whenever `root` is the side to move.
fn minimax<S: Evaluate>(state: &S, depth: u32, mut alpha: i32, mut beta: i32, root: Player) -> i32 {
    match state.outcome() {
        Outcome::Win(p) if p == root => return WIN_SCORE + depth as i32,
        Outcome::Win(_) => return -WIN_SCORE - depth as i32,
        Outcome::Draw(_) => return 0,
        Outcome::InProgress => {}
    }
    if depth == 0 {
        return state.evaluate(root);
    }
    let moves = state.get_possible_moves();
    if moves.is_empty() {
        return state.evaluate(root);
    }

    if state.get_current_player() == root {
        let mut best = i32::MIN + 1;
        for mv in &moves {
            let mut child = state.clone();
            child.apply_move(mv);
            best = best.max(minimax(&child, depth - 1, alpha, beta, root));
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }
        best
    } else {
        let mut best = i32::MAX - 1;
        for mv in &moves {
            let mut child = state.clone();
            child.apply_move(mv);
            best = best.min(minimax(&child, depth - 1, alpha, beta, root));
            beta = beta.min(best);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

/// Index of the first maximum.
fn first_max(scores: impl Iterator<Item = i32>) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (i, s) in scores.enumerate() {
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}

/// Greedy single-ply choice: scores each candidate and returns the first maximum.
pub fn pick_best<M: Clone>(moves: &[M], mut score: impl FnMut(&M) -> i64) -> Option<M> {
    let mut best: Option<(&M, i64)> = None;
    for mv in moves {
        let s = score(mv);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((mv, s));
        }
    }
    best.map(|(mv, _)| mv.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect4::{Connect4Move, Connect4State};
    use crate::GameState;

    #[test]
    fn pick_best_prefers_first_on_ties() {
        let moves = vec![3, 1, 2, 4];
        assert_eq!(pick_best(&moves, |m| if *m > 2 { 5 } else { 0 }), Some(3));
        assert_eq!(pick_best::<i32>(&[], |_| 0), None);
    }

    #[test]
    fn takes_immediate_win() {
        let mut game = Connect4State::new(7, 6, 4);
        for col in [0, 0, 1, 1, 2, 2] {
            game.apply_move(&Connect4Move(col));
        }
        assert_eq!(AlphaBeta::new(3).best_move(&game), Some(Connect4Move(3)));
    }

    #[test]
    fn blocks_opponent_threat() {
        let mut game = Connect4State::new(7, 6, 4);
        // Player 1 threatens to finish 0..=3 on the bottom row; player 2 must block at 3.
        for col in [0, 6, 1, 6, 2] {
            game.apply_move(&Connect4Move(col));
        }
        assert_eq!(AlphaBeta::new(4).best_move(&game), Some(Connect4Move(3)));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let mut game = Connect4State::new(7, 6, 4);
        for col in [3, 2, 4] {
            game.apply_move(&Connect4Move(col));
        }
        let par = AlphaBeta::new(4).score_moves(&game);
        let seq = AlphaBeta::sequential(4).score_moves(&game);
        assert_eq!(par, seq);
    }
}
