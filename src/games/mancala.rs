//! # Mancala (Kalah) Game Implementation
//!
//! ## Board layout
//! ```text
//!        12 11 10  9  8  7
//!    13                     6
//!         0  1  2  3  4  5
//! ```
//! Player 1 owns pits 0-5 and the store at 6, player -1 owns pits 7-12 and the
//! store at 13. Sowing runs counter-clockwise in index order.
//!
//! ## Rules
//! - Pick a non-empty pit on your side and sow its stones one per pit
//! - The opponent's store is skipped
//! - Ending in your own store grants another turn
//! - Ending in an empty pit on your side captures that stone together with the
//!   opposite pit into your store, when the opposite pit holds stones
//! - When either row is empty, each side sweeps its remaining stones into its
//!   own store and the larger store wins

use crate::search::pick_best;
use crate::{AiPlayer, DrawReason, GameRng, GameState, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PITS: usize = 14;
const STORE_1: usize = 6;
const STORE_2: usize = 13;

/// Sow from the pit with this index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct MancalaMove(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MancalaConfig {
    pub stones_per_pit: u32,
}

impl Default for MancalaConfig {
    fn default() -> Self {
        Self { stones_per_pit: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MancalaCapture {
    pub pit: usize,
    pub opposite: usize,
    pub stones: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MancalaEffects {
    pub player: Player,
    /// Pits that received a stone, in sowing order
    pub sown: Vec<usize>,
    pub extra_turn: bool,
    pub capture: Option<MancalaCapture>,
    /// Stones moved into each store by the end-of-game sweep as (player 1, player -1)
    pub swept: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MancalaState {
    pits: [u32; PITS],
    current_player: Player,
}

fn store_of(player: Player) -> usize {
    if player == 1 {
        STORE_1
    } else {
        STORE_2
    }
}

fn side_of(player: Player) -> std::ops::Range<usize> {
    if player == 1 {
        0..STORE_1
    } else {
        7..STORE_2
    }
}

impl GameState for MancalaState {
    type Move = MancalaMove;
    type Effects = MancalaEffects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_moves(&self) -> Vec<MancalaMove> {
        if self.rows_empty() {
            return Vec::new();
        }
        side_of(self.current_player)
            .filter(|&p| self.pits[p] > 0)
            .map(MancalaMove)
            .collect()
    }

    fn is_legal(&self, mv: &MancalaMove) -> bool {
        !self.rows_empty() && side_of(self.current_player).contains(&mv.0) && self.pits[mv.0] > 0
    }

    fn apply_move(&mut self, mv: &MancalaMove) -> MancalaEffects {
        let player = self.current_player;
        let skip = store_of(-player);
        let mut stones = std::mem::take(&mut self.pits[mv.0]);
        let mut pos = mv.0;
        let mut sown = Vec::with_capacity(stones as usize);
        while stones > 0 {
            pos = (pos + 1) % PITS;
            if pos == skip {
                continue;
            }
            self.pits[pos] += 1;
            sown.push(pos);
            stones -= 1;
        }

        let extra_turn = !sown.is_empty() && pos == store_of(player);
        let mut capture = None;
        if !sown.is_empty() && side_of(player).contains(&pos) && self.pits[pos] == 1 {
            let opposite = 12 - pos;
            if self.pits[opposite] > 0 {
                let taken = self.pits[opposite] + 1;
                self.pits[opposite] = 0;
                self.pits[pos] = 0;
                self.pits[store_of(player)] += taken;
                capture = Some(MancalaCapture {
                    pit: pos,
                    opposite,
                    stones: taken,
                });
            }
        }

        if !extra_turn {
            self.current_player = -player;
        }

        let swept = if self.rows_empty() { Some(self.sweep()) } else { None };

        MancalaEffects {
            player,
            sown,
            extra_turn,
            capture,
            swept,
        }
    }

    fn outcome(&self) -> Outcome {
        if !self.rows_empty() {
            return Outcome::InProgress;
        }
        let (one, two) = self.final_totals();
        match one.cmp(&two) {
            std::cmp::Ordering::Greater => Outcome::Win(1),
            std::cmp::Ordering::Less => Outcome::Win(-1),
            std::cmp::Ordering::Equal => Outcome::Draw(DrawReason::EqualScore),
        }
    }
}

impl NewGame for MancalaState {
    type Config = MancalaConfig;

    fn new_game(config: &MancalaConfig) -> Self {
        let mut pits = [config.stones_per_pit; PITS];
        pits[STORE_1] = 0;
        pits[STORE_2] = 0;
        Self {
            pits,
            current_player: 1,
        }
    }
}

impl AiPlayer for MancalaState {
    /// Greedy single ply: +10 for ending in the store, twice the captured
    /// opposite stones, plus the number of stones picked up.
    fn ai_move(&self, _rng: &mut GameRng) -> Option<MancalaMove> {
        pick_best(&self.get_possible_moves(), |mv| {
            let mut sim = self.clone();
            let fx = sim.apply_move(mv);
            let mut score = self.pits[mv.0] as i64;
            if fx.extra_turn {
                score += 10;
            }
            if let Some(c) = fx.capture {
                score += 2 * (c.stones as i64 - 1);
            }
            score
        })
    }
}

impl MancalaState {
    /// Builds a position from raw pit counts.
    pub fn from_pits(pits: [u32; PITS], current_player: Player) -> Self {
        Self { pits, current_player }
    }

    pub fn pits(&self) -> &[u32; PITS] {
        &self.pits
    }

    /// Store contents as (player 1, player -1).
    pub fn stores(&self) -> (u32, u32) {
        (self.pits[STORE_1], self.pits[STORE_2])
    }

    fn rows_empty(&self) -> bool {
        side_of(1).all(|p| self.pits[p] == 0) || side_of(-1).all(|p| self.pits[p] == 0)
    }

    /// Store totals after the end-of-game sweep, without mutating.
    fn final_totals(&self) -> (u32, u32) {
        let one: u32 = self.pits[STORE_1] + side_of(1).map(|p| self.pits[p]).sum::<u32>();
        let two: u32 = self.pits[STORE_2] + side_of(-1).map(|p| self.pits[p]).sum::<u32>();
        (one, two)
    }

    fn sweep(&mut self) -> (u32, u32) {
        let mut moved = (0, 0);
        for p in side_of(1) {
            moved.0 += std::mem::take(&mut self.pits[p]);
        }
        for p in side_of(-1) {
            moved.1 += std::mem::take(&mut self.pits[p]);
        }
        self.pits[STORE_1] += moved.0;
        self.pits[STORE_2] += moved.1;
        moved
    }
}

impl fmt::Display for MancalaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "     ")?;
        for p in (7..STORE_2).rev() {
            write!(f, "{:>3}", self.pits[p])?;
        }
        writeln!(f)?;
        writeln!(f, "{:>3}{:>23}", self.pits[STORE_2], self.pits[STORE_1])?;
        write!(f, "     ")?;
        for p in 0..STORE_1 {
            write!(f, "{:>3}", self.pits[p])?;
        }
        writeln!(f)
    }
}

impl FromStr for MancalaMove {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pit = s.trim().parse::<usize>().map_err(|e| e.to_string())?;
        Ok(MancalaMove(pit))
    }
}

impl fmt::Display for MancalaMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_in_store_grants_extra_turn() {
        let mut game = MancalaState::new_game(&MancalaConfig::default());
        let fx = game.make_move(&MancalaMove(2)).unwrap();
        assert_eq!(fx.sown, vec![3, 4, 5, 6]);
        assert!(fx.extra_turn);
        assert_eq!(game.get_current_player(), 1);
        assert_eq!(game.stores(), (1, 0));
    }

    #[test]
    fn normal_sow_passes_turn() {
        let mut game = MancalaState::new_game(&MancalaConfig::default());
        let fx = game.make_move(&MancalaMove(0)).unwrap();
        assert_eq!(fx.sown, vec![1, 2, 3, 4]);
        assert!(!fx.extra_turn);
        assert_eq!(game.get_current_player(), -1);
    }

    #[test]
    fn opponent_store_is_skipped() {
        let mut pits = [0u32; PITS];
        pits[5] = 9;
        pits[8] = 1;
        let mut game = MancalaState::from_pits(pits, 1);
        let fx = game.make_move(&MancalaMove(5)).unwrap();
        assert!(!fx.sown.contains(&STORE_2));
        assert_eq!(fx.sown.len(), 9);
        assert_eq!(fx.sown.last(), Some(&1));
        // Pit 1 was empty, so it captures the stone just sown into pit 11.
        assert_eq!(fx.capture.map(|c| c.stones), Some(2));
        assert_eq!(game.stores(), (3, 0));
    }

    #[test]
    fn empty_pit_captures_opposite() {
        let mut pits = [0u32; PITS];
        pits[0] = 1;
        pits[11] = 5;
        pits[9] = 2;
        pits[3] = 1;
        let mut game = MancalaState::from_pits(pits, 1);
        let fx = game.make_move(&MancalaMove(0)).unwrap();
        assert_eq!(
            fx.capture,
            Some(MancalaCapture {
                pit: 1,
                opposite: 11,
                stones: 6
            })
        );
        assert_eq!(game.stores().0, 6);
        assert_eq!(game.pits()[1], 0);
    }

    #[test]
    fn no_capture_when_opposite_empty() {
        let mut pits = [0u32; PITS];
        pits[0] = 1;
        pits[3] = 1;
        pits[9] = 2;
        let mut game = MancalaState::from_pits(pits, 1);
        let fx = game.make_move(&MancalaMove(0)).unwrap();
        assert_eq!(fx.capture, None);
        assert_eq!(game.pits()[1], 1);
    }

    #[test]
    fn empty_row_sweeps_and_scores() {
        let mut pits = [0u32; PITS];
        pits[5] = 1;
        pits[7] = 3;
        pits[STORE_1] = 20;
        pits[STORE_2] = 20;
        let mut game = MancalaState::from_pits(pits, 1);
        let fx = game.make_move(&MancalaMove(5)).unwrap();
        assert_eq!(fx.swept, Some((0, 3)));
        assert_eq!(game.stores(), (21, 23));
        assert_eq!(game.outcome(), Outcome::Win(-1));
        assert!(game.get_possible_moves().is_empty());
    }

    #[test]
    fn wrong_side_and_empty_pits_rejected() {
        let mut game = MancalaState::new_game(&MancalaConfig::default());
        assert!(game.make_move(&MancalaMove(8)).is_err());
        assert!(game.make_move(&MancalaMove(6)).is_err());
        assert!(game.make_move(&MancalaMove(20)).is_err());
    }

    #[test]
    fn ai_takes_extra_turn() {
        let game = MancalaState::new_game(&MancalaConfig::default());
        assert_eq!(game.ai_move(&mut GameRng::new(0)), Some(MancalaMove(2)));
    }
}
