//! # Go Game Implementation
//!
//! Go on a small board (9x9 by default) with a simplified area count.
//!
//! ## Rules
//! - Black (player 1) moves first; players alternate placing stones or passing
//! - A group with no empty orthogonal neighbour (liberty) is captured and removed
//! - Placing a stone that leaves its own group without liberties is illegal
//!   unless the placement captures at least one opposing group
//! - A placement may not recreate any earlier board position (Ko). Earlier
//!   positions are kept in a bounded history buffer.
//! - Two consecutive passes end the game; resigning ends it immediately
//!
//! ## Scoring
//! Simplified area count: stones on the board, plus empty regions bordered by
//! one color only, plus stones captured during the game. White adds komi.
//! Dead stones are not removed and seki is not recognised.

use super::{offset, DIRECTIONS_4};
use crate::search::pick_best;
use crate::{AiPlayer, Coord, GameRng, GameState, MoveError, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

pub const BLACK: Player = 1;
pub const WHITE: Player = -1;

/// Column letters, skipping `I` as Go boards traditionally do.
const COLUMNS: &str = "ABCDEFGHJKLMNOPQRST";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GoMove {
    Place(usize, usize),
    Pass,
    Resign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoConfig {
    pub board_size: usize,
    pub komi: f64,
    /// Number of earlier positions remembered for the Ko check
    pub history_limit: usize,
}

impl Default for GoConfig {
    fn default() -> Self {
        Self {
            board_size: 9,
            komi: 6.5,
            history_limit: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoScore {
    pub black: f64,
    pub white: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoEffects {
    pub player: Player,
    pub placed: Option<Coord>,
    pub captured: Vec<Coord>,
    pub passed: bool,
    pub resigned: bool,
    /// Final score, present when this move ended the game by passing
    pub score: Option<GoScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoState {
    /// Row-major board: 1 black, -1 white, 0 empty
    board: Vec<i32>,
    size: usize,
    current_player: Player,
    /// Stones captured by (black, white)
    captures: (u32, u32),
    history: VecDeque<Vec<i32>>,
    history_limit: usize,
    consecutive_passes: u32,
    komi: f64,
    resigned: Option<Player>,
}

impl GameState for GoState {
    type Move = GoMove;
    type Effects = GoEffects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_moves(&self) -> Vec<GoMove> {
        if self.is_over() {
            return Vec::new();
        }
        let mut moves: Vec<GoMove> = (0..self.size * self.size)
            .map(|i| (i / self.size, i % self.size))
            .filter(|&at| self.placement_result(at, self.current_player).is_ok())
            .map(|(r, c)| GoMove::Place(r, c))
            .collect();
        moves.push(GoMove::Pass);
        moves.push(GoMove::Resign);
        moves
    }

    fn is_legal(&self, mv: &GoMove) -> bool {
        if self.is_over() {
            return false;
        }
        match *mv {
            GoMove::Place(r, c) => self.placement_result((r, c), self.current_player).is_ok(),
            GoMove::Pass | GoMove::Resign => true,
        }
    }

    fn make_move(&mut self, mv: &GoMove) -> Result<GoEffects, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        if let GoMove::Place(r, c) = *mv {
            self.placement_result((r, c), self.current_player)?;
        }
        Ok(self.apply_move(mv))
    }

    fn apply_move(&mut self, mv: &GoMove) -> GoEffects {
        let player = self.current_player;
        let mut fx = GoEffects {
            player,
            placed: None,
            captured: Vec::new(),
            passed: false,
            resigned: false,
            score: None,
        };
        match *mv {
            GoMove::Place(r, c) => {
                let (board, captured) = match self.placement_result((r, c), player) {
                    Ok(result) => result,
                    Err(_) => return fx,
                };
                self.history.push_back(std::mem::replace(&mut self.board, board));
                while self.history.len() > self.history_limit {
                    self.history.pop_front();
                }
                if player == BLACK {
                    self.captures.0 += captured.len() as u32;
                } else {
                    self.captures.1 += captured.len() as u32;
                }
                self.consecutive_passes = 0;
                fx.placed = Some((r, c));
                fx.captured = captured;
            }
            GoMove::Pass => {
                self.consecutive_passes += 1;
                fx.passed = true;
                if self.consecutive_passes >= 2 {
                    fx.score = Some(self.score());
                }
            }
            GoMove::Resign => {
                self.resigned = Some(player);
                fx.resigned = true;
            }
        }
        self.current_player = -player;
        fx
    }

    fn outcome(&self) -> Outcome {
        if let Some(loser) = self.resigned {
            return Outcome::Win(-loser);
        }
        if self.consecutive_passes >= 2 {
            let score = self.score();
            // Half-point komi makes ties impossible with the default setting.
            return if score.black > score.white {
                Outcome::Win(BLACK)
            } else if score.white > score.black {
                Outcome::Win(WHITE)
            } else {
                Outcome::Draw(crate::DrawReason::EqualScore)
            };
        }
        Outcome::InProgress
    }
}

impl NewGame for GoState {
    type Config = GoConfig;

    fn new_game(config: &GoConfig) -> Self {
        let mut game = Self::from_board(vec![vec![0; config.board_size]; config.board_size], BLACK);
        game.komi = config.komi;
        game.history_limit = config.history_limit;
        game
    }
}

impl AiPlayer for GoState {
    /// Greedy single ply: center proximity, captured stones and friendly
    /// connections. Passes when no placement is legal.
    fn ai_move(&self, _rng: &mut GameRng) -> Option<GoMove> {
        if self.is_over() {
            return None;
        }
        let player = self.current_player;
        let center = (self.size / 2) as i64;
        let placements: Vec<GoMove> = self
            .get_possible_moves()
            .into_iter()
            .filter(|m| matches!(m, GoMove::Place(..)))
            .collect();
        let best = pick_best(&placements, |mv| {
            let GoMove::Place(r, c) = *mv else { return i64::MIN };
            let distance = (r as i64 - center).abs() + (c as i64 - center).abs();
            let captured = self
                .placement_result((r, c), player)
                .map(|(_, caps)| caps.len() as i64)
                .unwrap_or(0);
            let connections = DIRECTIONS_4
                .iter()
                .filter_map(|&d| offset((r, c), d, self.size, self.size))
                .filter(|&n| self.at(n) == player)
                .count() as i64;
            (2 * center - distance) * 2 + captured * 10 + connections * 3
        });
        Some(best.unwrap_or(GoMove::Pass))
    }
}

impl GoState {
    /// Builds a position from rows (top first) with an empty Ko history.
    pub fn from_board(rows: Vec<Vec<i32>>, current_player: Player) -> Self {
        let size = rows.len();
        let config = GoConfig::default();
        Self {
            board: rows.into_iter().flatten().collect(),
            size,
            current_player,
            captures: (0, 0),
            history: VecDeque::new(),
            history_limit: config.history_limit,
            consecutive_passes: 0,
            komi: config.komi,
            resigned: None,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn at(&self, (r, c): Coord) -> i32 {
        self.board[r * self.size + c]
    }

    /// Stones captured so far as (by black, by white).
    pub fn captures(&self) -> (u32, u32) {
        self.captures
    }

    fn is_over(&self) -> bool {
        self.resigned.is_some() || self.consecutive_passes >= 2
    }

    /// The stones connected to `start` and whether the group has any liberty.
    ///
    /// Breadth-first over same-colored orthogonal neighbours.
    fn group(board: &[i32], size: usize, start: Coord) -> (Vec<Coord>, bool) {
        let color = board[start.0 * size + start.1];
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut stones = Vec::new();
        let mut has_liberty = false;
        while let Some(at) = queue.pop_front() {
            stones.push(at);
            for &d in DIRECTIONS_4.iter() {
                let Some(n) = offset(at, d, size, size) else { continue };
                match board[n.0 * size + n.1] {
                    0 => has_liberty = true,
                    v if v == color && seen.insert(n) => queue.push_back(n),
                    _ => {}
                }
            }
        }
        (stones, has_liberty)
    }

    /// Board after `player` places at `at`, with the captured stones removed.
    fn placement_result(&self, at: Coord, player: Player) -> Result<(Vec<i32>, Vec<Coord>), MoveError> {
        let (r, c) = at;
        if r >= self.size || c >= self.size {
            return Err(MoveError::OutOfBounds {
                row: r as i64,
                col: c as i64,
            });
        }
        if self.at(at) != 0 {
            return Err(MoveError::IllegalMove(format!("({}, {}) is occupied", r, c)));
        }

        let mut board = self.board.clone();
        board[r * self.size + c] = player;

        let mut captured = Vec::new();
        for &d in DIRECTIONS_4.iter() {
            let Some(n) = offset(at, d, self.size, self.size) else { continue };
            if board[n.0 * self.size + n.1] != -player {
                continue;
            }
            let (stones, has_liberty) = Self::group(&board, self.size, n);
            if !has_liberty {
                for s in stones {
                    board[s.0 * self.size + s.1] = 0;
                    captured.push(s);
                }
            }
        }

        if captured.is_empty() && !Self::group(&board, self.size, at).1 {
            return Err(MoveError::IllegalMove(format!("({}, {}) is suicide", r, c)));
        }
        if self.history.iter().any(|prior| *prior == board) {
            return Err(MoveError::IllegalMove(format!("({}, {}) repeats an earlier position (Ko)", r, c)));
        }
        Ok((board, captured))
    }

    /// Area score under the simplified count.
    pub fn score(&self) -> GoScore {
        let mut black = self.captures.0 as f64;
        let mut white = self.captures.1 as f64 + self.komi;
        let mut visited = vec![false; self.board.len()];

        for i in 0..self.board.len() {
            match self.board[i] {
                BLACK => black += 1.0,
                WHITE => white += 1.0,
                _ if !visited[i] => {
                    // Flood the empty region and note which colors border it.
                    let mut region = 0usize;
                    let mut borders = (false, false);
                    let mut queue = VecDeque::from([(i / self.size, i % self.size)]);
                    visited[i] = true;
                    while let Some(at) = queue.pop_front() {
                        region += 1;
                        for &d in DIRECTIONS_4.iter() {
                            let Some(n) = offset(at, d, self.size, self.size) else { continue };
                            let j = n.0 * self.size + n.1;
                            match self.board[j] {
                                BLACK => borders.0 = true,
                                WHITE => borders.1 = true,
                                _ if !visited[j] => {
                                    visited[j] = true;
                                    queue.push_back(n);
                                }
                                _ => {}
                            }
                        }
                    }
                    match borders {
                        (true, false) => black += region as f64,
                        (false, true) => white += region as f64,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        GoScore { black, white }
    }

    /// Human-readable coordinate such as `D4`.
    pub fn label(&self, (r, c): Coord) -> String {
        let col = COLUMNS.chars().nth(c).unwrap_or('?');
        format!("{}{}", col, self.size - r)
    }
}

impl fmt::Display for GoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for ch in COLUMNS.chars().take(self.size) {
            write!(f, "{} ", ch)?;
        }
        writeln!(f)?;
        for r in 0..self.size {
            write!(f, "{:>2} ", self.size - r)?;
            for c in 0..self.size {
                let symbol = match self.at((r, c)) {
                    BLACK => "X",
                    WHITE => "O",
                    _ => "+",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "captures: black {} white {}", self.captures.0, self.captures.1)
    }
}

impl GoMove {
    /// Parses `pass`, `resign`, `r,c`, or a board label such as `D4`, where label
    /// rows count up from the bottom of a `size` x `size` board.
    pub fn parse_for(size: usize, s: &str) -> Result<Self, String> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "pass" => return Ok(GoMove::Pass),
            "resign" => return Ok(GoMove::Resign),
            _ => {}
        }
        if s.contains(',') {
            let (r, c) = super::parse_pair(s)?;
            return Ok(GoMove::Place(r, c));
        }
        let mut chars = s.chars();
        let letter = chars.next().ok_or("empty move")?.to_ascii_uppercase();
        let col = COLUMNS
            .chars()
            .take(size)
            .position(|c| c == letter)
            .ok_or_else(|| format!("bad column {}", letter))?;
        let number: usize = chars.as_str().parse().map_err(|_| format!("bad row in {}", s))?;
        if number == 0 || number > size {
            return Err(format!("row {} outside a {}x{} board", number, size, size));
        }
        Ok(GoMove::Place(size - number, col))
    }
}

impl FromStr for GoMove {
    type Err = String;

    /// Labels are read against the default board size; use [`GoMove::parse_for`]
    /// for other sizes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GoMove::parse_for(GoConfig::default().board_size, s)
    }
}

impl fmt::Display for GoMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoMove::Place(r, c) => write!(f, "{},{}", r, c),
            GoMove::Pass => write!(f, "pass"),
            GoMove::Resign => write!(f, "resign"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(size: usize, black: &[Coord], white: &[Coord]) -> Vec<Vec<i32>> {
        let mut rows = vec![vec![0; size]; size];
        for &(r, c) in black {
            rows[r][c] = BLACK;
        }
        for &(r, c) in white {
            rows[r][c] = WHITE;
        }
        rows
    }

    #[test]
    fn empty_board_moves() {
        let game = GoState::new_game(&GoConfig::default());
        // 81 placements plus pass and resign.
        assert_eq!(game.get_possible_moves().len(), 83);
    }

    #[test]
    fn surrounded_group_is_captured() {
        let white = [(4, 4), (4, 5), (5, 4), (5, 5)];
        let black = [(3, 4), (3, 5), (6, 4), (6, 5), (4, 3), (5, 3), (4, 6)];
        let mut game = GoState::from_board(board_with(9, &black, &white), BLACK);
        let fx = game.make_move(&GoMove::Place(5, 6)).unwrap();
        assert_eq!(fx.captured.len(), 4);
        for at in white {
            assert_eq!(game.at(at), 0);
        }
        assert_eq!(game.captures(), (4, 0));
    }

    #[test]
    fn suicide_is_rejected() {
        let black = [(0, 1), (1, 0)];
        let mut game = GoState::from_board(board_with(9, &black, &[]), WHITE);
        assert!(matches!(game.make_move(&GoMove::Place(0, 0)), Err(MoveError::IllegalMove(_))));
        assert_eq!(game.at((0, 0)), 0);
    }

    #[test]
    fn immediate_ko_recapture_is_rejected() {
        let black = [(0, 1), (2, 1), (1, 0)];
        let white = [(0, 2), (2, 2), (1, 3), (1, 1)];
        let mut game = GoState::from_board(board_with(9, &black, &white), BLACK);
        let fx = game.make_move(&GoMove::Place(1, 2)).unwrap();
        assert_eq!(fx.captured, vec![(1, 1)]);

        let before = game.clone();
        assert!(!game.get_possible_moves().contains(&GoMove::Place(1, 1)));
        assert!(game.make_move(&GoMove::Place(1, 1)).is_err());
        assert_eq!(game, before);
    }

    #[test]
    fn two_passes_end_and_score() {
        let black = [(0, 1), (1, 0)];
        let mut game = GoState::from_board(board_with(9, &black, &[]), BLACK);
        game.make_move(&GoMove::Pass).unwrap();
        let fx = game.make_move(&GoMove::Pass).unwrap();
        assert!(game.is_terminal());
        // Every empty point touches only black stones.
        let score = fx.score.unwrap();
        assert_eq!(score.black, 81.0);
        assert_eq!(score.white, 6.5);
        assert_eq!(game.get_winner(), Some(BLACK));
        assert!(game.get_possible_moves().is_empty());
    }

    #[test]
    fn resign_ends_game() {
        let mut game = GoState::new_game(&GoConfig::default());
        game.make_move(&GoMove::Resign).unwrap();
        assert_eq!(game.get_winner(), Some(WHITE));
    }

    #[test]
    fn ai_opens_in_center() {
        let game = GoState::new_game(&GoConfig::default());
        assert_eq!(game.ai_move(&mut GameRng::new(0)), Some(GoMove::Place(4, 4)));
    }

    #[test]
    fn parses_labels() {
        assert_eq!("D4".parse::<GoMove>(), Ok(GoMove::Place(5, 3)));
        assert_eq!("J9".parse::<GoMove>(), Ok(GoMove::Place(0, 8)));
        assert_eq!("pass".parse::<GoMove>(), Ok(GoMove::Pass));
        assert_eq!("2,3".parse::<GoMove>(), Ok(GoMove::Place(2, 3)));
        assert!("I5".parse::<GoMove>().is_err());
    }

    #[test]
    fn labels_follow_board_size() {
        assert_eq!(GoMove::parse_for(13, "A13"), Ok(GoMove::Place(0, 0)));
        assert_eq!(GoMove::parse_for(13, "D4"), Ok(GoMove::Place(9, 3)));
        assert_eq!(GoMove::parse_for(13, "N1"), Ok(GoMove::Place(12, 12)));
        assert!(GoMove::parse_for(13, "O1").is_err());
        assert!(GoMove::parse_for(13, "A14").is_err());
        assert!(GoMove::parse_for(9, "A13").is_err());
        assert!(GoMove::parse_for(9, "é4").is_err());

        let game = GoState::new_game(&GoConfig {
            board_size: 13,
            ..Default::default()
        });
        assert_eq!(GoMove::parse_for(game.size(), &game.label((9, 3))), Ok(GoMove::Place(9, 3)));
    }

    #[test]
    fn ko_holds_with_one_remembered_position_on_13x13() {
        let mut game = GoState::new_game(&GoConfig {
            board_size: 13,
            history_limit: 1,
            ..Default::default()
        });
        // Same shape as the 9x9 Ko, in the middle of the larger board.
        let moves = [(5, 6), (5, 7), (7, 6), (7, 7), (6, 5), (6, 8), (12, 12), (6, 6)];
        for (r, c) in moves {
            game.make_move(&GoMove::Place(r, c)).unwrap();
        }
        let fx = game.make_move(&GoMove::Place(6, 7)).unwrap();
        assert_eq!(fx.captured, vec![(6, 6)]);

        let before = game.clone();
        assert!(matches!(game.make_move(&GoMove::Place(6, 6)), Err(MoveError::IllegalMove(_))));
        assert_eq!(game, before);
    }
}
