//! # Reversi Game Implementation
//!
//! Players take turns placing discs on an 8x8 board, with the goal of having
//! the most discs of their color when no more moves are possible.
//!
//! ## Rules
//! - Black (player 1) moves first from the standard four-disc center
//! - A placement must "sandwich" at least one contiguous run of opponent discs
//!   between the new disc and an existing disc of the mover, in any of 8 directions
//! - All sandwiched runs are flipped to the mover's color
//! - If a player has no legal moves, their turn is skipped
//! - Game ends when neither player can move; more discs wins

use super::{parse_pair, DIRECTIONS_8};
use crate::search::AlphaBeta;
use crate::{AiPlayer, Coord, DrawReason, Evaluate, GameRng, GameState, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placement of a disc at (row, col).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ReversiMove(pub usize, pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversiConfig {
    pub board_size: usize,
    pub ai_depth: u32,
}

impl Default for ReversiConfig {
    fn default() -> Self {
        Self {
            board_size: 8,
            ai_depth: 4,
        }
    }
}

/// What a placement changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversiEffects {
    pub placed: Coord,
    pub player: Player,
    /// Discs that changed color, in ray order
    pub flipped: Vec<Coord>,
    /// Player whose turn was skipped because they had no legal move
    pub skipped: Option<Player>,
}

/// The board uses 1 for black discs, -1 for white discs, and 0 for empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversiState {
    board: Vec<Vec<i32>>,
    current_player: Player,
    board_size: usize,
    ai_depth: u32,
    last_move: Option<Coord>,
}

impl GameState for ReversiState {
    type Move = ReversiMove;
    type Effects = ReversiEffects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_moves(&self) -> Vec<Self::Move> {
        self.moves_for(self.current_player)
    }

    fn is_legal(&self, mv: &ReversiMove) -> bool {
        mv.0 < self.board_size && mv.1 < self.board_size && !self.flips_for((mv.0, mv.1), self.current_player).is_empty()
    }

    fn apply_move(&mut self, mv: &Self::Move) -> ReversiEffects {
        let player = self.current_player;
        let flipped = self.flips_for((mv.0, mv.1), player);
        self.board[mv.0][mv.1] = player;
        for &(r, c) in &flipped {
            self.board[r][c] = player;
        }
        self.last_move = Some((mv.0, mv.1));
        self.current_player = -player;

        // If the new player has no moves, skip their turn
        let mut skipped = None;
        if self.moves_for(self.current_player).is_empty() && !self.moves_for(player).is_empty() {
            skipped = Some(self.current_player);
            self.current_player = player;
        }

        ReversiEffects {
            placed: (mv.0, mv.1),
            player,
            flipped,
            skipped,
        }
    }

    fn outcome(&self) -> Outcome {
        if !self.moves_for(self.current_player).is_empty() || !self.moves_for(-self.current_player).is_empty() {
            return Outcome::InProgress;
        }
        let (black, white) = self.counts();
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => Outcome::Win(1),
            std::cmp::Ordering::Less => Outcome::Win(-1),
            std::cmp::Ordering::Equal => Outcome::Draw(DrawReason::EqualScore),
        }
    }
}

impl NewGame for ReversiState {
    type Config = ReversiConfig;

    fn new_game(config: &ReversiConfig) -> Self {
        let mut game = Self::new(config.board_size);
        game.ai_depth = config.ai_depth;
        game
    }
}

impl Evaluate for ReversiState {
    /// Corners 50, edges 10, other discs 1, plus twice the mobility difference.
    fn evaluate(&self, player: Player) -> i32 {
        let mut score = 0;
        for r in 0..self.board_size {
            for c in 0..self.board_size {
                score += self.board[r][c] * player * self.square_weight((r, c), 50, 10, 1);
            }
        }
        let mobility = self.moves_for(player).len() as i32 - self.moves_for(-player).len() as i32;
        score + mobility * 2
    }
}

impl AiPlayer for ReversiState {
    fn ai_move(&self, _rng: &mut GameRng) -> Option<ReversiMove> {
        AlphaBeta::new(self.ai_depth).best_move(self)
    }
}

impl ReversiState {
    /// Creates a new game with the standard starting position
    pub fn new(board_size: usize) -> Self {
        let mut board = vec![vec![0; board_size]; board_size];
        let center = board_size / 2;
        board[center - 1][center - 1] = -1;
        board[center - 1][center] = 1;
        board[center][center - 1] = 1;
        board[center][center] = -1;
        Self {
            board,
            current_player: 1,
            board_size,
            ai_depth: ReversiConfig::default().ai_depth,
            last_move: None,
        }
    }

    /// Builds an arbitrary position, rows top first.
    pub fn from_board(board: Vec<Vec<i32>>, current_player: Player) -> Self {
        Self {
            board_size: board.len(),
            board,
            current_player,
            ai_depth: ReversiConfig::default().ai_depth,
            last_move: None,
        }
    }

    pub fn get_board(&self) -> &Vec<Vec<i32>> {
        &self.board
    }

    pub fn get_last_move(&self) -> Option<Coord> {
        self.last_move
    }

    /// Disc counts as (black, white).
    pub fn counts(&self) -> (usize, usize) {
        let cells = self.board.iter().flatten();
        let black = cells.clone().filter(|&&c| c == 1).count();
        let white = cells.filter(|&&c| c == -1).count();
        (black, white)
    }

    /// Greedy hint for a human: flips plus a corner/edge bonus, first best wins.
    pub fn hint(&self) -> Option<ReversiMove> {
        let player = self.current_player;
        crate::search::pick_best(&self.get_possible_moves(), |mv| {
            let flips = self.flips_for((mv.0, mv.1), player).len() as i64;
            flips + self.square_weight((mv.0, mv.1), 10, 2, 0) as i64
        })
    }

    fn square_weight(&self, (r, c): Coord, corner: i32, edge: i32, inner: i32) -> i32 {
        let last = self.board_size - 1;
        let row_edge = r == 0 || r == last;
        let col_edge = c == 0 || c == last;
        match (row_edge, col_edge) {
            (true, true) => corner,
            (true, false) | (false, true) => edge,
            _ => inner,
        }
    }

    fn moves_for(&self, player: Player) -> Vec<ReversiMove> {
        let mut moves = Vec::new();
        for r in 0..self.board_size {
            for c in 0..self.board_size {
                if !self.flips_for((r, c), player).is_empty() {
                    moves.push(ReversiMove(r, c));
                }
            }
        }
        moves
    }

    /// Opponent discs that a placement at `at` by `player` would flip.
    ///
    /// Walks each of the 8 rays; a run only counts when it ends on one of the
    /// player's own discs. Empty when the cell is occupied or nothing flips.
    fn flips_for(&self, at: Coord, player: Player) -> Vec<Coord> {
        let (r, c) = at;
        let mut flips = Vec::new();
        if self.board[r][c] != 0 {
            return flips;
        }
        let n = self.board_size as i32;
        for (dr, dc) in DIRECTIONS_8.iter() {
            let mut line = Vec::new();
            let mut nr = r as i32 + dr;
            let mut nc = c as i32 + dc;
            while nr >= 0 && nr < n && nc >= 0 && nc < n {
                let cell = self.board[nr as usize][nc as usize];
                if cell == -player {
                    line.push((nr as usize, nc as usize));
                } else {
                    if cell == player {
                        flips.append(&mut line);
                    }
                    break;
                }
                nr += dr;
                nc += dc;
            }
        }
        flips
    }
}

impl fmt::Display for ReversiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for c in 0..self.board_size {
            write!(f, "{} ", c)?;
        }
        writeln!(f)?;
        for (r, row) in self.board.iter().enumerate() {
            write!(f, "{} ", r)?;
            for &cell in row {
                let symbol = match cell {
                    1 => "B",
                    -1 => "W",
                    _ => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for ReversiMove {
    type Err = String;

    /// Parses "row,col", both 0-based.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (r, c) = parse_pair(s)?;
        Ok(ReversiMove(r, c))
    }
}

impl fmt::Display for ReversiMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_has_four_moves() {
        let game = ReversiState::new(8);
        let moves = game.get_possible_moves();
        assert_eq!(moves.len(), 4);
        for mv in [ReversiMove(2, 3), ReversiMove(3, 2), ReversiMove(4, 5), ReversiMove(5, 4)] {
            assert!(moves.contains(&mv));
        }
    }

    #[test]
    fn placement_flips_sandwiched_disc() {
        let mut game = ReversiState::new(8);
        let fx = game.make_move(&ReversiMove(2, 3)).unwrap();
        assert_eq!(fx.flipped, vec![(3, 3)]);
        assert_eq!(game.get_board()[3][3], 1);
        assert_eq!(game.counts(), (4, 1));
        assert_eq!(game.get_current_player(), -1);
    }

    #[test]
    fn corner_move_flips_only_connected_runs() {
        let mut board = vec![vec![0; 8]; 8];
        // Run along the top edge, bounded by black at (0,3).
        board[0][1] = -1;
        board[0][2] = -1;
        board[0][3] = 1;
        // White on the diagonal with no black behind it.
        board[1][1] = -1;
        // Interior white disc not on any ray from the corner.
        board[3][2] = -1;
        let mut game = ReversiState::from_board(board, 1);
        let fx = game.make_move(&ReversiMove(0, 0)).unwrap();
        assert_eq!(fx.flipped, vec![(0, 1), (0, 2)]);
        assert_eq!(game.get_board()[1][1], -1);
        assert_eq!(game.get_board()[3][2], -1);
    }

    #[test]
    fn illegal_placement_rejected_without_mutation() {
        let mut game = ReversiState::new(8);
        let before = game.clone();
        assert!(game.make_move(&ReversiMove(0, 0)).is_err());
        assert!(game.make_move(&ReversiMove(3, 3)).is_err());
        assert!(game.make_move(&ReversiMove(9, 9)).is_err());
        assert_eq!(game, before);
    }

    #[test]
    fn player_without_moves_is_skipped() {
        let mut board = vec![vec![0; 4]; 4];
        // Black takes (0,2) and flips (0,1); white then has nothing left.
        board[0][0] = 1;
        board[0][1] = -1;
        board[1][0] = 1;
        let mut game = ReversiState::from_board(board, 1);
        let fx = game.make_move(&ReversiMove(0, 2)).unwrap();
        assert_eq!(fx.flipped, vec![(0, 1)]);
        assert!(game.is_terminal());
        assert_eq!(game.get_winner(), Some(1));
    }

    #[test]
    fn skip_keeps_mover_on_turn() {
        let mut board = vec![vec![0; 5]; 5];
        board[0][0] = 1;
        board[0][1] = -1;
        board[2][0] = 1;
        board[2][1] = -1;
        let mut game = ReversiState::from_board(board, 1);
        let fx = game.make_move(&ReversiMove(0, 2)).unwrap();
        // White's remaining disc sits behind a black disc on the edge; black can still play (2,2).
        assert_eq!(fx.skipped, Some(-1));
        assert_eq!(game.get_current_player(), 1);
        assert!(!game.is_terminal());
    }

    #[test]
    fn ai_returns_legal_move() {
        let game = ReversiState::new_game(&ReversiConfig { ai_depth: 2, ..Default::default() });
        let mv = game.ai_move(&mut GameRng::new(0)).unwrap();
        assert!(game.is_legal(&mv));
        assert!(game.hint().is_some());
    }
}
