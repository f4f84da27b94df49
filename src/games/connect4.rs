//! # Connect 4 Game Implementation
//!
//! Players take turns dropping pieces into columns, trying to get 4 pieces
//! in a row (horizontally, vertically, or diagonally).
//!
//! ## Rules
//! - Player 1 (red) moves first, then players alternate
//! - Pieces fall to the lowest empty cell of the chosen column
//! - A column whose top cell is occupied is full and cannot be played
//! - First player to line up `line_size` pieces wins
//! - Game is a draw if the board fills up with no winner
//!
//! ## AI
//! Fixed-depth alpha-beta search. Leaves are scored by center-column
//! occupancy plus open windows that could still become a line.

use crate::search::AlphaBeta;
use crate::{AiPlayer, Coord, DrawReason, Evaluate, GameRng, GameState, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a move in Connect 4
///
/// Contains the 0-based column where a player wants to drop their piece.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Connect4Move(pub usize);

/// Board dimensions and search depth for a new game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connect4Config {
    pub width: usize,
    pub height: usize,
    pub line_size: usize,
    pub ai_depth: u32,
}

impl Default for Connect4Config {
    fn default() -> Self {
        Self {
            width: 7,
            height: 6,
            line_size: 4,
            ai_depth: 5,
        }
    }
}

/// What a drop changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect4Effects {
    /// Cell the piece came to rest in
    pub placed: Coord,
    pub player: Player,
    /// Cells of the completed line, empty unless this drop won the game
    pub winning_line: Vec<Coord>,
}

/// Represents the complete state of a Connect 4 game
///
/// The board uses 1 for player 1 pieces, -1 for player 2 pieces, and 0 for empty spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connect4State {
    /// The game board as a flat vector (row-major, row 0 on top)
    board: Vec<i32>,
    /// Current player (1 or -1)
    current_player: Player,
    width: usize,
    height: usize,
    /// Number of pieces needed in a row to win
    line_size: usize,
    ai_depth: u32,
    /// Last move made, if any (row, column)
    last_move: Option<Coord>,
    outcome: Outcome,
}

impl fmt::Display for Connect4State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.height {
            for c in 0..self.width {
                let symbol = match self.board[r * self.width + c] {
                    1 => "X",
                    -1 => "O",
                    _ => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        for c in 0..self.width {
            write!(f, "{} ", c)?;
        }
        writeln!(f)
    }
}

impl GameState for Connect4State {
    type Move = Connect4Move;
    type Effects = Connect4Effects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_moves(&self) -> Vec<Self::Move> {
        if self.outcome.is_over() {
            return Vec::new();
        }
        (0..self.width)
            .filter(|&c| self.board[c] == 0)
            .map(Connect4Move)
            .collect()
    }

    /// Checks if a move is legal in the current game state
    ///
    /// A move is legal if the column is within bounds and the top row
    /// of that column is empty.
    fn is_legal(&self, mv: &Connect4Move) -> bool {
        !self.outcome.is_over() && mv.0 < self.width && self.board[mv.0] == 0
    }

    fn apply_move(&mut self, mv: &Self::Move) -> Connect4Effects {
        let player = self.current_player;
        let row = match self.drop_row(mv.0) {
            Some(r) => r,
            None => {
                return Connect4Effects {
                    placed: (0, mv.0),
                    player,
                    winning_line: Vec::new(),
                }
            }
        };
        self.board[row * self.width + mv.0] = player;
        self.last_move = Some((row, mv.0));
        self.current_player = -player;

        let winning_line = self.line_through((row, mv.0));
        self.outcome = if !winning_line.is_empty() {
            Outcome::Win(player)
        } else if self.board[..self.width].iter().all(|&c| c != 0) {
            Outcome::Draw(DrawReason::BoardFull)
        } else {
            Outcome::InProgress
        };

        Connect4Effects {
            placed: (row, mv.0),
            player,
            winning_line,
        }
    }

    fn outcome(&self) -> Outcome {
        self.outcome
    }
}

impl NewGame for Connect4State {
    type Config = Connect4Config;

    fn new_game(config: &Connect4Config) -> Self {
        let mut game = Self::new(config.width, config.height, config.line_size);
        game.ai_depth = config.ai_depth;
        game
    }
}

impl Evaluate for Connect4State {
    fn evaluate(&self, player: Player) -> i32 {
        let center = self.width / 2;
        let mut score = 0;
        for r in 0..self.height {
            score += self.board[r * self.width + center] * 3;
        }

        // Windows of line_size cells holding pieces of one side only.
        let n = self.line_size as i32;
        for &(dr, dc) in board_shared::AXES.iter() {
            for r in 0..self.height as i32 {
                for c in 0..self.width as i32 {
                    let (end_r, end_c) = (r + dr * (n - 1), c + dc * (n - 1));
                    if end_r < 0 || end_c < 0 || end_r >= self.height as i32 || end_c >= self.width as i32 {
                        continue;
                    }
                    let (mut mine, mut theirs) = (0, 0);
                    for k in 0..n {
                        match self.board[((r + dr * k) as usize) * self.width + (c + dc * k) as usize] {
                            1 => mine += 1,
                            -1 => theirs += 1,
                            _ => {}
                        }
                    }
                    score += match (mine, theirs) {
                        (m, 0) if m == n - 1 => 5,
                        (m, 0) if m == n - 2 => 2,
                        (0, t) if t == n - 1 => -5,
                        (0, t) if t == n - 2 => -2,
                        _ => 0,
                    };
                }
            }
        }
        score * player
    }
}

impl AiPlayer for Connect4State {
    fn ai_move(&self, _rng: &mut GameRng) -> Option<Connect4Move> {
        AlphaBeta::new(self.ai_depth).best_move(self)
    }
}

impl Connect4State {
    /// Creates a new Connect 4 game with the specified configuration
    pub fn new(width: usize, height: usize, line_size: usize) -> Self {
        Self {
            board: vec![0; width * height],
            current_player: 1,
            width,
            height,
            line_size,
            ai_depth: Connect4Config::default().ai_depth,
            last_move: None,
            outcome: Outcome::InProgress,
        }
    }

    /// Builds a position from rows (top row first) and the player to move.
    ///
    /// The outcome is recomputed by scanning the whole board.
    pub fn from_board(rows: Vec<Vec<i32>>, current_player: Player, line_size: usize) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let board: Vec<i32> = rows.into_iter().flatten().collect();
        let outcome = if board_shared::check_line_win(&board, width, height, 1, line_size) {
            Outcome::Win(1)
        } else if board_shared::check_line_win(&board, width, height, -1, line_size) {
            Outcome::Win(-1)
        } else if width > 0 && board[..width].iter().all(|&c| c != 0) {
            Outcome::Draw(DrawReason::BoardFull)
        } else {
            Outcome::InProgress
        };
        Self {
            board,
            current_player,
            width,
            height,
            line_size,
            ai_depth: Connect4Config::default().ai_depth,
            last_move: None,
            outcome,
        }
    }

    /// Gets the number of pieces needed in a row to win
    pub fn get_line_size(&self) -> usize {
        self.line_size
    }

    pub fn get_last_move(&self) -> Option<Coord> {
        self.last_move
    }

    /// Returns the board as rows, top row first.
    pub fn get_board(&self) -> Vec<Vec<i32>> {
        self.board.chunks(self.width).map(|r| r.to_vec()).collect()
    }

    /// Lowest empty row of a column, where a dropped piece would land.
    pub fn drop_row(&self, col: usize) -> Option<usize> {
        if col >= self.width {
            return None;
        }
        (0..self.height).rev().find(|&r| self.board[r * self.width + col] == 0)
    }

    fn line_through(&self, anchor: Coord) -> Vec<Coord> {
        match board_shared::anchored_line(&self.board, self.width, self.height, anchor, self.line_size) {
            Some(((dr, dc), back, fwd)) => (-(back as i32)..=fwd as i32)
                .map(|k| ((anchor.0 as i32 + dr * k) as usize, (anchor.1 as i32 + dc * k) as usize))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl FromStr for Connect4Move {
    type Err = String;

    /// Parses a column number, e.g. `"3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = s.trim().parse::<usize>().map_err(|e| e.to_string())?;
        Ok(Connect4Move(c))
    }
}

impl fmt::Display for Connect4Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoveError;

    #[test]
    fn test_new_game() {
        let game = Connect4State::new_game(&Connect4Config::default());
        assert_eq!(game.get_num_players(), 2);
        assert_eq!(game.get_current_player(), 1);
        assert_eq!(game.get_board().len(), 6);
        assert_eq!(game.get_board()[0].len(), 7);
        assert_eq!(game.get_line_size(), 4);
    }

    #[test]
    fn test_legal_moves() {
        let game = Connect4State::new(7, 6, 4);
        let moves = game.get_possible_moves();
        assert_eq!(moves.len(), 7);
        for i in 0..7 {
            assert!(moves.contains(&Connect4Move(i)));
        }
    }

    #[test]
    fn test_make_move() {
        let mut game = Connect4State::new(7, 6, 4);
        let fx = game.make_move(&Connect4Move(3)).unwrap();
        assert_eq!(fx.placed, (5, 3));
        assert_eq!(game.get_board()[5][3], 1);
        assert_eq!(game.get_current_player(), -1);

        game.make_move(&Connect4Move(3)).unwrap();
        assert_eq!(game.get_board()[4][3], -1);
        assert_eq!(game.get_current_player(), 1);
    }

    #[test]
    fn test_full_column_rejected() {
        let mut game = Connect4State::new(7, 6, 4);
        for _ in 0..6 {
            game.make_move(&Connect4Move(0)).unwrap();
        }
        let before = game.clone();
        assert!(!game.get_possible_moves().contains(&Connect4Move(0)));
        assert!(matches!(game.make_move(&Connect4Move(0)), Err(MoveError::IllegalMove(_))));
        assert_eq!(game, before);
    }

    #[test]
    fn test_out_of_range_column_rejected() {
        let mut game = Connect4State::new(7, 6, 4);
        assert!(game.make_move(&Connect4Move(7)).is_err());
    }

    #[test]
    fn test_bottom_row_line_is_terminal() {
        let mut rows = vec![vec![0; 7]; 6];
        for c in 0..4 {
            rows[5][c] = 1;
        }
        let game = Connect4State::from_board(rows, -1, 4);
        assert!(game.is_terminal());
        assert_eq!(game.get_winner(), Some(1));
        assert!(game.get_possible_moves().is_empty());
    }

    #[test]
    fn test_win_condition_horizontal() {
        let mut game = Connect4State::new(7, 6, 4);
        for col in [0, 0, 1, 1, 2, 2] {
            game.make_move(&Connect4Move(col)).unwrap();
        }
        let fx = game.make_move(&Connect4Move(3)).unwrap();

        assert_eq!(game.get_winner(), Some(1));
        assert!(game.is_terminal());
        assert_eq!(fx.winning_line, vec![(5, 0), (5, 1), (5, 2), (5, 3)]);
        assert_eq!(game.make_move(&Connect4Move(4)), Err(MoveError::GameOver));
    }

    #[test]
    fn test_win_condition_vertical() {
        let mut game = Connect4State::new(7, 6, 4);
        for col in [0, 1, 0, 1, 0, 1, 0] {
            game.make_move(&Connect4Move(col)).unwrap();
        }
        assert_eq!(game.get_winner(), Some(1));
    }

    #[test]
    fn test_win_condition_diagonal() {
        let mut game = Connect4State::new(7, 6, 4);
        // P1 builds the diagonal (5,0) (4,1) (3,2) (2,3).
        for col in [0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3] {
            game.make_move(&Connect4Move(col)).unwrap();
        }
        assert_eq!(game.get_winner(), Some(1));
    }

    #[test]
    fn test_draw_on_full_board() {
        let mut game = Connect4State::new(2, 2, 3);
        for col in [0, 0, 1, 1] {
            game.make_move(&Connect4Move(col)).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::Draw(DrawReason::BoardFull));
    }

    #[test]
    fn test_ai_returns_legal_move() {
        let game = Connect4State::new_game(&Connect4Config { ai_depth: 3, ..Default::default() });
        let mv = game.ai_move(&mut GameRng::new(1)).unwrap();
        assert!(game.is_legal(&mv));
    }
}
