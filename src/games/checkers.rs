//! # Checkers Game Implementation
//!
//! English draughts on the dark squares of an 8x8 board.
//!
//! ## Rules
//! - Red (player 1) starts on rows 5-7 and moves up the board; black (player -1)
//!   starts on rows 0-2 and moves down. Red moves first.
//! - Men move one square diagonally forward, kings in all four diagonal directions
//! - A capture jumps an adjacent enemy piece onto the empty square behind it
//! - Capturing is mandatory: if any piece can capture, only captures are legal
//! - After a capture the same piece must keep jumping while it can
//! - A man reaching the far row is crowned in place and keeps its identity
//! - A player with no legal move loses. This deliberately does not separate
//!   "blocked" from "no pieces left".
//! - A game with no capture for `no_progress_limit` plies is drawn

use super::offset;
use crate::search::AlphaBeta;
use crate::{AiPlayer, Coord, DrawReason, Evaluate, GameRng, GameState, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const RED: Player = 1;
pub const BLACK: Player = -1;
const SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub owner: Player,
    pub king: bool,
}

impl Piece {
    pub fn man(owner: Player) -> Self {
        Self { owner, king: false }
    }

    pub fn king(owner: Player) -> Self {
        Self { owner, king: true }
    }

    fn directions(&self) -> &'static [(i32, i32)] {
        const UP: [(i32, i32); 2] = [(-1, -1), (-1, 1)];
        const DOWN: [(i32, i32); 2] = [(1, -1), (1, 1)];
        const ALL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
        match (self.king, self.owner) {
            (true, _) => &ALL,
            (false, RED) => &UP,
            (false, _) => &DOWN,
        }
    }
}

/// A step or a single jump from one square to another. A capture is a move of length 2.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CheckersMove {
    pub from: Coord,
    pub to: Coord,
}

impl CheckersMove {
    pub fn new(from: Coord, to: Coord) -> Self {
        Self { from, to }
    }

    pub fn is_capture(&self) -> bool {
        self.from.0.abs_diff(self.to.0) == 2
    }

    fn jumped(&self) -> Coord {
        ((self.from.0 + self.to.0) / 2, (self.from.1 + self.to.1) / 2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckersConfig {
    pub ai_depth: u32,
    /// Plies without a capture before the game is drawn
    pub no_progress_limit: u32,
}

impl Default for CheckersConfig {
    fn default() -> Self {
        Self {
            ai_depth: 5,
            no_progress_limit: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckersEffects {
    pub from: Coord,
    pub to: Coord,
    pub player: Player,
    pub captured: Option<Coord>,
    pub promoted: bool,
    /// The same piece must jump again before the turn passes
    pub chain_continues: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckersState {
    board: Vec<Vec<Option<Piece>>>,
    current_player: Player,
    /// Square of the piece that is in the middle of a multi-jump
    chain_piece: Option<Coord>,
    red_captures: u32,
    black_captures: u32,
    plies_since_capture: u32,
    no_progress_limit: u32,
    ai_depth: u32,
}

impl GameState for CheckersState {
    type Move = CheckersMove;
    type Effects = CheckersEffects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_moves(&self) -> Vec<CheckersMove> {
        if self.plies_since_capture >= self.no_progress_limit {
            return Vec::new();
        }
        if let Some(at) = self.chain_piece {
            return self.captures_from(at);
        }
        let pieces = self.pieces_of(self.current_player);
        let captures: Vec<CheckersMove> = pieces.iter().flat_map(|&at| self.captures_from(at)).collect();
        if !captures.is_empty() {
            return captures;
        }
        pieces.iter().flat_map(|&at| self.steps_from(at)).collect()
    }

    fn move_origin(&self, mv: &CheckersMove) -> Option<Coord> {
        Some(mv.from)
    }

    fn apply_move(&mut self, mv: &CheckersMove) -> CheckersEffects {
        let player = self.current_player;
        let mut piece = match self.board[mv.from.0][mv.from.1].take() {
            Some(p) => p,
            None => Piece::man(player),
        };

        let captured = if mv.is_capture() {
            let (jr, jc) = mv.jumped();
            self.board[jr][jc] = None;
            if player == RED {
                self.red_captures += 1;
            } else {
                self.black_captures += 1;
            }
            self.plies_since_capture = 0;
            Some((jr, jc))
        } else {
            self.plies_since_capture += 1;
            None
        };

        let last_rank = if piece.owner == RED { 0 } else { SIZE - 1 };
        let promoted = !piece.king && mv.to.0 == last_rank;
        if promoted {
            piece.king = true;
        }
        self.board[mv.to.0][mv.to.1] = Some(piece);

        // Promotion ends the turn, even when the new king could jump again.
        let chain_continues = captured.is_some() && !promoted && !self.captures_from(mv.to).is_empty();
        if chain_continues {
            self.chain_piece = Some(mv.to);
        } else {
            self.chain_piece = None;
            self.current_player = -player;
        }

        CheckersEffects {
            from: mv.from,
            to: mv.to,
            player,
            captured,
            promoted,
            chain_continues,
        }
    }

    fn outcome(&self) -> Outcome {
        if self.plies_since_capture >= self.no_progress_limit {
            return Outcome::Draw(DrawReason::NoProgress);
        }
        if self.get_possible_moves().is_empty() {
            return Outcome::Win(-self.current_player);
        }
        Outcome::InProgress
    }
}

impl NewGame for CheckersState {
    type Config = CheckersConfig;

    fn new_game(config: &CheckersConfig) -> Self {
        let mut pieces = Vec::new();
        for r in 0..SIZE {
            for c in 0..SIZE {
                if (r + c) % 2 == 1 {
                    if r < 3 {
                        pieces.push(((r, c), Piece::man(BLACK)));
                    } else if r > 4 {
                        pieces.push(((r, c), Piece::man(RED)));
                    }
                }
            }
        }
        let mut game = Self::from_pieces(&pieces, RED);
        game.ai_depth = config.ai_depth;
        game.no_progress_limit = config.no_progress_limit;
        game
    }
}

impl Evaluate for CheckersState {
    /// Men 100, kings 160, plus 2 per row a man has advanced.
    fn evaluate(&self, player: Player) -> i32 {
        let mut score = 0;
        for (r, row) in self.board.iter().enumerate() {
            for piece in row.iter().flatten() {
                let value = if piece.king {
                    160
                } else {
                    let advanced = if piece.owner == RED { SIZE - 1 - r } else { r };
                    100 + 2 * advanced as i32
                };
                score += if piece.owner == player { value } else { -value };
            }
        }
        score
    }
}

impl AiPlayer for CheckersState {
    fn ai_move(&self, _rng: &mut GameRng) -> Option<CheckersMove> {
        AlphaBeta::new(self.ai_depth).best_move(self)
    }
}

impl CheckersState {
    /// Builds a position from a list of pieces and the side to move.
    pub fn from_pieces(pieces: &[(Coord, Piece)], current_player: Player) -> Self {
        let mut board = vec![vec![None; SIZE]; SIZE];
        for &((r, c), piece) in pieces {
            board[r][c] = Some(piece);
        }
        let config = CheckersConfig::default();
        Self {
            board,
            current_player,
            chain_piece: None,
            red_captures: 0,
            black_captures: 0,
            plies_since_capture: 0,
            no_progress_limit: config.no_progress_limit,
            ai_depth: config.ai_depth,
        }
    }

    pub fn piece_at(&self, at: Coord) -> Option<Piece> {
        self.board.get(at.0).and_then(|row| row.get(at.1)).copied().flatten()
    }

    /// Pieces captured so far as (by red, by black).
    pub fn captures(&self) -> (u32, u32) {
        (self.red_captures, self.black_captures)
    }

    /// Square of the piece that must continue jumping, if any.
    pub fn chain_piece(&self) -> Option<Coord> {
        self.chain_piece
    }

    fn pieces_of(&self, player: Player) -> Vec<Coord> {
        let mut out = Vec::new();
        for r in 0..SIZE {
            for c in 0..SIZE {
                if matches!(self.board[r][c], Some(p) if p.owner == player) {
                    out.push((r, c));
                }
            }
        }
        out
    }

    fn steps_from(&self, at: Coord) -> Vec<CheckersMove> {
        let Some(piece) = self.piece_at(at) else {
            return Vec::new();
        };
        piece
            .directions()
            .iter()
            .filter_map(|&d| offset(at, d, SIZE, SIZE))
            .filter(|&to| self.board[to.0][to.1].is_none())
            .map(|to| CheckersMove::new(at, to))
            .collect()
    }

    fn captures_from(&self, at: Coord) -> Vec<CheckersMove> {
        let Some(piece) = self.piece_at(at) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for &(dr, dc) in piece.directions() {
            let Some(over) = offset(at, (dr, dc), SIZE, SIZE) else { continue };
            let Some(land) = offset(at, (dr * 2, dc * 2), SIZE, SIZE) else { continue };
            let enemy = matches!(self.board[over.0][over.1], Some(p) if p.owner != piece.owner);
            if enemy && self.board[land.0][land.1].is_none() {
                out.push(CheckersMove::new(at, land));
            }
        }
        out
    }
}

impl fmt::Display for CheckersState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  0 1 2 3 4 5 6 7")?;
        for (r, row) in self.board.iter().enumerate() {
            write!(f, "{} ", r)?;
            for cell in row {
                let symbol = match cell {
                    Some(Piece { owner: RED, king: false }) => "r",
                    Some(Piece { owner: RED, king: true }) => "R",
                    Some(Piece { king: false, .. }) => "b",
                    Some(Piece { king: true, .. }) => "B",
                    None => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for CheckersMove {
    type Err = String;

    /// Parses "r,c-r,c", e.g. "5,0-4,1".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s.split_once('-').ok_or("Expected format: r,c-r,c")?;
        Ok(CheckersMove::new(super::parse_pair(from)?, super::parse_pair(to)?))
    }
}

impl fmt::Display for CheckersMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}-{},{}", self.from.0, self.from.1, self.to.0, self.to.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_setup() {
        let game = CheckersState::new_game(&CheckersConfig::default());
        assert_eq!(game.pieces_of(RED).len(), 12);
        assert_eq!(game.pieces_of(BLACK).len(), 12);
        assert_eq!(game.get_current_player(), RED);
        // Only the front row of red men can step: 4 pieces, 7 moves.
        assert_eq!(game.get_possible_moves().len(), 7);
        assert!(game.get_possible_moves().iter().all(|m| m.from.0 == 5));
    }

    #[test]
    fn capture_is_mandatory_for_every_piece() {
        let game = CheckersState::from_pieces(
            &[
                ((5, 2), Piece::man(RED)),
                ((4, 3), Piece::man(BLACK)),
                ((5, 6), Piece::man(RED)),
                ((0, 1), Piece::man(BLACK)),
            ],
            RED,
        );
        assert_eq!(game.get_possible_moves(), vec![CheckersMove::new((5, 2), (3, 4))]);
        assert!(game.legal_moves(Some((5, 6))).is_empty());
        assert_eq!(game.legal_moves(Some((5, 2))).len(), 1);
    }

    #[test]
    fn steps_allowed_without_captures() {
        let game = CheckersState::from_pieces(
            &[((5, 2), Piece::man(RED)), ((0, 1), Piece::man(BLACK))],
            RED,
        );
        let moves = game.legal_moves(Some((5, 2)));
        assert_eq!(moves.len(), 2);
        assert!(moves.contains(&CheckersMove::new((5, 2), (4, 1))));
        assert!(moves.contains(&CheckersMove::new((5, 2), (4, 3))));
    }

    #[test]
    fn multi_jump_continues_with_same_piece() {
        let mut game = CheckersState::from_pieces(
            &[
                ((5, 0), Piece::man(RED)),
                ((4, 1), Piece::man(BLACK)),
                ((2, 3), Piece::man(BLACK)),
                ((7, 6), Piece::man(RED)),
                ((0, 7), Piece::man(BLACK)),
            ],
            RED,
        );
        let fx = game.make_move(&CheckersMove::new((5, 0), (3, 2))).unwrap();
        assert_eq!(fx.captured, Some((4, 1)));
        assert!(fx.chain_continues);
        assert_eq!(game.get_current_player(), RED);
        assert_eq!(game.get_possible_moves(), vec![CheckersMove::new((3, 2), (1, 4))]);
        // The other red piece may not move mid-chain.
        assert!(game.make_move(&CheckersMove::new((7, 6), (6, 5))).is_err());

        let fx = game.make_move(&CheckersMove::new((3, 2), (1, 4))).unwrap();
        assert!(!fx.chain_continues);
        assert_eq!(game.get_current_player(), BLACK);
        assert_eq!(game.captures(), (2, 0));
    }

    #[test]
    fn promotion_ends_the_capture_chain() {
        let mut game = CheckersState::from_pieces(
            &[
                ((2, 1), Piece::man(RED)),
                ((1, 2), Piece::man(BLACK)),
                ((1, 4), Piece::man(BLACK)),
                ((7, 0), Piece::man(RED)),
            ],
            RED,
        );
        let fx = game.make_move(&CheckersMove::new((2, 1), (0, 3))).unwrap();
        assert!(fx.promoted);
        assert!(!fx.chain_continues);
        assert_eq!(game.chain_piece(), None);
        assert_eq!(game.get_current_player(), BLACK);
        assert_eq!(game.piece_at((0, 3)), Some(Piece::king(RED)));
        assert_eq!(game.piece_at((1, 4)), Some(Piece::man(BLACK)));
    }

    #[test]
    fn promotion_mutates_flag() {
        let mut game = CheckersState::from_pieces(
            &[((1, 2), Piece::man(RED)), ((7, 0), Piece::man(BLACK))],
            RED,
        );
        let fx = game.make_move(&CheckersMove::new((1, 2), (0, 1))).unwrap();
        assert!(fx.promoted);
        assert_eq!(game.piece_at((0, 1)), Some(Piece::king(RED)));
    }

    #[test]
    fn no_moves_loses() {
        let game = CheckersState::from_pieces(&[((0, 1), Piece::man(RED)), ((7, 0), Piece::man(BLACK))], RED);
        assert_eq!(game.outcome(), Outcome::Win(BLACK));
    }

    #[test]
    fn stalls_into_no_progress_draw() {
        let mut game = CheckersState::new_game(&CheckersConfig { no_progress_limit: 2, ..Default::default() });
        game.make_move(&CheckersMove::new((5, 0), (4, 1))).unwrap();
        game.make_move(&CheckersMove::new((2, 7), (3, 6))).unwrap();
        assert_eq!(game.outcome(), Outcome::Draw(DrawReason::NoProgress));
    }

    #[test]
    fn ai_prefers_capture_when_forced() {
        let game = CheckersState::from_pieces(
            &[((5, 2), Piece::man(RED)), ((4, 3), Piece::man(BLACK)), ((0, 1), Piece::man(BLACK))],
            RED,
        );
        assert_eq!(game.ai_move(&mut GameRng::new(3)), Some(CheckersMove::new((5, 2), (3, 4))));
    }
}
