//! # Chess Game Implementation
//!
//! Full local rules: castling, en passant, promotion to any piece and king
//! safety. Positions load from and save to FEN.
//!
//! An optional remote move service ([`service::ChessClient`]) can answer
//! move-list, move, AI and hint queries. Every remote answer is checked against
//! the local rules and replaced by the local answer when it disagrees or the
//! service is unreachable.
//!
//! ## End of game
//! - Checkmate wins for the side that delivered it
//! - Stalemate and insufficient material are draws
//! - One hundred plies without a capture or pawn move is a draw

pub mod board;
pub mod fen;
pub mod movegen;
pub mod service;

pub use board::{CastlingRights, Color, Piece, PieceKind, Position, Square};
pub use movegen::{CastleSide, ChessMove, MoveDetails};

use crate::error::FenError;
use crate::search::pick_best;
use crate::{AiPlayer, Coord, DrawReason, GameRng, GameState, MoveError, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Plies without capture or pawn move before the game is drawn
pub const NO_PROGRESS_PLIES: u32 = 100;
/// Score of delivering mate in the one-ply evaluator, in pawns
const MATE_SCORE: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessConfig {
    /// Starting position. The standard setup when absent or malformed.
    pub fen: Option<String>,
    /// Local answers only: 0 and 1 play random moves, anything higher the best
    /// one-ply material move. The remote service receives the value unchanged.
    pub difficulty: u8,
}

impl Default for ChessConfig {
    fn default() -> Self {
        Self {
            fen: None,
            difficulty: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessEffects {
    pub player: Player,
    pub mv: ChessMove,
    pub san: String,
    pub captured: Option<Piece>,
    pub castle: Option<CastleSide>,
    pub en_passant: bool,
    pub promotion: Option<PieceKind>,
    pub check: bool,
    pub checkmate: bool,
    /// Position after the move
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessState {
    position: Position,
    difficulty: u8,
}

impl GameState for ChessState {
    type Move = ChessMove;
    type Effects = ChessEffects;

    fn get_current_player(&self) -> Player {
        self.position.side_to_move.player()
    }

    fn get_possible_moves(&self) -> Vec<ChessMove> {
        if self.drawn_by_rule().is_some() {
            return Vec::new();
        }
        movegen::legal_moves(&self.position)
    }

    fn move_origin(&self, mv: &ChessMove) -> Option<Coord> {
        Some(mv.from.to_coord())
    }

    fn get_moves_from(&self, origin: Coord) -> Vec<ChessMove> {
        match Square::from_coord(origin) {
            Some(sq) => self.moves_from_square(sq),
            None => Vec::new(),
        }
    }

    /// Accepts a pawn reaching the last rank without a promotion piece as a queen promotion.
    fn make_move(&mut self, mv: &ChessMove) -> Result<ChessEffects, MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }
        let mv = self.normalize(*mv);
        if !self.is_legal(&mv) {
            return Err(MoveError::IllegalMove(mv.to_string()));
        }
        Ok(self.apply_move(&mv))
    }

    fn apply_move(&mut self, mv: &ChessMove) -> ChessEffects {
        let player = self.get_current_player();
        let san = movegen::san(&self.position, mv);
        let details = movegen::apply(&mut self.position, mv);
        let check = self.position.in_check(self.position.side_to_move);
        let checkmate = check && movegen::legal_moves(&self.position).is_empty();
        debug!(%mv, %san, "chess move");
        ChessEffects {
            player,
            mv: *mv,
            san,
            captured: details.and_then(|d| d.captured),
            castle: details.and_then(|d| d.castle),
            en_passant: details.is_some_and(|d| d.en_passant),
            promotion: details.and_then(|d| d.promotion),
            check,
            checkmate,
            fen: self.fen(),
        }
    }

    fn outcome(&self) -> Outcome {
        if let Some(reason) = self.drawn_by_rule() {
            return Outcome::Draw(reason);
        }
        if !movegen::legal_moves(&self.position).is_empty() {
            return Outcome::InProgress;
        }
        let us = self.position.side_to_move;
        if self.position.in_check(us) {
            Outcome::Win(us.opposite().player())
        } else {
            Outcome::Draw(DrawReason::Stalemate)
        }
    }
}

impl NewGame for ChessState {
    type Config = ChessConfig;

    fn new_game(config: &ChessConfig) -> Self {
        let position = match config.fen.as_deref().map(fen::parse_fen) {
            Some(Ok(pos)) => pos,
            Some(Err(e)) => {
                warn!(error = %e, "bad starting FEN, using the standard position");
                Position::startpos()
            }
            None => Position::startpos(),
        };
        Self {
            position,
            difficulty: config.difficulty,
        }
    }
}

impl AiPlayer for ChessState {
    fn ai_move(&self, rng: &mut GameRng) -> Option<ChessMove> {
        match self.difficulty {
            0 | 1 => rng.choose(&self.get_possible_moves()).copied(),
            _ => self.one_ply_best(),
        }
    }
}

impl ChessState {
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self {
            position: fen::parse_fen(fen)?,
            difficulty: ChessConfig::default().difficulty,
        })
    }

    pub fn fen(&self) -> String {
        fen::to_fen(&self.position)
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: u8) {
        self.difficulty = difficulty;
    }

    pub fn in_check(&self) -> bool {
        self.position.in_check(self.position.side_to_move)
    }

    pub fn moves_from_square(&self, from: Square) -> Vec<ChessMove> {
        self.get_possible_moves().into_iter().filter(|m| m.from == from).collect()
    }

    /// Adds a queen promotion when a pawn reaches the last rank without one.
    pub fn normalize(&self, mv: ChessMove) -> ChessMove {
        let pawn = self
            .position
            .piece_at(mv.from)
            .is_some_and(|p| p.kind == PieceKind::Pawn);
        let last_rank = self.position.side_to_move.opposite().back_rank();
        if pawn && mv.promotion.is_none() && mv.to.rank() == last_rank {
            mv.with_promotion(PieceKind::Queen)
        } else {
            mv
        }
    }

    /// One-ply material search: mate scores highest, draws score zero.
    pub fn one_ply_best(&self) -> Option<ChessMove> {
        let us = self.position.side_to_move;
        pick_best(&self.get_possible_moves(), |mv| {
            let mut next = self.clone();
            next.apply_move(mv);
            let score = match next.outcome() {
                Outcome::Win(_) => MATE_SCORE,
                Outcome::Draw(_) => 0,
                Outcome::InProgress => next.position.material(us),
            };
            score as i64
        })
    }

    fn drawn_by_rule(&self) -> Option<DrawReason> {
        if self.position.insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else if self.position.halfmove_clock >= NO_PROGRESS_PLIES {
            Some(DrawReason::NoProgress)
        } else {
            None
        }
    }
}

impl fmt::Display for ChessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.position)?;
        if self.in_check() {
            writeln!(f, "Check!")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(s: &str) -> ChessMove {
        s.parse().unwrap()
    }

    #[test]
    fn opening_moves() {
        let game = ChessState::new_game(&ChessConfig::default());
        assert_eq!(game.get_possible_moves().len(), 20);
        let knight = game.get_moves_from((7, 6));
        assert_eq!(knight.len(), 2);
        assert!(knight.iter().all(|m| m.from == "g1".parse().unwrap()));
    }

    #[test]
    fn illegal_move_leaves_state() {
        let mut game = ChessState::new_game(&ChessConfig::default());
        let before = game.clone();
        assert_eq!(game.make_move(&mv("e2e5")), Err(MoveError::IllegalMove("e2e5".into())));
        assert_eq!(game, before);
    }

    #[test]
    fn fools_mate() {
        let mut game = ChessState::new_game(&ChessConfig::default());
        for m in ["f2f3", "e7e5", "g2g4"] {
            game.make_move(&mv(m)).unwrap();
        }
        let fx = game.make_move(&mv("d8h4")).unwrap();
        assert!(fx.check && fx.checkmate);
        assert_eq!(fx.san, "Qh4#");
        assert_eq!(game.outcome(), Outcome::Win(-1));
        assert!(game.get_possible_moves().is_empty());
    }

    #[test]
    fn stalemate_is_a_draw() {
        let game = ChessState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.outcome(), Outcome::Draw(DrawReason::Stalemate));
    }

    #[test]
    fn bare_kings_are_a_draw() {
        let game = ChessState::from_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1").unwrap();
        assert_eq!(game.outcome(), Outcome::Draw(DrawReason::InsufficientMaterial));
        assert!(game.get_possible_moves().is_empty());
    }

    #[test]
    fn missing_promotion_defaults_to_queen() {
        let mut game = ChessState::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let fx = game.make_move(&mv("a7a8")).unwrap();
        assert_eq!(fx.promotion, Some(PieceKind::Queen));
        assert_eq!(fx.san, "a8=Q");
    }

    #[test]
    fn bad_config_fen_falls_back() {
        let game = ChessState::new_game(&ChessConfig {
            fen: Some("not a fen".into()),
            ..Default::default()
        });
        assert_eq!(game.fen(), fen::START_FEN);
    }

    #[test]
    fn one_ply_ai_takes_free_queen() {
        let game = ChessState::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
        assert_eq!(game.ai_move(&mut GameRng::new(0)), Some(mv("d1d5")));
    }

    #[test]
    fn one_ply_ai_finds_mate() {
        let game = ChessState::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        assert_eq!(game.ai_move(&mut GameRng::new(0)), Some(mv("a1a8")));
    }

    #[test]
    fn high_difficulty_stays_one_ply() {
        let mut game = ChessState::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3").unwrap();
        game.set_difficulty(5);
        assert_eq!(game.ai_move(&mut GameRng::new(8)), game.one_ply_best());
        game.set_difficulty(u8::MAX);
        assert_eq!(game.ai_move(&mut GameRng::new(9)), game.one_ply_best());
    }
}
