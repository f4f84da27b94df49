//! # Game Wrapper Module - Unified Game Interface
//!
//! Lets the controller and the terminal front-end drive any of the ten games
//! through one type. Each variant keeps its game's own state, move and effects
//! types; the dispatch is a `match` per method, generated by
//! `impl_game_dispatch!`.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │ GameController  │◄──►│   GameWrapper    │◄──►│  Game-Specific  │
//! │ play front-end  │    │   MoveWrapper    │    │ Implementations │
//! │                 │    │  EffectsWrapper  │    │ ChessState, ... │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! A move of one game submitted to another is rejected with
//! [`MoveError::MismatchedGameType`].

use crate::config::ArenaConfig;
use crate::games::battleship::{BattleshipEffects, BattleshipMove, BattleshipState};
use crate::games::carrom::{CarromEffects, CarromMove, CarromState};
use crate::games::checkers::{CheckersEffects, CheckersMove, CheckersState};
use crate::games::chess::{ChessEffects, ChessMove, ChessState};
use crate::games::connect4::{Connect4Effects, Connect4Move, Connect4State};
use crate::games::go::{GoEffects, GoMove, GoState};
use crate::games::ludo::{Color, LudoEffects, LudoMove, LudoState};
use crate::games::mancala::{MancalaEffects, MancalaMove, MancalaState};
use crate::games::monopoly::{MonopolyEffects, MonopolyMove, MonopolyState, BOARD};
use crate::games::reversi::{ReversiEffects, ReversiMove, ReversiState};
use crate::{AiPlayer, Coord, GameRng, GameState, MoveError, NewGame, Outcome, Player};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects a game on the command line and in saved sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Battleship,
    Carrom,
    Checkers,
    Chess,
    Connect4,
    Go,
    Ludo,
    Mancala,
    Monopoly,
    Reversi,
}

impl GameKind {
    pub const ALL: [GameKind; 10] = [
        GameKind::Battleship,
        GameKind::Carrom,
        GameKind::Checkers,
        GameKind::Chess,
        GameKind::Connect4,
        GameKind::Go,
        GameKind::Ludo,
        GameKind::Mancala,
        GameKind::Monopoly,
        GameKind::Reversi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameKind::Battleship => "Battleship",
            GameKind::Carrom => "Carrom",
            GameKind::Checkers => "Checkers",
            GameKind::Chess => "Chess",
            GameKind::Connect4 => "Connect 4",
            GameKind::Go => "Go",
            GameKind::Ludo => "Ludo",
            GameKind::Mancala => "Mancala",
            GameKind::Monopoly => "Monopoly",
            GameKind::Reversi => "Reversi",
        }
    }

    /// Input syntax shown to a human player.
    pub fn move_help(self) -> &'static str {
        match self {
            GameKind::Battleship => "'random', 'r,c,h' or 'r,c,v' to place, 'r,c' to fire",
            GameKind::Carrom => "'x angle power', e.g. '240 -90 18.5'",
            GameKind::Checkers => "'r,c-r,c', e.g. '5,0-4,1'",
            GameKind::Chess => "UCI like 'e2e4' or 'e7e8q'",
            GameKind::Connect4 => "a column number from 0",
            GameKind::Go => "a point like 'D4' or 'r,c', 'pass' or 'resign'",
            GameKind::Ludo => "'roll' or a token number 0-3",
            GameKind::Mancala => "a pit number, 0-5 for player 1 and 7-12 for player 2",
            GameKind::Monopoly => "'roll', 'buy', 'decline' or 'end'",
            GameKind::Reversi => "'r,c'",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of any supported game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameWrapper {
    Battleship(BattleshipState),
    Carrom(CarromState),
    Checkers(CheckersState),
    Chess(ChessState),
    Connect4(Connect4State),
    Go(GoState),
    Ludo(LudoState),
    Mancala(MancalaState),
    Monopoly(MonopolyState),
    Reversi(ReversiState),
}

/// Move of any supported game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveWrapper {
    Battleship(BattleshipMove),
    Carrom(CarromMove),
    Checkers(CheckersMove),
    Chess(ChessMove),
    Connect4(Connect4Move),
    Go(GoMove),
    Ludo(LudoMove),
    Mancala(MancalaMove),
    Monopoly(MonopolyMove),
    Reversi(ReversiMove),
}

/// What a move changed, in the vocabulary of its game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectsWrapper {
    Battleship(BattleshipEffects),
    Carrom(CarromEffects),
    Checkers(CheckersEffects),
    Chess(ChessEffects),
    Connect4(Connect4Effects),
    Go(GoEffects),
    Ludo(LudoEffects),
    Mancala(MancalaEffects),
    Monopoly(MonopolyEffects),
    Reversi(ReversiEffects),
}

macro_rules! impl_game_dispatch {
    ($($variant:ident),*) => {
        impl GameState for GameWrapper {
            type Move = MoveWrapper;
            type Effects = EffectsWrapper;

            fn get_num_players(&self) -> i32 {
                match self {
                    $(GameWrapper::$variant(g) => g.get_num_players(),)*
                }
            }

            fn get_current_player(&self) -> Player {
                match self {
                    $(GameWrapper::$variant(g) => g.get_current_player(),)*
                }
            }

            fn get_possible_moves(&self) -> Vec<MoveWrapper> {
                match self {
                    $(GameWrapper::$variant(g) => g
                        .get_possible_moves()
                        .into_iter()
                        .map(MoveWrapper::$variant)
                        .collect(),)*
                }
            }

            fn move_origin(&self, mv: &MoveWrapper) -> Option<Coord> {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => g.move_origin(m),)*
                    _ => None,
                }
            }

            fn get_moves_from(&self, origin: Coord) -> Vec<MoveWrapper> {
                match self {
                    $(GameWrapper::$variant(g) => g
                        .get_moves_from(origin)
                        .into_iter()
                        .map(MoveWrapper::$variant)
                        .collect(),)*
                }
            }

            fn is_legal(&self, mv: &MoveWrapper) -> bool {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => g.is_legal(m),)*
                    _ => false,
                }
            }

            /// # Panics
            /// When `mv` belongs to another game. Untrusted input goes through `make_move`.
            fn apply_move(&mut self, mv: &MoveWrapper) -> EffectsWrapper {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => {
                        EffectsWrapper::$variant(g.apply_move(m))
                    })*
                    (game, mv) => unreachable!("{:?} applied to {}", mv, game.kind()),
                }
            }

            fn make_move(&mut self, mv: &MoveWrapper) -> Result<EffectsWrapper, MoveError> {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => {
                        g.make_move(m).map(EffectsWrapper::$variant)
                    })*
                    _ => Err(MoveError::MismatchedGameType),
                }
            }

            fn outcome(&self) -> Outcome {
                match self {
                    $(GameWrapper::$variant(g) => g.outcome(),)*
                }
            }
        }

        impl GameWrapper {
            pub fn kind(&self) -> GameKind {
                match self {
                    $(GameWrapper::$variant(_) => GameKind::$variant,)*
                }
            }

            /// Computer move for the side to move, `None` when it has nothing to play.
            pub fn ai_move(&self, rng: &mut GameRng) -> Option<MoveWrapper> {
                match self {
                    $(GameWrapper::$variant(g) => g.ai_move(rng).map(MoveWrapper::$variant),)*
                }
            }
        }

        impl MoveWrapper {
            pub fn kind(&self) -> GameKind {
                match self {
                    $(MoveWrapper::$variant(_) => GameKind::$variant,)*
                }
            }
        }

        impl fmt::Display for GameWrapper {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(GameWrapper::$variant(g) => write!(f, "{}", g),)*
                }
            }
        }

        impl fmt::Display for MoveWrapper {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(MoveWrapper::$variant(m) => write!(f, "{}", m),)*
                }
            }
        }
    };
}

impl_game_dispatch!(Battleship, Carrom, Checkers, Chess, Connect4, Go, Ludo, Mancala, Monopoly, Reversi);

impl GameWrapper {
    /// Fresh game of `kind` set up from its section of `config`.
    pub fn new_game(kind: GameKind, config: &ArenaConfig) -> Self {
        match kind {
            GameKind::Battleship => GameWrapper::Battleship(BattleshipState::new_game(&config.battleship)),
            GameKind::Carrom => GameWrapper::Carrom(CarromState::new_game(&config.carrom)),
            GameKind::Checkers => GameWrapper::Checkers(CheckersState::new_game(&config.checkers)),
            GameKind::Chess => GameWrapper::Chess(ChessState::new_game(&config.chess)),
            GameKind::Connect4 => GameWrapper::Connect4(Connect4State::new_game(&config.connect4)),
            GameKind::Go => GameWrapper::Go(GoState::new_game(&config.go)),
            GameKind::Ludo => GameWrapper::Ludo(LudoState::new_game(&config.ludo)),
            GameKind::Mancala => GameWrapper::Mancala(MancalaState::new_game(&config.mancala)),
            GameKind::Monopoly => GameWrapper::Monopoly(MonopolyState::new_game(&config.monopoly)),
            GameKind::Reversi => GameWrapper::Reversi(ReversiState::new_game(&config.reversi)),
        }
    }

    /// Suggested move for a human. Reversi uses its flip-and-corner heuristic,
    /// every other game asks its AI.
    pub fn hint(&self, rng: &mut GameRng) -> Option<MoveWrapper> {
        match self {
            GameWrapper::Reversi(g) => g.hint().map(MoveWrapper::Reversi),
            other => other.ai_move(rng),
        }
    }

    /// Parses human input in this game's move syntax.
    pub fn parse_move(&self, input: &str) -> Result<MoveWrapper, String> {
        let input = input.trim();
        Ok(match self {
            GameWrapper::Battleship(_) => MoveWrapper::Battleship(input.parse()?),
            GameWrapper::Carrom(_) => MoveWrapper::Carrom(input.parse()?),
            GameWrapper::Checkers(_) => MoveWrapper::Checkers(input.parse()?),
            GameWrapper::Chess(_) => MoveWrapper::Chess(input.parse()?),
            GameWrapper::Connect4(_) => MoveWrapper::Connect4(input.parse()?),
            GameWrapper::Go(g) => MoveWrapper::Go(GoMove::parse_for(g.size(), input)?),
            GameWrapper::Ludo(_) => MoveWrapper::Ludo(input.parse()?),
            GameWrapper::Mancala(_) => MoveWrapper::Mancala(input.parse()?),
            GameWrapper::Monopoly(_) => MoveWrapper::Monopoly(input.parse()?),
            GameWrapper::Reversi(_) => MoveWrapper::Reversi(input.parse()?),
        })
    }

    /// Display name of a seat, e.g. "Black" in Go or "Player 2" in Carrom.
    pub fn player_name(&self, player: Player) -> String {
        let two = |first: &str, second: &str| if player == 1 { first.to_string() } else { second.to_string() };
        match self {
            GameWrapper::Chess(_) => two("White", "Black"),
            GameWrapper::Go(_) | GameWrapper::Reversi(_) => two("Black", "White"),
            GameWrapper::Checkers(_) => two("Red", "Black"),
            GameWrapper::Connect4(_) => two("Red", "Yellow"),
            GameWrapper::Ludo(_) => Color::ALL
                .iter()
                .find(|c| c.player() == player)
                .map_or_else(|| format!("Player {}", player), |c| format!("{:?}", c)),
            _ => two("Player 1", "Player 2"),
        }
    }
}

impl EffectsWrapper {
    pub fn player(&self) -> Player {
        match self {
            EffectsWrapper::Battleship(e) => e.player,
            EffectsWrapper::Carrom(e) => e.player,
            EffectsWrapper::Checkers(e) => e.player,
            EffectsWrapper::Chess(e) => e.player,
            EffectsWrapper::Connect4(e) => e.player,
            EffectsWrapper::Go(e) => e.player,
            EffectsWrapper::Ludo(e) => e.player,
            EffectsWrapper::Mancala(e) => e.player,
            EffectsWrapper::Monopoly(e) => e.player,
            EffectsWrapper::Reversi(e) => e.player,
        }
    }
}

/// One-line summary for the move log.
impl fmt::Display for EffectsWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectsWrapper::Battleship(e) => {
                if !e.placed.is_empty() {
                    write!(f, "placed {} ship(s)", e.placed.len())?;
                }
                if let Some(shot) = &e.shot {
                    let (r, c) = shot.target;
                    write!(f, "fired at {},{}: {}", r, c, if shot.hit { "hit" } else { "miss" })?;
                    if let Some(kind) = shot.sunk {
                        write!(f, ", sunk {:?}", kind)?;
                    }
                }
                Ok(())
            }
            EffectsWrapper::Carrom(e) => {
                write!(f, "strike {}: {} pocketed", e.strike, e.pocketed.len())?;
                if let Some(foul) = e.foul {
                    write!(f, ", foul {:?}", foul)?;
                }
                if e.turn_continues {
                    write!(f, ", shoots again")?;
                }
                Ok(())
            }
            EffectsWrapper::Checkers(e) => {
                write!(f, "{},{} -> {},{}", e.from.0, e.from.1, e.to.0, e.to.1)?;
                if let Some((r, c)) = e.captured {
                    write!(f, " takes {},{}", r, c)?;
                }
                if e.promoted {
                    write!(f, ", crowned")?;
                }
                if e.chain_continues {
                    write!(f, ", must jump again")?;
                }
                Ok(())
            }
            EffectsWrapper::Chess(e) => write!(f, "{}", e.san),
            EffectsWrapper::Connect4(e) => {
                write!(f, "dropped into {},{}", e.placed.0, e.placed.1)?;
                if !e.winning_line.is_empty() {
                    write!(f, ", connects {}", e.winning_line.len())?;
                }
                Ok(())
            }
            EffectsWrapper::Go(e) => {
                if e.resigned {
                    write!(f, "resigned")
                } else if e.passed {
                    write!(f, "passed")
                } else {
                    if let Some((r, c)) = e.placed {
                        write!(f, "stone at {},{}", r, c)?;
                    }
                    if !e.captured.is_empty() {
                        write!(f, ", captured {}", e.captured.len())?;
                    }
                    Ok(())
                }
            }
            EffectsWrapper::Ludo(e) => {
                if let Some(roll) = e.rolled {
                    write!(f, "rolled {}", roll)?;
                }
                if let Some(step) = &e.step {
                    write!(f, "token {} to {}", step.token, step.to)?;
                }
                if !e.captured.is_empty() {
                    write!(f, ", captured {}", e.captured.len())?;
                }
                if e.forfeited {
                    write!(f, ", third six forfeits the turn")?;
                }
                Ok(())
            }
            EffectsWrapper::Mancala(e) => {
                write!(f, "sowed {} stone(s)", e.sown.len())?;
                if let Some(c) = &e.capture {
                    write!(f, ", captured {}", c.stones)?;
                }
                if e.extra_turn {
                    write!(f, ", moves again")?;
                }
                Ok(())
            }
            EffectsWrapper::Monopoly(e) => {
                if let Some((a, b)) = e.dice {
                    write!(f, "rolled {}+{}", a, b)?;
                }
                if let Some(to) = e.moved_to {
                    write!(f, " to {}", BOARD[to].name())?;
                }
                if let Some(space) = e.bought {
                    write!(f, "bought {}", BOARD[space].name())?;
                }
                if e.rent_paid > 0 {
                    write!(f, ", paid {} rent", e.rent_paid)?;
                }
                if e.jailed {
                    write!(f, ", sent to jail")?;
                }
                Ok(())
            }
            EffectsWrapper::Reversi(e) => {
                write!(f, "disc at {},{} flips {}", e.placed.0, e.placed.1, e.flipped.len())?;
                if let Some(p) = e.skipped {
                    write!(f, ", player {} passes", p)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_starts_in_progress() {
        let config = ArenaConfig::default();
        for kind in GameKind::ALL {
            let game = GameWrapper::new_game(kind, &config);
            assert_eq!(game.kind(), kind);
            assert_eq!(game.outcome(), Outcome::InProgress, "{}", kind);
            assert!(!game.get_possible_moves().is_empty(), "{}", kind);
        }
    }

    #[test]
    fn mismatched_move_is_rejected() {
        let mut game = GameWrapper::new_game(GameKind::Connect4, &ArenaConfig::default());
        let before = game.clone();
        let chess_move = MoveWrapper::Chess("e2e4".parse().unwrap());
        assert!(!game.is_legal(&chess_move));
        assert_eq!(game.make_move(&chess_move), Err(MoveError::MismatchedGameType));
        assert_eq!(game, before);
    }

    #[test]
    fn parses_in_the_game_syntax() {
        let game = GameWrapper::new_game(GameKind::Connect4, &ArenaConfig::default());
        assert_eq!(game.parse_move(" 3 "), Ok(MoveWrapper::Connect4(Connect4Move(3))));
        assert!(game.parse_move("e2e4").is_err());

        let mut chess = GameWrapper::new_game(GameKind::Chess, &ArenaConfig::default());
        let mv = chess.parse_move("e2e4").unwrap();
        assert_eq!(mv.to_string(), "e2e4");
        let fx = chess.make_move(&mv).unwrap();
        assert_eq!(fx.to_string(), "e4");
        assert_eq!(fx.player(), 1);
    }

    #[test]
    fn origin_filter_passes_through() {
        let game = GameWrapper::new_game(GameKind::Chess, &ArenaConfig::default());
        let knight = game.legal_moves(Some((7, 1)));
        assert_eq!(knight.len(), 2);
        assert!(knight.iter().all(|m| game.move_origin(m) == Some((7, 1))));
    }

    #[test]
    fn hint_is_legal() {
        let mut rng = GameRng::new(7);
        for kind in [GameKind::Reversi, GameKind::Mancala, GameKind::Connect4] {
            let game = GameWrapper::new_game(kind, &ArenaConfig::default());
            let hint = game.hint(&mut rng).unwrap();
            assert!(game.is_legal(&hint), "{}", kind);
        }
    }
}
