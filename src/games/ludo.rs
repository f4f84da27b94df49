//! # Ludo Game Implementation
//!
//! A dice race for two to four colors, each with four tokens.
//!
//! ## Track model
//! A token's position is its progress from its own start square: `0..=50` on
//! the shared 52-square loop, `51..=55` in its private home stretch and `56`
//! once finished. Tokens waiting in the yard have no position. The shared
//! square of a token is `(start + progress) % 52`.
//!
//! ## Rules
//! - A turn starts with a roll; the dice come from the game's seeded generator
//! - A token leaves the yard only on a 6, onto its start square
//! - A token may not overshoot the finish
//! - Landing on an opponent on a non-safe square sends it back to the yard
//! - Rolling a 6 grants another roll; a third consecutive 6 forfeits the turn
//! - A color with all four tokens home is ranked; the game ends when only one
//!   color is still racing. The first color home wins.

use crate::search::pick_best;
use crate::{AiPlayer, GameRng, GameState, MoveError, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TRACK_LEN: u8 = 52;
pub const LAST_TRACK: u8 = 50;
pub const FINISH: u8 = 56;
pub const TOKENS: usize = 4;
/// Squares where tokens cannot be captured. Start squares are included.
pub const SAFE_SQUARES: [u8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Yellow,
    Green,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Yellow, Color::Green];

    pub fn player(self) -> Player {
        self as Player + 1
    }

    pub fn start_square(self) -> u8 {
        self as u8 * 13
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LudoMove {
    Roll,
    MoveToken(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LudoConfig {
    pub num_players: usize,
    pub seed: u64,
}

impl LudoConfig {
    /// Seated colors for the configured player count, `None` outside 2 to 4.
    /// Two players sit opposite each other.
    pub fn colors(&self) -> Option<&'static [Color]> {
        match self.num_players {
            2 => Some(&[Color::Red, Color::Yellow]),
            3 => Some(&[Color::Red, Color::Blue, Color::Yellow]),
            4 => Some(&Color::ALL),
            _ => None,
        }
    }
}

impl Default for LudoConfig {
    fn default() -> Self {
        Self {
            num_players: 4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LudoPhase {
    AwaitingRoll,
    AwaitingMove(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStep {
    pub token: usize,
    /// Progress before the move, `None` when leaving the yard
    pub from: Option<u8>,
    pub to: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LudoEffects {
    pub player: Player,
    pub rolled: Option<u8>,
    pub step: Option<TokenStep>,
    /// Opponent tokens sent back to the yard as (player, token)
    pub captured: Vec<(Player, usize)>,
    pub extra_roll: bool,
    /// Third six in a row: the turn was lost
    pub forfeited: bool,
    /// The roll left no token able to move
    pub no_move: bool,
    /// This move brought the last token of the player home
    pub player_finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub color: Color,
    pub tokens: [Option<u8>; TOKENS],
}

impl Seat {
    fn is_done(&self) -> bool {
        self.tokens.iter().all(|t| *t == Some(FINISH))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LudoState {
    seats: Vec<Seat>,
    turn: usize,
    phase: LudoPhase,
    consecutive_sixes: u8,
    finish_order: Vec<Player>,
    rng: GameRng,
}

impl GameState for LudoState {
    type Move = LudoMove;
    type Effects = LudoEffects;

    fn get_num_players(&self) -> i32 {
        self.seats.len() as i32
    }

    fn get_current_player(&self) -> Player {
        self.seats[self.turn].color.player()
    }

    fn get_possible_moves(&self) -> Vec<LudoMove> {
        if self.is_over() {
            return Vec::new();
        }
        match self.phase {
            LudoPhase::AwaitingRoll => vec![LudoMove::Roll],
            LudoPhase::AwaitingMove(dice) => self
                .movable_tokens(dice)
                .into_iter()
                .map(LudoMove::MoveToken)
                .collect(),
        }
    }

    fn make_move(&mut self, mv: &LudoMove) -> Result<LudoEffects, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        match (self.phase, mv) {
            (LudoPhase::AwaitingRoll, LudoMove::MoveToken(_)) => return Err(MoveError::WrongPhase("roll")),
            (LudoPhase::AwaitingMove(_), LudoMove::Roll) => return Err(MoveError::WrongPhase("move")),
            _ => {}
        }
        if !self.is_legal(mv) {
            return Err(MoveError::IllegalMove(format!("{:?}", mv)));
        }
        Ok(self.apply_move(mv))
    }

    fn apply_move(&mut self, mv: &LudoMove) -> LudoEffects {
        let player = self.get_current_player();
        let mut fx = LudoEffects {
            player,
            ..Default::default()
        };
        match (*mv, self.phase) {
            (LudoMove::Roll, LudoPhase::AwaitingRoll) => {
                let dice = self.rng.roll_die();
                fx.rolled = Some(dice);
                if dice == 6 {
                    self.consecutive_sixes += 1;
                }
                if self.consecutive_sixes >= 3 {
                    fx.forfeited = true;
                    self.next_turn();
                } else if self.movable_tokens(dice).is_empty() {
                    fx.no_move = true;
                    if dice == 6 {
                        fx.extra_roll = true;
                    } else {
                        self.next_turn();
                    }
                } else {
                    self.phase = LudoPhase::AwaitingMove(dice);
                }
            }
            (LudoMove::MoveToken(token), LudoPhase::AwaitingMove(dice)) => {
                let Some(to) = self.target(token, dice) else {
                    return fx;
                };
                let from = self.seats[self.turn].tokens[token];
                self.seats[self.turn].tokens[token] = Some(to);
                fx.step = Some(TokenStep { token, from, to });

                if let Some(square) = self.square_of(self.turn, to) {
                    if !SAFE_SQUARES.contains(&square) {
                        fx.captured = self.capture_at(square);
                    }
                }

                if self.seats[self.turn].is_done() {
                    fx.player_finished = true;
                    self.finish_order.push(player);
                    self.next_turn();
                } else if dice == 6 {
                    fx.extra_roll = true;
                    self.phase = LudoPhase::AwaitingRoll;
                } else {
                    self.next_turn();
                }
            }
            _ => {}
        }
        fx
    }

    fn outcome(&self) -> Outcome {
        match self.finish_order.first() {
            Some(&winner) if self.is_over() => Outcome::Win(winner),
            _ => Outcome::InProgress,
        }
    }
}

impl NewGame for LudoState {
    type Config = LudoConfig;

    /// # Panics
    ///
    /// If `num_players` is not 2, 3 or 4. [`crate::config::ArenaConfig::validate`]
    /// rejects such configs before a game is created.
    fn new_game(config: &LudoConfig) -> Self {
        let Some(colors) = config.colors() else {
            panic!("ludo is played by 2 to 4 players, not {}", config.num_players);
        };
        Self {
            seats: colors
                .iter()
                .map(|&color| Seat {
                    color,
                    tokens: [None; TOKENS],
                })
                .collect(),
            turn: 0,
            phase: LudoPhase::AwaitingRoll,
            consecutive_sixes: 0,
            finish_order: Vec::new(),
            rng: GameRng::new(config.seed),
        }
    }
}

impl AiPlayer for LudoState {
    /// Rolls when a roll is due. Otherwise prefers, in order: a capture,
    /// finishing a token, leaving the yard, reaching a safe square, then the
    /// token furthest along.
    fn ai_move(&self, _rng: &mut GameRng) -> Option<LudoMove> {
        let dice = match self.phase {
            _ if self.is_over() => return None,
            LudoPhase::AwaitingRoll => return Some(LudoMove::Roll),
            LudoPhase::AwaitingMove(d) => d,
        };
        pick_best(&self.get_possible_moves(), |mv| {
            let LudoMove::MoveToken(token) = *mv else { return i64::MIN };
            let Some(to) = self.target(token, dice) else { return i64::MIN };
            let from = self.seats[self.turn].tokens[token];
            let mut score = to as i64;
            if let Some(square) = self.square_of(self.turn, to) {
                if SAFE_SQUARES.contains(&square) {
                    score += 50;
                } else if self.occupants(square).iter().any(|&(seat, _)| seat != self.turn) {
                    score += 1000;
                }
            }
            if to == FINISH {
                score += 500;
            }
            if from.is_none() {
                score += 300;
            }
            score
        })
    }
}

impl LudoState {
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn phase(&self) -> LudoPhase {
        self.phase
    }

    /// Players in the order they brought all tokens home.
    pub fn finish_order(&self) -> &[Player] {
        &self.finish_order
    }

    fn is_over(&self) -> bool {
        self.finish_order.len() + 1 >= self.seats.len()
    }

    fn next_turn(&mut self) {
        self.phase = LudoPhase::AwaitingRoll;
        self.consecutive_sixes = 0;
        for _ in 0..self.seats.len() {
            self.turn = (self.turn + 1) % self.seats.len();
            if !self.seats[self.turn].is_done() {
                break;
            }
        }
    }

    /// Progress a token would reach with `dice`, or `None` if it cannot move.
    fn target(&self, token: usize, dice: u8) -> Option<u8> {
        match *self.seats[self.turn].tokens.get(token)? {
            None if dice == 6 => Some(0),
            None => None,
            Some(p) if p + dice <= FINISH && p != FINISH => Some(p + dice),
            Some(_) => None,
        }
    }

    fn movable_tokens(&self, dice: u8) -> Vec<usize> {
        (0..TOKENS).filter(|&t| self.target(t, dice).is_some()).collect()
    }

    /// Shared-loop square for a progress value, `None` in the home stretch.
    fn square_of(&self, seat: usize, progress: u8) -> Option<u8> {
        (progress <= LAST_TRACK).then(|| (self.seats[seat].color.start_square() + progress) % TRACK_LEN)
    }

    fn occupants(&self, square: u8) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (seat, s) in self.seats.iter().enumerate() {
            for (t, pos) in s.tokens.iter().enumerate() {
                if let Some(p) = *pos {
                    if self.square_of(seat, p) == Some(square) {
                        out.push((seat, t));
                    }
                }
            }
        }
        out
    }

    fn capture_at(&mut self, square: u8) -> Vec<(Player, usize)> {
        let victims: Vec<(usize, usize)> = self
            .occupants(square)
            .into_iter()
            .filter(|&(seat, _)| seat != self.turn)
            .collect();
        victims
            .into_iter()
            .map(|(seat, t)| {
                self.seats[seat].tokens[t] = None;
                (self.seats[seat].color.player(), t)
            })
            .collect()
    }
}

impl fmt::Display for LudoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seat) in self.seats.iter().enumerate() {
            let marker = if i == self.turn { ">" } else { " " };
            write!(f, "{} {:<7}", marker, format!("{:?}", seat.color))?;
            for pos in &seat.tokens {
                match pos {
                    None => write!(f, " yard")?,
                    Some(FINISH) => write!(f, " home")?,
                    Some(p) => write!(f, " {:>4}", p)?,
                }
            }
            writeln!(f)?;
        }
        match self.phase {
            LudoPhase::AwaitingRoll => writeln!(f, "waiting for a roll"),
            LudoPhase::AwaitingMove(d) => writeln!(f, "rolled {}", d),
        }
    }
}

impl FromStr for LudoMove {
    type Err = String;

    /// `roll`, or a token index `0..=3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("roll") || s.eq_ignore_ascii_case("r") {
            return Ok(LudoMove::Roll);
        }
        s.parse::<usize>().map(LudoMove::MoveToken).map_err(|e| e.to_string())
    }
}

impl fmt::Display for LudoMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LudoMove::Roll => write!(f, "roll"),
            LudoMove::MoveToken(t) => write!(f, "token {}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_with(tokens: &[[Option<u8>; TOKENS]], phase: LudoPhase) -> LudoState {
        let mut game = LudoState::new_game(&LudoConfig {
            num_players: tokens.len(),
            seed: 0,
        });
        for (seat, t) in game.seats.iter_mut().zip(tokens) {
            seat.tokens = *t;
        }
        game.phase = phase;
        game
    }

    #[test]
    fn yard_tokens_need_a_six() {
        let game = game_with(&[[None; 4], [None; 4]], LudoPhase::AwaitingMove(5));
        assert!(game.get_possible_moves().is_empty());
        let game = game_with(&[[None; 4], [None; 4]], LudoPhase::AwaitingMove(6));
        assert_eq!(game.get_possible_moves().len(), 4);
    }

    #[test]
    fn cannot_overshoot_finish() {
        let game = game_with(&[[Some(54), None, None, None], [None; 4]], LudoPhase::AwaitingMove(3));
        assert!(game.get_possible_moves().is_empty());
        let game = game_with(&[[Some(54), None, None, None], [None; 4]], LudoPhase::AwaitingMove(2));
        assert_eq!(game.get_possible_moves(), vec![LudoMove::MoveToken(0)]);
    }

    #[test]
    fn landing_on_opponent_sends_it_home() {
        // Red progress 10 is square 10; yellow (start 26) progress 36 is also square 10.
        let mut game = game_with(
            &[[Some(7), None, None, None], [Some(36), None, None, None]],
            LudoPhase::AwaitingMove(3),
        );
        let fx = game.make_move(&LudoMove::MoveToken(0)).unwrap();
        assert_eq!(fx.captured, vec![(Color::Yellow.player(), 0)]);
        assert_eq!(game.seats()[1].tokens[0], None);
        assert_eq!(game.get_current_player(), Color::Yellow.player());
    }

    #[test]
    fn safe_square_protects() {
        // Square 8 is safe.
        let mut game = game_with(
            &[[Some(5), None, None, None], [Some(34), None, None, None]],
            LudoPhase::AwaitingMove(3),
        );
        let fx = game.make_move(&LudoMove::MoveToken(0)).unwrap();
        assert!(fx.captured.is_empty());
        assert_eq!(game.seats()[1].tokens[0], Some(34));
    }

    #[test]
    fn six_grants_another_roll() {
        let mut game = game_with(&[[None; 4], [None; 4]], LudoPhase::AwaitingMove(6));
        let fx = game.make_move(&LudoMove::MoveToken(0)).unwrap();
        assert!(fx.extra_roll);
        assert_eq!(game.get_current_player(), Color::Red.player());
        assert_eq!(game.phase(), LudoPhase::AwaitingRoll);
    }

    #[test]
    fn wrong_phase_rejected() {
        let mut game = LudoState::new_game(&LudoConfig::default());
        assert_eq!(game.make_move(&LudoMove::MoveToken(0)), Err(MoveError::WrongPhase("roll")));
    }

    #[test]
    fn finishing_all_tokens_wins_two_player_game() {
        let mut game = game_with(
            &[[Some(FINISH), Some(FINISH), Some(FINISH), Some(53)], [None; 4]],
            LudoPhase::AwaitingMove(3),
        );
        let fx = game.make_move(&LudoMove::MoveToken(3)).unwrap();
        assert!(fx.player_finished);
        assert_eq!(game.outcome(), Outcome::Win(Color::Red.player()));
    }

    #[test]
    fn same_seed_same_rolls() {
        let mut a = LudoState::new_game(&LudoConfig { num_players: 4, seed: 11 });
        let mut b = a.clone();
        for _ in 0..40 {
            let ma = a.ai_move(&mut GameRng::new(0)).unwrap();
            let mb = b.ai_move(&mut GameRng::new(0)).unwrap();
            assert_eq!(ma, mb);
            assert_eq!(a.make_move(&ma).unwrap(), b.make_move(&mb).unwrap());
        }
    }

    #[test]
    fn ai_prefers_capture() {
        let game = game_with(
            &[[Some(7), Some(20), None, None], [Some(36), None, None, None]],
            LudoPhase::AwaitingMove(3),
        );
        assert_eq!(game.ai_move(&mut GameRng::new(0)), Some(LudoMove::MoveToken(0)));
    }

    #[test]
    #[should_panic(expected = "2 to 4 players")]
    fn single_player_config_is_rejected() {
        LudoState::new_game(&LudoConfig { num_players: 1, seed: 0 });
    }
}
