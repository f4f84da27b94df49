//! # Monopoly (mini) Game Implementation
//!
//! Two players race around a 20-space board buying properties and collecting rent.
//!
//! ## Rules
//! - Each player starts with $1500 on GO. Passing or landing on GO pays $200.
//! - A turn is a roll of two dice. Doubles roll again; a third double in a row
//!   sends the player to jail (space 10) instead of moving.
//! - An unowned property, railroad or utility may be bought. Landing on an
//!   opponent's space pays rent: base rent for properties, 25/50/100/200 by
//!   railroads owned, and dice times 4 or 10 by utilities owned.
//! - Income tax costs $200. Chance and Community Chest draw a card.
//! - In jail, doubles release the player; after three failed attempts the player
//!   pays $50 and moves with the third roll.
//! - A player whose cash drops below zero is bankrupt and loses.

use crate::{AiPlayer, GameRng, GameState, MoveError, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const START_MONEY: i64 = 1500;
pub const GO_SALARY: i64 = 200;
pub const JAIL: usize = 10;
pub const JAIL_FINE: i64 = 50;
/// Cash the AI keeps in hand after a purchase
pub const AI_RESERVE: i64 = 100;
const RAILROAD_RENT: [i64; 4] = [25, 50, 100, 200];
const UTILITY_MULTIPLIER: [i64; 2] = [4, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Go,
    Property { name: &'static str, price: i64, rent: i64 },
    Railroad { name: &'static str, price: i64 },
    Utility { name: &'static str, price: i64 },
    CommunityChest,
    Chance,
    Tax { amount: i64 },
    Jail,
}

impl Space {
    pub fn price(&self) -> Option<i64> {
        match *self {
            Space::Property { price, .. } | Space::Railroad { price, .. } | Space::Utility { price, .. } => Some(price),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Space::Go => "GO",
            Space::Property { name, .. } | Space::Railroad { name, .. } | Space::Utility { name, .. } => name,
            Space::CommunityChest => "Community Chest",
            Space::Chance => "Chance",
            Space::Tax { .. } => "Income Tax",
            Space::Jail => "Jail",
        }
    }
}

pub const BOARD: [Space; 20] = [
    Space::Go,
    Space::Property { name: "Mediterranean Ave", price: 60, rent: 2 },
    Space::CommunityChest,
    Space::Property { name: "Baltic Ave", price: 60, rent: 4 },
    Space::Tax { amount: 200 },
    Space::Railroad { name: "Reading Railroad", price: 200 },
    Space::Property { name: "Oriental Ave", price: 100, rent: 6 },
    Space::Chance,
    Space::Property { name: "Vermont Ave", price: 100, rent: 6 },
    Space::Property { name: "Connecticut Ave", price: 120, rent: 8 },
    Space::Jail,
    Space::Property { name: "St. Charles Place", price: 140, rent: 10 },
    Space::Utility { name: "Electric Company", price: 150 },
    Space::Property { name: "States Ave", price: 140, rent: 10 },
    Space::Property { name: "Virginia Ave", price: 160, rent: 12 },
    Space::Railroad { name: "Pennsylvania Railroad", price: 200 },
    Space::Property { name: "St. James Place", price: 180, rent: 14 },
    Space::CommunityChest,
    Space::Property { name: "Tennessee Ave", price: 180, rent: 14 },
    Space::Property { name: "New York Ave", price: 200, rent: 16 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Card {
    Collect(i64),
    Pay(i64),
    AdvanceToGo,
    Advance(usize),
    GoToJail,
}

const COMMUNITY_CHEST: [Card; 5] = [
    Card::Collect(200),
    Card::Pay(50),
    Card::Collect(20),
    Card::Collect(100),
    Card::GoToJail,
];

const CHANCE: [Card; 5] = [
    Card::AdvanceToGo,
    Card::Collect(50),
    Card::Pay(15),
    Card::Advance(3),
    Card::GoToJail,
];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum MonopolyMove {
    Roll,
    Buy,
    Decline,
    EndTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    AwaitingRoll,
    /// Deciding whether to buy the space just landed on
    Buying { space: usize, roll_again: bool },
    AwaitingEndTurn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonopolyConfig {
    pub seed: u64,
    pub start_money: i64,
}

impl Default for MonopolyConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_money: START_MONEY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonopolyEffects {
    pub player: Player,
    pub dice: Option<(u8, u8)>,
    pub moved_to: Option<usize>,
    pub passed_go: bool,
    pub card: Option<Card>,
    /// Rent paid to the opponent
    pub rent_paid: i64,
    /// Net cash change of the mover
    pub cash_delta: i64,
    pub bought: Option<usize>,
    pub jailed: bool,
    pub released: bool,
    pub bankrupt: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tycoon {
    pub money: i64,
    pub position: usize,
    pub in_jail: bool,
    pub jail_attempts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonopolyState {
    /// Index 0 is player 1, index 1 is player -1
    tycoons: [Tycoon; 2],
    owners: Vec<Option<Player>>,
    current_player: Player,
    phase: TurnPhase,
    doubles: u8,
    bankrupt: Option<Player>,
    rng: GameRng,
}

fn seat(player: Player) -> usize {
    if player == 1 {
        0
    } else {
        1
    }
}

impl GameState for MonopolyState {
    type Move = MonopolyMove;
    type Effects = MonopolyEffects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_moves(&self) -> Vec<MonopolyMove> {
        if self.bankrupt.is_some() {
            return Vec::new();
        }
        match self.phase {
            TurnPhase::AwaitingRoll => vec![MonopolyMove::Roll],
            TurnPhase::Buying { space, .. } => {
                let affordable = BOARD[space].price().is_some_and(|p| p <= self.tycoon().money);
                if affordable {
                    vec![MonopolyMove::Buy, MonopolyMove::Decline]
                } else {
                    vec![MonopolyMove::Decline]
                }
            }
            TurnPhase::AwaitingEndTurn => vec![MonopolyMove::EndTurn],
        }
    }

    fn make_move(&mut self, mv: &MonopolyMove) -> Result<MonopolyEffects, MoveError> {
        if self.bankrupt.is_some() {
            return Err(MoveError::GameOver);
        }
        if !self.is_legal(mv) {
            let phase = match self.phase {
                TurnPhase::AwaitingRoll => "roll",
                TurnPhase::Buying { .. } => "buying",
                TurnPhase::AwaitingEndTurn => "end of turn",
            };
            return Err(MoveError::WrongPhase(phase));
        }
        Ok(self.apply_move(mv))
    }

    fn apply_move(&mut self, mv: &MonopolyMove) -> MonopolyEffects {
        let player = self.current_player;
        let start_cash = self.tycoon().money;
        let mut fx = MonopolyEffects {
            player,
            ..Default::default()
        };
        match (*mv, self.phase) {
            (MonopolyMove::Roll, TurnPhase::AwaitingRoll) => self.roll(&mut fx),
            (MonopolyMove::Buy, TurnPhase::Buying { space, roll_again }) => {
                if let Some(price) = BOARD[space].price() {
                    self.tycoon_mut().money -= price;
                    self.owners[space] = Some(player);
                    fx.bought = Some(space);
                }
                self.finish_landing(roll_again);
            }
            (MonopolyMove::Decline, TurnPhase::Buying { roll_again, .. }) => self.finish_landing(roll_again),
            (MonopolyMove::EndTurn, TurnPhase::AwaitingEndTurn) => {
                self.current_player = -player;
                self.doubles = 0;
                self.phase = TurnPhase::AwaitingRoll;
            }
            _ => {}
        }
        for p in [1, -1] {
            if self.tycoons[seat(p)].money < 0 && self.bankrupt.is_none() {
                self.bankrupt = Some(p);
                fx.bankrupt = Some(p);
            }
        }
        fx.cash_delta = self.tycoons[seat(player)].money - start_cash;
        fx
    }

    fn outcome(&self) -> Outcome {
        match self.bankrupt {
            Some(loser) => Outcome::Win(-loser),
            None => Outcome::InProgress,
        }
    }
}

impl NewGame for MonopolyState {
    type Config = MonopolyConfig;

    fn new_game(config: &MonopolyConfig) -> Self {
        let tycoon = Tycoon {
            money: config.start_money,
            position: 0,
            in_jail: false,
            jail_attempts: 0,
        };
        Self {
            tycoons: [tycoon.clone(), tycoon],
            owners: vec![None; BOARD.len()],
            current_player: 1,
            phase: TurnPhase::AwaitingRoll,
            doubles: 0,
            bankrupt: None,
            rng: GameRng::new(config.seed),
        }
    }
}

impl AiPlayer for MonopolyState {
    /// Buys whenever the purchase leaves at least the cash reserve.
    fn ai_move(&self, _rng: &mut GameRng) -> Option<MonopolyMove> {
        if self.bankrupt.is_some() {
            return None;
        }
        Some(match self.phase {
            TurnPhase::AwaitingRoll => MonopolyMove::Roll,
            TurnPhase::Buying { space, .. } => match BOARD[space].price() {
                Some(price) if self.tycoon().money - price >= AI_RESERVE => MonopolyMove::Buy,
                _ => MonopolyMove::Decline,
            },
            TurnPhase::AwaitingEndTurn => MonopolyMove::EndTurn,
        })
    }
}

impl MonopolyState {
    pub fn tycoon_of(&self, player: Player) -> &Tycoon {
        &self.tycoons[seat(player)]
    }

    pub fn owner(&self, space: usize) -> Option<Player> {
        self.owners.get(space).copied().flatten()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    fn tycoon(&self) -> &Tycoon {
        &self.tycoons[seat(self.current_player)]
    }

    fn tycoon_mut(&mut self) -> &mut Tycoon {
        &mut self.tycoons[seat(self.current_player)]
    }

    fn roll(&mut self, fx: &mut MonopolyEffects) {
        let (d1, d2) = (self.rng.roll_die(), self.rng.roll_die());
        fx.dice = Some((d1, d2));
        let total = (d1 + d2) as usize;
        let doubles = d1 == d2;

        if self.tycoon().in_jail {
            let t = self.tycoon_mut();
            if doubles {
                t.in_jail = false;
                t.jail_attempts = 0;
            } else {
                t.jail_attempts += 1;
                if t.jail_attempts < 3 {
                    self.phase = TurnPhase::AwaitingEndTurn;
                    return;
                }
                t.money -= JAIL_FINE;
                t.in_jail = false;
                t.jail_attempts = 0;
            }
            fx.released = true;
            self.advance(total, fx);
            self.land(total, false, fx);
            return;
        }

        if doubles {
            self.doubles += 1;
            if self.doubles >= 3 {
                self.send_to_jail(fx);
                return;
            }
        } else {
            self.doubles = 0;
        }
        self.advance(total, fx);
        self.land(total, doubles, fx);
    }

    fn advance(&mut self, steps: usize, fx: &mut MonopolyEffects) {
        let t = self.tycoon_mut();
        let target = t.position + steps;
        if target >= BOARD.len() {
            t.money += GO_SALARY;
            fx.passed_go = true;
        }
        t.position = target % BOARD.len();
        fx.moved_to = Some(t.position);
    }

    fn send_to_jail(&mut self, fx: &mut MonopolyEffects) {
        let t = self.tycoon_mut();
        t.position = JAIL;
        t.in_jail = true;
        t.jail_attempts = 0;
        self.doubles = 0;
        fx.jailed = true;
        fx.moved_to = Some(JAIL);
        self.phase = TurnPhase::AwaitingEndTurn;
    }

    /// Resolves the space the current player stands on.
    fn land(&mut self, dice_total: usize, roll_again: bool, fx: &mut MonopolyEffects) {
        let player = self.current_player;
        let position = self.tycoon().position;
        let space = BOARD[position];
        match space {
            Space::Property { .. } | Space::Railroad { .. } | Space::Utility { .. } => match self.owners[position] {
                None => {
                    self.phase = TurnPhase::Buying {
                        space: position,
                        roll_again,
                    };
                    return;
                }
                Some(owner) if owner != player => {
                    let rent = self.rent(position, dice_total);
                    self.tycoon_mut().money -= rent;
                    self.tycoons[seat(owner)].money += rent;
                    fx.rent_paid = rent;
                }
                Some(_) => {}
            },
            Space::Tax { amount } => self.tycoon_mut().money -= amount,
            Space::CommunityChest | Space::Chance => {
                let deck: &[Card] = if space == Space::Chance { &CHANCE } else { &COMMUNITY_CHEST };
                let card = deck[self.rng.gen_range(0..deck.len())];
                fx.card = Some(card);
                match card {
                    Card::Collect(n) => self.tycoon_mut().money += n,
                    Card::Pay(n) => self.tycoon_mut().money -= n,
                    Card::AdvanceToGo => {
                        let steps = BOARD.len() - position;
                        self.advance(steps, fx);
                    }
                    Card::Advance(steps) => {
                        self.advance(steps, fx);
                        if BOARD[self.tycoon().position] != Space::Chance {
                            self.land(dice_total, roll_again, fx);
                            return;
                        }
                    }
                    Card::GoToJail => {
                        self.send_to_jail(fx);
                        return;
                    }
                }
            }
            Space::Go | Space::Jail => {}
        }
        self.finish_landing(roll_again);
    }

    fn finish_landing(&mut self, roll_again: bool) {
        self.phase = if roll_again && !self.tycoon().in_jail {
            TurnPhase::AwaitingRoll
        } else {
            TurnPhase::AwaitingEndTurn
        };
    }

    fn rent(&self, position: usize, dice_total: usize) -> i64 {
        let owner = self.owners[position];
        let owned_like = |pred: fn(&Space) -> bool| {
            BOARD
                .iter()
                .enumerate()
                .filter(|(i, s)| pred(s) && self.owners[*i] == owner)
                .count()
        };
        match BOARD[position] {
            Space::Property { rent, .. } => rent,
            Space::Railroad { .. } => {
                let n = owned_like(|s| matches!(s, Space::Railroad { .. }));
                RAILROAD_RENT[n.clamp(1, RAILROAD_RENT.len()) - 1]
            }
            Space::Utility { .. } => {
                let n = owned_like(|s| matches!(s, Space::Utility { .. }));
                dice_total as i64 * UTILITY_MULTIPLIER[n.clamp(1, UTILITY_MULTIPLIER.len()) - 1]
            }
            _ => 0,
        }
    }
}

impl fmt::Display for MonopolyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, space) in BOARD.iter().enumerate() {
            let here: Vec<&str> = [(1, "P1"), (-1, "P2")]
                .iter()
                .filter(|(p, _)| self.tycoons[seat(*p)].position == i)
                .map(|(_, tag)| *tag)
                .collect();
            let owner = match self.owners[i] {
                Some(1) => " [P1]",
                Some(_) => " [P2]",
                None => "",
            };
            writeln!(f, "{:>2} {:<22}{:<6} {}", i, space.name(), owner, here.join(" "))?;
        }
        for (p, tag) in [(1, "P1"), (-1, "P2")] {
            let t = &self.tycoons[seat(p)];
            writeln!(f, "{}: ${}{}", tag, t.money, if t.in_jail { " (in jail)" } else { "" })?;
        }
        Ok(())
    }
}

impl FromStr for MonopolyMove {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roll" | "r" => Ok(MonopolyMove::Roll),
            "buy" | "b" => Ok(MonopolyMove::Buy),
            "decline" | "d" | "pass" => Ok(MonopolyMove::Decline),
            "end" | "e" => Ok(MonopolyMove::EndTurn),
            other => Err(format!("unknown action {}", other)),
        }
    }
}

impl fmt::Display for MonopolyMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonopolyMove::Roll => "roll",
            MonopolyMove::Buy => "buy",
            MonopolyMove::Decline => "decline",
            MonopolyMove::EndTurn => "end",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> MonopolyState {
        MonopolyState::new_game(&MonopolyConfig::default())
    }

    #[test]
    fn only_roll_at_start() {
        let mut g = game();
        assert_eq!(g.get_possible_moves(), vec![MonopolyMove::Roll]);
        assert_eq!(g.make_move(&MonopolyMove::Buy), Err(MoveError::WrongPhase("roll")));
    }

    #[test]
    fn buying_transfers_ownership() {
        let mut g = game();
        g.phase = TurnPhase::Buying { space: 1, roll_again: false };
        g.tycoons[0].position = 1;
        let fx = g.make_move(&MonopolyMove::Buy).unwrap();
        assert_eq!(fx.bought, Some(1));
        assert_eq!(fx.cash_delta, -60);
        assert_eq!(g.owner(1), Some(1));
        assert_eq!(g.phase(), TurnPhase::AwaitingEndTurn);
    }

    #[test]
    fn rent_scales_with_railroads_owned() {
        let mut g = game();
        g.owners[5] = Some(-1);
        assert_eq!(g.rent(5, 7), 25);
        g.owners[15] = Some(-1);
        assert_eq!(g.rent(5, 7), 50);
        g.owners[12] = Some(-1);
        assert_eq!(g.rent(12, 7), 28);
    }

    #[test]
    fn landing_on_owned_space_pays_rent() {
        let mut g = game();
        g.owners[3] = Some(-1);
        g.tycoons[0].position = 3;
        let mut fx = MonopolyEffects::default();
        g.land(5, false, &mut fx);
        assert_eq!(fx.rent_paid, 4);
        assert_eq!(g.tycoon_of(1).money, START_MONEY - 4);
        assert_eq!(g.tycoon_of(-1).money, START_MONEY + 4);
    }

    #[test]
    fn passing_go_pays_salary() {
        let mut g = game();
        g.tycoons[0].position = 18;
        let mut fx = MonopolyEffects::default();
        g.advance(4, &mut fx);
        assert!(fx.passed_go);
        assert_eq!(g.tycoon_of(1).position, 2);
        assert_eq!(g.tycoon_of(1).money, START_MONEY + GO_SALARY);
    }

    #[test]
    fn negative_cash_is_bankruptcy() {
        let mut g = game();
        g.tycoons[0].money = 100;
        g.tycoons[0].position = 4;
        g.phase = TurnPhase::AwaitingEndTurn;
        let mut fx = MonopolyEffects::default();
        g.land(4, false, &mut fx);
        g.apply_move(&MonopolyMove::EndTurn);
        assert_eq!(g.outcome(), Outcome::Win(-1));
        assert!(g.get_possible_moves().is_empty());
    }

    #[test]
    fn ai_keeps_reserve() {
        let mut g = game();
        g.phase = TurnPhase::Buying { space: 19, roll_again: false };
        g.tycoons[0].money = 250;
        assert_eq!(g.ai_move(&mut GameRng::new(0)), Some(MonopolyMove::Decline));
        g.tycoons[0].money = 300;
        assert_eq!(g.ai_move(&mut GameRng::new(0)), Some(MonopolyMove::Buy));
    }

    #[test]
    fn seeded_games_replay() {
        let mut a = MonopolyState::new_game(&MonopolyConfig { seed: 3, ..Default::default() });
        let mut b = a.clone();
        for _ in 0..200 {
            let (Some(ma), Some(mb)) = (a.ai_move(&mut GameRng::new(0)), b.ai_move(&mut GameRng::new(0))) else {
                break;
            };
            assert_eq!(a.make_move(&ma).unwrap(), b.make_move(&mb).unwrap());
        }
        assert_eq!(a, b);
    }
}
