//! # Carrom Game Implementation
//!
//! Player 1 shoots for the white men from the bottom baseline, player -1 for the
//! black men from the top. A move is one strike; the table is then simulated
//! until every body is at rest.
//!
//! ## Rules
//! - Pocketing an own man keeps the turn
//! - Pocketing the striker or an opponent man is a foul: the turn passes and one
//!   of the shooter's pocketed men returns to the centre
//! - Pocketing the queen earns a cover strike: it must be covered by pocketing
//!   an own man in the same or the next strike, otherwise it returns to the
//!   centre. A covered queen scores 3
//! - The player whose color is cleared first wins

pub mod driver;
pub mod physics;

pub use driver::{PhysicsLoop, StepOutcome};
pub use physics::{Body, BodyId, Kind, PocketEvent, Table};

use crate::search::pick_best;
use crate::{AiPlayer, GameRng, GameState, NewGame, Outcome, Player};
use physics::{BOARD_SIZE, MAN_RADIUS, MAX_POWER, MAX_TICKS, POCKETS, STRIKER_RADIUS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Leftmost striker x on the baseline
pub const BASELINE_MIN: i32 = 60;
/// Rightmost striker x on the baseline
pub const BASELINE_MAX: i32 = 420;
const BASELINE_STOPS: [i32; 3] = [120, 240, 360];
const AI_POWER_TENTHS: [u32; 2] = [140, 220];

/// Baseline x, angle in milliradians (board coordinates, y grows downward) and power in tenths.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct CarromMove {
    pub x: i32,
    pub angle_mrad: i32,
    pub power_tenths: u32,
}

impl CarromMove {
    pub fn angle(&self) -> f64 {
        self.angle_mrad as f64 / 1000.0
    }

    pub fn power(&self) -> f64 {
        self.power_tenths as f64 / 10.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foul {
    StrikerPocketed,
    WrongColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueenStatus {
    OnBoard,
    /// Pocketed by this player, awaiting cover on the next strike
    Pending(Player),
    Covered(Player),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarromConfig {
    /// Ticks simulated per strike before the table is forced to rest
    pub max_ticks: u32,
}

impl Default for CarromConfig {
    fn default() -> Self {
        Self { max_ticks: MAX_TICKS }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarromEffects {
    pub player: Player,
    pub strike: CarromMove,
    pub pocketed: Vec<PocketEvent>,
    pub foul: Option<Foul>,
    pub respotted: Vec<Kind>,
    pub queen: QueenStatus,
    pub turn_continues: bool,
    pub ticks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarromState {
    table: Table,
    current_player: Player,
    queen: QueenStatus,
    max_ticks: u32,
}

pub fn color_of(player: Player) -> Kind {
    if player == 1 {
        Kind::White
    } else {
        Kind::Black
    }
}

pub fn baseline_y(player: Player) -> f64 {
    if player == 1 {
        BOARD_SIZE - 40.0
    } else {
        40.0
    }
}

impl GameState for CarromState {
    type Move = CarromMove;
    type Effects = CarromEffects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    /// Discretised strikes: from each baseline stop, straight at every own man
    /// and along the ghost-ball line that sends it into each pocket.
    fn get_possible_moves(&self) -> Vec<CarromMove> {
        if self.is_terminal() {
            return Vec::new();
        }
        let y = baseline_y(self.current_player);
        let mut targets: Vec<&Body> = self
            .table
            .men
            .iter()
            .filter(|m| !m.pocketed && m.kind == color_of(self.current_player))
            .collect();
        if let QueenStatus::OnBoard = self.queen {
            targets.extend(self.table.men.iter().filter(|m| !m.pocketed && m.kind == Kind::Queen));
        }

        let mut moves = Vec::new();
        for x in BASELINE_STOPS {
            if !self.table.is_free((x as f64, y), STRIKER_RADIUS, None) {
                continue;
            }
            for man in &targets {
                let mut aims = vec![(man.x, man.y)];
                for (px, py) in POCKETS {
                    let (dx, dy) = (man.x - px, man.y - py);
                    let d = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
                    let reach = MAN_RADIUS + STRIKER_RADIUS;
                    aims.push((man.x + dx / d * reach, man.y + dy / d * reach));
                }
                for (ax, ay) in aims {
                    let angle = (ay - y).atan2(ax - x as f64);
                    for power_tenths in AI_POWER_TENTHS {
                        let mv = CarromMove {
                            x,
                            angle_mrad: (angle * 1000.0).round() as i32,
                            power_tenths,
                        };
                        if !moves.contains(&mv) {
                            moves.push(mv);
                        }
                    }
                }
            }
        }
        moves
    }

    /// Strikes are continuous, so any in-bounds strike is legal.
    fn is_legal(&self, mv: &CarromMove) -> bool {
        !self.is_terminal()
            && (BASELINE_MIN..=BASELINE_MAX).contains(&mv.x)
            && (-3142..=3142).contains(&mv.angle_mrad)
            && (1..=(MAX_POWER * 10.0) as u32).contains(&mv.power_tenths)
            && self
                .table
                .is_free((mv.x as f64, baseline_y(self.current_player)), STRIKER_RADIUS, None)
    }

    fn apply_move(&mut self, mv: &CarromMove) -> CarromEffects {
        let player = self.current_player;
        let own = color_of(player);
        let queen_before = self.queen;

        self.table = self.strike_table(mv);
        let pocketed = self.table.advance(self.max_ticks);
        let ticks = self.table.ticks();
        self.table.striker = None;

        let own_count = pocketed.iter().filter(|e| e.kind == own).count();
        let foul = if pocketed.iter().any(|e| e.kind == Kind::Striker) {
            Some(Foul::StrikerPocketed)
        } else if pocketed.iter().any(|e| e.kind == color_of(-player)) {
            Some(Foul::WrongColor)
        } else {
            None
        };
        let queen_now = pocketed.iter().any(|e| e.kind == Kind::Queen);

        let mut respotted = Vec::new();
        self.queen = match (queen_now, queen_before) {
            (true, _) if foul.is_none() && own_count > 0 => QueenStatus::Covered(player),
            (true, _) if foul.is_none() => QueenStatus::Pending(player),
            (false, QueenStatus::Pending(p)) if p == player && foul.is_none() && own_count > 0 => {
                QueenStatus::Covered(player)
            }
            (true, _) | (false, QueenStatus::Pending(_)) => {
                self.respot_kind(Kind::Queen);
                respotted.push(Kind::Queen);
                QueenStatus::OnBoard
            }
            (false, status) => status,
        };

        if foul.is_some() && self.respot_kind(own) {
            respotted.push(own);
        }

        let cover_shot = self.queen == QueenStatus::Pending(player);
        let turn_continues = foul.is_none() && (own_count > 0 || cover_shot) && !self.is_terminal();
        if !turn_continues {
            self.current_player = -player;
        }
        debug!(?mv, pocketed = pocketed.len(), ?foul, ticks, "carrom strike");

        CarromEffects {
            player,
            strike: *mv,
            pocketed,
            foul,
            respotted,
            queen: self.queen,
            turn_continues,
            ticks,
        }
    }

    fn outcome(&self) -> Outcome {
        if self.table.remaining(Kind::White) == 0 {
            Outcome::Win(1)
        } else if self.table.remaining(Kind::Black) == 0 {
            Outcome::Win(-1)
        } else {
            Outcome::InProgress
        }
    }
}

impl NewGame for CarromState {
    type Config = CarromConfig;

    fn new_game(config: &CarromConfig) -> Self {
        Self {
            table: Table::standard(),
            current_player: 1,
            queen: QueenStatus::OnBoard,
            max_ticks: config.max_ticks,
        }
    }
}

impl AiPlayer for CarromState {
    /// Simulates every candidate strike on a copy of the table and keeps the one
    /// that pockets the most for the least risk.
    fn ai_move(&self, _rng: &mut GameRng) -> Option<CarromMove> {
        let player = self.current_player;
        pick_best(&self.get_possible_moves(), |mv| {
            let mut sim = self.clone();
            let fx = sim.apply_move(mv);
            let own = fx.pocketed.iter().filter(|e| e.kind == color_of(player)).count() as i64;
            let mut score = own * 100;
            if fx.foul.is_some() {
                score -= 200;
            }
            match (fx.queen, self.queen) {
                (QueenStatus::Covered(p), QueenStatus::OnBoard | QueenStatus::Pending(_)) if p == player => score += 150,
                (QueenStatus::Pending(p), _) if p == player => score += 30,
                _ => {}
            }
            score - sim.closest_to_pocket(color_of(player)) as i64 / 10
        })
    }
}

impl CarromState {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn queen(&self) -> QueenStatus {
        self.queen
    }

    /// Points as (player 1, player -1): one per own man pocketed, three for a covered queen.
    pub fn scores(&self) -> (u32, u32) {
        let points = |p: Player| {
            let men = 9 - self.table.remaining(color_of(p)) as u32;
            let queen = if self.queen == QueenStatus::Covered(p) { 3 } else { 0 };
            men + queen
        };
        (points(1), points(-1))
    }

    /// The table with the striker placed and moving for `mv`, before any tick.
    /// Front-ends animate this with a [`PhysicsLoop`] and then commit the move.
    pub fn strike_table(&self, mv: &CarromMove) -> Table {
        let mut table = self.table.clone();
        table.place_striker(mv.x as f64, baseline_y(self.current_player), mv.angle(), mv.power());
        table
    }

    fn respot_kind(&mut self, kind: Kind) -> bool {
        match self.table.men.iter().position(|m| m.pocketed && m.kind == kind) {
            Some(i) => {
                self.table.respot(i);
                true
            }
            None => false,
        }
    }

    fn closest_to_pocket(&self, kind: Kind) -> f64 {
        self.table
            .men
            .iter()
            .filter(|m| !m.pocketed && m.kind == kind)
            .flat_map(|m| POCKETS.iter().map(move |&(px, py)| m.distance_to(px, py)))
            .fold(BOARD_SIZE, f64::min)
    }
}

impl fmt::Display for CarromState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const CELLS: usize = 24;
        let cell = BOARD_SIZE / CELLS as f64;
        let mut grid = vec![vec!['.'; CELLS]; CELLS];
        for (px, py) in POCKETS {
            grid[(py / cell) as usize][(px / cell) as usize] = 'O';
        }
        for man in self.table.men.iter().filter(|m| !m.pocketed) {
            let r = ((man.y / cell) as usize).min(CELLS - 1);
            let c = ((man.x / cell) as usize).min(CELLS - 1);
            grid[r][c] = match man.kind {
                Kind::White => 'w',
                Kind::Black => 'b',
                _ => 'Q',
            };
        }
        for row in grid {
            writeln!(f, "{}", row.into_iter().collect::<String>())?;
        }
        let (one, two) = self.scores();
        writeln!(f, "White {} - Black {}  queen: {:?}", one, two, self.queen)
    }
}

impl FromStr for CarromMove {
    type Err = String;

    /// Parses "x angle_degrees power" with power between 0.1 and 25.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 3 {
            return Err("Expected format: x angle_degrees power".to_string());
        }
        let x = parts[0].parse::<i32>().map_err(|e| e.to_string())?;
        let degrees = parts[1].parse::<f64>().map_err(|e| e.to_string())?;
        let power = parts[2].parse::<f64>().map_err(|e| e.to_string())?;
        if !(0.0..=MAX_POWER).contains(&power) {
            return Err(format!("power must be between 0.1 and {}", MAX_POWER));
        }
        let radians = (degrees.to_radians() + std::f64::consts::PI).rem_euclid(std::f64::consts::TAU) - std::f64::consts::PI;
        Ok(CarromMove {
            x,
            angle_mrad: (radians * 1000.0).round() as i32,
            power_tenths: (power * 10.0).round() as u32,
        })
    }
}

impl fmt::Display for CarromMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.1} {:.1}", self.x, self.angle().to_degrees(), self.power())
    }
}
