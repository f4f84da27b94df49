//! # Battleship Game Implementation
//!
//! ## Phases
//! 1. **Placement**: player 1 then player -1 place the classic five-ship fleet on
//!    their own 10x10 grid, ship by ship or all at once at random
//! 2. **Battle**: players fire at the opponent's grid. A hit lets the shooter fire
//!    again. A ship sinks once every cell is hit; sinking the whole fleet wins.
//!
//! ## AI
//! Hunt/target: fire at random until something is hit, then probe the four
//! neighbours of the hit. A second hit in line locks the direction and the AI
//! walks both ends of the line until the ship sinks or both ends miss.

use super::{offset, DIRECTIONS_4};
use crate::{AiPlayer, Coord, GameRng, GameState, MoveError, NewGame, Outcome, Player};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

pub const GRID: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    pub const FLEET: [ShipKind; 5] = [
        ShipKind::Carrier,
        ShipKind::Battleship,
        ShipKind::Cruiser,
        ShipKind::Submarine,
        ShipKind::Destroyer,
    ];

    pub fn size(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser | ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BattleshipMove {
    /// Place the next unplaced ship with its bow at (row, col)
    Place { row: usize, col: usize, horizontal: bool },
    /// Place every remaining ship at random
    RandomFleet,
    Fire(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Placement,
    Battle,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shot {
    Miss,
    Hit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub kind: ShipKind,
    pub cells: Vec<Coord>,
    pub hits: usize,
}

impl Ship {
    pub fn is_sunk(&self) -> bool {
        self.hits >= self.kind.size()
    }
}

/// One player's waters: their ships and the shots received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waters {
    pub ships: Vec<Ship>,
    pub shots: Vec<Vec<Option<Shot>>>,
}

impl Waters {
    fn new() -> Self {
        Self {
            ships: Vec::new(),
            shots: vec![vec![None; GRID]; GRID],
        }
    }

    fn occupied(&self, at: Coord) -> bool {
        self.ships.iter().any(|s| s.cells.contains(&at))
    }

    fn cells_for(&self, kind: ShipKind, (row, col): Coord, horizontal: bool) -> Option<Vec<Coord>> {
        if row >= GRID || col >= GRID {
            return None;
        }
        let cells: Vec<Coord> = (0..kind.size())
            .map(|k| if horizontal { (row, col + k) } else { (row + k, col) })
            .collect();
        let fits = cells.iter().all(|&(r, c)| r < GRID && c < GRID && !self.occupied((r, c)));
        fits.then_some(cells)
    }

    fn next_kind(&self) -> Option<ShipKind> {
        ShipKind::FLEET.get(self.ships.len()).copied()
    }

    fn all_sunk(&self) -> bool {
        self.ships.len() == ShipKind::FLEET.len() && self.ships.iter().all(Ship::is_sunk)
    }
}

/// Per-shooter targeting memory for the hunt/target AI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targeting {
    /// Hits on ships that are not yet sunk
    pub open_hits: Vec<Coord>,
    pub anchor: Option<Coord>,
    pub last_hit: Option<Coord>,
    pub direction: Option<(i32, i32)>,
    pub queue: VecDeque<Coord>,
}

impl Targeting {
    fn record(&mut self, target: Coord, hit: bool, sunk_cells: Option<&[Coord]>, shots: &[Vec<Option<Shot>>]) {
        if hit {
            self.open_hits.push(target);
            self.last_hit = Some(target);
            match (self.anchor, sunk_cells) {
                (_, Some(cells)) => {
                    self.open_hits.retain(|c| !cells.contains(c));
                    self.anchor = self.open_hits.first().copied();
                    self.direction = None;
                }
                (None, None) => self.anchor = Some(target),
                (Some(anchor), None) if self.direction.is_none() => {
                    if anchor.0 == target.0 || anchor.1 == target.1 {
                        let dr = (target.0 as i32 - anchor.0 as i32).signum();
                        let dc = (target.1 as i32 - anchor.1 as i32).signum();
                        self.direction = Some((dr, dc));
                    }
                }
                _ => {}
            }
        }
        self.refresh(shots);
    }

    /// Rebuilds the probe queue from the open hits.
    fn refresh(&mut self, shots: &[Vec<Option<Shot>>]) {
        let unshot = |&(r, c): &Coord| shots[r][c].is_none();
        if self.open_hits.is_empty() {
            self.anchor = None;
            self.direction = None;
            self.queue.clear();
            return;
        }
        if let (Some(anchor), Some((dr, dc))) = (self.anchor, self.direction) {
            let mut ends = VecDeque::new();
            for sign in [1, -1] {
                let step = (dr * sign, dc * sign);
                let mut at = anchor;
                while let Some(next) = offset(at, step, GRID, GRID) {
                    if self.open_hits.contains(&next) {
                        at = next;
                        continue;
                    }
                    if unshot(&next) {
                        ends.push_back(next);
                    }
                    break;
                }
            }
            if !ends.is_empty() {
                self.queue = ends;
                return;
            }
            // Both ends are closed: the hits belong to more than one ship.
            self.direction = None;
        }
        let mut queue = VecDeque::new();
        for &hit in &self.open_hits {
            for &d in DIRECTIONS_4.iter() {
                if let Some(n) = offset(hit, d, GRID, GRID) {
                    if unshot(&n) && !queue.contains(&n) {
                        queue.push_back(n);
                    }
                }
            }
        }
        self.queue = queue;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleshipConfig {
    pub seed: u64,
}

impl Default for BattleshipConfig {
    fn default() -> Self {
        Self { seed: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotReport {
    pub target: Coord,
    pub hit: bool,
    pub sunk: Option<ShipKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleshipEffects {
    pub player: Player,
    /// Ships placed by this move
    pub placed: Vec<Ship>,
    pub shot: Option<ShotReport>,
    /// A hit: the shooter fires again
    pub extra_shot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleshipState {
    /// Index 0 is player 1's waters, index 1 is player -1's
    waters: [Waters; 2],
    targeting: [Targeting; 2],
    current_player: Player,
    phase: Phase,
    rng: GameRng,
}

fn seat(player: Player) -> usize {
    if player == 1 {
        0
    } else {
        1
    }
}

impl GameState for BattleshipState {
    type Move = BattleshipMove;
    type Effects = BattleshipEffects;

    fn get_current_player(&self) -> Player {
        self.current_player
    }

    fn get_possible_moves(&self) -> Vec<BattleshipMove> {
        match self.phase {
            Phase::Placement => {
                let own = &self.waters[seat(self.current_player)];
                let Some(kind) = own.next_kind() else { return Vec::new() };
                let mut moves = vec![BattleshipMove::RandomFleet];
                for row in 0..GRID {
                    for col in 0..GRID {
                        for horizontal in [true, false] {
                            if own.cells_for(kind, (row, col), horizontal).is_some() {
                                moves.push(BattleshipMove::Place { row, col, horizontal });
                            }
                        }
                    }
                }
                moves
            }
            Phase::Battle => {
                let target = &self.waters[seat(-self.current_player)];
                let mut moves = Vec::new();
                for r in 0..GRID {
                    for c in 0..GRID {
                        if target.shots[r][c].is_none() {
                            moves.push(BattleshipMove::Fire(r, c));
                        }
                    }
                }
                moves
            }
            Phase::Finished => Vec::new(),
        }
    }

    fn is_legal(&self, mv: &BattleshipMove) -> bool {
        match (self.phase, *mv) {
            (Phase::Placement, BattleshipMove::RandomFleet) => true,
            (Phase::Placement, BattleshipMove::Place { row, col, horizontal }) => {
                let own = &self.waters[seat(self.current_player)];
                own.next_kind()
                    .and_then(|kind| own.cells_for(kind, (row, col), horizontal))
                    .is_some()
            }
            (Phase::Battle, BattleshipMove::Fire(r, c)) => {
                r < GRID && c < GRID && self.waters[seat(-self.current_player)].shots[r][c].is_none()
            }
            _ => false,
        }
    }

    fn make_move(&mut self, mv: &BattleshipMove) -> Result<BattleshipEffects, MoveError> {
        match (self.phase, *mv) {
            (Phase::Finished, _) => return Err(MoveError::GameOver),
            (Phase::Placement, BattleshipMove::Fire(..)) => return Err(MoveError::WrongPhase("placement")),
            (Phase::Battle, BattleshipMove::Place { .. } | BattleshipMove::RandomFleet) => {
                return Err(MoveError::WrongPhase("battle"))
            }
            (_, BattleshipMove::Fire(r, c) | BattleshipMove::Place { row: r, col: c, .. })
                if r >= GRID || c >= GRID =>
            {
                return Err(MoveError::OutOfBounds {
                    row: r as i64,
                    col: c as i64,
                })
            }
            _ => {}
        }
        if !self.is_legal(mv) {
            return Err(MoveError::IllegalMove(format!("{:?}", mv)));
        }
        Ok(self.apply_move(mv))
    }

    fn apply_move(&mut self, mv: &BattleshipMove) -> BattleshipEffects {
        let player = self.current_player;
        let mut fx = BattleshipEffects {
            player,
            placed: Vec::new(),
            shot: None,
            extra_shot: false,
        };
        match *mv {
            BattleshipMove::Place { row, col, horizontal } => {
                let own = &mut self.waters[seat(player)];
                if let Some(kind) = own.next_kind() {
                    if let Some(cells) = own.cells_for(kind, (row, col), horizontal) {
                        let ship = Ship { kind, cells, hits: 0 };
                        own.ships.push(ship.clone());
                        fx.placed.push(ship);
                    }
                }
                self.end_placement_turn();
            }
            BattleshipMove::RandomFleet => {
                fx.placed = self.place_randomly(player);
                self.end_placement_turn();
            }
            BattleshipMove::Fire(r, c) => {
                let target_seat = seat(-player);
                let waters = &mut self.waters[target_seat];
                let struck = waters.ships.iter().position(|s| s.cells.contains(&(r, c)));
                let mut report = ShotReport {
                    target: (r, c),
                    hit: struck.is_some(),
                    sunk: None,
                };
                waters.shots[r][c] = Some(if struck.is_some() { Shot::Hit } else { Shot::Miss });
                let mut sunk_cells = None;
                if let Some(i) = struck {
                    let ship = &mut waters.ships[i];
                    ship.hits += 1;
                    if ship.is_sunk() {
                        report.sunk = Some(ship.kind);
                        sunk_cells = Some(ship.cells.clone());
                    }
                }
                let shots = &self.waters[target_seat].shots;
                self.targeting[seat(player)].record((r, c), report.hit, sunk_cells.as_deref(), shots);

                if self.waters[target_seat].all_sunk() {
                    self.phase = Phase::Finished;
                } else if report.hit {
                    fx.extra_shot = true;
                } else {
                    self.current_player = -player;
                }
                fx.shot = Some(report);
            }
        }
        fx
    }

    fn outcome(&self) -> Outcome {
        if self.phase != Phase::Finished {
            return Outcome::InProgress;
        }
        if self.waters[1].all_sunk() {
            Outcome::Win(1)
        } else {
            Outcome::Win(-1)
        }
    }
}

impl NewGame for BattleshipState {
    type Config = BattleshipConfig;

    fn new_game(config: &BattleshipConfig) -> Self {
        Self {
            waters: [Waters::new(), Waters::new()],
            targeting: [Targeting::default(), Targeting::default()],
            current_player: 1,
            phase: Phase::Placement,
            rng: GameRng::new(config.seed),
        }
    }
}

impl AiPlayer for BattleshipState {
    fn ai_move(&self, rng: &mut GameRng) -> Option<BattleshipMove> {
        match self.phase {
            Phase::Placement => Some(BattleshipMove::RandomFleet),
            Phase::Battle => {
                let shots = &self.waters[seat(-self.current_player)].shots;
                let memory = &self.targeting[seat(self.current_player)];
                if let Some(&(r, c)) = memory.queue.iter().find(|&&(r, c)| shots[r][c].is_none()) {
                    return Some(BattleshipMove::Fire(r, c));
                }
                let moves = self.get_possible_moves();
                rng.choose(&moves).copied()
            }
            Phase::Finished => None,
        }
    }
}

impl BattleshipState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn waters(&self, player: Player) -> &Waters {
        &self.waters[seat(player)]
    }

    pub fn targeting(&self, player: Player) -> &Targeting {
        &self.targeting[seat(player)]
    }

    fn place_randomly(&mut self, player: Player) -> Vec<Ship> {
        let mut placed = Vec::new();
        while let Some(kind) = self.waters[seat(player)].next_kind() {
            let own = &self.waters[seat(player)];
            let mut options = Vec::new();
            for row in 0..GRID {
                for col in 0..GRID {
                    for horizontal in [true, false] {
                        if let Some(cells) = own.cells_for(kind, (row, col), horizontal) {
                            options.push(cells);
                        }
                    }
                }
            }
            let Some(cells) = self.rng.choose(&options).cloned() else { break };
            let ship = Ship { kind, cells, hits: 0 };
            self.waters[seat(player)].ships.push(ship.clone());
            placed.push(ship);
        }
        placed
    }

    fn end_placement_turn(&mut self) {
        if self.waters[seat(self.current_player)].next_kind().is_some() {
            return;
        }
        if self.current_player == 1 {
            self.current_player = -1;
        } else {
            self.current_player = 1;
            self.phase = Phase::Battle;
        }
    }
}

impl fmt::Display for BattleshipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let own = &self.waters[seat(self.current_player)];
        let enemy = &self.waters[seat(-self.current_player)];
        writeln!(f, "   own fleet              enemy waters")?;
        writeln!(f, "   0 1 2 3 4 5 6 7 8 9    0 1 2 3 4 5 6 7 8 9")?;
        for r in 0..GRID {
            write!(f, "{:>2} ", r)?;
            for c in 0..GRID {
                let symbol = match (own.shots[r][c], own.occupied((r, c))) {
                    (Some(Shot::Hit), _) => "X",
                    (Some(Shot::Miss), _) => "o",
                    (None, true) => "#",
                    (None, false) => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            write!(f, "{:>3} ", r)?;
            for c in 0..GRID {
                let symbol = match enemy.shots[r][c] {
                    Some(Shot::Hit) => "X",
                    Some(Shot::Miss) => "o",
                    None => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for BattleshipMove {
    type Err = String;

    /// `random`, `r,c` to fire, or `r,c,h` / `r,c,v` to place the next ship.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("random") {
            return Ok(BattleshipMove::RandomFleet);
        }
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [r, c] => Ok(BattleshipMove::Fire(
                r.parse().map_err(|_| format!("bad row {}", r))?,
                c.parse().map_err(|_| format!("bad column {}", c))?,
            )),
            [r, c, o] => Ok(BattleshipMove::Place {
                row: r.parse().map_err(|_| format!("bad row {}", r))?,
                col: c.parse().map_err(|_| format!("bad column {}", c))?,
                horizontal: match *o {
                    "h" | "H" => true,
                    "v" | "V" => false,
                    other => return Err(format!("orientation must be h or v, got {}", other)),
                },
            }),
            _ => Err("Expected r,c or r,c,h|v or random".to_string()),
        }
    }
}

impl fmt::Display for BattleshipMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleshipMove::Place { row, col, horizontal } => {
                write!(f, "{},{},{}", row, col, if *horizontal { "h" } else { "v" })
            }
            BattleshipMove::RandomFleet => write!(f, "random"),
            BattleshipMove::Fire(r, c) => write!(f, "{},{}", r, c),
        }
    }
}
