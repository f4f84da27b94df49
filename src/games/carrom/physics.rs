//! Fixed-timestep rigid body simulation of the carrom table.
//!
//! Every tick applies friction, moves each body by its velocity, reflects off
//! the cushions, resolves overlapping pairs and finally checks the pockets.
//! [`Table::is_at_rest`] is a pure predicate, so a scheduler can call
//! [`Table::step`] until it returns true.

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: f64 = 480.0;
pub const STRIKER_RADIUS: f64 = 18.0;
pub const MAN_RADIUS: f64 = 14.0;
pub const POCKET_RADIUS: f64 = 22.0;
/// Velocity multiplier applied every tick
pub const FRICTION: f64 = 0.98;
/// Velocity components below this snap to zero
pub const STOP_SPEED: f64 = 0.1;
pub const WALL_RESTITUTION: f64 = 0.8;
pub const COLLISION_DAMPING: f64 = 0.9;
pub const MAX_POWER: f64 = 25.0;
/// Upper bound on ticks for one shot
pub const MAX_TICKS: u32 = 5_000;

pub const POCKETS: [(f64, f64); 4] = [
    (POCKET_RADIUS, POCKET_RADIUS),
    (BOARD_SIZE - POCKET_RADIUS, POCKET_RADIUS),
    (POCKET_RADIUS, BOARD_SIZE - POCKET_RADIUS),
    (BOARD_SIZE - POCKET_RADIUS, BOARD_SIZE - POCKET_RADIUS),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    White,
    Black,
    Queen,
    Striker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub kind: Kind,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub pocketed: bool,
}

impl Body {
    pub fn new(kind: Kind, x: f64, y: f64) -> Self {
        let radius = if kind == Kind::Striker { STRIKER_RADIUS } else { MAN_RADIUS };
        Self {
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius,
            pocketed: false,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.vx != 0.0 || self.vy != 0.0
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    fn integrate(&mut self) {
        self.vx *= FRICTION;
        self.vy *= FRICTION;
        if self.vx.abs() < STOP_SPEED {
            self.vx = 0.0;
        }
        if self.vy.abs() < STOP_SPEED {
            self.vy = 0.0;
        }
        self.x += self.vx;
        self.y += self.vy;

        if self.x - self.radius < 0.0 {
            self.x = self.radius;
            self.vx = -self.vx * WALL_RESTITUTION;
        } else if self.x + self.radius > BOARD_SIZE {
            self.x = BOARD_SIZE - self.radius;
            self.vx = -self.vx * WALL_RESTITUTION;
        }
        if self.y - self.radius < 0.0 {
            self.y = self.radius;
            self.vy = -self.vy * WALL_RESTITUTION;
        } else if self.y + self.radius > BOARD_SIZE {
            self.y = BOARD_SIZE - self.radius;
            self.vy = -self.vy * WALL_RESTITUTION;
        }
    }
}

/// Which body dropped into a pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyId {
    Striker,
    Man(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocketEvent {
    pub body: BodyId,
    pub kind: Kind,
    pub pocket: usize,
    pub tick: u32,
}

/// Carrom men plus the striker while a shot is in play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub men: Vec<Body>,
    pub striker: Option<Body>,
    ticks: u32,
}

impl Table {
    /// Queen in the centre, an inner ring of six and an outer ring of twelve,
    /// colors alternating.
    pub fn standard() -> Self {
        let center = BOARD_SIZE / 2.0;
        let spacing = MAN_RADIUS * 2.2;
        let mut men = vec![Body::new(Kind::Queen, center, center)];
        for i in 0..6 {
            let angle = i as f64 * std::f64::consts::TAU / 6.0;
            let kind = if i % 2 == 0 { Kind::White } else { Kind::Black };
            men.push(Body::new(kind, center + angle.cos() * spacing, center + angle.sin() * spacing));
        }
        for i in 0..12 {
            let angle = i as f64 * std::f64::consts::TAU / 12.0;
            let kind = if i % 2 == 0 { Kind::Black } else { Kind::White };
            let r = spacing * 1.8;
            men.push(Body::new(kind, center + angle.cos() * r, center + angle.sin() * r));
        }
        Self {
            men,
            striker: None,
            ticks: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            men: Vec::new(),
            striker: None,
            ticks: 0,
        }
    }

    /// Ticks simulated since the striker was last placed.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Puts the striker at `(x, y)` moving with the given angle and power.
    pub fn place_striker(&mut self, x: f64, y: f64, angle: f64, power: f64) {
        let power = power.clamp(0.0, MAX_POWER);
        let mut striker = Body::new(Kind::Striker, x, y);
        striker.vx = angle.cos() * power;
        striker.vy = angle.sin() * power;
        self.striker = Some(striker);
        self.ticks = 0;
    }

    pub fn remaining(&self, kind: Kind) -> usize {
        self.men.iter().filter(|m| m.kind == kind && !m.pocketed).count()
    }

    pub fn is_at_rest(&self) -> bool {
        let striker_moving = self.striker.as_ref().is_some_and(|s| s.is_moving());
        !striker_moving && !self.men.iter().any(|m| !m.pocketed && m.is_moving())
    }

    /// Advances the simulation by one tick and reports bodies that fell in.
    pub fn step(&mut self) -> Vec<PocketEvent> {
        self.ticks += 1;
        if let Some(s) = self.striker.as_mut() {
            s.integrate();
        }
        for man in self.men.iter_mut().filter(|m| !m.pocketed) {
            man.integrate();
        }
        self.resolve_collisions();
        self.check_pockets()
    }

    /// Steps until everything stops or `max_ticks` pass.
    pub fn advance(&mut self, max_ticks: u32) -> Vec<PocketEvent> {
        let mut events = Vec::new();
        for _ in 0..max_ticks {
            if self.is_at_rest() {
                break;
            }
            events.extend(self.step());
        }
        events
    }

    /// Returns a pocketed man to the first free spot at or beside the centre.
    pub fn respot(&mut self, index: usize) {
        let center = BOARD_SIZE / 2.0;
        let mut spot = (center, center);
        for k in 0..BOARD_SIZE as usize {
            let dx = (k as f64 / 2.0).ceil() * 2.0 * MAN_RADIUS * if k % 2 == 0 { 1.0 } else { -1.0 };
            let candidate = (center + dx, center);
            if self.is_free(candidate, MAN_RADIUS, Some(index)) {
                spot = candidate;
                break;
            }
        }
        if let Some(man) = self.men.get_mut(index) {
            man.x = spot.0;
            man.y = spot.1;
            man.vx = 0.0;
            man.vy = 0.0;
            man.pocketed = false;
        }
    }

    /// True if a body of `radius` at `(x, y)` overlaps no man on the board.
    pub fn is_free(&self, (x, y): (f64, f64), radius: f64, ignore: Option<usize>) -> bool {
        self.men
            .iter()
            .enumerate()
            .filter(|(i, m)| !m.pocketed && Some(*i) != ignore)
            .all(|(_, m)| m.distance_to(x, y) >= m.radius + radius)
    }

    fn resolve_collisions(&mut self) {
        let mut active: Vec<&mut Body> = self.striker.iter_mut().collect();
        active.extend(self.men.iter_mut().filter(|m| !m.pocketed));
        for i in 0..active.len() {
            let (head, tail) = active.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                collide(a, b);
            }
        }
    }

    fn check_pockets(&mut self) -> Vec<PocketEvent> {
        let tick = self.ticks;
        let mut events = Vec::new();
        let in_pocket = |b: &Body| POCKETS.iter().position(|&(px, py)| b.distance_to(px, py) < POCKET_RADIUS);
        if let Some(pocket) = self.striker.as_ref().and_then(in_pocket) {
            self.striker = None;
            events.push(PocketEvent {
                body: BodyId::Striker,
                kind: Kind::Striker,
                pocket,
                tick,
            });
        }
        for (i, man) in self.men.iter_mut().enumerate().filter(|(_, m)| !m.pocketed) {
            if let Some(pocket) = in_pocket(man) {
                man.pocketed = true;
                man.vx = 0.0;
                man.vy = 0.0;
                events.push(PocketEvent {
                    body: BodyId::Man(i),
                    kind: man.kind,
                    pocket,
                    tick,
                });
            }
        }
        events
    }
}

/// Separates an overlapping pair and swaps their velocities with damping.
fn collide(a: &mut Body, b: &mut Body) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let distance = (dx * dx + dy * dy).sqrt();
    let min_distance = a.radius + b.radius;
    if distance >= min_distance {
        return;
    }
    let angle = dy.atan2(dx);
    let half = (min_distance - distance) / 2.0;
    a.x -= angle.cos() * half;
    a.y -= angle.sin() * half;
    b.x += angle.cos() * half;
    b.y += angle.sin() * half;

    let (vx, vy) = (a.vx, a.vy);
    a.vx = b.vx * COLLISION_DAMPING;
    a.vy = b.vy * COLLISION_DAMPING;
    b.vx = vx * COLLISION_DAMPING;
    b.vy = vy * COLLISION_DAMPING;
}
