//! Frame driver for animating a strike.
//!
//! A front-end owns an `Arc<PhysicsLoop>` and calls [`PhysicsLoop::step`] from its
//! frame callback. Only one step runs at a time: a call that arrives while another
//! is still in flight returns [`StepOutcome::Busy`] without touching the table.

use super::physics::{PocketEvent, Table};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Bodies are still moving; carries what was pocketed during this frame.
    Moving(Vec<PocketEvent>),
    /// Everything is at rest. The shot is over.
    AtRest,
    /// Another step is in flight.
    Busy,
    Cancelled,
}

pub struct PhysicsLoop {
    table: Mutex<Table>,
    in_flight: AtomicBool,
    cancelled: AtomicBool,
}

/// Clears the in-flight flag when the step finishes, even on early return.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PhysicsLoop {
    pub fn new(table: Table) -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(table),
            in_flight: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        })
    }

    /// Runs one fixed timestep.
    pub fn step(&self) -> StepOutcome {
        if self.cancelled.load(Ordering::Acquire) {
            return StepOutcome::Cancelled;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return StepOutcome::Busy;
        }
        let _guard = InFlight(&self.in_flight);

        let mut table = self.table.lock();
        if table.is_at_rest() {
            return StepOutcome::AtRest;
        }
        StepOutcome::Moving(table.step())
    }

    /// Drives the loop until rest, cancellation or `max_ticks`, collecting pocket events.
    pub fn run(&self, max_ticks: u32) -> Vec<PocketEvent> {
        let mut events = Vec::new();
        for _ in 0..max_ticks {
            match self.step() {
                StepOutcome::Moving(e) => events.extend(e),
                StepOutcome::Busy => std::thread::yield_now(),
                StepOutcome::AtRest | StepOutcome::Cancelled => break,
            }
        }
        debug!(events = events.len(), ticks = self.table.lock().ticks(), "physics loop stopped");
        events
    }

    /// Stops the loop; every later step returns [`StepOutcome::Cancelled`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Copy of the table for rendering the current frame.
    pub fn snapshot(&self) -> Table {
        self.table.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::carrom::physics::MAX_TICKS;

    fn moving_table() -> Table {
        let mut t = Table::standard();
        t.place_striker(240.0, 440.0, -std::f64::consts::FRAC_PI_2, 20.0);
        t
    }

    #[test]
    fn steps_until_rest() {
        let driver = PhysicsLoop::new(moving_table());
        assert!(matches!(driver.step(), StepOutcome::Moving(_)));
        driver.run(MAX_TICKS);
        assert_eq!(driver.step(), StepOutcome::AtRest);
        assert!(driver.snapshot().is_at_rest());
    }

    #[test]
    fn matches_direct_simulation() {
        let mut direct = moving_table();
        let expected = direct.advance(MAX_TICKS);
        let driver = PhysicsLoop::new(moving_table());
        assert_eq!(driver.run(MAX_TICKS), expected);
        assert_eq!(driver.snapshot(), direct);
    }

    #[test]
    fn rejects_reentrant_step() {
        let driver = PhysicsLoop::new(moving_table());
        driver.in_flight.store(true, Ordering::Release);
        assert_eq!(driver.step(), StepOutcome::Busy);
        driver.in_flight.store(false, Ordering::Release);
        assert!(matches!(driver.step(), StepOutcome::Moving(_)));
    }

    #[test]
    fn cancel_stops_stepping() {
        let driver = PhysicsLoop::new(moving_table());
        let shared = Arc::clone(&driver);
        std::thread::spawn(move || shared.cancel()).join().unwrap();
        assert!(driver.is_cancelled());
        assert_eq!(driver.step(), StepOutcome::Cancelled);
        assert_eq!(driver.snapshot().ticks(), 0);
    }
}
