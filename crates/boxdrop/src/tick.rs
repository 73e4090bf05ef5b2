//! Single-threaded tick loop over the demo's two timers.
//!
//! The [`TickLoop`] owns the [`Scheduler`] and the [`Simulation`] context.
//! Each call to [`TickLoop::advance_to`]:
//!
//! 1. Pops every due timer occurrence, oldest first (physics before spawn
//!    when both are due at the same instant).
//! 2. Runs the matching [`Task`] to completion against the simulation.
//! 3. Reports what ran, including whether a repaint was requested.
//!
//! Nothing here reads the wall clock; the caller decides what "now" is. The
//! windowed runner feeds elapsed real time, tests feed exact instants.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use boxdrop::config::DemoConfig;
//! use boxdrop::tick::TickLoop;
//!
//! let config = DemoConfig { seed: Some(1), ..Default::default() };
//! let mut tick_loop = TickLoop::new(config).expect("valid config");
//!
//! let report = tick_loop.advance_to(Duration::from_millis(2000));
//! assert_eq!(report.spawns, 2);
//! assert_eq!(tick_loop.simulation().spawned().len(), 2);
//! ```

use std::time::{Duration, Instant};

use crate::config::{ConfigError, DemoConfig};
use crate::schedule::{Scheduler, TimerId};
use crate::sim::{Simulation, Task};

/// Name of the 60 Hz physics timer.
pub const PHYSICS_TIMER: &str = "physics";

/// Name of the 1 Hz spawn timer.
pub const SPAWN_TIMER: &str = "spawn";

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What happened during one [`TickLoop::advance_to`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Physics steps taken.
    pub physics_steps: u64,
    /// Boxes spawned.
    pub spawns: u64,
    /// At least one task asked for a repaint.
    pub redraw_requested: bool,
}

impl TickReport {
    /// `true` if no task ran.
    pub fn is_idle(&self) -> bool {
        self.physics_steps == 0 && self.spawns == 0
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last [`TickLoop::advance_to`] call.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time spent in physics steps.
    pub physics_time: Duration,
    /// Wall-clock time spent spawning.
    pub spawn_time: Duration,
    /// Total wall-clock time for the call.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Owns the timers and the simulation and drives one from the other.
pub struct TickLoop {
    scheduler: Scheduler<Task>,
    simulation: Simulation,
    physics_timer: TimerId,
    spawn_timer: TimerId,
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Build the simulation from `config` and register both timers.
    ///
    /// # Errors
    ///
    /// Returns the config's validation error, if any.
    pub fn new(config: DemoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let physics_period = config.physics_period();
        let spawn_period = config.spawn_period();
        let simulation = Simulation::new(config)?;

        let mut scheduler = Scheduler::new();
        let physics_timer = scheduler.add_timer(PHYSICS_TIMER, physics_period, Task::PhysicsStep);
        let spawn_timer = scheduler.add_timer(SPAWN_TIMER, spawn_period, Task::Spawn);

        Ok(Self {
            scheduler,
            simulation,
            physics_timer,
            spawn_timer,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Run every task due at or before `now`.
    pub fn advance_to(&mut self, now: Duration) -> TickReport {
        let start = Instant::now();
        let mut report = TickReport::default();
        let mut diagnostics = TickDiagnostics::default();
        let simulation = &mut self.simulation;

        self.scheduler.advance_to(now, |task, _due| {
            let task_start = Instant::now();
            let redraw = simulation.run_task(task);
            let elapsed = task_start.elapsed();
            match task {
                Task::PhysicsStep => {
                    report.physics_steps += 1;
                    diagnostics.physics_time += elapsed;
                }
                Task::Spawn => {
                    report.spawns += 1;
                    diagnostics.spawn_time += elapsed;
                }
            }
            report.redraw_requested |= redraw;
        });

        diagnostics.total_time = start.elapsed();
        self.last_diagnostics = diagnostics;
        report
    }

    /// Advance the clock by `delta` from its current position.
    pub fn run_for(&mut self, delta: Duration) -> TickReport {
        let target = self.scheduler.now() + delta;
        self.advance_to(target)
    }

    /// How far `now` is past the oldest pending occurrence.
    pub fn lag(&self, now: Duration) -> Duration {
        self.scheduler
            .next_due()
            .map(|due| now.saturating_sub(due))
            .unwrap_or_default()
    }

    /// Collapse overdue occurrences if the loop is more than `max_lag`
    /// behind `now`. Returns the number of occurrences dropped.
    pub fn drop_missed_if_lagging(&mut self, now: Duration, max_lag: Duration) -> u64 {
        let lag = self.lag(now);
        if lag <= max_lag {
            return 0;
        }
        let dropped = self.scheduler.drop_missed(now);
        if dropped > 0 {
            tracing::warn!(
                lag_ms = lag.as_millis() as u64,
                dropped,
                "tick loop fell behind; dropping missed timer occurrences"
            );
        }
        dropped
    }

    // -- accessors ----------------------------------------------------------

    /// The loop's clock.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// When the next task is due.
    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// Physics steps taken so far.
    pub fn physics_steps(&self) -> u64 {
        self.scheduler.fired(self.physics_timer)
    }

    /// Spawn ticks run so far.
    pub fn spawn_ticks(&self) -> u64 {
        self.scheduler.fired(self.spawn_timer)
    }

    /// Read-only access to the scheduler.
    pub fn scheduler(&self) -> &Scheduler<Task> {
        &self.scheduler
    }

    /// Read-only access to the simulation.
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Diagnostics from the last [`advance_to`](Self::advance_to).
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
