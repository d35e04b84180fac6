//! Fixed-interval driver for the forest grid
//!
//! `ForestSimulation` sits between a host's frame loop and the grid: it
//! drains queued actions every frame, and while running converts elapsed wall
//! time into whole ticks of `tick_interval` seconds.

pub mod action_queue;

pub use action_queue::{ActionQueue, AppliedAction, ForestAction};

use crate::error::ForestError;
use crate::grid::{ForestConfig, ForestGrid};
use tracing::{info, warn};

/// Most ticks a single `update` will run; older backlog is dropped
pub const MAX_CATCH_UP_STEPS: usize = 8;

/// Grid plus action queue plus play/pause clock
#[derive(Debug, Clone)]
pub struct ForestSimulation {
    grid: ForestGrid,
    actions: ActionQueue,
    running: bool,
    tick_interval: f32,
    /// Wall time not yet converted into ticks
    accumulator: f32,
}

impl ForestSimulation {
    /// Wrap an existing grid. Starts paused.
    pub fn new(grid: ForestGrid) -> Self {
        let tick_interval = grid.config().tick_interval;
        Self {
            grid,
            actions: ActionQueue::default(),
            running: false,
            tick_interval,
            accumulator: 0.0,
        }
    }

    /// Build a grid of `width × height` chunks and wrap it.
    ///
    /// # Errors
    /// See [`ForestGrid::new`].
    pub fn with_config(width: usize, height: usize, config: ForestConfig) -> Result<Self, ForestError> {
        ForestGrid::new(width, height, config).map(Self::new)
    }

    pub fn grid(&self) -> &ForestGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut ForestGrid {
        &mut self.grid
    }

    pub fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    /// Queue an action; it is applied on the next `update` or `step`.
    pub fn submit(&mut self, action: ForestAction) {
        self.actions.submit(action);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        if running != self.running {
            info!("Simulation {}", if running { "resumed" } else { "paused" });
        }
        self.running = running;
        if !running {
            self.accumulator = 0.0;
        }
    }

    /// Flip play/pause; returns the new state.
    pub fn toggle_running(&mut self) -> bool {
        self.set_running(!self.running);
        self.running
    }

    pub fn tick_interval(&self) -> f32 {
        self.tick_interval
    }

    /// # Errors
    /// Returns [`ForestError::InvalidParameter`] unless the interval is finite
    /// and positive.
    pub fn set_tick_interval(&mut self, seconds: f32) -> Result<(), ForestError> {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(ForestError::invalid_parameter(
                "tick_interval",
                format!("must be finite and positive, got {seconds}"),
            ));
        }
        self.tick_interval = seconds;
        Ok(())
    }

    /// Drain queued actions and run one tick, running or not.
    pub fn step(&mut self) {
        self.actions.drain_into(&mut self.grid);
        self.grid.step();
    }

    /// Advance by `dt` seconds of wall time. Returns the number of ticks run.
    pub fn update(&mut self, dt: f32) -> usize {
        self.actions.drain_into(&mut self.grid);
        if !self.running || !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        self.accumulator += dt;
        let due = (self.accumulator / self.tick_interval).floor() as usize;
        let steps = due.min(MAX_CATCH_UP_STEPS);
        if due > steps {
            warn!(
                "Simulation fell behind by {} ticks, dropping backlog",
                due - steps
            );
            self.accumulator %= self.tick_interval;
        } else {
            self.accumulator -= steps as f32 * self.tick_interval;
        }

        for _ in 0..steps {
            self.grid.step();
        }
        steps
    }
}
