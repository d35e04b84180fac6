//! Queued forest edits
//!
//! Input handlers run at a different cadence from the fire tick, so edits are
//! queued as [`ForestAction`]s and drained by the scheduler before its next
//! step. Every drained action lands in a bounded history together with its
//! outcome; a failed edit is recorded, never fatal.

use crate::core_types::Vec3;
use crate::error::ForestError;
use crate::grid::ForestGrid;
use std::collections::VecDeque;
use tracing::debug;

/// A host command against the forest
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForestAction {
    /// Plant a tree at a world position
    AddTree(Vec3),
    /// Remove the tree at a world position
    RemoveTree(Vec3),
    /// Set a growing tree on fire
    Ignite(Vec3),
    /// Put out fire around a world position
    Extinguish(Vec3),
    /// Start one fire per active chunk
    AddRandomFire,
    /// Wind speed, non-negative
    SetWindSpeed(f32),
    /// Wind direction in radians
    SetWindDirection(f32),
    /// Regenerate every chunk from fresh noise
    Generate,
    /// Return every chunk to dormant
    Clear,
}

impl ForestAction {
    /// Apply the action to a grid.
    ///
    /// # Errors
    /// Propagates the grid's error for the underlying command.
    pub fn apply(&self, grid: &mut ForestGrid) -> Result<(), ForestError> {
        match *self {
            ForestAction::AddTree(pos) => grid.add_tree_at(&pos),
            ForestAction::RemoveTree(pos) => grid.remove_tree_at(&pos),
            ForestAction::Ignite(pos) => grid.ignite_at(&pos),
            ForestAction::Extinguish(pos) => grid.extinguish_at(&pos),
            ForestAction::AddRandomFire => {
                grid.add_random_fire();
                Ok(())
            }
            ForestAction::SetWindSpeed(speed) => grid.set_wind_speed(speed),
            ForestAction::SetWindDirection(radians) => grid.set_wind_direction(radians),
            ForestAction::Generate => {
                grid.generate();
                Ok(())
            }
            ForestAction::Clear => {
                grid.clear();
                Ok(())
            }
        }
    }
}

/// An action that has been drained, with its outcome
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedAction {
    pub action: ForestAction,
    /// Tick count of the grid when the action was applied
    pub tick: u64,
    pub error: Option<ForestError>,
}

impl AppliedAction {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Pending actions plus a bounded history of applied ones
#[derive(Debug, Clone)]
pub struct ActionQueue {
    pending: Vec<ForestAction>,
    history: VecDeque<AppliedAction>,
    /// Oldest entries are dropped past this length
    max_history: usize,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl ActionQueue {
    pub fn new(max_history: usize) -> Self {
        Self {
            pending: Vec::with_capacity(16),
            history: VecDeque::with_capacity(max_history.min(1024)),
            max_history,
        }
    }

    /// Queue an action for the next drain
    pub fn submit(&mut self, action: ForestAction) {
        self.pending.push(action);
    }

    pub fn pending(&self) -> &[ForestAction] {
        &self.pending
    }

    /// Applied actions, oldest first
    pub fn history(&self) -> impl Iterator<Item = &AppliedAction> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Apply every pending action in submission order. Returns how many were
    /// drained.
    pub fn drain_into(&mut self, grid: &mut ForestGrid) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let drained = pending.len();
        for action in pending {
            let error = action.apply(grid).err();
            if let Some(e) = &error {
                debug!("Action {:?} failed: {}", action, e);
            }
            self.record(AppliedAction {
                action,
                tick: grid.tick_count(),
                error,
            });
        }
        drained
    }

    fn record(&mut self, applied: AppliedAction) {
        if self.max_history == 0 {
            return;
        }
        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(applied);
    }

    /// Drop pending actions and history
    pub fn clear(&mut self) {
        self.pending.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Cell;
    use crate::grid::ForestConfig;

    fn grid() -> ForestGrid {
        let config = ForestConfig {
            chunk_size: 4,
            seed: Some(3),
            ..Default::default()
        };
        let mut grid = ForestGrid::new(2, 1, config).unwrap();
        grid.generate();
        grid
    }

    #[test]
    fn test_drain_applies_in_order() {
        let mut grid = grid();
        let mut queue = ActionQueue::new(16);
        let pos = Vec3::new(1.0, 1.0, 0.0);

        queue.submit(ForestAction::RemoveTree(pos));
        queue.submit(ForestAction::AddTree(pos));
        queue.submit(ForestAction::Ignite(pos));
        assert_eq!(queue.pending().len(), 3);

        assert_eq!(queue.drain_into(&mut grid), 3);
        assert!(queue.pending().is_empty());
        assert_eq!(grid.cell_at(&pos).unwrap(), Cell::FIRE);
        assert!(queue.history().all(AppliedAction::succeeded));
    }

    #[test]
    fn test_failed_action_is_recorded() {
        let mut grid = grid();
        let mut queue = ActionQueue::default();

        queue.submit(ForestAction::Ignite(Vec3::new(-1.0, 0.0, 0.0)));
        queue.submit(ForestAction::SetWindSpeed(-2.0));
        queue.submit(ForestAction::SetWindSpeed(3.0));
        queue.drain_into(&mut grid);

        let outcomes: Vec<bool> = queue.history().map(AppliedAction::succeeded).collect();
        assert_eq!(outcomes, vec![false, false, true]);
        assert!(matches!(
            queue.history().next().and_then(|a| a.error.clone()),
            Some(ForestError::CoordinateOutOfRange { .. })
        ));
        assert_eq!(grid.wind().speed(), 3.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut grid = grid();
        let mut queue = ActionQueue::new(5);

        for i in 0..7 {
            queue.submit(ForestAction::SetWindDirection(i as f32));
        }
        queue.drain_into(&mut grid);

        assert_eq!(queue.history_len(), 5);
        assert_eq!(
            queue.history().next().map(|a| a.action),
            Some(ForestAction::SetWindDirection(2.0))
        );
    }

    #[test]
    fn test_clear_and_generate_actions() {
        let mut grid = grid();
        let mut queue = ActionQueue::new(8);

        queue.submit(ForestAction::Clear);
        queue.drain_into(&mut grid);
        assert_eq!(grid.stats().active_chunks, 0);

        queue.submit(ForestAction::Generate);
        queue.submit(ForestAction::AddRandomFire);
        queue.drain_into(&mut grid);
        assert_eq!(grid.stats().active_chunks, 2);

        queue.clear();
        assert_eq!(queue.history_len(), 0);
    }
}
