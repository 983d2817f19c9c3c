use std::time::Duration;

/// Counters and phase timings of the last physics tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicsStats {
    /// Enabled colliders pushed into the grid.
    pub colliders: usize,
    /// Pairs reported by the broad phase, duplicates included.
    pub candidate_pairs: usize,
    pub unique_pairs: usize,
    /// Pairs that passed the enabled/layer filters and got an exact test.
    pub narrow_tests: usize,
    pub overlaps: usize,
    /// Overlapping pairs where neither side is a trigger.
    pub solid_contacts: usize,
    pub trigger_enters: usize,
    pub trigger_exits: usize,
    pub broad_phase: Duration,
    pub narrow_phase: Duration,
    pub exit_phase: Duration,
}

impl PhysicsStats {
    pub fn trigger_events(&self) -> usize {
        self.trigger_enters + self.trigger_exits
    }

    pub fn total_time(&self) -> Duration {
        self.broad_phase + self.narrow_phase + self.exit_phase
    }
}
