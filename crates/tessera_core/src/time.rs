//! Fixed-rate time keeping
//!
//! The simulation and presentation loops each run at their own fixed target
//! rate; `FixedTimestep` decides when the next step is due and `SimulationTime`
//! accumulates what the World has simulated so far.

use std::time::{Duration, Instant};

/// Default simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION: Duration = Duration::from_micros(16_666); // ~16.666ms

/// A loop that falls this many steps behind stops trying to catch up and
/// re-anchors on the current instant.
const MAX_STEPS_BEHIND: u32 = 5;

/// Simulation time tracker advanced once per World update.
#[derive(Debug, Clone, Default)]
pub struct SimulationTime {
    tick_count: u64,
    elapsed: Duration,
    last_delta: f32,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn advance(&mut self, dt: f32) {
        self.tick_count += 1;
        self.last_delta = dt;
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += Duration::from_secs_f32(dt);
        }
    }

    pub fn total_time(&self) -> Duration {
        self.elapsed
    }

    /// Delta passed to the most recent update, in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.last_delta
    }
}

/// Deadline scheduler for a loop running at a fixed rate.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    next_due: Instant,
}

impl FixedTimestep {
    pub fn from_hz(hz: u32) -> Self {
        let step = if hz == 0 {
            TICK_DURATION
        } else {
            Duration::from_secs_f64(1.0 / f64::from(hz))
        };
        Self {
            step,
            next_due: Instant::now(),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn delta_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Time left until the next step is due, `None` if it is due now.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due.checked_duration_since(now).filter(|d| !d.is_zero())
    }

    /// Consume the due step and schedule the next one.
    pub fn advance(&mut self, now: Instant) {
        self.next_due += self.step;
        if now.saturating_duration_since(self.next_due) > self.step * MAX_STEPS_BEHIND {
            self.next_due = now + self.step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_time_accumulates() {
        let mut time = SimulationTime::new();
        time.advance(0.5);
        time.advance(0.25);
        assert_eq!(time.tick_count(), 2);
        assert_eq!(time.delta_seconds(), 0.25);
        assert!((time.total_time().as_secs_f32() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn first_step_is_due_immediately() {
        let timestep = FixedTimestep::from_hz(60);
        assert!(timestep.remaining(Instant::now()).is_none());
    }

    #[test]
    fn advance_schedules_next_step() {
        let mut timestep = FixedTimestep::from_hz(10);
        let now = Instant::now();
        timestep.advance(now);
        let remaining = timestep.remaining(now).expect("next step pending");
        assert!(remaining <= Duration::from_millis(100));
    }

    #[test]
    fn zero_rate_falls_back_to_default_tick() {
        assert_eq!(FixedTimestep::from_hz(0).step(), TICK_DURATION);
    }
}
