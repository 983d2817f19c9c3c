//! Loop timing: work per iteration, achieved rate and budget overruns.
//!
//! `begin`/`end` bracket the work of one tick or present. The gap between
//! consecutive `begin` calls gives the wall-clock rate the loop actually
//! achieved, which differs from the work time whenever the loop sleeps.

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: usize = 120;

#[derive(Debug)]
pub struct FrameTimer {
    started: Option<Instant>,
    last_begin: Option<Instant>,
    work: RingBuffer<Duration>,
    intervals: RingBuffer<Duration>,
    budget: Option<Duration>,
    overruns: u64,
    frames: u64,
}

impl FrameTimer {
    /// Timer averaging over the last `window` iterations, no budget.
    pub fn new(window: usize) -> Self {
        Self {
            started: None,
            last_begin: None,
            work: RingBuffer::new(window),
            intervals: RingBuffer::new(window),
            budget: None,
            overruns: 0,
            frames: 0,
        }
    }

    /// Timer that counts iterations whose work exceeds `budget`.
    pub fn with_budget(window: usize, budget: Duration) -> Self {
        Self {
            budget: Some(budget),
            ..Self::new(window)
        }
    }

    pub fn begin(&mut self) {
        let now = Instant::now();
        if let Some(previous) = self.last_begin.replace(now) {
            self.intervals.push(now - previous);
        }
        self.started = Some(now);
    }

    /// Close the current iteration and return its work time. Without a
    /// matching `begin` nothing is recorded and zero is returned.
    pub fn end(&mut self) -> Duration {
        let Some(started) = self.started.take() else {
            return Duration::ZERO;
        };
        let work = started.elapsed();
        self.record(work);
        work
    }

    fn record(&mut self, work: Duration) {
        self.work.push(work);
        self.frames += 1;
        if self.budget.is_some_and(|budget| work > budget) {
            self.overruns += 1;
        }
    }

    /// Completed iterations since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Iterations whose work went over the budget.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn work_ms(&self) -> f64 {
        self.work.average().as_secs_f64() * 1000.0
    }

    pub fn work_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.work.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }

    /// Iterations per second measured begin-to-begin. Zero until two
    /// iterations have started.
    pub fn rate_hz(&self) -> f64 {
        let interval = self.intervals.average().as_secs_f64();
        if interval > 0.0 {
            1.0 / interval
        } else {
            0.0
        }
    }

    /// Average work as a fraction of the budget; `None` without a budget.
    pub fn budget_usage(&self) -> Option<f64> {
        let budget = self.budget?.as_secs_f64();
        (budget > 0.0).then(|| self.work.average().as_secs_f64() / budget)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
