//! Per-system execution timings for the scheduler

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Timing record for one named system.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemTiming {
    /// Duration of the most recent run.
    pub last: Duration,
    /// Accumulated duration since the last reset.
    pub total: Duration,
    /// Number of runs since the last reset.
    pub calls: u64,
}

#[derive(Debug, Default)]
pub struct SystemProfiler {
    timings: HashMap<String, SystemTiming>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
        }
    }

    pub fn time_system<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let timing = self.timings.entry(name.to_string()).or_default();
        timing.last = elapsed;
        timing.total += elapsed;
        timing.calls += 1;
        result
    }

    pub fn timing(&self, name: &str) -> Option<SystemTiming> {
        self.timings.get(name).copied()
    }

    pub fn last_duration(&self, name: &str) -> Duration {
        self.timings
            .get(name)
            .map(|timing| timing.last)
            .unwrap_or(Duration::ZERO)
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    /// All timings, sorted by name for stable output.
    pub fn snapshot(&self) -> Vec<(String, SystemTiming)> {
        let mut out: Vec<_> = self
            .timings
            .iter()
            .map(|(name, timing)| (name.clone(), *timing))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_calls_per_name() {
        let mut profiler = SystemProfiler::new();
        profiler.time_system("physics", || ());
        profiler.time_system("physics", || ());
        profiler.time_system("render", || ());

        assert_eq!(profiler.timing("physics").map(|t| t.calls), Some(2));
        assert_eq!(profiler.timing("render").map(|t| t.calls), Some(1));
        assert!(profiler.timing("missing").is_none());

        let names: Vec<_> = profiler.snapshot().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["physics".to_string(), "render".to_string()]);
    }
}
