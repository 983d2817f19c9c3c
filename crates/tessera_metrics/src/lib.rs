//! Tessera Metrics - instrumentation for the simulation and presentation loops
//!
//! Collects tick/present timings and per-system execution times. Everything
//! here compiles down to empty stubs unless the `metrics` feature is enabled,
//! so production builds pay nothing for the calls left in engine code.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use tessera_metrics::FrameTimer;
//!
//! let mut timer = FrameTimer::with_budget(120, tick_budget); // Rolling window of 120 ticks
//! timer.begin();
//! world.update(dt);
//! timer.end();
//! tracing::debug!(tick_ms = timer.work_ms(), overruns = timer.overruns(), "tick");
//! ```

#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::{SystemProfiler, SystemTiming};

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled in the calling crate
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a block under `name` and yield its value (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_scope {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        let __scope_result = $profiler.time_system($name, || $body);
        #[cfg(not(feature = "metrics"))]
        let __scope_result = {
            let _ = &$profiler;
            $body
        };
        __scope_result
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_window: usize) -> Self { Self }
    pub fn with_budget(_window: usize, _budget: std::time::Duration) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn frames(&self) -> u64 { 0 }
    pub fn overruns(&self) -> u64 { 0 }
    pub fn work_ms(&self) -> f64 { 0.0 }
    pub fn work_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
    pub fn rate_hz(&self) -> f64 { 0.0 }
    pub fn budget_usage(&self) -> Option<f64> { None }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug)]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemTiming {
    pub last: std::time::Duration,
    pub total: std::time::Duration,
    pub calls: u64,
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct SystemProfiler;

#[cfg(not(feature = "metrics"))]
impl SystemProfiler {
    pub fn new() -> Self { Self }
    pub fn time_system<F, R>(&mut self, _name: &str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn timing(&self, _name: &str) -> Option<SystemTiming> { None }
    pub fn last_duration(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn reset(&mut self) {}
    pub fn snapshot(&self) -> Vec<(String, SystemTiming)> { Vec::new() }
}
