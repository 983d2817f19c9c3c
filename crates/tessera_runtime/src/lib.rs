//! Tessera Runtime
//!
//! Runs a [`World`](tessera_core::World) on a dedicated simulation thread and
//! hands finished frames to a presentation loop through a double-buffered
//! queue. The two loops tick at independent fixed rates and only ever share
//! immutable [`FrameData`](tessera_core::FrameData) snapshots and the input
//! latch.

pub mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{FrameQueue, FrameStats, InputLatch, Pipeline, PresentControl};
