//! Double-buffered frame handoff between the simulation and presentation
//! threads.

use parking_lot::Mutex;
use std::sync::Arc;
use tessera_core::FrameData;
use tracing::trace;

/// Counters describing traffic through a [`FrameQueue`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames pushed by the simulation side.
    pub frames_produced: u64,
    /// Pulls that returned a frame the consumer had not seen yet.
    pub frames_consumed: u64,
    /// Pulls that found nothing new and repeated the last frame instead.
    pub anti_flicker_activations: u64,
    /// Pulls made before any frame existed.
    pub empty_pulls: u64,
}

#[derive(Debug, Default)]
struct Slots {
    current: Option<Arc<FrameData>>,
    previous: Option<Arc<FrameData>>,
    /// `current` has not been handed to the consumer yet.
    fresh: bool,
    stats: FrameStats,
}

/// Holds the newest frame and the one before it.
///
/// The lock is only held long enough to swap `Arc`s, so neither side can
/// stall the other. Once a frame has been pushed, [`pull`](Self::pull) never
/// returns `None` again: a pull with nothing new repeats the most recent
/// frame so the consumer keeps drawing it.
#[derive(Debug, Default)]
pub struct FrameQueue {
    slots: Mutex<Slots>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `frame` as current; the old current becomes previous.
    pub fn push(&self, frame: Arc<FrameData>) {
        let mut slots = self.slots.lock();
        slots.previous = slots.current.replace(frame);
        slots.fresh = true;
        slots.stats.frames_produced += 1;
    }

    /// Newest complete frame, or the last one handed out if nothing new has
    /// arrived since the previous pull.
    pub fn pull(&self) -> Option<Arc<FrameData>> {
        let mut slots = self.slots.lock();
        let Some(current) = slots.current.clone() else {
            slots.stats.empty_pulls += 1;
            return None;
        };

        if slots.fresh {
            slots.fresh = false;
            slots.stats.frames_consumed += 1;
        } else {
            slots.stats.anti_flicker_activations += 1;
            trace!(frame = current.frame, "no new frame, repeating last");
        }
        Some(current)
    }

    /// `(previous, current)`, for consumers that interpolate between the two
    /// most recent simulation states. Does not count as a pull.
    pub fn latest_pair(&self) -> (Option<Arc<FrameData>>, Option<Arc<FrameData>>) {
        let slots = self.slots.lock();
        (slots.previous.clone(), slots.current.clone())
    }

    /// Whether a frame has arrived that no pull has returned yet.
    pub fn has_fresh_frame(&self) -> bool {
        self.slots.lock().fresh
    }

    pub fn stats(&self) -> FrameStats {
        self.slots.lock().stats
    }
}
