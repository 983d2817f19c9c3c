//! Two-thread frame pipeline
//!
//! The simulation thread owns the World outright: it ticks at
//! `simulation_hz`, copies the [`InputLatch`] into the World before each
//! tick and pushes the tick's [`FrameData`] into the [`FrameQueue`]. The
//! presentation loop runs on whichever thread calls
//! [`Pipeline::run_presentation`] at `presentation_hz` and only sees
//! snapshots.
//!
//! A shared running flag stops both loops. It is cleared by
//! [`Pipeline::stop`], by the presentation consumer returning
//! [`PresentControl::Stop`], or by the World asking for shutdown.

mod input;
mod queue;

pub use input::InputLatch;
pub use queue::{FrameQueue, FrameStats};

use crate::error::PipelineError;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tessera_core::time::FixedTimestep;
use tessera_core::{FrameData, PipelineConfig, World};
use tessera_metrics::FrameTimer;
use tracing::{info, warn};

/// Longest single sleep in either loop, so a cleared flag is noticed quickly.
const MAX_IDLE_SLICE: Duration = Duration::from_millis(2);

/// Ticks between timing reports.
#[cfg_attr(not(feature = "metrics"), allow(dead_code))]
const TIMING_REPORT_INTERVAL: u64 = 600;

/// Returned by the presentation consumer after each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentControl {
    Continue,
    Stop,
}

/// Clears the running flag when dropped, including while a panic unwinds the
/// simulation thread, so the presentation loop never outlives its producer.
struct StopOnExit(Arc<AtomicBool>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!("simulation thread panicked; stopping pipeline");
        }
        self.0.store(false, Ordering::Release);
    }
}

/// State moved onto the simulation thread.
struct SimulationLoop {
    world: World,
    queue: Arc<FrameQueue>,
    input: InputLatch,
    running: Arc<AtomicBool>,
    tick_rate_hz: u32,
}

impl SimulationLoop {
    /// Runs until the running flag clears. Returns the World so the caller
    /// gets it back through the `JoinHandle`.
    fn run(mut self) -> World {
        let mut timestep = FixedTimestep::from_hz(self.tick_rate_hz);
        let dt = timestep.delta_seconds();
        let mut timer = FrameTimer::with_budget(120, Duration::from_secs_f32(dt));
        let _stop_on_exit = StopOnExit(Arc::clone(&self.running));
        info!(hz = self.tick_rate_hz, "simulation thread started");

        while self.running.load(Ordering::Acquire) {
            if let Some(wait) = timestep.remaining(Instant::now()) {
                thread::sleep(wait.min(MAX_IDLE_SLICE));
                continue;
            }

            timer.begin();
            self.world.set_input(self.input.snapshot());
            self.world.update(dt);
            if let Some(frame) = self.world.take_frame() {
                self.queue.push(frame);
            }
            timer.end();
            timestep.advance(Instant::now());

            tessera_metrics::metrics! {
                if timer.frames() % TIMING_REPORT_INTERVAL == 0 {
                    let (min_ms, max_ms) = timer.work_range_ms();
                    tracing::debug!(
                        tick_ms = timer.work_ms(),
                        min_ms,
                        max_ms,
                        rate_hz = timer.rate_hz(),
                        overruns = timer.overruns(),
                        "simulation timing"
                    );
                }
            }

            if self.world.shutdown_requested() {
                info!("world requested shutdown");
                self.running.store(false, Ordering::Release);
            }
        }

        info!(
            ticks = self.world.time().tick_count(),
            "simulation thread stopped"
        );
        self.world
    }
}

/// A running simulation thread plus the handles needed to present its
/// frames and feed it input.
pub struct Pipeline {
    queue: Arc<FrameQueue>,
    input: InputLatch,
    running: Arc<AtomicBool>,
    presenting: AtomicBool,
    presentation_hz: u32,
    simulation: Option<JoinHandle<World>>,
}

impl Pipeline {
    /// Move `world` onto a new simulation thread and start ticking.
    pub fn start(world: World, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let queue = Arc::new(FrameQueue::new());
        let input = InputLatch::new();
        let running = Arc::new(AtomicBool::new(true));

        let state = SimulationLoop {
            world,
            queue: Arc::clone(&queue),
            input: input.clone(),
            running: Arc::clone(&running),
            tick_rate_hz: config.simulation_hz,
        };
        let simulation = thread::Builder::new()
            .name("tessera-simulation".into())
            .spawn(move || state.run())
            .map_err(PipelineError::ThreadSpawn)?;

        info!(
            simulation_hz = config.simulation_hz,
            presentation_hz = config.presentation_hz,
            "pipeline started"
        );
        Ok(Self {
            queue,
            input,
            running,
            presenting: AtomicBool::new(false),
            presentation_hz: config.presentation_hz,
            simulation: Some(simulation),
        })
    }

    pub fn queue(&self) -> &Arc<FrameQueue> {
        &self.queue
    }

    /// Latch the platform layer writes input into.
    pub fn input(&self) -> &InputLatch {
        &self.input
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.queue.stats()
    }

    /// False once either loop has been asked to stop or the simulation
    /// thread has exited for any reason.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self
                .simulation
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Ask both loops to stop. Does not wait.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Present frames on the calling thread until the pipeline stops or
    /// `consumer` returns [`PresentControl::Stop`]. Returns how many times
    /// the consumer was called.
    ///
    /// The consumer is not called before the first frame exists; after that
    /// it is called every presentation step, with the last frame repeated
    /// when the simulation has not produced a new one.
    pub fn run_presentation<F>(&self, mut consumer: F) -> Result<u64, PipelineError>
    where
        F: FnMut(&FrameData) -> PresentControl,
    {
        if self.presenting.swap(true, Ordering::AcqRel) {
            return Err(PipelineError::AlreadyRunning);
        }

        let mut timestep = FixedTimestep::from_hz(self.presentation_hz);
        let mut timer = FrameTimer::default();
        let mut presented = 0u64;
        info!(hz = self.presentation_hz, "presentation loop started");

        while self.is_running() {
            if let Some(wait) = timestep.remaining(Instant::now()) {
                thread::sleep(wait.min(MAX_IDLE_SLICE));
                continue;
            }

            timer.begin();
            let control = match self.queue.pull() {
                Some(frame) => {
                    presented += 1;
                    consumer(&frame)
                }
                None => PresentControl::Continue,
            };
            timer.end();
            timestep.advance(Instant::now());

            if control == PresentControl::Stop {
                info!("presentation consumer requested stop");
                self.stop();
            }
        }

        let stats = self.queue.stats();
        info!(
            presented,
            rate_hz = timer.rate_hz(),
            frames_produced = stats.frames_produced,
            frames_consumed = stats.frames_consumed,
            anti_flicker = stats.anti_flicker_activations,
            "presentation loop stopped"
        );
        self.presenting.store(false, Ordering::Release);
        Ok(presented)
    }

    /// Stop both loops, join the simulation thread and hand back the World.
    pub fn shutdown(mut self) -> Result<World, PipelineError> {
        self.stop();
        let handle = self
            .simulation
            .take()
            .ok_or_else(|| PipelineError::SimulationPanicked("simulation thread missing".into()))?;
        let world = handle
            .join()
            .map_err(|payload| PipelineError::SimulationPanicked(panic_message(payload.as_ref())))?;
        info!("pipeline shut down");
        Ok(world)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let Some(handle) = self.simulation.take() else {
            return;
        };
        self.stop();
        if let Err(payload) = handle.join() {
            warn!(
                message = %panic_message(payload.as_ref()),
                "simulation thread panicked during teardown"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::math::Vec3;
    use tessera_core::{MaterialId, MeshId, MeshRenderer, ShaderId, Transform};

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            simulation_hz: 500,
            presentation_hz: 500,
        }
    }

    fn renderable_world() -> World {
        let mut world = World::with_builtin_systems(Default::default()).unwrap();
        let e = world.create_entity();
        world.add_component(e, Transform::from_position(Vec3::Y));
        world.add_component(e, MeshRenderer::new(MeshId(1), ShaderId(1), MaterialId(1)));
        world
    }

    #[test]
    fn presentation_sees_simulated_frames() {
        let pipeline = Pipeline::start(renderable_world(), &fast_config()).unwrap();

        let mut last_frame = 0;
        let presented = pipeline
            .run_presentation(|frame| {
                assert_eq!(frame.commands.len(), 1);
                assert!(frame.frame >= last_frame);
                last_frame = frame.frame;
                if frame.frame >= 5 {
                    PresentControl::Stop
                } else {
                    PresentControl::Continue
                }
            })
            .unwrap();
        assert!(presented >= 1);
        assert!(!pipeline.is_running());

        let world = pipeline.shutdown().unwrap();
        assert!(world.time().tick_count() >= 5);
    }

    #[test]
    fn second_presentation_loop_is_rejected() {
        let pipeline = Pipeline::start(World::new(), &fast_config()).unwrap();
        pipeline.presenting.store(true, Ordering::Release);
        assert!(matches!(
            pipeline.run_presentation(|_| PresentControl::Stop),
            Err(PipelineError::AlreadyRunning)
        ));
        pipeline.presenting.store(false, Ordering::Release);
        pipeline.shutdown().unwrap();
    }

    #[test]
    fn world_shutdown_request_stops_the_pipeline() {
        let mut world = World::new();
        world.request_shutdown();
        let pipeline = Pipeline::start(world, &fast_config()).unwrap();

        let presented = pipeline.run_presentation(|_| PresentControl::Continue).unwrap();
        assert_eq!(presented, 0);
        let world = pipeline.shutdown().unwrap();
        assert_eq!(world.time().tick_count(), 1);
    }

    #[test]
    fn stop_guard_clears_flag_when_thread_panics() {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let outcome = thread::spawn(move || {
            let _guard = StopOnExit(flag);
            panic!("tick failed");
        })
        .join();
        assert!(outcome.is_err());
        assert!(!running.load(Ordering::Acquire));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
