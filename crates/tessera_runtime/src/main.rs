//! Tessera demo runtime
//!
//! Boots a small scene (a patrolling box crossing a sensor volume), runs it
//! through the two-thread pipeline for a few seconds and logs what happens.
//!
//! Usage: `tessera [config.json]`. Set `RUST_LOG` to adjust verbosity.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tessera_core::math::{Ray, Vec3};
use tessera_core::{
    Behavior, BehaviorContext, BehaviorResult, BoxCollider, EngineConfig, Entity, MaterialId,
    MeshId, MeshRenderer, Script, ShaderId, Transform, World,
};
use tessera_runtime::{Pipeline, PresentControl};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_LENGTH: Duration = Duration::from_secs(3);

/// Slides back and forth along X.
struct Patrol {
    speed: f32,
    extent: f32,
}

impl Behavior for Patrol {
    fn update(&mut self, ctx: &mut BehaviorContext<'_>, dt: f32) -> BehaviorResult {
        let Some(transform) = ctx.get_mut::<Transform>() else {
            return Ok(());
        };
        transform.position.x += self.speed * dt;
        if transform.position.x.abs() > self.extent {
            transform.position.x = self.extent.copysign(transform.position.x);
            self.speed = -self.speed;
        }
        Ok(())
    }
}

/// Logs whatever passes through its trigger volume.
struct Sensor {
    visits: u32,
}

impl Behavior for Sensor {
    fn start(&mut self, ctx: &mut BehaviorContext<'_>) -> BehaviorResult {
        let below = ctx.raycast(&Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y), u32::MAX);
        info!(sensor = %ctx.entity(), hit = ?below.map(|hit| hit.entity), "sensor armed");
        Ok(())
    }

    fn on_trigger_enter(&mut self, ctx: &mut BehaviorContext<'_>, other: Entity) -> BehaviorResult {
        self.visits += 1;
        info!(sensor = %ctx.entity(), %other, visits = self.visits, "entered sensor");
        Ok(())
    }

    fn on_trigger_exit(&mut self, ctx: &mut BehaviorContext<'_>, other: Entity) -> BehaviorResult {
        info!(sensor = %ctx.entity(), %other, "left sensor");
        Ok(())
    }
}

fn load_config() -> Result<EngineConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {path}"))?;
    let config = EngineConfig::from_json_str(&text)
        .with_context(|| format!("invalid config file {path}"))?;
    info!(%path, "loaded engine config");
    Ok(config)
}

fn build_scene(config: EngineConfig) -> Result<World> {
    let mut world = World::with_builtin_systems(config)?;
    let cube = MeshRenderer::new(MeshId(1), ShaderId(1), MaterialId(1));

    let sensor = tessera_core::spawn!(
        world,
        Transform::default().with_scale(Vec3::splat(2.0)),
        BoxCollider::trigger(Vec3::ONE),
        cube.with_color([0.2, 0.8, 0.2, 0.4]),
        Script::new(Sensor { visits: 0 }),
    );
    let walker = tessera_core::spawn!(
        world,
        Transform::from_position(Vec3::new(-8.0, 0.0, 0.0)),
        BoxCollider::solid(Vec3::splat(0.5)),
        cube,
        Script::new(Patrol {
            speed: 6.0,
            extent: 8.0,
        }),
    );
    info!(%sensor, %walker, entities = world.alive_count(), "scene built");
    Ok(world)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Tessera Engine v{}", tessera_core::VERSION);

    let config = load_config()?;
    let pipeline_config = config.pipeline.clone();
    let world = build_scene(config)?;
    let pipeline = Pipeline::start(world, &pipeline_config)?;

    let started = Instant::now();
    let mut last_report = 0;
    let presented = pipeline.run_presentation(|frame| {
        if frame.frame >= last_report + 60 {
            last_report = frame.frame;
            info!(
                frame = frame.frame,
                tick = frame.tick,
                visible = frame.visible().count(),
                instance_bytes = frame.instance_bytes().len(),
                "presenting"
            );
        }
        if started.elapsed() >= DEMO_LENGTH {
            PresentControl::Stop
        } else {
            PresentControl::Continue
        }
    })?;

    let stats = pipeline.frame_stats();
    let world = pipeline.shutdown()?;
    info!(
        presented,
        ticks = world.time().tick_count(),
        frames_produced = stats.frames_produced,
        anti_flicker = stats.anti_flicker_activations,
        "demo finished"
    );
    if let Some(physics) = world.physics_stats() {
        info!(
            colliders = physics.colliders,
            overlaps = physics.overlaps,
            "final physics tick"
        );
    }
    Ok(())
}
