use super::{BoxCollider, PhysicsStats, Transform};
use crate::behavior::{self, TriggerEdge};
use crate::ecs::{Entity, System, SystemDescriptor, World};
use crate::math::Aabb;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;
use tracing::debug;

/// Below this many pairs the narrow phase stays on the calling thread.
const PARALLEL_PAIR_THRESHOLD: usize = 256;

type ContactMap = BTreeMap<Entity, BTreeSet<Entity>>;

#[derive(Debug, Clone, Copy)]
struct Body {
    bounds: Aabb,
    collider: BoxCollider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOutcome {
    /// Missing, disabled or layer-filtered: no exact test ran.
    Skipped,
    Separate,
    Overlap { trigger: bool },
}

/// Broad phase, narrow phase and trigger edge detection.
///
/// Trigger contact sets are kept per entity for this tick and the previous
/// one; differences between the two become enter and exit events. Event
/// order is deterministic: enters, then exits, each sorted by entity.
#[derive(Debug, Default)]
pub struct PhysicsSystem {
    previous: ContactMap,
    touching: BTreeSet<(Entity, Entity)>,
    departed: Vec<Entity>,
    stats: PhysicsStats,
}

impl PhysicsSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor() -> SystemDescriptor {
        SystemDescriptor::new("physics")
            .require::<Transform>()
            .require::<BoxCollider>()
    }

    pub fn stats(&self) -> &PhysicsStats {
        &self.stats
    }

    /// Entities in trigger contact with `entity` as of the last tick.
    pub fn contacts(&self, entity: Entity) -> Vec<Entity> {
        self.previous
            .get(&entity)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `a` and `b` overlapped (solid or trigger) in the last tick.
    pub fn is_touching(&self, a: Entity, b: Entity) -> bool {
        let pair = if a < b { (a, b) } else { (b, a) };
        self.touching.contains(&pair)
    }

    fn broad_phase(&mut self, world: &mut World, entities: &[Entity]) -> HashMap<Entity, Body> {
        let grid = world.grid_mut();
        for entity in self.departed.drain(..) {
            grid.remove(entity);
        }

        let mut bodies = HashMap::with_capacity(entities.len());
        for &entity in entities {
            let (Some(transform), Some(collider)) = (
                world.get_component::<Transform>(entity).copied(),
                world.get_component::<BoxCollider>(entity).copied(),
            ) else {
                continue;
            };

            if !collider.enabled {
                world.grid_mut().remove(entity);
                continue;
            }

            let bounds = collider.world_aabb(&transform);
            if world.grid_mut().insert(entity, bounds) {
                bodies.insert(entity, Body { bounds, collider });
            }
        }
        bodies
    }

    fn test_pair(bodies: &HashMap<Entity, Body>, a: Entity, b: Entity) -> PairOutcome {
        let (Some(first), Some(second)) = (bodies.get(&a), bodies.get(&b)) else {
            return PairOutcome::Skipped;
        };
        if !first.collider.accepts(&second.collider) {
            return PairOutcome::Skipped;
        }
        if first.bounds.intersects(&second.bounds) {
            PairOutcome::Overlap {
                trigger: first.collider.is_trigger || second.collider.is_trigger,
            }
        } else {
            PairOutcome::Separate
        }
    }
}

impl System for PhysicsSystem {
    fn update(&mut self, world: &mut World, entities: &[Entity], _dt: f32) {
        let mut stats = PhysicsStats::default();

        // Broad phase: refresh every enabled collider in the grid.
        let started = Instant::now();
        let bodies = self.broad_phase(world, entities);
        let candidates = world.grid().potential_collisions();
        stats.colliders = bodies.len();
        stats.candidate_pairs = candidates.len();
        stats.broad_phase = started.elapsed();

        // Narrow phase: exact tests, each unordered pair once.
        let started = Instant::now();
        let mut pairs = candidates;
        pairs.sort_unstable();
        pairs.dedup();
        stats.unique_pairs = pairs.len();

        let outcomes: Vec<PairOutcome> = if pairs.len() >= PARALLEL_PAIR_THRESHOLD {
            pairs
                .par_iter()
                .map(|&(a, b)| Self::test_pair(&bodies, a, b))
                .collect()
        } else {
            pairs
                .iter()
                .map(|&(a, b)| Self::test_pair(&bodies, a, b))
                .collect()
        };

        let mut current = ContactMap::new();
        self.touching.clear();
        for (&(a, b), outcome) in pairs.iter().zip(&outcomes) {
            match *outcome {
                PairOutcome::Skipped => continue,
                PairOutcome::Separate => stats.narrow_tests += 1,
                PairOutcome::Overlap { trigger } => {
                    stats.narrow_tests += 1;
                    stats.overlaps += 1;
                    self.touching.insert((a, b));
                    if trigger {
                        current.entry(a).or_default().insert(b);
                        current.entry(b).or_default().insert(a);
                    } else {
                        stats.solid_contacts += 1;
                    }
                }
            }
        }

        let mut enters = Vec::new();
        for (&entity, others) in &current {
            let before = self.previous.get(&entity);
            for &other in others {
                if !before.is_some_and(|set| set.contains(&other)) {
                    enters.push((entity, other));
                }
            }
        }
        stats.narrow_phase = started.elapsed();

        // Exit sweep: anything in last tick's sets that is gone now.
        let started = Instant::now();
        let mut exits = Vec::new();
        for (&entity, others) in &self.previous {
            let now = current.get(&entity);
            for &other in others {
                if !now.is_some_and(|set| set.contains(&other)) {
                    exits.push((entity, other));
                }
            }
        }
        self.previous = current;

        stats.trigger_enters = enters.len();
        stats.trigger_exits = exits.len();
        for (entity, other) in enters {
            behavior::dispatch_trigger(world, entity, other, TriggerEdge::Enter);
        }
        for (entity, other) in exits {
            behavior::dispatch_trigger(world, entity, other, TriggerEdge::Exit);
        }
        stats.exit_phase = started.elapsed();

        if world.config().physics.debug {
            debug!(
                colliders = stats.colliders,
                candidate_pairs = stats.candidate_pairs,
                unique_pairs = stats.unique_pairs,
                narrow_tests = stats.narrow_tests,
                overlaps = stats.overlaps,
                solid = stats.solid_contacts,
                enters = stats.trigger_enters,
                exits = stats.trigger_exits,
                broad_us = stats.broad_phase.as_micros() as u64,
                narrow_us = stats.narrow_phase.as_micros() as u64,
                exit_us = stats.exit_phase.as_micros() as u64,
                "physics tick"
            );
        }
        self.stats = stats;
    }

    fn on_entity_removed(&mut self, entity: Entity) {
        self.departed.push(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn world_with_physics() -> World {
        let mut world = World::new();
        world
            .register_system(PhysicsSystem::new(), PhysicsSystem::descriptor())
            .unwrap();
        world
    }

    fn spawn_box(world: &mut World, position: Vec3, collider: BoxCollider) -> Entity {
        let e = world.create_entity();
        world.add_component(e, Transform::from_position(position));
        world.add_component(e, collider);
        e
    }

    fn physics(world: &World) -> &PhysicsSystem {
        world.system::<PhysicsSystem>().unwrap()
    }

    #[test]
    fn overlapping_triggers_are_contacts() {
        let mut world = world_with_physics();
        let a = spawn_box(&mut world, Vec3::ZERO, BoxCollider::trigger(Vec3::ONE));
        let b = spawn_box(&mut world, Vec3::new(1.5, 0.0, 0.0), BoxCollider::solid(Vec3::ONE));
        let c = spawn_box(&mut world, Vec3::new(10.0, 0.0, 0.0), BoxCollider::solid(Vec3::ONE));

        world.update(1.0 / 60.0);

        assert_eq!(physics(&world).contacts(a), vec![b]);
        assert_eq!(physics(&world).contacts(b), vec![a]);
        assert!(physics(&world).contacts(c).is_empty());
        assert!(physics(&world).is_touching(b, a));
        assert!(!physics(&world).is_touching(a, c));

        let stats = world.physics_stats().unwrap();
        assert_eq!(stats.colliders, 3);
        assert_eq!(stats.overlaps, 1);
        assert_eq!(stats.solid_contacts, 0);
        assert_eq!(stats.trigger_enters, 2);
    }

    #[test]
    fn solid_overlap_is_counted_not_tracked() {
        let mut world = world_with_physics();
        let a = spawn_box(&mut world, Vec3::ZERO, BoxCollider::solid(Vec3::ONE));
        let b = spawn_box(&mut world, Vec3::new(0.5, 0.0, 0.0), BoxCollider::solid(Vec3::ONE));

        world.update(1.0 / 60.0);

        let stats = world.physics_stats().unwrap();
        assert_eq!(stats.solid_contacts, 1);
        assert_eq!(stats.trigger_enters, 0);
        assert!(physics(&world).contacts(a).is_empty());
        assert!(physics(&world).is_touching(a, b));
    }

    #[test]
    fn disabled_and_filtered_pairs_are_skipped() {
        let mut world = world_with_physics();
        let a = spawn_box(&mut world, Vec3::ZERO, BoxCollider::trigger(Vec3::ONE));
        let mut disabled = BoxCollider::solid(Vec3::ONE);
        disabled.enabled = false;
        spawn_box(&mut world, Vec3::ZERO, disabled);
        spawn_box(
            &mut world,
            Vec3::ZERO,
            BoxCollider::solid(Vec3::ONE).with_layers(0b100, 0b100),
        );

        world.update(1.0 / 60.0);

        assert!(physics(&world).contacts(a).is_empty());
        let stats = world.physics_stats().unwrap();
        assert_eq!(stats.colliders, 2);
        assert_eq!(stats.narrow_tests, 0);
    }

    #[test]
    fn removed_collider_leaves_grid_and_contacts() {
        let mut world = world_with_physics();
        let a = spawn_box(&mut world, Vec3::ZERO, BoxCollider::trigger(Vec3::ONE));
        let b = spawn_box(&mut world, Vec3::ZERO, BoxCollider::trigger(Vec3::ONE));
        world.update(1.0 / 60.0);
        assert!(world.grid().contains(b));

        world.remove_component::<BoxCollider>(b);
        world.update(1.0 / 60.0);

        assert!(!world.grid().contains(b));
        assert!(physics(&world).contacts(a).is_empty());
        assert_eq!(world.physics_stats().unwrap().trigger_exits, 2);
    }

    #[test]
    fn many_pairs_take_the_parallel_path() {
        let mut world = world_with_physics();
        // 30 colliders in one cell: 435 pairs.
        for i in 0..30 {
            let offset = Vec3::new(i as f32 * 0.01, 0.0, 0.0);
            spawn_box(&mut world, offset, BoxCollider::trigger(Vec3::splat(0.5)));
        }
        world.update(1.0 / 60.0);

        let stats = world.physics_stats().unwrap();
        assert_eq!(stats.unique_pairs, 435);
        assert_eq!(stats.overlaps, 435);
        assert_eq!(stats.trigger_enters, 870);
    }
}
