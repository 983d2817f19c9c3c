//! Grid-accelerated ray queries
//!
//! Candidates are gathered by walking the ray through the spatial grid
//! (exact DDA traversal), then each candidate's collider box is tested with
//! the slab method. Only entities the physics tick has put into the grid can
//! be hit, so queries issued before the first tick find nothing.

use crate::ecs::{Entity, World};
use crate::math::{Aabb, Ray, Vec2, Vec3};
use crate::physics::{BoxCollider, Transform};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// Result of a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub entity: Entity,
    pub point: Vec3,
    /// Approximate face normal of the box at `point`.
    pub normal: Vec3,
    pub distance: f32,
}

/// One recorded cast, kept while raycast debugging is on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: f32,
    pub hit: Option<RaycastHit>,
}

/// Bounded history of debug rays, oldest first.
///
/// Queries take `&World`, so recording goes through a mutex.
#[derive(Debug)]
pub(crate) struct DebugRayLog {
    rays: Mutex<VecDeque<DebugRay>>,
    capacity: usize,
}

impl DebugRayLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            rays: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, ray: DebugRay) {
        if self.capacity == 0 {
            return;
        }
        let mut rays = self.rays.lock();
        while rays.len() >= self.capacity {
            rays.pop_front();
        }
        rays.push_back(ray);
    }

    pub fn snapshot(&self) -> Vec<DebugRay> {
        self.rays.lock().iter().copied().collect()
    }

    pub fn clear(&self) {
        self.rays.lock().clear();
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        let rays = self.rays.get_mut();
        while rays.len() > capacity {
            rays.pop_front();
        }
    }
}

impl World {
    /// Cast `ray` against colliders whose layer intersects `layer_mask`.
    ///
    /// With `find_closest` the nearest hit is returned; otherwise the first
    /// hit found in traversal order, which is cheaper but not necessarily
    /// the nearest when boxes share a cell.
    pub fn raycast(&self, ray: &Ray, layer_mask: u32, find_closest: bool) -> Option<RaycastHit> {
        let length = self.ray_length(ray);
        let mut best: Option<RaycastHit> = None;

        for hit in self.ray_hits(ray, length, layer_mask) {
            if !find_closest {
                best = Some(hit);
                break;
            }
            match &best {
                Some(current) if hit.distance >= current.distance => {}
                _ => best = Some(hit),
            }
        }

        self.record_ray(ray, length, best);
        best
    }

    /// Every hit along `ray`, nearest first.
    pub fn raycast_all(&self, ray: &Ray, layer_mask: u32) -> Vec<RaycastHit> {
        let length = self.ray_length(ray);
        let mut hits: Vec<RaycastHit> = self.ray_hits(ray, length, layer_mask).collect();
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.entity.cmp(&b.entity))
        });

        self.record_ray(ray, length, hits.first().copied());
        hits
    }

    /// `true` when nothing on `layer_mask` lies between `from` and `to`.
    pub fn line_of_sight(&self, from: Vec3, to: Vec3, layer_mask: u32) -> bool {
        let ray = Ray::between(from, to);
        if ray.is_degenerate() {
            return true;
        }
        self.raycast(&ray, layer_mask, false).is_none()
    }

    /// Ray through a screen position (pixels, origin top-left) of a viewport
    /// of `viewport_size` pixels, starting on the camera's near plane.
    ///
    /// An empty viewport yields a degenerate ray that hits nothing.
    pub fn screen_to_world_ray(&self, screen: Vec2, viewport_size: Vec2) -> Ray {
        if viewport_size.x <= 0.0 || viewport_size.y <= 0.0 {
            return Ray::new(self.camera().position(), Vec3::ZERO);
        }

        let ndc_x = 2.0 * screen.x / viewport_size.x - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y / viewport_size.y;
        let inverse = self.camera().view_projection().inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(near, far - near)
    }

    /// Ray through the current mouse position.
    pub fn mouse_ray(&self) -> Ray {
        let input = self.input();
        self.screen_to_world_ray(input.mouse_position, input.viewport_size)
    }

    /// Snapshot of the debug ray history, oldest first.
    pub fn debug_rays(&self) -> Vec<DebugRay> {
        self.debug_rays.snapshot()
    }

    fn ray_length(&self, ray: &Ray) -> f32 {
        match ray.max_distance {
            Some(distance) if distance.is_finite() => distance.max(0.0),
            _ => self.config().raycast.default_max_distance,
        }
    }

    /// Hits in grid traversal order. Each candidate is tested once.
    fn ray_hits<'a>(
        &'a self,
        ray: &'a Ray,
        length: f32,
        layer_mask: u32,
    ) -> impl Iterator<Item = RaycastHit> + 'a {
        let cells = self.grid().cells_along_ray(ray, length);
        let candidates = self.grid().entities_in_cells(&cells);

        candidates.into_iter().filter_map(move |entity| {
            let bounds = self.collider_bounds(entity, layer_mask)?;
            let distance = bounds.ray_intersection(ray, length)?;
            let point = ray.point_at(distance);
            Some(RaycastHit {
                entity,
                point,
                normal: bounds.approximate_normal(point),
                distance,
            })
        })
    }

    /// Current bounds of an enabled collider on `layer_mask`.
    fn collider_bounds(&self, entity: Entity, layer_mask: u32) -> Option<Aabb> {
        let collider = self.get_component::<BoxCollider>(entity)?;
        if !collider.enabled || (collider.layer & layer_mask) == 0 {
            return None;
        }
        match self.get_component::<Transform>(entity) {
            Some(transform) => Some(collider.world_aabb(transform)),
            None => self.grid().bounds(entity),
        }
    }

    fn record_ray(&self, ray: &Ray, length: f32, hit: Option<RaycastHit>) {
        if !self.config().raycast.debug {
            return;
        }
        debug!(
            origin = ?ray.origin,
            direction = ?ray.direction,
            length,
            hit = ?hit.map(|h| (h.entity.to_bits(), h.distance)),
            "raycast"
        );
        self.debug_rays.record(DebugRay {
            origin: ray.origin,
            direction: ray.direction,
            length,
            hit,
        });
    }
}
