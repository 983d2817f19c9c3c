//! Geometry primitives used by the grid, physics and raycast layers
//!
//! Re-exports glam and adds axis-aligned boxes and rays on top of it.

pub use glam::*;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Closed-interval overlap test; touching faces count as overlapping.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Squared distance from `point` to the closest point of the box.
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let closest = point.clamp(self.min, self.max);
        closest.distance_squared(point)
    }

    /// Slab test. Returns the entry distance along `ray`, `0.0` when the
    /// origin is inside the box, or `None` when the box is missed or lies
    /// beyond `max_distance`.
    pub fn ray_intersection(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        let origin = ray.origin.to_array();
        let direction = ray.direction.to_array();
        let min = self.min.to_array();
        let max = self.max.to_array();

        let mut t_near = 0.0f32;
        let mut t_far = max_distance;

        for axis in 0..3 {
            if direction[axis].abs() < f32::EPSILON {
                // Parallel to this slab: the origin must already be inside it.
                if origin[axis] < min[axis] || origin[axis] > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction[axis];
            let mut t0 = (min[axis] - origin[axis]) * inv;
            let mut t1 = (max[axis] - origin[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        Some(t_near)
    }

    /// Face normal approximated from the axis with the largest offset
    /// between `point` and the box center, scaled by the box extents.
    pub fn approximate_normal(&self, point: Vec3) -> Vec3 {
        let half = self.half_extents().max(Vec3::splat(f32::EPSILON));
        let local = (point - self.center()) / half;
        let abs = local.abs();

        if abs.x >= abs.y && abs.x >= abs.z {
            Vec3::new(local.x.signum(), 0.0, 0.0)
        } else if abs.y >= abs.z {
            Vec3::new(0.0, local.y.signum(), 0.0)
        } else {
            Vec3::new(0.0, 0.0, local.z.signum())
        }
    }
}

/// Ray with a normalised direction and an optional length limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: Option<f32>,
}

impl Ray {
    /// Unbounded ray. A zero direction is kept as zero and never hits anything.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance: None,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Ray from `from` towards `to`, bounded to their distance.
    pub fn between(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from).with_max_distance(from.distance(to))
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_inclusive_and_symmetric() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn slab_hit_reports_entry_distance() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = aabb.ray_intersection(&ray, 20.0).expect("hit");
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(0.0, 2.0, -5.0), Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(aabb.ray_intersection(&ray, 20.0), None);
    }

    #[test]
    fn hit_beyond_max_distance_is_rejected() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(aabb.ray_intersection(&ray, 3.0), None);
    }

    #[test]
    fn origin_inside_box_hits_at_zero() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(aabb.ray_intersection(&ray, 10.0), Some(0.0));
    }

    #[test]
    fn normal_follows_dominant_axis() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE);
        assert_eq!(aabb.approximate_normal(Vec3::new(0.0, 0.0, -4.0)), Vec3::Z);
        assert_eq!(aabb.approximate_normal(Vec3::new(0.2, 1.0, -5.1)), Vec3::Y);
    }
}
