//! Uniform 3D hash grid used as the collision broad phase.
//!
//! Each AABB is mapped to the inclusive range of cells between the cells of
//! its min and max corners. The grid keeps a bidirectional index (cell to
//! entities, entity to cell range) so relocating or removing an entity costs
//! time proportional to the cells it occupies, not to the population.
//!
//! Bounds spanning more than [`MAX_CELLS_PER_ENTITY`] cells are not linked
//! into cells at all. They sit in a short oversized list and are paired
//! with every other entity, so one enormous collider costs a linear scan
//! instead of filling millions of cells. Non-finite bounds are rejected.

use crate::config::{validate_cell_size, ConfigError};
use crate::ecs::Entity;
use crate::math::{Aabb, Ray, Vec3};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Cell size used when none (or an invalid one) is supplied.
pub const DEFAULT_CELL_SIZE: f32 = 4.0;

/// Larger cell footprints go to the oversized list.
pub const MAX_CELLS_PER_ENTITY: u64 = 4096;

/// Upper bound on cells visited by one ray walk.
const MAX_RAY_CELLS: usize = 100_000;

/// Integer cell coordinate: `floor(coordinate / cell_size)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    fn axis(&self, axis: usize) -> i32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    fn axis_mut(&mut self, axis: usize) -> &mut i32 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }

    /// Number of cells in the inclusive box `min..=max`.
    fn span(min: GridCell, max: GridCell) -> u64 {
        (0..3)
            .map(|axis| (max.axis(axis) as i64 - min.axis(axis) as i64 + 1).max(0) as u64)
            .product()
    }

    /// Every cell of the inclusive box `min..=max`.
    fn range(min: GridCell, max: GridCell) -> impl Iterator<Item = GridCell> {
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| GridCell::new(x, y, z)))
        })
    }
}

/// Where an entity currently sits in the grid.
#[derive(Debug, Clone, Copy)]
struct GridEntry {
    bounds: Aabb,
    min: GridCell,
    max: GridCell,
    /// Linked into cells, as opposed to held in the oversized list.
    linked: bool,
}

/// Uniform spatial hash grid over entity AABBs.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<GridCell, Vec<Entity>>,
    entries: HashMap<Entity, GridEntry>,
    oversized: Vec<Entity>,
}

impl SpatialGrid {
    /// Create an empty grid. An invalid `cell_size` falls back to
    /// [`DEFAULT_CELL_SIZE`].
    pub fn new(cell_size: f32) -> Self {
        let cell_size = match validate_cell_size(cell_size) {
            Ok(()) => cell_size,
            Err(err) => {
                warn!(%err, fallback = DEFAULT_CELL_SIZE, "invalid grid cell size");
                DEFAULT_CELL_SIZE
            }
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            entries: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the cell size. On success the grid is emptied and must be
    /// rebuilt; on failure the previous size and contents are kept.
    pub fn set_cell_size(&mut self, cell_size: f32) -> Result<(), ConfigError> {
        if let Err(err) = validate_cell_size(cell_size) {
            warn!(%err, kept = self.cell_size, "grid cell size rejected");
            return Err(err);
        }
        info!(from = self.cell_size, to = cell_size, "grid cell size changed; grid cleared");
        self.cell_size = cell_size;
        self.clear();
        Ok(())
    }

    /// Cell containing `point`.
    pub fn cell_of(&self, point: Vec3) -> GridCell {
        let scaled = (point / self.cell_size).floor();
        GridCell::new(scaled.x as i32, scaled.y as i32, scaled.z as i32)
    }

    /// Insert `entity` or move it if it is already present. Returns false,
    /// and drops any previous entry, when `bounds` is not finite.
    pub fn insert(&mut self, entity: Entity, bounds: Aabb) -> bool {
        if !bounds.min.is_finite() || !bounds.max.is_finite() {
            warn!(
                %entity,
                min = ?bounds.min,
                max = ?bounds.max,
                "non-finite bounds kept out of grid"
            );
            self.remove(entity);
            return false;
        }

        let min = self.cell_of(bounds.min);
        let max = self.cell_of(bounds.max);
        let linked = GridCell::span(min, max) <= MAX_CELLS_PER_ENTITY;

        if let Some(entry) = self.entries.get_mut(&entity) {
            if entry.linked == linked && (!linked || (entry.min == min && entry.max == max)) {
                *entry = GridEntry { bounds, min, max, linked };
                return true;
            }
            let old = *entry;
            self.detach(entity, &old);
        } else if !linked {
            debug!(%entity, "bounds exceed cell budget; tracked as oversized");
        }

        if linked {
            for cell in GridCell::range(min, max) {
                self.cells.entry(cell).or_default().push(entity);
            }
        } else {
            self.oversized.push(entity);
        }
        self.entries.insert(entity, GridEntry { bounds, min, max, linked });
        true
    }

    /// Relocate `entity`. Equivalent to [`insert`](Self::insert).
    pub fn update(&mut self, entity: Entity, bounds: Aabb) -> bool {
        self.insert(entity, bounds)
    }

    /// Remove `entity` from every cell it occupies.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.entries.remove(&entity) {
            Some(entry) => {
                self.detach(entity, &entry);
                true
            }
            None => false,
        }
    }

    fn detach(&mut self, entity: Entity, entry: &GridEntry) {
        if !entry.linked {
            self.oversized.retain(|&e| e != entity);
            return;
        }
        for cell in GridCell::range(entry.min, entry.max) {
            if let Some(occupants) = self.cells.get_mut(&cell) {
                occupants.retain(|&e| e != entity);
                if occupants.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.oversized.clear();
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Bounds `entity` was last inserted with.
    pub fn bounds(&self, entity: Entity) -> Option<Aabb> {
        self.entries.get(&entity).map(|entry| entry.bounds)
    }

    /// Entities currently indexed.
    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Entities too large to link into cells.
    pub fn oversized(&self) -> &[Entity] {
        &self.oversized
    }

    pub fn entities_in_cell(&self, cell: GridCell) -> &[Entity] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every pairwise combination of co-located entities, once per shared
    /// cell, plus each oversized entity against every other entity. Pairs
    /// are normalised `(low, high)`; a pair sharing several cells appears
    /// several times.
    pub fn potential_collisions(&self) -> Vec<(Entity, Entity)> {
        let mut pairs = Vec::new();
        for occupants in self.cells.values() {
            for (i, &a) in occupants.iter().enumerate() {
                for &b in &occupants[i + 1..] {
                    pairs.push(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        for (i, &big) in self.oversized.iter().enumerate() {
            for &other in self.entries.keys() {
                if other == big || self.oversized[..i].contains(&other) {
                    continue;
                }
                pairs.push(if big < other { (big, other) } else { (other, big) });
            }
        }
        pairs
    }

    /// [`potential_collisions`](Self::potential_collisions), sorted and with
    /// each unordered pair reported once.
    pub fn potential_collisions_unique(&self) -> Vec<(Entity, Entity)> {
        let mut pairs = self.potential_collisions();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Entities whose bounds come within `radius` of `center`, sorted.
    pub fn entities_in_radius(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let radius = radius.max(0.0);
        let reach = Aabb::from_center_half_extents(center, Vec3::splat(radius));
        let radius_sq = radius * radius;
        self.collect_in_region(&reach, |bounds| {
            bounds.distance_squared_to_point(center) <= radius_sq
        })
    }

    /// Entities whose bounds overlap `region`, sorted.
    pub fn query_aabb(&self, region: &Aabb) -> Vec<Entity> {
        self.collect_in_region(region, |bounds| bounds.intersects(region))
    }

    fn collect_in_region(&self, region: &Aabb, keep: impl Fn(&Aabb) -> bool) -> Vec<Entity> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let min = self.cell_of(region.min);
        let max = self.cell_of(region.max);
        let cell_span = GridCell::span(min, max);

        // Huge regions: scanning entries is cheaper than walking empty cells.
        if cell_span > self.cells.len() as u64 {
            found.extend(
                self.entries
                    .iter()
                    .filter(|(_, entry)| keep(&entry.bounds))
                    .map(|(&entity, _)| entity),
            );
        } else {
            for cell in GridCell::range(min, max) {
                for &entity in self.entities_in_cell(cell) {
                    if !seen.insert(entity) {
                        continue;
                    }
                    if self.entries.get(&entity).is_some_and(|e| keep(&e.bounds)) {
                        found.push(entity);
                    }
                }
            }
            found.extend(
                self.oversized
                    .iter()
                    .copied()
                    .filter(|e| self.entries.get(e).is_some_and(|entry| keep(&entry.bounds))),
            );
        }

        found.sort_unstable();
        found
    }

    /// Cells pierced by `ray` up to `max_distance`, in traversal order
    /// (exact 3D DDA voxel walk).
    pub fn cells_along_ray(&self, ray: &Ray, max_distance: f32) -> Vec<GridCell> {
        if ray.is_degenerate() || !max_distance.is_finite() || max_distance < 0.0 {
            return Vec::new();
        }

        let cs = self.cell_size;
        let origin = ray.origin.to_array();
        let dir = ray.direction.to_array();
        let mut cell = self.cell_of(ray.origin);
        let end = self.cell_of(ray.point_at(max_distance));

        let mut step = [0i32; 3];
        let mut t_max = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];
        for axis in 0..3 {
            if dir[axis] > 0.0 {
                step[axis] = 1;
                let boundary = (cell.axis(axis) as f32 + 1.0) * cs;
                t_max[axis] = (boundary - origin[axis]) / dir[axis];
                t_delta[axis] = cs / dir[axis];
            } else if dir[axis] < 0.0 {
                step[axis] = -1;
                let boundary = cell.axis(axis) as f32 * cs;
                t_max[axis] = (boundary - origin[axis]) / dir[axis];
                t_delta[axis] = -cs / dir[axis];
            }
        }

        let span = (0..3)
            .map(|axis| (end.axis(axis) - cell.axis(axis)).unsigned_abs() as usize)
            .sum::<usize>();
        let budget = (span + 3).min(MAX_RAY_CELLS);

        let mut cells = Vec::with_capacity(span + 1);
        cells.push(cell);
        while cells.len() < budget && cell != end {
            let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
                0
            } else if t_max[1] <= t_max[2] {
                1
            } else {
                2
            };
            if t_max[axis] > max_distance {
                break;
            }
            *cell.axis_mut(axis) += step[axis];
            t_max[axis] += t_delta[axis];
            cells.push(cell);
        }
        cells
    }

    /// Cells containing sample points spaced `step` apart along `ray`, from
    /// the origin to `max_distance` inclusive, deduplicated in visit order.
    ///
    /// Cheaper than [`cells_along_ray`](Self::cells_along_ray) to reason
    /// about but approximate: with `step` above the cell size, or at
    /// glancing angles near cell corners, pierced cells can be skipped.
    /// `None` uses half the cell size.
    pub fn cells_along_ray_sampled(
        &self,
        ray: &Ray,
        max_distance: f32,
        step: Option<f32>,
    ) -> Vec<GridCell> {
        if ray.is_degenerate() || !max_distance.is_finite() || max_distance < 0.0 {
            return Vec::new();
        }
        let step = step
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.cell_size * 0.5);

        let mut seen = HashSet::new();
        let mut cells = Vec::new();
        let mut visit = |cell: GridCell| {
            if seen.insert(cell) {
                cells.push(cell);
            }
        };

        let samples = ((max_distance / step).floor() as usize).min(MAX_RAY_CELLS);
        for i in 0..=samples {
            visit(self.cell_of(ray.point_at(i as f32 * step)));
        }
        visit(self.cell_of(ray.point_at(max_distance)));
        cells
    }

    /// Union of the occupants of `cells`, first-seen order, no duplicates,
    /// followed by the oversized entities, which may overlap any cell.
    pub fn entities_in_cells(&self, cells: &[GridCell]) -> Vec<Entity> {
        let mut seen = HashSet::new();
        cells
            .iter()
            .flat_map(|&cell| self.entities_in_cell(cell).iter().copied())
            .chain(self.oversized.iter().copied())
            .filter(|&entity| seen.insert(entity))
            .collect()
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::new(index, 0)
    }

    fn cube(center: Vec3, half: f32) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::splat(half))
    }

    /// Deterministic pseudo-random floats in `[0, 1)`.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> f32 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((self.0 >> 40) as f32) / ((1u64 << 24) as f32)
        }
    }

    #[test]
    fn cells_use_floor_division() {
        let grid = SpatialGrid::new(2.0);
        assert_eq!(grid.cell_of(Vec3::new(0.5, 1.99, 2.0)), GridCell::new(0, 0, 1));
        assert_eq!(grid.cell_of(Vec3::new(-0.1, -2.0, -2.1)), GridCell::new(-1, -1, -2));
    }

    #[test]
    fn insert_spans_inclusive_cell_range() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(entity(1), Aabb::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.5, 0.9, 0.9)));
        assert_eq!(grid.occupied_cell_count(), 2);
        assert_eq!(grid.entities_in_cell(GridCell::new(0, 0, 0)), &[entity(1)]);
        assert_eq!(grid.entities_in_cell(GridCell::new(1, 0, 0)), &[entity(1)]);
    }

    #[test]
    fn update_relocates_and_remove_cleans_up() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(entity(1), cube(Vec3::splat(0.5), 0.2));
        grid.update(entity(1), cube(Vec3::splat(5.5), 0.2));

        assert!(grid.entities_in_cell(GridCell::new(0, 0, 0)).is_empty());
        assert_eq!(grid.entities_in_cell(GridCell::new(5, 5, 5)), &[entity(1)]);
        assert_eq!(grid.occupied_cell_count(), 1);

        assert!(grid.remove(entity(1)));
        assert!(!grid.remove(entity(1)));
        assert_eq!(grid.occupied_cell_count(), 0);
        assert_eq!(grid.entity_count(), 0);
    }

    #[test]
    fn shared_cells_produce_duplicate_pairs() {
        let mut grid = SpatialGrid::new(1.0);
        // Both span cells (0,0,0) and (1,0,0).
        grid.insert(entity(1), Aabb::new(Vec3::new(0.5, 0.1, 0.1), Vec3::new(1.5, 0.2, 0.2)));
        grid.insert(entity(2), Aabb::new(Vec3::new(0.6, 0.1, 0.1), Vec3::new(1.6, 0.2, 0.2)));

        let pairs = grid.potential_collisions();
        assert_eq!(pairs, vec![(entity(1), entity(2)); 2]);
        assert_eq!(grid.potential_collisions_unique(), vec![(entity(1), entity(2))]);
    }

    #[test]
    fn broad_phase_has_no_false_negatives() {
        let mut rng = Lcg(7);
        let mut grid = SpatialGrid::new(2.0);
        let mut boxes = Vec::new();
        for i in 1..=120u32 {
            let center = Vec3::new(rng.next(), rng.next(), rng.next()) * 20.0 - 10.0;
            let half = Vec3::new(rng.next(), rng.next(), rng.next()) * 1.5 + 0.05;
            let bounds = Aabb::from_center_half_extents(center, half);
            grid.insert(entity(i), bounds);
            boxes.push((entity(i), bounds));
        }

        let candidates: HashSet<_> = grid.potential_collisions().into_iter().collect();
        for (i, (a, box_a)) in boxes.iter().enumerate() {
            for (b, box_b) in &boxes[i + 1..] {
                if box_a.intersects(box_b) {
                    let pair = if a < b { (*a, *b) } else { (*b, *a) };
                    assert!(candidates.contains(&pair), "missing pair {pair:?}");
                }
            }
        }
    }

    #[test]
    fn radius_and_region_queries_are_exact() {
        let mut grid = SpatialGrid::new(4.0);
        grid.insert(entity(1), cube(Vec3::ZERO, 0.5));
        grid.insert(entity(2), cube(Vec3::new(3.0, 0.0, 0.0), 0.5));
        grid.insert(entity(3), cube(Vec3::new(30.0, 0.0, 0.0), 0.5));

        assert_eq!(grid.entities_in_radius(Vec3::ZERO, 1.0), vec![entity(1)]);
        assert_eq!(grid.entities_in_radius(Vec3::ZERO, 2.6), vec![entity(1), entity(2)]);

        let region = Aabb::new(Vec3::new(2.0, -1.0, -1.0), Vec3::new(40.0, 1.0, 1.0));
        assert_eq!(grid.query_aabb(&region), vec![entity(2), entity(3)]);
    }

    #[test]
    fn rejected_cell_size_keeps_contents() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(entity(1), cube(Vec3::ZERO, 0.2));

        assert!(grid.set_cell_size(0.0).is_err());
        assert!(grid.set_cell_size(f32::NAN).is_err());
        assert_eq!(grid.cell_size(), 1.0);
        assert_eq!(grid.entity_count(), 1);

        grid.set_cell_size(3.0).unwrap();
        assert_eq!(grid.entity_count(), 0);
    }

    #[test]
    fn invalid_initial_size_falls_back() {
        assert_eq!(SpatialGrid::new(-1.0).cell_size(), DEFAULT_CELL_SIZE);
    }

    #[test]
    fn dda_walks_axis_aligned_ray() {
        let grid = SpatialGrid::new(1.0);
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.5), Vec3::NEG_Z);
        let cells = grid.cells_along_ray(&ray, 3.0);
        assert_eq!(
            cells,
            vec![
                GridCell::new(0, 0, 0),
                GridCell::new(0, 0, -1),
                GridCell::new(0, 0, -2),
                GridCell::new(0, 0, -3),
            ]
        );
    }

    #[test]
    fn dda_path_is_face_connected_and_covers_samples() {
        let grid = SpatialGrid::new(1.0);
        let ray = Ray::new(Vec3::new(0.3, 0.7, 0.2), Vec3::new(1.0, 0.37, -0.52));
        let cells = grid.cells_along_ray(&ray, 10.0);

        assert_eq!(cells.first(), Some(&grid.cell_of(ray.origin)));
        assert_eq!(cells.last(), Some(&grid.cell_of(ray.point_at(10.0))));
        for pair in cells.windows(2) {
            let d = (pair[1].x - pair[0].x).abs()
                + (pair[1].y - pair[0].y).abs()
                + (pair[1].z - pair[0].z).abs();
            assert_eq!(d, 1, "cells {:?} -> {:?} are not adjacent", pair[0], pair[1]);
        }

        let exact: HashSet<_> = cells.iter().copied().collect();
        for cell in grid.cells_along_ray_sampled(&ray, 10.0, Some(0.05)) {
            assert!(exact.contains(&cell), "sampled cell {cell:?} not on DDA path");
        }
    }

    #[test]
    fn coarse_sampling_can_skip_cells() {
        let grid = SpatialGrid::new(1.0);
        let ray = Ray::new(Vec3::new(0.1, 0.1, 0.1), Vec3::new(1.0, 1.0, 0.0));
        let exact = grid.cells_along_ray(&ray, 6.0);
        let coarse = grid.cells_along_ray_sampled(&ray, 6.0, Some(2.0));
        assert!(coarse.len() < exact.len());
    }

    #[test]
    fn degenerate_ray_visits_nothing() {
        let grid = SpatialGrid::new(1.0);
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert!(grid.cells_along_ray(&ray, 10.0).is_empty());
        assert!(grid.cells_along_ray_sampled(&ray, 10.0, None).is_empty());
    }

    #[test]
    fn entities_in_cells_deduplicates() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(entity(4), Aabb::new(Vec3::new(0.1, 0.1, 0.1), Vec3::new(1.5, 0.5, 0.5)));
        grid.insert(entity(2), cube(Vec3::new(1.5, 0.5, 0.5), 0.1));
        let found = grid.entities_in_cells(&[GridCell::new(0, 0, 0), GridCell::new(1, 0, 0)]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], entity(4));
    }

    #[test]
    fn huge_bounds_stay_out_of_cells_but_still_pair() {
        let mut grid = SpatialGrid::new(4.0);
        grid.insert(entity(1), cube(Vec3::new(2.0, 2.0, 2.0), 0.5));
        grid.insert(entity(2), cube(Vec3::new(-50.0, 0.0, 0.0), 0.5));
        assert!(grid.insert(entity(9), cube(Vec3::ZERO, 1.0e4)));

        assert_eq!(grid.oversized(), &[entity(9)]);
        assert_eq!(grid.occupied_cell_count(), 2);
        assert_eq!(
            grid.potential_collisions_unique(),
            vec![(entity(1), entity(9)), (entity(2), entity(9))]
        );
        assert_eq!(
            grid.query_aabb(&cube(Vec3::new(2.0, 2.0, 2.0), 0.1)),
            vec![entity(1), entity(9)]
        );
        assert!(grid.entities_in_cells(&[]).contains(&entity(9)));

        // Shrinking links it into ordinary cells again.
        grid.update(entity(9), cube(Vec3::new(2.0, 2.0, 2.0), 0.5));
        assert!(grid.oversized().is_empty());
        assert_eq!(grid.entities_in_cell(GridCell::new(0, 0, 0)), &[entity(1), entity(9)]);

        grid.update(entity(9), cube(Vec3::ZERO, 1.0e4));
        assert!(grid.remove(entity(9)));
        assert!(grid.oversized().is_empty());
        assert_eq!(grid.potential_collisions(), Vec::new());
    }

    #[test]
    fn two_oversized_entities_pair_once() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(entity(1), cube(Vec3::ZERO, 500.0));
        grid.insert(entity(2), cube(Vec3::ONE, 500.0));
        assert_eq!(grid.potential_collisions(), vec![(entity(1), entity(2))]);
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(entity(1), cube(Vec3::ZERO, 0.5));

        assert!(!grid.insert(entity(1), cube(Vec3::new(f32::NAN, 0.0, 0.0), 0.5)));
        assert!(!grid.contains(entity(1)));
        assert!(!grid.insert(entity(2), cube(Vec3::ZERO, f32::INFINITY)));
        assert_eq!(grid.entity_count(), 0);
        assert_eq!(grid.occupied_cell_count(), 0);
    }
}
