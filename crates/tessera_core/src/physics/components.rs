use crate::math::{Aabb, Mat4, Quat, Vec3};

/// Layer bit given to colliders that don't pick one.
pub const DEFAULT_LAYER: u32 = 1;

/// Mask accepting every layer.
pub const ALL_LAYERS: u32 = u32::MAX;

/// Position, orientation and scale of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Model matrix (scale, then rotation, then translation).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Axis-aligned box collider.
///
/// The box ignores the transform's rotation: its world AABB is
/// `position + offset * scale` with half extents `half_extents * |scale|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCollider {
    pub half_extents: Vec3,
    pub offset: Vec3,
    /// Triggers report enter/exit events; solid colliders only count contacts.
    pub is_trigger: bool,
    pub enabled: bool,
    /// Layer bits this collider belongs to.
    pub layer: u32,
    /// Layers this collider is tested against.
    pub collides_with: u32,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            half_extents: Vec3::splat(0.5),
            offset: Vec3::ZERO,
            is_trigger: false,
            enabled: true,
            layer: DEFAULT_LAYER,
            collides_with: ALL_LAYERS,
        }
    }
}

impl BoxCollider {
    pub fn solid(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            ..Self::default()
        }
    }

    pub fn trigger(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            is_trigger: true,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_layers(mut self, layer: u32, collides_with: u32) -> Self {
        self.layer = layer;
        self.collides_with = collides_with;
        self
    }

    /// World-space bounds under `transform`.
    pub fn world_aabb(&self, transform: &Transform) -> Aabb {
        let center = transform.position + self.offset * transform.scale;
        Aabb::from_center_half_extents(center, self.half_extents * transform.scale.abs())
    }

    /// Both colliders must list each other's layer.
    pub fn accepts(&self, other: &BoxCollider) -> bool {
        (self.collides_with & other.layer) != 0 && (other.collides_with & self.layer) != 0
    }
}
