//! Mesh renderer component: bounds plus renderer-proxy bookkeeping.

use glam::{Affine3A, Vec3};

use super::{ComponentHooks, ComponentKind};
use crate::scene::transform::TransformChange;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    /// Unit cube centered on the origin.
    fn default() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

impl Aabb {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Tightest axis-aligned box containing this box under `matrix`.
    #[must_use]
    pub fn transformed(&self, matrix: Affine3A) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

/// Mesh renderer kind. `local_bounds` are authored in the owner's local
/// space; world bounds are cached against the world matrix they were
/// derived from, same scheme as the camera's view matrix. The renderer
/// proxy is opaque here: a liveness flag spanning `instantiate` to
/// `on_destroyed` and a dirty flag consumed by the render extraction
/// pass.
#[derive(Debug, Clone)]
pub struct MeshRendererComponent {
    pub local_bounds: Aabb,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    world_bounds: Aabb,
    last_world: Affine3A,
    bounds_dirty: bool,
    proxy_live: bool,
    proxy_dirty: bool,
    visible: bool,
}

impl Default for MeshRendererComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshRendererComponent {
    #[must_use]
    pub fn new() -> Self {
        Self {
            local_bounds: Aabb::default(),
            cast_shadows: true,
            receive_shadows: true,
            world_bounds: Aabb::default(),
            last_world: Affine3A::IDENTITY,
            bounds_dirty: true,
            proxy_live: false,
            proxy_dirty: false,
            visible: false,
        }
    }

    #[must_use]
    pub fn with_bounds(local_bounds: Aabb) -> Self {
        Self {
            local_bounds,
            ..Self::new()
        }
    }

    /// World-space bounds for the given owner world transform, recomputed
    /// only when the input changed since the cached value was built.
    pub fn world_bounds(&mut self, world: Affine3A) -> Aabb {
        if self.bounds_dirty || world != self.last_world {
            self.world_bounds = self.local_bounds.transformed(world);
            self.last_world = world;
            self.bounds_dirty = false;
        }
        self.world_bounds
    }

    /// True between `instantiate` and `on_destroyed`.
    #[must_use]
    pub fn proxy_live(&self) -> bool {
        self.proxy_live
    }

    #[must_use]
    pub fn proxy_dirty(&self) -> bool {
        self.proxy_dirty
    }

    /// Acknowledges a pending proxy update.
    pub fn clear_proxy_dirty(&mut self) {
        self.proxy_dirty = false;
    }

    /// Tracks the enabled state of the component.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl ComponentHooks for MeshRendererComponent {
    fn instantiate(&mut self) {
        self.proxy_live = true;
    }

    fn on_enabled(&mut self) {
        self.visible = true;
        self.proxy_dirty = true;
    }

    fn on_disabled(&mut self) {
        self.visible = false;
        self.proxy_dirty = true;
    }

    fn on_transform_changed(&mut self, _change: TransformChange) {
        self.bounds_dirty = true;
        self.proxy_dirty = true;
    }

    fn on_destroyed(&mut self) {
        self.proxy_live = false;
    }

    fn mark_dirty(&mut self) {
        self.proxy_dirty = true;
    }

    fn copy_state_from(&mut self, source: &ComponentKind) -> bool {
        let ComponentKind::MeshRenderer(src) = source else {
            return false;
        };
        self.local_bounds = src.local_bounds;
        self.cast_shadows = src.cast_shadows;
        self.receive_shadows = src.receive_shadows;
        true
    }

    fn default_notify_mask(&self) -> TransformChange {
        TransformChange::TRANSFORM | TransformChange::PARENT
    }
}
