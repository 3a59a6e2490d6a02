//! Chainable object operation wrapper.
//!
//! [`SceneObjectMut`] borrows a [`Scene`] mutably and provides a fluent
//! API for editing one object without repeated handle lookups. Every call
//! routes through the corresponding `Scene` operation, so dirty bits,
//! notifications and mobility gating behave exactly as the long form.
//!
//! All methods silently no-op when the handle is stale, so users never
//! encounter panics from dangling handles.
//!
//! # Example
//!
//! ```rust,ignore
//! scene.edit(handle)
//!     .set_position(0.0, 3.0, 0.0)
//!     .set_scale(2.0)
//!     .look_at(Vec3::ZERO)
//!     .set_active(false);
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Quat, Vec3};

use crate::component::{ComponentKind, RunFlags};
use crate::registry::{ComponentHandle, ObjectHandle};
use crate::scene::object::Mobility;
use crate::scene::scene::Scene;
use crate::scene::transform::TransformChange;

/// Temporary mutable borrow of a scene object for chainable operations.
pub struct SceneObjectMut<'a> {
    scene: &'a mut Scene,
    handle: ObjectHandle,
}

impl<'a> SceneObjectMut<'a> {
    #[inline]
    pub fn new(scene: &'a mut Scene, handle: ObjectHandle) -> Self {
        Self { scene, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    // -- Transform setters (chainable) --

    /// Sets the local position.
    #[inline]
    pub fn set_position(self, x: f32, y: f32, z: f32) -> Self {
        self.scene.set_position(self.handle, Vec3::new(x, y, z));
        self
    }

    /// Sets the local position from a Vec3.
    #[inline]
    pub fn set_position_vec(self, pos: Vec3) -> Self {
        self.scene.set_position(self.handle, pos);
        self
    }

    /// Sets uniform scale.
    #[inline]
    pub fn set_scale(self, s: f32) -> Self {
        self.scene.set_scale(self.handle, Vec3::splat(s));
        self
    }

    /// Sets non-uniform scale.
    #[inline]
    pub fn set_scale_xyz(self, x: f32, y: f32, z: f32) -> Self {
        self.scene.set_scale(self.handle, Vec3::new(x, y, z));
        self
    }

    /// Sets rotation from a quaternion.
    #[inline]
    pub fn set_rotation(self, quat: Quat) -> Self {
        self.scene.set_rotation(self.handle, quat);
        self
    }

    /// Sets rotation from Euler angles (XYZ intrinsic order, radians).
    #[inline]
    pub fn set_rotation_euler(self, x: f32, y: f32, z: f32) -> Self {
        self.scene.set_rotation_euler(self.handle, x, y, z);
        self
    }

    /// Rotates around the Y axis by `angle` radians (cumulative).
    #[inline]
    pub fn rotate_y(self, angle: f32) -> Self {
        self.scene.rotate(self.handle, Quat::from_rotation_y(angle));
        self
    }

    /// Rotates around the X axis by `angle` radians (cumulative).
    #[inline]
    pub fn rotate_x(self, angle: f32) -> Self {
        self.scene.rotate(self.handle, Quat::from_rotation_x(angle));
        self
    }

    /// Moves the local position by `delta`.
    #[inline]
    pub fn translate(self, delta: Vec3) -> Self {
        self.scene.translate(self.handle, delta);
        self
    }

    /// Orients the object to face `target` (in parent-local space).
    #[inline]
    pub fn look_at(self, target: Vec3) -> Self {
        self.scene.look_at(self.handle, target, Vec3::Y);
        self
    }

    /// Sets the world-space position.
    #[inline]
    pub fn set_world_position(self, pos: Vec3) -> Self {
        self.scene.set_world_position(self.handle, pos);
        self
    }

    // -- Structure and policy --

    #[inline]
    pub fn set_name(self, name: impl Into<String>) -> Self {
        self.scene.set_name(self.handle, name);
        self
    }

    #[inline]
    pub fn set_mobility(self, mobility: Mobility) -> Self {
        self.scene.set_mobility(self.handle, mobility);
        self
    }

    #[inline]
    pub fn set_active(self, active: bool) -> Self {
        self.scene.set_active(self.handle, active);
        self
    }

    /// Reparents the object; see [`Scene::set_parent`] for the rules.
    #[inline]
    pub fn set_parent(self, parent: Option<ObjectHandle>, keep_world: bool) -> Self {
        self.scene.set_parent(self.handle, parent, keep_world);
        self
    }

    // -- Components --

    /// Attaches a component and keeps chaining; the handle is dropped.
    #[inline]
    pub fn with_component(self, kind: ComponentKind) -> Self {
        self.scene.add_component(self.handle, kind);
        self
    }

    /// Attaches a component with the given run flags, chainable.
    #[inline]
    pub fn with_component_flags(self, kind: ComponentKind, run_flags: RunFlags) -> Self {
        if let Some(handle) = self.scene.add_component(self.handle, kind)
            && let Some(component) = self.scene.component_mut(handle)
        {
            component.set_run_flags(run_flags);
        }
        self
    }

    /// Attaches a component with an explicit notify mask, chainable.
    #[inline]
    pub fn with_component_mask(self, kind: ComponentKind, mask: TransformChange) -> Self {
        if let Some(handle) = self.scene.add_component(self.handle, kind)
            && let Some(component) = self.scene.component_mut(handle)
        {
            component.set_notify_mask(mask);
        }
        self
    }

    /// Attaches a component, ending the chain with its handle.
    #[inline]
    pub fn add_component(self, kind: ComponentKind) -> Option<ComponentHandle> {
        self.scene.add_component(self.handle, kind)
    }
}
