//! Camera component: projection parameters plus a cached view matrix.

use glam::{Affine3A, Mat4};

use super::{ComponentHooks, ComponentKind};
use crate::scene::transform::TransformChange;

/// Projection parameters. Aspect ratio is supplied at matrix build time
/// by whoever owns the output surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y_radians: f32,
        z_near: f32,
        z_far: f32,
    },
    Orthographic {
        /// Half the vertical extent of the view volume in world units.
        half_height: f32,
        z_near: f32,
        z_far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective {
            fov_y_radians: 60f32.to_radians(),
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

/// Camera kind. The view matrix is the inverse of the owner's world
/// transform, cached against the last world matrix it was derived from;
/// [`CameraComponent::view_matrix`] recomputes only when that input
/// actually changed, so the cache stays correct even when transform
/// notifications were filtered out.
#[derive(Debug, Clone)]
pub struct CameraComponent {
    pub projection: Projection,
    view: Mat4,
    last_world: Affine3A,
    view_dirty: bool,
    revision: u64,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraComponent {
    #[must_use]
    pub fn new() -> Self {
        Self {
            projection: Projection::default(),
            view: Mat4::IDENTITY,
            last_world: Affine3A::IDENTITY,
            view_dirty: true,
            revision: 0,
        }
    }

    #[must_use]
    pub fn perspective(fov_y_radians: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            projection: Projection::Perspective {
                fov_y_radians,
                z_near,
                z_far,
            },
            ..Self::new()
        }
    }

    #[must_use]
    pub fn orthographic(half_height: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            projection: Projection::Orthographic {
                half_height,
                z_near,
                z_far,
            },
            ..Self::new()
        }
    }

    /// View matrix for the given owner world transform, recomputed only
    /// when `world` differs from the one the cache was built from.
    pub fn view_matrix(&mut self, world: Affine3A) -> Mat4 {
        if self.view_dirty || world != self.last_world {
            self.view = Mat4::from(world.inverse());
            self.last_world = world;
            self.view_dirty = false;
        }
        self.view
    }

    #[must_use]
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective {
                fov_y_radians,
                z_near,
                z_far,
            } => Mat4::perspective_rh(fov_y_radians, aspect, z_near, z_far),
            Projection::Orthographic {
                half_height,
                z_near,
                z_far,
            } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    z_near,
                    z_far,
                )
            }
        }
    }

    /// Count of transform notifications heard since attach.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl ComponentHooks for CameraComponent {
    fn on_transform_changed(&mut self, _change: TransformChange) {
        self.revision += 1;
    }

    fn copy_state_from(&mut self, source: &ComponentKind) -> bool {
        let ComponentKind::Camera(src) = source else {
            return false;
        };
        self.projection = src.projection;
        true
    }

    fn default_notify_mask(&self) -> TransformChange {
        TransformChange::TRANSFORM | TransformChange::PARENT
    }
}
