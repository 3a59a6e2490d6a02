//! Skybox component. At most one per scene; the scene rejects a second
//! attach while one is alive.

use glam::Vec3;

use super::{ComponentHooks, ComponentKind};
use crate::scene::transform::TransformChange;

/// Background environment settings. Independent of the owner's transform,
/// so the default notify mask is empty.
#[derive(Debug, Clone)]
pub struct SkyboxComponent {
    pub intensity: f32,
    /// Rotation around the world up axis, in radians.
    pub rotation: f32,
    pub tint: Vec3,
    revision: u64,
}

impl Default for SkyboxComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl SkyboxComponent {
    #[must_use]
    pub fn new() -> Self {
        Self {
            intensity: 1.0,
            rotation: 0.0,
            tint: Vec3::ONE,
            revision: 0,
        }
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl ComponentHooks for SkyboxComponent {
    fn on_transform_changed(&mut self, _change: TransformChange) {
        self.revision += 1;
    }

    fn copy_state_from(&mut self, source: &ComponentKind) -> bool {
        let ComponentKind::Skybox(src) = source else {
            return false;
        };
        self.intensity = src.intensity;
        self.rotation = src.rotation;
        self.tint = src.tint;
        true
    }
}
