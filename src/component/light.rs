//! Light component: directional, point and spot lights.

use glam::Vec3;

use super::{ComponentHooks, ComponentKind};
use crate::scene::transform::TransformChange;

/// Falloff shape of a light. Direction and position come from the owning
/// object's world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point {
        range: f32,
    },
    Spot {
        range: f32,
        inner_angle: f32,
        outer_angle: f32,
    },
}

#[derive(Debug, Clone)]
pub struct LightComponent {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub cast_shadows: bool,
    revision: u64,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl LightComponent {
    /// A white directional light of intensity 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            kind: LightKind::Directional,
            cast_shadows: false,
            revision: 0,
        }
    }

    #[must_use]
    pub fn directional() -> Self {
        Self::new()
    }

    #[must_use]
    pub fn point(range: f32) -> Self {
        Self {
            kind: LightKind::Point { range },
            ..Self::new()
        }
    }

    #[must_use]
    pub fn spot(range: f32, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            kind: LightKind::Spot {
                range,
                inner_angle,
                outer_angle,
            },
            ..Self::new()
        }
    }

    /// Count of transform notifications heard since attach.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl ComponentHooks for LightComponent {
    fn on_transform_changed(&mut self, _change: TransformChange) {
        self.revision += 1;
    }

    fn copy_state_from(&mut self, source: &ComponentKind) -> bool {
        let ComponentKind::Light(src) = source else {
            return false;
        };
        self.color = src.color;
        self.intensity = src.intensity;
        self.kind = src.kind;
        self.cast_shadows = src.cast_shadows;
        true
    }

    fn default_notify_mask(&self) -> TransformChange {
        TransformChange::TRANSFORM | TransformChange::PARENT
    }
}
