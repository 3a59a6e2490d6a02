//! Local transform state and its matrix caches.
//!
//! Each [`SceneObject`](crate::scene::SceneObject) embeds a [`Transform`]
//! holding the authoritative TRS (translation/rotation/scale) plus two
//! cached matrices guarded by [`TransformDirty`] bits:
//!
//! - `LOCAL` is set on any TRS mutation and cleared when the local matrix
//!   is rebuilt from TRS on the next read.
//! - `WORLD` is set by local mutation, reparenting and mobility changes,
//!   and cleared when the scene recomputes the world matrix lazily.
//!
//! Writes never recompute; reads through the scene are the only
//! recomputation trigger. Mutation flows through
//! [`Scene`](crate::scene::Scene) so mobility gating and change fan-out
//! cannot be bypassed.

use bitflags::bitflags;
use glam::{Affine3A, EulerRot, Mat3, Quat, Vec3};

bitflags! {
    /// Staleness markers for the cached matrices.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct TransformDirty: u8 {
        /// `local_matrix` no longer matches the TRS fields.
        const LOCAL = 1 << 0;
        /// `world_matrix` no longer matches the transform chain.
        const WORLD = 1 << 1;
    }
}

bitflags! {
    /// Categories of change carried by a transform notification.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TransformChange: u8 {
        /// Spatial motion: the world matrix of the notified node changed.
        const TRANSFORM = 1 << 0;
        /// Structural change: the node or an ancestor was reparented.
        const PARENT = 1 << 1;
        /// The node's own mobility policy flipped.
        const MOBILITY = 1 << 2;
    }
}

/// TRS state with cached local/world matrices and dirty tracking.
#[derive(Debug, Clone)]
pub struct Transform {
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) scale: Vec3,

    // Matrix caches, valid iff the matching dirty bit is clear.
    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,
    pub(crate) dirty: TransformDirty,
}

impl Transform {
    /// Identity transform with clean caches.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            dirty: TransformDirty::empty(),
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Current rotation as XYZ-order Euler angles (radians).
    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Current cache staleness. Useful to observe the lazy protocol.
    #[inline]
    #[must_use]
    pub fn dirty_flags(&self) -> TransformDirty {
        self.dirty
    }

    // ========================================================================
    // Cache maintenance (scene internal)
    // ========================================================================

    /// Rebuilds `local_matrix` from TRS if it is stale.
    ///
    /// Returns `true` when a recompute actually happened.
    pub(crate) fn refresh_local(&mut self) -> bool {
        if !self.dirty.contains(TransformDirty::LOCAL) {
            return false;
        }
        self.local_matrix =
            Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        self.dirty.remove(TransformDirty::LOCAL);
        true
    }

    /// Installs a freshly recomputed world matrix and clears `WORLD`.
    pub(crate) fn install_world(&mut self, matrix: Affine3A) {
        self.world_matrix = matrix;
        self.dirty.remove(TransformDirty::WORLD);
    }

    /// Installs `matrix` as the local matrix and decomposes it back into
    /// the TRS fields (keep-world reparenting, physics sync).
    ///
    /// A matrix containing shear loses the sheared part in decomposition.
    pub(crate) fn apply_local_matrix(&mut self, matrix: Affine3A) {
        self.local_matrix = matrix;

        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.position = translation;

        // The local cache is exact by construction; the world cache is not.
        self.dirty.remove(TransformDirty::LOCAL);
        self.dirty.insert(TransformDirty::WORLD);
    }

    // ========================================================================
    // Mutation helpers (scene internal; gating and fan-out live in Scene)
    // ========================================================================

    pub(crate) fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Orients the transform so `-Z` faces `target` (parent space).
    ///
    /// Degenerate setups (target on the position, forward parallel to `up`)
    /// leave the rotation untouched.
    pub(crate) fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO || forward.cross(up).length_squared() < 1e-4 {
            return;
        }
        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward).normalize();
        let basis = Mat3::from_cols(right, new_up, -forward);
        self.rotation = Quat::from_mat3(&basis);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
