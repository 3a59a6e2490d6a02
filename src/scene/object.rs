//! Scene object: one node of the spatial hierarchy.
//!
//! # Design Principles
//!
//! - The node keeps only the data traversed on the hot paths: hierarchy
//!   links, the transform with its caches, and the attached component
//!   handles. Component payloads live in the registry's component map.
//! - Hierarchy links and policy fields are `pub(crate)`: every structural
//!   or spatial mutation flows through [`Scene`](crate::scene::Scene) so
//!   invalidation, mobility gating and notification fan-out stay in sync.
//! - Child and component lists are inlined small vectors; typical nodes
//!   have a handful of each.

use glam::Vec3;
use rand::RngExt;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::registry::{ComponentHandle, ObjectHandle};
use crate::scene::transform::Transform;

/// Per-node policy governing how transform edits and parent motion apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mobility {
    /// Follows its parent chain; local edits allowed.
    #[default]
    Movable,
    /// Pinned in place: local edits are no-ops and the world matrix
    /// degenerates to the local matrix, ignoring parent motion.
    Immovable,
    /// Same transform behavior as [`Immovable`](Mobility::Immovable);
    /// additionally a hint to collaborators that the node never moves.
    Static,
}

/// A node in the spatial hierarchy.
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Display name; not required to be unique.
    pub name: String,
    uuid: Uuid,
    /// Arbitrary display color assigned at creation (editor/debug tint).
    color_tag: Vec3,
    pub(crate) instance_id: u64,

    pub(crate) parent: Option<ObjectHandle>,
    pub(crate) children: SmallVec<[ObjectHandle; 4]>,
    pub(crate) components: SmallVec<[ComponentHandle; 4]>,

    pub(crate) transform: Transform,
    pub(crate) mobility: Mobility,

    pub(crate) active_self: bool,
    pub(crate) active_hierarchy: bool,
    pub(crate) pending_destroy: bool,
}

impl SceneObject {
    /// Builds a detached node with a fresh UUID and a random color tag.
    ///
    /// The instance id is assigned when the scene registers the node.
    #[must_use]
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let mut rng = rand::rng();
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
            color_tag: Vec3::new(rng.random(), rng.random(), rng.random()),
            instance_id: 0,
            parent: None,
            children: SmallVec::new(),
            components: SmallVec::new(),
            transform: Transform::new(),
            mobility: Mobility::default(),
            active_self: true,
            active_hierarchy: true,
            pending_destroy: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[inline]
    #[must_use]
    pub fn color_tag(&self) -> Vec3 {
        self.color_tag
    }

    /// Monotonic id issued at registration; unique for the scene's lifetime.
    #[inline]
    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Parent node handle (`None` for root nodes).
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ObjectHandle> {
        self.parent
    }

    /// Read-only view of the child handles, in attachment order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ObjectHandle] {
        &self.children
    }

    /// Read-only view of the attached component handles, in attachment
    /// order. This order is the notification delivery order.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[ComponentHandle] {
        &self.components
    }

    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    #[must_use]
    pub fn mobility(&self) -> Mobility {
        self.mobility
    }

    /// The node's own activation flag, ignoring ancestors.
    #[inline]
    #[must_use]
    pub fn is_active_self(&self) -> bool {
        self.active_self
    }

    /// Derived activation: `active_self` and every ancestor's too.
    #[inline]
    #[must_use]
    pub fn is_active_in_hierarchy(&self) -> bool {
        self.active_hierarchy
    }

    /// `true` once the node is queued for the end-of-frame destroy sweep.
    #[inline]
    #[must_use]
    pub fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }
}
