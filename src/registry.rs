//! Object registry and handles.
//!
//! Every [`SceneObject`] and [`Component`] lives in one of the registry's
//! slot maps; the generation-checked keys ([`ObjectHandle`],
//! [`ComponentHandle`]) are the only sanctioned way to reference them across
//! subsystem boundaries. Resolving a handle whose target was unregistered
//! yields `None`, never a dangling access, and a handle never resolves to a
//! different object than the one it was issued for.
//!
//! Destruction comes in two flavors:
//! - immediate: the entry is removed synchronously via `unregister_*`;
//! - deferred: the entry is flagged and queued via `queue_destroy_*`, stays
//!   resolvable until the owner drains the queue at its frame-boundary
//!   sweep, and is guaranteed to be torn down exactly once.
//!
//! All mutation goes through [`Scene`](crate::scene::Scene); the registry's
//! public surface is read-only.

use slotmap::{SlotMap, new_key_type};

use crate::component::Component;
use crate::scene::object::SceneObject;

new_key_type! {
    /// Generation-checked reference to a [`SceneObject`].
    pub struct ObjectHandle;
    /// Generation-checked reference to a [`Component`].
    pub struct ComponentHandle;
}

/// One deferred-destruction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pending {
    Object(ObjectHandle),
    Component(ComponentHandle),
}

/// Canonical storage for scene objects and components.
///
/// Owned by a [`Scene`](crate::scene::Scene); one registry per scene, passed
/// explicitly rather than living in process-wide state.
pub struct Registry {
    pub(crate) objects: SlotMap<ObjectHandle, SceneObject>,
    pub(crate) components: SlotMap<ComponentHandle, Component>,
    /// Issued once per registration, never reused.
    next_instance_id: u64,
    pending: Vec<Pending>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
            components: SlotMap::with_key(),
            next_instance_id: 1,
            pending: Vec::new(),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    pub(crate) fn register_object(&mut self, mut object: SceneObject) -> ObjectHandle {
        object.instance_id = self.issue_instance_id();
        self.objects.insert(object)
    }

    pub(crate) fn register_component(&mut self, mut component: Component) -> ComponentHandle {
        component.instance_id = self.issue_instance_id();
        self.components.insert(component)
    }

    fn issue_instance_id(&mut self) -> u64 {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }

    // ========================================================================
    // Resolution (the "object is gone" check)
    // ========================================================================

    /// Resolves an object handle. `None` is the canonical signal that the
    /// target was destroyed; callers must check before use.
    #[inline]
    #[must_use]
    pub fn object(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.objects.get(handle)
    }

    #[inline]
    pub(crate) fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        self.objects.get_mut(handle)
    }

    /// Resolves a component handle; `None` when the target was destroyed.
    #[inline]
    #[must_use]
    pub fn component(&self, handle: ComponentHandle) -> Option<&Component> {
        self.components.get(handle)
    }

    #[inline]
    pub(crate) fn component_mut(&mut self, handle: ComponentHandle) -> Option<&mut Component> {
        self.components.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains_object(&self, handle: ObjectHandle) -> bool {
        self.objects.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains_component(&self, handle: ComponentHandle) -> bool {
        self.components.contains_key(handle)
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Iterates all live objects in storage order.
    pub fn iter_objects(&self) -> impl Iterator<Item = (ObjectHandle, &SceneObject)> {
        self.objects.iter()
    }

    /// Iterates all live components in storage order.
    pub fn iter_components(&self) -> impl Iterator<Item = (ComponentHandle, &Component)> {
        self.components.iter()
    }

    // ========================================================================
    // Deferred destruction
    // ========================================================================

    /// Flags the object for teardown at the next sweep. Queueing the same
    /// handle twice enqueues it once; a stale handle is ignored.
    pub(crate) fn queue_destroy_object(&mut self, handle: ObjectHandle) {
        let Some(object) = self.objects.get_mut(handle) else {
            return;
        };
        if object.pending_destroy {
            return;
        }
        object.pending_destroy = true;
        self.pending.push(Pending::Object(handle));
    }

    /// Component counterpart of [`queue_destroy_object`].
    ///
    /// [`queue_destroy_object`]: Registry::queue_destroy_object
    pub(crate) fn queue_destroy_component(&mut self, handle: ComponentHandle) {
        let Some(component) = self.components.get_mut(handle) else {
            return;
        };
        if component.pending_destroy {
            return;
        }
        component.pending_destroy = true;
        self.pending.push(Pending::Component(handle));
    }

    /// Drains the deferred-destruction queue for the owner's sweep.
    pub(crate) fn take_pending(&mut self) -> Vec<Pending> {
        std::mem::take(&mut self.pending)
    }

    /// Number of entries currently queued for deferred destruction.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ========================================================================
    // Immediate removal
    // ========================================================================

    /// Removes the object entry. The caller must have torn down its owned
    /// sub-resources (children, components) beforehand.
    pub(crate) fn unregister_object(&mut self, handle: ObjectHandle) -> Option<SceneObject> {
        if let Some(object) = self.objects.get(handle)
            && !(object.children.is_empty() && object.components.is_empty())
        {
            log::error!(
                "Unregistering object '{}' with live children/components",
                object.name
            );
            debug_assert!(false, "object unregistered before its subtree was torn down");
        }
        self.objects.remove(handle)
    }

    pub(crate) fn unregister_component(&mut self, handle: ComponentHandle) -> Option<Component> {
        self.components.remove(handle)
    }
}
