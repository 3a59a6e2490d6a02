//! The scene graph: objects, components, hierarchy and lazy transforms.
//!
//! # Overview
//!
//! [`Scene`] owns the [`Registry`] plus the structure built on top of it:
//! the root list, the component factory table, the skybox singleton slot
//! and the scene-wide signals. Every structural or transform mutation goes
//! through a `Scene` method taking handles; objects and components never
//! mutate each other directly.
//!
//! # Laziness
//!
//! Transform writes are cheap: they update TRS fields, set dirty bits and
//! fan out a notification. No matrix is recomputed during a write. Reads
//! (`local_matrix`, `world_matrix`, `world_position`,
//! [`Scene::update_world_matrices`]) are the only recompute triggers and
//! clean exactly the stale part of the ancestor chain.
//!
//! # Destruction
//!
//! `destroy_object` / `destroy_component` detach immediately and either
//! tear down on the spot or queue the handle for the [`Scene::end_frame`]
//! sweep. Teardown is deepest-first and runs each component's
//! `on_destroyed` exactly once before the handle stops resolving.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine3A, Mat4, Quat, Vec3};
use smallvec::SmallVec;

use crate::component::{
    Aabb, Component, ComponentEvent, ComponentFactories, ComponentKind, ComponentTypeId,
    SimulationFlags,
};
use crate::errors::{Result, SceneError};
use crate::events::Signal;
use crate::registry::{ComponentHandle, ObjectHandle, Pending, Registry};
use crate::scene::object::{Mobility, SceneObject};
use crate::scene::propagation;
use crate::scene::transform::{Transform, TransformChange, TransformDirty};
use crate::scene::wrapper::SceneObjectMut;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Counters for transform cache recomputations.
///
/// Recomputation only ever happens on reads, so these make the lazy-cache
/// behavior observable: a burst of writes followed by one read shows up as
/// exactly one world recompute per stale ancestor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub local_recomputes: u64,
    pub world_recomputes: u64,
}

/// Scene-wide structural signals.
///
/// `component_created` fires after a component is attached and created;
/// `component_destroyed` fires after `on_destroyed`, while the handle
/// still resolves.
#[derive(Default)]
pub struct SceneEvents {
    pub component_created: Signal<ComponentEvent>,
    pub component_destroyed: Signal<ComponentEvent>,
}

/// The scene graph.
pub struct Scene {
    id: u32,
    registry: Registry,
    /// Objects with no parent, in creation order.
    roots: Vec<ObjectHandle>,
    events: SceneEvents,
    factories: ComponentFactories,
    sim_flags: SimulationFlags,
    /// Live skybox component, if any. At most one per scene.
    skybox: Option<ComponentHandle>,
    /// Scene-wide stamp for transform notification deliveries.
    notify_serial: u64,
    stats: SceneStats,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            registry: Registry::new(),
            roots: Vec::new(),
            events: SceneEvents::default(),
            factories: ComponentFactories::with_builtin(),
            sim_flags: SimulationFlags::empty(),
            skybox: None,
            notify_serial: 0,
            stats: SceneStats::default(),
        }
    }

    /// Process-unique scene id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    // ========================================================================
    // Object management
    // ========================================================================

    /// Creates an empty root object named "Object".
    pub fn create_object(&mut self) -> ObjectHandle {
        self.create_object_with_name("Object")
    }

    pub fn create_object_with_name(&mut self, name: impl Into<String>) -> ObjectHandle {
        let handle = self.registry.register_object(SceneObject::new(name));
        self.roots.push(handle);
        handle
    }

    /// Starts a configured object build; see [`ObjectBuilder`].
    pub fn build_object(&mut self, name: impl Into<String>) -> ObjectBuilder<'_> {
        ObjectBuilder::new(self, name)
    }

    #[inline]
    #[must_use]
    pub fn object(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.registry.object(handle)
    }

    /// Mutable object access. Hierarchy links, transform and activation are
    /// not reachable this way; use the `Scene` operations so the dirty and
    /// notification bookkeeping stays consistent.
    #[inline]
    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        self.registry.object_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn component(&self, handle: ComponentHandle) -> Option<&Component> {
        self.registry.component(handle)
    }

    #[inline]
    pub fn component_mut(&mut self, handle: ComponentHandle) -> Option<&mut Component> {
        self.registry.component_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[ObjectHandle] {
        &self.roots
    }

    /// Chainable mutator for one object; stale handles make every call a
    /// silent no-op.
    pub fn edit(&mut self, handle: ObjectHandle) -> SceneObjectMut<'_> {
        SceneObjectMut::new(self, handle)
    }

    pub fn set_name(&mut self, handle: ObjectHandle, name: impl Into<String>) {
        if let Some(object) = self.registry.object_mut(handle) {
            object.name = name.into();
        }
    }

    #[must_use]
    pub fn name(&self, handle: ObjectHandle) -> Option<&str> {
        self.registry.object(handle).map(|object| object.name.as_str())
    }

    /// First object with the given name, in registry order.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<ObjectHandle> {
        self.registry
            .iter_objects()
            .find_map(|(handle, object)| (object.name == name).then_some(handle))
    }

    /// `root` and its descendants in depth-first preorder.
    #[must_use]
    pub fn collect_subtree(&self, root: ObjectHandle) -> Vec<ObjectHandle> {
        propagation::collect_subtree(&self.registry.objects, root)
    }

    /// Destroys an object and its whole subtree.
    ///
    /// Detaches from the parent (or root list) immediately in both modes.
    /// `immediate` tears the subtree down now, deepest-first; otherwise the
    /// handle is queued and swept by [`Scene::end_frame`], staying
    /// resolvable but flagged until then. Destroying an already-destroyed
    /// handle is a logged no-op.
    pub fn destroy_object(&mut self, handle: ObjectHandle, immediate: bool) {
        if !self.registry.contains_object(handle) {
            log::debug!("destroy_object on a stale handle");
            return;
        }
        self.detach_from_hierarchy(handle);
        if immediate {
            self.teardown_subtree(handle);
        } else {
            self.registry.queue_destroy_object(handle);
        }
    }

    /// Deep-copies `source` and its subtree; the copy becomes a new root.
    ///
    /// Name, mobility, local transform and activation are copied per node;
    /// components are re-created through the factory table and their
    /// type-specific state copied over, running the full attach lifecycle.
    /// A component that cannot be cloned (a second skybox, an unregistered
    /// type) is skipped with a debug log rather than failing the clone.
    pub fn clone_object(&mut self, source: ObjectHandle) -> Result<ObjectHandle> {
        if !self.registry.contains_object(source) {
            return Err(SceneError::StaleObject(source));
        }
        let copy_root = self.clone_one(source, None);

        let mut stack: Vec<(ObjectHandle, ObjectHandle)> = self.registry.objects[source]
            .children
            .iter()
            .rev()
            .map(|&child| (child, copy_root))
            .collect();
        while let Some((src_child, new_parent)) = stack.pop() {
            let copy = self.clone_one(src_child, Some(new_parent));
            stack.extend(
                self.registry.objects[src_child]
                    .children
                    .iter()
                    .rev()
                    .map(|&child| (child, copy)),
            );
        }
        Ok(copy_root)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Moves `child` under `parent` (`None` makes it a root).
    ///
    /// Rejected with a warning: self-parenting, a stale parent, and any
    /// reparent that would create a cycle. Re-attaching to the current
    /// parent is a no-op.
    ///
    /// With `keep_world` the world pose is preserved by re-deriving the
    /// local transform against the new parent; non-movable nodes always
    /// keep their world pose regardless of the flag. Fans out
    /// `PARENT | TRANSFORM` and re-derives hierarchy activation under the
    /// new parent.
    pub fn set_parent(
        &mut self,
        child: ObjectHandle,
        parent: Option<ObjectHandle>,
        keep_world: bool,
    ) {
        let Some(object) = self.registry.object(child) else {
            return;
        };
        if let Some(p) = parent {
            if p == child {
                log::warn!("Cannot parent '{}' to itself", object.name);
                return;
            }
            if !self.registry.contains_object(p) {
                log::warn!("Cannot attach '{}' to a stale parent handle", object.name);
                return;
            }
            if self.is_ancestor_of(child, p) {
                log::warn!(
                    "Rejected reparent of '{}': would create a hierarchy cycle",
                    object.name
                );
                return;
            }
        }
        if object.parent == parent {
            return;
        }
        let mobility = object.mobility;

        // Non-movable nodes do not follow a parent, so their world pose is
        // kept unconditionally.
        let keep = keep_world || mobility != Mobility::Movable;
        let snapshot = keep.then(|| {
            propagation::ensure_world_matrix(&mut self.registry.objects, &mut self.stats, child)
        });

        self.detach_from_hierarchy(child);
        match parent {
            Some(p) => {
                self.registry.objects[p].children.push(child);
                self.registry.objects[child].parent = Some(p);
            }
            None => self.roots.push(child),
        }

        if let Some(world) = snapshot {
            let parent_world = match parent {
                Some(p) if mobility == Mobility::Movable => propagation::ensure_world_matrix(
                    &mut self.registry.objects,
                    &mut self.stats,
                    p,
                ),
                _ => Affine3A::IDENTITY,
            };
            self.registry.objects[child]
                .transform
                .apply_local_matrix(parent_world.inverse() * world);
        } else {
            self.registry.objects[child]
                .transform
                .dirty
                .insert(TransformDirty::WORLD);
        }

        self.notify(child, TransformChange::PARENT | TransformChange::TRANSFORM);
        propagation::refresh_activation(
            &mut self.registry.objects,
            &mut self.registry.components,
            child,
        );
    }

    /// True when `ancestor` appears on `node`'s parent chain.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: ObjectHandle, node: ObjectHandle) -> bool {
        let mut current = self.registry.object(node).and_then(|object| object.parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.registry.object(handle).and_then(|object| object.parent);
        }
        false
    }

    // ========================================================================
    // Transform writes (local space)
    // ========================================================================

    pub fn set_position(&mut self, handle: ObjectHandle, position: Vec3) {
        self.mutate_local(handle, |t| t.position = position);
    }

    pub fn set_rotation(&mut self, handle: ObjectHandle, rotation: Quat) {
        self.mutate_local(handle, |t| t.rotation = rotation);
    }

    pub fn set_rotation_euler(&mut self, handle: ObjectHandle, x: f32, y: f32, z: f32) {
        self.mutate_local(handle, |t| t.set_rotation_euler(x, y, z));
    }

    pub fn set_scale(&mut self, handle: ObjectHandle, scale: Vec3) {
        self.mutate_local(handle, |t| t.scale = scale);
    }

    pub fn translate(&mut self, handle: ObjectHandle, delta: Vec3) {
        self.mutate_local(handle, |t| t.position += delta);
    }

    /// Applies `delta` in the object's local space.
    pub fn rotate(&mut self, handle: ObjectHandle, delta: Quat) {
        self.mutate_local(handle, |t| t.rotation = t.rotation * delta);
    }

    /// Points the local -Z axis at `target`. No-op when the direction is
    /// degenerate (zero length or collinear with `up`).
    pub fn look_at(&mut self, handle: ObjectHandle, target: Vec3, up: Vec3) {
        self.mutate_local(handle, |t| t.look_at(target, up));
    }

    // ========================================================================
    // Transform writes (world space)
    // ========================================================================

    /// Sets the world-space position by converting against the parent's
    /// freshly recomputed world transform.
    pub fn set_world_position(&mut self, handle: ObjectHandle, position: Vec3) {
        let Some(parent) = self.movable_parent(handle) else {
            return;
        };
        let local = match parent {
            Some(p) => {
                let parent_world =
                    propagation::ensure_world_matrix(&mut self.registry.objects, &mut self.stats, p);
                parent_world.inverse().transform_point3(position)
            }
            None => position,
        };
        self.mutate_local(handle, |t| t.position = local);
    }

    pub fn set_world_rotation(&mut self, handle: ObjectHandle, rotation: Quat) {
        let Some(parent) = self.movable_parent(handle) else {
            return;
        };
        let local = match parent {
            Some(p) => {
                let parent_world =
                    propagation::ensure_world_matrix(&mut self.registry.objects, &mut self.stats, p);
                let (_, parent_rotation, _) = parent_world.to_scale_rotation_translation();
                parent_rotation.inverse() * rotation
            }
            None => rotation,
        };
        self.mutate_local(handle, |t| t.rotation = local);
    }

    /// Sets the world-space scale. Componentwise against the parent scale;
    /// exact only while the hierarchy stays shear-free.
    pub fn set_world_scale(&mut self, handle: ObjectHandle, scale: Vec3) {
        let Some(parent) = self.movable_parent(handle) else {
            return;
        };
        let local = match parent {
            Some(p) => {
                let parent_world =
                    propagation::ensure_world_matrix(&mut self.registry.objects, &mut self.stats, p);
                let (parent_scale, _, _) = parent_world.to_scale_rotation_translation();
                scale / parent_scale
            }
            None => scale,
        };
        self.mutate_local(handle, |t| t.scale = local);
    }

    /// Parent handle of a live, movable object; `None` means the write
    /// must be dropped (stale handle or non-movable target).
    fn movable_parent(&self, handle: ObjectHandle) -> Option<Option<ObjectHandle>> {
        let object = self.registry.object(handle)?;
        (object.mobility == Mobility::Movable).then_some(object.parent)
    }

    // ========================================================================
    // Transform reads (the recompute triggers)
    // ========================================================================

    #[must_use]
    pub fn position(&self, handle: ObjectHandle) -> Option<Vec3> {
        self.registry.object(handle).map(|o| o.transform.position())
    }

    #[must_use]
    pub fn rotation(&self, handle: ObjectHandle) -> Option<Quat> {
        self.registry.object(handle).map(|o| o.transform.rotation())
    }

    #[must_use]
    pub fn rotation_euler(&self, handle: ObjectHandle) -> Option<Vec3> {
        self.registry
            .object(handle)
            .map(|o| o.transform.rotation_euler())
    }

    #[must_use]
    pub fn scale(&self, handle: ObjectHandle) -> Option<Vec3> {
        self.registry.object(handle).map(|o| o.transform.scale())
    }

    /// Local matrix, recomputed from TRS if stale.
    pub fn local_matrix(&mut self, handle: ObjectHandle) -> Option<Affine3A> {
        let object = self.registry.object_mut(handle)?;
        if object.transform.refresh_local() {
            self.stats.local_recomputes += 1;
        }
        Some(object.transform.local_matrix)
    }

    /// World matrix, lazily recomputing the stale part of the ancestor
    /// chain.
    pub fn world_matrix(&mut self, handle: ObjectHandle) -> Option<Affine3A> {
        if !self.registry.contains_object(handle) {
            return None;
        }
        Some(propagation::ensure_world_matrix(
            &mut self.registry.objects,
            &mut self.stats,
            handle,
        ))
    }

    pub fn world_position(&mut self, handle: ObjectHandle) -> Option<Vec3> {
        self.world_matrix(handle).map(|m| m.translation.into())
    }

    pub fn world_rotation(&mut self, handle: ObjectHandle) -> Option<Quat> {
        self.world_matrix(handle)
            .map(|m| m.to_scale_rotation_translation().1)
    }

    /// Recomputes every stale matrix in the scene in one top-down pass.
    /// The bulk read trigger for frame extraction.
    pub fn update_world_matrices(&mut self) {
        let mut stack: Vec<(ObjectHandle, Affine3A)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Affine3A::IDENTITY))
            .collect();
        while let Some((handle, parent_world)) = stack.pop() {
            let object = &mut self.registry.objects[handle];
            if object.transform.refresh_local() {
                self.stats.local_recomputes += 1;
            }
            let world = if object.transform.dirty.contains(TransformDirty::WORLD) {
                let world = if object.mobility == Mobility::Movable {
                    parent_world * object.transform.local_matrix
                } else {
                    object.transform.local_matrix
                };
                object.transform.install_world(world);
                self.stats.world_recomputes += 1;
                world
            } else {
                object.transform.world_matrix
            };
            for &child in object.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    // ========================================================================
    // Mobility and activation
    // ========================================================================

    /// Changes the mobility policy.
    ///
    /// Crossing the movable boundary redefines the node's world matrix
    /// (parent-chained vs. plain local), so the node's world cache goes
    /// stale. A downgrade from `Movable` additionally marks movable
    /// descendants stale without advertising motion: it fans out
    /// `MOBILITY` alone. An upgrade to `Movable` fans out
    /// `TRANSFORM | MOBILITY` and lets the fan-out do the marking.
    pub fn set_mobility(&mut self, handle: ObjectHandle, mobility: Mobility) {
        let Some(object) = self.registry.object_mut(handle) else {
            return;
        };
        let previous = object.mobility;
        if previous == mobility {
            return;
        }
        object.mobility = mobility;

        let was_movable = previous == Mobility::Movable;
        let now_movable = mobility == Mobility::Movable;
        if was_movable != now_movable {
            object.transform.dirty.insert(TransformDirty::WORLD);
        }
        if was_movable && !now_movable {
            propagation::mark_subtree_world_dirty(&mut self.registry.objects, handle);
        }
        let change = if now_movable {
            TransformChange::TRANSFORM | TransformChange::MOBILITY
        } else {
            TransformChange::MOBILITY
        };
        self.notify(handle, change);
    }

    /// Sets the object's own active flag and re-derives the subtree's
    /// hierarchy activation, driving component enable/disable transitions.
    pub fn set_active(&mut self, handle: ObjectHandle, active: bool) {
        let Some(object) = self.registry.object_mut(handle) else {
            return;
        };
        if object.active_self == active {
            return;
        }
        object.active_self = active;
        propagation::refresh_activation(
            &mut self.registry.objects,
            &mut self.registry.components,
            handle,
        );
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches `kind` to `owner`: registers, runs `instantiate` and
    /// `on_created`, fires `component_created`, then enables immediately
    /// when the owner hierarchy is active. `None` on a stale owner or a
    /// second skybox, logged.
    pub fn add_component(
        &mut self,
        owner: ObjectHandle,
        kind: ComponentKind,
    ) -> Option<ComponentHandle> {
        let handle = self.register_attach(owner, kind)?;
        self.activate_component(handle);
        Some(handle)
    }

    /// Attaches a factory-built component of `type_id`.
    pub fn add_component_of_type(
        &mut self,
        owner: ObjectHandle,
        type_id: ComponentTypeId,
    ) -> Option<ComponentHandle> {
        let Some(kind) = self.factories.create(type_id) else {
            log::warn!("No factory registered for component type {type_id:?}");
            return None;
        };
        self.add_component(owner, kind)
    }

    /// Destroys a component; immediate or queued for [`Scene::end_frame`].
    pub fn destroy_component(&mut self, handle: ComponentHandle, immediate: bool) {
        if !self.registry.contains_component(handle) {
            log::debug!("destroy_component on a stale handle");
            return;
        }
        if immediate {
            self.teardown_component(handle, true);
        } else {
            self.registry.queue_destroy_component(handle);
        }
    }

    /// Clones `source` onto `target`: a fresh component of the same type
    /// is attached through the factory table, the source's type-specific
    /// state and notification settings are copied, and the copy runs the
    /// full attach lifecycle. `suffix` is appended to the source's name.
    /// Caches and renderer proxies are never copied.
    pub fn clone_component(
        &mut self,
        source: ComponentHandle,
        target: ObjectHandle,
        suffix: &str,
    ) -> Result<ComponentHandle> {
        let Some(source_component) = self.registry.component(source) else {
            return Err(SceneError::StaleComponent(source));
        };
        let type_id = source_component.type_id();
        let source_name = source_component.name.clone();
        let notify_mask = source_component.notify_mask;
        let run_flags = source_component.run_flags;
        let source_kind = source_component.kind.clone();

        if !self.registry.contains_object(target) {
            return Err(SceneError::StaleObject(target));
        }
        let Some(fresh) = self.factories.create(type_id) else {
            return Err(SceneError::UnknownComponentType(type_id));
        };
        let Some(handle) = self.register_attach(target, fresh) else {
            return Err(SceneError::SkyboxAlreadyPresent);
        };

        let mut mismatch = None;
        if let Some(component) = self.registry.component_mut(handle) {
            if component.kind.copy_state_from(&source_kind) {
                component.name = format!("{source_name}{suffix}");
                component.notify_mask = notify_mask;
                component.run_flags = run_flags;
            } else {
                mismatch = Some(component.type_id());
            }
        }
        if let Some(expected) = mismatch {
            // A factory override produced a different kind than the id
            // advertises; back the attach out.
            self.teardown_component(handle, true);
            return Err(SceneError::ComponentTypeMismatch {
                expected,
                found: type_id,
            });
        }

        self.activate_component(handle);
        Ok(handle)
    }

    /// First component of `type_id` on `owner`, in attachment order.
    #[must_use]
    pub fn component_of_type(
        &self,
        owner: ObjectHandle,
        type_id: ComponentTypeId,
    ) -> Option<ComponentHandle> {
        let object = self.registry.object(owner)?;
        object.components.iter().copied().find(|&handle| {
            self.registry
                .component(handle)
                .is_some_and(|component| component.type_id() == type_id)
        })
    }

    /// Asks the component to refresh its renderer-facing cached state.
    pub fn mark_component_dirty(&mut self, handle: ComponentHandle) {
        if let Some(component) = self.registry.component_mut(handle) {
            component.kind.mark_dirty();
        }
    }

    /// View matrix of a camera component, recomputed only when the owner's
    /// world transform changed since the last call. `None` unless `handle`
    /// is a live camera with a live owner.
    pub fn camera_view_matrix(&mut self, handle: ComponentHandle) -> Option<Mat4> {
        let component = self.registry.component(handle)?;
        if component.type_id() != ComponentTypeId::Camera {
            return None;
        }
        let owner = component.owner;
        if !self.registry.contains_object(owner) {
            return None;
        }
        let world =
            propagation::ensure_world_matrix(&mut self.registry.objects, &mut self.stats, owner);
        match self.registry.component_mut(handle).map(|c| c.kind_mut()) {
            Some(ComponentKind::Camera(camera)) => Some(camera.view_matrix(world)),
            _ => None,
        }
    }

    /// World-space bounds of a mesh renderer component, same lazy protocol
    /// as [`Scene::camera_view_matrix`].
    pub fn mesh_world_bounds(&mut self, handle: ComponentHandle) -> Option<Aabb> {
        let component = self.registry.component(handle)?;
        if component.type_id() != ComponentTypeId::MeshRenderer {
            return None;
        }
        let owner = component.owner;
        if !self.registry.contains_object(owner) {
            return None;
        }
        let world =
            propagation::ensure_world_matrix(&mut self.registry.objects, &mut self.stats, owner);
        match self.registry.component_mut(handle).map(|c| c.kind_mut()) {
            Some(ComponentKind::MeshRenderer(mesh)) => Some(mesh.world_bounds(world)),
            _ => None,
        }
    }

    /// The scene's skybox component, if one is alive.
    #[inline]
    #[must_use]
    pub fn skybox(&self) -> Option<ComponentHandle> {
        self.skybox
    }

    // ========================================================================
    // Frame boundary
    // ========================================================================

    /// Sweeps the deferred-destruction queue. Each queued handle is torn
    /// down at most once; entries already gone (destroyed immediately in
    /// the meantime, or part of an earlier subtree in the same sweep) are
    /// skipped.
    pub fn end_frame(&mut self) {
        for entry in self.registry.take_pending() {
            match entry {
                Pending::Object(handle) => {
                    if self.registry.contains_object(handle) {
                        self.teardown_subtree(handle);
                    }
                }
                Pending::Component(handle) => {
                    if self.registry.contains_component(handle) {
                        self.teardown_component(handle, true);
                    }
                }
            }
        }
    }

    // ========================================================================
    // Settings, events, statistics
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn events(&self) -> &SceneEvents {
        &self.events
    }

    #[inline]
    #[must_use]
    pub fn simulation_flags(&self) -> SimulationFlags {
        self.sim_flags
    }

    /// Sets which simulation subsystems run; gates notification delivery
    /// to components without `ALWAYS_RUN`.
    pub fn set_simulation_flags(&mut self, flags: SimulationFlags) {
        self.sim_flags = flags;
    }

    #[inline]
    #[must_use]
    pub fn factories(&self) -> &ComponentFactories {
        &self.factories
    }

    #[inline]
    pub fn factories_mut(&mut self) -> &mut ComponentFactories {
        &mut self.factories
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SceneStats::default();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Shared write path for local-space transform edits: resolve, gate on
    /// mobility, edit, set dirty bits, fan out `TRANSFORM`. Stale handles
    /// and non-movable targets drop the write silently; this is the hot
    /// path.
    fn mutate_local(&mut self, handle: ObjectHandle, edit: impl FnOnce(&mut Transform)) {
        let Some(object) = self.registry.object_mut(handle) else {
            return;
        };
        if object.mobility != Mobility::Movable {
            return;
        }
        edit(&mut object.transform);
        object
            .transform
            .dirty
            .insert(TransformDirty::LOCAL | TransformDirty::WORLD);
        self.notify(handle, TransformChange::TRANSFORM);
    }

    fn notify(&mut self, start: ObjectHandle, flags: TransformChange) {
        propagation::fan_out_transform_change(
            &mut self.registry.objects,
            &mut self.registry.components,
            start,
            flags,
            self.sim_flags,
            &mut self.notify_serial,
        );
    }

    /// Unlinks the object from its parent's child list, or from the root
    /// list when it has no parent.
    fn detach_from_hierarchy(&mut self, handle: ObjectHandle) {
        let Some(object) = self.registry.object_mut(handle) else {
            return;
        };
        match object.parent.take() {
            Some(parent) => {
                if let Some(parent_object) = self.registry.object_mut(parent) {
                    parent_object.children.retain(|child| *child != handle);
                }
            }
            None => self.roots.retain(|&root| root != handle),
        }
    }

    /// Tears down a detached subtree deepest-first: components first per
    /// node, then the object entry itself.
    fn teardown_subtree(&mut self, root: ObjectHandle) {
        let order = propagation::collect_subtree(&self.registry.objects, root);
        for &handle in order.iter().rev() {
            let components: SmallVec<[ComponentHandle; 4]> = match self.registry.object(handle) {
                Some(object) => object.components.iter().copied().collect(),
                None => continue,
            };
            for component in components {
                self.teardown_component(component, false);
            }
            if let Some(object) = self.registry.object_mut(handle) {
                object.components.clear();
                object.children.clear();
                object.parent = None;
            }
            self.registry.unregister_object(handle);
        }
    }

    /// Final component teardown: `on_destroyed` exactly once, owner list
    /// and skybox slot maintenance, `component_destroyed` signal, then
    /// unregistration. `detach_from_owner` is false when the owner's whole
    /// component list is being cleared anyway.
    fn teardown_component(&mut self, handle: ComponentHandle, detach_from_owner: bool) {
        let Some(component) = self.registry.component_mut(handle) else {
            return;
        };
        component.finish_destroy();
        let owner = component.owner;
        let type_id = component.type_id();

        if detach_from_owner
            && let Some(object) = self.registry.object_mut(owner)
        {
            object.components.retain(|c| *c != handle);
        }
        if self.skybox == Some(handle) {
            self.skybox = None;
        }
        self.events.component_destroyed.emit(&ComponentEvent {
            object: owner,
            component: handle,
            type_id,
        });
        self.registry.unregister_component(handle);
    }

    /// Registration half of attachment: slot the component in, link it to
    /// the owner, claim the skybox slot, run the create transitions and
    /// fire `component_created`.
    fn register_attach(
        &mut self,
        owner: ObjectHandle,
        kind: ComponentKind,
    ) -> Option<ComponentHandle> {
        if !self.registry.contains_object(owner) {
            log::warn!("add_component on a stale object handle");
            return None;
        }
        let type_id = kind.type_id();
        if type_id == ComponentTypeId::Skybox && self.skybox.is_some() {
            log::debug!("Scene already has a skybox; attach rejected");
            return None;
        }

        let handle = self.registry.register_component(Component::new(owner, kind));
        if let Some(object) = self.registry.object_mut(owner) {
            object.components.push(handle);
        }
        if type_id == ComponentTypeId::Skybox {
            self.skybox = Some(handle);
        }
        if let Some(component) = self.registry.component_mut(handle) {
            component.begin_life();
        }
        self.events.component_created.emit(&ComponentEvent {
            object: owner,
            component: handle,
            type_id,
        });
        Some(handle)
    }

    /// Enable half of attachment: components on an actively-hierarchied
    /// owner initialize and enable immediately.
    fn activate_component(&mut self, handle: ComponentHandle) {
        let Some(component) = self.registry.component(handle) else {
            return;
        };
        let owner = component.owner;
        let active = self
            .registry
            .object(owner)
            .is_some_and(|object| object.active_hierarchy);
        if active && let Some(component) = self.registry.component_mut(handle) {
            component.enter_active();
        }
    }

    /// Copies one node (not its children) as a child of `parent`, or as a
    /// new root. Components are cloned through the normal clone path.
    fn clone_one(&mut self, source: ObjectHandle, parent: Option<ObjectHandle>) -> ObjectHandle {
        let src = &self.registry.objects[source];
        let mut object = SceneObject::new(src.name.clone());
        object.mobility = src.mobility;
        object.active_self = src.active_self;
        object.transform.position = src.transform.position();
        object.transform.rotation = src.transform.rotation();
        object.transform.scale = src.transform.scale();
        object
            .transform
            .dirty
            .insert(TransformDirty::LOCAL | TransformDirty::WORLD);
        let src_components: SmallVec<[ComponentHandle; 4]> =
            src.components.iter().copied().collect();

        let handle = self.registry.register_object(object);
        match parent {
            Some(p) => {
                self.registry.objects[p].children.push(handle);
                let parent_active = self.registry.objects[p].active_hierarchy;
                let object = &mut self.registry.objects[handle];
                object.parent = Some(p);
                object.active_hierarchy = parent_active && object.active_self;
            }
            None => {
                self.roots.push(handle);
                let object = &mut self.registry.objects[handle];
                object.active_hierarchy = object.active_self;
            }
        }

        for component in src_components {
            if let Err(err) = self.clone_component(component, handle, "") {
                log::debug!("Skipping component during clone: {err}");
            }
        }
        handle
    }
}

// ============================================================================
// ObjectBuilder
// ============================================================================

/// Fluent construction of a configured object.
///
/// The builder writes the initial pose directly, before registration, so
/// it also places `Immovable` and `Static` objects; mobility gating
/// applies to mutation of live objects, not construction.
///
/// ```rust,ignore
/// let pillar = scene
///     .build_object("Pillar")
///     .with_position(Vec3::new(4.0, 0.0, 0.0))
///     .with_mobility(Mobility::Static)
///     .with_parent(platform)
///     .build();
/// ```
pub struct ObjectBuilder<'a> {
    scene: &'a mut Scene,
    object: SceneObject,
    parent: Option<ObjectHandle>,
    touched: bool,
}

impl<'a> ObjectBuilder<'a> {
    fn new(scene: &'a mut Scene, name: impl Into<String>) -> Self {
        Self {
            scene,
            object: SceneObject::new(name),
            parent: None,
            touched: false,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.object.transform.position = position;
        self.touched = true;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.object.transform.rotation = rotation;
        self.touched = true;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.object.transform.scale = scale;
        self.touched = true;
        self
    }

    #[must_use]
    pub fn with_mobility(mut self, mobility: Mobility) -> Self {
        self.object.mobility = mobility;
        self
    }

    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.object.active_self = active;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ObjectHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Registers the object and links it into the hierarchy.
    pub fn build(self) -> ObjectHandle {
        let Self {
            scene,
            mut object,
            parent,
            touched,
        } = self;
        if touched {
            object
                .transform
                .dirty
                .insert(TransformDirty::LOCAL | TransformDirty::WORLD);
        }
        object.active_hierarchy = object.active_self;
        let handle = scene.registry.register_object(object);
        scene.roots.push(handle);
        if let Some(parent) = parent {
            scene.set_parent(handle, Some(parent), false);
        }
        handle
    }
}
