//! Change propagation through the hierarchy.
//!
//! Free functions over split borrows of the registry's slot maps, decoupled
//! from `Scene` to avoid borrow conflicts: notification fan-out, lazy world
//! matrix recomputation, subtree cache invalidation and activation
//! re-derivation. All walks are iterative with explicit stacks so deep
//! hierarchies cannot overflow the call stack.

use glam::Affine3A;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::component::{Component, SimulationFlags};
use crate::registry::{ComponentHandle, ObjectHandle};
use crate::scene::object::{Mobility, SceneObject};
use crate::scene::scene::SceneStats;
use crate::scene::transform::{TransformChange, TransformDirty};

/// Delivers a transform-change notification depth-first from `start`.
///
/// Per node, in order: the flags are adjusted for the node's mobility (a
/// non-movable node strips `TRANSFORM` — it still reports structural
/// changes but not motion), the node's components are notified in
/// attachment order, then children are visited with the remaining flags.
/// `MOBILITY` never crosses to children: it describes one node's own
/// policy flip. Recursion stops as soon as no flags remain.
///
/// Movable nodes reached by a `TRANSFORM` flag also get their world cache
/// marked stale; recomputation itself stays lazy.
///
/// Each delivery stamps the component with the next value of `serial`,
/// making the depth-first, components-before-children order observable.
pub(crate) fn fan_out_transform_change(
    objects: &mut SlotMap<ObjectHandle, SceneObject>,
    components: &mut SlotMap<ComponentHandle, Component>,
    start: ObjectHandle,
    flags: TransformChange,
    sim: SimulationFlags,
    serial: &mut u64,
) {
    let mut stack: Vec<(ObjectHandle, TransformChange)> = vec![(start, flags)];

    while let Some((handle, mut flags)) = stack.pop() {
        let Some(object) = objects.get_mut(handle) else {
            continue;
        };

        if object.mobility == Mobility::Movable {
            if flags.contains(TransformChange::TRANSFORM) {
                object.transform.dirty.insert(TransformDirty::WORLD);
            }
        } else {
            flags.remove(TransformChange::TRANSFORM);
        }
        if flags.is_empty() {
            continue;
        }

        for &component_handle in &object.components {
            let Some(component) = components.get_mut(component_handle) else {
                continue;
            };
            if !component.wants_transform_change(flags, sim) {
                continue;
            }
            *serial += 1;
            component.transform_serial = *serial;
            component.kind.on_transform_changed(flags);
        }

        let child_flags = flags - TransformChange::MOBILITY;
        if !child_flags.is_empty() {
            for &child in object.children.iter().rev() {
                stack.push((child, child_flags));
            }
        }
    }
}

/// Lazily recomputes and returns the world matrix of `handle`.
///
/// Climbs the stale part of the ancestor chain, then recomputes top-down
/// so every node multiplies against a valid parent cache. Nodes with a
/// clean `WORLD` bit are returned straight from cache; the chain stops at
/// non-movable nodes, whose world matrix is their local matrix.
///
/// `handle` must be live; internal callers resolve it beforehand.
pub(crate) fn ensure_world_matrix(
    objects: &mut SlotMap<ObjectHandle, SceneObject>,
    stats: &mut SceneStats,
    handle: ObjectHandle,
) -> Affine3A {
    let mut chain: SmallVec<[ObjectHandle; 8]> = SmallVec::new();
    let mut current = handle;
    loop {
        let object = &objects[current];
        if !object.transform.dirty.contains(TransformDirty::WORLD) {
            break;
        }
        chain.push(current);
        match object.parent {
            Some(parent) if object.mobility == Mobility::Movable => current = parent,
            _ => break,
        }
    }

    for &node in chain.iter().rev() {
        let parent_world = {
            let object = &objects[node];
            match object.parent {
                Some(parent) if object.mobility == Mobility::Movable => {
                    Some(objects[parent].transform.world_matrix)
                }
                _ => None,
            }
        };
        let object = &mut objects[node];
        if object.transform.refresh_local() {
            stats.local_recomputes += 1;
        }
        let world = match parent_world {
            Some(parent_world) => parent_world * object.transform.local_matrix,
            None => object.transform.local_matrix,
        };
        object.transform.install_world(world);
        stats.world_recomputes += 1;
    }

    objects[handle].transform.world_matrix
}

/// Marks the world caches of `root`'s movable descendants stale, without
/// notifying components.
///
/// Used when a node's world matrix changes for a reason that must not fan
/// out as motion (mobility downgrade): descendants chained through the node
/// still need their caches invalidated so lazy reads stay exact. Branches
/// behind a non-movable child are skipped; their worlds do not track
/// ancestors.
pub(crate) fn mark_subtree_world_dirty(
    objects: &mut SlotMap<ObjectHandle, SceneObject>,
    root: ObjectHandle,
) {
    let mut stack: SmallVec<[ObjectHandle; 16]> =
        objects[root].children.iter().copied().collect();
    while let Some(handle) = stack.pop() {
        let Some(object) = objects.get_mut(handle) else {
            continue;
        };
        if object.mobility != Mobility::Movable {
            continue;
        }
        object.transform.dirty.insert(TransformDirty::WORLD);
        stack.extend(object.children.iter().copied());
    }
}

/// Re-derives `active_hierarchy` over the subtree rooted at `root` and
/// drives the enable/disable lifecycle transitions of affected components.
///
/// A node whose derived flag is unchanged prunes its subtree: child flags
/// are a pure function of the parent flag and their own `active_self`.
/// Transitions fire depth-first, components before children, in attachment
/// order, matching transform notification order.
pub(crate) fn refresh_activation(
    objects: &mut SlotMap<ObjectHandle, SceneObject>,
    components: &mut SlotMap<ComponentHandle, Component>,
    root: ObjectHandle,
) {
    let parent_active = match objects[root].parent {
        Some(parent) => objects[parent].active_hierarchy,
        None => true,
    };

    let mut stack: Vec<(ObjectHandle, bool)> = vec![(root, parent_active)];
    while let Some((handle, parent_active)) = stack.pop() {
        let Some(object) = objects.get_mut(handle) else {
            continue;
        };
        let active = parent_active && object.active_self;
        if active == object.active_hierarchy {
            continue;
        }
        object.active_hierarchy = active;

        for &component_handle in &object.components {
            let Some(component) = components.get_mut(component_handle) else {
                continue;
            };
            if active {
                component.enter_active();
            } else {
                component.enter_inactive();
            }
        }

        for &child in object.children.iter().rev() {
            stack.push((child, active));
        }
    }
}

/// Collects `root` and its descendants in depth-first preorder.
///
/// Destruction walks this list in reverse (deepest first); stale handles
/// in child lists are skipped.
pub(crate) fn collect_subtree(
    objects: &SlotMap<ObjectHandle, SceneObject>,
    root: ObjectHandle,
) -> Vec<ObjectHandle> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(handle) = stack.pop() {
        let Some(object) = objects.get(handle) else {
            continue;
        };
        out.push(handle);
        stack.extend(object.children.iter().rev().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, LightComponent, RunFlags};
    use glam::Vec3;

    fn link(
        objects: &mut SlotMap<ObjectHandle, SceneObject>,
        parent: ObjectHandle,
        child: ObjectHandle,
    ) {
        objects[parent].children.push(child);
        objects[child].parent = Some(parent);
    }

    fn light_on(
        objects: &mut SlotMap<ObjectHandle, SceneObject>,
        components: &mut SlotMap<ComponentHandle, Component>,
        owner: ObjectHandle,
    ) -> ComponentHandle {
        let mut component = Component::new(owner, ComponentKind::Light(LightComponent::new()));
        component.run_flags = RunFlags::ALWAYS_RUN;
        let handle = components.insert(component);
        objects[owner].components.push(handle);
        handle
    }

    #[test]
    fn fan_out_orders_parent_before_child() {
        let mut objects: SlotMap<ObjectHandle, SceneObject> = SlotMap::with_key();
        let mut components: SlotMap<ComponentHandle, Component> = SlotMap::with_key();

        let root = objects.insert(SceneObject::new("root"));
        let child = objects.insert(SceneObject::new("child"));
        link(&mut objects, root, child);
        let on_root = light_on(&mut objects, &mut components, root);
        let on_child = light_on(&mut objects, &mut components, child);

        let mut serial = 0;
        fan_out_transform_change(
            &mut objects,
            &mut components,
            root,
            TransformChange::TRANSFORM,
            SimulationFlags::empty(),
            &mut serial,
        );

        assert_eq!(serial, 2);
        assert!(components[on_root].transform_serial() < components[on_child].transform_serial());
    }

    #[test]
    fn fan_out_strips_motion_at_immovable_nodes() {
        let mut objects: SlotMap<ObjectHandle, SceneObject> = SlotMap::with_key();
        let mut components: SlotMap<ComponentHandle, Component> = SlotMap::with_key();

        let root = objects.insert(SceneObject::new("root"));
        let pinned = objects.insert(SceneObject::new("pinned"));
        objects[pinned].mobility = Mobility::Immovable;
        link(&mut objects, root, pinned);
        let on_pinned = light_on(&mut objects, &mut components, pinned);

        let mut serial = 0;
        fan_out_transform_change(
            &mut objects,
            &mut components,
            root,
            TransformChange::TRANSFORM,
            SimulationFlags::empty(),
            &mut serial,
        );

        // Motion does not reach the pinned node's components or cache.
        assert_eq!(components[on_pinned].transform_serial(), 0);
        assert!(
            !objects[pinned]
                .transform
                .dirty_flags()
                .contains(TransformDirty::WORLD)
        );
    }

    #[test]
    fn ensure_world_recomputes_only_the_stale_chain() {
        let mut objects: SlotMap<ObjectHandle, SceneObject> = SlotMap::with_key();
        let root = objects.insert(SceneObject::new("root"));
        let mid = objects.insert(SceneObject::new("mid"));
        let leaf = objects.insert(SceneObject::new("leaf"));
        link(&mut objects, root, mid);
        link(&mut objects, mid, leaf);

        objects[root].transform.position = Vec3::new(1.0, 0.0, 0.0);
        objects[mid].transform.position = Vec3::new(0.0, 2.0, 0.0);
        objects[leaf].transform.position = Vec3::new(0.0, 0.0, 3.0);
        for handle in [root, mid, leaf] {
            objects[handle]
                .transform
                .dirty
                .insert(TransformDirty::LOCAL | TransformDirty::WORLD);
        }

        let mut stats = SceneStats::default();
        let world = ensure_world_matrix(&mut objects, &mut stats, leaf);
        assert_eq!(Vec3::from(world.translation), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(stats.world_recomputes, 3);

        // Second read is served from cache.
        let world = ensure_world_matrix(&mut objects, &mut stats, leaf);
        assert_eq!(Vec3::from(world.translation), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(stats.world_recomputes, 3);
    }

    #[test]
    fn collect_subtree_is_preorder() {
        let mut objects: SlotMap<ObjectHandle, SceneObject> = SlotMap::with_key();
        let root = objects.insert(SceneObject::new("root"));
        let a = objects.insert(SceneObject::new("a"));
        let b = objects.insert(SceneObject::new("b"));
        let a_child = objects.insert(SceneObject::new("a_child"));
        link(&mut objects, root, a);
        link(&mut objects, root, b);
        link(&mut objects, a, a_child);

        assert_eq!(collect_subtree(&objects, root), vec![root, a, a_child, b]);
    }
}
