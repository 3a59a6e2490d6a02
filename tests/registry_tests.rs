//! Registry / Handle Safety Tests
//!
//! Tests for:
//! - Handle resolution: live handles resolve, destroyed handles never do
//! - Instance ids: monotonic, never reused across destroy/create cycles
//! - Deferred destruction: flagged-but-resolvable until the end_frame sweep,
//!   queue deduplication, exactly-once teardown
//! - Registry counts and iteration

use vesper_scene::component::{ComponentKind, LightComponent, Lifecycle};
use vesper_scene::scene::Scene;

// ============================================================================
// Handle resolution
// ============================================================================

#[test]
fn registry_live_handle_resolves() {
    let mut scene = Scene::new();
    let handle = scene.create_object_with_name("Thing");
    assert!(scene.object(handle).is_some());
    assert_eq!(scene.object(handle).unwrap().name, "Thing");
}

#[test]
fn registry_destroyed_handle_never_resolves() {
    let mut scene = Scene::new();
    let handle = scene.create_object();
    scene.destroy_object(handle, true);
    assert!(scene.object(handle).is_none());
}

#[test]
fn registry_stale_handle_stays_stale_after_new_registrations() {
    let mut scene = Scene::new();
    let old = scene.create_object();
    scene.destroy_object(old, true);

    // Filling the freed slot must not resurrect the old handle.
    for _ in 0..8 {
        let _ = scene.create_object();
    }
    assert!(scene.object(old).is_none());
}

#[test]
fn registry_component_handle_goes_stale_with_owner() {
    let mut scene = Scene::new();
    let owner = scene.create_object();
    let light = scene
        .add_component(owner, ComponentKind::Light(LightComponent::new()))
        .unwrap();

    scene.destroy_object(owner, true);
    assert!(scene.component(light).is_none());
}

#[test]
fn registry_counts_track_population() {
    let mut scene = Scene::new();
    assert_eq!(scene.registry().object_count(), 0);

    let a = scene.create_object();
    let _b = scene.create_object();
    scene
        .add_component(a, ComponentKind::Light(LightComponent::new()))
        .unwrap();

    assert_eq!(scene.registry().object_count(), 2);
    assert_eq!(scene.registry().component_count(), 1);

    scene.destroy_object(a, true);
    assert_eq!(scene.registry().object_count(), 1);
    assert_eq!(scene.registry().component_count(), 0);
}

#[test]
fn registry_iterates_all_objects() {
    let mut scene = Scene::new();
    let _a = scene.create_object_with_name("A");
    let _b = scene.create_object_with_name("B");

    let names: Vec<_> = scene
        .registry()
        .iter_objects()
        .map(|(_, object)| object.name.clone())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"A".to_owned()));
    assert!(names.contains(&"B".to_owned()));
}

// ============================================================================
// Instance ids
// ============================================================================

#[test]
fn registry_instance_ids_are_monotonic() {
    let mut scene = Scene::new();
    let a = scene.create_object();
    let b = scene.create_object();

    let id_a = scene.object(a).unwrap().instance_id();
    let id_b = scene.object(b).unwrap().instance_id();
    assert!(id_a > 0);
    assert!(id_b > id_a);
}

#[test]
fn registry_instance_ids_never_reused() {
    let mut scene = Scene::new();
    let a = scene.create_object();
    let id_a = scene.object(a).unwrap().instance_id();
    scene.destroy_object(a, true);

    let b = scene.create_object();
    let id_b = scene.object(b).unwrap().instance_id();
    assert!(id_b > id_a, "Freed slot reuse must still mint a fresh id");
}

#[test]
fn registry_objects_and_components_share_id_space() {
    let mut scene = Scene::new();
    let object = scene.create_object();
    let component = scene
        .add_component(object, ComponentKind::Light(LightComponent::new()))
        .unwrap();

    let object_id = scene.object(object).unwrap().instance_id();
    let component_id = scene.component(component).unwrap().instance_id();
    assert_ne!(object_id, component_id);
}

// ============================================================================
// Deferred destruction
// ============================================================================

#[test]
fn registry_deferred_destroy_resolves_until_sweep() {
    let mut scene = Scene::new();
    let handle = scene.create_object();
    scene.destroy_object(handle, false);

    let object = scene.object(handle).expect("resolvable until end_frame");
    assert!(object.is_pending_destroy());

    scene.end_frame();
    assert!(scene.object(handle).is_none());
}

#[test]
fn registry_deferred_destroy_is_deduplicated() {
    let mut scene = Scene::new();
    let handle = scene.create_object();

    scene.destroy_object(handle, false);
    scene.destroy_object(handle, false);
    assert_eq!(scene.registry().pending_count(), 1);

    scene.end_frame();
    assert!(scene.object(handle).is_none());
    assert_eq!(scene.registry().pending_count(), 0);
}

#[test]
fn registry_deferred_component_destroy_sweeps_once() {
    let mut scene = Scene::new();
    let owner = scene.create_object();
    let light = scene
        .add_component(owner, ComponentKind::Light(LightComponent::new()))
        .unwrap();

    scene.destroy_component(light, false);
    scene.destroy_component(light, false);
    assert_eq!(scene.registry().pending_count(), 1);
    assert!(scene.component(light).unwrap().is_pending_destroy());

    scene.end_frame();
    assert!(scene.component(light).is_none());
    assert!(
        scene.object(owner).unwrap().components().is_empty(),
        "Owner's component list cleaned by the sweep"
    );
}

#[test]
fn registry_immediate_destroy_beats_queued_entry() {
    let mut scene = Scene::new();
    let handle = scene.create_object();
    scene.destroy_object(handle, false);
    scene.destroy_object(handle, true);

    assert!(scene.object(handle).is_none());
    // The queued entry is now stale; the sweep must skip it quietly.
    scene.end_frame();
    assert!(scene.object(handle).is_none());
}

#[test]
fn registry_deferred_destroy_detaches_immediately() {
    let mut scene = Scene::new();
    let handle = scene.create_object();
    assert!(scene.roots().contains(&handle));

    scene.destroy_object(handle, false);
    assert!(
        !scene.roots().contains(&handle),
        "Detach happens at destroy time, not at the sweep"
    );
}

#[test]
fn registry_destroy_component_unregisters() {
    let mut scene = Scene::new();
    let owner = scene.create_object();
    let light = scene
        .add_component(owner, ComponentKind::Light(LightComponent::new()))
        .unwrap();

    assert_ne!(scene.component(light).unwrap().state(), Lifecycle::Destroyed);
    scene.destroy_component(light, true);
    assert!(scene.component(light).is_none());
    assert!(scene.object(owner).unwrap().components().is_empty());
}
