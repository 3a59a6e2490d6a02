//! Headless tour of the scene runtime: an orbiting camera rig, static
//! scenery and a few frames of the update loop, with the lazy recompute
//! counters logged at the end.
//!
//! Run with `RUST_LOG=info cargo run --example orbit_rig`.

use std::f32::consts::TAU;

use glam::Vec3;

use vesper_scene::SimulationFlags;
use vesper_scene::component::{
    CameraComponent, ComponentKind, LightComponent, MeshRendererComponent, SkyboxComponent,
};
use vesper_scene::scene::{Mobility, Scene};

fn main() {
    env_logger::init();

    let mut scene = Scene::new();
    scene.set_simulation_flags(SimulationFlags::GAME);

    // Camera rig: a pivot spinning at the origin with the camera on an arm.
    let pivot = scene.create_object_with_name("Pivot");
    let arm = scene
        .build_object("Arm")
        .with_position(Vec3::new(0.0, 3.0, 8.0))
        .with_parent(pivot)
        .build();
    scene.edit(arm).look_at(Vec3::new(0.0, -3.0, -8.0));
    let Some(camera) = scene.add_component(
        arm,
        ComponentKind::Camera(CameraComponent::perspective(60f32.to_radians(), 0.1, 100.0)),
    ) else {
        return;
    };

    // Scenery. The pillar is static: it drops local edits and ignores the
    // hierarchy, so placement happens at build time.
    let pillar = scene
        .build_object("Pillar")
        .with_position(Vec3::new(3.0, 0.0, 0.0))
        .with_mobility(Mobility::Static)
        .build();
    let Some(pillar_mesh) = scene.add_component(
        pillar,
        ComponentKind::MeshRenderer(MeshRendererComponent::new()),
    ) else {
        return;
    };

    let sun = scene.create_object_with_name("Sun");
    scene
        .edit(sun)
        .set_position(0.0, 10.0, 0.0)
        .look_at(Vec3::ZERO)
        .with_component(ComponentKind::Light(LightComponent::directional()));
    scene.add_component(sun, ComponentKind::Skybox(SkyboxComponent::new()));

    // A few frames of the loop: write, bulk-clean, read, sweep.
    for frame in 0..4 {
        scene.edit(pivot).rotate_y(TAU / 8.0);
        scene.update_world_matrices();

        if let Some(position) = scene.world_position(arm) {
            log::info!("frame {frame}: camera at {position}");
        }
        if let Some(view) = scene.camera_view_matrix(camera) {
            log::debug!("frame {frame}: view = {view}");
        }
        if let Some(bounds) = scene.mesh_world_bounds(pillar_mesh) {
            log::debug!("frame {frame}: pillar bounds centered at {}", bounds.center());
        }
        scene.end_frame();
    }

    let stats = scene.stats();
    log::info!(
        "recomputed {} local / {} world matrices",
        stats.local_recomputes,
        stats.world_recomputes
    );
}
