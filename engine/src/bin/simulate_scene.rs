//! Load a scene and optionally run it headless
//!
//! Usage: simulate_scene <scene.ixscene | project.ixproj> [frames]
//!
//! A project file opens its start scene through the full frame loop, with a
//! null GPU standing in for the device.

use ignite_engine::core::entity::{IdComponent, Transform};
use ignite_engine::physics::{BoxCollider, BoxCollider2D, Rigidbody, Rigidbody2D, SphereCollider};
use ignite_engine::prelude::*;
use ignite_engine::project::PROJECT_EXTENSION;
use std::{env, path::Path, process::ExitCode};

const FRAME_TIME: f32 = 1.0 / 60.0;

fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("simulate_scene")
}

fn main() -> ExitCode {
    ignite_engine::init_logging();

    let args: Vec<String> = env::args().collect();
    let Some(input) = args.get(1) else {
        eprintln!(
            "Usage: {} <scene.ixscene | project.ixproj> [frames]",
            program_name(&args)
        );
        return ExitCode::FAILURE;
    };
    let frames: u32 = match args.get(2).map(|arg| arg.parse()) {
        None => 0,
        Some(Ok(frames)) => frames,
        Some(Err(e)) => {
            eprintln!("✗ Invalid frame count: {e}");
            return ExitCode::FAILURE;
        }
    };

    let path = Path::new(input);
    let is_project = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION));

    let result = if is_project {
        run_project(path, frames)
    } else {
        run_scene(path, frames)
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("✗ {message}");
            ExitCode::FAILURE
        }
    }
}

fn run_scene(path: &Path, frames: u32) -> Result<(), String> {
    println!("Loading scene: {}", path.display());
    let mut scene = Scene::load(path, PhysicsConfig::default())
        .map_err(|e| format!("Failed to load scene: {e}"))?;
    print_counts(&scene);

    if frames > 0 {
        scene.on_runtime_start();
        for _ in 0..frames {
            scene.on_update_runtime(FRAME_TIME);
        }
        scene.on_runtime_stop();
        println!("✓ Simulated {frames} frames");
    }
    print_roots(&scene);
    Ok(())
}

fn run_project(path: &Path, frames: u32) -> Result<(), String> {
    println!("Loading project: {}", path.display());
    let project = Project::load(path).map_err(|e| format!("Failed to load project: {e}"))?;
    println!("  Assets: {}", project.asset_manager().len());

    let mut app = EngineApp::new(project);
    print_counts(app.scene());

    if frames > 0 {
        let mut gpu = NullGpuContext::new();
        app.play();
        let mut applied = 0;
        for _ in 0..frames {
            applied += app.update(FRAME_TIME, &mut gpu).sync.applied;
        }
        app.stop();
        println!("✓ Simulated {frames} frames ({applied} uploads applied)");
    }
    print_roots(app.scene());
    Ok(())
}

fn print_counts(scene: &Scene) {
    let world = scene.world();
    println!("✓ Scene '{}'", scene.name());
    println!("  Entities: {}", scene.entity_count());
    println!("  Rigidbody2D: {}", world.entities_with::<Rigidbody2D>().len());
    println!("  BoxCollider2D: {}", world.entities_with::<BoxCollider2D>().len());
    println!("  Rigidbody: {}", world.entities_with::<Rigidbody>().len());
    println!("  BoxCollider: {}", world.entities_with::<BoxCollider>().len());
    println!("  SphereCollider: {}", world.entities_with::<SphereCollider>().len());
}

fn print_roots(scene: &Scene) {
    println!("Root transforms:");
    let world = scene.world();
    for entity in scene.root_entities() {
        let (Ok(id), Ok(transform)) = (
            world.get::<IdComponent>(entity),
            world.get::<Transform>(entity),
        ) else {
            continue;
        };
        let (axis, angle) = transform.rotation.to_axis_angle();
        println!(
            "  {} [{}] translation={:?} rotation={:.3}rad about {:?} scale={:?}",
            id.name, id.uuid, transform.translation, angle, axis, transform.scale
        );
    }
}
