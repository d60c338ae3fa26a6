use bevy::prelude::*;

use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::diagnostic::FrameCount;
use std::time::Duration;

use isoscene::scene::layer::{
    ActiveRegion, Body, CollisionShape, IsoAnchor, PathRequest, SceneBounds, ScenePosition, VisibleOrder,
};
use isoscene::scene::ScenePlugin;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};

const DEMO_FRAMES: u32 = 600;

fn setup_file_logging() -> std::io::Result<String> {
    // Create logs directory if it doesn't exist
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    // Generate timestamped filename
    let now = chrono::Local::now();
    let log_filename = format!("isoscene_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // Don't rotate during a single run
        &log_dir,
        &log_filename
    );

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    tracing_subscriber::registry()
        .with(default_filter())
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,isoscene=info"))
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("isoscene") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modified time (oldest first)
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

/// A few crates, a wall and one walker heading past it.
fn spawn_demo_scene(mut commands: Commands, mut requests: MessageWriter<PathRequest>) {
    let crate_bounds = SceneBounds::from_sprite(Vec2::new(32.0, 48.0), Vec2::new(16.0, 40.0));
    let crate_anchor = IsoAnchor { a: Vec2::new(-16.0, 0.0), b: Vec2::new(16.0, 0.0), elevation: 0.0 };
    for i in 0..6 {
        let pos = Vec2::new(96.0 + i as f32 * 24.0, 128.0 + (i % 3) as f32 * 20.0);
        commands.spawn((ScenePosition(pos), crate_bounds, crate_anchor));
    }

    commands.spawn((
        ScenePosition(Vec2::new(320.0, 256.0)),
        SceneBounds { min: Vec2::new(0.0, -64.0), max: Vec2::new(32.0, 256.0) },
        IsoAnchor { a: Vec2::new(0.0, 0.0), b: Vec2::new(32.0, 0.0), elevation: 0.0 },
        CollisionShape(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(32.0, 0.0),
            Vec2::new(32.0, 256.0),
            Vec2::new(0.0, 256.0),
        ]),
    ));

    let walker = commands
        .spawn((
            ScenePosition(Vec2::new(200.0, 380.0)),
            SceneBounds::from_sprite(Vec2::new(16.0, 32.0), Vec2::new(8.0, 30.0)),
            IsoAnchor { a: Vec2::new(-4.0, 0.0), b: Vec2::new(4.0, 0.0), elevation: 0.0 },
            Body::default(),
        ))
        .id();
    requests.write(PathRequest { entity: walker, target: Vec2::new(520.0, 380.0) });

    commands.insert_resource(ActiveRegion(Rect::new(0.0, 0.0, 640.0, 640.0)));
}

fn finish_demo(
    frame: Res<FrameCount>,
    visible: Res<VisibleOrder>,
    walkers: Query<(Entity, &ScenePosition), With<Body>>,
    mut exit: MessageWriter<AppExit>,
) {
    if frame.0 < DEMO_FRAMES {
        return;
    }
    for (entity, pos) in walkers.iter() {
        info!("[LAYER] Walker {:?} ended at ({:.1}, {:.1})", entity, pos.0.x, pos.0.y);
    }
    info!("[LAYER] Final draw order: {:?}", visible.0);
    exit.write(AppExit::Success);
}

fn main() {
    match setup_file_logging() {
        Ok(log_file) => {
            println!("╔══════════════════════════════════════════════════════════╗");
            println!("║  isoscene demo - Logging to file                         ║");
            println!("╠══════════════════════════════════════════════════════════╣");
            println!("║  Log file: {:<45} ║", log_file);
            println!("╚══════════════════════════════════════════════════════════╝");
        }
        Err(e) => {
            eprintln!("File logging unavailable ({}), logging to stdout only", e);
            tracing_subscriber::registry()
                .with(default_filter())
                .with(fmt::layer().with_target(false))
                .init();
        }
    }

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))))
        .add_plugins(ScenePlugin::default())
        .add_systems(Startup, spawn_demo_scene)
        .add_systems(Update, finish_demo)
        .run();
}
