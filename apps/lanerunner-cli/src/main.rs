use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lanerunner_common::{Audio, AudioLog, Clip, DeclaredGeometry};
use lanerunner_kernel::World;
use lanerunner_scene::{Scene, SceneConfig};
use lanerunner_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lanerunner-cli", about = "Headless runner for the lanerunner core")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a scene with the observer moving forward at a constant speed
    Run {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.05")]
        dt: f32,
        /// Observer speed in units per second toward -Z
        #[arg(long, default_value = "4.0")]
        speed: f32,
        /// RNG seed, overriding the config
        #[arg(short, long)]
        seed: Option<u64>,
        /// YAML scene config; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
        /// List active segments at the end of the run
        #[arg(long)]
        segments: bool,
    },
    /// Print the default scene config as YAML
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("lanerunner-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: tick={}", World::new().tick());
            println!("stream: {}", lanerunner_stream::crate_info());
            println!("traffic: {}", lanerunner_traffic::crate_info());
            println!("scene: {}", lanerunner_scene::crate_info());
            println!("tools: {}", lanerunner_tools::crate_info());
        }
        Commands::Run {
            ticks,
            dt,
            speed,
            seed,
            config,
            json,
            segments,
        } => {
            let mut scene_config = match config {
                Some(path) => SceneConfig::load(&path)
                    .with_context(|| format!("loading scene config {}", path.display()))?,
                None => SceneConfig::default(),
            };
            if let Some(seed) = seed {
                scene_config.seed = seed;
            }

            let audio_log = Arc::new(AudioLog::new());
            let mut scene = Scene::new(
                scene_config,
                Some(Arc::new(DeclaredGeometry)),
                Audio::new(audio_log.clone()),
            );

            let _span = tracing::info_span!("run", ticks, dt, speed).entered();
            let mut observer_z = 0.0;
            let mut movers_spawned = 0;
            let mut movers_removed = 0;
            for _ in 0..ticks {
                observer_z -= speed * dt;
                let report = scene.tick(dt, observer_z);
                movers_spawned += report.movers_spawned;
                movers_removed += report.movers_removed;
            }

            let summary = SceneInspector::summary(&scene);
            if json {
                println!("{}", SceneInspector::to_json(&summary)?);
            } else {
                println!("{summary}");
                println!(
                    "Traffic: spawned={movers_spawned} removed_with_segments={movers_removed}"
                );
                for signal in SceneInspector::signals(&scene) {
                    println!(
                        "Signal [{}] {:?} {:?} departures={}",
                        signal.segment, signal.state, signal.color, signal.departures
                    );
                }
                println!(
                    "Audio: horns={} train_warnings={} train_passes={} live_loops={}",
                    audio_log.count(Clip::CarHorn),
                    audio_log.count(Clip::TrainWarning),
                    audio_log.count(Clip::TrainPass),
                    audio_log.live_loops()
                );
            }
            if segments {
                for info in SceneInspector::segments(&scene) {
                    println!("{info}");
                }
            }
        }
        Commands::Config { output } => {
            let yaml = SceneConfig::default().to_yaml()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, yaml)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(path = %path.display(), "default config written");
                }
                None => print!("{yaml}"),
            }
        }
    }

    Ok(())
}
