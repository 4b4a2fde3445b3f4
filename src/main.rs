// Entry point: routes every clip and pose of a scene file through its portals.
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use tickportal::cli::Args;
use tickportal::config::AppConfig;
use tickportal::logging::init_tracing;
use tickportal::scene::Scene;

fn run(args: &Args, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let scene = Scene::load(Path::new(&args.scene_path))?.validate()?;
    if args.validate_only {
        info!(
            portals = scene.portals.len(),
            clips = scene.clips.len(),
            poses = scene.poses.len(),
            "scene is valid"
        );
        return Ok(());
    }

    let routed = scene.route(&config.routing)?;
    let text = if config.output.pretty {
        serde_json::to_string_pretty(&routed)?
    } else {
        serde_json::to_string(&routed)?
    };
    println!("{text}");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = AppConfig::load_or_default(&args.config);
    args.apply_overrides(&mut config);

    if let Err(err) = init_tracing(&config.logging.level) {
        eprintln!("Failed to initialise logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
