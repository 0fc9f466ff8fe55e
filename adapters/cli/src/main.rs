#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line host for the Bastion Defence runtime.
//!
//! Stands in for the engine-side host: boots the service layer, registers
//! demo scene templates for the requested level, performs a level swap, and
//! exercises the pool, printing what a real host would observe.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bastion_core::{LevelEvent, LevelId, CONFIG_ROOT};
use bastion_runtime::Runtime;
use bastion_scene::LevelMap;
use clap::Parser;
use glam::Vec3;
use log::info;
use serde::{Deserialize, Serialize};

/// Command-line options of the headless host.
#[derive(Debug, Parser)]
#[command(name = "bastion-defence", about = "Bastion Defence headless host")]
struct Args {
    /// Directory scanned for configuration payloads.
    #[arg(long, default_value = CONFIG_ROOT)]
    configs: PathBuf,

    /// Path of the durable save file.
    #[arg(long, default_value = "save.json")]
    save: PathBuf,

    /// Level to set up after boot.
    #[arg(long, default_value = "Lvl_01")]
    level: String,

    /// Number of projectile instances to prewarm.
    #[arg(long, default_value_t = 3)]
    prewarm: usize,
}

/// Minimal player profile persisted across sessions.
#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    last_level: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut runtime = Runtime::new(&args.configs, &args.save)
        .context("booting the runtime service layer")?;

    register_level_template(&mut runtime, &args.level);

    let mut events = Vec::new();
    runtime
        .level
        .setup_level(
            &mut runtime.scene,
            &runtime.configs,
            LevelId::new(&args.level),
            &mut events,
        )
        .context("setting up the requested level")?;
    for event in &events {
        match event {
            LevelEvent::SetupStarted { level } => {
                println!("setup started: {}", level.as_str());
            }
            LevelEvent::Unloaded { level } => {
                println!("unloaded: {}", level.as_str());
            }
            LevelEvent::SetupCompleted { level, map } => {
                println!("setup completed: {} (map node {map:?})", level.as_str());
            }
        }
    }

    exercise_pool(&mut runtime, args.prewarm)?;

    let profile = Profile {
        last_level: args.level.clone(),
    };
    runtime
        .save
        .save_json("profile", &profile)
        .context("persisting the player profile")?;
    info!("profile persisted to {}", args.save.display());

    runtime.tick();
    println!(
        "configs: {} | level: {} | scene nodes: {}",
        runtime.configs.len(),
        runtime
            .level
            .current_id()
            .map_or_else(|| "none".to_owned(), |level| level.as_str().to_owned()),
        runtime.scene.node_count()
    );
    Ok(())
}

/// Registers a stub level template under the name the level's visual
/// payload declares, standing in for authored scene content.
fn register_level_template(runtime: &mut Runtime, level: &str) {
    let visual = runtime
        .level
        .visual_config(&runtime.configs, &LevelId::new(level));
    let Some(visual) = visual else {
        return;
    };
    let Ok(template) = runtime.scene.add_node(None) else {
        return;
    };
    runtime.scene.set_level_map(
        template,
        LevelMap::new(
            Vec3::ZERO,
            Vec3::new(24.0, 0.0, 0.0),
            vec![Vec3::new(8.0, 0.0, 0.0), Vec3::new(16.0, 0.0, 0.0)],
        ),
    );
    runtime.scene.register_template(&visual.template, template);
    info!("registered stub template '{}'", visual.template);
}

/// Prewarms and recycles a projectile pool, printing the counters.
fn exercise_pool(runtime: &mut Runtime, prewarm: usize) -> Result<()> {
    let template = runtime.scene.add_node(None)?;
    runtime.pool.prewarm(&mut runtime.scene, template, prewarm)?;

    let first = runtime.pool.acquire(&mut runtime.scene, template, None, None)?;
    let second = runtime.pool.acquire(&mut runtime.scene, template, None, None)?;
    runtime.pool.release(&mut runtime.scene, first);
    runtime.pool.release(&mut runtime.scene, second);

    println!(
        "pool: prewarmed {prewarm}, active {}, free {}",
        runtime.pool.active_count(template),
        runtime.pool.free_count(template)
    );
    Ok(())
}
