//! # engine_app: reference entity manager
//!
//! Owns the entities, drives registered systems through their capabilities
//! and dispatches the deferred event bus once per frame.
//!
//! ## Startup Sequence
//!
//! 1. Resolve the [`EngineConfig`] from `--config` and command-line flags.
//! 2. Register the demo systems and spawn the demo entities.
//! 3. Enter the fixed-timestep tick loop.

mod config;
mod demo;
mod error;
mod registry;
mod tick;
mod world;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Cli, EngineConfig};
use demo::Thrust;
use engine_system::{InputEvent, SystemRegistration};
use tick::TickLoop;

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(&cli)?;
    info!(?config, "engine starting");

    let mut tick_loop = TickLoop::new(config.clone());
    let stats = demo::install(tick_loop.world_mut(), config.demo_entities);

    if cli.list_systems {
        let registrations: Vec<&SystemRegistration> =
            tick_loop.world().registry().registrations().collect();
        println!("{}", serde_json::to_string_pretty(&registrations)?);
        return Ok(());
    }

    tick_loop.queue_input(InputEvent::new(Thrust { dx: 0.5, dy: 0.0 }));
    let ticks = tick_loop.run()?;

    let stats = *stats.lock();
    info!(
        ticks,
        tracked = stats.tracked,
        modified = stats.modified,
        moved = stats.moved,
        pending = tick_loop.world().bus().pending_len(),
        "engine shut down"
    );
    Ok(())
}
