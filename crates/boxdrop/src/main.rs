//! boxdrop: open the window and drop a box every second.
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

use boxdrop::config::DemoConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DemoConfig::default();
    tracing::info!(
        world_size = config.world_size,
        physics_hz = config.physics_hz,
        spawn_period_ms = config.spawn_period_ms,
        "starting boxdrop"
    );

    boxdrop::render::run_windowed(config)?;

    tracing::info!("boxdrop exited cleanly");
    Ok(())
}
