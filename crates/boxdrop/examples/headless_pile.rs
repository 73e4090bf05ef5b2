//! Headless run -- build a pile of boxes without opening a window.
//!
//! Run with:
//!   cargo run --example headless_pile -p boxdrop -- [seconds] [seed]
//!
//! Steps the simulation on a virtual clock, logs a line per simulated
//! second, then prints the final body snapshots as JSON.

use std::time::Duration;

use boxdrop::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let seconds: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(30);
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);

    let mut tick_loop = TickLoop::new(DemoConfig {
        seed: Some(seed),
        ..Default::default()
    })?;

    for second in 1..=seconds {
        let report = tick_loop.advance_to(Duration::from_secs(second));
        let world = tick_loop.simulation().world();
        let sleeping = world.bodies().iter().filter(|b| b.sleeping).count();
        tracing::info!(
            second,
            steps = report.physics_steps,
            boxes = world.count_of(BodyKind::Dynamic),
            sleeping,
            step_ms = tick_loop.last_diagnostics().physics_time.as_secs_f64() * 1e3,
            "simulated"
        );
    }

    let bodies = tick_loop.simulation().world().bodies();
    println!("{}", serde_json::to_string_pretty(&bodies)?);
    Ok(())
}
