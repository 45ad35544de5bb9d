//! Runs the shared-counter workload against the configured object store and
//! prints one `<seq> <participant>` line per critical section.

use std::sync::Arc;

use bakery_lock_driver::{DriverConfig, run};
use bakery_lock_object_store::StoreConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let store_config = StoreConfig::from_env()?;
    let driver_config = DriverConfig::from_env()?;
    let storage = store_config.build()?;
    info!(
        backend = store_config.kind.as_str(),
        num_procs = driver_config.num_procs,
        iterations = driver_config.iterations,
        "starting workload"
    );

    let produced = run(&driver_config, Arc::new(storage)).await?;
    for p in produced {
        println!("{} {}", p.seq, p.participant);
    }
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout carries only the produced sequences.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
