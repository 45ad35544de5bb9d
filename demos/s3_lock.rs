//! Example: One participant against S3 or an S3-compatible service
//!
//! Run with: `cargo run --example s3_lock -- <participant> <num_procs>`
//!
//! Start one copy per participant, each with its own id. The store is read
//! from `S3_BUCKET`, `S3_ENDPOINT`, `S3_REGION`, `AWS_ACCESS_KEY_ID` and
//! `AWS_SECRET_ACCESS_KEY` (or `BAKERY_STORE=local` with `BAKERY_LOCAL_DIR`).

use bakery_lock::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let participant: usize = args.next().unwrap_or_else(|| "0".into()).parse()?;
    let num_procs: usize = args.next().unwrap_or_else(|| "2".into()).parse()?;

    let storage = Arc::new(StoreConfig::from_env()?.build()?);
    let provider = BakeryLockProvider::builder()
        .storage(storage)
        .num_procs(num_procs)
        .backoff(Backoff::from_millis(500, 2000)?)
        .key_prefix("demo")
        .build()?;
    let mut mutex = provider.create_mutex(participant)?;

    println!("participant {participant}/{num_procs}: waiting for the lock");
    mutex.lock().await?;
    println!("participant {participant}: acquired with ticket {:?}", mutex.ticket());
    mutex.unlock().await?;
    println!("participant {participant}: released");
    Ok(())
}
