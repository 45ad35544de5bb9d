//! Example: Two participants sharing a local directory
//!
//! Run with: `cargo run --example local_lock`
//!
//! Both participants live in this process but open the directory
//! separately, exactly as two processes on one host would.

use bakery_lock::*;
use std::sync::Arc;
use std::time::Duration;

const DIR: &str = "/tmp/bakery-locks";

async fn participant(id: usize) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let storage = Arc::new(ObjectStoreStorage::local(DIR)?);
    let provider = BakeryLockProvider::builder()
        .storage(storage.clone())
        .num_procs(2)
        .backoff(Backoff::from_millis(50, 150)?)
        .build()?;
    let mut mutex = provider.create_mutex(id)?;

    for _ in 0..3 {
        mutex.lock().await?;
        let seq = storage.get_int("NEXT", 0).await?;
        println!("participant {id} holds ticket {:?}, seq {seq}", mutex.ticket());
        tokio::time::sleep(Duration::from_millis(100)).await;
        storage.put_int("NEXT", seq + 1).await?;
        mutex.unlock().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("Example: bakery lock over {DIR}\n");

    let (a, b) = tokio::join!(participant(0), participant(1));
    a?;
    b?;

    let storage = ObjectStoreStorage::local(DIR)?;
    println!("\nNEXT = {}", storage.get_int("NEXT", 0).await?);
    Ok(())
}
