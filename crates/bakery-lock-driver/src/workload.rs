//! The coordinated critical section and the participant tasks running it.

use std::sync::Arc;

use bakery_lock_core::error::StoreResult;
use bakery_lock_core::key::KeySpace;
use bakery_lock_core::storage::ObjectStorageExt;
use bakery_lock_core::traits::{DistributedMutex, MutexProvider, ObjectStorage};
use bakery_lock_mutex::BakeryLockProvider;
use bytes::Bytes;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};

/// One sequence number and the participant that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Produced {
    pub seq: u64,
    pub participant: usize,
}

/// Runs `iterations` critical sections for the participant owning `mutex`.
///
/// Each section reads `NEXT` (0 when absent), writes it back incremented and
/// stores `payload` as `data_<seq>_<participant>`. Returns the sequence
/// numbers in the order they were produced.
///
/// The first error stops the participant. When it happens inside the
/// critical section the lock is released before returning, if possible.
#[instrument(skip_all, fields(participant = mutex.participant()))]
pub async fn run_participant<M, S>(
    mutex: &mut M,
    storage: &S,
    keys: &KeySpace,
    iterations: usize,
    payload: Bytes,
) -> DriverResult<Vec<u64>>
where
    M: DistributedMutex,
    S: ObjectStorage + ?Sized,
{
    let participant = mutex.participant();
    let mut produced = Vec::new();

    for _ in 0..iterations {
        mutex
            .lock()
            .await
            .map_err(|source| DriverError::Lock {
                participant,
                source,
            })?;

        match critical_section(storage, keys, participant, payload.clone()).await {
            Ok(seq) => {
                mutex
                    .unlock()
                    .await
                    .map_err(|source| DriverError::Lock {
                        participant,
                        source,
                    })?;
                info!(seq, "produced");
                produced.push(seq);
            }
            Err(source) => {
                if let Err(e) = mutex.unlock().await {
                    warn!(error = %e, "failed to release lock after storage error");
                }
                return Err(DriverError::Store {
                    participant,
                    source,
                });
            }
        }
    }

    Ok(produced)
}

async fn critical_section<S: ObjectStorage + ?Sized>(
    storage: &S,
    keys: &KeySpace,
    participant: usize,
    payload: Bytes,
) -> StoreResult<u64> {
    let next = keys.next();
    let seq = storage.get_int(&next, 0).await?;
    storage.put_int(&next, seq.saturating_add(1)).await?;
    storage.put(&keys.data(seq, participant), payload).await?;
    debug!(seq, "critical section done");
    Ok(seq)
}

/// Runs the whole workload: one task per participant, all sharing `storage`.
///
/// Returns every produced sequence ordered by sequence number. If any
/// participant fails the remaining tasks are cancelled and its error is
/// returned.
#[instrument(skip_all, fields(num_procs = config.num_procs, iterations = config.iterations))]
pub async fn run<S>(config: &DriverConfig, storage: Arc<S>) -> DriverResult<Vec<Produced>>
where
    S: ObjectStorage + 'static,
{
    let payload = config.load_payload().await?;
    let provider = BakeryLockProvider::builder()
        .storage(storage)
        .num_procs(config.num_procs)
        .backoff(config.backoff)
        .build()
        .map_err(|e| DriverError::Config(e.to_string()))?;

    let mut tasks = JoinSet::new();
    for participant in 0..provider.num_procs() {
        let mut mutex = provider
            .create_mutex(participant)
            .map_err(|source| DriverError::Lock {
                participant,
                source,
            })?;
        let storage = provider.storage().clone();
        let keys = provider.key_space().clone();
        let payload = payload.clone();
        let iterations = config.iterations;

        tasks.spawn(async move {
            let seqs =
                run_participant(&mut mutex, storage.as_ref(), &keys, iterations, payload).await?;
            Ok::<_, DriverError>((participant, seqs))
        });
    }

    let mut produced = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (participant, seqs) = joined??;
        produced.extend(seqs.into_iter().map(|seq| Produced { seq, participant }));
    }
    produced.sort();

    info!(count = produced.len(), "workload finished");
    Ok(produced)
}
