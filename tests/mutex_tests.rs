//! Integration tests for the bakery mutex against shared in-process stores.

use bakery_lock_core::error::LockError;
use bakery_lock_core::memory::MemoryStorage;
use bakery_lock_core::traits::{DistributedMutex, ObjectStorage};
use bakery_lock_mutex::{Backoff, BakeryMutex};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;

mod common;
use common::flaky_storage::{FlakyStorage, Op};

fn fast_backoff() -> Backoff {
    Backoff::from_millis(1, 3).unwrap()
}

/// Polls until `key` holds `value`.
async fn wait_for_object(storage: &MemoryStorage, key: &str, value: &'static [u8]) {
    timeout(Duration::from_secs(2), async {
        while storage.raw(key) != Some(Bytes::from_static(value)) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{key} never became {value:?}"));
}

#[tokio::test]
async fn test_second_participant_waits_for_first_release() {
    let storage = Arc::new(MemoryStorage::new());
    let mut first = BakeryMutex::new(storage.clone(), 0, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    let mut second = BakeryMutex::new(storage.clone(), 1, 2)
        .unwrap()
        .with_backoff(fast_backoff());

    // Store empty: participant 0 draws ticket 1.
    first.lock().await.unwrap();
    assert_eq!(first.ticket(), Some(1));
    assert_eq!(storage.raw("Number_0"), Some(Bytes::from_static(b"1")));

    // Participant 1 sees max(1, 0) and draws 2, then blocks on (1, 0) < (2, 1).
    let waiter = tokio::spawn(async move {
        second.lock().await?;
        Ok::<_, LockError>(second)
    });
    wait_for_object(&storage, "Number_1", b"2").await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!waiter.is_finished());

    // Releasing deletes Number_0 and lets participant 1 through.
    first.unlock().await.unwrap();
    assert!(!storage.contains("Number_0"));

    let second = timeout(Duration::from_secs(2), waiter)
        .await
        .expect("participant 1 must acquire after release")
        .unwrap()
        .unwrap();
    assert!(second.is_locked());
    assert_eq!(second.ticket(), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mutual_exclusion() {
    const PARTICIPANTS: usize = 4;
    const ITERATIONS: u64 = 15;

    let storage = Arc::new(MemoryStorage::new());
    let inside = Arc::new(AtomicUsize::new(0));
    // Incremented with a non-atomic read-yield-write: lost updates mean overlap.
    let counter = Arc::new(AtomicU64::new(0));

    let mut tasks = Vec::new();
    for participant in 0..PARTICIPANTS {
        let mut mutex = BakeryMutex::new(storage.clone(), participant, PARTICIPANTS)
            .unwrap()
            .with_backoff(Backoff::from_millis(0, 2).unwrap());
        let inside = inside.clone();
        let counter = counter.clone();

        tasks.push(tokio::spawn(async move {
            for _ in 0..ITERATIONS {
                mutex.lock().await.unwrap();

                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0, "two holders");
                let value = counter.load(Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.store(value + 1, Ordering::SeqCst);
                inside.fetch_sub(1, Ordering::SeqCst);

                mutex.unlock().await.unwrap();
            }
        }));
    }

    for task in tasks {
        timeout(Duration::from_secs(30), task)
            .await
            .expect("participants must all finish")
            .unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), PARTICIPANTS as u64 * ITERATIONS);
    assert!(storage.keys_with_prefix("Number_").is_empty());
    assert!(storage.keys_with_prefix("Entering_").is_empty());
}

#[tokio::test]
async fn test_waiters_are_served_in_ticket_order() {
    let storage = Arc::new(MemoryStorage::new());
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let mut holder = BakeryMutex::new(storage.clone(), 0, 3)
        .unwrap()
        .with_backoff(fast_backoff());
    holder.lock().await.unwrap();

    let spawn_waiter = |participant: usize| {
        let mut mutex = BakeryMutex::new(storage.clone(), participant, 3)
            .unwrap()
            .with_backoff(fast_backoff());
        let order = order.clone();
        tokio::spawn(async move {
            mutex.lock().await.unwrap();
            order.lock().unwrap().push(participant);
            tokio::time::sleep(Duration::from_millis(5)).await;
            mutex.unlock().await.unwrap();
        })
    };

    // Participant 2 arrives before participant 1, so it gets the smaller ticket.
    let late_id_first = spawn_waiter(2);
    wait_for_object(&storage, "Number_2", b"2").await;
    let early_id_second = spawn_waiter(1);
    wait_for_object(&storage, "Number_1", b"3").await;

    holder.unlock().await.unwrap();
    for task in [late_id_first, early_id_second] {
        timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec![2, 1]);
}

#[tokio::test]
async fn test_every_participant_eventually_acquires() {
    const PARTICIPANTS: usize = 5;

    let storage = Arc::new(MemoryStorage::new());
    let mut tasks = Vec::new();
    for participant in (0..PARTICIPANTS).rev() {
        let mut mutex = BakeryMutex::new(storage.clone(), participant, PARTICIPANTS)
            .unwrap()
            .with_backoff(fast_backoff());
        tasks.push(tokio::spawn(async move {
            for _ in 0..3 {
                mutex.lock().await?;
                tokio::task::yield_now().await;
                mutex.unlock().await?;
            }
            Ok::<_, LockError>(())
        }));
    }

    for task in tasks {
        timeout(Duration::from_secs(10), task)
            .await
            .expect("no participant may starve")
            .unwrap()
            .unwrap();
    }
}

#[tokio::test]
async fn test_transport_error_aborts_lock() {
    let storage = Arc::new(FlakyStorage::new());
    storage.fail(Op::Get, "Number_1");

    let mut mutex = BakeryMutex::new(storage.clone(), 0, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    let err = mutex.lock().await.unwrap_err();
    assert!(matches!(err, LockError::Transport(_)), "{err:?}");
    assert!(!mutex.is_locked());

    // Aborted mid-protocol: the announcement stays, no ticket was written.
    assert!(storage.inner().contains("Entering_0"));
    assert!(!storage.inner().contains("Number_0"));

    storage.heal();
    mutex.lock().await.unwrap();
    assert!(mutex.is_locked());
    assert!(!storage.inner().contains("Entering_0"));
}

#[tokio::test]
async fn test_failed_retract_is_tolerated() {
    let storage = Arc::new(FlakyStorage::new());
    storage.fail(Op::Delete, "Entering_0");

    let mut mutex = BakeryMutex::new(storage.clone(), 0, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    timeout(Duration::from_secs(1), mutex.lock())
        .await
        .expect("own stale flag must not block")
        .unwrap();
    assert!(mutex.is_locked());
    assert!(storage.inner().contains("Entering_0"));
}

#[tokio::test]
async fn test_leftover_entering_flag_is_removed_on_unlock() {
    let storage = Arc::new(FlakyStorage::new());
    storage.fail(Op::Delete, "Entering_0");

    let mut first = BakeryMutex::new(storage.clone(), 0, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    first.lock().await.unwrap();

    // The flag still cannot be removed: unlock reports it and keeps the lock.
    let err = first.unlock().await.unwrap_err();
    assert!(matches!(err, LockError::Transport(_)), "{err:?}");
    assert!(first.is_locked());
    assert!(storage.inner().contains("Number_0"));

    storage.heal();
    first.unlock().await.unwrap();
    assert!(!first.is_locked());
    assert!(!storage.inner().contains("Entering_0"));
    assert!(!storage.inner().contains("Number_0"));

    let mut second = BakeryMutex::new(storage.clone(), 1, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    timeout(Duration::from_millis(500), second.lock())
        .await
        .expect("participant 1 must not wait on a released participant")
        .unwrap();
    assert!(second.is_locked());
}

#[tokio::test]
async fn test_transient_retract_failure_is_cleaned_up_by_unlock() {
    let storage = Arc::new(FlakyStorage::new());
    storage.fail(Op::Delete, "Entering_0");

    let mut first = BakeryMutex::new(storage.clone(), 0, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    first.lock().await.unwrap();
    assert!(storage.inner().contains("Entering_0"));

    storage.heal();
    first.unlock().await.unwrap();
    assert!(!storage.inner().contains("Entering_0"));

    let mut second = BakeryMutex::new(storage.clone(), 1, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    timeout(Duration::from_millis(500), second.lock())
        .await
        .expect("participant 1 must acquire after release")
        .unwrap();
}

#[tokio::test]
async fn test_unlock_failure_keeps_lock_held() {
    let storage = Arc::new(FlakyStorage::new());
    let mut mutex = BakeryMutex::new(storage.clone(), 0, 1)
        .unwrap()
        .with_backoff(fast_backoff());
    mutex.lock().await.unwrap();

    storage.fail(Op::Delete, "Number_0");
    let err = mutex.unlock().await.unwrap_err();
    assert!(matches!(err, LockError::Transport(_)));
    assert!(mutex.is_locked());
    assert_eq!(mutex.ticket(), Some(1));

    storage.heal();
    mutex.unlock().await.unwrap();
    assert!(!mutex.is_locked());
    assert!(!storage.inner().contains("Number_0"));
}

#[tokio::test]
async fn test_malformed_ticket_is_a_decode_error() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .put("Number_0", Bytes::from_static(b" 3"))
        .await
        .unwrap();

    let mut mutex = BakeryMutex::new(storage.clone(), 1, 2)
        .unwrap()
        .with_backoff(fast_backoff());
    let err = mutex.lock().await.unwrap_err();
    match err {
        LockError::Decode { key, value } => {
            assert_eq!(key, "Number_0");
            assert_eq!(value, " 3");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!mutex.is_locked());
}
