//! Bakery mutex over an object store.
//!
//! Lamport's bakery algorithm needs nothing stronger than registers that a
//! reader eventually sees written, which is what a key-value object store
//! without compare-and-swap offers. Each participant `i` owns two objects:
//!
//! - `Entering_<i>`: present while `i` is computing its ticket.
//! - `Number_<i>`: `i`'s ticket, absent meaning 0 (not requesting).
//!
//! To lock, participant `p` announces itself, takes a ticket one larger than
//! every ticket it can see, withdraws the announcement, and then for every
//! other participant `i` in index order waits until `i` is no longer
//! drawing a ticket and no longer holds a ticket ordered before its own.
//! Tickets are compared as `(ticket, id)` pairs so equal tickets drawn
//! concurrently are still totally ordered.

use std::sync::Arc;

use bakery_lock_core::error::{LockError, LockResult};
use bakery_lock_core::key::KeySpace;
use bakery_lock_core::storage::ObjectStorageExt;
use bakery_lock_core::traits::{DistributedMutex, ObjectStorage};
use tracing::{Span, debug, field, instrument, trace, warn};

use crate::backoff::Backoff;

/// A distributed mutex for one participant of a fixed group.
///
/// Construct one instance per participant with the participant's identity
/// and the group size; every participant must use the same storage, key
/// space and group size. The instance is not reentrant.
///
/// A participant that stops between `lock` and `unlock` blocks everybody
/// else indefinitely: there is no lease or stale-ticket recovery.
pub struct BakeryMutex<S: ObjectStorage> {
    storage: Arc<S>,
    keys: KeySpace,
    participant: usize,
    num_procs: usize,
    backoff: Backoff,
    locking: bool,
    /// Ticket drawn by the last successful `lock`, while held.
    ticket: Option<u64>,
    /// Our entering flag could not be removed and may still be in the store.
    stale_entering: bool,
}

impl<S: ObjectStorage> BakeryMutex<S> {
    /// Creates the mutex of `participant` in a group of `num_procs`.
    ///
    /// Uses bare key names and the default backoff window.
    pub fn new(storage: Arc<S>, participant: usize, num_procs: usize) -> LockResult<Self> {
        if num_procs == 0 {
            return Err(LockError::InvalidConfig(
                "participant count must be at least 1".to_string(),
            ));
        }
        if participant >= num_procs {
            return Err(LockError::InvalidConfig(format!(
                "participant {participant} outside 0..{num_procs}"
            )));
        }

        Ok(Self {
            storage,
            keys: KeySpace::default(),
            participant,
            num_procs,
            backoff: Backoff::default(),
            locking: false,
            ticket: None,
            stale_entering: false,
        })
    }

    /// Sets the delay window between polls.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Places the lock's objects under a key prefix.
    pub fn with_key_space(mut self, keys: KeySpace) -> Self {
        self.keys = keys;
        self
    }

    /// The ticket this participant holds the lock with.
    pub fn ticket(&self) -> Option<u64> {
        self.ticket
    }

    pub fn key_space(&self) -> &KeySpace {
        &self.keys
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Entering[p] = true
    async fn announce(&self) -> LockResult<()> {
        self.storage
            .put_empty(&self.keys.entering(self.participant))
            .await?;
        Ok(())
    }

    /// Number[p] = 1 + max(Number[0..n])
    ///
    /// Two participants may read the same maximum and draw equal tickets;
    /// the identity tie-break in [`wait_for_turn`](Self::wait_for_turn)
    /// orders them.
    async fn draw_ticket(&self) -> LockResult<u64> {
        let mut max: u64 = 0;
        for i in 0..self.num_procs {
            max = max.max(self.storage.get_int(&self.keys.number(i), 0).await?);
        }
        let ticket = max.saturating_add(1);

        self.storage
            .put_int(&self.keys.number(self.participant), ticket)
            .await?;
        Ok(ticket)
    }

    /// Entering[p] = false
    ///
    /// A failure is only logged here; `unlock` removes the flag before it
    /// releases the ticket.
    async fn retract(&mut self) {
        let key = self.keys.entering(self.participant);
        match self.storage.remove(&key).await {
            Ok(()) => self.stale_entering = false,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to remove entering flag");
                self.stale_entering = true;
            }
        }
    }

    /// Waits, for each other participant in index order, until it is
    /// neither drawing a ticket nor holding one ordered before ours.
    ///
    /// Returns the number of polls that had to back off.
    async fn wait_for_turn(&self, ticket: u64) -> LockResult<u64> {
        let mut backoffs = 0;

        // Our own flag is withdrawn and our own pair never precedes itself.
        for other in (0..self.num_procs).filter(|&i| i != self.participant) {
            // while (Entering[i]) ;
            let entering = self.keys.entering(other);
            while self.storage.exists(&entering).await? {
                trace!(other, "participant is drawing a ticket");
                backoffs += 1;
                self.backoff.wait().await;
            }

            // while (Number[i] != 0 && (Number[i], i) < (Number[p], p)) ;
            let number = self.keys.number(other);
            loop {
                let other_ticket = self.storage.get_int(&number, 0).await?;
                if !precedes((other_ticket, other), (ticket, self.participant)) {
                    break;
                }
                trace!(other, other_ticket, ticket, "participant is ahead");
                backoffs += 1;
                self.backoff.wait().await;
            }
        }

        Ok(backoffs)
    }
}

/// True when `other` holds a ticket ordered strictly before `mine`.
fn precedes(other: (u64, usize), mine: (u64, usize)) -> bool {
    other.0 != 0 && other < mine
}

impl<S: ObjectStorage> DistributedMutex for BakeryMutex<S> {
    fn participant(&self) -> usize {
        self.participant
    }

    fn num_procs(&self) -> usize {
        self.num_procs
    }

    fn is_locked(&self) -> bool {
        self.locking
    }

    #[instrument(
        skip(self),
        fields(
            participant = self.participant,
            num_procs = self.num_procs,
            backend = self.storage.backend_name(),
            ticket = field::Empty,
            backoffs = field::Empty,
        )
    )]
    async fn lock(&mut self) -> LockResult<()> {
        if self.locking {
            return Err(LockError::InvalidState(format!(
                "participant {} already holds the lock",
                self.participant
            )));
        }

        self.announce().await?;
        let ticket = self.draw_ticket().await?;
        Span::current().record("ticket", ticket);
        debug!(ticket, "drew ticket");
        self.retract().await;

        let backoffs = self.wait_for_turn(ticket).await?;
        Span::current().record("backoffs", backoffs);

        self.ticket = Some(ticket);
        self.locking = true;
        debug!(ticket, backoffs, "lock acquired");
        Ok(())
    }

    #[instrument(
        skip(self),
        fields(
            participant = self.participant,
            backend = self.storage.backend_name(),
            ticket = ?self.ticket,
        )
    )]
    async fn unlock(&mut self) -> LockResult<()> {
        if !self.locking {
            return Err(LockError::InvalidState(format!(
                "participant {} does not hold the lock",
                self.participant
            )));
        }

        // A leftover entering flag holds back every other participant.
        if self.stale_entering {
            self.storage
                .remove(&self.keys.entering(self.participant))
                .await?;
            self.stale_entering = false;
            debug!("removed leftover entering flag");
        }

        // Number[p] = 0
        self.storage
            .remove(&self.keys.number(self.participant))
            .await?;

        self.locking = false;
        self.ticket = None;
        debug!("lock released");
        Ok(())
    }
}
