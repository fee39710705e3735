//! Single-slot hand-off between the accept loop and idle workers.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::{select, sync::Notify};
use tokio_util::sync::CancellationToken;

/// Passes one admitted connection at a time from the acceptor to a worker.
///
/// The slot is either empty or holds exactly one handle. Whoever finds it
/// occupied while holding the lock empties it before releasing the lock, so
/// a published handle is claimed by exactly one worker.
///
/// The shutdown token doubles as the broadcast wake: once it is cancelled
/// every worker blocked in [`take`](Self::take) observes an empty slot and
/// receives `None`.
#[derive(Debug)]
pub struct ConnectionMailbox<T> {
    slot: Mutex<Option<T>>,
    filled: Notify,
    vacated: Notify,
    shutdown: CancellationToken,
}

impl<T> ConnectionMailbox<T> {
    /// Create an empty mailbox that closes when `shutdown` is cancelled.
    #[must_use]
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            slot: Mutex::new(None),
            filled: Notify::new(),
            vacated: Notify::new(),
            shutdown,
        }
    }

    // A worker that panicked while holding the lock cannot have left the
    // slot half-written: it only ever swaps an `Option`.
    fn slot(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `handle` in the slot and wake one waiting worker.
    ///
    /// If a previous handle has not been claimed yet this waits until a
    /// worker empties the slot; nothing is ever overwritten.
    ///
    /// # Errors
    ///
    /// Gives `handle` back if the mailbox shut down before it could be
    /// stored.
    pub async fn publish(&self, handle: T) -> Result<(), T> {
        loop {
            if self.shutdown.is_cancelled() {
                return Err(handle);
            }
            let vacated = self.vacated.notified();
            tokio::pin!(vacated);
            vacated.as_mut().enable();

            {
                let mut slot = self.slot();
                if slot.is_none() {
                    *slot = Some(handle);
                    drop(slot);
                    self.filled.notify_one();
                    return Ok(());
                }
            }

            select! {
                biased;

                () = self.shutdown.cancelled() => {}
                () = &mut vacated => {}
            }
        }
    }

    /// Wait for a published handle and claim it.
    ///
    /// Returns `None` once the mailbox has shut down and the slot is empty.
    /// A handle published before shutdown is still handed out.
    pub async fn take(&self) -> Option<T> {
        loop {
            let filled = self.filled.notified();
            tokio::pin!(filled);
            filled.as_mut().enable();

            let claimed = self.slot().take();
            if let Some(handle) = claimed {
                self.vacated.notify_one();
                return Some(handle);
            }
            if self.shutdown.is_cancelled() {
                return None;
            }

            select! {
                biased;

                () = self.shutdown.cancelled() => {}
                () = &mut filled => {}
            }
        }
    }

    /// Returns `true` when no handle is waiting to be claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.slot().is_none() }

    /// Returns `true` once the mailbox has shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shutdown.is_cancelled() }
}
