//! Admission control bounding how many clients are served at once.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting permit pool sized to the worker count.
///
/// The accept loop calls [`try_acquire`](Self::try_acquire) for every new
/// connection and never waits: when no permit is left the client is turned
/// away. Clones share the same pool.
#[derive(Clone, Debug)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Largest capacity a gate can be created with.
    pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

    /// Create a gate admitting up to `capacity` clients.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](Self::MAX_CAPACITY).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Take a permit if one is free.
    ///
    /// The permit returns to the pool when the [`AdmissionPermit`] is
    /// dropped, so it is released exactly once whichever way the session
    /// ends.
    #[must_use]
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        let permit = Arc::clone(&self.permits).try_acquire_owned().ok()?;
        Some(AdmissionPermit::new(permit))
    }

    /// Number of permits currently free.
    #[must_use]
    pub fn available(&self) -> usize { self.permits.available_permits() }

    /// Total number of permits.
    #[must_use]
    pub const fn capacity(&self) -> usize { self.capacity }

    /// Number of clients currently holding a permit.
    #[must_use]
    pub fn in_service(&self) -> usize { self.capacity.saturating_sub(self.available()) }
}

/// Proof that a connection was admitted.
///
/// Dropping the permit releases it back to its [`AdmissionGate`] and
/// decrements the active connection gauge.
#[derive(Debug)]
#[must_use = "dropping the permit immediately releases the admission slot"]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    fn new(permit: OwnedSemaphorePermit) -> Self {
        crate::metrics::inc_connections();
        Self { _permit: permit }
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) { crate::metrics::dec_connections(); }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(2)]
    #[case(5)]
    fn admits_up_to_capacity(#[case] capacity: usize) {
        let gate = AdmissionGate::new(capacity);
        let held: Vec<_> = (0..capacity)
            .map(|_| gate.try_acquire().expect("permit within capacity"))
            .collect();

        assert!(gate.try_acquire().is_none(), "gate over-admitted");
        assert_eq!(gate.available(), 0);
        assert_eq!(gate.in_service(), capacity);
        drop(held);
        assert_eq!(gate.available(), capacity);
    }

    #[test]
    fn dropping_permit_releases_once() {
        let gate = AdmissionGate::new(2);
        let permit = gate.try_acquire().expect("permit");
        assert_eq!(gate.available(), 1);
        drop(permit);
        assert_eq!(gate.available(), 2);
        assert_eq!(gate.in_service(), 0);
    }

    #[test]
    fn permit_is_released_when_holder_panics() {
        let gate = AdmissionGate::new(2);
        let permit = gate.try_acquire().expect("permit");
        let result = catch_unwind(AssertUnwindSafe(move || {
            let _held = permit;
            panic!("session blew up");
        }));
        assert!(result.is_err());
        assert_eq!(gate.available(), 2);
    }

    #[test]
    fn clones_share_permits() {
        let gate = AdmissionGate::new(2);
        let other = gate.clone();
        let _a = gate.try_acquire().expect("first permit");
        let _b = other.try_acquire().expect("second permit");
        assert!(gate.try_acquire().is_none());
        assert_eq!(other.capacity(), 2);
    }
}
