//! Admission gate bounding how many extraction requests run at once.
//!
//! Backed by a tokio semaphore, which hands out permits in FIFO order, so
//! waiting requests are admitted first-come, first-served.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{ExtractError, Result};

/// Default number of concurrent extraction requests.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Clone, Debug)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl AdmissionGate {
    /// Creates a gate with `limit` slots (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot. The slot is released when the permit is dropped.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExtractError::GateClosed)
    }

    /// Stops admitting requests; waiters and later callers get `GateClosed`.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
