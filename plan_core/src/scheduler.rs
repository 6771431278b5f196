//! # Debounced Piece Lookups
//!
//! Editing a row's dye lot (or its size filter while a dye lot is set)
//! schedules a lookup of the pieces available for that lot. Lookups are
//! debounced and coalesced per row:
//!
//! - at most one pending lookup per row id;
//! - scheduling again for the same row aborts the pending one, even if it is
//!   already in flight;
//! - every lookup carries a generation number, so an answer that raced past
//!   its cancellation is recognised as stale by [`PieceFetchScheduler::is_current`].
//!
//! Completed lookups, successful or not, are delivered on the channel
//! returned by [`PieceFetchScheduler::new`]. Nothing is retried.
//!
//! Lookups for different rows are independent; no ordering is guaranteed
//! between them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::lookup::{DyeLotPieceSource, PieceAvailability, PieceRequest};

/// A finished lookup, delivered to the owner of the scheduler.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub request: PieceRequest,
    pub generation: u64,
    pub result: PlanResult<PieceAvailability>,
}

struct PendingFetch {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Per-row map of cancellable, delayed lookups.
pub struct PieceFetchScheduler {
    source: Arc<dyn DyeLotPieceSource>,
    pending: HashMap<Uuid, PendingFetch>,
    next_generation: u64,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
}

impl PieceFetchScheduler {
    /// Create a scheduler and the receiver its outcomes are delivered on.
    pub fn new(
        source: Arc<dyn DyeLotPieceSource>,
    ) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = PieceFetchScheduler {
            source,
            pending: HashMap::new(),
            next_generation: 0,
            outcomes: tx,
        };
        (scheduler, rx)
    }

    /// Schedule a lookup for `request.row_id` after `delay`, replacing any
    /// pending one for that row. Returns the lookup's generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, request: PieceRequest, delay: Duration) -> PlanResult<u64> {
        let runtime = Handle::try_current().map_err(|e| PlanError::Internal {
            message: format!("piece lookup needs a tokio runtime: {e}"),
        })?;

        let row_id = request.row_id;
        self.cancel(&row_id);

        self.next_generation += 1;
        let generation = self.next_generation;
        let source = Arc::clone(&self.source);
        let outcomes = self.outcomes.clone();

        debug!(%row_id, generation, delay_ms = delay.as_millis() as u64, bagno = %request.bagno, "Scheduled piece lookup");
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let result = source.available_pieces(&request).await;
            let outcome = FetchOutcome {
                request,
                generation,
                result,
            };
            if outcomes.send(outcome).is_err() {
                debug!(%row_id, generation, "Outcome receiver dropped");
            }
        });

        self.pending.insert(row_id, PendingFetch { generation, handle });
        Ok(generation)
    }

    /// Abort the pending lookup of a row. Returns whether one was pending.
    pub fn cancel(&mut self, row_id: &Uuid) -> bool {
        match self.pending.remove(row_id) {
            Some(pending) => {
                pending.handle.abort();
                debug!(%row_id, generation = pending.generation, "Cancelled piece lookup");
                true
            }
            None => false,
        }
    }

    /// Abort every pending lookup.
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }

    /// Whether an outcome belongs to the latest lookup scheduled for its row
    pub fn is_current(&self, outcome: &FetchOutcome) -> bool {
        self.pending
            .get(&outcome.request.row_id)
            .is_some_and(|p| p.generation == outcome.generation)
    }

    /// Retire the pending entry an outcome answers.
    ///
    /// Returns `false` (and leaves the map alone) for stale outcomes.
    pub fn complete(&mut self, outcome: &FetchOutcome) -> bool {
        if !self.is_current(outcome) {
            return false;
        }
        self.pending.remove(&outcome.request.row_id);
        true
    }

    pub fn is_pending(&self, row_id: &Uuid) -> bool {
        self.pending.contains_key(row_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for PieceFetchScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for PieceFetchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PieceFetchScheduler")
            .field("pending", &self.pending.len())
            .field("next_generation", &self.next_generation)
            .finish()
    }
}
