// ⚙️ Receipt Service - Submission and points retrieval
//
// Submission stores the receipt before returning its id, so a retrieval
// right after submission always finds it. Scoring runs as a detached task;
// retrieval never waits for it and scores inline on a cache miss.

use crate::model::Receipt;
use crate::rules::{self, ScoringError};
use crate::store::{MemoryPointsCache, MemoryReceiptStore, PointsCache, ReceiptStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("receipt {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("scoring receipt {id} failed: {source}")]
    Scoring {
        id: String,
        #[source]
        source: ScoringError,
    },
}

// ============================================================================
// DEFERRED SCORING
// ============================================================================

/// Score one stored receipt and cache the result
pub struct ScoringTask {
    pub id: String,
    pub receipt: Receipt,
    cache: Arc<dyn PointsCache>,
}

impl ScoringTask {
    /// Returns the cached value, which is the earlier one if a retrieval won the race
    pub fn run(self) -> Result<u64, ServiceError> {
        score_and_cache(self.cache.as_ref(), &self.id, &self.receipt)
    }

    /// Fire-and-forget onto the tokio runtime
    pub fn dispatch(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let id = self.id.clone();
            match self.run() {
                Ok(points) => debug!(receipt_id = %id, points, "background scoring finished"),
                Err(e) => warn!(receipt_id = %id, error = %e, "background scoring failed"),
            }
        })
    }
}

fn score_and_cache(cache: &dyn PointsCache, id: &str, receipt: &Receipt) -> Result<u64, ServiceError> {
    let scoring_failed = |source| ServiceError::Scoring {
        id: id.to_string(),
        source,
    };
    let breakdown = rules::score(receipt).map_err(scoring_failed)?;
    let points = breakdown.total().map_err(scoring_failed)?;
    debug!(receipt_id = %id, ?breakdown, points, "scored receipt");

    Ok(cache.put_if_absent(id, points)?)
}

// ============================================================================
// SERVICE
// ============================================================================

/// Result of a submission
pub struct Submission {
    pub id: String,

    /// Handle of the deferred scoring task; dropping it detaches the task
    pub scoring: JoinHandle<()>,
}

#[derive(Clone)]
pub struct ReceiptService {
    receipts: Arc<dyn ReceiptStore>,
    points: Arc<dyn PointsCache>,
}

impl ReceiptService {
    pub fn new(receipts: Arc<dyn ReceiptStore>, points: Arc<dyn PointsCache>) -> Self {
        ReceiptService { receipts, points }
    }

    /// Service backed by the in-memory store and cache
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryReceiptStore::new()),
            Arc::new(MemoryPointsCache::new()),
        )
    }

    /// Store a receipt under a fresh id and schedule its scoring.
    /// Must be called from within a tokio runtime.
    pub fn process(&self, receipt: Receipt) -> Result<Submission, ServiceError> {
        let id = Uuid::new_v4().to_string();

        self.receipts.put(&id, receipt.clone())?;
        info!(receipt_id = %id, retailer = %receipt.retailer, items = receipt.items.len(), "receipt stored");

        let task = ScoringTask {
            id: id.clone(),
            receipt,
            cache: Arc::clone(&self.points),
        };

        Ok(Submission {
            id,
            scoring: task.dispatch(),
        })
    }

    /// Points for a stored receipt, scoring it now if the background task
    /// has not finished yet
    pub fn points(&self, id: &str) -> Result<u64, ServiceError> {
        let receipt = self
            .receipts
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        if let Some(points) = self.points.get(id)? {
            return Ok(points);
        }

        debug!(receipt_id = %id, "points cache miss, scoring inline");
        score_and_cache(self.points.as_ref(), id, &receipt)
    }

    pub fn receipt_count(&self) -> Result<usize, ServiceError> {
        Ok(self.receipts.len()?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
