// 🗄️ Receipt Store + Points Cache
// Process-lifetime, in-memory mappings shared across requests
//
// Receipts are written once at submission and never mutated or evicted.
// Points are insert-if-absent: the first computed value for an id sticks.

use crate::model::Receipt;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),

    #[error("receipt {0} already exists")]
    DuplicateId(String),
}

// ============================================================================
// STORE INTERFACES
// ============================================================================

/// Identifier -> submitted receipt
pub trait ReceiptStore: Send + Sync {
    /// Store a new receipt. Ids are never reused.
    fn put(&self, id: &str, receipt: Receipt) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<Receipt>, StoreError>;

    fn contains(&self, id: &str) -> Result<bool, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;
}

/// Identifier -> computed points
pub trait PointsCache: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<u64>, StoreError>;

    /// Insert unless a value is already present; returns the stored value
    fn put_if_absent(&self, id: &str, points: u64) -> Result<u64, StoreError>;

    fn contains(&self, id: &str) -> Result<bool, StoreError>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATIONS
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryReceiptStore {
    receipts: Arc<RwLock<HashMap<String, Receipt>>>,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReceiptStore for MemoryReceiptStore {
    fn put(&self, id: &str, receipt: Receipt) -> Result<(), StoreError> {
        let mut receipts = self
            .receipts
            .write()
            .map_err(|_| StoreError::Poisoned("receipt store"))?;

        if receipts.contains_key(id) {
            return Err(StoreError::DuplicateId(id.to_string()));
        }
        receipts.insert(id.to_string(), receipt);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Receipt>, StoreError> {
        let receipts = self
            .receipts
            .read()
            .map_err(|_| StoreError::Poisoned("receipt store"))?;
        Ok(receipts.get(id).cloned())
    }

    fn contains(&self, id: &str) -> Result<bool, StoreError> {
        let receipts = self
            .receipts
            .read()
            .map_err(|_| StoreError::Poisoned("receipt store"))?;
        Ok(receipts.contains_key(id))
    }

    fn len(&self) -> Result<usize, StoreError> {
        let receipts = self
            .receipts
            .read()
            .map_err(|_| StoreError::Poisoned("receipt store"))?;
        Ok(receipts.len())
    }
}

#[derive(Clone, Default)]
pub struct MemoryPointsCache {
    points: Arc<RwLock<HashMap<String, u64>>>,
}

impl MemoryPointsCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointsCache for MemoryPointsCache {
    fn get(&self, id: &str) -> Result<Option<u64>, StoreError> {
        let points = self
            .points
            .read()
            .map_err(|_| StoreError::Poisoned("points cache"))?;
        Ok(points.get(id).copied())
    }

    fn put_if_absent(&self, id: &str, value: u64) -> Result<u64, StoreError> {
        let mut points = self
            .points
            .write()
            .map_err(|_| StoreError::Poisoned("points cache"))?;
        Ok(*points.entry(id.to_string()).or_insert(value))
    }

    fn contains(&self, id: &str) -> Result<bool, StoreError> {
        let points = self
            .points
            .read()
            .map_err(|_| StoreError::Poisoned("points cache"))?;
        Ok(points.contains_key(id))
    }
}

// ============================================================================
// TESTS
// ============================================================================
