//! In-memory refresh store for tests and local development.
//!
//! A concurrent read during the sweep observes either the old record or its
//! absence, never a partial one — `DashMap` gives that per-entry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::RefreshStore;
use crate::errors::StoreError;
use crate::models::RefreshRecord;

#[derive(Clone, Default)]
pub struct MemoryRefreshStore {
    records: Arc<DashMap<String, DateTime<Utc>>>,
}

impl MemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RefreshStore for MemoryRefreshStore {
    async fn find_by_value(&self, token_value: &str) -> Result<Option<RefreshRecord>, StoreError> {
        Ok(self.records.get(token_value).map(|entry| RefreshRecord {
            token_value: token_value.to_string(),
            expiration: *entry.value(),
        }))
    }

    async fn insert(&self, record: RefreshRecord) -> Result<(), StoreError> {
        self.records.insert(record.token_value, record.expiration);
        Ok(())
    }

    async fn delete_by_value(&self, token_value: &str) -> Result<(), StoreError> {
        self.records.remove(token_value);
        Ok(())
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.records.len();
        self.records.retain(|_, expiration| *expiration > cutoff);
        Ok((before - self.records.len()) as u64)
    }
}

// ── Tests ────────────────────────────────────────────────────
