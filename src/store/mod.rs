//! Refresh-token storage.
//!
//! The gate only needs a fast keyed read (`find_by_value`) and the sweeper a
//! bulk delete; `insert`/`delete_by_value` complete the contract for the
//! login and logout collaborators that live outside this crate.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::RefreshRecord;

#[async_trait]
pub trait RefreshStore: Send + Sync {
    async fn find_by_value(&self, token_value: &str) -> Result<Option<RefreshRecord>, StoreError>;

    async fn insert(&self, record: RefreshRecord) -> Result<(), StoreError>;

    async fn delete_by_value(&self, token_value: &str) -> Result<(), StoreError>;

    /// Bulk-delete every record with `expiration <= cutoff`. Returns the
    /// number of records removed. A record expiring exactly at `cutoff`
    /// counts as expired.
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
