//! The `persistence` module holds the storage collaborators the dispatchers
//! write through.
//!
//! None of them sit on the live delivery path. The location store is a
//! best-effort cache for late joiners; the broadcast store is the audit trail
//! of notices; the alert archive keeps emergency history.
//!
//! `sled_store::Persistence` implements all three on an embedded `sled`
//! database.

use async_trait::async_trait;

use crate::model::{AlertEvent, BroadcastRecord, LastKnownLocation, Location, NewBroadcast};
use crate::utils::error::StoreError;

pub mod sled_store;
pub use sled_store::Persistence;

/// Last-known position per driver. Writes are last-write-wins per key.
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn upsert_last_location(
        &self,
        driver_id: &str,
        location: &Location,
        timestamp: i64,
    ) -> Result<(), StoreError>;

    async fn get_last_location(
        &self,
        driver_id: &str,
    ) -> Result<Option<LastKnownLocation>, StoreError>;
}

#[async_trait]
pub trait BroadcastStore: Send + Sync {
    /// Persists the notice and returns the new record id.
    async fn create_broadcast_record(&self, broadcast: &NewBroadcast) -> Result<String, StoreError>;

    /// Stored notices, oldest first.
    async fn list_broadcasts(&self) -> Result<Vec<BroadcastRecord>, StoreError>;
}

#[async_trait]
pub trait AlertArchive: Send + Sync {
    async fn archive_alert(&self, alert: &AlertEvent) -> Result<(), StoreError>;

    /// Archived alerts, oldest first.
    async fn alert_history(&self) -> Result<Vec<AlertEvent>, StoreError>;
}
