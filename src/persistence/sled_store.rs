//! Persistence layer backed by `sled`
//!
//! Three trees live in one database:
//! - `last_locations`: keyed by driver id, one entry per driver, overwritten
//!   on every upsert
//! - `broadcasts`: notice records
//! - `alerts`: archived emergency alerts
//!
//! History keys are prefixed with a zero-padded timestamp so iteration yields
//! records in chronological order. `max_history` optionally caps each history
//! tree; when exceeded the oldest entries are removed.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sled::{Db, Tree};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AlertArchive, BroadcastStore, LocationStore};
use crate::model::{AlertEvent, BroadcastRecord, LastKnownLocation, Location, NewBroadcast};
use crate::utils::error::StoreError;

const LOCATIONS_TREE: &str = "last_locations";
const BROADCASTS_TREE: &str = "broadcasts";
const ALERTS_TREE: &str = "alerts";

#[derive(Clone)]
pub struct Persistence {
    db: Db,
    locations: Tree,
    broadcasts: Tree,
    alerts: Tree,
    max_history: Option<usize>,
}

impl Persistence {
    /// Open or create a sled database at `path`.
    pub fn open(path: &str, max_history: Option<usize>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self {
            locations: db.open_tree(LOCATIONS_TREE)?,
            broadcasts: db.open_tree(BROADCASTS_TREE)?,
            alerts: db.open_tree(ALERTS_TREE)?,
            db,
            max_history,
        })
    }

    /// Number of drivers with a stored last location.
    pub fn tracked_drivers(&self) -> usize {
        self.locations.len()
    }

    /// Flush pending writes to disk.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.db.flush_async().await?;
        Ok(())
    }

    fn append<T: Serialize>(
        &self,
        tree: &Tree,
        timestamp: i64,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let key = format!("{timestamp:020}_{id}");
        tree.insert(key.as_bytes(), serde_json::to_vec(value)?)?;

        if let Some(max) = self.max_history {
            let total = tree.len();
            if total > max {
                let keys_to_delete: Vec<_> = tree
                    .iter()
                    .take(total - max)
                    .filter_map(|entry| entry.ok().map(|(k, _)| k))
                    .collect();

                for key in keys_to_delete {
                    if let Err(e) = tree.remove(key) {
                        warn!(error = %e, "failed to trim history entry");
                    }
                }
            }
        }
        Ok(())
    }

    fn history<T: DeserializeOwned>(tree: &Tree) -> Result<Vec<T>, StoreError> {
        tree.iter()
            .map(|entry| -> Result<T, StoreError> {
                let (_, value) = entry?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }
}

#[async_trait]
impl LocationStore for Persistence {
    async fn upsert_last_location(
        &self,
        driver_id: &str,
        location: &Location,
        timestamp: i64,
    ) -> Result<(), StoreError> {
        let row = LastKnownLocation {
            driver_id: driver_id.to_string(),
            location: *location,
            last_updated: timestamp,
        };
        self.locations
            .insert(driver_id.as_bytes(), serde_json::to_vec(&row)?)?;
        debug!(driver_id, "last location stored");
        Ok(())
    }

    async fn get_last_location(
        &self,
        driver_id: &str,
    ) -> Result<Option<LastKnownLocation>, StoreError> {
        match self.locations.get(driver_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BroadcastStore for Persistence {
    async fn create_broadcast_record(&self, broadcast: &NewBroadcast) -> Result<String, StoreError> {
        let record = BroadcastRecord {
            id: Uuid::new_v4().to_string(),
            sender: broadcast.sender.clone(),
            title: broadcast.title.clone(),
            message: broadcast.message.clone(),
            audience: broadcast.audience.clone(),
            created_at: Utc::now().timestamp_millis(),
        };
        self.append(&self.broadcasts, record.created_at, &record.id, &record)?;
        Ok(record.id)
    }

    async fn list_broadcasts(&self) -> Result<Vec<BroadcastRecord>, StoreError> {
        Self::history(&self.broadcasts)
    }
}

#[async_trait]
impl AlertArchive for Persistence {
    async fn archive_alert(&self, alert: &AlertEvent) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        self.append(&self.alerts, alert.timestamp, &id, alert)
    }

    async fn alert_history(&self) -> Result<Vec<AlertEvent>, StoreError> {
        Self::history(&self.alerts)
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("db", &"sled::Db")
            .field("max_history", &self.max_history)
            .finish()
    }
}
