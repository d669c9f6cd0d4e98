//! In-memory collaborators for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

use crate::broker::Event;
use crate::directory::UserDirectory;
use crate::dispatch::Background;
use crate::model::{AlertEvent, Audience, BroadcastRecord, LastKnownLocation, Location, NewBroadcast};
use crate::notifier::Notifier;
use crate::persistence::{AlertArchive, BroadcastStore, LocationStore};
use crate::utils::error::{DirectoryError, NotifyError, StoreError};

pub fn background() -> Background {
    Background::new(16, Duration::from_secs(5))
}

/// Every event currently queued on `rx`.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<WsMessage>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let WsMessage::Text(text) = msg {
            events.push(serde_json::from_str(text.as_str()).expect("event frame"));
        }
    }
    events
}

#[derive(Default)]
pub struct MemoryStore {
    pub locations: Mutex<HashMap<String, LastKnownLocation>>,
    pub broadcasts: Mutex<Vec<BroadcastRecord>>,
    pub alerts: Mutex<Vec<AlertEvent>>,
    pub fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn upsert_last_location(
        &self,
        driver_id: &str,
        location: &Location,
        timestamp: i64,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.locations.lock().unwrap().insert(
            driver_id.to_string(),
            LastKnownLocation {
                driver_id: driver_id.to_string(),
                location: *location,
                last_updated: timestamp,
            },
        );
        Ok(())
    }

    async fn get_last_location(
        &self,
        driver_id: &str,
    ) -> Result<Option<LastKnownLocation>, StoreError> {
        self.check()?;
        Ok(self.locations.lock().unwrap().get(driver_id).cloned())
    }
}

#[async_trait]
impl BroadcastStore for MemoryStore {
    async fn create_broadcast_record(&self, broadcast: &NewBroadcast) -> Result<String, StoreError> {
        self.check()?;
        let mut records = self.broadcasts.lock().unwrap();
        let id = format!("record-{}", records.len() + 1);
        records.push(BroadcastRecord {
            id: id.clone(),
            sender: broadcast.sender.clone(),
            title: broadcast.title.clone(),
            message: broadcast.message.clone(),
            audience: broadcast.audience.clone(),
            created_at: 0,
        });
        Ok(id)
    }

    async fn list_broadcasts(&self) -> Result<Vec<BroadcastRecord>, StoreError> {
        self.check()?;
        Ok(self.broadcasts.lock().unwrap().clone())
    }
}

#[async_trait]
impl AlertArchive for MemoryStore {
    async fn archive_alert(&self, alert: &AlertEvent) -> Result<(), StoreError> {
        self.check()?;
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }

    async fn alert_history(&self) -> Result<Vec<AlertEvent>, StoreError> {
        self.check()?;
        Ok(self.alerts.lock().unwrap().clone())
    }
}

/// Returns a fixed address list for every audience, remembering the queries.
#[derive(Default)]
pub struct FixedDirectory {
    pub addresses: Vec<String>,
    pub queries: Mutex<Vec<(Audience, bool)>>,
    pub fail: bool,
}

impl FixedDirectory {
    pub fn with(addresses: &[&str]) -> Self {
        Self {
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl UserDirectory for FixedDirectory {
    async fn resolve_recipients(
        &self,
        audience: &Audience,
        approved_only: bool,
    ) -> Result<Vec<String>, DirectoryError> {
        self.queries
            .lock()
            .unwrap()
            .push((audience.clone(), approved_only));
        if self.fail {
            return Err(DirectoryError::Unavailable("simulated outage".to_string()));
        }
        Ok(self.addresses.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Notice { to: Vec<String>, title: String },
    Alert { to: Vec<String>, driver_id: String },
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_notice(
        &self,
        addresses: &[String],
        title: &str,
        _message: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Sent::Notice {
            to: addresses.to_vec(),
            title: title.to_string(),
        });
        if self.fail {
            return Err(NotifyError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    async fn send_alert(
        &self,
        addresses: &[String],
        alert: &AlertEvent,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Sent::Alert {
            to: addresses.to_vec(),
            driver_id: alert.driver_id.clone(),
        });
        if self.fail {
            return Err(NotifyError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

/// A collaborator whose calls never complete.
#[derive(Default)]
pub struct Stalled;

#[async_trait]
impl Notifier for Stalled {
    async fn send_notice(&self, _: &[String], _: &str, _: &str) -> Result<(), NotifyError> {
        std::future::pending().await
    }

    async fn send_alert(&self, _: &[String], _: &AlertEvent) -> Result<(), NotifyError> {
        std::future::pending().await
    }
}

#[async_trait]
impl LocationStore for Stalled {
    async fn upsert_last_location(&self, _: &str, _: &Location, _: i64) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn get_last_location(&self, _: &str) -> Result<Option<LastKnownLocation>, StoreError> {
        std::future::pending().await
    }
}

#[async_trait]
impl AlertArchive for Stalled {
    async fn archive_alert(&self, _: &AlertEvent) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn alert_history(&self) -> Result<Vec<AlertEvent>, StoreError> {
        std::future::pending().await
    }
}
