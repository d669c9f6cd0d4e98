//! Emergency alerts
//!
//! An alert is published, unthrottled and unbuffered, to the global topic and
//! to the driver's trip topic. Archiving the alert and emailing the trip's
//! passengers are optional side calls that run in the background.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Background, coordinates, require};
use crate::broker::{AlertKind, Event, TopicKey, TopicRegistry};
use crate::directory::UserDirectory;
use crate::model::{AlertEvent, Audience};
use crate::notifier::Notifier;
use crate::persistence::AlertArchive;
use crate::utils::error::{NotifyError, ValidationError};

const DEFAULT_REASON: &str = "SOS";

/// An `alert` frame as received from a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRequest {
    pub driver_id: String,
    #[serde(default)]
    pub message: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone)]
pub struct AlertDispatcher {
    registry: Arc<TopicRegistry>,
    background: Background,
    archive: Option<Arc<dyn AlertArchive>>,
    email: Option<(Arc<dyn UserDirectory>, Arc<dyn Notifier>)>,
}

impl AlertDispatcher {
    pub fn new(registry: Arc<TopicRegistry>, background: Background) -> Self {
        Self {
            registry,
            background,
            archive: None,
            email: None,
        }
    }

    /// Archive every alert through `archive`.
    pub fn with_archive(mut self, archive: Arc<dyn AlertArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Email every alert to the approved passengers of the driver's bus.
    pub fn with_email(mut self, directory: Arc<dyn UserDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        self.email = Some((directory, notifier));
        self
    }

    pub fn publish_alert(&self, request: AlertRequest) -> Result<AlertEvent, ValidationError> {
        let driver_id = require("driverId", &request.driver_id)?.to_string();
        coordinates(request.lat, request.lng)?;

        let message = match request.message.trim() {
            "" => DEFAULT_REASON.to_string(),
            reason => reason.to_string(),
        };

        let alert = AlertEvent {
            driver_id,
            kind: AlertKind::Emergency,
            message,
            lat: request.lat,
            lng: request.lng,
            timestamp: Utc::now().timestamp_millis(),
        };
        let event = Event::AlertBroadcast {
            driver_id: alert.driver_id.clone(),
            kind: alert.kind,
            message: alert.message.clone(),
            lat: alert.lat,
            lng: alert.lng,
            timestamp: alert.timestamp,
        };

        let global = self.registry.publish(&TopicKey::Global, &event);
        let trip = self
            .registry
            .publish(&TopicKey::trip(alert.driver_id.as_str()), &event);
        info!(driver_id = %alert.driver_id, global, trip, "emergency alert fanned out");

        if let Some(archive) = &self.archive {
            let archive = archive.clone();
            let record = alert.clone();
            self.background.spawn("archive_alert", async move {
                archive.archive_alert(&record).await
            });
        }

        if let Some((directory, notifier)) = &self.email {
            self.background.spawn(
                "sos_email",
                email_passengers(directory.clone(), notifier.clone(), alert.clone()),
            );
        }

        Ok(alert)
    }
}

async fn email_passengers(
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    alert: AlertEvent,
) -> Result<(), NotifyError> {
    let audience = Audience::Trip(alert.driver_id.clone());
    let addresses = directory.resolve_recipients(&audience, true).await?;
    if addresses.is_empty() {
        return Ok(());
    }
    notifier.send_alert(&addresses, &alert).await
}
