//! Location fan-out
//!
//! A driver's sample goes out in strict order: the full sample to the driver's
//! trip topic, the reduced fleet sample to the global topic, and only then is
//! the last-location upsert spawned. The upsert is a best-effort cache for late
//! joiners and never delays or fails the live feed.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Background, coordinates, finite, require};
use crate::broker::{Event, TopicKey, TopicRegistry};
use crate::model::{Location, LocationSample};
use crate::persistence::LocationStore;
use crate::utils::error::ValidationError;

/// A `locationUpdate` frame as received from a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub driver_id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub speed: f64,
}

impl LocationUpdate {
    fn validate(&self) -> Result<(), ValidationError> {
        require("driverId", &self.driver_id)?;
        coordinates(self.lat, self.lng)?;
        finite("heading", self.heading)?;
        finite("speed", self.speed)?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct LocationFanout {
    registry: Arc<TopicRegistry>,
    store: Arc<dyn LocationStore>,
    background: Background,
}

impl LocationFanout {
    pub fn new(
        registry: Arc<TopicRegistry>,
        store: Arc<dyn LocationStore>,
        background: Background,
    ) -> Self {
        Self {
            registry,
            store,
            background,
        }
    }

    pub fn publish_location(&self, update: LocationUpdate) -> Result<LocationSample, ValidationError> {
        update.validate()?;

        let sample = LocationSample {
            driver_id: update.driver_id.trim().to_string(),
            location: Location {
                lat: update.lat,
                lng: update.lng,
                heading: update.heading,
                speed: update.speed,
            },
            timestamp: Utc::now().timestamp_millis(),
        };

        let live = self.registry.publish(
            &TopicKey::trip(sample.driver_id.as_str()),
            &Event::LiveLocation {
                driver_id: sample.driver_id.clone(),
                lat: sample.location.lat,
                lng: sample.location.lng,
                heading: sample.location.heading,
                speed: sample.location.speed,
            },
        );
        let fleet = self.registry.publish(
            &TopicKey::Global,
            &Event::FleetLocation {
                driver_id: sample.driver_id.clone(),
                lat: sample.location.lat,
                lng: sample.location.lng,
            },
        );
        debug!(driver_id = %sample.driver_id, live, fleet, "location fanned out");

        let store = self.store.clone();
        let row = sample.clone();
        self.background.spawn("upsert_last_location", async move {
            store
                .upsert_last_location(&row.driver_id, &row.location, row.timestamp)
                .await
        });

        Ok(sample)
    }
}
