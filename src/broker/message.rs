//! Outbound events
//!
//! `Event` is everything the registry fans out to sessions. Frames are JSON
//! objects tagged by `type` with camelCase field names:
//!
//! - `liveLocation`: full sample, sent to the driver's trip topic
//! - `fleetLocation`: driver id and coordinates only, sent to the global topic
//! - `alertBroadcast`: emergency alert, sent to the global and trip topics
//! - `notice`: audience-scoped broadcast, sent to the global, role or class topic

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    LiveLocation {
        driver_id: String,
        lat: f64,
        lng: f64,
        heading: f64,
        speed: f64,
    },

    #[serde(rename_all = "camelCase")]
    FleetLocation { driver_id: String, lat: f64, lng: f64 },

    #[serde(rename_all = "camelCase")]
    AlertBroadcast {
        driver_id: String,
        kind: AlertKind,
        message: String,
        lat: f64,
        lng: f64,
        timestamp: i64,
    },

    Notice {
        title: String,
        message: String,
        sender: String,
        timestamp: i64,
    },
}
