//! Records exchanged between the dispatchers and their collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::broker::AlertKind;

/// A position fix as reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub heading: f64,
    pub speed: f64,
}

/// One accepted location update, stamped on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub driver_id: String,
    pub location: Location,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: i64,
}

/// The row kept per driver for late joiners. Overwritten on every sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastKnownLocation {
    pub driver_id: String,
    pub location: Location,
    pub last_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub driver_id: String,
    pub kind: AlertKind,
    pub message: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: i64,
}

/// Who a notice is meant for.
///
/// `All` and `Role` come from the `audience` tag of an admin broadcast;
/// `Class` targets one teacher's students and `Trip` one driver's passengers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Audience {
    All,
    Role(String),
    Class(String),
    Trip(String),
}

impl Audience {
    /// Parses an audience tag. `"all"` is the whole campus, `class:<id>` and
    /// `trip:<id>` are scoped audiences, anything else is a role name.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        if tag == "all" {
            Audience::All
        } else if let Some(teacher) = tag.strip_prefix("class:") {
            Audience::Class(teacher.to_string())
        } else if let Some(driver) = tag.strip_prefix("trip:") {
            Audience::Trip(driver.to_string())
        } else {
            Audience::Role(tag.to_string())
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::All => f.write_str("all"),
            Audience::Role(role) => f.write_str(role),
            Audience::Class(teacher) => write!(f, "class:{teacher}"),
            Audience::Trip(driver) => write!(f, "trip:{driver}"),
        }
    }
}

impl From<Audience> for String {
    fn from(audience: Audience) -> Self {
        audience.to_string()
    }
}

impl From<String> for Audience {
    fn from(tag: String) -> Self {
        Audience::parse(&tag)
    }
}

/// A notice as submitted, before it has been given an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBroadcast {
    pub sender: String,
    pub title: String,
    pub message: String,
    pub audience: Audience,
}

/// The persisted audit record of a notice. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRecord {
    pub id: String,
    pub sender: String,
    pub title: String,
    pub message: String,
    pub audience: Audience,
    pub created_at: i64,
}
