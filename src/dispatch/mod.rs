//! The `dispatch` module turns inbound events into fan-out plus side effects.
//!
//! - `location`: driver position samples to trip and global topics, then a
//!   best-effort last-location upsert
//! - `alert`: emergency alerts to the global and trip topics
//! - `notice`: audience-scoped broadcasts with an audit record and email
//! - `background`: the bounded runner every side effect goes through
//!
//! Fan-out always happens synchronously on the caller's task. Side effects are
//! spawned and never awaited by the caller; their failures are logged.

pub mod alert;
pub mod background;
pub mod location;
pub mod notice;

pub use alert::{AlertDispatcher, AlertRequest};
pub use background::Background;
pub use location::{LocationFanout, LocationUpdate};
pub use notice::{BroadcastDispatcher, BroadcastReceipt};

use crate::utils::error::ValidationError;

pub(crate) fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(value)
    }
}

pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange { field, value })
    }
}

pub(crate) fn coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&finite("lat", lat)?) {
        return Err(ValidationError::OutOfRange { field: "lat", value: lat });
    }
    if !(-180.0..=180.0).contains(&finite("lng", lng)?) {
        return Err(ValidationError::OutOfRange { field: "lng", value: lng });
    }
    Ok(())
}
