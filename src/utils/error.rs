//! The `error` module defines the error types used within the relay.
//!
//! Live delivery has no failure mode, so these types only describe rejected
//! input and collaborator failures.

use thiserror::Error;

/// A malformed or incomplete inbound event. Nothing has been published or
/// persisted when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("unsupported audience: {0}")]
    Audience(String),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("failed to encode or decode record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notifier rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("could not resolve recipients: {0}")]
    Directory(#[from] DirectoryError),

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Failure of `create_broadcast`. Email delivery never shows up here.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to persist broadcast record: {0}")]
    Store(#[from] StoreError),
}

/// Failure to assemble the relay from its settings.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open storage: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build notifier: {0}")]
    Notifier(#[from] NotifyError),
}
