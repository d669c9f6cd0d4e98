use serde::{Deserialize, Serialize};

use crate::client::JoinAttributes;
use crate::dispatch::{AlertRequest, LocationUpdate};
use crate::model::LastKnownLocation;

/// Frames a client may send, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Join(JoinAttributes),

    LocationUpdate(LocationUpdate),

    Alert(AlertRequest),

    #[serde(rename_all = "camelCase")]
    Broadcast {
        #[serde(default)]
        sender_id: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        message: String,
        #[serde(default)]
        audience: String,
    },

    #[serde(rename_all = "camelCase")]
    ClassBroadcast {
        #[serde(default)]
        teacher_id: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        message: String,
    },

    #[serde(rename_all = "camelCase")]
    LastLocation { driver_id: String },
}

/// Direct replies to the sending session. Topic traffic uses
/// [`crate::broker::Event`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Joined {
        topics: Vec<String>,
    },

    #[serde(rename_all = "camelCase")]
    BroadcastAccepted {
        record_id: String,
        recipients: usize,
        delivered: usize,
    },

    #[serde(rename_all = "camelCase")]
    LastLocation {
        driver_id: String,
        location: Option<LastKnownLocation>,
    },

    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
