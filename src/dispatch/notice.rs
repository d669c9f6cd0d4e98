//! Audience-scoped notices
//!
//! A broadcast is single-shot: validate, persist the audit record, resolve the
//! recipient addresses, fan the notice out, then hand the email to the
//! background runner. Only a failed record write aborts the broadcast; the
//! email outcome is never part of the result.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::{Background, require};
use crate::broker::{Event, TopicKey, TopicRegistry};
use crate::directory::UserDirectory;
use crate::model::{Audience, NewBroadcast};
use crate::notifier::Notifier;
use crate::persistence::BroadcastStore;
use crate::utils::error::{BroadcastError, ValidationError};

const DEFAULT_SENDER: &str = "admin";
const DEFAULT_CLASS_TITLE: &str = "Class Notice";

/// What the caller of a broadcast gets back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReceipt {
    /// Id of the persisted record.
    pub record_id: String,
    /// Number of resolved email recipients.
    pub recipients: usize,
    /// Number of sessions the notice was enqueued for.
    pub delivered: usize,
}

#[derive(Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<TopicRegistry>,
    store: Arc<dyn BroadcastStore>,
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    background: Background,
}

impl BroadcastDispatcher {
    pub fn new(
        registry: Arc<TopicRegistry>,
        store: Arc<dyn BroadcastStore>,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        background: Background,
    ) -> Self {
        Self {
            registry,
            store,
            directory,
            notifier,
            background,
        }
    }

    /// Publishes a notice to `audience`: `"all"` goes to the global topic,
    /// any other tag to that role's topic.
    pub async fn create_broadcast(
        &self,
        sender: &str,
        title: &str,
        message: &str,
        audience: &str,
    ) -> Result<BroadcastReceipt, BroadcastError> {
        let title = require("title", title)?;
        let message = require("message", message)?;
        let audience = match Audience::parse(require("audience", audience)?) {
            Audience::All => Audience::All,
            Audience::Role(role) => Audience::Role(role),
            other => return Err(ValidationError::Audience(other.to_string()).into()),
        };

        let sender = match sender.trim() {
            "" => DEFAULT_SENDER,
            s => s,
        };

        self.dispatch(NewBroadcast {
            sender: sender.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            audience,
        })
        .await
    }

    /// Publishes a notice from a class teacher to their class topic and emails
    /// the teacher's approved students.
    pub async fn create_class_broadcast(
        &self,
        teacher_id: &str,
        title: &str,
        message: &str,
    ) -> Result<BroadcastReceipt, BroadcastError> {
        let teacher_id = require("teacherId", teacher_id)?;
        let message = require("message", message)?;
        let title = match title.trim() {
            "" => DEFAULT_CLASS_TITLE,
            t => t,
        };

        self.dispatch(NewBroadcast {
            sender: teacher_id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            audience: Audience::Class(teacher_id.to_string()),
        })
        .await
    }

    async fn dispatch(&self, broadcast: NewBroadcast) -> Result<BroadcastReceipt, BroadcastError> {
        let record_id = self.store.create_broadcast_record(&broadcast).await?;

        let recipients = match self
            .directory
            .resolve_recipients(&broadcast.audience, true)
            .await
        {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!(
                    record_id = %record_id,
                    audience = %broadcast.audience,
                    error = %e,
                    "recipient lookup failed, continuing without email"
                );
                Vec::new()
            }
        };

        let topic = match &broadcast.audience {
            Audience::All => TopicKey::Global,
            Audience::Role(role) => TopicKey::role(role.as_str()),
            Audience::Class(teacher) => TopicKey::class(teacher.as_str()),
            Audience::Trip(driver) => TopicKey::trip(driver.as_str()),
        };
        let delivered = self.registry.publish(
            &topic,
            &Event::Notice {
                title: broadcast.title.clone(),
                message: broadcast.message.clone(),
                sender: broadcast.sender.clone(),
                timestamp: Utc::now().timestamp_millis(),
            },
        );

        let count = recipients.len();
        if !recipients.is_empty() {
            let notifier = self.notifier.clone();
            let NewBroadcast { title, message, .. } = broadcast.clone();
            self.background.spawn("notice_email", async move {
                notifier.send_notice(&recipients, &title, &message).await
            });
        }

        info!(
            record_id = %record_id,
            audience = %broadcast.audience,
            recipients = count,
            delivered,
            "broadcast issued"
        );

        Ok(BroadcastReceipt {
            record_id,
            recipients: count,
            delivered,
        })
    }
}
