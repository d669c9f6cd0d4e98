//! The `notifier` module sends email notifications for notices and alerts.
//!
//! Notifications are always dispatched off the live path; callers never wait
//! on them and their outcome is only logged.

use async_trait::async_trait;
use tracing::info;

use crate::model::AlertEvent;
use crate::utils::error::NotifyError;

pub mod template;
pub mod webhook;

pub use webhook::WebhookNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_notice(
        &self,
        addresses: &[String],
        title: &str,
        message: &str,
    ) -> Result<(), NotifyError>;

    /// Urgent variant for emergency alerts.
    async fn send_alert(&self, addresses: &[String], alert: &AlertEvent)
    -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of sending them. Used when no mail
/// relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_notice(
        &self,
        addresses: &[String],
        title: &str,
        _message: &str,
    ) -> Result<(), NotifyError> {
        info!(recipients = addresses.len(), title, "notice email (log only)");
        Ok(())
    }

    async fn send_alert(
        &self,
        addresses: &[String],
        alert: &AlertEvent,
    ) -> Result<(), NotifyError> {
        info!(
            recipients = addresses.len(),
            driver_id = %alert.driver_id,
            "SOS email (log only)"
        );
        Ok(())
    }
}
