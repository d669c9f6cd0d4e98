//! Mail relay over HTTP.
//!
//! Each notification becomes one JSON POST to the configured relay endpoint.
//! Recipients go in `bcc` and the sender address in `to`, so recipients never
//! see each other.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::Notifier;
use super::template;
use crate::model::AlertEvent;
use crate::utils::error::NotifyError;

#[derive(Debug, Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: &'a str,
    bcc: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
    from: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: String, from: String, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!(endpoint = %endpoint, "mail relay configured");
        Ok(Self {
            client,
            endpoint,
            from,
        })
    }

    async fn deliver(&self, bcc: &[String], subject: &str, html: &str) -> Result<(), NotifyError> {
        if bcc.is_empty() {
            return Ok(());
        }

        let email = OutboundEmail {
            from: &self.from,
            to: &self.from,
            bcc,
            subject,
            html,
        };
        let response = self.client.post(&self.endpoint).json(&email).send().await?;

        let status = response.status();
        if status.is_success() {
            info!(recipients = bcc.len(), subject, "email sent");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "mail relay rejected email");
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_notice(
        &self,
        addresses: &[String],
        title: &str,
        message: &str,
    ) -> Result<(), NotifyError> {
        let subject = template::notice_subject(title);
        let html = template::notice_html(title, message);
        self.deliver(addresses, &subject, &html).await
    }

    async fn send_alert(
        &self,
        addresses: &[String],
        alert: &AlertEvent,
    ) -> Result<(), NotifyError> {
        let html = template::alert_html(alert);
        self.deliver(addresses, template::ALERT_SUBJECT, &html).await
    }
}
