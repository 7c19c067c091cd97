//! Resend e-mail client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{Notification, Notifier};
use crate::config::NotificationConfig;
use crate::utils::errors::NotifyError;

const RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    #[serde(skip_serializing_if = "no_recipients")]
    cc: &'a [String],
    subject: &'a str,
    html: &'a str,
}

fn no_recipients(list: &&[String]) -> bool {
    list.is_empty()
}

pub struct ResendNotifier {
    client: Client,
    api_key: String,
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
}

impl ResendNotifier {
    pub fn new(
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
        cc: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            from: from.into(),
            to,
            cc,
        })
    }

    /// Notifier for the configured operators, `None` when no API key is set
    pub fn from_config(config: &NotificationConfig) -> Result<Option<Self>, NotifyError> {
        match &config.api_key {
            Some(key) => Self::new(
                key.clone(),
                config.from.clone(),
                config.to.clone(),
                config.cc.clone(),
                config.timeout,
            )
            .map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let request = EmailRequest {
            from: &self.from,
            to: &self.to,
            cc: &self.cc,
            subject: &notification.subject,
            html: &notification.html,
        };

        let response = self
            .client
            .post(RESEND_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        log::info!("📧 Notification sent: {}", notification.subject);
        Ok(())
    }
}
