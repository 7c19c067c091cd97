//! Submission service
//!
//! Runs one form submission end to end:
//! `Idle → Validating → Persisting → (Notifying) → Completed`, or `Failed`.
//!
//! Validation happens before any external call. Persisting the row is the
//! only required side effect and runs under a timeout with a bounded retry on
//! transient failures. The operator e-mail is best effort: its outcome is
//! logged and reported in the receipt but never fails the submission.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::clients::{Notification, Notifier, TabularStore};
use crate::config::EnvironmentConfig;
use crate::models::booking::{BookingRecord, Channel};
use crate::services::booking_id::{now_ist, BookingIdGenerator};
use crate::services::normalization::{normalize, NormalizedSubmission};
use crate::utils::errors::{StoreError, SubmissionError};
use crate::utils::validation::{describe, validate_date, validate_email, validate_mobile};

/// Source of the current time, in IST
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionState {
    Idle,
    Validating,
    Persisting,
    Notifying,
    Completed,
    Failed,
}

/// Result of the best-effort notification step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum NotificationOutcome {
    Delivered,
    /// No notifier configured
    Disabled,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub booking_id: String,
    pub record: BookingRecord,
    pub notification: NotificationOutcome,
    /// Store attempts spent on the row, retries included
    pub attempts: u32,
    pub states: Vec<SubmissionState>,
}

#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub store_timeout: Duration,
    pub max_retries: u32,
    pub notify_timeout: Duration,
    pub home_country_code: String,
    pub id_suffix_len: usize,
}

impl SubmissionSettings {
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self {
            store_timeout: config.store_timeout,
            max_retries: config.store_max_retries,
            notify_timeout: config.notification.timeout,
            home_country_code: config.default_country_code.clone(),
            id_suffix_len: config.booking_id_suffix_len,
        }
    }
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            max_retries: 1,
            notify_timeout: Duration::from_secs(5),
            home_country_code: "91".to_string(),
            id_suffix_len: 4,
        }
    }
}

pub struct SubmissionService {
    store: Arc<dyn TabularStore>,
    notifier: Option<Arc<dyn Notifier>>,
    ids: BookingIdGenerator,
    clock: Clock,
    settings: SubmissionSettings,
}

impl fmt::Debug for SubmissionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionService")
            .field("notifier", &self.notifier.is_some())
            .field("ids", &self.ids)
            .field("settings", &self.settings)
            .finish()
    }
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn TabularStore>,
        notifier: Option<Arc<dyn Notifier>>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            ids: BookingIdGenerator::new(settings.id_suffix_len),
            clock: Arc::new(now_ist),
            settings,
        }
    }

    /// Replace the clock (tests)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Validate, persist and announce one submission
    #[tracing::instrument(skip(self, raw), fields(table = channel.table()))]
    pub async fn submit(
        &self,
        raw: &Map<String, Value>,
        channel: Channel,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut states = vec![SubmissionState::Idle, SubmissionState::Validating];
        let now = (self.clock)();

        let normalized = normalize(raw, channel);
        if let Err(message) = self.validate(&normalized, now) {
            states.push(SubmissionState::Failed);
            log::warn!("⚠️ {} rejected: {} ({:?})", channel.label(), message, states);
            return Err(SubmissionError::Validation(message));
        }

        let booking_id = self.ids.generate(channel, now);
        let record = normalized.into_record(booking_id.clone(), now);

        states.push(SubmissionState::Persisting);
        let attempts = match self.persist(channel.table(), &record).await {
            Ok(attempts) => attempts,
            Err(err) => {
                states.push(SubmissionState::Failed);
                log::error!("❌ Could not persist {} {}: {}", channel.label(), booking_id, err);
                return Err(SubmissionError::PersistenceFailed(err));
            }
        };
        log::info!("💾 {} {} saved to '{}'", channel.label(), booking_id, channel.table());

        let notification = match &self.notifier {
            Some(notifier) => {
                states.push(SubmissionState::Notifying);
                self.notify(notifier.as_ref(), &record).await
            }
            None => NotificationOutcome::Disabled,
        };
        states.push(SubmissionState::Completed);

        Ok(SubmissionReceipt {
            booking_id,
            record,
            notification,
            attempts,
            states,
        })
    }

    /// Channel rules. Returns the message shown to the user.
    fn validate(&self, submission: &NormalizedSubmission, now: DateTime<FixedOffset>) -> Result<(), String> {
        let country = submission
            .country_code
            .as_deref()
            .unwrap_or(&self.settings.home_country_code);
        validate_mobile(
            submission.mobile_number.as_deref().unwrap_or_default(),
            country,
            &self.settings.home_country_code,
        )
        .map_err(|e| describe(&e))?;

        match submission.channel {
            Channel::Booking | Channel::Lead if submission.pickup_city.is_none() => {
                return Err("Pickup city is required".to_string());
            }
            Channel::Career if submission.pickup_city.is_none() => {
                return Err("City is required".to_string());
            }
            Channel::Contact if submission.comments.is_none() => {
                return Err("Message is required".to_string());
            }
            _ => {}
        }

        if let Some(email) = submission.email.as_deref() {
            validate_email(email).map_err(|e| describe(&e))?;
        }

        if let Some(date) = submission.travel_date.as_deref() {
            let date = validate_date(date).map_err(|e| describe(&e))?;
            if date < now.date_naive() {
                return Err("Travel date cannot be in the past".to_string());
            }
        }

        Ok(())
    }

    /// Append the record, retrying transient failures. Returns the attempts used.
    async fn persist(&self, table: &str, record: &BookingRecord) -> Result<u32, StoreError> {
        let row = record.to_row();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match tokio::time::timeout(
                self.settings.store_timeout,
                self.store.append_row(table, &row),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(self.settings.store_timeout.as_millis())),
            };

            match result {
                Ok(()) => return Ok(attempt),
                Err(err) if err.is_transient() && attempt <= self.settings.max_retries => {
                    log::warn!("🔄 Store attempt {} failed ({}), retrying", attempt, err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn notify(&self, notifier: &dyn Notifier, record: &BookingRecord) -> NotificationOutcome {
        let notification = build_notification(record);
        match tokio::time::timeout(self.settings.notify_timeout, notifier.send(&notification)).await {
            Ok(Ok(())) => NotificationOutcome::Delivered,
            Ok(Err(err)) => {
                log::warn!("📭 Notification for {} not sent: {}", record.booking_id, err);
                NotificationOutcome::Failed(err.to_string())
            }
            Err(_) => {
                log::warn!("📭 Notification for {} timed out", record.booking_id);
                NotificationOutcome::Failed("notification timed out".to_string())
            }
        }
    }
}

/// Minimal HTML escaping for text nodes and attribute values
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Operator e-mail for a persisted record
pub fn build_notification(record: &BookingRecord) -> Notification {
    let single_line = |value: &str| value.replace(['\r', '\n'], " ");
    let subject = match record.channel {
        Channel::Booking => format!("🚖 New Booking: {}", single_line(&record.pickup_city)),
        Channel::Lead => format!("⚡ New Quick Lead: {}", single_line(&record.customer_name)),
        Channel::Contact => format!("✉️ New Inquiry: {}", single_line(&record.customer_name)),
        Channel::Career => format!("🧑‍✈️ New Driver Application: {}", single_line(&record.customer_name)),
    };

    let mut fields: Vec<(&str, &str)> = vec![
        ("Booking ID", record.booking_id.as_str()),
        ("Name", record.customer_name.as_str()),
        ("Mobile", record.mobile_number.as_str()),
        ("Email", record.email.as_str()),
    ];
    match record.channel {
        Channel::Booking | Channel::Lead => fields.extend([
            ("Pickup", record.pickup_city.as_str()),
            ("Drop", record.drop_city.as_str()),
            ("Date", record.travel_date.as_str()),
            ("Journey", record.journey_type.as_str()),
            ("Vehicle", record.vehicle_type.as_str()),
            ("Travelers", record.travelers.as_str()),
        ]),
        Channel::Contact => fields.push(("City", record.pickup_city.as_str())),
        Channel::Career => fields.extend([
            ("City / Area", record.pickup_city.as_str()),
            ("License", record.vehicle_type.as_str()),
        ]),
    }
    if record.is_corporate {
        fields.push(("Company", record.company_name.as_str()));
    }
    fields.push(("Comments", record.comments.as_str()));

    let rows: String = fields
        .iter()
        .map(|(label, value)| {
            format!(
                "<tr><td style=\"padding:4px 12px 4px 0\"><strong>{}</strong></td><td>{}</td></tr>",
                label,
                escape_html(value)
            )
        })
        .collect();

    let html = format!(
        "<h2>{}</h2><p>Received {}</p><table>{}</table>",
        escape_html(record.channel.label()),
        escape_html(&record.timestamp()),
        rows
    );

    Notification { subject, html }
}
