//! User-defined alert configuration.

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::EventFilter;

/// Channels an alert can be delivered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// SMTP email.
    Email,
    /// Telegram bot message.
    Telegram,
    /// HTTP webhook.
    Webhook,
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Email => "email",
            Self::Telegram => "telegram",
            Self::Webhook => "webhook",
        };
        f.write_str(s)
    }
}

/// SMTP delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP relay port.
    pub smtp_port: u16,
    /// Relay username.
    pub smtp_user: String,
    /// Relay password.
    pub smtp_password: String,
    /// Sender address.
    pub from_email: String,
    /// Recipient addresses.
    pub to_emails: Vec<String>,
    /// Upgrade the connection via STARTTLS.
    pub use_tls: bool,
}

/// Telegram delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token.
    pub bot_token: String,
    /// Destination chat ids.
    pub chat_ids: Vec<String>,
}

/// Webhook delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Destination URL.
    pub url: String,
    /// HTTP method, default POST.
    #[serde(default = "default_webhook_method")]
    pub method: String,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

fn default_webhook_method() -> String {
    "POST".to_string()
}

/// What fires an alert.
///
/// Event-stream alerts carry a filter; the threshold fields exist for
/// API compatibility with clients that express simple price/volume rules and
/// are translated to filters by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlertTrigger {
    /// Event filter applied to the stream; `None` matches everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_filter: Option<EventFilter>,
    /// Optional absolute price threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_threshold: Option<f64>,
    /// Optional absolute volume threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_threshold: Option<f64>,
    /// Optional symbol the threshold fields refer to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl AlertTrigger {
    /// A trigger firing on events matching `filter`.
    #[must_use]
    pub fn on_events(filter: EventFilter) -> Self {
        Self {
            event_filter: Some(filter),
            ..Self::default()
        }
    }
}

/// Complete configuration and runtime state of one alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Unique alert identifier.
    pub alert_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Disabled alerts keep their subscription but never deliver.
    pub enabled: bool,
    /// Firing condition.
    pub trigger: AlertTrigger,
    /// Channels to deliver over.
    pub delivery_methods: BTreeSet<DeliveryMethod>,
    /// Email settings; falls back to engine defaults when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_config: Option<EmailConfig>,
    /// Telegram settings; falls back to engine defaults when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_config: Option<TelegramConfig>,
    /// Webhook settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_config: Option<WebhookConfig>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Last delivery time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<DateTime<Utc>>,
    /// Deliveries performed.
    pub trigger_count: u64,
    /// Minimum seconds between deliveries of this alert.
    pub cooldown_seconds: u64,
}

impl AlertConfig {
    /// A new enabled alert with the given id, name and trigger.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger: AlertTrigger) -> Self {
        let now = Utc::now();
        Self {
            alert_id: id.into(),
            name: name.into(),
            description: String::new(),
            enabled: true,
            trigger,
            delivery_methods: BTreeSet::new(),
            email_config: None,
            telegram_config: None,
            webhook_config: None,
            created_at: now,
            updated_at: now,
            last_triggered: None,
            trigger_count: 0,
            cooldown_seconds: 60,
        }
    }

    /// Builder-style delivery method registration.
    #[must_use]
    pub fn with_delivery(mut self, method: DeliveryMethod) -> Self {
        self.delivery_methods.insert(method);
        self
    }

    /// Cooldown as a [`Duration`].
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}
