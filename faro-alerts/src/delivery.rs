//! Delivery channels: SMTP email, Telegram and webhooks.
//!
//! Every send is bounded by [`DELIVERY_TIMEOUT`]; failures are logged by the
//! worker and never disable the alert.

use std::time::Duration;

use faro_core::FaroError;
use faro_types::{AlertConfig, EmailConfig, TelegramConfig, WatchdogEvent, WebhookConfig};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde_json::json;
use tracing::{error, info};

/// Upper bound on each network delivery.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

fn event_symbol(event: &WatchdogEvent) -> &str {
    event.symbol().unwrap_or("N/A")
}

fn email_body(alert: &AlertConfig, event: &WatchdogEvent) -> String {
    format!(
        r#"<html>
  <body>
    <h2>Alert: {name}</h2>
    <p><strong>Description:</strong> {description}</p>
    <hr>
    <h3>Event Details</h3>
    <ul>
      <li><strong>Type:</strong> {event_type}</li>
      <li><strong>Severity:</strong> {severity}</li>
      <li><strong>Description:</strong> {event_description}</li>
      <li><strong>Asset:</strong> {asset}</li>
      <li><strong>Time:</strong> {timestamp}</li>
    </ul>
    <hr>
    <p><small>This is an automated alert from Faro</small></p>
  </body>
</html>"#,
        name = alert.name,
        description = alert.description,
        event_type = event.event_type,
        severity = event.severity,
        event_description = event.description,
        asset = event_symbol(event),
        timestamp = event.timestamp.to_rfc3339(),
    )
}

fn telegram_text(alert: &AlertConfig, event: &WatchdogEvent) -> String {
    let mut text = format!(
        "*Faro Alert: {}*\n\n*Event:* {}\n*Severity:* {}\n*Description:* {}\n",
        alert.name, event.event_type, event.severity, event.description
    );
    if let Some(symbol) = event.symbol() {
        text.push_str(&format!("*Asset:* {symbol}\n"));
    }
    text.push_str(&format!(
        "*Time:* {}\n",
        event.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    text
}

/// Send the alert over SMTP; the blocking transport runs on a worker thread.
pub async fn send_email(
    config: &EmailConfig,
    alert: &AlertConfig,
    event: &WatchdogEvent,
) -> Result<(), FaroError> {
    let mut builder = Message::builder()
        .from(config
            .from_email
            .parse()
            .map_err(|e| FaroError::InvalidArg(format!("bad from address: {e}")))?)
        .subject(format!("Faro Alert: {}", alert.name))
        .header(ContentType::TEXT_HTML);
    for to in &config.to_emails {
        builder = builder.to(to
            .parse()
            .map_err(|e| FaroError::InvalidArg(format!("bad recipient address: {e}")))?);
    }
    let message = builder
        .body(email_body(alert, event))
        .map_err(|e| FaroError::InvalidArg(format!("could not build email: {e}")))?;

    let transport = if config.use_tls {
        SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| FaroError::provider("smtp", e.to_string()))?
    } else {
        SmtpTransport::builder_dangerous(&config.smtp_host)
    }
    .port(config.smtp_port)
    .credentials(Credentials::new(
        config.smtp_user.clone(),
        config.smtp_password.clone(),
    ))
    .build();

    let alert_name = alert.name.clone();
    tokio::task::spawn_blocking(move || transport.send(&message))
        .await
        .map_err(|e| FaroError::provider("smtp", format!("send task failed: {e}")))?
        .map_err(|e| FaroError::provider("smtp", e.to_string()))?;

    info!(target = "faro::alerts::delivery", alert = %alert_name, "email sent");
    Ok(())
}

/// Send the alert to every configured Telegram chat.
///
/// A non-200 from one chat is logged and does not abort the rest.
pub async fn send_telegram(
    client: &reqwest::Client,
    config: &TelegramConfig,
    alert: &AlertConfig,
    event: &WatchdogEvent,
    api_base: &str,
) -> Result<(), FaroError> {
    let url = format!("{}/bot{}/sendMessage", api_base, config.bot_token);
    let text = telegram_text(alert, event);

    for chat_id in &config.chat_ids {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        match client
            .post(url.as_str())
            .json(&payload)
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().as_u16() == 200 => {}
            Ok(response) => {
                error!(
                    target = "faro::alerts::delivery",
                    alert = %alert.name,
                    chat_id = %chat_id,
                    status = response.status().as_u16(),
                    "telegram API error"
                );
            }
            Err(e) => {
                error!(
                    target = "faro::alerts::delivery",
                    alert = %alert.name,
                    chat_id = %chat_id,
                    error = %e,
                    "telegram request failed"
                );
            }
        }
    }

    info!(target = "faro::alerts::delivery", alert = %alert.name, "telegram messages sent");
    Ok(())
}

/// Send the alert to the configured webhook.
pub async fn send_webhook(
    client: &reqwest::Client,
    config: &WebhookConfig,
    alert: &AlertConfig,
    event: &WatchdogEvent,
) -> Result<(), FaroError> {
    let payload = json!({
        "alert_id": alert.alert_id,
        "alert_name": alert.name,
        "event": event,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    let method = reqwest::Method::from_bytes(config.method.as_bytes())
        .unwrap_or(reqwest::Method::POST);
    let mut request = client
        .request(method, config.url.as_str())
        .json(&payload)
        .timeout(DELIVERY_TIMEOUT);
    for (key, value) in &config.headers {
        request = request.header(key.as_str(), value.as_str());
    }
    if let Some(token) = &config.auth_token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| FaroError::provider("webhook", e.to_string()))?;
    let status = response.status().as_u16();
    if !matches!(status, 200 | 201 | 202 | 204) {
        return Err(FaroError::provider(
            "webhook",
            format!("unexpected status {status}"),
        ));
    }

    info!(target = "faro::alerts::delivery", alert = %alert.name, "webhook sent");
    Ok(())
}
