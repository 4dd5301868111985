use std::sync::Arc;

use faro_alerts::{AlertEngine, AlertEngineConfig};
use faro_types::{AlertConfig, AlertTrigger, DeliveryMethod, EventFilter, Severity, WebhookConfig};
use faro_watchdog::EventStream;

fn engine(stream: &Arc<EventStream>) -> AlertEngine {
    AlertEngine::new(Arc::clone(stream), AlertEngineConfig::default())
}

fn webhook_alert(id: &str) -> AlertConfig {
    let trigger = AlertTrigger::on_events(
        EventFilter::match_all().with_severities([Severity::High, Severity::Critical]),
    );
    let mut alert = AlertConfig::new(id, format!("alert {id}"), trigger)
        .with_delivery(DeliveryMethod::Webhook);
    alert.webhook_config = Some(WebhookConfig {
        url: "https://example.com/hook".into(),
        method: "POST".into(),
        headers: Default::default(),
        auth_token: None,
    });
    alert
}

#[tokio::test]
async fn create_then_get_returns_the_config_verbatim() {
    let stream = Arc::new(EventStream::new(10));
    let engine = engine(&stream);

    let created = engine.create_alert(webhook_alert("a1")).unwrap();
    let fetched = engine.get_alert("a1").unwrap();
    assert_eq!(fetched, created);

    engine.shutdown().await;
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let stream = Arc::new(EventStream::new(10));
    let engine = engine(&stream);

    engine.create_alert(webhook_alert("dup")).unwrap();
    let err = engine.create_alert(webhook_alert("dup")).unwrap_err();
    assert!(err.to_string().contains("already exists"));
    assert_eq!(stream.subscriber_count(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn subscriptions_follow_the_alert_lifecycle() {
    let stream = Arc::new(EventStream::new(10));
    let engine = engine(&stream);
    assert_eq!(stream.subscriber_count(), 0);

    engine.create_alert(webhook_alert("lifecycle")).unwrap();
    assert_eq!(stream.subscriber_count(), 1);

    // Update replaces rather than stacks the subscription.
    let updated = webhook_alert("lifecycle");
    engine.update_alert("lifecycle", updated).unwrap();
    assert_eq!(stream.subscriber_count(), 1);

    assert!(engine.delete_alert("lifecycle"));
    assert_eq!(stream.subscriber_count(), 0);
    assert!(!engine.delete_alert("lifecycle"));

    engine.shutdown().await;
}

#[tokio::test]
async fn update_of_unknown_alert_fails() {
    let stream = Arc::new(EventStream::new(10));
    let engine = engine(&stream);
    let err = engine
        .update_alert("ghost", webhook_alert("ghost"))
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
    engine.shutdown().await;
}

#[tokio::test]
async fn list_filters_by_enabled() {
    let stream = Arc::new(EventStream::new(10));
    let engine = engine(&stream);

    engine.create_alert(webhook_alert("on")).unwrap();
    engine.create_alert(webhook_alert("off")).unwrap();
    assert!(engine.disable_alert("off"));

    assert_eq!(engine.list_alerts(false).len(), 2);
    let enabled = engine.list_alerts(true);
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].alert_id, "on");

    assert!(engine.enable_alert("off"));
    assert_eq!(engine.list_alerts(true).len(), 2);
    assert!(!engine.enable_alert("missing"));

    engine.shutdown().await;
}
