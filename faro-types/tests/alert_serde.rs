use faro_types::{
    AlertConfig, AlertTrigger, DeliveryMethod, EventFilter, Severity, WebhookConfig,
};

#[test]
fn alert_config_roundtrips_through_json() {
    let trigger = AlertTrigger::on_events(
        EventFilter::match_all().with_severities([Severity::High, Severity::Critical]),
    );
    let mut alert = AlertConfig::new("price-watch", "Price watch", trigger)
        .with_delivery(DeliveryMethod::Webhook);
    alert.webhook_config = Some(WebhookConfig {
        url: "https://example.com/hook".into(),
        method: "POST".into(),
        headers: Default::default(),
        auth_token: Some("secret".into()),
    });
    alert.cooldown_seconds = 90;

    let json = serde_json::to_string(&alert).unwrap();
    let back: AlertConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, alert);
}

#[test]
fn webhook_method_defaults_to_post() {
    let cfg: WebhookConfig =
        serde_json::from_str(r#"{"url": "https://example.com/hook"}"#).unwrap();
    assert_eq!(cfg.method, "POST");
    assert!(cfg.auth_token.is_none());
}

#[test]
fn delivery_methods_are_deduplicated() {
    let alert = AlertConfig::new("a", "A", AlertTrigger::default())
        .with_delivery(DeliveryMethod::Email)
        .with_delivery(DeliveryMethod::Email);
    assert_eq!(alert.delivery_methods.len(), 1);
}
