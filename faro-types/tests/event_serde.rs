use faro_types::{Asset, AssetKind, EventType, Severity, WatchdogEvent};

#[test]
fn event_json_uses_snake_case_labels() {
    let mut event = WatchdogEvent::new(
        EventType::FlashCrash,
        Severity::Critical,
        Some(Asset::new("BTC", AssetKind::Crypto).unwrap()),
        "BTC dropped 12% in 1 min",
    );
    event.watchdog = "price_anomaly".into();

    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event_type"], "flash_crash");
    assert_eq!(json["severity"], "critical");
    assert_eq!(json["asset"]["symbol"], "BTC");
}

#[test]
fn flat_map_carries_the_core_fields() {
    let mut event = WatchdogEvent::new(
        EventType::UnusualVolume,
        Severity::High,
        Some(Asset::new("AAPL", AssetKind::Equity).unwrap()),
        "volume spike",
    )
    .with_data("volume_ratio", serde_json::json!(4.2));
    event.watchdog = "unusual_volume".into();

    let flat = event.to_flat_map();
    assert_eq!(flat["type"], "unusual_volume");
    assert_eq!(flat["severity"], "high");
    assert_eq!(flat["symbol"], "AAPL");
    assert_eq!(flat["watchdog"], "unusual_volume");
    assert!(flat["data"].contains("volume_ratio"));
}

#[test]
fn event_ids_are_unique() {
    let a = WatchdogEvent::new(EventType::PriceAnomaly, Severity::Low, None, "a");
    let b = WatchdogEvent::new(EventType::PriceAnomaly, Severity::Low, None, "b");
    assert_ne!(a.event_id, b.event_id);
}
