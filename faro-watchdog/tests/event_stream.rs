use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use faro_types::{Asset, AssetKind, EventFilter, EventType, Severity, WatchdogEvent};
use faro_watchdog::{EventStream, MemoryEventLog};

fn event(symbol: &str, severity: Severity) -> WatchdogEvent {
    let mut e = WatchdogEvent::new(
        EventType::PriceAnomaly,
        severity,
        Some(Asset::new(symbol, AssetKind::Equity).unwrap()),
        format!("{symbol} moved"),
    );
    e.watchdog = "price_anomaly".into();
    e
}

#[tokio::test]
async fn matching_subscribers_receive_exactly_once() {
    let stream = EventStream::new(100);
    let high_hits = Arc::new(AtomicUsize::new(0));
    let low_hits = Arc::new(AtomicUsize::new(0));

    {
        let high_hits = Arc::clone(&high_hits);
        stream
            .subscribe(
                Arc::new(move |_| {
                    high_hits.fetch_add(1, Ordering::SeqCst);
                }),
                Some(EventFilter::match_all().with_severities([Severity::High])),
                None,
            )
            .unwrap();
    }
    {
        let low_hits = Arc::clone(&low_hits);
        stream
            .subscribe(
                Arc::new(move |_| {
                    low_hits.fetch_add(1, Ordering::SeqCst);
                }),
                Some(EventFilter::match_all().with_severities([Severity::Low])),
                None,
            )
            .unwrap();
    }

    stream.emit(event("AAPL", Severity::High)).await;

    assert_eq!(high_hits.load(Ordering::SeqCst), 1);
    assert_eq!(low_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn subscribers_run_in_registration_order_and_survive_panics() {
    let stream = EventStream::new(100);
    let order = Arc::new(Mutex::new(Vec::new()));

    {
        let order = Arc::clone(&order);
        stream
            .subscribe(
                Arc::new(move |_| order.lock().unwrap().push("first")),
                None,
                Some("first".into()),
            )
            .unwrap();
    }
    stream
        .subscribe(
            Arc::new(|_| panic!("subscriber blew up")),
            None,
            Some("second".into()),
        )
        .unwrap();
    {
        let order = Arc::clone(&order);
        stream
            .subscribe(
                Arc::new(move |_| order.lock().unwrap().push("third")),
                None,
                Some("third".into()),
            )
            .unwrap();
    }

    stream.emit(event("TSLA", Severity::High)).await;

    assert_eq!(*order.lock().unwrap(), vec!["first", "third"]);
}

#[tokio::test]
async fn unsubscribe_round_trips_subscriber_count() {
    let stream = EventStream::new(100);
    assert_eq!(stream.subscriber_count(), 0);

    let id = stream.subscribe(Arc::new(|_| {}), None, None).unwrap();
    assert_eq!(stream.subscriber_count(), 1);

    assert!(stream.unsubscribe(&id));
    assert_eq!(stream.subscriber_count(), 0);
    assert!(!stream.unsubscribe(&id));
}

#[tokio::test]
async fn duplicate_subscriber_ids_are_rejected() {
    let stream = EventStream::new(100);
    stream
        .subscribe(Arc::new(|_| {}), None, Some("alerts".into()))
        .unwrap();
    let err = stream
        .subscribe(Arc::new(|_| {}), None, Some("alerts".into()))
        .unwrap_err();
    assert!(err.to_string().contains("already in use"));
}

#[tokio::test]
async fn history_is_newest_first_and_filterable() {
    let stream = EventStream::new(100);
    stream.emit(event("AAPL", Severity::Low)).await;
    stream.emit(event("TSLA", Severity::High)).await;
    stream.emit(event("MSFT", Severity::Critical)).await;

    let all = stream.get_history(None, 10);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].symbol(), Some("MSFT"));
    assert_eq!(all[2].symbol(), Some("AAPL"));

    let filter = EventFilter::match_all().with_severities([Severity::High, Severity::Critical]);
    let serious = stream.get_history(Some(&filter), 10);
    assert_eq!(serious.len(), 2);

    let limited = stream.get_history(None, 1);
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].symbol(), Some("MSFT"));
}

#[tokio::test]
async fn ring_buffer_evicts_oldest_at_capacity() {
    let stream = EventStream::new(3);
    for symbol in ["A", "B", "C", "D", "E"] {
        stream.emit(event(symbol, Severity::Low)).await;
    }

    let history = stream.get_history(None, 10);
    assert_eq!(history.len(), 3);
    let symbols: Vec<_> = history.iter().filter_map(|e| e.symbol()).collect();
    assert_eq!(symbols, vec!["E", "D", "C"]);

    // Emission kept succeeding; the counters saw everything.
    assert_eq!(stream.stats().total_events, 5);
}

#[tokio::test]
async fn durable_log_supports_resume_by_id() {
    let sink = Arc::new(MemoryEventLog::new(100));
    let stream = EventStream::new(10).with_sink(sink);

    stream.emit(event("AAPL", Severity::Low)).await;
    stream.emit(event("TSLA", Severity::High)).await;
    stream.emit(event("MSFT", Severity::Low)).await;

    let first_page = stream.get_persisted(None, 2).await.unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].1["symbol"], "AAPL");

    let cursor = first_page.last().unwrap().0.clone();
    let second_page = stream.get_persisted(Some(&cursor), 10).await.unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].1["symbol"], "MSFT");
}

#[tokio::test]
async fn durable_log_is_capacity_bounded() {
    let sink = Arc::new(MemoryEventLog::new(2));
    let stream = EventStream::new(10).with_sink(sink);

    for symbol in ["A", "B", "C"] {
        stream.emit(event(symbol, Severity::Low)).await;
    }

    let entries = stream.get_persisted(None, 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].1["symbol"], "B");
    assert_eq!(entries[1].1["symbol"], "C");
}

#[tokio::test]
async fn stats_track_types_and_severities() {
    let stream = EventStream::new(10);
    stream.emit(event("AAPL", Severity::High)).await;
    stream.emit(event("AAPL", Severity::Critical)).await;

    let stats = stream.stats();
    assert_eq!(stats.total_events, 2);
    assert_eq!(stats.events_by_type["price_anomaly"], 2);
    assert_eq!(stats.events_by_severity["high"], 1);
    assert_eq!(stats.events_by_severity["critical"], 1);
    assert!(!stats.persistence_enabled);
}

#[tokio::test]
async fn shutdown_clears_subscribers_but_keeps_history() {
    let stream = EventStream::new(10);
    stream.subscribe(Arc::new(|_| {}), None, None).unwrap();
    stream.emit(event("AAPL", Severity::Low)).await;

    stream.shutdown();
    assert_eq!(stream.subscriber_count(), 0);
    assert_eq!(stream.get_history(None, 10).len(), 1);
}
