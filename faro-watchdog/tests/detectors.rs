use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use faro_core::{FaroError, MarketReader, ProviderResponse};
use faro_types::{Asset, AssetKind, DataKind, EventType, Severity};
use faro_watchdog::Detector;
use faro_watchdog::detectors::sources::{
    DepthSource, FundingRateSource, TokenTransfer, TransferFeed,
};
use faro_watchdog::detectors::{
    CorrelationBreakdownDetector, EarningsAnomalyDetector, ExchangeOutageDetector,
    FundingRateDetector, LiquidityDropDetector, PriceAnomalyDetector, UnusualVolumeDetector,
    WhaleMovementDetector,
};
use serde_json::{Map, Value, json};

fn asset(symbol: &str) -> Asset {
    Asset::new(symbol, AssetKind::Equity).unwrap()
}

fn price_payload(price: f64, volume: f64) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("price".into(), json!(price));
    map.insert("volume".into(), json!(volume));
    map.insert("change_percent".into(), json!(0.0));
    map
}

fn candles_payload(field_values: &[(f64, f64)]) -> Map<String, Value> {
    let candles: Vec<Value> = field_values
        .iter()
        .map(|(close, volume)| json!({ "close": close, "volume": volume }))
        .collect();
    let mut map = Map::new();
    map.insert("candles".into(), Value::Array(candles));
    map
}

/// Reader that scripts payloads per `(symbol, kind)`, consuming price
/// sequences front-to-back.
#[derive(Default)]
struct ScriptedReader {
    prices: Mutex<HashMap<String, Vec<Map<String, Value>>>>,
    fixed: Mutex<HashMap<(String, DataKind), Map<String, Value>>>,
}

impl ScriptedReader {
    fn push_price(&self, symbol: &str, payload: Map<String, Value>) {
        self.prices
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push(payload);
    }

    fn set(&self, symbol: &str, kind: DataKind, payload: Map<String, Value>) {
        self.fixed
            .lock()
            .unwrap()
            .insert((symbol.to_string(), kind), payload);
    }
}

#[async_trait]
impl MarketReader for ScriptedReader {
    async fn latest(&self, asset: &Asset, kind: DataKind) -> Result<ProviderResponse, FaroError> {
        if kind == DataKind::Price {
            let mut prices = self.prices.lock().unwrap();
            if let Some(queue) = prices.get_mut(&asset.symbol)
                && !queue.is_empty()
            {
                let payload = if queue.len() == 1 {
                    queue[0].clone()
                } else {
                    queue.remove(0)
                };
                return Ok(ProviderResponse::new("scripted", asset.clone(), kind, payload));
            }
        }
        let fixed = self.fixed.lock().unwrap();
        match fixed.get(&(asset.symbol.clone(), kind)) {
            Some(payload) => Ok(ProviderResponse::new(
                "scripted",
                asset.clone(),
                kind,
                payload.clone(),
            )),
            None => Ok(ProviderResponse::error_response(
                asset.clone(),
                kind,
                "no scripted data",
            )),
        }
    }
}

#[tokio::test]
async fn price_anomaly_fires_above_threshold() {
    let reader = Arc::new(ScriptedReader::default());
    reader.push_price("TSLA", price_payload(100.0, 1.0e6));
    reader.push_price("TSLA", price_payload(106.0, 1.0e6));

    let detector = PriceAnomalyDetector::new(reader, vec![asset("TSLA")])
        .with_windows(Duration::from_millis(10), Duration::from_secs(5));

    assert!(detector.check().await.unwrap().is_none(), "no reference yet");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let event = detector.check().await.unwrap().expect("anomaly expected");
    assert_eq!(event.event_type, EventType::PriceAnomaly);
    assert_eq!(event.severity, Severity::High);
    assert_eq!(event.symbol(), Some("TSLA"));
    let change = event.data["change_pct"].as_f64().unwrap();
    assert!((change - 6.0).abs() < 0.01, "got {change}");
}

#[tokio::test]
async fn deep_drop_is_a_flash_crash() {
    let reader = Arc::new(ScriptedReader::default());
    reader.push_price("BTC", price_payload(100.0, 1.0e6));
    reader.push_price("BTC", price_payload(85.0, 1.0e6));

    let detector = PriceAnomalyDetector::new(
        reader,
        vec![Asset::new("BTC", AssetKind::Crypto).unwrap()],
    )
    .with_windows(Duration::from_millis(10), Duration::from_secs(5));

    let _ = detector.check().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let event = detector.check().await.unwrap().expect("crash expected");
    assert_eq!(event.event_type, EventType::FlashCrash);
    assert_eq!(event.severity, Severity::Critical);
}

#[tokio::test]
async fn small_moves_stay_quiet() {
    let reader = Arc::new(ScriptedReader::default());
    reader.push_price("AAPL", price_payload(100.0, 1.0e6));
    reader.push_price("AAPL", price_payload(102.0, 1.0e6));

    let detector = PriceAnomalyDetector::new(reader, vec![asset("AAPL")])
        .with_windows(Duration::from_millis(10), Duration::from_secs(5));

    let _ = detector.check().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(detector.check().await.unwrap().is_none());
}

#[tokio::test]
async fn volume_spike_severity_scales_with_ratio() {
    let reader = Arc::new(ScriptedReader::default());
    let avg_candles: Vec<(f64, f64)> = (0..30).map(|_| (100.0, 100.0)).collect();
    reader.set("AAPL", DataKind::Ohlcv, candles_payload(&avg_candles));
    reader.push_price("AAPL", price_payload(100.0, 400.0));

    let detector = UnusualVolumeDetector::new(Arc::clone(&reader) as Arc<dyn MarketReader>, vec![asset("AAPL")]);
    let event = detector.check().await.unwrap().expect("spike expected");
    assert_eq!(event.event_type, EventType::UnusualVolume);
    assert_eq!(event.severity, Severity::High);
    assert!((event.data["volume_ratio"].as_f64().unwrap() - 4.0).abs() < 1e-9);

    let reader2 = Arc::new(ScriptedReader::default());
    reader2.set("AAPL", DataKind::Ohlcv, candles_payload(&avg_candles));
    reader2.push_price("AAPL", price_payload(100.0, 600.0));
    let detector2 = UnusualVolumeDetector::new(reader2, vec![asset("AAPL")]);
    let event2 = detector2.check().await.unwrap().unwrap();
    assert_eq!(event2.severity, Severity::Critical);
}

#[tokio::test]
async fn earnings_surprise_fires_once_per_report() {
    let reader = Arc::new(ScriptedReader::default());
    let mut fundamentals = Map::new();
    fundamentals.insert("actual_eps".into(), json!(1.2));
    fundamentals.insert("estimated_eps".into(), json!(1.0));
    fundamentals.insert("report_date".into(), json!("2026-07-30"));
    reader.set("AAPL", DataKind::Fundamentals, fundamentals);

    let detector = EarningsAnomalyDetector::new(reader, vec![asset("AAPL")]);
    let event = detector.check().await.unwrap().expect("surprise expected");
    assert_eq!(event.event_type, EventType::EarningsAnomaly);
    assert_eq!(event.severity, Severity::Medium);
    assert!(event.description.contains("beat"));

    // Same report date again: already processed.
    assert!(detector.check().await.unwrap().is_none());
}

#[tokio::test]
async fn big_earnings_misses_are_high_severity() {
    let reader = Arc::new(ScriptedReader::default());
    let mut fundamentals = Map::new();
    fundamentals.insert("actual_eps".into(), json!(0.70));
    fundamentals.insert("estimated_eps".into(), json!(1.0));
    reader.set("TSLA", DataKind::Fundamentals, fundamentals);

    let detector = EarningsAnomalyDetector::new(reader, vec![asset("TSLA")]);
    let event = detector.check().await.unwrap().unwrap();
    assert_eq!(event.severity, Severity::High);
    assert!(event.description.contains("missed"));
}

struct FixedFunding(HashMap<String, f64>);

#[async_trait]
impl FundingRateSource for FixedFunding {
    async fn funding_rates(&self, _asset: &Asset) -> Result<HashMap<String, f64>, FaroError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn funding_spike_thresholds() {
    let btc = Asset::new("BTC", AssetKind::Crypto).unwrap();

    let mild = FundingRateDetector::new(
        Arc::new(FixedFunding(HashMap::from([
            ("binance".to_string(), 0.002),
            ("bybit".to_string(), 0.002),
        ]))),
        vec![btc.clone()],
    );
    let event = mild.check().await.unwrap().expect("spike expected");
    assert_eq!(event.event_type, EventType::FundingSpike);
    assert_eq!(event.severity, Severity::High);

    let extreme = FundingRateDetector::new(
        Arc::new(FixedFunding(HashMap::from([(
            "okx".to_string(),
            -0.004,
        )]))),
        vec![btc.clone()],
    );
    let event = extreme.check().await.unwrap().unwrap();
    assert_eq!(event.severity, Severity::Critical);

    let calm = FundingRateDetector::new(
        Arc::new(FixedFunding(HashMap::from([(
            "kraken".to_string(),
            0.0004,
        )]))),
        vec![btc],
    );
    assert!(calm.check().await.unwrap().is_none());
}

struct FixedDepth {
    current: f64,
    average: f64,
}

#[async_trait]
impl DepthSource for FixedDepth {
    async fn order_book_depth(&self, _asset: &Asset) -> Result<f64, FaroError> {
        Ok(self.current)
    }
    async fn average_depth(&self, _asset: &Asset, _days: u32) -> Result<f64, FaroError> {
        Ok(self.average)
    }
}

#[tokio::test]
async fn liquidity_drop_thresholds() {
    let sol = Asset::new("SOL", AssetKind::Crypto).unwrap();

    let halved = LiquidityDropDetector::new(
        Arc::new(FixedDepth {
            current: 40.0,
            average: 100.0,
        }),
        vec![sol.clone()],
    );
    let event = halved.check().await.unwrap().expect("drop expected");
    assert_eq!(event.event_type, EventType::LiquidityDrop);
    assert_eq!(event.severity, Severity::High);

    let collapsed = LiquidityDropDetector::new(
        Arc::new(FixedDepth {
            current: 20.0,
            average: 100.0,
        }),
        vec![sol.clone()],
    );
    assert_eq!(
        collapsed.check().await.unwrap().unwrap().severity,
        Severity::Critical
    );

    let fine = LiquidityDropDetector::new(
        Arc::new(FixedDepth {
            current: 80.0,
            average: 100.0,
        }),
        vec![sol],
    );
    assert!(fine.check().await.unwrap().is_none());
}

#[tokio::test]
async fn correlation_breakdown_detects_decoupling() {
    let reader = Arc::new(ScriptedReader::default());

    // Ninety days of lockstep closes, then the second leg inverts for the
    // final week.
    let a: Vec<(f64, f64)> = (0..90).map(|i| (100.0 + i as f64, 1.0)).collect();
    let mut b: Vec<(f64, f64)> = (0..83).map(|i| (200.0 + i as f64, 1.0)).collect();
    for i in 0..7 {
        b.push((290.0 - (i as f64 * 5.0), 1.0));
    }
    reader.set("SPY", DataKind::Ohlcv, candles_payload(&a));
    reader.set("QQQ", DataKind::Ohlcv, candles_payload(&b));

    let detector = CorrelationBreakdownDetector::new(
        reader,
        vec![(asset("SPY"), asset("QQQ"))],
    );
    let event = detector.check().await.unwrap().expect("breakdown expected");
    assert_eq!(event.event_type, EventType::CorrelationBreak);
    let recent = event.data["recent_corr"].as_f64().unwrap();
    assert!(recent < 0.0, "tail should anti-correlate, got {recent}");
}

#[tokio::test]
async fn correlated_pairs_stay_quiet() {
    let reader = Arc::new(ScriptedReader::default());
    let a: Vec<(f64, f64)> = (0..90).map(|i| (100.0 + i as f64, 1.0)).collect();
    let b: Vec<(f64, f64)> = (0..90).map(|i| (50.0 + i as f64 * 2.0, 1.0)).collect();
    reader.set("SPY", DataKind::Ohlcv, candles_payload(&a));
    reader.set("QQQ", DataKind::Ohlcv, candles_payload(&b));

    let detector = CorrelationBreakdownDetector::new(
        reader,
        vec![(asset("SPY"), asset("QQQ"))],
    );
    assert!(detector.check().await.unwrap().is_none());
}

struct FixedTransfers(Vec<TokenTransfer>);

#[async_trait]
impl TransferFeed for FixedTransfers {
    async fn recent_transfers(&self) -> Result<Vec<TokenTransfer>, FaroError> {
        Ok(self.0.clone())
    }
}

fn transfer(symbol: &str, amount_usd: f64) -> TokenTransfer {
    TokenTransfer {
        asset: Asset::new(symbol, AssetKind::Crypto).unwrap(),
        amount_usd,
        from: "wallet:abc".into(),
        to: "exchange:binance".into(),
        tx_id: "0xdeadbeef".into(),
    }
}

#[tokio::test]
async fn whale_transfers_scale_severity_and_debounce() {
    let detector = WhaleMovementDetector::new(Arc::new(FixedTransfers(vec![
        transfer("BTC", 250_000.0),
        transfer("BTC", 2_500_000.0),
    ])));

    let event = detector.check().await.unwrap().expect("whale expected");
    assert_eq!(event.event_type, EventType::WhaleMovement);
    assert_eq!(event.severity, Severity::High);
    assert!((event.data["amount_usd"].as_f64().unwrap() - 2_500_000.0).abs() < 1.0);

    // Same symbol inside the debounce window is suppressed.
    assert!(detector.check().await.unwrap().is_none());

    let huge = WhaleMovementDetector::new(Arc::new(FixedTransfers(vec![transfer(
        "ETH",
        25_000_000.0,
    )])));
    assert_eq!(huge.check().await.unwrap().unwrap().severity, Severity::Critical);
}

#[tokio::test]
async fn outage_detector_flags_http_errors() {
    let server = httpmock::MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::GET).path("/ping");
            then.status(503);
        })
        .await;

    let detector = ExchangeOutageDetector::new(vec![(
        "mockex".to_string(),
        server.url("/ping"),
    )]);
    let event = detector.check().await.unwrap().expect("outage expected");
    assert_eq!(event.event_type, EventType::ExchangeOutage);
    assert_eq!(event.severity, Severity::High);
    assert_eq!(event.data["status_code"].as_u64().unwrap(), 503);
}

#[tokio::test]
async fn outage_detector_flags_timeouts_as_critical() {
    let server = httpmock::MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::GET).path("/ping");
            then.status(200).delay(Duration::from_millis(500));
        })
        .await;

    let detector = ExchangeOutageDetector::with_timeout(
        vec![("mockex".to_string(), server.url("/ping"))],
        Duration::from_millis(100),
    );
    let event = detector.check().await.unwrap().expect("timeout expected");
    assert_eq!(event.severity, Severity::Critical);
    assert_eq!(event.data["error"].as_str().unwrap(), "timeout");
}

#[tokio::test]
async fn healthy_endpoint_is_quiet() {
    let server = httpmock::MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::GET).path("/ping");
            then.status(200).body("{}");
        })
        .await;

    let detector = ExchangeOutageDetector::new(vec![(
        "mockex".to_string(),
        server.url("/ping"),
    )]);
    assert!(detector.check().await.unwrap().is_none());
}
