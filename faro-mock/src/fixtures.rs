//! Static fixtures served by the mock provider.

use serde_json::{Map, Value, json};

/// Price payload for a known symbol, or `None` for unknown symbols.
pub fn price(symbol: &str) -> Option<Map<String, Value>> {
    let (price, change, volume) = match symbol {
        "AAPL" => (189.84, 1.27, 54_230_000.0),
        "MSFT" => (428.90, -2.15, 21_880_000.0),
        "GOOGL" => (176.33, 0.42, 18_020_000.0),
        "TSLA" => (248.50, 5.91, 96_410_000.0),
        "SPY" => (549.61, 0.88, 61_750_000.0),
        "QQQ" => (478.12, 1.45, 38_360_000.0),
        "BTC" | "BTC/USDT" => (64_250.5, 1_220.0, 28_400.0),
        "ETH" | "ETH/USDT" => (3_412.8, -54.2, 310_500.0),
        "SOL" | "SOL/USDT" => (158.74, 3.11, 2_140_000.0),
        _ => return None,
    };
    let change_percent = change / (price - change) * 100.0;
    let mut map = Map::new();
    map.insert("price".into(), json!(price));
    map.insert("change".into(), json!(change));
    map.insert("change_percent".into(), json!(change_percent));
    map.insert("volume".into(), json!(volume));
    map.insert("currency".into(), json!("USD"));
    Some(map)
}

/// OHLCV payload: `limit` synthetic daily candles ending at the fixture price.
pub fn ohlcv(symbol: &str, limit: usize) -> Option<Map<String, Value>> {
    let last = price(symbol)?;
    let close = last.get("price").and_then(Value::as_f64).unwrap_or(100.0);
    let volume = last
        .get("volume")
        .and_then(Value::as_f64)
        .unwrap_or(1_000_000.0);

    let n = limit.clamp(1, 365);
    let mut candles = Vec::with_capacity(n);
    for i in 0..n {
        // Deterministic drift so windows have usable variance.
        let age = (n - 1 - i) as f64;
        let c = close * (1.0 - 0.001 * age);
        let o = c * 0.998;
        candles.push(json!({
            "open": o,
            "high": c * 1.004,
            "low": o * 0.995,
            "close": c,
            "volume": volume * (1.0 - 0.002 * age),
        }));
    }
    let mut map = Map::new();
    map.insert("candles".into(), Value::Array(candles));
    map.insert("timeframe".into(), json!("1d"));
    Some(map)
}

/// Fundamentals payload for a known equity symbol.
pub fn fundamentals(symbol: &str) -> Option<Map<String, Value>> {
    let value = match symbol {
        "AAPL" => json!({
            "market_cap": 2.95e12,
            "pe_ratio": 31.2,
            "beta": 1.24,
            "avg_volume": 58_100_000.0,
            "week_52_high": 199.62,
            "week_52_low": 164.08,
            "sector": "Technology",
            "industry": "Consumer Electronics",
            "actual_eps": 1.53,
            "estimated_eps": 1.50,
        }),
        "MSFT" => json!({
            "market_cap": 3.19e12,
            "pe_ratio": 36.8,
            "beta": 0.89,
            "avg_volume": 23_500_000.0,
            "week_52_high": 468.35,
            "week_52_low": 309.45,
            "sector": "Technology",
            "industry": "Software - Infrastructure",
            "actual_eps": 2.94,
            "estimated_eps": 2.82,
        }),
        "TSLA" => json!({
            "market_cap": 7.9e11,
            "pe_ratio": 71.4,
            "beta": 2.29,
            "avg_volume": 104_000_000.0,
            "week_52_high": 299.29,
            "week_52_low": 138.80,
            "sector": "Consumer Cyclical",
            "industry": "Auto Manufacturers",
            "actual_eps": 0.52,
            "estimated_eps": 0.74,
        }),
        "BTC" | "BTC/USDT" => json!({
            "market_cap": 1.26e12,
            "volume_24h_usd": 3.1e10,
            "change_24h_percent": 1.9,
            "circulating_supply": 19_720_000.0,
        }),
        "ETH" | "ETH/USDT" => json!({
            "market_cap": 4.1e11,
            "volume_24h_usd": 1.4e10,
            "change_24h_percent": -1.6,
            "circulating_supply": 120_200_000.0,
        }),
        _ => return None,
    };
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// News payload: up to `limit` canned articles.
pub fn news(symbol: &str, limit: usize) -> Option<Map<String, Value>> {
    price(symbol)?;
    let articles: Vec<Value> = (0..limit.clamp(1, 10))
        .map(|i| {
            json!({
                "title": format!("{symbol} coverage item {}", i + 1),
                "source": "Mock Newswire",
                "url": format!("https://news.example.com/{}/{}", symbol.to_lowercase(), i + 1),
                "impact": if i == 0 { "high" } else { "low" },
            })
        })
        .collect();
    let mut map = Map::new();
    map.insert("articles".into(), Value::Array(articles));
    Some(map)
}
