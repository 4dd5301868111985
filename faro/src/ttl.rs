//! Volatility- and session-aware TTL policy.
//!
//! One function owns every TTL decision so the bands stay consistent between
//! the cache manager and the narrative sub-policy.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;
use faro_types::{Asset, AssetKind, CachePolicy, DataKind};

/// Intraday |change| beyond which equity TTLs tighten, percent.
const EQUITY_VOLATILE_PCT: f64 = 5.0;

/// 24h |change| at which crypto TTLs hit their floor, percent.
const CRYPTO_VOLATILE_PCT: f64 = 10.0;

/// Whether `now` falls within regular US equity trading hours.
#[must_use]
pub fn is_us_market_hours(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&New_York);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let open = NaiveTime::from_hms_opt(9, 30, 0).expect("valid open time");
    let close = NaiveTime::from_hms_opt(16, 0, 0).expect("valid close time");
    let t = local.time();
    t >= open && t < close
}

/// TTL for caching a `(kind, asset)` value fetched at `now`.
///
/// `volatility_pct` is the relevant percentage move when the payload carried
/// one: intraday change for equities, 24h change for crypto.
#[must_use]
pub fn ttl_policy(
    policy: &CachePolicy,
    kind: DataKind,
    asset: &Asset,
    volatility_pct: Option<f64>,
    now: DateTime<Utc>,
) -> Duration {
    match kind {
        DataKind::Fundamentals => Duration::from_secs(policy.fundamentals_secs),
        DataKind::News => Duration::from_secs(policy.news_secs),
        DataKind::Price | DataKind::Ohlcv | DataKind::Technical => match asset.kind {
            AssetKind::Crypto | AssetKind::Derivative => crypto_ttl(policy, volatility_pct),
            AssetKind::Equity | AssetKind::Etf => equity_ttl(policy, volatility_pct, now),
            AssetKind::Forex | AssetKind::Commodity | AssetKind::Bond => {
                Duration::from_secs(policy.equity_market_hours_secs)
            }
            _ => Duration::from_secs(policy.equity_market_hours_secs),
        },
        _ => Duration::from_secs(policy.fundamentals_secs),
    }
}

fn equity_ttl(policy: &CachePolicy, volatility_pct: Option<f64>, now: DateTime<Utc>) -> Duration {
    if !is_us_market_hours(now) {
        return Duration::from_secs(policy.equity_off_hours_secs);
    }
    let volatile = volatility_pct.is_some_and(|v| v.abs() > EQUITY_VOLATILE_PCT);
    if volatile {
        Duration::from_secs(policy.equity_volatile_secs)
    } else {
        Duration::from_secs(policy.equity_market_hours_secs)
    }
}

fn crypto_ttl(policy: &CachePolicy, volatility_pct: Option<f64>) -> Duration {
    let base = policy.crypto_base_secs as f64;
    let floor = policy.crypto_volatile_secs as f64;
    let v = volatility_pct.map_or(0.0, f64::abs).min(CRYPTO_VOLATILE_PCT);
    // Linear squeeze from the baseline down to the floor as the 24h move
    // approaches the volatile threshold.
    let secs = base - (base - floor) * (v / CRYPTO_VOLATILE_PCT);
    Duration::from_secs(secs.max(floor) as u64)
}

/// TTL for cached narratives: a shorter-lived variant of the same shape.
#[must_use]
pub fn narrative_ttl(policy: &CachePolicy, volatility_pct: Option<f64>, now: DateTime<Utc>) -> Duration {
    let base = policy.narrative_base_secs;
    let floor = policy.narrative_floor_secs;

    let mut secs = base;
    if volatility_pct.is_some_and(|v| v.abs() > EQUITY_VOLATILE_PCT) {
        secs /= 2;
    }
    if !is_us_market_hours(now) {
        secs *= 2;
    }
    Duration::from_secs(secs.max(floor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> CachePolicy {
        CachePolicy::default()
    }

    fn equity() -> Asset {
        Asset::new("AAPL", AssetKind::Equity).unwrap()
    }

    fn crypto() -> Asset {
        Asset::new("BTC", AssetKind::Crypto).unwrap()
    }

    // Wednesday 2026-07-29 15:00 UTC == 11:00 New York, mid-session.
    fn market_open_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 29, 15, 0, 0).unwrap()
    }

    // Saturday 2026-07-25.
    fn weekend_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 25, 15, 0, 0).unwrap()
    }

    #[test]
    fn market_hours_calendar() {
        assert!(is_us_market_hours(market_open_instant()));
        assert!(!is_us_market_hours(weekend_instant()));
        // 07:00 New York, pre-open on a weekday.
        let pre_open = Utc.with_ymd_and_hms(2026, 7, 29, 11, 0, 0).unwrap();
        assert!(!is_us_market_hours(pre_open));
    }

    #[test]
    fn equity_bands() {
        let p = policy();
        let in_hours = ttl_policy(&p, DataKind::Price, &equity(), Some(1.0), market_open_instant());
        assert_eq!(in_hours, Duration::from_secs(p.equity_market_hours_secs));

        let volatile = ttl_policy(&p, DataKind::Price, &equity(), Some(7.5), market_open_instant());
        assert_eq!(volatile, Duration::from_secs(p.equity_volatile_secs));

        let weekend = ttl_policy(&p, DataKind::Price, &equity(), Some(1.0), weekend_instant());
        assert_eq!(weekend, Duration::from_secs(p.equity_off_hours_secs));
    }

    #[test]
    fn crypto_squeezes_with_volatility() {
        let p = policy();
        let calm = ttl_policy(&p, DataKind::Price, &crypto(), Some(0.5), market_open_instant());
        let moving = ttl_policy(&p, DataKind::Price, &crypto(), Some(6.0), market_open_instant());
        let wild = ttl_policy(&p, DataKind::Price, &crypto(), Some(15.0), market_open_instant());

        assert!(calm > moving);
        assert!(moving > wild);
        assert_eq!(wild, Duration::from_secs(p.crypto_volatile_secs));
    }

    #[test]
    fn slow_kinds_have_flat_bands() {
        let p = policy();
        assert_eq!(
            ttl_policy(&p, DataKind::Fundamentals, &equity(), None, market_open_instant()),
            Duration::from_secs(p.fundamentals_secs)
        );
        assert_eq!(
            ttl_policy(&p, DataKind::News, &crypto(), None, weekend_instant()),
            Duration::from_secs(p.news_secs)
        );
    }

    #[test]
    fn narrative_ttl_halves_and_doubles() {
        let p = policy();
        let base = narrative_ttl(&p, Some(1.0), market_open_instant());
        assert_eq!(base, Duration::from_secs(p.narrative_base_secs));

        let volatile = narrative_ttl(&p, Some(8.0), market_open_instant());
        assert_eq!(volatile, Duration::from_secs(p.narrative_base_secs / 2));

        let weekend = narrative_ttl(&p, Some(1.0), weekend_instant());
        assert_eq!(weekend, Duration::from_secs(p.narrative_base_secs * 2));
    }
}
