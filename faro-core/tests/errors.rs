use std::time::Duration;

use faro_core::FaroError;
use faro_types::{DataKind, Region};

#[test]
fn display_formats_are_stable() {
    let e = FaroError::provider("yahoo", "upstream 500");
    assert_eq!(e.to_string(), "yahoo failed: upstream 500");

    let e = FaroError::provider_timeout("fmp", DataKind::Price);
    assert_eq!(e.to_string(), "provider timed out: price via fmp");

    let e = FaroError::NoProviderAvailable {
        symbol: "AAPL".into(),
        kind: DataKind::News,
    };
    assert_eq!(e.to_string(), "no provider available for AAPL (news)");

    let e = FaroError::region_restricted("ccxt_binance", Region::Us);
    assert_eq!(e.to_string(), "ccxt_binance unavailable in region US");
}

#[test]
fn transient_classification_drives_fallback() {
    assert!(FaroError::rate_limited("x", Some(Duration::from_secs(60))).is_transient());
    assert!(FaroError::provider_timeout("x", DataKind::Price).is_transient());
    assert!(FaroError::provider("x", "boom").is_transient());

    assert!(FaroError::not_supported("x", DataKind::News).is_permanent());
    assert!(FaroError::region_restricted("x", Region::Eu).is_permanent());
    assert!(FaroError::not_found("price for AAPL").is_permanent());
    assert!(FaroError::Config("bad".into()).is_permanent());
}

#[test]
fn aggregate_error_keeps_individual_failures() {
    let inner = vec![
        FaroError::provider("a", "boom"),
        FaroError::provider_timeout("b", DataKind::Price),
    ];
    if let FaroError::AllProvidersFailed(errors) = FaroError::AllProvidersFailed(inner) {
        assert_eq!(errors.len(), 2);
    } else {
        unreachable!();
    }
}
