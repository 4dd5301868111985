//! Environment-driven configuration.
//!
//! Every knob has a default; provider API keys are optional and their
//! absence disables the provider that needs them.

use std::env;

use faro_guardrail::{GuardrailConfig, Language};
use faro_types::{CachePolicy, EmailConfig, ProviderConfig, Region, TelegramConfig};
use faro_watchdog::WatchdogSettings;

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    var(name).and_then(|v| v.parse().ok())
}

fn var_bool(name: &str, default: bool) -> bool {
    var(name).map_or(default, |v| {
        matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

/// Fully resolved gateway settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Region assumed for callers that do not specify one.
    pub default_region: Region,
    /// Providers to construct, with credentials where configured.
    pub provider_configs: Vec<ProviderConfig>,
    /// Cache TTL bands.
    pub cache_policy: CachePolicy,
    /// L1 entry capacity.
    pub cache_capacity: u64,
    /// Detector fleet tuning.
    pub watchdog: WatchdogSettings,
    /// Guardrail knobs.
    pub guardrail: GuardrailConfig,
    /// Default SMTP settings for alerts without their own.
    pub alert_email: Option<EmailConfig>,
    /// Default Telegram settings for alerts without their own.
    pub alert_telegram: Option<TelegramConfig>,
    /// L2 cache endpoint (deployment concern; the tier itself is injected).
    pub redis_url: Option<String>,
    /// Durable store endpoint (deployment concern).
    pub postgres_url: Option<String>,
}

impl Settings {
    /// Resolve settings from `FARO_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let default_region = var("FARO_REGION")
            .map_or(Region::Us, |v| Region::parse_or_global(&v));

        let mut cache_policy = CachePolicy::default();
        if let Some(secs) = var_parse::<u64>("FARO_CACHE_EQUITY_MARKET_HOURS_SECS") {
            cache_policy.equity_market_hours_secs = secs;
        }
        if let Some(secs) = var_parse::<u64>("FARO_CACHE_CRYPTO_BASE_SECS") {
            cache_policy.crypto_base_secs = secs;
        }
        if let Some(secs) = var_parse::<u64>("FARO_CACHE_NARRATIVE_BASE_SECS") {
            cache_policy.narrative_base_secs = secs;
        }

        let mut watchdog = WatchdogSettings::default();
        if !var_bool("FARO_WATCHDOGS_ENABLED", true) {
            watchdog.earnings_enabled = false;
            watchdog.volume_enabled = false;
            watchdog.whale_enabled = false;
            watchdog.funding_enabled = false;
            watchdog.liquidity_enabled = false;
            watchdog.correlation_enabled = false;
            watchdog.outage_enabled = false;
            watchdog.price_enabled = false;
        }
        if let Some(pct) = var_parse::<f64>("FARO_PRICE_ANOMALY_THRESHOLD_PCT") {
            watchdog.price_threshold_pct = pct;
        }
        if let Some(secs) = var_parse::<u64>("FARO_PRICE_ANOMALY_INTERVAL_SECS") {
            watchdog.price_interval_secs = secs;
        }
        if let Some(mult) = var_parse::<f64>("FARO_UNUSUAL_VOLUME_MULTIPLIER") {
            watchdog.volume_multiplier = mult;
        }

        let guardrail = GuardrailConfig {
            strict_mode: var_bool("FARO_GUARDRAIL_STRICT", false),
            auto_add_disclaimer: var_bool("FARO_GUARDRAIL_AUTO_DISCLAIMER", true),
            default_language: var("FARO_GUARDRAIL_DEFAULT_LANGUAGE")
                .map_or(Language::En, |v| Language::from_code(&v)),
            language_detection_threshold: var_parse("FARO_GUARDRAIL_DETECTION_THRESHOLD")
                .unwrap_or(3),
            strict_mode_violation_limit: var_parse("FARO_GUARDRAIL_STRICT_LIMIT").unwrap_or(5),
        };

        let alert_email = var("FARO_SMTP_HOST").map(|smtp_host| EmailConfig {
            smtp_host,
            smtp_port: var_parse("FARO_SMTP_PORT").unwrap_or(587),
            smtp_user: var("FARO_SMTP_USER").unwrap_or_default(),
            smtp_password: var("FARO_SMTP_PASSWORD").unwrap_or_default(),
            from_email: var("FARO_SMTP_FROM").unwrap_or_default(),
            to_emails: Vec::new(),
            use_tls: var_bool("FARO_SMTP_TLS", true),
        });

        let alert_telegram = var("FARO_TELEGRAM_BOT_TOKEN").map(|bot_token| TelegramConfig {
            bot_token,
            chat_ids: Vec::new(),
        });

        Self {
            default_region,
            provider_configs: Self::provider_configs_from_env(),
            cache_policy,
            cache_capacity: var_parse("FARO_CACHE_CAPACITY").unwrap_or(10_000),
            watchdog,
            guardrail,
            alert_email,
            alert_telegram,
            redis_url: var("FARO_REDIS_URL"),
            postgres_url: var("FARO_POSTGRES_URL"),
        }
    }

    /// Provider configurations derived from the environment.
    ///
    /// Keyless providers are always listed; keyed providers appear only when
    /// their credential is set.
    fn provider_configs_from_env() -> Vec<ProviderConfig> {
        let mut configs = Vec::new();

        if var_bool("FARO_ENABLE_MOCK_PROVIDER", false) {
            let mut mock = ProviderConfig::named("mock");
            mock.priority = 1;
            configs.push(mock);
        }

        // Keyless upstreams.
        let mut yahoo = ProviderConfig::named("yahoo");
        yahoo.priority = 7;
        configs.push(yahoo);
        let mut coingecko = ProviderConfig::named("coingecko");
        coingecko.priority = 6;
        configs.push(coingecko);
        for exchange in ["kraken", "kucoin", "okx", "bybit"] {
            let mut cfg = ProviderConfig::named(format!("ccxt_{exchange}"));
            cfg.priority = 5;
            configs.push(cfg);
        }

        // Keyed upstreams: listed only when the credential is present.
        let keyed = [
            ("fmp", "FARO_FMP_API_KEY", 9),
            ("alpha_vantage", "FARO_ALPHA_VANTAGE_API_KEY", 8),
            ("polygon", "FARO_POLYGON_API_KEY", 8),
            ("finnhub", "FARO_FINNHUB_API_KEY", 6),
            ("coinmarketcap", "FARO_COINMARKETCAP_API_KEY", 7),
            ("newsapi", "FARO_NEWSAPI_API_KEY", 5),
        ];
        for (name, env_key, priority) in keyed {
            if let Some(api_key) = var(env_key) {
                let mut cfg = ProviderConfig::named(name);
                cfg.priority = priority;
                cfg.api_key = Some(api_key);
                configs.push(cfg);
            }
        }

        configs
    }
}
