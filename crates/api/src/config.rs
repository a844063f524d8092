//! Application configuration loaded from environment variables.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use domain::{MarketTimestamp, TimingMode, TimingPolicy, offset_from_hours};
use marketplace::{Credential, MarketplaceConfig};
use saga::{OrchestratorSettings, PowerOfAttorney, Signer};

/// Accepted range for `OFFER_VALIDITY_DAYS`.
const OFFER_VALIDITY_DAYS: RangeInclusive<i64> = 1..=3650;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FILE`: also write logs to this file (default: unset)
/// - `MARKETPLACE_TOKEN`: credential used when a request brings none
/// - `MARKETPLACE_BASE_URL`, `MARKETPLACE_NEED_URL`, `MARKETPLACE_LEGACY_URL`
/// - `MARKETPLACE_ACCEPT_INVALID_CERTS`: skip TLS verification (default: `false`)
/// - `MARKETPLACE_TIMEOUT_SECS`: per-request timeout (default: `30`)
/// - `MARKETPLACE_UTC_OFFSET_HOURS`: marketplace wall-clock offset (default: `3`)
/// - `SAFETY_MARGIN_SECS`: submit this long before the deadline (default: `120`)
/// - `TIMING_MODE`: `blocking` or `immediate` (default: `blocking`)
/// - `PACING_MS`: pause between saga stages (default: `2000`)
/// - `NDS_RATE_ID`: default tax rate identifier (default: `4`)
/// - `OFFER_VALIDITY_DAYS`: default offer lifetime, 1 to 3650 (default: `30`)
/// - `SIGNER_GIVEN_NAME`, `SIGNER_FAMILY_NAME`, `SIGNER_PATRONYMIC`,
///   `SIGNER_POSITION`, `SIGNER_POA_NAME`, `SIGNER_POA_NUMBER`,
///   `SIGNER_POA_START_DATE`: the signer record attached to every offer
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub default_credential: Option<Credential>,
    pub marketplace: MarketplaceConfig,
    pub market_offset: FixedOffset,
    pub timing: TimingPolicy,
    pub nds_rate_id: i64,
    pub orchestrator: OrchestratorSettings,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Values that fail to parse are ignored and the default is kept.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let marketplace = MarketplaceConfig {
            base_url: env_string("MARKETPLACE_BASE_URL")
                .unwrap_or(defaults.marketplace.base_url),
            need_url: env_string("MARKETPLACE_NEED_URL")
                .unwrap_or(defaults.marketplace.need_url),
            legacy_url: env_string("MARKETPLACE_LEGACY_URL")
                .unwrap_or(defaults.marketplace.legacy_url),
            accept_invalid_certs: env_parse("MARKETPLACE_ACCEPT_INVALID_CERTS")
                .unwrap_or(defaults.marketplace.accept_invalid_certs),
            timeout: env_parse("MARKETPLACE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.marketplace.timeout),
            user_agent: defaults.marketplace.user_agent,
        };

        let timing = TimingPolicy {
            safety_margin: env_parse("SAFETY_MARGIN_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timing.safety_margin),
            mode: env_parse::<TimingMode>("TIMING_MODE").unwrap_or(defaults.timing.mode),
        };

        let orchestrator = OrchestratorSettings {
            pacing: env_parse("PACING_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.orchestrator.pacing),
            offer_validity_days: env_parse("OFFER_VALIDITY_DAYS")
                .filter(|days| OFFER_VALIDITY_DAYS.contains(days))
                .unwrap_or(defaults.orchestrator.offer_validity_days),
            signer: signer_from_env(defaults.orchestrator.signer),
        };

        Self {
            host: env_string("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            log_level: env_string("RUST_LOG").unwrap_or(defaults.log_level),
            log_file: env_string("LOG_FILE").map(PathBuf::from),
            default_credential: env_string("MARKETPLACE_TOKEN").and_then(Credential::new),
            marketplace,
            market_offset: env_parse("MARKETPLACE_UTC_OFFSET_HOURS")
                .and_then(offset_from_hours)
                .unwrap_or(defaults.market_offset),
            timing,
            nds_rate_id: env_parse("NDS_RATE_ID").unwrap_or(defaults.nds_rate_id),
            orchestrator,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_file: None,
            default_credential: None,
            marketplace: MarketplaceConfig::default(),
            market_offset: offset_from_hours(3).unwrap_or_else(|| Utc.fix()),
            timing: TimingPolicy::default(),
            nds_rate_id: 4,
            orchestrator: OrchestratorSettings::default(),
        }
    }
}

fn signer_from_env(defaults: Signer) -> Signer {
    let poa = defaults.power_of_attorney;
    Signer {
        without_patronymic: defaults.without_patronymic,
        given_name: env_string("SIGNER_GIVEN_NAME").unwrap_or(defaults.given_name),
        family_name: env_string("SIGNER_FAMILY_NAME").unwrap_or(defaults.family_name),
        patronymic: env_string("SIGNER_PATRONYMIC").unwrap_or(defaults.patronymic),
        position: env_string("SIGNER_POSITION").unwrap_or(defaults.position),
        power_of_attorney: PowerOfAttorney {
            name: env_string("SIGNER_POA_NAME").unwrap_or(poa.name),
            number: env_string("SIGNER_POA_NUMBER").unwrap_or(poa.number),
            start_date: env_string("SIGNER_POA_START_DATE")
                .and_then(|raw| MarketTimestamp::parse(&raw).ok())
                .unwrap_or(poa.start_date),
        },
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|value| value.parse().ok())
}
