//! Marketplace addresses and transport settings.

use std::time::Duration;

/// Where the marketplace lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Base of the operation API (create/start/save/finish).
    pub base_url: String,
    /// Need lookup endpoint; the need id is appended as `?needId=`.
    pub need_url: String,
    /// Base of the legacy host serving authentication and company lookups.
    pub legacy_url: String,
    /// Skip TLS certificate validation. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Browser-like user agent the marketplace expects.
    pub user_agent: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://zakupki.mos.ru/newapi/api/EntityOperation".to_string(),
            need_url: "https://zakupki.mos.ru/newapi/api/Need/Get".to_string(),
            legacy_url: "https://old.zakupki.mos.ru/api/Cssp".to_string(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
        }
    }
}
