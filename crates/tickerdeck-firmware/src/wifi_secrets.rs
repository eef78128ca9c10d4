//! Build-time configuration baked in by `build.rs`.
//!
//! Credentials stored in flash by the configuration portal take priority
//! over the WiFi values here.

use tickerdeck_core::config::{ApiConfig, DeckConfig, InternetConfig};
use tickerdeck_core::storage::WifiCredentials;

pub const API_HOST: &str = env!("API_HOST");
pub const COIN_SYMBOLS: &str = env!("COIN_SYMBOLS");
pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");
const UTC_OFFSET_SECS: &str = env!("UTC_OFFSET_SECS");

pub fn deck_config() -> DeckConfig<'static> {
    DeckConfig {
        api: ApiConfig {
            host: API_HOST,
            symbols: COIN_SYMBOLS,
        },
        internet: InternetConfig {
            ssid: WIFI_SSID,
            password: WIFI_PASSWORD,
        },
        utc_offset_secs: UTC_OFFSET_SECS.trim().parse().unwrap_or(0),
    }
}

/// Build-time WiFi credentials, if any were configured.
pub fn default_credentials(config: &DeckConfig<'_>) -> Option<WifiCredentials> {
    let creds = WifiCredentials::new(config.internet.ssid, config.internet.password);
    creds.validate().ok().map(|()| creds)
}
