//! Device constants and the build-time configuration shape.

use serde::{Deserialize, Serialize};

/// BLE device name, also shown on the pairing tile.
pub const DEVICE_NAME: &str = "ESP32 Media Controller";

/// Manufacturer string in the Device Information service.
pub const MANUFACTURER: &str = "Espressif";

/// SSID broadcast while the configuration portal is active.
pub const AP_SSID: &str = "ESP32-Config";

/// Address of the device on its own access point network.
pub const AP_ADDRESS: [u8; 4] = [192, 168, 4, 1];

/// Prefix length of the access point network.
pub const AP_PREFIX_LEN: u8 = 24;

// ---------------------------------------------------------------------------
// Periodic task periods
// ---------------------------------------------------------------------------

pub const PRICE_REFRESH_MS: u64 = 300_000;
pub const CLOCK_REFRESH_MS: u64 = 1_000;
pub const MEDIA_REFRESH_MS: u64 = 5_000;

/// Cached quotes older than this are flagged as stale.
pub const STALE_AFTER_MS: u64 = 2 * PRICE_REFRESH_MS;

// ---------------------------------------------------------------------------
// WiFi
// ---------------------------------------------------------------------------

pub const CONNECT_TIMEOUT_MS: u32 = 3_000;
pub const CONNECT_POLL_MS: u32 = 500;

/// The portal gives up and reports a timeout after this long.
pub const PORTAL_TIMEOUT_MS: u64 = 10 * 60 * 1_000;

// ---------------------------------------------------------------------------
// Persistent storage
// ---------------------------------------------------------------------------

/// Size of the credential region.
pub const CREDENTIAL_REGION_LEN: usize = 512;

/// Flash offset of the credential region on the device.
pub const CREDENTIALS_FLASH_OFFSET: u32 = 0x3F_0000;

/// Maximum number of coin tiles.
pub const MAX_COINS: usize = 4;

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct DeckConfig<'a> {
    pub api: ApiConfig<'a>,
    pub internet: InternetConfig<'a>,
    #[serde(default)]
    pub utc_offset_secs: i32,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ApiConfig<'a> {
    /// Base URL of the price API, e.g. `http://prices.local:8080`.
    pub host: &'a str,
    /// Comma-separated ticker list.
    pub symbols: &'a str,
}

impl<'a> ApiConfig<'a> {
    /// Iterate the configured tickers, skipping blanks.
    pub fn symbols(&self) -> impl Iterator<Item = &'a str> {
        self.symbols
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_split_and_trim() {
        let api = ApiConfig {
            host: "http://example",
            symbols: "BTCUSDT, ETHUSDT,,SOLUSDT ",
        };
        let mut it = api.symbols();
        assert_eq!(it.next(), Some("BTCUSDT"));
        assert_eq!(it.next(), Some("ETHUSDT"));
        assert_eq!(it.next(), Some("SOLUSDT"));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_deck_config_from_json() {
        let json = r#"{
            "api": { "host": "http://10.0.0.2:3000", "symbols": "BTCUSDT" },
            "internet": { "ssid": "Home", "password": "secret" }
        }"#;
        let config: DeckConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.api.host, "http://10.0.0.2:3000");
        assert_eq!(config.internet.ssid, "Home");
        assert_eq!(config.utc_offset_secs, 0);
    }

    #[test]
    fn test_stale_window_spans_two_refreshes() {
        assert_eq!(STALE_AFTER_MS, 600_000);
    }
}
