//! Coin quotes: the price API contract, JSON decoding, cached quote
//! bookkeeping and the quote-to-display mappings used by the coin tiles.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};
use core::future::Future;

use embedded_graphics::pixelcolor::Rgb565;
use log::{debug, warn};
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::Deserialize;
use thiserror_no_std::Error;

use crate::app_state::FromUnchecked;
use crate::config::STALE_AFTER_MS;
use crate::net::http::HttpResponse;
use crate::ui::styling::{COLOR_FALLING, COLOR_FLAT, COLOR_RISING};

/// Path of the quote endpoint on the API host.
pub const QUOTE_PATH: &str = "/api/crypto";

/// Needle scale of the coin meters.
pub const METER_MIN: i32 = -10;
pub const METER_MAX: i32 = 10;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq)]
pub enum PriceError {
    #[error("network unavailable")]
    Offline,
    #[error("transport failed: {0}")]
    Transport(heapless::String<64>),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("malformed quote payload: {0}")]
    Parse(heapless::String<64>),
    #[error("expected {expected} quotes, got {got}")]
    MissingQuotes { expected: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Client seam
// ---------------------------------------------------------------------------

/// Plain HTTP GET against the configured API host.
pub trait PriceClient {
    type Error: fmt::Debug;

    /// Whether the station link is up and has an address.
    fn is_network_up(&self) -> bool;

    /// Issue `GET path` and return the full response.
    fn get(&mut self, path: &str) -> impl Future<Output = Result<HttpResponse, Self::Error>>;
}

/// A missing client is a network that never comes up.
impl<C: PriceClient> PriceClient for Option<C> {
    type Error = PriceError;

    fn is_network_up(&self) -> bool {
        self.as_ref().is_some_and(|c| c.is_network_up())
    }

    async fn get(&mut self, path: &str) -> Result<HttpResponse, Self::Error> {
        let client = self.as_mut().ok_or(PriceError::Offline)?;
        client.get(path).await.map_err(transport_error)
    }
}

fn transport_error<E: fmt::Debug>(e: E) -> PriceError {
    let mut msg: heapless::String<64> = heapless::String::new();
    write!(msg, "{:?}", e).ok();
    PriceError::Transport(msg)
}

/// `/api/crypto?symbols=A,B,C`, preserving the given order.
pub fn quote_query(symbols: &[&str]) -> String {
    let mut path = String::from(QUOTE_PATH);
    path.push_str("?symbols=");
    for (i, symbol) in symbols.iter().enumerate() {
        if i > 0 {
            path.push(',');
        }
        path.push_str(symbol);
    }
    path
}

/// Result of one successful quote fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteBatch {
    pub quotes: Vec<Quote>,
    /// `Date` header of the response, if the server sent one.
    pub date: Option<String>,
    /// When the response arrived, if the client recorded it.
    pub received_ms: Option<u64>,
}

/// Fetch one quote per symbol. Nothing is returned unless every symbol has a quote.
pub async fn fetch_quotes<C: PriceClient>(
    client: &mut C,
    symbols: &[&str],
) -> Result<QuoteBatch, PriceError> {
    if !client.is_network_up() {
        return Err(PriceError::Offline);
    }

    let path = quote_query(symbols);
    debug!(" Fetching {}", path);

    let response = client.get(&path).await.map_err(transport_error)?;

    debug!(" HTTP response code: {}", response.status);
    if response.status != 200 {
        return Err(PriceError::HttpStatus(response.status));
    }

    let quotes = parse_quotes(&response.body, symbols.len())?;
    Ok(QuoteBatch {
        quotes,
        date: response.date,
        received_ms: response.received_ms,
    })
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// One element of the API's JSON array.
///
/// Both fields are accepted as JSON numbers or as numeric strings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Quote {
    #[serde(rename = "lastPrice", deserialize_with = "number_or_numeric_string")]
    pub last_price: f64,
    #[serde(
        rename = "priceChangePercent",
        deserialize_with = "number_or_numeric_string"
    )]
    pub change_percent: f64,
}

/// Decode the response array, requiring at least `expected` entries.
///
/// Entries beyond `expected` are ignored.
pub fn parse_quotes(body: &[u8], expected: usize) -> Result<Vec<Quote>, PriceError> {
    let mut quotes: Vec<Quote> = serde_json::from_slice(body).map_err(|e| {
        let mut msg: heapless::String<64> = heapless::String::new();
        write!(msg, "{}", e).ok();
        PriceError::Parse(msg)
    })?;

    if quotes.len() < expected {
        return Err(PriceError::MissingQuotes {
            expected,
            got: quotes.len(),
        });
    }
    quotes.truncate(expected);
    Ok(quotes)
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

// ---------------------------------------------------------------------------
// Per-coin state
// ---------------------------------------------------------------------------

/// What the coin tile displays.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinInfo {
    /// Price with exactly three fraction digits.
    pub price_text: heapless::String<24>,
    /// 24h change in percent.
    pub change: f32,
}

impl Default for CoinInfo {
    fn default() -> Self {
        Self {
            price_text: heapless::String::new(),
            change: 0.0,
        }
    }
}

/// Last fetched values plus when they were fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedData {
    pub price: f64,
    pub change: f32,
    pub timestamp_ms: u64,
}

impl CachedData {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }
}

/// One tracked symbol.
#[derive(Debug, Clone)]
pub struct CoinSlot {
    pub symbol: heapless::String<16>,
    pub info: CoinInfo,
    pub cached: Option<CachedData>,
}

impl CoinSlot {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: heapless::String::from_unchecked(symbol),
            info: CoinInfo::default(),
            cached: None,
        }
    }

    pub fn apply(&mut self, quote: &Quote, now_ms: u64) {
        let change = quote.change_percent as f32;
        self.info.price_text = format_price(quote.last_price);
        self.info.change = change;
        self.cached = Some(CachedData {
            price: quote.last_price,
            change,
            timestamp_ms: now_ms,
        });
        debug!(
            " Updated {}: Price: ${}, Change: {:.2}%",
            self.symbol, self.info.price_text, change
        );
    }

    /// Never fetched, or last fetched more than [`STALE_AFTER_MS`] ago.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        match self.cached {
            Some(cached) => cached.age_ms(now_ms) > STALE_AFTER_MS,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Display mappings
// ---------------------------------------------------------------------------

/// Meter needle position for a 24h change.
///
/// The change is scaled by 10 and truncated, clamped to `[-100, 100]`, then
/// mapped linearly onto `[-10, 10]` with integer division.
pub fn needle_value(change: f32) -> i32 {
    let scaled = ((change * 10.0) as i32).clamp(-100, 100);
    (scaled + 100) * (METER_MAX - METER_MIN) / 200 + METER_MIN
}

/// `"{price:.3}"`
pub fn format_price(price: f64) -> heapless::String<24> {
    let mut out = heapless::String::new();
    if write!(out, "{:.3}", price).is_err() {
        warn!("Price {} does not fit the label", price);
        out.clear();
        out.push_str("---").ok();
    }
    out
}

/// `"24h: {change:.2}%"`, or `"24h: --"` when the number does not fit.
pub fn format_change(change: f32) -> heapless::String<32> {
    let mut out = heapless::String::new();
    if write!(out, "24h: {:.2}%", change).is_err() {
        warn!("Change {} does not fit the label", change);
        out.clear();
        out.push_str("24h: --").ok();
    }
    out
}

/// Sign of a 24h change, which decides the text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTrend {
    Rising,
    Falling,
    Flat,
}

impl ChangeTrend {
    pub fn from_change(change: f32) -> Self {
        if change > 0.0 {
            ChangeTrend::Rising
        } else if change < 0.0 {
            ChangeTrend::Falling
        } else {
            ChangeTrend::Flat
        }
    }

    pub const fn color(&self) -> Rgb565 {
        match self {
            ChangeTrend::Rising => COLOR_RISING,
            ChangeTrend::Falling => COLOR_FALLING,
            ChangeTrend::Flat => COLOR_FLAT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use embassy_futures::block_on;

    struct FakeClient {
        up: bool,
        response: Option<HttpResponse>,
        requested: Vec<String>,
    }

    impl PriceClient for FakeClient {
        type Error = &'static str;

        fn is_network_up(&self) -> bool {
            self.up
        }

        async fn get(&mut self, path: &str) -> Result<HttpResponse, Self::Error> {
            self.requested.push(String::from(path));
            self.response.take().ok_or("connection reset")
        }
    }

    fn ok_response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            date: Some(String::from("Mon, 19 Oct 2026 08:30:00 GMT")),
            body: body.as_bytes().to_vec(),
            received_ms: None,
        }
    }

    #[test]
    fn test_needle_mapping() {
        assert_eq!(needle_value(5.0), 5);
        assert_eq!(needle_value(-12.0), -10);
        assert_eq!(needle_value(12.0), 10);
        assert_eq!(needle_value(0.0), 0);
        assert_eq!(needle_value(-5.0), -5);
        // 0.55 * 10 truncates to 5, then (105 * 20) / 200 = 10, minus 10
        assert_eq!(needle_value(0.55), 0);
        assert_eq!(needle_value(9.99), 9);
    }

    #[test]
    fn test_needle_stays_in_meter_range() {
        let mut change = -50.0f32;
        while change <= 50.0 {
            let v = needle_value(change);
            assert!((METER_MIN..=METER_MAX).contains(&v), "{} -> {}", change, v);
            change += 0.25;
        }
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_price(67012.5).as_str(), "67012.500");
        assert_eq!(format_price(0.1234).as_str(), "0.123");
        assert_eq!(format_change(-1.234).as_str(), "24h: -1.23%");
        assert_eq!(format_change(0.0).as_str(), "24h: 0.00%");
    }

    #[test]
    fn test_oversized_change_shows_placeholder() {
        assert_eq!(format_change(1.0e30).as_str(), "24h: --");
        assert_eq!(format_change(-3.0e38).as_str(), "24h: --");
        assert_eq!(format_change(-99999.5).as_str(), "24h: -99999.50%");
    }

    #[test]
    fn test_trend_colors() {
        assert_eq!(ChangeTrend::from_change(0.01), ChangeTrend::Rising);
        assert_eq!(ChangeTrend::from_change(-0.01), ChangeTrend::Falling);
        assert_eq!(ChangeTrend::from_change(0.0), ChangeTrend::Flat);
        assert_eq!(ChangeTrend::Rising.color(), COLOR_RISING);
        assert_eq!(ChangeTrend::Flat.color(), COLOR_FLAT);
    }

    #[test]
    fn test_query_preserves_order() {
        assert_eq!(
            quote_query(&["BTCUSDT", "ETHUSDT", "SOLUSDT"]),
            "/api/crypto?symbols=BTCUSDT,ETHUSDT,SOLUSDT"
        );
        assert_eq!(quote_query(&["BTCUSDT"]), "/api/crypto?symbols=BTCUSDT");
    }

    #[test]
    fn test_parse_numbers_and_strings() {
        let body = br#"[
            {"symbol":"BTCUSDT","lastPrice":67000.5,"priceChangePercent":-1.5},
            {"symbol":"ETHUSDT","lastPrice":"2450.125","priceChangePercent":"3.20"}
        ]"#;
        let quotes = parse_quotes(body, 2).unwrap();
        assert_eq!(quotes[0].last_price, 67000.5);
        assert_eq!(quotes[0].change_percent, -1.5);
        assert_eq!(quotes[1].last_price, 2450.125);
        assert_eq!(quotes[1].change_percent, 3.2);
    }

    #[test]
    fn test_parse_rejects_short_array() {
        let body = br#"[{"lastPrice":1,"priceChangePercent":0}]"#;
        assert_eq!(
            parse_quotes(body, 3),
            Err(PriceError::MissingQuotes {
                expected: 3,
                got: 1
            })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_quotes(b"<html>502</html>", 1),
            Err(PriceError::Parse(_))
        ));
        assert!(matches!(
            parse_quotes(br#"[{"lastPrice":"abc","priceChangePercent":1}]"#, 1),
            Err(PriceError::Parse(_))
        ));
    }

    #[test]
    fn test_fetch_offline_does_not_touch_network() {
        let mut client = FakeClient {
            up: false,
            response: Some(ok_response("[]")),
            requested: vec![],
        };
        let result = block_on(fetch_quotes(&mut client, &["BTCUSDT"]));
        assert_eq!(result, Err(PriceError::Offline));
        assert!(client.requested.is_empty());
    }

    #[test]
    fn test_missing_client_stays_offline() {
        let mut client: Option<FakeClient> = None;
        assert!(!client.is_network_up());
        let result = block_on(fetch_quotes(&mut client, &["BTCUSDT"]));
        assert_eq!(result, Err(PriceError::Offline));
        assert_eq!(block_on(client.get("/api/crypto")), Err(PriceError::Offline));

        let mut client = Some(FakeClient {
            up: true,
            response: Some(ok_response(
                r#"[{"symbol":"BTCUSDT","lastPrice":"1.5","priceChangePercent":"0"}]"#,
            )),
            requested: vec![],
        });
        let batch = block_on(fetch_quotes(&mut client, &["BTCUSDT"])).unwrap();
        assert_eq!(batch.quotes.len(), 1);
    }

    #[test]
    fn test_fetch_reports_http_status() {
        let mut client = FakeClient {
            up: true,
            response: Some(HttpResponse {
                status: 503,
                date: None,
                body: vec![],
                received_ms: None,
            }),
            requested: vec![],
        };
        let result = block_on(fetch_quotes(&mut client, &["BTCUSDT"]));
        assert_eq!(result, Err(PriceError::HttpStatus(503)));
    }

    #[test]
    fn test_fetch_success_carries_date() {
        let mut client = FakeClient {
            up: true,
            response: Some(ok_response(
                r#"[{"lastPrice":"1.5","priceChangePercent":"0"}]"#,
            )),
            requested: vec![],
        };
        let batch = block_on(fetch_quotes(&mut client, &["XRPUSDT"])).unwrap();
        assert_eq!(client.requested, ["/api/crypto?symbols=XRPUSDT"]);
        assert_eq!(batch.quotes.len(), 1);
        assert_eq!(batch.date.as_deref(), Some("Mon, 19 Oct 2026 08:30:00 GMT"));
        assert_eq!(batch.received_ms, None);
    }

    #[test]
    fn test_slot_staleness() {
        let mut slot = CoinSlot::new("BTCUSDT");
        assert!(slot.is_stale(0));

        let quote = Quote {
            last_price: 100.0,
            change_percent: 2.0,
        };
        slot.apply(&quote, 1_000);
        assert_eq!(slot.info.price_text.as_str(), "100.000");
        assert!(!slot.is_stale(1_000 + STALE_AFTER_MS));
        assert!(slot.is_stale(1_001 + STALE_AFTER_MS));
    }
}
