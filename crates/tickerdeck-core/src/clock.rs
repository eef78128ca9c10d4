//! Wall clock built on the monotonic millisecond counter.
//!
//! An unsynchronised clock counts from the Unix epoch at boot. The price
//! task synchronises it from the `Date` header of each API response.

use core::fmt::Write;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use log::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    /// Unix seconds at `base_mono_ms`.
    base_unix_secs: i64,
    base_mono_ms: u64,
    utc_offset_secs: i32,
    synced: bool,
}

impl WallClock {
    pub const fn new(utc_offset_secs: i32) -> Self {
        Self {
            base_unix_secs: 0,
            base_mono_ms: 0,
            utc_offset_secs,
            synced: false,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn sync_unix(&mut self, unix_secs: i64, now_ms: u64) {
        self.base_unix_secs = unix_secs;
        self.base_mono_ms = now_ms;
        self.synced = true;
    }

    /// Synchronise from an RFC 2822 / HTTP `Date` value.
    pub fn sync_http_date(&mut self, date: &str, now_ms: u64) -> bool {
        match DateTime::parse_from_rfc2822(date.trim()) {
            Ok(parsed) => {
                self.sync_unix(parsed.timestamp(), now_ms);
                debug!(" Clock synced to {}", parsed.timestamp());
                true
            }
            Err(e) => {
                warn!("Ignoring unparsable Date header {:?}: {:?}", date, e);
                false
            }
        }
    }

    /// Local time at monotonic instant `now_ms`.
    pub fn local(&self, now_ms: u64) -> NaiveDateTime {
        let elapsed = (now_ms.saturating_sub(self.base_mono_ms) / 1000) as i64;
        let secs = self.base_unix_secs + elapsed + i64::from(self.utc_offset_secs);
        DateTime::from_timestamp(secs, 0)
            .unwrap_or_default()
            .naive_utc()
    }

    /// `HH:MM:SS`
    pub fn hms(&self, now_ms: u64) -> heapless::String<8> {
        let t = self.local(now_ms);
        let mut out = heapless::String::new();
        write!(out, "{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()).ok();
        out
    }

    /// `Date: YYYY-MM-DD`
    pub fn date_label(&self, now_ms: u64) -> heapless::String<24> {
        let t = self.local(now_ms);
        let mut out = heapless::String::new();
        write!(out, "Date: {:04}-{:02}-{:02}", t.year(), t.month(), t.day()).ok();
        out
    }

    /// `Time: HH:MM:SS`
    pub fn time_label(&self, now_ms: u64) -> heapless::String<24> {
        let mut out = heapless::String::new();
        write!(out, "Time: {}", self.hms(now_ms)).ok();
        out
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new(0)
    }
}
