//! Application-wide run state and error types for tickerdeck

use core::str::FromStr;

use thiserror_no_std::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRunState {
    Uninitialized,
    WifiConnecting,
    ConfigPortal,
    WifiConnected,
    Dashboard,
    Error,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Display buffer allocation failed ({0} bytes)")]
    Allocation(usize),
    #[error("Tile {index} out of range (have {count})")]
    TileOutOfRange { index: usize, count: usize },
    #[error("Too many coins configured: {0}")]
    TooManyCoins(usize),
    #[error("WiFi error: {0}")]
    Wifi(heapless::String<64>),
    #[error("Price fetch failed: {0}")]
    Price(heapless::String<64>),
}

pub trait FromUnchecked<T> {
    fn from_unchecked(value: T) -> Self;
}

/// Builds a bounded string, truncating at a char boundary when `value` is too long.
impl<'a, const N: usize> FromUnchecked<&'a str> for heapless::String<N> {
    fn from_unchecked(value: &'a str) -> Self {
        let mut end = value.len().min(N);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        heapless::String::<N>::from_str(&value[..end]).unwrap_or_default()
    }
}

/// `Debug` text of `err`, cut to fit an [`AppError`] message.
pub fn error_text<E: core::fmt::Debug>(err: &E) -> heapless::String<64> {
    heapless::String::from_unchecked(alloc::format!("{:?}", err).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unchecked_truncates_on_char_boundary() {
        let s: heapless::String<4> = heapless::String::from_unchecked("abcdef");
        assert_eq!(s.as_str(), "abcd");

        // 'é' is two bytes; a cut at byte 4 would split it
        let s: heapless::String<4> = heapless::String::from_unchecked("abcé");
        assert_eq!(s.as_str(), "abc");
    }

    #[test]
    fn test_error_display() {
        let err = AppError::TileOutOfRange { index: 9, count: 6 };
        let mut out: heapless::String<64> = heapless::String::new();
        core::fmt::write(&mut out, format_args!("{}", err)).unwrap();
        assert_eq!(out.as_str(), "Tile 9 out of range (have 6)");
    }

    #[test]
    fn test_error_text_truncates() {
        let long = [7u8; 40];
        let text = error_text(&long);
        assert_eq!(text.len(), 64);
        assert!(text.starts_with("[7, 7, "));
    }
}
