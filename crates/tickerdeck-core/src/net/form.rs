//! `application/x-www-form-urlencoded` decoding for the portal form.

use alloc::string::String;
use alloc::vec::Vec;

use super::http::HttpError;

/// Decoded value of the first `key` field in `body`, if present.
pub fn field(body: &[u8], key: &str) -> Result<Option<String>, HttpError> {
    for pair in body.split(|&b| b == b'&') {
        let (name, value) = match pair.iter().position(|&b| b == b'=') {
            Some(i) => (&pair[..i], &pair[i + 1..]),
            None => (pair, &[][..]),
        };
        if decode(name)? == key {
            return decode(value).map(Some);
        }
    }
    Ok(None)
}

/// Percent-decode `raw`, treating `+` as a space.
pub fn decode(raw: &[u8]) -> Result<String, HttpError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = raw.get(i + 1).copied().and_then(hex_value);
                let lo = raw.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                    _ => return Err(HttpError::BadEncoding),
                }
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).map_err(|_| HttpError::BadEncoding)
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let body = b"ssid=Net1&password=Pass1";
        assert_eq!(field(body, "ssid").unwrap().as_deref(), Some("Net1"));
        assert_eq!(field(body, "password").unwrap().as_deref(), Some("Pass1"));
        assert_eq!(field(body, "missing").unwrap(), None);
    }

    #[test]
    fn test_decoding() {
        assert_eq!(decode(b"My+Home%20Net").unwrap(), "My Home Net");
        assert_eq!(decode(b"p%40ss%26word%3D").unwrap(), "p@ss&word=");
        assert_eq!(decode(b"caf%C3%A9").unwrap(), "café");
    }

    #[test]
    fn test_bad_escapes() {
        assert_eq!(decode(b"50%"), Err(HttpError::BadEncoding));
        assert_eq!(decode(b"%zz"), Err(HttpError::BadEncoding));
        assert_eq!(decode(b"%FF"), Err(HttpError::BadEncoding));
    }

    #[test]
    fn test_empty_and_valueless_fields() {
        assert_eq!(field(b"ssid=&password", "ssid").unwrap().as_deref(), Some(""));
        assert_eq!(field(b"ssid=&password", "password").unwrap().as_deref(), Some(""));
    }
}
