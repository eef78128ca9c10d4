//! Minimal HTTP/1.0 request and response handling.
//!
//! Covers exactly what the device needs: parsing the portal's incoming
//! requests, serialising its replies, building the price API `GET`, and
//! parsing the API response (status, `Date` header and body).

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use thiserror_no_std::Error;

/// Largest request head the portal accepts.
pub const MAX_HEAD_LEN: usize = 1024;

/// Largest request body the portal accepts (the credential form).
pub const MAX_BODY_LEN: usize = 1024;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("message incomplete")]
    Incomplete,
    #[error("malformed request line")]
    BadRequestLine,
    #[error("malformed status line")]
    BadStatusLine,
    #[error("malformed header")]
    BadHeader,
    #[error("headers too large")]
    HeadTooLarge,
    #[error("body too large")]
    BodyTooLarge,
    #[error("unsupported URL")]
    BadUrl,
    #[error("invalid form encoding")]
    BadEncoding,
}

// ---------------------------------------------------------------------------
// Requests (portal side)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: Method,
    /// Path without the query string.
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// Offset just past the blank line that ends the head.
pub fn head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Total length of the request in `buf` once the head and the declared
/// body have both arrived, `Ok(None)` while more bytes are needed.
pub fn request_len(buf: &[u8]) -> Result<Option<usize>, HttpError> {
    let Some(end) = head_end(buf) else {
        if buf.len() >= MAX_HEAD_LEN {
            return Err(HttpError::HeadTooLarge);
        }
        return Ok(None);
    };
    let head = core::str::from_utf8(&buf[..end]).map_err(|_| HttpError::BadHeader)?;
    let body_len = content_length(head)?.unwrap_or(0);
    if body_len > MAX_BODY_LEN {
        return Err(HttpError::BodyTooLarge);
    }
    let total = end + body_len;
    Ok((buf.len() >= total).then_some(total))
}

impl<'a> Request<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<Self, HttpError> {
        let end = head_end(buf).ok_or(HttpError::Incomplete)?;
        let head = core::str::from_utf8(&buf[..end]).map_err(|_| HttpError::BadHeader)?;

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(HttpError::BadRequestLine)?;
        let mut parts = request_line.split(' ');
        let method = match parts.next() {
            Some("GET") => Method::Get,
            Some("POST") => Method::Post,
            Some(m) if !m.is_empty() => Method::Other,
            _ => return Err(HttpError::BadRequestLine),
        };
        let target = parts.next().ok_or(HttpError::BadRequestLine)?;
        if !parts.next().is_some_and(|v| v.starts_with("HTTP/")) || !target.starts_with('/') {
            return Err(HttpError::BadRequestLine);
        }
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (target, None),
        };

        let mut content_type = None;
        for (name, value) in headers(lines) {
            if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value);
            }
        }

        let body_len = content_length(head)?.unwrap_or(buf.len() - end);
        let body_end = end + body_len;
        if body_end > buf.len() {
            return Err(HttpError::Incomplete);
        }

        Ok(Self {
            method,
            path,
            query,
            content_type,
            body: &buf[end..body_end],
        })
    }
}

fn headers<'a>(lines: impl Iterator<Item = &'a str>) -> impl Iterator<Item = (&'a str, &'a str)> {
    lines
        .filter(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim(), v.trim()))
}

fn content_length(head: &str) -> Result<Option<usize>, HttpError> {
    for (name, value) in headers(head.split("\r\n").skip(1)) {
        if name.eq_ignore_ascii_case("content-length") {
            return value.parse().map(Some).map_err(|_| HttpError::BadHeader);
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Responses (portal side)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub location: Option<&'static str>,
    pub body: Cow<'static, str>,
}

impl Response {
    pub fn html(body: &'static str) -> Self {
        Self {
            status: 200,
            content_type: "text/html",
            location: None,
            body: Cow::Borrowed(body),
        }
    }

    pub fn text(status: u16, body: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(location: &'static str) -> Self {
        Self {
            status: 302,
            content_type: "text/plain",
            location: Some(location),
            body: Cow::Borrowed(""),
        }
    }

    /// Status line and headers, including the blank line.
    pub fn head(&self) -> String {
        let mut out = String::new();
        write!(
            out,
            "HTTP/1.0 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len()
        )
        .ok();
        if let Some(location) = self.location {
            write!(out, "Location: {}\r\n", location).ok();
        }
        out.push_str("\r\n");
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.head().into_bytes();
        out.extend_from_slice(self.body.as_bytes());
        out
    }
}

pub const fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Client side (price API)
// ---------------------------------------------------------------------------

/// `http://host[:port]` split into parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSpec<'a> {
    pub host: &'a str,
    pub port: u16,
}

impl<'a> HostSpec<'a> {
    /// Only plain `http://` is supported; a trailing `/` is ignored.
    pub fn parse(url: &'a str) -> Result<Self, HttpError> {
        let rest = url.trim().strip_prefix("http://").ok_or(HttpError::BadUrl)?;
        let authority = rest.split('/').next().unwrap_or_default();
        let (host, port) = match authority.rsplit_once(':') {
            Some((h, p)) => (h, p.parse().map_err(|_| HttpError::BadUrl)?),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(HttpError::BadUrl);
        }
        Ok(Self { host, port })
    }
}

/// Request head for `GET path` on `host`.
pub fn get_request(host: &HostSpec<'_>, path: &str) -> String {
    let mut out = String::new();
    write!(
        out,
        "GET {} HTTP/1.0\r\nHost: {}\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
        path, host.host
    )
    .ok();
    out
}

/// What the price client needs from an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub date: Option<String>,
    pub body: Vec<u8>,
    /// Monotonic ms when the last byte arrived, set by the transport.
    pub received_ms: Option<u64>,
}

/// Parse a complete response read until the server closed the connection.
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse, HttpError> {
    let end = head_end(raw).ok_or(HttpError::Incomplete)?;
    let head = core::str::from_utf8(&raw[..end]).map_err(|_| HttpError::BadHeader)?;

    let mut lines = head.split("\r\n");
    let status_line = lines.next().ok_or(HttpError::BadStatusLine)?;
    let mut parts = status_line.split(' ');
    if !parts.next().is_some_and(|v| v.starts_with("HTTP/")) {
        return Err(HttpError::BadStatusLine);
    }
    let status = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or(HttpError::BadStatusLine)?;

    let mut date = None;
    let mut length = None;
    for (name, value) in headers(lines) {
        if name.eq_ignore_ascii_case("date") {
            date = Some(String::from(value));
        } else if name.eq_ignore_ascii_case("content-length") {
            length = Some(value.parse::<usize>().map_err(|_| HttpError::BadHeader)?);
        }
    }

    let available = &raw[end..];
    let body = match length {
        Some(n) if n > available.len() => return Err(HttpError::Incomplete),
        Some(n) => &available[..n],
        None => available,
    };

    Ok(HttpResponse {
        status,
        date,
        body: body.to_vec(),
        received_ms: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAVE: &[u8] = b"POST /save HTTP/1.1\r\nHost: 192.168.4.1\r\n\
        Content-Type: application/x-www-form-urlencoded\r\nContent-Length: 24\r\n\r\n\
        ssid=Net1&password=Pass1";

    #[test]
    fn test_parse_get_with_query() {
        let req = Request::parse(b"GET /generate_204?x=1 HTTP/1.1\r\nHost: a\r\n\r\n").unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/generate_204");
        assert_eq!(req.query, Some("x=1"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_parse_post_body() {
        let req = Request::parse(SAVE).unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/save");
        assert_eq!(req.content_type, Some("application/x-www-form-urlencoded"));
        assert_eq!(req.body, b"ssid=Net1&password=Pass1");
    }

    #[test]
    fn test_request_len_waits_for_body() {
        assert_eq!(request_len(&SAVE[..40]), Ok(None));
        assert_eq!(request_len(&SAVE[..SAVE.len() - 1]), Ok(None));
        assert_eq!(request_len(SAVE), Ok(Some(SAVE.len())));
    }

    #[test]
    fn test_request_len_limits() {
        let long = [b'a'; MAX_HEAD_LEN];
        assert_eq!(request_len(&long), Err(HttpError::HeadTooLarge));
        assert_eq!(
            request_len(b"POST / HTTP/1.0\r\nContent-Length: 999999\r\n\r\n"),
            Err(HttpError::BodyTooLarge)
        );
    }

    #[test]
    fn test_rejects_garbage_request_line() {
        assert_eq!(Request::parse(b"HELLO\r\n\r\n"), Err(HttpError::BadRequestLine));
        assert_eq!(
            Request::parse(b"GET noslash HTTP/1.1\r\n\r\n"),
            Err(HttpError::BadRequestLine)
        );
    }

    #[test]
    fn test_response_head() {
        let resp = Response::text(400, "Failed to connect with new credentials");
        let bytes = resp.to_bytes();
        let text = core::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 38\r\n"));
        assert!(text.ends_with("\r\n\r\nFailed to connect with new credentials"));
    }

    #[test]
    fn test_redirect_has_location() {
        let head = Response::redirect("http://192.168.4.1/").head();
        assert!(head.starts_with("HTTP/1.0 302 Found\r\n"));
        assert!(head.contains("Location: http://192.168.4.1/\r\n"));
    }

    #[test]
    fn test_host_spec() {
        assert_eq!(
            HostSpec::parse("http://10.0.0.2:3000"),
            Ok(HostSpec {
                host: "10.0.0.2",
                port: 3000
            })
        );
        assert_eq!(
            HostSpec::parse("http://prices.local/"),
            Ok(HostSpec {
                host: "prices.local",
                port: 80
            })
        );
        assert_eq!(HostSpec::parse("https://x"), Err(HttpError::BadUrl));
        assert_eq!(HostSpec::parse("http://:80"), Err(HttpError::BadUrl));
    }

    #[test]
    fn test_get_request() {
        let host = HostSpec::parse("http://api:8080").unwrap();
        assert_eq!(
            get_request(&host, "/api/crypto?symbols=BTCUSDT"),
            "GET /api/crypto?symbols=BTCUSDT HTTP/1.0\r\nHost: api\r\n\
             Accept: application/json\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn test_parse_response() {
        let raw = b"HTTP/1.1 200 OK\r\nDate: Mon, 19 Oct 2026 08:30:00 GMT\r\n\
            Content-Length: 2\r\n\r\n[]trailing";
        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.date.as_deref(), Some("Mon, 19 Oct 2026 08:30:00 GMT"));
        assert_eq!(resp.body, b"[]");

        let resp = parse_response(b"HTTP/1.0 404 Not Found\r\n\r\nnope").unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, b"nope");
        assert!(resp.date.is_none());
    }

    #[test]
    fn test_parse_truncated_response() {
        assert_eq!(
            parse_response(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n[]"),
            Err(HttpError::Incomplete)
        );
        assert_eq!(parse_response(b"SSH-2.0\r\n\r\n"), Err(HttpError::BadStatusLine));
    }
}
