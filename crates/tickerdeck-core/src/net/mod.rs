//! Socket-free wire formats.
//!
//! The firmware owns the embassy-net sockets and hands raw bytes to these
//! parsers and builders; everything here runs unchanged on the host.

pub mod dhcp;
pub mod dns;
pub mod form;
pub mod http;

pub use http::{HttpError, HttpResponse, Method, Request, Response};

pub const HTTP_PORT: u16 = 80;
pub const DNS_PORT: u16 = 53;
pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;
