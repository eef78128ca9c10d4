//! Plain HTTP/1.0 client for the price API over the station stack.

use alloc::vec::Vec;

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Duration, Instant};
use log::debug;

use tickerdeck_core::app_state::{AppError, FromUnchecked, error_text};
use tickerdeck_core::market::PriceClient;
use tickerdeck_core::net::http::{HostSpec, get_request, parse_response};
use tickerdeck_core::net::HttpResponse;

/// Largest response kept; the quote array for four coins is well below it.
const MAX_RESPONSE_LEN: usize = 8 * 1024;

pub struct HttpPriceClient {
    stack: Stack<'static>,
    host: HostSpec<'static>,
    rx_buf: [u8; 2048],
    tx_buf: [u8; 512],
}

impl HttpPriceClient {
    /// `api_host` is a base URL like `http://prices.local:8080`.
    pub fn new(stack: Stack<'static>, api_host: &'static str) -> Result<Self, AppError> {
        let host = HostSpec::parse(api_host).map_err(price_error)?;
        Ok(Self {
            stack,
            host,
            rx_buf: [0; 2048],
            tx_buf: [0; 512],
        })
    }

    async fn resolve(&self) -> Result<IpEndpoint, AppError> {
        let addrs = self
            .stack
            .dns_query(self.host.host, DnsQueryType::A)
            .await
            .map_err(price_error)?;
        let addr = addrs
            .first()
            .copied()
            .ok_or_else(|| AppError::Price(heapless::String::from_unchecked("no address for host")))?;
        Ok(IpEndpoint::new(addr, self.host.port))
    }
}

impl PriceClient for HttpPriceClient {
    type Error = AppError;

    fn is_network_up(&self) -> bool {
        self.stack.is_link_up() && self.stack.config_v4().is_some()
    }

    async fn get(&mut self, path: &str) -> Result<HttpResponse, Self::Error> {
        let remote = self.resolve().await?;
        let stack = self.stack;
        let request = get_request(&self.host, path);

        let mut socket = TcpSocket::new(stack, &mut self.rx_buf, &mut self.tx_buf);
        socket.set_timeout(Some(Duration::from_secs(10)));
        socket.connect(remote).await.map_err(price_error)?;
        debug!(" Connected to {:?}", remote);

        let mut data = request.as_bytes();
        while !data.is_empty() {
            let n = socket.write(data).await.map_err(price_error)?;
            data = &data[n..];
        }
        socket.flush().await.map_err(price_error)?;

        // HTTP/1.0 with Connection: close, so the body ends at EOF
        let mut raw = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = socket.read(&mut chunk).await.map_err(price_error)?;
            if n == 0 {
                break;
            }
            if raw.len() + n > MAX_RESPONSE_LEN {
                socket.abort();
                return Err(AppError::Price(heapless::String::from_unchecked("response too large")));
            }
            raw.extend_from_slice(&chunk[..n]);
        }
        socket.close();
        let received_ms = Instant::now().as_millis();

        let mut response = parse_response(&raw).map_err(price_error)?;
        response.received_ms = Some(received_ms);
        Ok(response)
    }
}

fn price_error<E: core::fmt::Debug>(e: E) -> AppError {
    AppError::Price(error_text(&e))
}
