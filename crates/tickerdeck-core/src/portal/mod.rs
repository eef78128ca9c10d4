//! WiFi station connect and the captive configuration portal.
//!
//! The radio is reached through [`WifiLink`]; sockets stay in the firmware,
//! which feeds received HTTP requests, DNS queries and DHCP packets to
//! [`ConfigPortal`] and writes back whatever it returns.
//!
//! A successful `POST /save` is finished in two steps so the HTTP reply can
//! still reach the client over the access point: [`ConfigPortal::handle_request`]
//! produces the reply, then [`ConfigPortal::complete`] turns the radio off.

mod page;

use alloc::borrow::Cow;
use alloc::format;
use core::fmt::Debug;
use core::future::Future;

use embedded_hal_async::delay::DelayNs;
use embedded_storage::Storage;
use log::{debug, info, warn};

use crate::config::{AP_ADDRESS, AP_SSID, CONNECT_POLL_MS};
use crate::net::dhcp::DhcpServer;
use crate::net::{dns, form, Method, Request, Response};
use crate::storage::{CredentialStore, WifiCredentials};

pub use page::{CONFIG_PAGE, CONNECT_FAILED, PORTAL_URL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    Off,
    Station,
    AccessPoint,
    AccessPointStation,
}

/// WiFi radio operations the portal needs.
pub trait WifiLink {
    type Error: Debug;

    /// Start joining `creds` in station mode. Keeps a running access point
    /// up (AP+STA) and returns without waiting for the association.
    fn begin_station(
        &mut self,
        creds: &WifiCredentials,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    fn is_station_connected(&mut self) -> bool;

    /// Open an access point with `ssid` at [`AP_ADDRESS`]. Drops any station
    /// configuration so the radio runs as a pure access point.
    fn start_access_point(&mut self, ssid: &str) -> impl Future<Output = Result<(), Self::Error>>;

    /// Close the access point, leaving any station connection alone.
    fn stop_access_point(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    fn mode(&self) -> RadioMode;
}

/// Join `creds`, polling every 500 ms until connected or `timeout_ms` has
/// elapsed. Never errors: failures read as `false`.
pub async fn connect<L, D>(link: &mut L, delay: &mut D, creds: &WifiCredentials, timeout_ms: u32) -> bool
where
    L: WifiLink,
    D: DelayNs,
{
    info!("Connecting to WiFi '{}'", creds.ssid);
    if let Err(e) = link.begin_station(creds).await {
        warn!("Station start failed: {:?}", e);
        return false;
    }

    let mut elapsed = 0u32;
    while !link.is_station_connected() && elapsed < timeout_ms {
        delay.delay_ms(CONNECT_POLL_MS).await;
        elapsed = elapsed.saturating_add(CONNECT_POLL_MS);
    }

    let connected = link.is_station_connected();
    if connected {
        info!("Connected to '{}'", creds.ssid);
    } else {
        warn!("Connection to '{}' timed out after {} ms", creds.ssid, elapsed);
    }
    connected
}

/// How the portal phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalOutcome {
    /// New credentials were saved and the station joined them.
    Reconnected(WifiCredentials),
    /// Something outside the portal asked it to stop.
    Cancelled,
    /// Nobody submitted working credentials in time.
    TimedOut,
}

/// Which portal services are up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortalStatus {
    pub ap_active: bool,
    pub dns_running: bool,
    pub http_running: bool,
}

pub struct ConfigPortal<'a, L, D, S> {
    link: &'a mut L,
    delay: &'a mut D,
    store: &'a mut CredentialStore<S>,
    dhcp: DhcpServer,
    status: PortalStatus,
    connect_timeout_ms: u32,
    reconnected: Option<WifiCredentials>,
}

impl<'a, L, D, S> ConfigPortal<'a, L, D, S>
where
    L: WifiLink,
    D: DelayNs,
    S: Storage,
    S::Error: Debug,
{
    pub fn new(
        link: &'a mut L,
        delay: &'a mut D,
        store: &'a mut CredentialStore<S>,
        connect_timeout_ms: u32,
    ) -> Self {
        Self {
            link,
            delay,
            store,
            dhcp: DhcpServer::new(AP_ADDRESS),
            status: PortalStatus::default(),
            connect_timeout_ms,
            reconnected: None,
        }
    }

    pub fn status(&self) -> PortalStatus {
        self.status
    }

    pub fn link(&self) -> &L {
        &*self.link
    }

    /// Switch to access point mode and mark DNS and HTTP as serving.
    pub async fn start(&mut self) -> Result<(), L::Error> {
        self.link.start_access_point(AP_SSID).await?;
        self.status = PortalStatus {
            ap_active: true,
            dns_running: true,
            http_running: true,
        };
        info!("Config portal up: SSID '{}' at {:?}", AP_SSID, AP_ADDRESS);
        Ok(())
    }

    /// Route one HTTP request.
    pub async fn handle_request(&mut self, request: &Request<'_>) -> Response {
        if !self.status.http_running {
            return Response::text(503, "Portal closed");
        }
        debug!(" Portal {:?} {}", request.method, request.path);

        match (request.method, request.path) {
            (Method::Get, "/") => Response::html(CONFIG_PAGE),
            (Method::Post, "/save") => self.save(request.body).await,
            _ => Response::redirect(PORTAL_URL),
        }
    }

    async fn save(&mut self, body: &[u8]) -> Response {
        let (ssid, password) = match (form::field(body, "ssid"), form::field(body, "password")) {
            (Ok(Some(ssid)), Ok(password)) => (ssid, password.unwrap_or_default()),
            (Ok(None), _) => return Response::text(400, "Missing ssid"),
            (Err(e), _) | (_, Err(e)) => return Response::text(400, format!("{}", e)),
        };
        let creds = WifiCredentials { ssid, password };

        if let Err(e) = self.store.save_wifi_credentials(&creds) {
            warn!("Rejected credentials: {}", e);
            return Response::text(400, format!("{}", e));
        }

        if connect(&mut *self.link, &mut *self.delay, &creds, self.connect_timeout_ms).await {
            let body = format!("Connected to '{}'", creds.ssid);
            self.status.http_running = false;
            self.status.dns_running = false;
            self.reconnected = Some(creds);
            Response::text(200, Cow::Owned(body))
        } else {
            // Back to a pure access point until the next submission
            if let Err(e) = self.link.start_access_point(AP_SSID).await {
                warn!("Failed to restore access point: {:?}", e);
            }
            Response::text(400, CONNECT_FAILED)
        }
    }

    /// After a successful save has been answered: close the access point
    /// and report the new credentials.
    pub async fn complete(&mut self) -> Option<PortalOutcome> {
        let creds = self.reconnected.take()?;
        if let Err(e) = self.link.stop_access_point().await {
            warn!("Failed to stop access point: {:?}", e);
        }
        self.status = PortalStatus::default();
        info!("Config portal closed, station on '{}'", creds.ssid);
        Some(PortalOutcome::Reconnected(creds))
    }

    /// Tear everything down without a reconnect.
    pub async fn shutdown(&mut self) {
        if self.status.ap_active
            && let Err(e) = self.link.stop_access_point().await
        {
            warn!("Failed to stop access point: {:?}", e);
        }
        self.status = PortalStatus::default();
    }

    /// Answer a DNS query with the access point address.
    pub fn handle_dns(&self, query: &[u8], out: &mut [u8]) -> Option<usize> {
        if !self.status.dns_running {
            return None;
        }
        dns::captive_reply(query, AP_ADDRESS, out)
            .inspect_err(|e| debug!(" Ignoring DNS packet: {:?}", e))
            .ok()
    }

    pub fn handle_dhcp(&mut self, packet: &[u8], out: &mut [u8]) -> Option<usize> {
        if !self.status.ap_active {
            return None;
        }
        self.dhcp
            .handle(packet, out)
            .inspect_err(|e| debug!(" Ignoring DHCP packet: {:?}", e))
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;
    use embassy_futures::block_on;

    use crate::config::{CONNECT_TIMEOUT_MS, CREDENTIAL_REGION_LEN};
    use crate::storage::MemoryStorage;

    /// Radio double: joins only `good` credentials, after `polls_needed` polls.
    struct FakeLink {
        mode: RadioMode,
        good: WifiCredentials,
        polls_needed: u32,
        polls: u32,
        joining: Option<WifiCredentials>,
        ap_ssid: Option<String>,
    }

    impl FakeLink {
        fn new(good: WifiCredentials, polls_needed: u32) -> Self {
            Self {
                mode: RadioMode::Off,
                good,
                polls_needed,
                polls: 0,
                joining: None,
                ap_ssid: None,
            }
        }
    }

    impl WifiLink for FakeLink {
        type Error = &'static str;

        async fn begin_station(&mut self, creds: &WifiCredentials) -> Result<(), Self::Error> {
            self.mode = match self.mode {
                RadioMode::AccessPoint | RadioMode::AccessPointStation => RadioMode::AccessPointStation,
                _ => RadioMode::Station,
            };
            self.polls = 0;
            self.joining = Some(creds.clone());
            Ok(())
        }

        fn is_station_connected(&mut self) -> bool {
            self.polls += 1;
            self.joining.as_ref() == Some(&self.good) && self.polls > self.polls_needed
        }

        async fn start_access_point(&mut self, ssid: &str) -> Result<(), Self::Error> {
            self.mode = RadioMode::AccessPoint;
            self.joining = None;
            self.ap_ssid = Some(String::from(ssid));
            Ok(())
        }

        async fn stop_access_point(&mut self) -> Result<(), Self::Error> {
            self.mode = match self.mode {
                RadioMode::AccessPointStation => RadioMode::Station,
                _ => RadioMode::Off,
            };
            self.ap_ssid = None;
            Ok(())
        }

        fn mode(&self) -> RadioMode {
            self.mode
        }
    }

    /// Records requested delays instead of sleeping.
    #[derive(Default)]
    struct FakeDelay {
        total_ms: u64,
    }

    impl DelayNs for FakeDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ms += u64::from(ns / 1_000_000);
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.total_ms += u64::from(ms);
        }
    }

    type Store = CredentialStore<MemoryStorage<CREDENTIAL_REGION_LEN>>;

    fn save_request(body: &str) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"POST /save HTTP/1.1\r\nHost: 192.168.4.1\r\n");
        raw.extend_from_slice(
            alloc::format!(
                "Content-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n",
                body.len()
            )
            .as_bytes(),
        );
        raw.extend_from_slice(body.as_bytes());
        raw
    }

    #[test]
    fn test_connect_polls_every_500ms_until_timeout() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 0);
        let mut delay = FakeDelay::default();
        let ok = block_on(connect(
            &mut link,
            &mut delay,
            &WifiCredentials::new("Net1", "wrong"),
            CONNECT_TIMEOUT_MS,
        ));
        assert!(!ok);
        assert_eq!(delay.total_ms, 3_000);
        assert_eq!(link.mode(), RadioMode::Station);
    }

    #[test]
    fn test_connect_returns_as_soon_as_associated() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 2);
        let mut delay = FakeDelay::default();
        let ok = block_on(connect(
            &mut link,
            &mut delay,
            &WifiCredentials::new("Net1", "Pass1"),
            CONNECT_TIMEOUT_MS,
        ));
        assert!(ok);
        assert_eq!(delay.total_ms, 1_000);
    }

    #[test]
    fn test_start_opens_access_point() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 0);
        let mut delay = FakeDelay::default();
        let mut store: Store = CredentialStore::new(MemoryStorage::new(), 0);
        let mut portal = ConfigPortal::new(&mut link, &mut delay, &mut store, CONNECT_TIMEOUT_MS);

        block_on(portal.start()).unwrap();
        assert_eq!(
            portal.status(),
            PortalStatus {
                ap_active: true,
                dns_running: true,
                http_running: true
            }
        );
        assert_eq!(portal.link().mode(), RadioMode::AccessPoint);
        assert_eq!(portal.link().ap_ssid.as_deref(), Some("ESP32-Config"));
    }

    #[test]
    fn test_root_serves_form_and_unknown_paths_redirect() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 0);
        let mut delay = FakeDelay::default();
        let mut store: Store = CredentialStore::new(MemoryStorage::new(), 0);
        let mut portal = ConfigPortal::new(&mut link, &mut delay, &mut store, CONNECT_TIMEOUT_MS);
        block_on(portal.start()).unwrap();

        let req = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        let resp = block_on(portal.handle_request(&req));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "text/html");
        assert!(resp.body.contains("name=\"ssid\""));
        assert!(resp.body.contains("name=\"password\""));
        assert!(resp.body.contains("action=\"/save\""));

        let req = Request::parse(b"GET /hotspot-detect.html HTTP/1.1\r\n\r\n").unwrap();
        let resp = block_on(portal.handle_request(&req));
        assert_eq!(resp.status, 302);
        assert_eq!(resp.location, Some(PORTAL_URL));
    }

    #[test]
    fn test_successful_save_shuts_portal_down() {
        let mut link = FakeLink::new(WifiCredentials::new("Home Net", "p@ss"), 1);
        let mut delay = FakeDelay::default();
        let mut store: Store = CredentialStore::new(MemoryStorage::new(), 0);
        {
            let mut portal = ConfigPortal::new(&mut link, &mut delay, &mut store, CONNECT_TIMEOUT_MS);
            block_on(portal.start()).unwrap();

            let raw = save_request("ssid=Home+Net&password=p%40ss");
            let req = Request::parse(&raw).unwrap();
            let resp = block_on(portal.handle_request(&req));
            assert_eq!(resp.status, 200);
            assert_eq!(resp.content_type, "text/plain");
            // Reply goes out while the access point is still up
            assert!(portal.status().ap_active);
            assert!(!portal.status().http_running);
            assert!(!portal.status().dns_running);

            let outcome = block_on(portal.complete());
            assert_eq!(
                outcome,
                Some(PortalOutcome::Reconnected(WifiCredentials::new("Home Net", "p@ss")))
            );
            assert_eq!(portal.status(), PortalStatus::default());
            assert_eq!(portal.link().mode(), RadioMode::Station);
            assert!(portal.link().ap_ssid.is_none());

            let mut out = [0u8; 64];
            assert_eq!(portal.handle_dns(&[0u8; 32], &mut out), None);
        }
        assert_eq!(
            store.load_wifi_credentials(),
            Some(WifiCredentials::new("Home Net", "p@ss"))
        );
    }

    #[test]
    fn test_failed_connect_keeps_access_point() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 0);
        let mut delay = FakeDelay::default();
        let mut store: Store = CredentialStore::new(MemoryStorage::new(), 0);
        let mut portal = ConfigPortal::new(&mut link, &mut delay, &mut store, CONNECT_TIMEOUT_MS);
        block_on(portal.start()).unwrap();

        let raw = save_request("ssid=Net1&password=nope");
        let req = Request::parse(&raw).unwrap();
        let resp = block_on(portal.handle_request(&req));
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body, CONNECT_FAILED);

        assert!(portal.status().ap_active);
        assert!(portal.status().http_running);
        assert!(portal.status().dns_running);
        assert_eq!(portal.link().mode(), RadioMode::AccessPoint);
        assert!(portal.link().joining.is_none());
        assert_eq!(block_on(portal.complete()), None);
    }

    #[test]
    fn test_start_drops_previous_station() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 0);
        let mut delay = FakeDelay::default();
        // Boot-time join with stale credentials
        assert!(!block_on(connect(
            &mut link,
            &mut delay,
            &WifiCredentials::new("Old Net", "old"),
            CONNECT_TIMEOUT_MS,
        )));
        assert_eq!(link.mode(), RadioMode::Station);

        let mut store: Store = CredentialStore::new(MemoryStorage::new(), 0);
        let mut portal = ConfigPortal::new(&mut link, &mut delay, &mut store, CONNECT_TIMEOUT_MS);
        block_on(portal.start()).unwrap();
        assert_eq!(portal.link().mode(), RadioMode::AccessPoint);
        assert!(portal.link().joining.is_none());
    }

    #[test]
    fn test_invalid_submissions_are_rejected() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 0);
        let mut delay = FakeDelay::default();
        let mut store: Store = CredentialStore::new(MemoryStorage::new(), 0);
        let mut portal = ConfigPortal::new(&mut link, &mut delay, &mut store, CONNECT_TIMEOUT_MS);
        block_on(portal.start()).unwrap();

        for body in ["password=x", "ssid=&password=x", "ssid=%zz&password=x"] {
            let raw = save_request(body);
            let req = Request::parse(&raw).unwrap();
            let resp = block_on(portal.handle_request(&req));
            assert_eq!(resp.status, 400, "body {:?}", body);
        }

        let long = alloc::format!("ssid={}&password={}", "s".repeat(300), "p".repeat(300));
        let raw = save_request(&long);
        let req = Request::parse(&raw).unwrap();
        let resp = block_on(portal.handle_request(&req));
        assert_eq!(resp.status, 400);
        assert!(resp.body.contains("602"));
    }

    #[test]
    fn test_dns_served_only_while_up() {
        let mut link = FakeLink::new(WifiCredentials::new("Net1", "Pass1"), 0);
        let mut delay = FakeDelay::default();
        let mut store: Store = CredentialStore::new(MemoryStorage::new(), 0);
        let mut portal = ConfigPortal::new(&mut link, &mut delay, &mut store, CONNECT_TIMEOUT_MS);

        let query = [
            0x00, 0x01, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0, 1, b'x', 0, 0, 1, 0, 1,
        ];
        let mut out = [0u8; 512];
        assert_eq!(portal.handle_dns(&query, &mut out), None, "not started");

        block_on(portal.start()).unwrap();
        let len = portal.handle_dns(&query, &mut out).unwrap();
        assert_eq!(out[len - 4..len], AP_ADDRESS);
    }

    #[test]
    fn test_portal_url_matches_access_point_address() {
        let [a, b, c, d] = AP_ADDRESS;
        assert_eq!(PORTAL_URL, alloc::format!("http://{}.{}.{}.{}/", a, b, c, d));
    }
}
