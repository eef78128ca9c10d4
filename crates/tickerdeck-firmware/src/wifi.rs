//! Station and access point radio, network stacks, and the portal servers.
//!
//! The station stack runs DHCP; the access point stack sits at the fixed
//! portal address. Both runners are spawned at boot and stay up: smoltcp
//! only sees traffic on an interface once the radio mode carries it.

use alloc::string::String;
use core::convert::Infallible;
use core::fmt::Debug;
use core::future::pending;

use embassy_futures::select::{Either3, select3};
use embassy_net::tcp::TcpSocket;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{
    IpAddress, IpEndpoint, Ipv4Address, Ipv4Cidr, Runner, Stack, StackResources, StaticConfigV4,
};
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Timer};
use embedded_storage::Storage;
use esp_radio::wifi::{
    AccessPointConfig, ClientConfig, ModeConfig, WifiController, WifiDevice,
};
use log::{debug, info, warn};

use tickerdeck_core::app_state::{AppError, error_text};
use tickerdeck_core::config::{AP_ADDRESS, AP_PREFIX_LEN, CONNECT_TIMEOUT_MS, PORTAL_TIMEOUT_MS};
use tickerdeck_core::net::http::{MAX_BODY_LEN, MAX_HEAD_LEN, request_len};
use tickerdeck_core::net::{
    DHCP_CLIENT_PORT, DHCP_SERVER_PORT, DNS_PORT, HTTP_PORT, Request, Response,
};
use tickerdeck_core::portal::{ConfigPortal, PortalOutcome, RadioMode, WifiLink};
use tickerdeck_core::storage::{CredentialStore, WifiCredentials};

/// Raised from outside the portal (a tap on the portal screen) to stop it.
pub static PORTAL_CANCEL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

const REQUEST_BUF_LEN: usize = MAX_HEAD_LEN + MAX_BODY_LEN;

// =============================================================================
// Network stacks
// =============================================================================

#[embassy_executor::task(pool_size = 2)]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

/// DHCP client configuration for the station interface.
pub fn station_config() -> embassy_net::Config {
    embassy_net::Config::dhcpv4(Default::default())
}

/// Static `192.168.4.1/24` on the access point interface.
pub fn access_point_config() -> embassy_net::Config {
    let [a, b, c, d] = AP_ADDRESS;
    let address = Ipv4Address::new(a, b, c, d);
    embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(address, AP_PREFIX_LEN),
        gateway: Some(address),
        dns_servers: Default::default(),
    })
}

/// Build one stack over `device` with its own socket storage.
pub fn new_stack(
    device: WifiDevice<'static>,
    config: embassy_net::Config,
    resources: &'static mut StackResources<4>,
    seed: u64,
) -> (Stack<'static>, Runner<'static, WifiDevice<'static>>) {
    embassy_net::new(device, config, resources, seed)
}

// =============================================================================
// Radio
// =============================================================================

/// [`WifiLink`] over the esp-radio controller.
pub struct EspWifiLink {
    controller: WifiController<'static>,
    mode: RadioMode,
    client: Option<ClientConfig>,
    ap_ssid: Option<String>,
}

impl EspWifiLink {
    pub fn new(controller: WifiController<'static>) -> Self {
        Self {
            controller,
            mode: RadioMode::Off,
            client: None,
            ap_ssid: None,
        }
    }

    fn mode_config(&self) -> Option<ModeConfig> {
        let ap = self
            .ap_ssid
            .as_ref()
            .map(|ssid| AccessPointConfig::default().with_ssid(ssid.clone()));
        match (self.client.clone(), ap) {
            (Some(client), Some(ap)) => Some(ModeConfig::ApSta(client, ap)),
            (Some(client), None) => Some(ModeConfig::Client(client)),
            (None, Some(ap)) => Some(ModeConfig::AccessPoint(ap)),
            (None, None) => None,
        }
    }

    /// Push the current mode to the driver, starting it on first use.
    async fn apply(&mut self) -> Result<(), AppError> {
        let Some(config) = self.mode_config() else {
            if matches!(self.controller.is_started(), Ok(true)) {
                self.controller.stop_async().await.map_err(wifi_error)?;
            }
            self.mode = RadioMode::Off;
            return Ok(());
        };

        self.controller.set_config(&config).map_err(wifi_error)?;
        if !matches!(self.controller.is_started(), Ok(true)) {
            info!("Starting WiFi...");
            self.controller.start_async().await.map_err(wifi_error)?;
        }

        self.mode = match (self.client.is_some(), self.ap_ssid.is_some()) {
            (true, true) => RadioMode::AccessPointStation,
            (true, false) => RadioMode::Station,
            (false, true) => RadioMode::AccessPoint,
            (false, false) => RadioMode::Off,
        };
        debug!(" WiFi mode now {:?}", self.mode);
        Ok(())
    }
}

fn wifi_error<E: Debug>(e: E) -> AppError {
    AppError::Wifi(error_text(&e))
}

impl WifiLink for EspWifiLink {
    type Error = AppError;

    async fn begin_station(&mut self, creds: &WifiCredentials) -> Result<(), Self::Error> {
        if matches!(self.controller.is_connected(), Ok(true)) {
            // Leaving the old network lets the new association start cleanly
            if let Err(e) = self.controller.disconnect_async().await {
                debug!(" Disconnect before join failed: {:?}", e);
            }
        }

        self.client = Some(
            ClientConfig::default()
                .with_ssid(creds.ssid.clone())
                .with_password(creds.password.clone()),
        );
        self.apply().await?;
        self.controller.connect().map_err(wifi_error)
    }

    fn is_station_connected(&mut self) -> bool {
        matches!(self.controller.is_connected(), Ok(true))
    }

    async fn start_access_point(&mut self, ssid: &str) -> Result<(), Self::Error> {
        if matches!(self.controller.is_connected(), Ok(true))
            && let Err(e) = self.controller.disconnect_async().await
        {
            debug!(" Disconnect before access point failed: {:?}", e);
        }
        // Pure AP while the portal is up
        self.client = None;
        self.ap_ssid = Some(String::from(ssid));
        self.apply().await
    }

    async fn stop_access_point(&mut self) -> Result<(), Self::Error> {
        self.ap_ssid = None;
        self.apply().await
    }

    fn mode(&self) -> RadioMode {
        self.mode
    }
}

/// Wait until the station stack has link and a DHCP lease.
pub async fn wait_for_ip(stack: Stack<'static>) {
    info!("Waiting for IP...");
    loop {
        if stack.is_link_up()
            && let Some(config) = stack.config_v4()
        {
            info!("Got IP: {}", config.address);
            return;
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

// =============================================================================
// Portal
// =============================================================================

type SharedPortal<'a, S> = Mutex<NoopRawMutex, ConfigPortal<'a, EspWifiLink, Delay, S>>;

/// Run the configuration portal on the access point stack until it
/// reconnects, is cancelled through [`PORTAL_CANCEL`], or times out.
pub async fn run_portal<S>(
    link: &mut EspWifiLink,
    store: &mut CredentialStore<S>,
    ap_stack: Stack<'static>,
) -> PortalOutcome
where
    S: Storage,
    S::Error: Debug,
{
    let mut delay = Delay;
    let mut portal = ConfigPortal::new(link, &mut delay, store, CONNECT_TIMEOUT_MS);
    if let Err(e) = portal.start().await {
        warn!("Config portal failed to start: {}", e);
        return PortalOutcome::TimedOut;
    }
    PORTAL_CANCEL.reset();

    let portal: SharedPortal<'_, S> = Mutex::new(portal);
    let services = async {
        match select3(
            serve_http(ap_stack, &portal),
            serve_dns(ap_stack, &portal),
            serve_dhcp(ap_stack, &portal),
        )
        .await
        {
            Either3::First(outcome) => outcome,
            Either3::Second(never) | Either3::Third(never) => match never {},
        }
    };

    let outcome = match select3(
        services,
        Timer::after(Duration::from_millis(PORTAL_TIMEOUT_MS)),
        PORTAL_CANCEL.wait(),
    )
    .await
    {
        Either3::First(outcome) => outcome,
        Either3::Second(()) => {
            warn!("Config portal timed out");
            PortalOutcome::TimedOut
        }
        Either3::Third(()) => {
            info!("Config portal cancelled");
            PortalOutcome::Cancelled
        }
    };

    if !matches!(outcome, PortalOutcome::Reconnected(_)) {
        portal.lock().await.shutdown().await;
    }
    outcome
}

/// Accept one connection at a time on port 80; returns after the reply to
/// a successful save has been sent.
async fn serve_http<S>(stack: Stack<'static>, portal: &SharedPortal<'_, S>) -> PortalOutcome
where
    S: Storage,
    S::Error: Debug,
{
    let mut rx_buf = [0u8; 1024];
    let mut tx_buf = [0u8; 2048];
    let mut request = [0u8; REQUEST_BUF_LEN];

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);
        socket.set_timeout(Some(Duration::from_secs(10)));

        if let Err(e) = socket.accept(HTTP_PORT).await {
            warn!("Portal accept error: {:?}", e);
            Timer::after(Duration::from_millis(200)).await;
            continue;
        }

        let response = match read_request(&mut socket, &mut request).await {
            Ok(Some(len)) => match Request::parse(&request[..len]) {
                Ok(req) => portal.lock().await.handle_request(&req).await,
                Err(e) => Response::text(400, alloc::format!("{}", e)),
            },
            Ok(None) => {
                close_socket(&mut socket).await;
                continue;
            }
            Err(e) => Response::text(400, alloc::format!("{}", e)),
        };

        if let Err(e) = write_all(&mut socket, &response.to_bytes()).await {
            warn!("Portal write error: {:?}", e);
        }
        close_socket(&mut socket).await;

        if let Some(outcome) = portal.lock().await.complete().await {
            return outcome;
        }
    }
}

#[derive(Debug)]
enum ReadError {
    Tcp(embassy_net::tcp::Error),
    Http(tickerdeck_core::net::HttpError),
}

impl core::fmt::Display for ReadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Tcp(e) => write!(f, "socket error: {:?}", e),
            Self::Http(e) => write!(f, "{}", e),
        }
    }
}

/// Read until the head and declared body are in `buf`. `Ok(None)` when the
/// peer closed before sending a complete request.
async fn read_request(socket: &mut TcpSocket<'_>, buf: &mut [u8]) -> Result<Option<usize>, ReadError> {
    let mut total = 0usize;
    loop {
        if let Some(len) = request_len(&buf[..total]).map_err(ReadError::Http)? {
            return Ok(Some(len));
        }
        if total == buf.len() {
            return Err(ReadError::Http(tickerdeck_core::net::HttpError::BodyTooLarge));
        }
        let n = socket.read(&mut buf[total..]).await.map_err(ReadError::Tcp)?;
        if n == 0 {
            return Ok(None);
        }
        total += n;
    }
}

async fn write_all(socket: &mut TcpSocket<'_>, mut data: &[u8]) -> Result<(), embassy_net::tcp::Error> {
    while !data.is_empty() {
        let n = socket.write(data).await?;
        data = &data[n..];
    }
    socket.flush().await
}

async fn close_socket(socket: &mut TcpSocket<'_>) {
    socket.close();
    Timer::after(Duration::from_millis(50)).await;
    socket.abort();
}

/// Captive DNS on port 53.
async fn serve_dns<S>(stack: Stack<'static>, portal: &SharedPortal<'_, S>) -> Infallible
where
    S: Storage,
    S::Error: Debug,
{
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buf = [0u8; 512];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buf = [0u8; 512];
    let mut socket = UdpSocket::new(stack, &mut rx_meta, &mut rx_buf, &mut tx_meta, &mut tx_buf);

    if let Err(e) = socket.bind(DNS_PORT) {
        warn!("DNS bind failed: {:?}", e);
        return pending().await;
    }

    let mut query = [0u8; 512];
    let mut reply = [0u8; 512];
    loop {
        let (n, meta) = match socket.recv_from(&mut query).await {
            Ok(r) => r,
            Err(e) => {
                debug!(" DNS receive error: {:?}", e);
                continue;
            }
        };
        let answer = portal.lock().await.handle_dns(&query[..n], &mut reply);
        if let Some(len) = answer
            && let Err(e) = socket.send_to(&reply[..len], meta.endpoint).await
        {
            debug!(" DNS send error: {:?}", e);
        }
    }
}

/// DHCP server on port 67; replies are broadcast since the client has no
/// address yet.
async fn serve_dhcp<S>(stack: Stack<'static>, portal: &SharedPortal<'_, S>) -> Infallible
where
    S: Storage,
    S::Error: Debug,
{
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buf = [0u8; 1024];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buf = [0u8; 1024];
    let mut socket = UdpSocket::new(stack, &mut rx_meta, &mut rx_buf, &mut tx_meta, &mut tx_buf);

    if let Err(e) = socket.bind(DHCP_SERVER_PORT) {
        warn!("DHCP bind failed: {:?}", e);
        return pending().await;
    }

    let broadcast = IpEndpoint::new(
        IpAddress::Ipv4(Ipv4Address::new(255, 255, 255, 255)),
        DHCP_CLIENT_PORT,
    );
    let mut packet = [0u8; 576];
    let mut reply = [0u8; 576];
    loop {
        let n = match socket.recv_from(&mut packet).await {
            Ok((n, _)) => n,
            Err(e) => {
                debug!(" DHCP receive error: {:?}", e);
                continue;
            }
        };
        let answer = portal.lock().await.handle_dhcp(&packet[..n], &mut reply);
        if let Some(len) = answer
            && let Err(e) = socket.send_to(&reply[..len], broadcast).await
        {
            debug!(" DHCP send error: {:?}", e);
        }
    }
}
