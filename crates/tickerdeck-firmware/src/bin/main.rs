#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::convert::Infallible;
use core::future::pending;

use bt_hci::controller::ExternalController;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_net::StackResources;
use embassy_time::{Delay, Duration, Instant, Timer, with_timeout};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Alignment;
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::ble::controller::BleConnector;
use esp_storage::FlashStorage;
use log::{debug, error, info, warn};

use tickerdeck_core::app_state::AppRunState;
use tickerdeck_core::clock::WallClock;
use tickerdeck_core::config::{AP_SSID, CONNECT_TIMEOUT_MS, CREDENTIALS_FLASH_OFFSET, MAX_COINS};
use tickerdeck_core::hid::{HID_LINK, MEDIA_KEY_CHANNEL};
use tickerdeck_core::orchestrator::UiOrchestrator;
use tickerdeck_core::portal::{self, PORTAL_URL, PortalOutcome};
use tickerdeck_core::storage::CredentialStore;
use tickerdeck_core::ui::styling::COLOR_BACKGROUND;
use tickerdeck_core::ui::{Drawable, TextComponent, TextSize};
use tickerdeck_firmware::app_state::{
    Panel, PanelPins, TouchController, create_i2c_bus, init_display, init_touch,
};
use tickerdeck_firmware::ble::{BleController, ble_task};
use tickerdeck_firmware::http_client::HttpPriceClient;
use tickerdeck_firmware::wifi::{
    self, EspWifiLink, PORTAL_CANCEL, access_point_config, net_task, station_config,
};
use tickerdeck_firmware::wifi_secrets;

/// UI loop period.
const FRAME_MS: u64 = 20;

/// How long to wait for a DHCP lease after the station associates.
const DHCP_TIMEOUT: Duration = Duration::from_secs(15);

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    esp_hal::system::software_reset()
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

macro_rules! mk_static {
    ($t:ty,$val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

fn enter(state: &mut AppRunState, next: AppRunState) {
    info!("State {:?} -> {:?}", state, next);
    *state = next;
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // The framebuffer lives in PSRAM
    esp_alloc::psram_allocator!(&peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");
    let mut run_state = AppRunState::Uninitialized;

    // Panel and touch
    let (mut display, _backlight) = init_display(PanelPins {
        spi: peripherals.SPI2,
        sck: peripherals.GPIO10,
        mosi: peripherals.GPIO11,
        cs: peripherals.GPIO9,
        dc: peripherals.GPIO8,
        rst: peripherals.GPIO14,
        backlight: peripherals.GPIO2,
    });
    let i2c = create_i2c_bus(peripherals.I2C0, peripherals.GPIO6, peripherals.GPIO7);
    let mut touch = init_touch(i2c, peripherals.GPIO13).await;

    // Radio: WiFi stacks and the BLE host share one controller
    let radio = &*mk_static!(
        esp_radio::Controller<'static>,
        esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller")
    );
    let (wifi_controller, interfaces) =
        esp_radio::wifi::new(radio, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (sta_stack, sta_runner) = wifi::new_stack(
        interfaces.sta,
        station_config(),
        mk_static!(StackResources<4>, StackResources::<4>::new()),
        seed,
    );
    let (ap_stack, ap_runner) = wifi::new_stack(
        interfaces.ap,
        access_point_config(),
        mk_static!(StackResources<4>, StackResources::<4>::new()),
        seed.rotate_left(17),
    );
    spawner.spawn(net_task(sta_runner).expect("Failed to spawn station net task"));
    spawner.spawn(net_task(ap_runner).expect("Failed to spawn access point net task"));

    let transport = BleConnector::new(radio, peripherals.BT, Default::default())
        .expect("Failed to initialize BLE controller");
    let ble_controller: BleController = ExternalController::new(transport);
    spawner.spawn(ble_task(ble_controller).expect("Failed to spawn BLE task"));

    // Credentials: flash first, then the build-time defaults
    let deck = wifi_secrets::deck_config();
    let mut store = CredentialStore::new(FlashStorage::new(peripherals.FLASH), CREDENTIALS_FLASH_OFFSET);
    let creds = store
        .load_wifi_credentials()
        .or_else(|| wifi_secrets::default_credentials(&deck));

    let mut link = EspWifiLink::new(wifi_controller);
    enter(&mut run_state, AppRunState::WifiConnecting);
    let connected = match &creds {
        Some(creds) => portal::connect(&mut link, &mut Delay, creds, CONNECT_TIMEOUT_MS).await,
        None => {
            info!("No WiFi credentials stored");
            false
        }
    };

    if !connected {
        enter(&mut run_state, AppRunState::ConfigPortal);
        if let Err(e) = draw_portal_screen(&mut display) {
            warn!("Portal screen draw failed: {:?}", e);
        }

        let outcome = match select(
            wifi::run_portal(&mut link, &mut store, ap_stack),
            cancel_on_tap(touch.as_mut().map(|(t, _)| t)),
        )
        .await
        {
            Either::First(outcome) => outcome,
            Either::Second(never) => match never {},
        };

        match &outcome {
            PortalOutcome::Reconnected(creds) => info!("Joined '{}' from the portal", creds.ssid),
            PortalOutcome::Cancelled | PortalOutcome::TimedOut => {
                error!("Portal ended with {:?}, restarting", outcome);
                Timer::after(Duration::from_millis(500)).await;
                esp_hal::system::software_reset();
            }
        }
    }

    enter(&mut run_state, AppRunState::WifiConnected);
    if with_timeout(DHCP_TIMEOUT, wifi::wait_for_ip(sta_stack)).await.is_err() {
        warn!("No DHCP lease yet; prices stay offline until one arrives");
    }

    // Dashboard
    // A bad API host leaves prices offline; HID and media keep working
    let mut client = match HttpPriceClient::new(sta_stack, deck.api.host) {
        Ok(client) => Some(client),
        Err(e) => {
            error!("Price API disabled, '{}' is not usable: {}", deck.api.host, e);
            None
        }
    };

    let mut ui = match UiOrchestrator::init(
        MEDIA_KEY_CHANNEL.sender(),
        &HID_LINK,
        WallClock::new(deck.utc_offset_secs),
    ) {
        Ok(ui) => ui,
        Err(e) => {
            error!("UI unavailable: {}", e);
            enter(&mut run_state, AppRunState::Error);
            // BLE and networking keep running in their own tasks
            loop {
                Timer::after(Duration::from_secs(3600)).await;
            }
        }
    };

    let configured = deck.api.symbols().count();
    if configured > MAX_COINS {
        warn!("{} coins configured, showing the first {}", configured, MAX_COINS);
    }
    let symbols: heapless::Vec<&str, MAX_COINS> = deck.api.symbols().take(MAX_COINS).collect();
    if let Err(e) = ui.create_ui(&symbols, now_ms()) {
        error!("Failed to build tiles: {}", e);
    }
    enter(&mut run_state, AppRunState::Dashboard);

    loop {
        let raw = match touch.as_mut() {
            Some((controller, _)) => controller.read_point().await.unwrap_or_else(|e| {
                debug!(" Touch read failed: {:?}", e);
                None
            }),
            None => None,
        };
        ui.read_pointer(raw, now_ms());
        ui.tick(now_ms(), &mut client).await;
        if let Err(e) = ui.render(&mut display) {
            warn!("Display flush failed: {:?}", e);
        }
        Timer::after(Duration::from_millis(FRAME_MS)).await;
    }
}

/// Instructions shown while the access point is up.
fn draw_portal_screen(display: &mut Panel) -> Result<(), <Panel as DrawTarget>::Error> {
    display.clear(COLOR_BACKGROUND)?;
    let lines: [(&str, TextSize, i32); 5] = [
        ("WiFi setup", TextSize::Large, 70),
        ("Join network", TextSize::Medium, 100),
        (AP_SSID, TextSize::Medium, 116),
        (PORTAL_URL, TextSize::Medium, 140),
        ("Tap to restart", TextSize::Small, 176),
    ];
    for (text, size, y) in lines {
        let bounds = Rectangle::with_center(Point::new(120, y), Size::new(220, 22));
        TextComponent::new(bounds, text, size)
            .with_alignment(Alignment::Center)
            .draw(display)?;
    }
    Ok(())
}

/// Raise [`PORTAL_CANCEL`] on the first tap. Never completes.
async fn cancel_on_tap(touch: Option<&mut TouchController>) -> Infallible {
    let Some(touch) = touch else {
        return pending().await;
    };
    let mut was_down = false;
    loop {
        let down = matches!(touch.read_point().await, Ok(Some(_)));
        if was_down && !down {
            PORTAL_CANCEL.signal(());
        }
        was_down = down;
        Timer::after(Duration::from_millis(50)).await;
    }
}
