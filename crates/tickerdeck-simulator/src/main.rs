//! Desktop simulator for the tickerdeck dashboard.
//!
//! Runs the same [`UiOrchestrator`] as the firmware in an SDL2 window via
//! `embedded-graphics-simulator`, with a synthetic price API and the media
//! keys logged instead of sent over Bluetooth.
//!
//! # Key bindings
//!
//! | Key        | Action                        |
//! |------------|-------------------------------|
//! | Left/Right | Previous / next tile          |
//! | 1-7        | Jump to tile                  |
//! | R          | Refresh prices now            |
//! | C          | Toggle a fake BLE connection  |
//! | Q          | Quit                          |
//!
//! Mouse drags are forwarded as touch input, so swipes and button taps work
//! as on the panel. Set `COIN_SYMBOLS` to change the tracked coins.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use embassy_futures::block_on;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info};

use tickerdeck_core::clock::WallClock;
use tickerdeck_core::config::MAX_COINS;
use tickerdeck_core::hid::{HID_LINK, MEDIA_KEY_CHANNEL};
use tickerdeck_core::market::PriceClient;
use tickerdeck_core::net::HttpResponse;
use tickerdeck_core::orchestrator::UiOrchestrator;
use tickerdeck_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, TouchPoint};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

const DEFAULT_SYMBOLS: &str = "BTCUSDT,ETHUSDT,SOLUSDT";

// ---------------------------------------------------------------------------
// Mock price API
// ---------------------------------------------------------------------------

/// Answers quote requests with prices that drift over time.
struct MockPriceClient {
    started: Instant,
}

impl MockPriceClient {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

fn base_price(symbol: &str) -> f64 {
    match symbol {
        "BTCUSDT" => 67_000.0,
        "ETHUSDT" => 2_450.0,
        "SOLUSDT" => 150.0,
        _ => 1.0,
    }
}

impl PriceClient for MockPriceClient {
    type Error = &'static str;

    fn is_network_up(&self) -> bool {
        true
    }

    async fn get(&mut self, path: &str) -> Result<HttpResponse, Self::Error> {
        let symbols = path
            .split_once("symbols=")
            .map(|(_, s)| s)
            .ok_or("missing symbols")?;
        let t = self.started.elapsed().as_secs_f64();

        // Alternate number and string encodings like the real API does
        let quotes: Vec<String> = symbols
            .split(',')
            .enumerate()
            .map(|(i, symbol)| {
                let phase = i as f64 * 1.7;
                let price = base_price(symbol) * (1.0 + 0.02 * (t / 60.0 + phase).sin());
                let change = 6.0 * (t / 90.0 + phase).sin();
                if i % 2 == 0 {
                    format!(
                        r#"{{"symbol":"{symbol}","lastPrice":"{price:.4}","priceChangePercent":"{change:.2}"}}"#
                    )
                } else {
                    format!(
                        r#"{{"symbol":"{symbol}","lastPrice":{price:.4},"priceChangePercent":{change:.2}}}"#
                    )
                }
            })
            .collect();

        Ok(HttpResponse {
            status: 200,
            date: None,
            body: format!("[{}]", quotes.join(",")).into_bytes(),
            received_ms: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting tickerdeck simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: ←/→=Tiles  1-7=Jump  R=Refresh  C=Connect  Q=Quit");

    let symbols_env = std::env::var("COIN_SYMBOLS").unwrap_or_else(|_| DEFAULT_SYMBOLS.into());
    let symbols: Vec<&str> = symbols_env
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_COINS)
        .collect();

    // Host clock stands in for the API's Date header
    let mut clock = WallClock::default();
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    clock.sync_unix(unix_secs as i64, 0);

    let keys = MEDIA_KEY_CHANNEL.sender();
    let mut ui = match UiOrchestrator::init(keys, &HID_LINK, clock) {
        Ok(ui) => ui,
        Err(e) => {
            error!("Failed to start UI: {}", e);
            return;
        }
    };
    if let Err(e) = ui.create_ui(&symbols, 0) {
        error!("Failed to build tiles: {}", e);
        return;
    }
    HID_LINK.advertising_started();

    let mut client = MockPriceClient::new();

    // SDL2 display and window
    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        DISPLAY_WIDTH_PX,
        DISPLAY_HEIGHT_PX,
    ));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Tickerdeck Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let started = Instant::now();
    let _ = display.clear(Rgb565::BLACK);
    let _ = ui.render(&mut display);
    window.update(&display);

    let mut touching = false;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();
        let now_ms = started.elapsed().as_millis() as u64;

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::Left => {
                        ui.tiles_mut().previous(now_ms);
                    }
                    Keycode::Right => {
                        ui.tiles_mut().next(now_ms);
                    }
                    Keycode::R => {
                        info!("Manual price refresh");
                        ui.request_price_refresh(now_ms);
                    }
                    Keycode::C => {
                        if HID_LINK.is_connected() {
                            HID_LINK.disconnected();
                        } else {
                            HID_LINK.connected();
                        }
                        info!("Fake BLE link: {:?}", HID_LINK.state());
                        ui.update_media_info();
                    }
                    other => {
                        if let Some(index) = keycode_to_tile(other)
                            && let Err(e) = ui.set_tile(index, now_ms)
                        {
                            info!("{}", e);
                        }
                    }
                },

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    touching = true;
                    ui.read_pointer(Some(to_touch(point)), now_ms);
                }

                SimulatorEvent::MouseMove { point } if touching => {
                    ui.read_pointer(Some(to_touch(point)), now_ms);
                }

                SimulatorEvent::MouseButtonUp { .. } => {
                    touching = false;
                    ui.read_pointer(None, now_ms);
                }

                _ => {}
            }
        }

        // --- Periodic tasks -----------------------------------------------
        block_on(ui.tick(now_ms, &mut client));

        // --- Media keys ---------------------------------------------------
        while let Ok(key) = MEDIA_KEY_CHANNEL.try_receive() {
            info!("HID key → {:?} (usage 0x{:02X})", key, key.usage());
        }

        // --- Render -------------------------------------------------------
        let Ok(_) = ui.render(&mut display);
        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}

fn to_touch(point: Point) -> TouchPoint {
    TouchPoint::new(point.x.max(0) as u16, point.y.max(0) as u16)
}

/// Map number keys to tile indexes.
fn keycode_to_tile(keycode: Keycode) -> Option<usize> {
    match keycode {
        Keycode::Num1 | Keycode::Kp1 => Some(0),
        Keycode::Num2 | Keycode::Kp2 => Some(1),
        Keycode::Num3 | Keycode::Kp3 => Some(2),
        Keycode::Num4 | Keycode::Kp4 => Some(3),
        Keycode::Num5 | Keycode::Kp5 => Some(4),
        Keycode::Num6 | Keycode::Kp6 => Some(5),
        Keycode::Num7 | Keycode::Kp7 => Some(6),
        _ => None,
    }
}
