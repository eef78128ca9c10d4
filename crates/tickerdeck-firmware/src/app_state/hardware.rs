//! Display and touch bring-up for the round 240x240 board
//!
//! | Signal       | GPIO |
//! |--------------|------|
//! | LCD SCK      | 10   |
//! | LCD MOSI     | 11   |
//! | LCD CS       | 9    |
//! | LCD DC       | 8    |
//! | LCD RST      | 14   |
//! | LCD BL       | 2    |
//! | Touch SDA    | 6    |
//! | Touch SCL    | 7    |
//! | Touch RST    | 13   |
//!
//! The panel is a GC9A01 on SPI2; the CST816S touch controller sits alone
//! on I2C0, so it owns the bus outright.

use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::{Async, Blocking};
use log::{info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::models::GC9A01;
use mipidsi::options::{ColorInversion, ColorOrder};
use mipidsi::{Builder as MipidsiBuilder, Display};
use static_cell::StaticCell;

use tickerdeck_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

use crate::cst816s::Cst816s;

pub type PanelSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, NoDelay>;
pub type Panel = Display<SpiInterface<'static, PanelSpi, Output<'static>>, GC9A01, Output<'static>>;
pub type TouchController = Cst816s<I2c<'static, Async>>;

/// Peripherals the panel needs.
pub struct PanelPins {
    pub spi: esp_hal::peripherals::SPI2<'static>,
    pub sck: esp_hal::peripherals::GPIO10<'static>,
    pub mosi: esp_hal::peripherals::GPIO11<'static>,
    pub cs: esp_hal::peripherals::GPIO9<'static>,
    pub dc: esp_hal::peripherals::GPIO8<'static>,
    pub rst: esp_hal::peripherals::GPIO14<'static>,
    pub backlight: esp_hal::peripherals::GPIO2<'static>,
}

/// Initialize the GC9A01 panel and switch the backlight on.
///
/// The returned backlight pin must be kept alive.
pub fn init_display(pins: PanelPins) -> (Panel, Output<'static>) {
    // 1. Configure SPI bus
    let spi_bus = Spi::new(
        pins.spi,
        SpiConfig::default().with_frequency(Rate::from_mhz(40)),
    )
    .expect("Failed to configure display SPI")
    .with_sck(pins.sck)
    .with_mosi(pins.mosi);

    // 2. Wrap the SPI bus as a SPI device (required by embedded-hal traits)
    let cs = Output::new(pins.cs, Level::High, OutputConfig::default());
    let spi_device =
        ExclusiveDevice::new_no_delay(spi_bus, cs).expect("Failed to create display SPI device");

    // 3. Data/Command and reset lines
    let dc = Output::new(pins.dc, Level::Low, OutputConfig::default());
    let rst = Output::new(pins.rst, Level::High, OutputConfig::default());

    // 4. Buffer for SPI batching (larger = faster, uses more RAM)
    static SPI_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();
    let spi_buffer = SPI_BUFFER.init([0u8; 512]);

    // 5. Build and initialize the display driver
    let di = SpiInterface::new(spi_device, dc, spi_buffer);
    let display = MipidsiBuilder::new(GC9A01, di)
        .display_size(DISPLAY_WIDTH_PX as u16, DISPLAY_HEIGHT_PX as u16)
        .reset_pin(rst)
        .invert_colors(ColorInversion::Inverted)
        .color_order(ColorOrder::Bgr)
        .init(&mut embassy_time::Delay)
        .expect("Failed to initialize display");

    let backlight = Output::new(pins.backlight, Level::High, OutputConfig::default());
    info!("Display initialized");
    (display, backlight)
}

/// Initialize the I2C bus for the touch controller (400 kHz).
pub fn create_i2c_bus(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO6<'static>,
    scl: esp_hal::peripherals::GPIO7<'static>,
) -> I2c<'static, Async> {
    I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .expect("Failed to configure touch I2C")
    .with_sda(sda)
    .with_scl(scl)
    .into_async()
}

/// Reset and configure the touch controller.
///
/// Returns `None` when the controller does not answer; the dashboard then
/// runs without touch input. The returned reset pin must be kept alive.
pub async fn init_touch(
    i2c: I2c<'static, Async>,
    rst: esp_hal::peripherals::GPIO13<'static>,
) -> Option<(TouchController, Output<'static>)> {
    let mut rst = Output::new(rst, Level::High, OutputConfig::default());
    let mut touch = Cst816s::new(i2c);

    match touch.init(&mut rst, &mut embassy_time::Delay).await {
        Ok(_) => {
            info!("Touch controller ready");
            Some((touch, rst))
        }
        Err(e) => {
            warn!("Touch init failed: {:?}", e);
            None
        }
    }
}
