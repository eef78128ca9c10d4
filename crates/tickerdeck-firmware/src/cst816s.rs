//! CST816S capacitive touch controller, async I2C.
//!
//! Single-touch controller used on the 240x240 round panels. Coordinates
//! are reported in panel pixels, so no scaling is needed.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, info};

use tickerdeck_core::ui::TouchPoint;

// =============================================================================
// I2C Address
// =============================================================================

pub const I2C_ADDR: u8 = 0x15;

// =============================================================================
// Register Addresses
// =============================================================================

pub const ADDR_GESTURE_ID: u8 = 0x01;
pub const ADDR_CHIP_ID: u8 = 0xA7;
pub const ADDR_FW_VERSION: u8 = 0xA9;
pub const ADDR_MOTION_MASK: u8 = 0xEC;
pub const ADDR_IRQ_CTL: u8 = 0xFA;
pub const ADDR_DIS_AUTO_SLEEP: u8 = 0xFE;

/// IrqCtl: pulse on touch and on change
pub const IRQ_EN_TOUCH: u8 = 0x40;
pub const IRQ_EN_CHANGE: u8 = 0x20;

// =============================================================================
// Enums
// =============================================================================

/// Gesture the controller detected on its own.
///
/// Swipe detection in the UI works from raw coordinates; this is only
/// logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    None,
    SlideUp,
    SlideDown,
    SlideLeft,
    SlideRight,
    SingleClick,
    DoubleClick,
    LongPress,
}

impl Gesture {
    pub fn from_register(val: u8) -> Self {
        match val {
            0x01 => Self::SlideUp,
            0x02 => Self::SlideDown,
            0x03 => Self::SlideLeft,
            0x04 => Self::SlideRight,
            0x05 => Self::SingleClick,
            0x0B => Self::DoubleClick,
            0x0C => Self::LongPress,
            _ => Self::None,
        }
    }
}

/// One read of the touch registers.
#[derive(Debug, Clone, Copy)]
pub struct TouchData {
    pub gesture: Gesture,
    pub fingers: u8,
    pub x: u16,
    pub y: u16,
}

impl TouchData {
    /// Decode registers 0x01..=0x06: gesture, finger count, X high/low,
    /// Y high/low.
    pub fn from_registers(regs: &[u8; 6]) -> Self {
        Self {
            gesture: Gesture::from_register(regs[0]),
            fingers: regs[1] & 0x0F,
            x: (((regs[2] & 0x0F) as u16) << 8) | regs[3] as u16,
            y: (((regs[4] & 0x0F) as u16) << 8) | regs[5] as u16,
        }
    }

    pub fn point(&self) -> Option<TouchPoint> {
        (self.fingers > 0).then(|| TouchPoint::new(self.x, self.y))
    }
}

// =============================================================================
// Driver Error Type
// =============================================================================

#[derive(Debug)]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// Reset line could not be driven
    Reset,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::I2c(e)
    }
}

// =============================================================================
// Driver Implementation
// =============================================================================

pub struct Cst816s<I2C> {
    i2c: I2C,
}

impl<I2C> Cst816s<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    async fn read_byte(&mut self, addr: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(I2C_ADDR, &[addr], &mut buf).await?;
        Ok(buf[0])
    }

    async fn write_byte(&mut self, addr: u8, data: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(I2C_ADDR, &[addr, data]).await?;
        Ok(())
    }

    /// Pulse the reset line, then keep the controller awake and reporting
    /// touches. Returns the chip ID.
    pub async fn init<RST, D>(&mut self, rst: &mut RST, delay: &mut D) -> Result<u8, Error<I2C::Error>>
    where
        RST: OutputPin,
        D: DelayNs,
    {
        rst.set_low().map_err(|_| Error::Reset)?;
        delay.delay_ms(10).await;
        rst.set_high().map_err(|_| Error::Reset)?;
        delay.delay_ms(50).await;

        let chip_id = self.read_byte(ADDR_CHIP_ID).await?;
        let firmware = self.read_byte(ADDR_FW_VERSION).await?;
        info!("CST816S chip 0x{:02X}, firmware {}", chip_id, firmware);

        // Auto sleep stops the controller answering on I2C
        self.write_byte(ADDR_DIS_AUTO_SLEEP, 0x01).await?;
        self.write_byte(ADDR_MOTION_MASK, 0x00).await?;
        self.write_byte(ADDR_IRQ_CTL, IRQ_EN_TOUCH | IRQ_EN_CHANGE).await?;
        Ok(chip_id)
    }

    pub async fn read_touch(&mut self) -> Result<TouchData, Error<I2C::Error>> {
        let mut regs = [0u8; 6];
        self.i2c
            .write_read(I2C_ADDR, &[ADDR_GESTURE_ID], &mut regs)
            .await?;
        Ok(TouchData::from_registers(&regs))
    }

    /// Current contact point, `None` when released.
    pub async fn read_point(&mut self) -> Result<Option<TouchPoint>, Error<I2C::Error>> {
        let data = self.read_touch().await?;
        if data.gesture != Gesture::None {
            debug!(" Touch gesture {:?}", data.gesture);
        }
        Ok(data.point())
    }
}
