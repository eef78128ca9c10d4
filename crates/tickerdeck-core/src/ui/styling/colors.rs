//! Color definitions and palette management
//!
//! All colors are RGB565. To convert from 8-bit RGB: R>>3, G>>2, B>>3

use embedded_graphics::pixelcolor::Rgb565;

// ============================================================================
// Base Colors
// ============================================================================

/// Tile background - near black
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(0, 0, 0);

/// Raised surfaces such as buttons
pub const COLOR_SURFACE: Rgb565 = Rgb565::new(40 >> 3, 44 >> 2, 52 >> 3);

/// Meter scale and outlines
pub const COLOR_STROKE: Rgb565 = Rgb565::new(110 >> 3, 116 >> 2, 124 >> 3);

/// Accent for interactive elements - blue
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(33 >> 3, 150 >> 2, 243 >> 3);

// ============================================================================
// Price Trend Colors
// ============================================================================

/// Positive 24h change
pub const COLOR_RISING: Rgb565 = Rgb565::new(0, 63, 0);

/// Negative 24h change
pub const COLOR_FALLING: Rgb565 = Rgb565::new(31, 0, 0);

/// No change
pub const COLOR_FLAT: Rgb565 = Rgb565::new(16, 32, 16);

/// Meter needle
pub const COLOR_NEEDLE: Rgb565 = Rgb565::new(31, 0, 0);

// ============================================================================
// Text Colors
// ============================================================================

pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);

/// Secondary text
pub const LIGHT_GRAY: Rgb565 = Rgb565::new(21, 42, 21);

pub const GRAY: Rgb565 = Rgb565::new(16, 32, 16);


// ============================================================================
// Color Palette
// ============================================================================

/// Colors shared by every tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPalette {
    /// Accent for buttons
    pub primary: Rgb565,
    pub background: Rgb565,
    /// Button and panel fill
    pub surface: Rgb565,
    pub text_primary: Rgb565,
    /// Labels of lesser importance
    pub text_secondary: Rgb565,
    pub border: Rgb565,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::dark()
    }
}

impl ColorPalette {
    /// Light text on black, the only theme the round panel uses.
    pub fn dark() -> Self {
        Self {
            primary: COLOR_ACCENT,
            background: COLOR_BACKGROUND,
            surface: COLOR_SURFACE,
            text_primary: WHITE,
            text_secondary: LIGHT_GRAY,
            border: COLOR_STROKE,
        }
    }
}
