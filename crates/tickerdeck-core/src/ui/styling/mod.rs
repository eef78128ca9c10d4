//! Colours and per-component styles.

pub mod colors;
pub mod style;

pub use colors::{
    COLOR_BACKGROUND, COLOR_FALLING, COLOR_FLAT, COLOR_NEEDLE, COLOR_RISING, COLOR_STROKE,
    COLOR_SURFACE, ColorPalette, GRAY, LIGHT_GRAY, WHITE,
};
pub use style::{ButtonVariant, Style};
