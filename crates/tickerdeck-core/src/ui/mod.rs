//! Tickerdeck UI system for the round 240x240 panel
//!
//! This module provides:
//! - Core traits for drawable and touchable elements
//! - Pointer sampling that turns raw touch readings into press/drag/release
//!   events and swipe gestures
//! - Styled components (buttons, text labels, the change meter)
//! - Dirty tracking so only changed tiles are redrawn

pub mod components;
pub mod core;
pub mod pointer;
pub mod styling;

/// Panel width in pixels.
pub const DISPLAY_WIDTH_PX: u32 = 240;

/// Panel height in pixels.
pub const DISPLAY_HEIGHT_PX: u32 = 240;

pub use components::{Button, Meter, TextComponent, TextSize};
pub use core::{Action, Drawable, PageId, TouchEvent, TouchPoint, TouchResult, Touchable};
pub use pointer::{Gesture, PointerInput, PointerSample, SwipeDirection};
pub use styling::{ButtonVariant, ColorPalette, Style};
