//! Firmware-specific application state extensions
//!
//! Re-exports the hardware-independent app state from `tickerdeck_core` and
//! adds the ESP32-S3 panel and touch bring-up.

mod hardware;

pub use hardware::*;

// Re-export all shared app state types from tickerdeck-core
pub use tickerdeck_core::app_state::*;
