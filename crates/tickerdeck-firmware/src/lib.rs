//! ESP32-S3 firmware-specific modules for tickerdeck
//!
//! This crate contains the code that only builds for the device: panel and
//! touch bring-up, the esp-radio WiFi link and portal sockets, the BLE HID
//! peripheral, and the price API transport.

#![no_std]

extern crate alloc;

pub mod app_state;
pub mod ble;
pub mod cst816s;
pub mod http_client;
pub mod wifi;
pub mod wifi_secrets;
