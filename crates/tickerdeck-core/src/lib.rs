//! Hardware-independent core library for tickerdeck
//!
//! This crate contains all platform-agnostic logic for the dashboard: the
//! tiled UI and its periodic refresh tasks, the consumer-control HID report
//! model, the price API client contract, and the WiFi configuration portal
//! (HTTP, captive DNS, DHCP and credential persistence).
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod app_state;
pub mod clock;
pub mod config;
pub mod framebuffer;
pub mod hid;
pub mod market;
pub mod media;
pub mod net;
pub mod orchestrator;
pub mod pages;
pub mod portal;
pub mod scheduler;
pub mod storage;
pub mod ui;
