//! UI components library

pub mod button;
pub mod meter;
pub mod text;

pub use button::Button;
pub use meter::Meter;
pub use text::{TextComponent, TextSize};
