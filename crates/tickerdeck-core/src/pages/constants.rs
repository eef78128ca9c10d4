//! Shared layout constants for the tiles
//!
//! Offsets are measured on the 240x240 panel. "Top" offsets are the top
//! edge of a text row; "center" offsets are relative to the panel centre.

/// Text row height in pixels
pub const TEXT_ROW_HEIGHT_PX: u32 = 20;

/// Width available to a text row (inset from the round bezel)
pub const TEXT_ROW_WIDTH_PX: u32 = 220;

// Coin tile
pub const COIN_NAME_TOP_PX: i32 = 10;
pub const COIN_PRICE_CENTER_OFFSET_PX: i32 = 20;
pub const COIN_CHANGE_CENTER_OFFSET_PX: i32 = 40;

// Media tile
pub const MEDIA_TRACK_TOP_PX: i32 = 20;
pub const MEDIA_ARTIST_TOP_PX: i32 = 50;
pub const MEDIA_STATUS_TOP_PX: i32 = 80;
pub const MEDIA_BUTTON_WIDTH_PX: u32 = 60;
pub const MEDIA_BUTTON_HEIGHT_PX: u32 = 50;
/// Horizontal distance between neighbouring transport buttons
pub const MEDIA_BUTTON_SPACING_PX: i32 = 70;
pub const MEDIA_BUTTON_BOTTOM_MARGIN_PX: i32 = 20;

// System tile
pub const SYSTEM_DATE_TOP_PX: i32 = 30;
pub const SYSTEM_TIME_TOP_PX: i32 = 60;
pub const SYSTEM_LAST_UPDATE_TOP_PX: i32 = 100;

// Pairing tile
pub const PAIRING_WAITING_CENTER_OFFSET_PX: i32 = -20;
pub const PAIRING_HINT_CENTER_OFFSET_PX: i32 = 20;
pub const PAIRING_STATUS_CENTER_OFFSET_PX: i32 = 60;
