//! Touch and drawing traits shared by components and tiles.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Panel coordinate reported by the touch controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_point(&self) -> Point {
        Point::new(i32::from(self.x), i32::from(self.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    Press(TouchPoint),
    Drag(TouchPoint),
    /// Finger lifted; carries the last known point
    Release(TouchPoint),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchResult {
    Handled,
    /// Offer the event to the next element
    NotHandled,
    Action(Action),
}

/// What a tap on the dashboard asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PlayPause,
    NextTrack,
    PreviousTrack,
    /// Jump to a tile by index
    ShowTile(u8),
}

/// Identifies a tile in the carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    /// Price tile for the coin at this position
    Coin(u8),
    Media,
    System,
    Pairing,
}

/// Something that paints itself and tracks whether it needs to.
pub trait Drawable {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error>;

    fn bounds(&self) -> Rectangle;

    fn is_dirty(&self) -> bool;

    fn mark_clean(&mut self);

    fn mark_dirty(&mut self);
}

pub trait Touchable {
    fn contains_point(&self, point: TouchPoint) -> bool;

    fn handle_touch(&mut self, event: TouchEvent) -> TouchResult;
}
