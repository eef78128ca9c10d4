//! Tile abstraction and the type-erased wrapper the tile view stores.
//!
//! [`PageWrapper`] is a concrete enum that delegates every [`Page`] method to
//! the inner tile, so the [`TileView`](super::tile_view::TileView) can keep a
//! `heapless::Vec<PageWrapper, N>` without trait objects.

use crate::pages::constants::{TEXT_ROW_HEIGHT_PX, TEXT_ROW_WIDTH_PX};
use crate::pages::{CoinPage, MediaPage, PairingPage, SystemPage};
use crate::ui::core::{Action, PageId, TouchEvent};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use alloc::boxed::Box;

// ---------------------------------------------------------------------------
// Page trait
// ---------------------------------------------------------------------------

/// Contract for every tile.
///
/// The tile view calls `on_activate`/`on_deactivate` around navigation,
/// forwards touch events to the active tile, and draws tiles whose
/// `is_dirty()` is set.
pub trait Page {
    fn id(&self) -> PageId;

    /// Short name for logs.
    fn title(&self) -> &str;

    fn on_activate(&mut self) {}

    fn on_deactivate(&mut self) {}

    /// Process a touch event and optionally return an [`Action`].
    fn handle_touch(&mut self, event: TouchEvent) -> Option<Action>;

    /// The touch in progress became a gesture; drop any pressed state.
    fn cancel_touch(&mut self) {}

    /// Render the whole tile at its own coordinates.
    fn draw_page<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error>;

    fn bounds(&self) -> Rectangle;

    fn is_dirty(&self) -> bool;

    fn mark_clean(&mut self);

    fn mark_dirty(&mut self);
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

/// Horizontally centred text row whose top edge is `top` px below the tile top.
pub(crate) fn row_from_top(bounds: Rectangle, top: i32) -> Rectangle {
    let x = bounds.center().x - (TEXT_ROW_WIDTH_PX / 2) as i32;
    Rectangle::new(
        Point::new(x, bounds.top_left.y + top),
        Size::new(TEXT_ROW_WIDTH_PX, TEXT_ROW_HEIGHT_PX),
    )
}

/// Text row centred `offset` px below the tile centre.
pub(crate) fn row_from_center(bounds: Rectangle, offset: i32) -> Rectangle {
    Rectangle::with_center(
        bounds.center() + Point::new(0, offset),
        Size::new(TEXT_ROW_WIDTH_PX, TEXT_ROW_HEIGHT_PX),
    )
}

// ---------------------------------------------------------------------------
// PageWrapper
// ---------------------------------------------------------------------------

/// One of the concrete tiles, boxed to keep the enum small.
pub enum PageWrapper {
    Coin(Box<CoinPage>),
    Media(Box<MediaPage>),
    System(Box<SystemPage>),
    Pairing(Box<PairingPage>),
}

impl PageWrapper {
    pub fn as_coin_mut(&mut self) -> Option<&mut CoinPage> {
        match self {
            PageWrapper::Coin(page) => Some(&mut **page),
            _ => None,
        }
    }

    pub fn as_media_mut(&mut self) -> Option<&mut MediaPage> {
        match self {
            PageWrapper::Media(page) => Some(&mut **page),
            _ => None,
        }
    }

    pub fn as_system_mut(&mut self) -> Option<&mut SystemPage> {
        match self {
            PageWrapper::System(page) => Some(&mut **page),
            _ => None,
        }
    }

    pub fn as_pairing_mut(&mut self) -> Option<&mut PairingPage> {
        match self {
            PageWrapper::Pairing(page) => Some(&mut **page),
            _ => None,
        }
    }
}

/// Forward a call to whichever tile is inside.
macro_rules! each_tile {
    ($wrapper:expr, $page:ident => $call:expr) => {
        match $wrapper {
            PageWrapper::Coin($page) => $call,
            PageWrapper::Media($page) => $call,
            PageWrapper::System($page) => $call,
            PageWrapper::Pairing($page) => $call,
        }
    };
}

impl Page for PageWrapper {
    fn id(&self) -> PageId {
        each_tile!(self, p => p.id())
    }

    fn title(&self) -> &str {
        each_tile!(self, p => p.title())
    }

    fn on_activate(&mut self) {
        each_tile!(self, p => p.on_activate())
    }

    fn on_deactivate(&mut self) {
        each_tile!(self, p => p.on_deactivate())
    }

    fn handle_touch(&mut self, event: TouchEvent) -> Option<Action> {
        each_tile!(self, p => p.handle_touch(event))
    }

    fn cancel_touch(&mut self) {
        each_tile!(self, p => p.cancel_touch())
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        each_tile!(self, p => p.draw_page(display))
    }

    fn bounds(&self) -> Rectangle {
        each_tile!(self, p => Page::bounds(&**p))
    }

    fn is_dirty(&self) -> bool {
        each_tile!(self, p => Page::is_dirty(&**p))
    }

    fn mark_clean(&mut self) {
        each_tile!(self, p => Page::mark_clean(&mut **p))
    }

    fn mark_dirty(&mut self) {
        each_tile!(self, p => Page::mark_dirty(&mut **p))
    }
}

impl From<CoinPage> for PageWrapper {
    fn from(page: CoinPage) -> Self {
        PageWrapper::Coin(Box::new(page))
    }
}

impl From<MediaPage> for PageWrapper {
    fn from(page: MediaPage) -> Self {
        PageWrapper::Media(Box::new(page))
    }
}

impl From<SystemPage> for PageWrapper {
    fn from(page: SystemPage) -> Self {
        PageWrapper::System(Box::new(page))
    }
}

impl From<PairingPage> for PageWrapper {
    fn from(page: PairingPage) -> Self {
        PageWrapper::Pairing(Box::new(page))
    }
}
