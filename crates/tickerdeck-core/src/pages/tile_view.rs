//! Horizontal tile view with slide navigation.
//!
//! Tiles sit side by side; exactly one is active. Moving to another tile
//! slides both the outgoing and incoming tile across the panel over
//! [`SLIDE_DURATION_MS`]. Touch input is ignored while a slide runs.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;
use log::{debug, info, warn};

use crate::app_state::AppError;
use crate::config::MAX_COINS;
use crate::pages::page::{Page, PageWrapper};
use crate::pages::{CoinPage, MediaPage, PairingPage, SystemPage};
use crate::ui::core::{Action, PageId, TouchEvent};

/// Coin tiles plus media, system and pairing.
pub const MAX_TILES: usize = MAX_COINS + 3;

pub const SLIDE_DURATION_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slide {
    from: usize,
    to: usize,
    started_ms: u64,
    /// Distance travelled so far, 0..=display width
    offset_px: i32,
}

pub struct TileView {
    pages: Vec<PageWrapper, MAX_TILES>,
    current: usize,
    slide: Option<Slide>,
    display_bounds: Rectangle,
}

impl TileView {
    pub fn new(display_bounds: Rectangle) -> Self {
        Self {
            pages: Vec::new(),
            current: 0,
            slide: None,
            display_bounds,
        }
    }

    /// Append a tile. Returns `false` when the view is full.
    pub fn register_page(&mut self, page: PageWrapper) -> bool {
        let id = page.id();
        if self.pages.push(page).is_err() {
            warn!("Tile view full, dropping {:?}", id);
            return false;
        }
        if self.pages.len() == 1 {
            self.pages[0].on_activate();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page_id(&self) -> Option<PageId> {
        self.pages.get(self.current).map(Page::id)
    }

    pub fn index_of(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id() == id)
    }

    pub fn display_bounds(&self) -> Rectangle {
        self.display_bounds
    }

    /// Slide to tile `index`.
    ///
    /// Out-of-range indexes are rejected and the current tile is kept.
    /// Selecting the active tile is a no-op. Starting a new slide while one
    /// runs finishes the old one first.
    pub fn set_tile(&mut self, index: usize, now_ms: u64) -> Result<(), AppError> {
        if index >= self.pages.len() {
            return Err(AppError::TileOutOfRange {
                index,
                count: self.pages.len(),
            });
        }
        self.finish_slide();
        if index == self.current {
            return Ok(());
        }

        info!(
            "Tile {} -> {} ({})",
            self.current,
            index,
            self.pages[index].title()
        );
        self.pages[self.current].on_deactivate();
        self.pages[index].on_activate();
        self.slide = Some(Slide {
            from: self.current,
            to: index,
            started_ms: now_ms,
            offset_px: 0,
        });
        self.current = index;
        Ok(())
    }

    /// Move one tile to the right, if there is one.
    pub fn next(&mut self, now_ms: u64) -> bool {
        let target = self.current + 1;
        target < self.pages.len() && self.set_tile(target, now_ms).is_ok()
    }

    /// Move one tile to the left, if there is one.
    pub fn previous(&mut self, now_ms: u64) -> bool {
        self.current > 0 && self.set_tile(self.current - 1, now_ms).is_ok()
    }

    pub fn is_animating(&self) -> bool {
        self.slide.is_some()
    }

    /// Advance the running slide to `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        let width = self.display_bounds.size.width as u64;
        let Some(slide) = self.slide.as_mut() else {
            return;
        };
        let elapsed = now_ms.saturating_sub(slide.started_ms);
        if elapsed >= SLIDE_DURATION_MS {
            self.finish_slide();
        } else {
            slide.offset_px = (elapsed * width / SLIDE_DURATION_MS) as i32;
        }
    }

    fn finish_slide(&mut self) {
        if let Some(slide) = self.slide.take() {
            debug!(" Slide to tile {} done", slide.to);
            self.pages[slide.to].mark_dirty();
        }
    }

    pub fn handle_touch(&mut self, event: TouchEvent) -> Option<Action> {
        if self.is_animating() {
            return None;
        }
        debug!(" Processing touch event: {:?}", event);
        let page = self.pages.get_mut(self.current)?;
        let result = page.handle_touch(event);
        if result.is_some() {
            debug!(" Touch result: {:?}", result);
        }
        result
    }

    /// The active touch became a gesture.
    pub fn cancel_touch(&mut self) {
        if let Some(page) = self.pages.get_mut(self.current) {
            page.cancel_touch();
        }
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut PageWrapper> {
        self.pages.get_mut(index)
    }

    pub fn coin_mut(&mut self, index: u8) -> Option<&mut CoinPage> {
        self.pages
            .iter_mut()
            .filter_map(PageWrapper::as_coin_mut)
            .find(|p| p.index() == index)
    }

    pub fn media_mut(&mut self) -> Option<&mut MediaPage> {
        self.pages.iter_mut().find_map(PageWrapper::as_media_mut)
    }

    pub fn system_mut(&mut self) -> Option<&mut SystemPage> {
        self.pages.iter_mut().find_map(PageWrapper::as_system_mut)
    }

    pub fn pairing_mut(&mut self) -> Option<&mut PairingPage> {
        self.pages.iter_mut().find_map(PageWrapper::as_pairing_mut)
    }

    /// Whether the next [`draw`](Self::draw) would paint anything.
    pub fn is_dirty(&self) -> bool {
        self.is_animating() || self.pages.get(self.current).is_some_and(Page::is_dirty)
    }

    /// Paint the active tile, or both tiles of a running slide.
    ///
    /// Returns whether anything was drawn.
    pub fn draw<D: DrawTarget<Color = Rgb565>>(&mut self, display: &mut D) -> Result<bool, D::Error> {
        if let Some(slide) = self.slide {
            let width = self.display_bounds.size.width as i32;
            let (from_x, to_x) = if slide.to > slide.from {
                (-slide.offset_px, width - slide.offset_px)
            } else {
                (slide.offset_px, slide.offset_px - width)
            };
            self.pages[slide.from].draw_page(&mut display.translated(Point::new(from_x, 0)))?;
            self.pages[slide.to].draw_page(&mut display.translated(Point::new(to_x, 0)))?;
            return Ok(true);
        }

        match self.pages.get_mut(self.current) {
            Some(page) if page.is_dirty() => {
                page.draw_page(display)?;
                page.mark_clean();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
