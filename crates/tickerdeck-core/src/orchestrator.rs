//! The UI loop's state owner.
//!
//! [`UiOrchestrator`] holds the coin table, media state, tiles, scheduler and
//! wall clock. Everything runs on one cooperative loop: the caller feeds
//! pointer readings through [`UiOrchestrator::read_pointer`], awaits
//! [`UiOrchestrator::tick`] to run due periodic tasks, and calls
//! [`UiOrchestrator::render`] to push changed pixels to the panel.
//!
//! Periodic tasks run one after another inside `tick`, so a slow price fetch
//! delays the clock and media refreshes until it returns.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;
use log::{debug, info, warn};

use crate::app_state::AppError;
use crate::clock::WallClock;
use crate::config::MAX_COINS;
use crate::framebuffer::FrameBuffer;
use crate::hid::{HidLink, MediaKey, MediaKeySink};
use crate::market::{
    ChangeTrend, CoinSlot, PriceClient, PriceError, fetch_quotes, format_change, needle_value,
};
use crate::media::MediaState;
use crate::pages::{CoinPage, MediaPage, PairingPage, SystemPage, TileView};
use crate::scheduler::{Scheduler, TaskKind};
use crate::ui::{
    Action, DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, Gesture, PointerInput, PointerSample,
    SwipeDirection, TouchPoint,
};

pub struct UiOrchestrator<K: MediaKeySink> {
    coins: Vec<CoinSlot, MAX_COINS>,
    media: MediaState,
    tiles: TileView,
    scheduler: Scheduler,
    clock: WallClock,
    pointer: PointerInput,
    framebuffer: FrameBuffer,
    keys: K,
    link: &'static HidLink,
}

impl<K: MediaKeySink> UiOrchestrator<K> {
    /// Allocate the frame buffer and set up an empty tile view.
    ///
    /// Fails with [`AppError::Allocation`] when the frame does not fit in
    /// the heap; the caller then runs without a display.
    pub fn init(keys: K, link: &'static HidLink, clock: WallClock) -> Result<Self, AppError> {
        let framebuffer = FrameBuffer::try_new()?;
        let bounds = Rectangle::new(
            Point::zero(),
            Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
        );

        Ok(Self {
            coins: Vec::new(),
            media: MediaState::default(),
            tiles: TileView::new(bounds),
            scheduler: Scheduler::new(),
            clock,
            pointer: PointerInput::new(),
            framebuffer,
            keys,
            link,
        })
    }

    /// Build one tile per coin followed by the media, system and pairing
    /// tiles, then register the three periodic tasks.
    ///
    /// The price task is also made due immediately so quotes appear without
    /// waiting a full period.
    pub fn create_ui(&mut self, symbols: &[&str], now_ms: u64) -> Result<(), AppError> {
        if symbols.len() > MAX_COINS {
            return Err(AppError::TooManyCoins(symbols.len()));
        }
        let bounds = self.tiles.display_bounds();

        for (i, symbol) in symbols.iter().enumerate() {
            // Length checked above
            let _ = self.coins.push(CoinSlot::new(symbol));
            self.tiles
                .register_page(CoinPage::new(bounds, i as u8, symbol).into());
        }
        self.tiles.register_page(MediaPage::new(bounds).into());
        self.tiles.register_page(SystemPage::new(bounds).into());
        self.tiles.register_page(PairingPage::new(bounds).into());

        for kind in [
            TaskKind::PriceRefresh,
            TaskKind::ClockRefresh,
            TaskKind::MediaRefresh,
        ] {
            self.scheduler
                .register(kind, kind.default_period_ms(), now_ms);
        }
        self.scheduler.trigger_now(TaskKind::PriceRefresh, now_ms);

        self.update_system_info(now_ms);
        self.update_media_info();
        info!(
            "UI ready: {} coin tiles, {} tiles total",
            self.coins.len(),
            self.tiles.len()
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Periodic tasks
    // -----------------------------------------------------------------------

    /// Run every task due at `now_ms` and advance the tile animation.
    pub async fn tick<C: PriceClient>(&mut self, now_ms: u64, client: &mut C) {
        for task in self.scheduler.due(now_ms) {
            debug!(" Running {:?}", task);
            match task {
                TaskKind::PriceRefresh => self.update_crypto_price(client, now_ms).await,
                TaskKind::ClockRefresh => self.update_system_info(now_ms),
                TaskKind::MediaRefresh => self.update_media_info(),
            }
        }
        self.refresh_staleness(now_ms);
        self.tiles.advance(now_ms);
    }

    /// Make the price task due on the next tick.
    pub fn request_price_refresh(&mut self, now_ms: u64) {
        self.scheduler.trigger_now(TaskKind::PriceRefresh, now_ms);
    }

    /// Fetch quotes for every tracked coin and push them to the tiles.
    ///
    /// Offline or failed fetches are logged and leave all state untouched.
    pub async fn update_crypto_price<C: PriceClient>(&mut self, client: &mut C, now_ms: u64) {
        if self.coins.is_empty() {
            return;
        }

        let result = {
            let symbols: Vec<&str, MAX_COINS> =
                self.coins.iter().map(|c| c.symbol.as_str()).collect();
            fetch_quotes(client, &symbols).await
        };

        let batch = match result {
            Ok(batch) => batch,
            Err(PriceError::Offline) => {
                warn!("WiFi not connected, skipping price update");
                return;
            }
            Err(e) => {
                warn!("Price update failed: {}", e);
                return;
            }
        };

        // The Date header describes the moment the response left the server
        let arrived_ms = batch.received_ms.unwrap_or(now_ms);
        if let Some(date) = batch.date.as_deref() {
            self.clock.sync_http_date(date, arrived_ms);
        }

        for (i, (slot, quote)) in self.coins.iter_mut().zip(batch.quotes.iter()).enumerate() {
            slot.apply(quote, now_ms);
            if let Some(tile) = self.tiles.coin_mut(i as u8) {
                let change = slot.info.change;
                tile.set_price_text(&slot.info.price_text);
                tile.set_needle(needle_value(change));
                tile.set_change(&format_change(change), ChangeTrend::from_change(change).color());
                tile.set_stale(false);
            }
        }

        let mut label: heapless::String<32> = heapless::String::new();
        // "Last update: " plus HH:MM:SS fits in 32 bytes
        let _ = label.push_str("Last update: ");
        let _ = label.push_str(&self.clock.hms(arrived_ms));
        if let Some(system) = self.tiles.system_mut() {
            system.set_last_update_text(&label);
        }
        info!("Prices updated for {} coins", batch.quotes.len());
    }

    /// Date and time labels on the system tile.
    pub fn update_system_info(&mut self, now_ms: u64) {
        let date = self.clock.date_label(now_ms);
        let time = self.clock.time_label(now_ms);
        if let Some(system) = self.tiles.system_mut() {
            system.set_date_text(&date);
            system.set_time_text(&time);
        }
    }

    /// Media tile labels and play/pause icon, plus the pairing tile's link
    /// status. Safe to call repeatedly.
    pub fn update_media_info(&mut self) {
        if let Some(page) = self.tiles.media_mut() {
            page.render(&self.media);
        }
        let (state, count) = (self.link.state(), self.link.connection_count());
        if let Some(page) = self.tiles.pairing_mut() {
            page.set_link_state(state, count);
        }
    }

    fn refresh_staleness(&mut self, now_ms: u64) {
        for (i, slot) in self.coins.iter().enumerate() {
            // Never-fetched coins keep "Loading..." instead of the marker
            let stale = slot.cached.is_some() && slot.is_stale(now_ms);
            if let Some(tile) = self.tiles.coin_mut(i as u8) {
                tile.set_stale(stale);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Button handlers
    // -----------------------------------------------------------------------

    pub fn on_play_pause_clicked(&mut self) {
        self.keys.send_key(MediaKey::PlayPause);
        self.media.toggle_playback();
        info!("Playback {}", self.media.status.label());
        self.update_media_info();
    }

    pub fn on_next_clicked(&mut self) {
        self.keys.send_key(MediaKey::NextTrack);
        self.update_media_info();
    }

    pub fn on_prev_clicked(&mut self) {
        self.keys.send_key(MediaKey::PreviousTrack);
        self.update_media_info();
    }

    // -----------------------------------------------------------------------
    // Input and navigation
    // -----------------------------------------------------------------------

    /// Slide to tile `index`. Out-of-range indexes leave the current tile.
    pub fn set_tile(&mut self, index: usize, now_ms: u64) -> Result<(), AppError> {
        self.tiles.set_tile(index, now_ms)
    }

    /// Feed one raw touch reading (`None` = no contact).
    ///
    /// Swipes move to the neighbouring tile; taps go to the active tile and
    /// any resulting action is handled before returning.
    pub fn read_pointer(&mut self, raw: Option<TouchPoint>, now_ms: u64) -> PointerSample {
        let sample = self.pointer.read_pointer(raw, now_ms);

        if let Some(Gesture::Swipe(direction)) = sample.gesture {
            self.tiles.cancel_touch();
            match direction {
                SwipeDirection::Left => self.tiles.next(now_ms),
                SwipeDirection::Right => self.tiles.previous(now_ms),
            };
        } else if let Some(event) = sample.event
            && let Some(action) = self.tiles.handle_touch(event)
        {
            self.dispatch(action, now_ms);
        }
        sample
    }

    fn dispatch(&mut self, action: Action, now_ms: u64) {
        debug!(" Dispatching {:?}", action);
        match action {
            Action::PlayPause => self.on_play_pause_clicked(),
            Action::NextTrack => self.on_next_clicked(),
            Action::PreviousTrack => self.on_prev_clicked(),
            Action::ShowTile(index) => {
                if let Err(e) = self.set_tile(index as usize, now_ms) {
                    warn!("{}", e);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Draw whatever changed into the frame buffer and flush the dirty
    /// rectangle to `display`. Returns whether anything was sent.
    pub fn render<D>(&mut self, display: &mut D) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Ok(drew) = self.tiles.draw(&mut self.framebuffer);
        if !drew || self.framebuffer.dirty_area().is_none() {
            return Ok(false);
        }
        self.framebuffer.flush(display)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn coins(&self) -> &[CoinSlot] {
        &self.coins
    }

    pub fn media(&self) -> &MediaState {
        &self.media
    }

    pub fn tiles(&self) -> &TileView {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut TileView {
        &mut self.tiles
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> &WallClock {
        &self.clock
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Monotonic time of the last touch contact.
    pub fn last_interaction_ms(&self) -> Option<u64> {
        self.pointer.last_interaction_ms()
    }

    /// When the loop next has periodic work.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }
}
