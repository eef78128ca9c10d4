//! Pairing tile: how to connect to the BLE remote, plus live link status.

use core::fmt::Write;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Alignment;

use crate::config::DEVICE_NAME;
use crate::hid::LinkState;
use crate::pages::constants::{
    PAIRING_HINT_CENTER_OFFSET_PX, PAIRING_STATUS_CENTER_OFFSET_PX,
    PAIRING_WAITING_CENTER_OFFSET_PX,
};
use crate::pages::page::{Page, row_from_center};
use crate::ui::styling::{COLOR_BACKGROUND, COLOR_RISING, LIGHT_GRAY, Style};
use crate::ui::{Action, Drawable, PageId, TextComponent, TextSize, TouchEvent};

pub const WAITING_TEXT: &str = "Waiting for Bluetooth connection...";

pub fn status_text(state: LinkState, connections: u8) -> heapless::String<32> {
    let mut out = heapless::String::new();
    // 32 bytes always fits the longest status line
    let _ = match state {
        LinkState::Uninitialized => write!(out, "Status: Starting"),
        LinkState::Advertising => write!(out, "Status: Advertising"),
        LinkState::Connected => write!(out, "Status: Connected ({})", connections),
    };
    out
}

pub struct PairingPage {
    bounds: Rectangle,
    waiting: TextComponent,
    hint: TextComponent,
    status: TextComponent,
    dirty: bool,
}

impl PairingPage {
    pub fn new(bounds: Rectangle) -> Self {
        let mut hint: heapless::String<64> = heapless::String::new();
        let _ = write!(hint, "Connect to '{}'", DEVICE_NAME);

        let waiting = TextComponent::new(
            row_from_center(bounds, PAIRING_WAITING_CENTER_OFFSET_PX),
            WAITING_TEXT,
            TextSize::Medium,
        )
        .with_alignment(Alignment::Center);
        let hint = TextComponent::new(
            row_from_center(bounds, PAIRING_HINT_CENTER_OFFSET_PX),
            &hint,
            TextSize::Medium,
        )
        .with_alignment(Alignment::Center)
        .with_style(Style::new().with_text(LIGHT_GRAY));
        let status = TextComponent::new(
            row_from_center(bounds, PAIRING_STATUS_CENTER_OFFSET_PX),
            &status_text(LinkState::Uninitialized, 0),
            TextSize::Medium,
        )
        .with_alignment(Alignment::Center);

        Self {
            bounds,
            waiting,
            hint,
            status,
            dirty: true,
        }
    }

    pub fn set_link_state(&mut self, state: LinkState, connections: u8) {
        self.status.set_text(&status_text(state, connections));
        let color = if state == LinkState::Connected {
            COLOR_RISING
        } else {
            Rgb565::WHITE
        };
        self.status.set_color(color);
    }

    pub fn waiting_text(&self) -> &str {
        self.waiting.text()
    }

    pub fn hint_text(&self) -> &str {
        self.hint.text()
    }

    pub fn status_text(&self) -> &str {
        self.status.text()
    }
}

impl Page for PairingPage {
    fn id(&self) -> PageId {
        PageId::Pairing
    }

    fn title(&self) -> &str {
        "Pairing"
    }

    fn on_activate(&mut self) {
        self.dirty = true;
    }

    fn handle_touch(&mut self, _event: TouchEvent) -> Option<Action> {
        None
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(display)?;

        self.waiting.draw(display)?;
        self.hint.draw(display)?;
        self.status.draw(display)?;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty || self.waiting.is_dirty() || self.hint.is_dirty() || self.status.is_dirty()
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
        self.waiting.mark_clean();
        self.hint.mark_clean();
        self.status.mark_clean();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
