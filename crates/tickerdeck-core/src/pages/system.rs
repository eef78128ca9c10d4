//! System tile: wall-clock date and time plus the last price refresh.

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Alignment;

use crate::pages::constants::{
    SYSTEM_DATE_TOP_PX, SYSTEM_LAST_UPDATE_TOP_PX, SYSTEM_TIME_TOP_PX,
};
use crate::pages::page::{Page, row_from_top};
use crate::ui::styling::{COLOR_BACKGROUND, LIGHT_GRAY, Style};
use crate::ui::{Action, Drawable, PageId, TextComponent, TextSize, TouchEvent};

pub const DATE_PLACEHOLDER: &str = "Date: ";
pub const TIME_PLACEHOLDER: &str = "Time: --:--:--";
pub const LAST_UPDATE_PLACEHOLDER: &str = "Last update: --:--:--";

pub struct SystemPage {
    bounds: Rectangle,
    date: TextComponent,
    time: TextComponent,
    last_update: TextComponent,
    dirty: bool,
}

impl SystemPage {
    pub fn new(bounds: Rectangle) -> Self {
        let row = |top: i32, text: &str| {
            TextComponent::new(row_from_top(bounds, top), text, TextSize::Medium)
                .with_alignment(Alignment::Center)
        };

        Self {
            bounds,
            date: row(SYSTEM_DATE_TOP_PX, DATE_PLACEHOLDER),
            time: row(SYSTEM_TIME_TOP_PX, TIME_PLACEHOLDER),
            last_update: row(SYSTEM_LAST_UPDATE_TOP_PX, LAST_UPDATE_PLACEHOLDER)
                .with_style(Style::new().with_text(LIGHT_GRAY)),
            dirty: true,
        }
    }

    pub fn set_date_text(&mut self, text: &str) {
        self.date.set_text(text);
    }

    pub fn set_time_text(&mut self, text: &str) {
        self.time.set_text(text);
    }

    pub fn set_last_update_text(&mut self, text: &str) {
        self.last_update.set_text(text);
    }

    pub fn date_text(&self) -> &str {
        self.date.text()
    }

    pub fn time_text(&self) -> &str {
        self.time.text()
    }

    pub fn last_update_text(&self) -> &str {
        self.last_update.text()
    }
}

impl Page for SystemPage {
    fn id(&self) -> PageId {
        PageId::System
    }

    fn title(&self) -> &str {
        "System"
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

        self.date.draw(display)?;
        self.time.draw(display)?;
        self.last_update.draw(display)?;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty || self.date.is_dirty() || self.time.is_dirty() || self.last_update.is_dirty()
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
        self.date.mark_clean();
        self.time.mark_clean();
        self.last_update.mark_clean();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_and_updates() {
        let mut page = SystemPage::new(Rectangle::new(Point::zero(), Size::new(240, 240)));
        assert_eq!(page.date_text(), "Date: ");
        assert_eq!(page.time_text(), "Time: --:--:--");
        assert_eq!(page.last_update_text(), "Last update: --:--:--");

        page.mark_clean();
        page.set_time_text("Time: 12:00:01");
        assert!(page.is_dirty());
        assert_eq!(page.time_text(), "Time: 12:00:01");
    }
}
