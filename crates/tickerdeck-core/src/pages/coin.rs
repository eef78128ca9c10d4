//! Price tile for one tracked coin: a change meter with the ticker name,
//! last price and 24h change laid over it.

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Alignment;

use crate::market::{METER_MAX, METER_MIN};
use crate::pages::constants::{
    COIN_CHANGE_CENTER_OFFSET_PX, COIN_NAME_TOP_PX, COIN_PRICE_CENTER_OFFSET_PX,
};
use crate::pages::page::{Page, row_from_center, row_from_top};
use crate::ui::styling::{COLOR_BACKGROUND, COLOR_FLAT, GRAY, Style};
use crate::ui::{Action, Drawable, Meter, PageId, TextComponent, TextSize, TouchEvent};

pub const PRICE_PLACEHOLDER: &str = "Loading...";
pub const CHANGE_PLACEHOLDER: &str = "24h: --";
pub const STALE_MARKER: &str = "stale";

/// Rows below the change label
const STALE_MARKER_OFFSET_PX: i32 = 20;

pub struct CoinPage {
    bounds: Rectangle,
    index: u8,
    meter: Meter,
    name: TextComponent,
    price: TextComponent,
    change: TextComponent,
    stale_marker: TextComponent,
    stale: bool,
    dirty: bool,
}

impl CoinPage {
    pub fn new(bounds: Rectangle, index: u8, symbol: &str) -> Self {
        let name = TextComponent::new(
            row_from_top(bounds, COIN_NAME_TOP_PX),
            symbol,
            TextSize::Large,
        )
        .with_alignment(Alignment::Center);

        let price = TextComponent::new(
            row_from_center(bounds, COIN_PRICE_CENTER_OFFSET_PX),
            PRICE_PLACEHOLDER,
            TextSize::Large,
        )
        .with_alignment(Alignment::Center);

        let change = TextComponent::new(
            row_from_center(bounds, COIN_CHANGE_CENTER_OFFSET_PX),
            CHANGE_PLACEHOLDER,
            TextSize::Medium,
        )
        .with_alignment(Alignment::Center)
        .with_style(Style::new().with_text(COLOR_FLAT));

        let stale_marker = TextComponent::new(
            row_from_center(
                bounds,
                COIN_CHANGE_CENTER_OFFSET_PX + STALE_MARKER_OFFSET_PX,
            ),
            STALE_MARKER,
            TextSize::Small,
        )
        .with_alignment(Alignment::Center)
        .with_style(Style::new().with_text(GRAY));

        Self {
            bounds,
            index,
            meter: Meter::new(bounds, METER_MIN, METER_MAX),
            name,
            price,
            change,
            stale_marker,
            stale: false,
            dirty: true,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn symbol(&self) -> &str {
        self.name.text()
    }

    pub fn set_price_text(&mut self, text: &str) {
        self.price.set_text(text);
    }

    pub fn price_text(&self) -> &str {
        self.price.text()
    }

    pub fn set_change(&mut self, text: &str, color: Rgb565) {
        self.change.set_text(text);
        self.change.set_color(color);
    }

    pub fn change_text(&self) -> &str {
        self.change.text()
    }

    pub fn change_color(&self) -> Rgb565 {
        self.change.color()
    }

    pub fn set_needle(&mut self, value: i32) {
        self.meter.set_value(value);
    }

    pub fn needle(&self) -> i32 {
        self.meter.value()
    }

    pub fn set_stale(&mut self, stale: bool) {
        if self.stale != stale {
            self.stale = stale;
            self.dirty = true;
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl Page for CoinPage {
    fn id(&self) -> PageId {
        PageId::Coin(self.index)
    }

    fn title(&self) -> &str {
        self.name.text()
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

        self.meter.draw(display)?;
        self.name.draw(display)?;
        self.price.draw(display)?;
        self.change.draw(display)?;
        if self.stale {
            self.stale_marker.draw(display)?;
        }
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty
            || self.meter.is_dirty()
            || self.name.is_dirty()
            || self.price.is_dirty()
            || self.change.is_dirty()
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
        self.meter.mark_clean();
        self.name.mark_clean();
        self.price.mark_clean();
        self.change.mark_clean();
        self.stale_marker.mark_clean();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::styling::COLOR_RISING;
    use embedded_graphics::mock_display::MockDisplay;

    fn page() -> CoinPage {
        CoinPage::new(
            Rectangle::new(Point::zero(), Size::new(240, 240)),
            0,
            "BTCUSDT",
        )
    }

    #[test]
    fn test_initial_labels() {
        let p = page();
        assert_eq!(p.id(), PageId::Coin(0));
        assert_eq!(p.symbol(), "BTCUSDT");
        assert_eq!(p.price_text(), "Loading...");
        assert_eq!(p.change_text(), "24h: --");
        assert_eq!(p.needle(), METER_MIN);
        assert!(!p.is_stale());
    }

    #[test]
    fn test_updates_dirty_the_tile() {
        let mut p = page();
        p.mark_clean();
        assert!(!p.is_dirty());

        p.set_price_text("Loading...");
        assert!(!p.is_dirty(), "same text");

        p.set_change("24h: 5.00%", COLOR_RISING);
        assert!(p.is_dirty());
        assert_eq!(p.change_color(), COLOR_RISING);

        p.mark_clean();
        p.set_stale(true);
        assert!(p.is_dirty());
    }

    #[test]
    fn test_draws_inside_bounds() {
        let p = CoinPage::new(Rectangle::new(Point::zero(), Size::new(64, 64)), 1, "ETH");
        let mut display: MockDisplay<Rgb565> = MockDisplay::new();
        display.set_allow_overdraw(true);
        display.set_allow_out_of_bounds_drawing(true);
        p.draw_page(&mut display).unwrap();
        assert_eq!(display.get_pixel(Point::new(0, 0)), Some(COLOR_BACKGROUND));
    }
}
