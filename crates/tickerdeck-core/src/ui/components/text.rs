//! Single-line text labels.

use crate::app_state::FromUnchecked;
use crate::ui::core::Drawable;
use crate::ui::styling::Style;
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

/// Font choice for a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextSize {
    /// 5x8, footers and hints
    Small,
    /// 6x10
    Medium,
    /// 10x20, prices and titles
    Large,
}

impl TextSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Small => &FONT_5X8,
            TextSize::Medium => &FONT_6X10,
            TextSize::Large => &FONT_10X20,
        }
    }
}

/// Text vertically centred in its bounds. Longer than 128 bytes is cut.
pub struct TextComponent {
    bounds: Rectangle,
    text: heapless::String<128>,
    size: TextSize,
    alignment: Alignment,
    style: Style,
    dirty: bool,
}

impl TextComponent {
    pub fn new(bounds: Rectangle, text: &str, size: TextSize) -> Self {
        Self {
            bounds,
            text: heapless::String::from_unchecked(text),
            size,
            alignment: Alignment::Left,
            style: Style::default(),
            dirty: true,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text.as_str() != text {
            self.text = heapless::String::from_unchecked(text);
            self.dirty = true;
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_color(&mut self, color: Rgb565) {
        if self.style.text != color {
            self.style.text = color;
            self.dirty = true;
        }
    }

    pub fn color(&self) -> Rgb565 {
        self.style.text
    }

    fn anchor(&self) -> Point {
        let center = self.bounds.center();
        let x = match self.alignment {
            Alignment::Left => self.bounds.top_left.x,
            Alignment::Center => center.x,
            Alignment::Right => self.bounds.top_left.x + self.bounds.size.width as i32 - 1,
        };
        Point::new(x, center.y)
    }
}

impl Drawable for TextComponent {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        if self.style.fill.is_some() {
            self.bounds
                .into_styled(self.style.primitive())
                .draw(display)?;
        }

        let layout = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(
            &self.text,
            self.anchor(),
            MonoTextStyle::new(self.size.font(), self.style.text),
            layout,
        )
        .draw(display)?;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> TextComponent {
        TextComponent::new(
            Rectangle::new(Point::new(0, 0), Size::new(200, 20)),
            "Loading...",
            TextSize::Medium,
        )
    }

    #[test]
    fn test_set_text_dirties_only_on_change() {
        let mut text = label();
        text.mark_clean();
        text.set_text("Loading...");
        assert!(!text.is_dirty());
        text.set_text("42.000");
        assert!(text.is_dirty());
        assert_eq!(text.text(), "42.000");
    }

    #[test]
    fn test_set_color() {
        let mut text = label();
        text.mark_clean();
        text.set_color(Rgb565::WHITE);
        assert!(!text.is_dirty());
        text.set_color(Rgb565::RED);
        assert!(text.is_dirty());
        assert_eq!(text.color(), Rgb565::RED);
    }
}
