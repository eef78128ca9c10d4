//! Colours a component is drawn with.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::RgbColor;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder};

use super::colors::{ColorPalette, WHITE};

/// Outline width for transport buttons.
const OUTLINE_PX: u32 = 2;

/// Fill, text colour and optional outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub fill: Option<Rgb565>,
    pub text: Rgb565,
    pub outline: Option<Rgb565>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            text: WHITE,
            outline: None,
        }
    }
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill(mut self, color: Rgb565) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_text(mut self, color: Rgb565) -> Self {
        self.text = color;
        self
    }

    pub fn with_outline(mut self, color: Rgb565) -> Self {
        self.outline = Some(color);
        self
    }

    /// Same style with the fill a few steps darker, for a held button.
    pub fn pressed(self) -> Self {
        match self.fill {
            Some(fill) => self.with_fill(Rgb565::new(
                fill.r().saturating_sub(4),
                fill.g().saturating_sub(8),
                fill.b().saturating_sub(4),
            )),
            None => self,
        }
    }

    /// Shape style for the fill and outline.
    pub fn primitive(&self) -> PrimitiveStyle<Rgb565> {
        let mut builder = PrimitiveStyleBuilder::new();
        if let Some(fill) = self.fill {
            builder = builder.fill_color(fill);
        }
        if let Some(outline) = self.outline {
            builder = builder.stroke_color(outline).stroke_width(OUTLINE_PX);
        }
        builder.build()
    }
}

/// Button looks on the media tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonVariant {
    /// Accent fill, used for play/pause
    Primary,
    /// Surface fill with an outline, used for prev/next
    Transport,
}

impl ButtonVariant {
    pub fn style(self, palette: &ColorPalette) -> Style {
        match self {
            ButtonVariant::Primary => Style::new().with_fill(palette.primary).with_text(WHITE),
            ButtonVariant::Transport => Style::new()
                .with_fill(palette.surface)
                .with_text(palette.text_primary)
                .with_outline(palette.border),
        }
    }
}
