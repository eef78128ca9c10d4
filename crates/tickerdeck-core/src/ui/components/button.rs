//! Tap target with a centred label.

use crate::app_state::FromUnchecked;
use crate::ui::core::{Action, Drawable, TouchEvent, TouchPoint, TouchResult, Touchable};
use crate::ui::styling::{ButtonVariant, ColorPalette, Style};
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Rectangle, RoundedRectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

const CORNER_RADIUS: u32 = 8;

/// A press inside arms the button, dragging off disarms it, and the action
/// fires when the finger lifts while it is still armed.
pub struct Button {
    bounds: Rectangle,
    label: heapless::String<16>,
    action: Action,
    variant: ButtonVariant,
    enabled: bool,
    /// Finger is down and inside
    armed: bool,
    /// The current touch started here
    tracking: bool,
    dirty: bool,
}

impl Button {
    pub fn new(bounds: Rectangle, label: &str, action: Action) -> Self {
        Self {
            bounds,
            label: heapless::String::from_unchecked(label),
            action,
            variant: ButtonVariant::Primary,
            enabled: true,
            armed: false,
            tracking: false,
            dirty: true,
        }
    }

    pub fn with_variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Only dirties the button if the text changed.
    pub fn set_label(&mut self, label: &str) {
        if self.label.as_str() != label {
            self.label = heapless::String::from_unchecked(label);
            self.dirty = true;
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Disabled buttons ignore touch and are drawn dimmed.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.armed = false;
            self.tracking = false;
            self.dirty = true;
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.armed
    }

    /// Disarm without firing, e.g. when the touch turned into a swipe.
    pub fn cancel(&mut self) {
        self.tracking = false;
        self.set_armed(false);
    }

    pub fn action(&self) -> Action {
        self.action
    }

    fn set_armed(&mut self, armed: bool) {
        if self.armed != armed {
            self.armed = armed;
            self.dirty = true;
        }
    }

    fn style(&self) -> Style {
        let palette = ColorPalette::default();
        let style = self.variant.style(&palette);
        if !self.enabled {
            style
                .with_fill(palette.surface)
                .with_text(palette.text_secondary)
        } else if self.armed {
            style.pressed()
        } else {
            style
        }
    }
}

impl Drawable for Button {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let style = self.style();
        let radius = Size::new(CORNER_RADIUS, CORNER_RADIUS);
        RoundedRectangle::with_equal_corners(self.bounds, radius)
            .into_styled(style.primitive())
            .draw(display)?;

        let centred = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(
            &self.label,
            self.bounds.center(),
            MonoTextStyle::new(&FONT_10X20, style.text),
            centred,
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

impl Touchable for Button {
    fn contains_point(&self, point: TouchPoint) -> bool {
        self.bounds.contains(point.to_point())
    }

    fn handle_touch(&mut self, event: TouchEvent) -> TouchResult {
        if !self.enabled {
            return TouchResult::NotHandled;
        }

        match event {
            TouchEvent::Press(point) => {
                if !self.contains_point(point) {
                    return TouchResult::NotHandled;
                }
                self.tracking = true;
                self.set_armed(true);
                TouchResult::Handled
            }
            TouchEvent::Drag(point) => {
                if !self.tracking {
                    return TouchResult::NotHandled;
                }
                let inside = self.contains_point(point);
                self.set_armed(inside);
                TouchResult::Handled
            }
            TouchEvent::Release(point) => {
                let fire = self.armed && self.contains_point(point);
                self.cancel();
                if fire {
                    TouchResult::Action(self.action)
                } else {
                    TouchResult::NotHandled
                }
            }
        }
    }
}
