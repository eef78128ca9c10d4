//! Round gauge with a scale arc, tick marks and a needle.
//!
//! Angles are in degrees, clockwise from 3 o'clock in screen coordinates.
//! The default sweep starts at 135° (lower left) and spans 270°, so the
//! midpoint of the range points straight up.

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc, Circle, Line, PrimitiveStyle, Rectangle};
use micromath::F32Ext;

use crate::ui::core::Drawable;
use crate::ui::styling::{COLOR_NEEDLE, COLOR_STROKE, LIGHT_GRAY};

const START_ANGLE_DEG: f32 = 135.0;
const SWEEP_DEG: f32 = 270.0;
const MAJOR_TICK_EVERY: i32 = 5;
const MAJOR_TICK_LEN_PX: i32 = 15;
const MINOR_TICK_LEN_PX: i32 = 8;
const RIM_INSET_PX: i32 = 10;
const NEEDLE_INSET_PX: i32 = 30;
const HUB_DIAMETER_PX: u32 = 12;

pub struct Meter {
    bounds: Rectangle,
    min: i32,
    max: i32,
    value: i32,
    dirty: bool,
}

impl Meter {
    /// Gauge filling `bounds`, needle resting at the low end.
    pub fn new(bounds: Rectangle, min: i32, max: i32) -> Self {
        Self {
            bounds,
            min,
            max,
            value: min,
            dirty: true,
        }
    }

    /// Move the needle. Values outside the range are clamped.
    pub fn set_value(&mut self, value: i32) {
        let value = value.clamp(self.min, self.max);
        if value != self.value {
            self.value = value;
            self.dirty = true;
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Screen angle of `value` on the scale.
    pub fn angle_of(&self, value: i32) -> f32 {
        let span = (self.max - self.min).max(1) as f32;
        let t = (value.clamp(self.min, self.max) - self.min) as f32 / span;
        START_ANGLE_DEG + t * SWEEP_DEG
    }

    fn radius(&self) -> i32 {
        (self.bounds.size.width.min(self.bounds.size.height) / 2) as i32
    }
}

/// Point `radius` pixels from `center` at `angle_deg`.
pub fn polar(center: Point, radius: i32, angle_deg: f32) -> Point {
    let rad = angle_deg.to_radians();
    let r = radius as f32;
    Point::new(
        center.x + (r * rad.cos()).round() as i32,
        center.y + (r * rad.sin()).round() as i32,
    )
}

impl Drawable for Meter {
    fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let center = self.bounds.center();
        let rim = self.radius() - RIM_INSET_PX;
        let scale_style = PrimitiveStyle::with_stroke(COLOR_STROKE, 2);

        Arc::with_center(
            center,
            (rim * 2) as u32,
            START_ANGLE_DEG.deg(),
            SWEEP_DEG.deg(),
        )
        .into_styled(scale_style)
        .draw(display)?;

        for value in self.min..=self.max {
            let (len, style) = if (value - self.min) % MAJOR_TICK_EVERY == 0 {
                (MAJOR_TICK_LEN_PX, PrimitiveStyle::with_stroke(LIGHT_GRAY, 3))
            } else {
                (MINOR_TICK_LEN_PX, scale_style)
            };
            let angle = self.angle_of(value);
            Line::new(polar(center, rim, angle), polar(center, rim - len, angle))
                .into_styled(style)
                .draw(display)?;
        }

        let tip = polar(center, rim - NEEDLE_INSET_PX, self.angle_of(self.value));
        Line::new(center, tip)
            .into_styled(PrimitiveStyle::with_stroke(COLOR_NEEDLE, 4))
            .draw(display)?;

        Circle::with_center(center, HUB_DIAMETER_PX)
            .into_styled(PrimitiveStyle::with_fill(COLOR_NEEDLE))
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

    fn meter() -> Meter {
        Meter::new(Rectangle::new(Point::zero(), Size::new(240, 240)), -10, 10)
    }

    #[test]
    fn test_scale_angles() {
        let m = meter();
        assert_eq!(m.angle_of(-10), 135.0);
        assert_eq!(m.angle_of(0), 270.0);
        assert_eq!(m.angle_of(10), 405.0);
        assert_eq!(m.angle_of(99), 405.0);
    }

    #[test]
    fn test_zero_points_straight_up() {
        let m = meter();
        let tip = polar(Point::new(120, 120), 80, m.angle_of(0));
        assert!((tip.x - 120).abs() <= 1);
        assert!((tip.y - 40).abs() <= 1);
    }

    #[test]
    fn test_set_value_clamps_and_tracks_dirty() {
        let mut m = meter();
        m.mark_clean();
        m.set_value(-10);
        assert!(!m.is_dirty(), "unchanged value");
        m.set_value(25);
        assert_eq!(m.value(), 10);
        assert!(m.is_dirty());
    }
}
