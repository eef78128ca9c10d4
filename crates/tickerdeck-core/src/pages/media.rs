//! Media tile: now-playing labels and the three transport buttons.

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Alignment;

use crate::media::{MediaState, TransportIcon};
use crate::pages::constants::{
    MEDIA_ARTIST_TOP_PX, MEDIA_BUTTON_BOTTOM_MARGIN_PX, MEDIA_BUTTON_HEIGHT_PX,
    MEDIA_BUTTON_SPACING_PX, MEDIA_BUTTON_WIDTH_PX, MEDIA_STATUS_TOP_PX, MEDIA_TRACK_TOP_PX,
};
use crate::pages::page::{Page, row_from_top};
use crate::ui::styling::{COLOR_BACKGROUND, LIGHT_GRAY, Style};
use crate::ui::{
    Action, Button, ButtonVariant, Drawable, PageId, TextComponent, TextSize, TouchEvent,
    TouchResult, Touchable,
};

pub const PREV_LABEL: &str = "|<";
pub const NEXT_LABEL: &str = ">|";
pub const PLAY_LABEL: &str = ">";
pub const PAUSE_LABEL: &str = "||";

/// Text drawn on the play/pause button.
pub const fn icon_label(icon: TransportIcon) -> &'static str {
    match icon {
        TransportIcon::Play => PLAY_LABEL,
        TransportIcon::Pause => PAUSE_LABEL,
    }
}

pub struct MediaPage {
    bounds: Rectangle,
    track: TextComponent,
    artist: TextComponent,
    status: TextComponent,
    /// Previous, play/pause, next
    buttons: [Button; 3],
    dirty: bool,
}

impl MediaPage {
    pub fn new(bounds: Rectangle) -> Self {
        let state = MediaState::default();

        let track = TextComponent::new(
            row_from_top(bounds, MEDIA_TRACK_TOP_PX),
            &state.track,
            TextSize::Large,
        )
        .with_alignment(Alignment::Center);
        let artist = TextComponent::new(
            row_from_top(bounds, MEDIA_ARTIST_TOP_PX),
            &state.artist,
            TextSize::Medium,
        )
        .with_alignment(Alignment::Center)
        .with_style(Style::new().with_text(LIGHT_GRAY));
        let status = TextComponent::new(
            row_from_top(bounds, MEDIA_STATUS_TOP_PX),
            state.status.label(),
            TextSize::Medium,
        )
        .with_alignment(Alignment::Center);

        // Centers sit at half the tile width; `Rectangle::center` rounds down
        let button_at = |dx: i32| {
            let center_x = bounds.top_left.x + (bounds.size.width / 2) as i32 + dx;
            let top = bounds.top_left.y + bounds.size.height as i32
                - MEDIA_BUTTON_BOTTOM_MARGIN_PX
                - MEDIA_BUTTON_HEIGHT_PX as i32;
            Rectangle::new(
                Point::new(center_x - ((MEDIA_BUTTON_WIDTH_PX - 1) / 2) as i32, top),
                Size::new(MEDIA_BUTTON_WIDTH_PX, MEDIA_BUTTON_HEIGHT_PX),
            )
        };

        let buttons = [
            Button::new(
                button_at(-MEDIA_BUTTON_SPACING_PX),
                PREV_LABEL,
                Action::PreviousTrack,
            )
            .with_variant(ButtonVariant::Transport),
            Button::new(button_at(0), icon_label(state.icon()), Action::PlayPause),
            Button::new(
                button_at(MEDIA_BUTTON_SPACING_PX),
                NEXT_LABEL,
                Action::NextTrack,
            )
            .with_variant(ButtonVariant::Transport),
        ];

        Self {
            bounds,
            track,
            artist,
            status,
            buttons,
            dirty: true,
        }
    }

    /// Show `state`. Calling it again with the same state changes nothing.
    pub fn render(&mut self, state: &MediaState) {
        self.track.set_text(&state.track);
        self.artist.set_text(&state.artist);
        self.status.set_text(state.status.label());
        self.buttons[1].set_label(icon_label(state.icon()));
    }

    pub fn track_text(&self) -> &str {
        self.track.text()
    }

    pub fn artist_text(&self) -> &str {
        self.artist.text()
    }

    pub fn status_text(&self) -> &str {
        self.status.text()
    }

    pub fn play_pause_label(&self) -> &str {
        self.buttons[1].label()
    }

    /// Bounds of the button bound to `action`.
    pub fn button_bounds(&self, action: Action) -> Option<Rectangle> {
        self.buttons
            .iter()
            .find(|b| b.action() == action)
            .map(Drawable::bounds)
    }
}

impl Page for MediaPage {
    fn id(&self) -> PageId {
        PageId::Media
    }

    fn title(&self) -> &str {
        "Media"
    }

    fn on_activate(&mut self) {
        self.dirty = true;
    }

    fn on_deactivate(&mut self) {
        self.cancel_touch();
    }

    fn handle_touch(&mut self, event: TouchEvent) -> Option<Action> {
        let mut action = None;
        for button in self.buttons.iter_mut() {
            if let TouchResult::Action(a) = button.handle_touch(event) {
                action = Some(a);
            }
        }
        action
    }

    fn cancel_touch(&mut self) {
        for button in self.buttons.iter_mut() {
            button.cancel();
        }
    }

    fn draw_page<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(display)?;

        self.track.draw(display)?;
        self.artist.draw(display)?;
        self.status.draw(display)?;
        for button in &self.buttons {
            button.draw(display)?;
        }
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty
            || self.track.is_dirty()
            || self.artist.is_dirty()
            || self.status.is_dirty()
            || self.buttons.iter().any(Drawable::is_dirty)
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
        self.track.mark_clean();
        self.artist.mark_clean();
        self.status.mark_clean();
        for button in self.buttons.iter_mut() {
            button.mark_clean();
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::PlaybackStatus;
    use crate::ui::TouchPoint;

    fn page() -> MediaPage {
        MediaPage::new(Rectangle::new(Point::zero(), Size::new(240, 240)))
    }

    fn center_of(page: &MediaPage, action: Action) -> TouchPoint {
        let c = page.button_bounds(action).unwrap().center();
        TouchPoint::new(c.x as u16, c.y as u16)
    }

    #[test]
    fn test_button_layout() {
        let p = page();
        let centers = [Action::PreviousTrack, Action::PlayPause, Action::NextTrack]
            .map(|a| p.button_bounds(a).unwrap().center());
        assert_eq!(centers[0].x, 50);
        assert_eq!(centers[1].x, 120);
        assert_eq!(centers[2].x, 190);
        let bottom = p.button_bounds(Action::PlayPause).unwrap().bottom_right().unwrap();
        assert_eq!(bottom.y, 240 - 20 - 1);
    }

    #[test]
    fn test_tap_routes_to_button() {
        let mut p = page();
        let at = center_of(&p, Action::NextTrack);
        assert_eq!(p.handle_touch(TouchEvent::Press(at)), None);
        assert_eq!(p.handle_touch(TouchEvent::Release(at)), Some(Action::NextTrack));
    }

    #[test]
    fn test_cancelled_touch_fires_nothing() {
        let mut p = page();
        let at = center_of(&p, Action::PlayPause);
        p.handle_touch(TouchEvent::Press(at));
        p.cancel_touch();
        assert_eq!(p.handle_touch(TouchEvent::Release(at)), None);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut p = page();
        let mut state = MediaState::default();
        state.status = PlaybackStatus::Playing;

        p.render(&state);
        assert_eq!(p.status_text(), "Playing");
        assert_eq!(p.play_pause_label(), PAUSE_LABEL);

        p.mark_clean();
        p.render(&state);
        assert!(!p.is_dirty());

        state.toggle_playback();
        p.render(&state);
        assert_eq!(p.status_text(), "Paused");
        assert_eq!(p.play_pause_label(), PLAY_LABEL);
        assert!(p.is_dirty());
    }

    #[test]
    fn test_defaults() {
        let p = page();
        assert_eq!(p.track_text(), "No track");
        assert_eq!(p.artist_text(), "No artist");
        assert_eq!(p.status_text(), "Stopped");
        assert_eq!(p.play_pause_label(), PLAY_LABEL);
    }
}
