//! Media transport state shown on the media tile.

use crate::app_state::FromUnchecked;

pub const DEFAULT_TRACK: &str = "No track";
pub const DEFAULT_ARTIST: &str = "No artist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    /// Play/pause button behavior: pause while playing, otherwise play.
    ///
    /// There is no transition back to `Stopped`.
    pub const fn toggled(self) -> Self {
        match self {
            PlaybackStatus::Playing => PlaybackStatus::Paused,
            PlaybackStatus::Stopped | PlaybackStatus::Paused => PlaybackStatus::Playing,
        }
    }

    pub const fn is_playing(&self) -> bool {
        matches!(self, PlaybackStatus::Playing)
    }
}

/// Icon on the play/pause button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportIcon {
    Play,
    Pause,
}

impl TransportIcon {
    pub const fn for_status(status: PlaybackStatus) -> Self {
        if status.is_playing() {
            TransportIcon::Pause
        } else {
            TransportIcon::Play
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaState {
    pub track: heapless::String<64>,
    pub artist: heapless::String<64>,
    pub status: PlaybackStatus,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            track: heapless::String::from_unchecked(DEFAULT_TRACK),
            artist: heapless::String::from_unchecked(DEFAULT_ARTIST),
            status: PlaybackStatus::Stopped,
        }
    }
}

impl MediaState {
    pub fn toggle_playback(&mut self) {
        self.status = self.status.toggled();
    }

    pub fn set_now_playing(&mut self, track: &str, artist: &str) {
        self.track = heapless::String::from_unchecked(track);
        self.artist = heapless::String::from_unchecked(artist);
    }

    pub fn icon(&self) -> TransportIcon {
        TransportIcon::for_status(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = MediaState::default();
        assert_eq!(state.track.as_str(), "No track");
        assert_eq!(state.artist.as_str(), "No artist");
        assert_eq!(state.status.label(), "Stopped");
        assert_eq!(state.icon(), TransportIcon::Play);
    }

    #[test]
    fn test_toggle_never_returns_to_stopped() {
        assert_eq!(PlaybackStatus::Stopped.toggled(), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::Paused.toggled(), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::Playing.toggled(), PlaybackStatus::Paused);

        let mut status = PlaybackStatus::Stopped;
        for _ in 0..10 {
            status = status.toggled();
            assert_ne!(status, PlaybackStatus::Stopped);
        }
    }

    #[test]
    fn test_icon_is_pause_only_while_playing() {
        assert_eq!(TransportIcon::for_status(PlaybackStatus::Playing), TransportIcon::Pause);
        assert_eq!(TransportIcon::for_status(PlaybackStatus::Paused), TransportIcon::Play);
        assert_eq!(TransportIcon::for_status(PlaybackStatus::Stopped), TransportIcon::Play);
    }
}
