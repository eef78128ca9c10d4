//! Pointer sampling for the touch panel.
//!
//! The touch controller is polled once per UI pass and only reports "finger
//! down at (x, y)" or "no contact". [`PointerInput`] turns that level signal
//! into edge events for widgets and recognises horizontal swipes.

use log::debug;

use super::core::{TouchEvent, TouchPoint};

/// Minimum horizontal travel for a swipe.
pub const SWIPE_MIN_TRAVEL_PX: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved right to left
    Left,
    /// Finger moved left to right
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Swipe(SwipeDirection),
}

/// Result of one pointer read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSample {
    /// Finger currently on the panel
    pub pressed: bool,
    /// Contact point, or the last known one after release
    pub point: TouchPoint,
    /// Edge event for widgets, if the contact state or position changed
    pub event: Option<TouchEvent>,
    /// Gesture completed by this read
    pub gesture: Option<Gesture>,
}

#[derive(Debug, Default)]
pub struct PointerInput {
    start: Option<TouchPoint>,
    last: Option<TouchPoint>,
    last_interaction_ms: Option<u64>,
}

impl PointerInput {
    pub const fn new() -> Self {
        Self {
            start: None,
            last: None,
            last_interaction_ms: None,
        }
    }

    /// Feed one raw reading (`None` = no contact) taken at `now_ms`.
    pub fn read_pointer(&mut self, raw: Option<TouchPoint>, now_ms: u64) -> PointerSample {
        match raw {
            Some(point) => {
                self.last_interaction_ms = Some(now_ms);
                let event = match self.last {
                    None => {
                        self.start = Some(point);
                        Some(TouchEvent::Press(point))
                    }
                    Some(prev) if prev != point => Some(TouchEvent::Drag(point)),
                    Some(_) => None,
                };
                self.last = Some(point);
                PointerSample {
                    pressed: true,
                    point,
                    event,
                    gesture: None,
                }
            }
            None => {
                let last = self.last.take();
                let start = self.start.take();
                let point = last.unwrap_or(TouchPoint::new(0, 0));
                let gesture = match (start, last) {
                    (Some(s), Some(e)) => swipe_between(s, e),
                    _ => None,
                };
                if let Some(g) = gesture {
                    debug!(" Pointer gesture {:?}", g);
                }
                PointerSample {
                    pressed: false,
                    point,
                    event: last.map(TouchEvent::Release),
                    gesture,
                }
            }
        }
    }

    /// Monotonic time of the most recent contact.
    pub fn last_interaction_ms(&self) -> Option<u64> {
        self.last_interaction_ms
    }
}

fn swipe_between(start: TouchPoint, end: TouchPoint) -> Option<Gesture> {
    let dx = end.x as i32 - start.x as i32;
    let dy = end.y as i32 - start.y as i32;
    if dx.abs() < SWIPE_MIN_TRAVEL_PX || dx.abs() <= dy.abs() {
        return None;
    }
    let direction = if dx < 0 {
        SwipeDirection::Left
    } else {
        SwipeDirection::Right
    };
    Some(Gesture::Swipe(direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_drag_release_sequence() {
        let mut input = PointerInput::new();
        let p = TouchPoint::new(100, 100);

        let s = input.read_pointer(Some(p), 10);
        assert!(s.pressed);
        assert_eq!(s.event, Some(TouchEvent::Press(p)));
        assert_eq!(input.last_interaction_ms(), Some(10));

        // Same point again: still pressed, nothing new to report
        let s = input.read_pointer(Some(p), 20);
        assert!(s.pressed);
        assert_eq!(s.event, None);

        let q = TouchPoint::new(105, 102);
        assert_eq!(input.read_pointer(Some(q), 30).event, Some(TouchEvent::Drag(q)));

        let s = input.read_pointer(None, 40);
        assert!(!s.pressed);
        assert_eq!(s.point, q);
        assert_eq!(s.event, Some(TouchEvent::Release(q)));
        assert_eq!(s.gesture, None);
        assert_eq!(input.last_interaction_ms(), Some(30), "release is not contact");

        let s = input.read_pointer(None, 50);
        assert_eq!(s.event, None);
    }

    #[test]
    fn test_horizontal_swipes() {
        let mut input = PointerInput::new();
        input.read_pointer(Some(TouchPoint::new(180, 120)), 0);
        input.read_pointer(Some(TouchPoint::new(130, 125)), 10);
        let s = input.read_pointer(None, 20);
        assert_eq!(s.gesture, Some(Gesture::Swipe(SwipeDirection::Left)));

        input.read_pointer(Some(TouchPoint::new(60, 120)), 30);
        input.read_pointer(Some(TouchPoint::new(100, 120)), 40);
        let s = input.read_pointer(None, 50);
        assert_eq!(s.gesture, Some(Gesture::Swipe(SwipeDirection::Right)));
    }

    #[test]
    fn test_short_or_vertical_moves_are_not_swipes() {
        let mut input = PointerInput::new();
        input.read_pointer(Some(TouchPoint::new(100, 100)), 0);
        input.read_pointer(Some(TouchPoint::new(130, 100)), 10);
        assert_eq!(input.read_pointer(None, 20).gesture, None);

        input.read_pointer(Some(TouchPoint::new(100, 40)), 30);
        input.read_pointer(Some(TouchPoint::new(150, 200)), 40);
        assert_eq!(input.read_pointer(None, 50).gesture, None);
    }
}
