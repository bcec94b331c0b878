use std::time::Duration;

use filterpager::{InputEvent, Pointer, TouchKind};
use winit::event::TouchPhase;

/// Pointer id used for the mouse.
pub const MOUSE_POINTER: u32 = 0;

/// Turns winit mouse and touch events into pager input.
///
/// The left mouse button behaves like a single finger. Touches are tracked by id so that
/// secondary fingers produce `PointerDown`/`PointerUp` with the full pointer list.
#[derive(Debug, Default)]
pub struct PointerTranslator {
    cursor: (f32, f32),
    mouse_down: bool,
    touches: Vec<Pointer>,
}

impl PointerTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64, now: Duration) -> Option<InputEvent> {
        self.cursor = (x as f32, y as f32);
        self.mouse_down
            .then(|| InputEvent::moved(self.cursor.0, self.cursor.1, now))
    }

    pub fn mouse_button(&mut self, pressed: bool, now: Duration) -> Option<InputEvent> {
        if pressed == self.mouse_down {
            return None;
        }
        self.mouse_down = pressed;
        let (x, y) = self.cursor;
        Some(if pressed {
            InputEvent::down(x, y, now)
        } else {
            InputEvent::up(x, y, now)
        })
    }

    /// Leaving the window with the button held cancels the gesture.
    pub fn cursor_left(&mut self, now: Duration) -> Option<InputEvent> {
        if !self.mouse_down {
            return None;
        }
        self.mouse_down = false;
        let (x, y) = self.cursor;
        Some(InputEvent::cancel(x, y, now))
    }

    pub fn touch(
        &mut self,
        phase: TouchPhase,
        id: u64,
        x: f64,
        y: f64,
        now: Duration,
    ) -> Option<InputEvent> {
        let id = id as u32;
        let (x, y) = (x as f32, y as f32);
        match phase {
            TouchPhase::Started => {
                let kind = if self.touches.is_empty() {
                    TouchKind::Down
                } else {
                    TouchKind::PointerDown
                };
                self.touches.retain(|p| p.id != id);
                self.touches.push(Pointer { id, x, y });
                Some(InputEvent::single(kind, id, x, y, now).with_pointers(self.touches.clone()))
            }
            TouchPhase::Moved => {
                let p = self.touches.iter_mut().find(|p| p.id == id)?;
                p.x = x;
                p.y = y;
                Some(
                    InputEvent::single(TouchKind::Move, id, x, y, now)
                        .with_pointers(self.touches.clone()),
                )
            }
            TouchPhase::Ended => {
                if !self.touches.iter().any(|p| p.id == id) {
                    return None;
                }
                let pointers = self.touches.clone();
                self.touches.retain(|p| p.id != id);
                let kind = if self.touches.is_empty() {
                    TouchKind::Up
                } else {
                    TouchKind::PointerUp
                };
                Some(InputEvent::single(kind, id, x, y, now).with_pointers(pointers))
            }
            TouchPhase::Cancelled => {
                self.touches.clear();
                Some(InputEvent::single(TouchKind::Cancel, id, x, y, now))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn mouse_drag_is_one_finger() {
        let mut t = PointerTranslator::new();
        assert!(t.cursor_moved(10.0, 20.0, ms(0)).is_none());

        let down = t.mouse_button(true, ms(1)).expect("down");
        assert_eq!(down.kind, TouchKind::Down);
        assert_eq!((down.x, down.y), (10.0, 20.0));
        assert_eq!(down.pointer_id, MOUSE_POINTER);

        let mv = t.cursor_moved(50.0, 20.0, ms(2)).expect("move");
        assert_eq!(mv.kind, TouchKind::Move);

        assert!(t.mouse_button(true, ms(3)).is_none());
        assert_eq!(t.mouse_button(false, ms(4)).expect("up").kind, TouchKind::Up);
        assert!(t.cursor_moved(60.0, 20.0, ms(5)).is_none());
    }

    #[test]
    fn leaving_the_window_cancels() {
        let mut t = PointerTranslator::new();
        assert!(t.cursor_left(ms(0)).is_none());
        t.mouse_button(true, ms(1));
        assert_eq!(t.cursor_left(ms(2)).expect("cancel").kind, TouchKind::Cancel);
        assert!(t.mouse_button(false, ms(3)).is_none());
    }

    #[test]
    fn second_finger_is_a_pointer_event() {
        let mut t = PointerTranslator::new();
        let a = t.touch(TouchPhase::Started, 7, 1.0, 1.0, ms(0)).expect("a");
        assert_eq!(a.kind, TouchKind::Down);
        let b = t.touch(TouchPhase::Started, 9, 5.0, 5.0, ms(1)).expect("b");
        assert_eq!(b.kind, TouchKind::PointerDown);
        assert_eq!(b.pointers.len(), 2);

        let mv = t.touch(TouchPhase::Moved, 7, 2.0, 1.0, ms(2)).expect("move");
        assert_eq!(mv.position_of(7), Some((2.0, 1.0)));
        assert_eq!(mv.position_of(9), Some((5.0, 5.0)));

        let up_b = t.touch(TouchPhase::Ended, 9, 5.0, 5.0, ms(3)).expect("b up");
        assert_eq!(up_b.kind, TouchKind::PointerUp);
        assert_eq!(up_b.pointers.len(), 2);
        let up_a = t.touch(TouchPhase::Ended, 7, 2.0, 1.0, ms(4)).expect("a up");
        assert_eq!(up_a.kind, TouchKind::Up);
    }

    #[test]
    fn unknown_touch_ids_are_ignored() {
        let mut t = PointerTranslator::new();
        assert!(t.touch(TouchPhase::Moved, 3, 0.0, 0.0, ms(0)).is_none());
        assert!(t.touch(TouchPhase::Ended, 3, 0.0, 0.0, ms(0)).is_none());
    }
}
