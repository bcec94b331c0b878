//! Platform-neutral touch input.
//!
//! Hosts translate their pointer/touch events into [`InputEvent`] before handing them to the
//! pager. Coordinates are in surface pixels, time is monotonic from an arbitrary origin.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchKind {
    /// First pointer went down.
    Down,
    Move,
    /// Last pointer went up.
    Up,
    Cancel,
    /// An additional pointer went down while others are held.
    PointerDown,
    /// A non-last pointer went up.
    PointerUp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: TouchKind,
    /// Pointer this event is about (the one that went down or up for pointer events).
    pub pointer_id: u32,
    pub x: f32,
    pub y: f32,
    pub time: Duration,
    /// Every pointer currently on the surface, including `pointer_id`.
    pub pointers: Vec<Pointer>,
}

impl InputEvent {
    pub fn single(kind: TouchKind, pointer_id: u32, x: f32, y: f32, time: Duration) -> Self {
        Self {
            kind,
            pointer_id,
            x,
            y,
            time,
            pointers: vec![Pointer { id: pointer_id, x, y }],
        }
    }

    pub fn down(x: f32, y: f32, time: Duration) -> Self {
        Self::single(TouchKind::Down, 0, x, y, time)
    }

    pub fn moved(x: f32, y: f32, time: Duration) -> Self {
        Self::single(TouchKind::Move, 0, x, y, time)
    }

    pub fn up(x: f32, y: f32, time: Duration) -> Self {
        Self::single(TouchKind::Up, 0, x, y, time)
    }

    pub fn cancel(x: f32, y: f32, time: Duration) -> Self {
        Self::single(TouchKind::Cancel, 0, x, y, time)
    }

    pub fn with_pointers(mut self, pointers: Vec<Pointer>) -> Self {
        self.pointers = pointers;
        self
    }

    /// Position of `id` in this event, if that pointer is part of it.
    pub fn position_of(&self, id: u32) -> Option<(f32, f32)> {
        if let Some(p) = self.pointers.iter().find(|p| p.id == id) {
            return Some((p.x, p.y));
        }
        (id == self.pointer_id).then_some((self.x, self.y))
    }
}
