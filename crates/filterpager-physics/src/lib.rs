#![forbid(unsafe_code)]

//! Horizontal paging physics: drag detection, velocity tracking and settle animation.
//!
//! This crate knows nothing about rendering or filters. The controller hands it a
//! [`PageFrame`] snapshot with every call and applies the returned [`PhysicsEvent`].
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod scroller;
pub mod velocity;

use std::time::Duration;

use filterpager_core::{InputEvent, PagerConfig, TouchKind};
use tracing::{debug, trace};

pub use scroller::Scroller;
pub use velocity::VelocityTracker;

/// Thresholds in pixels (already scaled by display density).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    pub touch_slop: f32,
    pub min_fling_velocity: f32,
    pub max_fling_velocity: f32,
    pub fling_distance: f32,
    pub close_enough: f32,
    pub max_settle_duration: Duration,
    pub debug: bool,
}

impl From<&PagerConfig> for PhysicsConfig {
    fn from(cfg: &PagerConfig) -> Self {
        Self {
            touch_slop: cfg.touch_slop_px,
            min_fling_velocity: cfg.min_fling_velocity_px(),
            max_fling_velocity: cfg.max_fling_velocity_px,
            fling_distance: cfg.min_fling_distance_px(),
            close_enough: cfg.close_enough_px(),
            max_settle_duration: Duration::from_millis(cfg.max_settle_duration_ms),
            debug: cfg.debug,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::from(&PagerConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollMode {
    #[default]
    Idle,
    Dragging,
    Settling,
}

/// Controller state the physics reads but does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFrame {
    pub scroll_x: i32,
    pub width: i32,
    pub page_count: usize,
    pub current_index: usize,
}

impl PageFrame {
    pub fn max_scroll_x(&self) -> i32 {
        self.width * self.page_count.saturating_sub(1) as i32
    }
}

/// What the controller must do after feeding the physics an event or a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsEvent {
    None,
    /// Move the content to this scroll position.
    ScrollTo(i32),
    /// A touch-down interrupted a settle at `x`; dragging continues from there.
    SettleCaught(i32),
    /// The settle ended (or was completed early) at `x`.
    SettleFinished(i32),
    /// The drag ended; settle towards `target`.
    Released { target: usize, velocity: f32 },
    /// The drag was cancelled; settle back to the current page.
    Cancelled,
}

fn distance_influence_for_snap_duration(f: f32) -> f32 {
    let f = (f - 0.5) * (0.3 * std::f32::consts::PI / 2.0);
    f.sin()
}

#[derive(Debug)]
pub struct ScrollPhysics {
    cfg: PhysicsConfig,
    mode: ScrollMode,
    scroller: Scroller,
    scroll_started: bool,
    tracker: VelocityTracker,

    is_being_dragged: bool,
    unable_to_drag: bool,
    active_pointer: Option<u32>,
    initial_x: f32,
    initial_y: f32,
    last_x: f32,
    last_y: f32,
}

impl ScrollPhysics {
    pub fn new(cfg: PhysicsConfig) -> Self {
        Self {
            cfg,
            mode: ScrollMode::Idle,
            scroller: Scroller::new(),
            scroll_started: false,
            tracker: VelocityTracker::new(),
            is_being_dragged: false,
            unable_to_drag: false,
            active_pointer: None,
            initial_x: 0.0,
            initial_y: 0.0,
            last_x: 0.0,
            last_y: 0.0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.cfg
    }

    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    pub fn is_being_dragged(&self) -> bool {
        self.is_being_dragged
    }

    pub fn scroller(&self) -> &Scroller {
        &self.scroller
    }

    /// Drops any animation and gesture in progress.
    pub fn abort(&mut self) {
        self.scroller.force_finished();
        self.mode = ScrollMode::Idle;
        self.reset_touch();
    }

    /// Ends a running settle at its final position. Returns that position, or `None` when
    /// nothing was settling.
    pub fn complete_settle(&mut self) -> Option<i32> {
        if self.mode != ScrollMode::Settling {
            return None;
        }
        if !self.scroller.is_finished() {
            self.scroller.abort_animation();
        }
        self.mode = ScrollMode::Idle;
        Some(self.scroller.curr_x())
    }

    // ---------------------------------------------------------------------------------------------
    // Touch
    // ---------------------------------------------------------------------------------------------

    pub fn on_touch(&mut self, ev: &InputEvent, frame: &PageFrame) -> PhysicsEvent {
        if frame.page_count == 0 || frame.width <= 0 {
            return PhysicsEvent::None;
        }
        if self.cfg.debug {
            trace!(kind = ?ev.kind, x = ev.x, y = ev.y, mode = ?self.mode, "touch");
        }

        if ev.kind == TouchKind::Down {
            self.tracker.clear();
        }
        self.tracker.add_movement(ev);

        match ev.kind {
            TouchKind::Down => self.on_down(ev),
            TouchKind::Move => self.on_move(ev, frame),
            TouchKind::Up => self.on_up(ev, frame),
            TouchKind::Cancel => {
                let was_dragging = self.is_being_dragged;
                self.reset_touch();
                if was_dragging {
                    PhysicsEvent::Cancelled
                } else {
                    PhysicsEvent::None
                }
            }
            TouchKind::PointerDown => {
                self.last_x = ev.x;
                self.active_pointer = Some(ev.pointer_id);
                PhysicsEvent::None
            }
            TouchKind::PointerUp => {
                self.on_secondary_pointer_up(ev);
                PhysicsEvent::None
            }
        }
    }

    fn on_down(&mut self, ev: &InputEvent) -> PhysicsEvent {
        self.scroller.compute_scroll_offset(ev.time);
        let remaining = (self.scroller.final_x() - self.scroller.curr_x()).abs() as f32;

        let outcome = if self.mode == ScrollMode::Settling && remaining > self.cfg.close_enough {
            let live = self.scroller.curr_x();
            self.scroller.force_finished();
            self.is_being_dragged = true;
            self.mode = ScrollMode::Dragging;
            debug!(x = live, remaining, "caught settle");
            PhysicsEvent::SettleCaught(live)
        } else if self.mode == ScrollMode::Settling {
            self.is_being_dragged = false;
            self.complete_settle()
                .map(PhysicsEvent::SettleFinished)
                .unwrap_or(PhysicsEvent::None)
        } else {
            self.is_being_dragged = false;
            self.mode = ScrollMode::Idle;
            PhysicsEvent::None
        };

        self.initial_x = ev.x;
        self.last_x = ev.x;
        self.initial_y = ev.y;
        self.last_y = ev.y;
        self.active_pointer = Some(ev.pointer_id);
        self.unable_to_drag = false;
        outcome
    }

    fn on_move(&mut self, ev: &InputEvent, frame: &PageFrame) -> PhysicsEvent {
        let Some(active) = self.active_pointer else {
            return PhysicsEvent::None;
        };
        let Some((x, y)) = ev.position_of(active) else {
            // Lost track of the active pointer; wait for the next touch-down.
            self.reset_touch();
            return PhysicsEvent::None;
        };

        if !self.is_being_dragged {
            if self.unable_to_drag {
                return PhysicsEvent::None;
            }
            let x_diff = (x - self.last_x).abs();
            let y_diff = (y - self.initial_y).abs();
            if x_diff > self.cfg.touch_slop && x_diff * 0.5 > y_diff {
                debug!(x_diff, y_diff, "starting drag");
                self.is_being_dragged = true;
                self.mode = ScrollMode::Dragging;
                self.last_x = if x - self.initial_x > 0.0 {
                    self.initial_x + self.cfg.touch_slop
                } else {
                    self.initial_x - self.cfg.touch_slop
                };
                self.last_y = y;
            } else if y_diff > self.cfg.touch_slop {
                debug!(y_diff, "vertical intent, not dragging");
                self.unable_to_drag = true;
            }
        }

        if self.is_being_dragged {
            return self.perform_drag(x, frame);
        }
        PhysicsEvent::None
    }

    fn perform_drag(&mut self, x: f32, frame: &PageFrame) -> PhysicsEvent {
        let delta = self.last_x - x;
        self.last_x = x;

        let scroll =
            (frame.scroll_x as f32 + delta).clamp(0.0, frame.max_scroll_x() as f32);
        let whole = scroll.trunc();
        // Keep the sub-pixel remainder so repeated truncation does not drift.
        self.last_x += scroll - whole;
        PhysicsEvent::ScrollTo(whole as i32)
    }

    fn on_up(&mut self, ev: &InputEvent, frame: &PageFrame) -> PhysicsEvent {
        if !self.is_being_dragged {
            self.reset_touch();
            return PhysicsEvent::None;
        }
        let active = self.active_pointer.unwrap_or(ev.pointer_id);
        let velocity = self
            .tracker
            .compute_velocity(active, 1000.0, self.cfg.max_fling_velocity)
            .trunc();
        let x = ev.position_of(active).map(|(x, _)| x).unwrap_or(ev.x);
        let total_delta = (x - self.initial_x) as i32;

        let scroll_offset = frame.scroll_x as f32 / frame.width as f32;
        let position = scroll_offset as i64;
        let outcome = if position >= 0 && (position as usize) < frame.page_count {
            let current_page = position as usize;
            let page_offset = scroll_offset - position as f32;
            let target =
                self.determine_target_page(current_page, page_offset, velocity, total_delta, frame);
            debug!(current_page, target, velocity, "release");
            PhysicsEvent::Released { target, velocity }
        } else {
            PhysicsEvent::Cancelled
        };

        self.reset_touch();
        outcome
    }

    fn on_secondary_pointer_up(&mut self, ev: &InputEvent) {
        if self.active_pointer != Some(ev.pointer_id) {
            return;
        }
        let next = ev.pointers.iter().find(|p| p.id != ev.pointer_id);
        if let Some(p) = next {
            self.last_x = p.x;
            self.active_pointer = Some(p.id);
        } else {
            self.active_pointer = None;
        }
        self.tracker.clear();
    }

    fn reset_touch(&mut self) {
        self.active_pointer = None;
        self.is_being_dragged = false;
        self.unable_to_drag = false;
        self.tracker.clear();
    }

    /// Picks the page a released drag should land on.
    ///
    /// A fling (fast and far enough) moves by at most one page in the direction of travel.
    /// Otherwise the page snaps once the biased position crosses the next integer: the
    /// bias is 0.4 when moving forward from the stored current page and 0.6 when moving back.
    pub fn determine_target_page(
        &self,
        current_page: usize,
        page_offset: f32,
        velocity: f32,
        delta_x: i32,
        frame: &PageFrame,
    ) -> usize {
        let target = if delta_x.unsigned_abs() as f32 > self.cfg.fling_distance
            && velocity.abs() > self.cfg.min_fling_velocity
        {
            if velocity > 0.0 {
                current_page as i64
            } else {
                current_page as i64 + 1
            }
        } else {
            let truncator = if current_page >= frame.current_index {
                0.4
            } else {
                0.6
            };
            (current_page as f32 + page_offset + truncator) as i64
        };

        let last = frame.page_count.saturating_sub(1) as i64;
        target.clamp(0, last) as usize
    }

    // ---------------------------------------------------------------------------------------------
    // Settle
    // ---------------------------------------------------------------------------------------------

    /// Settle duration for a move of `dx` pixels released at `velocity` px/s.
    pub fn settle_duration(&self, dx: i32, velocity: f32, width: i32) -> Duration {
        if width <= 0 {
            return Duration::ZERO;
        }
        let width_f = width as f32;
        let half = (width / 2) as f32;
        let ratio = (dx.unsigned_abs() as f32 / width_f).min(1.0);
        let distance = half + half * distance_influence_for_snap_duration(ratio);

        let velocity = velocity.abs();
        let ms = if velocity > 0.0 {
            4 * (1000.0 * (distance / velocity).abs()).round() as u64
        } else {
            let page_delta = dx.unsigned_abs() as f32 / width_f;
            ((page_delta + 1.0) * 100.0) as u64
        };
        Duration::from_millis(ms).min(self.cfg.max_settle_duration)
    }

    /// Starts animating from the current position to `dest_x`.
    ///
    /// Returns `SettleFinished` right away when there is nothing to animate, otherwise the
    /// first animation frame.
    pub fn smooth_scroll_to(
        &mut self,
        dest_x: i32,
        velocity: f32,
        frame: &PageFrame,
        now: Duration,
    ) -> PhysicsEvent {
        let sx = if !self.scroller.is_finished() {
            let sx = if self.scroll_started {
                self.scroller.curr_x()
            } else {
                self.scroller.start_x()
            };
            self.scroller.abort_animation();
            sx
        } else {
            frame.scroll_x
        };

        let dx = dest_x - sx;
        if dx == 0 {
            self.mode = ScrollMode::Idle;
            return PhysicsEvent::SettleFinished(dest_x);
        }

        self.mode = ScrollMode::Settling;
        let duration = self.settle_duration(dx, velocity, frame.width);
        debug!(from = sx, to = dest_x, ?duration, "settle");

        self.scroll_started = false;
        self.scroller.start_scroll(sx, dx, duration, now);
        self.tick(now)
    }

    /// Advances a running settle to `now`.
    pub fn tick(&mut self, now: Duration) -> PhysicsEvent {
        self.scroll_started = true;
        if self.mode != ScrollMode::Settling {
            return PhysicsEvent::None;
        }
        if !self.scroller.is_finished() && self.scroller.compute_scroll_offset(now) {
            return PhysicsEvent::ScrollTo(self.scroller.curr_x());
        }
        self.mode = ScrollMode::Idle;
        PhysicsEvent::SettleFinished(self.scroller.curr_x())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn frame(scroll_x: i32, pages: usize, current: usize) -> PageFrame {
        PageFrame {
            scroll_x,
            width: 1000,
            page_count: pages,
            current_index: current,
        }
    }

    fn physics() -> ScrollPhysics {
        ScrollPhysics::new(PhysicsConfig::default())
    }

    #[test]
    fn fling_ignores_page_offset() {
        let p = physics();
        let f = frame(0, 5, 2);
        for offset in [0.0, 0.3, 0.9] {
            assert_eq!(p.determine_target_page(2, offset, 1500.0, 100, &f), 2);
            assert_eq!(p.determine_target_page(2, offset, -1500.0, -100, &f), 3);
        }
    }

    #[test]
    fn short_fast_move_is_not_a_fling() {
        let p = physics();
        let f = frame(0, 5, 2);
        // Below the fling distance: snap rules apply.
        assert_eq!(p.determine_target_page(2, 0.1, -5000.0, -10, &f), 2);
    }

    #[test]
    fn snap_uses_asymmetric_truncator() {
        let p = physics();
        // Moving forward from page 0: advance once 60% is crossed.
        let f = frame(0, 3, 0);
        assert_eq!(p.determine_target_page(0, 0.59, 0.0, -590, &f), 0);
        assert_eq!(p.determine_target_page(0, 0.61, 0.0, -610, &f), 1);

        // Moving back from page 1 (position is on page 0): return once 60% is crossed.
        let f = frame(0, 3, 1);
        assert_eq!(p.determine_target_page(0, 0.41, 0.0, 590, &f), 1);
        assert_eq!(p.determine_target_page(0, 0.39, 0.0, 610, &f), 0);
    }

    #[test]
    fn target_is_clamped() {
        let p = physics();
        let f = frame(0, 3, 2);
        assert_eq!(p.determine_target_page(2, 0.0, -9000.0, -500, &f), 2);
        let f = frame(0, 1, 0);
        assert_eq!(p.determine_target_page(0, 0.9, 0.0, -900, &f), 0);
    }

    #[test]
    fn settle_duration_formula() {
        let p = physics();
        assert_eq!(p.settle_duration(1000, 0.0, 1000), ms(200));
        assert_eq!(p.settle_duration(-500, 0.0, 1000), ms(150));
        // distance = 500 + 500 * sin(0.5 * 0.15 pi) ~= 616.7
        assert_eq!(p.settle_duration(1000, 10_000.0, 1000), ms(248));
        assert_eq!(p.settle_duration(1000, 2000.0, 1000), ms(600));
    }

    #[test]
    fn drag_requires_slop_and_horizontal_dominance() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        p.on_touch(&InputEvent::down(500.0, 500.0, ms(0)), &f);

        // Within slop.
        assert_eq!(
            p.on_touch(&InputEvent::moved(495.0, 500.0, ms(10)), &f),
            PhysicsEvent::None
        );
        // Past slop, but vertical is more than half the horizontal.
        assert_eq!(
            p.on_touch(&InputEvent::moved(480.0, 511.0, ms(20)), &f),
            PhysicsEvent::None
        );
        assert!(!p.is_being_dragged());
    }

    #[test]
    fn vertical_intent_latches_until_next_down() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        p.on_touch(&InputEvent::down(500.0, 500.0, ms(0)), &f);
        p.on_touch(&InputEvent::moved(500.0, 530.0, ms(10)), &f);
        assert_eq!(
            p.on_touch(&InputEvent::moved(300.0, 530.0, ms(20)), &f),
            PhysicsEvent::None
        );
        assert!(!p.is_being_dragged());

        p.on_touch(&InputEvent::down(500.0, 500.0, ms(100)), &f);
        let ev = p.on_touch(&InputEvent::moved(400.0, 500.0, ms(110)), &f);
        assert_eq!(ev, PhysicsEvent::ScrollTo(92));
    }

    #[test]
    fn drag_start_discounts_the_slop() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        p.on_touch(&InputEvent::down(500.0, 500.0, ms(0)), &f);
        let ev = p.on_touch(&InputEvent::moved(450.0, 500.0, ms(10)), &f);
        assert_eq!(ev, PhysicsEvent::ScrollTo(42));
        assert_eq!(p.mode(), ScrollMode::Dragging);
    }

    #[test]
    fn drag_is_clamped_to_the_page_range() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        p.on_touch(&InputEvent::down(500.0, 500.0, ms(0)), &f);
        let ev = p.on_touch(&InputEvent::moved(600.0, 500.0, ms(10)), &f);
        assert_eq!(ev, PhysicsEvent::ScrollTo(0));
    }

    #[test]
    fn empty_or_unlaid_out_pager_ignores_touch() {
        let mut p = physics();
        let empty = frame(0, 0, 0);
        assert_eq!(
            p.on_touch(&InputEvent::down(1.0, 1.0, ms(0)), &empty),
            PhysicsEvent::None
        );
        let zero_width = PageFrame {
            width: 0,
            ..frame(0, 3, 0)
        };
        p.on_touch(&InputEvent::down(500.0, 500.0, ms(0)), &zero_width);
        assert_eq!(
            p.on_touch(&InputEvent::moved(100.0, 500.0, ms(10)), &zero_width),
            PhysicsEvent::None
        );
    }

    #[test]
    fn settle_runs_to_completion() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        let first = p.smooth_scroll_to(1000, 0.0, &f, ms(0));
        assert_eq!(first, PhysicsEvent::ScrollTo(0));
        assert_eq!(p.mode(), ScrollMode::Settling);
        assert_eq!(p.scroller().duration(), ms(200));

        assert!(matches!(p.tick(ms(100)), PhysicsEvent::ScrollTo(x) if x > 900 && x < 1000));
        assert_eq!(p.tick(ms(250)), PhysicsEvent::ScrollTo(1000));
        assert_eq!(p.tick(ms(283)), PhysicsEvent::SettleFinished(1000));
        assert_eq!(p.mode(), ScrollMode::Idle);
        assert_eq!(p.tick(ms(316)), PhysicsEvent::None);
    }

    #[test]
    fn settle_to_current_position_finishes_immediately() {
        let mut p = physics();
        let f = frame(1000, 3, 1);
        assert_eq!(
            p.smooth_scroll_to(1000, 0.0, &f, ms(0)),
            PhysicsEvent::SettleFinished(1000)
        );
        assert_eq!(p.mode(), ScrollMode::Idle);
    }

    #[test]
    fn touch_down_catches_a_far_settle() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        p.smooth_scroll_to(1000, 0.0, &f, ms(0));
        p.tick(ms(20));

        let ev = p.on_touch(&InputEvent::down(500.0, 500.0, ms(40)), &frame(500, 3, 0));
        assert!(matches!(ev, PhysicsEvent::SettleCaught(x) if x > 0 && x < 1000));
        assert_eq!(p.mode(), ScrollMode::Dragging);
        assert!(p.is_being_dragged());
    }

    #[test]
    fn touch_down_completes_a_nearly_done_settle() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        p.smooth_scroll_to(1000, 0.0, &f, ms(0));

        // At 190 of 200 ms the quintic curve is within a pixel of the end.
        let ev = p.on_touch(&InputEvent::down(500.0, 500.0, ms(190)), &frame(990, 3, 0));
        assert_eq!(ev, PhysicsEvent::SettleFinished(1000));
        assert_eq!(p.mode(), ScrollMode::Idle);
        assert!(!p.is_being_dragged());
    }

    #[test]
    fn cancel_while_dragging_snaps_back() {
        let mut p = physics();
        let f = frame(0, 3, 0);
        p.on_touch(&InputEvent::down(500.0, 500.0, ms(0)), &f);
        p.on_touch(&InputEvent::moved(300.0, 500.0, ms(10)), &f);
        assert_eq!(
            p.on_touch(&InputEvent::cancel(300.0, 500.0, ms(20)), &frame(192, 3, 0)),
            PhysicsEvent::Cancelled
        );
        assert!(!p.is_being_dragged());
    }

    #[test]
    fn secondary_pointer_takes_over() {
        use filterpager_core::Pointer;

        let mut p = physics();
        let f = frame(0, 3, 0);
        p.on_touch(&InputEvent::down(500.0, 500.0, ms(0)), &f);
        p.on_touch(&InputEvent::moved(400.0, 500.0, ms(10)), &f);

        let both = vec![
            Pointer { id: 0, x: 400.0, y: 500.0 },
            Pointer { id: 1, x: 700.0, y: 500.0 },
        ];
        p.on_touch(
            &InputEvent::single(TouchKind::PointerDown, 1, 700.0, 500.0, ms(20))
                .with_pointers(both.clone()),
            &f,
        );
        // Pointer 0 moving is ignored now; pointer 1 drives.
        let ev = p.on_touch(
            &InputEvent::single(TouchKind::Move, 0, 350.0, 500.0, ms(30)).with_pointers(vec![
                Pointer { id: 0, x: 350.0, y: 500.0 },
                Pointer { id: 1, x: 690.0, y: 500.0 },
            ]),
            &frame(92, 3, 0),
        );
        assert_eq!(ev, PhysicsEvent::ScrollTo(102));

        // Pointer 1 lifts; pointer 0 becomes active again.
        p.on_touch(
            &InputEvent::single(TouchKind::PointerUp, 1, 690.0, 500.0, ms(40)).with_pointers(
                vec![
                    Pointer { id: 0, x: 350.0, y: 500.0 },
                    Pointer { id: 1, x: 690.0, y: 500.0 },
                ],
            ),
            &f,
        );
        let ev = p.on_touch(&InputEvent::moved(340.0, 500.0, ms(50)), &frame(102, 3, 0));
        assert_eq!(ev, PhysicsEvent::ScrollTo(112));
    }
}
