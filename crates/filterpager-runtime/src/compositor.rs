//! Two-pass split composite.
//!
//! Pass 1 draws the source image through two filters into the offscreen target, one per
//! half. Pass 2 draws the offscreen texture to the screen, again one filter per half. The
//! half that stays unfiltered in each pass uses the passthrough fallback, so every visible
//! pixel goes through exactly one page filter.

use filterpager_geometry::{GeometryBuffers, HalfQuads};

use crate::filter::FilterHandle;
use crate::slots::FilterSlots;
use crate::GpuContext;

/// Which neighbor is being revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DragDirection {
    /// Content moves right and the left neighbor slides in.
    ToLeft,
    /// Content moves left and the right neighbor slides in.
    #[default]
    ToRight,
}

impl DragDirection {
    pub fn from_drag_to_left(drag_to_left: bool) -> Self {
        if drag_to_left {
            DragDirection::ToLeft
        } else {
            DragDirection::ToRight
        }
    }
}

/// Framebuffer switching the compositor needs from a backend.
pub trait CompositeSurface<C: GpuContext> {
    /// Color texture of the offscreen target, `None` until a target exists.
    fn offscreen_texture(&self) -> Option<C::Texture>;

    /// Binds the offscreen target, sets the viewport and clears it to transparent.
    fn bind_offscreen(&mut self, ctx: &C);

    /// Binds the default framebuffer.
    fn bind_screen(&mut self, ctx: &C);
}

fn draw<C: GpuContext>(
    filter: &FilterHandle<C>,
    ctx: &C,
    source: Option<C::Texture>,
    half: &HalfQuads,
) {
    filter.with(|f| f.render(ctx, source, &half.cube, &half.tex));
}

/// Draws one frame. Returns false when nothing was drawn (no pages or no offscreen target),
/// leaving only the background visible.
pub fn composite_frame<C, S>(
    ctx: &C,
    surface: &mut S,
    slots: &FilterSlots<C>,
    geometry: &GeometryBuffers,
    direction: DragDirection,
    source: Option<C::Texture>,
) -> bool
where
    C: GpuContext,
    S: CompositeSurface<C>,
{
    if slots.is_empty() {
        return false;
    }
    let Some(offscreen) = surface.offscreen_texture() else {
        return false;
    };
    let passthrough = slots.fallback();

    surface.bind_offscreen(ctx);
    match direction {
        DragDirection::ToLeft => {
            draw(slots.left_or_fallback(), ctx, source, &geometry.scaled.left);
            draw(passthrough, ctx, source, &geometry.scaled.right);

            surface.bind_screen(ctx);
            draw(passthrough, ctx, Some(offscreen), &geometry.normal.left);
            draw(slots.current_or_fallback(), ctx, Some(offscreen), &geometry.normal.right);
        }
        DragDirection::ToRight => {
            draw(slots.current_or_fallback(), ctx, source, &geometry.scaled.left);
            draw(passthrough, ctx, source, &geometry.scaled.right);

            surface.bind_screen(ctx);
            draw(passthrough, ctx, Some(offscreen), &geometry.normal.left);
            draw(slots.right_or_fallback(), ctx, Some(offscreen), &geometry.normal.right);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterTriple;
    use crate::testing::{CallLog, GpuCall, NullGpu, NullSurface, RecordingFilter};
    use filterpager_geometry::{compute_buffers, GeometryParams};

    const SOURCE: u32 = 7;

    fn slots_with(
        log: &CallLog,
        left: bool,
        right: bool,
    ) -> FilterSlots<NullGpu> {
        let pass = FilterHandle::new(RecordingFilter::new("pass", log.clone()));
        let mut slots = FilterSlots::new(&NullGpu, pass).expect("fallback");
        let mk = |n: &str| FilterHandle::new(RecordingFilter::new(n, log.clone()));
        slots.set_triple(
            &NullGpu,
            FilterTriple {
                left: left.then(|| mk("left")),
                current: Some(mk("cur")),
                right: right.then(|| mk("right")),
            },
        );
        log.clear();
        slots
    }

    fn geometry() -> GeometryBuffers {
        compute_buffers(&GeometryParams {
            output_width: 100,
            output_height: 100,
            image_width: 100,
            image_height: 100,
            split_px: 40,
            ..GeometryParams::default()
        })
    }

    #[test]
    fn drag_to_left_reveals_left_neighbor() {
        let log = CallLog::default();
        let slots = slots_with(&log, true, true);
        let mut surface = NullSurface::new(log.clone(), Some(99));
        let geo = geometry();

        assert!(composite_frame(
            &NullGpu,
            &mut surface,
            &slots,
            &geo,
            DragDirection::ToLeft,
            Some(SOURCE),
        ));

        assert_eq!(
            log.entries(),
            vec![
                GpuCall::BindOffscreen,
                GpuCall::render("left", Some(SOURCE), &geo.scaled.left),
                GpuCall::render("pass", Some(SOURCE), &geo.scaled.right),
                GpuCall::BindScreen,
                GpuCall::render("pass", Some(99), &geo.normal.left),
                GpuCall::render("cur", Some(99), &geo.normal.right),
            ]
        );
    }

    #[test]
    fn drag_to_right_reveals_right_neighbor() {
        let log = CallLog::default();
        let slots = slots_with(&log, true, true);
        let mut surface = NullSurface::new(log.clone(), Some(99));
        let geo = geometry();

        composite_frame(
            &NullGpu,
            &mut surface,
            &slots,
            &geo,
            DragDirection::ToRight,
            Some(SOURCE),
        );

        assert_eq!(
            log.entries(),
            vec![
                GpuCall::BindOffscreen,
                GpuCall::render("cur", Some(SOURCE), &geo.scaled.left),
                GpuCall::render("pass", Some(SOURCE), &geo.scaled.right),
                GpuCall::BindScreen,
                GpuCall::render("pass", Some(99), &geo.normal.left),
                GpuCall::render("right", Some(99), &geo.normal.right),
            ]
        );
    }

    #[test]
    fn missing_neighbors_use_passthrough() {
        let log = CallLog::default();
        let slots = slots_with(&log, false, false);
        let mut surface = NullSurface::new(log.clone(), Some(99));
        let geo = geometry();

        composite_frame(&NullGpu, &mut surface, &slots, &geo, DragDirection::ToLeft, None);
        let names: Vec<String> = log.render_names();
        assert_eq!(names, vec!["pass", "pass", "pass", "cur"]);

        log.clear();
        composite_frame(&NullGpu, &mut surface, &slots, &geo, DragDirection::ToRight, None);
        assert_eq!(log.render_names(), vec!["cur", "pass", "pass", "pass"]);
    }

    #[test]
    fn empty_slots_or_missing_target_draw_nothing() {
        let log = CallLog::default();
        let pass = FilterHandle::new(RecordingFilter::new("pass", log.clone()));
        let empty = FilterSlots::new(&NullGpu, pass).expect("fallback");
        let mut surface = NullSurface::new(log.clone(), Some(99));
        log.clear();
        assert!(!composite_frame(
            &NullGpu,
            &mut surface,
            &empty,
            &geometry(),
            DragDirection::ToRight,
            Some(SOURCE),
        ));
        assert!(log.entries().is_empty());

        let slots = slots_with(&log, true, true);
        let mut no_target = NullSurface::new(log.clone(), None);
        assert!(!composite_frame(
            &NullGpu,
            &mut no_target,
            &slots,
            &geometry(),
            DragDirection::ToRight,
            Some(SOURCE),
        ));
        assert!(log.entries().is_empty());
    }
}
