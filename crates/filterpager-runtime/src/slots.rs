use std::fmt;

use filterpager_core::PagerError;
use tracing::{debug, warn};

use crate::filter::{FilterHandle, FilterTriple};
use crate::GpuContext;

/// The active left/current/right filters plus the passthrough fallback.
///
/// Owned by the render thread. A triple swap disposes the previous filters before the
/// new ones are initialized, so at most one triple holds GPU resources at a time.
pub struct FilterSlots<C: GpuContext> {
    fallback: FilterHandle<C>,
    /// Triple as last requested; used for identity checks.
    requested: FilterTriple<C>,
    /// Requested filters that initialized successfully.
    active: FilterTriple<C>,
    output: (i32, i32),
}

impl<C: GpuContext> fmt::Debug for FilterSlots<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSlots")
            .field("fallback", &self.fallback)
            .field("requested", &self.requested)
            .field("active", &self.active)
            .field("output", &self.output)
            .finish()
    }
}

impl<C: GpuContext> FilterSlots<C> {
    /// Initializes the fallback. Failing here is fatal for the renderer.
    pub fn new(ctx: &C, fallback: FilterHandle<C>) -> Result<Self, PagerError> {
        fallback.with(|f| f.initialize(ctx))?;
        Ok(Self {
            fallback,
            requested: FilterTriple::empty(),
            active: FilterTriple::empty(),
            output: (0, 0),
        })
    }

    pub fn fallback(&self) -> &FilterHandle<C> {
        &self.fallback
    }

    pub fn requested(&self) -> &FilterTriple<C> {
        &self.requested
    }

    pub fn active(&self) -> &FilterTriple<C> {
        &self.active
    }

    /// True when no page filter was requested (empty page list).
    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }

    pub fn output_size(&self) -> (i32, i32) {
        self.output
    }

    pub fn left_or_fallback(&self) -> &FilterHandle<C> {
        self.active.left.as_ref().unwrap_or(&self.fallback)
    }

    pub fn current_or_fallback(&self) -> &FilterHandle<C> {
        self.active.current.as_ref().unwrap_or(&self.fallback)
    }

    pub fn right_or_fallback(&self) -> &FilterHandle<C> {
        self.active.right.as_ref().unwrap_or(&self.fallback)
    }

    fn is_fallback(&self, h: &FilterHandle<C>) -> bool {
        h.ptr_eq(&self.fallback)
    }

    /// Installs `triple`. Returns false (and does nothing) if it is the triple already held.
    pub fn set_triple(&mut self, ctx: &C, triple: FilterTriple<C>) -> bool {
        if triple.same_as(&self.requested) {
            return false;
        }

        let old = std::mem::take(&mut self.active);
        for h in old.distinct() {
            if !self.is_fallback(h) {
                h.with(|f| f.dispose(ctx));
            }
        }

        let (out_w, out_h) = self.output;
        let mut ok: Vec<FilterHandle<C>> = Vec::with_capacity(3);
        let mut failed: Vec<FilterHandle<C>> = Vec::new();
        for handle in triple.distinct() {
            if self.is_fallback(handle) {
                ok.push(handle.clone());
                continue;
            }
            match handle.with(|f| f.initialize(ctx)) {
                Ok(()) => {
                    handle.with(|f| f.on_output_size_changed(ctx, out_w, out_h));
                    ok.push(handle.clone());
                }
                Err(e) => {
                    warn!(filter = handle.name(), error = %e, "filter init failed; using passthrough");
                    failed.push(handle.clone());
                }
            }
        }

        let keep = |slot: &Option<FilterHandle<C>>| -> Option<FilterHandle<C>> {
            slot.as_ref()
                .filter(|h| ok.iter().any(|k| k.ptr_eq(h)))
                .cloned()
        };
        self.active = FilterTriple {
            left: keep(&triple.left),
            current: keep(&triple.current),
            right: keep(&triple.right),
        };
        debug!(triple = ?triple, failed = failed.len(), "filter triple installed");
        self.requested = triple;
        true
    }

    /// Records the output size and forwards it to every live filter.
    pub fn resize(&mut self, ctx: &C, width: i32, height: i32) {
        self.output = (width, height);
        self.fallback
            .with(|f| f.on_output_size_changed(ctx, width, height));
        for h in self.active.distinct() {
            if !self.is_fallback(h) {
                h.with(|f| f.on_output_size_changed(ctx, width, height));
            }
        }
    }

    /// Releases every filter including the fallback.
    pub fn dispose_all(&mut self, ctx: &C) {
        let old = std::mem::take(&mut self.active);
        for h in old.distinct() {
            if !self.is_fallback(h) {
                h.with(|f| f.dispose(ctx));
            }
        }
        self.requested = FilterTriple::empty();
        self.fallback.with(|f| f.dispose(ctx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, GpuCall, NullGpu, RecordingFilter};

    fn setup() -> (CallLog, FilterSlots<NullGpu>) {
        let log = CallLog::default();
        let fallback = FilterHandle::new(RecordingFilter::new("pass", log.clone()));
        let slots = FilterSlots::new(&NullGpu, fallback).expect("fallback init");
        log.clear();
        (log, slots)
    }

    fn handle(name: &str, log: &CallLog) -> FilterHandle<NullGpu> {
        FilterHandle::new(RecordingFilter::new(name, log.clone()))
    }

    #[test]
    fn swap_disposes_old_before_initializing_new() {
        let (log, mut slots) = setup();
        slots.resize(&NullGpu, 100, 50);
        let a = handle("a", &log);
        let b = handle("b", &log);
        let c = handle("c", &log);

        slots.set_triple(
            &NullGpu,
            FilterTriple {
                left: None,
                current: Some(a.clone()),
                right: Some(b.clone()),
            },
        );
        log.clear();

        slots.set_triple(
            &NullGpu,
            FilterTriple {
                left: Some(a),
                current: Some(b),
                right: Some(c),
            },
        );
        assert_eq!(
            log.entries(),
            vec![
                GpuCall::Dispose("a".into()),
                GpuCall::Dispose("b".into()),
                GpuCall::Init("a".into()),
                GpuCall::Resize("a".into(), 100, 50),
                GpuCall::Init("b".into()),
                GpuCall::Resize("b".into(), 100, 50),
                GpuCall::Init("c".into()),
                GpuCall::Resize("c".into(), 100, 50),
            ]
        );
    }

    #[test]
    fn identical_triple_is_a_no_op() {
        let (log, mut slots) = setup();
        let a = handle("a", &log);
        let t = FilterTriple {
            left: None,
            current: Some(a),
            right: None,
        };
        assert!(slots.set_triple(&NullGpu, t.clone()));
        log.clear();
        assert!(!slots.set_triple(&NullGpu, t));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn failed_init_leaves_slot_to_fallback() {
        let (log, mut slots) = setup();
        let bad = FilterHandle::new(RecordingFilter::failing("bad", log.clone()));
        slots.set_triple(
            &NullGpu,
            FilterTriple {
                left: None,
                current: Some(bad),
                right: None,
            },
        );
        assert!(slots.active().current.is_none());
        assert_eq!(slots.current_or_fallback().name(), "pass");
        assert!(!slots.is_empty());
    }

    #[test]
    fn empty_triple_disposes_everything() {
        let (log, mut slots) = setup();
        let a = handle("a", &log);
        slots.set_triple(
            &NullGpu,
            FilterTriple {
                left: None,
                current: Some(a),
                right: None,
            },
        );
        log.clear();
        slots.set_triple(&NullGpu, FilterTriple::empty());
        assert_eq!(log.entries(), vec![GpuCall::Dispose("a".into())]);
        assert!(slots.is_empty());
    }
}
