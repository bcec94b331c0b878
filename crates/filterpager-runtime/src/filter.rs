use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use filterpager_core::PagerError;
use filterpager_geometry::Quad;

use crate::GpuContext;

/// An image filter that can draw a source texture into the bound framebuffer.
///
/// All methods run on the GPU-owning thread. `initialize` and `dispose` may be called
/// repeatedly on the same filter as it moves in and out of the active triple.
pub trait Filter<C: GpuContext>: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self, ctx: &C) -> Result<(), PagerError>;

    fn on_output_size_changed(&mut self, ctx: &C, width: i32, height: i32);

    /// Draws `source` through this filter. `None` means no image is loaded; filters are
    /// expected to draw nothing in that case.
    fn render(&mut self, ctx: &C, source: Option<C::Texture>, cube: &Quad, tex: &Quad);

    fn dispose(&mut self, ctx: &C);
}

/// Shared, reference-counted filter. Identity is by allocation, not by value.
pub struct FilterHandle<C: GpuContext> {
    inner: Arc<Mutex<dyn Filter<C>>>,
    name: Arc<str>,
}

impl<C: GpuContext> FilterHandle<C> {
    pub fn new<F: Filter<C> + 'static>(filter: F) -> Self {
        let name: Arc<str> = Arc::from(filter.name());
        Self {
            inner: Arc::new(Mutex::new(filter)),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }

    /// Runs `f` with exclusive access to the filter.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn Filter<C>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

impl<C: GpuContext> Clone for FilterHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            name: Arc::clone(&self.name),
        }
    }
}

impl<C: GpuContext> fmt::Debug for FilterHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FilterHandle").field(&self.name).finish()
    }
}

fn same_slot<C: GpuContext>(a: &Option<FilterHandle<C>>, b: &Option<FilterHandle<C>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// Left neighbor, current page and right neighbor. Absent at sequence boundaries.
pub struct FilterTriple<C: GpuContext> {
    pub left: Option<FilterHandle<C>>,
    pub current: Option<FilterHandle<C>>,
    pub right: Option<FilterHandle<C>>,
}

impl<C: GpuContext> FilterTriple<C> {
    pub fn empty() -> Self {
        Self {
            left: None,
            current: None,
            right: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.current.is_none() && self.right.is_none()
    }

    /// True when every slot holds the same filter (by reference) as `other`.
    pub fn same_as(&self, other: &Self) -> bool {
        same_slot(&self.left, &other.left)
            && same_slot(&self.current, &other.current)
            && same_slot(&self.right, &other.right)
    }

    /// Present filters, each distinct allocation once, in left/current/right order.
    pub fn distinct(&self) -> Vec<&FilterHandle<C>> {
        let mut out: Vec<&FilterHandle<C>> = Vec::with_capacity(3);
        for h in [&self.left, &self.current, &self.right].into_iter().flatten() {
            if !out.iter().any(|seen| seen.ptr_eq(h)) {
                out.push(h);
            }
        }
        out
    }
}

impl<C: GpuContext> Default for FilterTriple<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: GpuContext> Clone for FilterTriple<C> {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            current: self.current.clone(),
            right: self.right.clone(),
        }
    }
}

impl<C: GpuContext> fmt::Debug for FilterTriple<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |h: &Option<FilterHandle<C>>| h.as_ref().map(|h| h.name().to_string());
        f.debug_struct("FilterTriple")
            .field("left", &name(&self.left))
            .field("current", &name(&self.current))
            .field("right", &name(&self.right))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, NullGpu, RecordingFilter};

    fn handle(name: &str) -> FilterHandle<NullGpu> {
        FilterHandle::new(RecordingFilter::new(name, CallLog::default()))
    }

    #[test]
    fn identity_is_by_reference() {
        let a = handle("a");
        let a2 = a.clone();
        let b = handle("a");
        assert!(a.ptr_eq(&a2));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn distinct_skips_repeated_handles() {
        let a = handle("a");
        let t = FilterTriple {
            left: Some(a.clone()),
            current: Some(a.clone()),
            right: None,
        };
        assert_eq!(t.distinct().len(), 1);
        assert!(!t.is_empty());
        assert!(FilterTriple::<NullGpu>::empty().is_empty());
    }

    #[test]
    fn same_as_compares_slots() {
        let a = handle("a");
        let b = handle("b");
        let t1 = FilterTriple {
            left: None,
            current: Some(a.clone()),
            right: Some(b.clone()),
        };
        let t2 = t1.clone();
        assert!(t1.same_as(&t2));
        let t3 = FilterTriple {
            left: None,
            current: Some(b),
            right: Some(a),
        };
        assert!(!t1.same_as(&t3));
    }
}
