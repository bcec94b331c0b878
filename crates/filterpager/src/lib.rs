#![forbid(unsafe_code)]

//! Swipe between GPU image filters.
//!
//! [`Pager`] is the input-side controller: it owns the page list, turns touch events into a
//! scroll position and queues filter swaps and split updates for the render thread through
//! a shared [`RenderLink`]. A backend such as `filterpager-runtime-glow` drains that link
//! once per frame.
//!
//! ```ignore
//! let link = Arc::new(RenderLink::new());
//! let mut pager = Pager::new(PagerConfig::default(), Arc::clone(&link), surface);
//! pager.set_pages(filters);
//! pager.on_layout(width, height);
//! pager.on_touch(&InputEvent::down(x, y, pager.now()));
//! ```
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod clock;
pub mod loader;
pub mod page;
pub mod pager;

pub use filterpager_core::{
    load_pager_config_from, InputEvent, PagerConfig, PagerError, Pointer, ScaleType, TouchKind,
};
pub use filterpager_geometry::Rotation;
pub use filterpager_physics::ScrollMode;
pub use filterpager_runtime::{Bitmap, Filter, FilterHandle, GpuContext, PixelFormat, RenderLink};

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use loader::{ImageSource, LoadError, LoadOutcome};
pub use page::{Page, PageList};
pub use pager::Pager;

/// Asks the host to draw a frame soon. Called from the input thread and from image loaders.
pub trait RenderSurface: Send + Sync {
    fn request_render(&self);
}

impl<F> RenderSurface for F
where
    F: Fn() + Send + Sync,
{
    fn request_render(&self) {
        self()
    }
}
