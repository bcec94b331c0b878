#![forbid(unsafe_code)]

//! Backend-agnostic render side of the pager.
//!
//! Defines the filter capability, the left/current/right slot manager, the two-pass
//! composite sequence and the queues that carry work to the GPU-owning thread. Backends
//! (see `filterpager-runtime-glow`) supply the context type and the offscreen surface.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

use std::fmt;

pub mod compositor;
pub mod filter;
pub mod image;
pub mod link;
pub mod queue;
pub mod slots;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use filterpager_core::PagerError;

pub use compositor::{composite_frame, CompositeSurface, DragDirection};
pub use filter::{Filter, FilterHandle, FilterTriple};
pub use image::{Bitmap, PixelFormat};
pub use link::{RenderCommand, RenderLink, RenderTask};
pub use queue::RenderQueue;
pub use slots::FilterSlots;

/// The GPU API a renderer runs on. Only the texture handle type is needed here.
pub trait GpuContext: 'static {
    type Texture: Copy + PartialEq + fmt::Debug + Send + 'static;
}

#[cfg(feature = "glow")]
impl GpuContext for glow::Context {
    type Texture = glow::NativeTexture;
}
