//! winit + glutin host glue for filterpager.
//
// The pager and renderer know nothing about windows. This crate supplies:
// - a window with a current GL context (`GlWindow`)
// - mouse/touch translation into pager input (`PointerTranslator`)
// - a `RenderSurface` that wakes the winit loop (`ProxySurface`)

pub mod gl;
pub mod input;
pub mod surface;

pub use gl::GlWindow;
pub use input::{PointerTranslator, MOUSE_POINTER};
pub use surface::{ProxySurface, RedrawRequest};
