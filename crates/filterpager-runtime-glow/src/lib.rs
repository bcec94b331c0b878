//! filterpager runtime (glow/OpenGL backend)
//
// Only the GPU side lives here:
// - compile/link filter programs
// - the offscreen target of the first composite pass
// - source image upload
// - the per-frame renderer that drains the pager's render link
//
// Windowing and event translation belong to the host.
#![allow(clippy::missing_safety_doc)]

pub mod filters;
pub mod program;
pub mod quad;
pub mod renderer;
pub mod target;
pub mod texture;

pub use filterpager_core::PagerError;

pub use filters::ShaderFilter;
pub use program::{compile_program, shader_header, ShaderProgram, FILTER_VERT};
pub use quad::QuadMesh;
pub use renderer::{check_caps, query_caps, GlCaps, PagerRenderer};
pub use target::{create_render_target, OffscreenTarget, RenderTarget};
pub use texture::ImageTexture;
