use std::sync::Arc;

use glow::HasContext;
use tracing::{debug, info, trace, warn};

use filterpager_core::PagerError;
use filterpager_geometry::{compute_buffers, GeometryBuffers, GeometryParams};
use filterpager_runtime::{
    composite_frame, DragDirection, FilterHandle, FilterSlots, RenderCommand, RenderLink,
};

use crate::filters::ShaderFilter;
use crate::target::OffscreenTarget;
use crate::texture::ImageTexture;

// -------------------------------------------------------------------------------------------------
// Capabilities
// -------------------------------------------------------------------------------------------------

/// What the context offers, checked once when the renderer is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlCaps {
    pub major: u32,
    pub minor: u32,
    pub embedded: bool,
    pub max_texture_size: i32,
}

/// Desktop GL 3.3 or GLES 3.0 is required, with a usable texture size limit.
pub fn check_caps(
    major: u32,
    minor: u32,
    embedded: bool,
    max_texture_size: i32,
) -> Result<GlCaps, PagerError> {
    let (need_major, need_minor) = if embedded { (3, 0) } else { (3, 3) };
    if (major, minor) < (need_major, need_minor) {
        let api = if embedded { "OpenGL ES" } else { "OpenGL" };
        return Err(PagerError::Unsupported(format!(
            "{api} {major}.{minor} found, {need_major}.{need_minor} required"
        )));
    }
    if max_texture_size <= 0 {
        return Err(PagerError::Unsupported(format!(
            "invalid MAX_TEXTURE_SIZE {max_texture_size}"
        )));
    }
    Ok(GlCaps {
        major,
        minor,
        embedded,
        max_texture_size,
    })
}

pub unsafe fn query_caps(gl: &glow::Context) -> Result<GlCaps, PagerError> {
    let v = gl.version();
    let max_texture_size = gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE);
    check_caps(v.major, v.minor, v.is_embedded, max_texture_size)
}

// -------------------------------------------------------------------------------------------------
// Renderer
// -------------------------------------------------------------------------------------------------

/// Render-thread half of the pager.
///
/// The host calls [`PagerRenderer::on_surface_changed`] whenever the drawable is created or
/// resized and [`PagerRenderer::draw_frame`] whenever a render was requested. All filter
/// lifecycle calls happen inside those two.
#[derive(Debug)]
pub struct PagerRenderer {
    link: Arc<RenderLink<glow::Context>>,
    slots: FilterSlots<glow::Context>,
    target: OffscreenTarget,
    image: Option<ImageTexture>,

    params: GeometryParams,
    geometry: GeometryBuffers,
    geometry_dirty: bool,
    direction: DragDirection,
    background: [f32; 3],

    caps: GlCaps,
    frames: u64,
}

impl PagerRenderer {
    /// Fails with [`PagerError::Unsupported`] on contexts older than GL 3.3 / GLES 3.0.
    pub unsafe fn new(
        gl: &glow::Context,
        link: Arc<RenderLink<glow::Context>>,
    ) -> Result<Self, PagerError> {
        let caps = query_caps(gl)?;
        info!(
            major = caps.major,
            minor = caps.minor,
            embedded = caps.embedded,
            max_texture_size = caps.max_texture_size,
            "gl context"
        );

        let slots = FilterSlots::new(gl, FilterHandle::new(ShaderFilter::passthrough()))?;
        gl.disable(glow::DEPTH_TEST);

        Ok(Self {
            link,
            slots,
            target: OffscreenTarget::new(),
            image: None,
            params: GeometryParams::default(),
            geometry: GeometryBuffers::default(),
            geometry_dirty: true,
            direction: DragDirection::default(),
            background: [0.0, 0.0, 0.0],
            caps,
            frames: 0,
        })
    }

    pub fn caps(&self) -> GlCaps {
        self.caps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// (Re)creates the offscreen target at the new size and wakes image loads waiting for it.
    pub unsafe fn on_surface_changed(
        &mut self,
        gl: &glow::Context,
        width: i32,
        height: i32,
    ) -> Result<(), PagerError> {
        debug!(width, height, "surface changed");
        self.target.resize(gl, width, height)?;
        self.slots.resize(gl, width, height);
        gl.viewport(0, 0, width, height);

        self.params.output_width = width;
        self.params.output_height = height;
        self.geometry_dirty = true;

        self.link.publish_surface_size(width, height);
        Ok(())
    }

    /// Applies queued commands, draws one frame and runs the after-draw tasks. Returns
    /// whether any filter was drawn; otherwise only the background is visible.
    pub unsafe fn draw_frame(&mut self, gl: &glow::Context) -> bool {
        for cmd in self.link.drain_commands() {
            self.apply(gl, cmd);
        }
        if self.geometry_dirty {
            self.geometry = compute_buffers(&self.params);
            self.geometry_dirty = false;
        }

        let (w, h) = self.target.screen_size();
        let [r, g, b] = self.background;
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.viewport(0, 0, w, h);
        gl.clear_color(r, g, b, 1.0);
        gl.clear(glow::COLOR_BUFFER_BIT);

        let drew = match &self.image {
            Some(img) => composite_frame(
                gl,
                &mut self.target,
                &self.slots,
                &self.geometry,
                self.direction,
                Some(img.tex),
            ),
            None => false,
        };
        gl.disable(glow::BLEND);

        for task in self.link.drain_after_draw() {
            task(gl);
        }
        self.frames += 1;
        drew
    }

    unsafe fn apply(&mut self, gl: &glow::Context, cmd: RenderCommand<glow::Context>) {
        trace!(?cmd, "render command");
        match cmd {
            RenderCommand::SetTriple(triple) => {
                self.slots.set_triple(gl, triple);
            }
            RenderCommand::SetSplit {
                split_px,
                drag_to_left,
            } => {
                self.params.split_px = split_px;
                self.direction = DragDirection::from_drag_to_left(drag_to_left);
                self.geometry_dirty = true;
            }
            RenderCommand::SetScaleType(scale_type) => {
                self.params.scale_type = scale_type;
                self.geometry_dirty = true;
            }
            RenderCommand::SetRotation {
                rotation,
                flip_horizontal,
                flip_vertical,
            } => {
                self.params.rotation = rotation;
                self.params.flip_horizontal = flip_horizontal;
                self.params.flip_vertical = flip_vertical;
                self.geometry_dirty = true;
            }
            RenderCommand::SetBackground(rgb) => {
                self.background = rgb;
            }
            RenderCommand::SetImage(bitmap) => {
                let max = self.caps.max_texture_size as u32;
                if bitmap.width() + bitmap.width() % 2 > max || bitmap.height() > max {
                    warn!(
                        width = bitmap.width(),
                        height = bitmap.height(),
                        max,
                        "image exceeds MAX_TEXTURE_SIZE, dropped"
                    );
                    return;
                }
                match ImageTexture::upload(gl, bitmap) {
                    Ok(tex) => {
                        self.params.image_width = tex.width;
                        self.params.image_height = tex.height;
                        if let Some(old) = self.image.replace(tex) {
                            old.destroy(gl);
                        }
                        self.geometry_dirty = true;
                    }
                    Err(e) => warn!(error = %e, "image upload failed"),
                }
            }
            RenderCommand::DeleteImage => {
                if let Some(old) = self.image.take() {
                    old.destroy(gl);
                }
                self.params.image_width = 0;
                self.params.image_height = 0;
                self.geometry_dirty = true;
            }
        }
    }

    /// Releases every GL object the renderer owns, including the filters.
    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.slots.dispose_all(gl);
        if let Some(img) = self.image.take() {
            img.destroy(gl);
        }
        self.target.destroy(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_needs_3_3() {
        assert!(check_caps(3, 3, false, 4096).is_ok());
        assert!(check_caps(4, 1, false, 4096).is_ok());
        let err = check_caps(3, 2, false, 4096).expect_err("3.2 is too old");
        assert!(matches!(err, PagerError::Unsupported(_)));
    }

    #[test]
    fn gles_needs_3_0() {
        assert!(check_caps(3, 0, true, 2048).is_ok());
        assert!(check_caps(2, 0, true, 2048).is_err());
    }

    #[test]
    fn texture_limit_must_be_positive() {
        assert!(matches!(
            check_caps(4, 6, false, 0),
            Err(PagerError::Unsupported(msg)) if msg.contains("MAX_TEXTURE_SIZE")
        ));
    }
}
