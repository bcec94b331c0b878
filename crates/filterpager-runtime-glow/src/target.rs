use glow::HasContext;

use filterpager_core::PagerError;
use filterpager_runtime::CompositeSurface;

/// Offscreen render target (FBO + color texture).
#[derive(Debug)]
pub struct RenderTarget {
    pub fbo: glow::NativeFramebuffer,
    pub tex: glow::NativeTexture,
    pub w: i32,
    pub h: i32,
}

impl RenderTarget {
    /// Reallocates the texture storage. Keeps the same FBO/texture ids.
    pub unsafe fn resize(&mut self, gl: &glow::Context, w: i32, h: i32) {
        self.w = w.max(1);
        self.h = h.max(1);
        gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            self.w,
            self.h,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            None,
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_framebuffer(self.fbo);
        gl.delete_texture(self.tex);
    }
}

pub unsafe fn create_render_target(
    gl: &glow::Context,
    w: i32,
    h: i32,
) -> Result<RenderTarget, PagerError> {
    let fbo = gl
        .create_framebuffer()
        .map_err(|e| PagerError::GlCreate(format!("create_framebuffer failed: {e:?}")))?;
    let tex = gl
        .create_texture()
        .map_err(|e| PagerError::GlCreate(format!("create_texture failed: {e:?}")))?;

    gl.bind_texture(glow::TEXTURE_2D, Some(tex));
    set_linear_clamp(gl);

    let ww = w.max(1);
    let hh = h.max(1);
    gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        glow::RGBA8 as i32,
        ww,
        hh,
        0,
        glow::RGBA,
        glow::UNSIGNED_BYTE,
        None,
    );

    gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
    gl.framebuffer_texture_2d(
        glow::FRAMEBUFFER,
        glow::COLOR_ATTACHMENT0,
        glow::TEXTURE_2D,
        Some(tex),
        0,
    );

    let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
    if status != glow::FRAMEBUFFER_COMPLETE {
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.bind_texture(glow::TEXTURE_2D, None);
        gl.delete_framebuffer(fbo);
        gl.delete_texture(tex);
        return Err(PagerError::GlCreate(format!(
            "framebuffer incomplete: 0x{status:x}"
        )));
    }

    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    gl.bind_texture(glow::TEXTURE_2D, None);

    Ok(RenderTarget {
        fbo,
        tex,
        w: ww,
        h: hh,
    })
}

/// Linear filtering, clamped edges, on the texture bound to `TEXTURE_2D`.
pub(crate) unsafe fn set_linear_clamp(gl: &glow::Context) {
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
}

/// The intermediate target of the first composite pass plus the screen it resolves to.
///
/// The target is created on the first surface size and resized in place afterwards. It is
/// cleared to transparent; the screen pass blends over the background so uncovered areas
/// (letterbox bars) show the background color.
#[derive(Debug, Default)]
pub struct OffscreenTarget {
    target: Option<RenderTarget>,
    screen: (i32, i32),
}

impl OffscreenTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    pub unsafe fn resize(&mut self, gl: &glow::Context, w: i32, h: i32) -> Result<(), PagerError> {
        self.screen = (w, h);
        match &mut self.target {
            Some(t) => t.resize(gl, w, h),
            None => self.target = Some(create_render_target(gl, w, h)?),
        }
        Ok(())
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        if let Some(mut t) = self.target.take() {
            t.destroy(gl);
        }
    }
}

impl CompositeSurface<glow::Context> for OffscreenTarget {
    fn offscreen_texture(&self) -> Option<glow::NativeTexture> {
        self.target.as_ref().map(|t| t.tex)
    }

    fn bind_offscreen(&mut self, gl: &glow::Context) {
        let Some(t) = &self.target else {
            return;
        };
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(t.fbo));
            gl.viewport(0, 0, t.w, t.h);
            gl.disable(glow::BLEND);
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn bind_screen(&mut self, gl: &glow::Context) {
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.viewport(0, 0, self.screen.0, self.screen.1);
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        }
    }
}
