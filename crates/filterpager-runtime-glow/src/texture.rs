use glow::HasContext;

use filterpager_core::PagerError;
use filterpager_runtime::Bitmap;

use crate::target::set_linear_clamp;

/// The source image on the GPU. `width`/`height` are the decoded size; the upload itself
/// may carry one extra padding column.
#[derive(Debug)]
pub struct ImageTexture {
    pub tex: glow::NativeTexture,
    pub width: i32,
    pub height: i32,
}

impl ImageTexture {
    pub unsafe fn upload(gl: &glow::Context, bitmap: Bitmap) -> Result<Self, PagerError> {
        let (width, height) = (bitmap.width() as i32, bitmap.height() as i32);
        let padded = bitmap.padded_to_even_width();

        let tex = gl
            .create_texture()
            .map_err(|e| PagerError::GlCreate(format!("create_texture failed: {e:?}")))?;
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        set_linear_clamp(gl);
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            padded.width() as i32,
            padded.height() as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            Some(padded.pixels()),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);

        Ok(Self { tex, width, height })
    }

    pub unsafe fn destroy(self, gl: &glow::Context) {
        gl.delete_texture(self.tex);
    }
}
