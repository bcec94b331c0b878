use glow::HasContext;

use filterpager_core::PagerError;
use filterpager_geometry::Quad;

const FLOATS: usize = 16;

/// Interleaves four `(x, y)` positions with four `(u, v)` coordinates for a triangle strip.
pub fn interleave(cube: &Quad, tex: &Quad) -> [f32; FLOATS] {
    let mut out = [0.0; FLOATS];
    for i in 0..4 {
        out[i * 4] = cube[i * 2];
        out[i * 4 + 1] = cube[i * 2 + 1];
        out[i * 4 + 2] = tex[i * 2];
        out[i * 4 + 3] = tex[i * 2 + 1];
    }
    out
}

/// A four-vertex strip whose vertices are rewritten on every draw.
#[derive(Debug)]
pub struct QuadMesh {
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
}

impl QuadMesh {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, PagerError> {
        let vao = gl
            .create_vertex_array()
            .map_err(|e| PagerError::GlCreate(format!("create_vertex_array: {e}")))?;
        let vbo = gl
            .create_buffer()
            .map_err(|e| PagerError::GlCreate(format!("create_buffer: {e}")))?;

        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_size(
            glow::ARRAY_BUFFER,
            (FLOATS * core::mem::size_of::<f32>()) as i32,
            glow::DYNAMIC_DRAW,
        );

        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, 4 * 4, 0);

        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 4 * 4, 2 * 4);

        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);

        Ok(Self { vao, vbo })
    }

    pub unsafe fn draw(&self, gl: &glow::Context, cube: &Quad, tex: &Quad) {
        let verts = interleave(cube, tex);
        gl.bind_vertex_array(Some(self.vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, bytemuck::cast_slice(&verts));
        gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_vertex_array(self.vao);
        gl.delete_buffer(self.vbo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterpager_geometry::{CUBE, TEXTURE_NO_ROTATION};

    #[test]
    fn interleave_pairs_position_with_uv() {
        let v = interleave(&CUBE, &TEXTURE_NO_ROTATION);
        assert_eq!(&v[0..4], &[CUBE[0], CUBE[1], TEXTURE_NO_ROTATION[0], TEXTURE_NO_ROTATION[1]]);
        assert_eq!(
            &v[12..16],
            &[CUBE[6], CUBE[7], TEXTURE_NO_ROTATION[6], TEXTURE_NO_ROTATION[7]]
        );
    }
}
