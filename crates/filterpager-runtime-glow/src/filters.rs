//! Single-pass fragment filters.
//!
//! Every filter samples `u_image` at `v_uv` and writes `o_color`. One optional float,
//! `u_amount`, parameterizes the built-ins.

use glow::HasContext;
use tracing::debug;

use filterpager_core::PagerError;
use filterpager_geometry::Quad;
use filterpager_runtime::Filter;

use crate::program::ShaderProgram;
use crate::quad::QuadMesh;

const PRELUDE: &str = r#"
in vec2 v_uv;
out vec4 o_color;
uniform sampler2D u_image;
uniform float u_amount;
"#;

pub const PASSTHROUGH_FRAG: &str = r#"
void main() {
    o_color = texture(u_image, v_uv);
}
"#;

pub const INVERT_FRAG: &str = r#"
void main() {
    vec4 c = texture(u_image, v_uv);
    o_color = vec4(1.0 - c.rgb, c.a);
}
"#;

pub const GRAYSCALE_FRAG: &str = r#"
const vec3 W = vec3(0.2125, 0.7154, 0.0721);
void main() {
    vec4 c = texture(u_image, v_uv);
    o_color = vec4(vec3(dot(c.rgb, W)), c.a);
}
"#;

pub const BRIGHTNESS_FRAG: &str = r#"
void main() {
    vec4 c = texture(u_image, v_uv);
    o_color = vec4(c.rgb + vec3(u_amount), c.a);
}
"#;

pub const CONTRAST_FRAG: &str = r#"
void main() {
    vec4 c = texture(u_image, v_uv);
    o_color = vec4((c.rgb - vec3(0.5)) * u_amount + vec3(0.5), c.a);
}
"#;

/// Rotates chroma in YIQ space by `u_amount` radians.
pub const HUE_FRAG: &str = r#"
const mat3 TO_YIQ = mat3(0.299, 0.596, 0.211, 0.587, -0.274, -0.523, 0.114, -0.322, 0.312);
const mat3 TO_RGB = mat3(1.0, 1.0, 1.0, 0.956, -0.272, -1.106, 0.621, -0.647, 1.703);
void main() {
    vec4 c = texture(u_image, v_uv);
    vec3 yiq = TO_YIQ * c.rgb;
    float hue = atan(yiq.z, yiq.y) + u_amount;
    float chroma = length(yiq.yz);
    yiq.yz = chroma * vec2(cos(hue), sin(hue));
    o_color = vec4(TO_RGB * yiq, c.a);
}
"#;

#[derive(Debug)]
struct Gpu {
    program: ShaderProgram,
    mesh: QuadMesh,
}

/// A filter built from one fragment body.
#[derive(Debug)]
pub struct ShaderFilter {
    name: String,
    frag_body: String,
    amount: f32,
    gpu: Option<Gpu>,
}

impl ShaderFilter {
    /// `frag_body` must define `main`; the shared declarations are prepended.
    pub fn custom(name: impl Into<String>, frag_body: impl Into<String>, amount: f32) -> Self {
        Self {
            name: name.into(),
            frag_body: frag_body.into(),
            amount,
            gpu: None,
        }
    }

    pub fn passthrough() -> Self {
        Self::custom("passthrough", PASSTHROUGH_FRAG, 0.0)
    }

    pub fn invert() -> Self {
        Self::custom("invert", INVERT_FRAG, 0.0)
    }

    pub fn grayscale() -> Self {
        Self::custom("grayscale", GRAYSCALE_FRAG, 0.0)
    }

    /// `amount` in `[-1, 1]` is added to every channel.
    pub fn brightness(amount: f32) -> Self {
        Self::custom(format!("brightness({amount})"), BRIGHTNESS_FRAG, amount)
    }

    /// `1.0` leaves the image unchanged.
    pub fn contrast(amount: f32) -> Self {
        Self::custom(format!("contrast({amount})"), CONTRAST_FRAG, amount)
    }

    pub fn hue(degrees: f32) -> Self {
        Self::custom(format!("hue({degrees})"), HUE_FRAG, degrees.to_radians())
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }
}

impl Filter<glow::Context> for ShaderFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, gl: &glow::Context) -> Result<(), PagerError> {
        if self.gpu.is_some() {
            return Ok(());
        }
        let frag = format!("{PRELUDE}{}", self.frag_body);
        unsafe {
            let mut program = ShaderProgram::new(gl, &frag)?;
            let mesh = match QuadMesh::new(gl) {
                Ok(m) => m,
                Err(e) => {
                    program.destroy(gl);
                    return Err(e);
                }
            };
            self.gpu = Some(Gpu { program, mesh });
        }
        debug!(filter = %self.name, "filter initialized");
        Ok(())
    }

    fn on_output_size_changed(&mut self, _gl: &glow::Context, _width: i32, _height: i32) {}

    fn render(
        &mut self,
        gl: &glow::Context,
        source: Option<glow::NativeTexture>,
        cube: &Quad,
        tex: &Quad,
    ) {
        let (Some(gpu), Some(source)) = (&self.gpu, source) else {
            return;
        };
        unsafe {
            gl.use_program(Some(gpu.program.program));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(source));
            gl.uniform_1_i32(gpu.program.u_image.as_ref(), 0);
            gl.uniform_1_f32(gpu.program.u_amount.as_ref(), self.amount);

            gpu.mesh.draw(gl, cube, tex);

            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }

    fn dispose(&mut self, gl: &glow::Context) {
        if let Some(mut gpu) = self.gpu.take() {
            unsafe {
                gpu.mesh.destroy(gl);
                gpu.program.destroy(gl);
            }
            debug!(filter = %self.name, "filter disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_carry_their_parameter() {
        assert_eq!(ShaderFilter::brightness(-0.5).amount(), -0.5);
        assert_eq!(ShaderFilter::contrast(1.5).amount(), 1.5);
        assert!((ShaderFilter::hue(180.0).amount() - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(ShaderFilter::invert().name(), "invert");
        assert!(!ShaderFilter::grayscale().is_initialized());
    }

    #[test]
    fn bodies_define_main_and_use_the_prelude_names() {
        for body in [
            PASSTHROUGH_FRAG,
            INVERT_FRAG,
            GRAYSCALE_FRAG,
            BRIGHTNESS_FRAG,
            CONTRAST_FRAG,
            HUE_FRAG,
        ] {
            assert!(body.contains("void main()"));
            assert!(body.contains("o_color"));
            assert!(body.contains("texture(u_image, v_uv)"));
        }
    }
}
