use glow::HasContext;

use filterpager_core::PagerError;

/// Version line (and default precision on GLES) for shaders built on `gl`.
pub fn shader_header(gl: &glow::Context) -> &'static str {
    if gl.version().is_embedded {
        "#version 300 es\nprecision mediump float;\n"
    } else {
        "#version 330 core\n"
    }
}

/// Vertex stage shared by every filter. Attribute 0 is the position, 1 the texture coordinate.
pub const FILTER_VERT: &str = r#"
layout (location = 0) in vec2 a_pos;
layout (location = 1) in vec2 a_uv;
out vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
"#;

pub unsafe fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, PagerError> {
    let vs = gl
        .create_shader(glow::VERTEX_SHADER)
        .map_err(|e| PagerError::GlCreate(format!("create_shader(VS) failed: {e:?}")))?;
    gl.shader_source(vs, vert_src);
    gl.compile_shader(vs);
    if !gl.get_shader_compile_status(vs) {
        let log = gl.get_shader_info_log(vs);
        gl.delete_shader(vs);
        return Err(PagerError::VertexCompile(log));
    }

    let fs = gl
        .create_shader(glow::FRAGMENT_SHADER)
        .map_err(|e| PagerError::GlCreate(format!("create_shader(FS) failed: {e:?}")))?;
    gl.shader_source(fs, frag_src);
    gl.compile_shader(fs);
    if !gl.get_shader_compile_status(fs) {
        let log = gl.get_shader_info_log(fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        return Err(PagerError::FragmentCompile(log));
    }

    let program = gl
        .create_program()
        .map_err(|e| PagerError::GlCreate(format!("create_program failed: {e:?}")))?;
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(PagerError::Link(log));
    }

    Ok(program)
}

/// A linked filter program with the uniforms every filter shares.
#[derive(Debug)]
pub struct ShaderProgram {
    pub program: glow::NativeProgram,
    pub u_image: Option<glow::NativeUniformLocation>,
    pub u_amount: Option<glow::NativeUniformLocation>,
}

impl ShaderProgram {
    /// Builds a filter program from a fragment body; the version header and the shared
    /// vertex stage are added here.
    pub unsafe fn new(gl: &glow::Context, frag_body: &str) -> Result<Self, PagerError> {
        let header = shader_header(gl);
        let vert = format!("{header}{FILTER_VERT}");
        let frag = format!("{header}{frag_body}");
        let program = compile_program(gl, &vert, &frag)?;
        Ok(Self {
            program,
            u_image: gl.get_uniform_location(program, "u_image"),
            u_amount: gl.get_uniform_location(program, "u_amount"),
        })
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_program(self.program);
    }
}
