use std::fmt;
use std::path::PathBuf;

/// Errors shared by the filterpager crates.
///
/// Lives in `filterpager-core` so the runtime and controller crates can re-export it.
#[derive(Debug)]
pub enum PagerError {
    // ---- Config (SDK-level) ----
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    InvalidConfig {
        path: PathBuf,
        msg: String,
    },

    // ---- Render backend ----
    VertexCompile(String),
    FragmentCompile(String),
    Link(String),
    GlCreate(String),
    /// The GPU context cannot run the pager (version or limits).
    Unsupported(String),

    // ---- Image input ----
    Image(String),

    // ---- Fallback ----
    Other(String),
}

impl PagerError {
    pub fn other<T: Into<String>>(s: T) -> Self {
        PagerError::Other(s.into())
    }
}

impl fmt::Display for PagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagerError::Io { path, source } => {
                write!(f, "io error at {}: {}", path.display(), source)
            }
            PagerError::Json { path, source } => {
                write!(f, "json parse error at {}: {}", path.display(), source)
            }
            PagerError::InvalidConfig { path, msg } => {
                write!(f, "invalid config at {}: {}", path.display(), msg)
            }

            PagerError::VertexCompile(msg) => write!(f, "vertex shader compile error: {msg}"),
            PagerError::FragmentCompile(msg) => write!(f, "fragment shader compile error: {msg}"),
            PagerError::Link(msg) => write!(f, "program link error: {msg}"),
            PagerError::GlCreate(msg) => write!(f, "backend object creation failed: {msg}"),
            PagerError::Unsupported(msg) => write!(f, "unsupported gpu context: {msg}"),

            PagerError::Image(msg) => write!(f, "image error: {msg}"),

            PagerError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PagerError::Io { source, .. } => Some(source),
            PagerError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
