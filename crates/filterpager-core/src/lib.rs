#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod events;

// ---- Stable re-exports ----
pub use error::PagerError;

pub use config::{load_pager_config_from, PagerConfig, ScaleType};
pub use events::{InputEvent, Pointer, TouchKind};
