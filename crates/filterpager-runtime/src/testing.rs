//! GL-free stand-ins for tests: a context type, an offscreen surface and a filter that
//! record what the compositor and slot manager ask of them.

use std::sync::{Arc, Mutex, PoisonError};

use filterpager_core::PagerError;
use filterpager_geometry::{HalfQuads, Quad};

use crate::compositor::CompositeSurface;
use crate::filter::Filter;
use crate::GpuContext;

/// Context whose textures are plain integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullGpu;

impl GpuContext for NullGpu {
    type Texture = u32;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    Init(String),
    Resize(String, i32, i32),
    Render {
        filter: String,
        source: Option<u32>,
        cube: Quad,
        tex: Quad,
    },
    Dispose(String),
    BindOffscreen,
    BindScreen,
}

impl GpuCall {
    pub fn render(filter: &str, source: Option<u32>, half: &HalfQuads) -> Self {
        GpuCall::Render {
            filter: filter.to_string(),
            source,
            cube: half.cube,
            tex: half.tex,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<GpuCall>>>);

impl CallLog {
    pub fn push(&self, call: GpuCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn entries(&self) -> Vec<GpuCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Filter names of every render call, in order.
    pub fn render_names(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|c| match c {
                GpuCall::Render { filter, .. } => Some(filter),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &GpuCall) -> usize {
        self.entries().iter().filter(|c| *c == call).count()
    }
}

#[derive(Debug)]
pub struct RecordingFilter {
    name: String,
    log: CallLog,
    fail_init: bool,
}

impl RecordingFilter {
    pub fn new(name: &str, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail_init: false,
        }
    }

    /// A filter whose `initialize` always fails.
    pub fn failing(name: &str, log: CallLog) -> Self {
        Self {
            fail_init: true,
            ..Self::new(name, log)
        }
    }
}

impl Filter<NullGpu> for RecordingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, _ctx: &NullGpu) -> Result<(), PagerError> {
        self.log.push(GpuCall::Init(self.name.clone()));
        if self.fail_init {
            return Err(PagerError::FragmentCompile(format!("{} is broken", self.name)));
        }
        Ok(())
    }

    fn on_output_size_changed(&mut self, _ctx: &NullGpu, width: i32, height: i32) {
        self.log
            .push(GpuCall::Resize(self.name.clone(), width, height));
    }

    fn render(&mut self, _ctx: &NullGpu, source: Option<u32>, cube: &Quad, tex: &Quad) {
        self.log.push(GpuCall::Render {
            filter: self.name.clone(),
            source,
            cube: *cube,
            tex: *tex,
        });
    }

    fn dispose(&mut self, _ctx: &NullGpu) {
        self.log.push(GpuCall::Dispose(self.name.clone()));
    }
}

/// Offscreen surface that only records binds.
#[derive(Debug)]
pub struct NullSurface {
    log: CallLog,
    texture: Option<u32>,
}

impl NullSurface {
    pub fn new(log: CallLog, texture: Option<u32>) -> Self {
        Self { log, texture }
    }
}

impl CompositeSurface<NullGpu> for NullSurface {
    fn offscreen_texture(&self) -> Option<u32> {
        self.texture
    }

    fn bind_offscreen(&mut self, _ctx: &NullGpu) {
        self.log.push(GpuCall::BindOffscreen);
    }

    fn bind_screen(&mut self, _ctx: &NullGpu) {
        self.log.push(GpuCall::BindScreen);
    }
}
