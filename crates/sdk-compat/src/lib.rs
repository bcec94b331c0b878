//! Compile-only compatibility crate.
//!
//! Keeps the public pager surface usable by third-party consumers that bring their own
//! GPU backend. It is not shipped or run; it must only build.

use std::sync::Arc;

use filterpager::{Filter, FilterHandle, GpuContext, Pager, PagerConfig, PagerError, RenderLink};
use filterpager_geometry::{compute_buffers, GeometryParams, Quad, Rotation};
use filterpager_physics::ScrollMode;
use filterpager_runtime::{FilterTriple, RenderCommand};

/// A backend defined outside the workspace.
struct ThirdPartyGpu;

impl GpuContext for ThirdPartyGpu {
    type Texture = u64;
}

struct NoopFilter;

impl Filter<ThirdPartyGpu> for NoopFilter {
    fn name(&self) -> &str {
        "noop"
    }

    fn initialize(&mut self, _ctx: &ThirdPartyGpu) -> Result<(), PagerError> {
        Ok(())
    }

    fn on_output_size_changed(&mut self, _ctx: &ThirdPartyGpu, _width: i32, _height: i32) {}

    fn render(&mut self, _ctx: &ThirdPartyGpu, _source: Option<u64>, _cube: &Quad, _tex: &Quad) {}

    fn dispose(&mut self, _ctx: &ThirdPartyGpu) {}
}

#[allow(dead_code)]
pub fn _compile_witness() {
    // The controller is generic over the backend and needs only a link and a wake-up hook.
    let link: Arc<RenderLink<ThirdPartyGpu>> = Arc::new(RenderLink::new());
    let mut pager = Pager::new(PagerConfig::default(), Arc::clone(&link), Arc::new(|| {}));
    pager.set_pages(vec![FilterHandle::new(NoopFilter), FilterHandle::new(NoopFilter)]);
    pager.on_layout(640, 480);
    pager.set_current_index(1, true);
    pager.set_rotation(Rotation::Rotation90, false, true);
    let _ = pager.tick(pager.now());
    let _ = pager.scroll_mode() == ScrollMode::Idle;

    // Commands stay matchable by backends.
    for cmd in link.drain_commands() {
        if let RenderCommand::SetTriple(FilterTriple { current, .. }) = cmd {
            let _ = current.map(|h| h.name().to_string());
        }
    }

    // Geometry is usable without any GPU.
    let _ = compute_buffers(&GeometryParams::default());
}
