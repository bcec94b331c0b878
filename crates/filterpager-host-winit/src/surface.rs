use std::sync::Mutex;

use filterpager::RenderSurface;
use tracing::trace;
use winit::event_loop::EventLoopProxy;

/// User event sent to the winit loop when the pager wants a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawRequest;

/// Wakes the event loop from any thread.
///
/// `EventLoopProxy` is not `Sync` on every platform, hence the mutex.
#[derive(Debug)]
pub struct ProxySurface {
    proxy: Mutex<EventLoopProxy<RedrawRequest>>,
}

impl ProxySurface {
    pub fn new(proxy: EventLoopProxy<RedrawRequest>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
        }
    }
}

impl RenderSurface for ProxySurface {
    fn request_render(&self) {
        let Ok(proxy) = self.proxy.lock() else {
            return;
        };
        // Fails only once the loop has exited.
        if proxy.send_event(RedrawRequest).is_err() {
            trace!("render requested after event loop closed");
        }
    }
}
