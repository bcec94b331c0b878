use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use filterpager_geometry::{Rotation, ScaleType};

use crate::filter::FilterTriple;
use crate::image::Bitmap;
use crate::queue::RenderQueue;
use crate::GpuContext;

/// State changes for the render thread, applied in order before the next frame.
pub enum RenderCommand<C: GpuContext> {
    SetTriple(FilterTriple<C>),
    /// Split line position and which neighbor is revealed.
    SetSplit { split_px: i32, drag_to_left: bool },
    SetScaleType(ScaleType),
    SetRotation {
        rotation: Rotation,
        flip_horizontal: bool,
        flip_vertical: bool,
    },
    SetBackground([f32; 3]),
    SetImage(Bitmap),
    DeleteImage,
}

impl<C: GpuContext> fmt::Debug for RenderCommand<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderCommand::SetTriple(t) => f.debug_tuple("SetTriple").field(t).finish(),
            RenderCommand::SetSplit {
                split_px,
                drag_to_left,
            } => f
                .debug_struct("SetSplit")
                .field("split_px", split_px)
                .field("drag_to_left", drag_to_left)
                .finish(),
            RenderCommand::SetScaleType(s) => f.debug_tuple("SetScaleType").field(s).finish(),
            RenderCommand::SetRotation {
                rotation,
                flip_horizontal,
                flip_vertical,
            } => f
                .debug_struct("SetRotation")
                .field("rotation", rotation)
                .field("flip_horizontal", flip_horizontal)
                .field("flip_vertical", flip_vertical)
                .finish(),
            RenderCommand::SetBackground(c) => f.debug_tuple("SetBackground").field(c).finish(),
            RenderCommand::SetImage(b) => f.debug_tuple("SetImage").field(b).finish(),
            RenderCommand::DeleteImage => f.write_str("DeleteImage"),
        }
    }
}

/// Work to run on the render thread once the current frame has been drawn.
pub type RenderTask<C> = Box<dyn FnOnce(&C) + Send>;

/// Channel between the input side and the GPU-owning thread.
///
/// Commands are drained once per frame before drawing, after-draw tasks once per frame after
/// drawing. The render thread also publishes its surface size here so background work can
/// wait for the first layout.
pub struct RenderLink<C: GpuContext> {
    commands: RenderQueue<RenderCommand<C>>,
    after_draw: RenderQueue<RenderTask<C>>,
    surface: Mutex<(i32, i32)>,
    surface_changed: Condvar,
}

impl<C: GpuContext> Default for RenderLink<C> {
    fn default() -> Self {
        Self {
            commands: RenderQueue::new(),
            after_draw: RenderQueue::new(),
            surface: Mutex::new((0, 0)),
            surface_changed: Condvar::new(),
        }
    }
}

impl<C: GpuContext> fmt::Debug for RenderLink<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderLink")
            .field("commands", &self.commands)
            .field("after_draw", &self.after_draw.len())
            .field("surface", &self.surface_size())
            .finish()
    }
}

impl<C: GpuContext> RenderLink<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, cmd: RenderCommand<C>) {
        self.commands.push(cmd);
    }

    pub fn drain_commands(&self) -> Vec<RenderCommand<C>> {
        self.commands.drain()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    pub fn run_after_draw(&self, task: RenderTask<C>) {
        self.after_draw.push(task);
    }

    pub fn drain_after_draw(&self) -> Vec<RenderTask<C>> {
        self.after_draw.drain()
    }

    /// Called by the render thread whenever its surface is (re)created or resized.
    pub fn publish_surface_size(&self, width: i32, height: i32) {
        let mut size = self.surface.lock().unwrap_or_else(PoisonError::into_inner);
        *size = (width, height);
        self.surface_changed.notify_all();
    }

    pub fn surface_size(&self) -> (i32, i32) {
        *self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the surface has a non-zero width or `timeout` passes, then returns
    /// whatever size is known.
    pub fn wait_for_surface(&self, timeout: Duration) -> (i32, i32) {
        let guard = self.surface.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _timed_out) = self
            .surface_changed
            .wait_timeout_while(guard, timeout, |size| size.0 <= 0)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NullGpu;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn commands_keep_order() {
        let link: RenderLink<NullGpu> = RenderLink::new();
        link.push(RenderCommand::DeleteImage);
        link.push(RenderCommand::SetSplit {
            split_px: 5,
            drag_to_left: true,
        });
        let drained = link.drain_commands();
        assert!(matches!(drained[0], RenderCommand::DeleteImage));
        assert!(matches!(
            drained[1],
            RenderCommand::SetSplit {
                split_px: 5,
                drag_to_left: true
            }
        ));
        assert_eq!(link.pending_commands(), 0);
    }

    #[test]
    fn wait_returns_once_size_is_published() {
        let link: Arc<RenderLink<NullGpu>> = Arc::new(RenderLink::new());
        let publisher = Arc::clone(&link);
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            publisher.publish_surface_size(640, 480);
        });
        let size = link.wait_for_surface(Duration::from_secs(5));
        assert_eq!(size, (640, 480));
        worker.join().expect("publisher thread");
    }

    #[test]
    fn wait_gives_up_after_timeout() {
        let link: RenderLink<NullGpu> = RenderLink::new();
        let start = Instant::now();
        assert_eq!(link.wait_for_surface(Duration::from_millis(30)), (0, 0));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn after_draw_tasks_run_with_context() {
        let link: RenderLink<NullGpu> = RenderLink::new();
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        link.run_after_draw(Box::new(move |_gpu: &NullGpu| {
            h.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));
        for task in link.drain_after_draw() {
            task(&NullGpu);
        }
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
