//! The pager controller.
//!
//! Owns the page list and the current index, feeds touch events and ticks into
//! [`ScrollPhysics`] and turns the outcome into render commands. Everything here runs on the
//! input side; the GPU is only reached through the [`RenderLink`].

use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use filterpager_core::{InputEvent, PagerConfig, ScaleType};
use filterpager_geometry::Rotation;
use filterpager_physics::{PageFrame, PhysicsConfig, PhysicsEvent, ScrollMode, ScrollPhysics};
use filterpager_runtime::{
    Bitmap, FilterHandle, FilterTriple, GpuContext, RenderCommand, RenderLink,
};
use tracing::{debug, trace};

use crate::clock::{Clock, MonotonicClock};
use crate::loader::{ImageGeneration, ImageLoader, ImageSource, LoadError, LoadOutcome};
use crate::page::PageList;
use crate::RenderSurface;

pub struct Pager<C: GpuContext> {
    cfg: PagerConfig,
    pages: PageList<C>,

    current_index: usize,
    /// Target of a running settle; becomes current when the settle ends.
    next_index: Option<usize>,
    populate_pending: bool,

    scroll_x: i32,
    /// Pixel offset of the current page. Split math is relative to it.
    baseline_px: i32,
    width: i32,
    height: i32,
    first_layout: bool,

    last_triple: FilterTriple<C>,
    physics: ScrollPhysics,

    link: Arc<RenderLink<C>>,
    surface: Arc<dyn RenderSurface>,
    clock: Arc<dyn Clock>,
    images: ImageGeneration,
}

impl<C: GpuContext> fmt::Debug for Pager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("pages", &self.pages.len())
            .field("current_index", &self.current_index)
            .field("next_index", &self.next_index)
            .field("populate_pending", &self.populate_pending)
            .field("scroll_x", &self.scroll_x)
            .field("baseline_px", &self.baseline_px)
            .field("size", &(self.width, self.height))
            .field("mode", &self.physics.mode())
            .finish()
    }
}

impl<C: GpuContext> Pager<C> {
    /// Creates an empty pager. The configured scale type and background are queued for the
    /// render thread right away.
    pub fn new(cfg: PagerConfig, link: Arc<RenderLink<C>>, surface: Arc<dyn RenderSurface>) -> Self {
        let physics = ScrollPhysics::new(PhysicsConfig::from(&cfg));
        link.push(RenderCommand::SetScaleType(cfg.scale_type));
        link.push(RenderCommand::SetBackground(cfg.background));
        Self {
            cfg,
            pages: PageList::default(),
            current_index: 0,
            next_index: None,
            populate_pending: false,
            scroll_x: 0,
            baseline_px: 0,
            width: 0,
            height: 0,
            first_layout: true,
            last_triple: FilterTriple::empty(),
            physics,
            link,
            surface,
            clock: Arc::new(MonotonicClock::default()),
            images: ImageGeneration::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current time on the pager's clock. Hosts stamp input events with it.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn config(&self) -> &PagerConfig {
        &self.cfg
    }

    pub fn link(&self) -> &Arc<RenderLink<C>> {
        &self.link
    }

    pub fn pages(&self) -> &PageList<C> {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn scroll_x(&self) -> i32 {
        self.scroll_x
    }

    pub fn scroll_mode(&self) -> ScrollMode {
        self.physics.mode()
    }

    pub fn is_settling(&self) -> bool {
        self.physics.mode() == ScrollMode::Settling
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    // ---------------------------------------------------------------------------------------------
    // Pages
    // ---------------------------------------------------------------------------------------------

    /// Replaces the page list. Any drag or settle in flight is dropped and the pager returns
    /// to page 0.
    pub fn set_pages(&mut self, filters: Vec<FilterHandle<C>>) {
        self.physics.abort();
        self.pages = PageList::new(filters);
        self.current_index = 0;
        self.next_index = None;
        self.populate_pending = false;
        self.baseline_px = 0;
        debug!(pages = self.pages.len(), "set pages");

        if self.pages.is_empty() {
            self.scroll_x = 0;
            self.push_triple(FilterTriple::empty());
            self.surface.request_render();
            return;
        }

        self.populate(0);
        if self.width > 0 {
            self.scroll_to(0);
        } else {
            // Scrolled on first layout.
            self.first_layout = true;
            self.scroll_x = 0;
        }
    }

    /// Moves to `index`, clamped to the page range. The filter triple for the destination is
    /// installed before the scroll starts.
    pub fn set_current_index(&mut self, index: i64, smooth: bool) {
        let Some(index) = self.pages.clamp_index(index) else {
            return;
        };
        debug!(index, smooth, "set current index");

        let now = self.now();
        self.populate_pending = false;
        self.next_index = None;
        self.populate(index);
        if self.width <= 0 {
            self.scroll_x = self.item_x(index);
            return;
        }
        self.scroll_to_item(index, smooth, 0.0, now);
    }

    /// Resolves the neighbors of `index` and hands them to the render thread.
    ///
    /// Skipped while a settle has a populate pending; the settle's end populates instead.
    pub fn populate(&mut self, index: usize) {
        if index >= self.pages.len() {
            return;
        }
        self.current_index = index;
        if self.populate_pending {
            trace!(index, "populate pending, skipped");
            return;
        }
        self.baseline_px = self.item_x(index);
        let triple = self.pages.triple_at(index);
        self.push_triple(triple);
    }

    fn push_triple(&mut self, triple: FilterTriple<C>) {
        if triple.same_as(&self.last_triple) {
            return;
        }
        debug!(?triple, "filter triple");
        self.last_triple = triple.clone();
        self.link.push(RenderCommand::SetTriple(triple));
        self.surface.request_render();
    }

    fn item_x(&self, index: usize) -> i32 {
        self.pages
            .get(index)
            .map(|p| (p.offset * self.width as f32).round() as i32)
            .unwrap_or(0)
    }

    fn frame(&self) -> PageFrame {
        PageFrame {
            scroll_x: self.scroll_x,
            width: self.width,
            page_count: self.pages.len(),
            current_index: self.current_index,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Scrolling
    // ---------------------------------------------------------------------------------------------

    /// Moves the content to `x` and queues the matching split for the compositor.
    pub fn scroll_to(&mut self, x: i32) {
        self.scroll_x = x;
        if self.width <= 0 {
            return;
        }
        let drag_to_left = x < self.baseline_px;
        let split = if drag_to_left {
            self.baseline_px - x
        } else {
            self.baseline_px + self.width - x
        };
        let split_px = split.clamp(0, self.width);
        if self.cfg.debug {
            trace!(x, baseline = self.baseline_px, split_px, drag_to_left, "scroll");
        }
        self.link.push(RenderCommand::SetSplit {
            split_px,
            drag_to_left,
        });
        self.surface.request_render();
    }

    fn scroll_to_item(&mut self, item: usize, smooth: bool, velocity: f32, now: Duration) {
        let dest = self.item_x(item);
        if smooth {
            let frame = self.frame();
            let ev = self.physics.smooth_scroll_to(dest, velocity, &frame, now);
            self.apply(ev, now);
        } else {
            self.physics.complete_settle();
            self.next_index = None;
            self.populate_pending = false;
            self.populate(item);
            self.scroll_to(dest);
        }
    }

    fn finish_settle(&mut self, x: i32) {
        if let Some(next) = self.next_index.take() {
            self.current_index = next;
        }
        self.populate_pending = false;
        self.populate(self.current_index);
        self.scroll_to(x);
        debug!(index = self.current_index, x, "settled");
    }

    fn apply(&mut self, event: PhysicsEvent, now: Duration) {
        match event {
            PhysicsEvent::None => {}
            PhysicsEvent::ScrollTo(x) => {
                if x != self.scroll_x {
                    self.scroll_to(x);
                }
            }
            PhysicsEvent::SettleCaught(x) => {
                if let Some(next) = self.next_index.take() {
                    self.current_index = next;
                }
                self.populate_pending = false;
                self.populate(self.current_index);
                self.scroll_to(x);
            }
            PhysicsEvent::SettleFinished(x) => self.finish_settle(x),
            PhysicsEvent::Released { target, velocity } => {
                self.populate_pending = true;
                self.next_index = Some(target);
                self.scroll_to_item(target, true, velocity, now);
            }
            PhysicsEvent::Cancelled => {
                let cur = self.current_index;
                self.populate_pending = true;
                self.next_index = Some(cur);
                self.scroll_to_item(cur, true, 0.0, now);
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------------------------------

    /// Records the view size. A size change snaps to the current page.
    pub fn on_layout(&mut self, width: i32, height: i32) {
        if width == self.width && height == self.height {
            return;
        }
        debug!(width, height, first = self.first_layout, "layout");
        self.width = width;
        self.height = height;
        if self.pages.is_empty() || width <= 0 {
            return;
        }
        self.first_layout = false;

        self.physics.abort();
        if let Some(next) = self.next_index.take() {
            self.current_index = next;
        }
        self.populate_pending = false;
        self.populate(self.current_index);
        self.scroll_to(self.baseline_px);
    }

    /// Feeds one touch event. Returns true while a gesture or settle is in progress.
    pub fn on_touch(&mut self, ev: &InputEvent) -> bool {
        let frame = self.frame();
        let outcome = self.physics.on_touch(ev, &frame);
        self.apply(outcome, ev.time);
        self.physics.mode() != ScrollMode::Idle
    }

    /// Advances a running settle. Returns true while it is still running; hosts keep
    /// ticking at the frame interval until then.
    pub fn tick(&mut self, now: Duration) -> bool {
        let ev = self.physics.tick(now);
        self.apply(ev, now);
        self.is_settling()
    }

    /// Interval hosts should tick at while settling.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.cfg.frame_interval_ms)
    }

    // ---------------------------------------------------------------------------------------------
    // Image and appearance
    // ---------------------------------------------------------------------------------------------

    /// Changes how the image is fitted. The current image is dropped; set it again to see it
    /// with the new scaling.
    pub fn set_scale_type(&mut self, scale_type: ScaleType) {
        self.link.push(RenderCommand::SetScaleType(scale_type));
        self.delete_image();
    }

    /// Each component in `[0, 1]`.
    pub fn set_background_color(&mut self, r: f32, g: f32, b: f32) {
        let rgb = [r, g, b].map(|c| c.clamp(0.0, 1.0));
        self.link.push(RenderCommand::SetBackground(rgb));
        self.surface.request_render();
    }

    pub fn set_rotation(&mut self, rotation: Rotation, flip_horizontal: bool, flip_vertical: bool) {
        self.link.push(RenderCommand::SetRotation {
            rotation,
            flip_horizontal,
            flip_vertical,
        });
        self.surface.request_render();
    }

    /// Replaces the image. Loads still in flight will not override it.
    pub fn set_image(&mut self, bitmap: Bitmap) {
        let link = &self.link;
        self.images.advance(|_| {
            link.push(RenderCommand::DeleteImage);
            link.push(RenderCommand::SetImage(bitmap));
        });
        self.surface.request_render();
    }

    /// Loads an image from a path, `file://` URI or http(s) URL in the background.
    pub fn set_image_uri(
        &mut self,
        uri: &str,
    ) -> Result<JoinHandle<Result<LoadOutcome, LoadError>>, LoadError> {
        let source = ImageSource::parse(uri)?;
        let loader = ImageLoader::new(
            Arc::clone(&self.link),
            Arc::clone(&self.surface),
            self.images.clone(),
            Duration::from_millis(self.cfg.surface_wait_timeout_ms),
        );
        Ok(loader.spawn(source))
    }

    pub fn delete_image(&mut self) {
        let link = &self.link;
        self.images
            .advance(|_| link.push(RenderCommand::DeleteImage));
        self.surface.request_render();
    }

    /// Runs `task` on the render thread after the next frame is drawn.
    pub fn run_after_draw(&self, task: impl FnOnce(&C) + Send + 'static) {
        self.link.run_after_draw(Box::new(task));
        self.surface.request_render();
    }
}
