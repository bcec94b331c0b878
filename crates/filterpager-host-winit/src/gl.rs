use std::ffi::CStr;
use std::num::NonZeroU32;

use anyhow::{anyhow, Context};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::{GlConfig, GlDisplay, GlSurface};
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoopWindowTarget;
use winit::window::{Window, WindowBuilder};

fn non_zero(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v.max(1)).unwrap_or(NonZeroU32::MIN)
}

/// A window with a current GL 3.3 (or GLES 3.0) context and a glow handle to it.
pub struct GlWindow {
    pub window: Window,
    pub surface: Surface<WindowSurface>,
    pub context: PossiblyCurrentContext,
    pub gl: glow::Context,
}

impl std::fmt::Debug for GlWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlWindow")
            .field("window", &self.window.id())
            .field("size", &self.window.inner_size())
            .finish()
    }
}

impl GlWindow {
    pub fn new<T>(
        event_loop: &EventLoopWindowTarget<T>,
        title: &str,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(0)
            .with_stencil_size(0);

        let display_builder = DisplayBuilder::new().with_window_builder(Some(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height)),
        ));

        let (window, gl_config) = display_builder
            .build(event_loop, template, |configs| {
                configs
                    .reduce(|a, b| if a.num_samples() > b.num_samples() { a } else { b })
                    .expect("glutin offers at least one config")
            })
            .map_err(|e| anyhow!("failed to build GL display: {e}"))?;

        let window = window.ok_or_else(|| anyhow!("display builder returned no window"))?;
        let raw_window_handle = window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_window_handle));
        let fallback_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
            .build(Some(raw_window_handle));
        let not_current = unsafe {
            gl_display
                .create_context(&gl_config, &context_attributes)
                .or_else(|_| gl_display.create_context(&gl_config, &fallback_attributes))
                .context("create GL context")?
        };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            non_zero(size.width),
            non_zero(size.height),
        );
        let surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .context("create window surface")?
        };
        let context = not_current
            .make_current(&surface)
            .context("make GL context current")?;

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                gl_display.get_proc_address(CStr::from_bytes_with_nul_unchecked(
                    format!("{s}\0").as_bytes(),
                )) as *const _
            })
        };

        Ok(Self {
            window,
            surface,
            context,
            gl,
        })
    }

    /// Inner size in pixels as the pager and renderer expect it.
    pub fn size(&self) -> (i32, i32) {
        let s = self.window.inner_size();
        (s.width as i32, s.height as i32)
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.surface
            .resize(&self.context, non_zero(width), non_zero(height));
    }

    pub fn swap_buffers(&self) -> anyhow::Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("swap buffers")
    }
}
