//! Swipe between six filters over one image.
//!
//! Usage: `swipe_filters [--config pager.json] [image path or url]`
//!
//! Drag with the mouse (or touch) to page. Keys 1-6 jump to a page, Left/Right step,
//! S toggles the scale type, R rotates, Backspace drops the image.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoopBuilder};

use filterpager::{
    load_pager_config_from, Bitmap, FilterHandle, Pager, PagerConfig, RenderLink, Rotation,
    ScaleType,
};
use filterpager_host_winit::{GlWindow, PointerTranslator, ProxySurface, RedrawRequest};
use filterpager_runtime_glow::{PagerRenderer, ShaderFilter};

const WIDTH: u32 = 960;
const HEIGHT: u32 = 640;

fn pages() -> Vec<FilterHandle<glow::Context>> {
    vec![
        FilterHandle::new(ShaderFilter::invert()),
        FilterHandle::new(ShaderFilter::hue(90.0)),
        FilterHandle::new(ShaderFilter::brightness(-0.5)),
        FilterHandle::new(ShaderFilter::brightness(0.5)),
        FilterHandle::new(ShaderFilter::grayscale()),
        FilterHandle::new(ShaderFilter::contrast(2.0)),
    ]
}

/// Gradient checkerboard used when no image is given.
fn checkerboard(width: u32, height: u32) -> anyhow::Result<Bitmap> {
    let cell = 64;
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let px = if on { [r, g, 200, 255] } else { [40, 40, 40, 255] };
            pixels.extend_from_slice(&px);
        }
    }
    Ok(Bitmap::from_rgba8(width, height, pixels)?)
}

fn reload_image(pager: &mut Pager<glow::Context>, uri: Option<&str>) -> anyhow::Result<()> {
    match uri {
        Some(uri) => {
            pager.set_image_uri(uri)?;
            info!(%uri, "loading image");
        }
        None => pager.set_image(checkerboard(1024, 768)?),
    }
    Ok(())
}

struct Args {
    config: Option<String>,
    image: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        image: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        if a == "--config" {
            args.config = Some(it.next().context("--config needs a path")?);
        } else {
            args.image = Some(a);
        }
    }
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = parse_args()?;
    let cfg = match &args.config {
        Some(path) => load_pager_config_from(path)?,
        None => PagerConfig::default(),
    };

    let event_loop = EventLoopBuilder::<RedrawRequest>::with_user_event().build();
    let win = GlWindow::new(&event_loop, "filterpager: swipe_filters", WIDTH, HEIGHT)?;

    let link = Arc::new(RenderLink::new());
    let mut renderer = unsafe { PagerRenderer::new(&win.gl, Arc::clone(&link))? };
    let surface = Arc::new(ProxySurface::new(event_loop.create_proxy()));
    let mut pager = Pager::new(cfg, Arc::clone(&link), surface);

    let (w, h) = win.size();
    unsafe { renderer.on_surface_changed(&win.gl, w, h)? };
    pager.on_layout(w, h);
    pager.set_pages(pages());

    reload_image(&mut pager, args.image.as_deref())?;

    let mut input = PointerTranslator::new();
    let mut scale_type = ScaleType::default();
    let mut rotation = Rotation::Normal;

    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    unsafe { renderer.destroy(&win.gl) };
                    *control_flow = ControlFlow::Exit;
                }

                WindowEvent::Resized(size) => {
                    win.resize(size.width, size.height);
                    let (w, h) = (size.width.max(1) as i32, size.height.max(1) as i32);
                    if let Err(e) = unsafe { renderer.on_surface_changed(&win.gl, w, h) } {
                        error!(error = %e, "surface resize failed");
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    pager.on_layout(w, h);
                }

                WindowEvent::CursorMoved { position, .. } => {
                    if let Some(ev) = input.cursor_moved(position.x, position.y, pager.now()) {
                        pager.on_touch(&ev);
                    }
                }
                WindowEvent::CursorLeft { .. } => {
                    if let Some(ev) = input.cursor_left(pager.now()) {
                        pager.on_touch(&ev);
                    }
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let pressed = state == ElementState::Pressed;
                    if let Some(ev) = input.mouse_button(pressed, pager.now()) {
                        pager.on_touch(&ev);
                    }
                }
                WindowEvent::Touch(t) => {
                    let now = pager.now();
                    if let Some(ev) = input.touch(t.phase, t.id, t.location.x, t.location.y, now) {
                        pager.on_touch(&ev);
                    }
                }

                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    let page = match key {
                        VirtualKeyCode::Key1 => Some(0),
                        VirtualKeyCode::Key2 => Some(1),
                        VirtualKeyCode::Key3 => Some(2),
                        VirtualKeyCode::Key4 => Some(3),
                        VirtualKeyCode::Key5 => Some(4),
                        VirtualKeyCode::Key6 => Some(5),
                        _ => None,
                    };
                    if let Some(i) = page {
                        pager.set_current_index(i, true);
                        return;
                    }
                    match key {
                        VirtualKeyCode::Left => {
                            pager.set_current_index(pager.current_index() as i64 - 1, true)
                        }
                        VirtualKeyCode::Right => {
                            pager.set_current_index(pager.current_index() as i64 + 1, true)
                        }
                        VirtualKeyCode::S => {
                            scale_type = match scale_type {
                                ScaleType::CenterCrop => ScaleType::CenterInside,
                                ScaleType::CenterInside => ScaleType::CenterCrop,
                            };
                            info!(?scale_type, "scale type");
                            pager.set_scale_type(scale_type);
                            // Changing the scale type drops the image; put it back.
                            if let Err(e) = reload_image(&mut pager, args.image.as_deref()) {
                                warn!(error = %e, "image reload failed");
                            }
                        }
                        VirtualKeyCode::R => {
                            let next = Rotation::from_degrees(rotation.degrees() + 90);
                            rotation = next.unwrap_or(Rotation::Normal);
                            info!(degrees = rotation.degrees(), "rotation");
                            pager.set_rotation(rotation, false, false);
                        }
                        VirtualKeyCode::Back => pager.delete_image(),
                        VirtualKeyCode::Escape => *control_flow = ControlFlow::Exit,
                        _ => {}
                    }
                }

                _ => {}
            },

            Event::UserEvent(RedrawRequest) => win.window.request_redraw(),

            Event::MainEventsCleared => {
                if pager.is_settling() {
                    pager.tick(pager.now());
                    *control_flow = ControlFlow::WaitUntil(Instant::now() + pager.frame_interval());
                } else {
                    *control_flow = ControlFlow::Wait;
                }
            }

            Event::RedrawRequested(_) => {
                unsafe { renderer.draw_frame(&win.gl) };
                if let Err(e) = win.swap_buffers() {
                    warn!(error = %e, "swap failed");
                }
            }

            _ => {}
        }
    });
}
