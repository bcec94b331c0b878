//! Background image loading.
//!
//! A load waits (bounded) for the render surface to report a size, decodes the image on a
//! worker thread and hands the bitmap to the render thread. Every `set_image*` or
//! `delete_image` starts a new generation; a load that finishes for an older generation is
//! dropped instead of replacing the newer image.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use filterpager_core::PagerError;
use filterpager_runtime::{Bitmap, GpuContext, RenderCommand, RenderLink};
use image::imageops::FilterType;
use tracing::{debug, warn};

use crate::RenderSurface;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("fetch {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("read {} failed: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unsupported uri scheme: {0}")]
    UnsupportedScheme(String),

    #[error(transparent)]
    Bitmap(#[from] PagerError),
}

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
}

impl ImageSource {
    /// Accepts `http(s)://` URLs, `file://` URIs and bare paths.
    pub fn parse(uri: &str) -> Result<Self, LoadError> {
        match uri.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "http" | "https" => Ok(ImageSource::Url(uri.to_string())),
                "file" => Ok(ImageSource::Path(PathBuf::from(rest))),
                other => Err(LoadError::UnsupportedScheme(other.to_string())),
            },
            None => Ok(ImageSource::Path(PathBuf::from(uri))),
        }
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            ImageSource::Path(path) => fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            }),
            ImageSource::Url(url) => {
                let fetch_err = |source| LoadError::Fetch {
                    url: url.clone(),
                    source,
                };
                let mut resp = ureq::get(url.as_str()).call().map_err(fetch_err)?;
                resp.body_mut().read_to_vec().map_err(fetch_err)
            }
        }
    }
}

/// Power-of-two reduction that keeps the image at least as large as the output.
pub fn sample_size(width: u32, height: u32, out_w: i32, out_h: i32) -> u32 {
    if out_w <= 0 || out_h <= 0 {
        return 1;
    }
    let (out_w, out_h) = (out_w as u32, out_h as u32);
    let mut sample = 1;
    while width / (sample * 2) >= out_w && height / (sample * 2) >= out_h {
        sample *= 2;
    }
    sample
}

/// Decodes `bytes` to RGBA, downsampled towards `fit` when the image is much larger.
pub fn decode_bitmap(bytes: &[u8], fit: (i32, i32)) -> Result<Bitmap, LoadError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (w, h) = rgba.dimensions();
    let sample = sample_size(w, h, fit.0, fit.1);
    let rgba = if sample > 1 {
        image::imageops::resize(&rgba, w / sample, h / sample, FilterType::Triangle)
    } else {
        rgba
    };
    let (w, h) = rgba.dimensions();
    Ok(Bitmap::from_rgba8(w, h, rgba.into_raw())?)
}

/// Monotonic image generation. Publishing an image and starting a generation are
/// serialized, so a stale load can never land after a newer image.
#[derive(Debug, Clone, Default)]
pub struct ImageGeneration(Arc<Mutex<u64>>);

impl ImageGeneration {
    pub fn current(&self) -> u64 {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new generation and runs `f` with it before any stale load can publish.
    pub fn advance<R>(&self, f: impl FnOnce(u64) -> R) -> R {
        let mut g = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *g += 1;
        f(*g)
    }

    /// Runs `f` if `generation` is still the newest one.
    pub fn publish_if_current<R>(&self, generation: u64, f: impl FnOnce() -> R) -> Option<R> {
        let g = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        (*g == generation).then(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer image request arrived while this one was decoding.
    Superseded,
}

pub struct ImageLoader<C: GpuContext> {
    link: Arc<RenderLink<C>>,
    surface: Arc<dyn RenderSurface>,
    generation: ImageGeneration,
    wait_timeout: Duration,
}

impl<C: GpuContext> std::fmt::Debug for ImageLoader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("generation", &self.generation.current())
            .field("wait_timeout", &self.wait_timeout)
            .finish()
    }
}

impl<C: GpuContext> ImageLoader<C> {
    pub fn new(
        link: Arc<RenderLink<C>>,
        surface: Arc<dyn RenderSurface>,
        generation: ImageGeneration,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            link,
            surface,
            generation,
            wait_timeout,
        }
    }

    /// Starts a load on a worker thread. The thread's result is also logged.
    pub fn spawn(&self, source: ImageSource) -> thread::JoinHandle<Result<LoadOutcome, LoadError>> {
        let generation = self.generation.advance(|g| g);
        let job = LoadJob {
            link: Arc::clone(&self.link),
            surface: Arc::clone(&self.surface),
            generation: self.generation.clone(),
            ticket: generation,
            wait_timeout: self.wait_timeout,
        };
        thread::spawn(move || {
            let result = job.run(&source);
            match &result {
                Ok(outcome) => debug!(?source, ?outcome, "image load finished"),
                Err(e) => warn!(?source, error = %e, "image load failed"),
            }
            result
        })
    }
}

struct LoadJob<C: GpuContext> {
    link: Arc<RenderLink<C>>,
    surface: Arc<dyn RenderSurface>,
    generation: ImageGeneration,
    ticket: u64,
    wait_timeout: Duration,
}

impl<C: GpuContext> LoadJob<C> {
    fn run(&self, source: &ImageSource) -> Result<LoadOutcome, LoadError> {
        let fit = self.link.wait_for_surface(self.wait_timeout);
        if fit.0 <= 0 {
            debug!(timeout = ?self.wait_timeout, "no surface size yet; decoding at full size");
        }

        let bytes = source.read_bytes()?;
        let bitmap = decode_bitmap(&bytes, fit)?;

        let published = self.generation.publish_if_current(self.ticket, || {
            self.link.push(RenderCommand::DeleteImage);
            self.link.push(RenderCommand::SetImage(bitmap));
        });
        match published {
            Some(()) => {
                self.surface.request_render();
                Ok(LoadOutcome::Applied)
            }
            None => Ok(LoadOutcome::Superseded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterpager_runtime::testing::NullGpu;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl RenderSurface for Counter {
        fn request_render(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn write_png(name: &str, w: u32, h: u32) -> PathBuf {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut p = std::env::temp_dir();
        p.push(format!("filterpager_loader_{name}_{ts}.png"));
        fs::write(&p, bytes).expect("write png");
        p
    }

    #[test]
    fn parse_recognizes_schemes() {
        assert_eq!(
            ImageSource::parse("https://example.com/a.png").expect("url"),
            ImageSource::Url("https://example.com/a.png".into())
        );
        assert_eq!(
            ImageSource::parse("file:///tmp/a.png").expect("file"),
            ImageSource::Path(PathBuf::from("/tmp/a.png"))
        );
        assert_eq!(
            ImageSource::parse("pics/a.png").expect("path"),
            ImageSource::Path(PathBuf::from("pics/a.png"))
        );
        assert!(matches!(
            ImageSource::parse("ftp://host/a.png"),
            Err(LoadError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn sample_size_keeps_image_at_least_output_size() {
        assert_eq!(sample_size(4000, 3000, 1000, 700), 4);
        assert_eq!(sample_size(1000, 1000, 1000, 1000), 1);
        assert_eq!(sample_size(4000, 3000, 0, 0), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ImageSource::Path(PathBuf::from("/definitely/not/here.png"))
            .read_bytes()
            .expect_err("missing file");
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn load_publishes_delete_then_set() {
        let path = write_png("publish", 8, 4);
        let link: Arc<RenderLink<NullGpu>> = Arc::new(RenderLink::new());
        link.publish_surface_size(8, 4);
        let counter = Arc::new(Counter::default());
        let loader = ImageLoader::new(
            Arc::clone(&link),
            counter.clone(),
            ImageGeneration::default(),
            Duration::from_millis(50),
        );

        let outcome = loader
            .spawn(ImageSource::Path(path.clone()))
            .join()
            .expect("loader thread")
            .expect("load ok");
        assert_eq!(outcome, LoadOutcome::Applied);

        let cmds = link.drain_commands();
        assert!(matches!(cmds[0], RenderCommand::DeleteImage));
        match &cmds[1] {
            RenderCommand::SetImage(b) => assert_eq!((b.width(), b.height()), (8, 4)),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn newer_generation_supersedes_a_load() {
        let path = write_png("stale", 4, 4);
        let link: Arc<RenderLink<NullGpu>> = Arc::new(RenderLink::new());
        let generation = ImageGeneration::default();
        let job = LoadJob {
            link: Arc::clone(&link),
            surface: Arc::new(Counter::default()),
            generation: generation.clone(),
            ticket: generation.advance(|g| g),
            wait_timeout: Duration::from_millis(10),
        };
        generation.advance(|_| ());

        let outcome = job.run(&ImageSource::Path(path.clone())).expect("decode ok");
        assert_eq!(outcome, LoadOutcome::Superseded);
        assert!(link.drain_commands().is_empty());
        let _ = fs::remove_file(path);
    }
}
