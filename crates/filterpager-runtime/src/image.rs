use std::fmt;

use filterpager_core::PagerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// Decoded image, rows top to bottom, tightly packed.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl Bitmap {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Result<Self, PagerError> {
        if width == 0 || height == 0 {
            return Err(PagerError::Image(format!(
                "bitmap must not be empty ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(PagerError::Image(format!(
                "expected {expected} bytes for {width}x{height} {format:?}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PagerError> {
        Self::new(width, height, PixelFormat::Rgba8, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_rgba8(self) -> Bitmap {
        match self.format {
            PixelFormat::Rgba8 => self,
            PixelFormat::Rgb8 => {
                let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
                for px in self.pixels.chunks_exact(3) {
                    out.extend_from_slice(px);
                    out.push(255);
                }
                Bitmap {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Rgba8,
                    pixels: out,
                }
            }
        }
    }

    /// RGBA copy with an extra transparent column on the right when the width is odd.
    pub fn padded_to_even_width(self) -> Bitmap {
        let rgba = self.into_rgba8();
        if rgba.width % 2 == 0 {
            return rgba;
        }
        let row = rgba.width as usize * 4;
        let new_w = rgba.width + 1;
        let mut out = Vec::with_capacity(new_w as usize * rgba.height as usize * 4);
        for src in rgba.pixels.chunks_exact(row) {
            out.extend_from_slice(src);
            out.extend_from_slice(&[0, 0, 0, 0]);
        }
        Bitmap {
            width: new_w,
            height: rgba.height,
            format: PixelFormat::Rgba8,
            pixels: out,
        }
    }
}
