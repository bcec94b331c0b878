#![forbid(unsafe_code)]

//! Vertex and texture-coordinate math for the split-screen pager composite.
//!
//! This crate is **contract-only**: no GL handles, no windowing. Every quad is a
//! 4-vertex triangle strip stored as `[x0, y0, x1, y1, x2, y2, x3, y3]` in the order
//! bottom-left, bottom-right, top-left, top-right.
//!
//! The visible frame is split at a vertical line. Everything left of the line is the
//! "left half", everything right of it the "right half". [`compute_buffers`] derives both
//! halves for the scaled first pass and the unscaled second pass.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub use filterpager_core::ScaleType;

pub type Quad = [f32; 8];

/// Full clip-space quad.
pub const CUBE: Quad = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

pub const TEXTURE_NO_ROTATION: Quad = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
pub const TEXTURE_ROTATED_90: Quad = [1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
pub const TEXTURE_ROTATED_180: Quad = [1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
pub const TEXTURE_ROTATED_270: Quad = [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0];

/// Clockwise rotation applied to the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Normal,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Normal),
            90 => Some(Rotation::Rotation90),
            180 => Some(Rotation::Rotation180),
            270 => Some(Rotation::Rotation270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Normal => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }

    /// True when the image's width maps onto the output's height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Rotation90 | Rotation::Rotation270)
    }
}

// -------------------------------------------------------------------------------------------------
// Base tables
// -------------------------------------------------------------------------------------------------

/// Mirrors a normalized texture coordinate. Table entries are 0 or 1.
fn flip(v: f32) -> f32 {
    1.0 - v
}

/// Texture coordinates for `rotation` with optional mirroring.
pub fn texture_coords(rotation: Rotation, flip_horizontal: bool, flip_vertical: bool) -> Quad {
    let mut q = match rotation {
        Rotation::Normal => TEXTURE_NO_ROTATION,
        Rotation::Rotation90 => TEXTURE_ROTATED_90,
        Rotation::Rotation180 => TEXTURE_ROTATED_180,
        Rotation::Rotation270 => TEXTURE_ROTATED_270,
    };
    if flip_horizontal {
        for x in q.iter_mut().step_by(2) {
            *x = flip(*x);
        }
    }
    if flip_vertical {
        for y in q.iter_mut().skip(1).step_by(2) {
            *y = flip(*y);
        }
    }
    q
}

/// Keeps the quad's left edge and pulls its right edge to `offset` of the width.
pub fn adjust_left_quad(q: &Quad, offset: f32) -> Quad {
    let mut out = *q;
    out[2] = (q[2] - q[0]) * offset + q[0];
    out[6] = (q[6] - q[4]) * offset + q[4];
    out
}

/// Keeps the quad's right edge and pushes its left edge to `offset` of the width.
pub fn adjust_right_quad(q: &Quad, offset: f32) -> Quad {
    let mut out = *q;
    out[0] = (q[2] - q[0]) * offset + q[0];
    out[4] = (q[6] - q[4]) * offset + q[4];
    out
}

/// Inverts every y coordinate (the offscreen texture is stored upside down).
pub fn flip_y(q: &Quad) -> Quad {
    let mut out = *q;
    for y in out.iter_mut().skip(1).step_by(2) {
        *y = flip(*y);
    }
    out
}

fn inset(coord: f32, distance: f32) -> f32 {
    if coord == 0.0 {
        distance
    } else {
        1.0 - distance
    }
}

// -------------------------------------------------------------------------------------------------
// Buffers
// -------------------------------------------------------------------------------------------------

/// Everything the geometry depends on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryParams {
    pub output_width: i32,
    pub output_height: i32,
    /// Size of the image as decoded (not the padded upload size).
    pub image_width: i32,
    pub image_height: i32,
    pub rotation: Rotation,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub scale_type: ScaleType,
    /// Distance of the split line from the left edge of the output, in pixels.
    pub split_px: i32,
}

impl GeometryParams {
    /// Split position as a fraction of the output width. Zero when no output size is known.
    pub fn offset(&self) -> f32 {
        if self.output_width <= 0 {
            return 0.0;
        }
        self.split_px as f32 / self.output_width as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HalfQuads {
    pub cube: Quad,
    pub tex: Quad,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SplitQuads {
    pub left: HalfQuads,
    pub right: HalfQuads,
}

/// Quads for both compositor passes.
///
/// `scaled` is used when drawing the source image into the offscreen target and carries the
/// scale mode. `normal` is used when drawing the offscreen texture to the screen; its
/// texture coordinates are flipped vertically.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryBuffers {
    pub scaled: SplitQuads,
    pub normal: SplitQuads,
}

/// Base cube and texture table for the scaled pass, before the split is applied.
pub fn scaled_base(p: &GeometryParams) -> (Quad, Quad) {
    let tex = texture_coords(p.rotation, p.flip_horizontal, p.flip_vertical);
    if p.output_width <= 0 || p.output_height <= 0 || p.image_width <= 0 || p.image_height <= 0
    {
        return (CUBE, tex);
    }

    let (out_w, out_h) = if p.rotation.swaps_axes() {
        (p.output_height as f32, p.output_width as f32)
    } else {
        (p.output_width as f32, p.output_height as f32)
    };
    let img_w = p.image_width as f32;
    let img_h = p.image_height as f32;

    let ratio_max = (out_w / img_w).max(out_h / img_h);
    let img_w_new = (img_w * ratio_max).round();
    let img_h_new = (img_h * ratio_max).round();

    let ratio_width = img_w_new / out_w;
    let ratio_height = img_h_new / out_h;

    match p.scale_type {
        ScaleType::CenterCrop => {
            let dist_h = (1.0 - 1.0 / ratio_width) / 2.0;
            let dist_v = (1.0 - 1.0 / ratio_height) / 2.0;
            let mut cropped = tex;
            for (i, c) in cropped.iter_mut().enumerate() {
                let d = if i % 2 == 0 { dist_h } else { dist_v };
                *c = inset(*c, d);
            }
            (CUBE, cropped)
        }
        ScaleType::CenterInside => {
            let mut cube = CUBE;
            for (i, c) in cube.iter_mut().enumerate() {
                // x divides by the height ratio and y by the width ratio.
                *c /= if i % 2 == 0 { ratio_height } else { ratio_width };
            }
            (cube, tex)
        }
    }
}

pub fn compute_buffers(p: &GeometryParams) -> GeometryBuffers {
    let offset = p.offset();
    let (cube, tex) = scaled_base(p);

    let scaled = SplitQuads {
        left: HalfQuads {
            cube: adjust_left_quad(&cube, offset),
            tex: adjust_left_quad(&tex, offset),
        },
        right: HalfQuads {
            cube: adjust_right_quad(&cube, offset),
            tex: adjust_right_quad(&tex, offset),
        },
    };

    let base_tex = texture_coords(p.rotation, p.flip_horizontal, p.flip_vertical);
    let normal = SplitQuads {
        left: HalfQuads {
            cube: adjust_left_quad(&CUBE, offset),
            tex: flip_y(&adjust_left_quad(&base_tex, offset)),
        },
        right: HalfQuads {
            cube: adjust_right_quad(&CUBE, offset),
            tex: flip_y(&adjust_right_quad(&base_tex, offset)),
        },
    };

    GeometryBuffers { scaled, normal }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_quad_eq(a: &Quad, b: &Quad) {
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-5, "index {i}: {a:?} != {b:?}");
        }
    }

    fn params(split_px: i32) -> GeometryParams {
        GeometryParams {
            output_width: 100,
            output_height: 100,
            image_width: 100,
            image_height: 100,
            split_px,
            ..GeometryParams::default()
        }
    }

    #[test]
    fn offset_zero_gives_base_to_right_half() {
        let b = compute_buffers(&params(0));
        assert_quad_eq(&b.scaled.right.cube, &CUBE);
        assert_quad_eq(&b.scaled.right.tex, &TEXTURE_NO_ROTATION);
        // Left half collapsed onto its left edge.
        assert_eq!(b.scaled.left.cube[2], b.scaled.left.cube[0]);
        assert_eq!(b.scaled.left.cube[6], b.scaled.left.cube[4]);
    }

    #[test]
    fn offset_one_gives_base_to_left_half() {
        let b = compute_buffers(&params(100));
        assert_quad_eq(&b.scaled.left.cube, &CUBE);
        assert_quad_eq(&b.scaled.left.tex, &TEXTURE_NO_ROTATION);
        assert_eq!(b.scaled.right.cube[0], b.scaled.right.cube[2]);
        assert_eq!(b.scaled.right.cube[4], b.scaled.right.cube[6]);
    }

    #[test]
    fn halves_meet_at_the_split() {
        let b = compute_buffers(&params(30));
        assert!((b.scaled.left.cube[2] - (-0.4)).abs() < 1e-6);
        assert_eq!(b.scaled.left.cube[2], b.scaled.right.cube[0]);
        assert_eq!(b.normal.left.cube[6], b.normal.right.cube[4]);
        assert!((b.scaled.left.tex[2] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn normal_tex_is_vertically_flipped() {
        let b = compute_buffers(&params(100));
        assert_quad_eq(&b.normal.left.tex, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn rotation_tables_and_flips() {
        assert_eq!(texture_coords(Rotation::Rotation90, false, false), TEXTURE_ROTATED_90);
        assert_eq!(
            texture_coords(Rotation::Normal, true, false),
            [1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            texture_coords(Rotation::Normal, false, true),
            [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]
        );
        assert_eq!(
            texture_coords(Rotation::Normal, true, true),
            TEXTURE_ROTATED_180
        );
    }

    #[test]
    fn center_crop_insets_the_wide_axis() {
        let p = GeometryParams {
            image_width: 200,
            image_height: 100,
            ..params(100)
        };
        let (cube, tex) = scaled_base(&p);
        assert_quad_eq(&cube, &CUBE);
        assert_quad_eq(&tex, &[0.25, 1.0, 0.75, 1.0, 0.25, 0.0, 0.75, 0.0]);
    }

    #[test]
    fn center_inside_shrinks_the_cube() {
        let p = GeometryParams {
            image_width: 200,
            image_height: 100,
            scale_type: ScaleType::CenterInside,
            ..params(100)
        };
        let (cube, tex) = scaled_base(&p);
        assert_quad_eq(&tex, &TEXTURE_NO_ROTATION);
        assert_quad_eq(&cube, &[-1.0, -0.5, 1.0, -0.5, -1.0, 0.5, 1.0, 0.5]);
    }

    #[test]
    fn quarter_turn_swaps_output_axes() {
        // A 100x200 image rotated 90 degrees fills a 200x100 output exactly.
        let p = GeometryParams {
            output_width: 200,
            output_height: 100,
            image_width: 100,
            image_height: 200,
            rotation: Rotation::Rotation90,
            split_px: 200,
            ..GeometryParams::default()
        };
        let (cube, tex) = scaled_base(&p);
        assert_quad_eq(&cube, &CUBE);
        assert_quad_eq(&tex, &TEXTURE_ROTATED_90);
    }

    #[test]
    fn unknown_sizes_fall_back_to_base_tables() {
        let p = GeometryParams {
            output_width: 0,
            output_height: 0,
            ..GeometryParams::default()
        };
        assert_eq!(p.offset(), 0.0);
        let (cube, tex) = scaled_base(&p);
        assert_eq!(cube, CUBE);
        assert_eq!(tex, TEXTURE_NO_ROTATION);
    }

    #[test]
    fn rotation_from_degrees_wraps() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Rotation270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Rotation90));
        assert_eq!(Rotation::from_degrees(45), None);
    }
}
