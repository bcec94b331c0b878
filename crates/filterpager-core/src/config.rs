use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PagerError;

/// How the source image is fitted into the output viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    /// Fill the viewport and crop the overflowing axis.
    #[default]
    CenterCrop,
    /// Fit the whole image inside the viewport.
    CenterInside,
}

/// Tunables for gesture handling, animation and image loading.
///
/// Distances suffixed `_dips` are density-independent and get multiplied by `density`;
/// `_px` values are already in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagerConfig {
    #[serde(default = "default_density")]
    pub density: f32,

    #[serde(default = "default_touch_slop_px")]
    pub touch_slop_px: f32,

    #[serde(default = "default_min_fling_velocity_dips")]
    pub min_fling_velocity_dips: f32,

    /// Cap applied to the measured release velocity (pixels per second).
    #[serde(default = "default_max_fling_velocity_px")]
    pub max_fling_velocity_px: f32,

    #[serde(default = "default_min_fling_distance_dips")]
    pub min_fling_distance_dips: f32,

    /// A touch-down during a settle resumes dragging only if more than this remains.
    #[serde(default = "default_close_enough_dips")]
    pub close_enough_dips: f32,

    #[serde(default = "default_max_settle_duration_ms")]
    pub max_settle_duration_ms: u64,

    /// Suggested interval between settle ticks.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Upper bound on how long an image load waits for the first surface size.
    #[serde(default = "default_surface_wait_timeout_ms")]
    pub surface_wait_timeout_ms: u64,

    #[serde(default)]
    pub scale_type: ScaleType,

    /// Clear color of the visible frame, components in [0, 1].
    #[serde(default)]
    pub background: [f32; 3],

    /// Enables per-event and per-frame trace logging.
    #[serde(default)]
    pub debug: bool,
}

fn default_density() -> f32 {
    1.0
}
fn default_touch_slop_px() -> f32 {
    8.0
}
fn default_min_fling_velocity_dips() -> f32 {
    400.0
}
fn default_max_fling_velocity_px() -> f32 {
    8000.0
}
fn default_min_fling_distance_dips() -> f32 {
    25.0
}
fn default_close_enough_dips() -> f32 {
    2.0
}
fn default_max_settle_duration_ms() -> u64 {
    600
}
fn default_frame_interval_ms() -> u64 {
    33
}
fn default_surface_wait_timeout_ms() -> u64 {
    3000
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            density: default_density(),
            touch_slop_px: default_touch_slop_px(),
            min_fling_velocity_dips: default_min_fling_velocity_dips(),
            max_fling_velocity_px: default_max_fling_velocity_px(),
            min_fling_distance_dips: default_min_fling_distance_dips(),
            close_enough_dips: default_close_enough_dips(),
            max_settle_duration_ms: default_max_settle_duration_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            surface_wait_timeout_ms: default_surface_wait_timeout_ms(),
            scale_type: ScaleType::default(),
            background: [0.0, 0.0, 0.0],
            debug: false,
        }
    }
}

impl PagerConfig {
    pub fn min_fling_velocity_px(&self) -> f32 {
        self.min_fling_velocity_dips * self.density
    }

    pub fn min_fling_distance_px(&self) -> f32 {
        self.min_fling_distance_dips * self.density
    }

    pub fn close_enough_px(&self) -> f32 {
        self.close_enough_dips * self.density
    }

    /// Checks ranges that serde cannot express. Returns a human readable reason.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("density", self.density),
            ("max_fling_velocity_px", self.max_fling_velocity_px),
        ];
        for (name, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(format!("{name} must be a finite value > 0 (got {v})"));
            }
        }

        let non_negative = [
            ("touch_slop_px", self.touch_slop_px),
            ("min_fling_velocity_dips", self.min_fling_velocity_dips),
            ("min_fling_distance_dips", self.min_fling_distance_dips),
            ("close_enough_dips", self.close_enough_dips),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{name} must be a finite value >= 0 (got {v})"));
            }
        }

        if self.max_settle_duration_ms == 0 {
            return Err("max_settle_duration_ms must be > 0".into());
        }
        if self.frame_interval_ms == 0 {
            return Err("frame_interval_ms must be > 0".into());
        }

        if self
            .background
            .iter()
            .any(|c| !c.is_finite() || !(0.0..=1.0).contains(c))
        {
            return Err(format!(
                "background components must be in [0, 1] (got {:?})",
                self.background
            ));
        }

        Ok(())
    }
}

/// Reads, parses and validates a pager config JSON file.
pub fn load_pager_config_from(path: impl AsRef<Path>) -> Result<PagerConfig, PagerError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let text = fs::read_to_string(&path).map_err(|source| PagerError::Io {
        path: path.clone(),
        source,
    })?;
    let cfg: PagerConfig = serde_json::from_str(&text).map_err(|source| PagerError::Json {
        path: path.clone(),
        source,
    })?;
    cfg.validate()
        .map_err(|msg| PagerError::InvalidConfig { path, msg })?;
    Ok(cfg)
}
