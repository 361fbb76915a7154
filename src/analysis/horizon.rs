//! Horizon contour detection
//!
//! Scans every column from the bottom up looking for the first strong
//! brightness edge, which is taken as the skyline at that column.

use serde::{Deserialize, Serialize};

use super::buffer::{pixel_luma, PixelBuffer};
use super::depth::smooth_profile;

/// Default smoothing window applied by [`smooth_horizon`]
pub const DEFAULT_HORIZON_SMOOTHING: usize = 5;

/// Default smoothing window applied by [`horizon_contour`]
pub const DEFAULT_CONTOUR_SMOOTHING: usize = 7;

/// Edge thresholds for the horizon scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonOptions {
    /// Minimum luma of the edge pixel (default: 30)
    #[serde(default = "default_brightness_threshold")]
    pub brightness_threshold: f64,

    /// Minimum luma jump to the row above (default: 20)
    #[serde(default = "default_gradient_threshold")]
    pub gradient_threshold: f64,
}

fn default_brightness_threshold() -> f64 { 30.0 }
fn default_gradient_threshold() -> f64 { 20.0 }

impl Default for HorizonOptions {
    fn default() -> Self {
        Self {
            brightness_threshold: default_brightness_threshold(),
            gradient_threshold: default_gradient_threshold(),
        }
    }
}

/// Raw horizon height per column, 0 (bottom) to 1 (top).
///
/// A column without a qualifying edge reports 0.
pub fn horizon_profile(pixels: &PixelBuffer, options: &HorizonOptions) -> Vec<f64> {
    if pixels.is_empty() {
        return Vec::new();
    }
    let height = pixels.height();
    if height == 1 {
        return vec![0.0; pixels.width()];
    }

    let luma = |x: usize, y: usize| {
        let (r, g, b) = pixels.rgb(x, y);
        pixel_luma(r, g, b)
    };

    (0..pixels.width())
        .map(|x| {
            let edge_row = (1..height).rev().find(|&y| {
                let current = luma(x, y);
                let above = luma(x, y - 1);
                current > options.brightness_threshold
                    && (current - above).abs() > options.gradient_threshold
            });
            let y = edge_row.unwrap_or(height - 1);
            1.0 - y as f64 / (height - 1) as f64
        })
        .collect()
}

/// Moving-average smoothing of a horizon profile
pub fn smooth_horizon(profile: &[f64], window: usize) -> Vec<f64> {
    smooth_profile(profile, window)
}

/// Detect and smooth the horizon in one step
pub fn horizon_contour(pixels: &PixelBuffer, options: &HorizonOptions, smoothing: usize) -> Vec<f64> {
    smooth_horizon(&horizon_profile(pixels, options), smoothing)
}
