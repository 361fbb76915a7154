//! Texture (local variance) analysis
//!
//! Textural complexity drives the pad voice: busy regions get fuller chords.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::brightness::brightness_row;
use super::buffer::PixelBuffer;

/// Default variance window
pub const DEFAULT_TEXTURE_WINDOW: usize = 8;

/// Default number of sampled rows
pub const DEFAULT_TEXTURE_ROWS: usize = 5;

/// Windowed standard deviation of a brightness profile, divided by 255
pub fn texture_from_brightness(profile: &[f64], window: usize) -> Vec<f64> {
    let half = window.max(1) / 2;

    (0..profile.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(profile.len());
            let slice = &profile[start..end];
            let n = slice.len() as f64;

            let mean = slice.iter().sum::<f64>() / n;
            let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            variance.sqrt() / 255.0
        })
        .collect()
}

/// Texture averaged over `rows` evenly spaced rows.
///
/// Rows sit at multiples of `height / (rows + 1)`, so the very top and
/// bottom of the image are never sampled.
pub fn texture_profile(pixels: &PixelBuffer, window: usize, rows: usize) -> Vec<f64> {
    if pixels.is_empty() {
        return Vec::new();
    }

    let rows = rows.max(1);
    let row_step = pixels.height() / (rows + 1);
    let mut average = vec![0.0; pixels.width()];

    for i in 1..=rows {
        let row = (row_step * i).min(pixels.height() - 1);
        let texture = texture_from_brightness(&brightness_row(pixels, row), window);
        for (acc, value) in average.iter_mut().zip(texture) {
            *acc += value / rows as f64;
        }
    }
    average
}

/// Average a profile over `segments` contiguous regions.
///
/// Segments that would be empty (more segments than samples) are skipped.
pub fn segment_profile(profile: &[f64], segments: usize) -> Vec<f64> {
    if profile.is_empty() || segments == 0 {
        return Vec::new();
    }

    let size = profile.len() as f64 / segments as f64;
    (0..segments)
        .filter_map(|i| {
            let start = (i as f64 * size).floor() as usize;
            let end = (((i + 1) as f64 * size).floor() as usize).min(profile.len());
            let slice = &profile[start..end];
            if slice.is_empty() {
                None
            } else {
                Some(slice.iter().sum::<f64>() / slice.len() as f64)
            }
        })
        .collect()
}

/// Discrete texture intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureLevel {
    Low,
    Medium,
    High,
}

impl TextureLevel {
    pub fn classify(value: f64) -> Self {
        if value < 0.3 {
            TextureLevel::Low
        } else if value < 0.7 {
            TextureLevel::Medium
        } else {
            TextureLevel::High
        }
    }
}

impl fmt::Display for TextureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextureLevel::Low => "low",
            TextureLevel::Medium => "medium",
            TextureLevel::High => "high",
        };
        f.write_str(name)
    }
}
