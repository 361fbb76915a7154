//! Brightness profiles along the horizontal axis

use super::buffer::{pixel_brightness, PixelBuffer};

/// Brightness of every column in one row. Out-of-range rows yield an empty profile.
pub fn brightness_row(pixels: &PixelBuffer, row: usize) -> Vec<f64> {
    if pixels.is_empty() || row >= pixels.height() {
        return Vec::new();
    }

    (0..pixels.width())
        .map(|x| {
            let (r, g, b) = pixels.rgb(x, row);
            pixel_brightness(r, g, b)
        })
        .collect()
}

/// Column-wise mean brightness over a band of `rows` rows centred on `center_row`.
///
/// The band is clipped to the image; the result has one value per column.
pub fn averaged_brightness(pixels: &PixelBuffer, center_row: usize, rows: usize) -> Vec<f64> {
    if pixels.is_empty() {
        return Vec::new();
    }

    let rows = rows.max(1);
    let start = center_row.saturating_sub(rows / 2);
    let end = (center_row + rows.div_ceil(2)).min(pixels.height());
    if start >= end {
        return brightness_row(pixels, center_row.min(pixels.height() - 1));
    }

    let count = (end - start) as f64;
    let mut result = vec![0.0; pixels.width()];
    for row in start..end {
        for (acc, value) in result.iter_mut().zip(brightness_row(pixels, row)) {
            *acc += value / count;
        }
    }
    result
}

/// Reduce a profile to exactly `cap` values by averaging contiguous bins.
///
/// Profiles already at or below the cap are returned unchanged.
pub fn downsample_profile(profile: &[f64], cap: usize) -> Vec<f64> {
    if profile.len() <= cap {
        return profile.to_vec();
    }
    if cap == 0 {
        return Vec::new();
    }

    let bin = profile.len() as f64 / cap as f64;
    (0..cap)
        .map(|i| {
            let start = (i as f64 * bin).floor() as usize;
            let end = (((i + 1) as f64 * bin).floor() as usize).clamp(start + 1, profile.len());
            let slice = &profile[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Min-max normalize to 0-1. A flat profile maps to 0.5 everywhere.
pub fn normalize_profile(profile: &[f64]) -> Vec<f64> {
    if profile.is_empty() {
        return Vec::new();
    }

    let min = profile.iter().copied().fold(f64::INFINITY, f64::min);
    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range.abs() < f64::EPSILON {
        return vec![0.5; profile.len()];
    }
    profile.iter().map(|v| (v - min) / range).collect()
}
