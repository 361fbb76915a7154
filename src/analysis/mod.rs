//! Image feature extraction
//!
//! Turns a flat RGBA buffer into 1-D profiles sampled along the horizontal
//! axis: brightness, depth, ridges, horizon contour and texture. Pixel
//! decoding happens elsewhere; everything here is pure.

mod analyzer;
mod brightness;
mod buffer;
mod depth;
mod horizon;
mod texture;

pub use analyzer::{
    analyze_for_depth_ridge, analyze_for_depth_ridge_with, analyze_for_linear_landscape, analyze_for_multi_voice,
    analyze_quick,
    AnalysisMetadata, AnalysisOptions, ImageAnalysisResult, LandscapeAnalysisOptions,
};
pub use brightness::{averaged_brightness, brightness_row, downsample_profile, normalize_profile};
pub use buffer::{pixel_brightness, pixel_luma, PixelBuffer, CHANNELS};
pub use depth::{
    depth_profile, detect_ridges, ridge_strength, ridge_strength_weighted, smooth_profile, RidgeMethod,
    DEFAULT_DEPTH_WINDOW, PEAK_BONUS,
};
pub use horizon::{
    horizon_contour, horizon_profile, smooth_horizon, HorizonOptions, DEFAULT_CONTOUR_SMOOTHING,
    DEFAULT_HORIZON_SMOOTHING,
};
pub use texture::{
    segment_profile, texture_from_brightness, texture_profile, TextureLevel, DEFAULT_TEXTURE_ROWS,
    DEFAULT_TEXTURE_WINDOW,
};
