//! Analysis results and the analyzer entry points
//!
//! Each entry point runs a fixed combination of the profile extractors over a
//! pixel buffer and packages the profiles into an [`ImageAnalysisResult`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::brightness::{averaged_brightness, brightness_row, downsample_profile};
use super::buffer::PixelBuffer;
use super::depth::{depth_profile, detect_ridges, smooth_profile, RidgeMethod, DEFAULT_DEPTH_WINDOW};
use super::horizon::{horizon_contour, HorizonOptions, DEFAULT_CONTOUR_SMOOTHING};
use super::texture::{texture_profile, DEFAULT_TEXTURE_ROWS, DEFAULT_TEXTURE_WINDOW};
use crate::error::{Result, TopoError};

/// Advisory diagnostics attached to an analysis. Never read by the mappers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,

    /// Unix time in milliseconds
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_detection_method: Option<String>,
}

impl AnalysisMetadata {
    fn sampled(method: &str, row_index: usize) -> Self {
        Self {
            sampling_method: Some(method.to_string()),
            row_index: Some(row_index),
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .ok()
                .map(|d| d.as_millis() as u64),
            edge_detection_method: None,
        }
    }
}

/// Feature profiles extracted from one image.
///
/// Brightness is 0-255; every other profile is 0-1. Profiles produced by the
/// same analyzer call share one sample count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysisResult {
    pub width: usize,
    pub height: usize,
    pub brightness_profile: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ridge_strength: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_profile: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_profile: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_profile: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
}

impl ImageAnalysisResult {
    /// Result holding only a brightness profile; dimensions follow the profile
    pub fn from_brightness(brightness: Vec<f64>) -> Self {
        Self {
            width: brightness.len(),
            height: 1,
            brightness_profile: brightness,
            ..Self::default()
        }
    }

    pub fn with_ridges(mut self, ridges: Vec<f64>) -> Self {
        self.ridge_strength = Some(ridges);
        self
    }

    pub fn with_depth(mut self, depth: Vec<f64>) -> Self {
        self.depth_profile = Some(depth);
        self
    }

    pub fn with_horizon(mut self, horizon: Vec<f64>) -> Self {
        self.horizon_profile = Some(horizon);
        self
    }

    pub fn with_texture(mut self, texture: Vec<f64>) -> Self {
        self.texture_profile = Some(texture);
        self
    }

    /// Number of brightness samples
    pub fn len(&self) -> usize {
        self.brightness_profile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brightness_profile.is_empty()
    }

    fn optional_profiles(&self) -> [(&'static str, Option<&Vec<f64>>); 4] {
        [
            ("ridgeStrength", self.ridge_strength.as_ref()),
            ("depthProfile", self.depth_profile.as_ref()),
            ("horizonProfile", self.horizon_profile.as_ref()),
            ("textureProfile", self.texture_profile.as_ref()),
        ]
    }

    /// Check that every present profile matches the brightness length and
    /// holds only finite values.
    pub fn validate(&self) -> Result<()> {
        if self.brightness_profile.iter().any(|v| !v.is_finite()) {
            return Err(TopoError::MalformedAnalysisInput(
                "brightnessProfile contains non-finite values".to_string(),
            ));
        }

        for (name, profile) in self.optional_profiles() {
            let Some(profile) = profile else { continue };
            if profile.len() != self.len() {
                return Err(TopoError::MalformedAnalysisInput(format!(
                    "{} has {} samples, brightnessProfile has {}",
                    name,
                    profile.len(),
                    self.len()
                )));
            }
            if profile.iter().any(|v| !v.is_finite()) {
                return Err(TopoError::MalformedAnalysisInput(format!(
                    "{} contains non-finite values",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Options for [`analyze_for_linear_landscape`]
#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeAnalysisOptions {
    /// Row to sample (default: middle of the image)
    pub row_index: Option<usize>,
    pub average_rows: bool,
    pub rows_to_average: usize,
    pub max_samples: usize,
    pub include_depth: bool,
    pub include_ridges: bool,
    /// Use the Sobel-weighted gradient for ridges (default: false)
    pub weighted_ridges: bool,
}

impl Default for LandscapeAnalysisOptions {
    fn default() -> Self {
        Self {
            row_index: None,
            average_rows: false,
            rows_to_average: 5,
            max_samples: 128,
            include_depth: true,
            include_ridges: false,
            weighted_ridges: false,
        }
    }
}

/// Analysis settings shared by the multi-voice analyzer and the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Cap on samples per profile (default: 128)
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Average a band of rows instead of sampling one (default: true)
    #[serde(default = "default_true")]
    pub average_rows: bool,

    #[serde(default = "default_rows_to_average")]
    pub rows_to_average: usize,

    /// Contrast window for the depth heuristic (default: 5)
    #[serde(default = "default_depth_window")]
    pub depth_window: usize,

    /// Moving-average window for the horizon contour (default: 7)
    #[serde(default = "default_horizon_smoothing")]
    pub horizon_smoothing: usize,

    #[serde(default = "default_brightness_threshold")]
    pub brightness_threshold: f64,

    #[serde(default = "default_gradient_threshold")]
    pub gradient_threshold: f64,

    /// Variance window for texture (default: 8)
    #[serde(default = "default_texture_window")]
    pub texture_window: usize,

    /// Rows sampled for texture (default: 5)
    #[serde(default = "default_texture_rows")]
    pub texture_rows: usize,

    /// Sobel-weighted ridge gradient instead of the central difference
    #[serde(default)]
    pub weighted_ridges: bool,
}

fn default_max_samples() -> usize { 128 }
fn default_true() -> bool { true }
fn default_rows_to_average() -> usize { 5 }
fn default_depth_window() -> usize { DEFAULT_DEPTH_WINDOW }
fn default_horizon_smoothing() -> usize { DEFAULT_CONTOUR_SMOOTHING }
fn default_brightness_threshold() -> f64 { 30.0 }
fn default_gradient_threshold() -> f64 { 20.0 }
fn default_texture_window() -> usize { DEFAULT_TEXTURE_WINDOW }
fn default_texture_rows() -> usize { DEFAULT_TEXTURE_ROWS }

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            average_rows: true,
            rows_to_average: default_rows_to_average(),
            depth_window: default_depth_window(),
            horizon_smoothing: default_horizon_smoothing(),
            brightness_threshold: default_brightness_threshold(),
            gradient_threshold: default_gradient_threshold(),
            texture_window: default_texture_window(),
            texture_rows: default_texture_rows(),
            weighted_ridges: false,
        }
    }
}

impl AnalysisOptions {
    pub fn horizon(&self) -> HorizonOptions {
        HorizonOptions {
            brightness_threshold: self.brightness_threshold,
            gradient_threshold: self.gradient_threshold,
        }
    }

    pub fn ridge_method(&self) -> RidgeMethod {
        RidgeMethod::from_weighted(self.weighted_ridges)
    }

    /// Landscape settings equivalent to these options, with ridges included
    pub fn landscape(&self) -> LandscapeAnalysisOptions {
        LandscapeAnalysisOptions {
            row_index: None,
            average_rows: self.average_rows,
            rows_to_average: self.rows_to_average,
            max_samples: self.max_samples,
            include_depth: true,
            include_ridges: true,
            weighted_ridges: self.weighted_ridges,
        }
    }
}

/// Centre-row brightness, single or band-averaged, with its sampling label
fn sample_brightness(
    pixels: &PixelBuffer,
    row_index: usize,
    average_rows: bool,
    rows_to_average: usize,
) -> (Vec<f64>, &'static str) {
    if average_rows {
        (averaged_brightness(pixels, row_index, rows_to_average), "averaged")
    } else {
        (brightness_row(pixels, row_index), "single-row")
    }
}

/// Horizontal brightness profile for LINEAR_LANDSCAPE, with optional depth
/// and ridge profiles computed from the downsampled brightness.
pub fn analyze_for_linear_landscape(
    pixels: &PixelBuffer,
    options: &LandscapeAnalysisOptions,
) -> ImageAnalysisResult {
    let row_index = options.row_index.unwrap_or(pixels.height() / 2);
    let (brightness, method) =
        sample_brightness(pixels, row_index, options.average_rows, options.rows_to_average);
    let brightness = downsample_profile(&brightness, options.max_samples);

    log::debug!(
        "landscape analysis of {}x{} image: {} samples ({})",
        pixels.width(),
        pixels.height(),
        brightness.len(),
        method
    );

    let ridge_method = RidgeMethod::from_weighted(options.weighted_ridges);
    let mut metadata = AnalysisMetadata::sampled(method, row_index);
    if options.include_ridges {
        metadata.edge_detection_method = Some(ridge_method.label().to_string());
    }

    ImageAnalysisResult {
        width: pixels.width(),
        height: pixels.height(),
        depth_profile: options
            .include_depth
            .then(|| depth_profile(&brightness, DEFAULT_DEPTH_WINDOW)),
        ridge_strength: options
            .include_ridges
            .then(|| detect_ridges(&brightness, ridge_method)),
        metadata: Some(metadata),
        brightness_profile: brightness,
        ..ImageAnalysisResult::default()
    }
}

/// Averaged brightness with depth and ridges for DEPTH_RIDGE.
///
/// A smoothing window, when given, is applied to the ridge profile.
pub fn analyze_for_depth_ridge(pixels: &PixelBuffer, smoothing_window: Option<usize>) -> ImageAnalysisResult {
    analyze_for_depth_ridge_with(pixels, smoothing_window, RidgeMethod::CentralDifference)
}

/// [`analyze_for_depth_ridge`] with an explicit ridge gradient
pub fn analyze_for_depth_ridge_with(
    pixels: &PixelBuffer,
    smoothing_window: Option<usize>,
    ridge_method: RidgeMethod,
) -> ImageAnalysisResult {
    let options = LandscapeAnalysisOptions {
        weighted_ridges: ridge_method == RidgeMethod::SobelWeighted,
        average_rows: true,
        include_depth: true,
        include_ridges: true,
        ..LandscapeAnalysisOptions::default()
    };
    let mut result = analyze_for_linear_landscape(pixels, &options);

    if let (Some(window), Some(ridges)) = (smoothing_window, result.ridge_strength.as_mut()) {
        *ridges = smooth_profile(ridges, window);
    }
    result
}

/// All five profiles for the multi-voice composer, each capped to
/// `max_samples` so they share one sample count.
pub fn analyze_for_multi_voice(pixels: &PixelBuffer, options: &AnalysisOptions) -> ImageAnalysisResult {
    let row_index = pixels.height() / 2;
    let (brightness, method) =
        sample_brightness(pixels, row_index, options.average_rows, options.rows_to_average);
    let brightness = downsample_profile(&brightness, options.max_samples);

    let horizon = horizon_contour(pixels, &options.horizon(), options.horizon_smoothing);
    let texture = texture_profile(pixels, options.texture_window, options.texture_rows);

    log::debug!(
        "multi-voice analysis of {}x{} image: {} samples",
        pixels.width(),
        pixels.height(),
        brightness.len()
    );

    let ridge_method = options.ridge_method();
    let mut metadata = AnalysisMetadata::sampled(method, row_index);
    metadata.edge_detection_method = Some(ridge_method.label().to_string());

    ImageAnalysisResult {
        width: pixels.width(),
        height: pixels.height(),
        ridge_strength: Some(detect_ridges(&brightness, ridge_method)),
        depth_profile: Some(depth_profile(&brightness, options.depth_window)),
        horizon_profile: Some(downsample_profile(&horizon, options.max_samples)),
        texture_profile: Some(downsample_profile(&texture, options.max_samples)),
        metadata: Some(metadata),
        brightness_profile: brightness,
    }
}

/// Coarse single-row preview: 32 samples, brightness only
pub fn analyze_quick(pixels: &PixelBuffer) -> ImageAnalysisResult {
    let options = LandscapeAnalysisOptions {
        max_samples: 32,
        include_depth: false,
        include_ridges: false,
        average_rows: false,
        ..LandscapeAnalysisOptions::default()
    };
    analyze_for_linear_landscape(pixels, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::buffer::fixtures::gray_image;

    fn boundary_image() -> (Vec<u8>, usize, usize) {
        let row: &[u8] = &[0, 0, 255];
        gray_image(&[row, row, row])
    }

    #[test]
    fn test_landscape_center_row() {
        let (data, w, h) = boundary_image();
        let pixels = PixelBuffer::new(&data, w, h).unwrap();
        let result = analyze_for_linear_landscape(&pixels, &LandscapeAnalysisOptions::default());

        assert_eq!(result.len(), 3);
        assert!(result.brightness_profile[0].abs() < 1e-9);
        assert!((result.brightness_profile[2] - 255.0).abs() < 1e-6);
        assert_eq!(result.depth_profile.as_ref().map(Vec::len), Some(3));
        assert!(result.ridge_strength.is_none());

        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.sampling_method.as_deref(), Some("single-row"));
        assert_eq!(metadata.row_index, Some(1));
    }

    #[test]
    fn test_depth_ridge_finds_boundary() {
        let (data, w, h) = boundary_image();
        let pixels = PixelBuffer::new(&data, w, h).unwrap();
        let result = analyze_for_depth_ridge(&pixels, None);

        let ridges = result.ridge_strength.as_ref().unwrap();
        assert_eq!(ridges.len(), 3);
        assert_eq!(result.depth_profile.as_ref().unwrap().len(), 3);
        assert!(ridges[2] > 0.9);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_ridge_method_is_recorded() {
        let (data, w, h) = boundary_image();
        let pixels = PixelBuffer::new(&data, w, h).unwrap();

        let plain = analyze_for_depth_ridge(&pixels, None);
        let method = plain.metadata.as_ref().and_then(|m| m.edge_detection_method.as_deref());
        assert_eq!(method, Some("central-difference"));

        let weighted = analyze_for_depth_ridge_with(&pixels, None, RidgeMethod::SobelWeighted);
        let method = weighted.metadata.as_ref().and_then(|m| m.edge_detection_method.as_deref());
        assert_eq!(method, Some("sobel-weighted"));
        // the last sample still carries the strongest edge
        assert_eq!(weighted.ridge_strength.as_ref().unwrap()[2], 1.0);

        let options = AnalysisOptions { weighted_ridges: true, ..AnalysisOptions::default() };
        assert!(options.landscape().weighted_ridges);
        let result = analyze_for_multi_voice(&pixels, &options);
        let method = result.metadata.as_ref().and_then(|m| m.edge_detection_method.as_deref());
        assert_eq!(method, Some("sobel-weighted"));
    }

    #[test]
    fn test_option_defaults_follow_module_constants() {
        let options = AnalysisOptions::default();
        assert_eq!(options.horizon_smoothing, DEFAULT_CONTOUR_SMOOTHING);
        assert_eq!(options.texture_window, DEFAULT_TEXTURE_WINDOW);
        assert_eq!(options.texture_rows, DEFAULT_TEXTURE_ROWS);
        assert!(!options.weighted_ridges);

        let parsed: AnalysisOptions = serde_yaml::from_str("max_samples: 16").unwrap();
        assert_eq!(parsed, AnalysisOptions { max_samples: 16, ..AnalysisOptions::default() });
    }

    #[test]
    fn test_multi_voice_profiles_share_length() {
        let rows: Vec<Vec<u8>> = (0..20)
            .map(|y| (0..200).map(|x| ((x * 7 + y * 13) % 256) as u8).collect())
            .collect();
        let refs: Vec<&[u8]> = rows.iter().map(Vec::as_slice).collect();
        let (data, w, h) = gray_image(&refs);
        let pixels = PixelBuffer::new(&data, w, h).unwrap();

        let options = AnalysisOptions { max_samples: 50, ..AnalysisOptions::default() };
        let result = analyze_for_multi_voice(&pixels, &options);

        assert_eq!(result.len(), 50);
        for profile in [
            &result.ridge_strength,
            &result.depth_profile,
            &result.horizon_profile,
            &result.texture_profile,
        ] {
            assert_eq!(profile.as_ref().map(Vec::len), Some(50));
        }
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_empty_image_analyzes_to_empty_profiles() {
        let pixels = PixelBuffer::new(&[], 0, 0).unwrap();
        let result = analyze_for_multi_voice(&pixels, &AnalysisOptions::default());
        assert!(result.is_empty());
        assert_eq!(result.horizon_profile, Some(Vec::new()));

        let quick = analyze_quick(&pixels);
        assert!(quick.is_empty());
        assert!(quick.depth_profile.is_none());
    }

    #[test]
    fn test_quick_caps_samples() {
        let row: Vec<u8> = (0..100).map(|x| x as u8).collect();
        let (data, w, h) = gray_image(&[&row]);
        let pixels = PixelBuffer::new(&data, w, h).unwrap();
        assert_eq!(analyze_quick(&pixels).len(), 32);
    }

    #[test]
    fn test_validate_rejects_mismatched_lengths() {
        let result = ImageAnalysisResult::from_brightness(vec![0.0, 128.0, 255.0])
            .with_depth(vec![0.0, 1.0]);
        assert!(matches!(result.validate(), Err(TopoError::MalformedAnalysisInput(_))));

        let result = ImageAnalysisResult::from_brightness(vec![0.0, f64::NAN]);
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_json_field_names() {
        let result = ImageAnalysisResult::from_brightness(vec![10.0]).with_ridges(vec![1.0]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["brightnessProfile"][0], 10.0);
        assert_eq!(json["ridgeStrength"][0], 1.0);
        assert!(json.get("depthProfile").is_none());

        let parsed: ImageAnalysisResult = serde_json::from_str(
            r#"{"width":2,"height":1,"brightnessProfile":[1,2],"metadata":{"timestamp":5}}"#,
        )
        .unwrap();
        assert_eq!(parsed.metadata.unwrap().timestamp_ms, Some(5));
    }
}
