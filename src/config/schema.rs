//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analysis::AnalysisOptions;
use crate::compose::{MultiVoiceOptions, TopoPreset};
use crate::mapping::{
    DepthRidgeOptions, Key, LandscapeOptions, MappingMode, Quantize, Scale, TransformPipeline, Transpose,
    VelocityScale,
};

/// Main configuration for TopoSonics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopoConfig {
    /// Feature extraction settings
    #[serde(default)]
    pub analysis: AnalysisOptions,

    /// Mapping mode, musical context and mapper options
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Transforms applied to the mapped notes
    #[serde(default)]
    pub post: PostConfig,

    #[serde(default)]
    pub export: ExportConfig,

    /// Extra preset catalog layered over the built-in one
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

impl TopoConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if analysis.max_samples == 0 {
            bail!("analysis.max_samples must be at least 1");
        }
        let windows = [
            ("rows_to_average", analysis.rows_to_average),
            ("depth_window", analysis.depth_window),
            ("horizon_smoothing", analysis.horizon_smoothing),
            ("texture_window", analysis.texture_window),
            ("texture_rows", analysis.texture_rows),
        ];
        for (name, value) in windows {
            if value == 0 {
                bail!("analysis.{} must be at least 1", name);
            }
        }
        if !(0.0..=255.0).contains(&analysis.brightness_threshold) {
            bail!("analysis.brightness_threshold must be between 0 and 255");
        }
        if !(0.0..=255.0).contains(&analysis.gradient_threshold) {
            bail!("analysis.gradient_threshold must be between 0 and 255");
        }

        let mapping = &self.mapping;
        if let Some(key) = &mapping.key {
            key.parse::<Key>()?;
        }
        if let Some(scale) = &mapping.scale {
            Scale::parse(scale)?;
        }
        if let Some(bpm) = mapping.tempo_bpm {
            if !(20.0..=300.0).contains(&bpm) {
                bail!("BPM must be between 20 and 300");
            }
        }
        if mapping.max_notes == 0 {
            bail!("mapping.max_notes must be at least 1");
        }
        if !(mapping.note_duration_beats.is_finite() && mapping.note_duration_beats > 0.0) {
            bail!("mapping.note_duration_beats must be positive");
        }
        if !(mapping.beats_per_sample.is_finite() && mapping.beats_per_sample > 0.0) {
            bail!("mapping.beats_per_sample must be positive");
        }
        if !(0.0..=1.0).contains(&mapping.ridge_threshold) {
            bail!("mapping.ridge_threshold must be between 0.0 and 1.0");
        }

        if let Some(grid) = self.post.quantize_grid {
            if !(grid.is_finite() && grid > 0.0) {
                bail!("post.quantize_grid must be positive");
            }
        }
        if let Some(factor) = self.post.velocity_scale {
            if !(factor.is_finite() && factor >= 0.0) {
                bail!("post.velocity_scale must not be negative");
            }
        }

        Ok(())
    }
}

/// Musical context and mapper options.
///
/// Key, scale, tempo and mode left unset fall back to the selected preset's
/// defaults, then to C major at 90 BPM in MULTI_VOICE mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub mode: Option<MappingMode>,

    /// Root key, e.g. "C" or "F#"
    #[serde(default)]
    pub key: Option<String>,

    /// Scale name, e.g. "C_MAJOR" or "minor_pentatonic"
    #[serde(default)]
    pub scale: Option<String>,

    #[serde(default)]
    pub tempo_bpm: Option<f64>,

    /// Topo preset id for multi-voice composition
    #[serde(default)]
    pub preset: Option<String>,

    /// Note cap for the single-voice mappers (default: 64)
    #[serde(default = "default_max_notes")]
    pub max_notes: usize,

    /// Step length of the single-voice mappers (default: 0.5)
    #[serde(default = "default_note_duration")]
    pub note_duration_beats: f64,

    /// DEPTH_RIDGE rest threshold (default: 0.5)
    #[serde(default = "default_ridge_threshold")]
    pub ridge_threshold: f64,

    #[serde(default = "default_enabled")]
    pub enable_panning: bool,

    #[serde(default = "default_enabled")]
    pub enable_velocity_variation: bool,

    #[serde(default = "default_enabled")]
    pub depth_to_reverb: bool,

    /// Beats per profile sample in MULTI_VOICE (default: 0.25)
    #[serde(default = "default_beats_per_sample")]
    pub beats_per_sample: f64,

    /// Per-voice switches for MULTI_VOICE
    #[serde(default)]
    pub voices: VoiceToggles,
}

pub const DEFAULT_TEMPO_BPM: f64 = 90.0;
pub const DEFAULT_SCALE: &str = "C_MAJOR";

fn default_max_notes() -> usize { 64 }
fn default_note_duration() -> f64 { 0.5 }
fn default_ridge_threshold() -> f64 { 0.5 }
fn default_enabled() -> bool { true }
fn default_beats_per_sample() -> f64 { 0.25 }

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            mode: None,
            key: None,
            scale: None,
            tempo_bpm: None,
            preset: None,
            max_notes: default_max_notes(),
            note_duration_beats: default_note_duration(),
            ridge_threshold: default_ridge_threshold(),
            enable_panning: true,
            enable_velocity_variation: true,
            depth_to_reverb: true,
            beats_per_sample: default_beats_per_sample(),
            voices: VoiceToggles::default(),
        }
    }
}

impl MappingConfig {
    pub fn mode(&self, preset: Option<&TopoPreset>) -> MappingMode {
        self.mode
            .or_else(|| preset.map(|p| p.mapping_mode))
            .unwrap_or_default()
    }

    pub fn key(&self, preset: Option<&TopoPreset>) -> crate::Result<Key> {
        match (&self.key, preset) {
            (Some(key), _) => key.parse(),
            (None, Some(preset)) => Ok(preset.default_key),
            (None, None) => Ok(Key::default()),
        }
    }

    /// Scale name in effect, before parsing
    pub fn scale_name<'a>(&'a self, preset: Option<&'a TopoPreset>) -> &'a str {
        self.scale
            .as_deref()
            .or_else(|| preset.map(|p| p.default_scale.as_str()))
            .unwrap_or(DEFAULT_SCALE)
    }

    pub fn scale(&self, preset: Option<&TopoPreset>) -> crate::Result<Scale> {
        Scale::parse(self.scale_name(preset))
    }

    pub fn tempo_bpm(&self, preset: Option<&TopoPreset>) -> f64 {
        self.tempo_bpm
            .or_else(|| preset.map(|p| p.default_tempo_bpm))
            .unwrap_or(DEFAULT_TEMPO_BPM)
    }

    pub fn landscape_options(&self, key: Key, scale: Scale) -> LandscapeOptions {
        LandscapeOptions {
            max_notes: self.max_notes,
            note_duration_beats: self.note_duration_beats,
            enable_panning: self.enable_panning,
            enable_velocity_variation: self.enable_velocity_variation,
            ..LandscapeOptions::new(key, scale)
        }
    }

    pub fn depth_ridge_options(&self, key: Key, scale: Scale) -> DepthRidgeOptions {
        DepthRidgeOptions {
            max_notes: self.max_notes,
            note_duration_beats: self.note_duration_beats,
            ridge_threshold: self.ridge_threshold,
            depth_to_reverb: self.depth_to_reverb,
            ..DepthRidgeOptions::new(key, scale)
        }
    }

    pub fn multi_voice_options(&self, key: Key, scale: Scale) -> MultiVoiceOptions {
        MultiVoiceOptions {
            enable_bass: self.voices.bass,
            enable_melody: self.voices.melody,
            enable_pad: self.voices.pad,
            enable_fx: self.voices.fx,
            beats_per_sample: self.beats_per_sample,
            ..MultiVoiceOptions::new(key, scale)
        }
    }
}

/// Which multi-voice layers may play. A voice also needs to be enabled in
/// its preset configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceToggles {
    #[serde(default = "default_enabled")]
    pub bass: bool,
    #[serde(default = "default_enabled")]
    pub melody: bool,
    #[serde(default = "default_enabled")]
    pub pad: bool,
    #[serde(default = "default_enabled")]
    pub fx: bool,
}

impl Default for VoiceToggles {
    fn default() -> Self {
        Self { bass: true, melody: true, pad: true, fx: true }
    }
}

/// Post-processing applied after mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostConfig {
    /// Snap starts and durations to this grid in beats
    #[serde(default)]
    pub quantize_grid: Option<f64>,

    /// Multiply velocities, clamped to 0-1
    #[serde(default)]
    pub velocity_scale: Option<f64>,

    /// Semitones to shift every note
    #[serde(default)]
    pub transpose: i32,
}

impl PostConfig {
    /// Transforms in application order: transpose, quantize, velocity
    pub fn pipeline(&self) -> TransformPipeline {
        let mut pipeline = TransformPipeline::new();
        if self.transpose != 0 {
            pipeline = pipeline.with(Transpose(self.transpose));
        }
        if let Some(grid) = self.quantize_grid {
            pipeline = pipeline.with(Quantize(grid));
        }
        if let Some(factor) = self.velocity_scale {
            pipeline = pipeline.with(VelocityScale(factor));
        }
        pipeline
    }
}

/// Export settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Composition title, also written into the MIDI tempo track
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::PresetCatalog;

    #[test]
    fn test_default_mapping_config() {
        let config: MappingConfig = serde_yaml::from_str("max_notes: 32").unwrap();
        assert_eq!(config.max_notes, 32);
        assert_eq!(config.note_duration_beats, 0.5);
        assert!(config.voices.fx);
        assert_eq!(config.mode(None), MappingMode::MultiVoice);
        assert_eq!(config.key(None).unwrap(), Key::C);
        assert_eq!(config.scale_name(None), "C_MAJOR");
        assert_eq!(config.tempo_bpm(None), 90.0);
    }

    #[test]
    fn test_preset_fills_unset_fields() {
        let catalog = PresetCatalog::builtin().unwrap();
        let preset = catalog.topo_preset("industrial-grid").unwrap();

        let mut config = MappingConfig::default();
        assert_eq!(config.key(Some(preset)).unwrap(), Key::ASharp);
        assert_eq!(config.tempo_bpm(Some(preset)), 110.0);

        config.key = Some("E".to_string());
        config.tempo_bpm = Some(70.0);
        assert_eq!(config.key(Some(preset)).unwrap(), Key::E);
        assert_eq!(config.tempo_bpm(Some(preset)), 70.0);
    }

    #[test]
    fn test_options_carry_config() {
        let config: MappingConfig = serde_yaml::from_str(
            r#"
max_notes: 16
ridge_threshold: 0.7
enable_panning: false
voices:
  pad: false
"#,
        )
        .unwrap();

        let landscape = config.landscape_options(Key::A, Scale::minor());
        assert_eq!(landscape.max_notes, 16);
        assert!(!landscape.enable_panning);
        assert_eq!(landscape.key, Key::A);

        let ridge = config.depth_ridge_options(Key::A, Scale::minor());
        assert_eq!(ridge.ridge_threshold, 0.7);

        let multi = config.multi_voice_options(Key::A, Scale::minor());
        assert!(!multi.enable_pad);
        assert!(multi.enable_melody);
    }

    #[test]
    fn test_post_pipeline() {
        assert!(PostConfig::default().pipeline().is_empty());

        let post: PostConfig = serde_yaml::from_str("quantize_grid: 0.25\nvelocity_scale: 0.5\ntranspose: -2").unwrap();
        assert_eq!(post.pipeline().names(), vec!["transpose", "quantize", "velocity-scale"]);
    }

    #[test]
    fn test_config_validation() {
        assert!(TopoConfig::default().validate().is_ok());

        let mut config = TopoConfig::default();
        config.mapping.tempo_bpm = Some(500.0);
        assert!(config.validate().is_err());

        let mut config = TopoConfig::default();
        config.mapping.scale = Some("lydian-flat-nine".to_string());
        assert!(config.validate().is_err());

        let mut config = TopoConfig::default();
        config.mapping.key = Some("H".to_string());
        assert!(config.validate().is_err());

        let mut config = TopoConfig::default();
        config.analysis.texture_window = 0;
        assert!(config.validate().is_err());

        let mut config = TopoConfig::default();
        config.post.quantize_grid = Some(0.0);
        assert!(config.validate().is_err());

        let mut config = TopoConfig::default();
        config.mapping.ridge_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
