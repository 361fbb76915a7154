//! Multi-voice composition
//!
//! Every enabled voice blends the feature profiles by its mapping bias,
//! samples onsets at a stride set by its density and maps the blended value
//! into its own pitch window. The voices are then merged in time order.

use super::presets::TopoPreset;
use super::voice::{MappingBias, VoiceConfig, VoiceKind, VoiceSet};
use crate::analysis::{ImageAnalysisResult, TextureLevel};
use crate::error::{Result, TopoError};
use crate::mapping::{
    pitch_to_midi, scale_notes, value_to_scale_index, Key, NoteEvent, NoteMapper, Scale, FILTER_CUTOFF,
    REVERB_SEND,
};

/// Densities below this are treated as this value when computing strides
pub const MIN_DENSITY: f64 = 0.05;

/// Options for [`compose_multi_voice`]
#[derive(Debug, Clone, PartialEq)]
pub struct MultiVoiceOptions {
    pub key: Key,
    pub scale: Scale,
    pub enable_bass: bool,
    pub enable_melody: bool,
    pub enable_pad: bool,
    pub enable_fx: bool,
    /// Beats spanned by one profile sample (default: 0.25)
    pub beats_per_sample: f64,
}

impl MultiVoiceOptions {
    pub fn new(key: Key, scale: Scale) -> Self {
        Self {
            key,
            scale,
            enable_bass: true,
            enable_melody: true,
            enable_pad: true,
            enable_fx: true,
            beats_per_sample: 0.25,
        }
    }

    pub fn voice_enabled(&self, kind: VoiceKind) -> bool {
        match kind {
            VoiceKind::Bass => self.enable_bass,
            VoiceKind::Melody => self.enable_melody,
            VoiceKind::Pad => self.enable_pad,
            VoiceKind::Fx => self.enable_fx,
        }
    }
}

impl Default for MultiVoiceOptions {
    fn default() -> Self {
        Self::new(Key::C, Scale::major())
    }
}

/// Scale degrees stacked above the root for a pad chord
fn chord_degrees(level: TextureLevel) -> &'static [usize] {
    match level {
        TextureLevel::Low => &[0, 4],
        TextureLevel::Medium => &[0, 2, 4],
        TextureLevel::High => &[0, 2, 4, 6],
    }
}

/// Weighted mean of the available profiles, one value per sample.
///
/// Profiles that are missing or carry zero weight are ignored. With nothing
/// left the blend falls back to normalized brightness.
pub fn blend_profiles(analysis: &ImageAnalysisResult, bias: &MappingBias) -> Vec<f64> {
    let sources: Vec<(&[f64], f64)> = [
        (analysis.horizon_profile.as_deref(), bias.horizon_weight),
        (analysis.ridge_strength.as_deref(), bias.ridge_weight),
        (analysis.texture_profile.as_deref(), bias.texture_weight),
        (analysis.depth_profile.as_deref(), bias.depth_weight),
    ]
    .into_iter()
    .filter_map(|(profile, weight)| profile.filter(|_| weight > 0.0).map(|p| (p, weight)))
    .collect();

    let total: f64 = sources.iter().map(|(_, w)| w).sum();
    (0..analysis.len())
        .map(|i| {
            let value = if total > 0.0 {
                sources.iter().map(|(p, w)| p[i] * w).sum::<f64>() / total
            } else {
                analysis.brightness_profile[i] / 255.0
            };
            value.clamp(0.0, 1.0)
        })
        .collect()
}

/// Scale notes inside a voice's pitch window, lowest first
pub fn voice_pitch_table(key: Key, scale: &Scale, config: &VoiceConfig) -> Result<Vec<String>> {
    let (min, max) = config.midi_range()?;
    if min > max {
        return Err(TopoError::InvalidVoiceConfig(format!(
            "minNote {} is above maxNote {}",
            config.min_note, config.max_note
        )));
    }
    let min_octave = min as i32 / 12 - 1;
    let max_octave = max as i32 / 12 - 1;
    let octaves = (max_octave - min_octave + 2) as u32;

    Ok(scale_notes(key, scale, octaves, min_octave - 1)
        .into_iter()
        .filter(|note| pitch_to_midi(note).is_ok_and(|m| (min..=max).contains(&m)))
        .collect())
}

/// Onset stride in samples for a voice at the given density.
///
/// The base stride is doubled until it covers `base / density`, so every
/// stride is `base * 2^k` and the onsets of a sparser setting are a subset
/// of the onsets of a denser one.
pub fn voice_stride(kind: VoiceKind, density: f64) -> usize {
    let density = if density.is_nan() { MIN_DENSITY } else { density.clamp(MIN_DENSITY, 1.0) };
    let base = kind.base_stride().max(1);
    let target = base as f64 / density;

    let mut stride = base;
    while (stride as f64) < target {
        stride *= 2;
    }
    stride
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Composes up to four voices from one analysis
#[derive(Debug, Clone)]
pub struct Composer {
    options: MultiVoiceOptions,
    voices: VoiceSet<VoiceConfig>,
    bias: VoiceSet<MappingBias>,
}

impl Composer {
    /// Composer with the built-in voice defaults
    pub fn new(options: MultiVoiceOptions) -> Self {
        Self {
            options,
            voices: VoiceSet::default(),
            bias: VoiceSet::default(),
        }
    }

    /// Composer using a preset's voices and mapping bias. The preset itself
    /// is left untouched.
    pub fn with_preset(options: MultiVoiceOptions, preset: &TopoPreset) -> Self {
        Self {
            options,
            voices: preset.voices.clone(),
            bias: preset.mapping_bias.clone(),
        }
    }

    pub fn options(&self) -> &MultiVoiceOptions {
        &self.options
    }

    pub fn voices(&self) -> &VoiceSet<VoiceConfig> {
        &self.voices
    }

    /// Enabled both by the options flag and by the voice configuration
    pub fn is_enabled(&self, kind: VoiceKind) -> bool {
        self.options.voice_enabled(kind) && self.voices.get(kind).enabled
    }

    /// Merged, time-ordered notes of every enabled voice
    pub fn compose(&self, analysis: &ImageAnalysisResult) -> Result<Vec<NoteEvent>> {
        analysis.validate()?;

        let mut notes = Vec::new();
        for kind in VoiceKind::ALL {
            if !self.is_enabled(kind) {
                continue;
            }
            let voice_notes = self.render_voice(kind, analysis)?;
            log::debug!("{} voice: {} notes", kind, voice_notes.len());
            notes.extend(voice_notes);
        }

        notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(notes)
    }

    fn render_voice(&self, kind: VoiceKind, analysis: &ImageAnalysisResult) -> Result<Vec<NoteEvent>> {
        let config = self.voices.get(kind);
        config.validate()?;

        let table = voice_pitch_table(self.options.key, &self.options.scale, config)?;
        if table.is_empty() {
            log::warn!(
                "{} voice window {}..{} holds no {} notes, skipping",
                kind,
                config.min_note,
                config.max_note,
                self.options.scale.name()
            );
            return Ok(Vec::new());
        }

        let values = blend_profiles(analysis, self.bias.get(kind));
        let n = values.len();
        let stride = voice_stride(kind, config.density);
        let bps = self.options.beats_per_sample;
        let duration = stride as f64 * bps * config.duration_factor;

        let mut notes = Vec::new();
        for position in (0..n).step_by(stride) {
            let value = values[position];
            let root = value_to_scale_index(value, table.len());
            let pan = if n > 1 {
                ((position as f64 / (n - 1) as f64) * 2.0 - 1.0) * config.stereo_spread
            } else {
                0.0
            };

            let degrees: &[usize] = match kind {
                VoiceKind::Pad => {
                    let texture = analysis
                        .texture_profile
                        .as_deref()
                        .map_or(value, |t| t[position]);
                    chord_degrees(TextureLevel::classify(texture))
                }
                _ => &[0],
            };

            for degree in degrees {
                let Some(pitch) = table.get(root + degree) else { continue };
                notes.push(
                    NoteEvent::new(
                        pitch.clone(),
                        position as f64 * bps,
                        duration,
                        lerp(config.velocity_min, config.velocity_max, value),
                    )
                    .with_pan(pan)
                    .with_voice(kind.name())
                    .with_effect(REVERB_SEND, config.reverb_send)
                    .with_effect(FILTER_CUTOFF, config.filter_brightness),
                );
            }
        }
        Ok(notes)
    }
}

impl NoteMapper for Composer {
    fn name(&self) -> &str {
        "multi-voice"
    }

    fn map(&self, analysis: &ImageAnalysisResult) -> Result<Vec<NoteEvent>> {
        self.compose(analysis)
    }
}

/// Compose with an optional preset; `None` uses the built-in voice defaults
pub fn compose_multi_voice(
    analysis: &ImageAnalysisResult,
    options: &MultiVoiceOptions,
    preset: Option<&TopoPreset>,
) -> Result<Vec<NoteEvent>> {
    let composer = match preset {
        Some(preset) => Composer::with_preset(options.clone(), preset),
        None => Composer::new(options.clone()),
    };
    composer.compose(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::PresetCatalog;

    fn landscape(n: usize) -> ImageAnalysisResult {
        let ramp: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1).max(1) as f64).collect();
        ImageAnalysisResult::from_brightness(ramp.iter().map(|v| v * 255.0).collect())
            .with_horizon(ramp.clone())
            .with_ridges(ramp.iter().map(|v| 1.0 - v).collect())
            .with_texture(vec![0.5; n])
            .with_depth(ramp)
    }

    #[test]
    fn test_output_sorted_and_tagged() {
        let notes = compose_multi_voice(&landscape(64), &MultiVoiceOptions::default(), None).unwrap();
        assert!(!notes.is_empty());
        assert!(notes.windows(2).all(|w| w[0].start <= w[1].start));
        for note in &notes {
            let voice = note.voice.as_deref().unwrap();
            assert!(["bass", "melody", "pad"].contains(&voice), "unexpected voice {}", voice);
            assert!(note.validate().is_ok());
        }
    }

    #[test]
    fn test_pitches_stay_in_voice_windows() {
        let composer = Composer::new(MultiVoiceOptions::default());
        let notes = composer.compose(&landscape(64)).unwrap();
        for note in notes {
            let kind = match note.voice.as_deref() {
                Some("bass") => VoiceKind::Bass,
                Some("melody") => VoiceKind::Melody,
                Some("pad") => VoiceKind::Pad,
                other => panic!("unexpected voice {:?}", other),
            };
            let (min, max) = composer.voices().get(kind).midi_range().unwrap();
            let midi = note.midi().unwrap();
            assert!((min..=max).contains(&midi), "{} outside {:?}", note.pitch, (min, max));
        }
    }

    #[test]
    fn test_all_voices_disabled_is_empty() {
        let options = MultiVoiceOptions {
            enable_bass: false,
            enable_melody: false,
            enable_pad: false,
            enable_fx: false,
            ..MultiVoiceOptions::default()
        };
        assert!(compose_multi_voice(&landscape(32), &options, None).unwrap().is_empty());
    }

    #[test]
    fn test_disabled_voice_is_absent() {
        let analysis = landscape(64);
        let all = compose_multi_voice(&analysis, &MultiVoiceOptions::default(), None).unwrap();
        let options = MultiVoiceOptions { enable_melody: false, ..MultiVoiceOptions::default() };
        let without = compose_multi_voice(&analysis, &options, None).unwrap();

        let count = |notes: &[NoteEvent], voice: &str| {
            notes.iter().filter(|n| n.voice.as_deref() == Some(voice)).count()
        };
        assert_eq!(count(&without, "melody"), 0);
        assert!(count(&all, "melody") > 0);
        for voice in ["bass", "pad"] {
            assert!(count(&all, voice) > 0);
            assert_eq!(count(&without, voice), count(&all, voice), "{} count changed", voice);
        }
        assert_eq!(without.len(), all.len() - count(&all, "melody"));
    }

    #[test]
    fn test_density_is_monotonic() {
        let analysis = landscape(100);
        let count = |density: f64| {
            let mut composer = Composer::new(MultiVoiceOptions {
                enable_bass: false,
                enable_pad: false,
                ..MultiVoiceOptions::default()
            });
            composer.voices.melody.density = density;
            composer.compose(&analysis).unwrap().len()
        };

        let mut previous = 0;
        for density in [0.0, 0.1, 0.25, 0.5, 0.75, 1.0] {
            let notes = count(density);
            assert!(notes >= previous, "density {} gave {} < {}", density, notes, previous);
            previous = notes;
        }
        assert_eq!(count(1.0), 50);
    }

    #[test]
    fn test_voice_stride_doubles_from_base() {
        assert_eq!(voice_stride(VoiceKind::Melody, 1.0), 2);
        assert_eq!(voice_stride(VoiceKind::Melody, 0.5), 4);
        assert_eq!(voice_stride(VoiceKind::Melody, 0.3), 8);
        assert_eq!(voice_stride(VoiceKind::Bass, 0.3), 32);
        assert_eq!(voice_stride(VoiceKind::Pad, 0.95), 32);
        assert_eq!(voice_stride(VoiceKind::Fx, 0.0), 4 * 32);
        assert_eq!(voice_stride(VoiceKind::Fx, f64::NAN), 4 * 32);
    }

    #[test]
    fn test_denser_pad_never_loses_notes() {
        // large chords sit on every 16th sample, a smaller one just after
        let mut texture = vec![0.0; 34];
        for i in [0, 16, 32] {
            texture[i] = 0.95;
        }
        texture[17] = 0.7;
        texture[33] = 0.7;
        let analysis = ImageAnalysisResult::from_brightness(vec![0.0; 34]).with_texture(texture);

        let options = MultiVoiceOptions {
            enable_bass: false,
            enable_melody: false,
            enable_fx: false,
            ..MultiVoiceOptions::default()
        };
        let compose_at = |density: f64| {
            let mut composer = Composer::new(options.clone());
            composer.voices.pad.density = density;
            composer.compose(&analysis).unwrap()
        };

        let mut previous: Vec<NoteEvent> = Vec::new();
        for density in [0.05, 0.2, 0.5, 0.9, 0.95, 1.0] {
            let notes = compose_at(density);
            assert!(
                notes.len() >= previous.len(),
                "density {} gave {} < {}",
                density,
                notes.len(),
                previous.len()
            );
            for note in &previous {
                assert!(notes.iter().any(|n| n.start == note.start), "onset {} dropped", note.start);
            }
            previous = notes;
        }

        let onsets = |notes: &[NoteEvent]| {
            let mut starts: Vec<f64> = notes.iter().map(|n| n.start).collect();
            starts.dedup();
            starts
        };
        assert_eq!(onsets(&compose_at(0.95)), vec![0.0, 8.0]);
        assert_eq!(onsets(&compose_at(1.0)), vec![0.0, 4.0, 8.0]);
    }

    #[test]
    fn test_voice_levels_come_from_config() {
        let notes = compose_multi_voice(&landscape(16), &MultiVoiceOptions::default(), None).unwrap();
        let bass: Vec<_> = notes.iter().filter(|n| n.voice.as_deref() == Some("bass")).collect();
        let config = VoiceConfig::default_for(VoiceKind::Bass);

        // stride 8 doubled past 8 / 0.3 is 32 > 16 samples: a single onset at 0
        assert_eq!(bass.len(), 1);
        assert_eq!(bass[0].start, 0.0);
        assert_eq!(bass[0].duration, 32.0 * 0.25);
        assert_eq!(bass[0].pan, Some(0.0));
        assert_eq!(bass[0].effects.reverb_send(), Some(config.reverb_send));
        assert_eq!(bass[0].effects.filter_cutoff(), Some(config.filter_brightness));
        assert!((bass[0].velocity - config.velocity_min).abs() < 1e-9);
    }

    #[test]
    fn test_pad_plays_chords() {
        let mut analysis = landscape(16);
        analysis.texture_profile = Some(vec![0.9; 16]);
        let options = MultiVoiceOptions {
            enable_bass: false,
            enable_melody: false,
            ..MultiVoiceOptions::default()
        };
        let notes = compose_multi_voice(&analysis, &options, None).unwrap();

        // high texture, blended value 0.9: root near the top of C3..B4, so
        // upper chord degrees fall outside the window and are dropped
        assert!(!notes.is_empty());
        assert!(notes.iter().all(|n| n.start == 0.0));
        assert!(notes.len() < 4);

        analysis.texture_profile = Some(vec![0.0; 16]);
        let notes = compose_multi_voice(&analysis, &options, None).unwrap();
        let pitches: Vec<&str> = notes.iter().map(|n| n.pitch.as_str()).collect();
        assert_eq!(pitches, vec!["C3", "G3"]);
    }

    #[test]
    fn test_blend_weights_and_fallback() {
        let analysis = ImageAnalysisResult::from_brightness(vec![255.0, 0.0])
            .with_horizon(vec![0.0, 1.0])
            .with_depth(vec![1.0, 1.0]);

        let bias = MappingBias { horizon_weight: 3.0, depth_weight: 1.0, ..MappingBias::default() };
        assert_eq!(blend_profiles(&analysis, &bias), vec![0.25, 1.0]);

        // ridges are missing, so brightness drives the voice
        let bias = MappingBias { ridge_weight: 1.0, ..MappingBias::default() };
        assert_eq!(blend_profiles(&analysis, &bias), vec![1.0, 0.0]);
    }

    #[test]
    fn test_voice_pitch_table_window() {
        let config = VoiceConfig::default_for(VoiceKind::Bass);
        let table = voice_pitch_table(Key::C, &Scale::major(), &config).unwrap();
        assert_eq!(table, vec!["C2", "D2", "E2", "F2", "G2", "A2", "B2", "C3"]);

        let mut config = VoiceConfig::default_for(VoiceKind::Bass);
        config.min_note = "C#2".to_string();
        config.max_note = "C#2".to_string();
        assert!(voice_pitch_table(Key::C, &Scale::major(), &config).unwrap().is_empty());
    }

    #[test]
    fn test_inverted_voice_window_is_rejected() {
        let mut config = VoiceConfig::default_for(VoiceKind::Bass);
        config.min_note = "C8".to_string();
        config.max_note = "C0".to_string();
        let result = voice_pitch_table(Key::C, &Scale::major(), &config);
        assert!(matches!(result, Err(TopoError::InvalidVoiceConfig(_))));
    }

    #[test]
    fn test_malformed_analysis_is_rejected() {
        let analysis = ImageAnalysisResult::from_brightness(vec![0.0; 4]).with_horizon(vec![0.5; 3]);
        let result = compose_multi_voice(&analysis, &MultiVoiceOptions::default(), None);
        assert!(matches!(result, Err(TopoError::MalformedAnalysisInput(_))));
    }

    #[test]
    fn test_preset_enables_fx_and_is_not_mutated() {
        let catalog = PresetCatalog::builtin().unwrap();
        let preset = catalog.topo_preset("night-city").unwrap().clone();
        let before = preset.clone();

        let options = MultiVoiceOptions::new(preset.default_key, preset.scale().unwrap());
        let notes = compose_multi_voice(&landscape(64), &options, Some(&preset)).unwrap();

        assert!(notes.iter().any(|n| n.voice.as_deref() == Some("fx")));
        assert_eq!(preset, before);
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = ImageAnalysisResult::from_brightness(Vec::new());
        assert!(compose_multi_voice(&analysis, &MultiVoiceOptions::default(), None).unwrap().is_empty());
    }
}
