//! Voice definitions for multi-voice composition

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopoError};
use crate::mapping::pitch_to_midi;

/// One of the four composition layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceKind {
    Bass,
    Melody,
    Pad,
    Fx,
}

impl VoiceKind {
    /// Rendering order of the voices
    pub const ALL: [VoiceKind; 4] = [VoiceKind::Bass, VoiceKind::Melody, VoiceKind::Pad, VoiceKind::Fx];

    /// Track tag written into every event of this voice
    pub fn name(self) -> &'static str {
        match self {
            VoiceKind::Bass => "bass",
            VoiceKind::Melody => "melody",
            VoiceKind::Pad => "pad",
            VoiceKind::Fx => "fx",
        }
    }

    /// Onset stride in samples at full density
    pub fn base_stride(self) -> usize {
        match self {
            VoiceKind::Bass => 8,
            VoiceKind::Melody => 2,
            VoiceKind::Pad => 16,
            VoiceKind::Fx => 4,
        }
    }
}

impl fmt::Display for VoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn default_enabled() -> bool {
    true
}

/// Range and dynamics of one voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lowest pitch, e.g. "C2"
    pub min_note: String,
    /// Highest pitch, inclusive
    pub max_note: String,
    /// 0 (sparse) to 1 (dense)
    pub density: f64,
    pub duration_factor: f64,
    pub velocity_min: f64,
    pub velocity_max: f64,
    pub reverb_send: f64,
    pub filter_brightness: f64,
    /// 0 (centred) to 1 (full width)
    pub stereo_spread: f64,
}

impl VoiceConfig {
    /// Built-in configuration used when no preset is given
    pub fn default_for(kind: VoiceKind) -> Self {
        let (enabled, min, max, density, vel, reverb, filter, spread) = match kind {
            VoiceKind::Bass => (true, "C2", "C3", 0.3, (0.6, 0.9), 0.15, 0.4, 0.0),
            VoiceKind::Melody => (true, "C4", "C6", 0.6, (0.6, 1.0), 0.3, 0.6, 0.6),
            VoiceKind::Pad => (true, "C3", "B4", 0.2, (0.4, 0.7), 0.5, 0.5, 0.2),
            VoiceKind::Fx => (false, "C3", "C6", 0.3, (0.2, 0.5), 0.8, 0.5, 0.9),
        };
        Self {
            enabled,
            min_note: min.to_string(),
            max_note: max.to_string(),
            density,
            duration_factor: 1.0,
            velocity_min: vel.0,
            velocity_max: vel.1,
            reverb_send: reverb,
            filter_brightness: filter,
            stereo_spread: spread,
        }
    }

    /// MIDI bounds of the pitch window
    pub fn midi_range(&self) -> Result<(u8, u8)> {
        Ok((pitch_to_midi(&self.min_note)?, pitch_to_midi(&self.max_note)?))
    }

    /// Check that the pitch window parses and is ordered, and that every
    /// level sits in its range.
    pub fn validate(&self) -> Result<()> {
        let (min, max) = self.midi_range()?;
        if min > max {
            return Err(TopoError::InvalidVoiceConfig(format!(
                "minNote {} is above maxNote {}",
                self.min_note, self.max_note
            )));
        }
        if !(self.duration_factor.is_finite() && self.duration_factor > 0.0) {
            return Err(TopoError::InvalidVoiceConfig(format!(
                "durationFactor must be positive, got {}",
                self.duration_factor
            )));
        }
        if self.velocity_min > self.velocity_max {
            return Err(TopoError::InvalidVoiceConfig(format!(
                "velocityMin {} is above velocityMax {}",
                self.velocity_min, self.velocity_max
            )));
        }

        let unit = [
            ("density", self.density),
            ("velocityMin", self.velocity_min),
            ("velocityMax", self.velocity_max),
            ("reverbSend", self.reverb_send),
            ("filterBrightness", self.filter_brightness),
            ("stereoSpread", self.stereo_spread),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(TopoError::InvalidVoiceConfig(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// How strongly each feature profile steers a voice
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingBias {
    #[serde(default)]
    pub horizon_weight: f64,
    #[serde(default)]
    pub ridge_weight: f64,
    #[serde(default)]
    pub texture_weight: f64,
    #[serde(default)]
    pub depth_weight: f64,
}

impl MappingBias {
    /// Each voice follows its natural profile: horizon for bass, ridges for
    /// melody, texture for pad, depth for fx
    pub fn default_for(kind: VoiceKind) -> Self {
        let mut bias = Self::default();
        match kind {
            VoiceKind::Bass => bias.horizon_weight = 1.0,
            VoiceKind::Melody => bias.ridge_weight = 1.0,
            VoiceKind::Pad => bias.texture_weight = 1.0,
            VoiceKind::Fx => bias.depth_weight = 1.0,
        }
        bias
    }
}

/// One value per voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSet<T> {
    pub bass: T,
    pub melody: T,
    pub pad: T,
    pub fx: T,
}

impl<T> VoiceSet<T> {
    /// Build a set by calling `f` for every voice
    pub fn from_fn(mut f: impl FnMut(VoiceKind) -> T) -> Self {
        Self {
            bass: f(VoiceKind::Bass),
            melody: f(VoiceKind::Melody),
            pad: f(VoiceKind::Pad),
            fx: f(VoiceKind::Fx),
        }
    }

    pub fn get(&self, kind: VoiceKind) -> &T {
        match kind {
            VoiceKind::Bass => &self.bass,
            VoiceKind::Melody => &self.melody,
            VoiceKind::Pad => &self.pad,
            VoiceKind::Fx => &self.fx,
        }
    }

    pub fn get_mut(&mut self, kind: VoiceKind) -> &mut T {
        match kind {
            VoiceKind::Bass => &mut self.bass,
            VoiceKind::Melody => &mut self.melody,
            VoiceKind::Pad => &mut self.pad,
            VoiceKind::Fx => &mut self.fx,
        }
    }

    /// Voices with their values, in rendering order
    pub fn iter(&self) -> impl Iterator<Item = (VoiceKind, &T)> {
        VoiceKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

impl Default for VoiceSet<VoiceConfig> {
    fn default() -> Self {
        Self::from_fn(VoiceConfig::default_for)
    }
}

impl Default for VoiceSet<MappingBias> {
    fn default() -> Self {
        Self::from_fn(MappingBias::default_for)
    }
}
