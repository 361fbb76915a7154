//! Mapping from image profiles to note events
//!
//! Pitch and scale utilities, the note event model, the single-voice mappers
//! and the post-processing transforms.

mod linear;
mod note;
mod pitch;
mod ridge;
mod scale;
mod transform;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::ImageAnalysisResult;
use crate::error::Result;

pub use linear::{map_linear_landscape, LandscapeMapper, LandscapeOptions, TABLE_OCTAVES, TABLE_START_OCTAVE};
pub use note::{Effects, NoteEvent, FILTER_CUTOFF, REVERB_SEND};
pub use pitch::{
    beats_to_seconds, checked_midi_to_pitch, midi_to_frequency_hz, midi_to_pitch, pitch_to_frequency_hz,
    pitch_to_midi, CHROMATIC_NOTES, MAX_MIDI,
};
pub use ridge::{map_depth_ridge, DepthRidgeOptions, RidgeMapper};
pub use scale::{brightness_to_scale_index, scale_notes, value_to_scale_index, Key, Scale};
pub use transform::{
    quantize, scale_velocity, transpose_notes, NoteTransform, Quantize, Transpose, TransformPipeline,
    VelocityScale,
};

/// Turns one analysis into a note sequence
pub trait NoteMapper: Send + Sync {
    /// Get the name of this mapper
    fn name(&self) -> &str;

    fn map(&self, analysis: &ImageAnalysisResult) -> Result<Vec<NoteEvent>>;
}

/// Which mapping algorithm produces the notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingMode {
    LinearLandscape,
    DepthRidge,
    #[default]
    MultiVoice,
}

impl MappingMode {
    pub const ALL: [MappingMode; 3] = [
        MappingMode::LinearLandscape,
        MappingMode::DepthRidge,
        MappingMode::MultiVoice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MappingMode::LinearLandscape => "LINEAR_LANDSCAPE",
            MappingMode::DepthRidge => "DEPTH_RIDGE",
            MappingMode::MultiVoice => "MULTI_VOICE",
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingMode {
    type Err = String;

    /// Accepts the serialized tags and kebab/lower-case spellings
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        MappingMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| format!("unknown mapping mode: {}", s))
    }
}
