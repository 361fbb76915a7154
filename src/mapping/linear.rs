//! LINEAR_LANDSCAPE mapping
//!
//! Reads the brightness profile left to right as a melody: one note per
//! sample, laid out back to back.

use super::note::{NoteEvent, FILTER_CUTOFF, REVERB_SEND};
use super::scale::{brightness_to_scale_index, scale_notes, Key, Scale};
use super::NoteMapper;
use crate::analysis::ImageAnalysisResult;
use crate::error::Result;

/// Octaves spanned by the single-voice pitch table
pub const TABLE_OCTAVES: u32 = 3;

/// Lowest octave of the single-voice pitch table
pub const TABLE_START_OCTAVE: i32 = 3;

/// Velocity used when brightness does not drive dynamics
const FLAT_VELOCITY: f64 = 0.7;

/// Options for [`map_linear_landscape`]
#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeOptions {
    pub key: Key,
    pub scale: Scale,
    /// Cap on emitted notes (default: 64)
    pub max_notes: usize,
    /// Length of every note and of every step (default: 0.5)
    pub note_duration_beats: f64,
    pub enable_panning: bool,
    pub enable_velocity_variation: bool,
}

impl LandscapeOptions {
    pub fn new(key: Key, scale: Scale) -> Self {
        Self {
            key,
            scale,
            max_notes: 64,
            note_duration_beats: 0.5,
            enable_panning: true,
            enable_velocity_variation: true,
        }
    }
}

impl Default for LandscapeOptions {
    fn default() -> Self {
        Self::new(Key::C, Scale::major())
    }
}

/// Pitch table shared by the single-voice mappers: octaves 3 to 5
pub(crate) fn pitch_table(key: Key, scale: &Scale) -> Vec<String> {
    scale_notes(key, scale, TABLE_OCTAVES, TABLE_START_OCTAVE)
}

/// Pan for position `i` of `n`, spread evenly from -1 to 1
pub(crate) fn position_pan(i: usize, n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    (i as f64 / (n - 1) as f64) * 2.0 - 1.0
}

/// Map brightness to a back-to-back note sequence.
///
/// Profiles longer than `max_notes` are thinned by stride sampling: output
/// `i` reads `brightness[floor(i * len / max_notes)]`.
pub fn map_linear_landscape(analysis: &ImageAnalysisResult, options: &LandscapeOptions) -> Vec<NoteEvent> {
    let brightness = &analysis.brightness_profile;
    let table = pitch_table(options.key, &options.scale);
    if brightness.is_empty() || table.is_empty() {
        return Vec::new();
    }

    let count = brightness.len().min(options.max_notes);
    let step = brightness.len() as f64 / count as f64;
    let sampled: Vec<f64> = (0..count)
        .map(|i| brightness[((i as f64 * step).floor() as usize).min(brightness.len() - 1)])
        .collect();

    let depth = analysis.depth_profile.as_deref();
    let mut time = 0.0;

    let notes: Vec<NoteEvent> = sampled
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let pitch = table[brightness_to_scale_index(b, table.len())].clone();
            let velocity = if options.enable_velocity_variation {
                0.3 + (b / 255.0) * 0.7
            } else {
                FLAT_VELOCITY
            };
            let pan = if options.enable_panning {
                position_pan(i, count)
            } else {
                0.0
            };
            let reverb = match depth.and_then(|d| d.get(i)) {
                Some(d) => 0.1 + (1.0 - d) * 0.6,
                None => 0.2,
            };

            let note = NoteEvent::new(pitch, time, options.note_duration_beats, velocity)
                .with_pan(pan)
                .with_effect(REVERB_SEND, reverb)
                .with_effect(FILTER_CUTOFF, b / 255.0);
            time += options.note_duration_beats;
            note
        })
        .collect();

    log::debug!("linear landscape: {} samples -> {} notes", brightness.len(), notes.len());
    notes
}

/// [`NoteMapper`] for LINEAR_LANDSCAPE
#[derive(Debug, Clone)]
pub struct LandscapeMapper {
    options: LandscapeOptions,
}

impl LandscapeMapper {
    pub fn new(options: LandscapeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LandscapeOptions {
        &self.options
    }
}

impl NoteMapper for LandscapeMapper {
    fn name(&self) -> &str {
        "linear-landscape"
    }

    fn map(&self, analysis: &ImageAnalysisResult) -> Result<Vec<NoteEvent>> {
        Ok(map_linear_landscape(analysis, &self.options))
    }
}
