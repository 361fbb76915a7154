//! DEPTH_RIDGE mapping
//!
//! Accent-driven: notes land on ridges, weak positions become short rests.
//! Ridge notes sustain longer than the step they occupy, so strong ridges
//! ring into the following notes.

use super::linear::{pitch_table, position_pan};
use super::note::{NoteEvent, FILTER_CUTOFF, REVERB_SEND};
use super::scale::{brightness_to_scale_index, Key, Scale};
use super::NoteMapper;
use crate::analysis::ImageAnalysisResult;
use crate::error::Result;

/// Extra velocity per unit of ridge strength
pub const RIDGE_VELOCITY_BOOST: f64 = 0.3;

/// Extra duration per unit of ridge strength, as a fraction of the base
pub const RIDGE_DURATION_MULTIPLIER: f64 = 0.5;

/// Rest length for a skipped position, as a fraction of the base duration
pub const RHYTHMIC_GAP_FACTOR: f64 = 0.25;

/// Reverb added per unit of distance (1 - depth)
pub const REVERB_DEPTH_SENSITIVITY: f64 = 0.5;

/// Options for [`map_depth_ridge`]
#[derive(Debug, Clone, PartialEq)]
pub struct DepthRidgeOptions {
    pub key: Key,
    pub scale: Scale,
    /// Positions considered (default: 64)
    pub max_notes: usize,
    /// Step length and base duration (default: 0.5)
    pub note_duration_beats: f64,
    /// Ridge strength below which a position rests (default: 0.5)
    pub ridge_threshold: f64,
    /// Drive reverb from depth (default: true)
    pub depth_to_reverb: bool,
}

impl DepthRidgeOptions {
    pub fn new(key: Key, scale: Scale) -> Self {
        Self {
            key,
            scale,
            max_notes: 64,
            note_duration_beats: 0.5,
            ridge_threshold: 0.5,
            depth_to_reverb: true,
        }
    }
}

impl Default for DepthRidgeOptions {
    fn default() -> Self {
        Self::new(Key::C, Scale::major())
    }
}

/// Map ridges and depth to an accented, possibly overlapping sequence.
///
/// Without a ridge profile every position sounds with zero ridge strength.
pub fn map_depth_ridge(analysis: &ImageAnalysisResult, options: &DepthRidgeOptions) -> Vec<NoteEvent> {
    let brightness = &analysis.brightness_profile;
    let table = pitch_table(options.key, &options.scale);
    if table.is_empty() {
        return Vec::new();
    }

    let ridges = analysis.ridge_strength.as_deref();
    let depth = analysis.depth_profile.as_deref();
    let base = options.note_duration_beats;

    let mut notes = Vec::new();
    let mut time = 0.0;

    for (i, &b) in brightness.iter().take(options.max_notes).enumerate() {
        let ridge = ridges.and_then(|r| r.get(i)).copied().unwrap_or(0.0);
        if ridges.is_some() && ridge < options.ridge_threshold {
            time += base * RHYTHMIC_GAP_FACTOR;
            continue;
        }

        let pitch = table[brightness_to_scale_index(b, table.len())].clone();
        let velocity = (0.4 + (b / 255.0) * 0.6 + ridge * RIDGE_VELOCITY_BOOST).min(1.0);
        let reverb = match depth.and_then(|d| d.get(i)) {
            Some(d) if options.depth_to_reverb => 0.2 + (1.0 - d) * REVERB_DEPTH_SENSITIVITY,
            _ => 0.3,
        };

        notes.push(
            NoteEvent::new(pitch, time, base * (1.0 + ridge * RIDGE_DURATION_MULTIPLIER), velocity)
                .with_pan(position_pan(i, brightness.len()))
                .with_effect(REVERB_SEND, reverb)
                .with_effect(FILTER_CUTOFF, b / 255.0),
        );
        time += base;
    }

    log::debug!("depth ridge: {} samples -> {} notes", brightness.len(), notes.len());
    notes
}

/// [`NoteMapper`] for DEPTH_RIDGE
#[derive(Debug, Clone)]
pub struct RidgeMapper {
    options: DepthRidgeOptions,
}

impl RidgeMapper {
    pub fn new(options: DepthRidgeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DepthRidgeOptions {
        &self.options
    }
}

impl NoteMapper for RidgeMapper {
    fn name(&self) -> &str {
        "depth-ridge"
    }

    fn map(&self, analysis: &ImageAnalysisResult) -> Result<Vec<NoteEvent>> {
        Ok(map_depth_ridge(analysis, &self.options))
    }
}
