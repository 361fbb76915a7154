//! Post-processing transforms on note sequences
//!
//! Each transform takes a sequence and returns a new one; effects and other
//! fields a transform does not touch are carried over unchanged.

use super::note::NoteEvent;
use super::pitch::checked_midi_to_pitch;
use crate::error::Result;

/// Snap starts to the nearest grid line and durations to a whole number of
/// grid steps (never less than one step). A non-positive grid is a no-op.
pub fn quantize(notes: &[NoteEvent], grid: f64) -> Vec<NoteEvent> {
    if grid.is_nan() || grid <= 0.0 {
        return notes.to_vec();
    }

    notes
        .iter()
        .map(|note| NoteEvent {
            start: (note.start / grid).round() * grid,
            duration: ((note.duration / grid).round() * grid).max(grid),
            ..note.clone()
        })
        .collect()
}

/// Multiply velocities by `factor`, clamped to 0-1
pub fn scale_velocity(notes: &[NoteEvent], factor: f64) -> Vec<NoteEvent> {
    notes
        .iter()
        .map(|note| NoteEvent {
            velocity: (note.velocity * factor).clamp(0.0, 1.0),
            ..note.clone()
        })
        .collect()
}

/// Shift every pitch by `semitones`, rolling over octave boundaries.
///
/// Fails with `InvalidPitchName` if a pitch does not parse or the result
/// leaves MIDI 0-127.
pub fn transpose_notes(notes: &[NoteEvent], semitones: i32) -> Result<Vec<NoteEvent>> {
    notes
        .iter()
        .map(|note| {
            let midi = note.midi()? as i32 + semitones;
            Ok(NoteEvent {
                pitch: checked_midi_to_pitch(midi)?,
                ..note.clone()
            })
        })
        .collect()
}

/// A post-processing step over a whole note sequence
pub trait NoteTransform: Send + Sync {
    /// Get the name of this transform
    fn name(&self) -> &str;

    fn apply(&self, notes: Vec<NoteEvent>) -> Result<Vec<NoteEvent>>;
}

/// Grid quantization
#[derive(Debug, Clone, Copy)]
pub struct Quantize(pub f64);

impl NoteTransform for Quantize {
    fn name(&self) -> &str {
        "quantize"
    }

    fn apply(&self, notes: Vec<NoteEvent>) -> Result<Vec<NoteEvent>> {
        Ok(quantize(&notes, self.0))
    }
}

/// Velocity scaling
#[derive(Debug, Clone, Copy)]
pub struct VelocityScale(pub f64);

impl NoteTransform for VelocityScale {
    fn name(&self) -> &str {
        "velocity-scale"
    }

    fn apply(&self, notes: Vec<NoteEvent>) -> Result<Vec<NoteEvent>> {
        Ok(scale_velocity(&notes, self.0))
    }
}

/// Transposition in semitones
#[derive(Debug, Clone, Copy)]
pub struct Transpose(pub i32);

impl NoteTransform for Transpose {
    fn name(&self) -> &str {
        "transpose"
    }

    fn apply(&self, notes: Vec<NoteEvent>) -> Result<Vec<NoteEvent>> {
        transpose_notes(&notes, self.0)
    }
}

/// Transforms applied in sequence
pub struct TransformPipeline {
    transforms: Vec<Box<dyn NoteTransform>>,
}

impl TransformPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self { transforms: Vec::new() }
    }

    /// Add a transform to the pipeline (builder pattern)
    pub fn with<T: NoteTransform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Apply all transforms in order, stopping at the first error
    pub fn apply(&self, mut notes: Vec<NoteEvent>) -> Result<Vec<NoteEvent>> {
        for transform in &self.transforms {
            log::debug!("applying {} to {} notes", transform.name(), notes.len());
            notes = transform.apply(notes)?;
        }
        Ok(notes)
    }

    pub fn names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the pipeline is empty
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}
