//! Note events produced by the mappers

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pitch::pitch_to_midi;
use crate::error::{Result, TopoError};

/// Effect key for the reverb send level (0-1)
pub const REVERB_SEND: &str = "reverbSend";

/// Effect key for the normalized filter cutoff (0-1)
pub const FILTER_CUTOFF: &str = "filterCutoff";

/// Open map of named effect parameters.
///
/// Keys other than [`REVERB_SEND`] and [`FILTER_CUTOFF`] are carried through
/// serialization and every note transform untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Effects(BTreeMap<String, f64>);

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn reverb_send(&self) -> Option<f64> {
        self.get(REVERB_SEND)
    }

    pub fn filter_cutoff(&self) -> Option<f64> {
        self.get(FILTER_CUTOFF)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn default_velocity() -> f64 {
    0.8
}

/// One discrete sound event. Times are in beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    /// Pitch in scientific notation, e.g. "C#4"
    #[serde(rename = "note")]
    pub pitch: String,

    pub start: f64,

    pub duration: f64,

    /// 0-1 (default: 0.8)
    #[serde(default = "default_velocity")]
    pub velocity: f64,

    /// -1 (left) to 1 (right)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,

    /// Voice/track tag; `bass`, `melody`, `pad` and `fx` are reserved
    #[serde(rename = "trackId", default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    #[serde(default, skip_serializing_if = "Effects::is_empty")]
    pub effects: Effects,
}

impl NoteEvent {
    /// Create a note event with no pan, voice or effects
    pub fn new(pitch: impl Into<String>, start: f64, duration: f64, velocity: f64) -> Self {
        Self {
            pitch: pitch.into(),
            start,
            duration,
            velocity,
            pan: None,
            voice: None,
            effects: Effects::new(),
        }
    }

    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = Some(pan);
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_effect(mut self, key: impl Into<String>, value: f64) -> Self {
        self.effects.insert(key, value);
        self
    }

    pub fn with_effects(mut self, effects: Effects) -> Self {
        self.effects = effects;
        self
    }

    /// MIDI note number of the pitch
    pub fn midi(&self) -> Result<u8> {
        pitch_to_midi(&self.pitch)
    }

    /// Time at which the note stops sounding
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Check the event invariants: parsable pitch, positive duration,
    /// non-negative start, velocity and pan within range.
    pub fn validate(&self) -> Result<()> {
        self.midi()?;
        let invalid = |what: String| -> Result<()> { Err(TopoError::InvalidNoteEvent(what)) };
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return invalid(format!("note {} has non-positive duration {}", self.pitch, self.duration));
        }
        if !(self.start.is_finite() && self.start >= 0.0) {
            return invalid(format!("note {} has invalid start {}", self.pitch, self.start));
        }
        if !(0.0..=1.0).contains(&self.velocity) {
            return invalid(format!("note {} has velocity {} outside 0-1", self.pitch, self.velocity));
        }
        if let Some(pan) = self.pan {
            if !(-1.0..=1.0).contains(&pan) {
                return invalid(format!("note {} has pan {} outside -1..1", self.pitch, pan));
            }
        }
        Ok(())
    }
}
