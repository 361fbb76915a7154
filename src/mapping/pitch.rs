//! Pitch names, MIDI numbers and frequencies
//!
//! Pitches use scientific notation with sharp-only spelling ("C4", "F#2").
//! Conversions are exact inverses over MIDI 0-127.

use crate::error::{Result, TopoError};

/// The twelve pitch classes in chromatic order starting at C
pub const CHROMATIC_NOTES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Highest valid MIDI note number
pub const MAX_MIDI: i32 = 127;

/// Parse a pitch name into its MIDI note number.
///
/// Accepts `[A-G]#?<octave>` where octave is a non-negative integer, plus
/// octave `-1` so that every MIDI number has a spelling that parses back.
pub fn pitch_to_midi(name: &str) -> Result<u8> {
    let invalid = || TopoError::InvalidPitchName(name.to_string());

    let mut chars = name.chars();
    let letter = chars.next().ok_or_else(invalid)?;
    if !('A'..='G').contains(&letter) {
        return Err(invalid());
    }

    let rest = chars.as_str();
    let (class, octave_str) = match rest.strip_prefix('#') {
        Some(tail) => (format!("{}#", letter), tail),
        None => (letter.to_string(), rest),
    };

    let octave: i32 = if octave_str == "-1" {
        -1
    } else {
        if octave_str.is_empty() || !octave_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        octave_str.parse().map_err(|_| invalid())?
    };

    let index = CHROMATIC_NOTES
        .iter()
        .position(|n| *n == class)
        .ok_or_else(invalid)? as i32;

    let midi = (octave + 1)
        .checked_mul(12)
        .and_then(|v| v.checked_add(index))
        .ok_or_else(invalid)?;

    if !(0..=MAX_MIDI).contains(&midi) {
        return Err(invalid());
    }
    Ok(midi as u8)
}

/// Render a MIDI note number as a pitch name
pub fn midi_to_pitch(midi: u8) -> String {
    let index = (midi % 12) as usize;
    let octave = (midi / 12) as i32 - 1;
    format!("{}{}", CHROMATIC_NOTES[index], octave)
}

/// Render a possibly out-of-range semitone number, failing outside 0-127
pub fn checked_midi_to_pitch(midi: i32) -> Result<String> {
    if (0..=MAX_MIDI).contains(&midi) {
        Ok(midi_to_pitch(midi as u8))
    } else {
        Err(TopoError::InvalidPitchName(format!("midi {}", midi)))
    }
}

/// Equal-tempered frequency of a MIDI note (A4 = 440 Hz)
pub fn midi_to_frequency_hz(midi: u8) -> f64 {
    440.0 * 2.0_f64.powf((midi as f64 - 69.0) / 12.0)
}

/// Frequency in Hz of a pitch name
pub fn pitch_to_frequency_hz(name: &str) -> Result<f64> {
    pitch_to_midi(name).map(midi_to_frequency_hz)
}

/// Convert a time in beats to seconds at the given tempo
pub fn beats_to_seconds(beats: f64, tempo_bpm: f64) -> f64 {
    beats * 60.0 / tempo_bpm.max(1.0)
}
