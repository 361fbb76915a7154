//! Keys, scales and scale-degree lookup

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pitch::CHROMATIC_NOTES;
use crate::error::{Result, TopoError};

/// Root key of a composition (sharp spelling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Key {
    #[default]
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::C,
        Key::CSharp,
        Key::D,
        Key::DSharp,
        Key::E,
        Key::F,
        Key::FSharp,
        Key::G,
        Key::GSharp,
        Key::A,
        Key::ASharp,
        Key::B,
    ];

    /// Semitone offset of the root from C (0-11)
    pub fn offset(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        CHROMATIC_NOTES[self.offset() as usize]
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Key {
    type Err = TopoError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        CHROMATIC_NOTES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(trimmed))
            .map(|i| Key::ALL[i])
            .ok_or_else(|| TopoError::UnknownKey(s.to_string()))
    }
}

/// Musical scale definition (intervals in semitones from root)
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    name: String,
    intervals: Vec<u8>,
}

impl Scale {
    /// Create a new scale
    pub fn new(name: &str, intervals: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            intervals,
        }
    }

    /// Major scale: W-W-H-W-W-W-H
    pub fn major() -> Self {
        Self::new("major", vec![0, 2, 4, 5, 7, 9, 11])
    }

    /// Natural minor: W-H-W-W-H-W-W
    pub fn minor() -> Self {
        Self::new("minor", vec![0, 2, 3, 5, 7, 8, 10])
    }

    /// Major pentatonic (root, M2, M3, P5, M6)
    pub fn major_pentatonic() -> Self {
        Self::new("major_pentatonic", vec![0, 2, 4, 7, 9])
    }

    /// Minor pentatonic (root, m3, P4, P5, m7)
    pub fn minor_pentatonic() -> Self {
        Self::new("minor_pentatonic", vec![0, 3, 5, 7, 10])
    }

    pub fn blues() -> Self {
        Self::new("blues", vec![0, 3, 5, 6, 7, 10])
    }

    pub fn dorian() -> Self {
        Self::new("dorian", vec![0, 2, 3, 5, 7, 9, 10])
    }

    pub fn phrygian() -> Self {
        Self::new("phrygian", vec![0, 1, 3, 5, 7, 8, 10])
    }

    pub fn mixolydian() -> Self {
        Self::new("mixolydian", vec![0, 2, 4, 5, 7, 9, 10])
    }

    pub fn whole_tone() -> Self {
        Self::new("whole_tone", vec![0, 2, 4, 6, 8, 10])
    }

    /// Get scale by name.
    ///
    /// Accepts plain mode names ("major", "minor_pentatonic") and tagged names
    /// carrying a root prefix ("C_MAJOR", "A_SHARP_MINOR", "D_DORIAN"). The
    /// prefix is ignored; the root always comes from the [`Key`].
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let mut tokens: Vec<&str> = lower.split(&['_', ' ', '-'][..]).filter(|t| !t.is_empty()).collect();

        let has_root_prefix = tokens.len() > 1
            && tokens[0].len() == 1
            && matches!(tokens[0].as_bytes()[0], b'a'..=b'g');
        if has_root_prefix {
            tokens.remove(0);
            if matches!(tokens.first(), Some(&"sharp") | Some(&"flat")) {
                tokens.remove(0);
            }
        }

        match tokens.join("_").as_str() {
            "major" | "ionian" => Some(Self::major()),
            "minor" | "natural_minor" | "aeolian" => Some(Self::minor()),
            "pentatonic" | "major_pentatonic" | "majorpentatonic" => Some(Self::major_pentatonic()),
            "minor_pentatonic" | "minorpentatonic" => Some(Self::minor_pentatonic()),
            "blues" => Some(Self::blues()),
            "dorian" => Some(Self::dorian()),
            "phrygian" => Some(Self::phrygian()),
            "mixolydian" => Some(Self::mixolydian()),
            "whole_tone" | "wholetone" => Some(Self::whole_tone()),
            _ => None,
        }
    }

    /// Like [`Scale::from_name`] but reports unknown names as an error
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| TopoError::UnknownScale(name.to_string()))
    }

    /// Get the name of this scale
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the intervals
    pub fn intervals(&self) -> &[u8] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Pitch names of a scale across several octaves, lowest first.
///
/// Ordering is octave-major, interval-minor. Degrees that wrap past B carry
/// into the next octave number (A major starting at octave 3 yields
/// "A3", "B3", "C#4", ...).
pub fn scale_notes(key: Key, scale: &Scale, octave_count: u32, start_octave: i32) -> Vec<String> {
    let key_offset = key.offset() as i32;
    let mut notes = Vec::with_capacity(scale.len() * octave_count as usize);

    for octave in 0..octave_count as i32 {
        for &interval in scale.intervals() {
            let absolute = key_offset + interval as i32;
            let name = CHROMATIC_NOTES[(absolute % 12) as usize];
            let octave_number = start_octave + octave + absolute / 12;
            notes.push(format!("{}{}", name, octave_number));
        }
    }

    notes
}

/// Map a normalized value (0-1) to an index into a table of `len` entries.
///
/// Out-of-range input is clamped; `x = 1` lands on the last entry. Returns 0
/// for an empty table.
pub fn value_to_scale_index(value: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    ((clamped * len as f64).floor() as usize).min(len - 1)
}

/// Map a brightness value (0-255) to an index into a table of `len` entries
pub fn brightness_to_scale_index(brightness: f64, len: usize) -> usize {
    value_to_scale_index(brightness / 255.0, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_creation() {
        let scale = Scale::minor_pentatonic();
        assert_eq!(scale.name(), "minor_pentatonic");
        assert_eq!(scale.intervals(), &[0, 3, 5, 7, 10]);
    }

    #[test]
    fn test_scale_from_name() {
        assert_eq!(Scale::from_name("major"), Some(Scale::major()));
        assert_eq!(Scale::from_name("C_MAJOR"), Some(Scale::major()));
        assert_eq!(Scale::from_name("A_SHARP_MINOR"), Some(Scale::minor()));
        assert_eq!(Scale::from_name("A_MINOR_PENTATONIC"), Some(Scale::minor_pentatonic()));
        assert_eq!(Scale::from_name("C_PENTATONIC"), Some(Scale::major_pentatonic()));
        assert_eq!(Scale::from_name("E_PHRYGIAN"), Some(Scale::phrygian()));
        assert_eq!(Scale::from_name("C_MIXOLYDIAN"), Some(Scale::mixolydian()));
        assert_eq!(Scale::from_name("whole_tone"), Some(Scale::whole_tone()));
        assert!(Scale::from_name("unknown").is_none());
        assert!(matches!(Scale::parse("C_LYDIAN"), Err(TopoError::UnknownScale(_))));
    }

    #[test]
    fn test_key_offsets() {
        assert_eq!(Key::C.offset(), 0);
        assert_eq!(Key::FSharp.offset(), 6);
        assert_eq!(Key::B.offset(), 11);
        assert_eq!("A#".parse::<Key>().unwrap(), Key::ASharp);
        assert_eq!("d".parse::<Key>().unwrap(), Key::D);
        assert!("H".parse::<Key>().is_err());
    }

    #[test]
    fn test_key_serde_uses_sharp_spelling() {
        let json = serde_json::to_string(&Key::GSharp).unwrap();
        assert_eq!(json, "\"G#\"");
        let back: Key = serde_json::from_str("\"C#\"").unwrap();
        assert_eq!(back, Key::CSharp);
    }

    #[test]
    fn test_scale_notes_c_major_single_octave() {
        let notes = scale_notes(Key::C, &Scale::parse("C_MAJOR").unwrap(), 1, 3);
        assert_eq!(notes.len(), 7);
        assert_eq!(notes[0], "C3");
        assert_eq!(notes, vec!["C3", "D3", "E3", "F3", "G3", "A3", "B3"]);
    }

    #[test]
    fn test_scale_notes_carry_octave() {
        let notes = scale_notes(Key::A, &Scale::major(), 2, 3);
        assert_eq!(notes.len(), 14);
        assert_eq!(&notes[..4], &["A3", "B3", "C#4", "D4"]);
        assert_eq!(notes[7], "A4");
    }

    #[test]
    fn test_scale_notes_ascending() {
        use crate::mapping::pitch::pitch_to_midi;
        let notes = scale_notes(Key::E, &Scale::dorian(), 3, 2);
        let midi: Vec<u8> = notes.iter().map(|n| pitch_to_midi(n).unwrap()).collect();
        assert!(midi.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_value_to_scale_index_bounds() {
        assert_eq!(value_to_scale_index(0.0, 7), 0);
        assert_eq!(value_to_scale_index(1.0, 7), 6);
        assert_eq!(value_to_scale_index(0.5, 7), 3);
        assert_eq!(value_to_scale_index(-3.0, 7), 0);
        assert_eq!(value_to_scale_index(42.0, 7), 6);
        assert_eq!(value_to_scale_index(0.5, 0), 0);
    }

    #[test]
    fn test_brightness_to_scale_index() {
        assert_eq!(brightness_to_scale_index(0.0, 21), 0);
        assert_eq!(brightness_to_scale_index(255.0, 21), 20);
        assert_eq!(brightness_to_scale_index(128.0, 21), 10);
    }
}
