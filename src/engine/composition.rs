//! Composition record handed to persistence and export

use serde::{Deserialize, Serialize};

use super::midi::encode_midi;
use crate::error::Result;
use crate::mapping::{beats_to_seconds, Key, MappingMode, NoteEvent};

fn default_tempo() -> f64 {
    120.0
}

/// A rendered piece: note events plus the musical context they were made in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub title: String,
    pub key: Key,
    /// Scale name as configured, e.g. "C_MAJOR"
    pub scale: String,
    #[serde(rename = "tempo", default = "default_tempo")]
    pub tempo_bpm: f64,
    pub mapping_mode: MappingMode,
    pub note_events: Vec<NoteEvent>,
    /// Topo preset the notes were composed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
}

impl Composition {
    /// Length in beats, up to the end of the last sounding note
    pub fn duration_beats(&self) -> f64 {
        self.note_events.iter().map(NoteEvent::end).fold(0.0, f64::max)
    }

    pub fn duration_seconds(&self) -> f64 {
        beats_to_seconds(self.duration_beats(), self.tempo_bpm)
    }

    /// Note count per voice tag in first-seen order; untagged notes count
    /// under "Main"
    pub fn voice_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for note in &self.note_events {
            let voice = note.voice.as_deref().unwrap_or(super::midi::MAIN_TRACK);
            match counts.iter_mut().find(|(name, _)| name == voice) {
                Some((_, count)) => *count += 1,
                None => counts.push((voice.to_string(), 1)),
            }
        }
        counts
    }

    /// Encode as a Standard MIDI File named after the title
    pub fn to_midi(&self) -> Result<Vec<u8>> {
        encode_midi(&self.note_events, self.tempo_bpm, Some(&self.title))
    }

    /// File name for the exported MIDI: the title lowercased with runs of
    /// other characters collapsed to single hyphens
    pub fn suggested_filename(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        for c in self.title.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-');

        if slug.is_empty() {
            "composition.mid".to_string()
        } else {
            format!("{}.mid", slug)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TopoError;

    fn composition(title: &str, notes: Vec<NoteEvent>) -> Composition {
        Composition {
            title: title.to_string(),
            key: Key::D,
            scale: "D_MAJOR".to_string(),
            tempo_bpm: 120.0,
            mapping_mode: MappingMode::LinearLandscape,
            note_events: notes,
            preset_id: None,
        }
    }

    #[test]
    fn test_suggested_filename() {
        assert_eq!(composition("Alpine Dawn", vec![]).suggested_filename(), "alpine-dawn.mid");
        assert_eq!(composition("  Ridge -- Line #2! ", vec![]).suggested_filename(), "ridge-line-2.mid");
        assert_eq!(composition("???", vec![]).suggested_filename(), "composition.mid");
        assert_eq!(composition("", vec![]).suggested_filename(), "composition.mid");
    }

    #[test]
    fn test_duration() {
        let notes = vec![
            NoteEvent::new("C4", 0.0, 4.0, 0.8),
            NoteEvent::new("E4", 1.0, 0.5, 0.8),
        ];
        let piece = composition("Dunes", notes);
        assert_eq!(piece.duration_beats(), 4.0);
        assert_eq!(piece.duration_seconds(), 2.0);
    }

    #[test]
    fn test_voice_counts() {
        let notes = vec![
            NoteEvent::new("C2", 0.0, 1.0, 0.8).with_voice("bass"),
            NoteEvent::new("C5", 0.0, 1.0, 0.8).with_voice("melody"),
            NoteEvent::new("C4", 1.0, 1.0, 0.8),
            NoteEvent::new("D5", 1.0, 1.0, 0.8).with_voice("melody"),
        ];
        let counts = composition("Mix", notes).voice_counts();
        assert_eq!(
            counts,
            vec![("bass".to_string(), 1), ("melody".to_string(), 2), ("Main".to_string(), 1)]
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut piece = composition("Coast", vec![NoteEvent::new("A4", 0.0, 1.0, 0.5).with_effect("shimmer", 0.2)]);
        piece.preset_id = Some("coastal-calm".to_string());

        let json = serde_json::to_value(&piece).unwrap();
        assert_eq!(json["mappingMode"], "LINEAR_LANDSCAPE");
        assert_eq!(json["tempo"], 120.0);
        assert_eq!(json["noteEvents"][0]["note"], "A4");
        assert_eq!(json["presetId"], "coastal-calm");

        let back: Composition = serde_json::from_value(json).unwrap();
        assert_eq!(back, piece);
    }

    #[test]
    fn test_to_midi() {
        let bytes = composition("Dunes", vec![NoteEvent::new("A4", 0.0, 1.0, 0.8)]).to_midi().unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        assert!(matches!(composition("Empty", vec![]).to_midi(), Err(TopoError::EmptyComposition)));
    }
}
