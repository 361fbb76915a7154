//! Standard MIDI File export
//!
//! Writes a format 1 file: a tempo track followed by one note track per
//! voice tag, in the order the voices first appear in the note sequence.

use std::path::Path;

use log::debug;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::error::{Result, TopoError};
use crate::mapping::NoteEvent;

/// Ticks per beat (quarter note)
pub const TICKS_PER_BEAT: u16 = 480;

/// Track name for notes without a voice tag
pub const MAIN_TRACK: &str = "Main";

/// General MIDI percussion channel (channel 10, zero-based)
const PERCUSSION_CHANNEL: u8 = 9;

/// Microseconds per beat for a tempo; tempos below 1 BPM are treated as 1
pub fn tempo_microseconds(tempo_bpm: f64) -> u32 {
    let bpm = if tempo_bpm.is_finite() { tempo_bpm.max(1.0) } else { 1.0 };
    (60_000_000.0 / bpm).round() as u32
}

/// Note velocity 0-1 to a MIDI velocity in 1..=127
pub fn velocity_to_midi(velocity: f64) -> u8 {
    ((velocity.clamp(0.0, 1.0) * 127.0).round() as u8).clamp(1, 127)
}

/// Beats to ticks, never negative
pub fn beats_to_ticks(beats: f64) -> u32 {
    (beats * TICKS_PER_BEAT as f64).round().max(0.0) as u32
}

/// Channel for the n-th note track, skipping the percussion channel
fn track_channel(index: usize) -> u4 {
    let channel = (index % 15) as u8;
    if channel >= PERCUSSION_CHANNEL {
        u4::new(channel + 1)
    } else {
        u4::new(channel)
    }
}

/// A note on or off at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NoteMark {
    tick: u32,
    on: bool,
    key: u8,
    velocity: u8,
}

/// Group notes by voice tag, keeping first-seen order
fn group_by_voice(notes: &[NoteEvent]) -> Vec<(&str, Vec<&NoteEvent>)> {
    let mut groups: Vec<(&str, Vec<&NoteEvent>)> = Vec::new();
    for note in notes {
        let name = note
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(MAIN_TRACK);
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, members)) => members.push(note),
            None => groups.push((name, vec![note])),
        }
    }
    groups
}

/// On and off marks of one track, sorted by tick with offs first at a tie
fn note_marks(notes: &[&NoteEvent]) -> Result<Vec<NoteMark>> {
    let mut marks = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let key = note.midi()?;
        let on_tick = beats_to_ticks(note.start);
        let off_tick = beats_to_ticks(note.end()).max(on_tick.saturating_add(1));
        let velocity = velocity_to_midi(note.velocity);
        marks.push(NoteMark { tick: on_tick, on: true, key, velocity });
        marks.push(NoteMark { tick: off_tick, on: false, key, velocity: 0 });
    }
    marks.sort_by_key(|mark| (mark.tick, mark.on));
    Ok(marks)
}

fn meta_track<'a>(tempo_bpm: f64, title: Option<&'a str>) -> Track<'a> {
    let mut track = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds(tempo_bpm)))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
        },
    ];
    if let Some(title) = title {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(title.as_bytes())),
        });
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

fn note_track<'a>(name: &'a str, channel: u4, marks: &[NoteMark]) -> Track<'a> {
    let mut track = Vec::with_capacity(marks.len() + 2);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });

    let mut last_tick = 0;
    for mark in marks {
        let key = u7::new(mark.key);
        let message = if mark.on {
            MidiMessage::NoteOn { key, vel: u7::new(mark.velocity) }
        } else {
            MidiMessage::NoteOff { key, vel: u7::new(0) }
        };
        track.push(TrackEvent {
            delta: u28::new(mark.tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = mark.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

/// Encode notes as a format 1 Standard MIDI File.
///
/// Fails with [`TopoError::EmptyComposition`] when there are no notes and
/// with [`TopoError::InvalidPitchName`] when a pitch does not parse.
pub fn encode_midi(notes: &[NoteEvent], tempo_bpm: f64, title: Option<&str>) -> Result<Vec<u8>> {
    if notes.is_empty() {
        return Err(TopoError::EmptyComposition);
    }

    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let groups = group_by_voice(notes);

    let mut marks = Vec::with_capacity(groups.len());
    for (_, members) in &groups {
        marks.push(note_marks(members)?);
    }

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));
    smf.tracks.push(meta_track(tempo_bpm, title));
    for (index, ((name, _), track_marks)) in groups.iter().zip(&marks).enumerate() {
        smf.tracks.push(note_track(name, track_channel(index), track_marks));
    }

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;

    debug!(
        "Encoded {} notes in {} tracks ({} bytes)",
        notes.len(),
        groups.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Encode notes and write them to a `.mid` file
pub fn write_midi_file(path: &Path, notes: &[NoteEvent], tempo_bpm: f64, title: Option<&str>) -> Result<()> {
    let bytes = encode_midi(notes, tempo_bpm, title)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
