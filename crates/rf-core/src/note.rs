//! Piano roll notes
//!
//! Notes live in a [`NoteList`], an ordered container addressed by index.
//! The list does not sort itself: display order is the editor's business,
//! so commands that remove notes remember the index they came from.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Highest MIDI pitch/velocity value
pub const MIDI_MAX: u8 = 127;

/// Shortest note a resize can produce (in beats, 1/128 note)
pub const MIN_NOTE_DURATION: f64 = 1.0 / 32.0;

/// Unique note identifier
///
/// Deserialized ids advance the allocator, as with point ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NoteId(pub u64);

static NEXT_NOTE_ID: AtomicU64 = AtomicU64::new(1);

impl NoteId {
    pub fn next() -> Self {
        Self(NEXT_NOTE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        NEXT_NOTE_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Ok(Self(raw))
    }
}

/// Clamp an arbitrary integer into the MIDI data range
#[inline]
pub fn clamp_midi(value: i32) -> u8 {
    value.clamp(0, MIDI_MAX as i32) as u8
}

/// A single note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// Start position in beats
    pub start: f64,
    /// Duration in beats
    pub duration: f64,
    /// Velocity (0-127)
    pub velocity: u8,
    /// MIDI channel (0-15)
    pub channel: u8,
    pub muted: bool,
}

impl Note {
    pub fn new(pitch: u8, start: f64, duration: f64, velocity: u8) -> Self {
        Self {
            id: NoteId::next(),
            pitch: pitch.min(MIDI_MAX),
            start: start.max(0.0),
            duration: duration.max(MIN_NOTE_DURATION),
            velocity: velocity.min(MIDI_MAX),
            channel: 0,
            muted: false,
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel.min(15);
        self
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Ordered note container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteList {
    notes: Vec<Note>,
}

impl NoteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Append a note, returning its index
    pub fn push(&mut self, note: Note) -> usize {
        self.notes.push(note);
        self.notes.len() - 1
    }

    /// Insert at an index, clamped to the end of the list. Returns the index used.
    pub fn insert(&mut self, index: usize, note: Note) -> usize {
        let index = index.min(self.notes.len());
        self.notes.insert(index, note);
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<Note> {
        if index < self.notes.len() {
            Some(self.notes.remove(index))
        } else {
            None
        }
    }

    pub fn index_of(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|n| n.id == id)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }
}
