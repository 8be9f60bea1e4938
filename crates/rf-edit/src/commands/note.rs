//! Piano roll note commands

use std::sync::Arc;

use rf_core::{
    MIN_NOTE_DURATION, Note, NoteId, NoteList, RfError, RfResult, clamp_midi, ensure_finite,
};

use super::Shared;
use crate::undo::{Command, MergePolicy};

pub type SharedNotes = Shared<NoteList>;

/// Snapshot the selected notes, in selection order
fn capture(list: &NoteList, ids: &[NoteId]) -> RfResult<Vec<Note>> {
    if ids.is_empty() {
        return Err(RfError::EmptySelection("notes"));
    }
    ids.iter()
        .map(|id| list.get(*id).cloned().ok_or(RfError::NoteNotFound(id.0)))
        .collect()
}

/// Overwrite notes in place by id
fn write_back(list: &mut NoteList, notes: &[Note], action: &str) {
    for note in notes {
        match list.get_mut(note.id) {
            Some(slot) => *slot = note.clone(),
            None => log::warn!("{action}: note {} no longer exists", note.id.0),
        }
    }
}

fn note_label(count: usize) -> String {
    if count == 1 {
        "Note".to_string()
    } else {
        format!("{count} Notes")
    }
}

/// Add notes to the end of the list
#[derive(Debug)]
pub struct AddNotes {
    notes: SharedNotes,
    added: Vec<Note>,
}

impl AddNotes {
    pub fn new(notes: SharedNotes, added: Vec<Note>) -> RfResult<Self> {
        if added.is_empty() {
            return Err(RfError::EmptySelection("notes"));
        }
        {
            let list = notes.read();
            for (i, note) in added.iter().enumerate() {
                ensure_finite("note start", note.start)?;
                ensure_finite("note duration", note.duration)?;
                if list.get(note.id).is_some() || added[..i].iter().any(|n| n.id == note.id) {
                    return Err(RfError::InvalidParam(format!(
                        "note {} is already in the list",
                        note.id.0
                    )));
                }
            }
        }
        Ok(Self { notes, added })
    }

    pub fn single(notes: SharedNotes, note: Note) -> RfResult<Self> {
        Self::new(notes, vec![note])
    }

    pub fn note_ids(&self) -> Vec<NoteId> {
        self.added.iter().map(|n| n.id).collect()
    }
}

impl Command for AddNotes {
    fn execute(&mut self) {
        let mut list = self.notes.write();
        for note in &self.added {
            list.push(note.clone());
        }
    }

    fn undo(&mut self) {
        let mut list = self.notes.write();
        for note in self.added.iter().rev() {
            match list.index_of(note.id) {
                Some(idx) => {
                    list.remove(idx);
                }
                None => log::warn!("Add notes undo: note {} already gone", note.id.0),
            }
        }
    }

    fn description(&self) -> String {
        format!("Add {}", note_label(self.added.len()))
    }
}

/// Delete notes, restoring them at their original positions on undo
#[derive(Debug)]
pub struct DeleteNotes {
    notes: SharedNotes,
    ids: Vec<NoteId>,
    /// `(index, note)` pairs in ascending index order
    removed: Vec<(usize, Note)>,
}

impl DeleteNotes {
    pub fn new(notes: SharedNotes, ids: &[NoteId]) -> RfResult<Self> {
        capture(&notes.read(), ids)?;
        Ok(Self {
            notes,
            ids: ids.to_vec(),
            removed: Vec::new(),
        })
    }
}

impl Command for DeleteNotes {
    fn execute(&mut self) {
        let mut list = self.notes.write();

        let mut indices: Vec<usize> = self
            .ids
            .iter()
            .filter_map(|id| {
                let idx = list.index_of(*id);
                if idx.is_none() {
                    log::warn!("Delete notes: note {} no longer exists", id.0);
                }
                idx
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();

        // Back to front so earlier indices stay valid
        self.removed = indices
            .into_iter()
            .rev()
            .filter_map(|idx| list.remove(idx).map(|note| (idx, note)))
            .collect();
        self.removed.reverse();
    }

    fn undo(&mut self) {
        let mut list = self.notes.write();
        for (idx, note) in &self.removed {
            list.insert(*idx, note.clone());
        }
    }

    fn description(&self) -> String {
        format!("Delete {}", note_label(self.ids.len()))
    }
}

/// Shared shape of the per-note edits: full snapshots before and after
#[derive(Debug)]
struct NoteEdit {
    notes: SharedNotes,
    before: Vec<Note>,
    after: Vec<Note>,
}

impl NoteEdit {
    fn new(notes: SharedNotes, ids: &[NoteId], edit: impl Fn(&mut Note)) -> RfResult<Self> {
        let before = capture(&notes.read(), ids)?;
        let after = before
            .iter()
            .map(|note| {
                let mut note = note.clone();
                edit(&mut note);
                note
            })
            .collect();
        Ok(Self {
            notes,
            before,
            after,
        })
    }

    fn ids_match(&self, other: &NoteEdit) -> bool {
        Arc::ptr_eq(&self.notes, &other.notes)
            && self.after.len() == other.before.len()
            && self
                .after
                .iter()
                .zip(&other.before)
                .all(|(a, b)| a.id == b.id)
    }

    fn merge(&mut self, other: NoteEdit) {
        self.after = other.after;
    }
}

/// Move notes in time and pitch
#[derive(Debug)]
pub struct MoveNotes {
    edit: NoteEdit,
}

impl MoveNotes {
    pub fn new(
        notes: SharedNotes,
        ids: &[NoteId],
        delta_beats: f64,
        delta_pitch: i32,
    ) -> RfResult<Self> {
        ensure_finite("delta beats", delta_beats)?;
        let edit = NoteEdit::new(notes, ids, |note| {
            note.start = (note.start + delta_beats).max(0.0);
            note.pitch = clamp_midi(note.pitch as i32 + delta_pitch);
        })?;
        Ok(Self { edit })
    }
}

impl Command for MoveNotes {
    fn execute(&mut self) {
        write_back(&mut self.edit.notes.write(), &self.edit.after, "Move notes");
    }

    fn undo(&mut self) {
        write_back(&mut self.edit.notes.write(), &self.edit.before, "Move notes");
    }

    fn description(&self) -> String {
        format!("Move {}", note_label(self.edit.before.len()))
    }

    fn can_merge_with(&self, other: &Self, _policy: &MergePolicy) -> bool {
        self.edit.ids_match(&other.edit)
    }

    fn merge(&mut self, other: Self) {
        self.edit.merge(other.edit);
    }
}

/// Lengthen or shorten notes
#[derive(Debug)]
pub struct ResizeNotes {
    edit: NoteEdit,
}

impl ResizeNotes {
    pub fn new(notes: SharedNotes, ids: &[NoteId], delta_duration: f64) -> RfResult<Self> {
        ensure_finite("delta duration", delta_duration)?;
        let edit = NoteEdit::new(notes, ids, |note| {
            note.duration = (note.duration + delta_duration).max(MIN_NOTE_DURATION);
        })?;
        Ok(Self { edit })
    }
}

impl Command for ResizeNotes {
    fn execute(&mut self) {
        write_back(&mut self.edit.notes.write(), &self.edit.after, "Resize notes");
    }

    fn undo(&mut self) {
        write_back(&mut self.edit.notes.write(), &self.edit.before, "Resize notes");
    }

    fn description(&self) -> String {
        format!("Resize {}", note_label(self.edit.before.len()))
    }

    fn can_merge_with(&self, other: &Self, _policy: &MergePolicy) -> bool {
        self.edit.ids_match(&other.edit)
    }

    fn merge(&mut self, other: Self) {
        self.edit.merge(other.edit);
    }
}

/// Set an absolute velocity on notes
#[derive(Debug)]
pub struct SetNoteVelocity {
    edit: NoteEdit,
    velocity: u8,
}

impl SetNoteVelocity {
    pub fn new(notes: SharedNotes, ids: &[NoteId], velocity: i32) -> RfResult<Self> {
        let velocity = clamp_midi(velocity);
        let edit = NoteEdit::new(notes, ids, |note| note.velocity = velocity)?;
        Ok(Self { edit, velocity })
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }
}

impl Command for SetNoteVelocity {
    fn execute(&mut self) {
        write_back(&mut self.edit.notes.write(), &self.edit.after, "Set velocity");
    }

    fn undo(&mut self) {
        write_back(&mut self.edit.notes.write(), &self.edit.before, "Set velocity");
    }

    fn description(&self) -> String {
        "Change Velocity".to_string()
    }

    fn can_merge_with(&self, other: &Self, _policy: &MergePolicy) -> bool {
        self.edit.ids_match(&other.edit)
    }

    fn merge(&mut self, other: Self) {
        self.velocity = other.velocity;
        self.edit.merge(other.edit);
    }
}
