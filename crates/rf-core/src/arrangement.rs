//! Arrangement sections
//!
//! Song-structure blocks (intro, verse, chorus...) on the arranger track.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Shortest section (in beats)
pub const MIN_SECTION_LENGTH: f64 = 1.0;

/// Section ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SectionId(pub u64);

static NEXT_SECTION_ID: AtomicU64 = AtomicU64::new(1);

impl SectionId {
    pub fn next() -> Self {
        Self(NEXT_SECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl<'de> Deserialize<'de> for SectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        NEXT_SECTION_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Ok(Self(raw))
    }
}

/// A block on the arranger track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrangementSection {
    pub id: SectionId,
    pub name: String,
    /// Start in beats
    pub start: f64,
    /// Length in beats
    pub length: f64,
    /// Color (RGB)
    pub color: u32,
    /// How many times the section plays back to back
    pub repeat_count: u32,
}

impl ArrangementSection {
    pub fn new(name: impl Into<String>, start: f64, length: f64) -> Self {
        Self {
            id: SectionId::next(),
            name: name.into(),
            start: start.max(0.0),
            length: length.max(MIN_SECTION_LENGTH),
            color: 0x4a90e2,
            repeat_count: 1,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.length * self.repeat_count as f64
    }
}

/// Arranger track contents, kept in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arrangement {
    sections: Vec<ArrangementSection>,
}

impl Arrangement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[ArrangementSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn push(&mut self, section: ArrangementSection) -> usize {
        self.sections.push(section);
        self.sections.len() - 1
    }

    /// Insert at an index, clamped to the end. Returns the index used.
    pub fn insert(&mut self, index: usize, section: ArrangementSection) -> usize {
        let index = index.min(self.sections.len());
        self.sections.insert(index, section);
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<ArrangementSection> {
        if index < self.sections.len() {
            Some(self.sections.remove(index))
        } else {
            None
        }
    }

    pub fn index_of(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    pub fn get(&self, id: SectionId) -> Option<&ArrangementSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SectionId) -> Option<&mut ArrangementSection> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Total length covered by all sections
    pub fn total_length(&self) -> f64 {
        self.sections.iter().map(|s| s.end()).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        let section = ArrangementSection::new("Verse", -4.0, 0.5);
        assert_eq!(section.start, 0.0);
        assert_eq!(section.length, MIN_SECTION_LENGTH);
        assert_eq!(section.repeat_count, 1);
    }

    #[test]
    fn test_total_length() {
        let mut arrangement = Arrangement::new();
        arrangement.push(ArrangementSection::new("Intro", 0.0, 8.0));
        let mut chorus = ArrangementSection::new("Chorus", 8.0, 16.0);
        chorus.repeat_count = 2;
        arrangement.push(chorus);
        assert_eq!(arrangement.total_length(), 40.0);
    }

    #[test]
    fn test_index_lookup() {
        let mut arrangement = Arrangement::new();
        let section = ArrangementSection::new("Bridge", 0.0, 8.0);
        let id = section.id;
        arrangement.insert(3, section);
        assert_eq!(arrangement.index_of(id), Some(0));
        assert!(arrangement.remove(1).is_none());
    }

    #[test]
    fn test_loaded_ids_are_not_reallocated() {
        let upcoming = SectionId::next().0 + 1;
        let loaded: SectionId = serde_json::from_str(&upcoming.to_string()).unwrap();
        assert_eq!(loaded, SectionId(upcoming));
        assert!(ArrangementSection::new("Outro", 0.0, 4.0).id.0 > upcoming);
    }
}
