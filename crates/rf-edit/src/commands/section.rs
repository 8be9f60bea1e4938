//! Arrangement section commands

use std::sync::Arc;

use rf_core::{
    Arrangement, ArrangementSection, MIN_SECTION_LENGTH, RfError, RfResult, SectionId,
    ensure_finite,
};

use super::Shared;
use crate::undo::{Command, MergePolicy};

pub type SharedArrangement = Shared<Arrangement>;

/// Add a section, appended or at an index
#[derive(Debug)]
pub struct AddSection {
    arrangement: SharedArrangement,
    section: ArrangementSection,
    index: Option<usize>,
}

impl AddSection {
    pub fn new(
        arrangement: SharedArrangement,
        section: ArrangementSection,
        index: Option<usize>,
    ) -> RfResult<Self> {
        ensure_finite("section start", section.start)?;
        ensure_finite("section length", section.length)?;
        if arrangement.read().get(section.id).is_some() {
            return Err(RfError::InvalidParam(format!(
                "section {} is already in the arrangement",
                section.id.0
            )));
        }
        Ok(Self {
            arrangement,
            section,
            index,
        })
    }

    pub fn section_id(&self) -> SectionId {
        self.section.id
    }
}

impl Command for AddSection {
    fn execute(&mut self) {
        let mut arrangement = self.arrangement.write();
        match self.index {
            Some(idx) => {
                arrangement.insert(idx, self.section.clone());
            }
            None => {
                arrangement.push(self.section.clone());
            }
        }
    }

    fn undo(&mut self) {
        let mut arrangement = self.arrangement.write();
        match arrangement.index_of(self.section.id) {
            Some(idx) => {
                arrangement.remove(idx);
            }
            None => log::warn!("Add section undo: section {} already gone", self.section.id.0),
        }
    }

    fn description(&self) -> String {
        format!("Add Section '{}'", self.section.name)
    }
}

/// Remove a section
#[derive(Debug)]
pub struct DeleteSection {
    arrangement: SharedArrangement,
    id: SectionId,
    name: String,
    removed: Option<(usize, ArrangementSection)>,
}

impl DeleteSection {
    pub fn new(arrangement: SharedArrangement, id: SectionId) -> RfResult<Self> {
        let name = arrangement
            .read()
            .get(id)
            .map(|s| s.name.clone())
            .ok_or(RfError::SectionNotFound(id.0))?;
        Ok(Self {
            arrangement,
            id,
            name,
            removed: None,
        })
    }
}

impl Command for DeleteSection {
    fn execute(&mut self) {
        let mut arrangement = self.arrangement.write();
        self.removed = arrangement
            .index_of(self.id)
            .and_then(|idx| arrangement.remove(idx).map(|section| (idx, section)));
        if self.removed.is_none() {
            log::warn!("Delete section: section {} no longer exists", self.id.0);
        }
    }

    fn undo(&mut self) {
        if let Some((idx, section)) = self.removed.take() {
            self.arrangement.write().insert(idx, section);
        }
    }

    fn description(&self) -> String {
        format!("Delete Section '{}'", self.name)
    }
}

/// Move a section's start position
#[derive(Debug)]
pub struct MoveSection {
    arrangement: SharedArrangement,
    id: SectionId,
    old_start: f64,
    new_start: f64,
}

impl MoveSection {
    pub fn new(arrangement: SharedArrangement, id: SectionId, start: f64) -> RfResult<Self> {
        ensure_finite("section start", start)?;
        let old_start = arrangement
            .read()
            .get(id)
            .map(|s| s.start)
            .ok_or(RfError::SectionNotFound(id.0))?;
        Ok(Self {
            arrangement,
            id,
            old_start,
            new_start: start.max(0.0),
        })
    }

    fn apply(&self, start: f64) {
        match self.arrangement.write().get_mut(self.id) {
            Some(section) => section.start = start,
            None => log::warn!("Move section: section {} no longer exists", self.id.0),
        }
    }
}

impl Command for MoveSection {
    fn execute(&mut self) {
        self.apply(self.new_start);
    }

    fn undo(&mut self) {
        self.apply(self.old_start);
    }

    fn description(&self) -> String {
        "Move Section".to_string()
    }

    fn can_merge_with(&self, other: &Self, _policy: &MergePolicy) -> bool {
        Arc::ptr_eq(&self.arrangement, &other.arrangement) && self.id == other.id
    }

    fn merge(&mut self, other: Self) {
        self.new_start = other.new_start;
    }
}

/// Settable section fields
#[derive(Debug, Clone, PartialEq)]
pub enum SectionProperty {
    Name(String),
    Color(u32),
    Length(f64),
    RepeatCount(u32),
}

impl SectionProperty {
    fn read(&self, section: &ArrangementSection) -> Self {
        match self {
            Self::Name(_) => Self::Name(section.name.clone()),
            Self::Color(_) => Self::Color(section.color),
            Self::Length(_) => Self::Length(section.length),
            Self::RepeatCount(_) => Self::RepeatCount(section.repeat_count),
        }
    }

    fn write(&self, section: &mut ArrangementSection) {
        match self {
            Self::Name(name) => section.name.clone_from(name),
            Self::Color(color) => section.color = *color,
            Self::Length(length) => section.length = *length,
            Self::RepeatCount(count) => section.repeat_count = *count,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Name(_) => "Rename Section",
            Self::Color(_) => "Change Section Color",
            Self::Length(_) => "Change Section Length",
            Self::RepeatCount(_) => "Change Section Repeats",
        }
    }
}

/// Set one field of a section
#[derive(Debug)]
pub struct SetSectionProperty {
    arrangement: SharedArrangement,
    id: SectionId,
    old: SectionProperty,
    new: SectionProperty,
}

impl SetSectionProperty {
    pub fn new(
        arrangement: SharedArrangement,
        id: SectionId,
        value: SectionProperty,
    ) -> RfResult<Self> {
        let new = match value {
            SectionProperty::Length(length) => SectionProperty::Length(
                ensure_finite("section length", length)?.max(MIN_SECTION_LENGTH),
            ),
            SectionProperty::RepeatCount(count) => SectionProperty::RepeatCount(count.max(1)),
            other => other,
        };
        let old = arrangement
            .read()
            .get(id)
            .map(|s| new.read(s))
            .ok_or(RfError::SectionNotFound(id.0))?;
        Ok(Self {
            arrangement,
            id,
            old,
            new,
        })
    }

    fn apply(&self, value: &SectionProperty) {
        match self.arrangement.write().get_mut(self.id) {
            Some(section) => value.write(section),
            None => log::warn!("{}: section {} no longer exists", value.label(), self.id.0),
        }
    }
}

impl Command for SetSectionProperty {
    fn execute(&mut self) {
        self.apply(&self.new);
    }

    fn undo(&mut self) {
        self.apply(&self.old);
    }

    fn description(&self) -> String {
        self.new.label().to_string()
    }
}
