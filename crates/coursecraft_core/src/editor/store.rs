//! In-session outline store.
//!
//! # Responsibility
//! - Hold the authoritative in-session unit/chapter snapshot.
//! - Provide controlled mutation entry points for drags and inline edits.
//!
//! # Invariants
//! - Reorder entry points validate indices before mutating; a rejected
//!   call leaves the snapshot untouched.
//! - A cross-unit chapter move is one unit of work: removal, owner
//!   reassignment and insertion are never observable half-applied.
//! - The store never talks to storage; persistence is explicit and lives
//!   in the session layer.

use crate::editor::reorder::reorder;
use crate::model::course::{Chapter, ChapterId, StoredVideo, Unit, UnitId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from outline store mutations.
#[derive(Debug)]
pub enum OutlineStoreError {
    /// Target unit is not part of the snapshot.
    UnitNotFound(UnitId),
    /// Target chapter is not part of the snapshot.
    ChapterNotFound(ChapterId),
    /// A drag index does not fit the addressed list.
    IndexOutOfRange { index: usize, len: usize },
}

impl Display for OutlineStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnitNotFound(id) => write!(f, "unit not in outline: {id}"),
            Self::ChapterNotFound(id) => write!(f, "chapter not in outline: {id}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for list of {len}")
            }
        }
    }
}

impl Error for OutlineStoreError {}

/// Partial unit update merged into the snapshot after an inline edit.
#[derive(Debug, Clone, Default)]
pub struct UnitPatch {
    pub title: Option<String>,
    pub active: Option<bool>,
}

/// Partial chapter update merged into the snapshot after an inline edit.
///
/// Two-level options distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`) for nullable fields.
#[derive(Debug, Clone, Default)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub handle: Option<String>,
    pub summary: Option<Option<String>>,
    pub video: Option<Option<StoredVideo>>,
    pub length: Option<f64>,
    pub active: Option<bool>,
}

/// Session-scoped owner of the in-memory outline.
#[derive(Debug, Default)]
pub struct OutlineStore {
    units: Vec<Unit>,
}

impl OutlineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire snapshot (initial fetch or discard/reload).
    pub fn load(&mut self, units: Vec<Unit>) {
        self.units = units;
    }

    /// Units in their current in-session order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, unit_id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == unit_id)
    }

    pub fn chapter(&self, chapter_id: ChapterId) -> Option<&Chapter> {
        self.units
            .iter()
            .flat_map(|unit| unit.chapters.iter())
            .find(|chapter| chapter.id == chapter_id)
    }

    /// Appends a freshly created unit (no refetch).
    pub fn push_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// Shallow-merges a partial update into the matching unit.
    /// Silently does nothing when the unit is not in the snapshot.
    pub fn patch_unit(&mut self, unit_id: UnitId, patch: UnitPatch) {
        let Some(unit) = self.units.iter_mut().find(|unit| unit.id == unit_id) else {
            return;
        };
        if let Some(title) = patch.title {
            unit.title = title;
        }
        if let Some(active) = patch.active {
            unit.active = active;
        }
    }

    /// Filters a unit (and its nested chapters) out of the snapshot.
    pub fn remove_unit(&mut self, unit_id: UnitId) {
        self.units.retain(|unit| unit.id != unit_id);
    }

    /// Appends a freshly created chapter to its owning unit's list.
    pub fn push_chapter(&mut self, chapter: Chapter) -> Result<(), OutlineStoreError> {
        let unit = self
            .units
            .iter_mut()
            .find(|unit| unit.id == chapter.unit_id)
            .ok_or(OutlineStoreError::UnitNotFound(chapter.unit_id))?;
        unit.chapters.push(chapter);
        Ok(())
    }

    /// Shallow-merges a partial update into the matching chapter.
    /// Silently does nothing when the chapter is not in the snapshot.
    pub fn patch_chapter(&mut self, chapter_id: ChapterId, patch: ChapterPatch) {
        let Some(chapter) = self
            .units
            .iter_mut()
            .flat_map(|unit| unit.chapters.iter_mut())
            .find(|chapter| chapter.id == chapter_id)
        else {
            return;
        };
        if let Some(title) = patch.title {
            chapter.title = title;
        }
        if let Some(handle) = patch.handle {
            chapter.handle = handle;
        }
        if let Some(summary) = patch.summary {
            chapter.summary = summary;
        }
        if let Some(video) = patch.video {
            chapter.video = video;
        }
        if let Some(length) = patch.length {
            chapter.length = length;
        }
        if let Some(active) = patch.active {
            chapter.active = active;
        }
    }

    /// Filters a chapter out of whichever unit currently holds it.
    pub fn remove_chapter(&mut self, chapter_id: ChapterId) {
        for unit in &mut self.units {
            unit.chapters.retain(|chapter| chapter.id != chapter_id);
        }
    }

    /// Moves the unit at `from` to `to` within the top-level list.
    pub fn reorder_units(&mut self, from: usize, to: usize) -> Result<(), OutlineStoreError> {
        check_index(from, self.units.len())?;
        check_index(to, self.units.len())?;
        self.units = reorder(&self.units, from, to);
        Ok(())
    }

    /// Moves a chapter between two positions of one unit's list.
    pub fn reorder_chapters_within_unit(
        &mut self,
        unit_id: UnitId,
        from: usize,
        to: usize,
    ) -> Result<(), OutlineStoreError> {
        let unit = self
            .units
            .iter_mut()
            .find(|unit| unit.id == unit_id)
            .ok_or(OutlineStoreError::UnitNotFound(unit_id))?;
        check_index(from, unit.chapters.len())?;
        check_index(to, unit.chapters.len())?;
        unit.chapters = reorder(&unit.chapters, from, to);
        Ok(())
    }

    /// Moves a chapter from `source_unit_id` index `from` into
    /// `dest_unit_id` at index `to`, rewriting the chapter's owner.
    ///
    /// `to` may equal the destination length (append). All lookups and
    /// index checks happen before the first mutation, so a rejected call
    /// leaves both lists untouched.
    pub fn move_chapter_across_units(
        &mut self,
        source_unit_id: UnitId,
        dest_unit_id: UnitId,
        from: usize,
        to: usize,
    ) -> Result<(), OutlineStoreError> {
        if source_unit_id == dest_unit_id {
            return self.reorder_chapters_within_unit(source_unit_id, from, to);
        }

        let source_slot = self
            .unit_slot(source_unit_id)
            .ok_or(OutlineStoreError::UnitNotFound(source_unit_id))?;
        let dest_slot = self
            .unit_slot(dest_unit_id)
            .ok_or(OutlineStoreError::UnitNotFound(dest_unit_id))?;

        check_index(from, self.units[source_slot].chapters.len())?;
        let dest_len = self.units[dest_slot].chapters.len();
        if to > dest_len {
            return Err(OutlineStoreError::IndexOutOfRange {
                index: to,
                len: dest_len,
            });
        }

        let mut chapter = self.units[source_slot].chapters.remove(from);
        chapter.unit_id = dest_unit_id;
        self.units[dest_slot].chapters.insert(to, chapter);
        Ok(())
    }

    fn unit_slot(&self, unit_id: UnitId) -> Option<usize> {
        self.units.iter().position(|unit| unit.id == unit_id)
    }
}

fn check_index(index: usize, len: usize) -> Result<(), OutlineStoreError> {
    if index >= len {
        return Err(OutlineStoreError::IndexOutOfRange { index, len });
    }
    Ok(())
}
