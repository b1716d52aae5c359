//! Outline editing session: dirty tracking, inline edits and the commit
//! flow.
//!
//! # Responsibility
//! - Route decoded drag operations into the store and track unsaved
//!   reordering.
//! - Wire the inline editors: single-entity write first, then a local
//!   snapshot patch without a refetch.
//! - Serialize the snapshot into one transactional bulk write.
//!
//! # Invariants
//! - `Clean -> Dirty` happens only on an applied drag mutation; inline
//!   edits persist immediately and never touch the flag.
//! - A failed commit leaves the session dirty so the caller can retry or
//!   discard; a successful commit or a discard returns it to clean.
//! - There is no auto-save: dropping the session loses pending
//!   reordering.

use crate::editor::drag::{DragEndEvent, DragOp};
use crate::editor::store::{ChapterPatch, OutlineStore, OutlineStoreError, UnitPatch};
use crate::model::course::{ChapterId, CourseId, Unit, UnitId};
use crate::repo::outline_repo::{
    ChapterPlacement, OutlinePlan, OutlineRepoError, OutlineRepository, UnitPlacement,
};
use crate::service::outline_service::{ChapterDraft, OutlineService, OutlineServiceError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Unsaved-reordering state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// Snapshot matches the persisted outline order.
    Clean,
    /// Snapshot holds reordering not yet committed.
    Dirty,
}

/// What a drag-end event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// A mutation was applied; the session is now dirty.
    Applied,
    /// The event decoded to a no-op; nothing changed.
    Ignored,
}

/// Errors from session-level editing operations.
#[derive(Debug)]
pub enum OutlineEditError {
    /// Single-entity write failed (validation, not-found or storage).
    Service(OutlineServiceError),
    /// Local snapshot mutation was rejected.
    Store(OutlineStoreError),
}

impl Display for OutlineEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OutlineEditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<OutlineServiceError> for OutlineEditError {
    fn from(value: OutlineServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<OutlineStoreError> for OutlineEditError {
    fn from(value: OutlineStoreError) -> Self {
        Self::Store(value)
    }
}

/// One instructor's editing session over one course outline.
///
/// Constructed on page entry, discarded on navigation away. The session
/// exclusively owns the in-memory snapshot; concurrent sessions on the
/// same course are not coordinated (last commit wins).
#[derive(Debug)]
pub struct OutlineEditor {
    course_id: CourseId,
    store: OutlineStore,
    state: EditState,
}

impl OutlineEditor {
    /// Opens a session by fetching the persisted outline.
    pub fn open<R: OutlineRepository>(
        repo: &R,
        course_id: CourseId,
    ) -> Result<Self, OutlineRepoError> {
        let units = repo.fetch_outline(course_id)?;
        Ok(Self::from_units(course_id, units))
    }

    /// Opens a session over an already-fetched outline.
    pub fn from_units(course_id: CourseId, units: Vec<Unit>) -> Self {
        let mut store = OutlineStore::new();
        store.load(units);
        Self {
            course_id,
            store,
            state: EditState::Clean,
        }
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn store(&self) -> &OutlineStore {
        &self.store
    }

    /// Units in their current in-session order.
    pub fn units(&self) -> &[Unit] {
        self.store.units()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == EditState::Dirty
    }

    /// Applies one drag-end event.
    ///
    /// Events are handled strictly in arrival order; an event that decodes
    /// to a no-op is ignored and leaves the dirty flag alone. A rejected
    /// mutation (stale indices) also leaves the snapshot and flag
    /// untouched.
    pub fn handle_drag(&mut self, event: DragEndEvent) -> Result<DragOutcome, OutlineStoreError> {
        let Some(op) = event.into_op() else {
            return Ok(DragOutcome::Ignored);
        };

        match op {
            DragOp::MoveUnit { from, to } => self.store.reorder_units(from, to)?,
            DragOp::MoveChapterWithinUnit { unit_id, from, to } => {
                self.store.reorder_chapters_within_unit(unit_id, from, to)?
            }
            DragOp::MoveChapterAcrossUnits {
                source_unit_id,
                dest_unit_id,
                from,
                to,
            } => self
                .store
                .move_chapter_across_units(source_unit_id, dest_unit_id, from, to)?,
        }

        self.state = EditState::Dirty;
        Ok(DragOutcome::Applied)
    }

    /// Serializes the current snapshot into a flat placement set.
    ///
    /// Rebuilt from scratch every time: positions are the current list
    /// indices, so repeated commits of one snapshot write identical
    /// values.
    pub fn plan(&self) -> OutlinePlan {
        OutlinePlan {
            units: self
                .store
                .units()
                .iter()
                .enumerate()
                .map(|(unit_index, unit)| UnitPlacement {
                    id: unit.id,
                    position: unit_index as i64,
                    chapters: unit
                        .chapters
                        .iter()
                        .enumerate()
                        .map(|(chapter_index, chapter)| ChapterPlacement {
                            id: chapter.id,
                            unit_id: unit.id,
                            position: chapter_index as i64,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Persists the current outline order as one atomic bulk write.
    ///
    /// On failure the session stays dirty and the snapshot keeps its
    /// pending order for a retry.
    pub fn commit<R: OutlineRepository>(&mut self, repo: &R) -> Result<(), OutlineRepoError> {
        repo.commit_outline(self.course_id, &self.plan())?;
        self.state = EditState::Clean;
        info!(
            "event=outline_commit module=editor status=clean course_id={}",
            self.course_id
        );
        Ok(())
    }

    /// Drops pending reordering and reloads the persisted outline.
    pub fn discard<R: OutlineRepository>(&mut self, repo: &R) -> Result<(), OutlineRepoError> {
        let units = repo.fetch_outline(self.course_id)?;
        self.store.load(units);
        self.state = EditState::Clean;
        Ok(())
    }

    /// Inline editor: create a unit and append it locally.
    pub fn add_unit<R: OutlineRepository>(
        &mut self,
        service: &OutlineService<R>,
        title: impl Into<String>,
        active: bool,
    ) -> Result<UnitId, OutlineEditError> {
        let unit = service.add_unit(self.course_id, title, active)?;
        let unit_id = unit.id;
        self.store.push_unit(unit);
        Ok(unit_id)
    }

    /// Inline editor: update a unit and patch it locally in place.
    pub fn update_unit<R: OutlineRepository>(
        &mut self,
        service: &OutlineService<R>,
        unit_id: UnitId,
        title: impl Into<String>,
        active: bool,
    ) -> Result<(), OutlineEditError> {
        let title = title.into();
        service.update_unit(unit_id, title.clone(), active)?;
        self.store.patch_unit(
            unit_id,
            UnitPatch {
                title: Some(title.trim().to_string()),
                active: Some(active),
            },
        );
        Ok(())
    }

    /// Inline editor: delete a unit. The local entry is removed only after
    /// the write succeeded (deletes are not optimistic).
    pub fn delete_unit<R: OutlineRepository>(
        &mut self,
        service: &OutlineService<R>,
        unit_id: UnitId,
    ) -> Result<(), OutlineEditError> {
        service.delete_unit(unit_id)?;
        self.store.remove_unit(unit_id);
        Ok(())
    }

    /// Inline editor: create a chapter and append it locally.
    pub fn add_chapter<R: OutlineRepository>(
        &mut self,
        service: &OutlineService<R>,
        unit_id: UnitId,
        draft: ChapterDraft,
    ) -> Result<ChapterId, OutlineEditError> {
        let chapter = service.add_chapter(unit_id, draft)?;
        let chapter_id = chapter.id;
        self.store.push_chapter(chapter)?;
        Ok(chapter_id)
    }

    /// Inline editor: update a chapter and patch it locally in place.
    pub fn update_chapter<R: OutlineRepository>(
        &mut self,
        service: &OutlineService<R>,
        chapter_id: ChapterId,
        draft: ChapterDraft,
    ) -> Result<(), OutlineEditError> {
        let updated = service.update_chapter(chapter_id, draft)?;
        self.store.patch_chapter(
            chapter_id,
            ChapterPatch {
                title: Some(updated.title),
                handle: Some(updated.handle),
                summary: Some(updated.summary),
                video: Some(updated.video),
                length: Some(updated.length),
                active: Some(updated.active),
            },
        );
        Ok(())
    }

    /// Inline editor: delete a chapter, non-optimistically.
    pub fn delete_chapter<R: OutlineRepository>(
        &mut self,
        service: &OutlineService<R>,
        chapter_id: ChapterId,
    ) -> Result<(), OutlineEditError> {
        service.delete_chapter(chapter_id)?;
        self.store.remove_chapter(chapter_id);
        Ok(())
    }
}
