//! Outline use-case service: the single-entity inline editors.
//!
//! # Responsibility
//! - Validate unit/chapter input above the repository layer.
//! - Assign append positions and derive chapter handles on every write.
//!
//! # Invariants
//! - New units/chapters are appended: `position = current sibling count`.
//! - Unit titles are unique per course on update (excluding the unit
//!   itself); chapter titles likewise per unit. Creation performs no
//!   uniqueness check.
//! - Chapter handles are regenerated from the title on every update.

use crate::model::course::{Chapter, ChapterId, CourseId, StoredVideo, Unit, UnitId};
use crate::repo::outline_repo::{
    ChapterUpdate, NewChapter, NewUnit, OutlineRepoError, OutlineRepository, UnitUpdate,
};
use crate::service::slug::slugify;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MIN_UNIT_TITLE_CHARS: usize = 3;

/// Errors from outline service operations.
///
/// Validation variants are recoverable user input problems; the caller is
/// expected to surface them as a notice, not a failure.
#[derive(Debug)]
pub enum OutlineServiceError {
    /// Title failed basic validation.
    InvalidTitle(&'static str),
    /// Another sibling already uses this title.
    DuplicateTitle(String),
    /// Target course does not exist.
    CourseNotFound(CourseId),
    /// Target unit does not exist.
    UnitNotFound(UnitId),
    /// Target chapter does not exist.
    ChapterNotFound(ChapterId),
    /// Repository-level failure.
    Repo(OutlineRepoError),
}

impl Display for OutlineServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle(reason) => write!(f, "invalid title: {reason}"),
            Self::DuplicateTitle(title) => write!(f, "title already taken: `{title}`"),
            Self::CourseNotFound(id) => write!(f, "course not found: {id}"),
            Self::UnitNotFound(id) => write!(f, "unit not found: {id}"),
            Self::ChapterNotFound(id) => write!(f, "chapter not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OutlineServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OutlineRepoError> for OutlineServiceError {
    fn from(value: OutlineRepoError) -> Self {
        match value {
            OutlineRepoError::CourseNotFound(id) => Self::CourseNotFound(id),
            OutlineRepoError::UnitNotFound(id) => Self::UnitNotFound(id),
            OutlineRepoError::ChapterNotFound(id) => Self::ChapterNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl OutlineServiceError {
    /// Returns whether the error is a recoverable validation problem
    /// rather than a storage failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidTitle(_) | Self::DuplicateTitle(_))
    }
}

/// Chapter content fields as entered in the editor dialogs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterDraft {
    pub title: String,
    pub summary: Option<String>,
    pub video: Option<StoredVideo>,
    /// Lesson length in minutes.
    pub length: f64,
    pub active: bool,
}

/// Outline service facade over a repository implementation.
pub struct OutlineService<R: OutlineRepository> {
    repo: R,
}

impl<R: OutlineRepository> OutlineService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads a course outline ordered by position.
    pub fn fetch_outline(&self, course_id: CourseId) -> Result<Vec<Unit>, OutlineServiceError> {
        self.repo.fetch_outline(course_id).map_err(Into::into)
    }

    /// Creates a unit appended at the end of the course outline.
    ///
    /// No uniqueness requirement on the title; the caller appends the
    /// returned row to its local outline without a refetch.
    pub fn add_unit(
        &self,
        course_id: CourseId,
        title: impl Into<String>,
        active: bool,
    ) -> Result<Unit, OutlineServiceError> {
        let title = normalize_unit_title(title.into())?;
        let position = self.repo.count_units(course_id)?;
        self.repo
            .create_unit(&NewUnit {
                course_id,
                title,
                position,
                active,
            })
            .map_err(Into::into)
    }

    /// Updates a unit's title and active flag.
    ///
    /// Rejects a title already used by another unit of the same course.
    pub fn update_unit(
        &self,
        unit_id: UnitId,
        title: impl Into<String>,
        active: bool,
    ) -> Result<(), OutlineServiceError> {
        let title = normalize_unit_title(title.into())?;
        let unit = self
            .repo
            .get_unit(unit_id)?
            .ok_or(OutlineServiceError::UnitNotFound(unit_id))?;
        if self
            .repo
            .unit_title_exists(unit.course_id, &title, Some(unit_id))?
        {
            return Err(OutlineServiceError::DuplicateTitle(title));
        }
        self.repo
            .update_unit(unit_id, &UnitUpdate { title, active })
            .map_err(Into::into)
    }

    /// Deletes a unit; its chapters cascade at the storage layer.
    pub fn delete_unit(&self, unit_id: UnitId) -> Result<(), OutlineServiceError> {
        self.repo.delete_unit(unit_id).map_err(Into::into)
    }

    /// Creates a chapter appended at the end of a unit, with its handle
    /// derived from the title.
    pub fn add_chapter(
        &self,
        unit_id: UnitId,
        draft: ChapterDraft,
    ) -> Result<Chapter, OutlineServiceError> {
        let title = normalize_chapter_title(draft.title)?;
        let handle = slugify(&title);
        let position = self.repo.count_chapters(unit_id)?;
        self.repo
            .create_chapter(&NewChapter {
                unit_id,
                title,
                handle,
                position,
                summary: draft.summary,
                video: draft.video,
                length: draft.length,
                active: draft.active,
            })
            .map_err(Into::into)
    }

    /// Updates a chapter's content fields, regenerating its handle.
    ///
    /// Rejects a title already used by another chapter of the same unit.
    pub fn update_chapter(
        &self,
        chapter_id: ChapterId,
        draft: ChapterDraft,
    ) -> Result<Chapter, OutlineServiceError> {
        let title = normalize_chapter_title(draft.title)?;
        let chapter = self
            .repo
            .get_chapter(chapter_id)?
            .ok_or(OutlineServiceError::ChapterNotFound(chapter_id))?;
        if self
            .repo
            .chapter_title_exists(chapter.unit_id, &title, Some(chapter_id))?
        {
            return Err(OutlineServiceError::DuplicateTitle(title));
        }

        let handle = slugify(&title);
        self.repo.update_chapter(
            chapter_id,
            &ChapterUpdate {
                title,
                handle,
                summary: draft.summary,
                video: draft.video,
                length: draft.length,
                active: draft.active,
            },
        )?;
        self.repo
            .get_chapter(chapter_id)?
            .ok_or(OutlineServiceError::ChapterNotFound(chapter_id))
    }

    /// Deletes a chapter.
    pub fn delete_chapter(&self, chapter_id: ChapterId) -> Result<(), OutlineServiceError> {
        self.repo.delete_chapter(chapter_id).map_err(Into::into)
    }
}

fn normalize_unit_title(value: String) -> Result<String, OutlineServiceError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < MIN_UNIT_TITLE_CHARS {
        return Err(OutlineServiceError::InvalidTitle(
            "unit title must be at least 3 characters",
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_chapter_title(value: String) -> Result<String, OutlineServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OutlineServiceError::InvalidTitle(
            "chapter title must not be blank",
        ));
    }
    Ok(trimmed.to_string())
}
