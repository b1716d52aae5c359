//! Core domain logic for CourseCraft course outline editing.
//! This crate is the single source of truth for outline invariants.

pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use editor::drag::{ChapterSlot, DragEndEvent, DragOp};
pub use editor::reorder::reorder;
pub use editor::session::{DragOutcome, EditState, OutlineEditError, OutlineEditor};
pub use editor::store::{ChapterPatch, OutlineStore, OutlineStoreError, UnitPatch};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::course::{Chapter, ChapterId, Course, CourseId, StoredVideo, Unit, UnitId};
pub use repo::course_repo::{
    CourseRepoError, CourseRepoResult, CourseRepository, SqliteCourseRepository,
};
pub use repo::outline_repo::{
    ChapterPlacement, ChapterUpdate, NewChapter, NewUnit, OutlinePlan, OutlineRepoError,
    OutlineRepoResult, OutlineRepository, SqliteOutlineRepository, UnitPlacement, UnitUpdate,
};
pub use service::outline_service::{ChapterDraft, OutlineService, OutlineServiceError};
pub use service::slug::slugify;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
