//! Course outline domain records.
//!
//! # Responsibility
//! - Define `Course`, `Unit` and `Chapter` with their ordering keys.
//! - Keep the nested unit/chapter shape used by the outline editor.
//!
//! # Invariants
//! - `position` orders siblings: units within a course, chapters within a
//!   unit. After a successful commit the values form a dense `0..n-1` run;
//!   gaps are permitted only in the client-side dirty state.
//! - `Chapter::unit_id` always names the unit whose `chapters` list the
//!   chapter currently sits in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable course identifier.
pub type CourseId = Uuid;

/// Stable unit identifier.
pub type UnitId = Uuid;

/// Stable chapter identifier.
pub type ChapterId = Uuid;

/// Top-level owner of an outline. Not mutated by the editing subsystem
/// beyond existence checks at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    /// URL slug derived from the title.
    pub handle: String,
    pub excerpt: Option<String>,
    pub published: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// A module grouping within a course, carrying an ordered chapter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub course_id: CourseId,
    pub title: String,
    /// Ordering key among the course's units.
    pub position: i64,
    pub active: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Chapters ordered by `position ASC, id ASC`.
    pub chapters: Vec<Chapter>,
}

/// A leaf content item (video lesson) within a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    /// Owning unit. Rewritten when the chapter is dragged across units.
    pub unit_id: UnitId,
    pub title: String,
    /// URL slug, regenerated from the title on every title change.
    pub handle: String,
    /// Ordering key among the unit's chapters.
    pub position: i64,
    pub summary: Option<String>,
    pub video: Option<StoredVideo>,
    /// Lesson length in minutes.
    pub length: f64,
    pub active: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Reference to externally hosted lesson media, stored as a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVideo {
    pub id: String,
    pub name: String,
    pub url: String,
}
