//! Outline repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide unit/chapter persistence APIs for the outline editor.
//! - Own the transactional bulk commit that persists a reordered outline.
//!
//! # Invariants
//! - Units and chapters are always read in `position ASC, id ASC` order.
//! - `commit_outline` applies the full placement set or nothing.
//! - `chapters.unit_id` written by a commit always references a unit row.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::course::{Chapter, ChapterId, CourseId, StoredVideo, Unit, UnitId};
use log::{error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Result type used by outline repository operations.
pub type OutlineRepoResult<T> = Result<T, OutlineRepoError>;

/// Errors from outline repository operations.
#[derive(Debug)]
pub enum OutlineRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Course row does not exist.
    CourseNotFound(CourseId),
    /// Unit row does not exist.
    UnitNotFound(UnitId),
    /// Chapter row does not exist.
    ChapterNotFound(ChapterId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for OutlineRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CourseNotFound(id) => write!(f, "course not found: {id}"),
            Self::UnitNotFound(id) => write!(f, "unit not found: {id}"),
            Self::ChapterNotFound(id) => write!(f, "chapter not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "outline repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "outline repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid outline data: {message}"),
        }
    }
}

impl Error for OutlineRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for OutlineRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for OutlineRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Insert model for a new unit. Position is assigned by the caller
/// (append semantics: current sibling count).
#[derive(Debug, Clone)]
pub struct NewUnit {
    pub course_id: CourseId,
    pub title: String,
    pub position: i64,
    pub active: bool,
}

/// Field set written by a unit update.
#[derive(Debug, Clone)]
pub struct UnitUpdate {
    pub title: String,
    pub active: bool,
}

/// Insert model for a new chapter.
#[derive(Debug, Clone)]
pub struct NewChapter {
    pub unit_id: UnitId,
    pub title: String,
    pub handle: String,
    pub position: i64,
    pub summary: Option<String>,
    pub video: Option<StoredVideo>,
    pub length: f64,
    pub active: bool,
}

/// Field set written by a chapter update. `handle` is regenerated from the
/// title by the service layer on every update.
#[derive(Debug, Clone)]
pub struct ChapterUpdate {
    pub title: String,
    pub handle: String,
    pub summary: Option<String>,
    pub video: Option<StoredVideo>,
    pub length: f64,
    pub active: bool,
}

/// Target placement of one chapter inside a bulk commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPlacement {
    pub id: ChapterId,
    /// Owning unit after the commit (may differ from the persisted one).
    pub unit_id: UnitId,
    pub position: i64,
}

/// Target placement of one unit and its chapters inside a bulk commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlacement {
    pub id: UnitId,
    pub position: i64,
    pub chapters: Vec<ChapterPlacement>,
}

/// Flat instruction set serialized from an in-session outline snapshot.
///
/// Rebuilt from the snapshot on every commit, so flushing the same snapshot
/// twice writes the same values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlinePlan {
    pub units: Vec<UnitPlacement>,
}

/// Repository interface for outline persistence.
pub trait OutlineRepository {
    /// Loads the full outline of a course: units ordered by position with
    /// their chapters nested, likewise ordered.
    fn fetch_outline(&self, course_id: CourseId) -> OutlineRepoResult<Vec<Unit>>;
    /// Loads one unit with its chapters.
    fn get_unit(&self, unit_id: UnitId) -> OutlineRepoResult<Option<Unit>>;
    /// Creates one unit row.
    fn create_unit(&self, new_unit: &NewUnit) -> OutlineRepoResult<Unit>;
    /// Updates title/active of one unit.
    fn update_unit(&self, unit_id: UnitId, update: &UnitUpdate) -> OutlineRepoResult<()>;
    /// Deletes one unit row; chapters cascade at the storage layer.
    fn delete_unit(&self, unit_id: UnitId) -> OutlineRepoResult<()>;
    /// Loads one chapter.
    fn get_chapter(&self, chapter_id: ChapterId) -> OutlineRepoResult<Option<Chapter>>;
    /// Creates one chapter row.
    fn create_chapter(&self, new_chapter: &NewChapter) -> OutlineRepoResult<Chapter>;
    /// Updates one chapter's content fields (not its position/owner).
    fn update_chapter(&self, chapter_id: ChapterId, update: &ChapterUpdate)
        -> OutlineRepoResult<()>;
    /// Deletes one chapter row.
    fn delete_chapter(&self, chapter_id: ChapterId) -> OutlineRepoResult<()>;
    /// Counts units of a course.
    fn count_units(&self, course_id: CourseId) -> OutlineRepoResult<i64>;
    /// Counts chapters of a unit.
    fn count_chapters(&self, unit_id: UnitId) -> OutlineRepoResult<i64>;
    /// Returns whether another unit in the course already uses `title`.
    fn unit_title_exists(
        &self,
        course_id: CourseId,
        title: &str,
        exclude: Option<UnitId>,
    ) -> OutlineRepoResult<bool>;
    /// Returns whether another chapter in the unit already uses `title`.
    fn chapter_title_exists(
        &self,
        unit_id: UnitId,
        title: &str,
        exclude: Option<ChapterId>,
    ) -> OutlineRepoResult<bool>;
    /// Applies a full outline placement set as one atomic transaction:
    /// every unit's `position` and every chapter's `unit_id` + `position`.
    /// Any missing row aborts and rolls back the whole commit.
    fn commit_outline(&self, course_id: CourseId, plan: &OutlinePlan) -> OutlineRepoResult<()>;
}

/// SQLite-backed outline repository.
pub struct SqliteOutlineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutlineRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> OutlineRepoResult<Self> {
        ensure_outline_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl OutlineRepository for SqliteOutlineRepository<'_> {
    fn fetch_outline(&self, course_id: CourseId) -> OutlineRepoResult<Vec<Unit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, title, position, active, created_at
             FROM units
             WHERE course_id = ?1
             ORDER BY position ASC, id ASC;",
        )?;
        let mut rows = stmt.query([course_id.to_string()])?;

        let mut units = Vec::new();
        let mut slot_by_unit: HashMap<UnitId, usize> = HashMap::new();
        while let Some(row) = rows.next()? {
            let unit = parse_unit_row(row)?;
            slot_by_unit.insert(unit.id, units.len());
            units.push(unit);
        }

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.unit_id, c.title, c.handle, c.position, c.summary,
                    c.video, c.length, c.active, c.created_at
             FROM chapters c
             INNER JOIN units u ON u.id = c.unit_id
             WHERE u.course_id = ?1
             ORDER BY c.position ASC, c.id ASC;",
        )?;
        let mut rows = stmt.query([course_id.to_string()])?;
        while let Some(row) = rows.next()? {
            let chapter = parse_chapter_row(row)?;
            let slot = slot_by_unit.get(&chapter.unit_id).copied().ok_or_else(|| {
                OutlineRepoError::InvalidData(format!(
                    "chapter {} references unit {} outside course {course_id}",
                    chapter.id, chapter.unit_id
                ))
            })?;
            units[slot].chapters.push(chapter);
        }

        Ok(units)
    }

    fn get_unit(&self, unit_id: UnitId) -> OutlineRepoResult<Option<Unit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, course_id, title, position, active, created_at
             FROM units
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([unit_id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut unit = parse_unit_row(row)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, unit_id, title, handle, position, summary,
                    video, length, active, created_at
             FROM chapters
             WHERE unit_id = ?1
             ORDER BY position ASC, id ASC;",
        )?;
        let mut rows = stmt.query([unit_id.to_string()])?;
        while let Some(row) = rows.next()? {
            unit.chapters.push(parse_chapter_row(row)?);
        }
        Ok(Some(unit))
    }

    fn create_unit(&self, new_unit: &NewUnit) -> OutlineRepoResult<Unit> {
        if !course_exists(self.conn, new_unit.course_id)? {
            return Err(OutlineRepoError::CourseNotFound(new_unit.course_id));
        }

        let unit_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO units (id, course_id, title, position, active)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                unit_id.to_string(),
                new_unit.course_id.to_string(),
                new_unit.title.as_str(),
                new_unit.position,
                bool_to_int(new_unit.active),
            ],
        )?;

        self.get_unit(unit_id)?
            .ok_or(OutlineRepoError::UnitNotFound(unit_id))
    }

    fn update_unit(&self, unit_id: UnitId, update: &UnitUpdate) -> OutlineRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE units SET title = ?2, active = ?3 WHERE id = ?1;",
            params![
                unit_id.to_string(),
                update.title.as_str(),
                bool_to_int(update.active),
            ],
        )?;
        if changed == 0 {
            return Err(OutlineRepoError::UnitNotFound(unit_id));
        }
        Ok(())
    }

    fn delete_unit(&self, unit_id: UnitId) -> OutlineRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM units WHERE id = ?1;", [unit_id.to_string()])?;
        if changed == 0 {
            return Err(OutlineRepoError::UnitNotFound(unit_id));
        }
        Ok(())
    }

    fn get_chapter(&self, chapter_id: ChapterId) -> OutlineRepoResult<Option<Chapter>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, unit_id, title, handle, position, summary,
                    video, length, active, created_at
             FROM chapters
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([chapter_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_chapter_row(row)?));
        }
        Ok(None)
    }

    fn create_chapter(&self, new_chapter: &NewChapter) -> OutlineRepoResult<Chapter> {
        let unit_known: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM units WHERE id = ?1);",
            [new_chapter.unit_id.to_string()],
            |row| row.get(0),
        )?;
        if unit_known == 0 {
            return Err(OutlineRepoError::UnitNotFound(new_chapter.unit_id));
        }

        let chapter_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO chapters (id, unit_id, title, handle, position, summary, video, length, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                chapter_id.to_string(),
                new_chapter.unit_id.to_string(),
                new_chapter.title.as_str(),
                new_chapter.handle.as_str(),
                new_chapter.position,
                new_chapter.summary.as_deref(),
                video_to_db(new_chapter.video.as_ref())?,
                new_chapter.length,
                bool_to_int(new_chapter.active),
            ],
        )?;

        self.get_chapter(chapter_id)?
            .ok_or(OutlineRepoError::ChapterNotFound(chapter_id))
    }

    fn update_chapter(
        &self,
        chapter_id: ChapterId,
        update: &ChapterUpdate,
    ) -> OutlineRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE chapters
             SET title = ?2, handle = ?3, summary = ?4, video = ?5, length = ?6, active = ?7
             WHERE id = ?1;",
            params![
                chapter_id.to_string(),
                update.title.as_str(),
                update.handle.as_str(),
                update.summary.as_deref(),
                video_to_db(update.video.as_ref())?,
                update.length,
                bool_to_int(update.active),
            ],
        )?;
        if changed == 0 {
            return Err(OutlineRepoError::ChapterNotFound(chapter_id));
        }
        Ok(())
    }

    fn delete_chapter(&self, chapter_id: ChapterId) -> OutlineRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM chapters WHERE id = ?1;",
            [chapter_id.to_string()],
        )?;
        if changed == 0 {
            return Err(OutlineRepoError::ChapterNotFound(chapter_id));
        }
        Ok(())
    }

    fn count_units(&self, course_id: CourseId) -> OutlineRepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM units WHERE course_id = ?1;",
            [course_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_chapters(&self, unit_id: UnitId) -> OutlineRepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM chapters WHERE unit_id = ?1;",
            [unit_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn unit_title_exists(
        &self,
        course_id: CourseId,
        title: &str,
        exclude: Option<UnitId>,
    ) -> OutlineRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM units
                WHERE course_id = ?1
                  AND title = ?2
                  AND (?3 IS NULL OR id <> ?3)
            );",
            params![
                course_id.to_string(),
                title,
                exclude.map(|id| id.to_string()),
            ],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn chapter_title_exists(
        &self,
        unit_id: UnitId,
        title: &str,
        exclude: Option<ChapterId>,
    ) -> OutlineRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM chapters
                WHERE unit_id = ?1
                  AND title = ?2
                  AND (?3 IS NULL OR id <> ?3)
            );",
            params![
                unit_id.to_string(),
                title,
                exclude.map(|id| id.to_string()),
            ],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn commit_outline(&self, course_id: CourseId, plan: &OutlinePlan) -> OutlineRepoResult<()> {
        let started_at = Instant::now();
        info!(
            "event=outline_commit module=repo status=start course_id={course_id} units={}",
            plan.units.len()
        );

        match apply_outline_plan(self.conn, course_id, plan) {
            Ok(()) => {
                info!(
                    "event=outline_commit module=repo status=ok course_id={course_id} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=outline_commit module=repo status=error course_id={course_id} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

// Runs inside one immediate transaction. Returning early drops the
// transaction, rolling back every write issued so far.
fn apply_outline_plan(
    conn: &Connection,
    course_id: CourseId,
    plan: &OutlinePlan,
) -> OutlineRepoResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    if !course_exists(&tx, course_id)? {
        return Err(OutlineRepoError::CourseNotFound(course_id));
    }

    for unit in &plan.units {
        let changed = tx.execute(
            "UPDATE units SET position = ?2 WHERE id = ?1 AND course_id = ?3;",
            params![unit.id.to_string(), unit.position, course_id.to_string()],
        )?;
        if changed == 0 {
            return Err(OutlineRepoError::UnitNotFound(unit.id));
        }

        for chapter in &unit.chapters {
            let changed = tx.execute(
                "UPDATE chapters SET unit_id = ?2, position = ?3 WHERE id = ?1;",
                params![
                    chapter.id.to_string(),
                    chapter.unit_id.to_string(),
                    chapter.position,
                ],
            )?;
            if changed == 0 {
                return Err(OutlineRepoError::ChapterNotFound(chapter.id));
            }
        }
    }

    tx.commit()?;
    Ok(())
}

fn course_exists(conn: &Connection, course_id: CourseId) -> OutlineRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?1);",
        [course_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_unit_row(row: &Row<'_>) -> OutlineRepoResult<Unit> {
    let id_text: String = row.get("id")?;
    let course_id_text: String = row.get("course_id")?;
    Ok(Unit {
        id: parse_uuid(&id_text, "units.id")?,
        course_id: parse_uuid(&course_id_text, "units.course_id")?,
        title: row.get("title")?,
        position: row.get("position")?,
        active: int_to_bool(row.get("active")?, "units.active")?,
        created_at: row.get("created_at")?,
        chapters: Vec::new(),
    })
}

fn parse_chapter_row(row: &Row<'_>) -> OutlineRepoResult<Chapter> {
    let id_text: String = row.get("id")?;
    let unit_id_text: String = row.get("unit_id")?;
    let video_text: Option<String> = row.get("video")?;
    Ok(Chapter {
        id: parse_uuid(&id_text, "chapters.id")?,
        unit_id: parse_uuid(&unit_id_text, "chapters.unit_id")?,
        title: row.get("title")?,
        handle: row.get("handle")?,
        position: row.get("position")?,
        summary: row.get("summary")?,
        video: video_text.as_deref().map(video_from_db).transpose()?,
        length: row.get("length")?,
        active: int_to_bool(row.get("active")?, "chapters.active")?,
        created_at: row.get("created_at")?,
    })
}

fn video_to_db(video: Option<&StoredVideo>) -> OutlineRepoResult<Option<String>> {
    video
        .map(|value| {
            serde_json::to_string(value).map_err(|err| {
                OutlineRepoError::InvalidData(format!("unserializable chapter video: {err}"))
            })
        })
        .transpose()
}

fn video_from_db(value: &str) -> OutlineRepoResult<StoredVideo> {
    serde_json::from_str(value).map_err(|err| {
        OutlineRepoError::InvalidData(format!("invalid chapter video json: {err}"))
    })
}

fn parse_uuid(value: &str, column: &'static str) -> OutlineRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| OutlineRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn int_to_bool(value: i64, column: &'static str) -> OutlineRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(OutlineRepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn ensure_outline_connection_ready(conn: &Connection) -> OutlineRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(OutlineRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["courses", "units", "chapters"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(OutlineRepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
