//! Course repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over course rows.
//! - Keep title-uniqueness enforcement next to the rows that own it.
//!
//! # Invariants
//! - Course titles are unique across the table; create/rename reject
//!   duplicates before writing.
//! - Deleting a course cascades its units and chapters at the storage layer.

use crate::db::DbError;
use crate::model::course::{Course, CourseId};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by course repository operations.
pub type CourseRepoResult<T> = Result<T, CourseRepoError>;

/// Errors from course repository operations.
#[derive(Debug)]
pub enum CourseRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Course row does not exist.
    CourseNotFound(CourseId),
    /// Another course already uses this title.
    DuplicateTitle(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for CourseRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CourseNotFound(id) => write!(f, "course not found: {id}"),
            Self::DuplicateTitle(title) => write!(f, "course title already taken: `{title}`"),
            Self::InvalidData(message) => write!(f, "invalid course data: {message}"),
        }
    }
}

impl Error for CourseRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CourseRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CourseRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for course CRUD operations.
pub trait CourseRepository {
    /// Creates one course row. Title must not already be taken.
    fn create_course(
        &self,
        title: &str,
        handle: &str,
        excerpt: Option<&str>,
    ) -> CourseRepoResult<Course>;
    /// Loads one course by id.
    fn get_course(&self, course_id: CourseId) -> CourseRepoResult<Option<Course>>;
    /// Returns whether the course row exists.
    fn course_exists(&self, course_id: CourseId) -> CourseRepoResult<bool>;
    /// Renames one course. Title must not be taken by another course.
    fn rename_course(&self, course_id: CourseId, title: &str, handle: &str)
        -> CourseRepoResult<()>;
    /// Deletes one course row; units and chapters cascade.
    fn delete_course(&self, course_id: CourseId) -> CourseRepoResult<()>;
    /// Lists all courses ordered by creation time.
    fn list_courses(&self) -> CourseRepoResult<Vec<Course>>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn create_course(
        &self,
        title: &str,
        handle: &str,
        excerpt: Option<&str>,
    ) -> CourseRepoResult<Course> {
        if title_taken(self.conn, title, None)? {
            return Err(CourseRepoError::DuplicateTitle(title.to_string()));
        }

        let course_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO courses (id, title, handle, excerpt) VALUES (?1, ?2, ?3, ?4);",
            params![course_id.to_string(), title, handle, excerpt],
        )?;

        self.get_course(course_id)?
            .ok_or(CourseRepoError::CourseNotFound(course_id))
    }

    fn get_course(&self, course_id: CourseId) -> CourseRepoResult<Option<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, handle, excerpt, published, created_at
             FROM courses
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([course_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_course_row(row)?));
        }
        Ok(None)
    }

    fn course_exists(&self, course_id: CourseId) -> CourseRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?1);",
            [course_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn rename_course(
        &self,
        course_id: CourseId,
        title: &str,
        handle: &str,
    ) -> CourseRepoResult<()> {
        if title_taken(self.conn, title, Some(course_id))? {
            return Err(CourseRepoError::DuplicateTitle(title.to_string()));
        }

        let changed = self.conn.execute(
            "UPDATE courses SET title = ?2, handle = ?3 WHERE id = ?1;",
            params![course_id.to_string(), title, handle],
        )?;
        if changed == 0 {
            return Err(CourseRepoError::CourseNotFound(course_id));
        }
        Ok(())
    }

    fn delete_course(&self, course_id: CourseId) -> CourseRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM courses WHERE id = ?1;",
            [course_id.to_string()],
        )?;
        if changed == 0 {
            return Err(CourseRepoError::CourseNotFound(course_id));
        }
        Ok(())
    }

    fn list_courses(&self) -> CourseRepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, handle, excerpt, published, created_at
             FROM courses
             ORDER BY created_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_course_row(row)?);
        }
        Ok(items)
    }
}

fn title_taken(conn: &Connection, title: &str, exclude: Option<CourseId>) -> CourseRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM courses
            WHERE title = ?1
              AND (?2 IS NULL OR id <> ?2)
        );",
        params![title, exclude.map(|id| id.to_string())],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_course_row(row: &Row<'_>) -> CourseRepoResult<Course> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| CourseRepoError::InvalidData(format!("invalid uuid `{id_text}` in courses.id")))?;
    let published = match row.get::<_, i64>("published")? {
        0 => false,
        1 => true,
        other => {
            return Err(CourseRepoError::InvalidData(format!(
                "invalid boolean value `{other}` in courses.published"
            )));
        }
    };

    Ok(Course {
        id,
        title: row.get("title")?,
        handle: row.get("handle")?,
        excerpt: row.get("excerpt")?,
        published,
        created_at: row.get("created_at")?,
    })
}
