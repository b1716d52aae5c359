use coursecraft_core::db::migrations::latest_version;
use coursecraft_core::db::open_db_in_memory;
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    columns
}

#[test]
fn migrations_reach_latest_version() {
    let conn = setup();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn foreign_keys_are_enabled() {
    let conn = setup();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn init_creates_outline_tables() {
    let conn = setup();

    for table in ["courses", "units", "chapters"] {
        let exists: i64 = conn
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "missing table {table}");
    }

    let unit_columns = table_columns(&conn, "units");
    for column in ["id", "course_id", "title", "position", "active", "created_at"] {
        assert!(
            unit_columns.contains(&column.to_string()),
            "missing units.{column}"
        );
    }

    let chapter_columns = table_columns(&conn, "chapters");
    for column in [
        "id",
        "unit_id",
        "title",
        "handle",
        "position",
        "summary",
        "video",
        "length",
        "active",
        "created_at",
    ] {
        assert!(
            chapter_columns.contains(&column.to_string()),
            "missing chapters.{column}"
        );
    }
}

#[test]
fn deleting_a_unit_row_cascades_its_chapters() {
    let conn = setup();

    conn.execute(
        "INSERT INTO courses (id, title, handle) VALUES ('c1', 'Course', 'course');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO units (id, course_id, title) VALUES ('u1', 'c1', 'Unit');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO chapters (id, unit_id, title, handle) VALUES ('ch1', 'u1', 'Chapter', 'chapter');",
        [],
    )
    .unwrap();

    conn.execute("DELETE FROM units WHERE id = 'u1';", []).unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM chapters;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}
