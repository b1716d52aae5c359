use coursecraft_core::db::open_db_in_memory;
use coursecraft_core::{
    ChapterDraft, ChapterPlacement, ChapterSlot, Course, CourseRepository, DragEndEvent,
    EditState, OutlineEditor, OutlinePlan, OutlineRepoError, OutlineRepository, OutlineService,
    SqliteCourseRepository, SqliteOutlineRepository, UnitPlacement, slugify,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed_course(conn: &Connection, title: &str) -> Course {
    let repo = SqliteCourseRepository::new(conn);
    repo.create_course(title, &slugify(title), None).unwrap()
}

fn service(conn: &Connection) -> OutlineService<SqliteOutlineRepository<'_>> {
    OutlineService::new(SqliteOutlineRepository::try_new(conn).unwrap())
}

fn draft(title: &str) -> ChapterDraft {
    ChapterDraft {
        title: title.to_string(),
        ..ChapterDraft::default()
    }
}

#[test]
fn committing_a_unit_swap_persists_swapped_positions() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    let unit_a = editor.add_unit(&service, "Unit A", true).unwrap();
    let unit_b = editor.add_unit(&service, "Unit B", true).unwrap();

    editor
        .handle_drag(DragEndEvent::Unit {
            source_index: 0,
            destination_index: Some(1),
        })
        .unwrap();
    editor.commit(&repo).unwrap();
    assert_eq!(editor.state(), EditState::Clean);

    let persisted = repo.fetch_outline(course.id).unwrap();
    assert_eq!(persisted[0].id, unit_b);
    assert_eq!(persisted[0].position, 0);
    assert_eq!(persisted[1].id, unit_a);
    assert_eq!(persisted[1].position, 1);
}

#[test]
fn committing_a_chapter_swap_persists_dense_positions() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    let intro = editor.add_unit(&service, "Intro", true).unwrap();
    editor.add_chapter(&service, intro, draft("Welcome")).unwrap();
    editor.add_chapter(&service, intro, draft("Setup")).unwrap();

    // Drag "Setup" above "Welcome".
    editor
        .handle_drag(DragEndEvent::Chapter {
            source: ChapterSlot {
                unit_id: intro,
                index: 1,
            },
            destination: Some(ChapterSlot {
                unit_id: intro,
                index: 0,
            }),
        })
        .unwrap();
    editor.commit(&repo).unwrap();

    let persisted = repo.fetch_outline(course.id).unwrap();
    let chapters = &persisted[0].chapters;
    assert_eq!(chapters[0].title, "Setup");
    assert_eq!(chapters[0].position, 0);
    assert_eq!(chapters[1].title, "Welcome");
    assert_eq!(chapters[1].position, 1);
}

#[test]
fn committing_a_cross_unit_move_persists_the_new_owner() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    let first = editor.add_unit(&service, "Unit 1", true).unwrap();
    let second = editor.add_unit(&service, "Unit 2", true).unwrap();
    editor.add_chapter(&service, first, draft("C1")).unwrap();
    let moved = editor.add_chapter(&service, first, draft("C2")).unwrap();
    editor.add_chapter(&service, second, draft("C3")).unwrap();

    editor
        .handle_drag(DragEndEvent::Chapter {
            source: ChapterSlot {
                unit_id: first,
                index: 1,
            },
            destination: Some(ChapterSlot {
                unit_id: second,
                index: 0,
            }),
        })
        .unwrap();
    editor.commit(&repo).unwrap();

    let persisted_chapter = repo.get_chapter(moved).unwrap().unwrap();
    assert_eq!(persisted_chapter.unit_id, second);
    assert_eq!(persisted_chapter.position, 0);

    let persisted = repo.fetch_outline(course.id).unwrap();
    assert_eq!(persisted[0].chapters.len(), 1);
    assert_eq!(persisted[1].chapters.len(), 2);
    let titles: Vec<&str> = persisted[1]
        .chapters
        .iter()
        .map(|chapter| chapter.title.as_str())
        .collect();
    assert_eq!(titles, ["C2", "C3"]);
}

#[test]
fn committing_twice_without_edits_is_idempotent() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    editor.add_unit(&service, "Unit A", true).unwrap();
    editor.add_unit(&service, "Unit B", true).unwrap();
    editor
        .handle_drag(DragEndEvent::Unit {
            source_index: 1,
            destination_index: Some(0),
        })
        .unwrap();

    editor.commit(&repo).unwrap();
    let first_snapshot = repo.fetch_outline(course.id).unwrap();

    editor.commit(&repo).unwrap();
    let second_snapshot = repo.fetch_outline(course.id).unwrap();
    assert_eq!(first_snapshot, second_snapshot);
}

#[test]
fn commit_against_a_deleted_course_fails_and_stays_dirty() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let courses = SqliteCourseRepository::new(&conn);
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    editor.add_unit(&service, "Unit A", true).unwrap();
    editor.add_unit(&service, "Unit B", true).unwrap();
    editor
        .handle_drag(DragEndEvent::Unit {
            source_index: 0,
            destination_index: Some(1),
        })
        .unwrap();

    // Concurrent deletion: the course (and its rows) vanish underneath
    // the session before it commits.
    courses.delete_course(course.id).unwrap();

    let err = editor.commit(&repo).unwrap_err();
    assert!(matches!(err, OutlineRepoError::CourseNotFound(_)));
    assert_eq!(editor.state(), EditState::Dirty);

    // The pending local order survives for a retry or discard.
    let titles: Vec<&str> = editor
        .units()
        .iter()
        .map(|unit| unit.title.as_str())
        .collect();
    assert_eq!(titles, ["Unit B", "Unit A"]);
}

#[test]
fn commit_rolls_back_fully_when_a_row_is_missing() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let unit_a = service.add_unit(course.id, "Unit A", true).unwrap();
    let unit_b = service.add_unit(course.id, "Unit B", true).unwrap();
    let chapter = service.add_chapter(unit_a.id, draft("C1")).unwrap();

    // A plan that reorders both units and then touches a chapter that no
    // longer exists: every earlier write must be rolled back.
    let plan = OutlinePlan {
        units: vec![
            UnitPlacement {
                id: unit_b.id,
                position: 0,
                chapters: Vec::new(),
            },
            UnitPlacement {
                id: unit_a.id,
                position: 1,
                chapters: vec![
                    ChapterPlacement {
                        id: chapter.id,
                        unit_id: unit_a.id,
                        position: 0,
                    },
                    ChapterPlacement {
                        id: Uuid::new_v4(),
                        unit_id: unit_a.id,
                        position: 1,
                    },
                ],
            },
        ],
    };

    let err = repo.commit_outline(course.id, &plan).unwrap_err();
    assert!(matches!(err, OutlineRepoError::ChapterNotFound(_)));

    // No partial position writes are observable.
    let persisted = repo.fetch_outline(course.id).unwrap();
    assert_eq!(persisted[0].id, unit_a.id);
    assert_eq!(persisted[0].position, 0);
    assert_eq!(persisted[1].id, unit_b.id);
    assert_eq!(persisted[1].position, 1);
}

#[test]
fn discard_reloads_the_persisted_order_and_resets_the_flag() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    editor.add_unit(&service, "Unit A", true).unwrap();
    editor.add_unit(&service, "Unit B", true).unwrap();
    editor
        .handle_drag(DragEndEvent::Unit {
            source_index: 0,
            destination_index: Some(1),
        })
        .unwrap();
    assert!(editor.is_dirty());

    editor.discard(&repo).unwrap();

    assert_eq!(editor.state(), EditState::Clean);
    let titles: Vec<&str> = editor
        .units()
        .iter()
        .map(|unit| unit.title.as_str())
        .collect();
    assert_eq!(titles, ["Unit A", "Unit B"]);
}

#[test]
fn adding_a_unit_mid_session_appends_without_touching_the_flag() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    editor.add_unit(&service, "Module 1", true).unwrap();
    editor.add_unit(&service, "Module 2", true).unwrap();

    let third = editor.add_unit(&service, "Module 3", true).unwrap();

    assert_eq!(editor.state(), EditState::Clean);
    assert_eq!(editor.units().len(), 3);
    assert_eq!(editor.units()[2].id, third);
    assert_eq!(editor.units()[2].position, 2);

    // Existing units kept their order.
    let titles: Vec<&str> = editor
        .units()
        .iter()
        .map(|unit| unit.title.as_str())
        .collect();
    assert_eq!(titles, ["Module 1", "Module 2", "Module 3"]);
}

#[test]
fn non_optimistic_delete_keeps_the_entry_on_failure() {
    let conn = setup();
    let course = seed_course(&conn, "Rust Basics");
    let repo = SqliteOutlineRepository::try_new(&conn).unwrap();
    let service = service(&conn);

    let mut editor = OutlineEditor::open(&repo, course.id).unwrap();
    let unit_id = editor.add_unit(&service, "Intro", true).unwrap();

    // Simulate a concurrent removal at the storage layer.
    repo.delete_unit(unit_id).unwrap();

    let err = editor.delete_unit(&service, unit_id).unwrap_err();
    assert!(err.to_string().contains("unit not found"));

    // The local entry is only dropped after a confirmed write, so the
    // stale row is still visible in the session.
    assert_eq!(editor.units().len(), 1);
}
