//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise the outline editing flow end to end against an in-memory
//!   database.
//! - Keep output deterministic for quick local sanity checks.

use coursecraft_core::db::open_db_in_memory;
use coursecraft_core::{
    ChapterDraft, ChapterSlot, CourseRepository, DragEndEvent, OutlineEditor, OutlineRepository,
    OutlineService, SqliteCourseRepository, SqliteOutlineRepository, slugify,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("coursecraft smoke failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;

    let courses = SqliteCourseRepository::new(&conn);
    let title = "Rust from Scratch";
    let course = courses.create_course(title, &slugify(title), None)?;

    let repo = SqliteOutlineRepository::try_new(&conn)?;
    let service = OutlineService::new(SqliteOutlineRepository::try_new(&conn)?);
    let mut editor = OutlineEditor::open(&repo, course.id)?;

    let intro = editor.add_unit(&service, "Introduction", true)?;
    editor.add_chapter(
        &service,
        intro,
        ChapterDraft {
            title: "Toolchain Setup".to_string(),
            length: 7.5,
            active: true,
            ..ChapterDraft::default()
        },
    )?;
    editor.add_chapter(
        &service,
        intro,
        ChapterDraft {
            title: "Hello, Cargo".to_string(),
            length: 11.0,
            active: true,
            ..ChapterDraft::default()
        },
    )?;

    // Drag "Hello, Cargo" above "Toolchain Setup", then persist the order.
    editor.handle_drag(DragEndEvent::Chapter {
        source: ChapterSlot {
            unit_id: intro,
            index: 1,
        },
        destination: Some(ChapterSlot {
            unit_id: intro,
            index: 0,
        }),
    })?;
    editor.commit(&repo)?;

    println!(
        "coursecraft_core version={}",
        coursecraft_core::core_version()
    );
    println!("course {} ({})", course.title, course.handle);
    for unit in repo.fetch_outline(course.id)? {
        println!("  unit @{} {}", unit.position, unit.title);
        for chapter in &unit.chapters {
            println!(
                "    chapter @{} {} [{}]",
                chapter.position, chapter.title, chapter.handle
            );
        }
    }
    Ok(())
}
