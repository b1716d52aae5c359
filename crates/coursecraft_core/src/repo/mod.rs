//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/editor orchestration.
//!
//! # Invariants
//! - Repository reads return siblings in deterministic
//!   `position ASC, id ASC` order.
//! - Multi-row mutations run inside one immediate transaction.

pub mod course_repo;
pub mod outline_repo;
