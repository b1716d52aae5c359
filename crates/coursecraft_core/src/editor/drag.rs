//! Drag-end event decoding.
//!
//! # Responsibility
//! - Represent drag-end payloads as an explicit tagged union instead of an
//!   untyped object.
//! - Decode each event exactly once into the store operation it implies.
//!
//! # Invariants
//! - A missing destination (dropped outside any target) decodes to no
//!   operation.
//! - Dropping an item on its own current slot decodes to no operation, so
//!   it can never dirty the session.

use crate::model::course::UnitId;

/// A chapter position inside a specific unit's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterSlot {
    pub unit_id: UnitId,
    pub index: usize,
}

/// Raw drag-end event as reported by the drag surface.
///
/// Units live in the single top-level list, so their slots are bare
/// indices; chapter slots name their containing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEndEvent {
    Unit {
        source_index: usize,
        /// `None` when the unit was dropped outside any valid target.
        destination_index: Option<usize>,
    },
    Chapter {
        source: ChapterSlot,
        /// `None` when the chapter was dropped outside any valid target.
        destination: Option<ChapterSlot>,
    },
}

/// Discrete outline mutation decoded from a drag-end event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOp {
    MoveUnit {
        from: usize,
        to: usize,
    },
    MoveChapterWithinUnit {
        unit_id: UnitId,
        from: usize,
        to: usize,
    },
    MoveChapterAcrossUnits {
        source_unit_id: UnitId,
        dest_unit_id: UnitId,
        from: usize,
        to: usize,
    },
}

impl DragEndEvent {
    /// Decodes the event into the mutation it implies, or `None` for a
    /// no-op (no destination, or source and destination slots equal).
    pub fn into_op(self) -> Option<DragOp> {
        match self {
            Self::Unit {
                destination_index: None,
                ..
            } => None,
            Self::Unit {
                source_index,
                destination_index: Some(to),
            } => {
                if source_index == to {
                    None
                } else {
                    Some(DragOp::MoveUnit {
                        from: source_index,
                        to,
                    })
                }
            }
            Self::Chapter {
                destination: None, ..
            } => None,
            Self::Chapter {
                source,
                destination: Some(dest),
            } => {
                if source.unit_id == dest.unit_id {
                    if source.index == dest.index {
                        None
                    } else {
                        Some(DragOp::MoveChapterWithinUnit {
                            unit_id: source.unit_id,
                            from: source.index,
                            to: dest.index,
                        })
                    }
                } else {
                    Some(DragOp::MoveChapterAcrossUnits {
                        source_unit_id: source.unit_id,
                        dest_unit_id: dest.unit_id,
                        from: source.index,
                        to: dest.index,
                    })
                }
            }
        }
    }
}
