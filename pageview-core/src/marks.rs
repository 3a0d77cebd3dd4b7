use serde::{Deserialize, Serialize};

use crate::geometry::{AbsolutePos, Rect};
use crate::DocumentId;

/// Where a view was looking, enough to restore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub document: DocumentId,
    pub zoom_level: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub description: String,
    pub offset_y: f32,
}

/// A jump from a vertical position in this document to any saved view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub src_offset_y: f32,
    pub destination: ViewSnapshot,
}

/// A persisted text highlight. `kind` is the user's one-letter category and
/// `rects` are the character boxes in absolute coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub begin: AbsolutePos,
    pub end: AbsolutePos,
    pub kind: char,
    pub text: String,
    pub rects: Vec<Rect>,
}

impl Highlight {
    pub fn contains(&self, pos: AbsolutePos) -> bool {
        self.rects.iter().any(|rect| rect.contains(pos.x, pos.y))
    }
}

/// Index of the item whose position is nearest `offset_y`.
pub fn closest_index<T>(items: &[T], offset_y: f32, position: impl Fn(&T) -> f32) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let da = (position(a) - offset_y).abs();
            let db = (position(b) - offset_y).abs();
            da.total_cmp(&db)
        })
        .map(|(index, _)| index)
}
