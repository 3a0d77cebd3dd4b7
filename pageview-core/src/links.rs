use serde::{Deserialize, Serialize};

use crate::geometry::{DocumentPos, Rect};

/// Where a link leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkAction {
    Uri { uri: String },
    GoTo { page: usize, y: f32 },
}

/// A clickable area of a page, in that page's coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub rect: Rect,
    pub action: LinkAction,
}

/// First link in `links` whose area holds `pos`.
pub fn link_at(links: &[LinkDefinition], pos: DocumentPos) -> Option<&LinkDefinition> {
    links.iter().find(|link| link.rect.contains(pos.x, pos.y))
}
