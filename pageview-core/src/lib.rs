use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod layout;
pub mod links;
pub mod marks;
pub mod search;
pub mod session;
pub mod store;
pub mod text;
pub mod transform;
pub mod view;
pub mod viewport;
pub mod visible;

#[cfg(test)]
mod testing;

pub use config::ViewerConfig;
pub use error::{ViewError, ViewResult};
pub use geometry::{AbsolutePos, DocumentPos, NormalizedWindowPos, Quad, Rect, WindowPos};
pub use layout::PageLayoutIndex;
pub use links::{LinkAction, LinkDefinition};
pub use marks::{Bookmark, Highlight, Portal, ViewSnapshot};
pub use search::{SearchRequest, SearchResult, SearchSession, SearchSink, SearchWorker};
pub use session::{Command, Session, SessionEvent};
pub use store::{FileStateStore, MemoryStateStore, PersistedViewState, StateStore};
pub use text::{StructuredText, TextBlock, TextChar, TextLine, TextSelection};
pub use view::{DocumentView, Highlights};
pub use viewport::ViewportState;

pub type DocumentId = Uuid;

static DOCUMENT_NAMESPACE: Lazy<Uuid> = Lazy::new(|| {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, b"pageview:document")
});

/// Stable identity of the file at `path`, used to key persisted state.
pub fn document_id_for_path(path: &Path) -> DocumentId {
    let resolved = path
        .canonicalize()
        .or_else(|_| {
            if path.is_absolute() {
                Ok(path.to_path_buf())
            } else {
                std::env::current_dir().map(|cwd| cwd.join(path))
            }
        })
        .unwrap_or_else(|_| path.to_path_buf());
    let rendered = resolved.to_string_lossy();
    Uuid::new_v5(&DOCUMENT_NAMESPACE, rendered.as_bytes())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub path: PathBuf,
    pub page_count: usize,
    pub metadata: DocumentMetadata,
}

/// A loaded document as the view layer sees it.
///
/// Rectangles coming out of the backend are in per-page coordinates with the
/// origin at the page's top-left corner and y growing downward.
pub trait DocumentBackend: Send + Sync {
    fn info(&self) -> &DocumentInfo;

    /// Page sizes, computed once when the document is opened.
    fn layout(&self) -> &PageLayoutIndex;

    fn structured_text(&self, page: usize) -> Result<StructuredText>;

    fn page_links(&self, page: usize) -> Result<Vec<LinkDefinition>>;

    /// Rectangles of every occurrence of `query` on `page`.
    fn search_page(&self, page: usize, query: &str) -> Result<Vec<Rect>>;
}

#[async_trait::async_trait]
pub trait DocumentProvider: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Arc<dyn DocumentBackend>>;
}
