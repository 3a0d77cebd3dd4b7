use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::marks::{Bookmark, Highlight, Portal};
use crate::viewport::ViewTriple;
use crate::{DocumentId, DocumentInfo};

/// Per-document state kept between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedViewState {
    pub zoom_level: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub marks: HashMap<char, f32>,
    pub bookmarks: Vec<Bookmark>,
    pub portals: Vec<Portal>,
    pub highlights: Vec<Highlight>,
}

impl Default for PersistedViewState {
    fn default() -> Self {
        let view = ViewTriple::default();
        Self {
            zoom_level: view.zoom_level,
            offset_x: view.offset_x,
            offset_y: view.offset_y,
            marks: HashMap::new(),
            bookmarks: Vec::new(),
            portals: Vec::new(),
            highlights: Vec::new(),
        }
    }
}

impl PersistedViewState {
    pub fn view(&self) -> ViewTriple {
        ViewTriple {
            zoom_level: self.zoom_level,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }

    pub fn set_view(&mut self, view: ViewTriple) {
        self.zoom_level = view.zoom_level;
        self.offset_x = view.offset_x;
        self.offset_y = view.offset_y;
    }
}

pub trait StateStore: Send + Sync {
    fn load(&self, doc: &DocumentInfo) -> Result<Option<PersistedViewState>>;
    fn save(&self, doc: &DocumentInfo, state: &PersistedViewState) -> Result<()>;
}

/// One JSON file per document, named after the document id.
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create state directory at {:?}", root))?;
        Ok(Self { root })
    }

    fn state_path(&self, doc: &DocumentInfo) -> PathBuf {
        self.root.join(format!("{}.json", doc.id))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, doc: &DocumentInfo) -> Result<Option<PersistedViewState>> {
        let path = self.state_path(doc);
        if !path.exists() {
            return Ok(None);
        }
        let mut file =
            File::open(&path).with_context(|| format!("failed to open state file {:?}", path))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        let state = serde_json::from_str(&buf)
            .with_context(|| format!("failed to decode state file {:?}", path))?;
        Ok(Some(state))
    }

    fn save(&self, doc: &DocumentInfo, state: &PersistedViewState) -> Result<()> {
        let path = self.state_path(doc);
        let tmp = path.with_extension("json.tmp");
        let payload = serde_json::to_string_pretty(state)?;
        let mut file = File::create(&tmp)
            .with_context(|| format!("failed to open temp state file {:?}", tmp))?;
        file.write_all(payload.as_bytes())?;
        file.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStateStore {
    inner: Mutex<HashMap<DocumentId, PersistedViewState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, doc: &DocumentInfo) -> Result<Option<PersistedViewState>> {
        Ok(self.inner.lock().get(&doc.id).cloned())
    }

    fn save(&self, doc: &DocumentInfo, state: &PersistedViewState) -> Result<()> {
        self.inner.lock().insert(doc.id, state.clone());
        Ok(())
    }
}
