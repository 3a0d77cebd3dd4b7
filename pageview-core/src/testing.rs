//! In-memory documents for unit tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::geometry::{Quad, Rect};
use crate::links::LinkDefinition;
use crate::text::{StructuredText, TextBlock, TextChar, TextLine};
use crate::{
    document_id_for_path, DocumentBackend, DocumentInfo, DocumentMetadata, DocumentProvider,
    PageLayoutIndex,
};

pub(crate) struct FakeBackend {
    info: DocumentInfo,
    layout: PageLayoutIndex,
    text: HashMap<usize, StructuredText>,
    links: HashMap<usize, Vec<LinkDefinition>>,
    broken: HashSet<usize>,
}

impl FakeBackend {
    /// `pages` pages of 100 x 100.
    pub fn new(pages: usize) -> Self {
        Self::with_sizes(vec![(100.0, 100.0); pages])
    }

    pub fn with_sizes(sizes: Vec<(f32, f32)>) -> Self {
        let layout = PageLayoutIndex::from_sizes(sizes);
        Self {
            info: DocumentInfo {
                id: uuid::Uuid::new_v4(),
                path: "/fake/document.pdf".into(),
                page_count: layout.num_pages(),
                metadata: DocumentMetadata::default(),
            },
            layout,
            text: HashMap::new(),
            links: HashMap::new(),
            broken: HashSet::new(),
        }
    }

    pub fn shared(pages: usize) -> Arc<dyn DocumentBackend> {
        Arc::new(Self::new(pages))
    }

    pub fn at_path(mut self, path: &Path) -> Self {
        self.info.id = document_id_for_path(path);
        self.info.path = path.to_path_buf();
        self
    }

    pub fn with_text(mut self, page: usize, lines: Vec<TextLine>) -> Self {
        self.text.insert(
            page,
            StructuredText {
                blocks: vec![TextBlock::Text { lines }],
            },
        );
        self
    }

    pub fn push_block(&mut self, page: usize, block: TextBlock) {
        self.text.entry(page).or_default().blocks.push(block);
    }

    pub fn with_links(mut self, page: usize, links: Vec<LinkDefinition>) -> Self {
        self.links.insert(page, links);
        self
    }

    pub fn with_broken_page(mut self, page: usize) -> Self {
        self.broken.insert(page);
        self
    }

    fn check_page(&self, page: usize) -> Result<()> {
        if page >= self.layout.num_pages() {
            return Err(anyhow!("page {} out of range", page));
        }
        if self.broken.contains(&page) {
            return Err(anyhow!("page {} is damaged", page));
        }
        Ok(())
    }
}

impl DocumentBackend for FakeBackend {
    fn info(&self) -> &DocumentInfo {
        &self.info
    }

    fn layout(&self) -> &PageLayoutIndex {
        &self.layout
    }

    fn structured_text(&self, page: usize) -> Result<StructuredText> {
        self.check_page(page)?;
        Ok(self.text.get(&page).cloned().unwrap_or_default())
    }

    fn page_links(&self, page: usize) -> Result<Vec<LinkDefinition>> {
        self.check_page(page)?;
        Ok(self.links.get(&page).cloned().unwrap_or_default())
    }

    fn search_page(&self, page: usize, query: &str) -> Result<Vec<Rect>> {
        let stext = self.structured_text(page)?;
        let needle: Vec<char> = query.chars().collect();
        let mut found = Vec::new();
        if needle.is_empty() {
            return Ok(found);
        }
        for line in stext.lines() {
            for window in line.chars.windows(needle.len()) {
                if window.iter().map(|ch| ch.c).eq(needle.iter().copied()) {
                    let first = window[0].quad.bounds();
                    let last = window[window.len() - 1].quad.bounds();
                    found.push(Rect::new(first.x0, first.y0, last.x1, last.y1));
                }
            }
        }
        Ok(found)
    }
}

/// Opens a fresh [`FakeBackend`] of `pages` pages for any path.
pub(crate) struct FakeProvider {
    pages: usize,
    first_page_text: Vec<TextLine>,
}

impl FakeProvider {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            first_page_text: Vec::new(),
        }
    }

    pub fn with_first_page_text(mut self, lines: Vec<TextLine>) -> Self {
        self.first_page_text = lines;
        self
    }
}

#[async_trait::async_trait]
impl DocumentProvider for FakeProvider {
    async fn open(&self, path: &Path) -> Result<Arc<dyn DocumentBackend>> {
        let backend = FakeBackend::new(self.pages)
            .with_text(0, self.first_page_text.clone())
            .at_path(path);
        Ok(Arc::new(backend))
    }
}

/// A line of 10 x 10 glyphs starting at `(x, y)`.
pub(crate) fn line(text: &str, x: f32, y: f32) -> TextLine {
    TextLine {
        chars: text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let x0 = x + 10.0 * i as f32;
                TextChar {
                    quad: Quad::from_rect(Rect::new(x0, y, x0 + 10.0, y + 10.0)),
                    c,
                }
            })
            .collect(),
    }
}

#[test]
fn fake_search_finds_words_in_lines() {
    let backend = FakeBackend::new(1).with_text(0, vec![line("a cat sat", 0.0, 20.0)]);
    let rects = backend.search_page(0, "at").unwrap();
    assert_eq!(
        rects,
        vec![Rect::new(30.0, 20.0, 50.0, 30.0), Rect::new(70.0, 20.0, 90.0, 30.0)]
    );
}
