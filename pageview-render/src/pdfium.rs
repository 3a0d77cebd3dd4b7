use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use pageview_core::{
    document_id_for_path, DocumentBackend, DocumentInfo, DocumentMetadata, DocumentProvider,
    LinkAction, LinkDefinition, PageLayoutIndex, Quad, Rect, StructuredText, TextBlock, TextChar,
    TextLine,
};
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use tracing::{debug, instrument, warn};

/// Environment variable naming a pdfium shared library to bind before
/// falling back to the working directory and the system library.
pub const PDFIUM_LIBRARY_ENV: &str = "PAGEVIEW_PDFIUM_LIBRARY_PATH";

pub struct PdfiumProvider {
    pdfium: Arc<Pdfium>,
}

impl PdfiumProvider {
    pub fn new() -> Result<Self> {
        let pdfium = match bind_pdfium_from_env() {
            Some(pdfium) => pdfium,
            None => bind_pdfium_default()?,
        };
        Ok(Self {
            pdfium: Arc::new(pdfium),
        })
    }
}

#[async_trait]
impl DocumentProvider for PdfiumProvider {
    #[instrument(skip(self))]
    async fn open(&self, path: &Path) -> Result<Arc<dyn DocumentBackend>> {
        let absolute = path
            .canonicalize()
            .with_context(|| format!("failed to resolve path for {:?}", path))?;
        let document = PdfiumDocument::load(Arc::clone(&self.pdfium), absolute)?;
        debug!(
            pages = document.layout.num_pages(),
            total_height = document.layout.total_height(),
            "opened pdf"
        );
        Ok(Arc::new(document))
    }
}

pub struct PdfiumDocument {
    document: Mutex<PdfDocument<'static>>,
    // keeps the bindings behind `document` alive
    _pdfium: Arc<Pdfium>,
    path: PathBuf,
    info: DocumentInfo,
    layout: PageLayoutIndex,
}

impl PdfiumDocument {
    fn load(pdfium: Arc<Pdfium>, path: PathBuf) -> Result<Self> {
        let document = pdfium
            .load_pdf_from_file(&path, None)
            .with_context(|| format!("failed to open {:?}", path))?;
        // SAFETY: the document borrows the bindings owned by `pdfium`. Struct
        // fields drop in declaration order, so `document` is dropped before
        // this struct releases its `_pdfium` handle.
        let document = unsafe { mem::transmute::<PdfDocument<'_>, PdfDocument<'static>>(document) };

        let sizes: Vec<(f32, f32)> = document
            .pages()
            .iter()
            .map(|page| (page.width().value, page.height().value))
            .collect();
        let layout = PageLayoutIndex::from_sizes(sizes);
        let info = document_info(&document, &path, layout.num_pages());

        Ok(Self {
            document: Mutex::new(document),
            _pdfium: pdfium,
            path,
            info,
            layout,
        })
    }

    fn with_page<R, F>(&self, page: usize, f: F) -> Result<R>
    where
        F: FnOnce(&PdfPage<'_>, f32) -> Result<R>,
    {
        let page_index: PdfPageIndex = page
            .try_into()
            .map_err(|_| anyhow!("page {} is out of supported range", page))?;
        let document = self.document.lock();
        let pdf_page = document
            .pages()
            .get(page_index)
            .with_context(|| format!("page {} out of range", page))?;
        let height = pdf_page.height().value;
        f(&pdf_page, height)
    }

    fn link_action_from_pdfium(&self, link: &PdfLink<'_>) -> Option<LinkAction> {
        if let Some(action) = link.action() {
            match action.action_type() {
                PdfActionType::GoToDestinationInSameDocument => {
                    if let Some(local) = action.as_local_destination_action() {
                        if let Ok(destination) = local.destination() {
                            if let Ok(page_index) = destination.page_index() {
                                return Some(LinkAction::GoTo {
                                    page: page_index as usize,
                                    y: 0.0,
                                });
                            }
                        }
                    }
                }
                PdfActionType::Uri => {
                    if let Some(uri_action) = action.as_uri_action() {
                        if let Ok(uri) = uri_action.uri() {
                            if !uri.is_empty() {
                                return Some(LinkAction::Uri { uri });
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let destination = link.destination()?;
        let page_index = destination.page_index().ok()?;
        Some(LinkAction::GoTo {
            page: page_index as usize,
            y: 0.0,
        })
    }
}

impl DocumentBackend for PdfiumDocument {
    fn info(&self) -> &DocumentInfo {
        &self.info
    }

    fn layout(&self) -> &PageLayoutIndex {
        &self.layout
    }

    fn structured_text(&self, page: usize) -> Result<StructuredText> {
        self.with_page(page, |pdf_page, height| {
            let text = pdf_page
                .text()
                .with_context(|| format!("failed to extract text for page {}", page))?;

            let mut lines = Vec::new();
            for segment in text.segments().iter() {
                let chars = match segment.chars() {
                    Ok(chars) => chars,
                    Err(err) => {
                        debug!(?err, page, "skipping unreadable text segment");
                        continue;
                    }
                };
                let mut line = TextLine::default();
                for ch in chars.iter() {
                    let (Some(c), Ok(bounds)) = (ch.unicode_char(), ch.loose_bounds()) else {
                        continue;
                    };
                    line.chars.push(TextChar {
                        quad: Quad::from_rect(to_page_rect(&bounds, height)),
                        c,
                    });
                }
                if !line.chars.is_empty() {
                    lines.push(line);
                }
            }

            Ok(StructuredText {
                blocks: vec![TextBlock::Text { lines }],
            })
        })
    }

    fn page_links(&self, page: usize) -> Result<Vec<LinkDefinition>> {
        self.with_page(page, |pdf_page, height| {
            let mut definitions = Vec::new();
            for link in pdf_page.links().iter() {
                let rect = match link.rect() {
                    Ok(rect) => rect,
                    Err(err) => {
                        warn!(
                            ?err,
                            page,
                            path = %self.path.display(),
                            "failed to resolve link rectangle"
                        );
                        continue;
                    }
                };
                let Some(action) = self.link_action_from_pdfium(&link) else {
                    continue;
                };
                definitions.push(LinkDefinition {
                    rect: to_page_rect(&rect, height),
                    action,
                });
            }
            Ok(definitions)
        })
    }

    fn search_page(&self, page: usize, query: &str) -> Result<Vec<Rect>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.with_page(page, |pdf_page, height| {
            let text = pdf_page
                .text()
                .with_context(|| format!("failed to extract text for page {}", page))?;
            let options = PdfSearchOptions::new();
            let search = text
                .search(query, &options)
                .with_context(|| format!("failed to perform search on page {}", page))?;

            let mut matches = Vec::new();
            while let Some(segments) = search.find_next() {
                let bounds = segments
                    .iter()
                    .map(|segment| to_page_rect(&segment.bounds(), height))
                    .reduce(|a, b| {
                        Rect::new(a.x0.min(b.x0), a.y0.min(b.y0), a.x1.max(b.x1), a.y1.max(b.y1))
                    });
                if let Some(bounds) = bounds {
                    matches.push(bounds);
                }
            }
            Ok(matches)
        })
    }
}

/// Pdfium rectangles have their origin at the bottom-left of the page.
fn to_page_rect(rect: &PdfRect, page_height: f32) -> Rect {
    Rect::new(
        rect.left().value,
        page_height - rect.top().value,
        rect.right().value,
        page_height - rect.bottom().value,
    )
}

fn document_info(document: &PdfDocument<'_>, path: &Path, page_count: usize) -> DocumentInfo {
    let metadata = document.metadata();
    let title = metadata
        .get(PdfDocumentMetadataTagType::Title)
        .map(|t| t.value().to_owned());
    let author = metadata
        .get(PdfDocumentMetadataTagType::Author)
        .map(|t| t.value().to_owned());

    DocumentInfo {
        id: document_id_for_path(path),
        path: path.to_path_buf(),
        page_count,
        metadata: DocumentMetadata { title, author },
    }
}

fn bind_pdfium_from_env() -> Option<Pdfium> {
    let path = std::env::var_os(PDFIUM_LIBRARY_ENV)?;
    if path.is_empty() {
        return None;
    }
    match Pdfium::bind_to_library(&path) {
        Ok(bindings) => Some(Pdfium::new(bindings)),
        Err(err) => {
            warn!(
                "failed to load Pdfium from {} ({:?}): {}",
                PDFIUM_LIBRARY_ENV, path, err
            );
            None
        }
    }
}

fn bind_pdfium_default() -> Result<Pdfium> {
    let mut errors = Vec::new();

    let cwd_path = Pdfium::pdfium_platform_library_name_at_path("./");
    match Pdfium::bind_to_library(&cwd_path) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(err) => errors.push(format!("{}: {}", cwd_path.display(), err)),
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(err) => {
            errors.push(format!("system: {err}"));
            Err(anyhow!(
                "failed to bind to a pdfium library; set {} or install it ({})",
                PDFIUM_LIBRARY_ENV,
                errors.join(", ")
            ))
        }
    }
}
