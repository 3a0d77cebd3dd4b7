use std::sync::Arc;

use anyhow::Result;
use pageview_core::{SearchRequest, SearchWorker};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

/// Runs searches on a rayon pool, the global one unless configured.
#[derive(Clone, Default)]
pub struct PooledSearchWorker {
    pool: Option<Arc<ThreadPool>>,
}

impl PooledSearchWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("pageview-search-{index}"))
            .build()?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }
}

impl SearchWorker for PooledSearchWorker {
    fn submit(&self, request: SearchRequest) {
        match &self.pool {
            Some(pool) => pool.spawn(move || run_search(request)),
            None => rayon::spawn(move || run_search(request)),
        }
    }
}

/// Scans every page once, starting at the hinted page and wrapping around.
/// Stops at the first page boundary after the request was superseded.
pub(crate) fn run_search(request: SearchRequest) {
    let SearchRequest {
        document,
        start_page,
        query,
        sink,
    } = request;

    let num_pages = document.layout().num_pages();
    if num_pages == 0 {
        sink.finish();
        return;
    }
    let start = start_page.min(num_pages - 1);
    debug!(generation = sink.generation(), start, num_pages, "search started");

    for step in 0..num_pages {
        if sink.is_cancelled() {
            debug!(generation = sink.generation(), step, "search superseded");
            return;
        }
        let page = (start + step) % num_pages;
        match document.search_page(page, &query) {
            Ok(rects) if rects.is_empty() => {}
            Ok(rects) => {
                if !sink.publish(page, rects) {
                    return;
                }
            }
            Err(err) => warn!(?err, page, "search failed on page"),
        }
        if !sink.report_progress((step + 1) as f32 / num_pages as f32) {
            return;
        }
    }

    sink.finish();
    debug!(generation = sink.generation(), "search finished");
}
