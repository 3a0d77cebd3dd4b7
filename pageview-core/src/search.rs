use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{ViewError, ViewResult};
use crate::geometry::Rect;
use crate::DocumentBackend;

/// One match: a page and a rectangle in that page's coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub page: usize,
    pub rect: Rect,
}

#[derive(Debug, Default)]
struct SearchState {
    results: Vec<SearchResult>,
    current_index: usize,
    is_searching: bool,
    percent_done: f32,
    generation: u64,
}

impl SearchState {
    fn reset(&mut self) {
        self.results.clear();
        self.current_index = 0;
        self.percent_done = 0.0;
        self.generation += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchSnapshot {
    pub is_searching: bool,
    pub percent_done: f32,
    pub num_results: usize,
    pub current_index: usize,
}

pub struct SearchRequest {
    pub document: Arc<dyn DocumentBackend>,
    pub start_page: usize,
    pub query: String,
    pub sink: SearchSink,
}

/// The background scanner. Submission must not block.
pub trait SearchWorker: Send + Sync {
    fn submit(&self, request: SearchRequest);
}

/// Write handle for one search generation. Once a newer search starts, or
/// the current one is cancelled, every write through it is dropped.
#[derive(Clone)]
pub struct SearchSink {
    shared: Arc<Mutex<SearchState>>,
    generation: u64,
}

impl SearchSink {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once the search was cancelled or a newer one started.
    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().generation != self.generation
    }

    /// Appends the matches of one page. Returns `false`, without writing,
    /// when this generation is no longer current.
    pub fn publish<I>(&self, page: usize, rects: I) -> bool
    where
        I: IntoIterator<Item = Rect>,
    {
        let mut state = self.shared.lock();
        if state.generation != self.generation {
            return false;
        }
        state
            .results
            .extend(rects.into_iter().map(|rect| SearchResult { page, rect }));
        true
    }

    pub fn report_progress(&self, percent_done: f32) -> bool {
        let mut state = self.shared.lock();
        if state.generation != self.generation {
            return false;
        }
        state.percent_done = percent_done.clamp(0.0, 1.0);
        true
    }

    /// Marks the search as done. A stale sink leaves the state untouched.
    pub fn finish(&self) {
        let mut state = self.shared.lock();
        if state.generation == self.generation {
            state.is_searching = false;
            state.percent_done = 1.0;
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchSession {
    shared: Arc<Mutex<SearchState>>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &self,
        worker: &dyn SearchWorker,
        document: Arc<dyn DocumentBackend>,
        start_page: usize,
        query: &str,
    ) {
        let sink = {
            let mut state = self.shared.lock();
            state.reset();
            state.is_searching = true;
            SearchSink {
                shared: Arc::clone(&self.shared),
                generation: state.generation,
            }
        };
        debug!(
            generation = sink.generation,
            start_page,
            query,
            "submitting search"
        );
        worker.submit(SearchRequest {
            document,
            start_page,
            query: query.to_owned(),
            sink,
        });
    }

    /// Drops all results. A running worker keeps scanning until it checks
    /// its sink, but none of its later writes land.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        state.reset();
        state.is_searching = false;
        debug!(generation = state.generation, "search cancelled");
    }

    /// Moves the cursor by `offset` with wraparound and returns the result
    /// under it, or `None` when there are no results.
    pub fn advance(&self, offset: isize) -> Option<SearchResult> {
        self.step(offset).ok()
    }

    /// Like [`advance`](Self::advance), but reports an empty result list.
    pub fn step(&self, offset: isize) -> ViewResult<SearchResult> {
        let mut state = self.shared.lock();
        let len = state.results.len();
        if len == 0 {
            return Err(ViewError::EmptyCollection("search results"));
        }
        let target = (state.current_index as i128 + offset as i128).rem_euclid(len as i128) as usize;
        state.current_index = target;
        Ok(state.results[target])
    }

    pub fn is_searching(&self) -> Option<f32> {
        let state = self.shared.lock();
        state.is_searching.then_some(state.percent_done)
    }

    pub fn num_results(&self) -> usize {
        self.shared.lock().results.len()
    }

    pub fn current_index(&self) -> usize {
        self.shared.lock().current_index
    }

    pub fn current_result(&self) -> Option<SearchResult> {
        let state = self.shared.lock();
        state.results.get(state.current_index).copied()
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.shared.lock().results.clone()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = self.shared.lock();
        SearchSnapshot {
            is_searching: state.is_searching,
            percent_done: state.percent_done,
            num_results: state.results.len(),
            current_index: state.current_index,
        }
    }
}
