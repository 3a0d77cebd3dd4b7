use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::error::{ViewError, ViewResult};
use crate::geometry::{AbsolutePos, DocumentPos, NormalizedWindowPos, Rect, WindowPos};
use crate::links::{self, LinkDefinition};
use crate::marks::{closest_index, Bookmark, Highlight, Portal, ViewSnapshot};
use crate::search::{SearchResult, SearchSession, SearchSnapshot, SearchWorker};
use crate::store::PersistedViewState;
use crate::text::{self, TextSelection};
use crate::transform::CoordinateTransformer;
use crate::viewport::{ViewTriple, ViewportState};
use crate::visible;
use crate::{DocumentBackend, DocumentInfo};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlights {
    pub search: Option<Rect>,
    pub selection: Vec<Rect>,
    pub links: Vec<Rect>,
    pub user: Vec<(char, Rect)>,
}

/// One open document seen through one viewport.
pub struct DocumentView {
    document: Option<Arc<dyn DocumentBackend>>,
    viewport: ViewportState,
    config: ViewerConfig,
    search: SearchSession,
    last_search_seen: SearchSnapshot,
    selection: TextSelection,
    highlight_links: bool,
    saved: PersistedViewState,
}

impl DocumentView {
    pub fn new(config: ViewerConfig, view_width: u32, view_height: u32) -> Self {
        Self {
            document: None,
            viewport: ViewportState::new(view_width, view_height),
            config,
            search: SearchSession::new(),
            last_search_seen: SearchSnapshot::default(),
            selection: TextSelection::default(),
            highlight_links: false,
            saved: PersistedViewState::default(),
        }
    }

    pub fn open(&mut self, document: Arc<dyn DocumentBackend>, state: Option<PersistedViewState>) {
        self.search.cancel();
        self.last_search_seen = SearchSnapshot::default();
        self.selection = TextSelection::default();
        self.highlight_links = false;
        self.viewport.restore(ViewTriple::default());

        let state = state.unwrap_or_default();
        self.viewport.restore(state.view());
        debug!(
            document = %document.info().id,
            zoom = state.zoom_level,
            offset_y = state.offset_y,
            "opened document view"
        );
        self.saved = state;
        self.document = Some(document);
    }

    pub fn document(&self) -> Option<&Arc<dyn DocumentBackend>> {
        self.document.as_ref()
    }

    pub fn info(&self) -> Option<&DocumentInfo> {
        self.document.as_deref().map(|doc| doc.info())
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn zoom_level(&self) -> f32 {
        self.viewport.zoom_level()
    }

    pub fn set_offsets(&mut self, offset_x: f32, offset_y: f32) {
        self.viewport.set_offsets(offset_x, offset_y);
    }

    pub fn set_offset_x(&mut self, offset_x: f32) {
        self.viewport.set_offset_x(offset_x);
    }

    pub fn set_offset_y(&mut self, offset_y: f32) {
        self.viewport.set_offset_y(offset_y);
    }

    pub fn set_zoom_level(&mut self, zoom_level: f32) -> f32 {
        self.viewport.set_zoom(zoom_level)
    }

    pub fn on_view_size_change(&mut self, width: u32, height: u32) {
        self.viewport.set_view_size(width, height);
    }

    pub fn should_rerender(&self) -> bool {
        self.viewport.should_rerender()
    }

    pub fn mark_rendered(&mut self) {
        self.viewport.mark_rendered();
    }

    pub fn transformer(&self) -> ViewResult<CoordinateTransformer<'_>> {
        let document = self
            .document
            .as_deref()
            .ok_or(ViewError::InvalidState("no document is open"))?;
        CoordinateTransformer::new(&self.viewport, document.layout())
    }

    pub fn absolute_to_window(&self, pos: AbsolutePos) -> ViewResult<WindowPos> {
        Ok(self.transformer()?.absolute_to_window(pos))
    }

    pub fn window_to_absolute(&self, pos: WindowPos) -> ViewResult<AbsolutePos> {
        Ok(self.transformer()?.window_to_absolute(pos))
    }

    pub fn window_to_normalized(&self, pos: WindowPos) -> ViewResult<NormalizedWindowPos> {
        Ok(self.transformer()?.window_to_normalized(pos))
    }

    pub fn document_to_window(&self, pos: DocumentPos) -> ViewResult<WindowPos> {
        Ok(self.transformer()?.document_to_window(pos))
    }

    pub fn window_to_document(&self, pos: WindowPos) -> ViewResult<DocumentPos> {
        self.transformer()?.window_to_document(pos)
    }

    pub fn visible_pages(&self, extent: f32) -> Vec<usize> {
        let Some(document) = self.document.as_deref() else {
            return Vec::new();
        };
        visible::visible_pages(
            &self.viewport,
            document.layout(),
            extent,
            self.config.visible_margin,
        )
        .unwrap_or_default()
    }

    pub fn visible_pages_in_view(&self) -> Vec<usize> {
        self.visible_pages(self.viewport.view_height() as f32)
    }

    pub fn current_page_number(&self) -> Option<usize> {
        self.visible_pages(self.config.current_page_probe_height)
            .first()
            .copied()
    }

    pub fn move_absolute(&mut self, dx: f32, dy: f32) {
        let (x, y) = self.viewport.offsets();
        self.viewport.set_offsets(x + dx, y + dy);
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        let zoom = self.viewport.zoom_level();
        if zoom > 0.0 {
            self.move_absolute(dx / zoom, dy / zoom);
        }
    }

    pub fn move_pages(&mut self, count: i32) {
        let Some(document) = self.document.as_deref() else {
            return;
        };
        let current = self.current_page_number().unwrap_or(0);
        let step = document.layout().page_height(current) + self.config.page_padding;
        self.move_absolute(0.0, count as f32 * step);
    }

    pub fn page_offset(&self, page: usize) -> f32 {
        match self.document.as_deref() {
            Some(document) => {
                let layout = document.layout();
                layout.accumulated_height(page.min(layout.num_pages()))
            }
            None => 0.0,
        }
    }

    pub fn goto_page(&mut self, page: usize) {
        if self.document.is_some() {
            self.set_offset_y(self.page_offset(page));
        }
    }

    pub fn goto_offset_within_page(&mut self, page: usize, offset_x: f32, offset_y: f32) {
        if self.document.is_some() {
            self.set_offsets(offset_x, self.page_offset(page) + offset_y);
        }
    }

    pub fn goto_end(&mut self) {
        if let Some(document) = self.document.as_deref() {
            let total = document.layout().total_height();
            self.set_offset_y(total);
        }
    }

    pub fn zoom_in(&mut self) -> f32 {
        let zoom = self.viewport.zoom_level() * self.config.zoom_increment;
        self.viewport.set_zoom(zoom)
    }

    pub fn zoom_out(&mut self) -> f32 {
        let zoom = self.viewport.zoom_level() / self.config.zoom_increment;
        self.viewport.set_zoom(zoom)
    }

    /// Scales the zoom by `factor` while keeping the point under `anchor`
    /// in place.
    pub fn zoom_at(&mut self, anchor: WindowPos, factor: f32) -> ViewResult<f32> {
        let new_zoom = self.viewport.zoom_level() * factor;
        if !(new_zoom.is_finite() && new_zoom > 0.0) {
            return Err(ViewError::InvalidState("zoom level must be positive"));
        }
        let (offset_x, offset_y) = {
            let transform = self.transformer()?;
            let target = transform.window_to_absolute(anchor);
            transform.offsets_anchoring(anchor, target, new_zoom)
        };
        self.viewport.set_zoom(new_zoom);
        self.viewport.set_offsets(offset_x, offset_y);
        Ok(new_zoom)
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    /// Starts a search from the current page. A blank query only clears the
    /// previous results.
    pub fn start_search(&mut self, worker: &dyn SearchWorker, query: &str) {
        let start_page = self.current_page_number().unwrap_or(0);
        self.start_search_from(worker, query, start_page);
    }

    pub fn start_search_from(&mut self, worker: &dyn SearchWorker, query: &str, start_page: usize) {
        let Some(document) = self.document.clone() else {
            return;
        };
        if query.trim().is_empty() {
            self.search.cancel();
        } else {
            self.search.start(worker, document, start_page, query);
        }
        self.viewport.invalidate();
    }

    pub fn handle_escape(&mut self) {
        self.search.cancel();
        self.selection = TextSelection::default();
        self.viewport.invalidate();
    }

    /// Steps through the results and scrolls the top of the match to the
    /// viewport center.
    pub fn goto_search_result(&mut self, offset: isize) -> Option<SearchResult> {
        let document = self.document.clone()?;
        let result = self.search.advance(offset)?;
        let offset_y = result.rect.y0 + document.layout().accumulated_height(result.page);
        self.set_offset_y(offset_y);
        Some(result)
    }

    pub fn poll_search(&mut self) -> bool {
        let snapshot = self.search.snapshot();
        if snapshot == self.last_search_seen {
            return false;
        }
        self.last_search_seen = snapshot;
        self.viewport.invalidate();
        true
    }

    pub fn selection(&self) -> &TextSelection {
        &self.selection
    }

    pub fn select_text(&mut self, begin: AbsolutePos, end: AbsolutePos) -> &TextSelection {
        self.selection = match self.document.as_deref() {
            Some(document) => text::select_text(document, begin, end),
            None => TextSelection::default(),
        };
        self.viewport.invalidate();
        &self.selection
    }

    pub fn select_window_range(&mut self, begin: WindowPos, end: WindowPos) -> ViewResult<&TextSelection> {
        let (begin, end) = {
            let transform = self.transformer()?;
            (transform.window_to_absolute(begin), transform.window_to_absolute(end))
        };
        Ok(self.select_text(begin, end))
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection = TextSelection::default();
            self.viewport.invalidate();
        }
    }

    pub fn link_at(&self, pos: WindowPos) -> Option<LinkDefinition> {
        let document = self.document.as_deref()?;
        let doc_pos = self.window_to_document(pos).ok()?;
        match document.page_links(doc_pos.page) {
            Ok(links) => links::link_at(&links, doc_pos).cloned(),
            Err(err) => {
                warn!(?err, page = doc_pos.page, "failed to load page links");
                None
            }
        }
    }

    pub fn toggle_link_highlight(&mut self) -> bool {
        self.highlight_links = !self.highlight_links;
        self.viewport.invalidate();
        self.highlight_links
    }

    pub fn highlights(&self) -> Highlights {
        let (Some(document), Ok(transform)) = (self.document.as_deref(), self.transformer()) else {
            return Highlights::default();
        };

        let search = self
            .search
            .current_result()
            .map(|result| transform.document_rect_to_window(result.page, result.rect));
        let selection = self
            .selection
            .character_rects
            .iter()
            .map(|&rect| transform.absolute_rect_to_window(rect))
            .collect();

        let mut links = Vec::new();
        if self.highlight_links {
            for page in self.visible_pages_in_view() {
                match document.page_links(page) {
                    Ok(page_links) => links.extend(
                        page_links
                            .iter()
                            .map(|link| transform.document_rect_to_window(page, link.rect)),
                    ),
                    Err(err) => warn!(?err, page, "failed to load page links"),
                }
            }
        }

        let user = self
            .saved
            .highlights
            .iter()
            .flat_map(|highlight| {
                highlight
                    .rects
                    .iter()
                    .map(move |&rect| (highlight.kind, transform.absolute_rect_to_window(rect)))
            })
            .collect();

        Highlights {
            search,
            selection,
            links,
            user,
        }
    }

    /// Turns the current selection into a persisted highlight of `kind`.
    /// Returns false when nothing is selected.
    pub fn add_highlight(&mut self, kind: char) -> bool {
        if self.document.is_none() || self.selection.is_empty() {
            return false;
        }
        let selection = std::mem::take(&mut self.selection);
        debug!(kind = %kind, text = %selection.text, "added highlight");
        self.saved.highlights.push(Highlight {
            begin: selection.begin,
            end: selection.end,
            kind,
            text: selection.text,
            rects: selection.character_rects,
        });
        self.viewport.invalidate();
        true
    }

    pub fn user_highlights(&self) -> &[Highlight] {
        &self.saved.highlights
    }

    pub fn highlight_at(&self, pos: WindowPos) -> Option<usize> {
        let pos = self.window_to_absolute(pos).ok()?;
        self.saved.highlights.iter().position(|highlight| highlight.contains(pos))
    }

    pub fn delete_highlight(&mut self, index: usize) -> Option<Highlight> {
        if index >= self.saved.highlights.len() {
            return None;
        }
        self.viewport.invalidate();
        Some(self.saved.highlights.remove(index))
    }

    pub fn put_mark(&mut self, symbol: char) {
        if self.document.is_some() {
            self.saved.marks.insert(symbol, self.viewport.offset_y());
        }
    }

    /// Returns false when no mark is stored under `symbol`.
    pub fn goto_mark(&mut self, symbol: char) -> bool {
        match self.saved.marks.get(&symbol).copied() {
            Some(offset_y) if self.document.is_some() => {
                self.set_offset_y(offset_y);
                true
            }
            _ => false,
        }
    }

    pub fn add_bookmark(&mut self, description: impl Into<String>) {
        if self.document.is_some() {
            self.saved.bookmarks.push(Bookmark {
                description: description.into(),
                offset_y: self.viewport.offset_y(),
            });
        }
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.saved.bookmarks
    }

    pub fn closest_bookmark(&self) -> Option<&Bookmark> {
        let index = closest_index(&self.saved.bookmarks, self.viewport.offset_y(), |b| b.offset_y)?;
        self.saved.bookmarks.get(index)
    }

    pub fn delete_closest_bookmark(&mut self) -> Option<Bookmark> {
        let index = closest_index(&self.saved.bookmarks, self.viewport.offset_y(), |b| b.offset_y)?;
        Some(self.saved.bookmarks.remove(index))
    }

    pub fn add_portal(&mut self, destination: ViewSnapshot) {
        if self.document.is_some() {
            self.saved.portals.push(Portal {
                src_offset_y: self.viewport.offset_y(),
                destination,
            });
        }
    }

    pub fn closest_portal(&self) -> Option<&Portal> {
        let index = closest_index(&self.saved.portals, self.viewport.offset_y(), |p| p.src_offset_y)?;
        self.saved.portals.get(index)
    }

    pub fn delete_closest_portal(&mut self) -> Option<Portal> {
        let index = closest_index(&self.saved.portals, self.viewport.offset_y(), |p| p.src_offset_y)?;
        Some(self.saved.portals.remove(index))
    }

    pub fn snapshot(&self) -> Option<ViewSnapshot> {
        let info = self.info()?;
        let view = self.viewport.snapshot();
        Some(ViewSnapshot {
            document: info.id,
            zoom_level: view.zoom_level,
            offset_x: view.offset_x,
            offset_y: view.offset_y,
        })
    }

    pub fn apply_snapshot(&mut self, snapshot: &ViewSnapshot) {
        self.viewport.restore(ViewTriple {
            zoom_level: snapshot.zoom_level,
            offset_x: snapshot.offset_x,
            offset_y: snapshot.offset_y,
        });
    }

    pub fn persisted_state(&self) -> PersistedViewState {
        let mut state = self.saved.clone();
        state.set_view(self.viewport.snapshot());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::LinkAction;
    use crate::search::tests::ManualWorker;
    use crate::testing::{line, FakeBackend};

    fn view_of(backend: FakeBackend) -> DocumentView {
        let mut view = DocumentView::new(ViewerConfig::default(), 600, 800);
        view.open(Arc::new(backend), None);
        view
    }

    fn a4_view() -> DocumentView {
        view_of(FakeBackend::with_sizes(vec![(595.0, 842.0); 2]))
    }

    #[test]
    fn empty_view_answers_with_sentinels() {
        let mut view = DocumentView::new(ViewerConfig::default(), 600, 800);
        assert!(view.visible_pages(800.0).is_empty());
        assert_eq!(view.current_page_number(), None);
        assert!(matches!(
            view.window_to_document(WindowPos::new(1.0, 1.0)),
            Err(ViewError::InvalidState(_))
        ));
        assert!(view.link_at(WindowPos::new(1.0, 1.0)).is_none());
        assert!(view.select_text(AbsolutePos::new(0.0, 0.0), AbsolutePos::new(10.0, 10.0)).is_empty());
        view.goto_end();
        view.put_mark('a');
        assert!(!view.goto_mark('a'));
        assert_eq!(view.goto_search_result(1), None);
        assert_eq!(view.highlights(), Highlights::default());
    }

    #[test]
    fn first_screen_of_a4_document() {
        let view = a4_view();
        assert_eq!(view.visible_pages(800.0), vec![0]);
        assert_eq!(view.current_page_number(), Some(0));
    }

    #[test]
    fn page_navigation_uses_accumulated_heights() {
        let mut view = view_of(FakeBackend::with_sizes(vec![
            (100.0, 100.0),
            (100.0, 200.0),
            (100.0, 50.0),
        ]));
        view.goto_page(1);
        assert_eq!(view.viewport().offset_y(), 100.0);
        view.goto_page(99);
        assert_eq!(view.viewport().offset_y(), 350.0);
        view.goto_offset_within_page(2, 4.0, 10.0);
        assert_eq!(view.viewport().offsets(), (4.0, 310.0));
        view.goto_end();
        assert_eq!(view.viewport().offset_y(), 350.0);
    }

    #[test]
    fn move_pages_steps_by_current_page_height() {
        let mut view = a4_view();
        view.move_pages(1);
        assert_eq!(view.viewport().offset_y(), 842.0);
        view.move_pages(-1);
        assert_eq!(view.viewport().offset_y(), 0.0);
    }

    #[test]
    fn pixel_moves_are_scaled_by_zoom() {
        let mut view = a4_view();
        view.set_zoom_level(2.0);
        view.move_by(10.0, 50.0);
        assert_eq!(view.viewport().offsets(), (5.0, 25.0));
    }

    #[test]
    fn zoom_steps_use_configured_increment() {
        let mut view = a4_view();
        let zoomed = view.zoom_in();
        assert!((zoomed - 1.2).abs() < 1e-6);
        let back = view.zoom_out();
        assert!((back - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_under_cursor_keeps_point_fixed() {
        let mut view = a4_view();
        view.set_offsets(10.0, 300.0);
        let anchor = WindowPos::new(450.0, 120.0);
        let before = view.window_to_absolute(anchor).unwrap();
        view.mark_rendered();

        let zoom = view.zoom_at(anchor, 1.5).unwrap();
        assert!((zoom - 1.5).abs() < 1e-6);
        assert!(view.should_rerender());
        let after = view.window_to_absolute(anchor).unwrap();
        assert!((after.x - before.x).abs() < 1e-3);
        assert!((after.y - before.y).abs() < 1e-3);
    }

    #[test]
    fn zero_zoom_is_reported_not_divided() {
        let mut view = a4_view();
        view.set_zoom_level(0.0);
        assert!(matches!(
            view.window_to_absolute(WindowPos::new(0.0, 0.0)),
            Err(ViewError::InvalidState(_))
        ));
        assert!(view.visible_pages(800.0).is_empty());
        assert!(view.zoom_at(WindowPos::new(0.0, 0.0), 2.0).is_err());
    }

    #[test]
    fn search_result_navigation_scrolls_to_match() {
        let mut view = a4_view();
        let worker = ManualWorker::default();
        view.goto_page(1);
        view.start_search(&worker, "term");
        assert_eq!(worker.requests.lock()[0].start_page, 0);

        let sink = worker.sink(0);
        sink.publish(1, [Rect::new(10.0, 200.0, 50.0, 210.0)]);
        sink.publish(0, [Rect::new(10.0, 40.0, 50.0, 50.0)]);

        let result = view.goto_search_result(1).unwrap();
        assert_eq!(result.page, 0);
        assert_eq!(view.viewport().offset_y(), 40.0);
        let result = view.goto_search_result(1).unwrap();
        assert_eq!(result.page, 1);
        assert_eq!(view.viewport().offset_y(), 1042.0);
    }

    #[test]
    fn explicit_start_page_overrides_current_page() {
        let mut view = view_of(FakeBackend::new(6));
        let worker = ManualWorker::default();
        view.goto_page(4);
        view.start_search_from(&worker, "term", 4);
        view.start_search(&worker, "term");

        let requests = worker.requests.lock();
        assert_eq!(requests[0].start_page, 4);
        assert_eq!(Some(requests[1].start_page), view.current_page_number());
    }

    #[test]
    fn restarting_search_clears_previous_results() {
        let mut view = a4_view();
        let worker = ManualWorker::default();
        view.start_search(&worker, "alpha");
        worker.sink(0).publish(0, [Rect::new(0.0, 0.0, 1.0, 1.0)]);
        view.goto_search_result(1);

        view.start_search(&worker, "beta");
        assert_eq!(view.search().num_results(), 0);
        assert_eq!(view.search().current_index(), 0);
    }

    #[test]
    fn blank_query_and_escape_clear_search() {
        let mut view = a4_view();
        let worker = ManualWorker::default();
        view.start_search(&worker, "alpha");
        worker.sink(0).publish(0, [Rect::new(0.0, 0.0, 1.0, 1.0)]);

        view.start_search(&worker, "   ");
        assert_eq!(worker.requests.lock().len(), 1);
        assert_eq!(view.search().num_results(), 0);
        assert!(view.search().is_searching().is_none());

        view.start_search(&worker, "gamma");
        worker.sink(1).publish(0, [Rect::new(0.0, 0.0, 1.0, 1.0)]);
        view.handle_escape();
        assert_eq!(view.search().num_results(), 0);
    }

    #[test]
    fn polling_invalidates_only_on_change() {
        let mut view = a4_view();
        let worker = ManualWorker::default();
        view.start_search(&worker, "term");
        assert!(view.poll_search());
        view.mark_rendered();
        assert!(!view.poll_search());
        assert!(!view.should_rerender());

        worker.sink(0).publish(1, [Rect::new(0.0, 0.0, 1.0, 1.0)]);
        assert!(view.poll_search());
        assert!(view.should_rerender());

        view.mark_rendered();
        worker.sink(0).finish();
        assert!(view.poll_search());
        assert!(!view.poll_search());
    }

    #[test]
    fn window_selection_matches_absolute_selection() {
        let backend = FakeBackend::new(1).with_text(0, vec![line("abc", 10.0, 10.0)]);
        let mut view = view_of(backend);
        view.set_offsets(0.0, 50.0);
        let begin = view.document_to_window(DocumentPos::new(0, 0.0, 0.0)).unwrap();
        let end = view.document_to_window(DocumentPos::new(0, 99.0, 30.0)).unwrap();
        let text = view.select_window_range(begin, end).unwrap().text.clone();
        assert_eq!(text, "abc");

        let highlights = view.highlights();
        assert_eq!(highlights.selection.len(), 3);
        let first = highlights.selection[0];
        let expected = view.document_to_window(DocumentPos::new(0, 10.0, 10.0)).unwrap();
        assert!((first.x0 - expected.x).abs() < 1e-3 && (first.y0 - expected.y).abs() < 1e-3);

        view.clear_selection();
        assert!(view.selection().is_empty());
    }

    #[test]
    fn link_lookup_goes_through_page_resolution() {
        let backend = FakeBackend::new(2).with_links(
            1,
            vec![LinkDefinition {
                rect: Rect::new(10.0, 10.0, 40.0, 20.0),
                action: LinkAction::Uri {
                    uri: "https://example.org/paper".into(),
                },
            }],
        );
        let mut view = view_of(backend);
        view.set_offsets(0.0, 150.0);
        let inside = view.document_to_window(DocumentPos::new(1, 20.0, 15.0)).unwrap();
        let link = view.link_at(inside).unwrap();
        assert!(matches!(link.action, LinkAction::Uri { ref uri } if uri.ends_with("paper")));

        let outside = view.document_to_window(DocumentPos::new(0, 20.0, 15.0)).unwrap();
        assert!(view.link_at(outside).is_none());

        assert!(view.highlights().links.is_empty());
        assert!(view.toggle_link_highlight());
        assert_eq!(view.highlights().links.len(), 1);
    }

    #[test]
    fn reopening_turns_link_highlighting_off() {
        let link = LinkDefinition {
            rect: Rect::new(10.0, 10.0, 40.0, 20.0),
            action: LinkAction::Uri {
                uri: "https://example.org".into(),
            },
        };
        let mut view = view_of(FakeBackend::new(1).with_links(0, vec![link.clone()]));
        assert!(view.toggle_link_highlight());
        assert_eq!(view.highlights().links.len(), 1);

        view.open(Arc::new(FakeBackend::new(1).with_links(0, vec![link])), None);
        assert!(view.highlights().links.is_empty());
        assert!(view.toggle_link_highlight());
    }

    #[test]
    fn selection_becomes_persistent_highlight() {
        let backend = FakeBackend::new(1).with_text(0, vec![line("abc", 10.0, 10.0)]);
        let mut view = view_of(backend);
        view.set_offsets(0.0, 50.0);
        assert!(!view.add_highlight('y'));

        let begin = view.document_to_window(DocumentPos::new(0, 0.0, 0.0)).unwrap();
        let end = view.document_to_window(DocumentPos::new(0, 99.0, 30.0)).unwrap();
        view.select_window_range(begin, end).unwrap();
        assert!(view.add_highlight('y'));
        assert!(view.selection().is_empty());
        assert_eq!(view.user_highlights()[0].text, "abc");

        let highlights = view.highlights();
        assert_eq!(highlights.user.len(), 3);
        assert!(highlights.user.iter().all(|&(kind, _)| kind == 'y'));
        assert_eq!(view.persisted_state().highlights.len(), 1);

        let on_b = view.document_to_window(DocumentPos::new(0, 25.0, 15.0)).unwrap();
        let below = view.document_to_window(DocumentPos::new(0, 25.0, 60.0)).unwrap();
        assert_eq!(view.highlight_at(on_b), Some(0));
        assert_eq!(view.highlight_at(below), None);

        assert!(view.delete_highlight(1).is_none());
        assert_eq!(view.delete_highlight(0).unwrap().kind, 'y');
        assert_eq!(view.highlight_at(on_b), None);
        assert!(view.highlights().user.is_empty());
    }

    #[test]
    fn marks_and_bookmarks_follow_offset() {
        let mut view = a4_view();
        view.set_offset_y(500.0);
        view.put_mark('m');
        view.add_bookmark("methods");
        view.set_offset_y(1500.0);
        view.add_bookmark("results");

        assert!(view.goto_mark('m'));
        assert_eq!(view.viewport().offset_y(), 500.0);
        assert!(!view.goto_mark('z'));
        assert_eq!(view.closest_bookmark().unwrap().description, "methods");

        view.set_offset_y(1400.0);
        let removed = view.delete_closest_bookmark().unwrap();
        assert_eq!(removed.description, "results");
        assert_eq!(view.bookmarks().len(), 1);

        let state = view.persisted_state();
        assert_eq!(state.offset_y, 1400.0);
        assert_eq!(state.marks.get(&'m'), Some(&500.0));
    }

    #[test]
    fn portals_resolve_by_source_offset() {
        let mut view = a4_view();
        let target = ViewSnapshot {
            document: view.info().unwrap().id,
            zoom_level: 2.0,
            offset_x: 0.0,
            offset_y: 1200.0,
        };
        view.set_offset_y(100.0);
        view.add_portal(target);
        view.set_offset_y(140.0);
        let destination = view.closest_portal().unwrap().destination;
        assert_eq!(destination, target);
        view.apply_snapshot(&destination);
        assert_eq!(view.zoom_level(), 2.0);
        assert_eq!(view.viewport().offset_y(), 1200.0);
        assert!(view.delete_closest_portal().is_some());
        assert!(view.closest_portal().is_none());
    }

    #[test]
    fn open_restores_persisted_view() {
        let mut view = DocumentView::new(ViewerConfig::default(), 600, 800);
        let state = PersistedViewState {
            zoom_level: 1.75,
            offset_x: -3.0,
            offset_y: 420.0,
            ..PersistedViewState::default()
        };
        view.open(FakeBackend::shared(3), Some(state));
        assert_eq!(view.zoom_level(), 1.75);
        assert_eq!(view.viewport().offsets(), (-3.0, 420.0));
        assert!(view.should_rerender());
    }
}
