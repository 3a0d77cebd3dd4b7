use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::config::ViewerConfig;
use crate::geometry::WindowPos;
use crate::history::ViewHistory;
use crate::search::SearchWorker;
use crate::store::StateStore;
use crate::view::DocumentView;
use crate::{DocumentId, DocumentProvider};

#[derive(Debug, Clone)]
pub enum Command {
    MoveBy { dx: f32, dy: f32 },
    MovePages { count: i32 },
    GotoPage { page: usize },
    GotoEnd,
    ZoomIn,
    ZoomOut,
    ZoomAt { anchor: WindowPos, factor: f32 },
    Resize { width: u32, height: u32 },
    PutMark { key: char },
    GotoMark { key: char },
    AddBookmark { description: String },
    DeleteClosestBookmark,
    /// Without `start_page` the scan begins at the current page.
    Search { query: String, start_page: Option<usize> },
    SearchNext { count: usize },
    SearchPrev { count: usize },
    Escape,
    ToggleLinkHighlight,
    AddHighlight { kind: char },
    JumpBackward,
    JumpForward,
    SwitchDocument { index: usize },
    CloseDocument { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DocumentOpened(DocumentId),
    DocumentClosed(DocumentId),
    ActiveDocumentChanged(DocumentId),
    RedrawNeeded(DocumentId),
}

/// The open documents of one window, each behind its own view.
pub struct Session {
    views: Vec<DocumentView>,
    active: usize,
    store: Arc<dyn StateStore>,
    worker: Arc<dyn SearchWorker>,
    config: ViewerConfig,
    history: ViewHistory,
    view_size: (u32, u32),
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl Session {
    pub fn new(
        store: Arc<dyn StateStore>,
        worker: Arc<dyn SearchWorker>,
        config: ViewerConfig,
        view_size: (u32, u32),
    ) -> Self {
        let history = ViewHistory::new(config.history_capacity);
        Self {
            views: Vec::new(),
            active: 0,
            store,
            worker,
            config,
            history,
            view_size,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Arc<Mutex<Vec<SessionEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn active(&self) -> Option<&DocumentView> {
        self.views.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut DocumentView> {
        self.views.get_mut(self.active)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[instrument(skip(self, provider))]
    pub async fn open_with<P: DocumentProvider + ?Sized>(
        &mut self,
        provider: &P,
        path: PathBuf,
    ) -> Result<()> {
        let backend = provider.open(&path).await?;
        let info = backend.info().clone();
        let state = self.store.load(&info)?;

        if let Some(current) = self.active().and_then(DocumentView::snapshot) {
            self.history.push(current);
        }

        let (width, height) = self.view_size;
        let mut view = DocumentView::new(self.config.clone(), width, height);
        view.open(backend, state);
        self.views.push(view);
        self.active = self.views.len() - 1;
        let mut events = self.events.lock();
        events.push(SessionEvent::DocumentOpened(info.id));
        events.push(SessionEvent::ActiveDocumentChanged(info.id));
        Ok(())
    }

    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::SwitchDocument { index } => {
                if index < self.views.len() && index != self.active {
                    self.active = index;
                    if let Some(id) = self.active_id() {
                        self.events
                            .lock()
                            .push(SessionEvent::ActiveDocumentChanged(id));
                    }
                }
                return Ok(());
            }
            Command::CloseDocument { index } => return self.close(index),
            Command::JumpBackward => {
                if let Some(current) = self.active().and_then(DocumentView::snapshot) {
                    if let Some(target) = self.history.back(current) {
                        self.restore_snapshot(target);
                    }
                }
                return Ok(());
            }
            Command::JumpForward => {
                if let Some(target) = self.history.forward() {
                    self.restore_snapshot(target);
                }
                return Ok(());
            }
            Command::Resize { width, height } => {
                self.view_size = (width, height);
                for view in &mut self.views {
                    view.on_view_size_change(width, height);
                }
                if let Some(id) = self.active_id() {
                    self.events.lock().push(SessionEvent::RedrawNeeded(id));
                }
                return Ok(());
            }
            _ => {}
        }

        let Some(view) = self.views.get_mut(self.active) else {
            return Ok(());
        };
        let Some(id) = view.info().map(|info| info.id) else {
            return Ok(());
        };
        let before = view.snapshot();

        let records_jump = matches!(
            command,
            Command::GotoPage { .. }
                | Command::GotoEnd
                | Command::GotoMark { .. }
                | Command::SearchNext { .. }
                | Command::SearchPrev { .. }
        );

        match command {
            Command::MoveBy { dx, dy } => view.move_by(dx, dy),
            Command::MovePages { count } => view.move_pages(count),
            Command::GotoPage { page } => view.goto_page(page),
            Command::GotoEnd => view.goto_end(),
            Command::ZoomIn => {
                view.zoom_in();
            }
            Command::ZoomOut => {
                view.zoom_out();
            }
            Command::ZoomAt { anchor, factor } => {
                view.zoom_at(anchor, factor)?;
            }
            Command::PutMark { key } => view.put_mark(key),
            Command::GotoMark { key } => {
                view.goto_mark(key);
            }
            Command::AddBookmark { description } => view.add_bookmark(description),
            Command::DeleteClosestBookmark => {
                view.delete_closest_bookmark();
            }
            Command::Search { query, start_page } => match start_page {
                Some(page) => view.start_search_from(self.worker.as_ref(), &query, page),
                None => view.start_search(self.worker.as_ref(), &query),
            },
            Command::SearchNext { count } => {
                view.goto_search_result(count as isize);
            }
            Command::SearchPrev { count } => {
                view.goto_search_result(-(count as isize));
            }
            Command::Escape => view.handle_escape(),
            Command::ToggleLinkHighlight => {
                view.toggle_link_highlight();
            }
            Command::AddHighlight { kind } => {
                view.add_highlight(kind);
            }
            // document-level commands returned early
            _ => {}
        }

        let after = view.snapshot();
        let needs_redraw = view.should_rerender();
        if records_jump && before != after {
            if let Some(before) = before {
                debug!(from = before.offset_y, "recording jump");
                self.history.push(before);
            }
        }
        if needs_redraw {
            self.events.lock().push(SessionEvent::RedrawNeeded(id));
        }
        Ok(())
    }

    /// Polls every view's search and reports whether any needs a redraw.
    pub fn poll_searches(&mut self) -> bool {
        let mut changed = false;
        for view in &mut self.views {
            if view.poll_search() {
                changed = true;
                if let Some(info) = view.info() {
                    self.events.lock().push(SessionEvent::RedrawNeeded(info.id));
                }
            }
        }
        changed
    }

    pub fn persist(&self) -> Result<()> {
        for view in &self.views {
            if let Some(info) = view.info() {
                self.store.save(info, &view.persisted_state())?;
            }
        }
        Ok(())
    }

    fn active_id(&self) -> Option<DocumentId> {
        self.active()
            .and_then(DocumentView::info)
            .map(|info| info.id)
    }

    fn close(&mut self, index: usize) -> Result<()> {
        if index >= self.views.len() {
            return Ok(());
        }
        let mut view = self.views.remove(index);
        view.handle_escape();
        if let Some(info) = view.info() {
            self.store.save(info, &view.persisted_state())?;
            self.events
                .lock()
                .push(SessionEvent::DocumentClosed(info.id));
        }
        if self.views.is_empty() {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        } else if index == self.active {
            self.active = self.active.min(self.views.len() - 1);
            if let Some(id) = self.active_id() {
                self.events
                    .lock()
                    .push(SessionEvent::ActiveDocumentChanged(id));
            }
        }
        Ok(())
    }

    fn restore_snapshot(&mut self, target: crate::marks::ViewSnapshot) {
        let Some(index) = self
            .views
            .iter()
            .position(|view| view.info().map(|info| info.id) == Some(target.document))
        else {
            debug!(document = %target.document, "history entry refers to a closed document");
            return;
        };
        if index != self.active {
            self.active = index;
            self.events
                .lock()
                .push(SessionEvent::ActiveDocumentChanged(target.document));
        }
        self.views[index].apply_snapshot(&target);
        self.events
            .lock()
            .push(SessionEvent::RedrawNeeded(target.document));
    }
}
