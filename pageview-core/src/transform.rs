use crate::error::{ViewError, ViewResult};
use crate::geometry::{AbsolutePos, DocumentPos, NormalizedWindowPos, Rect, WindowPos};
use crate::layout::PageLayoutIndex;
use crate::viewport::ViewportState;

// `offset_y` is the absolute y at the viewport center, normalized y points up.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateTransformer<'a> {
    viewport: &'a ViewportState,
    layout: &'a PageLayoutIndex,
}

impl<'a> CoordinateTransformer<'a> {
    pub fn new(viewport: &'a ViewportState, layout: &'a PageLayoutIndex) -> ViewResult<Self> {
        let zoom = viewport.zoom_level();
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(ViewError::InvalidState("zoom level must be positive"));
        }
        if viewport.view_width() == 0 || viewport.view_height() == 0 {
            return Err(ViewError::InvalidState("viewport has no area"));
        }
        Ok(Self { viewport, layout })
    }

    fn zoom(&self) -> f32 {
        self.viewport.zoom_level()
    }

    fn width(&self) -> f32 {
        self.viewport.view_width() as f32
    }

    fn height(&self) -> f32 {
        self.viewport.view_height() as f32
    }

    pub fn absolute_to_normalized(&self, pos: AbsolutePos) -> NormalizedWindowPos {
        let half_width = self.width() / self.zoom() / 2.0;
        let half_height = self.height() / self.zoom() / 2.0;
        NormalizedWindowPos {
            x: (pos.x + self.viewport.offset_x()) / half_width,
            y: (-pos.y + self.viewport.offset_y()) / half_height,
        }
    }

    pub fn normalized_to_window(&self, pos: NormalizedWindowPos) -> WindowPos {
        WindowPos {
            x: (pos.x + 1.0) / 2.0 * self.width(),
            y: (1.0 - pos.y) / 2.0 * self.height(),
        }
    }

    pub fn window_to_normalized(&self, pos: WindowPos) -> NormalizedWindowPos {
        NormalizedWindowPos {
            x: pos.x / self.width() * 2.0 - 1.0,
            y: 1.0 - pos.y / self.height() * 2.0,
        }
    }

    pub fn absolute_to_window(&self, pos: AbsolutePos) -> WindowPos {
        self.normalized_to_window(self.absolute_to_normalized(pos))
    }

    pub fn window_to_absolute(&self, pos: WindowPos) -> AbsolutePos {
        AbsolutePos {
            x: (pos.x - self.width() / 2.0) / self.zoom() - self.viewport.offset_x(),
            y: (pos.y - self.height() / 2.0) / self.zoom() + self.viewport.offset_y(),
        }
    }

    pub fn document_to_absolute(&self, pos: DocumentPos) -> AbsolutePos {
        self.layout.page_to_absolute(pos)
    }

    pub fn document_to_window(&self, pos: DocumentPos) -> WindowPos {
        self.absolute_to_window(self.document_to_absolute(pos))
    }

    /// Resolves a pixel to the page under it. Pixels above or below the
    /// ribbon land on the first or last page with an out-of-page `y`.
    pub fn window_to_document(&self, pos: WindowPos) -> ViewResult<DocumentPos> {
        self.layout
            .absolute_to_page(self.window_to_absolute(pos))
            .ok_or(ViewError::InvalidState("document has no pages"))
    }

    pub fn absolute_rect_to_window(&self, rect: Rect) -> Rect {
        let a = self.absolute_to_window(AbsolutePos::new(rect.x0, rect.y0));
        let b = self.absolute_to_window(AbsolutePos::new(rect.x1, rect.y1));
        Rect::from_corners((a.x, a.y), (b.x, b.y))
    }

    pub fn document_rect_to_window(&self, page: usize, rect: Rect) -> Rect {
        self.absolute_rect_to_window(self.layout.page_rect_to_absolute(page, rect))
    }

    /// Offsets that place `target` under `anchor` at `zoom`, for the current
    /// viewport size.
    pub fn offsets_anchoring(&self, anchor: WindowPos, target: AbsolutePos, zoom: f32) -> (f32, f32) {
        let offset_x = (anchor.x - self.width() / 2.0) / zoom - target.x;
        let offset_y = target.y - (anchor.y - self.height() / 2.0) / zoom;
        (offset_x, offset_y)
    }
}
