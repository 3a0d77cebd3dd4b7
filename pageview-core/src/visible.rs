use crate::error::{ViewError, ViewResult};
use crate::geometry::intervals_intersect;
use crate::layout::PageLayoutIndex;
use crate::viewport::ViewportState;

/// Pages whose vertical span meets `[offset_y - extent / zoom - margin,
/// offset_y + extent / zoom + margin]`, in increasing page order.
///
/// `extent` is a pixel height, usually the viewport height.
pub fn visible_pages(
    viewport: &ViewportState,
    layout: &PageLayoutIndex,
    extent: f32,
    margin: f32,
) -> ViewResult<Vec<usize>> {
    let zoom = viewport.zoom_level();
    if !(zoom.is_finite() && zoom > 0.0) {
        return Err(ViewError::InvalidState("zoom level must be positive"));
    }

    let range_begin = viewport.offset_y() - extent / zoom - margin;
    let range_end = viewport.offset_y() + extent / zoom + margin;

    let mut visible = Vec::new();
    let mut page_begin = 0.0f32;
    for (index, &height) in layout.page_heights().iter().enumerate() {
        let page_end = page_begin + height;
        if intervals_intersect(range_begin, range_end, page_begin, page_end) {
            visible.push(index);
        } else if page_begin >= range_end {
            break;
        }
        page_begin = page_end;
    }
    Ok(visible)
}
