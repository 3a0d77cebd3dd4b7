use crate::geometry::{AbsolutePos, DocumentPos, Rect};

/// Page sizes plus the prefix sum of their heights.
///
/// `accumulated_heights[i]` is the absolute `y` of page `i`'s top edge; the
/// total height plays the role of the one-past-the-end entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayoutIndex {
    page_widths: Vec<f32>,
    page_heights: Vec<f32>,
    accumulated_heights: Vec<f32>,
    total_height: f32,
}

impl PageLayoutIndex {
    /// Negative sizes are treated as zero so the prefix sum stays monotonic.
    pub fn from_sizes<I>(sizes: I) -> Self
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut index = Self::default();
        for (width, height) in sizes {
            let height = height.max(0.0);
            index.page_widths.push(width.max(0.0));
            index.page_heights.push(height);
            index.accumulated_heights.push(index.total_height);
            index.total_height += height;
        }
        index
    }

    pub fn num_pages(&self) -> usize {
        self.page_heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_heights.is_empty()
    }

    pub fn clamp_page(&self, page: usize) -> usize {
        page.min(self.num_pages().saturating_sub(1))
    }

    pub fn page_height(&self, page: usize) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.page_heights[self.clamp_page(page)]
    }

    pub fn page_width(&self, page: usize) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.page_widths[self.clamp_page(page)]
    }

    pub fn accumulated_height(&self, page: usize) -> f32 {
        self.accumulated_heights
            .get(page)
            .copied()
            .unwrap_or(self.total_height)
    }

    pub fn page_heights(&self) -> &[f32] {
        &self.page_heights
    }

    pub fn accumulated_heights(&self) -> &[f32] {
        &self.accumulated_heights
    }

    pub fn total_height(&self) -> f32 {
        self.total_height
    }

    /// Page whose span `[accumulated[p], accumulated[p + 1])` holds `abs_y`.
    /// Points above the first page resolve to page 0 and points below the
    /// last page resolve to the last page.
    pub fn page_at(&self, abs_y: f32) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let starts_at_or_above = self
            .accumulated_heights
            .partition_point(|&top| top <= abs_y);
        Some(starts_at_or_above.saturating_sub(1))
    }

    pub fn absolute_to_page(&self, pos: AbsolutePos) -> Option<DocumentPos> {
        let page = self.page_at(pos.y)?;
        Some(DocumentPos {
            page,
            x: pos.x + self.page_width(page) / 2.0,
            y: pos.y - self.accumulated_height(page),
        })
    }

    pub fn page_to_absolute(&self, pos: DocumentPos) -> AbsolutePos {
        let page = self.clamp_page(pos.page);
        AbsolutePos {
            x: pos.x - self.page_width(page) / 2.0,
            y: pos.y + self.accumulated_height(page),
        }
    }

    pub fn page_rect_to_absolute(&self, page: usize, rect: Rect) -> Rect {
        let page = self.clamp_page(page);
        rect.translate(-self.page_width(page) / 2.0, self.accumulated_height(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PageLayoutIndex {
        PageLayoutIndex::from_sizes([(80.0, 100.0), (120.0, 200.0), (60.0, 50.0)])
    }

    #[test]
    fn prefix_sum_matches_heights() {
        let layout = sample();
        assert_eq!(layout.num_pages(), 3);
        assert_eq!(layout.page_heights(), &[100.0, 200.0, 50.0]);
        assert_eq!(layout.accumulated_heights(), &[0.0, 100.0, 300.0]);
        assert_eq!(layout.accumulated_heights().len(), layout.page_heights().len());
        assert_eq!(layout.total_height(), 350.0);
        assert_eq!(layout.accumulated_height(3), 350.0);
        assert_eq!(layout.accumulated_height(42), 350.0);
    }

    #[test]
    fn page_lookup_uses_half_open_spans() {
        let layout = sample();
        assert_eq!(layout.page_at(0.0), Some(0));
        assert_eq!(layout.page_at(99.9), Some(0));
        assert_eq!(layout.page_at(100.0), Some(1));
        assert_eq!(layout.page_at(250.0), Some(1));
        assert_eq!(layout.page_at(300.0), Some(2));
    }

    #[test]
    fn page_lookup_clamps_outside_the_ribbon() {
        let layout = sample();
        assert_eq!(layout.page_at(-20.0), Some(0));
        assert_eq!(layout.page_at(10_000.0), Some(2));
        assert_eq!(PageLayoutIndex::default().page_at(0.0), None);
    }

    #[test]
    fn absolute_and_page_positions_convert_both_ways() {
        let layout = sample();
        let doc = layout
            .absolute_to_page(AbsolutePos::new(-10.0, 250.0))
            .unwrap();
        assert_eq!(doc.page, 1);
        assert_eq!(doc.y, 150.0);
        assert_eq!(doc.x, 50.0);
        assert_eq!(layout.page_to_absolute(doc), AbsolutePos::new(-10.0, 250.0));
    }

    #[test]
    fn out_of_range_pages_clamp_to_last() {
        let layout = sample();
        assert_eq!(layout.page_height(9), 50.0);
        assert_eq!(layout.page_width(9), 60.0);
        let rect = layout.page_rect_to_absolute(9, Rect::new(0.0, 0.0, 60.0, 10.0));
        assert_eq!(rect, Rect::new(-30.0, 300.0, 30.0, 310.0));
    }
}
