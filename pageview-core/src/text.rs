use tracing::{instrument, warn};

use crate::error::ViewError;
use crate::geometry::{AbsolutePos, Quad, Rect};
use crate::DocumentBackend;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredText {
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextBlock {
    Text { lines: Vec<TextLine> },
    Image { bbox: Rect },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub chars: Vec<TextChar>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextChar {
    pub quad: Quad,
    pub c: char,
}

impl StructuredText {
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|block| match block {
            TextBlock::Text { lines } => lines.as_slice(),
            TextBlock::Image { .. } => &[],
        })
    }
}

/// `character_rects` are absolute rectangles in reading order. `text` holds
/// the selected characters with one space after every contributing line,
/// except the last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSelection {
    pub begin: AbsolutePos,
    pub end: AbsolutePos,
    pub character_rects: Vec<Rect>,
    pub text: String,
}

impl TextSelection {
    pub fn is_empty(&self) -> bool {
        self.character_rects.is_empty()
    }
}

/// Selects every character whose absolute box meets the rectangle spanned by
/// `begin` and `end`, on every page between the two points.
#[instrument(skip(document), fields(document = %document.info().id))]
pub fn select_text(document: &dyn DocumentBackend, begin: AbsolutePos, end: AbsolutePos) -> TextSelection {
    let mut selection = TextSelection {
        begin,
        end,
        ..TextSelection::default()
    };

    let layout = document.layout();
    let bounds = Rect::from_corners((begin.x, begin.y), (end.x, end.y));
    let (Some(first_page), Some(last_page)) = (layout.page_at(bounds.y0), layout.page_at(bounds.y1))
    else {
        return selection;
    };

    for page in first_page..=last_page {
        let stext = match document.structured_text(page) {
            Ok(stext) => stext,
            Err(source) => {
                let err = ViewError::ResourceUnavailable { page, source };
                warn!(%err, "skipping page in selection");
                continue;
            }
        };

        for line in stext.lines() {
            let mut line_contributed = false;
            for ch in &line.chars {
                let rect = layout.page_rect_to_absolute(page, ch.quad.bounds());
                if bounds.intersects(&rect) {
                    line_contributed = true;
                    selection.text.push(ch.c);
                    selection.character_rects.push(rect);
                }
            }
            if line_contributed {
                selection.text.push(' ');
            }
        }
        // `stext` is released here, before the next page loads
    }

    if selection.text.ends_with(' ') {
        selection.text.pop();
    }
    selection
}
