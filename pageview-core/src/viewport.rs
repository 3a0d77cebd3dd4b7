use serde::{Deserialize, Serialize};

/// Zoom, scroll and size of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    zoom_level: f32,
    offset_x: f32,
    offset_y: f32,
    view_width: u32,
    view_height: u32,
    render_invalid: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom_level: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            view_width: 0,
            view_height: 0,
            render_invalid: true,
        }
    }
}

impl ViewportState {
    pub fn new(view_width: u32, view_height: u32) -> Self {
        Self {
            view_width,
            view_height,
            ..Self::default()
        }
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    pub fn offset_x(&self) -> f32 {
        self.offset_x
    }

    pub fn offset_y(&self) -> f32 {
        self.offset_y
    }

    pub fn offsets(&self) -> (f32, f32) {
        (self.offset_x, self.offset_y)
    }

    pub fn view_width(&self) -> u32 {
        self.view_width
    }

    pub fn view_height(&self) -> u32 {
        self.view_height
    }

    pub fn set_offsets(&mut self, offset_x: f32, offset_y: f32) {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.render_invalid = true;
    }

    pub fn set_offset_x(&mut self, offset_x: f32) {
        self.set_offsets(offset_x, self.offset_y);
    }

    pub fn set_offset_y(&mut self, offset_y: f32) {
        self.set_offsets(self.offset_x, offset_y);
    }

    /// Zero is accepted and means "not fitted yet"; transforms refuse it.
    pub fn set_zoom(&mut self, zoom_level: f32) -> f32 {
        self.zoom_level = zoom_level;
        self.render_invalid = true;
        self.zoom_level
    }

    pub fn set_view_size(&mut self, view_width: u32, view_height: u32) {
        self.view_width = view_width;
        self.view_height = view_height;
        self.render_invalid = true;
    }

    pub fn should_rerender(&self) -> bool {
        self.render_invalid
    }

    pub fn invalidate(&mut self) {
        self.render_invalid = true;
    }

    pub fn mark_rendered(&mut self) {
        self.render_invalid = false;
    }

    pub fn snapshot(&self) -> ViewTriple {
        ViewTriple {
            zoom_level: self.zoom_level,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }

    pub fn restore(&mut self, triple: ViewTriple) {
        self.set_zoom(triple.zoom_level);
        self.set_offsets(triple.offset_x, triple.offset_y);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTriple {
    pub zoom_level: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ViewTriple {
    fn default() -> Self {
        Self {
            zoom_level: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}
