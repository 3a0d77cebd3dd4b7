use crate::marks::ViewSnapshot;

/// Back/forward jump list.
///
/// `cursor == entries.len()` means the live position is not recorded yet.
#[derive(Debug, Clone)]
pub struct ViewHistory {
    entries: Vec<ViewSnapshot>,
    cursor: usize,
    capacity: usize,
}

impl ViewHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records the position being left. Forward entries are discarded.
    pub fn push(&mut self, snapshot: ViewSnapshot) {
        let keep = (self.cursor + 1).min(self.entries.len());
        self.entries.truncate(keep);
        if self.entries.last() != Some(&snapshot) {
            self.entries.push(snapshot);
        }
        self.trim();
        self.cursor = self.entries.len();
    }

    /// Steps back from `current`. When at the live end, `current` is recorded
    /// first so that `forward` can return to it.
    pub fn back(&mut self, current: ViewSnapshot) -> Option<ViewSnapshot> {
        if self.cursor >= self.entries.len() {
            if self.entries.last() != Some(&current) {
                self.entries.push(current);
            }
            self.trim();
            self.cursor = self.entries.len().saturating_sub(1);
        }
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor])
    }

    fn trim(&mut self) {
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
    }

    pub fn forward(&mut self) -> Option<ViewSnapshot> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            Some(self.entries[self.cursor])
        } else {
            None
        }
    }
}
