//! Focus + scroll window over any ordered list.
//!
//! The controller owns no items. Callers pass the current item count to every
//! operation, so the list may change between calls. Whenever a focus is set
//! and the list is non-empty, `offset <= focused <= offset + height - 1`.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowController {
    focused: Option<usize>,
    offset: usize,
    viewport_height: usize,
}

impl WindowController {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            focused: None,
            offset: 0,
            viewport_height: viewport_height.max(1),
        }
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Resize the viewport (e.g. on terminal resize) and keep the focus
    /// visible.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        if let Some(focused) = self.focused {
            self.check_offset(focused);
        }
    }

    /// Move the focus by `delta`, wrapping at both ends.
    ///
    /// With no valid focus (none yet, or its item was removed) the window
    /// resets to the top.
    pub fn move_by(&mut self, len: usize, delta: isize) {
        if len == 0 {
            self.focused = None;
            return;
        }
        match self.focused {
            Some(focused) if focused < len => {
                let n = len as isize;
                let new = (focused as isize + delta).rem_euclid(n) as usize;
                self.check_offset(new);
                self.focused = Some(new);
            }
            _ => {
                self.offset = 0;
                self.focused = Some(0);
            }
        }
    }

    pub fn move_to_start(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.offset = 0;
        self.focused = Some(0);
    }

    pub fn move_to_end(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let last = len - 1;
        self.check_offset(last);
        self.focused = Some(last);
    }

    /// Drop the focus; the scroll position stays.
    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Focus the item under body row `row` (0-based, borders excluded).
    /// Returns true if the focus changed.
    pub fn point_at(&mut self, len: usize, row: usize) -> bool {
        if row >= self.viewport_height {
            return false;
        }
        let index = row + self.offset;
        if index >= len {
            return false;
        }
        let changed = self.focused != Some(index);
        self.focused = Some(index);
        changed
    }

    /// Indices to render for a list of `len` items.
    pub fn visible_range(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        let end = (self.offset + self.viewport_height).min(len);
        start..end
    }

    /// The focused element of `items`, if any.
    pub fn focused_item<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        items.get(self.focused?)
    }

    /// Whether the visibility invariant holds for a list of `len` items.
    pub fn is_consistent(&self, len: usize) -> bool {
        match self.focused {
            Some(f) if len > 0 => self.offset <= f && f < self.offset + self.viewport_height,
            _ => true,
        }
    }

    fn check_offset(&mut self, pos: usize) {
        let end = self.offset + self.viewport_height - 1;
        if pos > end {
            self.offset = pos + 1 - self.viewport_height;
        } else if pos < self.offset {
            self.offset = pos;
        }
    }
}

impl Default for WindowController {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_past_viewport_scrolls() {
        let mut w = WindowController::new(5);
        w.move_by(12, 0);
        assert_eq!((w.focused(), w.offset()), (Some(0), 0));
        w.move_by(12, 7);
        assert_eq!((w.focused(), w.offset()), (Some(7), 3));
    }

    #[test]
    fn wraps_in_both_directions() {
        let mut w = WindowController::new(5);
        w.move_by(12, 0);
        w.move_by(12, -1);
        assert_eq!((w.focused(), w.offset()), (Some(11), 7));
        w.move_by(12, 1);
        assert_eq!((w.focused(), w.offset()), (Some(0), 0));
        w.move_by(12, -25);
        assert_eq!(w.focused(), Some(11));
    }

    #[test]
    fn empty_list_clears_focus() {
        let mut w = WindowController::new(3);
        w.move_by(4, 0);
        w.move_by(0, 1);
        assert_eq!(w.focused(), None);
        w.move_to_end(0);
        assert_eq!(w.focused(), None);
    }

    #[test]
    fn removed_focus_resets_to_top() {
        let mut w = WindowController::new(3);
        w.move_by(10, 0);
        w.move_to_end(10);
        assert_eq!((w.focused(), w.offset()), (Some(9), 7));
        w.move_by(4, 1);
        assert_eq!((w.focused(), w.offset()), (Some(0), 0));
    }

    #[test]
    fn start_and_end() {
        let mut w = WindowController::new(4);
        w.move_to_end(10);
        assert_eq!((w.focused(), w.offset()), (Some(9), 6));
        w.move_to_start(10);
        assert_eq!((w.focused(), w.offset()), (Some(0), 0));
    }

    #[test]
    fn clear_focus_keeps_offset() {
        let mut w = WindowController::new(4);
        w.move_to_end(10);
        w.clear_focus();
        assert_eq!((w.focused(), w.offset()), (None, 6));
        assert_eq!(w.visible_range(10), 6..10);
    }

    #[test]
    fn point_at_translates_rows() {
        let mut w = WindowController::new(4);
        w.move_to_end(10);
        assert!(w.point_at(10, 1));
        assert_eq!(w.focused(), Some(7));
        assert!(!w.point_at(10, 4));
        assert!(!w.point_at(8, 3));
        assert_eq!(w.focused(), Some(7));
    }

    #[test]
    fn shrinking_viewport_keeps_focus_visible() {
        let mut w = WindowController::new(10);
        w.move_by(20, 0);
        w.move_by(20, 8);
        w.set_viewport_height(3);
        assert!(w.is_consistent(20));
        assert_eq!(w.offset(), 6);
    }

    #[test]
    fn invariant_holds_for_mixed_moves() {
        for len in 1..15usize {
            for height in 1..7usize {
                let mut w = WindowController::new(height);
                let moves: [isize; 9] = [0, 1, -1, 5, -7, 13, height as isize, -(height as isize), 2];
                for (step, delta) in moves.iter().enumerate() {
                    match step % 4 {
                        0 => w.move_to_end(len),
                        1 => w.move_to_start(len),
                        _ => {}
                    }
                    w.move_by(len, *delta);
                    let f = w.focused().unwrap();
                    assert!(f < len);
                    assert!(w.is_consistent(len), "len={len} height={height} step={step}");
                }
            }
        }
    }
}
