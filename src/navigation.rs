//! Cursor over a timeline, clamped to `[0, last]`.

use crate::error::OutOfRangeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Navigator {
    cursor: usize,
    last: usize,
}

impl Navigator {
    /// Navigator over `last + 1` positions, starting at 0.
    pub fn new(last: usize) -> Self {
        Navigator { cursor: 0, last }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last(&self) -> usize {
        self.last
    }

    pub fn at_end(&self) -> bool {
        self.cursor == self.last
    }

    /// Step forward; returns false at the last position.
    pub fn next(&mut self) -> bool {
        if self.cursor < self.last {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Step back; returns false at the first position.
    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), OutOfRangeError> {
        if index > self.last {
            return Err(OutOfRangeError {
                index,
                last: self.last,
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Returns whether the cursor changed.
    pub fn first(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    /// Returns whether the cursor changed.
    pub fn last_position(&mut self) -> bool {
        let moved = self.cursor != self.last;
        self.cursor = self.last;
        moved
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
