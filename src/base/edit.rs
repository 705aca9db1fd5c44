//! Edit descriptors for incremental reparsing.

use thiserror::Error;

/// One text mutation: the bytes `[start, old_end)` of the old text were
/// replaced by `text`, which occupies `[start, new_end)` in the new text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
    pub text: String,
}

/// Reasons an edit cannot be applied to a text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit range {start}..{end} is out of bounds for text of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("edit offset {offset} is not on a char boundary")]
    NotCharBoundary { offset: usize },

    #[error("new_end {new_end} does not match start + replacement length {expected}")]
    InconsistentEnd { new_end: usize, expected: usize },

    #[error("new text does not equal the old text with the edit applied")]
    TextMismatch,
}

impl Edit {
    /// Replace `[start, old_end)` with `text`.
    pub fn new(start: usize, old_end: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            start,
            old_end,
            new_end: start + text.len(),
            text,
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, offset, text)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::new(start, end, String::new())
    }

    /// Length change of the document, in bytes.
    pub fn delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }

    /// An edit that replaces nothing with nothing.
    pub fn is_noop(&self) -> bool {
        self.start == self.old_end && self.old_end == self.new_end && self.text.is_empty()
    }

    /// Produce the new text.
    pub fn apply(&self, old: &str) -> Result<String, EditError> {
        self.check_old(old)?;
        let mut new = String::with_capacity(old.len() - (self.old_end - self.start) + self.text.len());
        new.push_str(&old[..self.start]);
        new.push_str(&self.text);
        new.push_str(&old[self.old_end..]);
        Ok(new)
    }

    /// Check that `new` is exactly `old` with this edit applied.
    pub fn validate(&self, old: &str, new: &str) -> Result<(), EditError> {
        self.check_old(old)?;
        let expected_len = old.len() - (self.old_end - self.start) + self.text.len();
        if new.len() != expected_len
            || !new.is_char_boundary(self.start)
            || !new.is_char_boundary(self.new_end)
            || new[..self.start] != old[..self.start]
            || new[self.start..self.new_end] != self.text
            || new[self.new_end..] != old[self.old_end..]
        {
            return Err(EditError::TextMismatch);
        }
        Ok(())
    }

    fn check_old(&self, old: &str) -> Result<(), EditError> {
        if self.start > self.old_end || self.old_end > old.len() {
            return Err(EditError::OutOfBounds {
                start: self.start,
                end: self.old_end,
                len: old.len(),
            });
        }
        for offset in [self.start, self.old_end] {
            if !old.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
        let expected = self.start + self.text.len();
        if self.new_end != expected {
            return Err(EditError::InconsistentEnd {
                new_end: self.new_end,
                expected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_insert() {
        assert_eq!(Edit::insert(0, "#").apply("foo").unwrap(), "#foo");
    }

    #[test]
    fn test_apply_replace() {
        let edit = Edit::new(2, 5, "xy");
        assert_eq!(edit.new_end, 4);
        assert_eq!(edit.delta(), -1);
        assert_eq!(edit.apply("a bcd e").unwrap(), "a xy e");
    }

    #[test]
    fn test_noop() {
        assert!(Edit::insert(3, "").is_noop());
        assert!(!Edit::delete(1, 2).is_noop());
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(
            Edit::delete(2, 9).apply("abc"),
            Err(EditError::OutOfBounds { start: 2, end: 9, len: 3 })
        );
    }

    #[test]
    fn test_not_char_boundary() {
        assert_eq!(
            Edit::insert(1, "x").apply("é"),
            Err(EditError::NotCharBoundary { offset: 1 })
        );
    }

    #[test]
    fn test_inconsistent_end() {
        let mut edit = Edit::insert(0, "ab");
        edit.new_end = 1;
        assert!(matches!(edit.apply("x"), Err(EditError::InconsistentEnd { .. })));
    }

    #[test]
    fn test_validate() {
        let edit = Edit::insert(1, "z");
        assert!(edit.validate("ab", "azb").is_ok());
        assert_eq!(edit.validate("ab", "abz"), Err(EditError::TextMismatch));
    }
}
