//! Page arithmetic for reaction-driven listings.

use std::ops::Range;

/// Reaction that moves to the previous page.
pub const PREVIOUS_EMOJI: &str = "⬅️";
/// Reaction that closes (deletes) the listing.
pub const CLOSE_EMOJI: &str = "❌";
/// Reaction that moves to the next page.
pub const NEXT_EMOJI: &str = "➡️";

/// A user's request against a paginated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    /// One page back.
    Previous,
    /// One page forward.
    Next,
    /// Remove the listing.
    Close,
}

impl PageAction {
    /// Maps a reaction emoji to an action.
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            PREVIOUS_EMOJI => Some(Self::Previous),
            NEXT_EMOJI => Some(Self::Next),
            CLOSE_EMOJI => Some(Self::Close),
            _ => None,
        }
    }

    /// The reactions a paginated message is decorated with, in order.
    pub fn controls() -> [&'static str; 3] {
        [PREVIOUS_EMOJI, CLOSE_EMOJI, NEXT_EMOJI]
    }
}

/// A listing of `total` items shown `page_size` at a time.
///
/// Pages are 1-based. Page values at or below zero are treated as "not a
/// tracked listing" by callers; [`clamp`](Self::clamp) pulls them back to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    total: usize,
    page_size: usize,
}

impl Pagination {
    /// Creates a pagination. A zero page size is treated as 1.
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            total,
            page_size: page_size.max(1),
        }
    }

    /// Number of pages, at least 1 even for an empty listing.
    pub fn page_count(&self) -> i64 {
        let pages = self.total.div_ceil(self.page_size).max(1);
        i64::try_from(pages).unwrap_or(i64::MAX)
    }

    /// Clamps `page` into `1..=page_count`.
    pub fn clamp(&self, page: i64) -> i64 {
        page.clamp(1, self.page_count())
    }

    /// The page after applying `action` to `page`. `Close` keeps the page.
    pub fn apply(&self, page: i64, action: PageAction) -> i64 {
        match action {
            PageAction::Previous => self.clamp(page.saturating_sub(1)),
            PageAction::Next => self.clamp(page.saturating_add(1)),
            PageAction::Close => self.clamp(page),
        }
    }

    /// Item indices shown on `page` (clamped first).
    pub fn range(&self, page: i64) -> Range<usize> {
        let page = usize::try_from(self.clamp(page)).unwrap_or(1);
        let start = ((page - 1) * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(Pagination::new(12, 5).page_count(), 3);
        assert_eq!(Pagination::new(10, 5).page_count(), 2);
        assert_eq!(Pagination::new(0, 5).page_count(), 1);
    }

    #[test]
    fn test_transitions_are_clamped() {
        let p = Pagination::new(12, 5);
        assert_eq!(p.apply(1, PageAction::Next), 2);
        assert_eq!(p.apply(3, PageAction::Next), 3);
        assert_eq!(p.apply(1, PageAction::Previous), 1);
        assert_eq!(p.apply(2, PageAction::Previous), 1);
        assert_eq!(p.apply(2, PageAction::Close), 2);
    }

    #[test]
    fn test_range() {
        let p = Pagination::new(12, 5);
        assert_eq!(p.range(1), 0..5);
        assert_eq!(p.range(3), 10..12);
        assert_eq!(p.range(9), 10..12);
        assert_eq!(Pagination::new(0, 5).range(1), 0..0);
    }

    #[test]
    fn test_emoji_mapping() {
        assert_eq!(PageAction::from_emoji("⬅️"), Some(PageAction::Previous));
        assert_eq!(PageAction::from_emoji("➡️"), Some(PageAction::Next));
        assert_eq!(PageAction::from_emoji("❌"), Some(PageAction::Close));
        assert_eq!(PageAction::from_emoji("👍"), None);
    }
}
