//! Byte ranges into the normalized DDL text.

/// A half-open byte range `start..end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// The covered text, or `""` if the span lies outside `source`.
    #[must_use]
    pub fn slice(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_order_independent() {
        let a = Span::new(8, 15);
        let b = Span::new(5, 10);
        assert_eq!(a.merge(b), Span::new(5, 15));
        assert_eq!(b.merge(a), Span::new(5, 15));
    }

    #[test]
    fn test_slice() {
        assert_eq!(Span::new(7, 9).slice("SELECT id"), "id");
        assert_eq!(Span::new(7, 90).slice("SELECT id"), "");
    }
}
