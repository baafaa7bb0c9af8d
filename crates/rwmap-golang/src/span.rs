use serde::{Deserialize, Serialize};

/// Byte range of a node plus the lines it starts and ends on (1-based).
///
/// A null span (all zero) marks nodes that were synthesized rather than
/// parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub lo: u32,
    pub hi: u32,
    pub line: u32,
    pub end_line: u32,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} (bytes {}..{})", self.line, self.lo, self.hi)
    }
}

impl Span {
    pub fn new(lo: u32, hi: u32, line: u32, end_line: u32) -> Span {
        Span {
            lo,
            hi,
            line,
            end_line,
        }
    }

    pub fn null() -> Span {
        Span::default()
    }

    pub fn is_null(&self) -> bool {
        self.line == 0
    }

    pub fn len(&self) -> u32 {
        self.hi.saturating_sub(self.lo)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        if self.is_null() {
            return other;
        }
        if other.is_null() {
            return self;
        }
        Span {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
            line: self.line.min(other.line),
            end_line: self.end_line.max(other.end_line),
        }
    }
}
