//! Core shared types for Vero.
//!
//! This crate is intentionally small: source positions and job ids, nothing
//! that depends on the AST or the verification pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A point in a source document expressed as (line, column), both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source position attached to an AST node.
///
/// Front-ends do not always know where a node came from (synthesized nodes,
/// desugared specifications), so a position is either a concrete start/end
/// span or `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Unknown,
    Span {
        start: LineCol,
        end: LineCol,
    },
}

impl Position {
    #[inline]
    pub const fn span(start: LineCol, end: LineCol) -> Self {
        Self::Span { start, end }
    }

    /// Single-point position covering one (line, column).
    #[inline]
    pub const fn point(line: u32, column: u32) -> Self {
        let at = LineCol::new(line, column);
        Self::Span { start: at, end: at }
    }

    #[inline]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Span { .. })
    }

    /// Start line, if the position is known.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Unknown => None,
            Self::Span { start, .. } => Some(start.line),
        }
    }

    /// Whether `self` starts within the given inclusive line range.
    pub fn starts_within_lines(&self, first: u32, last: u32) -> bool {
        match self.line() {
            Some(line) => first <= line && line <= last,
            None => false,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("<unknown>"),
            Self::Span { start, .. } => start.fmt(f),
        }
    }
}

/// Identifier of a single verification job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Allocate the next process-unique job id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_line_range_checks() {
        let pos = Position::span(LineCol::new(4, 1), LineCol::new(9, 2));
        assert!(pos.starts_within_lines(1, 10));
        assert!(pos.starts_within_lines(4, 4));
        assert!(!pos.starts_within_lines(5, 10));
        assert!(!Position::Unknown.starts_within_lines(0, u32::MAX));
    }

    #[test]
    fn job_ids_are_unique() {
        let a = JobId::next();
        let b = JobId::next();
        assert_ne!(a, b);
    }
}
