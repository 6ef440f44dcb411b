//! Path and pattern splitting.
//!
//! # Responsibilities
//! - Split a route pattern or request path into non-empty segments
//! - Classify segments as static, named (`:name`) or wildcard (`*name`)
//!
//! # Design Decisions
//! - Splitting stops right after the first wildcard segment, so a wildcard
//!   is always the last element. Trailing text is ignored, not rejected.
//! - The same splitter serves patterns and request paths.

/// Prefix marking a named parameter segment.
pub const PARAM_MARKER: char = ':';

/// Prefix marking a catch-all segment.
pub const WILDCARD_MARKER: char = '*';

/// The role a segment plays in a route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Matches the identical literal segment.
    Static,
    /// Binds exactly one request segment.
    Named,
    /// Binds the remainder of the request path.
    Wildcard,
}

impl SegmentKind {
    /// Classify a segment by its first character.
    pub fn of(segment: &str) -> Self {
        match segment.chars().next() {
            Some(PARAM_MARKER) => SegmentKind::Named,
            Some(WILDCARD_MARKER) => SegmentKind::Wildcard,
            _ => SegmentKind::Static,
        }
    }

    /// Named and wildcard segments are dynamic.
    pub fn is_dynamic(self) -> bool {
        !matches!(self, SegmentKind::Static)
    }
}

/// Split `raw` into its ordered, non-empty segments.
pub fn split(raw: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        segments.push(segment);
        if SegmentKind::of(segment) == SegmentKind::Wildcard {
            break;
        }
    }
    segments
}
