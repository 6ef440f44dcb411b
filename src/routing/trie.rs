//! Segment trie for a single HTTP method.
//!
//! # Responsibilities
//! - Insert route patterns segment by segment
//! - Find the endpoint matching a request's segments
//!
//! # Design Decisions
//! - Nodes live in an arena (`Vec<Node>`) and refer to children by index
//! - Literal children are tried before dynamic ones at every level
//! - At most one dynamic child per node; a second `:x`/`*x` reuses it
//! - A wildcard node terminates the search and swallows the rest of the path

use crate::routing::pattern::{SegmentKind, WILDCARD_MARKER};

/// Index of a node inside a [`Trie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone)]
struct Node {
    /// Segment this node was created for (empty for the root).
    segment: String,
    /// Full registered pattern; empty unless this node is an endpoint.
    pattern: String,
    children: Vec<NodeId>,
    dynamic: bool,
}

impl Node {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            pattern: String::new(),
            children: Vec::new(),
            dynamic: SegmentKind::of(segment).is_dynamic(),
        }
    }

    fn is_endpoint(&self) -> bool {
        !self.pattern.is_empty()
    }
}

/// Arena-backed prefix tree of path segments.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<Node>,
}

impl Trie {
    /// Create a trie holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("")],
        }
    }

    /// Register `pattern`, already split into `segments`.
    ///
    /// Re-inserting a pattern overwrites the stored pattern string.
    pub fn insert(&mut self, pattern: &str, segments: &[&str]) {
        let mut current = ROOT;
        for segment in segments {
            current = match self.insert_child(current, segment) {
                Some(existing) => existing,
                None => {
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(Node::new(segment));
                    self.nodes[current.0].children.push(id);
                    id
                }
            };
        }
        self.nodes[current.0].pattern = pattern.to_string();
    }

    /// Child of `parent` that an insertion of `segment` must descend into.
    fn insert_child(&self, parent: NodeId, segment: &str) -> Option<NodeId> {
        let dynamic = SegmentKind::of(segment).is_dynamic();
        self.nodes[parent.0].children.iter().copied().find(|&child| {
            let node = &self.nodes[child.0];
            node.segment == segment || (dynamic && node.dynamic)
        })
    }

    /// Find the endpoint matching the request `segments`.
    pub fn search(&self, segments: &[&str]) -> Option<NodeId> {
        self.search_from(ROOT, segments, 0)
    }

    fn search_from(&self, id: NodeId, segments: &[&str], depth: usize) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if depth == segments.len() || node.segment.starts_with(WILDCARD_MARKER) {
            return node.is_endpoint().then_some(id);
        }

        let segment = segments[depth];
        let literal = node
            .children
            .iter()
            .copied()
            .filter(|child| self.nodes[child.0].segment == segment);
        let dynamic = node
            .children
            .iter()
            .copied()
            .filter(|child| self.nodes[child.0].dynamic);

        literal
            .chain(dynamic)
            .find_map(|child| self.search_from(child, segments, depth + 1))
    }

    /// Pattern stored on `id`, or `""` if it is not an endpoint.
    pub fn pattern(&self, id: NodeId) -> &str {
        &self.nodes[id.0].pattern
    }

    /// All endpoint patterns in depth-first insertion order.
    pub fn patterns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.is_endpoint() {
                out.push(node.pattern.as_str());
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A fresh trie holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::pattern::split;

    fn build(patterns: &[&str]) -> Trie {
        let mut trie = Trie::new();
        for p in patterns {
            trie.insert(p, &split(p));
        }
        trie
    }

    fn lookup<'t>(trie: &'t Trie, path: &str) -> Option<&'t str> {
        trie.search(&split(path)).map(|id| trie.pattern(id))
    }

    #[test]
    fn test_static_round_trip() {
        let trie = build(&["/", "/a/b/c", "/a/x"]);
        assert_eq!(lookup(&trie, "/a/b/c"), Some("/a/b/c"));
        assert_eq!(lookup(&trie, "/a/x"), Some("/a/x"));
        assert_eq!(lookup(&trie, "/"), Some("/"));
        assert_eq!(lookup(&trie, "/a"), None);
        assert_eq!(lookup(&trie, "/a/b/c/d"), None);
    }

    #[test]
    fn test_literal_beats_named() {
        let trie = build(&["/hello/:name", "/hello/tom"]);
        assert_eq!(lookup(&trie, "/hello/tom"), Some("/hello/tom"));
        assert_eq!(lookup(&trie, "/hello/alice"), Some("/hello/:name"));
    }

    #[test]
    fn test_falls_back_to_dynamic_when_literal_branch_dead_ends() {
        let trie = build(&["/a/b/c", "/a/:x/d"]);
        assert_eq!(lookup(&trie, "/a/b/d"), Some("/a/:x/d"));
    }

    #[test]
    fn test_wildcard_swallows_remainder() {
        let trie = build(&["/assets/*filepath"]);
        assert_eq!(
            lookup(&trie, "/assets/images/2024/may/photo.jpg"),
            Some("/assets/*filepath")
        );
        assert_eq!(lookup(&trie, "/assets/x"), Some("/assets/*filepath"));
        // The wildcard node is never reached without at least one segment.
        assert_eq!(lookup(&trie, "/assets"), None);
    }

    #[test]
    fn test_no_duplicate_dynamic_siblings() {
        let single = build(&["/p/:a"]);
        let double = build(&["/p/:a", "/p/:b"]);
        assert_eq!(single.len(), double.len());
        assert_eq!(double.len(), 3);

        let p = double.nodes[ROOT.0].children[0];
        assert_eq!(double.nodes[p.0].children.len(), 1);
    }

    #[test]
    fn test_literal_and_dynamic_coexist() {
        let trie = build(&["/p/:lang", "/p/18"]);
        let p = trie.nodes[ROOT.0].children[0];
        assert_eq!(trie.nodes[p.0].children.len(), 2);
        assert_eq!(lookup(&trie, "/p/18"), Some("/p/18"));
        assert_eq!(lookup(&trie, "/p/go"), Some("/p/:lang"));
    }

    #[test]
    fn test_reinsert_is_idempotent() {
        let mut trie = build(&["/x/y"]);
        let before = trie.len();
        trie.insert("/x/y", &split("/x/y"));
        assert_eq!(trie.len(), before);
        assert_eq!(lookup(&trie, "/x/y"), Some("/x/y"));
    }

    #[test]
    fn test_patterns_lists_every_endpoint() {
        let trie = build(&[
            "/",
            "/hello/tom",
            "/hello/:name",
            "/hello/alice",
            "/hi/:name",
            "/assets/*filepath",
        ]);
        let mut patterns = trie.patterns();
        patterns.sort_unstable();
        assert_eq!(
            patterns,
            vec![
                "/",
                "/assets/*filepath",
                "/hello/:name",
                "/hello/alice",
                "/hello/tom",
                "/hi/:name",
            ]
        );
    }
}
