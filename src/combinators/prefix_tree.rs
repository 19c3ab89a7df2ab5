//! # Prefix tree
//!
//! The routing structure behind [`super::mapper::Mapper`]. Walks path
//! components one at a time, stopping at the deepest node that has a
//! bound value — exactly the original `search_prefix_tree`/
//! `list_prefix_tree` algorithm this crate is grounded on.

use std::collections::BTreeMap;

/// A trie keyed by path components, each node optionally carrying a value.
#[derive(Debug)]
pub struct PrefixTree<V> {
    value: Option<V>,
    children: BTreeMap<String, PrefixTree<V>>,
}

impl<V> Default for PrefixTree<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

impl<V: Clone> PrefixTree<V> {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` at the node reached by `parts`, creating intermediate
    /// nodes as needed. Replaces any value already bound there.
    pub fn insert(&mut self, parts: &[String], value: V) {
        let mut node = self;
        for part in parts {
            node = node.children.entry(part.clone()).or_default();
        }
        node.value = Some(value);
    }

    /// Walk `parts` from the root, returning the value bound at the
    /// deepest matching node (not necessarily the full path) along with
    /// how many leading components were consumed to reach it.
    pub fn search(&self, parts: &[String]) -> (Option<V>, usize) {
        let mut node = self;
        let mut last = node.value.clone();
        let mut consumed = 0;
        for (i, part) in parts.iter().enumerate() {
            match node.children.get(part) {
                Some(child) => {
                    node = child;
                    if node.value.is_some() {
                        last = node.value.clone();
                        consumed = i + 1;
                    }
                }
                None => break,
            }
        }
        (last, consumed)
    }

    /// The names of the node reached by `parts`'s immediate children, or
    /// `None` if no such node exists (neither bound nor an intermediate).
    pub fn list(&self, parts: &[String]) -> Option<Vec<String>> {
        let mut node = self;
        for part in parts {
            node = node.children.get(part)?;
        }
        Some(node.children.keys().cloned().collect())
    }

    /// All values in the tree, in no particular order.
    pub fn values(&self) -> Vec<V> {
        let mut out = Vec::new();
        self.collect_values(&mut out);
        out
    }

    fn collect_values(&self, out: &mut Vec<V>) {
        if let Some(v) = &self.value {
            out.push(v.clone());
        }
        for child in self.children.values() {
            child.collect_values(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(s: &str) -> Vec<String> {
        s.split('/').filter(|p| !p.is_empty()).map(String::from).collect()
    }

    #[test]
    fn search_finds_deepest_bound_node() {
        let mut tree = PrefixTree::new();
        tree.insert(&parts("a/b"), "ab");
        tree.insert(&parts("a"), "a");
        let (value, consumed) = tree.search(&parts("a/b/c"));
        assert_eq!(value, Some("ab"));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn search_stops_at_first_unbound_branch() {
        let mut tree = PrefixTree::new();
        tree.insert(&parts("a"), "a");
        let (value, consumed) = tree.search(&parts("a/x/y"));
        assert_eq!(value, Some("a"));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn search_without_any_binding_returns_none() {
        let tree: PrefixTree<&str> = PrefixTree::new();
        let (value, consumed) = tree.search(&parts("a/b"));
        assert_eq!(value, None);
        assert_eq!(consumed, 0);
    }

    #[test]
    fn list_reports_intermediate_node_children() {
        let mut tree = PrefixTree::new();
        tree.insert(&parts("a/one"), "1");
        tree.insert(&parts("a/two"), "2");
        let mut names = tree.list(&parts("a")).unwrap();
        names.sort();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn list_on_unknown_node_is_none() {
        let tree: PrefixTree<&str> = PrefixTree::new();
        assert_eq!(tree.list(&parts("nope")), None);
    }
}
