//! Trie of reducers keyed by path segment.

use super::combine::Composition;
use crate::error::{RagsError, Result};
use crate::types::Reducer;
use std::collections::BTreeMap;
use std::fmt;

/// One node of the reducer tree.
#[derive(Clone)]
pub enum ReducerNode {
    Leaf(Reducer),
    Branch(BTreeMap<String, ReducerNode>),
}

impl fmt::Debug for ReducerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReducerNode::Leaf(_) => write!(f, "Leaf"),
            ReducerNode::Branch(children) => f.debug_map().entries(children.iter()).finish(),
        }
    }
}

/// Path-keyed tree of reducers. Grows on every insert, never shrinks.
#[derive(Clone, Debug, Default)]
pub struct ReducerTree {
    root: BTreeMap<String, ReducerNode>,
}

impl ReducerTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the leaf at `path`, creating interior nodes as needed.
    ///
    /// An existing leaf at `path` is replaced; its siblings are untouched.
    /// Fails if the path runs through an existing leaf or ends on an
    /// interior node, since either would drop reducers from the tree.
    pub fn insert(&mut self, path: &[String], reducer: Reducer) -> Result<()> {
        let (last, parents) = path.split_last().ok_or(RagsError::EmptyPath)?;

        let mut children = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let node = children
                .entry(segment.clone())
                .or_insert_with(|| ReducerNode::Branch(BTreeMap::new()));
            children = match node {
                ReducerNode::Branch(next) => next,
                ReducerNode::Leaf(_) => {
                    return Err(RagsError::PathConflict {
                        path: path[..=depth].join("."),
                        reason: "segment already holds a reducer",
                    })
                }
            };
        }

        if let Some(ReducerNode::Branch(_)) = children.get(last) {
            return Err(RagsError::PathConflict {
                path: path.join("."),
                reason: "segment already holds nested reducers",
            });
        }
        children.insert(last.clone(), ReducerNode::Leaf(reducer));
        Ok(())
    }

    /// Whether a leaf exists at `path`.
    pub fn contains(&self, path: &[String]) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };
        let mut children = &self.root;
        for segment in parents {
            match children.get(segment) {
                Some(ReducerNode::Branch(next)) => children = next,
                _ => return false,
            }
        }
        matches!(children.get(last), Some(ReducerNode::Leaf(_)))
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        fn count(children: &BTreeMap<String, ReducerNode>) -> usize {
            children
                .values()
                .map(|node| match node {
                    ReducerNode::Leaf(_) => 1,
                    ReducerNode::Branch(next) => count(next),
                })
                .sum()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Compose the whole tree, plus static reducers, into one root reducer.
    pub fn compose(&self, composition: &Composition) -> Reducer {
        let mut top = composition.static_reducers.clone();
        for (key, node) in &self.root {
            top.insert(key.clone(), compose_node(node, composition));
        }
        (composition.combine)(top)
    }
}

fn compose_node(node: &ReducerNode, composition: &Composition) -> Reducer {
    match node {
        ReducerNode::Leaf(reducer) => reducer.clone(),
        ReducerNode::Branch(children) => {
            let composed = children
                .iter()
                .map(|(key, child)| (key.clone(), compose_node(child, composition)))
                .collect();
            (composition.combine)(composed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{reducer, Event};
    use serde_json::{json, Value};

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn constant(value: Value) -> Reducer {
        reducer(move |_, _| value.clone())
    }

    #[test]
    fn test_insert_creates_nested_nodes() {
        let mut tree = ReducerTree::new();
        tree.insert(&path(&["a", "b", "c"]), constant(json!(1))).unwrap();

        assert!(tree.contains(&path(&["a", "b", "c"])));
        assert!(!tree.contains(&path(&["a", "b"])));
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_compose_nested() {
        let mut tree = ReducerTree::new();
        tree.insert(&path(&["ns", "x"]), constant(json!("x"))).unwrap();
        tree.insert(&path(&["ns", "deep", "y"]), constant(json!("y"))).unwrap();
        tree.insert(&path(&["top"]), constant(json!(0))).unwrap();

        let root = tree.compose(&Composition::default());
        assert_eq!(
            root(None, &Event::init()),
            json!({"ns": {"x": "x", "deep": {"y": "y"}}, "top": 0})
        );
    }

    #[test]
    fn test_reinsert_replaces_only_leaf() {
        let mut tree = ReducerTree::new();
        tree.insert(&path(&["ns", "x"]), constant(json!(1))).unwrap();
        tree.insert(&path(&["ns", "y"]), constant(json!(2))).unwrap();
        tree.insert(&path(&["ns", "x"]), constant(json!(10))).unwrap();

        let root = tree.compose(&Composition::default());
        assert_eq!(root(None, &Event::init()), json!({"ns": {"x": 10, "y": 2}}));
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut tree = ReducerTree::new();
        let result = tree.insert(&[], constant(json!(1)));
        assert!(matches!(result, Err(RagsError::EmptyPath)));
    }

    #[test]
    fn test_path_through_leaf_rejected() {
        let mut tree = ReducerTree::new();
        tree.insert(&path(&["ns"]), constant(json!(1))).unwrap();

        let result = tree.insert(&path(&["ns", "x"]), constant(json!(2)));
        assert!(matches!(result, Err(RagsError::PathConflict { .. })));
        assert!(tree.contains(&path(&["ns"])));
    }

    #[test]
    fn test_leaf_over_branch_rejected() {
        let mut tree = ReducerTree::new();
        tree.insert(&path(&["ns", "x"]), constant(json!(1))).unwrap();

        let result = tree.insert(&path(&["ns"]), constant(json!(2)));
        assert!(matches!(result, Err(RagsError::PathConflict { .. })));
        assert!(tree.contains(&path(&["ns", "x"])));
    }

    #[test]
    fn test_static_reducers_lose_to_dynamic_keys() {
        let mut tree = ReducerTree::new();
        tree.insert(&path(&["shared"]), constant(json!("dynamic"))).unwrap();

        let mut statics = BTreeMap::new();
        statics.insert("shared".to_string(), constant(json!("static")));
        statics.insert("app".to_string(), constant(json!("app")));

        let root = tree.compose(&Composition::with_static_reducers(statics));
        assert_eq!(
            root(None, &Event::init()),
            json!({"app": "app", "shared": "dynamic"})
        );
    }
}
