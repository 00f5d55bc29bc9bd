//! Owned CA forest handed to the display transforms.
//!
//! Parent chains in CA data can be arbitrarily long, so every whole-tree
//! operation here (clone, compare, drop, measure, serialize, fold) walks an
//! explicit stack instead of recursing per level.

use std::collections::HashSet;

use serde::{Serialize, Serializer};

use crate::domain::entities::CaRecord;

/// How a child got attached to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// The record named its parent via `parentId`.
    Explicit,
    /// Soft link: the record's issuer matched the parent's subject.
    Inferred,
}

/// Tree node wrapping one CA record.
///
/// A node exclusively owns its children.
#[derive(Debug)]
pub struct TreeNode {
    pub record: CaRecord,
    /// Identity key for expand/collapse state and selection
    pub ref_id: String,
    /// Edge to the parent, `None` for roots
    pub link: Option<LinkKind>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(record: CaRecord, link: Option<LinkKind>) -> Self {
        Self {
            ref_id: record.id.clone(),
            record,
            link,
            children: Vec::new(),
        }
    }

    /// Copy of this node's own data with a new children list.
    pub fn with_children(&self, children: Vec<TreeNode>) -> Self {
        Self {
            record: self.record.clone(),
            ref_id: self.ref_id.clone(),
            link: self.link,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, self included.
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels in this subtree, a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|c| (c, level + 1)));
        }
        deepest
    }

    /// Pre-order iterator over this subtree.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    fn same_shape(&self, other: &Self) -> bool {
        self.ref_id == other.ref_id
            && self.link == other.link
            && self.children.len() == other.children.len()
            && self.record == other.record
    }
}

impl Clone for TreeNode {
    fn clone(&self) -> Self {
        self.with_children(fold_forest(&self.children, |node, children| {
            node.with_children(children)
        }))
    }
}

impl PartialEq for TreeNode {
    /// Pre-order walks of equal trees visit equal nodes with equal child
    /// counts, so comparing node by node along both walks is sufficient.
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.iter();
        let mut right = other.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.same_shape(b) => {}
                _ => return false,
            }
        }
    }
}

impl Eq for TreeNode {}

impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Ordered list of root nodes.
pub type Forest = Vec<TreeNode>;

/// Pre-order walk over every node of a forest, ignoring expansion state.
pub fn iter_forest(forest: &[TreeNode]) -> NodeIter<'_> {
    NodeIter {
        stack: forest.iter().rev().collect(),
    }
}

pub struct NodeIter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

struct FoldFrame<'a, T> {
    node: &'a TreeNode,
    next_child: usize,
    folded: Vec<T>,
}

impl<'a, T> FoldFrame<'a, T> {
    fn new(node: &'a TreeNode) -> Self {
        Self {
            node,
            next_child: 0,
            folded: Vec::with_capacity(node.children.len()),
        }
    }
}

/// Post-order fold over a forest.
///
/// `f` receives each node together with the already folded values of its
/// children, in child order. Returns one value per root.
pub fn fold_forest<'a, T, F>(forest: &'a [TreeNode], mut f: F) -> Vec<T>
where
    F: FnMut(&'a TreeNode, Vec<T>) -> T,
{
    let mut roots = Vec::with_capacity(forest.len());
    let mut frames: Vec<FoldFrame<'a, T>> = Vec::new();

    for root in forest {
        frames.push(FoldFrame::new(root));
        while let Some(frame) = frames.last_mut() {
            let node: &'a TreeNode = frame.node;
            if let Some(child) = node.children.get(frame.next_child) {
                frame.next_child += 1;
                frames.push(FoldFrame::new(child));
                continue;
            }
            if let Some(done) = frames.pop() {
                let value = f(done.node, done.folded);
                match frames.last_mut() {
                    Some(parent) => parent.folded.push(value),
                    None => roots.push(value),
                }
            }
        }
    }
    roots
}

/// One forest node in serialized form.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ForestEntry<'a> {
    ref_id: &'a str,
    parent_ref_id: Option<&'a str>,
    level: usize,
    link: Option<LinkKind>,
    record: &'a CaRecord,
}

/// Serialize a forest as a flat pre-order list of entries that name their
/// parent, so output depth does not grow with the tree.
pub fn serialize_forest<S>(forest: &[TreeNode], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut entries = Vec::new();
    let mut stack: Vec<(&TreeNode, Option<&str>, usize)> =
        forest.iter().rev().map(|n| (n, None, 0)).collect();
    while let Some((node, parent, level)) = stack.pop() {
        entries.push(ForestEntry {
            ref_id: &node.ref_id,
            parent_ref_id: parent,
            level,
            link: node.link,
            record: &node.record,
        });
        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|c| (c, Some(node.ref_id.as_str()), level + 1)),
        );
    }
    serializer.collect_seq(entries)
}

/// Set of `ref_id`s whose children are visible in the flattened view.
///
/// Owned by the display layer; resolver, filter and sorter never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedSet {
    ids: HashSet<String>,
}

impl ExpandedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, ref_id: &str) -> bool {
        self.ids.contains(ref_id)
    }

    pub fn expand(&mut self, ref_id: impl Into<String>) {
        self.ids.insert(ref_id.into());
    }

    pub fn collapse(&mut self, ref_id: &str) {
        self.ids.remove(ref_id);
    }

    /// Flip the state of one node; returns `true` if it is now expanded.
    pub fn toggle(&mut self, ref_id: &str) -> bool {
        if self.ids.remove(ref_id) {
            false
        } else {
            self.ids.insert(ref_id.to_string());
            true
        }
    }

    /// Expand every node of `forest` that has children.
    pub fn expand_all(&mut self, forest: &[TreeNode]) {
        for node in iter_forest(forest).filter(|n| !n.is_leaf()) {
            self.ids.insert(node.ref_id.clone());
        }
    }

    pub fn collapse_all(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExpandedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::entities::CaStatus;

    pub fn record(id: &str, name: &str) -> CaRecord {
        CaRecord {
            id: id.to_string(),
            name: name.to_string(),
            kind: "intermediate".to_string(),
            subject_name: String::new(),
            issuer_name: String::new(),
            parent_id: None,
            status: CaStatus::Active,
            cert_count: 0,
            expiry: None,
        }
    }

    pub fn node(id: &str, name: &str, children: Vec<TreeNode>) -> TreeNode {
        let mut n = TreeNode::new(record(id, name), None);
        n.children = children
            .into_iter()
            .map(|mut c| {
                c.link = Some(LinkKind::Explicit);
                c
            })
            .collect();
        n
    }
}
