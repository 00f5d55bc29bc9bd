use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::CaRecord;
use crate::domain::tree::{LinkKind, TreeNode};

/// Arena slot for one accepted CA record.
#[derive(Debug)]
pub struct ArenaNode {
    pub record: CaRecord,
    /// Position of the record in the raw input
    pub position: usize,
    /// Index of parent node in the arena, None for roots and unattached nodes
    pub parent: Option<Index>,
    pub link: Option<LinkKind>,
    /// Indices of child nodes in the arena, in attachment order
    pub children: Vec<Index>,
}

/// Arena-backed working storage for hierarchy resolution.
///
/// Parent/child edges are stored as indices, so cyclic `parentId` chains in
/// the source data never turn into shared ownership. Insertion order is kept to reproduce input order.
#[derive(Debug, Default)]
pub struct HierarchyArena {
    arena: Arena<ArenaNode>,
    order: Vec<Index>,
}

impl HierarchyArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            arena: Arena::with_capacity(n),
            order: Vec::with_capacity(n),
        }
    }

    #[instrument(level = "trace", skip(self, record), fields(id = %record.id))]
    pub fn insert_record(&mut self, record: CaRecord, position: usize) -> Index {
        let idx = self.arena.insert(ArenaNode {
            record,
            position,
            parent: None,
            link: None,
            children: Vec::new(),
        });
        self.order.push(idx);
        idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&ArenaNode> {
        self.arena.get(idx)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node indices in insertion (input) order.
    pub fn order(&self) -> &[Index] {
        &self.order
    }

    /// Attach `child` below `parent`. The caller breaks cycles first.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, child: Index, parent: Index, link: LinkKind) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
            node.link = Some(link);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Copy the subtree below `idx` into owned tree nodes.
    ///
    /// Built bottom-up from a reversed pre-order list, so chain length does
    /// not translate into call depth.
    pub fn build_subtree(&self, idx: Index) -> Option<TreeNode> {
        self.get_node(idx)?;
        let order = self.reachable_from(&[idx]);

        let mut built: HashMap<Index, TreeNode> = HashMap::with_capacity(order.len());
        for &current in order.iter().rev() {
            let Some(node) = self.get_node(current) else {
                continue;
            };
            let mut tree = TreeNode::new(node.record.clone(), node.link);
            tree.children = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(current, tree);
        }
        built.remove(&idx)
    }

    /// All indices reachable from `roots`, roots included, in pre-order.
    ///
    /// Each index is visited once, so forced parent loops still terminate.
    pub fn reachable_from(&self, roots: &[Index]) -> Vec<Index> {
        let mut seen = HashSet::with_capacity(self.len());
        let mut order = Vec::new();
        let mut stack: Vec<Index> = roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            if let Some(node) = self.get_node(idx) {
                order.push(idx);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tree::fixtures::record;

    #[test]
    fn given_chain_when_reaching_from_root_then_pre_order_and_parents_set() {
        let mut arena = HierarchyArena::new();
        let root = arena.insert_record(record("root", "Root"), 0);
        let mid = arena.insert_record(record("mid", "Mid"), 1);
        let leaf = arena.insert_record(record("leaf", "Leaf"), 2);
        arena.attach(mid, root, LinkKind::Explicit);
        arena.attach(leaf, mid, LinkKind::Inferred);

        assert_eq!(arena.reachable_from(&[root]), vec![root, mid, leaf]);
        assert_eq!(arena.get_node(leaf).and_then(|n| n.parent), Some(mid));
    }

    #[test]
    fn given_forced_loop_when_building_subtree_then_terminates() {
        let mut arena = HierarchyArena::new();
        let a = arena.insert_record(record("a", "A"), 0);
        let b = arena.insert_record(record("b", "B"), 1);
        // bypasses the resolver's cycle breaking on purpose
        arena.attach(a, b, LinkKind::Explicit);
        arena.attach(b, a, LinkKind::Explicit);

        assert_eq!(arena.reachable_from(&[a]).len(), 2);
        assert_eq!(arena.build_subtree(a).map(|t| t.size()), Some(2));
    }

    #[test]
    fn given_long_chain_when_building_subtree_then_no_overflow() {
        let mut arena = HierarchyArena::new();
        let mut parent = arena.insert_record(record("n0", "n0"), 0);
        let root = parent;
        for i in 1..150_000 {
            let child = arena.insert_record(record(&format!("n{i}"), "n"), i);
            arena.attach(child, parent, LinkKind::Explicit);
            parent = child;
        }

        let tree = arena.build_subtree(root).unwrap();

        assert_eq!(tree.depth(), 150_000);
    }

    #[test]
    fn given_attached_nodes_when_building_subtree_then_keeps_attachment_order() {
        let mut arena = HierarchyArena::new();
        let root = arena.insert_record(record("root", "Root"), 0);
        let first = arena.insert_record(record("first", "First"), 1);
        let second = arena.insert_record(record("second", "Second"), 2);
        arena.attach(first, root, LinkKind::Explicit);
        arena.attach(second, root, LinkKind::Inferred);

        let tree = arena.build_subtree(root).unwrap();
        let ids: Vec<&str> = tree.children.iter().map(|c| c.ref_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(tree.link, None);
        assert_eq!(tree.children[1].link, Some(LinkKind::Inferred));
        assert_eq!(arena.reachable_from(&[root]).len(), 3);
    }
}
