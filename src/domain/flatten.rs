//! Pre-order flattening of a forest into display rows.

use crate::domain::tree::{ExpandedSet, TreeNode};

/// One display row: a node and its depth (roots are level 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRow<'a> {
    pub node: &'a TreeNode,
    pub level: usize,
}

impl FlatRow<'_> {
    pub fn is_expanded(&self, expanded: &ExpandedSet) -> bool {
        !self.node.is_leaf() && expanded.contains(&self.node.ref_id)
    }
}

/// Depth-first, pre-order walk.
///
/// A node's children are emitted iff `expanded` contains its `ref_id` and it
/// has children. Uses an explicit stack, so deep chains do not recurse.
pub fn flatten<'a>(forest: &'a [TreeNode], expanded: &ExpandedSet) -> Vec<FlatRow<'a>> {
    let mut rows = Vec::new();
    let mut stack: Vec<FlatRow<'a>> = forest
        .iter()
        .rev()
        .map(|node| FlatRow { node, level: 0 })
        .collect();

    while let Some(row) = stack.pop() {
        if row.is_expanded(expanded) {
            // Push children in reverse order for left-to-right traversal
            stack.extend(row.node.children.iter().rev().map(|child| FlatRow {
                node: child,
                level: row.level + 1,
            }));
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tree::fixtures::node;

    fn ids_and_levels<'a>(rows: &[FlatRow<'a>]) -> Vec<(&'a str, usize)> {
        rows.iter()
            .map(|r| (r.node.ref_id.as_str(), r.level))
            .collect()
    }

    fn sample() -> Vec<TreeNode> {
        vec![
            node(
                "r1",
                "R1",
                vec![node("c1", "C1", vec![node("g1", "G1", vec![])]), node("c2", "C2", vec![])],
            ),
            node("r2", "R2", vec![node("c3", "C3", vec![])]),
        ]
    }

    #[test]
    fn given_nothing_expanded_when_flattening_then_only_roots() {
        let forest = sample();
        let rows = flatten(&forest, &ExpandedSet::new());
        assert_eq!(ids_and_levels(&rows), vec![("r1", 0), ("r2", 0)]);
    }

    #[test]
    fn given_nested_expansion_when_flattening_then_pre_order_with_levels() {
        let forest = sample();
        let expanded: ExpandedSet = ["r1", "c1"].into_iter().collect();

        let rows = flatten(&forest, &expanded);

        assert_eq!(
            ids_and_levels(&rows),
            vec![("r1", 0), ("c1", 1), ("g1", 2), ("c2", 1), ("r2", 0)]
        );
    }

    #[test]
    fn given_expanded_child_under_collapsed_parent_when_flattening_then_hidden() {
        let forest = sample();
        let expanded: ExpandedSet = ["c1"].into_iter().collect();

        let rows = flatten(&forest, &expanded);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn given_same_inputs_when_flattening_twice_then_identical() {
        let forest = sample();
        let mut expanded = ExpandedSet::new();
        expanded.expand_all(&forest);

        assert_eq!(flatten(&forest, &expanded), flatten(&forest, &expanded));
    }
}
