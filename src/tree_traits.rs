//! termtree rendering of CA trees.

use termtree::Tree;

use crate::domain::{fold_forest, LinkKind, TreeNode};

/// Deepest tree handed to termtree; its `Tree` drops recursively and draws
/// one indent glyph per level on every line.
pub const MAX_RENDER_DEPTH: usize = 64;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &TreeNode) -> String {
    let mut label = format!("{} [{}]", node.record, node.ref_id);
    if node.link == Some(LinkKind::Inferred) {
        label.push_str(" ~");
    }
    label
}

impl TreeNodeConvert for TreeNode {
    fn to_tree_string(&self) -> Tree<String> {
        let leaves = fold_forest(&self.children, |node, leaves: Vec<Tree<String>>| {
            Tree::new(label(node)).with_leaves(leaves)
        });
        Tree::new(label(self)).with_leaves(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resolve_records;
    use crate::domain::CaRecord;
    use crate::domain::CaStatus;

    fn ca(id: &str, subject: &str, issuer: &str) -> CaRecord {
        CaRecord {
            id: id.into(),
            name: format!("{id} CA"),
            kind: "root".into(),
            subject_name: subject.into(),
            issuer_name: issuer.into(),
            parent_id: None,
            status: CaStatus::Active,
            cert_count: 0,
            expiry: None,
        }
    }

    #[test]
    fn given_tree_when_rendering_then_nests_children_and_marks_inferred() {
        let res = resolve_records(vec![ca("root", "CN=R", "CN=R"), ca("int", "CN=I", "CN=R")]);

        let rendered = res.forest[0].to_tree_string().to_string();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "root CA [root]");
        assert!(lines[1].ends_with("int CA [int] ~"));
    }
}
