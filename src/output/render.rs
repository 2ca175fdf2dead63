//! Directory-style rendering of navigation trees

use crate::crawler::{NavigationTree, NodeId};

/// Text produced when there is no tree to render
pub const EMPTY_TREE_MESSAGE: &str = "Navigation tree data is empty.";

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Renders a tree as indented text, one URL per line
///
/// The root URL comes first, followed by its descendants in discovery order.
/// The output has no trailing newline.
///
/// # Example
///
/// ```text
/// https://example.com/
/// ├── https://example.com/about
/// │   └── https://example.com/about/team
/// └── https://example.com/contact
/// ```
pub fn render_tree(tree: Option<&NavigationTree>) -> String {
    let Some(tree) = tree else {
        return EMPTY_TREE_MESSAGE.to_string();
    };

    let root_url = tree.root().url().trim();
    if root_url.is_empty() {
        return EMPTY_TREE_MESSAGE.to_string();
    }

    let mut lines = vec![root_url.to_string()];
    render_children(tree, tree.root_id(), "", &mut lines);
    lines.join("\n")
}

fn render_children(tree: &NavigationTree, parent: NodeId, indent: &str, lines: &mut Vec<String>) {
    let children = tree.children(parent);
    for (i, &child) in children.iter().enumerate() {
        let Some(node) = tree.node(child) else {
            continue;
        };
        let is_last = i + 1 == children.len();

        let connector = if is_last { LAST_BRANCH } else { BRANCH };
        lines.push(format!("{}{}{}", indent, connector, node.url()));

        if !node.is_leaf() {
            let continuation = if is_last { SPACE } else { PIPE };
            render_children(tree, child, &format!("{}{}", indent, continuation), lines);
        }
    }
}
