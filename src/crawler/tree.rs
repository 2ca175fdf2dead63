//! Navigation tree storage
//!
//! Nodes live in a flat arena and refer to their children by [`NodeId`]. The
//! root is always node 0, and every URL occurs at most once in a tree.

use std::collections::HashMap;

/// Index of a node inside a [`NavigationTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The starting page of every tree
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A discovered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationNode {
    url: String,
    name: String,
    depth: usize,
    children: Vec<NodeId>,
}

impl NavigationNode {
    /// Absolute URL of the page
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Link text the page was discovered under (the URL for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distance from the root, which has depth 0
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Child nodes in discovery order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Result of one traversal: a root page and everything found below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTree {
    nodes: Vec<NavigationNode>,
    index: HashMap<String, NodeId>,
}

impl NavigationTree {
    /// Creates a tree holding only the root
    pub(crate) fn new(root_url: impl Into<String>) -> Self {
        let url = root_url.into();
        let mut index = HashMap::new();
        index.insert(url.clone(), NodeId::ROOT);

        Self {
            nodes: vec![NavigationNode {
                name: url.clone(),
                url,
                depth: 0,
                children: Vec::new(),
            }],
            index,
        }
    }

    /// Attaches a new node under `parent`
    ///
    /// The caller guarantees `url` is not already in the tree.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        url: impl Into<String>,
        name: impl Into<String>,
    ) -> NodeId {
        let url = url.into();
        let name = name.into();
        debug_assert!(!self.index.contains_key(&url), "duplicate node {}", url);

        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        let name = if name.is_empty() { url.clone() } else { name };

        self.index.insert(url.clone(), id);
        self.nodes.push(NavigationNode {
            url,
            name,
            depth,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root_id(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn root(&self) -> &NavigationNode {
        &self.nodes[0]
    }

    /// Looks up a node by id
    pub fn node(&self, id: NodeId) -> Option<&NavigationNode> {
        self.nodes.get(id.0)
    }

    /// Children of `id`, empty for unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children
    pub fn is_empty(&self) -> bool {
        self.root().is_leaf()
    }

    /// Number of nodes below the root
    pub fn descendant_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Depth of the node holding `url`, if present
    pub fn depth_of(&self, url: &str) -> Option<usize> {
        self.index.get(url).map(|id| self.nodes[id.0].depth)
    }

    /// Finds the node holding `url`
    pub fn find(&self, url: &str) -> Option<NodeId> {
        self.index.get(url).copied()
    }

    /// All nodes in discovery (breadth-first) order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NavigationNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Greatest node depth in the tree
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}
