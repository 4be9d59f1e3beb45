/// Arena-backed dissection tree with persistent expansion state.
///
/// All nodes live in a single `Vec<PdmlNode>`. Parent and child links are
/// `NodeIndex` values rather than pointers, so the parent back-reference is
/// an observation, never an ownership edge. The tree is built in one linking
/// pass over an already-pruned [`PdmlElement`], which means indices always
/// reflect the final shape.
use super::pdml_node::{NodeIndex, PdmlElement, PdmlNode};
use crate::expansion::{ExpandedPaths, SharedExpandedPaths};
use tracing::debug;

/// One packet's dissection, ready for display.
#[derive(Debug)]
pub struct PdmlTree {
    /// Arena, in pre-order. The root is always at index 0.
    nodes: Vec<PdmlNode>,

    /// Session-wide expansion store shared with every node of this tree.
    expanded_paths: SharedExpandedPaths,
}

impl PdmlTree {
    /// Move a pruned element tree into the arena, setting every parent link
    /// and attaching the shared expansion store.
    ///
    /// Must run after pruning. Nodes start collapsed; call
    /// [`apply_expanded_paths`](Self::apply_expanded_paths) to restore state.
    pub fn link(root: PdmlElement, expanded_paths: SharedExpandedPaths) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(root.subtree_len()),
            expanded_paths,
        };
        tree.insert(root, None);
        tree
    }

    fn insert(&mut self, element: PdmlElement, parent: Option<NodeIndex>) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        let (node, children) = PdmlNode::from_element(element, parent);
        self.nodes.push(node);
        for child in children {
            let child_idx = self.insert(child, Some(idx));
            self.nodes[idx.idx()].children.push(child_idx);
        }
        idx
    }

    /// Expand every node addressed by a stored path.
    ///
    /// Only the node at the end of a fully matched path is expanded;
    /// ancestors rely on their own entries. Because sibling names need not be
    /// unique, a path may match several nodes and expands all of them.
    pub fn apply_expanded_paths(&self) {
        let paths = self.expanded_paths.lock();
        for path in paths.iter() {
            self.expand_by_path(self.root(), path);
        }
        debug!("Applied {} expansion paths", paths.len());
    }

    fn expand_by_path(&self, idx: NodeIndex, path: &[String]) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };
        let node = self.node(idx);
        if node.name != head.as_str() {
            return;
        }
        if rest.is_empty() {
            node.expanded.set(true);
        } else {
            for &child in &node.children {
                self.expand_by_path(child, rest);
            }
        }
    }

    /// Expand or collapse a node and record the change in the shared store.
    ///
    /// Expanding stores every prefix of the node's root path, so the
    /// ancestors' state is persisted too. Collapsing removes only the node's
    /// own path; entries for ancestors and descendants are kept so that
    /// re-expanding later restores inner state.
    pub fn set_expanded(&self, idx: NodeIndex, expanded: bool) {
        self.node(idx).expanded.set(expanded);
        let path = self.path_to_root(idx);
        let mut store = self.expanded_paths.lock();
        if expanded {
            for len in 1..=path.len() {
                store.add_expanded(&path[..len]);
            }
        } else {
            store.remove_expanded(&path);
        }
    }

    /// Canonical names from the root down to `idx`, inclusive.
    ///
    /// The root contributes its own name, which for a `<packet>` is empty.
    pub fn path_to_root(&self, idx: NodeIndex) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            let node = self.node(i);
            segments.push(node.name.to_string());
            current = node.parent;
        }
        segments.reverse();
        segments
    }

    /// Depth of `idx` below the root (the root is 0).
    pub fn depth(&self, idx: NodeIndex) -> usize {
        let mut depth = 0;
        let mut current = self.node(idx).parent;
        while let Some(i) = current {
            depth += 1;
            current = self.node(i).parent;
        }
        depth
    }

    /// First node in pre-order whose canonical name is `name`.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(NodeIndex::new)
    }

    /// The shared expansion store this tree reads and writes.
    pub fn expanded_paths(&self) -> &SharedExpandedPaths {
        &self.expanded_paths
    }

    /// Snapshot of the shared store.
    pub fn expanded_snapshot(&self) -> ExpandedPaths {
        self.expanded_paths.lock().clone()
    }

    #[inline]
    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &PdmlNode {
        &self.nodes[index.idx()]
    }

    /// Direct children of a node, in document order.
    #[inline]
    pub fn children(&self, parent: NodeIndex) -> &[NodeIndex] {
        &self.nodes[parent.idx()].children
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &PdmlNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIndex::new(i), n))
    }

    /// Total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree that pruned to nothing is never built.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
