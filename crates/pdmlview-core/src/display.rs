/// The capability surface a tree widget needs from the model.
///
/// The widget itself lives outside this crate. It only ever sees a
/// [`DisplayModel`]: something it can ask for a label, whether it has
/// children, an iterator over those children, and a collapsed flag it can
/// read and flip.
use crate::model::{NodeIndex, PdmlNode, PdmlTree};
use std::iter::FusedIterator;

/// What a tree widget consumes.
pub trait DisplayModel: Sized {
    type Children: Iterator<Item = Self>;

    /// Iterator over the children, or an empty one if collapsed.
    fn children(&self) -> Self::Children;

    fn has_children(&self) -> bool;

    /// Text shown for this row.
    fn label(&self) -> &str;

    fn is_collapsed(&self) -> bool;

    fn set_collapsed(&self, collapsed: bool);
}

/// A borrowed handle to one node of a [`PdmlTree`].
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    tree: &'a PdmlTree,
    index: NodeIndex,
}

impl<'a> NodeRef<'a> {
    pub fn new(tree: &'a PdmlTree, index: NodeIndex) -> Self {
        Self { tree, index }
    }

    #[inline]
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    #[inline]
    pub fn tree(&self) -> &'a PdmlTree {
        self.tree
    }

    #[inline]
    pub fn node(&self) -> &'a PdmlNode {
        self.tree.node(self.index)
    }
}

impl PdmlTree {
    /// Handle to the root, the entry point for a widget.
    pub fn root_ref(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root())
    }
}

impl<'a> DisplayModel for NodeRef<'a> {
    type Children = ChildIter<'a>;

    fn children(&self) -> ChildIter<'a> {
        ChildIter::new(self.tree, self.index)
    }

    fn has_children(&self) -> bool {
        !self.tree.children(self.index).is_empty()
    }

    fn label(&self) -> &str {
        &self.node().label
    }

    fn is_collapsed(&self) -> bool {
        !self.node().is_expanded()
    }

    fn set_collapsed(&self, collapsed: bool) {
        self.tree.set_expanded(self.index, !collapsed);
    }
}

/// Forward-only iterator over a node's children.
///
/// The expanded flag is read once, when the iterator is created. A
/// collapsed node yields nothing even if it is expanded while the iterator
/// is alive. Once exhausted the iterator stays exhausted; create a new one
/// to walk the children again.
#[derive(Clone, Debug)]
pub struct ChildIter<'a> {
    tree: &'a PdmlTree,
    children: &'a [NodeIndex],
    pos: usize,
}

impl<'a> ChildIter<'a> {
    fn new(tree: &'a PdmlTree, parent: NodeIndex) -> Self {
        let children: &'a [NodeIndex] = if tree.node(parent).is_expanded() {
            tree.children(parent)
        } else {
            &[]
        };
        Self {
            tree,
            children,
            pos: 0,
        }
    }
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        let idx = *self.children.get(self.pos)?;
        self.pos += 1;
        Some(NodeRef::new(self.tree, idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.children.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChildIter<'_> {}
impl FusedIterator for ChildIter<'_> {}

/// A row in the flattened, currently visible part of a tree.
#[derive(Clone, Debug)]
pub struct VisibleRow<M> {
    pub depth: usize,
    pub model: M,
}

/// Flatten the visible part of a tree in display order.
///
/// Walks `root` depth-first, descending only where the model hands out a
/// non-empty child iterator, which is exactly what a widget would render.
pub fn visible_rows<M: DisplayModel>(root: M) -> Vec<VisibleRow<M>> {
    let mut rows = Vec::new();
    push_visible(root, 0, &mut rows);
    rows
}

fn push_visible<M: DisplayModel>(model: M, depth: usize, rows: &mut Vec<VisibleRow<M>>) {
    let children = model.children();
    rows.push(VisibleRow { depth, model });
    for child in children {
        push_visible(child, depth + 1, rows);
    }
}
