/// Node types for the packet dissection tree.
///
/// Decoding produces an owned [`PdmlElement`] tree. After pruning, the
/// elements are moved into a flat arena of [`PdmlNode`]s where children and
/// the parent back-reference are plain indices, so the parent link never
/// acts as an ownership edge.
use compact_str::CompactString;
use std::borrow::Cow;
use std::cell::Cell;
use std::collections::BTreeMap;

/// Lightweight index into the arena `Vec<PdmlNode>`.
///
/// Uses `u32` to keep nodes small. A single packet's dissection never comes
/// close to 4 billion fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Wrap an arena position. Panics if `index` does not fit in a `u32`,
    /// in release builds too, so an index can never silently wrap.
    #[inline]
    pub fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => Self(index),
            Err(_) => panic!("arena index {index} does not fit in a NodeIndex"),
        }
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// One decoded element of a dissection document, owning its children.
///
/// This is the shape the decoder and the pruner work on. Nothing here
/// points upward, so subtrees can be dropped freely during pruning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdmlElement {
    /// Human-readable label (`showname`, falling back to `show`).
    pub label: String,

    /// Canonical field key (`name`), used for expansion-path matching.
    pub name: CompactString,

    /// Byte offset of the field within the packet.
    pub pos: usize,

    /// Byte length of the field.
    pub size: usize,

    /// `true` when the element carried `hide="yes"`.
    pub hidden: bool,

    /// Element tag, e.g. `proto` or `field`.
    pub tag: CompactString,

    /// Every attribute of the element, recognized or not.
    pub attrs: BTreeMap<CompactString, String>,

    /// Verbatim inner markup, descendants included.
    pub content: Vec<u8>,

    /// Child elements in document order.
    pub children: Vec<PdmlElement>,
}

impl PdmlElement {
    /// Total number of elements in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(PdmlElement::subtree_len)
            .sum::<usize>()
    }
}

/// A node in the linked arena tree.
///
/// Created by [`PdmlTree::link`](super::PdmlTree::link) once pruning has
/// settled the final tree shape. `parent` is written exactly once, during
/// that pass.
#[derive(Debug, Clone)]
pub struct PdmlNode {
    pub label: String,
    pub name: CompactString,
    pub pos: usize,
    pub size: usize,
    pub hidden: bool,
    pub tag: CompactString,
    pub attrs: BTreeMap<CompactString, String>,
    pub content: Vec<u8>,

    /// Index of the parent node. `None` for the root.
    pub parent: Option<NodeIndex>,

    /// Children in document order.
    pub children: Vec<NodeIndex>,

    /// UI-facing expansion flag. A `Cell` so the display layer can toggle it
    /// through a shared borrow of the tree.
    pub(crate) expanded: Cell<bool>,
}

impl PdmlNode {
    /// Move an element's own data into an arena node. Children are linked
    /// separately by the caller.
    pub(crate) fn from_element(
        element: PdmlElement,
        parent: Option<NodeIndex>,
    ) -> (Self, Vec<PdmlElement>) {
        let PdmlElement {
            label,
            name,
            pos,
            size,
            hidden,
            tag,
            attrs,
            content,
            children,
        } = element;
        let node = Self {
            label,
            name,
            pos,
            size,
            hidden,
            tag,
            attrs,
            content,
            parent,
            children: Vec::with_capacity(children.len()),
            expanded: Cell::new(false),
        };
        (node, children)
    }

    /// Whether the node is currently expanded in the UI.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded.get()
    }

    /// End of the node's byte range (exclusive). Saturates rather than
    /// wrapping on absurd `pos`/`size` values.
    #[inline]
    pub fn end(&self) -> usize {
        self.pos.saturating_add(self.size)
    }

    /// Whether `offset` falls inside `[pos, pos + size)`.
    #[inline]
    pub fn covers(&self, offset: usize) -> bool {
        self.pos <= offset && offset < self.end()
    }

    /// Look up an attribute by key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// The inner markup as text, for "copy as PDML" style actions.
    pub fn inner_markup(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}
