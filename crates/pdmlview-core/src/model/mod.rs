/// Data model for a packet's dissection tree.
///
/// Re-exports the owned decode-time element, the arena node and the linked
/// arena tree.
pub mod pdml_node;
pub mod pdml_tree;

pub use pdml_node::{NodeIndex, PdmlElement, PdmlNode};
pub use pdml_tree::PdmlTree;
