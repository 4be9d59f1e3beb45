/// PdmlView Core: packet dissection tree model.
///
/// This crate contains all logic with zero UI dependencies. A front-end
/// hands it the PDML for one packet and gets back a tree it can display,
/// expand and collapse, and query for hex-view highlight ranges.
///
/// # Modules
///
/// - [`decode`]: PDML decoding and the decode → prune → link pipeline.
/// - [`prune`]: Removal of hidden and synthetic elements.
/// - [`model`]: Owned element tree and the linked arena tree.
/// - [`expansion`]: Session-wide, path-addressed expansion state.
/// - [`hex`]: Coarse/fine byte-range layers for a hex viewer.
/// - [`display`]: The capability interface a tree widget consumes.
/// - [`render`]: Indented text rendering for diagnostics.
/// - [`config`]: Viewer configuration file.
/// - [`watcher`]: Background config-file change watcher.
pub mod config;
pub mod decode;
pub mod display;
pub mod expansion;
pub mod hex;
pub mod model;
pub mod prune;
pub mod render;
pub mod watcher;

pub use decode::{decode_document, decode_packet, packet_bytes, try_decode_packet, DecodeError};
pub use display::{DisplayModel, NodeRef};
pub use expansion::{ExpandedPaths, SharedExpandedPaths};
pub use hex::{HexLayer, LayerKind};
pub use model::{NodeIndex, PdmlTree};
