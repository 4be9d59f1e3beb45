/// Hex-view highlight layers for a byte offset.
///
/// A hex viewer draws two bands around the cursor: a coarse band for the
/// protocol that owns the byte, and a fine band for the field inside that
/// protocol. Both come straight from the dissection's byte ranges; nothing
/// here assumes children are sorted or disjoint.
use crate::model::{NodeIndex, PdmlTree};

/// Which band a layer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// A top-level protocol.
    Coarse,
    /// A field directly inside a top-level protocol.
    Fine,
}

impl LayerKind {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Coarse => "coarse",
            Self::Fine => "fine",
        }
    }
}

/// One highlighted byte range, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexLayer {
    pub start: usize,
    pub end: usize,
    pub kind: LayerKind,
    /// The node whose range produced this layer.
    pub node: NodeIndex,
}

impl PdmlTree {
    /// Layers covering byte `offset`, coarse layer first, each followed by
    /// its fine layers.
    ///
    /// The root's first child is normally the `frame` protocol, whose range
    /// spans the whole packet and would otherwise match every offset. It is
    /// skipped unless `include_first` is set.
    pub fn hex_layers(&self, offset: usize, include_first: bool) -> Vec<HexLayer> {
        let skip = usize::from(!include_first);
        let mut layers = Vec::new();

        for &proto in self.children(self.root()).iter().skip(skip) {
            let node = self.node(proto);
            if !node.covers(offset) {
                continue;
            }
            layers.push(HexLayer {
                start: node.pos,
                end: node.end(),
                kind: LayerKind::Coarse,
                node: proto,
            });
            for &field in self.children(proto) {
                let child = self.node(field);
                if child.covers(offset) {
                    layers.push(HexLayer {
                        start: child.pos,
                        end: child.end(),
                        kind: LayerKind::Fine,
                        node: field,
                    });
                }
            }
        }
        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::ExpandedPaths;
    use crate::model::PdmlElement;
    use compact_str::CompactString;

    fn el(name: &str, pos: usize, size: usize, children: Vec<PdmlElement>) -> PdmlElement {
        PdmlElement {
            name: CompactString::new(name),
            pos,
            size,
            children,
            ..Default::default()
        }
    }

    /// frame(0..66) eth(0..14){eth.dst(0..6), eth.src(6..12)}
    /// ip(14..34){ip.src(26..30)} tcp(34..54){tcp.srcport(34..36), tcp.flags(46..48)}
    fn packet() -> PdmlTree {
        let root = el(
            "",
            0,
            0,
            vec![
                el("frame", 0, 66, vec![el("frame.len", 0, 0, vec![])]),
                el(
                    "eth",
                    0,
                    14,
                    vec![el("eth.dst", 0, 6, vec![]), el("eth.src", 6, 6, vec![])],
                ),
                el("ip", 14, 20, vec![el("ip.src", 26, 4, vec![])]),
                el(
                    "tcp",
                    34,
                    20,
                    vec![
                        el("tcp.srcport", 34, 2, vec![]),
                        el("tcp.flags", 46, 2, vec![]),
                    ],
                ),
            ],
        );
        PdmlTree::link(root, ExpandedPaths::new().shared())
    }

    fn describe(tree: &PdmlTree, layers: &[HexLayer]) -> Vec<(String, LayerKind)> {
        layers
            .iter()
            .map(|l| (tree.node(l.node).name.to_string(), l.kind))
            .collect()
    }

    #[test]
    fn test_coarse_and_fine_layer() {
        let tree = packet();
        let layers = tree.hex_layers(35, false);
        assert_eq!(
            describe(&tree, &layers),
            vec![
                ("tcp".to_owned(), LayerKind::Coarse),
                ("tcp.srcport".to_owned(), LayerKind::Fine),
            ]
        );
        assert_eq!((layers[0].start, layers[0].end), (34, 54));
        assert_eq!((layers[1].start, layers[1].end), (34, 36));
    }

    #[test]
    fn test_coarse_only_between_fields() {
        let tree = packet();
        let layers = tree.hex_layers(40, false);
        assert_eq!(
            describe(&tree, &layers),
            vec![("tcp".to_owned(), LayerKind::Coarse)]
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        let tree = packet();
        assert!(tree.hex_layers(60, false).is_empty());
        assert!(tree.hex_layers(1000, true).is_empty());
    }

    #[test]
    fn test_first_child_excluded_by_default() {
        let tree = packet();
        // Byte 60 lies only inside `frame`.
        assert!(tree.hex_layers(60, false).is_empty());
        let layers = tree.hex_layers(60, true);
        assert_eq!(
            describe(&tree, &layers),
            vec![("frame".to_owned(), LayerKind::Coarse)]
        );
    }

    #[test]
    fn test_include_first_adds_frame_layer() {
        let tree = packet();
        let layers = tree.hex_layers(3, true);
        assert_eq!(
            describe(&tree, &layers),
            vec![
                ("frame".to_owned(), LayerKind::Coarse),
                ("eth".to_owned(), LayerKind::Coarse),
                ("eth.dst".to_owned(), LayerKind::Fine),
            ]
        );
    }

    #[test]
    fn test_range_end_is_exclusive() {
        let tree = packet();
        let layers = tree.hex_layers(54, false);
        assert!(layers.is_empty());
        let layers = tree.hex_layers(14, false);
        assert_eq!(
            describe(&tree, &layers),
            vec![("ip".to_owned(), LayerKind::Coarse)]
        );
    }

    #[test]
    fn test_root_without_children() {
        let tree = PdmlTree::link(el("", 0, 0, vec![]), ExpandedPaths::new().shared());
        assert!(tree.hex_layers(0, false).is_empty());
        assert!(tree.hex_layers(0, true).is_empty());
    }

    #[test]
    fn test_overlapping_fields_all_reported() {
        let root = el(
            "",
            0,
            0,
            vec![
                el("frame", 0, 10, vec![]),
                el(
                    "p",
                    0,
                    10,
                    vec![el("p.b", 4, 4, vec![]), el("p.a", 2, 4, vec![])],
                ),
            ],
        );
        let tree = PdmlTree::link(root, ExpandedPaths::new().shared());
        let layers = tree.hex_layers(5, false);
        assert_eq!(
            describe(&tree, &layers),
            vec![
                ("p".to_owned(), LayerKind::Coarse),
                ("p.b".to_owned(), LayerKind::Fine),
                ("p.a".to_owned(), LayerKind::Fine),
            ]
        );
    }
}
