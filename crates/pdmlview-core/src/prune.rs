/// Removal of hidden and synthetic elements before display.
///
/// tshark wraps per-frame metadata in a `geninfo` protocol and sometimes
/// emits `fake-field-wrapper` elements around loose fields. Neither maps to
/// bytes the user cares about, and `hide="yes"` fields are explicitly meant
/// to stay invisible. A matching element is dropped together with its whole
/// subtree; its children are never promoted.
use crate::model::PdmlElement;

/// Canonical name of the generic-info wrapper.
pub const GENINFO: &str = "geninfo";

/// Canonical name of the synthetic field wrapper.
pub const FAKE_FIELD_WRAPPER: &str = "fake-field-wrapper";

/// Whether `element` (and so its subtree) should be removed.
#[inline]
pub fn is_removable(element: &PdmlElement) -> bool {
    element.hidden || element.name == GENINFO || element.name == FAKE_FIELD_WRAPPER
}

/// Prune `element` depth-first.
///
/// Returns `None` if the element itself is removable. Descendants of a
/// removed element are not visited.
pub fn prune(mut element: PdmlElement) -> Option<PdmlElement> {
    if is_removable(&element) {
        return None;
    }
    let children = std::mem::take(&mut element.children);
    element.children = children.into_iter().filter_map(prune).collect();
    Some(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;

    fn named(name: &str, children: Vec<PdmlElement>) -> PdmlElement {
        PdmlElement {
            name: CompactString::new(name),
            children,
            ..Default::default()
        }
    }

    fn hidden(name: &str, children: Vec<PdmlElement>) -> PdmlElement {
        PdmlElement {
            hidden: true,
            ..named(name, children)
        }
    }

    fn names(element: &PdmlElement) -> Vec<&str> {
        element.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_removes_reserved_names() {
        let root = named(
            "",
            vec![
                named(GENINFO, vec![named("num", vec![])]),
                named("eth", vec![]),
                named(FAKE_FIELD_WRAPPER, vec![named("data", vec![])]),
                named("ip", vec![]),
            ],
        );
        let pruned = prune(root).unwrap();
        assert_eq!(names(&pruned), vec!["eth", "ip"]);
    }

    #[test]
    fn test_hidden_subtree_dropped_without_promotion() {
        let root = named(
            "",
            vec![named(
                "tcp",
                vec![
                    hidden("tcp.analysis", vec![named("tcp.analysis.flags", vec![])]),
                    named("tcp.port", vec![]),
                ],
            )],
        );
        let pruned = prune(root).unwrap();
        assert_eq!(names(&pruned.children[0]), vec!["tcp.port"]);
        assert_eq!(pruned.subtree_len(), 3);
    }

    #[test]
    fn test_nested_reserved_names_removed() {
        let root = named(
            "",
            vec![named("ip", vec![named(FAKE_FIELD_WRAPPER, vec![]), named("ip.src", vec![])])],
        );
        let pruned = prune(root).unwrap();
        assert_eq!(names(&pruned.children[0]), vec!["ip.src"]);
    }

    #[test]
    fn test_root_removal_yields_nothing() {
        assert!(prune(hidden("", vec![named("eth", vec![])])).is_none());
        assert!(prune(named(GENINFO, vec![])).is_none());
    }

    #[test]
    fn test_prune_is_idempotent() {
        let root = named(
            "",
            vec![
                named(GENINFO, vec![]),
                named(
                    "eth",
                    vec![hidden("eth.padding", vec![]), named("eth.dst", vec![])],
                ),
                hidden("frame", vec![]),
            ],
        );
        let once = prune(root).unwrap();
        let twice = prune(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
