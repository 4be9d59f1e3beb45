/// Indented text rendering of a whole tree, for tests and diagnostics.
///
/// Every node is printed as `[label]` regardless of its expansion state,
/// one per line, indented by a fixed width per depth.
use crate::model::{NodeIndex, PdmlTree};
use std::fmt::{self, Write};

/// Spaces of indentation per tree level.
pub const DEFAULT_INDENT: usize = 2;

/// Render the subtree at `idx` with `indent` spaces per level.
pub fn render_subtree(tree: &PdmlTree, idx: NodeIndex, indent: usize) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_subtree(&mut out, tree, idx, indent, 0);
    out
}

fn write_subtree<W: Write>(
    out: &mut W,
    tree: &PdmlTree,
    idx: NodeIndex,
    indent: usize,
    depth: usize,
) -> fmt::Result {
    if depth > 0 {
        out.write_char('\n')?;
    }
    write!(
        out,
        "{:width$}[{}]",
        "",
        tree.node(idx).label,
        width = indent * depth
    )?;
    for &child in tree.children(idx) {
        write_subtree(out, tree, child, indent, depth + 1)?;
    }
    Ok(())
}

impl fmt::Display for PdmlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtree(f, self, self.root(), DEFAULT_INDENT, 0)
    }
}
