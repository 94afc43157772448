use alloc::string::{String, ToString};
use core::fmt::{self, Write};

use crate::KBTree;
use crate::raw::{Handle, RawKBTree};

/// Renders `tree` in the text form read by [`parse`](super::parse).
///
/// Every node is a parenthesised group with child groups between its keys: `((1) 2 (3 4))`.
/// The empty tree renders as `()`.
#[must_use]
pub fn render(tree: &KBTree) -> String {
    tree.to_string()
}

#[cfg(test)]
pub(crate) fn render_raw(tree: &RawKBTree) -> String {
    Rendered(tree).to_string()
}

/// [`fmt::Display`] adapter over a raw tree.
pub(crate) struct Rendered<'a>(pub(crate) &'a RawKBTree);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.root() {
            Some(root) => write_node(self.0, root, f),
            None => f.write_str("()"),
        }
    }
}

fn write_node(tree: &RawKBTree, handle: Handle, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let node = tree.node(handle);
    f.write_char('(')?;
    for (index, key) in node.keys().iter().enumerate() {
        if index > 0 {
            f.write_char(' ')?;
        }
        if !node.is_leaf() {
            write_node(tree, node.child(index), f)?;
            f.write_char(' ')?;
        }
        write!(f, "{key}")?;
    }
    if !node.is_leaf() {
        if node.key_count() > 0 {
            f.write_char(' ')?;
        }
        write_node(tree, node.last_child(), f)?;
    }
    f.write_char(')')
}
