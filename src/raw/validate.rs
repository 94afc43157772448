use alloc::string::String;
use alloc::vec::Vec;

use super::handle::Handle;
use super::raw_kbtree::RawKBTree;
use crate::Key;
use crate::error::{Error, Result};

/// Key interval a subtree must fall in; `None` is unbounded on that side.
#[derive(Clone, Copy)]
struct Bounds {
    lo: Option<Key>,
    hi: Option<Key>,
}

impl Bounds {
    const fn contains(self, key: Key) -> bool {
        let above = match self.lo {
            Some(lo) => key > lo,
            None => true,
        };
        let below = match self.hi {
            Some(hi) => key < hi,
            None => true,
        };
        above && below
    }
}

impl RawKBTree {
    /// Checks every structural invariant and reports all violations at once.
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`] listing each broken invariant, one per line.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        let reachable = match self.root {
            None => 0,
            Some(root) => {
                let node = self.nodes.get(root);
                if node.parent().is_some() {
                    errors.push(alloc::format!("Root {root:?} has a parent link {:?}", node.parent()));
                }
                if node.key_count() == 0 {
                    errors.push(alloc::format!("Root {root:?} has no keys"));
                }
                let mut leaf_depth = None;
                let bounds = Bounds { lo: None, hi: None };
                let (_, count) = self.validate_node(root, 0, bounds, &mut leaf_depth, &mut errors);
                count
            }
        };

        let live = self.nodes.len();
        if live != reachable {
            errors.push(alloc::format!("Node leak: {live} live nodes, {reachable} reachable from the root"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvariantViolation(errors.join("\n")))
        }
    }

    // Returns (stored subtree size, node count).
    fn validate_node(
        &self,
        handle: Handle,
        depth: usize,
        bounds: Bounds,
        leaf_depth: &mut Option<usize>,
        errors: &mut Vec<String>,
    ) -> (usize, usize) {
        let node = self.nodes.get(handle);
        let is_root = self.root == Some(handle);

        if node.key_count() > self.order.max_keys() {
            errors.push(alloc::format!(
                "Overfull node {handle:?}: {} keys, maximum {}",
                node.key_count(),
                self.order.max_keys()
            ));
        }
        if !is_root && node.key_count() < self.order.min_keys() {
            errors.push(alloc::format!(
                "Underfull node {handle:?}: {} keys, minimum {}",
                node.key_count(),
                self.order.min_keys()
            ));
        }

        for (i, pair) in node.keys().windows(2).enumerate() {
            if pair[0] >= pair[1] {
                errors.push(alloc::format!("Keys not ascending at {handle:?}, indices {} and {}", i, i + 1));
            }
        }
        for &key in node.keys() {
            if !bounds.contains(key) {
                errors.push(alloc::format!(
                    "Key {key} at {handle:?} escapes its separators ({:?}, {:?})",
                    bounds.lo,
                    bounds.hi
                ));
            }
        }

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    errors.push(alloc::format!("Leaf depth mismatch: expected {expected}, got {depth} at {handle:?}"));
                }
                Some(_) => {}
            }
            if node.child_count() != 0 {
                errors.push(alloc::format!("Leaf {handle:?} has {} children", node.child_count()));
            }
            if node.size() != node.key_count() {
                errors.push(alloc::format!(
                    "Leaf size mismatch at {handle:?}: stored={}, keys={}",
                    node.size(),
                    node.key_count()
                ));
            }
            return (node.size(), 1);
        }

        if node.child_count() != node.key_count() + 1 {
            errors.push(alloc::format!(
                "Internal node {handle:?} has {} keys but {} children",
                node.key_count(),
                node.child_count()
            ));
        }

        let mut total_size = node.key_count();
        let mut count = 1;
        for (i, &child) in node.children().iter().enumerate() {
            let link = self.nodes.get(child);
            if link.parent() != Some(handle) || link.child_index() != i {
                errors.push(alloc::format!(
                    "Child {child:?} at {handle:?}[{i}] links back to {:?}[{}]",
                    link.parent(),
                    link.child_index()
                ));
            }

            let child_bounds = Bounds {
                lo: if i == 0 { bounds.lo } else { node.keys().get(i - 1).copied() },
                hi: node.keys().get(i).copied().or(bounds.hi),
            };
            let (child_size, child_count) = self.validate_node(child, depth + 1, child_bounds, leaf_depth, errors);
            total_size += child_size;
            count += child_count;
        }

        if node.size() != total_size {
            errors.push(alloc::format!(
                "Internal size mismatch at {handle:?}: stored={}, computed={total_size}",
                node.size()
            ));
        }

        (node.size(), count)
    }
}
