//! Single-pass top-down deletion.
//!
//! Before the descent enters a child, the child is topped up to more than the minimum key count
//! by a rotation from a sibling or a merge with one. The node a key finally leaves therefore never
//! underflows, and no fix-up walks back towards the root. Deletion frees nodes but never allocates.

use super::handle::Handle;
use super::node::Location;
use super::raw_kbtree::RawKBTree;
use crate::Key;

impl RawKBTree {
    /// Removes `key`. Returns false without touching the tree when it is absent.
    pub(crate) fn delete(&mut self, key: Key) -> bool {
        // Subtree sizes are decremented on the way down, so the key must be known to exist.
        if !self.contains(key) {
            return false;
        }
        let Some(mut current) = self.root else {
            return false;
        };

        loop {
            self.nodes.get_mut(current).shrink(1);
            let node = self.nodes.get(current);
            match node.locate(key) {
                Location::Found(index) if node.is_leaf() => {
                    self.nodes.get_mut(current).remove_key(index);
                    if self.nodes.get(current).key_count() == 0 {
                        debug_assert_eq!(self.root, Some(current), "non-root leaf underflowed");
                        self.release_node(current);
                        self.root = None;
                    }
                    return true;
                }
                Location::Descend(index) => current = self.fortify_child(current, index),
                Location::Found(index) => {
                    let child = self.fortify_child(current, index);
                    // A rotation or merge may have carried the key down into the child.
                    if let Location::Found(_) = self.nodes.get(child).locate(key) {
                        current = child;
                        continue;
                    }
                    let Location::Found(index) = self.nodes.get(current).locate(key) else {
                        unreachable!("`RawKBTree::delete()` - key vanished while fortifying!");
                    };
                    self.replace_with_predecessor(current, index);
                    return true;
                }
            }
        }
    }

    /// Overwrites `keys[index]` of the internal node `holder` with its in-order predecessor,
    /// removing the predecessor from its leaf. `children[index]` must be able to lend.
    fn replace_with_predecessor(&mut self, holder: Handle, index: usize) {
        let mut current = self.nodes.get(holder).child(index);
        loop {
            self.nodes.get_mut(current).shrink(1);
            let node = self.nodes.get(current);
            if node.is_leaf() {
                let predecessor = self.nodes.get_mut(current).pop_back_key();
                self.nodes.get_mut(holder).set_key(index, predecessor);
                return;
            }
            let last = node.child_count() - 1;
            current = self.fortify_child(current, last);
        }
    }

    /// Makes sure `parent.children[index]` holds more than the minimum number of keys and returns
    /// the node the descent should continue into.
    ///
    /// Preference order: leave it alone, borrow from the left sibling, borrow from the right
    /// sibling, merge with the left sibling, merge with the right sibling. When a merge empties
    /// the root, the merged node becomes the new root.
    pub(super) fn fortify_child(&mut self, parent: Handle, index: usize) -> Handle {
        let node = self.nodes.get(parent);
        let child = node.child(index);
        if self.order.can_lend(self.nodes.get(child)) {
            return child;
        }

        let key_count = node.key_count();
        if index > 0 && self.order.can_lend(self.nodes.get(node.child(index - 1))) {
            self.rotate_right(parent, index - 1);
            return child;
        }
        if index < key_count && self.order.can_lend(self.nodes.get(node.child(index + 1))) {
            self.rotate_left(parent, index);
            return child;
        }

        let merged = if index > 0 {
            let left = node.child(index - 1);
            self.merge(parent, index - 1);
            left
        } else {
            self.merge(parent, index);
            child
        };

        if self.root == Some(parent) && self.nodes.get(parent).key_count() == 0 {
            self.release_node(parent);
            self.set_root(Some(merged));
            log::trace!("root merged away, tree height is now {}", self.height());
        }
        merged
    }
}
