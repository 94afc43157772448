//! Composite node operations shared by insertion and deletion.
//!
//! Every operation here keeps keys ordered, keeps back-links current on every moved child and
//! leaves `size` exact on each node it touches. Preconditions are asserted; none of these can fail.

use super::handle::Handle;
use super::raw_kbtree::RawKBTree;
use crate::Key;

impl RawKBTree {
    /// Splits the full node `handle` around its median key.
    ///
    /// Keys `0..m` stay, key `m` is returned as the separator and the rest move to a new right
    /// sibling, where `m = n_keys / 2`. Children `0..=m` stay, the rest move right. The new node is
    /// detached; linking it into a parent is the caller's job. Needs one reserved node.
    pub(super) fn split(&mut self, handle: Handle) -> (Handle, Key) {
        let node = self.nodes.get(handle);
        let is_leaf = node.is_leaf();
        let n = node.key_count();
        assert!(self.order.is_full(node), "`RawKBTree::split()` - node is not full!");
        let m = n / 2;

        let right = self.alloc_node(is_leaf);
        self.nodes.append_key_range(right, handle, m + 1, n - m - 1);
        let separator = self.nodes.get_mut(handle).pop_back_key();
        if !is_leaf {
            self.nodes.append_child_range(right, handle, m + 1, n - m);
        }

        self.nodes.recompute_size(handle);
        self.nodes.recompute_size(right);
        log::trace!("split {handle:?} at {separator} into {right:?}");
        (right, separator)
    }

    /// Splits `parent.children[index]` and hangs the new right half at `index + 1`, with the
    /// separator at `parent.keys[index]`. The parent's subtree size is unchanged.
    pub(super) fn split_child(&mut self, parent: Handle, index: usize) -> Key {
        let child = self.nodes.get(parent).child(index);
        let (right, separator) = self.split(child);
        self.nodes.get_mut(parent).insert_key(index, separator);
        self.nodes.insert_child(parent, index + 1, right);
        separator
    }

    /// Folds `parent.keys[sep]` and the right sibling `children[sep + 1]` into the left sibling
    /// `children[sep]`, then frees the right sibling.
    pub(super) fn merge(&mut self, parent: Handle, sep: usize) {
        let left = self.nodes.get(parent).child(sep);
        let right = self.nodes.get(parent).child(sep + 1);
        let (l, r) = (self.nodes.get(left), self.nodes.get(right));
        assert!(
            l.key_count() + r.key_count() < self.order.max_keys(),
            "`RawKBTree::merge()` - merged node would overflow!"
        );
        let right_keys = r.key_count();
        let right_children = r.child_count();
        let right_size = r.size();

        let separator = self.nodes.get_mut(parent).remove_key(sep);
        self.nodes.remove_child(parent, sep + 1);

        self.nodes.get_mut(left).push_back_key(separator);
        self.nodes.append_key_range(left, right, 0, right_keys);
        if right_children > 0 {
            self.nodes.append_child_range(left, right, 0, right_children);
        }
        self.nodes.get_mut(left).grow(right_size + 1);

        self.release_node(right);
        log::trace!("merged {right:?} into {left:?} around {separator}");
    }

    /// Moves `parent.keys[sep]` to the back of `children[sep]` and the front key of
    /// `children[sep + 1]` up into its place, carrying the right sibling's first child along.
    pub(super) fn rotate_left(&mut self, parent: Handle, sep: usize) {
        let left = self.nodes.get(parent).child(sep);
        let right = self.nodes.get(parent).child(sep + 1);
        assert!(
            self.order.can_lend(self.nodes.get(right)),
            "`RawKBTree::rotate_left()` - right sibling cannot lend!"
        );

        let up = self.nodes.get_mut(right).pop_front_key();
        let down = self.nodes.get(parent).key(sep);
        self.nodes.get_mut(parent).set_key(sep, up);
        self.nodes.get_mut(left).push_back_key(down);

        let mut moved = 1;
        if !self.nodes.get(right).is_leaf() {
            let child = self.nodes.pop_front_child(right);
            moved += self.nodes.get(child).size();
            self.nodes.push_back_child(left, child);
        }
        self.nodes.get_mut(left).grow(moved);
        self.nodes.get_mut(right).shrink(moved);
        log::trace!("rotated {down} left into {left:?}");
    }

    /// Mirror of [`RawKBTree::rotate_left`]: the last key and child of `children[sep]` flow
    /// through `parent.keys[sep]` into the front of `children[sep + 1]`.
    pub(super) fn rotate_right(&mut self, parent: Handle, sep: usize) {
        let left = self.nodes.get(parent).child(sep);
        let right = self.nodes.get(parent).child(sep + 1);
        assert!(
            self.order.can_lend(self.nodes.get(left)),
            "`RawKBTree::rotate_right()` - left sibling cannot lend!"
        );

        let up = self.nodes.get_mut(left).pop_back_key();
        let down = self.nodes.get(parent).key(sep);
        self.nodes.get_mut(parent).set_key(sep, up);
        self.nodes.get_mut(right).push_front_key(down);

        let mut moved = 1;
        if !self.nodes.get(left).is_leaf() {
            let child = self.nodes.pop_back_child(left);
            moved += self.nodes.get(child).size();
            self.nodes.push_front_child(right, child);
        }
        self.nodes.get_mut(right).grow(moved);
        self.nodes.get_mut(left).shrink(moved);
        log::trace!("rotated {down} right into {right:?}");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::text::{ParseSettings, parse_raw, render_raw};

    fn raw(input: &str, k: usize) -> RawKBTree {
        parse_raw(input, &ParseSettings::new(k)).unwrap()
    }

    fn render(tree: &RawKBTree) -> String {
        render_raw(tree)
    }

    #[test]
    fn split_leaf_child() {
        let mut tree = raw("((1 2 3) 4 (5))", 3);
        let root = tree.root.unwrap();
        tree.reserve_nodes(1).unwrap();
        assert_eq!(tree.split_child(root, 0), 2);
        assert_eq!(render(&tree), "((1) 2 (3) 4 (5))");
        tree.validate().unwrap();
    }

    #[test]
    fn split_internal_child_moves_children() {
        let mut tree = raw("(((1) 2 (3) 4 (5) 6 (7 8)) 9 ((10) 11 (12)))", 3);
        let root = tree.root.unwrap();
        tree.reserve_nodes(1).unwrap();
        assert_eq!(tree.split_child(root, 0), 4);
        assert_eq!(render(&tree), "(((1) 2 (3)) 4 ((5) 6 (7 8)) 9 ((10) 11 (12)))");
        tree.validate().unwrap();
        let right = tree.node(root).child(1);
        assert_eq!(tree.node(right).size(), 4);
    }

    #[test]
    fn merge_leaves_and_internal() {
        let mut tree = raw("((1) 2 (3) 4 (5))", 3);
        let root = tree.root.unwrap();
        tree.merge(root, 0);
        assert_eq!(render(&tree), "((1 2 3) 4 (5))");
        tree.validate().unwrap();

        let mut tree = raw("(((1) 2 (3)) 4 ((5) 6 (7)) 8 ((9) 10 (11)))", 3);
        let root = tree.root.unwrap();
        tree.merge(root, 1);
        assert_eq!(render(&tree), "(((1) 2 (3)) 4 ((5) 6 (7) 8 (9) 10 (11)))");
        tree.validate().unwrap();
        assert_eq!(tree.nodes.len(), 9);
    }

    #[test]
    fn rotations_carry_children() {
        let mut tree = raw("(((1) 2 (3) 4 (5)) 6 ((7) 8 (9)))", 3);
        let root = tree.root.unwrap();
        tree.rotate_right(root, 0);
        assert_eq!(render(&tree), "(((1) 2 (3)) 4 ((5) 6 (7) 8 (9)))");
        tree.validate().unwrap();

        tree.rotate_left(root, 0);
        assert_eq!(render(&tree), "(((1) 2 (3) 4 (5)) 6 ((7) 8 (9)))");
        tree.validate().unwrap();
        assert_eq!(tree.len(), 9);
    }

    #[test]
    #[should_panic(expected = "cannot lend")]
    fn rotation_from_minimal_sibling_panics() {
        let mut tree = raw("((1) 2 (3))", 3);
        let root = tree.root.unwrap();
        tree.rotate_left(root, 0);
    }

    #[test]
    fn merge_frees_right_sibling() {
        let mut tree = raw("((1) 2 (3))", 3);
        let root = tree.root.unwrap();
        let right = tree.node(root).child(1);
        tree.merge(root, 0);
        assert_eq!(tree.node(root).key_count(), 0);
        assert_eq!(tree.node(tree.node(root).child(0)).keys(), &[1, 2, 3]);
        assert!(tree.nodes.handles().all(|h| h != right));
        assert_eq!(tree.node(root).size(), 3);
    }
}
