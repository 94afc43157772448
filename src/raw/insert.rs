//! Single-pass top-down insertion.
//!
//! Every full node met on the way down is split before it is entered, so the leaf that receives
//! the key always has room and nothing is ever pushed back up the path.

use super::handle::Handle;
use super::node::Location;
use super::raw_kbtree::RawKBTree;
use crate::Key;
use crate::error::Result;

impl RawKBTree {
    /// Inserts `key`. Returns `Ok(false)` without touching the tree when it is already present.
    ///
    /// Every node the descent will create is reserved up front, so a failed allocation surfaces
    /// before the first modification and the tree is left exactly as it was.
    pub(crate) fn insert(&mut self, key: Key) -> Result<bool> {
        let Some(needed) = self.nodes_needed(key) else {
            return Ok(false);
        };
        self.reserve_nodes(needed)?;

        let root = match self.root {
            Some(root) => root,
            None => {
                let leaf = self.alloc_node(true);
                self.set_root(Some(leaf));
                leaf
            }
        };
        let mut current = if self.order.is_full(self.nodes.get(root)) { self.grow_root(root) } else { root };

        loop {
            self.nodes.get_mut(current).grow(1);
            let node = self.nodes.get(current);
            let Location::Descend(mut index) = node.locate(key) else {
                unreachable!("`RawKBTree::insert()` - key appeared during descent!");
            };

            if node.is_leaf() {
                self.nodes.get_mut(current).insert_key(index, key);
                return Ok(true);
            }

            if self.order.is_full(self.nodes.get(node.child(index))) {
                let separator = self.split_child(current, index);
                if key > separator {
                    index += 1;
                }
            }
            current = self.nodes.get(current).child(index);
        }
    }

    /// Read-only dry run of [`RawKBTree::insert`]: `None` if `key` is present, otherwise the
    /// number of nodes the insertion will create.
    fn nodes_needed(&self, key: Key) -> Option<usize> {
        let Some(mut current) = self.root else {
            return Some(1);
        };

        // A full root costs a new root plus its split-off sibling.
        let mut needed = if self.order.is_full(self.nodes.get(current)) { 2 } else { 0 };
        loop {
            let node = self.nodes.get(current);
            match node.locate(key) {
                Location::Found(_) => return None,
                Location::Descend(_) if node.is_leaf() => return Some(needed),
                Location::Descend(index) => {
                    current = node.child(index);
                    if self.order.is_full(self.nodes.get(current)) {
                        needed += 1;
                    }
                }
            }
        }
    }

    /// Puts a new internal root above the full `root` and splits the old root under it.
    fn grow_root(&mut self, root: Handle) -> Handle {
        let new_root = self.alloc_node(false);
        let size = self.nodes.get(root).size();
        self.nodes.get_mut(new_root).set_size(size);
        self.nodes.push_back_child(new_root, root);
        self.split_child(new_root, 0);
        self.set_root(Some(new_root));
        log::trace!("root split, tree height is now {}", self.height());
        new_root
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::collections::BTreeSet;
    use alloc::vec::Vec;

    use proptest::prelude::*;

    use super::*;
    use crate::config::Config;
    use crate::error::Error;
    use crate::text::{ParseSettings, parse_raw, render_raw};

    fn build(k: usize, keys: impl IntoIterator<Item = Key>) -> RawKBTree {
        let mut tree = RawKBTree::new(Config::new(k)).unwrap();
        for key in keys {
            tree.insert(key).unwrap();
        }
        tree
    }

    #[test]
    fn first_key_creates_a_leaf_root() {
        let tree = build(3, [42]);
        assert_eq!(render_raw(&tree), "(42)");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn full_root_splits_before_descent() {
        let mut tree = parse_raw("(1 2 3)", &ParseSettings::new(3)).unwrap();
        assert_eq!(tree.insert(4), Ok(true));
        assert_eq!(render_raw(&tree), "((1) 2 (3 4))");
        tree.validate().unwrap();
    }

    #[test]
    fn root_split_grows_height() {
        let mut tree = parse_raw("((1 2) 3 (4 5) 6 (7 8))", &ParseSettings::new(3)).unwrap();
        tree.insert(9).unwrap();
        assert_eq!(render_raw(&tree), "((1 2) 3 (4 5) 6 (7 8 9))");

        tree.insert(10).unwrap();
        assert_eq!(render_raw(&tree), "((1 2) 3 (4 5) 6 (7) 8 (9 10))");

        tree.insert(11).unwrap();
        assert_eq!(render_raw(&tree), "(((1 2) 3 (4 5)) 6 ((7) 8 (9 10 11)))");
        assert_eq!(tree.height(), 3);
        tree.validate().unwrap();
    }

    #[test]
    fn ascending_run_with_k3() {
        let tree = build(3, 1..=9);
        assert_eq!(render_raw(&tree), "(((1) 2 (3)) 4 ((5) 6 (7 8 9)))");
        assert_eq!(tree.len(), 9);
        tree.validate().unwrap();
    }

    #[test]
    fn duplicate_is_a_no_op() {
        let mut tree = build(4, [5, 1, 9, 3, 7]);
        let before = tree.clone();
        assert_eq!(tree.insert(3), Ok(false));
        assert!(tree.same_structure(&before));
        assert_eq!(tree.nodes.len(), before.nodes.len());
    }

    #[test]
    fn node_limit_leaves_tree_unchanged() {
        let mut tree = RawKBTree::new(Config::new(3).with_node_limit(1)).unwrap();
        for key in 1..=3 {
            tree.insert(key).unwrap();
        }
        let before = tree.clone();

        assert_eq!(tree.insert(4), Err(Error::OutOfMemory));
        assert!(tree.same_structure(&before));
        assert_eq!(tree.len(), 3);
        assert_eq!(render_raw(&tree), "(1 2 3)");

        // Keys already present never need a node.
        assert_eq!(tree.insert(2), Ok(false));
    }

    #[test]
    fn node_limit_checked_before_inner_splits() {
        let input = "(((1 2 3) 4 (5 6 7) 8 (9 10 11) 12 (13 14 15)) 100 ((101) 102 (103)))";
        let mut tree = parse_raw(input, &ParseSettings::new(3)).unwrap();
        let live = tree.nodes.len();
        assert_eq!(tree.nodes_needed(16), Some(2));

        tree.nodes.set_limit(live + 1);
        let before = tree.clone();
        assert_eq!(tree.insert(16), Err(Error::OutOfMemory));
        assert!(tree.same_structure(&before));
        assert_eq!(tree.nodes.len(), live);
        assert_eq!(render_raw(&tree), input);

        tree.nodes.set_limit(live + 2);
        assert_eq!(tree.insert(16), Ok(true));
        assert_eq!(tree.nodes.len(), live + 2);
        assert_eq!(
            render_raw(&tree),
            "(((1 2 3) 4 (5 6 7)) 8 ((9 10 11) 12 (13) 14 (15 16)) 100 ((101) 102 (103)))"
        );
        tree.validate().unwrap();
    }

    #[test]
    fn probe_counts_every_split() {
        let tree = parse_raw("(((1 2) 3 (4 5)) 6 ((7) 8 (9 10 11)))", &ParseSettings::new(3)).unwrap();
        assert_eq!(tree.nodes_needed(12), Some(1));
        assert_eq!(tree.nodes_needed(0), Some(0));
        assert_eq!(tree.nodes_needed(8), None);

        let full = parse_raw("((1 2 3) 4 (5 6 7) 8 (9 10 11) 12 (13 14 15))", &ParseSettings::new(3)).unwrap();
        assert_eq!(full.nodes_needed(16), Some(3));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn inserts_keep_invariants(k in 3usize..9, keys in prop::collection::vec(-500i64..500, 0..400)) {
            let mut tree = RawKBTree::new(Config::new(k)).unwrap();
            let mut model = BTreeSet::new();

            for key in keys {
                prop_assert_eq!(tree.insert(key), Ok(model.insert(key)));
                prop_assert_eq!(tree.len(), model.len());
                if let Err(err) = tree.validate() {
                    prop_assert!(false, "{}", err);
                }
            }

            let in_order: Vec<Key> = tree.iter().collect();
            prop_assert_eq!(in_order, model.into_iter().collect::<Vec<_>>());
        }
    }
}
