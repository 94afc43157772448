use super::handle::Handle;
use super::node::Location;
use super::raw_kbtree::RawKBTree;
use crate::Key;

impl RawKBTree {
    /// Finds the node holding `key` and the key's index within it.
    pub(crate) fn search(&self, key: Key) -> Option<(Handle, usize)> {
        let mut current = self.root?;

        loop {
            let node = self.nodes.get(current);
            match node.locate(key) {
                Location::Found(index) => return Some((current, index)),
                Location::Descend(_) if node.is_leaf() => return None,
                Location::Descend(index) => current = node.child(index),
            }
        }
    }

    /// Returns true if the tree contains `key`.
    pub(crate) fn contains(&self, key: Key) -> bool {
        self.search(key).is_some()
    }

    /// Leftmost leaf of the subtree rooted at `handle`.
    pub(super) fn leftmost_leaf(&self, mut handle: Handle) -> Handle {
        while !self.nodes.get(handle).is_leaf() {
            handle = self.nodes.get(handle).first_child();
        }
        handle
    }

    /// Rightmost leaf of the subtree rooted at `handle`.
    pub(super) fn rightmost_leaf(&self, mut handle: Handle) -> Handle {
        while !self.nodes.get(handle).is_leaf() {
            handle = self.nodes.get(handle).last_child();
        }
        handle
    }

    /// Returns the smallest key.
    pub(crate) fn first(&self) -> Option<Key> {
        let leaf = self.leftmost_leaf(self.root?);
        Some(self.nodes.get(leaf).first_key())
    }

    /// Returns the largest key.
    pub(crate) fn last(&self) -> Option<Key> {
        let leaf = self.rightmost_leaf(self.root?);
        Some(self.nodes.get(leaf).last_key())
    }

    /// Finds the node and index of the key at `rank` (0-indexed position in sorted order).
    pub(crate) fn locate_rank(&self, rank: usize) -> Option<(Handle, usize)> {
        if rank >= self.len() {
            return None;
        }

        let mut current = self.root?;
        let mut remaining = rank;

        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return Some((current, remaining));
            }

            // Child `i` is followed by key `i`; walk the interleaving until `remaining` lands.
            let mut next = None;
            for (index, &child) in node.children().iter().enumerate() {
                let child_size = self.nodes.get(child).size();
                if remaining < child_size {
                    next = Some(child);
                    break;
                }
                remaining -= child_size;
                if index < node.key_count() {
                    if remaining == 0 {
                        return Some((current, index));
                    }
                    remaining -= 1;
                }
            }
            debug_assert!(
                next.is_some(),
                "locate_rank: subtree size invariant violated - rank {rank} not found (node size: {})",
                node.size()
            );
            current = next?;
        }
    }

    /// Returns the key at `rank`.
    pub(crate) fn get_by_rank(&self, rank: usize) -> Option<Key> {
        let (handle, index) = self.locate_rank(rank)?;
        Some(self.nodes.get(handle).key(index))
    }

    /// Returns the 0-indexed position of `key`, if present.
    pub(crate) fn rank_of(&self, key: Key) -> Option<usize> {
        let mut current = self.root?;
        let mut rank = 0;

        loop {
            let node = self.nodes.get(current);
            let (index, found) = match node.locate(key) {
                Location::Found(index) => (index, true),
                Location::Descend(index) => (index, false),
            };
            // Everything left of position `index`: `index` keys and, if internal, `index` subtrees.
            rank += index;
            if !node.is_leaf() {
                rank += node.children()[..index].iter().map(|&child| self.nodes.get(child).size()).sum::<usize>();
            }
            if found {
                if !node.is_leaf() {
                    rank += self.nodes.get(node.child(index)).size();
                }
                return Some(rank);
            }
            if node.is_leaf() {
                return None;
            }
            current = node.child(index);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::text::{ParseSettings, parse_raw};

    fn sample() -> RawKBTree {
        parse_raw("(((1 2) 3 (4 5)) 6 ((7) 8 (9 10 11)))", &ParseSettings::new(3)).unwrap()
    }

    #[test]
    fn search_finds_keys_at_every_level() {
        let tree = sample();
        let root = tree.root().unwrap();
        assert_eq!(tree.search(6), Some((root, 0)));
        assert!(matches!(tree.search(3), Some((_, 0))));
        assert!(matches!(tree.search(10), Some((_, 1))));
        assert_eq!(tree.search(0), None);
        assert_eq!(tree.search(12), None);
        assert!(!tree.contains(-1));
        for key in 1..=11 {
            assert!(tree.contains(key), "missing {key}");
        }
    }

    #[test]
    fn extremes() {
        let tree = sample();
        assert_eq!(tree.first(), Some(1));
        assert_eq!(tree.last(), Some(11));
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn rank_round_trip_on_mixed_levels() {
        let tree = sample();
        for rank in 0..11 {
            let key = tree.get_by_rank(rank).unwrap();
            assert_eq!(key, i64::try_from(rank).unwrap() + 1);
            assert_eq!(tree.rank_of(key), Some(rank));
        }
        assert_eq!(tree.get_by_rank(11), None);
        assert_eq!(tree.rank_of(100), None);
    }

    #[test]
    fn empty_tree_has_nothing() {
        let tree = parse_raw("()", &ParseSettings::new(3)).unwrap();
        assert_eq!(tree.search(1), None);
        assert_eq!(tree.first(), None);
        assert_eq!(tree.last(), None);
        assert_eq!(tree.get_by_rank(0), None);
        assert_eq!(tree.rank_of(1), None);
    }
}
