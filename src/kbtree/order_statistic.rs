use core::ops::Index;

use super::KBTree;
use crate::{Key, Rank};

impl KBTree {
    /// Returns the key at position `rank` in ascending order.
    ///
    /// The rank is zero-based. Returns `None` if `rank` is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(k log n), guided by the subtree sizes.
    ///
    /// # Examples
    ///
    /// ```
    /// use kbtree::KBTree;
    ///
    /// let mut tree = KBTree::new(3)?;
    /// for key in [30, 10, 20] {
    ///     tree.insert(key)?;
    /// }
    /// assert_eq!(tree.get_by_rank(1), Some(20));
    /// assert!(tree.get_by_rank(3).is_none());
    /// # Ok::<(), kbtree::Error>(())
    /// ```
    #[must_use]
    pub fn get_by_rank(&self, rank: usize) -> Option<Key> {
        self.raw.get_by_rank(rank)
    }

    /// Returns the zero-based rank of `key` in ascending order, or `None` if the key is not
    /// present.
    ///
    /// # Complexity
    ///
    /// O(k log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use kbtree::KBTree;
    ///
    /// let mut tree = KBTree::new(3)?;
    /// tree.insert(10)?;
    /// tree.insert(20)?;
    ///
    /// assert_eq!(tree.rank_of(20), Some(1));
    /// assert_eq!(tree.rank_of(15), None);
    /// # Ok::<(), kbtree::Error>(())
    /// ```
    #[must_use]
    pub fn rank_of(&self, key: Key) -> Option<usize> {
        self.raw.rank_of(key)
    }
}

/// Indexes into the tree by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use kbtree::{KBTree, Rank};
///
/// let mut tree = KBTree::new(3)?;
/// for key in [10, 20, 30] {
///     tree.insert(key)?;
/// }
/// assert_eq!(tree[Rank(1)], 20);
/// # Ok::<(), kbtree::Error>(())
/// ```
impl Index<Rank> for KBTree {
    type Output = Key;

    fn index(&self, rank: Rank) -> &Self::Output {
        let (handle, index) = self.raw.locate_rank(rank.0).expect("index out of bounds");
        self.raw.node(handle).key_ref(index)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use proptest::prelude::*;

    use super::*;

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn index_past_the_end_panics() {
        let tree = KBTree::new(3).unwrap();
        let _ = tree[Rank(0)];
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn ranks_follow_sorted_order(k in 3usize..9, keys in prop::collection::btree_set(-1000i64..1000, 1..200)) {
            let mut tree = KBTree::new(k).unwrap();
            for &key in &keys {
                tree.insert(key).unwrap();
            }

            let sorted: Vec<Key> = keys.into_iter().collect();
            for (rank, &key) in sorted.iter().enumerate() {
                prop_assert_eq!(tree.get_by_rank(rank), Some(key));
                prop_assert_eq!(tree.rank_of(key), Some(rank));
                prop_assert_eq!(tree[Rank(rank)], key);
            }
            prop_assert!(tree.get_by_rank(sorted.len()).is_none());
            prop_assert!(tree.rank_of(1000).is_none());
        }
    }
}
