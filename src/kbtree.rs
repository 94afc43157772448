use core::fmt;
use core::iter::FusedIterator;

use crate::Key;
use crate::config::Config;
use crate::error::Result;
use crate::raw::{RawIter, RawKBTree};
use crate::text::Rendered;

mod order_statistic;

/// What [`KBTree::insert`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InsertOutcome {
    /// The key was added.
    Inserted,
    /// The key was already present; the tree is untouched.
    AlreadyPresent,
}

/// What [`KBTree::delete`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DeleteOutcome {
    /// The key was removed.
    Deleted,
    /// The key was absent; the tree is untouched.
    NotFound,
}

/// An ordered set of `i64` keys stored in a B-tree with branching factor `k`.
///
/// Every node holds at most `k` keys, and every node except the root holds at least
/// `⌈k/2⌉ − 1`. Keys live in internal nodes as well as leaves. Each node records the number of
/// keys in its subtree, which makes [`len`](KBTree::len) constant-time and backs the rank
/// queries [`get_by_rank`](KBTree::get_by_rank) and [`rank_of`](KBTree::rank_of).
///
/// Insertion and deletion make a single pass from the root. A full node is split before the
/// descent enters it, and a minimal node is topped up from a sibling (or merged with one) before
/// the descent enters it, so nothing ever propagates back up.
///
/// Equality is structural: two trees are equal when they have the same branching factor, the
/// same shape and the same keys in every node. Two trees holding the same keys can differ.
///
/// # Examples
///
/// ```
/// use kbtree::{DeleteOutcome, InsertOutcome, KBTree};
///
/// let mut tree = KBTree::new(3)?;
/// for key in [5, 1, 4, 2, 3] {
///     assert_eq!(tree.insert(key)?, InsertOutcome::Inserted);
/// }
/// assert_eq!(tree.insert(4)?, InsertOutcome::AlreadyPresent);
///
/// assert!(tree.contains(2));
/// assert_eq!(tree.len(), 5);
/// assert_eq!(tree.to_string(), "((1 2 3) 4 (5))");
///
/// assert_eq!(tree.delete(2), DeleteOutcome::Deleted);
/// assert_eq!(tree.delete(2), DeleteOutcome::NotFound);
/// assert_eq!(tree.iter().collect::<Vec<_>>(), [1, 3, 4, 5]);
/// # Ok::<(), kbtree::Error>(())
/// ```
#[derive(Clone)]
pub struct KBTree {
    raw: RawKBTree,
}

/// An iterator over the keys of a [`KBTree`] in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`KBTree`]. See its documentation for more.
///
/// # Examples
///
/// ```
/// use kbtree::KBTree;
///
/// let mut tree = KBTree::new(4)?;
/// for key in [3, 1, 2] {
///     tree.insert(key)?;
/// }
/// let mut iter = tree.iter();
/// assert_eq!(iter.next(), Some(1));
/// assert_eq!(iter.next_back(), Some(3));
/// assert_eq!(iter.len(), 1);
/// # Ok::<(), kbtree::Error>(())
/// ```
///
/// [`iter`]: KBTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Clone)]
pub struct Iter<'a> {
    inner: RawIter<'a>,
}

impl KBTree {
    /// Makes a new, empty tree with branching factor `k`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBranchingFactor`](crate::Error::InvalidBranchingFactor) when `k < 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kbtree::KBTree;
    ///
    /// let tree = KBTree::new(3)?;
    /// assert!(tree.is_empty());
    /// assert!(KBTree::new(2).is_err());
    /// # Ok::<(), kbtree::Error>(())
    /// ```
    pub fn new(branching_factor: usize) -> Result<Self> {
        Self::with_config(Config::new(branching_factor))
    }

    /// Makes a new, empty tree from a full [`Config`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBranchingFactor`](crate::Error::InvalidBranchingFactor) when the
    /// configured `k < 3`.
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self::from_raw(RawKBTree::new(config)?))
    }

    pub(crate) const fn from_raw(raw: RawKBTree) -> Self {
        Self { raw }
    }

    /// Returns the configuration the tree was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        self.raw.config()
    }

    /// Returns the branching factor `k`.
    #[must_use]
    pub const fn branching_factor(&self) -> usize {
        self.raw.branching_factor()
    }

    /// Returns the number of keys in the tree.
    ///
    /// # Complexity
    ///
    /// O(1): the root's subtree size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of levels; zero for the empty tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use kbtree::KBTree;
    ///
    /// let mut tree = KBTree::new(3)?;
    /// assert_eq!(tree.height(), 0);
    /// for key in 1..=4 {
    ///     tree.insert(key)?;
    /// }
    /// assert_eq!(tree.height(), 2);
    /// # Ok::<(), kbtree::Error>(())
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns `true` if the tree contains `key`.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.raw.contains(key)
    }

    /// Adds `key` to the tree.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`](crate::Error::OutOfMemory) when a node cannot be allocated or
    /// the configured node limit would be exceeded. The tree is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use kbtree::{InsertOutcome, KBTree};
    ///
    /// let mut tree = KBTree::new(3)?;
    /// assert_eq!(tree.insert(7)?, InsertOutcome::Inserted);
    /// assert_eq!(tree.insert(7)?, InsertOutcome::AlreadyPresent);
    /// assert_eq!(tree.len(), 1);
    /// # Ok::<(), kbtree::Error>(())
    /// ```
    pub fn insert(&mut self, key: Key) -> Result<InsertOutcome> {
        Ok(if self.raw.insert(key)? { InsertOutcome::Inserted } else { InsertOutcome::AlreadyPresent })
    }

    /// Removes `key` from the tree. Never allocates.
    ///
    /// # Examples
    ///
    /// ```
    /// use kbtree::{DeleteOutcome, KBTree};
    ///
    /// let mut tree = KBTree::new(3)?;
    /// tree.insert(7)?;
    /// assert_eq!(tree.delete(7), DeleteOutcome::Deleted);
    /// assert_eq!(tree.delete(7), DeleteOutcome::NotFound);
    /// # Ok::<(), kbtree::Error>(())
    /// ```
    pub fn delete(&mut self, key: Key) -> DeleteOutcome {
        if self.raw.delete(key) { DeleteOutcome::Deleted } else { DeleteOutcome::NotFound }
    }

    /// Removes every key. The configuration is kept.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<Key> {
        self.raw.first()
    }

    /// Returns the largest key.
    #[must_use]
    pub fn last(&self) -> Option<Key> {
        self.raw.last()
    }

    /// Gets an iterator that visits the keys in ascending order.
    ///
    /// The iterator is double-ended and knows its exact length.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.raw.iter(),
        }
    }

    /// Checks every structural invariant: key bounds per node, ordering across the whole tree,
    /// equal leaf depth, child counts, subtree sizes, parent links, and that every allocated node
    /// is reachable from the root.
    ///
    /// Trees built through [`insert`](KBTree::insert) and [`delete`](KBTree::delete) always pass;
    /// this is meant for trees read with [`text::parse`](crate::text::parse) and for tests.
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`](crate::Error::InvariantViolation) listing every violation.
    pub fn validate(&self) -> Result<()> {
        self.raw.validate()
    }
}

/// An empty tree built from [`Config::default`].
impl Default for KBTree {
    fn default() -> Self {
        Self::with_config(Config::default()).expect("`KBTree::default()` - default configuration is invalid!")
    }
}

impl PartialEq for KBTree {
    fn eq(&self, other: &Self) -> bool {
        self.raw.same_structure(&other.raw)
    }
}

impl Eq for KBTree {}

/// Renders the parenthesised text form read by [`text::parse`](crate::text::parse).
impl fmt::Display for KBTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Rendered(&self.raw), f)
    }
}

impl fmt::Debug for KBTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KBTree(k = {}) {}", self.branching_factor(), Rendered(&self.raw))
    }
}

impl<'a> IntoIterator for &'a KBTree {
    type Item = Key;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Iterator for Iter<'_> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Key> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for Iter<'_> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl FusedIterator for Iter<'_> {}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::format;
    use alloc::vec::Vec;

    use super::*;
    use crate::error::Error;

    #[test]
    fn outcomes_and_len() {
        let mut tree = KBTree::new(4).unwrap();
        assert_eq!(tree.insert(10), Ok(InsertOutcome::Inserted));
        assert_eq!(tree.insert(10), Ok(InsertOutcome::AlreadyPresent));
        assert_eq!(tree.delete(11), DeleteOutcome::NotFound);
        assert_eq!(tree.delete(10), DeleteOutcome::Deleted);
        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);
    }

    #[test]
    fn clear_keeps_configuration() {
        let mut tree = KBTree::with_config(Config::new(5).with_node_limit(40)).unwrap();
        for key in 0..50 {
            tree.insert(key).unwrap();
        }
        tree.clear();
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.config().node_limit(), 40);
        assert_eq!(tree.insert(1), Ok(InsertOutcome::Inserted));
        tree.validate().unwrap();
    }

    #[test]
    fn formatting() {
        let mut tree = KBTree::new(3).unwrap();
        assert_eq!(format!("{tree}"), "()");
        for key in 1..=4 {
            tree.insert(key).unwrap();
        }
        assert_eq!(format!("{tree}"), "((1) 2 (3 4))");
        assert_eq!(format!("{tree:?}"), "KBTree(k = 3) ((1) 2 (3 4))");
        assert_eq!(format!("{:?}", tree.iter()), "[1, 2, 3, 4]");
    }

    #[test]
    fn equality_is_structural() {
        let mut a = KBTree::new(3).unwrap();
        let mut b = KBTree::new(3).unwrap();
        for key in [1, 2, 3, 4] {
            a.insert(key).unwrap();
        }
        for key in [4, 3, 2, 1] {
            b.insert(key).unwrap();
        }
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(KBTree::new(3).unwrap(), KBTree::new(4).unwrap());
    }

    #[test]
    fn invalid_branching_factor() {
        assert!(matches!(KBTree::new(1), Err(Error::InvalidBranchingFactor(1))));
    }
}
