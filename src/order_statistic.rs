/// A zero-based rank into the sorted order of a tree.
///
/// # Examples
///
/// ```
/// use kbtree::{KBTree, Rank};
///
/// let mut tree = KBTree::new(4)?;
/// tree.insert(-5)?;
/// tree.insert(8)?;
///
/// assert_eq!(tree[Rank(0)], -5);
/// # Ok::<(), kbtree::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
