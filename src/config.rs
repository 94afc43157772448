//! Tree configuration.

use crate::error::{Error, Result};
use crate::raw::Handle;

/// Smallest branching factor for which split and merge keep every node within bounds.
pub const MIN_BRANCHING_FACTOR: usize = 3;

/// Branching factor used by [`Config::default`].
pub const DEFAULT_BRANCHING_FACTOR: usize = 8;

/// Construction parameters for a [`KBTree`](crate::KBTree).
///
/// The branching factor `k` is the maximum number of keys a node holds; internal nodes hold up
/// to `k + 1` children and every non-root node keeps at least `⌈k/2⌉ − 1` keys.
///
/// # Examples
///
/// ```
/// use kbtree::{Config, KBTree};
///
/// let config = Config::new(4).with_node_limit(1_000);
/// let tree = KBTree::with_config(config)?;
/// assert_eq!(tree.branching_factor(), 4);
/// assert_eq!(tree.config().node_limit(), 1_000);
/// # Ok::<(), kbtree::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Config {
    branching_factor: usize,
    node_limit: usize,
}

impl Config {
    /// Creates a configuration with branching factor `k` and no node limit beyond the arena's.
    #[must_use]
    pub const fn new(branching_factor: usize) -> Self {
        Self {
            branching_factor,
            node_limit: Handle::MAX,
        }
    }

    /// Caps the number of live nodes. Inserts that would exceed it fail with
    /// [`Error::OutOfMemory`] and leave the tree unchanged.
    ///
    /// Values above the arena's addressable range are clamped.
    #[must_use]
    pub const fn with_node_limit(mut self, node_limit: usize) -> Self {
        self.node_limit = if node_limit < Handle::MAX { node_limit } else { Handle::MAX };
        self
    }

    /// Returns the branching factor `k`.
    #[must_use]
    pub const fn branching_factor(&self) -> usize {
        self.branching_factor
    }

    /// Returns the maximum number of live nodes.
    #[must_use]
    pub const fn node_limit(&self) -> usize {
        self.node_limit
    }

    /// Checks that the configuration describes a valid tree.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBranchingFactor`] when `k < 3`.
    pub const fn validate(&self) -> Result<()> {
        if self.branching_factor < MIN_BRANCHING_FACTOR {
            return Err(Error::InvalidBranchingFactor(self.branching_factor));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCHING_FACTOR)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn rejects_small_branching_factors() {
        for k in 0..MIN_BRANCHING_FACTOR {
            assert_eq!(Config::new(k).validate(), Err(Error::InvalidBranchingFactor(k)));
        }
        assert_eq!(Config::new(MIN_BRANCHING_FACTOR).validate(), Ok(()));
    }

    #[test]
    fn node_limit_is_clamped() {
        assert_eq!(Config::new(3).with_node_limit(usize::MAX).node_limit(), Handle::MAX);
        assert_eq!(Config::new(3).with_node_limit(5).node_limit(), 5);
        assert_eq!(Config::default().branching_factor(), DEFAULT_BRANCHING_FACTOR);
    }
}
