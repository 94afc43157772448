//! A Knuth-style B-tree of signed 64-bit keys.
//!
//! [`KBTree`] stores a set of distinct [`Key`]s in nodes of at most `k` keys, where the
//! branching factor `k` is chosen per tree. Every node records the number of keys in its subtree,
//! which gives O(k log n) rank queries on top of the usual set operations:
//!
//! - [`insert`](KBTree::insert) and [`delete`](KBTree::delete) - single-pass, top-down
//!   rebalancing with no fix-up walk back towards the root
//! - [`get_by_rank`](KBTree::get_by_rank) and [`rank_of`](KBTree::rank_of) - order statistics
//! - Indexing by [`Rank`] - e.g., `tree[Rank(0)]` for the smallest key
//! - [`text`] - a parenthesised text form that round-trips the exact node layout
//!
//! # Example
//!
//! ```
//! use kbtree::{DeleteOutcome, InsertOutcome, KBTree, Rank};
//!
//! let mut tree = KBTree::new(3)?;
//! for key in [5, 1, 4, 2, 3] {
//!     assert_eq!(tree.insert(key)?, InsertOutcome::Inserted);
//! }
//! assert_eq!(tree.to_string(), "((1 2 3) 4 (5))");
//!
//! assert_eq!(tree.delete(2), DeleteOutcome::Deleted);
//! assert_eq!(tree.to_string(), "((1 3) 4 (5))");
//!
//! assert_eq!(tree[Rank(1)], 3);
//! assert_eq!(tree.rank_of(5), Some(3));
//! # Ok::<(), kbtree::Error>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **Bounded memory** - [`Config::with_node_limit`] caps the node count; an insert that would
//!   exceed it fails before touching the tree
//! - **Arena storage** - nodes live in one contiguous arena and refer to each other by index

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod config;
mod error;
mod kbtree;
mod order_statistic;
mod raw;

pub mod text;

pub use config::{Config, DEFAULT_BRANCHING_FACTOR, MIN_BRANCHING_FACTOR};
pub use error::{Error, ParseError, ParseErrorKind, Result};
pub use kbtree::{DeleteOutcome, InsertOutcome, Iter, KBTree};
pub use order_statistic::Rank;

/// The key type stored in a [`KBTree`].
pub type Key = i64;
