use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use crate::Key;
use crate::error::{Error, Result};

// Nodes of trees with k <= 8 never touch the heap for their arrays.
const INLINE_KEYS: usize = 8;

pub(crate) type Keys = SmallVec<[Key; INLINE_KEYS]>;
pub(crate) type Children = SmallVec<[Handle; INLINE_KEYS + 1]>;

/// Fill bounds derived from the branching factor `k` (maximum keys per node).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Order(usize);

impl Order {
    pub(crate) const fn new(branching_factor: usize) -> Self {
        Self(branching_factor)
    }

    pub(crate) const fn branching_factor(self) -> usize {
        self.0
    }

    pub(crate) const fn max_keys(self) -> usize {
        self.0
    }

    /// Minimum key count of every non-root node.
    pub(crate) const fn min_keys(self) -> usize {
        self.0.div_ceil(2) - 1
    }

    pub(crate) fn is_full(self, node: &Node) -> bool {
        node.key_count() >= self.max_keys()
    }

    /// True when the node can give up a key and stay within bounds.
    pub(crate) fn can_lend(self, node: &Node) -> bool {
        node.key_count() > self.min_keys()
    }
}

/// Where a key sits relative to a node's keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Location {
    /// `keys[i] == key`.
    Found(usize),
    /// `key` is not in this node; `children[i]` covers its range.
    Descend(usize),
}

/// One B-tree node. Leaves keep `children` empty.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    is_leaf: bool,
    keys: Keys,
    children: Children,
    // Number of keys stored in the subtree rooted here.
    size: usize,
    parent: Option<Handle>,
    // Position in the parent's `children`; meaningless on the root.
    child_index: usize,
}

impl Node {
    /// Creates an empty node with room for a full node of `order`.
    pub(crate) fn try_new(is_leaf: bool, order: Order) -> Result<Self> {
        let mut keys = Keys::new();
        keys.try_reserve_exact(order.max_keys()).map_err(|_| Error::OutOfMemory)?;
        let mut children = Children::new();
        children.try_reserve_exact(order.max_keys() + 1).map_err(|_| Error::OutOfMemory)?;
        Ok(Self {
            is_leaf,
            keys,
            children,
            size: 0,
            parent: None,
            child_index: 0,
        })
    }

    /// Empties the node but keeps its storage.
    pub(crate) fn reset(&mut self, is_leaf: bool) {
        self.is_leaf = is_leaf;
        self.keys.clear();
        self.children.clear();
        self.size = 0;
        self.parent = None;
        self.child_index = 0;
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub(crate) fn set_leaf(&mut self, is_leaf: bool) {
        debug_assert!(self.children.is_empty(), "leaf-ness changed on a node with children");
        self.is_leaf = is_leaf;
    }

    #[inline]
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    pub(crate) fn grow(&mut self, by: usize) {
        self.size += by;
    }

    pub(crate) fn shrink(&mut self, by: usize) {
        self.size = self.size.checked_sub(by).expect("`Node::shrink()` - subtree size underflow!");
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn child_index(&self) -> usize {
        self.child_index
    }

    pub(crate) fn set_link(&mut self, parent: Option<Handle>, child_index: usize) {
        self.parent = parent;
        self.child_index = child_index;
    }

    // ─── Keys ───────────────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    pub(crate) fn key_ref(&self, index: usize) -> &Key {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub(crate) fn first_key(&self) -> Key {
        self.keys[0]
    }

    pub(crate) fn last_key(&self) -> Key {
        self.keys[self.keys.len() - 1]
    }

    pub(crate) fn set_key(&mut self, index: usize, key: Key) {
        self.keys[index] = key;
    }

    /// Shifts `keys[index..]` right by one and writes `key` at `index`.
    pub(crate) fn insert_key(&mut self, index: usize, key: Key) {
        assert!(index <= self.keys.len(), "`Node::insert_key()` - `index` out of bounds!");
        self.keys.insert(index, key);
    }

    /// Removes `keys[index]`, shifting the tail left.
    pub(crate) fn remove_key(&mut self, index: usize) -> Key {
        self.keys.remove(index)
    }

    pub(crate) fn push_front_key(&mut self, key: Key) {
        self.keys.insert(0, key);
    }

    pub(crate) fn push_back_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub(crate) fn pop_front_key(&mut self) -> Key {
        assert!(!self.keys.is_empty(), "`Node::pop_front_key()` - node has no keys!");
        self.keys.remove(0)
    }

    pub(crate) fn pop_back_key(&mut self) -> Key {
        self.keys.pop().expect("`Node::pop_back_key()` - node has no keys!")
    }

    // ─── Children (slot-level; back-links are maintained by `Arena<Node>`) ──

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    pub(crate) fn first_child(&self) -> Handle {
        self.children[0]
    }

    pub(crate) fn last_child(&self) -> Handle {
        self.children[self.children.len() - 1]
    }

    // ─── Search ─────────────────────────────────────────────────────────────

    /// Binary search for `key`. On a miss the descent index is one past the greatest key below
    /// `key`.
    #[inline]
    pub(crate) fn locate(&self, key: Key) -> Location {
        match self.keys.binary_search(&key) {
            Ok(index) => Location::Found(index),
            Err(index) => Location::Descend(index),
        }
    }
}

/// Child operations need both the parent and the children, so they live on the arena and
/// keep every moved child's `parent` and `child_index` current.
impl Arena<Node> {
    fn relink_from(&mut self, parent: Handle, from: usize) {
        for index in from..self.get(parent).child_count() {
            let child = self.get(parent).child(index);
            self.set_child(parent, index, child);
        }
    }

    /// Stores `child` in `parent.children[index]` and points the child back at that slot.
    pub(crate) fn set_child(&mut self, parent: Handle, index: usize, child: Handle) {
        self.get_mut(parent).children[index] = child;
        self.get_mut(child).set_link(Some(parent), index);
    }

    pub(crate) fn insert_child(&mut self, parent: Handle, index: usize, child: Handle) {
        let node = self.get_mut(parent);
        assert!(!node.is_leaf, "`Arena::insert_child()` - parent is a leaf!");
        assert!(index <= node.children.len(), "`Arena::insert_child()` - `index` out of bounds!");
        node.children.insert(index, child);
        self.relink_from(parent, index);
    }

    /// Detaches `children[index]`; the detached node's own link is left for the caller.
    pub(crate) fn remove_child(&mut self, parent: Handle, index: usize) -> Handle {
        let child = self.get_mut(parent).children.remove(index);
        self.relink_from(parent, index);
        child
    }

    pub(crate) fn push_front_child(&mut self, parent: Handle, child: Handle) {
        self.insert_child(parent, 0, child);
    }

    pub(crate) fn push_back_child(&mut self, parent: Handle, child: Handle) {
        let index = self.get(parent).child_count();
        self.insert_child(parent, index, child);
    }

    pub(crate) fn pop_front_child(&mut self, parent: Handle) -> Handle {
        self.remove_child(parent, 0)
    }

    pub(crate) fn pop_back_child(&mut self, parent: Handle) -> Handle {
        self.get_mut(parent).children.pop().expect("`Arena::pop_back_child()` - node has no children!")
    }

    /// Moves `src.keys[start..start + count]` to the back of `dst`.
    pub(crate) fn append_key_range(&mut self, dst: Handle, src: Handle, start: usize, count: usize) {
        let (to, from) = self.get_pair_mut(dst, src);
        to.keys.extend(from.keys.drain(start..start + count));
    }

    /// Moves `src.children[start..start + count]` to the back of `dst`, relinking them.
    pub(crate) fn append_child_range(&mut self, dst: Handle, src: Handle, start: usize, count: usize) {
        let (to, from) = self.get_pair_mut(dst, src);
        let first = to.children.len();
        to.children.extend(from.children.drain(start..start + count));
        self.relink_from(dst, first);
    }

    /// Recomputes a node's subtree size from its own keys and its children's sizes.
    pub(crate) fn recompute_size(&mut self, handle: Handle) {
        let node = self.get(handle);
        let size = node.key_count() + node.children.iter().map(|&child| self.get(child).size).sum::<usize>();
        self.get_mut(handle).size = size;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn arena() -> Arena<Node> {
        let mut arena = Arena::new(Handle::MAX);
        arena.try_reserve(8).unwrap();
        arena
    }

    fn leaf(arena: &mut Arena<Node>, keys: &[Key]) -> Handle {
        let mut node = Node::try_new(true, Order::new(4)).unwrap();
        for &key in keys {
            node.push_back_key(key);
        }
        node.set_size(keys.len());
        arena.alloc(node)
    }

    #[test]
    fn order_bounds() {
        assert_eq!(Order::new(3).min_keys(), 1);
        assert_eq!(Order::new(4).min_keys(), 1);
        assert_eq!(Order::new(5).min_keys(), 2);
        assert_eq!(Order::new(8).min_keys(), 3);
        assert_eq!(Order::new(8).max_keys(), 8);
    }

    #[test]
    fn locate_tie_breaks() {
        let mut node = Node::try_new(true, Order::new(4)).unwrap();
        for key in [10, 20, 30] {
            node.push_back_key(key);
        }
        assert_eq!(node.locate(5), Location::Descend(0));
        assert_eq!(node.locate(10), Location::Found(0));
        assert_eq!(node.locate(25), Location::Descend(2));
        assert_eq!(node.locate(30), Location::Found(2));
        assert_eq!(node.locate(99), Location::Descend(3));
    }

    #[test]
    fn key_shifts() {
        let mut node = Node::try_new(true, Order::new(5)).unwrap();
        node.push_back_key(2);
        node.push_front_key(1);
        node.push_back_key(4);
        node.insert_key(2, 3);
        assert_eq!(node.keys(), &[1, 2, 3, 4]);
        assert_eq!(node.remove_key(1), 2);
        assert_eq!(node.pop_front_key(), 1);
        assert_eq!(node.pop_back_key(), 4);
        assert_eq!(node.keys(), &[3]);
    }

    #[test]
    fn child_moves_keep_links() {
        let mut nodes = arena();
        let parent = nodes.alloc(Node::try_new(false, Order::new(4)).unwrap());
        let a = leaf(&mut nodes, &[1]);
        let b = leaf(&mut nodes, &[3]);
        let c = leaf(&mut nodes, &[5]);

        nodes.push_back_child(parent, b);
        nodes.push_front_child(parent, a);
        nodes.insert_child(parent, 2, c);
        assert_eq!(nodes.get(parent).children(), &[a, b, c]);
        for (index, &child) in [a, b, c].iter().enumerate() {
            assert_eq!(nodes.get(child).parent(), Some(parent));
            assert_eq!(nodes.get(child).child_index(), index);
        }

        assert_eq!(nodes.pop_front_child(parent), a);
        assert_eq!(nodes.get(b).child_index(), 0);
        assert_eq!(nodes.get(c).child_index(), 1);
        assert_eq!(nodes.pop_back_child(parent), c);
        assert_eq!(nodes.get(parent).children(), &[b]);

        nodes.set_child(parent, 0, c);
        assert_eq!(nodes.get(parent).children(), &[c]);
        assert_eq!(nodes.get(c).parent(), Some(parent));
        assert_eq!(nodes.get(c).child_index(), 0);
    }

    #[test]
    fn range_moves_and_size_recompute() {
        let mut nodes = arena();
        let src = nodes.alloc(Node::try_new(false, Order::new(4)).unwrap());
        let dst = nodes.alloc(Node::try_new(false, Order::new(4)).unwrap());
        let leaves: alloc::vec::Vec<Handle> = [[1, 2], [4, 5], [7, 8]].iter().map(|keys| leaf(&mut nodes, keys)).collect();
        for &child in &leaves {
            nodes.push_back_child(src, child);
        }
        nodes.get_mut(src).push_back_key(3);
        nodes.get_mut(src).push_back_key(6);

        nodes.append_key_range(dst, src, 1, 1);
        nodes.append_child_range(dst, src, 1, 2);
        assert_eq!(nodes.get(src).keys(), &[3]);
        assert_eq!(nodes.get(dst).keys(), &[6]);
        assert_eq!(nodes.get(dst).children(), &leaves[1..]);
        assert_eq!(nodes.get(leaves[2]).parent(), Some(dst));
        assert_eq!(nodes.get(leaves[2]).child_index(), 1);

        nodes.recompute_size(dst);
        nodes.recompute_size(src);
        assert_eq!(nodes.get(dst).size(), 5);
        assert_eq!(nodes.get(src).size(), 3);
    }
}
