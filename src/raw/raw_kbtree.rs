use alloc::vec::Vec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Order};
use crate::config::Config;
use crate::error::{Error, Result};

/// The engine behind `KBTree`: an arena of nodes plus the root handle.
///
/// Tree operations are spread over sibling modules (`algebra`, `search`, `insert`, `delete`,
/// `iter`, `validate`); this module owns construction and node lifetime.
#[derive(Clone)]
pub(crate) struct RawKBTree {
    /// Arena storing all tree nodes.
    pub(super) nodes: Arena<Node>,
    /// Handle to the root node, if the tree is non-empty.
    pub(super) root: Option<Handle>,
    pub(super) order: Order,
    /// Blank nodes set aside so that an insert in progress never allocates.
    pub(super) spare: Vec<Node>,
    config: Config,
}

impl RawKBTree {
    /// Creates a new, empty tree.
    pub(crate) fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nodes: Arena::new(config.node_limit()),
            root: None,
            order: Order::new(config.branching_factor()),
            spare: Vec::new(),
            config,
        })
    }

    pub(crate) const fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) const fn branching_factor(&self) -> usize {
        self.order.branching_factor()
    }

    /// Returns the number of keys in the tree.
    pub(crate) fn len(&self) -> usize {
        self.root.map_or(0, |root| self.nodes.get(root).size())
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node {
        self.nodes.get(handle)
    }

    /// Number of nodes on a root-to-leaf path; zero for the empty tree.
    pub(crate) fn height(&self) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };
        let mut height = 1;
        while !self.nodes.get(current).is_leaf() {
            current = self.nodes.get(current).first_child();
            height += 1;
        }
        height
    }

    /// Drops every node. Storage is released at once, without walking the tree.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.spare.clear();
        self.root = None;
    }

    // ─── Node lifetime ──────────────────────────────────────────────────────

    /// Makes sure `count` nodes can be created later without touching the allocator.
    pub(super) fn reserve_nodes(&mut self, count: usize) -> Result<()> {
        self.nodes.try_reserve(count)?;
        if self.spare.len() < count {
            self.spare.try_reserve(count - self.spare.len()).map_err(|_| Error::OutOfMemory)?;
            while self.spare.len() < count {
                self.spare.push(Node::try_new(true, self.order)?);
            }
        }
        Ok(())
    }

    /// Places a reserved blank node in the arena.
    pub(super) fn alloc_node(&mut self, is_leaf: bool) -> Handle {
        let mut node = self.spare.pop().expect("`RawKBTree::alloc_node()` - no node was reserved!");
        node.reset(is_leaf);
        self.nodes.alloc(node)
    }

    /// Removes a node from the arena, keeping its storage for reuse when the spare pool has room.
    pub(crate) fn release_node(&mut self, handle: Handle) {
        let node = self.nodes.take(handle);
        if self.spare.len() < self.spare.capacity() {
            self.spare.push(node);
        }
    }

    /// Allocates a detached node immediately. Used when assembling a tree from text.
    pub(crate) fn new_node(&mut self, is_leaf: bool) -> Result<Handle> {
        self.reserve_nodes(1)?;
        Ok(self.alloc_node(is_leaf))
    }

    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node {
        self.nodes.get_mut(handle)
    }

    /// Appends `child` to `parent`'s children, setting its back-link.
    pub(crate) fn attach_child(&mut self, parent: Handle, child: Handle) {
        self.nodes.push_back_child(parent, child);
    }

    /// Replaces the root. The new root's parent link is cleared.
    pub(crate) fn set_root(&mut self, root: Option<Handle>) {
        if let Some(handle) = root {
            self.nodes.get_mut(handle).set_link(None, 0);
        }
        self.root = root;
    }

    // ─── Structure ──────────────────────────────────────────────────────────

    /// Structural equality: same order, same shape, same keys and subtree sizes per node.
    pub(crate) fn same_structure(&self, other: &Self) -> bool {
        if self.order != other.order {
            return false;
        }
        let (a, b) = match (self.root, other.root) {
            (None, None) => return true,
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };

        let mut stack = alloc::vec![(a, b)];
        while let Some((a, b)) = stack.pop() {
            let (x, y) = (self.nodes.get(a), other.nodes.get(b));
            if x.is_leaf() != y.is_leaf()
                || x.keys() != y.keys()
                || x.size() != y.size()
                || x.child_count() != y.child_count()
            {
                return false;
            }
            stack.extend(x.children().iter().copied().zip(y.children().iter().copied()));
        }
        true
    }
}
