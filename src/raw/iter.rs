use core::iter::FusedIterator;

use smallvec::SmallVec;

use super::handle::Handle;
use super::raw_kbtree::RawKBTree;
use crate::Key;

// Paths deeper than the inline capacity spill to the heap.
type Path = SmallVec<[(Handle, usize); 16]>;

/// In-order walk over a [`RawKBTree`] from both ends.
///
/// Front entries hold the index of the next key to yield at that node; back entries hold the
/// number of keys not yet yielded from the right. `remaining` keeps the two ends from crossing.
#[derive(Clone)]
pub(crate) struct RawIter<'a> {
    tree: &'a RawKBTree,
    front: Path,
    back: Path,
    remaining: usize,
}

impl<'a> RawIter<'a> {
    pub(crate) fn new(tree: &'a RawKBTree) -> Self {
        let mut iter = Self {
            tree,
            front: Path::new(),
            back: Path::new(),
            remaining: tree.len(),
        };
        if let Some(root) = tree.root() {
            iter.descend_front(root);
            iter.descend_back(root);
        }
        iter
    }

    fn descend_front(&mut self, mut handle: Handle) {
        loop {
            self.front.push((handle, 0));
            let node = self.tree.node(handle);
            if node.is_leaf() {
                return;
            }
            handle = node.first_child();
        }
    }

    fn descend_back(&mut self, mut handle: Handle) {
        loop {
            let node = self.tree.node(handle);
            self.back.push((handle, node.key_count()));
            if node.is_leaf() {
                return;
            }
            handle = node.last_child();
        }
    }
}

impl Iterator for RawIter<'_> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree;
        let top = self.front.last_mut()?;
        let (handle, index) = *top;
        top.1 = index + 1;
        let node = tree.node(handle);
        let key = node.key(index);

        if node.is_leaf() {
            while let Some(&(handle, index)) = self.front.last() {
                if index < tree.node(handle).key_count() {
                    break;
                }
                self.front.pop();
            }
        } else {
            self.descend_front(node.child(index + 1));
        }

        self.remaining -= 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for RawIter<'_> {
    fn next_back(&mut self) -> Option<Key> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree;
        let top = self.back.last_mut()?;
        let (handle, count) = *top;
        top.1 = count - 1;
        let node = tree.node(handle);
        let key = node.key(count - 1);

        if node.is_leaf() {
            while let Some(&(_, 0)) = self.back.last() {
                self.back.pop();
            }
        } else {
            self.descend_back(node.child(count - 1));
        }

        self.remaining -= 1;
        Some(key)
    }
}

impl ExactSizeIterator for RawIter<'_> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl FusedIterator for RawIter<'_> {}

impl RawKBTree {
    pub(crate) fn iter(&self) -> RawIter<'_> {
        RawIter::new(self)
    }
}
