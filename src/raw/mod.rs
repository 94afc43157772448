mod algebra;
mod arena;
mod delete;
mod handle;
mod insert;
mod iter;
mod node;
mod raw_kbtree;
mod search;
mod validate;

pub(crate) use handle::Handle;
pub(crate) use iter::RawIter;
pub(crate) use raw_kbtree::RawKBTree;
