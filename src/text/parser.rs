use alloc::vec::Vec;

use super::lexer::{Lexer, LexerSettings, Spanned, Token};
use crate::{KBTree, Key};
use crate::config::Config;
use crate::error::{ParseErrorKind, Result};
use crate::raw::{Handle, RawKBTree};

/// Options for [`parse`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ParseSettings {
    /// Branching factor `k` of the tree being built.
    pub branching_factor: usize,
    /// Tokenizer switches.
    pub lexer: LexerSettings,
    /// Reject a node holding more than `k` keys.
    pub enforce_node_size: bool,
    /// Reject keys that do not strictly increase within a node.
    pub enforce_key_order: bool,
    /// Run [`KBTree::validate`] on the result.
    pub validate_invariants: bool,
}

impl ParseSettings {
    /// Enforces every local rule; global invariants are not checked.
    #[must_use]
    pub const fn new(branching_factor: usize) -> Self {
        Self {
            branching_factor,
            lexer: LexerSettings::new(),
            enforce_node_size: true,
            enforce_key_order: true,
            validate_invariants: false,
        }
    }
}

/// Builds a tree from its parenthesised text form.
///
/// The tokens are read as the content of an implicit root. When that content is a single group,
/// the group itself is the root, so `((1) 2 (3))` and `(1) 2 (3)` describe the same tree. Empty
/// input and `()` give the empty tree.
///
/// Nothing is rebalanced; subtree sizes and parent links are filled in as the text is read.
///
/// # Errors
///
/// [`Error::Serialization`](crate::Error::Serialization) for malformed input,
/// [`Error::InvalidBranchingFactor`](crate::Error::InvalidBranchingFactor) for `k < 3`,
/// [`Error::InvariantViolation`](crate::Error::InvariantViolation) when
/// [`ParseSettings::validate_invariants`] is set and the tree is not a valid B-tree.
///
/// # Examples
///
/// ```
/// use kbtree::text::{ParseSettings, parse};
///
/// let tree = parse("((1 2) 3 (4 5))", &ParseSettings::new(3))?;
/// assert_eq!(tree.len(), 5);
/// assert_eq!(tree.to_string(), "((1 2) 3 (4 5))");
/// # Ok::<(), kbtree::Error>(())
/// ```
pub fn parse(input: &str, settings: &ParseSettings) -> Result<KBTree> {
    parse_raw(input, settings).map(KBTree::from_raw)
}

pub(crate) fn parse_raw(input: &str, settings: &ParseSettings) -> Result<RawKBTree> {
    let mut tree = RawKBTree::new(Config::new(settings.branching_factor))?;
    let result = Parser::new(&mut tree, settings).run(input);
    if let Err(err) = &result {
        log::debug!("rejected serialized tree: {err}");
    }
    result?;

    if settings.validate_invariants {
        tree.validate()?;
    }
    Ok(tree)
}

struct Parser<'a> {
    tree: &'a mut RawKBTree,
    settings: &'a ParseSettings,
    // Open groups; the bottom entry is the implicit root.
    stack: Vec<Handle>,
    // Offset of a top-level `()`, legal only as the entire input.
    empty_group: Option<usize>,
}

impl<'a> Parser<'a> {
    fn new(tree: &'a mut RawKBTree, settings: &'a ParseSettings) -> Self {
        Self {
            tree,
            settings,
            stack: Vec::new(),
            empty_group: None,
        }
    }

    fn run(mut self, input: &str) -> Result<()> {
        let top = self.tree.new_node(true)?;
        self.stack.push(top);

        for spanned in Lexer::new(input, self.settings.lexer) {
            let Spanned { offset, token } = spanned?;
            match token {
                Token::Open => self.open(offset)?,
                Token::Close => self.close(offset)?,
                Token::Number(key) => self.key(key, offset)?,
            }
        }

        if self.stack.len() > 1 {
            return Err(ParseErrorKind::UnclosedGroup.at(input.len()).into());
        }
        self.finish(top, input.len())?;

        // Unwrap the implicit root when the text was one group, or nothing at all.
        let node = self.tree.node(top);
        let root = match (node.key_count(), node.child_count()) {
            (0, 0) => None,
            (0, 1) => Some(node.first_child()),
            _ => {
                if let Some(offset) = self.empty_group {
                    return Err(ParseErrorKind::EmptyGroup.at(offset).into());
                }
                self.tree.set_root(Some(top));
                return Ok(());
            }
        };
        self.tree.release_node(top);
        let root = match root {
            Some(handle) if self.tree.node(handle).key_count() == 0 => {
                self.tree.release_node(handle);
                None
            }
            other => other,
        };
        self.tree.set_root(root);
        Ok(())
    }

    fn current(&self) -> Handle {
        self.stack[self.stack.len() - 1]
    }

    fn open(&mut self, offset: usize) -> Result<()> {
        let parent = self.current();
        let node = self.tree.node(parent);
        if node.is_leaf() {
            if node.key_count() > 0 {
                return Err(ParseErrorKind::MissingChild.at(offset).into());
            }
            self.tree.node_mut(parent).set_leaf(false);
        } else if node.child_count() == node.key_count() + 1 {
            return Err(ParseErrorKind::AdjacentGroups.at(offset).into());
        }

        let child = self.tree.new_node(true)?;
        self.tree.attach_child(parent, child);
        self.stack.push(child);
        Ok(())
    }

    fn close(&mut self, offset: usize) -> Result<()> {
        if self.stack.len() == 1 {
            return Err(ParseErrorKind::UnmatchedClose.at(offset).into());
        }
        let Some(child) = self.stack.pop() else {
            unreachable!("`Parser::close()` - the implicit root is never popped!");
        };
        self.finish(child, offset)?;

        if self.tree.node(child).key_count() == 0 {
            if self.stack.len() > 1 {
                return Err(ParseErrorKind::EmptyGroup.at(offset).into());
            }
            self.empty_group = Some(offset);
        }

        let parent = self.current();
        let size = self.tree.node(child).size();
        self.tree.node_mut(parent).grow(size);
        Ok(())
    }

    fn key(&mut self, key: Key, offset: usize) -> Result<()> {
        let handle = self.current();
        let node = self.tree.node(handle);
        if !node.is_leaf() && node.child_count() != node.key_count() + 1 {
            return Err(ParseErrorKind::MissingChild.at(offset).into());
        }
        if self.settings.enforce_node_size && node.key_count() >= self.settings.branching_factor {
            return Err(ParseErrorKind::OversizedNode.at(offset).into());
        }
        if self.settings.enforce_key_order && node.key_count() > 0 && key <= node.last_key() {
            return Err(ParseErrorKind::KeyOrder.at(offset).into());
        }

        let node = self.tree.node_mut(handle);
        node.push_back_key(key);
        node.grow(1);
        Ok(())
    }

    /// Checks that a group closing at `offset` is a well-formed node.
    fn finish(&self, handle: Handle, offset: usize) -> Result<()> {
        let node = self.tree.node(handle);
        if node.is_leaf() {
            return Ok(());
        }
        if node.child_count() != node.key_count() + 1 {
            return Err(ParseErrorKind::MissingChild.at(offset).into());
        }
        if node.key_count() == 0 && handle != self.stack[0] {
            return Err(ParseErrorKind::EmptyInternal.at(offset).into());
        }
        Ok(())
    }
}
