//! Parenthesised text form of a tree, used to build fixtures and compare shapes.
//!
//! A node is a group holding its keys with child groups between them, so a two-level tree with
//! k = 3 reads `((1 2) 3 (4 5))`. [`render`] and [`parse`] are inverse to each other up to
//! whitespace.

mod lexer;
mod parser;
mod render;

pub use lexer::LexerSettings;
pub use parser::{ParseSettings, parse};
pub use render::render;

pub(crate) use render::Rendered;

#[cfg(test)]
pub(crate) use parser::parse_raw;
#[cfg(test)]
pub(crate) use render::render_raw;
