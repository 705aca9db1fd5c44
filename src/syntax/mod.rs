//! Syntax trees produced by the parser.

mod tree;

pub use tree::{ParseNode, SyntaxTree};

#[cfg(test)]
mod tests;
