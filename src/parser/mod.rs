//! Grammar-driven incremental parser
//!
//! This module interprets a compiled [`Grammar`](crate::grammar::Grammar)
//! and produces a lossless CST using **rowan** green trees.
//!
//! ## Architecture
//!
//! ```text
//! Source Text + Grammar
//!     ↓
//! Parser (recursive descent over combinators, ordered choice, backtracking)
//!     ↓
//! GreenNode tree (immutable, cheap to clone)
//!     ↓
//! SyntaxTree / ParseNode → read-only view with kinds and byte ranges
//! ```
//!
//! ## Incremental Reparsing
//!
//! When text changes, we:
//! 1. Find the smallest rule-produced subtree containing the change
//! 2. Reparse only that subtree's rule, provided nothing read before the
//!    rule started looked at the changed bytes
//! 3. Reuse unchanged green nodes (they're immutable and cheap to share)

mod lookahead;
#[allow(clippy::module_inception)]
mod parser;
mod reparse;

pub use parser::{
    MAX_TEXT_LEN, Parse, ParseError, ParseOptions, RuleMatch, SyntaxError, parse, parse_many,
    parse_rule, parse_with_options,
};
pub use reparse::{ReparseOutcome, reparse, reparse_with_outcome};

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange, TextSize};
