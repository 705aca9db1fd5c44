//! # larimar
//!
//! A grammar-combinator interpreter with an incremental, lossless CST parser.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! parser    → Recursive-descent interpreter, incremental reparse
//!   ↓
//! syntax    → SyntaxTree / ParseNode read-only views
//!   ↓
//! grammar   → Combinators, DSL, compiled rule table, kinds
//!   ↓
//! base      → Primitives (TextRange, Cursor, Edit)
//! ```
//!
//! ## Example
//!
//! ```
//! use larimar::grammar::samples::larimar;
//! use larimar::{Edit, parse, reparse};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let grammar = larimar()?;
//! let old = parse(&grammar, "foo");
//! assert_eq!(old.tree().to_sexp(), "(source_file (identifier))");
//!
//! let edit = Edit::insert(0, "#");
//! let new_text = edit.apply("foo")?;
//! let new = reparse(&grammar, &old, "foo", &edit, &new_text);
//! assert_eq!(new.tree().to_sexp(), "(source_file (comment))");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → syntax → parser)
// ============================================================================

/// Foundation types: TextRange, Cursor, Edit
pub mod base;

/// Grammar model: combinators, DSL, compiled rule table
pub mod grammar;

/// Syntax: SyntaxTree and ParseNode views over rowan green trees
pub mod syntax;

/// Parser: interpreter, error recovery, incremental reparse
pub mod parser;

// Re-export commonly needed items
pub use base::{Cursor, Edit, EditError, Position, Span, TextRange, TextSize};
pub use grammar::{Grammar, GrammarDef, GrammarError, KindId, Pattern, Rule};
pub use parser::{
    Parse, ParseError, ParseOptions, ReparseOutcome, SyntaxError, parse, parse_many,
    parse_with_options, reparse,
};
pub use syntax::{ParseNode, SyntaxTree};
