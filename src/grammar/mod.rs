//! Grammar model: declarative rules compiled into an immutable rule table
//!
//! ## Pipeline
//!
//! ```text
//! GrammarDef (combinators, DSL text, or grammar.json)
//!     ↓ compile (validation, kind interning, left-recursion check)
//! Grammar (rule table + KindTable, Send + Sync)
//!     ↓
//! parser::parse / parser::reparse
//! ```
//!
//! Rules refer to each other by name; references are resolved against the
//! table, so recursive grammars need no recursive data structures.

mod compile;
pub mod dsl;
mod error;
#[cfg(feature = "json")]
pub mod json;
mod kinds;
mod matcher;
mod rule;
pub mod samples;

pub(crate) use compile::Expr;
pub use compile::{DEFAULT_ENTRY, DEFAULT_EXTRA, Grammar, GrammarDef, RuleId, compile};
pub use dsl::{DslError, compile_grammar, parse_grammar};
pub use error::GrammarError;
pub use kinds::{
    GrammarLanguage, GreenElement, KindClass, KindId, KindInfo, KindTable, SyntaxElement,
    SyntaxNode, SyntaxToken,
};
pub use matcher::{Matcher, RegexMatcher, Scan};
pub use rule::{
    Pattern, Rule, blank, choice, literal, optional, pattern, repeat, repeat1, seq, sym,
};
