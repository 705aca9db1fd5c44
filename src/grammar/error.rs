//! Error types for grammar compilation.

use smol_str::SmolStr;
use thiserror::Error;

/// Errors that make a grammar declaration unusable.
///
/// All of them are detected once, by [`compile`](super::compile), so the
/// parser can assume a well-formed rule table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A rule reference names a rule that is not declared.
    #[error("rule `{rule}` references unknown rule `{reference}`")]
    UnknownReference { rule: SmolStr, reference: SmolStr },

    /// A `choice` with no alternatives.
    #[error("rule `{rule}` contains a choice with no alternatives")]
    EmptyChoice { rule: SmolStr },

    /// A `seq` with no members.
    #[error("rule `{rule}` contains a sequence with no members")]
    EmptySequence { rule: SmolStr },

    /// The entry rule is not declared.
    #[error("entry rule `{entry}` is not declared")]
    NoEntryRule { entry: SmolStr },

    /// The entry rule is hidden and would produce no root node.
    #[error("entry rule `{entry}` cannot be hidden")]
    HiddenEntryRule { entry: SmolStr },

    /// The same rule name is declared twice.
    #[error("rule `{rule}` is declared more than once")]
    DuplicateRule { rule: SmolStr },

    /// A rule name that is not an identifier.
    #[error("`{rule}` is not a valid rule name")]
    InvalidRuleName { rule: SmolStr },

    /// A regex token that does not compile.
    #[error("invalid pattern /{pattern}/: {message}")]
    InvalidPattern { pattern: SmolStr, message: String },

    /// A rule that can reach itself without consuming input.
    #[error("rule `{rule}` is left-recursive")]
    LeftRecursion { rule: SmolStr },

    /// More distinct kinds than fit in a `u16`.
    #[error("grammar defines too many syntax kinds ({count})")]
    TooManyKinds { count: usize },
}
