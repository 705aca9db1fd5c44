//! Bundled sample grammars.

use super::compile::{Grammar, GrammarDef};
use super::error::GrammarError;
use super::rule::{choice, literal, pattern, repeat, seq, sym};

/// The larimar grammar: a file is a run of `# comments` and identifiers.
pub fn larimar_def() -> GrammarDef {
    GrammarDef::new("larimar")
        .rule("source_file", repeat(sym("_statement")))
        .rule("_statement", choice([sym("comment"), sym("identifier")]))
        .rule("comment", seq([literal("#"), pattern(".*")]))
        .rule("identifier", pattern("[a-zA-Z_][a-zA-Z0-9_]*"))
}

/// Compiled [`larimar_def`].
pub fn larimar() -> Result<Grammar, GrammarError> {
    larimar_def().compile()
}
