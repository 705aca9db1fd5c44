//! Common source text and grammar fixtures for tests.

use larimar::Grammar;
use larimar::grammar::samples::larimar;
use once_cell::sync::Lazy;

/// The bundled larimar grammar, compiled once per test binary.
pub static LARIMAR: Lazy<Grammar> = Lazy::new(|| larimar().unwrap());

/// The larimar grammar in the textual notation.
pub const LARIMAR_DSL: &str = r##"
// A file is a run of comments and identifiers.
grammar larimar
extras [/\s+/]

source_file = repeat($._statement)
_statement = choice(comment, identifier)
comment = seq("#", /.*/)
identifier = /[a-zA-Z_][a-zA-Z0-9_]*/
"##;

/// Nested lists: exercises visible rules inside visible rules.
pub const LISTS_DSL: &str = r#"
grammar lists
source_file = repeat(_item)
_item = choice(list, atom, number)
list = seq("(", repeat(_item), ")")
atom = /[a-z]+/
number = /[0-9]+/
"#;

pub const MIXED_SOURCE: &str = "\
# header comment
alpha beta
# second
gamma_1
";

pub const MALFORMED_SOURCE: &str = "alpha 42 beta\n%% # tail";
