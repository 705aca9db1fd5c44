//! Declarative rule expressions.
//!
//! These are the uncompiled building blocks of a grammar, mirroring the
//! combinator calls of a grammar.js file:
//!
//! ```text
//! source_file = repeat(_statement)
//! _statement  = choice(comment, identifier)
//! comment     = seq("#", /.*/)
//! identifier  = /[a-zA-Z_][a-zA-Z0-9_]*/
//! ```

use smol_str::SmolStr;

/// A token pattern: either an exact string or a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    Literal(SmolStr),
    Regex(SmolStr),
}

impl Pattern {
    /// Display name used for anonymous token kinds: `#` for literals,
    /// `/.../` for regexes.
    pub fn kind_name(&self) -> SmolStr {
        match self {
            Pattern::Literal(text) => text.clone(),
            Pattern::Regex(source) => SmolStr::from(format!("/{source}/")),
        }
    }
}

/// One combinator expression.
///
/// Rules never contain themselves by value; recursion goes through
/// [`Rule::Ref`] and is resolved against the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    Repeat(Box<Rule>),
    Token(Pattern),
    Ref(SmolStr),
    /// Matches the empty string.
    Blank,
}

pub fn seq(members: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(members.into_iter().collect())
}

pub fn choice(members: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(members.into_iter().collect())
}

pub fn repeat(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

/// One or more: `seq(rule, repeat(rule))`.
pub fn repeat1(rule: Rule) -> Rule {
    seq([rule.clone(), repeat(rule)])
}

/// Zero or one: `choice(rule, blank())`.
pub fn optional(rule: Rule) -> Rule {
    choice([rule, blank()])
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn literal(text: impl Into<SmolStr>) -> Rule {
    Rule::Token(Pattern::Literal(text.into()))
}

pub fn pattern(source: impl Into<SmolStr>) -> Rule {
    Rule::Token(Pattern::Regex(source.into()))
}

/// Reference to a named rule.
pub fn sym(name: impl Into<SmolStr>) -> Rule {
    Rule::Ref(name.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat1_desugars_to_seq() {
        assert_eq!(
            repeat1(sym("a")),
            Rule::Seq(vec![sym("a"), Rule::Repeat(Box::new(sym("a")))])
        );
    }

    #[test]
    fn test_optional_desugars_to_choice() {
        assert_eq!(optional(literal("x")), Rule::Choice(vec![literal("x"), Rule::Blank]));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Pattern::Literal("#".into()).kind_name(), "#");
        assert_eq!(Pattern::Regex(".*".into()).kind_name(), "/.*/");
    }
}
