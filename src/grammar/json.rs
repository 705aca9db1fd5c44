//! tree-sitter `grammar.json` loading.
//!
//! Only the combinators this engine interprets are accepted; `PREC`,
//! `FIELD`, `ALIAS`, `TOKEN` and friends are reported as unsupported.
//! As in tree-sitter, the first rule is the entry rule.

use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

use super::compile::{Grammar, GrammarDef};
use super::error::GrammarError;
use super::rule::{self, Pattern, Rule};

/// Errors from loading a grammar.json document.
#[derive(Debug, Error)]
pub enum JsonGrammarError {
    /// The document is not valid JSON or has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A rule type this engine does not interpret.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The grammar does not compile.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

#[derive(Debug, Deserialize)]
struct JsonGrammar {
    name: SmolStr,
    rules: IndexMap<SmolStr, JsonRule>,
    #[serde(default)]
    extras: Option<Vec<JsonRule>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum JsonRule {
    Seq { members: Vec<JsonRule> },
    Choice { members: Vec<JsonRule> },
    Repeat { content: Box<JsonRule> },
    Repeat1 { content: Box<JsonRule> },
    String { value: SmolStr },
    Pattern { value: SmolStr },
    Symbol { name: SmolStr },
    Blank,
    #[serde(other)]
    Other,
}

impl JsonRule {
    fn into_rule(self, owner: &str) -> Result<Rule, JsonGrammarError> {
        let all = |members: Vec<JsonRule>| {
            members
                .into_iter()
                .map(|member| member.into_rule(owner))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(match self {
            JsonRule::Seq { members } => Rule::Seq(all(members)?),
            JsonRule::Choice { members } => Rule::Choice(all(members)?),
            JsonRule::Repeat { content } => rule::repeat(content.into_rule(owner)?),
            JsonRule::Repeat1 { content } => rule::repeat1(content.into_rule(owner)?),
            JsonRule::String { value } => Rule::Token(Pattern::Literal(value)),
            JsonRule::Pattern { value } => Rule::Token(Pattern::Regex(value)),
            JsonRule::Symbol { name } => Rule::Ref(name),
            JsonRule::Blank => Rule::Blank,
            JsonRule::Other => {
                return Err(JsonGrammarError::Unsupported(format!(
                    "rule type in `{owner}`"
                )));
            }
        })
    }
}

/// Read a grammar declaration from tree-sitter's `grammar.json` format.
pub fn parse_grammar_json(json: &str) -> Result<GrammarDef, JsonGrammarError> {
    let grammar: JsonGrammar = serde_json::from_str(json)?;

    let mut def = GrammarDef::new(grammar.name);
    if let Some((entry, _)) = grammar.rules.first() {
        def = def.entry(entry.clone());
    }
    if let Some(extras) = grammar.extras {
        let patterns = extras
            .into_iter()
            .map(|extra| match extra.into_rule("extras")? {
                Rule::Token(pattern) => Ok(pattern),
                _ => Err(JsonGrammarError::Unsupported(
                    "extras other than STRING or PATTERN".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        def = def.extras(patterns);
    }
    for (name, json_rule) in grammar.rules {
        let rule = json_rule.into_rule(&name)?;
        def.rules.push((name, rule));
    }
    Ok(def)
}

/// Read and compile a tree-sitter `grammar.json`.
pub fn compile_grammar_json(json: &str) -> Result<Grammar, JsonGrammarError> {
    Ok(parse_grammar_json(json)?.compile()?)
}
