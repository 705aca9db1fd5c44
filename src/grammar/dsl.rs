//! Textual grammar notation
//!
//! A small surface syntax mirroring the combinator calls of a grammar.js
//! file, lexed with logos and parsed by recursive descent:
//!
//! ```text
//! // Comments run to the end of the line.
//! grammar larimar
//! extras [/\s+/]
//!
//! source_file = repeat(_statement)
//! _statement  = choice(comment, identifier)
//! comment     = seq("#", /.*/)
//! identifier  = /[a-zA-Z_][a-zA-Z0-9_]*/
//! ```
//!
//! The first rule is the entry rule unless an `entry <name>` directive says
//! otherwise. `$.name` is accepted as a rule reference for grammar.js
//! familiarity.

use logos::Logos;
use smol_str::SmolStr;
use thiserror::Error;

use super::compile::{Grammar, GrammarDef};
use super::error::GrammarError;
use super::rule::{self, Pattern, Rule};

/// Errors from reading the textual notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DslError {
    #[error("unrecognized input at byte {offset}")]
    Lex { offset: usize },

    #[error("expected {expected} at byte {offset}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("unknown combinator `{name}` at byte {offset}")]
    UnknownCombinator { name: String, offset: usize },

    #[error("`{name}` takes {expected} argument(s), got {found} at byte {offset}")]
    Arity {
        name: &'static str,
        expected: usize,
        found: usize,
        offset: usize,
    },

    #[error("invalid escape in string at byte {offset}")]
    BadEscape { offset: usize },

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Read a grammar declaration from the textual notation.
pub fn parse_grammar(source: &str) -> Result<GrammarDef, DslError> {
    let tokens = tokenize(source)?;
    let mut parser = DslParser {
        tokens: &tokens,
        pos: 0,
        source_len: source.len(),
    };
    parser.parse_file()
}

/// Read and compile a grammar from the textual notation.
pub fn compile_grammar(source: &str) -> Result<Grammar, DslError> {
    Ok(parse_grammar(source)?.compile()?)
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
enum DslToken {
    #[token("grammar")]
    GrammarKw,

    #[token("extras")]
    ExtrasKw,

    #[token("entry")]
    EntryKw,

    #[regex(r"[\p{XID_Start}_][\p{XID_Continue}]*")]
    Ident,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"/([^/\\\n]|\\.)+/")]
    Regex,

    /// Only appears as an argument to combinators we do not support, such
    /// as `prec(1, ...)`.
    #[regex("[0-9]+")]
    Integer,

    #[token("=")]
    Eq,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("$")]
    Dollar,

    #[token(".")]
    Dot,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: DslToken,
    text: &'a str,
    offset: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token<'_>>, DslError> {
    let mut lexer = DslToken::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let offset = lexer.span().start;
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                text: lexer.slice(),
                offset,
            }),
            Err(()) => return Err(DslError::Lex { offset }),
        }
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

struct DslParser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    source_len: usize,
}

impl<'a> DslParser<'a> {
    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: DslToken) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    fn nth_is(&self, n: usize, kind: DslToken) -> bool {
        self.tokens.get(self.pos + n).is_some_and(|t| t.kind == kind)
    }

    fn offset(&self) -> usize {
        self.current().map_or(self.source_len, |t| t.offset)
    }

    fn eat(&mut self, kind: DslToken) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: DslToken, expected: &'static str) -> Result<Token<'a>, DslError> {
        match self.current() {
            Some(token) if token.kind == kind => {
                let token = *token;
                self.pos += 1;
                Ok(token)
            }
            other => Err(DslError::Expected {
                expected,
                found: other.map_or_else(|| "end of input".to_string(), |t| format!("`{}`", t.text)),
                offset: self.offset(),
            }),
        }
    }

    /// File = (Directive | RuleDef)*
    fn parse_file(&mut self) -> Result<GrammarDef, DslError> {
        let mut name = SmolStr::new_static("grammar");
        let mut entry = None;
        let mut extras = None;
        let mut rules = Vec::new();

        while self.current().is_some() {
            if self.eat(DslToken::GrammarKw) {
                name = self.expect(DslToken::Ident, "grammar name")?.text.into();
            } else if self.eat(DslToken::EntryKw) {
                entry = Some(SmolStr::from(self.expect(DslToken::Ident, "entry rule name")?.text));
            } else if self.eat(DslToken::ExtrasKw) {
                extras = Some(self.parse_extras()?);
            } else {
                let rule_name = self.expect(DslToken::Ident, "rule name")?.text;
                self.expect(DslToken::Eq, "`=`")?;
                rules.push((SmolStr::from(rule_name), self.parse_expr()?));
            }
            self.eat(DslToken::Semicolon);
        }

        let mut def = GrammarDef::new(name);
        if let Some(entry) = entry.or_else(|| rules.first().map(|(name, _)| name.clone())) {
            def = def.entry(entry);
        }
        if let Some(extras) = extras {
            def = def.extras(extras);
        }
        def.rules = rules;
        Ok(def)
    }

    /// Extras = '[' (Pattern (',' Pattern)* ','?)? ']'
    fn parse_extras(&mut self) -> Result<Vec<Pattern>, DslError> {
        self.expect(DslToken::LBracket, "`[`")?;
        let mut patterns = Vec::new();
        while !self.at(DslToken::RBracket) {
            let offset = self.offset();
            match self.parse_expr()? {
                Rule::Token(pattern) => patterns.push(pattern),
                _ => {
                    return Err(DslError::Expected {
                        expected: "string or regex",
                        found: "rule expression".to_string(),
                        offset,
                    });
                }
            }
            if !self.eat(DslToken::Comma) {
                break;
            }
        }
        self.expect(DslToken::RBracket, "`]`")?;
        Ok(patterns)
    }

    /// Expr = String | Regex | Ref | Call
    fn parse_expr(&mut self) -> Result<Rule, DslError> {
        let offset = self.offset();
        let Some(token) = self.current().copied() else {
            return Err(DslError::Expected {
                expected: "expression",
                found: "end of input".to_string(),
                offset,
            });
        };

        match token.kind {
            DslToken::String => {
                self.pos += 1;
                Ok(rule::literal(unescape(token.text, token.offset)?))
            }
            DslToken::Regex => {
                self.pos += 1;
                Ok(rule::pattern(&token.text[1..token.text.len() - 1]))
            }
            DslToken::Dollar => {
                self.pos += 1;
                self.expect(DslToken::Dot, "`.`")?;
                Ok(rule::sym(self.expect(DslToken::Ident, "rule name")?.text))
            }
            DslToken::Ident if self.nth_is(1, DslToken::LParen) => self.parse_call(),
            DslToken::Ident => {
                self.pos += 1;
                Ok(rule::sym(token.text))
            }
            _ => Err(DslError::Expected {
                expected: "expression",
                found: format!("`{}`", token.text),
                offset,
            }),
        }
    }

    /// Call = Ident '(' (Expr (',' Expr)* ','?)? ')'
    fn parse_call(&mut self) -> Result<Rule, DslError> {
        let name_token = self.expect(DslToken::Ident, "combinator")?;
        if !COMBINATORS.contains(&name_token.text) {
            return Err(DslError::UnknownCombinator {
                name: name_token.text.to_string(),
                offset: name_token.offset,
            });
        }
        self.expect(DslToken::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.at(DslToken::RParen) {
            args.push(self.parse_expr()?);
            if !self.eat(DslToken::Comma) {
                break;
            }
        }
        self.expect(DslToken::RParen, "`)`")?;

        let offset = name_token.offset;
        let single = |name: &'static str, mut args: Vec<Rule>| match args.len() {
            1 => Ok(args.remove(0)),
            found => Err(DslError::Arity {
                name,
                expected: 1,
                found,
                offset,
            }),
        };

        match name_token.text {
            "seq" => Ok(rule::seq(args)),
            "choice" => Ok(rule::choice(args)),
            "repeat" => single("repeat", args).map(rule::repeat),
            "repeat1" => single("repeat1", args).map(rule::repeat1),
            "optional" => single("optional", args).map(rule::optional),
            "blank" if args.is_empty() => Ok(rule::blank()),
            "blank" => Err(DslError::Arity {
                name: "blank",
                expected: 0,
                found: args.len(),
                offset,
            }),
            other => Err(DslError::UnknownCombinator {
                name: other.to_string(),
                offset,
            }),
        }
    }
}

const COMBINATORS: [&str; 6] = ["seq", "choice", "repeat", "repeat1", "optional", "blank"];

/// Strip quotes and resolve `\n`, `\t`, `\r`, `\\`, `\"` and `\0`.
fn unescape(quoted: &str, offset: usize) -> Result<String, DslError> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            _ => return Err(DslError::BadEscape { offset }),
        });
    }
    Ok(out)
}
