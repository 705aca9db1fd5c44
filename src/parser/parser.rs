//! Recursive descent grammar interpreter
//!
//! Walks a compiled [`Grammar`] against the input and builds a rowan green
//! tree. Backtracking is explicit: every evaluation step returns whether it
//! matched, and a failed step restores the cursor and drops whatever it
//! emitted. Unmatched input becomes `ERROR` leaves, so parsing never fails
//! unless the caller imposes limits through [`ParseOptions`].

use std::convert::Infallible;

use rayon::prelude::*;
use rowan::{GreenNode, GreenToken, NodeOrToken, TextRange, TextSize};
use thiserror::Error;

use super::lookahead::Lookahead;
use crate::base::{Cursor, Position};
use crate::grammar::{Expr, Grammar, GreenElement, KindId, Matcher, RuleId};
use crate::syntax::SyntaxTree;

/// Longest input a tree can hold; rowan offsets are `u32`.
pub const MAX_TEXT_LEN: usize = u32::MAX as usize;

/// Parse result containing the tree and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    tree: SyntaxTree,
    errors: Vec<SyntaxError>,
    lookahead: Lookahead,
}

impl Parse {
    pub(crate) fn new(tree: SyntaxTree, errors: Vec<SyntaxError>, lookahead: Lookahead) -> Self {
        Self {
            tree,
            errors,
            lookahead,
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn into_tree(self) -> SyntaxTree {
        self.tree
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Get the root syntax node
    pub fn syntax(&self) -> crate::grammar::SyntaxNode {
        self.tree.syntax()
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The tree contains at least one error region.
    pub fn is_partial(&self) -> bool {
        !self.ok()
    }

    pub(crate) fn lookahead(&self) -> &Lookahead {
        &self.lookahead
    }
}

/// A region of input no rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
    /// Line and column of the start of `range`.
    pub position: Position,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange, position: Position) -> Self {
        Self {
            message: message.into(),
            range,
            position,
        }
    }
}

/// Caller-imposed resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Maximum nesting of rule invocations.
    pub max_depth: Option<usize>,
    /// Maximum input length in bytes. Never more than [`MAX_TEXT_LEN`].
    pub max_input_len: Option<usize>,
}

impl ParseOptions {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = Some(len);
        self
    }
}

/// A parse aborted by a limit from [`ParseOptions`]. No tree is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("rule nesting exceeded the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("input of {len} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { len: usize, limit: usize },
}

/// Checks run as evaluation enters each rule.
trait Limits {
    type Abort;

    fn enter_rule(&self, depth: usize) -> Result<(), Self::Abort>;
}

/// Evaluation that cannot abort.
struct Unlimited;

impl Limits for Unlimited {
    type Abort = Infallible;

    fn enter_rule(&self, _depth: usize) -> Result<(), Infallible> {
        Ok(())
    }
}

impl Limits for ParseOptions {
    type Abort = ParseError;

    fn enter_rule(&self, depth: usize) -> Result<(), ParseError> {
        match self.max_depth {
            Some(limit) if depth > limit => Err(ParseError::DepthExceeded { limit }),
            _ => Ok(()),
        }
    }
}

/// Parse `text` with `grammar`. Always produces a tree covering the input.
///
/// # Panics
///
/// If `text` is longer than [`MAX_TEXT_LEN`], which no tree can hold.
/// [`parse_with_options`] reports that as [`ParseError::InputTooLarge`].
pub fn parse(grammar: &Grammar, text: &str) -> Parse {
    let mut parser = Parser::new(grammar, text, Unlimited, Cursor::start());
    let Ok(green) = parser.parse_source_file();
    parser.finish(green)
}

/// Parse with resource limits.
pub fn parse_with_options(
    grammar: &Grammar,
    text: &str,
    options: ParseOptions,
) -> Result<Parse, ParseError> {
    let limit = options
        .max_input_len
        .map_or(MAX_TEXT_LEN, |limit| limit.min(MAX_TEXT_LEN));
    if text.len() > limit {
        return Err(ParseError::InputTooLarge {
            len: text.len(),
            limit,
        });
    }
    let mut parser = Parser::new(grammar, text, options, Cursor::start());
    let green = parser.parse_source_file()?;
    Ok(parser.finish(green))
}

/// Parse many independent documents in parallel.
pub fn parse_many<S>(grammar: &Grammar, texts: &[S]) -> Vec<Parse>
where
    S: AsRef<str> + Sync,
{
    texts
        .par_iter()
        .map(|text| parse(grammar, text.as_ref()))
        .collect()
}

/// Output of evaluating a single rule.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    /// Emitted elements: one node or leaf for a visible rule, spliced
    /// children for a hidden one, possibly preceded by extras.
    pub elements: Vec<GreenElement>,
    /// Byte offset where the match ended.
    pub end: usize,
    /// Exclusive end of the bytes examined on the way.
    pub(crate) reach: usize,
    pub(crate) lookahead: Lookahead,
}

/// Evaluate the named rule at `offset`. `None` if the rule is unknown or
/// does not match there.
pub fn parse_rule(grammar: &Grammar, rule: &str, text: &str, offset: usize) -> Option<RuleMatch> {
    let rule = grammar.rule_id(rule)?;
    match_rule_at(grammar, rule, text, offset)
}

pub(crate) fn match_rule_at(
    grammar: &Grammar,
    rule: RuleId,
    text: &str,
    offset: usize,
) -> Option<RuleMatch> {
    if !text.is_char_boundary(offset) {
        return None;
    }
    let mut parser = Parser::new(grammar, text, Unlimited, Cursor::at(text, offset));
    let mut elements = Vec::new();
    let Ok(matched) = parser.eval_rule(rule, &mut elements);
    if !matched {
        return None;
    }
    Some(RuleMatch {
        elements,
        end: parser.cursor.offset,
        reach: parser.reach,
        lookahead: parser.lookahead,
    })
}

/// The parser state
struct Parser<'g, 't, L> {
    grammar: &'g Grammar,
    text: &'t str,
    cursor: Cursor,
    depth: usize,
    limits: L,
    errors: Vec<SyntaxError>,
    /// Exclusive end of every byte examined so far, backtracking included.
    reach: usize,
    lookahead: Lookahead,
}

/// Result of one evaluation step: matched or not, or aborted by a limit.
type Step<E> = Result<bool, E>;

impl<'g, 't, L: Limits> Parser<'g, 't, L> {
    fn new(grammar: &'g Grammar, text: &'t str, limits: L, cursor: Cursor) -> Self {
        Self {
            grammar,
            text,
            cursor,
            depth: 0,
            limits,
            errors: Vec::new(),
            reach: 0,
            lookahead: Lookahead::default(),
        }
    }

    fn finish(self, green: GreenNode) -> Parse {
        debug_assert_eq!(usize::from(green.text_len()), self.text.len());
        Parse::new(
            SyntaxTree::new(green, self.grammar.kinds().clone()),
            self.errors,
            self.lookahead,
        )
    }

    fn at_eof(&self) -> bool {
        self.cursor.offset >= self.text.len()
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    /// Run `matcher` at the cursor, extending the reach.
    fn scan(&mut self, matcher: &Matcher) -> Option<usize> {
        let scan = matcher.scan(self.text, self.cursor.offset);
        self.reach = self.reach.max(scan.reach);
        scan.len
    }

    fn bump(&mut self, kind: KindId, len: usize, out: &mut Vec<GreenElement>) {
        let start = self.cursor.offset;
        let text = &self.text[start..start + len];
        out.push(NodeOrToken::Token(GreenToken::new(kind.into(), text)));
        self.cursor.advance(text);
    }

    /// Consume any run of extras as trivia leaves.
    fn skip_extras(&mut self, out: &mut Vec<GreenElement>) {
        let grammar = self.grammar;
        'outer: while !self.at_eof() {
            for extra in grammar.extras() {
                if let Some(len) = self.scan(&extra.matcher) {
                    if len > 0 {
                        self.bump(extra.kind, len, out);
                        continue 'outer;
                    }
                }
            }
            break;
        }
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate `expr`. On no-match the cursor and `out` are left exactly as
    /// they were.
    fn eval(&mut self, expr: &Expr, out: &mut Vec<GreenElement>) -> Step<L::Abort> {
        let saved = self.cursor;
        let mark = out.len();
        let matched = self.eval_inner(expr, out)?;
        if !matched {
            self.cursor = saved;
            out.truncate(mark);
        }
        Ok(matched)
    }

    fn eval_inner(&mut self, expr: &Expr, out: &mut Vec<GreenElement>) -> Step<L::Abort> {
        match expr {
            Expr::Token { matcher, kind } => {
                self.skip_extras(out);
                match self.scan(matcher) {
                    Some(len) => {
                        self.bump(*kind, len, out);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            Expr::Seq(members) => {
                for member in members {
                    if !self.eval(member, out)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Choice(alternatives) => {
                for alternative in alternatives {
                    if self.eval(alternative, out)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::Repeat(inner) => {
                loop {
                    let saved = self.cursor;
                    let mark = out.len();
                    if !self.eval(inner, out)? {
                        break;
                    }
                    // Zero-progress iterations would loop forever.
                    if self.cursor.offset == saved.offset {
                        self.cursor = saved;
                        out.truncate(mark);
                        break;
                    }
                }
                Ok(true)
            }
            Expr::Rule(rule) => self.eval_rule(*rule, out),
            Expr::Blank => Ok(true),
        }
    }

    /// Evaluate a named rule. Visible rules wrap their output in a node of
    /// the rule's kind (or a single leaf when the body is one token); hidden
    /// rules splice their output into the caller's.
    fn eval_rule(&mut self, rule_id: RuleId, out: &mut Vec<GreenElement>) -> Step<L::Abort> {
        self.depth += 1;
        self.limits.enter_rule(self.depth)?;
        let grammar = self.grammar;
        let rule = grammar.rule(rule_id);

        let before = self.reach;
        let saved = self.cursor;
        let mark = out.len();
        let matched = if rule.hidden {
            self.eval(&rule.body, out)?
        } else {
            self.skip_extras(out);
            let start = self.cursor.offset;
            let matched = if let Some(matcher) = rule.leaf_matcher() {
                match self.scan(matcher) {
                    Some(len) => {
                        self.bump(rule.kind, len, out);
                        true
                    }
                    None => false,
                }
            } else {
                let mut children = Vec::new();
                let matched = self.eval(&rule.body, &mut children)?;
                if matched {
                    out.push(NodeOrToken::Node(GreenNode::new(rule.kind.into(), children)));
                }
                matched
            };
            if matched {
                self.lookahead.record(start, rule.kind, before);
            }
            matched
        };
        if !matched {
            self.cursor = saved;
            out.truncate(mark);
        }

        self.depth -= 1;
        Ok(matched)
    }

    // =========================================================================
    // Top level
    // =========================================================================

    /// SourceFile = entry-body (extras | ERROR | entry-body)*
    ///
    /// The entry rule's body is evaluated repeatedly; between attempts extras
    /// are consumed and input nothing matches is collected into `ERROR`
    /// leaves, one char at a time, until the body can make progress again.
    fn parse_source_file(&mut self) -> Result<GreenNode, L::Abort> {
        let grammar = self.grammar;
        let entry = grammar.rule(grammar.entry());
        let mut children = Vec::new();
        let mut error_start: Option<Cursor> = None;

        loop {
            let start = self.cursor.offset;
            let mut attempt = Vec::new();
            self.depth += 1;
            self.eval(&entry.body, &mut attempt)?;
            self.depth -= 1;

            if self.cursor.offset > start || self.at_eof() {
                self.flush_error(&mut error_start, start, &mut children);
                children.append(&mut attempt);
                if self.at_eof() {
                    break;
                }
                continue;
            }

            // No progress: discard zero-width output and try extras.
            let mut trivia = Vec::new();
            self.skip_extras(&mut trivia);
            if !trivia.is_empty() {
                self.flush_error(&mut error_start, start, &mut children);
                children.append(&mut trivia);
                continue;
            }

            error_start.get_or_insert(self.cursor);
            let width = self.text[start..].chars().next().map_or(1, char::len_utf8);
            let skipped = &self.text[start..start + width];
            self.cursor.advance(skipped);
        }

        Ok(GreenNode::new(entry.kind.into(), children))
    }

    /// Close the pending error region at `end` as one `ERROR` leaf.
    fn flush_error(
        &mut self,
        error_start: &mut Option<Cursor>,
        end: usize,
        children: &mut Vec<GreenElement>,
    ) {
        let Some(start) = error_start.take() else {
            return;
        };
        let text = &self.text[start.offset..end];
        let range = TextRange::new(text_size(start.offset), text_size(end));
        tracing::trace!(?range, text, "unmatched input");
        children.push(NodeOrToken::Token(GreenToken::new(KindId::ERROR.into(), text)));
        self.errors.push(SyntaxError::new(
            format!("unexpected input {text:?}"),
            range,
            start.position(),
        ));
    }
}

/// Offsets past [`MAX_TEXT_LEN`] saturate; rowan rejects such text first.
fn text_size(offset: usize) -> TextSize {
    TextSize::try_from(offset).unwrap_or(TextSize::from(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarDef, blank, choice, literal, pattern, repeat, samples, seq, sym};

    fn larimar() -> Grammar {
        samples::larimar().unwrap()
    }

    #[test]
    fn test_parse_empty() {
        let parse = parse(&larimar(), "");
        assert!(parse.ok());
        assert_eq!(parse.tree().to_sexp(), "(source_file)");
    }

    #[test]
    fn test_parse_identifier() {
        let parse = parse(&larimar(), "foo");
        assert!(parse.ok(), "errors: {:?}", parse.errors());
        assert_eq!(parse.tree().to_sexp(), "(source_file (identifier))");
    }

    #[test]
    fn test_leading_extras_stay_outside_nodes() {
        let parse = parse(&larimar(), "  foo");
        let root = parse.tree().root();
        let ident = root.named_children().next().unwrap();
        assert_eq!((ident.start(), ident.end()), (2, 5));
    }

    #[test]
    fn test_trailing_extras_are_covered() {
        let parse = parse(&larimar(), "foo \n");
        assert!(parse.ok());
        assert_eq!(parse.tree().text(), "foo \n");
        let kinds: Vec<_> = parse.tree().root().children().map(|c| c.kind().to_string()).collect();
        assert_eq!(kinds, ["identifier", "/\\s+/"]);
    }

    #[test]
    fn test_whitespace_run_is_one_trivia_leaf() {
        let parse = parse(&larimar(), "foo \t\n  bar");
        let leaves: Vec<_> = parse.tree().leaves().map(|leaf| (leaf.start(), leaf.end())).collect();
        assert_eq!(leaves, [(0, 3), (3, 9), (9, 12)]);
    }

    #[test]
    fn test_error_region_is_merged() {
        let parse = parse(&larimar(), "123abc");
        assert!(parse.is_partial());
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].range, TextRange::new(0.into(), 3.into()));
        assert_eq!(parse.tree().to_sexp(), "(source_file (ERROR) (identifier))");
    }

    #[test]
    fn test_error_region_stops_at_extras() {
        let parse = parse(&larimar(), "1 2");
        assert_eq!(parse.errors().len(), 2);
        assert_eq!(parse.errors()[1].position, Position::new(0, 2));
        let ranges: Vec<_> = parse.errors().iter().map(|err| err.range).collect();
        assert_eq!(
            ranges,
            [TextRange::new(0.into(), 1.into()), TextRange::new(2.into(), 3.into())]
        );
    }

    #[test]
    fn test_error_leaf_ends_where_recovery_resumes() {
        for text in ["123abc", "1 2", "12 ab\n%# c", "%%%"] {
            let parse = parse(&larimar(), text);
            assert_eq!(parse.tree().text(), text);
            let error = parse.tree().leaves().find(|leaf| leaf.is_error()).unwrap();
            assert_eq!(error.start(), 0);
        }
        let parse = parse(&larimar(), "123abc");
        let leaves: Vec<_> = parse.tree().leaves().map(|leaf| (leaf.start(), leaf.end())).collect();
        assert_eq!(leaves, [(0, 3), (3, 6)]);
    }

    #[test]
    fn test_error_position_tracks_lines() {
        let parse = parse(&larimar(), "foo\n  %");
        assert_eq!(parse.errors()[0].position, Position::new(1, 2));
    }

    #[test]
    fn test_multibyte_error() {
        let parse = parse(&larimar(), "é");
        assert_eq!(parse.tree().text(), "é");
        assert_eq!(parse.errors()[0].range.len(), TextSize::from(2));
    }

    #[test]
    fn test_sequence_backtracks_fully() {
        let grammar = GrammarDef::new("g")
            .rule(
                "source_file",
                repeat(choice([seq([literal("a"), literal("b")]), sym("a_only")])),
            )
            .rule("a_only", seq([literal("a"), literal("c")]))
            .compile()
            .unwrap();
        let parse = parse(&grammar, "acab");
        assert!(parse.ok(), "errors: {:?}", parse.errors());
        assert_eq!(parse.tree().to_sexp(), "(source_file (a_only))");
    }

    #[test]
    fn test_ordered_choice_takes_first_match() {
        let grammar = GrammarDef::new("g")
            .rule("source_file", repeat(choice([sym("short"), sym("long")])))
            .rule("short", literal("a"))
            .rule("long", literal("aa"))
            .compile()
            .unwrap();
        let parse = parse(&grammar, "aa");
        assert_eq!(parse.tree().to_sexp(), "(source_file (short) (short))");
    }

    #[test]
    fn test_repeat_over_nullable_terminates() {
        let grammar = GrammarDef::new("g")
            .rule("source_file", repeat(choice([literal("x"), blank()])))
            .compile()
            .unwrap();
        let parse = parse(&grammar, "xxy");
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.tree().root().children().count(), 3);
    }

    #[test]
    fn test_nested_visible_rules() {
        let grammar = GrammarDef::new("g")
            .rule("source_file", repeat(sym("list")))
            .rule("list", seq([literal("("), repeat(sym("item")), literal(")")]))
            .rule("item", choice([sym("list"), pattern("[a-z]+")]))
            .compile()
            .unwrap();
        let parse = parse(&grammar, "(a (b c))");
        assert!(parse.ok(), "errors: {:?}", parse.errors());
        assert_eq!(
            parse.tree().to_sexp(),
            "(source_file (list (item) (item (list (item) (item)))))"
        );
    }

    #[test]
    fn test_depth_limit() {
        let grammar = GrammarDef::new("g")
            .rule("source_file", sym("nest"))
            .rule("nest", choice([seq([literal("("), sym("nest"), literal(")")]), blank()]))
            .compile()
            .unwrap();
        let text = "((((()))))";
        assert!(parse_with_options(&grammar, text, ParseOptions::default().with_max_depth(16)).is_ok());
        assert_eq!(
            parse_with_options(&grammar, text, ParseOptions::default().with_max_depth(4)).unwrap_err(),
            ParseError::DepthExceeded { limit: 4 }
        );
    }

    #[test]
    fn test_unlimited_parse_allows_deep_nesting() {
        let grammar = GrammarDef::new("g")
            .rule("source_file", sym("nest"))
            .rule("nest", choice([seq([literal("("), sym("nest"), literal(")")]), blank()]))
            .compile()
            .unwrap();
        let text = format!("{}{}", "(".repeat(200), ")".repeat(200));
        let parse = parse(&grammar, &text);
        assert!(parse.ok());
        assert_eq!(parse.tree().text(), text);
    }

    #[test]
    fn test_lookahead_records_failed_alternatives() {
        // `let` reads up to the `x` before failing, so `ident` at 0 is only
        // entered after the parser has looked at byte 2.
        let grammar = GrammarDef::new("g")
            .rule("source_file", repeat(choice([sym("let_stmt"), sym("ident")])))
            .rule("let_stmt", seq([literal("let"), sym("ident")]))
            .rule("ident", pattern("[a-z]+"))
            .compile()
            .unwrap();
        let parse = parse(&grammar, "lex x");
        let ident = grammar.kinds().lookup("ident").unwrap();
        assert_eq!(parse.lookahead().before(0, ident), Some(3));
        assert_eq!(parse.lookahead().before(4, ident), Some(5));
    }

    #[test]
    fn test_input_limit() {
        let err = parse_with_options(&larimar(), "abcdef", ParseOptions::default().with_max_input_len(3))
            .unwrap_err();
        assert_eq!(err, ParseError::InputTooLarge { len: 6, limit: 3 });
    }

    #[test]
    fn test_input_limit_is_capped_by_tree_capacity() {
        let options = ParseOptions::default().with_max_input_len(usize::MAX);
        assert!(parse_with_options(&larimar(), "abc", options).is_ok());
        assert_eq!(text_size(7), TextSize::from(7));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(text_size(MAX_TEXT_LEN + 1), TextSize::from(u32::MAX));
    }

    #[test]
    fn test_parse_rule_at_offset() {
        let grammar = larimar();
        let matched = parse_rule(&grammar, "identifier", "# x\nfoo", 4).unwrap();
        assert_eq!(matched.end, 7);
        assert_eq!(matched.elements.len(), 1);
        assert!(parse_rule(&grammar, "identifier", "# x", 0).is_none());
        assert!(parse_rule(&grammar, "missing", "foo", 0).is_none());
    }

    #[test]
    fn test_parse_many_matches_sequential() {
        let grammar = larimar();
        let texts = ["foo", "# a\nb", "1x", ""];
        let parses = parse_many(&grammar, &texts);
        for (text, parsed) in texts.iter().zip(&parses) {
            assert_eq!(parsed.tree(), parse(&grammar, text).tree());
        }
    }
}
