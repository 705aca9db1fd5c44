//! Incremental reparsing
//!
//! After an edit we:
//! 1. Find the rule-produced elements whose range contains the edited range
//! 2. Skip any whose rule was entered after the parser had already read into
//!    the edited bytes, since backtracking there may now go another way
//! 3. Re-run the innermost remaining one's rule at its start against the new
//!    text
//! 4. Accept the result only if it is a single element of the same kind that
//!    ends exactly where the old one ends after shifting by the edit delta
//! 5. Otherwise escalate to the next enclosing element, ending with a full
//!    parse of the document
//!
//! Accepted results are spliced in with rowan's `replace_with`, which copies
//! only the spine from the replaced element to the root; every other green
//! subtree is shared with the old tree.

use rowan::{NodeOrToken, TextRange, TextSize};

use super::parser::{Parse, match_rule_at, parse};
use crate::base::Edit;
use crate::grammar::{Grammar, RuleId, SyntaxElement};
use crate::syntax::SyntaxTree;

/// How a [`reparse`] produced its tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReparseOutcome {
    /// The edit changed nothing; the old tree is returned as is.
    Unchanged,
    /// One rule was re-run over `range` (in new-text offsets) and spliced in.
    Incremental { rule: String, range: TextRange },
    /// The whole document was parsed again.
    Full,
}

/// Update `old` (a parse of `old_text`) for `edit`, producing a parse of
/// `new_text` that is structurally identical to `parse(grammar, new_text)`.
pub fn reparse(grammar: &Grammar, old: &Parse, old_text: &str, edit: &Edit, new_text: &str) -> Parse {
    reparse_with_outcome(grammar, old, old_text, edit, new_text).0
}

/// [`reparse`], also reporting which strategy was used.
pub fn reparse_with_outcome(
    grammar: &Grammar,
    old: &Parse,
    old_text: &str,
    edit: &Edit,
    new_text: &str,
) -> (Parse, ReparseOutcome) {
    if let Err(err) = edit.validate(old_text, new_text) {
        tracing::warn!(%err, "edit does not describe the text change; reparsing from scratch");
        return (parse(grammar, new_text), ReparseOutcome::Full);
    }
    if edit.is_noop() {
        return (old.clone(), ReparseOutcome::Unchanged);
    }
    if !old.ok() {
        // Error recovery depends on the whole document.
        tracing::debug!("old tree has errors; full reparse");
        return (parse(grammar, new_text), ReparseOutcome::Full);
    }
    let (Some(start), Some(old_end), Some(_)) = (
        to_size(edit.start),
        to_size(edit.old_end),
        to_size(new_text.len()),
    ) else {
        return (parse(grammar, new_text), ReparseOutcome::Full);
    };

    let window = TextRange::new(start, old_end);
    for candidate in candidates(grammar, old.tree(), window) {
        if let Some((parse, outcome)) = try_candidate(grammar, old, &candidate, edit, new_text) {
            tracing::debug!(?outcome, "incremental reparse");
            return (parse, outcome);
        }
    }

    tracing::debug!("no enclosing rule realigned; full reparse");
    (parse(grammar, new_text), ReparseOutcome::Full)
}

/// Rule-produced elements containing `window` (ends inclusive), innermost
/// first. The root is excluded: re-running the entry rule is a full parse.
fn candidates(grammar: &Grammar, tree: &SyntaxTree, window: TextRange) -> Vec<(SyntaxElement, RuleId)> {
    let mut chain = Vec::new();
    let mut node = tree.syntax();
    loop {
        let Some(child) = node
            .children_with_tokens()
            .find(|child| child.text_range().contains_range(window))
        else {
            break;
        };
        if let Some(rule) = grammar.rule_for_kind(child.kind()) {
            chain.push((child.clone(), rule));
        }
        match child {
            NodeOrToken::Node(inner) => node = inner,
            NodeOrToken::Token(_) => break,
        }
    }
    chain.reverse();
    chain
}

fn try_candidate(
    grammar: &Grammar,
    old: &Parse,
    (element, rule): &(SyntaxElement, RuleId),
    edit: &Edit,
    new_text: &str,
) -> Option<(Parse, ReparseOutcome)> {
    let range = element.text_range();
    let start = usize::from(range.start());
    let end = usize::from(range.end());

    // Everything read before the rule was entered must precede the edit.
    let before = old.lookahead().before(start, element.kind())?;
    if before > edit.start {
        tracing::trace!(start, before, "rule entered after reading edited text");
        return None;
    }
    // Whatever follows may look back at the last edited byte.
    if end == edit.old_end && grammar.looks_behind() {
        return None;
    }

    let new_len = (end - start + edit.new_end).checked_sub(edit.old_end)?;
    let matched = match_rule_at(grammar, *rule, new_text, start)?;
    if matched.end != start + new_len || matched.elements.len() != 1 {
        return None;
    }
    let lookahead = old
        .lookahead()
        .splice(edit, (start, end), &matched.lookahead, matched.reach);
    let replacement = matched.elements.into_iter().next()?;

    let green = match (element, replacement) {
        (NodeOrToken::Node(node), NodeOrToken::Node(green)) if green.kind() == node.green().kind() => {
            node.replace_with(green)
        }
        (NodeOrToken::Token(token), NodeOrToken::Token(green)) if green.kind() == token.green().kind() => {
            token.replace_with(green)
        }
        _ => return None,
    };
    debug_assert_eq!(usize::from(green.text_len()), new_text.len());

    let outcome = ReparseOutcome::Incremental {
        rule: grammar.rule_name(*rule).to_string(),
        range: TextRange::at(range.start(), to_size(new_len)?),
    };
    let tree = SyntaxTree::new(green, old.tree().kinds_arc().clone());
    Some((Parse::new(tree, Vec::new(), lookahead), outcome))
}

fn to_size(offset: usize) -> Option<TextSize> {
    TextSize::try_from(offset).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::samples;

    fn larimar() -> Grammar {
        samples::larimar().unwrap()
    }

    fn edit_and_reparse(old_text: &str, edit: Edit) -> (Parse, Parse, ReparseOutcome) {
        let grammar = larimar();
        let old = parse(&grammar, old_text);
        let new_text = edit.apply(old_text).unwrap();
        let (incremental, outcome) = reparse_with_outcome(&grammar, &old, old_text, &edit, &new_text);
        (incremental, parse(&grammar, &new_text), outcome)
    }

    #[test]
    fn test_insert_inside_identifier_is_local() {
        let (incremental, full, outcome) = edit_and_reparse("foo bar", Edit::insert(5, "x"));
        assert!(incremental.tree().structurally_eq(full.tree()));
        assert_eq!(
            outcome,
            ReparseOutcome::Incremental {
                rule: "identifier".into(),
                range: TextRange::new(4.into(), 8.into()),
            }
        );
    }

    #[test]
    fn test_edit_inside_comment_is_local() {
        let (incremental, full, outcome) = edit_and_reparse("# hello\nbar", Edit::new(2, 7, "bye"));
        assert!(incremental.tree().structurally_eq(full.tree()));
        assert!(matches!(outcome, ReparseOutcome::Incremental { ref rule, .. } if rule == "comment"));
    }

    #[test]
    fn test_kind_change_escalates_to_full() {
        let (incremental, full, outcome) = edit_and_reparse("foo", Edit::insert(0, "#"));
        assert_eq!(outcome, ReparseOutcome::Full);
        assert_eq!(incremental.tree().to_sexp(), "(source_file (comment))");
        assert!(incremental.tree().structurally_eq(full.tree()));
    }

    #[test]
    fn test_misaligned_end_escalates() {
        let (incremental, full, outcome) = edit_and_reparse("foo bar", Edit::insert(3, " "));
        assert_eq!(outcome, ReparseOutcome::Full);
        assert!(incremental.tree().structurally_eq(full.tree()));
    }

    #[test]
    fn test_joining_tokens() {
        let (incremental, full, _) = edit_and_reparse("foo bar", Edit::delete(3, 4));
        assert_eq!(incremental.tree().to_sexp(), "(source_file (identifier))");
        assert!(incremental.tree().structurally_eq(full.tree()));
    }

    #[test]
    fn test_noop_returns_old_tree() {
        let grammar = larimar();
        let old = parse(&grammar, "foo");
        let (new, outcome) = reparse_with_outcome(&grammar, &old, "foo", &Edit::insert(1, ""), "foo");
        assert_eq!(outcome, ReparseOutcome::Unchanged);
        assert_eq!(new.tree(), old.tree());
    }

    #[test]
    fn test_invalid_edit_falls_back() {
        let grammar = larimar();
        let old = parse(&grammar, "foo");
        let (new, outcome) = reparse_with_outcome(&grammar, &old, "foo", &Edit::insert(1, "x"), "bar");
        assert_eq!(outcome, ReparseOutcome::Full);
        assert_eq!(new.tree().text(), "bar");
    }

    #[test]
    fn test_old_errors_force_full() {
        let (incremental, full, outcome) = edit_and_reparse("1 foo", Edit::insert(3, "x"));
        assert_eq!(outcome, ReparseOutcome::Full);
        assert!(incremental.tree().structurally_eq(full.tree()));
    }

    #[test]
    fn test_untouched_subtrees_are_shared() {
        let grammar = larimar();
        let old_text = "# one\nfoo";
        let old = parse(&grammar, old_text);
        let edit = Edit::insert(7, "x");
        let new_text = edit.apply(old_text).unwrap();
        let new = reparse(&grammar, &old, old_text, &edit, &new_text);

        let old_comment = old.syntax().first_child().unwrap();
        let new_comment = new.syntax().first_child().unwrap();
        assert!(std::ptr::eq(&*old_comment.green(), &*new_comment.green()));
    }

    #[test]
    fn test_old_tree_is_unchanged() {
        let grammar = larimar();
        let old = parse(&grammar, "foo");
        let snapshot = old.tree().clone();
        let _ = reparse(&grammar, &old, "foo", &Edit::insert(1, "x"), "fxoo");
        assert_eq!(old.tree(), &snapshot);
        assert_eq!(old.tree().text(), "foo");
    }
}
