//! Grammar compilation: declarations in, immutable rule table out.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::error::GrammarError;
use super::kinds::{KindId, KindTable};
use super::matcher::Matcher;
use super::rule::{Pattern, Rule};

/// Name of the entry rule unless a declaration says otherwise.
pub const DEFAULT_ENTRY: &str = "source_file";

/// Extras used when a declaration does not list any.
pub const DEFAULT_EXTRA: &str = r"\s+";

/// An uncompiled grammar: named rules, the entry rule and the extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarDef {
    pub name: SmolStr,
    pub entry: SmolStr,
    pub rules: Vec<(SmolStr, Rule)>,
    pub extras: Vec<Pattern>,
}

impl GrammarDef {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            entry: SmolStr::new_static(DEFAULT_ENTRY),
            rules: Vec::new(),
            extras: vec![Pattern::Regex(SmolStr::new_static(DEFAULT_EXTRA))],
        }
    }

    pub fn rule(mut self, name: impl Into<SmolStr>, rule: Rule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    pub fn entry(mut self, name: impl Into<SmolStr>) -> Self {
        self.entry = name.into();
        self
    }

    /// Replace the extras. An empty list disables trivia skipping.
    pub fn extras(mut self, extras: impl IntoIterator<Item = Pattern>) -> Self {
        self.extras = extras.into_iter().collect();
        self
    }

    pub fn compile(&self) -> Result<Grammar, GrammarError> {
        compile(self)
    }
}

/// Index of a rule in a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compiled combinator expression.
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Seq(Vec<Expr>),
    Choice(Vec<Expr>),
    Repeat(Box<Expr>),
    Token { matcher: Matcher, kind: KindId },
    Rule(RuleId),
    Blank,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) name: SmolStr,
    pub(crate) kind: KindId,
    pub(crate) hidden: bool,
    pub(crate) body: Expr,
}

impl CompiledRule {
    /// A visible rule whose whole body is one token becomes a named leaf.
    pub(crate) fn leaf_matcher(&self) -> Option<&Matcher> {
        match &self.body {
            Expr::Token { matcher, .. } if !self.hidden => Some(matcher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Extra {
    pub(crate) matcher: Matcher,
    pub(crate) kind: KindId,
}

/// A compiled, immutable rule table.
///
/// Built once and passed explicitly to every parse; `Grammar` is
/// `Send + Sync`, so one instance can serve parses on many threads.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: SmolStr,
    entry: RuleId,
    rules: Vec<CompiledRule>,
    by_name: FxHashMap<SmolStr, RuleId>,
    extras: Vec<Extra>,
    kinds: Arc<KindTable>,
    looks_behind: bool,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> RuleId {
        self.entry
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.by_name.get(name).copied()
    }

    pub fn rule_name(&self, rule: RuleId) -> &str {
        &self.rules[rule.index()].name
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.iter().map(|rule| rule.name.as_str())
    }

    pub fn kinds(&self) -> &Arc<KindTable> {
        &self.kinds
    }

    /// The rule that produces nodes of `kind`, if any. Hidden rules produce
    /// no nodes and are never returned.
    pub fn rule_for_kind(&self, kind: KindId) -> Option<RuleId> {
        let index = usize::from(kind.0).checked_sub(1)?;
        let rule = self.rules.get(index)?;
        (!rule.hidden).then_some(RuleId(index as u32))
    }

    pub(crate) fn rule(&self, rule: RuleId) -> &CompiledRule {
        &self.rules[rule.index()]
    }

    pub(crate) fn extras(&self) -> &[Extra] {
        &self.extras
    }

    /// Whether some pattern's match can depend on the text before it.
    pub(crate) fn looks_behind(&self) -> bool {
        self.looks_behind
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('_')
}

fn is_valid_rule_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || unicode_ident::is_xid_start(c))
        && chars.all(unicode_ident::is_xid_continue)
}

/// Compile a grammar declaration into a rule table.
pub fn compile(def: &GrammarDef) -> Result<Grammar, GrammarError> {
    let mut declared: IndexMap<SmolStr, &Rule> = IndexMap::with_capacity(def.rules.len());
    for (name, rule) in &def.rules {
        if !is_valid_rule_name(name) {
            return Err(GrammarError::InvalidRuleName { rule: name.clone() });
        }
        if declared.insert(name.clone(), rule).is_some() {
            return Err(GrammarError::DuplicateRule { rule: name.clone() });
        }
    }

    let Some(entry) = declared.get_index_of(&def.entry) else {
        return Err(GrammarError::NoEntryRule { entry: def.entry.clone() });
    };
    if is_hidden(&def.entry) {
        return Err(GrammarError::HiddenEntryRule { entry: def.entry.clone() });
    }

    let mut kinds = KindTable::new();
    let by_name: FxHashMap<SmolStr, RuleId> = declared
        .keys()
        .enumerate()
        .map(|(index, name)| (name.clone(), RuleId(index as u32)))
        .collect();
    let rule_kinds: Vec<KindId> = declared
        .keys()
        .map(|name| kinds.push_rule(name.clone()))
        .collect();

    let mut rules = Vec::with_capacity(declared.len());
    for ((name, rule), kind) in declared.iter().zip(rule_kinds) {
        let mut lowering = Lowering {
            rule: name,
            by_name: &by_name,
            kinds: &mut kinds,
        };
        rules.push(CompiledRule {
            name: name.clone(),
            kind,
            hidden: is_hidden(name),
            body: lowering.lower(rule)?,
        });
    }

    let extras = def
        .extras
        .iter()
        .map(|pattern| {
            Ok(Extra {
                matcher: Matcher::compile(pattern)?,
                kind: kinds.intern_extra(pattern.kind_name()),
            })
        })
        .collect::<Result<Vec<_>, GrammarError>>()?;

    if kinds.len() > usize::from(u16::MAX) {
        return Err(GrammarError::TooManyKinds { count: kinds.len() });
    }

    check_left_recursion(&rules)?;

    let looks_behind = rules.iter().any(|rule| looks_behind(&rule.body))
        || extras.iter().any(|extra| extra.matcher.looks_behind());

    tracing::debug!(
        grammar = %def.name,
        rules = rules.len(),
        kinds = kinds.len(),
        extras = extras.len(),
        "compiled grammar"
    );

    Ok(Grammar {
        name: def.name.clone(),
        entry: RuleId(entry as u32),
        rules,
        by_name,
        extras,
        kinds: Arc::new(kinds),
        looks_behind,
    })
}

fn looks_behind(expr: &Expr) -> bool {
    match expr {
        Expr::Seq(members) | Expr::Choice(members) => members.iter().any(looks_behind),
        Expr::Repeat(inner) => looks_behind(inner),
        Expr::Token { matcher, .. } => matcher.looks_behind(),
        Expr::Rule(_) | Expr::Blank => false,
    }
}

struct Lowering<'a> {
    rule: &'a SmolStr,
    by_name: &'a FxHashMap<SmolStr, RuleId>,
    kinds: &'a mut KindTable,
}

impl Lowering<'_> {
    fn lower(&mut self, rule: &Rule) -> Result<Expr, GrammarError> {
        Ok(match rule {
            Rule::Seq(members) => {
                if members.is_empty() {
                    return Err(GrammarError::EmptySequence { rule: self.rule.clone() });
                }
                Expr::Seq(self.lower_all(members)?)
            }
            Rule::Choice(members) => {
                if members.is_empty() {
                    return Err(GrammarError::EmptyChoice { rule: self.rule.clone() });
                }
                Expr::Choice(self.lower_all(members)?)
            }
            Rule::Repeat(inner) => Expr::Repeat(Box::new(self.lower(inner)?)),
            Rule::Token(pattern) => Expr::Token {
                matcher: Matcher::compile(pattern)?,
                kind: self.kinds.intern_token(pattern.kind_name()),
            },
            Rule::Ref(name) => match self.by_name.get(name) {
                Some(&id) => Expr::Rule(id),
                None => {
                    return Err(GrammarError::UnknownReference {
                        rule: self.rule.clone(),
                        reference: name.clone(),
                    });
                }
            },
            Rule::Blank => Expr::Blank,
        })
    }

    fn lower_all(&mut self, members: &[Rule]) -> Result<Vec<Expr>, GrammarError> {
        members.iter().map(|member| self.lower(member)).collect()
    }
}

// ============================================================================
// Left recursion
// ============================================================================

/// Reject rules that can reach themselves without consuming input.
///
/// Without such cycles every recursive call sits at a strictly larger offset,
/// so evaluation always terminates.
fn check_left_recursion(rules: &[CompiledRule]) -> Result<(), GrammarError> {
    let nullable = nullable_rules(rules);

    let leftmost: Vec<Vec<RuleId>> = rules
        .iter()
        .map(|rule| {
            let mut refs = Vec::new();
            leftmost_refs(&rule.body, &nullable, &mut refs);
            refs
        })
        .collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    fn visit(rule: usize, leftmost: &[Vec<RuleId>], marks: &mut [Mark]) -> Option<usize> {
        marks[rule] = Mark::OnStack;
        for next in &leftmost[rule] {
            match marks[next.index()] {
                Mark::OnStack => return Some(next.index()),
                Mark::Unvisited => {
                    if let Some(cycle) = visit(next.index(), leftmost, marks) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }
        marks[rule] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; rules.len()];
    for rule in 0..rules.len() {
        if marks[rule] == Mark::Unvisited {
            if let Some(cycle) = visit(rule, &leftmost, &mut marks) {
                return Err(GrammarError::LeftRecursion {
                    rule: rules[cycle].name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Fixpoint over rules that can match without consuming input.
fn nullable_rules(rules: &[CompiledRule]) -> Vec<bool> {
    let mut nullable = vec![false; rules.len()];
    loop {
        let mut changed = false;
        for (index, rule) in rules.iter().enumerate() {
            if !nullable[index] && is_nullable(&rule.body, &nullable) {
                nullable[index] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn is_nullable(expr: &Expr, nullable: &[bool]) -> bool {
    match expr {
        Expr::Seq(members) => members.iter().all(|member| is_nullable(member, nullable)),
        Expr::Choice(members) => members.iter().any(|member| is_nullable(member, nullable)),
        Expr::Repeat(_) | Expr::Blank => true,
        Expr::Token { matcher, .. } => matcher.matches_empty(),
        Expr::Rule(id) => nullable[id.index()],
    }
}

/// Rules that may be entered at the same offset as `expr` starts.
fn leftmost_refs(expr: &Expr, nullable: &[bool], out: &mut Vec<RuleId>) {
    match expr {
        Expr::Seq(members) => {
            for member in members {
                leftmost_refs(member, nullable, out);
                if !is_nullable(member, nullable) {
                    break;
                }
            }
        }
        Expr::Choice(members) => {
            for member in members {
                leftmost_refs(member, nullable, out);
            }
        }
        Expr::Repeat(inner) => leftmost_refs(inner, nullable, out),
        Expr::Rule(id) => out.push(*id),
        Expr::Token { .. } | Expr::Blank => {}
    }
}
