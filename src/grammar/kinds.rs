//! Syntax kinds for the rowan-based CST
//!
//! Kinds are not a fixed enum: every compiled grammar interns its own set.
//! Id `0` is always `ERROR`, followed by one kind per rule (in declaration
//! order), then one kind per distinct anonymous token and extra pattern.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A syntax kind, interned per grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KindId(pub u16);

impl KindId {
    /// Kind of error-recovery leaves.
    pub const ERROR: KindId = KindId(0);
}

impl From<KindId> for rowan::SyntaxKind {
    fn from(kind: KindId) -> Self {
        rowan::SyntaxKind(kind.0)
    }
}

impl From<rowan::SyntaxKind> for KindId {
    fn from(raw: rowan::SyntaxKind) -> Self {
        KindId(raw.0)
    }
}

/// What produced a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindClass {
    /// Unmatched input inserted by error recovery.
    Error,
    /// A named grammar rule (visible or hidden).
    Rule,
    /// An anonymous token written inline in a rule (`"#"`, `/.*/`).
    Token,
    /// Trivia matched by one of the grammar's extras.
    Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindInfo {
    pub name: SmolStr,
    pub class: KindClass,
}

/// Maps [`KindId`]s to names and classes.
///
/// Shared between a grammar and every tree it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindTable {
    infos: Vec<KindInfo>,
    tokens: FxHashMap<SmolStr, KindId>,
    extras: FxHashMap<SmolStr, KindId>,
}

impl Default for KindTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KindTable {
    pub fn new() -> Self {
        Self {
            infos: vec![KindInfo {
                name: SmolStr::new_static("ERROR"),
                class: KindClass::Error,
            }],
            tokens: FxHashMap::default(),
            extras: FxHashMap::default(),
        }
    }

    pub(crate) fn push_rule(&mut self, name: SmolStr) -> KindId {
        self.push(name, KindClass::Rule)
    }

    /// Intern an anonymous token kind; equal names share one kind.
    pub(crate) fn intern_token(&mut self, name: SmolStr) -> KindId {
        if let Some(&kind) = self.tokens.get(&name) {
            return kind;
        }
        let kind = self.push(name.clone(), KindClass::Token);
        self.tokens.insert(name, kind);
        kind
    }

    pub(crate) fn intern_extra(&mut self, name: SmolStr) -> KindId {
        if let Some(&kind) = self.extras.get(&name) {
            return kind;
        }
        let kind = self.push(name.clone(), KindClass::Extra);
        self.extras.insert(name, kind);
        kind
    }

    fn push(&mut self, name: SmolStr, class: KindClass) -> KindId {
        // Ids past u16::MAX are rejected by the compiler before use.
        let kind = KindId(self.infos.len() as u16);
        self.infos.push(KindInfo { name, class });
        kind
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn info(&self, kind: KindId) -> Option<&KindInfo> {
        self.infos.get(usize::from(kind.0))
    }

    /// Name of a kind; unknown ids render as `ERROR`.
    pub fn name(&self, kind: KindId) -> &str {
        self.info(kind).map_or("ERROR", |info| info.name.as_str())
    }

    pub fn class(&self, kind: KindId) -> KindClass {
        self.info(kind).map_or(KindClass::Error, |info| info.class)
    }

    pub fn is_error(&self, kind: KindId) -> bool {
        self.class(kind) == KindClass::Error
    }

    pub fn is_named(&self, kind: KindId) -> bool {
        self.class(kind) == KindClass::Rule
    }

    pub fn is_extra(&self, kind: KindId) -> bool {
        self.class(kind) == KindClass::Extra
    }

    /// Look a kind up by name. Rule kinds win over anonymous tokens of the
    /// same spelling.
    pub fn lookup(&self, name: &str) -> Option<KindId> {
        self.infos
            .iter()
            .position(|info| info.class == KindClass::Rule && info.name == name)
            .map(|index| KindId(index as u16))
            .or_else(|| self.tokens.get(name).copied())
            .or_else(|| self.extras.get(name).copied())
            .or_else(|| (name == "ERROR").then_some(KindId::ERROR))
    }
}

/// Language marker type for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrammarLanguage {}

impl rowan::Language for GrammarLanguage {
    type Kind = KindId;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<GrammarLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<GrammarLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<GrammarLanguage>;

/// Owned green element, the unit the parser emits.
pub type GreenElement = rowan::NodeOrToken<rowan::GreenNode, rowan::GreenToken>;
