//! Read-only syntax tree snapshots.
//!
//! A [`SyntaxTree`] owns a rowan green tree plus the kind table of the
//! grammar that produced it. Green nodes are immutable and reference
//! counted, so trees produced by incremental reparsing share every untouched
//! subtree with their predecessor.

use std::fmt;
use std::sync::Arc;

use rowan::{GreenNode, NodeOrToken, TextRange, TextSize, WalkEvent};

use crate::grammar::{KindId, KindTable, SyntaxElement, SyntaxNode};

/// An immutable concrete syntax tree.
#[derive(Clone)]
pub struct SyntaxTree {
    green: GreenNode,
    kinds: Arc<KindTable>,
}

impl SyntaxTree {
    pub(crate) fn new(green: GreenNode, kinds: Arc<KindTable>) -> Self {
        Self { green, kinds }
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn kinds(&self) -> &KindTable {
        &self.kinds
    }

    pub(crate) fn kinds_arc(&self) -> &Arc<KindTable> {
        &self.kinds
    }

    /// Root rowan node, for consumers that want parent pointers and the
    /// full rowan API.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Root of the tree as a [`ParseNode`].
    pub fn root(&self) -> ParseNode<'_> {
        ParseNode {
            element: NodeOrToken::Node(self.syntax()),
            kinds: &self.kinds,
        }
    }

    /// Length of the covered text.
    pub fn len(&self) -> TextSize {
        self.green.text_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == TextSize::from(0)
    }

    /// The covered text, reassembled from the leaves.
    pub fn text(&self) -> String {
        self.syntax().text().to_string()
    }

    pub fn has_errors(&self) -> bool {
        self.leaves().any(|leaf| leaf.is_error())
    }

    /// Leaves in document order: named and anonymous tokens, extras and
    /// error regions.
    pub fn leaves(&self) -> impl Iterator<Item = ParseNode<'_>> + '_ {
        let kinds = &*self.kinds;
        self.syntax()
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .map(move |token| ParseNode {
                element: NodeOrToken::Token(token),
                kinds,
            })
    }

    /// Same node kinds and ranges, in the same shape. Leaf text is not
    /// compared.
    pub fn structurally_eq(&self, other: &SyntaxTree) -> bool {
        let ours = self.syntax().preorder_with_tokens();
        let theirs = other.syntax().preorder_with_tokens();
        let mut ours = ours.map(|event| shape(&self.kinds, event));
        let mut theirs = theirs.map(|event| shape(&other.kinds, event));
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a == b => {}
                _ => return false,
            }
        }
    }

    /// tree-sitter style s-expression over named nodes and error regions,
    /// e.g. `(source_file (comment) (identifier))`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(&self.root(), &mut out);
        out
    }

    /// Indented dump of every element with its kind and range.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for event in self.syntax().preorder_with_tokens() {
            match event {
                WalkEvent::Enter(element) => {
                    let range = element.text_range();
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(self.kinds.name(element.kind()));
                    out.push_str(&format!("@{}..{}", u32::from(range.start()), u32::from(range.end())));
                    if let NodeOrToken::Token(token) = &element {
                        out.push_str(&format!(" {:?}", token.text()));
                    }
                    out.push('\n');
                    if element.as_node().is_some() {
                        depth += 1;
                    }
                }
                WalkEvent::Leave(element) => {
                    if element.as_node().is_some() {
                        depth -= 1;
                    }
                }
            }
        }
        out
    }
}

type Shape<'a> = Option<(bool, &'a str, TextRange)>;

fn shape<'a>(kinds: &'a KindTable, event: WalkEvent<SyntaxElement>) -> Shape<'a> {
    match event {
        WalkEvent::Enter(element) => Some((
            element.as_node().is_some(),
            kinds.name(element.kind()),
            element.text_range(),
        )),
        WalkEvent::Leave(_) => None,
    }
}

fn write_sexp(node: &ParseNode<'_>, out: &mut String) {
    out.push('(');
    out.push_str(node.kind());
    for child in node.children().filter(|c| c.is_named() || c.is_error()) {
        out.push(' ');
        write_sexp(&child, out);
    }
    out.push(')');
}

impl PartialEq for SyntaxTree {
    fn eq(&self, other: &Self) -> bool {
        self.green == other.green
    }
}

impl Eq for SyntaxTree {}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_dump())
    }
}

/// A node or leaf of a [`SyntaxTree`].
///
/// Leaves have no children. Parent lookup is computed through rowan's red
/// tree, not stored in the green tree.
#[derive(Clone)]
pub struct ParseNode<'a> {
    element: SyntaxElement,
    kinds: &'a KindTable,
}

impl<'a> ParseNode<'a> {
    pub fn kind_id(&self) -> KindId {
        self.element.kind()
    }

    pub fn kind(&self) -> &'a str {
        self.kinds.name(self.kind_id())
    }

    pub fn range(&self) -> TextRange {
        self.element.text_range()
    }

    pub fn start(&self) -> usize {
        u32::from(self.range().start()) as usize
    }

    pub fn end(&self) -> usize {
        u32::from(self.range().end()) as usize
    }

    /// Error region inserted by recovery.
    pub fn is_error(&self) -> bool {
        self.kinds.is_error(self.kind_id())
    }

    /// Produced by a named rule, as opposed to an anonymous token or extra.
    pub fn is_named(&self) -> bool {
        self.kinds.is_named(self.kind_id())
    }

    pub fn is_extra(&self) -> bool {
        self.kinds.is_extra(self.kind_id())
    }

    pub fn is_leaf(&self) -> bool {
        self.element.as_token().is_some()
    }

    pub fn text(&self) -> String {
        match &self.element {
            NodeOrToken::Node(node) => node.text().to_string(),
            NodeOrToken::Token(token) => token.text().to_string(),
        }
    }

    pub fn children(&self) -> impl Iterator<Item = ParseNode<'a>> + use<'a> {
        let kinds = self.kinds;
        self.element
            .as_node()
            .cloned()
            .into_iter()
            .flat_map(|node| node.children_with_tokens())
            .map(move |element| ParseNode { element, kinds })
    }

    /// Children produced by named rules or error recovery.
    pub fn named_children(&self) -> impl Iterator<Item = ParseNode<'a>> + use<'a> {
        self.children().filter(|child| child.is_named() || child.is_error())
    }

    pub fn parent(&self) -> Option<ParseNode<'a>> {
        self.element.parent().map(|node| ParseNode {
            element: NodeOrToken::Node(node),
            kinds: self.kinds,
        })
    }

    /// The underlying rowan element.
    pub fn syntax(&self) -> &SyntaxElement {
        &self.element
    }
}

impl fmt::Debug for ParseNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.kind(), self.start(), self.end())
    }
}
