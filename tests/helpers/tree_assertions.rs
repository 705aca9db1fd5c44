//! Tree assertion helpers.

use larimar::{Grammar, Parse, ParseNode, SyntaxTree, parse};

/// Named children of the root as `(kind, start, end)`.
pub fn top_level(tree: &SyntaxTree) -> Vec<(String, usize, usize)> {
    tree.root()
        .named_children()
        .map(|node| (node.kind().to_string(), node.start(), node.end()))
        .collect()
}

/// Assert that the leaves tile `[0, text.len())` with no gaps or overlaps.
pub fn assert_leaves_cover(tree: &SyntaxTree, text: &str) {
    let mut offset = 0;
    for leaf in tree.leaves() {
        assert_eq!(
            leaf.start(),
            offset,
            "Expected leaf {:?} to start at {} in {:?}",
            leaf,
            offset,
            text
        );
        offset = leaf.end();
    }
    assert_eq!(offset, text.len(), "Leaves stop short of the end of {:?}", text);
    assert_eq!(tree.text(), text);
}

/// Assert that every node's children are ordered and tile the node's range.
pub fn assert_children_tile(node: &ParseNode<'_>) {
    let mut offset = node.start();
    for child in node.children() {
        assert_eq!(
            child.start(),
            offset,
            "Child {:?} of {:?} does not continue at {}",
            child,
            node,
            offset
        );
        assert_children_tile(&child);
        offset = child.end();
    }
    if !node.is_leaf() {
        assert_eq!(offset, node.end(), "Children of {:?} end at {}", node, offset);
    }
}

/// Parse and assert there are no syntax errors.
pub fn parse_ok(grammar: &Grammar, text: &str) -> Parse {
    let parse = parse(grammar, text);
    assert!(
        parse.ok(),
        "Expected no errors for {:?}, got:\n{}",
        text,
        parse
            .errors()
            .iter()
            .map(|e| format!("  {:?}: {}", e.range, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    );
    parse
}
