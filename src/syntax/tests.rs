use crate::grammar::{Grammar, samples};
use crate::parser::parse;

fn larimar() -> Grammar {
    samples::larimar().unwrap()
}

#[test]
fn test_root_covers_input() {
    let parse = parse(&larimar(), "# hello\nbar");
    let root = parse.tree().root();
    assert_eq!(root.kind(), "source_file");
    assert_eq!((root.start(), root.end()), (0, 11));
    assert!(!root.is_leaf());
    assert!(root.parent().is_none());
}

#[test]
fn test_named_children() {
    let parse = parse(&larimar(), "# hello\nbar");
    let children: Vec<_> = parse
        .tree()
        .root()
        .named_children()
        .map(|c| (c.kind().to_string(), c.start(), c.end()))
        .collect();
    assert_eq!(
        children,
        [("comment".to_string(), 0, 7), ("identifier".to_string(), 8, 11)]
    );
}

#[test]
fn test_anonymous_children_of_comment() {
    let parse = parse(&larimar(), "# hello");
    let comment = parse.tree().root().children().next().unwrap();
    let kinds: Vec<_> = comment.children().map(|c| c.kind().to_string()).collect();
    assert_eq!(kinds, ["#", "/\\s+/", "/.*/"]);
    assert!(comment.children().all(|c| c.is_leaf() && !c.is_named()));
    assert!(comment.children().nth(1).unwrap().is_extra());
}

#[test]
fn test_parent_is_computed() {
    let parse = parse(&larimar(), "# hello");
    let comment = parse.tree().root().children().next().unwrap();
    let hash = comment.children().next().unwrap();
    assert_eq!(hash.parent().unwrap().kind(), "comment");
    assert_eq!(hash.text(), "#");
}

#[test]
fn test_leaves_tile_the_input() {
    let text = "a # b\n 1c";
    let parse = parse(&larimar(), text);
    let mut offset = 0;
    for leaf in parse.tree().leaves() {
        assert_eq!(leaf.start(), offset, "gap or overlap before {leaf:?}");
        offset = leaf.end();
    }
    assert_eq!(offset, text.len());
    assert!(parse.tree().has_errors());
}

#[test]
fn test_text_roundtrip() {
    let text = "foo\n# bar baz\n\n_q1";
    assert_eq!(parse(&larimar(), text).tree().text(), text);
}

#[test]
fn test_structural_equality_ignores_text() {
    let grammar = larimar();
    let a = parse(&grammar, "foo");
    let b = parse(&grammar, "bar");
    assert!(a.tree().structurally_eq(b.tree()));
    assert_ne!(a.tree(), b.tree());
    assert!(!a.tree().structurally_eq(parse(&grammar, "fo").tree()));
}

#[test]
fn test_debug_dump() {
    let parse = parse(&larimar(), "# a\nb");
    let expected = "\
source_file@0..5
  comment@0..3
    #@0..1 \"#\"
    /\\s+/@1..2 \" \"
    /.*/@2..3 \"a\"
  /\\s+/@3..4 \"\\n\"
  identifier@4..5 \"b\"
";
    assert_eq!(parse.tree().debug_dump(), expected);
}
