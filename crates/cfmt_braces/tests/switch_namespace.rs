//! Switch linkage and namespace marking.

mod common;

use cfmt_braces::{BraceCleanup, ChunkFlags, ChunkList, CleanupOptions, Kind, Language};
use common::{build, find, find_nth, find_text, push_line};

#[test]
fn switch_labels_and_breaks_link_to_their_switch() {
    // switch (v) { case 1: break; default: break; }
    let mut list = build(&[
        (Kind::Switch, "switch"),
        (Kind::ParenOpen, "("),
        (Kind::Word, "v"),
        (Kind::ParenClose, ")"),
        (Kind::BraceOpen, "{"),
        (Kind::Case, "case"),
        (Kind::Number, "1"),
        (Kind::Colon, ":"),
        (Kind::Break, "break"),
        (Kind::Semicolon, ";"),
        (Kind::Default, "default"),
        (Kind::Colon, ":"),
        (Kind::Break, "break"),
        (Kind::Semicolon, ";"),
        (Kind::BraceClose, "}"),
    ]);
    let ret = BraceCleanup::new(&mut list, Language::C).run();
    assert!(ret.fatal.is_none());

    let switch = find(&list, Kind::Switch);
    let brace = find(&list, Kind::BraceOpen);
    assert_eq!(list[brace].parent_kind, Kind::Switch);
    assert_eq!(list[brace].parent, Some(switch));

    let case = find(&list, Kind::Case);
    assert_eq!(list[case].parent_kind, Kind::Switch);
    assert_eq!(list[case].parent, Some(switch));

    let default = find(&list, Kind::Default);
    assert_eq!(list[default].parent_kind, Kind::Switch);
    assert_eq!(list[default].parent, Some(switch));

    for n in 0..2 {
        let brk = find_nth(&list, Kind::Break, n);
        assert_eq!(list[brk].parent, Some(switch));
    }

    assert_eq!(list[find(&list, Kind::SParenOpen)].parent_kind, Kind::Switch);
}

#[test]
fn default_after_assign_is_a_value_not_a_label() {
    // x = default;
    let mut list = build(&[
        (Kind::Word, "x"),
        (Kind::Assign, "="),
        (Kind::Default, "default"),
        (Kind::Semicolon, ";"),
    ]);
    let ret = BraceCleanup::new(&mut list, Language::CSharp).run();
    assert!(ret.fatal.is_none());

    let default = find(&list, Kind::Default);
    assert_eq!(list[default].parent_kind, Kind::None);
    assert_eq!(list[default].parent, None);
}

#[test]
fn namespace_children_carry_the_namespace_parent() {
    // namespace ns { x; }
    let mut list = build(&[
        (Kind::Namespace, "namespace"),
        (Kind::Word, "ns"),
        (Kind::BraceOpen, "{"),
        (Kind::Word, "x"),
        (Kind::Semicolon, ";"),
        (Kind::BraceClose, "}"),
    ]);
    let ret = BraceCleanup::new(&mut list, Language::Cpp).run();
    assert!(ret.fatal.is_none());

    assert_eq!(list[find_text(&list, "ns")].parent_kind, Kind::Namespace);
    assert_eq!(list[find(&list, Kind::BraceOpen)].parent_kind, Kind::Namespace);
    assert_eq!(list[find(&list, Kind::BraceClose)].parent_kind, Kind::Namespace);
    assert!(list[find_text(&list, "x")]
        .flags
        .contains(ChunkFlags::IN_NAMESPACE));

    // a namespace brace still bumps the level by default
    assert_eq!(list[find_text(&list, "x")].brace_level, 1);
}

#[test]
fn using_namespace_ends_at_the_semicolon() {
    // using namespace std;
    let mut list = build(&[
        (Kind::Using, "using"),
        (Kind::Namespace, "namespace"),
        (Kind::Word, "std"),
        (Kind::Semicolon, ";"),
    ]);
    let ret = BraceCleanup::new(&mut list, Language::Cpp).run();
    assert!(ret.fatal.is_none());

    assert_eq!(list[find(&list, Kind::Namespace)].parent_kind, Kind::Using);
    assert_eq!(list[find_text(&list, "std")].parent_kind, Kind::Namespace);
    assert_eq!(list[find(&list, Kind::Semicolon)].parent_kind, Kind::Using);
    assert_eq!(list.len(), 4, "no braces, nothing inserted");
}

#[test]
fn nested_namespace_shares_the_indent_when_configured() {
    // namespace ns { namespace inner { x; } }
    let build_ns = || {
        build(&[
            (Kind::Namespace, "namespace"),
            (Kind::Word, "ns"),
            (Kind::BraceOpen, "{"),
            (Kind::Namespace, "namespace"),
            (Kind::Word, "inner"),
            (Kind::BraceOpen, "{"),
            (Kind::Word, "x"),
            (Kind::Semicolon, ";"),
            (Kind::BraceClose, "}"),
            (Kind::BraceClose, "}"),
        ])
    };

    // default: every namespace brace indents
    let mut list = build_ns();
    let ret = BraceCleanup::new(&mut list, Language::Cpp).run();
    assert!(ret.fatal.is_none());
    assert_eq!(list[find_text(&list, "x")].brace_level, 2);

    // single-indent: the inner brace shares the outer level
    let mut list = build_ns();
    let options = CleanupOptions {
        indent_namespace: true,
        indent_namespace_single_indent: true,
        ..CleanupOptions::default()
    };
    let ret = BraceCleanup::new(&mut list, Language::Cpp)
        .with_options(options)
        .run();
    assert!(ret.fatal.is_none());

    let x = find_text(&list, "x");
    assert_eq!(list[x].brace_level, 1, "inner brace does not indent");
    assert_eq!(list[x].level, 2, "bracket level still nests");

    let inner_close = find_nth(&list, Kind::BraceClose, 0);
    let outer_close = find_nth(&list, Kind::BraceClose, 1);
    assert_eq!(list[inner_close].brace_level, 1);
    assert_eq!(list[outer_close].brace_level, 0, "balance is preserved");
}

#[test]
fn long_namespace_blocks_are_flagged() {
    // namespace ns {          (line 1)
    //   ...                   (lines 2-4)
    // }                       (line 5)
    let mut list = ChunkList::new();
    push_line(
        &mut list,
        1,
        false,
        &[
            (Kind::Namespace, "namespace"),
            (Kind::Word, "ns"),
            (Kind::BraceOpen, "{"),
        ],
    );
    for line in 2..=4 {
        push_line(&mut list, line, false, &[(Kind::Word, "x"), (Kind::Semicolon, ";")]);
    }
    push_line(&mut list, 5, false, &[(Kind::BraceClose, "}")]);

    let options = CleanupOptions {
        indent_namespace_limit: 2,
        ..CleanupOptions::default()
    };
    let ret = BraceCleanup::new(&mut list, Language::Cpp)
        .with_options(options)
        .run();
    assert!(ret.fatal.is_none());

    let open = find(&list, Kind::BraceOpen);
    let close = find(&list, Kind::BraceClose);
    assert!(list[open].flags.contains(ChunkFlags::LONG_BLOCK));
    assert!(list[close].flags.contains(ChunkFlags::LONG_BLOCK));

    // under the limit nothing is flagged
    let mut list = ChunkList::new();
    push_line(
        &mut list,
        1,
        false,
        &[
            (Kind::Namespace, "namespace"),
            (Kind::Word, "ns"),
            (Kind::BraceOpen, "{"),
        ],
    );
    push_line(&mut list, 2, false, &[(Kind::Word, "x"), (Kind::Semicolon, ";")]);
    push_line(&mut list, 3, false, &[(Kind::BraceClose, "}")]);
    let ret = BraceCleanup::new(&mut list, Language::Cpp)
        .with_options(options)
        .run();
    assert!(ret.fatal.is_none());
    assert!(!list[find(&list, Kind::BraceOpen)]
        .flags
        .contains(ChunkFlags::LONG_BLOCK));
}
