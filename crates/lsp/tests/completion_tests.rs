// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Member-completion integration tests
//!
//! Each test analyzes a workspace snapshot and asks for completion the
//! way the backend does: classify the trigger from the cursor line, then
//! run the locator (with token fallback) over the analyzed program.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Position};

use vala_lsp_compiler::{CompilationContext, SourceFile, SourceKind};
use vala_lsp_lsp::complete;

fn context_for(text: &str) -> CompilationContext {
    let mut context = CompilationContext::new();
    context.add_source_file(SourceFile::new(
        PathBuf::from("/main.vala"),
        SourceKind::Source,
        text.to_string(),
    ));
    context.check();
    context
}

fn complete_at(context: &CompilationContext, line: &str, position: Position) -> Vec<CompletionItem> {
    complete(context.ast(), Path::new("/main.vala"), line, position)
}

fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|i| i.label.as_str()).collect()
}

#[test]
fn test_member_completion_on_class_instance() {
    let context = context_for(
        "class Foo {\n    public int a;\n    public void bar () {\n    }\n}\nvoid main () {\n    Foo f = new Foo ();\n    f.\n}\n",
    );

    // Cursor immediately after the dot of `f.`.
    let items = complete_at(
        &context,
        "    f.",
        Position {
            line: 7,
            character: 6,
        },
    );

    let a = items.iter().find(|i| i.label == "a").expect("field a");
    assert_eq!(a.kind, Some(CompletionItemKind::FIELD));
    let bar = items.iter().find(|i| i.label == "bar").expect("method bar");
    assert_eq!(bar.kind, Some(CompletionItemKind::METHOD));
}

#[test]
fn test_pointer_dereference_completion_matches_instance() {
    let shared = "class Foo {\n    public int a;\n    public void bar () {\n    }\n}\n";

    let instance = context_for(&format!(
        "{}void main () {{\n    Foo f = new Foo ();\n    f.\n}}\n",
        shared
    ));
    let by_instance = complete_at(
        &instance,
        "    f.",
        Position {
            line: 7,
            character: 6,
        },
    );

    let pointer = context_for(&format!(
        "{}void main () {{\n    Foo* p = null;\n    p->\n}}\n",
        shared
    ));
    let by_pointer = complete_at(
        &pointer,
        "    p->",
        Position {
            line: 7,
            character: 7,
        },
    );

    assert_eq!(labels(&by_instance), labels(&by_pointer));
    assert!(labels(&by_pointer).contains(&"a"));
    assert!(labels(&by_pointer).contains(&"bar"));
}

#[test]
fn test_completion_fallback_on_partial_line() {
    // The `]` derails the statement and recovery skips the rest of the
    // line, so no node covers the cursor after `Foo.`; the token
    // fallback still resolves `Foo` through the enclosing scopes.
    let context = context_for(
        "class Foo {\n    public int a;\n    public void bar () {\n    }\n}\nvoid helper () {\n    Foo f = new Foo ();\n    int g = ] Foo.;\n    int h = 2;\n    g = h; f.a = g;\n}\n",
    );

    let items = complete_at(
        &context,
        "    int g = ] Foo.;",
        Position {
            line: 7,
            character: 18,
        },
    );

    assert!(labels(&items).contains(&"bar"), "got {:?}", labels(&items));
    assert!(labels(&items).contains(&"a"));
}

#[test]
fn test_completion_items_are_enumerable_members_without_duplicates() {
    let context = context_for(
        "class Foo {\n    public int a;\n    public int b;\n    public void bar () {\n    }\n    public signal void changed ();\n    public int size { get; set; }\n    public const int LIMIT = 8;\n}\nvoid main () {\n    Foo f = new Foo ();\n    f.\n}\n",
    );
    let items = complete_at(
        &context,
        "    f.",
        Position {
            line: 11,
            character: 6,
        },
    );

    // Exactly the declared members, each once.
    let mut sorted = labels(&items);
    sorted.sort_unstable();
    assert_eq!(sorted, vec!["LIMIT", "a", "b", "bar", "changed", "size"]);

    let unique: HashSet<&str> = labels(&items).into_iter().collect();
    assert_eq!(unique.len(), items.len());

    // Kinds follow the member kind table.
    let kind_of = |label: &str| {
        items
            .iter()
            .find(|i| i.label == label)
            .and_then(|i| i.kind)
            .unwrap()
    };
    assert_eq!(kind_of("changed"), CompletionItemKind::METHOD);
    assert_eq!(kind_of("size"), CompletionItemKind::PROPERTY);
    assert_eq!(kind_of("LIMIT"), CompletionItemKind::VALUE);
}

#[test]
fn test_no_completion_after_bare_greater() {
    let context = context_for("void main () {\n    int a = 2;\n    a = a;\n}\n");
    let items = complete_at(
        &context,
        "    a >",
        Position {
            line: 2,
            character: 7,
        },
    );
    assert!(items.is_empty());
}

#[test]
fn test_empty_completion_when_nothing_resolves() {
    let context = context_for("void main () {\n    ghost.\n}\n");
    let items = complete_at(
        &context,
        "    ghost.",
        Position {
            line: 1,
            character: 10,
        },
    );
    assert!(items.is_empty());
}
