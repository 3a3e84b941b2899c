// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Document synchronization integration tests
//!
//! Exercises the document store and compilation context together the way
//! the change handler does: apply edits, push the new text into the
//! context, and observe what the next analysis sees.

use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent, Url};

use vala_lsp_compiler::{CompilationContext, SourceFile, SourceKind};
use vala_lsp_lsp::DocumentStore;

fn test_uri() -> Url {
    Url::parse("file:///main.vala").unwrap()
}

fn full(text: &str) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: None,
        range_length: None,
        text: text.to_string(),
    }
}

fn splice(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: Some(Range {
            start: Position {
                line: start.0,
                character: start.1,
            },
            end: Position {
                line: end.0,
                character: end.1,
            },
        }),
        range_length: Some(0),
        text: text.to_string(),
    }
}

async fn open(store: &DocumentStore, context: &mut CompilationContext, version: i32, text: &str) {
    store
        .open(
            test_uri(),
            PathBuf::from("/main.vala"),
            "vala".to_string(),
            version,
            text,
        )
        .await;
    context.add_source_file(SourceFile::new(
        PathBuf::from("/main.vala"),
        SourceKind::Source,
        text.to_string(),
    ));
    context.check();
}

async fn apply(
    store: &DocumentStore,
    context: &mut CompilationContext,
    version: i32,
    changes: &[TextDocumentContentChangeEvent],
) -> bool {
    match store.change(&test_uri(), version, changes).await {
        Ok(content) => {
            context.set_source_text(Path::new("/main.vala"), content);
            true
        }
        Err(_) => false,
    }
}

#[tokio::test]
async fn test_stale_change_leaves_content_and_analysis_untouched() {
    let store = DocumentStore::new();
    let mut context = CompilationContext::new();

    // Opened at version 3.
    open(&store, &mut context, 3, "void main () {\n    stale ();\n}\n").await;
    assert_eq!(context.reporter().error_count(), 1);

    // A version-2 edit that would fix the file must be dropped.
    let accepted = apply(
        &store,
        &mut context,
        2,
        &[full("void stale () {\n}\nvoid main () {\n    stale ();\n}\n")],
    )
    .await;
    assert!(!accepted);

    context.check();
    let doc = store.get(&test_uri()).await.unwrap();
    assert_eq!(doc.version(), 3);
    assert!(doc.get_content().contains("    stale ();"));
    assert_eq!(context.reporter().error_count(), 1);
}

#[tokio::test]
async fn test_versions_take_the_maximum_seen() {
    let store = DocumentStore::new();
    let mut context = CompilationContext::new();
    open(&store, &mut context, 1, "void main () {\n}\n").await;

    for (version, accepted) in [(4, true), (2, false), (7, true), (6, false)] {
        let result = apply(
            &store,
            &mut context,
            version,
            &[full("void main () {\n}\n")],
        )
        .await;
        assert_eq!(result, accepted, "version {}", version);
    }

    let doc = store.get(&test_uri()).await.unwrap();
    assert_eq!(doc.version(), 7);
}

#[tokio::test]
async fn test_edit_burst_costs_one_analysis() {
    let store = DocumentStore::new();
    let mut context = CompilationContext::new();
    open(&store, &mut context, 1, "void main () {\n}\n").await;
    let baseline = context.analyses_run();

    // Three edits back to back, no query in between.
    for (version, text) in [
        (2, "void main () {\n    int a = 1;\n}\n"),
        (3, "void main () {\n    int a = 2;\n}\n"),
        (4, "void main () {\n    int a = 2;\n    a = a;\n}\n"),
    ] {
        assert!(apply(&store, &mut context, version, &[full(text)]).await);
    }

    // The query triggers exactly one run.
    context.check();
    assert_eq!(context.analyses_run(), baseline + 1);

    // And it reflects the final snapshot.
    assert_eq!(context.reporter().error_count(), 0);
    assert_eq!(context.reporter().warning_count(), 0);
}

#[tokio::test]
async fn test_incremental_splice_reaches_analysis() {
    let store = DocumentStore::new();
    let mut context = CompilationContext::new();
    open(&store, &mut context, 1, "void main () {\n    val = 1;\n}\n").await;
    assert_eq!(context.reporter().error_count(), 1);

    // Insert a declaration for `val` above the assignment.
    assert!(
        apply(
            &store,
            &mut context,
            2,
            &[splice((1, 0), (1, 0), "    int val;\n")],
        )
        .await
    );

    context.check();
    assert_eq!(
        context.reporter().error_count(),
        0,
        "{:?}",
        context.reporter().errors()
    );

    let doc = store.get(&test_uri()).await.unwrap();
    assert_eq!(
        doc.get_content(),
        "void main () {\n    int val;\n    val = 1;\n}\n"
    );
}
