// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Position locator round-trip tests
//!
//! For every node with a single-line source reference, querying the
//! locator at each column inside the reference must yield that node
//! among the candidates, and the tightest match must sit inside the
//! node's own range.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vala_lsp_ast::visitor::{Collect, collect_all};
use vala_lsp_ast::{Ast, NodeId, NodeKind, SourceLocation, best_match, find_symbols_at};
use vala_lsp_compiler::{Reporter, analyze, parse_file};

struct EveryNode;

impl Collect for EveryNode {
    type Output = NodeId;

    fn matches(&self, _ast: &Ast, _node: NodeId) -> bool {
        true
    }

    fn project(&self, _ast: &Ast, node: NodeId) -> NodeId {
        node
    }
}

fn analyzed(text: &str) -> Ast {
    let mut ast = Ast::new();
    vala_lsp_compiler::baselib::register(&mut ast);
    let mut reporter = Reporter::new();
    parse_file(
        &mut ast,
        &mut reporter,
        Arc::new(PathBuf::from("/test.vala")),
        text,
    );
    analyze(&mut ast, &mut reporter, &[]);
    ast
}

fn assert_roundtrip(text: &str) {
    let ast = analyzed(text);
    let file = Path::new("/test.vala");

    let mut checked = 0;
    for node in collect_all(&ast, &EveryNode) {
        if matches!(ast.node(node).kind, NodeKind::SourceRoot) {
            continue;
        }
        let Some(sref) = ast.node(node).source_ref.clone() else {
            continue;
        };
        if !sref.single_line() {
            continue;
        }

        for column in sref.begin.column..=sref.end.column {
            let location = SourceLocation::new(sref.begin.line, column);
            let candidates = find_symbols_at(&ast, file, location);
            assert!(
                candidates.contains(&node),
                "node {:?} missing at {}: candidates {:?}",
                ast.node(node).kind,
                location,
                candidates
            );

            // The tightest match nests inside every candidate, this node
            // included.
            let best = best_match(&ast, &candidates).expect("non-empty candidates");
            let best_ref = ast.node(best).source_ref.clone().expect("candidate ref");
            assert!(best_ref.begin.column >= sref.begin.column);
            assert!(best_ref.end.column <= sref.end.column);
        }
        checked += 1;
    }
    assert!(checked > 0, "no single-line nodes in fixture");
}

#[test]
fn test_roundtrip_function_body() {
    assert_roundtrip("int answer () {\n    int x = 3;\n    return x + 39;\n}\n");
}

#[test]
fn test_roundtrip_class_members() {
    assert_roundtrip(
        "class Counter {\n    public int count;\n    public void step () {\n        this.count = this.count + 1;\n    }\n}\n",
    );
}

#[test]
fn test_roundtrip_calls_and_creation() {
    assert_roundtrip(
        "class Foo {\n    public void bar () {\n    }\n}\nvoid main () {\n    var f = new Foo ();\n    f.bar ();\n}\n",
    );
}

#[test]
fn test_roundtrip_enum_and_errordomain() {
    assert_roundtrip(
        "enum Color { RED, GREEN }\nerrordomain IoError { NOT_FOUND }\nvoid main () {\n    Color c = Color.RED;\n    c = c;\n}\n",
    );
}

#[test]
fn test_locator_miss_is_empty_not_error() {
    let ast = analyzed("void main () {\n}\n");
    let candidates = find_symbols_at(
        &ast,
        Path::new("/test.vala"),
        SourceLocation::new(50, 1),
    );
    assert!(candidates.is_empty());
    assert_eq!(best_match(&ast, &candidates), None);
}
