// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Position and scope locators
//!
//! The locators answer "what is at this source position": the node
//! locator collects every node whose reference sits on the query line and
//! spans the query column, the scope locator collects lexical scopes
//! whose declared symbols surround the position, and the token finder
//! recovers from positions the parser left uncovered by resolving the
//! trailing identifier through the enclosing scope chains.
//!
//! All positions here use the compiler convention (1-based, inclusive
//! columns); the LSP boundary converts before calling in.

use std::path::Path;

use tracing::{debug, warn};

use crate::node::{Ast, NodeId, NodeKind};
use crate::scope::ScopeId;
use crate::source::{SourceLocation, SourceReference};
use crate::symbol::SymbolId;
use crate::visitor::{Collect, collect};

/// Collects nodes whose source reference covers one position.
struct NodeAtPosition<'a> {
    file: &'a Path,
    location: SourceLocation,
}

impl Collect for NodeAtPosition<'_> {
    type Output = NodeId;

    fn matches(&self, ast: &Ast, node: NodeId) -> bool {
        if matches!(ast.node(node).kind, NodeKind::SourceRoot) {
            return false;
        }
        let Some(sref) = ast.node(node).source_ref.as_ref() else {
            return false;
        };
        if sref.file.as_path() != self.file {
            return false;
        }
        if sref.begin.line > sref.end.line {
            warn!("skipping node with degenerate source reference {}", sref);
            return false;
        }
        // Multi-line nodes are containers; at cursor resolution we want
        // the innermost same-line token.
        if !sref.single_line() {
            return false;
        }
        sref.begin.line == self.location.line
            && sref.begin.column <= self.location.column
            && self.location.column <= sref.end.column
    }

    fn project(&self, _ast: &Ast, node: NodeId) -> NodeId {
        node
    }
}

/// Find every node in `file` whose reference covers `location`.
///
/// The result is in pre-order; an empty result is a miss, not an error.
pub fn find_symbols_at(ast: &Ast, file: &Path, location: SourceLocation) -> Vec<NodeId> {
    let Some(root) = ast.root_for_file(file) else {
        debug!("no syntax tree for {}", file.display());
        return Vec::new();
    };
    collect(
        ast,
        root,
        &NodeAtPosition { file, location },
    )
}

/// Pick the tightest candidate: maximal begin column, then minimal end
/// column; the first candidate wins ties, so nested pre-order results
/// favor the outermost of two identical spans.
pub fn best_match(ast: &Ast, candidates: &[NodeId]) -> Option<NodeId> {
    let mut best: Option<(NodeId, u32, u32)> = None;
    for &id in candidates {
        let Some(sref) = ast.node(id).source_ref.as_ref() else {
            continue;
        };
        let (begin, end) = (sref.begin.column, sref.end.column);
        let better = match best {
            None => true,
            Some((_, best_begin, best_end)) => {
                begin > best_begin || (begin == best_begin && end < best_end)
            }
        };
        if better {
            best = Some((id, begin, end));
        }
    }
    best.map(|(id, _, _)| id)
}

/// The region covered by a scope's declared symbols in `file`: the union
/// of the source references of every symbol in its table. Symbols without
/// a reference, or declared in other files, do not contribute. `None`
/// when nothing contributes.
pub fn scope_range(ast: &Ast, scope: ScopeId, file: &Path) -> Option<SourceReference> {
    let mut range: Option<SourceReference> = None;
    for (_, sym) in ast.scope(scope).entries() {
        let Some(sref) = ast.symbol(sym).source_ref.as_ref() else {
            continue;
        };
        if sref.file.as_path() != file {
            continue;
        }
        range = Some(match range {
            None => sref.clone(),
            Some(existing) => existing.union(sref),
        });
    }
    range
}

/// Collects the owning scope of every declared symbol whose scope
/// surrounds one position.
struct ScopeAtPosition<'a> {
    file: &'a Path,
    location: SourceLocation,
}

fn owning_scope(ast: &Ast, node: NodeId) -> Option<ScopeId> {
    let sym = ast.node(node).symbol_reference?;
    ast.symbol(sym).owner
}

impl Collect for ScopeAtPosition<'_> {
    type Output = ScopeId;

    fn matches(&self, ast: &Ast, node: NodeId) -> bool {
        if !ast.node(node).kind.is_declaration() {
            return false;
        }
        let Some(owner) = owning_scope(ast, node) else {
            return false;
        };
        match scope_range(ast, owner, self.file) {
            Some(range) => range.contains(self.location),
            None => false,
        }
    }

    fn project(&self, ast: &Ast, node: NodeId) -> ScopeId {
        owning_scope(ast, node).unwrap_or_else(|| ast.root_scope())
    }
}

/// Find the lexical scopes whose declared symbols surround `location`.
///
/// A scope is emitted once per declared symbol it contains, so the result
/// may hold duplicates; callers iterate.
pub fn find_scopes_at(ast: &Ast, file: &Path, location: SourceLocation) -> Vec<ScopeId> {
    let Some(root) = ast.root_for_file(file) else {
        return Vec::new();
    };
    collect(
        ast,
        root,
        &ScopeAtPosition { file, location },
    )
}

/// Extract the identifier ending at byte index `cursor` of `line`.
///
/// Walks backwards over alphanumerics and underscores; returns `None`
/// when the character before the cursor is not part of an identifier.
pub fn extract_token(line: &str, cursor: usize) -> Option<&str> {
    let end = cursor.min(line.len());
    let bytes = line.as_bytes();
    let mut start = end;
    while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_') {
        start -= 1;
    }
    if start == end {
        None
    } else {
        Some(&line[start..end])
    }
}

/// Resolve `token` through the scope chains enclosing `location`.
///
/// Used when nothing sits at the cursor itself, which is the common case
/// while the user is still typing a dotted chain the parser could not
/// close. Among all bindings found, the one with the tightest declared
/// source range wins.
pub fn find_symbol_by_token(
    ast: &Ast,
    file: &Path,
    location: SourceLocation,
    token: &str,
) -> Option<SymbolId> {
    let mut candidates = Vec::new();
    for scope in find_scopes_at(ast, file, location) {
        for chain_scope in ast.scope_chain(scope) {
            if let Some(sym) = ast.scope(chain_scope).get(token) {
                candidates.push(sym);
            }
        }
    }

    let mut best: Option<(SymbolId, u32, u32)> = None;
    for sym in candidates {
        let Some(sref) = ast.symbol(sym).source_ref.as_ref() else {
            // Builtin symbols carry no reference; keep as a last resort.
            if best.is_none() {
                best = Some((sym, 0, u32::MAX));
            }
            continue;
        };
        let (begin, end) = (sref.begin.column, sref.end.column);
        let better = match best {
            None => true,
            Some((_, best_begin, best_end)) => {
                begin > best_begin || (begin == best_begin && end < best_end)
            }
        };
        if better {
            best = Some((sym, begin, end));
        }
    }
    best.map(|(sym, _, _)| sym)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::scope::Scope;
    use crate::symbol::{Symbol, SymbolKind};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn file() -> Arc<PathBuf> {
        Arc::new(PathBuf::from("/test.vala"))
    }

    fn sref(begin: (u32, u32), end: (u32, u32)) -> SourceReference {
        SourceReference::new(
            file(),
            SourceLocation::new(begin.0, begin.1),
            SourceLocation::new(end.0, end.1),
        )
    }

    fn identifier(ast: &mut Ast, name: &str, span: ((u32, u32), (u32, u32))) -> NodeId {
        ast.add_node(Node::new(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            Some(sref(span.0, span.1)),
        ))
    }

    /// Root covering the whole file with two identifiers on line 1.
    fn build_simple_ast() -> (Ast, NodeId, NodeId) {
        let mut ast = Ast::new();
        let outer = identifier(&mut ast, "outer", ((1, 1), (1, 20)));
        let inner = identifier(&mut ast, "inner", ((1, 8), (1, 12)));
        ast.node_mut(outer).children.push(inner);

        let root = ast.add_node(Node::new(
            NodeKind::SourceRoot,
            Some(sref((1, 1), (9, 1))),
        ));
        ast.node_mut(root).children.push(outer);
        ast.add_root(root);
        (ast, outer, inner)
    }

    #[test]
    fn test_find_symbols_at_collects_covering_nodes() {
        let (ast, outer, inner) = build_simple_ast();

        let found = find_symbols_at(&ast, Path::new("/test.vala"), SourceLocation::new(1, 10));
        assert_eq!(found, vec![outer, inner]);

        let found = find_symbols_at(&ast, Path::new("/test.vala"), SourceLocation::new(1, 2));
        assert_eq!(found, vec![outer]);

        let found = find_symbols_at(&ast, Path::new("/test.vala"), SourceLocation::new(2, 1));
        assert!(found.is_empty());
    }

    #[test]
    fn test_best_match_prefers_nested_span() {
        let (ast, _outer, inner) = build_simple_ast();

        let found = find_symbols_at(&ast, Path::new("/test.vala"), SourceLocation::new(1, 10));
        assert_eq!(best_match(&ast, &found), Some(inner));
    }

    #[test]
    fn test_best_match_tie_keeps_first() {
        let mut ast = Ast::new();
        let first = identifier(&mut ast, "first", ((1, 3), (1, 7)));
        let second = identifier(&mut ast, "second", ((1, 3), (1, 7)));

        assert_eq!(best_match(&ast, &[first, second]), Some(first));
    }

    #[test]
    fn test_multi_line_nodes_are_skipped() {
        let mut ast = Ast::new();
        let block = ast.add_node(Node::new(NodeKind::Block, Some(sref((1, 1), (3, 1)))));
        let root = ast.add_node(Node::new(
            NodeKind::SourceRoot,
            Some(sref((1, 1), (3, 1))),
        ));
        ast.node_mut(root).children.push(block);
        ast.add_root(root);

        let found = find_symbols_at(&ast, Path::new("/test.vala"), SourceLocation::new(2, 1));
        assert!(found.is_empty());
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token("Foo f = bar", 11), Some("bar"));
        assert_eq!(extract_token("obj.field", 3), Some("obj"));
        assert_eq!(extract_token("a + ", 4), None);
        assert_eq!(extract_token("snake_case", 10), Some("snake_case"));
        assert_eq!(extract_token("", 0), None);
    }

    /// One declared local inside a block scope under the root scope.
    fn build_scoped_ast() -> (Ast, SymbolId) {
        let mut ast = Ast::new();
        let root_scope = ast.root_scope();
        let block_scope = ast.add_scope(Scope::new(Some(root_scope)));

        let decl = ast.add_node(Node::new(
            NodeKind::LocalVariable {
                name: "counter".to_string(),
            },
            Some(sref((2, 9), (2, 15))),
        ));
        let sym = ast.add_symbol(
            Symbol::new("counter", SymbolKind::LocalVariable)
                .with_node(decl)
                .with_source_ref(sref((2, 9), (2, 15))),
        );
        ast.symbol_mut(sym).owner = Some(block_scope);
        ast.scope_mut(block_scope).insert("counter", sym);
        ast.node_mut(decl).symbol_reference = Some(sym);

        let root = ast.add_node(Node::new(
            NodeKind::SourceRoot,
            Some(sref((1, 1), (4, 1))),
        ));
        ast.node_mut(root).children.push(decl);
        ast.add_root(root);
        (ast, sym)
    }

    #[test]
    fn test_find_scopes_at_declared_symbol() {
        let (ast, sym) = build_scoped_ast();

        let scopes = find_scopes_at(&ast, Path::new("/test.vala"), SourceLocation::new(2, 12));
        assert_eq!(scopes.len(), 1);
        assert_eq!(ast.symbol(sym).owner, Some(scopes[0]));

        // Outside the declared range nothing is found.
        let scopes = find_scopes_at(&ast, Path::new("/test.vala"), SourceLocation::new(3, 1));
        assert!(scopes.is_empty());
    }

    #[test]
    fn test_find_symbol_by_token_walks_parent_chain() {
        let (mut ast, local) = build_scoped_ast();

        // A second symbol in the root scope, reachable through the chain.
        let global = ast.add_symbol(
            Symbol::new("Widget", SymbolKind::Class).with_source_ref(sref((1, 7), (1, 12))),
        );
        let root_scope = ast.root_scope();
        ast.symbol_mut(global).owner = Some(root_scope);
        ast.scope_mut(root_scope).insert("Widget", global);

        let found = find_symbol_by_token(
            &ast,
            Path::new("/test.vala"),
            SourceLocation::new(2, 12),
            "Widget",
        );
        assert_eq!(found, Some(global));

        let found = find_symbol_by_token(
            &ast,
            Path::new("/test.vala"),
            SourceLocation::new(2, 12),
            "counter",
        );
        assert_eq!(found, Some(local));
    }
}
