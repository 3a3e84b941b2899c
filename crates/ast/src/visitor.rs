// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Generic AST traversal
//!
//! One pre-order walk serves every finder in the server. A [`Collect`]
//! implementation supplies a pure `matches` predicate and a `project`
//! mapping matched nodes to whatever the caller accumulates: node ids,
//! scope ids, anything. The walk descends into **every** child of every
//! node, matched or not, so no syntactic construct is ever skipped.

use crate::node::{Ast, NodeId};

/// A projection collected over a pre-order traversal.
pub trait Collect {
    /// What the traversal accumulates.
    type Output;

    /// Decide whether `node` contributes a result. Must be pure; side
    /// effects belong in [`Collect::project`].
    fn matches(&self, ast: &Ast, node: NodeId) -> bool;

    /// Map a matching node to a result.
    fn project(&self, ast: &Ast, node: NodeId) -> Self::Output;
}

/// Walk the subtree under `root` in pre-order and collect projections of
/// all matching nodes, in traversal order.
pub fn collect<C: Collect>(ast: &Ast, root: NodeId, collector: &C) -> Vec<C::Output> {
    let mut results = Vec::new();
    visit(ast, root, collector, &mut results);
    results
}

/// Walk every registered source-file root.
pub fn collect_all<C: Collect>(ast: &Ast, collector: &C) -> Vec<C::Output> {
    let mut results = Vec::new();
    for root in ast.roots() {
        visit(ast, *root, collector, &mut results);
    }
    results
}

fn visit<C: Collect>(ast: &Ast, node: NodeId, collector: &C, results: &mut Vec<C::Output>) {
    if collector.matches(ast, node) {
        results.push(collector.project(ast, node));
    }
    for child in &ast.node(node).children {
        visit(ast, *child, collector, results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeKind};

    /// Collects the ids of all identifier nodes.
    struct Identifiers;

    impl Collect for Identifiers {
        type Output = NodeId;

        fn matches(&self, ast: &Ast, node: NodeId) -> bool {
            matches!(ast.node(node).kind, NodeKind::Identifier { .. })
        }

        fn project(&self, _ast: &Ast, node: NodeId) -> NodeId {
            node
        }
    }

    fn identifier(ast: &mut Ast, name: &str) -> NodeId {
        ast.add_node(Node::new(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            None,
        ))
    }

    #[test]
    fn test_preorder_collects_in_traversal_order() {
        let mut ast = Ast::new();

        let a = identifier(&mut ast, "a");
        let b = identifier(&mut ast, "b");
        let inner = ast.add_node(Node::new(NodeKind::Block, None));
        ast.node_mut(inner).children.push(b);
        let c = identifier(&mut ast, "c");

        let root = ast.add_node(Node::new(NodeKind::Block, None));
        ast.node_mut(root).children = vec![a, inner, c];

        let found = collect(&ast, root, &Identifiers);
        assert_eq!(found, vec![a, b, c]);
    }

    #[test]
    fn test_children_of_unmatched_nodes_are_visited() {
        let mut ast = Ast::new();

        // Identifier nested two blocks deep; neither block matches but
        // the walk must still reach the leaf.
        let leaf = identifier(&mut ast, "deep");
        let inner = ast.add_node(Node::new(NodeKind::Block, None));
        ast.node_mut(inner).children.push(leaf);
        let root = ast.add_node(Node::new(NodeKind::Block, None));
        ast.node_mut(root).children.push(inner);

        let found = collect(&ast, root, &Identifiers);
        assert_eq!(found, vec![leaf]);
    }

    #[test]
    fn test_collect_all_walks_every_root() {
        let mut ast = Ast::new();

        let a = identifier(&mut ast, "a");
        let root_one = ast.add_node(Node::new(NodeKind::SourceRoot, None));
        ast.node_mut(root_one).children.push(a);
        ast.add_root(root_one);

        let b = identifier(&mut ast, "b");
        let root_two = ast.add_node(Node::new(NodeKind::SourceRoot, None));
        ast.node_mut(root_two).children.push(b);
        ast.add_root(root_two);

        let found = collect_all(&ast, &Identifiers);
        assert_eq!(found, vec![a, b]);
    }
}
