// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Vala LSP - AST model
//!
//! This crate provides the syntax-tree, symbol, and scope model shared by
//! the front-end and the language server, plus the generic traversal and
//! the position/scope locators built on it.
//!
//! ## Overview
//!
//! The whole program is held in one [`Ast`] arena:
//!
//! - [`Node`]s form per-file syntax trees with uniform child lists;
//! - [`Symbol`]s are the named declarations analysis produced;
//! - [`Scope`]s carry ordered symbol tables and parent links.
//!
//! Everything is addressed by index newtypes ([`NodeId`], [`SymbolId`],
//! [`ScopeId`]), so back references stay cheap and cycle-free.
//!
//! ## Queries
//!
//! - [`visitor::collect`]: generic pre-order traversal with a caller
//!   supplied predicate and projection.
//! - [`locator::find_symbols_at`] / [`locator::best_match`]: nodes at a
//!   position and the tightest of them.
//! - [`locator::find_scopes_at`]: lexical scopes surrounding a position.
//! - [`locator::find_symbol_by_token`]: fallback resolution of a trailing
//!   identifier through enclosing scope chains.
//!
//! Positions in this crate follow the compiler convention: 1-based lines
//! and columns, with the end column inclusive.

pub mod locator;
pub mod node;
pub mod scope;
pub mod source;
pub mod symbol;
pub mod types;
pub mod visitor;

// Re-exports for convenience
pub use locator::{
    best_match, extract_token, find_scopes_at, find_symbol_by_token, find_symbols_at, scope_range,
};
pub use node::{Ast, BinaryOp, LiteralValue, Node, NodeId, NodeKind, UnaryOp};
pub use scope::{Scope, ScopeId};
pub use source::{SourceLocation, SourceReference};
pub use symbol::{CREATION_METHOD_NAME, Symbol, SymbolId, SymbolKind};
pub use types::DataType;
