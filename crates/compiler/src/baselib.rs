// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Base library seeding
//!
//! The fundamental types live in the root namespace, the way the
//! platform's base interface files declare them: `int`, `string`, and
//! friends are ordinary struct symbols with real members, so primitive
//! member completion behaves like it does against the full platform
//! library. A minimal `GLib` namespace is seeded for the implicit using
//! directive applied to every source file.
//!
//! Builtin symbols carry no source reference; go-to-definition on them
//! answers null, matching symbols that live in external packages.

use vala_lsp_ast::{Ast, DataType, Scope, ScopeId, Symbol, SymbolId, SymbolKind};

/// Register the builtin types into the arena's root scope.
pub fn register(ast: &mut Ast) {
    let root = ast.root_scope();

    let int = value_type(ast, root, "int");
    let uint = value_type(ast, root, "uint");
    let bool_ = value_type(ast, root, "bool");
    let char_ = value_type(ast, root, "char");
    let double = value_type(ast, root, "double");
    let string = value_type(ast, root, "string");

    // Members mirror the handful every Vala program leans on.
    for ty in [int, uint, bool_, char_, double] {
        method(ast, ty, "to_string", DataType::ValueType(string));
    }
    constant(ast, int, "MIN", DataType::ValueType(int));
    constant(ast, int, "MAX", DataType::ValueType(int));

    field(ast, string, "length", DataType::ValueType(int));
    method(ast, string, "up", DataType::ValueType(string));
    method(ast, string, "down", DataType::ValueType(string));
    method(ast, string, "substring", DataType::ValueType(string));
    method(ast, string, "contains", DataType::ValueType(bool_));

    // The implicit `using GLib;` needs a namespace to resolve against.
    let glib = namespace(ast, root, "GLib");
    let object = class(ast, glib, "Object");
    method(ast, object, "get_type", DataType::ValueType(int));
}

fn container(
    ast: &mut Ast,
    parent: ScopeId,
    name: &str,
    kind: SymbolKind,
) -> SymbolId {
    let sym = ast.add_symbol(Symbol::new(name, kind));
    ast.symbol_mut(sym).owner = Some(parent);
    let scope = ast.add_scope(Scope::new(Some(parent)).with_owner(sym));
    ast.symbol_mut(sym).scope = Some(scope);
    ast.scope_mut(parent).insert(name, sym);
    sym
}

fn value_type(ast: &mut Ast, root: ScopeId, name: &str) -> SymbolId {
    container(ast, root, name, SymbolKind::Struct)
}

fn namespace(ast: &mut Ast, root: ScopeId, name: &str) -> SymbolId {
    container(ast, root, name, SymbolKind::Namespace)
}

fn class(ast: &mut Ast, namespace: SymbolId, name: &str) -> SymbolId {
    let parent = ast
        .symbol(namespace)
        .scope
        .unwrap_or_else(|| ast.root_scope());
    let sym = container(ast, parent, name, SymbolKind::Class);
    ast.symbol_mut(namespace).members.push(sym);
    sym
}

fn member(
    ast: &mut Ast,
    owner: SymbolId,
    name: &str,
    kind: SymbolKind,
    data_type: DataType,
) {
    let Some(scope) = ast.symbol(owner).scope else {
        return;
    };
    let sym = ast.add_symbol(Symbol::new(name, kind).with_data_type(data_type));
    ast.symbol_mut(sym).owner = Some(scope);
    ast.scope_mut(scope).insert(name, sym);
    ast.symbol_mut(owner).members.push(sym);
}

fn method(ast: &mut Ast, owner: SymbolId, name: &str, return_type: DataType) {
    member(ast, owner, name, SymbolKind::Method, return_type);
}

fn field(ast: &mut Ast, owner: SymbolId, name: &str, data_type: DataType) {
    member(ast, owner, name, SymbolKind::Field, data_type);
}

fn constant(ast: &mut Ast, owner: SymbolId, name: &str, data_type: DataType) {
    member(ast, owner, name, SymbolKind::Constant, data_type);
}
