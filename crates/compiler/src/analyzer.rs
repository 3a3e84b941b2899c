// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Semantic analyzer
//!
//! Two passes over every registered source file. The *declare* pass
//! builds symbols and scope tables for all declarations; the *resolve*
//! pass binds type annotations, identifiers, and member accesses, filling
//! `symbol_reference` and `value_type` on expression nodes. Analysis is
//! best-effort throughout: an unresolved name produces one diagnostic and
//! an untyped expression, never an abort, so queries always see whatever
//! could be bound.

use std::collections::HashMap;

use tracing::debug;

use vala_lsp_ast::{
    Ast, CREATION_METHOD_NAME, DataType, LiteralValue, NodeId, NodeKind, Scope, ScopeId,
    SourceReference, Symbol, SymbolId, SymbolKind, UnaryOp,
};

use crate::report::Reporter;

/// Analyze every file registered in the arena.
///
/// `default_usings` are namespace names applied implicitly to each file,
/// before its own using directives.
pub fn analyze(ast: &mut Ast, reporter: &mut Reporter, default_usings: &[String]) {
    let mut analyzer = Analyzer {
        ast,
        reporter,
        block_scopes: HashMap::new(),
    };

    let roots = analyzer.ast.roots().to_vec();
    let root_scope = analyzer.ast.root_scope();

    for root in &roots {
        let children = analyzer.ast.node(*root).children.clone();
        for child in children {
            analyzer.declare(child, root_scope);
        }
    }

    for root in &roots {
        let usings = analyzer.resolve_usings(*root, default_usings);
        let children = analyzer.ast.node(*root).children.clone();
        for child in children {
            analyzer.resolve(child, root_scope, &usings);
        }
    }

    analyzer.warn_unused();
    debug!(
        "analysis bound {} symbols in {} scopes",
        analyzer.ast.symbol_count(),
        analyzer.ast.scope_count()
    );
}

struct Analyzer<'a> {
    ast: &'a mut Ast,
    reporter: &'a mut Reporter,
    /// Block node → scope created for it in the declare pass.
    block_scopes: HashMap<NodeId, ScopeId>,
}

impl Analyzer<'_> {
    // ----- pass 1: declare -----

    /// Declare `node` into `scope`, returning the declared symbol.
    fn declare(&mut self, node: NodeId, scope: ScopeId) -> Option<SymbolId> {
        let kind = self.ast.node(node).kind.clone();
        match kind {
            NodeKind::Namespace { name } => self.declare_namespace(node, scope, &name),
            NodeKind::Class { name } => {
                self.declare_container(node, scope, &name, SymbolKind::Class)
            }
            NodeKind::Interface { name } => {
                self.declare_container(node, scope, &name, SymbolKind::Interface)
            }
            NodeKind::Struct { name } => {
                self.declare_container(node, scope, &name, SymbolKind::Struct)
            }
            NodeKind::Enum { name } => {
                let sym = self.declare_container(node, scope, &name, SymbolKind::Enum)?;
                self.type_members(sym, DataType::ValueType(sym), SymbolKind::EnumValue);
                Some(sym)
            }
            NodeKind::ErrorDomain { name } => {
                let sym = self.declare_container(node, scope, &name, SymbolKind::ErrorDomain)?;
                self.type_members(sym, DataType::Error(sym), SymbolKind::ErrorCode);
                Some(sym)
            }
            NodeKind::EnumValue { name } => {
                Some(self.declare_symbol(node, scope, &name, SymbolKind::EnumValue))
            }
            NodeKind::ErrorCode { name } => {
                Some(self.declare_symbol(node, scope, &name, SymbolKind::ErrorCode))
            }
            NodeKind::Delegate { name } => {
                self.declare_callable(node, scope, &name, SymbolKind::Delegate)
            }
            NodeKind::Signal { name } => {
                self.declare_callable(node, scope, &name, SymbolKind::Signal)
            }
            NodeKind::Method { name } => {
                self.declare_callable(node, scope, &name, SymbolKind::Method)
            }
            NodeKind::CreationMethod { .. } => {
                let sym = self.declare_callable(
                    node,
                    scope,
                    CREATION_METHOD_NAME,
                    SymbolKind::CreationMethod,
                )?;
                // A creation method yields an instance of its container.
                if let Some(owner) = self.ast.scope(scope).owner {
                    let data_type = match self.ast.symbol(owner).kind {
                        SymbolKind::Class | SymbolKind::Interface => DataType::Object(owner),
                        SymbolKind::Struct => DataType::ValueType(owner),
                        _ => DataType::Unresolved,
                    };
                    self.ast.symbol_mut(sym).data_type = Some(data_type);
                }
                Some(sym)
            }
            NodeKind::Property { name } => {
                Some(self.declare_symbol(node, scope, &name, SymbolKind::Property))
            }
            NodeKind::Field { name } => {
                Some(self.declare_symbol(node, scope, &name, SymbolKind::Field))
            }
            NodeKind::Constant { name } => {
                Some(self.declare_symbol(node, scope, &name, SymbolKind::Constant))
            }
            NodeKind::Parameter { name } => {
                Some(self.declare_symbol(node, scope, &name, SymbolKind::Parameter))
            }
            NodeKind::LocalVariable { name } => {
                Some(self.declare_symbol(node, scope, &name, SymbolKind::LocalVariable))
            }
            NodeKind::Block => {
                let block_scope = self.ast.add_scope(Scope::new(Some(scope)));
                self.block_scopes.insert(node, block_scope);
                let children = self.ast.node(node).children.clone();
                for child in children {
                    self.declare(child, block_scope);
                }
                None
            }
            NodeKind::IfStatement
            | NodeKind::WhileStatement
            | NodeKind::ForStatement
            | NodeKind::ReturnStatement
            | NodeKind::ExpressionStatement => {
                let children = self.ast.node(node).children.clone();
                for child in children {
                    self.declare(child, scope);
                }
                None
            }
            // Using directives, type references, and expressions declare
            // nothing.
            _ => None,
        }
    }

    fn declare_symbol(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
    ) -> SymbolId {
        let sref = self.ast.node(node).source_ref.clone();
        let mut symbol = Symbol::new(name, kind).with_node(node);
        if let Some(sref) = sref.clone() {
            symbol = symbol.with_source_ref(sref);
        }
        let sym = self.ast.add_symbol(symbol);
        self.ast.symbol_mut(sym).owner = Some(scope);
        if !self.ast.scope_mut(scope).insert(name, sym) {
            let context = self.scope_display_name(scope);
            self.reporter.error(
                sref,
                format!("`{}' already contains a definition for `{}'", context, name),
            );
        }
        self.ast.node_mut(node).symbol_reference = Some(sym);
        sym
    }

    fn declare_namespace(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        name: &str,
    ) -> Option<SymbolId> {
        // Same-named namespaces merge across files and declarations.
        let existing = self
            .ast
            .scope(scope)
            .get(name)
            .filter(|sym| self.ast.symbol(*sym).kind == SymbolKind::Namespace);

        let sym = match existing {
            Some(sym) => {
                self.ast.node_mut(node).symbol_reference = Some(sym);
                sym
            }
            None => {
                let sym = self.declare_symbol(node, scope, name, SymbolKind::Namespace);
                let ns_scope = self.ast.add_scope(Scope::new(Some(scope)).with_owner(sym));
                self.ast.symbol_mut(sym).scope = Some(ns_scope);
                sym
            }
        };

        let ns_scope = self.ast.symbol(sym).scope?;
        let children = self.ast.node(node).children.clone();
        let mut members = Vec::new();
        for child in children {
            if let Some(member) = self.declare(child, ns_scope) {
                members.push(member);
            }
        }
        self.ast.symbol_mut(sym).members.extend(members);
        Some(sym)
    }

    fn declare_container(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
    ) -> Option<SymbolId> {
        let sym = self.declare_symbol(node, scope, name, kind);
        let member_scope = self.ast.add_scope(Scope::new(Some(scope)).with_owner(sym));
        self.ast.symbol_mut(sym).scope = Some(member_scope);

        let children = self.ast.node(node).children.clone();
        let mut members = Vec::new();
        for child in children {
            // Base-type references are not members.
            if matches!(self.ast.node(child).kind, NodeKind::TypeReference { .. }) {
                continue;
            }
            if let Some(member) = self.declare(child, member_scope) {
                members.push(member);
            }
        }
        self.ast.symbol_mut(sym).members = members;
        Some(sym)
    }

    /// Give members of `kind` (enum values, error codes) the container's
    /// instance type.
    fn type_members(&mut self, container: SymbolId, data_type: DataType, kind: SymbolKind) {
        let members = self.ast.symbol(container).members.clone();
        for member in members {
            if self.ast.symbol(member).kind == kind {
                self.ast.symbol_mut(member).data_type = Some(data_type.clone());
            }
        }
    }

    fn declare_callable(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
    ) -> Option<SymbolId> {
        let sym = self.declare_symbol(node, scope, name, kind);
        let param_scope = self.ast.add_scope(Scope::new(Some(scope)).with_owner(sym));
        self.ast.symbol_mut(sym).scope = Some(param_scope);

        if matches!(kind, SymbolKind::Method | SymbolKind::CreationMethod) {
            self.bind_this(param_scope, scope);
        }

        let children = self.ast.node(node).children.clone();
        for child in children {
            match self.ast.node(child).kind {
                NodeKind::Parameter { .. } | NodeKind::Block => {
                    self.declare(child, param_scope);
                }
                _ => {}
            }
        }
        Some(sym)
    }

    /// Bind the implicit `this` parameter when the callable sits inside
    /// an instance container.
    fn bind_this(&mut self, param_scope: ScopeId, enclosing: ScopeId) {
        let Some(owner) = self.ast.scope(enclosing).owner else {
            return;
        };
        let data_type = match self.ast.symbol(owner).kind {
            SymbolKind::Class | SymbolKind::Interface => DataType::Object(owner),
            SymbolKind::Struct => DataType::ValueType(owner),
            _ => return,
        };
        let this = self
            .ast
            .add_symbol(Symbol::new("this", SymbolKind::Parameter).with_data_type(data_type));
        self.ast.symbol_mut(this).owner = Some(param_scope);
        self.ast.symbol_mut(this).used = true;
        self.ast.scope_mut(param_scope).insert("this", this);
    }

    // ----- pass 2: resolve -----

    /// Resolve the using directives of one file, yielding the namespace
    /// scopes searched after the lexical chain.
    fn resolve_usings(&mut self, root: NodeId, default_usings: &[String]) -> Vec<ScopeId> {
        let root_scope = self.ast.root_scope();
        let mut scopes = Vec::new();

        let register = |analyzer: &mut Self, name: &str, sref: Option<SourceReference>| {
            let sym = analyzer
                .ast
                .scope(root_scope)
                .get(name)
                .filter(|sym| analyzer.ast.symbol(*sym).kind == SymbolKind::Namespace);
            match sym {
                Some(sym) => analyzer.ast.symbol(sym).scope,
                None => {
                    analyzer.reporter.error(
                        sref,
                        format!("The namespace name `{}' could not be found", name),
                    );
                    None
                }
            }
        };

        for name in default_usings {
            if let Some(scope) = register(self, name, None) {
                scopes.push(scope);
            }
        }

        let children = self.ast.node(root).children.clone();
        for child in children {
            let NodeKind::UsingDirective { name } = self.ast.node(child).kind.clone() else {
                continue;
            };
            let sref = self.ast.node(child).source_ref.clone();
            if let Some(scope) = register(self, &name, sref) {
                scopes.push(scope);
                self.ast.node_mut(child).symbol_reference = self.ast.scope(scope).owner;
            }
        }
        scopes
    }

    fn resolve(&mut self, node: NodeId, scope: ScopeId, usings: &[ScopeId]) {
        let kind = self.ast.node(node).kind.clone();
        match kind {
            NodeKind::SourceRoot | NodeKind::UsingDirective { .. } => {}

            NodeKind::Namespace { .. } => {
                let ns_scope = self.symbol_scope_of(node).unwrap_or(scope);
                let children = self.ast.node(node).children.clone();
                for child in children {
                    self.resolve(child, ns_scope, usings);
                }
            }

            NodeKind::Class { .. }
            | NodeKind::Interface { .. }
            | NodeKind::Struct { .. }
            | NodeKind::Enum { .. }
            | NodeKind::ErrorDomain { .. } => {
                let member_scope = self.symbol_scope_of(node).unwrap_or(scope);
                let children = self.ast.node(node).children.clone();
                for child in children {
                    if matches!(self.ast.node(child).kind, NodeKind::TypeReference { .. }) {
                        // Base types resolve in the enclosing scope.
                        self.resolve_type(child, scope, usings);
                    } else {
                        self.resolve(child, member_scope, usings);
                    }
                }
            }

            NodeKind::EnumValue { .. } | NodeKind::ErrorCode { .. } => {
                let children = self.ast.node(node).children.clone();
                for child in children {
                    self.resolve(child, scope, usings);
                }
            }

            NodeKind::Method { .. }
            | NodeKind::CreationMethod { .. }
            | NodeKind::Signal { .. }
            | NodeKind::Delegate { .. } => {
                self.resolve_callable(node, scope, usings);
            }

            NodeKind::Property { .. } | NodeKind::Field { .. } | NodeKind::Constant { .. } => {
                let children = self.ast.node(node).children.clone();
                for child in children {
                    if matches!(self.ast.node(child).kind, NodeKind::TypeReference { .. }) {
                        let data_type = self.resolve_type(child, scope, usings);
                        if let Some(sym) = self.ast.node(node).symbol_reference {
                            self.ast.symbol_mut(sym).data_type = Some(data_type);
                        }
                    } else {
                        self.resolve(child, scope, usings);
                    }
                }
            }

            NodeKind::Parameter { .. } => {
                let children = self.ast.node(node).children.clone();
                for child in children {
                    let data_type = self.resolve_type(child, scope, usings);
                    if let Some(sym) = self.ast.node(node).symbol_reference {
                        self.ast.symbol_mut(sym).data_type = Some(data_type);
                    }
                }
            }

            NodeKind::LocalVariable { .. } => {
                let children = self.ast.node(node).children.clone();
                let annotated = children
                    .first()
                    .is_some_and(|c| matches!(self.ast.node(*c).kind, NodeKind::TypeReference { .. }));

                let data_type = if annotated {
                    let declared = self.resolve_type(children[0], scope, usings);
                    for child in &children[1..] {
                        self.resolve(*child, scope, usings);
                    }
                    declared
                } else {
                    // `var` declaration: infer from the initializer.
                    for child in &children {
                        self.resolve(*child, scope, usings);
                    }
                    children
                        .first()
                        .and_then(|c| self.ast.node(*c).value_type.clone())
                        .unwrap_or(DataType::Unresolved)
                };
                if let Some(sym) = self.ast.node(node).symbol_reference {
                    self.ast.symbol_mut(sym).data_type = Some(data_type);
                }
            }

            NodeKind::Block => {
                let block_scope = self.block_scopes.get(&node).copied().unwrap_or(scope);
                let children = self.ast.node(node).children.clone();
                for child in children {
                    self.resolve(child, block_scope, usings);
                }
            }

            NodeKind::IfStatement
            | NodeKind::WhileStatement
            | NodeKind::ForStatement
            | NodeKind::ReturnStatement
            | NodeKind::ExpressionStatement => {
                let children = self.ast.node(node).children.clone();
                for child in children {
                    self.resolve(child, scope, usings);
                }
            }

            NodeKind::TypeReference { .. } => {
                self.resolve_type(node, scope, usings);
            }

            _ => self.resolve_expr(node, scope, usings),
        }
    }

    fn symbol_scope_of(&self, node: NodeId) -> Option<ScopeId> {
        let sym = self.ast.node(node).symbol_reference?;
        self.ast.symbol(sym).scope
    }

    fn resolve_callable(&mut self, node: NodeId, scope: ScopeId, usings: &[ScopeId]) {
        let param_scope = self.symbol_scope_of(node).unwrap_or(scope);
        let children = self.ast.node(node).children.clone();
        for child in children {
            if matches!(self.ast.node(child).kind, NodeKind::TypeReference { .. }) {
                // The leading type reference is the return type.
                let data_type = self.resolve_type(child, param_scope, usings);
                if let Some(sym) = self.ast.node(node).symbol_reference {
                    self.ast.symbol_mut(sym).data_type = Some(data_type);
                }
            } else {
                self.resolve(child, param_scope, usings);
            }
        }
    }

    // ----- expressions -----

    fn resolve_expr(&mut self, node: NodeId, scope: ScopeId, usings: &[ScopeId]) {
        let kind = self.ast.node(node).kind.clone();
        match kind {
            NodeKind::Identifier { name } => {
                let Some(sym) = self.lookup_name(scope, usings, &name) else {
                    let sref = self.ast.node(node).source_ref.clone();
                    self.report_name_not_found(&name, scope, sref);
                    return;
                };
                self.bind_reference(node, sym);
            }

            NodeKind::MemberAccess { member, pointer } => {
                let children = self.ast.node(node).children.clone();
                let Some(&inner) = children.first() else {
                    return;
                };
                self.resolve_expr(inner, scope, usings);

                // A nameless access from parse recovery: the inner
                // expression is resolved, which is all queries need.
                if member.is_empty() {
                    return;
                }

                let Some(receiver) = self.receiver_of(inner, pointer) else {
                    // The inner expression already produced a diagnostic
                    // if it was unresolvable.
                    return;
                };
                let member_sym = self
                    .ast
                    .symbol(receiver)
                    .scope
                    .and_then(|ms| self.ast.scope(ms).get(&member));
                match member_sym {
                    Some(sym) => self.bind_reference(node, sym),
                    None => {
                        let context = self.ast.qualified_name(receiver);
                        let sref = self.ast.node(node).source_ref.clone();
                        self.reporter.error(
                            sref,
                            format!(
                                "The name `{}' does not exist in the context of `{}'",
                                member, context
                            ),
                        );
                    }
                }
            }

            NodeKind::MethodCall => {
                let children = self.ast.node(node).children.clone();
                for child in &children {
                    self.resolve_expr(*child, scope, usings);
                }
                let Some(&callee) = children.first() else {
                    return;
                };
                let value_type = self.call_return_type(callee);
                self.ast.node_mut(node).value_type = value_type;
            }

            NodeKind::ObjectCreation => {
                let children = self.ast.node(node).children.clone();
                let mut created = None;
                for child in children {
                    if matches!(self.ast.node(child).kind, NodeKind::TypeReference { .. }) {
                        created = Some(self.resolve_type(child, scope, usings));
                    } else {
                        self.resolve_expr(child, scope, usings);
                    }
                }
                if let Some(data_type) = created {
                    let node_mut = self.ast.node_mut(node);
                    node_mut.symbol_reference = data_type.type_symbol();
                    node_mut.value_type = Some(data_type);
                }
            }

            NodeKind::Assignment => {
                let children = self.ast.node(node).children.clone();
                for child in &children {
                    self.resolve_expr(*child, scope, usings);
                }
                let value_type = children
                    .first()
                    .and_then(|c| self.ast.node(*c).value_type.clone());
                self.ast.node_mut(node).value_type = value_type;
            }

            NodeKind::Binary { op } => {
                let children = self.ast.node(node).children.clone();
                for child in &children {
                    self.resolve_expr(*child, scope, usings);
                }
                use vala_lsp_ast::BinaryOp::*;
                let value_type = match op {
                    Equal | NotEqual | Less | LessOrEqual | Greater | GreaterOrEqual | And
                    | Or => self.builtin_value_type("bool"),
                    _ => children
                        .first()
                        .and_then(|c| self.ast.node(*c).value_type.clone()),
                };
                self.ast.node_mut(node).value_type = value_type;
            }

            NodeKind::Unary { op } => {
                let children = self.ast.node(node).children.clone();
                for child in &children {
                    self.resolve_expr(*child, scope, usings);
                }
                let value_type = match op {
                    UnaryOp::Not => self.builtin_value_type("bool"),
                    UnaryOp::Minus => children
                        .first()
                        .and_then(|c| self.ast.node(*c).value_type.clone()),
                };
                self.ast.node_mut(node).value_type = value_type;
            }

            NodeKind::Literal { value } => {
                let value_type = match value {
                    LiteralValue::Integer(_) => self.builtin_value_type("int"),
                    LiteralValue::Real(_) => self.builtin_value_type("double"),
                    LiteralValue::Boolean(_) => self.builtin_value_type("bool"),
                    LiteralValue::String(_) => self.builtin_value_type("string"),
                    LiteralValue::Character(_) => self.builtin_value_type("char"),
                    LiteralValue::Null => Some(DataType::Null),
                };
                self.ast.node_mut(node).value_type = value_type;
            }

            _ => {}
        }
    }

    /// Bind a resolved reference: record the symbol, mark it used, and
    /// take over its value type when it denotes a typed value.
    fn bind_reference(&mut self, node: NodeId, sym: SymbolId) {
        self.ast.symbol_mut(sym).used = true;
        let value_type = if self.ast.symbol(sym).kind.is_variable() {
            self.ast.symbol(sym).data_type.clone()
        } else {
            None
        };
        let node_mut = self.ast.node_mut(node);
        node_mut.symbol_reference = Some(sym);
        node_mut.value_type = value_type;
    }

    /// The type symbol whose members a member access on `inner` sees.
    fn receiver_of(&self, inner: NodeId, pointer: bool) -> Option<SymbolId> {
        let inner_node = self.ast.node(inner);
        let value_type = inner_node.value_type.as_ref();

        if pointer {
            return value_type
                .and_then(|t| t.pointee())
                .and_then(|t| t.type_symbol())
                .or_else(|| value_type.and_then(|t| t.type_symbol()));
        }

        value_type.and_then(|t| t.type_symbol()).or_else(|| {
            // Static access: the inner expression names a type or
            // namespace directly.
            inner_node.symbol_reference.filter(|sym| {
                let kind = self.ast.symbol(*sym).kind;
                kind.is_type() || kind == SymbolKind::Namespace
            })
        })
    }

    /// Return type of a call through `callee`.
    fn call_return_type(&self, callee: NodeId) -> Option<DataType> {
        if let Some(sym) = self.ast.node(callee).symbol_reference {
            let symbol = self.ast.symbol(sym);
            if matches!(
                symbol.kind,
                SymbolKind::Method
                    | SymbolKind::CreationMethod
                    | SymbolKind::Signal
                    | SymbolKind::Delegate
            ) {
                return symbol.data_type.clone();
            }
        }
        // Calling a delegate-typed value.
        match self.ast.node(callee).value_type.as_ref() {
            Some(DataType::DelegateType(delegate)) => self.ast.symbol(*delegate).data_type.clone(),
            _ => None,
        }
    }

    // ----- types -----

    fn resolve_type(&mut self, node: NodeId, scope: ScopeId, usings: &[ScopeId]) -> DataType {
        let NodeKind::TypeReference { segments, pointer } = self.ast.node(node).kind.clone()
        else {
            return DataType::Unresolved;
        };

        if segments.len() == 1 && segments[0] == "void" {
            let mut data_type = DataType::Void;
            for _ in 0..pointer {
                data_type = DataType::Pointer(Box::new(data_type));
            }
            return data_type;
        }

        let joined = segments.join(".");
        let sref = self.ast.node(node).source_ref.clone();

        let mut current = match self.lookup_name(scope, usings, &segments[0]) {
            Some(sym) => sym,
            None => {
                self.reporter.error(
                    sref,
                    format!("The type name `{}' could not be found", joined),
                );
                return DataType::Unresolved;
            }
        };
        for segment in &segments[1..] {
            let next = self
                .ast
                .symbol(current)
                .scope
                .and_then(|s| self.ast.scope(s).get(segment));
            match next {
                Some(sym) => current = sym,
                None => {
                    self.reporter.error(
                        sref,
                        format!("The type name `{}' could not be found", joined),
                    );
                    return DataType::Unresolved;
                }
            }
        }

        let mut data_type = match self.ast.symbol(current).kind {
            SymbolKind::Class | SymbolKind::Interface => DataType::Object(current),
            SymbolKind::Struct | SymbolKind::Enum => DataType::ValueType(current),
            SymbolKind::ErrorDomain => DataType::Error(current),
            SymbolKind::Delegate => DataType::DelegateType(current),
            _ => {
                self.reporter
                    .error(sref, format!("The symbol `{}' is not a type", joined));
                return DataType::Unresolved;
            }
        };
        for _ in 0..pointer {
            data_type = DataType::Pointer(Box::new(data_type));
        }

        self.ast.symbol_mut(current).used = true;
        self.ast.node_mut(node).symbol_reference = Some(current);
        data_type
    }

    // ----- shared helpers -----

    fn lookup_name(&self, scope: ScopeId, usings: &[ScopeId], name: &str) -> Option<SymbolId> {
        if let Some(sym) = self.ast.lookup(scope, name) {
            return Some(sym);
        }
        usings
            .iter()
            .find_map(|using| self.ast.scope(*using).get(name))
    }

    fn builtin_value_type(&self, name: &str) -> Option<DataType> {
        let root = self.ast.root_scope();
        let sym = self.ast.scope(root).get(name)?;
        Some(DataType::ValueType(sym))
    }

    fn scope_display_name(&self, scope: ScopeId) -> String {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.ast.scope(id);
            if let Some(owner) = s.owner {
                return self.ast.qualified_name(owner);
            }
            current = s.parent;
        }
        "(root namespace)".to_string()
    }

    fn report_name_not_found(
        &mut self,
        name: &str,
        scope: ScopeId,
        sref: Option<SourceReference>,
    ) {
        let context = self.scope_display_name(scope);
        let message = if context == "(root namespace)" {
            format!(
                "The name `{}' does not exist in the context of the root namespace",
                name
            )
        } else {
            format!(
                "The name `{}' does not exist in the context of `{}'",
                name, context
            )
        };
        self.reporter.error(sref, message);
    }

    fn warn_unused(&mut self) {
        let unused: Vec<(Option<SourceReference>, String)> = self
            .ast
            .symbols()
            .filter(|(_, sym)| {
                sym.kind == SymbolKind::LocalVariable && !sym.used && sym.source_ref.is_some()
            })
            .map(|(_, sym)| (sym.source_ref.clone(), sym.name.clone()))
            .collect();
        for (sref, name) in unused {
            self.reporter.warning(
                sref,
                format!("local variable `{}' declared but never used", name),
            );
        }
    }
}
