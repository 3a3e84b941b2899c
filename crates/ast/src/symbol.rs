// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Symbols
//!
//! A symbol is a named declaration produced by semantic analysis: a type,
//! a member, a parameter, or a local. Symbols are stored in the [`Ast`]
//! arena and addressed by [`SymbolId`]; scopes map names to symbol ids.
//!
//! [`Ast`]: crate::Ast

use crate::node::NodeId;
use crate::scope::ScopeId;
use crate::source::SourceReference;
use crate::types::DataType;

/// Name under which a creation method is entered into its class scope.
///
/// Keeping constructors out of the ordinary name space means member
/// completion can skip them with a plain name comparison.
pub const CREATION_METHOD_NAME: &str = ".new";

/// Index of a symbol in the [`Ast`] arena.
///
/// [`Ast`]: crate::Ast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of declaration a symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Class,
    Interface,
    Struct,
    Enum,
    EnumValue,
    ErrorDomain,
    ErrorCode,
    Delegate,
    Method,
    CreationMethod,
    Signal,
    Property,
    Field,
    Constant,
    Parameter,
    LocalVariable,
}

impl SymbolKind {
    /// Whether symbols of this kind name a type.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Struct
                | SymbolKind::Enum
                | SymbolKind::ErrorDomain
                | SymbolKind::Delegate
        )
    }

    /// Whether symbols of this kind denote a typed value when referenced.
    pub fn is_variable(self) -> bool {
        matches!(
            self,
            SymbolKind::Field
                | SymbolKind::Constant
                | SymbolKind::Property
                | SymbolKind::Parameter
                | SymbolKind::LocalVariable
                | SymbolKind::EnumValue
                | SymbolKind::ErrorCode
        )
    }
}

/// A named declaration.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Declared name. Creation methods use [`CREATION_METHOD_NAME`].
    pub name: String,

    /// Declaration kind.
    pub kind: SymbolKind,

    /// The AST node that declared the symbol, if any. Builtin symbols
    /// seeded from the base library have no node.
    pub node: Option<NodeId>,

    /// The scope the symbol is declared in.
    pub owner: Option<ScopeId>,

    /// The scope the symbol itself owns: member scope for containers,
    /// parameter/body scope for callables.
    pub scope: Option<ScopeId>,

    /// Declared type for variables, return type for callables.
    pub data_type: Option<DataType>,

    /// Member symbols in declaration order, for container symbols.
    pub members: Vec<SymbolId>,

    /// Reference covering the declared name.
    pub source_ref: Option<SourceReference>,

    /// Set when an expression resolved to this symbol.
    pub used: bool,
}

impl Symbol {
    /// Create a symbol with no bindings filled in yet.
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            node: None,
            owner: None,
            scope: None,
            data_type: None,
            members: Vec::new(),
            source_ref: None,
            used: false,
        }
    }

    /// Attach the declaring node.
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Attach the reference covering the declared name.
    pub fn with_source_ref(mut self, sref: SourceReference) -> Self {
        self.source_ref = Some(sref);
        self
    }

    /// Attach the declared or return type.
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}
