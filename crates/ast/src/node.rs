// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # AST nodes and the program arena
//!
//! The whole program, every source file registered with the compilation
//! context, lives in one [`Ast`] arena: nodes, symbols, and scopes are
//! stored in flat vectors and addressed by index newtypes, so parent and
//! sibling references never form ownership cycles. Each source file
//! contributes one root node; all files share the root namespace scope.
//!
//! Nodes keep their syntactic children in source order in a plain
//! `children` vector, which is what the visitor walks. Semantic analysis
//! fills in `symbol_reference` and `value_type` after parsing.

use std::path::Path;

use crate::scope::{Scope, ScopeId};
use crate::source::SourceReference;
use crate::symbol::{Symbol, SymbolId};
use crate::types::DataType;

/// Index of a node in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
}

/// Literal payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(String),
    Character(char),
    Null,
}

/// The syntactic variant of a node.
///
/// Declaration variants carry the declared name; the declared symbol is
/// bound through [`Node::symbol_reference`] during analysis. Expression
/// variants carry only what the parser saw.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root node of one source file.
    SourceRoot,

    /// `using Name;`
    UsingDirective { name: String },

    Namespace { name: String },
    Class { name: String },
    Interface { name: String },
    Struct { name: String },
    Enum { name: String },
    EnumValue { name: String },
    ErrorDomain { name: String },
    ErrorCode { name: String },
    Delegate { name: String },
    Method { name: String },
    CreationMethod { name: String },
    Signal { name: String },
    Property { name: String },
    Field { name: String },
    Constant { name: String },
    Parameter { name: String },
    LocalVariable { name: String },

    /// A type annotation: dotted name segments plus pointer depth.
    /// `var` declarations have no annotation and infer from the
    /// initializer instead.
    TypeReference { segments: Vec<String>, pointer: u32 },

    Block,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    WhileStatement,
    ForStatement,

    Identifier { name: String },

    /// `inner.member`, or `inner->member` when `pointer` is set. The
    /// member name is empty when the parser recovered from a trailing
    /// access with no name typed yet.
    MemberAccess { member: String, pointer: bool },

    /// `callee (args...)`; the callee is the first child.
    MethodCall,

    /// `new Type (args...)`; the type reference is the first child.
    ObjectCreation,

    /// `lhs = rhs`.
    Assignment,

    Binary { op: BinaryOp },
    Unary { op: UnaryOp },
    Literal { value: LiteralValue },
}

impl NodeKind {
    /// The declared name, for declaration variants.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            NodeKind::Namespace { name }
            | NodeKind::Class { name }
            | NodeKind::Interface { name }
            | NodeKind::Struct { name }
            | NodeKind::Enum { name }
            | NodeKind::EnumValue { name }
            | NodeKind::ErrorDomain { name }
            | NodeKind::ErrorCode { name }
            | NodeKind::Delegate { name }
            | NodeKind::Method { name }
            | NodeKind::CreationMethod { name }
            | NodeKind::Signal { name }
            | NodeKind::Property { name }
            | NodeKind::Field { name }
            | NodeKind::Constant { name }
            | NodeKind::Parameter { name }
            | NodeKind::LocalVariable { name } => Some(name),
            _ => None,
        }
    }

    /// Whether the node declares a symbol.
    pub fn is_declaration(&self) -> bool {
        self.declared_name().is_some()
    }

    /// Whether the node is an expression.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Identifier { .. }
                | NodeKind::MemberAccess { .. }
                | NodeKind::MethodCall
                | NodeKind::ObjectCreation
                | NodeKind::Assignment
                | NodeKind::Binary { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Literal { .. }
        )
    }
}

/// One node of the syntax tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Syntactic variant.
    pub kind: NodeKind,

    /// Where the node was parsed from. Declaration nodes reference the
    /// declared name; expression nodes span their full text. Synthesized
    /// nodes have none.
    pub source_ref: Option<SourceReference>,

    /// Syntactic children in source order.
    pub children: Vec<NodeId>,

    /// The symbol this node declares or denotes, bound by analysis.
    pub symbol_reference: Option<SymbolId>,

    /// The value type of an expression, bound by analysis.
    pub value_type: Option<DataType>,
}

impl Node {
    /// Create a node with no children and nothing resolved.
    pub fn new(kind: NodeKind, source_ref: Option<SourceReference>) -> Self {
        Self {
            kind,
            source_ref,
            children: Vec::new(),
            symbol_reference: None,
            value_type: None,
        }
    }
}

/// The program-wide syntax tree and symbol arena.
#[derive(Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    roots: Vec<NodeId>,
    root_scope: ScopeId,
}

impl Ast {
    /// Create an empty arena holding only the root namespace scope.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            symbols: Vec::new(),
            scopes: vec![Scope::new(None)],
            roots: Vec::new(),
            root_scope: ScopeId::new(0),
        }
    }

    /// The root namespace scope shared by all source files.
    pub fn root_scope(&self) -> ScopeId {
        self.root_scope
    }

    /// Add a node and return its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Immutable access to a node. Ids handed out by this arena are
    /// always valid.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Add a symbol and return its id.
    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::new(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    /// Immutable access to a symbol.
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Mutable access to a symbol.
    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    /// Add a scope and return its id.
    pub fn add_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(scope);
        id
    }

    /// Immutable access to a scope.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Mutable access to a scope.
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Register a per-file root node.
    pub fn add_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    /// Per-file root nodes in registration order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The root node of the file at `path`, if registered.
    pub fn root_for_file(&self, path: &Path) -> Option<NodeId> {
        self.roots.iter().copied().find(|id| {
            self.node(*id)
                .source_ref
                .as_ref()
                .is_some_and(|sref| sref.file.as_path() == path)
        })
    }

    /// Resolve `name` by walking the scope chain from `scope` to the root.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(sym) = scope.get(name) {
                return Some(sym);
            }
            current = scope.parent;
        }
        None
    }

    /// The chain of scopes from `scope` to the root, inclusive.
    pub fn scope_chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            chain.push(id);
            current = self.scope(id).parent;
        }
        chain
    }

    /// Fully qualified name of a symbol, for diagnostics.
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let mut parts = vec![self.symbol(id).name.clone()];
        let mut owner = self.symbol(id).owner;
        while let Some(scope_id) = owner {
            let scope = self.scope(scope_id);
            match scope.owner {
                Some(sym) => {
                    parts.push(self.symbol(sym).name.clone());
                    owner = self.symbol(sym).owner;
                }
                None => break,
            }
        }
        parts.reverse();
        parts.join(".")
    }

    /// All symbols with their ids, in arena order.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId::new(index), symbol))
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of symbols in the arena.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of scopes in the arena.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}
