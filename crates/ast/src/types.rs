// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Data types
//!
//! The resolved type of an expression or declaration. Types either refer
//! to a type symbol in the arena or are one of the structural cases
//! (void, null, pointer, unresolved).

use crate::node::Ast;
use crate::symbol::SymbolId;

/// A resolved (or unresolvable) data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// Analysis could not determine a type. Queries treat this as
    /// "no information", never as an error.
    Unresolved,

    /// The `void` return type.
    Void,

    /// The type of the `null` literal.
    Null,

    /// A pointer to another type, `T*`.
    Pointer(Box<DataType>),

    /// Instance type of a class or interface.
    Object(SymbolId),

    /// Instance type of a struct or enum.
    ValueType(SymbolId),

    /// An error domain type.
    Error(SymbolId),

    /// A delegate type.
    DelegateType(SymbolId),
}

impl DataType {
    /// The type symbol backing this type, if there is one.
    ///
    /// `Unresolved`, `Void`, and `Null` have no backing symbol. Pointer
    /// types answer for their pointee, so `Foo*` resolves to `Foo`.
    pub fn type_symbol(&self) -> Option<SymbolId> {
        match self {
            DataType::Unresolved | DataType::Void | DataType::Null => None,
            DataType::Pointer(inner) => inner.type_symbol(),
            DataType::Object(sym)
            | DataType::ValueType(sym)
            | DataType::Error(sym)
            | DataType::DelegateType(sym) => Some(*sym),
        }
    }

    /// The pointed-to type for pointer types.
    pub fn pointee(&self) -> Option<&DataType> {
        match self {
            DataType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Render the type for diagnostics.
    pub fn display(&self, ast: &Ast) -> String {
        match self {
            DataType::Unresolved => "<unresolved>".to_string(),
            DataType::Void => "void".to_string(),
            DataType::Null => "null".to_string(),
            DataType::Pointer(inner) => format!("{}*", inner.display(ast)),
            DataType::Object(sym)
            | DataType::ValueType(sym)
            | DataType::Error(sym)
            | DataType::DelegateType(sym) => ast.symbol(*sym).name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Symbol, SymbolKind};

    #[test]
    fn test_type_symbol_structural_cases() {
        assert_eq!(DataType::Unresolved.type_symbol(), None);
        assert_eq!(DataType::Void.type_symbol(), None);
        assert_eq!(DataType::Null.type_symbol(), None);
    }

    #[test]
    fn test_type_symbol_through_pointer() {
        let mut ast = Ast::new();
        let foo = ast.add_symbol(Symbol::new("Foo", SymbolKind::Class));

        let pointer = DataType::Pointer(Box::new(DataType::Object(foo)));
        assert_eq!(pointer.type_symbol(), Some(foo));
        assert_eq!(pointer.pointee(), Some(&DataType::Object(foo)));
    }

    #[test]
    fn test_display() {
        let mut ast = Ast::new();
        let foo = ast.add_symbol(Symbol::new("Foo", SymbolKind::Class));

        let pointer = DataType::Pointer(Box::new(DataType::Object(foo)));
        assert_eq!(pointer.display(&ast), "Foo*");
        assert_eq!(DataType::Void.display(&ast), "void");
    }
}
