// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Member completion
//!
//! The completion flow:
//!
//! ```text
//! 1. classify_trigger()      `.` or `->` before the cursor?
//!        ↓
//! 2. position locator        tightest node at the adjusted position
//!        ↓ (miss)
//! 3. token fallback          trailing identifier through scope chains
//!        ↓
//! 4. receiver type symbol    value type / declared type / the type itself
//!        ↓
//! 5. member projection       per-kind member list → CompletionItem
//! ```
//!
//! The trigger examines the character immediately before the cursor: a
//! `.` moves the logical cursor one column left onto the dot, `->` moves
//! it two columns left, and a bare `>` is a comparison, not an access.
//! Everything downstream works on the adjusted position.

use std::collections::HashSet;
use std::path::Path;

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Position};
use tracing::debug;

use vala_lsp_ast::{
    Ast, CREATION_METHOD_NAME, NodeId, NodeKind, SymbolId, SymbolKind, best_match, extract_token,
    find_symbol_by_token, find_symbols_at,
};

use crate::position::to_compiler;

/// Trigger characters advertised in the server capabilities. Only the
/// handled set: `.` and the `>` of `->`.
pub const TRIGGER_CHARACTERS: [&str; 2] = [".", ">"];

/// Classify the trigger and return the adjusted cursor, sitting on the
/// access operator. `None` means no completion fires here.
pub fn classify_trigger(line: &str, position: Position) -> Option<Position> {
    let cursor = position.character as usize;
    if cursor == 0 || cursor > line.len() {
        return None;
    }
    let bytes = line.as_bytes();
    match bytes[cursor - 1] {
        b'.' => Some(Position {
            line: position.line,
            character: position.character - 1,
        }),
        b'>' if cursor >= 2 && bytes[cursor - 2] == b'-' => Some(Position {
            line: position.line,
            character: position.character - 2,
        }),
        _ => None,
    }
}

/// Compute member completions at `position` of `file`.
///
/// `line` is the text of the cursor line. Misses of any kind produce an
/// empty list, never an error.
pub fn complete(ast: &Ast, file: &Path, line: &str, position: Position) -> Vec<CompletionItem> {
    let Some(adjusted) = classify_trigger(line, position) else {
        debug!("no completion trigger before {:?}", position);
        return Vec::new();
    };

    let location = to_compiler(adjusted);
    let candidates = find_symbols_at(ast, file, location);
    let receiver = match best_match(ast, &candidates) {
        Some(best) => receiver_for_node(ast, file, line, adjusted, best),
        None => fallback_receiver(ast, file, line, adjusted),
    };

    match receiver {
        Some(receiver) => members_of(ast, receiver),
        None => Vec::new(),
    }
}

/// The type symbol whose members the node at the cursor exposes.
fn receiver_for_node(
    ast: &Ast,
    file: &Path,
    line: &str,
    adjusted: Position,
    best: NodeId,
) -> Option<SymbolId> {
    let node = ast.node(best);

    // A typed expression (member access included) answers with its value
    // type's backing symbol; pointer types answer for their pointee.
    if let Some(sym) = node.value_type.as_ref().and_then(|t| t.type_symbol()) {
        return Some(sym);
    }

    // A member access without a formal value type is one the user is
    // still typing: take the receiver from the inner expression.
    if let NodeKind::MemberAccess { pointer, .. } = node.kind {
        if let Some(&inner) = node.children.first() {
            let inner_node = ast.node(inner);
            let value_type = inner_node.value_type.as_ref();
            let through_type = if pointer {
                value_type
                    .and_then(|t| t.pointee())
                    .and_then(|t| t.type_symbol())
                    .or_else(|| value_type.and_then(|t| t.type_symbol()))
            } else {
                value_type.and_then(|t| t.type_symbol())
            };
            if let Some(sym) = through_type.or_else(|| {
                inner_node
                    .symbol_reference
                    .and_then(|sym| type_symbol_for(ast, sym))
            }) {
                return Some(sym);
            }
        }
    }

    // Declarations and type references answer through their symbol.
    if let Some(sym) = node
        .symbol_reference
        .and_then(|sym| type_symbol_for(ast, sym))
    {
        return Some(sym);
    }

    // No formal value type at the cursor (an implicit receiver or a
    // partial parse). Resolve the trailing token instead.
    fallback_receiver(ast, file, line, adjusted)
}

/// Resolve the identifier ending at the adjusted cursor through the
/// enclosing scope chains.
fn fallback_receiver(
    ast: &Ast,
    file: &Path,
    line: &str,
    adjusted: Position,
) -> Option<SymbolId> {
    let token = extract_token(line, adjusted.character as usize)?;
    let location = to_compiler(adjusted);
    let sym = find_symbol_by_token(ast, file, location, token)?;
    debug!("completion fallback resolved `{}'", token);
    type_symbol_for(ast, sym)
}

/// Map a resolved symbol to the type symbol completion enumerates: a
/// type stands for itself, a variable for its declared type.
fn type_symbol_for(ast: &Ast, sym: SymbolId) -> Option<SymbolId> {
    let symbol = ast.symbol(sym);
    if symbol.kind.is_type() {
        return Some(sym);
    }
    if symbol.kind.is_variable() {
        return symbol.data_type.as_ref().and_then(|t| t.type_symbol());
    }
    None
}

/// Enumerate the receiver's members into completion items.
///
/// Member names are unique per receiver, so one invocation never yields
/// duplicate labels.
fn members_of(ast: &Ast, receiver: SymbolId) -> Vec<CompletionItem> {
    let symbol = ast.symbol(receiver);
    let mut items = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for &member in &symbol.members {
        let member_symbol = ast.symbol(member);
        let mapped = match symbol.kind {
            SymbolKind::Class | SymbolKind::Interface => match member_symbol.kind {
                SymbolKind::Method if member_symbol.name != CREATION_METHOD_NAME => {
                    Some(CompletionItemKind::METHOD)
                }
                SymbolKind::Signal => Some(CompletionItemKind::METHOD),
                SymbolKind::Property => Some(CompletionItemKind::PROPERTY),
                SymbolKind::Constant => Some(CompletionItemKind::VALUE),
                SymbolKind::Field => Some(CompletionItemKind::FIELD),
                SymbolKind::Class | SymbolKind::Struct => Some(CompletionItemKind::CLASS),
                SymbolKind::Enum => Some(CompletionItemKind::ENUM),
                SymbolKind::Delegate => Some(CompletionItemKind::CLASS),
                _ => None,
            },
            SymbolKind::Enum => match member_symbol.kind {
                SymbolKind::EnumValue => Some(CompletionItemKind::VALUE),
                SymbolKind::Method => Some(CompletionItemKind::METHOD),
                SymbolKind::Constant => Some(CompletionItemKind::FIELD),
                _ => None,
            },
            SymbolKind::ErrorDomain => match member_symbol.kind {
                SymbolKind::ErrorCode => Some(CompletionItemKind::VALUE),
                SymbolKind::Method => Some(CompletionItemKind::METHOD),
                _ => None,
            },
            SymbolKind::Struct => match member_symbol.kind {
                SymbolKind::Constant => Some(CompletionItemKind::VALUE),
                SymbolKind::Field => Some(CompletionItemKind::FIELD),
                SymbolKind::Method => Some(CompletionItemKind::METHOD),
                SymbolKind::Property => Some(CompletionItemKind::PROPERTY),
                _ => None,
            },
            // Delegates have no completable members.
            _ => None,
        };

        let Some(kind) = mapped else { continue };
        if !seen.insert(member_symbol.name.as_str()) {
            continue;
        }
        items.push(CompletionItem {
            label: member_symbol.name.clone(),
            kind: Some(kind),
            detail: member_symbol.data_type.as_ref().map(|t| t.display(ast)),
            ..Default::default()
        });
    }
    items
}
