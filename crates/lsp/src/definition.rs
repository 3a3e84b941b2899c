// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Go-to-definition
//!
//! Resolves the AST node under the cursor to the declaration it denotes.
//! The position locator yields the tightest node at the cursor; its bound
//! symbol reference (filled by analysis for identifiers, member accesses,
//! and declarations alike) names the target. Targets whose file the
//! client has no document for (builtins, external package interfaces)
//! answer nothing rather than a location the editor cannot open.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{Location, Position, Url};
use tracing::debug;

use vala_lsp_ast::{Ast, best_match, find_symbols_at};

use crate::position::{to_compiler, to_lsp_range};

/// Find the definition targeted from `position` in `file`.
///
/// `path_index` maps document-store paths to URIs; a target outside the
/// store yields `None`.
pub fn find_definition(
    ast: &Ast,
    path_index: &HashMap<PathBuf, Url>,
    file: &Path,
    position: Position,
) -> Option<Location> {
    let location = to_compiler(position);
    let candidates = find_symbols_at(ast, file, location);
    let best = best_match(ast, &candidates)?;

    let sym = ast.node(best).symbol_reference?;
    let symbol = ast.symbol(sym);
    let sref = symbol.source_ref.as_ref()?;

    let Some(uri) = path_index.get(sref.file.as_ref()) else {
        debug!(
            "definition target `{}' lives outside the document store",
            symbol.name
        );
        return None;
    };

    Some(Location {
        uri: uri.clone(),
        range: to_lsp_range(sref),
    })
}
