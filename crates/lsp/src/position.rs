// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Position conversion
//!
//! The one place where the two coordinate conventions meet:
//!
//! - LSP positions are 0-based `(line, character)`, where `character` is
//!   a gap between glyphs, in UTF-8 code units (the server negotiates
//!   `positionEncoding: "utf-8"`).
//! - Compiler positions are 1-based `(line, column)`, where `column`
//!   points at a glyph and end columns are inclusive.
//!
//! Converting a cursor takes the glyph to its right: LSP gap `c` becomes
//! column `c + 1`. Converting a reference back widens the inclusive end
//! column into an exclusive gap, so a single-character reference at
//! column 5 round-trips to characters `4..5`.

use tower_lsp::lsp_types::{Position, Range};
use vala_lsp_ast::{SourceLocation, SourceReference};

/// Convert an LSP cursor to a compiler location.
pub fn to_compiler(position: Position) -> SourceLocation {
    SourceLocation::new(position.line + 1, position.character + 1)
}

/// Convert a compiler reference to an LSP range.
pub fn to_lsp_range(sref: &SourceReference) -> Range {
    Range {
        start: Position {
            line: sref.begin.line.saturating_sub(1),
            character: sref.begin.column.saturating_sub(1),
        },
        end: Position {
            line: sref.end.line.saturating_sub(1),
            character: sref.end.column,
        },
    }
}
