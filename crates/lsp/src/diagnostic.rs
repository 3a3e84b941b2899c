// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Diagnostics
//!
//! Projects the front-end [`Reporter`] into LSP diagnostics. The
//! reporter's entries carry compiler coordinates and a file path; the
//! projection filters per file, converts positions, and tags severity.
//! Entries without a source position (a missing package, for example)
//! cannot be attached to a document and are only logged.

use std::path::Path;

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity};
use tracing::debug;

use vala_lsp_compiler::Reporter;

use crate::position::to_lsp_range;

/// Diagnostic source tag shown by editors.
const SOURCE: &str = "vala-lsp";

/// All diagnostics located in `file`, errors first, in report order.
pub fn diagnostics_for_file(reporter: &Reporter, file: &Path) -> Vec<Diagnostic> {
    let unlocated = reporter
        .errors()
        .iter()
        .chain(reporter.warnings())
        .filter(|msg| msg.source.is_none())
        .count();
    if unlocated > 0 {
        debug!("{} diagnostics without a source position", unlocated);
    }

    reporter
        .messages_for_file(file)
        .filter_map(|(msg, is_error)| {
            let sref = msg.source.as_ref()?;
            Some(Diagnostic {
                range: to_lsp_range(sref),
                severity: Some(if is_error {
                    DiagnosticSeverity::ERROR
                } else {
                    DiagnosticSeverity::WARNING
                }),
                code: None,
                code_description: None,
                source: Some(SOURCE.to_string()),
                message: msg.message.clone(),
                related_information: None,
                tags: None,
                data: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use vala_lsp_ast::{SourceLocation, SourceReference};

    fn sref(file: &str, line: u32, begin: u32, end: u32) -> SourceReference {
        SourceReference::new(
            Arc::new(PathBuf::from(file)),
            SourceLocation::new(line, begin),
            SourceLocation::new(line, end),
        )
    }

    #[test]
    fn test_projection_filters_by_file() {
        let mut reporter = Reporter::new();
        reporter.error(Some(sref("/a.vala", 1, 1, 4)), "broken");
        reporter.error(Some(sref("/b.vala", 1, 1, 4)), "elsewhere");
        reporter.warning(Some(sref("/a.vala", 2, 5, 9)), "odd");
        reporter.error(None, "floating");

        let diagnostics = diagnostics_for_file(&reporter, Path::new("/a.vala"));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].message, "broken");
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostics[1].severity, Some(DiagnosticSeverity::WARNING));
    }

    #[test]
    fn test_ranges_convert_to_lsp() {
        let mut reporter = Reporter::new();
        reporter.error(Some(sref("/a.vala", 2, 5, 11)), "undeclared");

        let diagnostics = diagnostics_for_file(&reporter, Path::new("/a.vala"));
        let range = diagnostics[0].range;
        assert_eq!(range.start.line, 1);
        assert_eq!(range.start.character, 4);
        assert_eq!(range.end.character, 11);
    }

    #[test]
    fn test_empty_reporter_yields_nothing() {
        let reporter = Reporter::new();
        assert!(diagnostics_for_file(&reporter, Path::new("/a.vala")).is_empty());
    }
}
