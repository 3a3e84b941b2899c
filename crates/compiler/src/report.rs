// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Diagnostic reporter
//!
//! Every stage of the front-end reports through one [`Reporter`], which
//! accumulates errors and warnings in the order they were produced. The
//! reporter is reset at the start of each analysis run, so after a clean
//! `check` its contents always describe the current snapshot of the
//! sources.

use std::path::Path;

use vala_lsp_ast::SourceReference;

/// One reported message.
///
/// Messages produced outside any source position (a missing package
/// interface, for example) carry no reference.
#[derive(Debug, Clone)]
pub struct ReportedMessage {
    /// Where the problem was found.
    pub source: Option<SourceReference>,

    /// Human-readable description, in the front-end's message style.
    pub message: String,
}

/// Accumulates errors and warnings for one analysis run.
#[derive(Debug, Default)]
pub struct Reporter {
    errors: Vec<ReportedMessage>,
    warnings: Vec<ReportedMessage>,
}

impl Reporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an error.
    pub fn error(&mut self, source: Option<SourceReference>, message: impl Into<String>) {
        self.errors.push(ReportedMessage {
            source,
            message: message.into(),
        });
    }

    /// Report a warning.
    pub fn warning(&mut self, source: Option<SourceReference>, message: impl Into<String>) {
        self.warnings.push(ReportedMessage {
            source,
            message: message.into(),
        });
    }

    /// All errors, in report order.
    pub fn errors(&self) -> &[ReportedMessage] {
        &self.errors
    }

    /// All warnings, in report order.
    pub fn warnings(&self) -> &[ReportedMessage] {
        &self.warnings
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of warnings reported so far.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors and warnings located in `file`.
    pub fn messages_for_file<'a>(
        &'a self,
        file: &'a Path,
    ) -> impl Iterator<Item = (&'a ReportedMessage, bool)> {
        let in_file = move |msg: &&ReportedMessage| {
            msg.source
                .as_ref()
                .is_some_and(|sref| sref.file.as_path() == file)
        };
        self.errors
            .iter()
            .filter(in_file)
            .map(|msg| (msg, true))
            .chain(self.warnings.iter().filter(in_file).map(|msg| (msg, false)))
    }

    /// Drop everything. Called at the start of each analysis run.
    pub fn clear(&mut self) {
        self.errors.clear();
        self.warnings.clear();
    }
}
