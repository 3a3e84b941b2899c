// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Compilation context
//!
//! Owns the front-end state for one workspace: the registered source
//! files, package dependencies, vapi search directories, the diagnostic
//! [`Reporter`], and the analyzed [`Ast`].
//!
//! The front-end is not incremental: any mutation marks the context dirty
//! and the next [`CompilationContext::check`] re-runs lexing, parsing,
//! and analysis over the full source set. The dirty flag coalesces edit
//! bursts: any number of mutations followed by one query cost exactly
//! one analysis run.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use vala_lsp_ast::Ast;

use crate::report::Reporter;
use crate::{analyzer, baselib, parser};

/// What a registered file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A `.vala` compilation unit.
    Source,

    /// A `.vapi` package interface.
    Package,

    /// Anything else; kept but not analyzed.
    Unknown,
}

impl SourceKind {
    /// Classify a file by its extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("vala") => SourceKind::Source,
            Some("vapi") => SourceKind::Package,
            _ => SourceKind::Unknown,
        }
    }
}

/// One registered source file: identity, kind, and current text.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: Arc<PathBuf>,
    kind: SourceKind,
    text: String,
}

impl SourceFile {
    /// Create a source file snapshot.
    pub fn new(path: PathBuf, kind: SourceKind, text: String) -> Self {
        Self {
            path: Arc::new(path),
            kind,
            text,
        }
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared kind.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Current text content.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The workspace-wide front-end state.
#[derive(Debug)]
pub struct CompilationContext {
    sources: Vec<SourceFile>,
    packages: Vec<String>,
    vapi_dirs: Vec<PathBuf>,
    c_sources: Vec<String>,
    usings: Vec<String>,
    dirty: bool,
    reporter: Reporter,
    ast: Ast,
    analyses_run: usize,
}

impl CompilationContext {
    /// Create an empty context with the implicit base-library using
    /// directive applied.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            packages: Vec::new(),
            vapi_dirs: Vec::new(),
            c_sources: Vec::new(),
            usings: vec!["GLib".to_string()],
            dirty: true,
            reporter: Reporter::new(),
            ast: Ast::new(),
            analyses_run: 0,
        }
    }

    /// Register a source file, replacing any previous registration of the
    /// same path.
    pub fn add_source_file(&mut self, file: SourceFile) {
        match self
            .sources
            .iter_mut()
            .find(|existing| existing.path() == file.path())
        {
            Some(existing) => *existing = file,
            None => self.sources.push(file),
        }
        self.dirty = true;
    }

    /// Replace the text of a registered file. Returns `false` when the
    /// path is unknown.
    pub fn set_source_text(&mut self, path: &Path, text: String) -> bool {
        let Some(existing) = self.sources.iter_mut().find(|src| src.path() == path) else {
            return false;
        };
        existing.text = text;
        self.dirty = true;
        true
    }

    /// Add a named package dependency. Duplicates are ignored.
    pub fn add_package(&mut self, name: &str) {
        if self.packages.iter().any(|pkg| pkg == name) {
            return;
        }
        self.packages.push(name.to_string());
        self.dirty = true;
    }

    /// Add a search directory for package interface files.
    pub fn add_vapidir(&mut self, path: PathBuf) {
        self.vapi_dirs.push(path);
        self.dirty = true;
    }

    /// Register an auxiliary C source. Kept for cross-checks by the build
    /// integration; analysis ignores it.
    pub fn add_c_source_file(&mut self, uri: &str) {
        self.c_sources.push(uri.to_string());
        self.dirty = true;
    }

    /// Register an implicit using directive applied to every source file.
    pub fn add_using(&mut self, namespace: &str) {
        if self.usings.iter().any(|ns| ns == namespace) {
            return;
        }
        self.usings.push(namespace.to_string());
        self.dirty = true;
    }

    /// Mark the context dirty without touching its inputs.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Re-run the front-end over the full source set, if anything changed
    /// since the last run.
    ///
    /// Analysis is best-effort: previously reported errors do not stop a
    /// re-run, and a partial AST is left in place even when the sources
    /// are broken.
    pub fn check(&mut self) {
        if !self.dirty {
            debug!("check skipped, context is clean");
            return;
        }
        let started = Instant::now();

        let mut reporter = std::mem::take(&mut self.reporter);
        reporter.clear();

        let mut ast = Ast::new();
        baselib::register(&mut ast);

        for package in self.packages.clone() {
            match self.locate_package(&package) {
                Some(path) => match fs::read_to_string(&path) {
                    Ok(text) => {
                        parser::parse_file(&mut ast, &mut reporter, Arc::new(path), &text);
                    }
                    Err(err) => {
                        reporter.error(
                            None,
                            format!("Package `{}' could not be read: {}", package, err),
                        );
                    }
                },
                None => {
                    reporter.error(
                        None,
                        format!(
                            "Package `{}' not found in specified Vala API directories",
                            package
                        ),
                    );
                }
            }
        }

        for source in &self.sources {
            match source.kind() {
                SourceKind::Source | SourceKind::Package => {
                    parser::parse_file(
                        &mut ast,
                        &mut reporter,
                        Arc::clone(&source.path),
                        &source.text,
                    );
                }
                SourceKind::Unknown => {
                    warn!("skipping file of unknown kind: {}", source.path().display());
                }
            }
        }

        analyzer::analyze(&mut ast, &mut reporter, &self.usings);

        info!(
            "analyzed {} files in {:?}: {} errors, {} warnings",
            self.sources.len(),
            started.elapsed(),
            reporter.error_count(),
            reporter.warning_count()
        );

        self.ast = ast;
        self.reporter = reporter;
        self.dirty = false;
        self.analyses_run += 1;
    }

    fn locate_package(&self, name: &str) -> Option<PathBuf> {
        self.vapi_dirs
            .iter()
            .map(|dir| dir.join(format!("{}.vapi", name)))
            .find(|candidate| candidate.is_file())
    }

    /// Drop all state, returning to a fresh context.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// All registered source files, in registration order.
    pub fn get_source_files(&self) -> &[SourceFile] {
        &self.sources
    }

    /// The registered file at `path`, if any.
    pub fn get_source_file(&self, path: &Path) -> Option<&SourceFile> {
        self.sources.iter().find(|src| src.path() == path)
    }

    /// Display names of all registered files.
    pub fn get_filenames(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|src| src.path().display().to_string())
            .collect()
    }

    /// The analyzed program. Meaningful after [`CompilationContext::check`].
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Diagnostics of the last analysis run.
    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Whether unanalyzed mutations are pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of analysis runs performed. Edit coalescing shows up here:
    /// a burst of mutations followed by one query only bumps this once.
    pub fn analyses_run(&self) -> usize {
        self.analyses_run
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}
