// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Vala LSP - compiler front-end
//!
//! A compact front-end for the Vala subset the language server answers
//! queries about: a logos-based lexer, a recursive-descent parser with
//! per-declaration recovery, and a two-pass semantic analyzer binding
//! symbols, scopes, and value types into the shared [`Ast`] arena.
//!
//! ## Pipeline
//!
//! ```text
//! CompilationContext::check()
//!     ├─→ baselib::register()      seed builtin types
//!     ├─→ parser::parse_file()     per package and source file
//!     └─→ analyzer::analyze()      declare + resolve, whole program
//!              ↓
//!          Reporter                errors and warnings
//! ```
//!
//! The front-end is driven wholesale: there is no per-file incremental
//! update. The [`CompilationContext`] tracks a dirty flag so that edit
//! bursts coalesce into a single re-analysis.
//!
//! [`Ast`]: vala_lsp_ast::Ast

pub mod analyzer;
pub mod baselib;
pub mod context;
pub mod lexer;
pub mod parser;
pub mod report;

// Re-exports for convenience
pub use analyzer::analyze;
pub use context::{CompilationContext, SourceFile, SourceKind};
pub use parser::parse_file;
pub use report::{ReportedMessage, Reporter};
