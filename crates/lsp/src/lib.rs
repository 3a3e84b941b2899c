// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Vala LSP - Language Server Protocol
//!
//! This crate provides the LSP server implementation for the Vala
//! language server.
//!
//! ## Overview
//!
//! The server provides:
//! - Diagnostics from the front-end's reporter on every analysis
//! - Go-to-definition through the position locator
//! - Member completion after `.` and `->`
//! - Workspace seeding from the root handed over in `initialize`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Client (VS Code, etc.)          │
//! └──────────────┬──────────────────────────┘
//!                │ LSP over stdio
//!                ↓
//! ┌─────────────────────────────────────────┐
//! │         LSP Backend (tower-lsp)         │
//! ├─────────────────────────────────────────┤
//! │  • initialize / didOpen / didChange     │
//! │  • definition / completion              │
//! └──────┬──────────────────┬───────────────┘
//!        ↓                  ↓
//! ┌────────────┐   ┌───────────────────────┐
//! │  Document  │   │  Compilation Context  │
//! │   Store    │   │  (vala-lsp-compiler)  │
//! └────────────┘   └───────────────────────┘
//! ```
//!
//! ## Coordinate conventions
//!
//! The wire speaks 0-based positions in UTF-8 code units (negotiated via
//! `positionEncoding`); the compiler speaks 1-based inclusive columns.
//! All conversion lives in [`position`].
//!
//! ## Error handling
//!
//! The server degrades gracefully everywhere: client mistakes (unknown
//! URIs, stale versions, wrong language ids) are logged and dropped,
//! query misses answer null or an empty list, and workspace-seeding
//! failures surface as a `window/showMessage` while the server continues
//! with the partial seed. No handler panics.

pub mod backend;
pub mod completion;
pub mod config;
pub mod definition;
pub mod diagnostic;
pub mod document;
pub mod logging;
pub mod position;
pub mod workspace;

// Re-exports for convenience
pub use backend::LspBackend;
pub use completion::complete;
pub use config::ServerConfig;
pub use definition::find_definition;
pub use diagnostic::diagnostics_for_file;
pub use document::{Document, DocumentError, DocumentStore};
pub use workspace::{WorkspaceError, WorkspaceScan, scan_workspace};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name
pub const SERVER_NAME: &str = "vala-lsp";
