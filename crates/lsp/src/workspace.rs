// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Workspace seeding
//!
//! Walks the workspace root handed over in `initialize` and collects
//! every `.vala` source and `.vapi` package interface into source-file
//! snapshots for the compilation context. Build-system integration
//! (manifest discovery, compile-commands scanning) is a separate
//! concern; the scan is the simple, dependable default.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use vala_lsp_compiler::{SourceFile, SourceKind};

/// Failure to seed a workspace at all.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The root is not a directory.
    #[error("workspace root is not a directory: {0}")]
    NotADirectory(String),
}

/// What a scan found.
#[derive(Debug, Default)]
pub struct WorkspaceScan {
    /// Readable source files, in walk order.
    pub files: Vec<SourceFile>,

    /// Files that matched but could not be read.
    pub unreadable: Vec<String>,
}

/// Scan `root` recursively for source and package files.
///
/// Unreadable files are collected rather than fatal; the server
/// continues with whatever partial workspace was seeded.
pub fn scan_workspace(root: &Path) -> Result<WorkspaceScan, WorkspaceError> {
    if !root.is_dir() {
        return Err(WorkspaceError::NotADirectory(root.display().to_string()));
    }

    let mut scan = WorkspaceScan::default();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("workspace walk error: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let kind = SourceKind::from_path(path);
        if kind == SourceKind::Unknown {
            continue;
        }
        match fs::read_to_string(path) {
            Ok(text) => {
                debug!("seeding {}", path.display());
                scan.files
                    .push(SourceFile::new(path.to_path_buf(), kind, text));
            }
            Err(err) => {
                warn!("cannot read {}: {}", path.display(), err);
                scan.unreadable.push(path.display().to_string());
            }
        }
    }
    Ok(scan)
}
