// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Logging bootstrap
//!
//! stdout belongs to the protocol, so all diagnostics from every
//! component go to a timestamped log file under the OS temp directory.
//! Initialized once at startup; the subscriber is process-wide.

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber writing to a fresh log file.
///
/// Returns the log path, or `None` when the file could not be created;
/// the server still runs, just silently.
pub fn init_logging() -> Option<PathBuf> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = env::temp_dir().join(format!("vala-lsp-{}.log", timestamp));
    let file = File::create(&path).ok()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vala_lsp_lsp=debug,vala_lsp_compiler=debug,info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Some(path)
}
