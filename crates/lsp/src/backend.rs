// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LSP Backend Implementation
//!
//! This module provides the main LSP server backend using tower-lsp.
//!
//! ## Overview
//!
//! The backend handles:
//! - LSP protocol communication via tower-lsp
//! - Document lifecycle (open, change)
//! - Workspace seeding on initialize
//! - Diagnostics, go-to-definition, and member completion
//!
//! ## Architecture
//!
//! ```text
//! Client → LSP Backend → Document Store
//!                ↓
//!       Compilation Context  (dirty flag, full re-analysis)
//!                ↓
//!       Reporter → publishDiagnostics
//!       AST      → definition / completion
//! ```
//!
//! ## Ordering
//!
//! Handlers run to completion and the compilation context sits behind
//! one async mutex, so analysis is strictly serial: a request following
//! a `didChange` in wire order always sees the post-edit state. The
//! context's dirty flag coalesces edit bursts into a single re-analysis
//! at the next query.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use vala_lsp_compiler::{CompilationContext, SourceFile, SourceKind};

use crate::completion::{self, TRIGGER_CHARACTERS};
use crate::config::ServerConfig;
use crate::definition::find_definition;
use crate::diagnostic::diagnostics_for_file;
use crate::document::{DocumentError, DocumentStore};
use crate::workspace::scan_workspace;

/// LSP backend implementation
///
/// Main entry point for all LSP protocol operations.
pub struct LspBackend {
    client: Client,
    documents: Arc<DocumentStore>,
    context: Arc<Mutex<CompilationContext>>,
    config: Arc<RwLock<ServerConfig>>,
}

impl LspBackend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DocumentStore::new()),
            context: Arc::new(Mutex::new(CompilationContext::new())),
            config: Arc::new(RwLock::new(ServerConfig::default())),
        }
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Seed the compilation context and document store from the
    /// workspace root.
    async fn seed_workspace(&self, root: PathBuf) {
        let scan = match scan_workspace(&root) {
            Ok(scan) => scan,
            Err(err) => {
                warn!("workspace seeding failed: {}", err);
                self.client
                    .show_message(
                        MessageType::ERROR,
                        format!("Workspace seeding failed: {}", err),
                    )
                    .await;
                return;
            }
        };

        if !scan.unreadable.is_empty() {
            self.client
                .show_message(
                    MessageType::ERROR,
                    format!("{} workspace files could not be read", scan.unreadable.len()),
                )
                .await;
        }

        info!("seeding {} files from {}", scan.files.len(), root.display());
        let mut context = self.context.lock().await;
        for file in scan.files {
            if let Ok(uri) = Url::from_file_path(file.path()) {
                self.documents
                    .open(
                        uri,
                        file.path().to_path_buf(),
                        crate::config::LANGUAGE_ID.to_string(),
                        0,
                        file.text(),
                    )
                    .await;
            }
            context.add_source_file(file);
        }
    }

    /// Publish diagnostics for one open document.
    async fn publish_for(&self, uri: &Url, path: &std::path::Path) {
        let diagnostics = {
            let mut context = self.context.lock().await;
            context.check();
            diagnostics_for_file(context.reporter(), path)
        };
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, None)
            .await;
    }

    /// Publish diagnostics for every open document.
    async fn publish_all(&self) {
        let index = self.documents.path_index().await;
        let batches: Vec<(Url, Vec<Diagnostic>)> = {
            let mut context = self.context.lock().await;
            context.check();
            index
                .iter()
                .map(|(path, uri)| {
                    (uri.clone(), diagnostics_for_file(context.reporter(), path))
                })
                .collect()
        };
        for (uri, diagnostics) in batches {
            self.client.publish_diagnostics(uri, diagnostics, None).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for LspBackend {
    /// Initialize the LSP server
    ///
    /// Consumes the workspace root, seeds the compilation context, and
    /// returns the server capabilities.
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("initializing, client: {:?}", params.client_info);

        let config =
            ServerConfig::from_initialization_options(params.initialization_options.as_ref());
        {
            let mut context = self.context.lock().await;
            for dir in &config.vapi_dirs {
                context.add_vapidir(dir.clone());
            }
            for package in &config.packages {
                context.add_package(package);
            }
        }
        *self.config.write().await = config;

        #[allow(deprecated)]
        let root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok())
            .or_else(|| params.root_path.as_ref().map(PathBuf::from));

        match root {
            Some(root) => self.seed_workspace(root).await,
            None => warn!("no workspace root in initialize params"),
        }

        // First full analysis, so diagnostics are ready before the first
        // query comes in.
        self.context.lock().await.check();

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                // Positions are byte-oriented throughout.
                position_encoding: Some(PositionEncodingKind::UTF8),

                // Text synchronization
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),

                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(
                        TRIGGER_CHARACTERS.iter().map(|c| c.to_string()).collect(),
                    ),
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: Some(false),
                    },
                    all_commit_characters: None,
                    completion_item: None,
                }),

                definition_provider: Some(OneOf::Left(true)),

                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: crate::SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("server initialized");
    }

    /// Shutdown the LSP server
    ///
    /// Drops all compiler and document state; the process exits on the
    /// following `exit` notification.
    async fn shutdown(&self) -> Result<()> {
        info!("shutting down");
        self.context.lock().await.clear();
        self.documents.clear().await;
        Ok(())
    }

    /// Document opened notification
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let served = self.config.read().await.language_id.clone();
        if doc.language_id != served {
            warn!(
                "ignoring document with language `{}': {}",
                doc.language_id, doc.uri
            );
            return;
        }

        let Ok(path) = doc.uri.to_file_path() else {
            warn!("ignoring non-file URI: {}", doc.uri);
            return;
        };

        info!("opened {} (version {})", doc.uri, doc.version);
        self.documents
            .open(
                doc.uri.clone(),
                path.clone(),
                doc.language_id,
                doc.version,
                &doc.text,
            )
            .await;

        {
            let mut context = self.context.lock().await;
            let kind = match SourceKind::from_path(&path) {
                SourceKind::Unknown => SourceKind::Source,
                kind => kind,
            };
            context.add_source_file(SourceFile::new(path.clone(), kind, doc.text));
        }

        self.publish_for(&doc.uri, &path).await;
    }

    /// Document changed notification
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let Some(document) = self.documents.get(&uri).await else {
            warn!("change for unknown document: {}", uri);
            return;
        };
        let path = document.path().to_path_buf();

        match self
            .documents
            .change(&uri, version, &params.content_changes)
            .await
        {
            Ok(content) => {
                let mut context = self.context.lock().await;
                if !context.set_source_text(&path, content.clone()) {
                    context.add_source_file(SourceFile::new(
                        path.clone(),
                        SourceKind::Source,
                        content,
                    ));
                }
            }
            Err(DocumentError::StaleVersion { received, stored }) => {
                warn!(
                    "dropping stale edit for {}: version {} < {}",
                    uri, received, stored
                );
                return;
            }
            Err(err) => {
                warn!("failed to apply edit to {}: {}", uri, err);
                return;
            }
        }

        self.publish_all().await;
    }

    /// Definition request
    ///
    /// Resolves the symbol at the cursor to the location it was declared
    /// at, or null when the target is not part of the workspace.
    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("definition requested: {} {:?}", uri, position);

        let Some(document) = self.documents.get(&uri).await else {
            warn!("definition for unknown document: {}", uri);
            return Ok(None);
        };
        let index = self.documents.path_index().await;

        let mut context = self.context.lock().await;
        context.check();
        let location = find_definition(context.ast(), &index, document.path(), position);

        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    /// Completion request
    ///
    /// Member completion after `.` and `->`; anything else yields an
    /// empty list.
    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        debug!("completion requested: {} {:?}", uri, position);

        let Some(document) = self.documents.get(&uri).await else {
            warn!("completion for unknown document: {}", uri);
            return Ok(None);
        };
        let Some(line) = document.get_line(position.line as usize) else {
            return Ok(Some(CompletionResponse::Array(Vec::new())));
        };

        let mut context = self.context.lock().await;
        context.check();
        let items = completion::complete(context.ast(), document.path(), &line, position);

        info!("completion returned {} items", items.len());
        Ok(Some(CompletionResponse::Array(items)))
    }
}
