// Copyright (c) 2025 Vala LSP Team
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document Management
//!
//! This module provides document management for the LSP server.
//!
//! ## Overview
//!
//! The document store handles:
//! - Mapping URIs to source-file handles and their filesystem paths
//! - Monotone document versions (stale edits are rejected)
//! - Text content management using Ropey for efficient edits
//! - Applying LSP content changes, full and incremental
//!
//! ## Offsets
//!
//! Edit positions resolve to **byte** offsets: a position
//! `(line, character)` is the offset of the first byte of `line` plus
//! `character` UTF-8 code units. The server advertises
//! `positionEncoding: "utf-8"`, so this is exact rather than an
//! approximation of the UTF-16 default.

use ropey::Rope;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

/// A document managed by the LSP server.
#[derive(Debug, Clone)]
pub struct Document {
    uri: Url,
    path: PathBuf,
    language_id: String,
    version: i32,
    content: Rope,
}

impl Document {
    /// Create a new document.
    pub fn new(uri: Url, path: PathBuf, language_id: String, version: i32, text: &str) -> Self {
        Self {
            uri,
            path,
            language_id,
            version,
            content: Rope::from_str(text),
        }
    }

    /// The document URI.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The filesystem path behind the URI.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The language identifier the client declared.
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// The current editor version.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// The full document content.
    pub fn get_content(&self) -> String {
        self.content.to_string()
    }

    /// One line of text, without its line ending. Used for completion
    /// trigger classification and token extraction.
    pub fn get_line(&self, line: usize) -> Option<String> {
        if line >= self.content.len_lines() {
            return None;
        }
        let text = self.content.line(line).to_string();
        Some(text.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Byte offset of `(line, character)`, counting characters as UTF-8
    /// code units.
    pub fn byte_offset(&self, line: usize, character: usize) -> Option<usize> {
        if line >= self.content.len_lines() {
            return None;
        }
        let offset = self.content.line_to_byte(line) + character;
        if offset > self.content.len_bytes() {
            return None;
        }
        Some(offset)
    }

    /// Apply one LSP content change.
    ///
    /// A change with a range is an incremental splice at that range; a
    /// change without one replaces the whole document.
    pub fn apply_change(
        &mut self,
        change: &TextDocumentContentChangeEvent,
    ) -> Result<(), DocumentError> {
        match &change.range {
            Some(range) => {
                let start = self
                    .byte_offset(range.start.line as usize, range.start.character as usize)
                    .ok_or(DocumentError::InvalidRange {
                        line: range.start.line,
                        character: range.start.character,
                    })?;
                let end = self
                    .byte_offset(range.end.line as usize, range.end.character as usize)
                    .ok_or(DocumentError::InvalidRange {
                        line: range.end.line,
                        character: range.end.character,
                    })?;
                if start > end {
                    return Err(DocumentError::InvalidRange {
                        line: range.start.line,
                        character: range.start.character,
                    });
                }
                let start_char = self.content.byte_to_char(start);
                let end_char = self.content.byte_to_char(end);
                self.content.remove(start_char..end_char);
                self.content.insert(start_char, &change.text);
            }
            None => {
                self.content = Rope::from_str(&change.text);
            }
        }
        Ok(())
    }
}

/// Document store mapping URIs to documents.
///
/// Thread-safe; handlers clone documents out (Ropey clones are cheap).
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Arc<RwLock<HashMap<Url, Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the document at `uri`.
    pub async fn open(
        &self,
        uri: Url,
        path: PathBuf,
        language_id: String,
        version: i32,
        text: &str,
    ) {
        let document = Document::new(uri.clone(), path, language_id, version, text);
        self.documents.write().await.insert(uri, document);
    }

    /// Apply `changes` at `version`, returning the updated content.
    ///
    /// Versions are monotone: an edit whose version is older than the
    /// stored one is rejected and the content is untouched.
    pub async fn change(
        &self,
        uri: &Url,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<String, DocumentError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(uri)
            .ok_or_else(|| DocumentError::NotFound(uri.clone()))?;

        if version < document.version {
            return Err(DocumentError::StaleVersion {
                received: version,
                stored: document.version,
            });
        }

        for change in changes {
            document.apply_change(change)?;
        }
        document.version = version;
        Ok(document.get_content())
    }

    /// The document at `uri`, if open.
    pub async fn get(&self, uri: &Url) -> Option<Document> {
        self.documents.read().await.get(uri).cloned()
    }

    /// Whether `uri` is open.
    pub async fn contains(&self, uri: &Url) -> bool {
        self.documents.read().await.contains_key(uri)
    }

    /// Map every stored path to its URI. Queries use this to translate a
    /// resolved symbol's file back into client terms.
    pub async fn path_index(&self) -> HashMap<PathBuf, Url> {
        self.documents
            .read()
            .await
            .values()
            .map(|doc| (doc.path().to_path_buf(), doc.uri().clone()))
            .collect()
    }

    /// All open URIs.
    pub async fn uris(&self) -> Vec<Url> {
        self.documents.read().await.keys().cloned().collect()
    }

    /// Number of open documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Drop every document.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }
}

/// Document-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// No document is open at the URI.
    #[error("document not found: {0}")]
    NotFound(Url),

    /// The edit's position does not exist in the buffer.
    #[error("invalid edit position: line {line}, character {character}")]
    InvalidRange { line: u32, character: u32 },

    /// The edit carries an outdated version and was dropped.
    #[error("stale edit: version {received} older than stored {stored}")]
    StaleVersion { received: i32, stored: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{Position, Range};

    fn test_uri() -> Url {
        Url::parse("file:///test.vala").unwrap()
    }

    fn splice(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position {
                    line: start.0,
                    character: start.1,
                },
                end: Position {
                    line: end.0,
                    character: end.1,
                },
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    fn full(text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: text.to_string(),
        }
    }

    async fn store_with(text: &str) -> DocumentStore {
        let store = DocumentStore::new();
        store
            .open(
                test_uri(),
                PathBuf::from("/test.vala"),
                "vala".to_string(),
                1,
                text,
            )
            .await;
        store
    }

    #[test]
    fn test_byte_offset_counts_newlines() {
        let doc = Document::new(
            test_uri(),
            PathBuf::from("/test.vala"),
            "vala".to_string(),
            1,
            "int a;\nreturn a;",
        );

        assert_eq!(doc.byte_offset(0, 0), Some(0));
        assert_eq!(doc.byte_offset(0, 4), Some(4));
        assert_eq!(doc.byte_offset(1, 0), Some(7));
        assert_eq!(doc.byte_offset(1, 7), Some(14));
        assert_eq!(doc.byte_offset(5, 0), None);
    }

    #[test]
    fn test_byte_offset_is_utf8_code_units() {
        // "héllo" spans 6 bytes; character positions are byte positions.
        let doc = Document::new(
            test_uri(),
            PathBuf::from("/test.vala"),
            "vala".to_string(),
            1,
            "héllo\nx",
        );
        assert_eq!(doc.byte_offset(1, 0), Some(7));
    }

    #[tokio::test]
    async fn test_full_replacement() {
        let store = store_with("old").await;
        let content = store.change(&test_uri(), 2, &[full("new")]).await.unwrap();
        assert_eq!(content, "new");

        let doc = store.get(&test_uri()).await.unwrap();
        assert_eq!(doc.version(), 2);
    }

    #[tokio::test]
    async fn test_incremental_splice() {
        let store = store_with("int x = 3;").await;
        let content = store
            .change(&test_uri(), 2, &[splice((0, 4), (0, 5), "value")])
            .await
            .unwrap();
        assert_eq!(content, "int value = 3;");
    }

    #[tokio::test]
    async fn test_splice_across_lines() {
        let store = store_with("aaa\nbbb\nccc").await;
        let content = store
            .change(&test_uri(), 2, &[splice((0, 1), (2, 1), "")])
            .await
            .unwrap();
        assert_eq!(content, "acc");
    }

    #[tokio::test]
    async fn test_edits_apply_in_order() {
        let store = store_with("abc").await;
        let content = store
            .change(
                &test_uri(),
                2,
                &[splice((0, 0), (0, 1), "x"), splice((0, 1), (0, 2), "y")],
            )
            .await
            .unwrap();
        assert_eq!(content, "xyc");
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let store = store_with("original").await;
        store
            .change(&test_uri(), 3, &[full("third")])
            .await
            .unwrap();

        let result = store.change(&test_uri(), 2, &[full("stale")]).await;
        assert!(matches!(
            result,
            Err(DocumentError::StaleVersion {
                received: 2,
                stored: 3
            })
        ));

        // Content still reflects version 3.
        let doc = store.get(&test_uri()).await.unwrap();
        assert_eq!(doc.get_content(), "third");
        assert_eq!(doc.version(), 3);
    }

    #[tokio::test]
    async fn test_equal_version_is_accepted() {
        let store = store_with("one").await;
        let content = store.change(&test_uri(), 1, &[full("two")]).await.unwrap();
        assert_eq!(content, "two");
    }

    #[tokio::test]
    async fn test_change_unknown_uri() {
        let store = DocumentStore::new();
        let result = store.change(&test_uri(), 1, &[full("text")]).await;
        assert!(matches!(result, Err(DocumentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_range_is_rejected() {
        let store = store_with("short").await;
        let result = store
            .change(&test_uri(), 2, &[splice((4, 0), (4, 1), "x")])
            .await;
        assert!(matches!(result, Err(DocumentError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn test_path_index() {
        let store = store_with("x").await;
        let index = store.path_index().await;
        assert_eq!(index.get(Path::new("/test.vala")), Some(&test_uri()));
    }

    #[test]
    fn test_get_line_strips_ending() {
        let doc = Document::new(
            test_uri(),
            PathBuf::from("/test.vala"),
            "vala".to_string(),
            1,
            "first\nsecond\r\n",
        );
        assert_eq!(doc.get_line(0), Some("first".to_string()));
        assert_eq!(doc.get_line(1), Some("second".to_string()));
        assert_eq!(doc.get_line(5), None);
    }
}
