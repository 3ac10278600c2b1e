// crates/release-gate-core/src/core/document.rs
// ============================================================================
// Module: Policy Document Sources
// Description: Named, single-pass policy document streams.
// Purpose: Feed policy construction without prescribing where documents live.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Policy construction consumes an organization document (one byte stream)
//! and any iterator yielding [`NamedDocument`] values. Iterators are taken by
//! value, so a source is consumed exactly once, in order; re-iteration is
//! impossible without building a new source.
//!
//! Security posture: documents are untrusted; reads are bounded by
//! [`MAX_DOCUMENT_BYTES`] unless a caller supplies a tighter limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;
use std::io::Read;

use serde::de::DeserializeOwned;

use crate::core::error::PolicyError;
use crate::core::identifiers::PolicyId;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default maximum size of a single policy document or attestation in bytes.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

/// Only supported policy document format version.
pub const POLICY_FORMAT_VERSION: u32 = 1;

// ============================================================================
// SECTION: Named Documents
// ============================================================================

/// A policy document paired with the identifier it is registered under.
pub struct NamedDocument {
    /// Identifier assigned by the document source.
    pub id: PolicyId,
    /// Document byte stream.
    pub content: Box<dyn Read + Send>,
}

impl NamedDocument {
    /// Creates a named document from any readable stream.
    #[must_use]
    pub fn new(id: impl Into<PolicyId>, content: impl Read + Send + 'static) -> Self {
        Self {
            id: id.into(),
            content: Box::new(content),
        }
    }

    /// Creates a named document backed by in-memory bytes.
    #[must_use]
    pub fn from_bytes(id: impl Into<PolicyId>, bytes: Vec<u8>) -> Self {
        Self::new(id, Cursor::new(bytes))
    }
}

/// Identifier assignment strategy for in-memory document sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentIds {
    /// Each document receives `policy_id{index}`.
    Unique,
    /// Every document receives the shared default identifier.
    Shared,
}

/// In-memory document source over byte buffers.
pub struct BytesDocumentIterator {
    /// Remaining documents in order.
    documents: std::vec::IntoIter<Vec<u8>>,
    /// Index of the next document.
    index: usize,
    /// Identifier assignment strategy.
    ids: DocumentIds,
}

impl BytesDocumentIterator {
    /// Creates a source over `documents` using the given id strategy.
    #[must_use]
    pub fn new(documents: Vec<Vec<u8>>, ids: DocumentIds) -> Self {
        Self {
            documents: documents.into_iter(),
            index: 0,
            ids,
        }
    }
}

impl Iterator for BytesDocumentIterator {
    type Item = Result<NamedDocument, PolicyError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.documents.next()?;
        let id = match self.ids {
            DocumentIds::Unique => PolicyId::new(format!("policy_id{}", self.index)),
            DocumentIds::Shared => PolicyId::shared(),
        };
        self.index += 1;
        Some(Ok(NamedDocument::from_bytes(id, bytes)))
    }
}

// ============================================================================
// SECTION: Reading Helpers
// ============================================================================

/// Reads a stream fully, failing when it exceeds `max_bytes`.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidInput`] when the stream is too large and
/// [`PolicyError::Internal`] on I/O failure.
pub fn read_with_limit(reader: impl Read, max_bytes: usize) -> Result<Vec<u8>, PolicyError> {
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    reader
        .take(limit)
        .read_to_end(&mut bytes)
        .map_err(|err| PolicyError::Internal(format!("failed to read document: {err}")))?;
    if bytes.len() > max_bytes {
        return Err(PolicyError::InvalidInput(format!(
            "document exceeds size limit of {max_bytes} bytes"
        )));
    }
    Ok(bytes)
}

/// Reads and parses a JSON document with a size limit.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidInput`] when the document is too large or
/// does not parse.
pub fn parse_json_document<T: DeserializeOwned>(
    reader: impl Read,
    max_bytes: usize,
) -> Result<T, PolicyError> {
    let bytes = read_with_limit(reader, max_bytes)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| PolicyError::InvalidInput(format!("failed to parse document: {err}")))
}

/// Ensures a parsed document declares the supported format version.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidInput`] for any other version.
pub fn ensure_format(format: u32) -> Result<(), PolicyError> {
    if format != POLICY_FORMAT_VERSION {
        return Err(PolicyError::InvalidInput(format!(
            "unsupported policy format {format}, expected {POLICY_FORMAT_VERSION}"
        )));
    }
    Ok(())
}
