// crates/release-gate-config/src/source.rs
// ============================================================================
// Module: Directory Document Source
// Description: Project policy documents read from a directory.
// Purpose: Feed deployment policy construction from `*.json` files on disk.
// Dependencies: release-gate-core
// ============================================================================

//! ## Overview
//! [`DirectoryDocumentIterator`] lists a directory once, keeps the `*.json`
//! regular files sorted by file name, and yields one [`NamedDocument`] per
//! file with the file stem as its policy id. Files are opened lazily, one at
//! a time, as the iterator is consumed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::vec;

use release_gate_core::NamedDocument;
use release_gate_core::PolicyError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File extension of project policy documents.
const DOCUMENT_EXTENSION: &str = "json";
/// Maximum number of project documents accepted from one directory.
pub const MAX_DIRECTORY_DOCUMENTS: usize = 4096;

// ============================================================================
// SECTION: Iterator
// ============================================================================

/// Single-pass iterator over the project documents of a directory.
#[derive(Debug)]
pub struct DirectoryDocumentIterator {
    /// Remaining document paths in sorted order.
    paths: vec::IntoIter<PathBuf>,
}

impl DirectoryDocumentIterator {
    /// Lists `dir` and prepares its `*.json` files for iteration.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Internal`] when the directory cannot be listed
    /// and [`PolicyError::InvalidInput`] when it holds too many documents.
    pub fn new(dir: &Path) -> Result<Self, PolicyError> {
        let entries = fs::read_dir(dir).map_err(|err| {
            PolicyError::Internal(format!("failed to list {}: {err}", dir.display()))
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                PolicyError::Internal(format!("failed to list {}: {err}", dir.display()))
            })?;
            let path = entry.path();
            let is_file = entry.file_type().is_ok_and(|kind| kind.is_file());
            if is_file && path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION) {
                paths.push(path);
            }
        }
        if paths.len() > MAX_DIRECTORY_DOCUMENTS {
            return Err(PolicyError::InvalidInput(format!(
                "{} holds more than {MAX_DIRECTORY_DOCUMENTS} policy documents",
                dir.display()
            )));
        }
        paths.sort();
        Ok(Self {
            paths: paths.into_iter(),
        })
    }
}

impl Iterator for DirectoryDocumentIterator {
    type Item = Result<NamedDocument, PolicyError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(open_document(&path))
    }
}

/// Opens one project document, naming it after its file stem.
fn open_document(path: &Path) -> Result<NamedDocument, PolicyError> {
    let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
        return Err(PolicyError::InvalidInput(format!(
            "policy file name is not utf-8: {}",
            path.display()
        )));
    };
    let file = File::open(path).map_err(|err| {
        PolicyError::Internal(format!("failed to open {}: {err}", path.display()))
    })?;
    Ok(NamedDocument::new(stem, file))
}
