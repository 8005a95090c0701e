//! Content staging for raw fetched documents.
//!
//! A document's identity is its symbol plus retrieval timestamp; the
//! payload is the verbatim response body. `staged/`, `done/` and
//! `deadletter/` are sibling directories under one root, so state
//! transitions are single `rename` calls — atomic on one filesystem,
//! which keeps concurrent workers from observing half-moved documents.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const STAGED_DIR: &str = "staged";
const DONE_DIR: &str = "done";
const DEADLETTER_DIR: &str = "deadletter";

const DOC_EXTENSION: &str = "html";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// A raw fetched document awaiting (or past) processing.
///
/// Created only by the retriever; relocated only by the processor; the
/// payload is never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Stable identity: `<SYMBOL>-<retrieval timestamp>`
    pub doc_id: String,
    /// Symbol the page was fetched for
    pub symbol: String,
    /// When the page was retrieved
    pub fetched_at: DateTime<Utc>,
    /// Current on-disk location
    pub path: PathBuf,
}

/// Builds the stable document identity for a symbol and retrieval time.
///
/// A re-fetch of the same symbol within the same second replaces the
/// earlier snapshot, which is the same identity by definition.
#[must_use]
pub fn doc_id(symbol: &str, fetched_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        symbol.to_uppercase(),
        fetched_at.format(TIMESTAMP_FORMAT)
    )
}

fn parse_doc_id(stem: &str) -> Option<(String, DateTime<Utc>)> {
    // Symbols may themselves contain hyphens (e.g. BRK-B), so split on
    // the last one.
    let (symbol, timestamp) = stem.rsplit_once('-')?;
    let naive = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    Some((symbol.to_string(), naive.and_utc()))
}

/// Filesystem staging area for raw documents.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Opens (creating if needed) a staging area under `root`.
    ///
    /// # Errors
    /// Returns an error if the state directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [STAGED_DIR, DONE_DIR, DEADLETTER_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create staging directory: {}", path.display()))?;
        }
        Ok(Self { root })
    }

    fn state_dir(&self, state: &str) -> PathBuf {
        self.root.join(state)
    }

    fn file_name(id: &str) -> String {
        format!("{id}.{DOC_EXTENSION}")
    }

    /// Persists a response body verbatim into `staged/`.
    ///
    /// Writes to a temporary file first and renames it into place, so a
    /// concurrent scan never sees a partially written document.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be written or renamed.
    pub fn stage(
        &self,
        symbol: &str,
        fetched_at: DateTime<Utc>,
        body: &str,
    ) -> Result<RawDocument> {
        let id = doc_id(symbol, fetched_at);
        let final_path = self.state_dir(STAGED_DIR).join(Self::file_name(&id));
        let tmp_path = self.root.join(format!("{id}.tmp"));

        fs::write(&tmp_path, body)
            .with_context(|| format!("Failed to write staged document: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &final_path).with_context(|| {
            format!("Failed to move document into staging: {}", final_path.display())
        })?;

        Ok(RawDocument {
            doc_id: id,
            symbol: symbol.to_uppercase(),
            fetched_at,
            path: final_path,
        })
    }

    /// Enumerates documents currently staged, sorted by identity so scans
    /// are deterministic.
    ///
    /// # Errors
    /// Returns an error if the staging directory cannot be read.
    pub fn list_staged(&self) -> Result<Vec<RawDocument>> {
        let dir = self.state_dir(STAGED_DIR);
        let mut documents = Vec::new();

        for entry in
            fs::read_dir(&dir).with_context(|| format!("Failed to scan: {}", dir.display()))?
        {
            let entry = entry.context("Failed to read staging entry")?;
            if let Some(doc) = Self::document_at(&entry.path()) {
                documents.push(doc);
            }
        }

        documents.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        Ok(documents)
    }

    fn document_at(path: &Path) -> Option<RawDocument> {
        if path.extension().and_then(|e| e.to_str()) != Some(DOC_EXTENSION) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let (symbol, fetched_at) = parse_doc_id(stem)?;
        Some(RawDocument {
            doc_id: stem.to_string(),
            symbol,
            fetched_at,
            path: path.to_path_buf(),
        })
    }

    /// Reads a document's payload.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn read(&self, doc: &RawDocument) -> Result<String> {
        fs::read_to_string(&doc.path)
            .with_context(|| format!("Failed to read document: {}", doc.path.display()))
    }

    fn relocate(&self, doc: &RawDocument, state: &str) -> Result<RawDocument> {
        let target = self.state_dir(state).join(Self::file_name(&doc.doc_id));
        fs::rename(&doc.path, &target).with_context(|| {
            format!(
                "Failed to move {} to {}",
                doc.path.display(),
                target.display()
            )
        })?;
        Ok(RawDocument {
            path: target,
            ..doc.clone()
        })
    }

    /// Moves a fully processed document to `done/`.
    ///
    /// # Errors
    /// Returns an error if the rename fails.
    pub fn mark_done(&self, doc: &RawDocument) -> Result<RawDocument> {
        self.relocate(doc, DONE_DIR)
    }

    /// Moves a failed document to `deadletter/`.
    ///
    /// # Errors
    /// Returns an error if the rename fails.
    pub fn mark_deadletter(&self, doc: &RawDocument) -> Result<RawDocument> {
        self.relocate(doc, DEADLETTER_DIR)
    }

    /// Looks up a deadlettered document by identity for a retry attempt.
    ///
    /// # Errors
    /// Returns an error if the deadletter directory cannot be inspected.
    pub fn deadlettered(&self, id: &str) -> Result<Option<RawDocument>> {
        let path = self.state_dir(DEADLETTER_DIR).join(Self::file_name(id));
        if path.exists() {
            Ok(Self::document_at(&path))
        } else {
            Ok(None)
        }
    }
}
