//! Loading pre-built documents from disk.
//!
//! The content pipeline that parses markdown lives elsewhere; what reaches
//! this crate are finished documents as JSON. Two layouts are accepted:
//!
//! ```text
//! content.json              # one file: a JSON array of documents
//!
//! content/                  # a directory: one document per *.json file
//! ├── 1.guide.json
//! ├── 1.guide/
//! │   ├── 1.install.json
//! │   └── 2.configure.json
//! └── .drafts/              # hidden entries are skipped
//! ```
//!
//! Directory files are read in file-name order, so numbered names give a
//! stable document order.
//!
//! ## Validation
//!
//! - every document has a non-empty `key`
//! - no two documents share a key
//! - no two routable (`page: true`) documents share a `to`
//!
//! Documents whose key starts with one of the configured ignore prefixes are
//! dropped before validation.

use crate::config::EngineConfig;
use crate::document::Document;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid document JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Document without a key in {0}")]
    MissingKey(PathBuf),
    #[error("Duplicate document key: {0}")]
    DuplicateKey(String),
    #[error("Two pages route to {0}")]
    DuplicateRoute(String),
}

/// Result of one ingestion run.
#[derive(Debug)]
pub struct Ingested {
    /// Valid documents in source order.
    pub documents: Vec<Document>,
    /// Documents dropped by an ignore prefix.
    pub skipped: usize,
    /// JSON files read.
    pub files: usize,
}

pub fn ingest(source: &Path, config: &EngineConfig) -> Result<Ingested, IngestError> {
    let (sourced, files) = if source.is_dir() {
        read_directory(source)?
    } else {
        (read_manifest(source)?, 1)
    };

    let mut documents = Vec::with_capacity(sourced.len());
    let mut skipped = 0;
    for (path, document) in sourced {
        if document.key.is_empty() {
            return Err(IngestError::MissingKey(path));
        }
        if is_ignored(&document.key, &config.ignore) {
            warn!(key = %document.key, "document ignored by prefix");
            skipped += 1;
            continue;
        }
        documents.push(document);
    }
    validate(&documents)?;

    info!(
        documents = documents.len(),
        skipped,
        files,
        source = %source.display(),
        "content ingested"
    );
    Ok(Ingested {
        documents,
        skipped,
        files,
    })
}

fn read_manifest(path: &Path) -> Result<Vec<(PathBuf, Document)>, IngestError> {
    let content = fs::read_to_string(path)?;
    let documents: Vec<Document> = serde_json::from_str(&content).map_err(|source| {
        IngestError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(documents
        .into_iter()
        .map(|document| (path.to_path_buf(), document))
        .collect())
}

fn read_directory(root: &Path) -> Result<(Vec<(PathBuf, Document)>, usize), IngestError> {
    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let content = fs::read_to_string(path)?;
        let document: Document =
            serde_json::from_str(&content).map_err(|source| IngestError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        documents.push((path.to_path_buf(), document));
    }
    let files = documents.len();
    Ok((documents, files))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_ignored(key: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
}

fn validate(documents: &[Document]) -> Result<(), IngestError> {
    let mut keys = HashSet::new();
    let mut routes = HashSet::new();
    for document in documents {
        if !keys.insert(document.key.as_str()) {
            return Err(IngestError::DuplicateKey(document.key.clone()));
        }
        if document.page && !routes.insert(document.to.as_str()) {
            return Err(IngestError::DuplicateRoute(document.to.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(path: &Path, value: serde_json::Value) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, value.to_string()).unwrap();
    }

    #[test]
    fn fixture_directory_ingests_in_file_name_order() {
        let tmp = setup_fixtures();
        let ingested = ingest(tmp.path(), &EngineConfig::default()).unwrap();
        let keys: Vec<&str> = ingested.documents.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, fixture_keys());
        assert_eq!(ingested.files, fixture_keys().len());
        assert_eq!(ingested.skipped, 0);
    }

    #[test]
    fn manifest_file_keeps_array_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("content.json");
        write(
            &path,
            json!([{"key": "/b", "to": "/b"}, {"key": "/a", "to": "/a"}]),
        );
        let ingested = ingest(&path, &EngineConfig::default()).unwrap();
        let keys: Vec<&str> = ingested.documents.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["/b", "/a"]);
        assert_eq!(ingested.files, 1);
    }

    #[test]
    fn hidden_entries_and_other_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("a.json"), json!({"key": "/a", "to": "/a"}));
        write(&tmp.path().join(".drafts/b.json"), json!({"key": "/b", "to": "/b"}));
        fs::write(tmp.path().join("notes.md"), "# not a document").unwrap();
        let ingested = ingest(tmp.path(), &EngineConfig::default()).unwrap();
        assert_eq!(ingested.documents.len(), 1);
    }

    #[test]
    fn ignore_prefix_drops_documents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("content.json");
        write(
            &path,
            json!([{"key": "/a", "to": "/a"}, {"key": "_partials/footer", "to": "/footer"}]),
        );
        let config = EngineConfig {
            ignore: vec!["_partials".into()],
            ..EngineConfig::default()
        };
        let ingested = ingest(&path, &config).unwrap();
        assert_eq!(ingested.documents.len(), 1);
        assert_eq!(ingested.skipped, 1);
    }

    #[test]
    fn missing_key_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("a.json"), json!({"to": "/a"}));
        let result = ingest(tmp.path(), &EngineConfig::default());
        assert!(matches!(result, Err(IngestError::MissingKey(_))));
    }

    #[test]
    fn duplicate_key_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("content.json");
        write(
            &path,
            json!([{"key": "/a", "to": "/a"}, {"key": "/a", "to": "/other"}]),
        );
        let result = ingest(&path, &EngineConfig::default());
        assert!(matches!(result, Err(IngestError::DuplicateKey(k)) if k == "/a"));
    }

    #[test]
    fn duplicate_route_is_an_error_only_for_pages() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("content.json");
        write(
            &path,
            json!([{"key": "/a", "to": "/a"}, {"key": "/a-data", "to": "/a", "page": false}]),
        );
        assert!(ingest(&path, &EngineConfig::default()).is_ok());

        write(
            &path,
            json!([{"key": "/a", "to": "/a"}, {"key": "/a-copy", "to": "/a"}]),
        );
        let result = ingest(&path, &EngineConfig::default());
        assert!(matches!(result, Err(IngestError::DuplicateRoute(to)) if to == "/a"));
    }

    #[test]
    fn malformed_json_names_the_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.json"), "{ nope").unwrap();
        let err = ingest(tmp.path(), &EngineConfig::default()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
