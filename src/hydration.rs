//! Transfer of store contents between two stores.
//!
//! A server-side store serializes itself; a client-side store loads the
//! result and from then on answers the same queries locally.
//!
//! ## Encoding
//!
//! ```json
//! {
//!   "version": 1,
//!   "checksum": "<sha256 hex of the serialized documents>",
//!   "documents": [ { "key": "/guide", "to": "/guide", ... }, ... ]
//! }
//! ```
//!
//! Documents are their field views in document order. The checksum covers
//! the compact JSON text of the `documents` array; object keys serialize in
//! sorted order, so the same contents always produce the same checksum.
//!
//! Loading checks version, checksum and key uniqueness before anything is
//! swapped in, so a rejected snapshot leaves the target store untouched.

use crate::document::Document;
use crate::error::ContentError;
use crate::store::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Snapshot format version. Bump when the encoding changes.
const SNAPSHOT_VERSION: u32 = 1;

/// Opaque, self-validating copy of a store's contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationSnapshot {
    version: u32,
    checksum: String,
    documents: Value,
}

impl HydrationSnapshot {
    pub(crate) fn capture(snapshot: &Snapshot) -> Self {
        let documents = Value::Array(
            snapshot
                .entries()
                .iter()
                .map(|entry| Value::Object(entry.fields().clone()))
                .collect(),
        );
        Self {
            version: SNAPSHOT_VERSION,
            checksum: checksum(&documents),
            documents,
        }
    }

    /// Parse a snapshot received as JSON text. Validation happens on load.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        serde_json::from_str(json).map_err(ContentError::load)
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({
            "version": self.version,
            "checksum": self.checksum,
            "documents": self.documents,
        })
        .to_string()
    }

    pub fn document_count(&self) -> usize {
        self.documents.as_array().map_or(0, Vec::len)
    }

    /// Decode and validate into a snapshot ready to be swapped in.
    pub(crate) fn restore(&self) -> Result<Snapshot, ContentError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ContentError::load(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        if checksum(&self.documents) != self.checksum {
            return Err(ContentError::load("checksum mismatch"));
        }
        let Value::Array(raw) = &self.documents else {
            return Err(ContentError::load("documents must be an array"));
        };

        let mut seen = HashSet::new();
        let mut documents = Vec::with_capacity(raw.len());
        for (i, value) in raw.iter().enumerate() {
            let document: Document = serde_json::from_value(value.clone())
                .map_err(|e| ContentError::load(format!("document {i}: {e}")))?;
            if document.key.is_empty() {
                return Err(ContentError::load(format!("document {i} has no key")));
            }
            if !seen.insert(document.key.clone()) {
                return Err(ContentError::load(format!(
                    "duplicate key: {}",
                    document.key
                )));
            }
            documents.push(document);
        }
        Ok(Snapshot::from_documents(documents))
    }
}

fn checksum(documents: &Value) -> String {
    format!("{:x}", Sha256::digest(documents.to_string().as_bytes()))
}

/// Runtime facts that decide whether a client should answer queries from
/// a locally loaded store instead of asking the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStoreSignals {
    pub is_client: bool,
    /// The site runs as a single-page app without server rendering.
    pub spa: bool,
    /// A `preview` query flag is present.
    pub preview_query: bool,
    /// A preview token is present.
    pub preview_token: bool,
}

/// True only on a client, and only in SPA mode or while previewing.
pub fn use_local_store(signals: &LocalStoreSignals) -> bool {
    signals.is_client && (signals.spa || signals.preview_query || signals.preview_token)
}
