//! The document store and the provider contract queries run against.
//!
//! [`ContentProvider`] is the seam between the query engine and wherever
//! documents live. The shipped implementation, [`DocumentStore`], keeps
//! everything in memory.
//!
//! ## Snapshots
//!
//! The store's state is an immutable [`Snapshot`] behind an
//! `Arc`. Readers clone the `Arc` under a short read lock and work without
//! any lock held, so a query never observes a half-applied `load`.
//! Mutations copy the snapshot when a reader still holds it
//! (`Arc::make_mut`) and swap the result in.
//!
//! Each entry keeps the typed [`Document`] next to its flat field view, the
//! map filters, sorts and projections operate on. The field view is computed
//! once per `set`, not per query.
//!
//! The search index is built lazily the first time a text query hits a
//! snapshot and dies with it: any mutation produces a snapshot without one.
//!
//! ## Document order
//!
//! Documents keep insertion order. Replacing a key keeps its position;
//! removing one closes the gap.

use crate::config::{EngineConfig, SearchConfig};
use crate::document::Document;
use crate::error::ContentError;
use crate::hydration::HydrationSnapshot;
use crate::query::{QueryBuilder, QueryParams, Record};
use crate::search::SearchIndex;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Storage contract the query engine reads through.
///
/// Implementations must be safe to share between threads; queries only
/// ever need [`snapshot`](Self::snapshot) and
/// [`search_config`](Self::search_config).
pub trait ContentProvider: Sync {
    fn get(&self, key: &str) -> Result<Arc<Document>, ContentError>;

    /// Store `document` under `key`, replacing any previous document.
    fn set(&self, key: &str, document: Document);

    fn remove(&self, key: &str) -> Option<Arc<Document>>;

    fn clear(&self);

    /// The current contents, frozen.
    fn snapshot(&self) -> Arc<Snapshot>;

    /// Search settings, or `None` when text queries are unsupported.
    fn search_config(&self) -> Option<&SearchConfig>;

    /// Capture the full contents for transfer to another store.
    fn serialize(&self) -> HydrationSnapshot;

    /// Replace the full contents with a captured snapshot. On failure the
    /// current contents are left as they were.
    fn load(&self, snapshot: &HydrationSnapshot) -> Result<(), ContentError>;

    /// A fresh query over this provider.
    fn query(&self) -> QueryBuilder<'_, Self>
    where
        Self: Sized,
    {
        QueryBuilder::new(self)
    }

    /// Ranked text search, refined by `params` (`where`, pagination,
    /// projection).
    fn search(&self, text: &str, params: QueryParams) -> Result<Vec<Record>, ContentError>
    where
        Self: Sized,
    {
        let mut query = QueryBuilder::with_term(self, text);
        query.text();
        Ok(query.fetch_with(params)?.into_records())
    }
}

/// One stored document and its query field view.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) document: Arc<Document>,
    pub(crate) fields: Arc<Map<String, Value>>,
}

impl Entry {
    fn new(mut document: Document) -> Self {
        document.drop_shadowing_meta();
        let fields = Arc::new(document.field_view());
        Self {
            document: Arc::new(document),
            fields,
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Frozen store contents.
#[derive(Debug, Default)]
pub struct Snapshot {
    entries: Vec<Entry>,
    positions: HashMap<String, usize>,
    index: OnceLock<SearchIndex>,
}

impl Clone for Snapshot {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            positions: self.positions.clone(),
            index: OnceLock::new(),
        }
    }
}

impl Snapshot {
    /// Build a snapshot from documents in order. A later document with an
    /// already-seen key replaces the earlier one in place.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut snapshot = Self::default();
        for document in documents {
            snapshot.upsert(document);
        }
        snapshot
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Document>> {
        self.positions.get(key).map(|&at| &self.entries[at].document)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|entry| entry.document.as_ref())
    }

    /// The search index for this snapshot, built on first use.
    pub(crate) fn search_index(&self, config: &SearchConfig) -> &SearchIndex {
        self.index
            .get_or_init(|| SearchIndex::build(&self.entries, config))
    }

    fn upsert(&mut self, document: Document) -> Option<Arc<Document>> {
        self.index = OnceLock::new();
        let entry = Entry::new(document);
        match self.positions.get(&entry.document.key) {
            Some(&at) => Some(std::mem::replace(&mut self.entries[at], entry).document),
            None => {
                self.positions
                    .insert(entry.document.key.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    fn remove(&mut self, key: &str) -> Option<Arc<Document>> {
        let at = self.positions.remove(key)?;
        self.index = OnceLock::new();
        let removed = self.entries.remove(at);
        for entry in &self.entries[at..] {
            if let Some(position) = self.positions.get_mut(&entry.document.key) {
                *position -= 1;
            }
        }
        Some(removed.document)
    }
}

/// In-memory [`ContentProvider`].
#[derive(Debug, Default)]
pub struct DocumentStore {
    state: RwLock<Arc<Snapshot>>,
    search: Option<SearchConfig>,
}

impl DocumentStore {
    /// An empty store without a search index.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store answering text queries with `config`.
    pub fn with_search(config: SearchConfig) -> Self {
        Self {
            search: Some(config),
            ..Self::default()
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            search: config.search_index(),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Keys in document order.
    pub fn keys(&self) -> Vec<String> {
        self.snapshot()
            .documents()
            .map(|d| d.key.clone())
            .collect()
    }

    /// All documents in document order.
    pub fn documents(&self) -> Vec<Arc<Document>> {
        self.snapshot()
            .entries()
            .iter()
            .map(|entry| Arc::clone(&entry.document))
            .collect()
    }

    /// Store documents under their own keys, in order.
    pub fn extend(&self, documents: impl IntoIterator<Item = Document>) {
        for document in documents {
            let key = document.key.clone();
            self.set(&key, document);
        }
    }

    /// A query for the one document routed at `to`.
    pub fn find(&self, to: &str) -> QueryBuilder<'_> {
        QueryBuilder::targeting(self, to)
    }

    /// A query carrying `term`: a path scope for structural queries, the
    /// search text once `text()` is set on it.
    pub fn query_path(&self, term: &str) -> QueryBuilder<'_> {
        QueryBuilder::with_term(self, term)
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut state = self.state.write();
        change(Arc::make_mut(&mut state))
    }
}

impl ContentProvider for DocumentStore {
    fn get(&self, key: &str) -> Result<Arc<Document>, ContentError> {
        self.snapshot()
            .get(key)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, mut document: Document) {
        document.key = key.to_string();
        let shadowing = document.drop_shadowing_meta();
        if !shadowing.is_empty() {
            warn!(key, fields = ?shadowing, "dropped meta entries named like typed fields");
        }
        self.mutate(|snapshot| {
            stamp(&mut document, snapshot.get(key).map(Arc::as_ref));
            if snapshot.upsert(document).is_some() {
                debug!(key, "document replaced");
            } else {
                debug!(key, "document added");
            }
        });
    }

    fn remove(&self, key: &str) -> Option<Arc<Document>> {
        let removed = self.mutate(|snapshot| snapshot.remove(key));
        if removed.is_some() {
            debug!(key, "document removed");
        }
        removed
    }

    fn clear(&self) {
        *self.state.write() = Arc::new(Snapshot::default());
        debug!("store cleared");
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.read())
    }

    fn search_config(&self) -> Option<&SearchConfig> {
        self.search.as_ref()
    }

    fn serialize(&self) -> HydrationSnapshot {
        HydrationSnapshot::capture(&self.snapshot())
    }

    fn load(&self, snapshot: &HydrationSnapshot) -> Result<(), ContentError> {
        let restored = snapshot.restore()?;
        let count = restored.len();
        *self.state.write() = Arc::new(restored);
        info!(documents = count, "store loaded from snapshot");
        Ok(())
    }
}

/// Fill in creation and update times for a document about to replace
/// `previous`.
///
/// Times supplied by the document win. A new key is created now; a
/// replacement keeps the original creation time and is updated now only
/// when its body changed.
fn stamp(document: &mut Document, previous: Option<&Document>) {
    let now = Utc::now();
    match previous {
        None => {
            let created = *document.created_at.get_or_insert(now);
            document.updated_at.get_or_insert(created);
        }
        Some(previous) => {
            document.created_at = previous.created_at.or(document.created_at).or(Some(now));
            if previous.body != document.body {
                document.updated_at = Some(now);
            } else if document.updated_at.is_none() {
                document.updated_at = previous.updated_at.or(document.created_at);
            }
        }
    }
}
