//! # Docus Content
//!
//! A content query and navigation engine for documentation sites. A content
//! pipeline turns markdown into structured documents; this crate stores
//! them, answers queries over them, and derives the navigation tree.
//!
//! # Architecture: Two Independent Paths
//!
//! ```text
//! documents ─→ DocumentStore ─→ QueryBuilder ─→ executor ─→ records
//!                    │                              └─→ SearchIndex (text queries)
//!                    └─→ NavigationBuilder ─→ navigation tree
//! ```
//!
//! Queries and navigation never depend on each other. Both read from a
//! frozen [`store::Snapshot`], so neither ever sees a half-applied update.
//!
//! ```
//! use docus_content::{ContentProvider, Document, DocumentStore, SortDirection};
//! use serde_json::json;
//!
//! let store = DocumentStore::new();
//! store.set("/guide", Document::new("/guide").with_meta("title", "Guide"));
//! store.set("/guide/setup", Document::new("/guide/setup").with_meta("title", "Setup"));
//!
//! let setup = store
//!     .query()
//!     .filter(json!({"title": "Setup"}))?
//!     .only("title")
//!     .fetch()?;
//! assert_eq!(setup.keys(), vec!["/guide/setup"]);
//! # Ok::<(), docus_content::ContentError>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`document`] | The document model: typed fields plus a flattened front-matter table |
//! | [`store`] | `ContentProvider` contract and the in-memory `DocumentStore` |
//! | [`hydration`] | Self-validating snapshots for moving store contents between stores |
//! | [`query`] | Chainable query builder, parameters, predicates and the executor |
//! | [`search`] | Ranked full-text index with field inheritance from exclusive ancestors |
//! | [`navigation`] | Navigation tree derivation, scoping and previous/next lookup |
//! | [`naming`] | `NNN.name` path segment parser used for ordering and titles |
//! | [`ingest`] | Loads pre-built JSON documents from a file or directory |
//! | [`config`] | `docus.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//! | [`error`] | `ContentError`, the query and store failure type |
//!
//! # Design Decisions
//!
//! ## Builder Errors at the Call Site
//!
//! Chain methods that take values which can be wrong (`limit`, `skip`,
//! `surround`, `filter`) return `Result` and reject bad input right there. A
//! query that made it to `fetch` is well-formed; `fetch` only fails for
//! reasons that depend on the data (`NotFound`) or the store
//! (`IndexUnavailable`).
//!
//! ## Typed Records, Open Side-Tables
//!
//! Documents carry typed fields for everything the engine interprets and a
//! flattened `meta` map for the rest of the front-matter. Navigation,
//! template and layout settings do the same with their own `extra` maps, so
//! renderer-specific keys pass through untouched.
//!
//! ## Falsy Flags as Variants
//!
//! Front-matter writes `navigation: false` or an object, `toc: false` or a
//! tree. Those become [`Navigation`] and [`document::Toc`] variants instead
//! of loosely typed values.
//!
//! ## No Ambient Store
//!
//! Every query starts from an explicit store and every navigation build
//! takes an explicit document slice. Which store a client binds to is the
//! caller's decision; [`hydration::use_local_store`] encodes the usual rule.

pub mod config;
pub mod document;
pub mod error;
pub mod hydration;
pub mod ingest;
pub mod naming;
pub mod navigation;
pub mod output;
pub mod query;
pub mod search;
pub mod store;

pub use config::{EngineConfig, SearchConfig};
pub use document::{Document, Navigation, NavigationConfig};
pub use error::ContentError;
pub use hydration::HydrationSnapshot;
pub use navigation::{NavNode, NavigationBuilder};
pub use query::{Fetched, QueryBuilder, QueryParams, Record, SortDirection};
pub use store::{ContentProvider, DocumentStore, Snapshot};

#[cfg(test)]
pub(crate) mod test_helpers;
