//! Shared test utilities for the docus-content test suite.
//!
//! Provides document builders, small ready-made stores, fixture setup and
//! navigation tree assertions.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = store_with(vec![
//!     stored("/1.guide", "/guide").with_meta("title", "Guide"),
//!     stored("/1.guide/1.setup", "/guide/setup").with_meta("title", "Setup"),
//! ]);
//!
//! let tree = NavigationBuilder::new().build(store.documents().iter().map(|d| d.as_ref()));
//! assert_nav_shape(&tree, &[("Guide", &["Setup"])]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::SearchConfig;
use crate::document::{Document, Navigation};
use crate::navigation::NavNode;
use crate::store::DocumentStore;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Keys of the fixture documents in ingestion order.
pub fn fixture_keys() -> Vec<&'static str> {
    vec![
        "index.md",
        "1.guide/index.md",
        "1.guide/1.installation.md",
        "1.guide/2.configuration.md",
        "1.guide/3.deployment.md",
        "2.api/index.md",
        "2.api/1.components.md",
        "2.api/2.composables.md",
        "3.changelog.md",
        "4.snippets.md",
    ]
}

// =========================================================================
// Document builders
// =========================================================================

/// A routable document keyed and stored at `to`.
pub fn doc(to: &str) -> Document {
    Document::new(to)
}

/// A document whose storage path differs from its URL, keyed by URL.
pub fn stored(path: &str, to: &str) -> Document {
    Document {
        path: path.to_string(),
        ..Document::new(to)
    }
}

/// A document that is queryable but not routable.
pub fn hidden_page(to: &str) -> Document {
    Document {
        page: false,
        ..Document::new(to)
    }
}

/// `document` placed under the exclusive ancestor at `parent`.
pub fn child_of(document: Document, parent: &str) -> Document {
    Document {
        parent: Some(parent.to_string()),
        ..document
    }
}

pub trait DocumentExt {
    /// Replace the navigation setting with its wire form (`false` or an
    /// object).
    fn with_navigation(self, navigation: serde_json::Value) -> Self;
}

impl DocumentExt for Document {
    fn with_navigation(mut self, navigation: serde_json::Value) -> Self {
        self.navigation = serde_json::from_value::<Navigation>(navigation).unwrap();
        self
    }
}

// =========================================================================
// Stores
// =========================================================================

/// A store without a search index holding `documents` in order.
pub fn store_with(documents: Vec<Document>) -> DocumentStore {
    let store = DocumentStore::new();
    store.extend(documents);
    store
}

/// Four documents: a guide section with two pages and an API page.
pub fn sample_store() -> DocumentStore {
    store_with(vec![
        stored("/1.guide", "/guide")
            .with_meta("title", "Guide")
            .with_meta("position", 1),
        stored("/1.guide/1.setup", "/guide/setup").with_meta("title", "Setup"),
        stored("/1.guide/2.usage", "/guide/usage").with_meta("title", "Usage"),
        stored("/2.api", "/api")
            .with_meta("title", "API")
            .with_meta("position", 2),
    ])
}

/// Search over `title` only, no inheritance.
pub fn title_search() -> SearchConfig {
    SearchConfig {
        enabled: true,
        fields: vec!["title".to_string()],
        inheritance_fields: vec![],
    }
}

// =========================================================================
// Navigation helpers
// =========================================================================

/// Titles of the given nodes in order.
pub fn nav_titles(nodes: &[NavNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.title.as_str()).collect()
}

/// Child titles under a given top-level node. Panics if it is not found.
pub fn nav_children_titles<'a>(tree: &'a [NavNode], parent_title: &str) -> Vec<&'a str> {
    tree.iter()
        .find(|n| n.title == parent_title)
        .map(|n| nav_titles(&n.children))
        .unwrap_or_else(|| {
            let titles = nav_titles(tree);
            panic!("nav item '{parent_title}' not found. Available: {titles:?}")
        })
}

/// Assert that the full navigation tree matches an expected shape.
///
/// Each entry is `(title, children)`. Use `&[]` for leaf nodes.
pub fn assert_nav_shape(tree: &[NavNode], expected: &[(&str, &[&str])]) {
    let actual: Vec<&str> = nav_titles(tree);
    let expected_titles: Vec<&str> = expected.iter().map(|(t, _)| *t).collect();
    assert_eq!(actual, expected_titles, "nav top-level titles mismatch");

    for (title, children) in expected {
        let actual_children = nav_children_titles(tree, title);
        assert_eq!(
            actual_children,
            children.to_vec(),
            "nav children of '{title}' mismatch"
        );
    }
}
