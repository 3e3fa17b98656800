//! The document model shared by the store, the query engine and the
//! navigation builder.
//!
//! Documents arrive fully built from an external content pipeline; the engine
//! never parses markup. The body is an opaque JSON tree.
//!
//! Open-ended structures (`navigation`, `template`, `layout`) are typed
//! records with an explicit `extra` side-table for renderer-specific keys.
//! Front-matter fields without a dedicated slot (`title`, `description`,
//! `position`, `icon`, ...) live in [`Document::meta`], which is flattened on
//! the wire so the field view matches the source front-matter.
//!
//! Flags that the source format expresses as "`false` or an object"
//! (`navigation`, `toc`) are modelled as [`Navigation`] and [`Toc`] variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped key/value pairs kept alongside a typed record.
pub type Extras = Map<String, Value>;

/// Wire names of the typed [`Document`] fields. A meta entry under one of
/// these names would shadow the typed value in the field view.
const TYPED_FIELDS: &[&str] = &[
    "key",
    "path",
    "to",
    "extension",
    "language",
    "slug",
    "dir",
    "page",
    "empty",
    "draft",
    "parent",
    "navigation",
    "template",
    "layout",
    "toc",
    "head",
    "body",
    "createdAt",
    "updatedAt",
];

/// Whether `name` is the wire name of a typed document field.
pub fn is_typed_field(name: &str) -> bool {
    TYPED_FIELDS.contains(&name)
}

/// One content unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique, stable identifier derived from the source path.
    #[serde(default)]
    pub key: String,
    /// Storage path, e.g. `/1.guide/2.setup`.
    #[serde(default)]
    pub path: String,
    /// Resolved navigation URL, e.g. `/guide/setup`.
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub dir: String,
    /// `false` means the document is not routable on its own.
    #[serde(default = "default_true")]
    pub page: bool,
    /// Set by the pipeline when the source has no body content.
    #[serde(default)]
    pub empty: bool,
    #[serde(default)]
    pub draft: bool,
    /// URL of the nearest exclusive ancestor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub navigation: Navigation,
    #[serde(default)]
    pub template: Template,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub toc: Toc,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub head: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Remaining front-matter (`title`, `description`, `position`, ...).
    #[serde(flatten)]
    pub meta: Extras,
}

fn default_true() -> bool {
    true
}

impl Default for Document {
    fn default() -> Self {
        Self {
            key: String::new(),
            path: String::new(),
            to: String::new(),
            extension: String::new(),
            language: None,
            slug: String::new(),
            dir: String::new(),
            page: true,
            empty: false,
            draft: false,
            parent: None,
            navigation: Navigation::default(),
            template: Template::default(),
            layout: Layout::default(),
            toc: Toc::default(),
            head: Value::Null,
            body: Value::Null,
            created_at: None,
            updated_at: None,
            meta: Extras::new(),
        }
    }
}

impl Document {
    /// A routable document whose key, path and URL are all `to`.
    pub fn new(to: impl Into<String>) -> Self {
        let to = to.into();
        let slug = to.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            key: to.clone(),
            path: to.clone(),
            to,
            slug,
            ..Self::default()
        }
    }

    /// Set a front-matter value, returning the document for chaining.
    ///
    /// Typed field names (`draft`, `to`, `parent`, ...) are ignored; set the
    /// struct field instead.
    pub fn with_meta(mut self, field: &str, value: impl Into<Value>) -> Self {
        if !is_typed_field(field) {
            self.meta.insert(field.to_string(), value.into());
        }
        self
    }

    /// Remove meta entries named like typed fields, returning their names.
    pub fn drop_shadowing_meta(&mut self) -> Vec<String> {
        let shadowing: Vec<String> = self
            .meta
            .keys()
            .filter(|name| is_typed_field(name))
            .cloned()
            .collect();
        for name in &shadowing {
            self.meta.remove(name);
        }
        shadowing
    }

    pub fn title(&self) -> Option<&str> {
        self.meta.get("title").and_then(Value::as_str)
    }

    pub fn icon(&self) -> Option<&str> {
        self.meta.get("icon").and_then(Value::as_str)
    }

    /// Explicit ordering hint from front-matter.
    pub fn position(&self) -> Option<&Value> {
        self.meta.get("position").filter(|v| !v.is_null())
    }

    /// Navigation settings, or `None` when the document opted out.
    pub fn navigation_config(&self) -> Option<&NavigationConfig> {
        match &self.navigation {
            Navigation::Enabled(config) => Some(config),
            Navigation::Disabled => None,
        }
    }

    pub fn is_exclusive(&self) -> bool {
        self.navigation_config().is_some_and(|c| c.exclusive)
    }

    /// The document as a flat field map, the shape queries filter, sort and
    /// project on. Typed fields always win over same-named meta entries.
    pub fn field_view(&self) -> Map<String, Value> {
        if self.meta.keys().any(|name| is_typed_field(name)) {
            let mut clean = self.clone();
            clean.drop_shadowing_meta();
            return clean.field_view();
        }
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            _ => Map::new(),
        }
    }
}

/// `navigation: false` or a navigation config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNavigation", into = "RawNavigation")]
pub enum Navigation {
    /// Excluded from every navigation tree.
    Disabled,
    Enabled(NavigationConfig),
}

impl Default for Navigation {
    fn default() -> Self {
        Self::Enabled(NavigationConfig::default())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawNavigation {
    Flag(bool),
    Config(NavigationConfig),
}

impl From<RawNavigation> for Navigation {
    fn from(raw: RawNavigation) -> Self {
        match raw {
            RawNavigation::Flag(false) => Navigation::Disabled,
            RawNavigation::Flag(true) => Navigation::default(),
            RawNavigation::Config(config) => Navigation::Enabled(config),
        }
    }
}

impl From<Navigation> for RawNavigation {
    fn from(navigation: Navigation) -> Self {
        match navigation {
            Navigation::Disabled => RawNavigation::Flag(false),
            Navigation::Enabled(config) => RawNavigation::Config(config),
        }
    }
}

/// Per-document navigation behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Menu label; falls back to the document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `false` lists the document but none of its descendants.
    pub nested: bool,
    /// Hides sibling sections while inside this document's subtree.
    pub exclusive: bool,
    /// Children start collapsed in menus.
    pub collapse: bool,
    /// Activating the node leads here instead of the document's own URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(flatten)]
    pub extra: Extras,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            title: None,
            nested: true,
            exclusive: false,
            collapse: false,
            redirect: None,
            extra: Extras::new(),
        }
    }
}

/// Render hints for the document itself and for its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<String>,
    #[serde(flatten)]
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aside: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aside_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fluid: Option<bool>,
    #[serde(flatten)]
    pub extra: Extras,
}

/// `toc: false` or a table-of-contents tree (opaque to the engine).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawToc", into = "RawToc")]
pub enum Toc {
    #[default]
    Disabled,
    Enabled(Value),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawToc {
    Flag(bool),
    Tree(Value),
}

impl From<RawToc> for Toc {
    fn from(raw: RawToc) -> Self {
        match raw {
            RawToc::Flag(false) => Toc::Disabled,
            RawToc::Flag(true) => Toc::Enabled(Value::Bool(true)),
            RawToc::Tree(tree) => Toc::Enabled(tree),
        }
    }
}

impl From<Toc> for RawToc {
    fn from(toc: Toc) -> Self {
        match toc {
            Toc::Disabled => RawToc::Flag(false),
            Toc::Enabled(tree) => RawToc::Tree(tree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_document_gets_defaults() {
        let doc: Document = serde_json::from_value(json!({"key": "/a", "to": "/a"})).unwrap();
        assert!(doc.page);
        assert!(!doc.draft);
        assert_eq!(doc.navigation, Navigation::default());
        assert_eq!(doc.toc, Toc::Disabled);
        assert!(doc.meta.is_empty());
    }

    #[test]
    fn navigation_false_is_disabled() {
        let doc: Document =
            serde_json::from_value(json!({"key": "/a", "navigation": false})).unwrap();
        assert_eq!(doc.navigation, Navigation::Disabled);
        assert!(doc.navigation_config().is_none());
        assert_eq!(doc.field_view()["navigation"], json!(false));
    }

    #[test]
    fn navigation_config_keeps_unknown_keys() {
        let doc: Document = serde_json::from_value(json!({
            "key": "/guide",
            "navigation": {"title": "Guide", "exclusive": true, "badge": "new"}
        }))
        .unwrap();
        let config = doc.navigation_config().unwrap();
        assert_eq!(config.title.as_deref(), Some("Guide"));
        assert!(config.exclusive);
        assert!(config.nested);
        assert_eq!(config.extra["badge"], json!("new"));
    }

    #[test]
    fn front_matter_lands_in_meta() {
        let doc: Document = serde_json::from_value(json!({
            "key": "/a",
            "title": "Intro",
            "position": "010",
            "icon": "book"
        }))
        .unwrap();
        assert_eq!(doc.title(), Some("Intro"));
        assert_eq!(doc.icon(), Some("book"));
        assert_eq!(doc.position(), Some(&json!("010")));
    }

    #[test]
    fn template_self_field_is_renamed() {
        let doc: Document = serde_json::from_value(json!({
            "key": "/a",
            "template": {"self": "page", "nested": "post", "variant": 2}
        }))
        .unwrap();
        assert_eq!(doc.template.page.as_deref(), Some("page"));
        assert_eq!(doc.template.nested.as_deref(), Some("post"));
        assert_eq!(doc.template.extra["variant"], json!(2));
    }

    #[test]
    fn layout_uses_camel_case() {
        let doc: Document = serde_json::from_value(json!({
            "key": "/a",
            "layout": {"aside": false, "asideClass": "wide"}
        }))
        .unwrap();
        assert_eq!(doc.layout.aside, Some(false));
        assert_eq!(doc.layout.aside_class.as_deref(), Some("wide"));
    }

    #[test]
    fn toc_variants() {
        let off: Document = serde_json::from_value(json!({"key": "/a", "toc": false})).unwrap();
        assert_eq!(off.toc, Toc::Disabled);

        let tree = json!({"title": "On this page", "links": []});
        let on: Document =
            serde_json::from_value(json!({"key": "/a", "toc": tree.clone()})).unwrap();
        assert_eq!(on.toc, Toc::Enabled(tree));
    }

    #[test]
    fn timestamps_use_camel_case() {
        let doc: Document = serde_json::from_value(json!({
            "key": "/a",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert!(doc.created_at.is_some());
        assert!(doc.field_view().contains_key("createdAt"));
    }

    #[test]
    fn field_view_flattens_meta() {
        let doc = Document::new("/guide/setup").with_meta("title", "Setup");
        let fields = doc.field_view();
        assert_eq!(fields["title"], json!("Setup"));
        assert_eq!(fields["slug"], json!("setup"));
        assert_eq!(fields["page"], json!(true));
    }

    #[test]
    fn with_meta_ignores_typed_field_names() {
        let doc = Document::new("/a").with_meta("draft", true).with_meta("to", "/b");
        assert!(doc.meta.is_empty());
        assert!(!doc.draft);
        assert_eq!(doc.to, "/a");
    }

    #[test]
    fn typed_fields_win_over_shadowing_meta() {
        let mut doc = Document::new("/a");
        doc.meta.insert("draft".into(), json!(true));
        doc.meta.insert("parent".into(), json!("/elsewhere"));
        doc.meta.insert("title".into(), json!("A"));

        let fields = doc.field_view();
        assert_eq!(fields["draft"], json!(false));
        assert!(!fields.contains_key("parent"));
        assert_eq!(fields["title"], json!("A"));

        let mut dropped = doc.drop_shadowing_meta();
        dropped.sort_unstable();
        assert_eq!(dropped, vec!["draft", "parent"]);
        assert_eq!(doc.meta.keys().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn document_roundtrips_through_json() {
        let doc = Document {
            parent: Some("/guide".into()),
            draft: true,
            body: json!({"type": "root", "children": []}),
            toc: Toc::Enabled(json!({"links": []})),
            ..Document::new("/guide/setup").with_meta("description", "How to")
        };
        let text = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }
}
