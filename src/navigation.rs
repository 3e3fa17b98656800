//! Navigation tree derivation.
//!
//! Turns the flat document set into an ordered forest of [`NavNode`]s. The
//! tree is derived on every call and never stored.
//!
//! ## Shape
//!
//! The hierarchy comes from the storage `path` of each document. Every
//! segment is a level; a document describes the node at its full path. A
//! document whose last segment is named `index` describes its directory
//! instead:
//!
//! ```text
//! /1.guide                 → Guide            (the guide document)
//! /1.guide/1.install       →   Install
//! /1.guide/2.configure     →   Configure
//! /2.api/1.auth            → api              (no document: page = false)
//!                          →   Auth
//! ```
//!
//! Directories without a describing document get `page: false` and a title
//! from the segment's display name (see [`naming`](crate::naming)).
//!
//! ## Rules
//!
//! - `navigation: false` documents are left out entirely, and so are
//!   documents in another language when a language is requested.
//! - Drafts (unless drafts are included) and `page: false` documents stay in
//!   the tree flagged `hidden`. A directory node whose children are all
//!   hidden is hidden as well.
//! - `nested: false` keeps the node and drops everything below it.
//! - `redirect` is carried on the node; [`NavNode::href`] resolves it.
//! - A document without its own `template.self` takes the `template.nested`
//!   of the document describing its parent directory.
//! - Siblings with an explicit `position` (or a numeric segment prefix) come
//!   first, ordered by that hint; the rest follow in document order.
//!
//! ## Exclusive sections
//!
//! An `exclusive` node bounds traversal: [`scope`] narrows the tree to the
//! nearest exclusive ancestor of a page, and [`surrounding`] only looks for
//! previous/next pages inside that scope.

use crate::config::NavigationSettings;
use crate::document::{Document, Extras, Navigation};
use crate::naming;
use crate::query::predicate::compare_values;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// One entry of the navigation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavNode {
    pub title: String,
    pub slug: String,
    pub to: String,
    /// `false` for directories without a describing document and for
    /// non-routable documents.
    pub page: bool,
    pub draft: bool,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub nested: bool,
    pub exclusive: bool,
    pub collapse: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Navigation keys the engine does not interpret.
    #[serde(flatten)]
    pub extra: Extras,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// Where activating this node leads.
    pub fn href(&self) -> &str {
        self.redirect.as_deref().unwrap_or(&self.to)
    }

    /// Shown in menus: neither hidden nor a bare directory.
    pub fn is_listed_page(&self) -> bool {
        self.page && !self.hidden
    }
}

/// Derives navigation forests from documents.
#[derive(Debug, Clone, Default)]
pub struct NavigationBuilder {
    language: Option<String>,
    include_drafts: bool,
}

/// A node under construction.
struct Branch {
    segment: String,
    node: NavNode,
    order: Option<Value>,
    /// Document order of the first document that reached this branch.
    seq: usize,
    described: bool,
    nested_template: Option<String>,
    children: Vec<Branch>,
}

impl Branch {
    fn directory(segment: &str, to: String, seq: usize) -> Self {
        let parsed = naming::parse_segment(segment);
        Self {
            segment: segment.to_string(),
            node: NavNode {
                title: parsed.display_title,
                slug: parsed.name,
                to,
                page: false,
                draft: false,
                hidden: false,
                template: None,
                icon: None,
                nested: true,
                exclusive: false,
                collapse: false,
                redirect: None,
                extra: Extras::new(),
                children: Vec::new(),
            },
            order: parsed.number.map(Value::from),
            seq,
            described: false,
            nested_template: None,
            children: Vec::new(),
        }
    }

    fn describe(&mut self, document: &Document, include_drafts: bool) {
        let node = &mut self.node;
        let config = document.navigation_config().cloned().unwrap_or_default();
        if let Some(title) = config.title.as_deref().or(document.title()) {
            node.title = title.to_string();
        }
        if !document.slug.is_empty() {
            node.slug = document.slug.clone();
        }
        node.to = document.to.clone();
        node.page = document.page;
        node.draft = document.draft;
        node.hidden = (document.draft && !include_drafts) || !document.page;
        node.template = document.template.page.clone();
        node.icon = document.icon().map(str::to_string);
        node.nested = config.nested;
        node.exclusive = config.exclusive;
        node.collapse = config.collapse;
        node.redirect = config.redirect;
        node.extra = config.extra;
        if let Some(position) = document.position() {
            self.order = Some(position.clone());
        }
        self.nested_template = document.template.nested.clone();
        self.described = true;
    }
}

impl NavigationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &NavigationSettings) -> Self {
        Self {
            include_drafts: settings.include_drafts,
            ..Self::default()
        }
    }

    /// Only list documents in `code` (documents without a language always
    /// qualify).
    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    pub fn include_drafts(mut self, include: bool) -> Self {
        self.include_drafts = include;
        self
    }

    /// Derive the forest from documents in document order.
    pub fn build<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> Vec<NavNode> {
        let mut roots: Vec<Branch> = Vec::new();
        let mut listed = 0usize;

        for (seq, document) in documents.into_iter().enumerate() {
            if matches!(document.navigation, Navigation::Disabled) {
                continue;
            }
            if let (Some(wanted), Some(language)) = (&self.language, &document.language)
                && wanted != language
            {
                continue;
            }
            let Some(branch) = locate(&mut roots, document, seq) else {
                continue;
            };
            if branch.described {
                warn!(
                    key = %document.key,
                    to = %branch.node.to,
                    "navigation node already described; document ignored"
                );
                continue;
            }
            branch.describe(document, self.include_drafts);
            listed += 1;
        }

        debug!(documents = listed, roots = roots.len(), "navigation built");
        finish(roots, None)
    }
}

/// Find or create the branch a document describes, creating directory
/// branches along the way.
fn locate<'b>(roots: &'b mut Vec<Branch>, document: &Document, seq: usize) -> Option<&'b mut Branch> {
    let source = if document.path.is_empty() {
        &document.to
    } else {
        &document.path
    };
    let mut chain = naming::segments(source);
    if chain
        .last()
        .is_some_and(|last| naming::parse_segment(last).name == "index")
    {
        chain.pop();
    }
    if chain.is_empty() {
        return descend(roots, &[("", "/".to_string())], seq);
    }

    // Directory URLs follow the document's own URL when it mirrors the
    // storage path level for level.
    let url_segments = naming::segments(&document.to);
    let mirrored = url_segments.len() == chain.len();
    let names: Vec<String> = chain
        .iter()
        .map(|segment| naming::parse_segment(segment).name)
        .collect();
    let steps: Vec<(&str, String)> = chain
        .iter()
        .enumerate()
        .map(|(depth, segment)| {
            let to = if mirrored {
                naming::join_url(&url_segments[..=depth])
            } else {
                let names: Vec<&str> = names[..=depth].iter().map(String::as_str).collect();
                naming::join_url(&names)
            };
            (*segment, to)
        })
        .collect();
    descend(roots, &steps, seq)
}

fn descend<'b>(
    level: &'b mut Vec<Branch>,
    steps: &[(&str, String)],
    seq: usize,
) -> Option<&'b mut Branch> {
    let ((segment, to), rest) = steps.split_first()?;
    let branch = child(level, segment, to.clone(), seq);
    if rest.is_empty() {
        Some(branch)
    } else {
        descend(&mut branch.children, rest, seq)
    }
}

fn child<'b>(level: &'b mut Vec<Branch>, segment: &str, to: String, seq: usize) -> &'b mut Branch {
    let at = match level.iter().position(|b| b.segment == segment) {
        Some(at) => at,
        None => {
            level.push(Branch::directory(segment, to, seq));
            level.len() - 1
        }
    };
    &mut level[at]
}

/// Order siblings, apply inheritance and visibility, and emit nodes.
fn finish(mut branches: Vec<Branch>, inherited_template: Option<&str>) -> Vec<NavNode> {
    branches.sort_by(sibling_order);
    branches
        .into_iter()
        .map(|branch| {
            let mut node = branch.node;
            if branch.described && node.template.is_none() {
                node.template = inherited_template.map(str::to_string);
            }
            let children = if node.nested {
                finish(branch.children, branch.nested_template.as_deref())
            } else {
                Vec::new()
            };
            if !branch.described && !children.is_empty() && children.iter().all(|c| c.hidden) {
                node.hidden = true;
            }
            node.children = children;
            node
        })
        .collect()
}

fn sibling_order(a: &Branch, b: &Branch) -> Ordering {
    match (&a.order, &b.order) {
        (Some(x), Some(y)) => compare_values(Some(x), Some(y)).then(a.seq.cmp(&b.seq)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.seq.cmp(&b.seq),
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// The node routed at `to`, anywhere in the forest.
pub fn find_node<'t>(tree: &'t [NavNode], to: &str) -> Option<&'t NavNode> {
    ancestry(tree, to).and_then(|path| path.last().copied())
}

/// Root-to-node chain for `to`.
fn ancestry<'t>(tree: &'t [NavNode], to: &str) -> Option<Vec<&'t NavNode>> {
    for node in tree {
        if node.to == to {
            return Some(vec![node]);
        }
        if let Some(mut path) = ancestry(&node.children, to) {
            path.insert(0, node);
            return Some(path);
        }
    }
    None
}

fn exclusive_ancestor<'t>(tree: &'t [NavNode], to: &str) -> Option<&'t NavNode> {
    ancestry(tree, to).and_then(|path| path.into_iter().rev().find(|node| node.exclusive))
}

/// The part of the forest a reader at `to` navigates: the nearest exclusive
/// ancestor-or-self of `to`, or the whole forest.
pub fn scope<'t>(tree: &'t [NavNode], to: &str) -> &'t [NavNode] {
    exclusive_ancestor(tree, to).map_or(tree, std::slice::from_ref)
}

/// Previous and next listed pages around `to`, within its scope.
///
/// Exclusive sections other than the reader's own count as a single entry;
/// their pages are not stepped through from outside.
pub fn surrounding<'t>(tree: &'t [NavNode], to: &str) -> (Option<&'t NavNode>, Option<&'t NavNode>) {
    let mut flat = Vec::new();
    match exclusive_ancestor(tree, to) {
        Some(section) => {
            flat.push(section);
            flatten(&section.children, to, &mut flat);
        }
        None => flatten(tree, to, &mut flat),
    }
    let Some(at) = flat.iter().position(|node| node.to == to) else {
        return (None, None);
    };
    let prev = at.checked_sub(1).map(|i| flat[i]);
    (prev, flat.get(at + 1).copied())
}

fn flatten<'t>(nodes: &'t [NavNode], to: &str, out: &mut Vec<&'t NavNode>) {
    for node in nodes {
        if node.is_listed_page() || node.to == to {
            out.push(node);
        }
        if !node.exclusive {
            flatten(&node.children, to, out);
        }
    }
}
