//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity (document, query result, navigation node) leads with its
//! positional index and title; keys and descriptions follow as indented
//! context lines. Output reads as a content inventory while still letting
//! users trace entries back to their source documents.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! Documents
//! 001 Home → /
//!     Key: index.md
//! 002 Guide → /guide
//!     Key: 1.guide/index.md
//!
//! Ingested 10 documents from 10 files (0 skipped) in content
//! ```
//!
//! ## Navigation
//!
//! ```text
//! 001 Home → /
//! 002 Guide → /guide
//!     001 Installation → /guide/installation
//!     002 Deployment → /guide/deployment [draft, hidden]
//! 003 API Reference → /api [exclusive]
//! 004 Changelog → /releases [collapsed]
//! ```
//!
//! ## Query results
//!
//! ```text
//! 001 Installation → /guide/installation
//!     Key: 1.guide/1.installation.md
//!     Description: Install the toolkit
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::ingest::Ingested;
use crate::navigation::NavNode;
use crate::query::Record;
use std::path::Path;

/// Longest description shown before truncation.
const DESCRIPTION_WIDTH: usize = 72;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with the URL it
/// leads to when there is one.
///
/// ```text
/// 001 Guide → /guide
/// 002 (2.api/index.md)
/// ```
fn entity_header(index: usize, title: Option<&str>, fallback: &str, to: Option<&str>) -> String {
    let label = match title {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => format!("({fallback})"),
    };
    match to {
        Some(to) if !to.is_empty() => format!("{} {} → {}", format_index(index), label, to),
        _ => format!("{} {}", format_index(index), label),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn pluralize(n: usize, singular: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {singular}s")
    }
}

// ============================================================================
// Ingest
// ============================================================================

/// Format the documents found by ingestion, in document order.
pub fn format_ingest_output(ingested: &Ingested, source: &Path) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];
    for (i, document) in ingested.documents.iter().enumerate() {
        lines.push(entity_header(
            i + 1,
            document.title(),
            &document.key,
            Some(document.to.as_str()),
        ));
        lines.push(format!("{}Key: {}", indent(1), document.key));
        if document.draft {
            lines.push(format!("{}Draft", indent(1)));
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Ingested {} from {} ({} skipped) in {}",
        pluralize(ingested.documents.len(), "document"),
        pluralize(ingested.files, "file"),
        ingested.skipped,
        source.display()
    ));
    lines
}

pub fn print_ingest_output(ingested: &Ingested, source: &Path) {
    for line in format_ingest_output(ingested, source) {
        println!("{}", line);
    }
}

// ============================================================================
// Query results
// ============================================================================

/// Format query results: one header per record plus key and description.
pub fn format_records(records: &[Record]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, record) in records.iter().enumerate() {
        lines.push(entity_header(
            i + 1,
            record.str_field("title"),
            record.key(),
            record.to(),
        ));
        lines.push(format!("{}Key: {}", indent(1), record.key()));
        if let Some(description) = record.str_field("description") {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(description, DESCRIPTION_WIDTH)
            ));
        }
    }
    if records.is_empty() {
        lines.push("No documents matched".to_string());
    }
    lines
}

pub fn print_records(records: &[Record]) {
    for line in format_records(records) {
        println!("{}", line);
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Format a navigation forest, one line per node, children indented.
pub fn format_navigation(tree: &[NavNode]) -> Vec<String> {
    let mut lines = Vec::new();
    walk_nav(tree, 0, &mut lines);
    if lines.is_empty() {
        lines.push("Navigation is empty".to_string());
    }
    lines
}

fn walk_nav(nodes: &[NavNode], depth: usize, lines: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        let href = node.page.then(|| node.href());
        let mut line = format!(
            "{}{}",
            indent(depth),
            entity_header(i + 1, Some(node.title.as_str()), &node.slug, href)
        );
        let flags = node_flags(node);
        if !flags.is_empty() {
            line.push_str(&format!(" [{}]", flags.join(", ")));
        }
        lines.push(line);
        walk_nav(&node.children, depth + 1, lines);
    }
}

fn node_flags(node: &NavNode) -> Vec<&'static str> {
    [
        (node.draft, "draft"),
        (node.hidden, "hidden"),
        (node.exclusive, "exclusive"),
        (node.collapse, "collapsed"),
        (!node.nested, "flat"),
    ]
    .into_iter()
    .filter_map(|(set, label)| set.then_some(label))
    .collect()
}

pub fn print_navigation(tree: &[NavNode]) {
    for line in format_navigation(tree) {
        println!("{}", line);
    }
}

/// Format previous/next links around a page.
pub fn format_surrounding(prev: Option<&NavNode>, next: Option<&NavNode>) -> Vec<String> {
    let link = |node: Option<&NavNode>| match node {
        Some(node) => format!("{} → {}", node.title, node.href()),
        None => "-".to_string(),
    };
    vec![
        format!("Previous: {}", link(prev)),
        format!("Next: {}", link(next)),
    ]
}

pub fn print_surrounding(prev: Option<&NavNode>, next: Option<&NavNode>) {
    for line in format_surrounding(prev, next) {
        println!("{}", line);
    }
}
