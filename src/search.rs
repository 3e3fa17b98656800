//! Ranked full-text search over a store snapshot.
//!
//! ## Indexing
//!
//! Every document gets a term-frequency table built from the configured
//! fields ([`SearchConfig::indexed_fields`]). Dotted field names reach into
//! nested values (`navigation.title`). Strings, numbers and arrays of them
//! all contribute text.
//!
//! Inheritance fields fill gaps: when a document has no value of its own,
//! the value comes from its nearest exclusive ancestor, the document whose
//! `to` equals the `parent` URL. If that ancestor lacks it too, the chain
//! is followed further up. The walk is bounded by the number of documents,
//! so a `parent` cycle cannot loop.
//!
//! Body text (every string stored under a `value` key in the body tree) is
//! indexed separately and only counted by `deep` searches.
//!
//! Tables are built for all documents in parallel with rayon.
//!
//! ## Ranking
//!
//! A document's score is the summed frequency of the query tokens in its
//! table. Zero scores are dropped; equal scores keep document order. An
//! empty query ranks nothing and returns the candidates as given.

use crate::config::SearchConfig;
use crate::query::predicate;
use crate::store::Entry;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

type TermCounts = HashMap<String, u32>;

#[derive(Debug, Default)]
pub struct SearchIndex {
    fields: Vec<TermCounts>,
    bodies: Vec<TermCounts>,
}

impl SearchIndex {
    pub(crate) fn build(entries: &[Entry], config: &SearchConfig) -> Self {
        let routes: HashMap<&str, usize> = entries
            .iter()
            .enumerate()
            .rev()
            .map(|(at, entry)| (entry.document().to.as_str(), at))
            .collect();
        let indexed = config.indexed_fields();

        let (fields, bodies): (Vec<TermCounts>, Vec<TermCounts>) = entries
            .par_iter()
            .map(|entry| {
                let mut text = Vec::new();
                for field in &indexed {
                    let value = if config.inherits(field) {
                        inherited(entries, &routes, entry, field)
                    } else {
                        own_value(entry.fields(), field)
                    };
                    if let Some(value) = value {
                        collect_text(value, &mut text);
                    }
                }
                let mut body = Vec::new();
                collect_body_text(&entry.document().body, &mut body);
                (count_terms(&text), count_terms(&body))
            })
            .unzip();

        debug!(
            documents = entries.len(),
            fields = indexed.len(),
            "search index built"
        );
        Self { fields, bodies }
    }

    /// Candidate positions reordered by relevance to `query`.
    pub(crate) fn rank(&self, query: &str, candidates: &[usize], deep: bool) -> Vec<usize> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return candidates.to_vec();
        }
        let mut scored: Vec<(usize, u32)> = candidates
            .iter()
            .map(|&at| (at, self.score(at, &terms, deep)))
            .filter(|&(_, score)| score > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(at, _)| at).collect()
    }

    fn score(&self, at: usize, terms: &[String], deep: bool) -> u32 {
        let tally = |table: Option<&TermCounts>| -> u32 {
            table.map_or(0, |t| terms.iter().filter_map(|term| t.get(term)).sum())
        };
        let mut score = tally(self.fields.get(at));
        if deep {
            score += tally(self.bodies.get(at));
        }
        score
    }
}

/// Lowercased alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn own_value<'a>(fields: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    predicate::lookup(fields, field).filter(|value| !is_blank(value))
}

fn inherited<'a>(
    entries: &'a [Entry],
    routes: &HashMap<&str, usize>,
    entry: &'a Entry,
    field: &str,
) -> Option<&'a Value> {
    let mut current = entry;
    for _ in 0..=entries.len() {
        if let Some(value) = own_value(current.fields(), field) {
            return Some(value);
        }
        let parent = current.document().parent.as_deref()?;
        current = &entries[*routes.get(parent)?];
    }
    None
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn collect_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_text(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_text(item, out)),
        Value::Null | Value::Bool(_) => {}
    }
}

fn collect_body_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                match child {
                    Value::String(text) if name == "value" => out.push(text.clone()),
                    _ => collect_body_text(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_body_text(item, out)),
        _ => {}
    }
}

fn count_terms(text: &[String]) -> TermCounts {
    let mut counts = TermCounts::new();
    for token in text.iter().flat_map(|t| tokenize(t)) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::store::Snapshot;
    use crate::test_helpers::*;
    use serde_json::json;

    fn index_of(documents: Vec<Document>) -> (Snapshot, Vec<usize>) {
        let snapshot = Snapshot::from_documents(documents);
        let all = (0..snapshot.len()).collect();
        (snapshot, all)
    }

    #[test]
    fn tokenize_lowercases_alphanumeric_runs() {
        assert_eq!(
            tokenize("Getting-Started: v2 GUIDE!"),
            vec!["getting", "started", "v2", "guide"]
        );
        assert!(tokenize("  -- ").is_empty());
    }

    #[test]
    fn higher_frequency_ranks_first() {
        let config = title_search();
        let (snapshot, all) = index_of(
            vec![
                doc("/a").with_meta("title", "Deploy"),
                doc("/b").with_meta("title", "Deploy: deploy often"),
                doc("/c").with_meta("title", "Unrelated"),
            ],
        );
        let ranked = snapshot.search_index(&config).rank("deploy", &all, false);
        assert_eq!(ranked, vec![1, 0]);
    }

    #[test]
    fn ties_keep_document_order() {
        let config = title_search();
        let (snapshot, all) = index_of(
            vec![
                doc("/a").with_meta("title", "setup"),
                doc("/b").with_meta("title", "setup"),
            ],
        );
        assert_eq!(snapshot.search_index(&config).rank("setup", &all, false), vec![0, 1]);
    }

    #[test]
    fn empty_query_returns_candidates() {
        let config = title_search();
        let (snapshot, _) = index_of(vec![doc("/a"), doc("/b")]);
        assert_eq!(snapshot.search_index(&config).rank("  ", &[1, 0], false), vec![1, 0]);
    }

    #[test]
    fn body_text_only_counts_when_deep() {
        let config = title_search();
        let (snapshot, all) = index_of(
            vec![Document {
                body: json!({
                    "type": "root",
                    "children": [{"type": "element", "children": [{"type": "text", "value": "kubernetes"}]}]
                }),
                ..doc("/a")
            }],
        );
        let index = snapshot.search_index(&config);
        assert!(index.rank("kubernetes", &all, false).is_empty());
        assert_eq!(index.rank("kubernetes", &all, true), vec![0]);
    }

    #[test]
    fn dotted_field_reaches_nested_value() {
        let config = SearchConfig {
            enabled: true,
            fields: vec!["navigation.title".into()],
            inheritance_fields: vec![],
        };
        let (snapshot, all) = index_of(
            vec![doc("/a").with_navigation(json!({"title": "Components"}))],
        );
        assert_eq!(snapshot.search_index(&config).rank("components", &all, false), vec![0]);
    }

    #[test]
    fn inheritance_fills_missing_field_from_ancestor_chain() {
        let config = SearchConfig {
            enabled: true,
            fields: vec!["title".into()],
            inheritance_fields: vec!["section".into()],
        };
        let (snapshot, all) = index_of(
            vec![
                doc("/api").with_meta("section", "Reference").with_meta("title", "API"),
                child_of(doc("/api/v1"), "/api").with_meta("title", "Version one"),
                child_of(doc("/api/v1/auth"), "/api/v1").with_meta("title", "Auth"),
                doc("/blog").with_meta("title", "Reference notes"),
            ],
        );
        let ranked = snapshot.search_index(&config).rank("reference", &all, false);
        assert_eq!(ranked, vec![0, 1, 2, 3]);
    }

    #[test]
    fn own_value_beats_inherited_one() {
        let config = SearchConfig {
            enabled: true,
            fields: vec![],
            inheritance_fields: vec!["section".into()],
        };
        let (snapshot, all) = index_of(
            vec![
                doc("/api").with_meta("section", "Reference"),
                child_of(doc("/api/x"), "/api").with_meta("section", "Guide"),
            ],
        );
        let index = snapshot.search_index(&config);
        assert_eq!(index.rank("reference", &all, false), vec![0]);
        assert_eq!(index.rank("guide", &all, false), vec![1]);
    }

    #[test]
    fn parent_cycle_terminates() {
        let config = SearchConfig {
            enabled: true,
            fields: vec![],
            inheritance_fields: vec!["section".into()],
        };
        let (snapshot, all) = index_of(
            vec![child_of(doc("/a"), "/b"), child_of(doc("/b"), "/a")],
        );
        assert!(snapshot.search_index(&config).rank("anything", &all, false).is_empty());
    }
}
