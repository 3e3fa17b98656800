//! Query evaluation against one store snapshot.
//!
//! Stages run in a fixed order:
//!
//! 1. scope: a structural term keeps documents at or below that URL
//! 2. filter: the `where` predicate
//! 3. text search (ranking replaces sorting) or stable multi-key sort
//! 4. surround: neighbors of a target within the ordered sequence
//! 5. skip, then limit
//! 6. projection: `only`, then `without`
//!
//! The executor works on entry positions until projection, so stored
//! documents are never copied or mutated before the final page is known.

use super::params::{FieldList, QueryParams, SortDirection, SortKey, Surround};
use super::predicate::{self, compare_values};
use super::{Fetched, Record};
use crate::config::SearchConfig;
use crate::document::Document;
use crate::error::ContentError;
use crate::naming;
use crate::store::{Entry, Snapshot};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::debug;

/// Fields every projected record keeps.
const IDENTITY_FIELDS: [&str; 2] = ["key", "path"];

pub(crate) struct CompiledQuery {
    pub term: Option<String>,
    pub params: QueryParams,
    pub single: bool,
}

pub(crate) fn execute(
    snapshot: &Snapshot,
    search: Option<&SearchConfig>,
    query: &CompiledQuery,
) -> Result<Fetched, ContentError> {
    let params = &query.params;
    let entries = snapshot.entries();
    let scope = query.term.as_deref().filter(|_| !params.is_text());

    let mut ordered: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| scope.is_none_or(|s| naming::is_within(&entry.document.to, s)))
        .filter(|(_, entry)| {
            params
                .filter
                .as_ref()
                .is_none_or(|p| predicate::matches(&entry.fields, p))
        })
        .map(|(position, _)| position)
        .collect();
    debug!(
        total = entries.len(),
        matched = ordered.len(),
        "query filter applied"
    );

    if params.is_text() {
        let config = search.ok_or(ContentError::IndexUnavailable)?;
        let index = snapshot.search_index(config);
        let text = query.term.as_deref().unwrap_or_default();
        ordered = index.rank(text, &ordered, params.is_deep());
        debug!(text, ranked = ordered.len(), "text search ranked candidates");
    } else if !params.sort_by.is_empty() {
        ordered.sort_by(|&a, &b| compare_entries(&entries[a], &entries[b], &params.sort_by));
    }

    if let Some(surround) = &params.surround {
        ordered = surround_window(entries, &ordered, surround);
    }

    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.filter(|&n| n > 0).unwrap_or(usize::MAX);
    let records: Vec<Record> = ordered
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|position| {
            project(
                &entries[position].fields,
                params.only.as_ref(),
                params.without.as_ref(),
            )
        })
        .collect();

    if query.single {
        records.into_iter().next().map(Fetched::One).ok_or_else(|| {
            ContentError::NotFound(describe_target(query))
        })
    } else {
        Ok(Fetched::Many(records))
    }
}

/// Compare two entries on the sort keys in priority order.
///
/// Equal on every key means `Equal`; the stable sort then keeps document
/// order. A field no document carries compares equal everywhere.
fn compare_entries(a: &Entry, b: &Entry, keys: &[SortKey]) -> Ordering {
    keys.iter()
        .map(|key| {
            let ordering = compare_values(
                predicate::lookup(&a.fields, key.field()),
                predicate::lookup(&b.fields, key.field()),
            );
            match key.direction() {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn surround_window(entries: &[Entry], ordered: &[usize], surround: &Surround) -> Vec<usize> {
    let Some(at) = ordered
        .iter()
        .position(|&p| is_target(&entries[p].document, &surround.target))
    else {
        debug!(surround = %surround.target, "surround target not in result");
        return Vec::new();
    };
    let start = at.saturating_sub(surround.before);
    let end = at
        .saturating_add(1)
        .saturating_add(surround.after)
        .min(ordered.len());
    ordered[start..at]
        .iter()
        .chain(&ordered[at + 1..end])
        .copied()
        .collect()
}

/// URLs and paths start with `/`; anything else is a slug. Keys always match.
fn is_target(document: &Document, target: &str) -> bool {
    let by_location = if target.starts_with('/') {
        document.to == target || document.path == target
    } else {
        document.slug == target
    };
    by_location || document.key == target
}

fn project(
    fields: &Map<String, Value>,
    only: Option<&FieldList>,
    without: Option<&FieldList>,
) -> Record {
    let mut projected: Map<String, Value> = match only {
        Some(only) => fields
            .iter()
            .filter(|(name, _)| IDENTITY_FIELDS.contains(&name.as_str()) || only.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        None => fields.clone(),
    };
    if let Some(without) = without {
        for name in without.iter() {
            if !IDENTITY_FIELDS.contains(&name) {
                projected.remove(name);
            }
        }
    }
    Record::new(projected)
}

fn describe_target(query: &CompiledQuery) -> String {
    let to = query
        .params
        .filter
        .as_ref()
        .and_then(|f| f.get("to"))
        .and_then(Value::as_str);
    match (to, query.term.as_deref()) {
        (Some(to), _) => to.to_string(),
        (None, Some(term)) => term.to_string(),
        (None, None) => "query matched no documents".to_string(),
    }
}
