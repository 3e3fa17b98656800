//! The chainable query builder.
//!
//! A builder borrows one provider and accumulates [`QueryParams`]. Nothing
//! touches the store until `fetch`, which compiles a copy of the parameters
//! and hands it to the executor.

use super::executor::{self, CompiledQuery};
use super::params::{FieldList, QueryParams, SortDirection, SortKey, Surround};
use super::{Fetched, predicate};
use crate::error::ContentError;
use crate::store::{ContentProvider, DocumentStore};
use serde_json::{Map, Value};

/// Store-bound query accumulator.
///
/// Chain methods mutate the builder and hand it back. Methods that can
/// receive an invalid value return `Result` and fail right there, before
/// anything executes. `fetch` works on a copy of the accumulated parameters,
/// so a builder can be fetched repeatedly or refined further afterwards.
///
/// ```
/// use docus_content::{ContentProvider, Document, DocumentStore, SortDirection};
///
/// let store = DocumentStore::new();
/// store.set("/a", Document::new("/a"));
/// store.set("/a/b", Document { parent: Some("/a".into()), ..Document::new("/a/b") });
///
/// let fetched = store
///     .query()
///     .sort_by("to", SortDirection::Desc)?
///     .fetch()?;
/// assert_eq!(fetched.keys(), vec!["/a/b", "/a"]);
/// # Ok::<(), docus_content::ContentError>(())
/// ```
pub struct QueryBuilder<'a, P: ContentProvider + ?Sized = DocumentStore> {
    provider: &'a P,
    term: Option<String>,
    params: QueryParams,
    single: bool,
}

impl<'a, P: ContentProvider + ?Sized> QueryBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            term: None,
            params: QueryParams::default(),
            single: false,
        }
    }

    /// A builder carrying a term: a path scope for structural queries, the
    /// search text once [`text`](Self::text) is set.
    pub fn with_term(provider: &'a P, term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::new(provider)
        }
    }

    /// A single-result lookup of the document routed at `to`.
    pub(crate) fn targeting(provider: &'a P, to: &str) -> Self {
        let mut filter = Map::new();
        filter.insert("to".to_string(), Value::String(to.to_string()));
        Self {
            params: QueryParams {
                filter: Some(filter),
                ..QueryParams::default()
            },
            single: true,
            ..Self::new(provider)
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Keep only these fields (plus `key` and `path`).
    pub fn only(&mut self, keys: impl Into<FieldList>) -> &mut Self {
        let keys = keys.into();
        if let Some(without) = self.params.without.as_mut() {
            without.remove_all(&keys);
        }
        self.params.only.get_or_insert_with(FieldList::default).extend(keys);
        self
    }

    /// Drop these fields. Applied after `only`.
    pub fn without(&mut self, keys: impl Into<FieldList>) -> &mut Self {
        self.params
            .without
            .get_or_insert_with(FieldList::default)
            .extend(keys.into());
        self
    }

    /// Append a sort key; earlier keys take priority.
    pub fn sort_by(
        &mut self,
        field: &str,
        direction: SortDirection,
    ) -> Result<&mut Self, ContentError> {
        if field.trim().is_empty() {
            return Err(ContentError::invalid("sort field must not be empty"));
        }
        self.params.sort_by.push(SortKey::new(field, direction));
        Ok(self)
    }

    /// AND `predicate` into the `where` clause. Field keys already
    /// constrained are overwritten; `$and` / `$or` combine with earlier ones.
    pub fn filter(&mut self, predicate: Value) -> Result<&mut Self, ContentError> {
        let Value::Object(predicate) = predicate else {
            return Err(ContentError::invalid("where predicate must be an object"));
        };
        predicate::validate(&predicate)?;
        predicate::conjoin(self.params.filter.get_or_insert_with(Map::new), predicate);
        Ok(self)
    }

    /// Ask for the `before` entries preceding and `after` entries following
    /// `slug_or_path`. Replaces any earlier surround request.
    pub fn surround(
        &mut self,
        slug_or_path: &str,
        before: i64,
        after: i64,
    ) -> Result<&mut Self, ContentError> {
        if slug_or_path.trim().is_empty() {
            return Err(ContentError::invalid("surround target must not be empty"));
        }
        self.params.surround = Some(Surround {
            target: slug_or_path.to_string(),
            before: count("surround before", before)?,
            after: count("surround after", after)?,
        });
        Ok(self)
    }

    /// Cap the number of results; `0` means no cap.
    pub fn limit(&mut self, n: i64) -> Result<&mut Self, ContentError> {
        self.params.limit = Some(count("limit", n)?);
        Ok(self)
    }

    pub fn skip(&mut self, n: i64) -> Result<&mut Self, ContentError> {
        self.params.skip = Some(count("skip", n)?);
        Ok(self)
    }

    /// Rank through the search index using the builder's term.
    pub fn text(&mut self) -> &mut Self {
        self.params.text = Some(true);
        self
    }

    /// Let text search look into body content as well.
    pub fn deep(&mut self) -> &mut Self {
        self.params.deep = Some(true);
        self
    }

    /// Return the first match alone, failing with `NotFound` when none.
    pub fn first(&mut self) -> &mut Self {
        self.single = true;
        self
    }

    pub fn fetch(&self) -> Result<Fetched, ContentError> {
        self.fetch_with(QueryParams::default())
    }

    /// Fetch with one-off parameters layered over the accumulated ones.
    pub fn fetch_with(&self, overrides: QueryParams) -> Result<Fetched, ContentError> {
        overrides.validate()?;
        let compiled = CompiledQuery {
            term: self.term.clone(),
            params: self.params.merged(overrides),
            single: self.single,
        };
        let snapshot = self.provider.snapshot();
        executor::execute(&snapshot, self.provider.search_config(), &compiled)
    }
}

fn count(name: &str, n: i64) -> Result<usize, ContentError> {
    usize::try_from(n)
        .map_err(|_| ContentError::invalid(format!("{name} must not be negative, got {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;

    #[test]
    fn chain_methods_accumulate() {
        let store = sample_store();
        let mut query = store.query();
        query
            .only("title")
            .without(["body"])
            .sort_by("position", SortDirection::Asc)
            .unwrap()
            .sort_by("title", SortDirection::Desc)
            .unwrap();
        query.filter(json!({"draft": false})).unwrap();
        query.skip(1).unwrap().limit(2).unwrap();

        let params = query.params();
        assert!(params.only.as_ref().unwrap().contains("title"));
        assert!(params.without.as_ref().unwrap().contains("body"));
        assert_eq!(params.sort_by.len(), 2);
        assert_eq!(params.sort_by[0].field(), "position");
        assert_eq!(params.skip, Some(1));
        assert_eq!(params.limit, Some(2));
    }

    #[test]
    fn negative_skip_fails_at_call_site() {
        let store = sample_store();
        let mut query = store.query();
        let err = query.skip(-1).map(|_| ()).unwrap_err();
        assert!(matches!(err, ContentError::InvalidParameter(msg) if msg.contains("skip")));
        assert_eq!(query.params().skip, None);
    }

    #[test]
    fn negative_limit_fails_at_call_site() {
        let store = sample_store();
        assert!(store.query().limit(-5).is_err());
    }

    #[test]
    fn malformed_surround_fails_at_call_site() {
        let store = sample_store();
        assert!(store.query().surround("/guide", -1, 1).is_err());
        assert!(store.query().surround("", 1, 1).is_err());
    }

    #[test]
    fn surround_replaces_previous_request() {
        let store = sample_store();
        let mut query = store.query();
        query.surround("/guide", 1, 1).unwrap();
        query.surround("setup", 0, 2).unwrap();
        let surround = query.params().surround.clone().unwrap();
        assert_eq!(surround.target, "setup");
        assert_eq!((surround.before, surround.after), (0, 2));
    }

    #[test]
    fn filter_merges_and_overwrites() {
        let store = sample_store();
        let mut query = store.query();
        query.filter(json!({"draft": false, "page": true})).unwrap();
        query.filter(json!({"page": false})).unwrap();
        let filter = query.params().filter.clone().unwrap();
        assert_eq!(filter["draft"], json!(false));
        assert_eq!(filter["page"], json!(false));
    }

    #[test]
    fn stacked_or_filters_must_both_hold() {
        let store = store_with(vec![
            doc("/a").with_meta("x", 1).with_meta("y", 1),
            doc("/b").with_meta("x", 1).with_meta("y", 2),
            doc("/c").with_meta("x", 2).with_meta("y", 2),
        ]);
        let mut query = store.query();
        query.filter(json!({"$or": [{"x": 1}]})).unwrap();
        query.filter(json!({"$or": [{"y": 2}]})).unwrap();
        assert_eq!(query.fetch().unwrap().keys(), vec!["/b"]);

        let overridden = store
            .query()
            .filter(json!({"$and": [{"x": 1}]}))
            .unwrap()
            .fetch_with(QueryParams {
                filter: Some(json!({"$and": [{"y": 2}]}).as_object().unwrap().clone()),
                ..QueryParams::default()
            })
            .unwrap();
        assert_eq!(overridden.keys(), vec!["/b"]);
    }

    #[test]
    fn empty_sort_field_fails_at_call_site() {
        let store = sample_store();
        let mut query = store.query();
        assert!(matches!(
            query.sort_by(" ", SortDirection::Asc),
            Err(ContentError::InvalidParameter(_))
        ));
        assert!(query.params().sort_by.is_empty());
    }

    #[test]
    fn filter_rejects_non_object_and_bad_operator() {
        let store = sample_store();
        assert!(store.query().filter(json!(["to"])).is_err());
        assert!(store.query().filter(json!({"to": {"$like": "/a"}})).is_err());
    }

    #[test]
    fn later_only_reinstates_excluded_field() {
        let store = sample_store();
        let mut query = store.query();
        query.without("title").only("title");
        assert!(!query.params().without.as_ref().unwrap().contains("title"));

        let mut query = store.query();
        query.only("title").without("title");
        assert!(query.params().without.as_ref().unwrap().contains("title"));
    }

    #[test]
    fn builder_is_reusable_after_fetch() {
        let store = sample_store();
        let mut query = store.query();
        query.sort_by("to", SortDirection::Asc).unwrap();
        let first = query.fetch().unwrap();
        query.limit(1).unwrap();
        let second = query.fetch().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(first.keys()[0], second.keys()[0]);
    }

    #[test]
    fn fetch_with_override_does_not_stick() {
        let store = sample_store();
        let mut query = store.query();
        query.limit(2).unwrap();
        let overridden = query
            .fetch_with(QueryParams {
                limit: Some(1),
                ..QueryParams::default()
            })
            .unwrap();
        assert_eq!(overridden.len(), 1);
        assert_eq!(query.fetch().unwrap().len(), 2);
    }
}
