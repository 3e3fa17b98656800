//! Query parameters accumulated by the builder.
//!
//! The same type doubles as the one-off override accepted by
//! [`QueryBuilder::fetch_with`](super::QueryBuilder::fetch_with), so every
//! field is optional and [`QueryParams::merged`] applies overrides field by
//! field. The wire shape follows the content API: `sortBy` is a list of
//! `[field, direction]` pairs and the filter lives under `where`.

use super::predicate;
use crate::error::ContentError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ContentError::invalid(format!(
                "sort direction must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// One `(field, direction)` sort key, serialized as `["field", "asc"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey(pub String, pub SortDirection);

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self(field.into(), direction)
    }

    pub fn field(&self) -> &str {
        &self.0
    }

    pub fn direction(&self) -> SortDirection {
        self.1
    }
}

/// Neighbor lookup around one document of the ordered result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surround {
    /// Slug, or a path/URL when it starts with `/`.
    pub target: String,
    #[serde(default)]
    pub before: usize,
    #[serde(default)]
    pub after: usize,
}

/// A set of field names, insertion-ordered.
///
/// Accepts a single name or a sequence, on the wire and from Rust.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFieldList", into = "Vec<String>")]
pub struct FieldList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldList {
    One(String),
    Many(Vec<String>),
}

impl From<RawFieldList> for FieldList {
    fn from(raw: RawFieldList) -> Self {
        match raw {
            RawFieldList::One(name) => Self::from(name),
            RawFieldList::Many(names) => Self::from(names),
        }
    }
}

impl From<FieldList> for Vec<String> {
    fn from(list: FieldList) -> Self {
        list.0
    }
}

impl FieldList {
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn extend(&mut self, other: FieldList) {
        for field in other.0 {
            if !self.contains(&field) {
                self.0.push(field);
            }
        }
    }

    pub(crate) fn remove_all(&mut self, other: &FieldList) {
        self.0.retain(|f| !other.contains(f));
    }
}

impl<S: Into<String>> FromIterator<S> for FieldList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = FieldList::default();
        for field in iter {
            let field = field.into();
            if !list.contains(&field) {
                list.0.push(field);
            }
        }
        list
    }
}

impl From<&str> for FieldList {
    fn from(field: &str) -> Self {
        std::iter::once(field).collect()
    }
}

impl From<String> for FieldList {
    fn from(field: String) -> Self {
        std::iter::once(field).collect()
    }
}

impl From<Vec<String>> for FieldList {
    fn from(fields: Vec<String>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<Vec<&str>> for FieldList {
    fn from(fields: Vec<&str>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<&[&str]> for FieldList {
    fn from(fields: &[&str]) -> Self {
        fields.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for FieldList {
    fn from(fields: [&str; N]) -> Self {
        fields.into_iter().collect()
    }
}

/// Everything a query can say. `None` / empty means "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only: Option<FieldList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub without: Option<FieldList>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort_by: Vec<SortKey>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    /// `Some(0)` behaves like `None`: no cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surround: Option<Surround>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep: Option<bool>,
}

impl QueryParams {
    pub fn is_text(&self) -> bool {
        self.text.unwrap_or(false)
    }

    pub fn is_deep(&self) -> bool {
        self.deep.unwrap_or(false)
    }

    /// Reject values that would make the query meaningless.
    pub fn validate(&self) -> Result<(), ContentError> {
        if let Some(filter) = &self.filter {
            predicate::validate(filter)?;
        }
        if let Some(surround) = &self.surround
            && surround.target.trim().is_empty()
        {
            return Err(ContentError::invalid("surround target must not be empty"));
        }
        if self.sort_by.iter().any(|key| key.field().trim().is_empty()) {
            return Err(ContentError::invalid("sort field must not be empty"));
        }
        Ok(())
    }

    /// Copy of `self` with every field set in `overrides` taking precedence.
    ///
    /// `where` merges key by key (combinators are ANDed together); all other
    /// fields are replaced wholesale.
    pub fn merged(&self, overrides: QueryParams) -> QueryParams {
        let mut out = self.clone();
        if overrides.only.is_some() {
            out.only = overrides.only;
        }
        if overrides.without.is_some() {
            out.without = overrides.without;
        }
        if !overrides.sort_by.is_empty() {
            out.sort_by = overrides.sort_by;
        }
        if let Some(filter) = overrides.filter {
            predicate::conjoin(out.filter.get_or_insert_with(Map::new), filter);
        }
        if overrides.skip.is_some() {
            out.skip = overrides.skip;
        }
        if overrides.limit.is_some() {
            out.limit = overrides.limit;
        }
        if overrides.surround.is_some() {
            out.surround = overrides.surround;
        }
        if overrides.text.is_some() {
            out.text = overrides.text;
        }
        if overrides.deep.is_some() {
            out.deep = overrides.deep;
        }
        out
    }
}
