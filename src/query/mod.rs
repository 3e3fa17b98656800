//! Chainable queries over a content store.
//!
//! A [`QueryBuilder`] accumulates [`QueryParams`]; `fetch` copies them and
//! hands them to the executor, which evaluates in a fixed order:
//!
//! ```text
//! scope → where → text search | sort → surround → skip/limit → only/without
//! ```
//!
//! Results are [`Record`]s: shallow, field-filtered copies of the stored
//! documents. `key` and `path` survive every projection.

mod builder;
mod executor;
pub mod params;
pub mod predicate;

pub use builder::QueryBuilder;
pub use params::{FieldList, QueryParams, SortDirection, SortKey, Surround};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One query result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub(crate) fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn key(&self) -> &str {
        self.str_field("key").unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.str_field("path").unwrap_or_default()
    }

    /// The document URL, when it survived projection.
    pub fn to(&self) -> Option<&str> {
        self.str_field("to")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        predicate::lookup(&self.0, field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// What `fetch` produced: one document for single-target queries, a
/// sequence otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    One(Record),
    Many(Vec<Record>),
}

impl Fetched {
    pub fn records(&self) -> &[Record] {
        match self {
            Fetched::One(record) => std::slice::from_ref(record),
            Fetched::Many(records) => records,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Fetched::One(record) => vec![record],
            Fetched::Many(records) => records,
        }
    }

    pub fn into_one(self) -> Option<Record> {
        self.into_records().into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.records().iter().map(Record::key).collect()
    }
}
