//! Search requests and their query DSL encoding

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Field the gateway's name search runs against
pub const FIRST_NAME_FIELD: &str = "first_name";

/// Query clause understood by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Analyzed full-text match of `query` against `field`
    Match { field: String, query: String },
}

impl Query {
    pub fn matches(field: impl Into<String>, query: impl Into<String>) -> Self {
        Query::Match {
            field: field.into(),
            query: query.into(),
        }
    }
}

/// Encodes as `{"match": {"<field>": {"query": "<text>"}}}`
impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Query::Match { field, query } => {
                let clause = BTreeMap::from([(field.as_str(), MatchBody { query })]);
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("match", &clause)?;
                map.end()
            }
        }
    }
}

#[derive(Serialize)]
struct MatchBody<'a> {
    query: &'a str,
}

/// Search submitted against a single index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub index: String,
    pub query: Query,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, query: Query) -> Self {
        Self {
            index: index.into(),
            query,
        }
    }

    /// Request body sent to the backend
    pub fn body(&self) -> SearchBody<'_> {
        SearchBody { query: &self.query }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchBody<'a> {
    pub query: &'a Query,
}
