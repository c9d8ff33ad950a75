//! Core types exchanged with the search backend

use serde::{Deserialize, Serialize};

/// Raw JSON text of a stored document, exactly as the backend returned it
pub type Source = String;

/// Point lookup of a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub index: String,
    pub id: String,
}

impl GetRequest {
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
        }
    }
}

/// A document that was found by a point lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResponse {
    pub index: String,
    pub id: String,
    pub source: Source,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub index: String,
    pub id: String,
    pub source: Source,
}

/// Result of a completed search; hits are kept in backend order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub took_ms: Option<u64>,
}

impl SearchResponse {
    /// Sources of every hit, in hit order
    pub fn sources(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.source.as_str()).collect()
    }
}

/// Identity of the backend cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: String,
}
