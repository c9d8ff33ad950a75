//! In-process search backend
//!
//! Keeps raw document sources per index in insertion order, which is also the
//! order search hits are returned in. Match queries use a simplified standard
//! analyzer: lowercase, split on anything that is not alphanumeric, and match
//! when any query token equals any field token.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::query::{Query, SearchRequest};
use crate::types::{ClusterInfo, GetRequest, GetResponse, SearchHit, SearchResponse, Source};
use crate::{Error, Result};

use super::SearchBackend;

const CLUSTER_NAME: &str = "memory";

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    source: Source,
}

/// Seed file entry: `{"_id": "...", "_source": {...}}`
#[derive(Debug, Deserialize)]
struct SeedDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Box<RawValue>,
}

/// Memory-backed search backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    indices: RwLock<HashMap<String, Vec<StoredDocument>>>,
    offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document, replacing any previous document with the same id.
    /// The source must be valid JSON and is kept verbatim.
    pub async fn put(&self, index: &str, id: &str, source: &str) -> Result<()> {
        let _: &RawValue = serde_json::from_str(source)?;

        let mut indices = self.indices.write().await;
        let documents = indices.entry(index.to_string()).or_default();
        match documents.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => existing.source = source.to_string(),
            None => documents.push(StoredDocument {
                id: id.to_string(),
                source: source.to_string(),
            }),
        }
        Ok(())
    }

    /// Load a JSON array of `{"_id", "_source"}` entries into `index`
    pub async fn seed_from_file(&self, index: &str, path: &Path) -> Result<usize> {
        let data = tokio::fs::read(path).await?;
        let entries: Vec<SeedDocument> = serde_json::from_slice(&data)?;
        let count = entries.len();
        for entry in entries {
            self.put(index, &entry.id, entry.source.get()).await?;
        }
        Ok(count)
    }

    /// Simulate an outage: while offline every call fails
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::backend(503, "memory backend is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn get(&self, request: GetRequest) -> Result<GetResponse> {
        self.check_online()?;

        let indices = self.indices.read().await;
        indices
            .get(&request.index)
            .and_then(|documents| documents.iter().find(|doc| doc.id == request.id))
            .map(|doc| GetResponse {
                index: request.index.clone(),
                id: doc.id.clone(),
                source: doc.source.clone(),
            })
            .ok_or_else(|| Error::not_found(&request.index, &request.id))
    }

    async fn submit_async_search(&self, request: SearchRequest) -> Result<SearchResponse> {
        self.check_online()?;
        let start = Instant::now();

        let indices = self.indices.read().await;
        let Some(documents) = indices.get(&request.index) else {
            return Err(Error::backend(
                404,
                format!("no such index [{}]", request.index),
            ));
        };

        let mut hits = Vec::new();
        for doc in documents {
            if query_matches(&request.query, &doc.source)? {
                hits.push(SearchHit {
                    index: request.index.clone(),
                    id: doc.id.clone(),
                    source: doc.source.clone(),
                });
            }
        }

        let took_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(SearchResponse {
            hits,
            took_ms: Some(took_ms),
        })
    }

    async fn info(&self) -> Result<ClusterInfo> {
        self.check_online()?;
        Ok(ClusterInfo {
            cluster_name: CLUSTER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

fn query_matches(query: &Query, source: &str) -> Result<bool> {
    match query {
        Query::Match { field, query } => {
            let wanted = tokenize(query);
            if wanted.is_empty() {
                return Ok(false);
            }

            let document: Value = serde_json::from_str(source)?;
            let Some(value) = document.get(field) else {
                return Ok(false);
            };

            let mut field_tokens = Vec::new();
            collect_tokens(value, &mut field_tokens);
            Ok(wanted.iter().any(|token| field_tokens.contains(token)))
        }
    }
}

fn collect_tokens(value: &Value, tokens: &mut Vec<String>) {
    match value {
        Value::String(text) => tokens.extend(tokenize(text)),
        Value::Number(n) => tokens.push(n.to_string()),
        Value::Bool(b) => tokens.push(b.to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_tokens(item, tokens)),
        Value::Null | Value::Object(_) => {}
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}
