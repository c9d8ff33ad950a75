//! Search backend abstraction
//!
//! The gateway only needs a point lookup, an asynchronous field search and a
//! cluster identity probe. Implementations must be safe to share across
//! concurrent requests; the gateway adds no locking of its own.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::query::SearchRequest;
use crate::types::{ClusterInfo, GetRequest, GetResponse, SearchResponse};
use crate::Result;

pub mod elasticsearch;
pub mod memory;

/// Search backend trait
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fetch a single document. A missing document is [`crate::Error::NotFound`].
    async fn get(&self, request: GetRequest) -> Result<GetResponse>;

    /// Submit an asynchronous search and wait until it has finished
    async fn submit_async_search(&self, request: SearchRequest) -> Result<SearchResponse>;

    /// Describe the backend cluster
    async fn info(&self) -> Result<ClusterInfo>;
}

/// Backend configuration
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Elasticsearch(ElasticsearchConfig),
    Memory {
        index: String,
        seed_path: Option<PathBuf>,
    },
}

/// Connection settings for an Elasticsearch-compatible cluster
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
    pub wait_for_completion: Duration,
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Create search backend from config
pub async fn create_backend(config: BackendConfig) -> Result<Arc<dyn SearchBackend>> {
    match config {
        BackendConfig::Elasticsearch(es) => {
            let backend = elasticsearch::ElasticsearchBackend::new(es)?;
            Ok(Arc::new(backend))
        }
        BackendConfig::Memory { index, seed_path } => {
            let backend = memory::MemoryBackend::new();
            if let Some(path) = seed_path {
                let loaded = backend.seed_from_file(&index, &path).await?;
                tracing::info!(%index, path = %path.display(), documents = loaded, "Seeded memory backend");
            }
            Ok(Arc::new(backend))
        }
    }
}
