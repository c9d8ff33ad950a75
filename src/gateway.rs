//! Document gateway
//!
//! Maps the three read operations onto the search backend. The blocking fetch
//! drives the backend call on the calling thread; the asynchronous variants
//! spawn the backend call onto the runtime and hand back a [`Pending`] that
//! the spawned task settles exactly once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::debug;

use crate::backend::SearchBackend;
use crate::completion::{self, Pending};
use crate::query::{Query, SearchRequest, FIRST_NAME_FIELD};
use crate::types::{ClusterInfo, GetRequest, SearchResponse};
use crate::{Error, Result};

/// How a list of search hits is turned into a response body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// `[a, b]`: sources joined by `", "` inside brackets
    #[default]
    List,
    /// `[a,b]`: a JSON array of the raw sources
    Json,
}

impl RenderMode {
    pub fn render(&self, sources: &[&str]) -> String {
        let separator = match self {
            RenderMode::List => ", ",
            RenderMode::Json => ",",
        };
        format!("[{}]", sources.join(separator))
    }
}

/// Gateway settings fixed at construction
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub index: String,
    pub render: RenderMode,
}

/// Status reported by the health route
#[derive(Debug, Clone, Serialize)]
pub struct GatewayHealth {
    pub index: String,
    pub cluster_name: String,
    pub backend_version: String,
}

pub struct DocumentGateway {
    backend: Arc<dyn SearchBackend>,
    config: GatewayConfig,
    runtime: Handle,
}

impl DocumentGateway {
    /// `runtime` is where asynchronous backend calls run, and what the
    /// blocking fetch drives its call on
    pub fn new(backend: Arc<dyn SearchBackend>, config: GatewayConfig, runtime: Handle) -> Self {
        Self {
            backend,
            config,
            runtime,
        }
    }

    /// Fetch a document on the blocking pool, holding one of its threads for
    /// the whole backend round trip
    pub async fn document_by_id(self: Arc<Self>, id: String) -> Result<String> {
        tokio::task::spawn_blocking(move || self.document_by_id_blocking(&id))
            .await
            .map_err(|e| Error::internal(format!("blocking fetch failed: {e}")))?
    }

    /// Drives the backend call on the current thread; panics inside a runtime
    fn document_by_id_blocking(&self, id: &str) -> Result<String> {
        let request = GetRequest::new(&self.config.index, id);
        let response = self.runtime.block_on(self.backend.get(request))?;
        debug!(document_id = %id, source = %response.source, "Fetched document");
        Ok(response.source)
    }

    /// Fetch a document without blocking
    pub fn document_by_id_async(&self, id: String) -> Pending<String> {
        let (completer, pending) = completion::pending();
        let backend = self.backend.clone();
        let request = GetRequest::new(&self.config.index, id);

        self.runtime.spawn(async move {
            let id = request.id.clone();
            let result = backend.get(request).await.map(|response| {
                debug!(document_id = %id, source = %response.source, "Fetched document asynchronously");
                response.source
            });
            completer.settle(result);
        });

        pending
    }

    /// Search documents whose `first_name` matches `search`, without blocking.
    ///
    /// Completes with every matching source, in backend hit order, rendered
    /// with the configured [`RenderMode`].
    pub fn search_by_first_name_async(&self, search: String) -> Pending<String> {
        let (completer, pending) = completion::pending();
        let backend = self.backend.clone();
        let render = self.config.render;
        let request = SearchRequest::new(
            &self.config.index,
            Query::matches(FIRST_NAME_FIELD, search.as_str()),
        );

        self.runtime.spawn(async move {
            let result = backend
                .submit_async_search(request)
                .await
                .map(|response: SearchResponse| {
                    let body = render.render(&response.sources());
                    debug!(
                        search = %search,
                        hits = response.hits.len(),
                        took_ms = ?response.took_ms,
                        body = %body,
                        "Searched documents by first name"
                    );
                    body
                });
            completer.settle(result);
        });

        pending
    }

    /// Probe the backend
    pub async fn health(&self) -> Result<GatewayHealth> {
        let ClusterInfo {
            cluster_name,
            version,
        } = self.backend.info().await?;

        Ok(GatewayHealth {
            index: self.config.index.clone(),
            cluster_name,
            backend_version: version,
        })
    }
}
