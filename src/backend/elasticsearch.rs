//! Elasticsearch REST backend

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;
use tracing::{debug, error, instrument, trace, warn};

use crate::query::SearchRequest;
use crate::types::{ClusterInfo, GetRequest, GetResponse, SearchHit, SearchResponse, Source};
use crate::{Error, Result};

use super::{Credentials, ElasticsearchConfig, SearchBackend};

/// Client for an Elasticsearch-compatible cluster.
///
/// The inner [`Client`] pools connections and is shared by every request.
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    http_client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    wait_for_completion_ms: u128,
}

impl ElasticsearchBackend {
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| Error::internal(format!("invalid backend url '{}': {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::internal(format!(
                "backend url '{}' cannot be used as a base",
                config.url
            )));
        }

        let http_client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http_client,
            base_url,
            credentials: config.credentials,
            wait_for_completion_ms: config.wait_for_completion.as_millis(),
        })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.credentials {
            Some(creds) => builder.basic_auth(&creds.username, Some(&creds.password)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "Network error during backend request");
            Error::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read backend response body");
            Error::Transport(e)
        })?;

        debug!(status = %status, "Received backend response");
        trace!(body = %body, "Backend response body");
        Ok((status, body))
    }

    async fn poll_async_search(&self, id: &str) -> Result<AsyncSearchStatus> {
        let mut url = self.endpoint(&["_async_search", id]);
        url.query_pairs_mut().append_pair(
            "wait_for_completion_timeout",
            &format!("{}ms", self.wait_for_completion_ms),
        );

        let (status, body) = self.send(self.request(Method::GET, url)).await?;
        parse_async_search(status, &body)
    }

    async fn delete_async_search(&self, id: &str) {
        let url = self.endpoint(&["_async_search", id]);
        match self.send(self.request(Method::DELETE, url)).await {
            Ok((status, _)) if status.is_success() || status == StatusCode::NOT_FOUND => {}
            Ok((status, body)) => {
                warn!(%id, status = %status, body = %body, "Failed to delete stored async search")
            }
            Err(e) => warn!(%id, error = %e, "Failed to delete stored async search"),
        }
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    #[instrument(skip(self), fields(index = %request.index, id = %request.id))]
    async fn get(&self, request: GetRequest) -> Result<GetResponse> {
        let url = self.endpoint(&[request.index.as_str(), "_doc", request.id.as_str()]);
        let (status, body) = self.send(self.request(Method::GET, url)).await?;
        parse_get(status, &body, &request)
    }

    #[instrument(skip(self), fields(index = %request.index))]
    async fn submit_async_search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let mut url = self.endpoint(&[request.index.as_str(), "_async_search"]);
        url.query_pairs_mut()
            .append_pair(
                "wait_for_completion_timeout",
                &format!("{}ms", self.wait_for_completion_ms),
            )
            .append_pair("keep_on_completion", "false");

        let (status, body) = self
            .send(self.request(Method::POST, url).json(&request.body()))
            .await?;
        let mut state = parse_async_search(status, &body)?;
        let mut stored_id: Option<String> = None;

        loop {
            match state {
                AsyncSearchStatus::Running { id } => {
                    debug!(%id, "Async search still running; polling");
                    state = match self.poll_async_search(&id).await {
                        Ok(next) => next,
                        Err(e) => {
                            self.delete_async_search(&id).await;
                            return Err(e);
                        }
                    };
                    stored_id = Some(id);
                }
                AsyncSearchStatus::Complete { id, response } => {
                    if let Some(id) = id.or(stored_id) {
                        self.delete_async_search(&id).await;
                    }
                    debug!(hits = response.hits.len(), "Async search completed");
                    return Ok(response);
                }
            }
        }
    }

    async fn info(&self) -> Result<ClusterInfo> {
        let url = self.endpoint(&[]);
        let (status, body) = self.send(self.request(Method::GET, url)).await?;
        if !status.is_success() {
            return Err(Error::backend(status.as_u16(), error_message(&body)));
        }

        let wire: WireInfo = serde_json::from_str(&body)
            .map_err(|e| Error::invalid_response(format!("cluster info: {e}")))?;
        Ok(ClusterInfo {
            cluster_name: wire.cluster_name,
            version: wire.version.number,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireGet {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Box<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct WireAsyncSearch {
    id: Option<String>,
    #[serde(default)]
    is_running: bool,
    #[serde(default)]
    is_partial: bool,
    completion_status: Option<u16>,
    response: Option<WireSearch>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireSearch {
    took: Option<u64>,
    hits: WireHits,
}

#[derive(Debug, Deserialize)]
struct WireHits {
    #[serde(default)]
    hits: Vec<WireHit>,
}

#[derive(Debug, Deserialize)]
struct WireHit {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Option<Box<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct WireInfo {
    cluster_name: String,
    version: WireVersion,
}

#[derive(Debug, Deserialize)]
struct WireVersion {
    number: String,
}

#[derive(Debug)]
enum AsyncSearchStatus {
    Running {
        id: String,
    },
    Complete {
        id: Option<String>,
        response: SearchResponse,
    },
}

/// Hits without a stored source render as `null`
fn raw_source(source: Option<Box<RawValue>>) -> Source {
    source
        .map(|raw| raw.get().to_string())
        .unwrap_or_else(|| "null".to_string())
}

fn parse_get(status: StatusCode, body: &str, request: &GetRequest) -> Result<GetResponse> {
    if !status.is_success() && status != StatusCode::NOT_FOUND {
        return Err(Error::backend(status.as_u16(), error_message(body)));
    }

    let wire: WireGet = match serde_json::from_str(body) {
        Ok(wire) => wire,
        // index_not_found_exception and friends
        Err(_) if status == StatusCode::NOT_FOUND => {
            return Err(Error::backend(status.as_u16(), error_message(body)))
        }
        Err(e) => return Err(Error::invalid_response(format!("get response: {e}"))),
    };

    // a document stored with _source disabled has nothing to return
    let (true, Some(source)) = (wire.found, wire.source) else {
        return Err(Error::not_found(&request.index, &request.id));
    };

    Ok(GetResponse {
        index: wire.index,
        id: wire.id,
        source: source.get().to_string(),
    })
}

fn parse_async_search(status: StatusCode, body: &str) -> Result<AsyncSearchStatus> {
    if !status.is_success() {
        return Err(Error::backend(status.as_u16(), error_message(body)));
    }

    let wire: WireAsyncSearch = serde_json::from_str(body)
        .map_err(|e| Error::invalid_response(format!("async search response: {e}")))?;

    if let Some(err) = wire.error {
        return Err(Error::backend(
            wire.completion_status.unwrap_or(500),
            reason_of(&err).unwrap_or_else(|| err.to_string()),
        ));
    }

    if wire.is_running {
        return match wire.id {
            Some(id) => Ok(AsyncSearchStatus::Running { id }),
            None => Err(Error::invalid_response(
                "async search is running but has no id",
            )),
        };
    }

    let search = wire
        .response
        .ok_or_else(|| Error::invalid_response("async search finished without a response"))?;

    if wire.is_partial {
        warn!("Async search returned partial results");
    }

    let hits = search
        .hits
        .hits
        .into_iter()
        .map(|hit| SearchHit {
            index: hit.index,
            id: hit.id,
            source: raw_source(hit.source),
        })
        .collect();

    Ok(AsyncSearchStatus::Complete {
        id: wire.id,
        response: SearchResponse {
            hits,
            took_ms: search.took,
        },
    })
}

fn reason_of(error: &Value) -> Option<String> {
    let error = error.get("error").unwrap_or(error);
    match error {
        Value::String(s) => Some(s.clone()),
        other => other
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Best readable message from an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| reason_of(&value))
        .unwrap_or_else(|| body.to_string())
}
