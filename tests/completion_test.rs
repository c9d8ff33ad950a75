//! Exactly-once completion of the asynchronous gateway operations, driven by
//! a scripted backend that succeeds, fails or dies deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docgate::backend::SearchBackend;
use docgate::gateway::{DocumentGateway, GatewayConfig, RenderMode};
use docgate::query::{Query, SearchRequest};
use docgate::types::{ClusterInfo, GetRequest, GetResponse, SearchHit, SearchResponse};
use docgate::{Error, Result};
use tokio::runtime::Handle;

#[derive(Debug, Clone, Copy)]
enum Script {
    Succeed,
    Fail,
    Panic,
}

struct ScriptedBackend {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn run<T>(&self, value: T) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Succeed => Ok(value),
            Script::Fail => Err(Error::backend(502, "connection reset")),
            Script::Panic => panic!("backend client died"),
        }
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn get(&self, request: GetRequest) -> Result<GetResponse> {
        tokio::task::yield_now().await;
        self.run(GetResponse {
            source: format!(r#"{{"id":"{}"}}"#, request.id),
            index: request.index,
            id: request.id,
        })
    }

    async fn submit_async_search(&self, request: SearchRequest) -> Result<SearchResponse> {
        tokio::task::yield_now().await;
        let Query::Match { query, .. } = request.query;
        self.run(SearchResponse {
            hits: vec![
                SearchHit {
                    index: request.index.clone(),
                    id: "1".to_string(),
                    source: format!(r#"{{"first_name":"{query}","n":1}}"#),
                },
                SearchHit {
                    index: request.index,
                    id: "2".to_string(),
                    source: format!(r#"{{"first_name":"{query}","n":2}}"#),
                },
            ],
            took_ms: Some(1),
        })
    }

    async fn info(&self) -> Result<ClusterInfo> {
        self.run(ClusterInfo {
            cluster_name: "scripted".to_string(),
            version: "0".to_string(),
        })
    }
}

fn gateway(backend: Arc<ScriptedBackend>) -> DocumentGateway {
    DocumentGateway::new(
        backend,
        GatewayConfig {
            index: "people".to_string(),
            render: RenderMode::List,
        },
        Handle::current(),
    )
}

#[tokio::test]
async fn success_completes_once_with_value() {
    let backend = ScriptedBackend::new(Script::Succeed);
    let gateway = gateway(backend.clone());

    let body = gateway.document_by_id_async("abc".to_string()).await.unwrap();
    assert_eq!(body, r#"{"id":"abc"}"#);

    let body = gateway
        .search_by_first_name_async("Ada".to_string())
        .await
        .unwrap();
    assert_eq!(
        body,
        r#"[{"first_name":"Ada","n":1}, {"first_name":"Ada","n":2}]"#
    );

    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn failure_completes_once_with_backend_error() {
    let backend = ScriptedBackend::new(Script::Fail);
    let gateway = gateway(backend.clone());

    let err = gateway
        .document_by_id_async("abc".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { status: 502, .. }));

    let err = gateway
        .search_by_first_name_async("Ada".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { status: 502, .. }));

    // no retries
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn dying_backend_still_completes() {
    let backend = ScriptedBackend::new(Script::Panic);
    let gateway = gateway(backend.clone());

    let err = gateway
        .document_by_id_async("abc".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Abandoned));

    let err = gateway
        .search_by_first_name_async("Ada".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Abandoned));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_complete_independently() {
    let backend = ScriptedBackend::new(Script::Succeed);
    let gateway = Arc::new(gateway(backend.clone()));

    let pending: Vec<_> = (0..64)
        .map(|i| gateway.document_by_id_async(i.to_string()))
        .collect();
    let results = futures::future::join_all(pending).await;

    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), format!(r#"{{"id":"{i}"}}"#));
    }
    assert_eq!(backend.calls(), 64);
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_fetch_propagates_failure() {
    let backend = ScriptedBackend::new(Script::Fail);
    let gateway = Arc::new(gateway(backend.clone()));

    let result = gateway.document_by_id("abc".to_string()).await;
    assert!(matches!(result, Err(Error::Backend { status: 502, .. })));
    assert_eq!(backend.calls(), 1);
}
