use docgate::backend::BackendConfig;
use docgate::config::{
    AppConfig, BackendKind, BackendSection, ElasticsearchSection, GatewaySection, MemorySection,
};
use docgate::gateway::RenderMode;

#[test]
fn defaults_target_local_elasticsearch() {
    let config = AppConfig::default();

    let gateway = config.gateway_runtime().expect("defaults should be valid");
    assert_eq!(gateway.index, "documents");
    assert_eq!(gateway.render, RenderMode::List);

    match config.backend_runtime().expect("defaults should be valid") {
        BackendConfig::Elasticsearch(es) => {
            assert_eq!(es.url, "http://localhost:9200");
            assert!(es.credentials.is_none());
        }
        other => panic!("Unexpected backend config: {other:?}"),
    }
}

#[test]
fn blank_index_is_rejected() {
    let config = AppConfig {
        gateway: GatewaySection {
            index: "  ".into(),
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(config.gateway_runtime().is_err());
}

#[test]
fn invalid_url_is_rejected() {
    let config = AppConfig {
        backend: BackendSection {
            elasticsearch: Some(ElasticsearchSection {
                url: "localhost 9200".into(),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(config.backend_runtime().is_err());
}

#[test]
fn username_requires_password() {
    let config = AppConfig {
        backend: BackendSection {
            elasticsearch: Some(ElasticsearchSection {
                username: Some("elastic".into()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(config.backend_runtime().is_err());
}

#[test]
fn credentials_are_passed_through() {
    let config = AppConfig {
        backend: BackendSection {
            elasticsearch: Some(ElasticsearchSection {
                url: " https://es.internal:9200 ".into(),
                username: Some("elastic".into()),
                password: Some("changeme".into()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    match config.backend_runtime().expect("configuration should be valid") {
        BackendConfig::Elasticsearch(es) => {
            assert_eq!(es.url, "https://es.internal:9200");
            let creds = es.credentials.expect("credentials");
            assert_eq!(creds.username, "elastic");
            assert_eq!(creds.password, "changeme");
            assert!(!format!("{creds:?}").contains("changeme"));
        }
        other => panic!("Unexpected backend config: {other:?}"),
    }
}

#[test]
fn timeout_must_exceed_completion_wait() {
    let config = AppConfig {
        backend: BackendSection {
            elasticsearch: Some(ElasticsearchSection {
                timeout_secs: 1,
                wait_for_completion_ms: 1_000,
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(config.backend_runtime().is_err());
}

#[test]
fn memory_backend_uses_gateway_index() {
    let config = AppConfig {
        gateway: GatewaySection {
            index: "people".into(),
            search_render: RenderMode::Json,
        },
        backend: BackendSection {
            kind: BackendKind::Memory,
            elasticsearch: None,
            memory: Some(MemorySection {
                seed_path: Some("seed.json".into()),
            }),
        },
        ..Default::default()
    };

    match config.backend_runtime().expect("configuration should be valid") {
        BackendConfig::Memory { index, seed_path } => {
            assert_eq!(index, "people");
            assert_eq!(seed_path.unwrap().to_str(), Some("seed.json"));
        }
        other => panic!("Unexpected backend config: {other:?}"),
    }
}
