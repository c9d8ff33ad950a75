use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::backend::{BackendConfig, Credentials, ElasticsearchConfig};
use crate::gateway::{GatewayConfig, RenderMode};

const DEFAULT_INDEX: &str = "documents";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WAIT_FOR_COMPLETION_MS: u64 = 1_000;

/// Top-level application configuration loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gateway: GatewaySection,
    pub backend: BackendSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    ///
    /// Environment variables use the `DOCGATE_` prefix and `__` between
    /// nested keys, e.g. `DOCGATE_BACKEND__ELASTICSEARCH__URL`.
    pub fn load() -> Result<Self> {
        let config_path = env::var("DOCGATE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let mut builder = config::Config::builder();

        if Path::new(&config_path).exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(&config_path)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DOCGATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let mut config: Self = settings.try_deserialize()?;

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        Ok(config)
    }

    /// Resolve the gateway settings
    pub fn gateway_runtime(&self) -> Result<GatewayConfig> {
        let index = self.gateway.index.trim();
        if index.is_empty() {
            bail!("gateway.index must be specified");
        }

        Ok(GatewayConfig {
            index: index.to_string(),
            render: self.gateway.search_render,
        })
    }

    /// Resolve the backend connection settings
    pub fn backend_runtime(&self) -> Result<BackendConfig> {
        match self.backend.kind {
            BackendKind::Elasticsearch => {
                let es = self.backend.elasticsearch.clone().unwrap_or_default();

                let url = es.url.trim();
                if url.is_empty() {
                    bail!("backend.elasticsearch.url must be specified");
                }
                reqwest::Url::parse(url)
                    .with_context(|| format!("backend.elasticsearch.url '{}' is invalid", url))?;

                let credentials = match (es.username, es.password) {
                    (Some(username), Some(password)) => Some(Credentials { username, password }),
                    (Some(_), None) => {
                        bail!("backend.elasticsearch.password is required when a username is set")
                    }
                    (None, Some(_)) => {
                        bail!("backend.elasticsearch.username is required when a password is set")
                    }
                    (None, None) => None,
                };

                // polls hold the connection open for up to wait_for_completion_ms
                if es.timeout_secs.saturating_mul(1000) <= es.wait_for_completion_ms {
                    bail!(
                        "backend.elasticsearch.timeout_secs ({}) must exceed wait_for_completion_ms ({})",
                        es.timeout_secs,
                        es.wait_for_completion_ms
                    );
                }

                Ok(BackendConfig::Elasticsearch(ElasticsearchConfig {
                    url: url.to_string(),
                    credentials,
                    timeout: Duration::from_secs(es.timeout_secs),
                    wait_for_completion: Duration::from_millis(es.wait_for_completion_ms),
                }))
            }
            BackendKind::Memory => {
                let memory = self.backend.memory.clone().unwrap_or_default();
                Ok(BackendConfig::Memory {
                    index: self.gateway_runtime()?.index,
                    seed_path: memory.seed_path.map(PathBuf::from),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub index: String,
    pub search_render: RenderMode,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            search_render: RenderMode::List,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub kind: BackendKind,
    pub elasticsearch: Option<ElasticsearchSection>,
    pub memory: Option<MemorySection>,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            kind: BackendKind::Elasticsearch,
            elasticsearch: Some(ElasticsearchSection::default()),
            memory: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Elasticsearch,
    Memory,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ElasticsearchSection {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    pub wait_for_completion_ms: u64,
}

impl Default for ElasticsearchSection {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            wait_for_completion_ms: DEFAULT_WAIT_FOR_COMPLETION_MS,
        }
    }
}

impl std::fmt::Debug for ElasticsearchSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchSection")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("wait_for_completion_ms", &self.wait_for_completion_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MemorySection {
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}
