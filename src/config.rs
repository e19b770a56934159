//! Server configuration.
//!
//! Loaded from a YAML file: listen address, optional documentation
//! directory, and seed endpoint definitions registered at startup.

use crate::registry::EndpointDefinition;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under the documentation prefix. Omit to disable
    /// the docs route.
    #[serde(default)]
    pub docs_dir: Option<PathBuf>,

    /// Endpoint definitions registered at startup. Ids are assigned by
    /// the registry; any id given here is ignored.
    #[serde(default)]
    pub endpoints: Vec<EndpointDefinition>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            docs_dir: None,
            endpoints: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8088
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            endpoint
                .validate()
                .map_err(|e| anyhow::anyhow!("Endpoint {}: {}", i, e))?;
        }
        Ok(())
    }

    /// The `host:port` string to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// A starting-point configuration for `--print-config`.
    pub fn sample() -> Self {
        Self {
            docs_dir: Some(PathBuf::from("./docs")),
            endpoints: vec![EndpointDefinition {
                id: 0,
                path: "/hello".to_string(),
                delay_min_ms: 0,
                delay_max_ms: 0,
                return_code: 200,
                return_body: "Hello, World!".to_string(),
                return_headers: [(
                    "Content-Type".to_string(),
                    vec!["text/plain".to_string()],
                )]
                .into_iter()
                .collect(),
            }],
            ..Self::default()
        }
    }
}
