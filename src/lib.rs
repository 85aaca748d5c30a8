//! Hex MCP Server
//!
//! Exposes the Hex analytics REST API as Model Context Protocol tools:
//! - Hex API client with error normalization and rate-limit tracking
//! - Tool registry with declarative input schemas
//! - Validating dispatcher mapping tool calls onto API calls
//! - JSON-RPC 2.0 server over stdio

pub mod hex;
pub mod mcp;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub use hex::{HexApi, HexClient};
pub use mcp::McpServer;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "hex-mcp.yaml";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure.
///
/// The API token is deliberately not part of the file; it only comes from
/// the `HEX_API_TOKEN` environment variable.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub api: ApiYamlConfig,
}

/// API endpoints section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiYamlConfig {
    pub base_url: String,
    pub app_url: String,
}

impl Default for ApiYamlConfig {
    fn default() -> Self {
        Self {
            base_url: hex::DEFAULT_BASE_URL.into(),
            app_url: mcp::handlers::DEFAULT_APP_URL.into(),
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub api_token: Option<String>,
    /// REST API root, e.g. `https://app.hex.tech/api/v1`
    pub api_url: String,
    /// Web app root used for view URLs, e.g. `https://app.hex.tech`
    pub app_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("app_url", &self.app_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries [`DEFAULT_CONFIG_FILE`] in CWD. A missing
    /// or unparsable file falls back to defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            api_token: std::env::var("HEX_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            api_url: std::env::var("HEX_API_URL").unwrap_or(yaml.api.base_url),
            app_url: std::env::var("HEX_APP_URL").unwrap_or(yaml.api.app_url),
        })
    }

    /// The API token, or an error if none was configured
    pub fn require_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| anyhow!("HEX_API_TOKEN environment variable is required"))
    }

    /// Build the API client described by this config
    pub fn build_client(&self) -> Result<HexClient> {
        HexClient::new(self.require_token()?, Some(&self.api_url))
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
