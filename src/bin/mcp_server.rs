//! MCP Server Binary
//!
//! Runs the Hex MCP server, communicating over stdio with MCP clients.
//!
//! # Usage
//!
//! ```bash
//! # Run directly
//! HEX_API_TOKEN=... ./mcp_server
//!
//! # Against a different deployment
//! HEX_API_TOKEN=... ./mcp_server --api-url https://hex.internal/api/v1 --app-url https://hex.internal
//!
//! # With debug logging (RUST_LOG replaces the default `hex_mcp_server=info`)
//! RUST_LOG=hex_mcp_server=debug ./mcp_server
//! ```
//!
//! # MCP client integration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "hex": {
//!       "command": "/path/to/mcp_server",
//!       "env": {
//!         "HEX_API_TOKEN": "your-token"
//!       }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use clap::Parser;
use hex_mcp_server::{Config, McpServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "hex_mcp_server=info";

/// RUST_LOG when set and valid, otherwise info for this crate only
fn log_filter(rust_log: Option<String>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// MCP Server for the Hex API
#[derive(Parser, Debug)]
#[command(name = "mcp_server")]
#[command(about = "MCP server exposing Hex projects, runs and embeds as tools")]
#[command(version)]
struct Args {
    /// YAML config file (defaults to ./hex-mcp.yaml when present)
    #[arg(long, env = "HEX_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Hex REST API root, overrides config and HEX_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Hex web app root used for view URLs, overrides config and HEX_APP_URL
    #[arg(long)]
    app_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging (to stderr to keep stdout clean for MCP)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(std::env::var("RUST_LOG").ok()))
        .init();

    let args = Args::parse();

    let mut config = Config::from_yaml_and_env(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    if let Some(app_url) = args.app_url {
        config.app_url = app_url;
    }

    let client = match config.build_client() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create Hex client: {}", e);
            return Err(e);
        }
    };

    info!("Starting Hex MCP server");
    info!("Hex API: {}", client.base_url());

    let mut server = McpServer::new(Arc::new(client), &config.app_url);

    if let Err(e) = server.run().await {
        error!("MCP server error: {}", e);
        return Err(e);
    }

    Ok(())
}
