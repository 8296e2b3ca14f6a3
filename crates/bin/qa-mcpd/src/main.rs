//! Daemon entry point for the answer-formatting MCP server.
//!
//! Serves over stdio when started with `--stdio` (the mode `qa-batch` spawns),
//! otherwise over streamable HTTP. Logs always go to stderr.

mod config;

use qa_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing_subscriber::EnvFilter;

use crate::config::Transport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Transport::from_args() {
        Transport::Stdio => serve_stdio().await,
        Transport::Http(addr) => serve_streamable_http(McpHttpServerConfig::new(addr)).await,
    }
}
