//! MCP client side of the formatting tool.
//!
//! [`McpFormatter`] keeps one MCP session open for the whole batch and calls
//! the `format_answer` tool once per answer.

use std::time::Duration;

use async_trait::async_trait;
use qa_core::format::FORMAT_TOOL_NAME;
use qa_core::{AnswerFormatter, ToolEndpoint, ToolError};
use rmcp::model::{CallToolRequestParams, CallToolResult};
use rmcp::service::{Peer, RunningService};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use rmcp::{RoleClient, serve_client};
use tokio::io::DuplexStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::FormatAnswerParams;

/// Answer formatter backed by a remote `format_answer` MCP tool.
pub struct McpFormatter {
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

impl McpFormatter {
    /// Opens a session to the configured endpoint and checks that it offers
    /// `format_answer`. Gives up after `timeout`.
    ///
    /// # Errors
    /// Returns `ToolError::Unavailable` if the server cannot be started or
    /// reached, or does not list the tool.
    pub async fn connect(endpoint: &ToolEndpoint, timeout: Duration) -> Result<Self, ToolError> {
        let connecting = async {
            match endpoint {
                ToolEndpoint::Command { program, args } => Self::spawn(program, args).await,
                ToolEndpoint::Url(url) => Self::connect_http(url).await,
            }
        };
        let formatter = tokio::time::timeout(timeout, connecting)
            .await
            .map_err(|_| ToolError::TimedOut(timeout))??;
        formatter.ensure_tool().await?;
        Ok(formatter)
    }

    /// Starts the tool server as a child process and talks MCP over its stdio.
    ///
    /// # Errors
    /// Returns `ToolError::Unavailable` if the process cannot be spawned or
    /// the MCP handshake fails.
    pub async fn spawn(program: &str, args: &[String]) -> Result<Self, ToolError> {
        let mut command = tokio::process::Command::new(program);
        command.args(args);
        let transport = TokioChildProcess::new(command)
            .map_err(|err| unavailable(format!("failed to start {program}: {err}")))?;
        let running = serve_client((), transport)
            .await
            .map_err(|err| unavailable(format!("MCP handshake with {program} failed: {err}")))?;
        info!(program, "connected to formatting tool over stdio");
        Ok(Self::from_service(running))
    }

    /// Connects to a streamable HTTP MCP endpoint.
    ///
    /// # Errors
    /// Returns `ToolError::Unavailable` if the MCP handshake fails.
    pub async fn connect_http(url: &str) -> Result<Self, ToolError> {
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        let running = serve_client((), transport)
            .await
            .map_err(|err| unavailable(format!("MCP handshake with {url} failed: {err}")))?;
        info!(url, "connected to formatting tool over HTTP");
        Ok(Self::from_service(running))
    }

    /// Connects over an in-process byte stream, typically one end of
    /// `tokio::io::duplex` whose other end is served by [`crate::FormatterMcp`].
    ///
    /// # Errors
    /// Returns `ToolError::Unavailable` if the MCP handshake fails.
    pub async fn connect_stream(stream: DuplexStream) -> Result<Self, ToolError> {
        let running = serve_client((), tokio::io::split(stream))
            .await
            .map_err(|err| unavailable(format!("MCP handshake failed: {err}")))?;
        Ok(Self::from_service(running))
    }

    fn from_service(running: RunningService<RoleClient, ()>) -> Self {
        Self {
            peer: running.peer().clone(),
            service: Mutex::new(Some(running)),
        }
    }

    /// Names of the tools the server offers.
    ///
    /// # Errors
    /// Returns `ToolError::Unavailable` if the listing request fails.
    pub async fn tool_names(&self) -> Result<Vec<String>, ToolError> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        Ok(tools.into_iter().map(|tool| tool.name.to_string()).collect())
    }

    async fn ensure_tool(&self) -> Result<(), ToolError> {
        let names = self.tool_names().await?;
        if names.iter().any(|name| name == FORMAT_TOOL_NAME) {
            Ok(())
        } else {
            Err(unavailable(format!(
                "server does not offer {FORMAT_TOOL_NAME} (tools: {})",
                names.join(", ")
            )))
        }
    }

    /// Closes the MCP session. Later `format` calls report unavailability.
    pub async fn shutdown(&self) {
        let Some(running) = self.service.lock().await.take() else {
            return;
        };
        if let Err(err) = running.cancel().await {
            warn!(error = %err, "formatting tool session did not shut down cleanly");
        }
    }
}

#[async_trait]
impl AnswerFormatter for McpFormatter {
    async fn format(&self, text: &str) -> Result<String, ToolError> {
        let arguments = serde_json::to_value(FormatAnswerParams {
            text: text.to_string(),
        })
        .map_err(|err| ToolError::Failed(format!("invalid tool arguments: {err}")))?;
        let request = CallToolRequestParams {
            meta: None,
            name: FORMAT_TOOL_NAME.into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        debug!(text_len = text.len(), "calling {FORMAT_TOOL_NAME}");
        let result = self
            .peer
            .call_tool(request)
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        reply_text(&result)
    }
}

fn unavailable(message: impl Into<String>) -> ToolError {
    ToolError::Unavailable(message.into())
}

fn reply_text(result: &CallToolResult) -> Result<String, ToolError> {
    let text = result
        .content
        .iter()
        .find_map(|item| item.as_text())
        .map(|content| content.text.clone());

    match (result.is_error.unwrap_or(false), text) {
        (true, text) => Err(ToolError::Failed(
            text.unwrap_or_else(|| "tool reported an error".to_string()),
        )),
        (false, Some(text)) => Ok(text),
        (false, None) => Err(ToolError::InvalidResponse(
            "reply has no text content".to_string(),
        )),
    }
}
