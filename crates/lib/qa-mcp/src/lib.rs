//! MCP server and client for the qa-mcp answer formatter.
//!
//! The server side wires the formatting template into rmcp tool handlers. The
//! client side implements [`qa_core::AnswerFormatter`] by calling that tool
//! over stdio or streamable HTTP.

mod tools;
pub mod client;
pub mod server;

use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

pub use client::McpFormatter;
pub use tools::format::FormatAnswerParams;

const SERVER_INSTRUCTIONS: &str = r"qa-mcp formats question-answering results for display.

Tools:
- `format_answer` takes `text` (a plain model answer) and returns it wrapped in a markdown
  template: a `### 분석 결과` heading, the given text, a horizontal rule, and an
  attribution line. The tool is deterministic and accepts any string, including an empty one.
- `health` returns `ok`.";

/// MCP server exposing the answer formatting tool.
#[derive(Clone)]
pub struct FormatterMcp {
    tool_router: ToolRouter<Self>,
}

impl FormatterMcp {
    #[must_use]
    pub fn new() -> Self {
        let tool_router = Self::tool_router_core() + Self::tool_router_format();
        Self { tool_router }
    }
}

impl Default for FormatterMcp {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl FormatterMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl ServerHandler for FormatterMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
