use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::FormatterMcp;

/// Parameters for formatting a model answer.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FormatAnswerParams {
    /// Plain answer text to wrap.
    pub text: String,
}

#[tool_router(router = tool_router_format, vis = "pub")]
impl FormatterMcp {
    #[tool(description = "Wrap a plain answer in the markdown result template (heading, text, rule, attribution line).")]
    async fn format_answer(
        &self,
        Parameters(params): Parameters<FormatAnswerParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text(
            qa_core::format_answer(&params.text),
        )]))
    }
}
