//! Answer formatting template and the formatting capability interface.
//!
//! The template itself is a pure function. The pipeline never calls it
//! directly; it goes through [`AnswerFormatter`] so the formatting step can sit
//! behind the MCP tool boundary or be missing entirely.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub const FORMAT_HEADING: &str = "### 분석 결과";
pub const FORMAT_ATTRIBUTION: &str = "*vLLM-MCP 서버에 의해 처리됨*";
pub const FORMAT_TOOL_NAME: &str = "format_answer";

/// Wraps `text` in the markdown answer template.
#[must_use]
pub fn format_answer(text: &str) -> String {
    format!("{FORMAT_HEADING}\n\n{text}\n\n---\n{FORMAT_ATTRIBUTION}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The tool server could not be reached.
    Unavailable(String),
    /// The tool ran and reported an error.
    Failed(String),
    /// The tool replied without usable text content.
    InvalidResponse(String),
    TimedOut(Duration),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "formatting tool unavailable: {message}"),
            Self::Failed(message) => write!(f, "formatting tool failed: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "formatting tool returned an invalid response: {message}")
            }
            Self::TimedOut(after) => {
                write!(f, "formatting tool timed out after {}ms", after.as_millis())
            }
        }
    }
}

impl Error for ToolError {}

/// Capability that formats a raw model answer.
#[async_trait]
pub trait AnswerFormatter: Send + Sync {
    /// Formats `text`.
    ///
    /// # Errors
    /// Returns `ToolError` if the capability cannot produce formatted text.
    async fn format(&self, text: &str) -> Result<String, ToolError>;
}

/// Stand-in used when no tool server is reachable; every call reports
/// unavailability.
#[derive(Debug, Clone)]
pub struct UnavailableFormatter {
    reason: String,
}

impl UnavailableFormatter {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableFormatter {
    fn default() -> Self {
        Self::new("no formatting tool configured")
    }
}

#[async_trait]
impl AnswerFormatter for UnavailableFormatter {
    async fn format(&self, _text: &str) -> Result<String, ToolError> {
        Err(ToolError::Unavailable(self.reason.clone()))
    }
}
