//! Per-question answer pipeline.
//!
//! ```text
//! Start -> LlmCall -> Branch -> Format -> End
//!                          \-------------> End
//! ```
//!
//! The branch depends only on [`PipelineOptions::use_mcp`]. A failed format
//! step never fails the run: the raw answer is passed through instead.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use qa_store::{Answer, Question};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::format::{AnswerFormatter, ToolError};
use crate::llm::{ChatModel, ModelCallError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub use_mcp: bool,
    pub tool_timeout: Duration,
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            use_mcp: config.use_mcp,
            tool_timeout: config.tool_timeout,
        }
    }
}

/// Final answer text, tagged by whether the formatting step produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Formatted(String),
    /// Unformatted model output. `fallback` is set when formatting was
    /// attempted and failed.
    Raw {
        text: String,
        fallback: Option<ToolError>,
    },
}

impl Outcome {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Formatted(text) | Self::Raw { text, .. } => text,
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Formatted(text) | Self::Raw { text, .. } => text,
        }
    }

    #[must_use]
    pub const fn is_formatted(&self) -> bool {
        matches!(self, Self::Formatted(_))
    }

    #[must_use]
    pub const fn fell_back(&self) -> bool {
        matches!(self, Self::Raw { fallback: Some(_), .. })
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRun {
    pub question: Question,
    pub outcome: Outcome,
}

impl PipelineRun {
    #[must_use]
    pub fn into_answer(self) -> Answer {
        Answer::new(&self.question, self.outcome.into_text())
    }
}

enum Stage {
    Start,
    LlmCall,
    Branch { raw_answer: String },
    Format { raw_answer: String },
    End(Outcome),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::LlmCall => "llm_call",
            Self::Branch { .. } => "branch",
            Self::Format { .. } => "format",
            Self::End(_) => "end",
        };
        f.write_str(name)
    }
}

/// Answers one question at a time with a model and an optional formatter.
#[derive(Clone)]
pub struct AnswerPipeline {
    model: Arc<dyn ChatModel>,
    formatter: Arc<dyn AnswerFormatter>,
    options: PipelineOptions,
}

impl AnswerPipeline {
    #[must_use]
    pub fn new(
        model: Arc<dyn ChatModel>,
        formatter: Arc<dyn AnswerFormatter>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            model,
            formatter,
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Runs the pipeline for one question.
    ///
    /// # Errors
    /// Returns `ModelCallError` if the model call fails. Formatting failures
    /// are absorbed into [`Outcome::Raw`].
    pub async fn run(&self, question: &Question) -> Result<PipelineRun, ModelCallError> {
        let mut stage = Stage::Start;
        let outcome = loop {
            debug!(id = %question.id, %stage, "pipeline stage");
            stage = match stage {
                Stage::Start => Stage::LlmCall,
                Stage::LlmCall => Stage::Branch {
                    raw_answer: self.model.complete(&question.question).await?,
                },
                Stage::Branch { raw_answer } => {
                    if self.options.use_mcp {
                        Stage::Format { raw_answer }
                    } else {
                        Stage::End(Outcome::Raw {
                            text: raw_answer,
                            fallback: None,
                        })
                    }
                }
                Stage::Format { raw_answer } => Stage::End(self.format(&question.id, raw_answer).await),
                Stage::End(outcome) => break outcome,
            };
        };

        Ok(PipelineRun {
            question: question.clone(),
            outcome,
        })
    }

    async fn format(&self, id: &str, raw_answer: String) -> Outcome {
        let timeout = self.options.tool_timeout;
        let result = tokio::time::timeout(timeout, self.formatter.format(&raw_answer))
            .await
            .unwrap_or(Err(ToolError::TimedOut(timeout)));

        match result {
            Ok(formatted) => Outcome::Formatted(formatted),
            Err(err) => {
                warn!(id, error = %err, "formatting failed; keeping raw answer");
                Outcome::Raw {
                    text: raw_answer,
                    fallback: Some(err),
                }
            }
        }
    }
}
