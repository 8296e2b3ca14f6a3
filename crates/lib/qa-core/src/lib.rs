//! Core services for qa-mcp.
//!
//! This crate loads the run configuration, talks to the chat-completion
//! endpoint, drives the per-question answer pipeline, and runs whole batches
//! against the question store.

pub mod batch;
pub mod config;
pub mod format;
pub mod llm;
pub mod pipeline;

pub use batch::{BatchError, BatchReport, BatchRunner};
pub use config::{AppConfig, ConfigError, ToolEndpoint};
pub use format::{AnswerFormatter, ToolError, UnavailableFormatter, format_answer};
pub use llm::{ChatModel, ModelCallError, OpenAiChatClient};
pub use pipeline::{AnswerPipeline, Outcome, PipelineOptions, PipelineRun};
