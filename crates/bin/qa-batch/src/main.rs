//! Batch entry point.
//!
//! Reads the run configuration and the question file, answers every question
//! with the configured chat model, optionally formats each answer through the
//! `format_answer` MCP tool, and writes the answers file once at the end.

mod config;

use std::sync::Arc;

use qa_core::{
    AnswerFormatter,
    AnswerPipeline,
    AppConfig,
    BatchRunner,
    OpenAiChatClient,
    PipelineOptions,
    UnavailableFormatter,
};
use qa_mcp::McpFormatter;
use qa_store::QuestionStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::BatchPaths;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let paths = BatchPaths::from_args()?;
    let config = AppConfig::load(&paths.config)?;
    info!(config = ?config, "configuration loaded");

    let model = OpenAiChatClient::from_config(&config)?;
    info!(endpoint = model.endpoint(), model = model.model(), "chat model ready");

    let session = if config.use_mcp {
        match McpFormatter::connect(&config.tool_endpoint, config.tool_timeout).await {
            Ok(formatter) => Some(Arc::new(formatter)),
            Err(err) => {
                warn!(error = %err, "formatting tool unavailable; answers will stay unformatted");
                None
            }
        }
    } else {
        None
    };
    let formatter = session.clone().map_or_else(
        || Arc::new(UnavailableFormatter::default()) as Arc<dyn AnswerFormatter>,
        |formatter| formatter as Arc<dyn AnswerFormatter>,
    );

    let runner = BatchRunner::new(AnswerPipeline::new(
        Arc::new(model),
        formatter,
        PipelineOptions::from(&config),
    ));
    let store = QuestionStore::new(paths.input, paths.output);
    let outcome = runner.run_store(&store).await;

    if let Some(session) = session {
        session.shutdown().await;
    }
    let report = outcome?;

    info!(
        total = report.total(),
        failed = report.failed,
        "batch finished"
    );
    Ok(())
}
