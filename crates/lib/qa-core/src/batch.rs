use std::error::Error;
use std::fmt;

use qa_store::{Answer, InputError, OutputError, Question, QuestionStore};
use tracing::{error, info, warn};

use crate::pipeline::AnswerPipeline;

const PREVIEW_CHARS: usize = 30;

#[derive(Debug)]
pub enum BatchError {
    Input(InputError),
    Output(OutputError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BatchError {}

impl From<InputError> for BatchError {
    fn from(err: InputError) -> Self {
        Self::Input(err)
    }
}

impl From<OutputError> for BatchError {
    fn from(err: OutputError) -> Self {
        Self::Output(err)
    }
}

/// Ordered answers for one batch plus run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub answers: Vec<Answer>,
    pub answered: usize,
    pub failed: usize,
    pub formatted: usize,
    pub fallbacks: usize,
}

impl BatchReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.answers.len()
    }
}

/// Runs every question of a batch through the pipeline, in order.
///
/// A failed model call does not stop the batch; the question gets a
/// placeholder answer and the next one runs.
#[derive(Clone)]
pub struct BatchRunner {
    pipeline: AnswerPipeline,
}

impl BatchRunner {
    #[must_use]
    pub const fn new(pipeline: AnswerPipeline) -> Self {
        Self { pipeline }
    }

    #[must_use]
    pub const fn pipeline(&self) -> &AnswerPipeline {
        &self.pipeline
    }

    pub async fn run(&self, questions: &[Question]) -> BatchReport {
        info!("processing {} question(s)", questions.len());

        let mut report = BatchReport {
            answers: Vec::with_capacity(questions.len()),
            ..BatchReport::default()
        };
        for question in questions {
            info!("[{}] processing: {}...", question.id, preview(&question.question));
            match self.pipeline.run(question).await {
                Ok(run) => {
                    report.answered += 1;
                    if run.outcome.is_formatted() {
                        report.formatted += 1;
                    }
                    if run.outcome.fell_back() {
                        report.fallbacks += 1;
                    }
                    report.answers.push(run.into_answer());
                }
                Err(err) => {
                    error!(id = %question.id, error = %err, "model call failed");
                    report.failed += 1;
                    report.answers.push(Answer::failed(question, err.to_string()));
                }
            }
        }

        if report.fallbacks > 0 {
            warn!(
                "{} answer(s) were left unformatted because the formatting tool failed",
                report.fallbacks
            );
        }
        info!(
            answered = report.answered,
            failed = report.failed,
            formatted = report.formatted,
            "batch complete"
        );
        report
    }

    /// Loads the store's questions, runs them, and writes every answer once.
    ///
    /// # Errors
    /// Returns `BatchError::Input` before any question runs if the input cannot
    /// be loaded, and `BatchError::Output` if the answers cannot be written.
    pub async fn run_store(&self, store: &QuestionStore) -> Result<BatchReport, BatchError> {
        let questions = store.load()?;
        let report = self.run(&questions).await;
        store.save(&report.answers)?;
        info!("answers written to {}", store.output().display());
        Ok(report)
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
