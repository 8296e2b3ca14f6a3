use serde::{Deserialize, Serialize};

/// A single question read from the batch input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub question: String,
}

impl Question {
    #[must_use]
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
        }
    }
}

/// An answered question as written to the batch output.
///
/// `error` is only present on placeholder entries recorded for questions whose
/// model call failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Answer {
    #[must_use]
    pub fn new(question: &Question, answer: impl Into<String>) -> Self {
        Self {
            id: question.id.clone(),
            question: question.question.clone(),
            answer: answer.into(),
            error: None,
        }
    }

    /// Builds the placeholder recorded when a question could not be answered.
    #[must_use]
    pub fn failed(question: &Question, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            id: question.id.clone(),
            question: question.question.clone(),
            answer: format!("Error: {message}"),
            error: Some(message),
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
