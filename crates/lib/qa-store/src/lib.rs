//! Question and answer records for qa-mcp.
//!
//! This crate defines the data model shared by the pipeline and the batch
//! runner, and the JSON file store that reads questions and writes answers.

pub mod models;
pub mod store;

pub use models::*;
pub use store::{InputError, OutputError, QuestionStore, load_questions, save_answers};
