//! JSON file storage for batch input and output.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::models::{Answer, Question};

const OUTPUT_INDENT: &[u8] = b"    ";

#[derive(Debug)]
pub enum InputError {
    NotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    NotAnArray(PathBuf),
    InvalidRecord { index: usize, message: String },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "input file not found: {}", path.display()),
            Self::Io { path, source } => {
                write!(f, "failed to read input {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "input {} is not valid JSON: {source}", path.display())
            }
            Self::NotAnArray(path) => {
                write!(f, "input {} must contain a JSON array", path.display())
            }
            Self::InvalidRecord { index, message } => {
                write!(f, "invalid question at index {index}: {message}")
            }
        }
    }
}

impl Error for InputError {}

#[derive(Debug)]
pub enum OutputError {
    Serialize(serde_json::Error),
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "failed to serialize answers: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write output {}: {source}", path.display())
            }
        }
    }
}

impl Error for OutputError {}

impl From<serde_json::Error> for OutputError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

/// Reads the ordered question list from a JSON file.
///
/// # Errors
/// Returns `InputError` if the file is missing or unreadable, is not a JSON
/// array, or holds an element without non-empty string `id` and `question`
/// fields.
pub fn load_questions(path: impl AsRef<Path>) -> Result<Vec<Question>, InputError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            InputError::NotFound(path.to_path_buf())
        } else {
            InputError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    parse_questions(path, &content)
}

fn parse_questions(path: &Path, content: &str) -> Result<Vec<Question>, InputError> {
    let value: Value = serde_json::from_str(content).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(items) = value else {
        return Err(InputError::NotAnArray(path.to_path_buf()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_question(index, item))
        .collect()
}

fn parse_question(index: usize, item: Value) -> Result<Question, InputError> {
    if !item.is_object() {
        return Err(InputError::InvalidRecord {
            index,
            message: "expected an object".to_string(),
        });
    }
    let question: Question = serde_json::from_value(item).map_err(|err| {
        InputError::InvalidRecord {
            index,
            message: err.to_string(),
        }
    })?;
    if question.id.trim().is_empty() {
        return Err(InputError::InvalidRecord {
            index,
            message: "id must not be empty".to_string(),
        });
    }
    if question.question.trim().is_empty() {
        return Err(InputError::InvalidRecord {
            index,
            message: "question must not be empty".to_string(),
        });
    }
    Ok(question)
}

/// Writes the ordered answer list, replacing any existing file.
///
/// # Errors
/// Returns `OutputError` if serialization or the write fails.
pub fn save_answers(path: impl AsRef<Path>, answers: &[Answer]) -> Result<(), OutputError> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(OUTPUT_INDENT));
    answers.serialize(&mut serializer)?;
    std::fs::write(path, buf).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Input and output locations for one batch run.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    input: PathBuf,
    output: PathBuf,
}

impl QuestionStore {
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Loads the batch questions.
    ///
    /// # Errors
    /// See [`load_questions`].
    pub fn load(&self) -> Result<Vec<Question>, InputError> {
        load_questions(&self.input)
    }

    /// Persists the batch answers.
    ///
    /// # Errors
    /// See [`save_answers`].
    pub fn save(&self, answers: &[Answer]) -> Result<(), OutputError> {
        save_answers(&self.output, answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_input(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("questions.json");
        std::fs::write(&path, content).expect("failed to write fixture");
        path
    }

    #[test]
    fn loads_questions_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_input(
            &dir,
            r#"[{"id":"b","question":"second?"},{"id":"a","question":"first?"}]"#,
        );

        let questions = load_questions(&path).expect("questions should load");

        assert_eq!(
            questions,
            vec![Question::new("b", "second?"), Question::new("a", "first?")]
        );
    }

    #[test]
    fn empty_array_is_valid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_input(&dir, "[]");

        let questions = load_questions(&path).expect("empty input should load");

        assert!(questions.is_empty());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_questions(dir.path().join("absent.json")).unwrap_err();

        assert!(matches!(err, InputError::NotFound(_)));
    }

    #[test]
    fn missing_question_field_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_input(&dir, r#"[{"id":"1","question":"ok"},{"id":"2"}]"#);

        let err = load_questions(&path).unwrap_err();

        assert!(matches!(err, InputError::InvalidRecord { index: 1, .. }), "{err}");
    }

    #[test]
    fn non_string_id_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_input(&dir, r#"[{"id":1,"question":"What?"}]"#);

        let err = load_questions(&path).unwrap_err();

        assert!(matches!(err, InputError::InvalidRecord { index: 0, .. }));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_input(&dir, r#"[{"id":" ","question":"What?"}]"#);
        assert!(matches!(
            load_questions(&path).unwrap_err(),
            InputError::InvalidRecord { index: 0, .. }
        ));

        let path = write_input(&dir, r#"[{"id":"1","question":""}]"#);
        assert!(matches!(
            load_questions(&path).unwrap_err(),
            InputError::InvalidRecord { index: 0, .. }
        ));
    }

    #[test]
    fn object_root_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_input(&dir, r#"{"id":"1","question":"What?"}"#);

        assert!(matches!(load_questions(&path).unwrap_err(), InputError::NotAnArray(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_input(&dir, r#"[{"id":"1","#);

        assert!(matches!(load_questions(&path).unwrap_err(), InputError::Parse { .. }));
    }

    #[test]
    fn save_overwrites_and_keeps_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("answers.json");
        std::fs::write(&path, "stale").expect("failed to seed output");

        let first = Question::new("1", "What is 2+2?");
        let second = Question::new("2", "Capital of France?");
        let answers = vec![Answer::new(&first, "4"), Answer::new(&second, "Paris")];
        save_answers(&path, &answers).expect("save should succeed");

        let written = std::fs::read_to_string(&path).expect("output should exist");
        assert!(written.starts_with("[\n    {"), "expected four-space indent: {written}");
        let parsed: Vec<Answer> = serde_json::from_str(&written).expect("output should parse");
        assert_eq!(parsed, answers);
    }

    #[test]
    fn save_keeps_non_ascii_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("answers.json");
        let question = Question::new("1", "안녕?");

        save_answers(&path, &[Answer::new(&question, "네")]).expect("save should succeed");

        let written = std::fs::read_to_string(&path).expect("output should exist");
        assert!(written.contains("안녕?"));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("answers.json");

        let err = save_answers(&path, &[]).unwrap_err();

        assert!(matches!(err, OutputError::Io { .. }));
    }

    #[test]
    fn store_round_trips_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_input(&dir, r#"[{"id":"1","question":"What?"}]"#);
        let output = dir.path().join("answers.json");
        let store = QuestionStore::new(&input, &output);

        let questions = store.load().expect("load should succeed");
        store
            .save(&[Answer::new(&questions[0], "That.")])
            .expect("save should succeed");

        assert_eq!(store.input(), input.as_path());
        assert!(store.output().exists());
    }
}
