use clap::Parser;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config.json";
const DEFAULT_INPUT_PATH: &str = "questions.json";
const DEFAULT_OUTPUT_PATH: &str = "answers.json";

#[derive(Parser, Debug)]
#[command(
    name = "qa-batch",
    version,
    about = "Answer every question in a JSON file with a chat model."
)]
struct CliArgs {
    /// Run configuration (JSON, or TOML with a `.toml` extension).
    #[arg(long, env = "QA_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Questions to answer.
    #[arg(long, env = "QA_INPUT", default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Where the answers are written.
    #[arg(long, env = "QA_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,
}

/// File locations for one batch run.
#[derive(Debug, Clone)]
pub struct BatchPaths {
    pub config: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug)]
pub enum ArgsError {
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => write!(f, "invalid {name} value: {value:?}"),
        }
    }
}

impl Error for ArgsError {}

impl BatchPaths {
    pub fn from_args() -> Result<Self, ArgsError> {
        Self::try_from(CliArgs::parse())
    }
}

impl TryFrom<CliArgs> for BatchPaths {
    type Error = ArgsError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        for (name, path) in [
            ("QA_CONFIG", &args.config),
            ("QA_INPUT", &args.input),
            ("QA_OUTPUT", &args.output),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ArgsError::InvalidSetting {
                    name,
                    value: String::new(),
                });
            }
        }
        if same_file(&args.input, &args.output) {
            return Err(ArgsError::InvalidSetting {
                name: "QA_OUTPUT",
                value: args.output.display().to_string(),
            });
        }

        Ok(Self {
            config: args.config,
            input: args.input,
            output: args.output,
        })
    }
}

/// Resolves both paths when they exist so `./a.json` and `a.json` compare
/// equal; otherwise compares them as given.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            config: DEFAULT_CONFIG_PATH.into(),
            input: DEFAULT_INPUT_PATH.into(),
            output: DEFAULT_OUTPUT_PATH.into(),
        }
    }

    #[test]
    fn defaults_use_working_directory_files() {
        let paths = BatchPaths::try_from(base_args()).expect("defaults should be valid");

        assert_eq!(paths.config, PathBuf::from("config.json"));
        assert_eq!(paths.input, PathBuf::from("questions.json"));
        assert_eq!(paths.output, PathBuf::from("answers.json"));
    }

    #[test]
    fn parses_flags() {
        let args = CliArgs::try_parse_from([
            "qa-batch",
            "--config",
            "run.toml",
            "--input",
            "in.json",
            "--output",
            "out.json",
        ])
        .expect("flags should parse");

        let paths = BatchPaths::try_from(args).expect("paths should be valid");

        assert_eq!(paths.config, PathBuf::from("run.toml"));
        assert_eq!(paths.output, PathBuf::from("out.json"));
    }

    #[test]
    fn rejects_output_overwriting_input() {
        let mut args = base_args();
        args.output = args.input.clone();

        let err = BatchPaths::try_from(args).unwrap_err();

        assert!(matches!(err, ArgsError::InvalidSetting { name: "QA_OUTPUT", .. }));
    }

    #[test]
    fn rejects_empty_path() {
        let mut args = base_args();
        args.config = PathBuf::new();

        assert!(BatchPaths::try_from(args).is_err());
    }

    #[test]
    fn rejects_output_that_resolves_to_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("questions.json");
        std::fs::write(&input, "[]").expect("failed to write questions");
        let mut args = base_args();
        args.input = input;
        args.output = dir.path().join(".").join("questions.json");

        let err = BatchPaths::try_from(args).unwrap_err();

        assert!(matches!(err, ArgsError::InvalidSetting { name: "QA_OUTPUT", .. }));
    }

    #[test]
    fn accepts_output_that_does_not_exist_yet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("questions.json");
        std::fs::write(&input, "[]").expect("failed to write questions");
        let mut args = base_args();
        args.input = input;
        args.output = dir.path().join("answers.json");

        assert!(BatchPaths::try_from(args).is_ok());
    }
}
