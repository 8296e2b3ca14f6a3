use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOOL_COMMAND: &str = "qa-mcpd";
pub const DEFAULT_TOOL_ARGS: &[&str] = &["--stdio"];

const MAX_TEMPERATURE: f32 = 2.0;

/// Config file contents as written by the user.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    model_name: String,
    openai_api_key: String,
    openai_api_base: String,
    use_mcp: bool,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    tool_timeout_secs: Option<u64>,
    #[serde(default)]
    mcp: Option<ToolEndpointFile>,
}

#[derive(Debug, Deserialize)]
struct ToolEndpointFile {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Where the formatting tool server is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEndpoint {
    /// Spawn a child process and speak MCP over its stdio.
    Command { program: String, args: Vec<String> },
    /// Connect to a streamable HTTP MCP endpoint.
    Url(String),
}

impl Default for ToolEndpoint {
    fn default() -> Self {
        Self::Command {
            program: DEFAULT_TOOL_COMMAND.to_string(),
            args: DEFAULT_TOOL_ARGS.iter().map(|arg| (*arg).to_string()).collect(),
        }
    }
}

/// Run configuration, loaded once and shared read-only.
#[derive(Clone)]
pub struct AppConfig {
    pub model_name: String,
    pub api_key: String,
    pub api_base: String,
    pub use_mcp: bool,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub tool_timeout: Duration,
    pub tool_endpoint: ToolEndpoint,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("model_name", &self.model_name)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("use_mcp", &self.use_mcp)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .field("tool_timeout", &self.tool_timeout)
            .field("tool_endpoint", &self.tool_endpoint)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, message: String },
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file not found: {}", path.display()),
            Self::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config {}: {message}", path.display())
            }
            Self::InvalidSetting { name, value } => write!(f, "invalid {name} value: {value}"),
        }
    }
}

impl Error for ConfigError {}

impl AppConfig {
    /// Loads the configuration file. `.toml` files are read as TOML, anything
    /// else as JSON.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// lacks a required field, or holds an invalid value.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let file = parse_file(path, &content)?;
        Self::try_from(file)
    }

    /// Parses a JSON configuration document.
    ///
    /// # Errors
    /// Returns `ConfigError` if the document is malformed or invalid.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_str(content).map_err(|err| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                message: err.to_string(),
            })?;
        Self::try_from(file)
    }
}

fn parse_file(path: &Path, content: &str) -> Result<ConfigFile, ConfigError> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let parsed: Result<ConfigFile, String> = if is_toml {
        toml::from_str(content).map_err(|err| err.to_string())
    } else {
        serde_json::from_str(content).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

impl TryFrom<ConfigFile> for AppConfig {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let model_name = file.model_name.trim().to_string();
        if model_name.is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "model_name",
                value: file.model_name,
            });
        }

        let api_base = file.openai_api_base.trim().to_string();
        if !is_http_url(&api_base) {
            return Err(ConfigError::InvalidSetting {
                name: "openai_api_base",
                value: file.openai_api_base,
            });
        }

        let temperature = file.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(ConfigError::InvalidSetting {
                name: "temperature",
                value: temperature.to_string(),
            });
        }

        let request_timeout = positive_secs(
            "request_timeout_secs",
            file.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )?;
        let tool_timeout = positive_secs(
            "tool_timeout_secs",
            file.tool_timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
        )?;

        let tool_endpoint = match file.mcp {
            None => ToolEndpoint::default(),
            Some(endpoint) => tool_endpoint(endpoint)?,
        };

        Ok(Self {
            model_name,
            api_key: file.openai_api_key.trim().to_string(),
            api_base,
            use_mcp: file.use_mcp,
            temperature,
            request_timeout,
            tool_timeout,
            tool_endpoint,
        })
    }
}

fn tool_endpoint(file: ToolEndpointFile) -> Result<ToolEndpoint, ConfigError> {
    let command = file.command.filter(|value| !value.trim().is_empty());
    let url = file.url.filter(|value| !value.trim().is_empty());

    match (command, url) {
        (Some(program), None) => Ok(ToolEndpoint::Command {
            program,
            args: file.args,
        }),
        (None, Some(url)) if is_http_url(&url) => Ok(ToolEndpoint::Url(url)),
        (None, Some(url)) => Err(ConfigError::InvalidSetting {
            name: "mcp.url",
            value: url,
        }),
        (Some(program), Some(url)) => Err(ConfigError::InvalidSetting {
            name: "mcp",
            value: format!("both command ({program}) and url ({url}) are set"),
        }),
        (None, None) => Err(ConfigError::InvalidSetting {
            name: "mcp",
            value: "one of command or url is required".to_string(),
        }),
    }
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidSetting {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
