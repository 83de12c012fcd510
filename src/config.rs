use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default model identifier requested from the chat-completions backend.
pub const DEFAULT_MODEL: &str = "google/gemma-3-1b-it:free";
/// Default soft bound on segment length, in characters.
pub const DEFAULT_MAX_SEGMENT_LENGTH: usize = 4000;
/// Default per-request timeout for backend calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default cap on the serialized size of a single backend request.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 256 * 1024;
/// Default cap on uploaded document size (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Instruction sent as the system turn of every summarization request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a document summarization system that creates detailed, well-structured summaries. Follow these guidelines:\n\n\
Format the summary as follows:\n\n\
Title: [Document Title]\n\n\
Overview:\n[Brief overview of the document]\n\n\
A. [First Main Section]\n   1. [Subsection]\n      • [Bullet point]\n      • [Bullet point]\n   2. [Subsection]\n\n\
B. [Second Main Section]\n   [Content]\n\n\
Strengths:\n• [Strength point]\n• [Strength point]\n\n\
Suggestions for Improvement:\n• [Suggestion]\n• [Suggestion]\n\n\
Overall:\n[Final assessment]\n\n\
Guidelines:\n\
1. Do not use markdown symbols like *, _, or #\n\
2. Use plain text formatting\n\
3. Use proper indentation and spacing\n\
4. Keep technical accuracy and terminology\n\
5. Be objective and clear\n\
6. Use bullet points with • symbol\n\
7. Maintain consistent spacing between sections";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Connection and prompt settings handed to the backend client at construction.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Model identifier placed in every request.
    pub model: String,
    /// System instruction describing the desired summary layout.
    pub system_prompt: String,
    /// Upper bound for a single request, including connect time.
    pub timeout: Duration,
    /// Largest serialized request body the client will send.
    pub max_request_bytes: usize,
    /// Optional `HTTP-Referer` attribution header.
    pub referer: Option<String>,
    /// Optional `X-Title` attribution header.
    pub title: Option<String>,
}

impl BackendConfig {
    /// Build a configuration with defaults for everything except the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            referer: None,
            title: None,
        }
    }
}

/// Scheduling knobs for the summarization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Segment length used when a caller does not supply one.
    pub default_max_segment_length: usize,
    /// Maximum number of backend calls outstanding at once. `1` means sequential.
    pub max_in_flight: usize,
    /// Optional request budget per minute enforced by a token bucket.
    pub requests_per_minute: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            max_in_flight: 1,
            requests_per_minute: None,
        }
    }
}

/// Runtime configuration for the summarization service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend connection settings.
    pub backend: BackendConfig,
    /// Pipeline scheduling settings.
    pub pipeline: PipelineConfig,
    /// Largest document accepted by the extractors.
    pub max_upload_bytes: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = BackendConfig {
            endpoint: load_env("SUMMARIZER_URL")?,
            api_key: load_env_optional("SUMMARIZER_API_KEY"),
            model: load_env_optional("SUMMARIZER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            system_prompt: load_env_optional("SUMMARIZER_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.into()),
            timeout: Duration::from_secs(
                parse_optional("SUMMARIZER_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_request_bytes: parse_optional("SUMMARIZER_MAX_REQUEST_BYTES")?
                .unwrap_or(DEFAULT_MAX_REQUEST_BYTES),
            referer: load_env_optional("SUMMARIZER_REFERER"),
            title: load_env_optional("SUMMARIZER_TITLE"),
        };

        let default_max_segment_length =
            parse_optional("MAX_SEGMENT_LENGTH")?.unwrap_or(DEFAULT_MAX_SEGMENT_LENGTH);
        if default_max_segment_length == 0 {
            return Err(ConfigError::InvalidValue("MAX_SEGMENT_LENGTH".into()));
        }
        let max_in_flight: usize = parse_optional("SUMMARIZER_MAX_IN_FLIGHT")?.unwrap_or(1);
        if max_in_flight == 0 {
            return Err(ConfigError::InvalidValue("SUMMARIZER_MAX_IN_FLIGHT".into()));
        }
        let requests_per_minute: Option<u32> = parse_optional("SUMMARIZER_REQUESTS_PER_MINUTE")?;
        if requests_per_minute == Some(0) {
            return Err(ConfigError::InvalidValue(
                "SUMMARIZER_REQUESTS_PER_MINUTE".into(),
            ));
        }

        Ok(Self {
            backend,
            pipeline: PipelineConfig {
                default_max_segment_length,
                max_in_flight,
                requests_per_minute,
            },
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Read `.env` (when present) and load configuration from the process environment.
///
/// The returned value is passed explicitly to the components that need it; nothing is
/// cached globally.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        endpoint = %config.backend.endpoint,
        model = %config.backend.model,
        timeout_secs = config.backend.timeout.as_secs(),
        max_segment_length = config.pipeline.default_max_segment_length,
        max_in_flight = config.pipeline.max_in_flight,
        requests_per_minute = ?config.pipeline.requests_per_minute,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(config)
}
