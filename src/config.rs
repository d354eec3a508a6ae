use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHUNK_MAX_WORDS: usize = 512;
const DEFAULT_STAGING_DIR: &str = "temp";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

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

/// Runtime configuration for the embedding server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality every produced vector must have.
    pub embedding_dimension: usize,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// API key for OpenAI-compatible providers.
    pub openai_api_key: Option<String>,
    /// Base URL for OpenAI-compatible providers.
    pub openai_base_url: String,
    /// Maximum number of words per chunk handed to the model.
    pub chunk_max_words: usize,
    /// Directory holding uploads while a request is in flight.
    pub staging_dir: PathBuf,
    /// Upper bound on an upload request body.
    pub max_upload_bytes: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported embedding backends for the processing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Deterministic in-process hashing embedder; needs no model runtime.
    Local,
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI embeddings API.
    OpenAI,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let embedding_provider = match load_env_optional("EMBEDDING_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
            None => EmbeddingProvider::Local,
        };
        let openai_api_key = load_env_optional("OPENAI_API_KEY");
        if embedding_provider == EmbeddingProvider::OpenAI && openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".to_string()));
        }

        Ok(Self {
            embedding_provider,
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension: parse_positive("EMBEDDING_DIMENSION")?
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSION),
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_api_key,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            chunk_max_words: parse_positive("CHUNK_MAX_WORDS")?.unwrap_or(DEFAULT_CHUNK_MAX_WORDS),
            staging_dir: load_env_optional("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            max_upload_bytes: parse_positive("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_provider: EmbeddingProvider::Local,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chunk_max_words: DEFAULT_CHUNK_MAX_WORDS,
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            server_port: None,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_positive(key: &str) -> Result<Option<usize>, ConfigError> {
    load_env_optional(key)
        .map(|value| match value.trim().parse::<usize>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(ConfigError::InvalidValue(key.to_string())),
        })
        .transpose()
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Install an already-built [`Config`] in the global cache and return the cached value.
///
/// Only the first call installs anything; later calls leave the cache untouched and return the
/// configuration installed first.
pub fn init_config(config: Config) -> &'static Config {
    tracing::debug!(
        provider = ?config.embedding_provider,
        model = %config.embedding_model,
        dimension = config.embedding_dimension,
        chunk_max_words = config.chunk_max_words,
        staging_dir = %config.staging_dir.display(),
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.get_or_init(|| config)
}

/// Read `.env` (when present) and build a [`Config`] from the process environment.
pub fn load_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    Config::from_env()
}
