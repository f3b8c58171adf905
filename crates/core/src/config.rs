//! Configuration management for docpilot.
//!
//! Configuration is merged from four layers with this precedence:
//! CLI flags > environment variables > YAML config file > defaults.
//!
//! The YAML file (`docpilot.yaml` by default) mirrors the sections the
//! agent cares about: `llm`, `embedding`, `agent`, `data`, and `logging`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Operating mode for a query, fixed for the duration of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local vector index only; web augmentation is categorically unavailable.
    Offline,
    /// Web search may be used when local confidence is low.
    Online,
}

impl Mode {
    /// Parse a mode string ("offline"/"online"), case-insensitive.
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "offline" => Ok(Mode::Offline),
            "online" => Ok(Mode::Online),
            other => Err(AppError::Config(format!(
                "Unknown mode: '{}'. Supported: offline, online",
                other
            ))),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Offline => "offline",
            Mode::Online => "online",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Operating mode (offline/online)
    pub mode: Mode,

    /// Completion model identifier (Ollama)
    pub llm_model: String,

    /// Embedding model identifier (Ollama)
    pub embedding_model: String,

    /// Embedding provider ("ollama" or "mock")
    pub embedding_provider: String,

    /// Base URL for the Ollama API
    pub ollama_base_url: String,

    /// Sampling temperature for generation
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Number of chunks to retrieve per query
    pub retrieval_k: usize,

    /// Confidence threshold for the web-augmentation branch
    pub confidence_threshold: f32,

    /// Maximum characters of evidence passed to the generator
    pub max_context_chars: usize,

    /// Maximum web-search results to merge
    pub max_web_results: usize,

    /// Chunk size (characters) for ingestion
    pub chunk_size: usize,

    /// Chunk overlap (characters) for ingestion
    pub chunk_overlap: usize,

    /// Directory holding documentation dumps
    pub data_dir: PathBuf,

    /// Path to the persisted vector index
    pub index_path: PathBuf,

    /// Optional rerank scoring endpoint; reranking degrades gracefully
    /// when unset or unreachable
    pub rerank_endpoint: Option<String>,

    /// Tavily API key (required for online mode)
    pub tavily_api_key: Option<String>,

    /// Request timeout in seconds for external calls
    pub request_timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full YAML configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    agent: Option<AgentSection>,
    data: Option<DataSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LlmSection {
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmbeddingSection {
    model: Option<String>,
    provider: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AgentSection {
    mode: Option<String>,
    retrieval_k: Option<usize>,
    rerank_threshold: Option<f32>,
    rerank_endpoint: Option<String>,
    max_context_chars: Option<usize>,
    max_web_results: Option<usize>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DataSection {
    dir: Option<String>,
    index: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            mode: Mode::Offline,
            llm_model: "llama3.2:3b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_provider: "ollama".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            retrieval_k: 5,
            confidence_threshold: 0.0,
            max_context_chars: 8000,
            max_web_results: 3,
            chunk_size: 1000,
            chunk_overlap: 200,
            data_dir: PathBuf::from("data"),
            index_path: PathBuf::from("data/index.sqlite"),
            rerank_endpoint: None,
            tavily_api_key: None,
            request_timeout_secs: 60,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the YAML file and environment variables.
    ///
    /// Environment variables (each overrides the YAML value):
    /// `AGENT_MODE`, `LLM_MODEL`, `EMBEDDING_MODEL`, `EMBEDDING_PROVIDER`,
    /// `OLLAMA_BASE_URL`, `TEMPERATURE`, `MAX_TOKENS`, `RETRIEVAL_K`,
    /// `RERANK_THRESHOLD`, `RERANK_ENDPOINT`, `MAX_WEB_RESULTS`,
    /// `DATA_DIR`, `INDEX_PATH`, `TAVILY_API_KEY`, `RUST_LOG`, `NO_COLOR`.
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let config_path = config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("docpilot.yaml"));
        config.config_file = config_file;

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        config.merge_env()?;

        Ok(config)
    }

    /// Merge the YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(llm) = file.llm {
            if let Some(model) = llm.model {
                self.llm_model = model;
            }
            if let Some(base_url) = llm.base_url {
                self.ollama_base_url = base_url;
            }
            if let Some(temperature) = llm.temperature {
                self.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.max_tokens = max_tokens;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(model) = embedding.model {
                self.embedding_model = model;
            }
            if let Some(provider) = embedding.provider {
                self.embedding_provider = provider;
            }
            if let Some(base_url) = embedding.base_url {
                self.ollama_base_url = base_url;
            }
        }

        if let Some(agent) = file.agent {
            if let Some(mode) = agent.mode {
                self.mode = Mode::parse(&mode)?;
            }
            if let Some(k) = agent.retrieval_k {
                self.retrieval_k = k;
            }
            if let Some(threshold) = agent.rerank_threshold {
                self.confidence_threshold = threshold;
            }
            if let Some(endpoint) = agent.rerank_endpoint {
                self.rerank_endpoint = Some(endpoint);
            }
            if let Some(max_chars) = agent.max_context_chars {
                self.max_context_chars = max_chars;
            }
            if let Some(max_results) = agent.max_web_results {
                self.max_web_results = max_results;
            }
            if let Some(size) = agent.chunk_size {
                self.chunk_size = size;
            }
            if let Some(overlap) = agent.chunk_overlap {
                self.chunk_overlap = overlap;
            }
            if let Some(timeout) = agent.request_timeout_secs {
                self.request_timeout_secs = timeout;
            }
        }

        if let Some(data) = file.data {
            if let Some(dir) = data.dir {
                self.data_dir = PathBuf::from(dir);
            }
            if let Some(index) = data.index {
                self.index_path = PathBuf::from(index);
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Merge environment variable overrides.
    fn merge_env(&mut self) -> AppResult<()> {
        if let Ok(mode) = std::env::var("AGENT_MODE") {
            self.mode = Mode::parse(&mode)?;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm_model = model;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            self.embedding_provider = provider;
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.ollama_base_url = url;
        }
        if let Ok(temperature) = std::env::var("TEMPERATURE") {
            self.temperature = temperature.parse().map_err(|_| {
                AppError::Config(format!("Invalid TEMPERATURE value: {}", temperature))
            })?;
        }
        if let Ok(max_tokens) = std::env::var("MAX_TOKENS") {
            self.max_tokens = max_tokens.parse().map_err(|_| {
                AppError::Config(format!("Invalid MAX_TOKENS value: {}", max_tokens))
            })?;
        }
        if let Ok(k) = std::env::var("RETRIEVAL_K") {
            self.retrieval_k = k
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid RETRIEVAL_K value: {}", k)))?;
        }
        if let Ok(threshold) = std::env::var("RERANK_THRESHOLD") {
            self.confidence_threshold = threshold.parse().map_err(|_| {
                AppError::Config(format!("Invalid RERANK_THRESHOLD value: {}", threshold))
            })?;
        }
        if let Ok(endpoint) = std::env::var("RERANK_ENDPOINT") {
            self.rerank_endpoint = Some(endpoint);
        }
        if let Ok(max_results) = std::env::var("MAX_WEB_RESULTS") {
            self.max_web_results = max_results.parse().map_err(|_| {
                AppError::Config(format!("Invalid MAX_WEB_RESULTS value: {}", max_results))
            })?;
        }
        if let Ok(dir) = std::env::var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("INDEX_PATH") {
            self.index_path = PathBuf::from(path);
        }
        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            self.tavily_api_key = Some(key);
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and YAML.
    pub fn with_overrides(
        mut self,
        mode: Option<Mode>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(mode) = mode {
            self.mode = mode;
        }

        if let Some(model) = model {
            self.llm_model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate the configuration before any pipeline component runs.
    ///
    /// Non-transient problems (online mode without a web-search key,
    /// nonsensical chunking parameters) fail fast here.
    pub fn validate(&self) -> AppResult<()> {
        if self.mode == Mode::Online && self.tavily_api_key.is_none() {
            return Err(AppError::Config(
                "TAVILY_API_KEY is required for online mode".to_string(),
            ));
        }

        if self.retrieval_k == 0 {
            return Err(AppError::Config(
                "retrieval_k must be at least 1".to_string(),
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        let known_providers = ["ollama", "mock"];
        if !known_providers.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_providers.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.mode, Mode::Offline);
        assert_eq!(config.llm_model, "llama3.2:3b");
        assert_eq!(config.retrieval_k, 5);
        assert_eq!(config.confidence_threshold, 0.0);
        assert_eq!(config.max_web_results, 3);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("offline").unwrap(), Mode::Offline);
        assert_eq!(Mode::parse("ONLINE").unwrap(), Mode::Online);
        assert!(Mode::parse("hybrid").is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(Mode::Online),
            Some("llama3.1".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.mode, Mode::Online);
        assert_eq!(config.llm_model, "llama3.1");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
llm:
  model: llama3.1:8b
  temperature: 0.3
agent:
  retrieval_k: 8
  rerank_threshold: 0.5
data:
  dir: corpus
"#
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.merge_yaml(&file.path().to_path_buf()).unwrap();

        assert_eq!(config.llm_model, "llama3.1:8b");
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.retrieval_k, 8);
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.data_dir, PathBuf::from("corpus"));
    }

    #[test]
    fn test_validate_online_requires_api_key() {
        let mut config = AppConfig::default();
        config.mode = Mode::Online;
        config.tavily_api_key = None;
        assert!(config.validate().is_err());

        config.tavily_api_key = Some("tvly-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_chunk_params() {
        let mut config = AppConfig::default();
        config.chunk_size = 100;
        config.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }
}
