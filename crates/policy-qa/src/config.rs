//! Configuration for the policy QA system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::AnswerStrategy;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "POLICY_QA_CONFIG";

/// Values shipped in example `.env` files that mean "not configured"
const PLACEHOLDER_VALUES: &[&str] = &[
    "your_gemini_api_key_here",
    "your_pinecone_api_key_here",
    "your_pinecone_index_name_here",
    "your_pinecone_environment_here",
    "demo-key",
];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Document download configuration
    pub fetch: FetchConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Generative model configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Hosted vector index configuration
    pub vector_index: VectorIndexConfig,
    /// Orchestration configuration
    pub pipeline: PipelineConfig,
    /// Report output configuration
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration: defaults, then the TOML file (explicit path or
    /// `POLICY_QA_CONFIG`), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.llm.model = model;
        }
        if let Some(tokens) = get("GEMINI_MAX_TOKENS") {
            self.llm.max_output_tokens = parse_value("GEMINI_MAX_TOKENS", &tokens)?;
        }
        if let Some(temperature) = get("GEMINI_TEMPERATURE") {
            self.llm.temperature = parse_value("GEMINI_TEMPERATURE", &temperature)?;
        }
        if let Some(model) = get("EMBEDDING_MODEL") {
            self.embeddings.model = model;
        }
        if let Some(key) = get("PINECONE_API_KEY") {
            self.vector_index.api_key = Some(key);
        }
        if let Some(environment) = get("PINECONE_ENVIRONMENT") {
            self.vector_index.environment = Some(environment);
        }
        if let Some(index) = get("PINECONE_INDEX_NAME") {
            self.vector_index.index_name = Some(index);
        }
        if let Some(host) = get("PINECONE_HOST") {
            self.vector_index.host = Some(host);
        }
        if let Some(port) = get("PORT") {
            self.server.port = parse_value("PORT", &port)?;
        }
        if let Some(strategy) = get("POLICY_QA_STRATEGY") {
            self.pipeline.strategy = AnswerStrategy::from_str(&strategy)?;
        }

        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", key, value, e)))
}

/// True when a credential is missing or still holds a template placeholder
pub fn is_placeholder(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => true,
        Some(v) => PLACEHOLDER_VALUES.contains(&v),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Document download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for remote downloads in seconds
    pub timeout_secs: u64,
    /// Largest accepted document in bytes
    pub max_document_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_document_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub max_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 600,
        }
    }
}

/// Gemini configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; absent or placeholder selects the mock model
    pub api_key: Option<String>,
    /// Generative Language API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Wait before the single retry after a quota error
    pub quota_cooldown_secs: u64,
    /// Calls allowed before the throttle pauses
    pub max_calls_per_window: u32,
    /// Length of the throttle pause in seconds
    pub window_cooldown_secs: u64,
    /// Characters of document text sent in direct-context prompts
    pub max_context_chars: usize,
    /// Ask for a JSON object with answer and confidence
    pub structured_output: bool,
}

impl LlmConfig {
    /// Whether real Gemini credentials are present
    pub fn is_configured(&self) -> bool {
        !is_placeholder(self.api_key.as_deref())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            temperature: 0.1,
            top_p: 0.9,
            max_output_tokens: 1500,
            timeout_secs: 120,
            quota_cooldown_secs: 60,
            max_calls_per_window: 8,
            window_cooldown_secs: 60,
            max_context_chars: 20_000,
            structured_output: false,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions; must match the vector index
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
            dimensions: 768,
            batch_size: 100,
        }
    }
}

/// Pinecone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    /// API key; absent or placeholder selects the in-memory index
    pub api_key: Option<String>,
    /// Legacy environment name, reported in diagnostics only
    pub environment: Option<String>,
    /// Index name
    pub index_name: Option<String>,
    /// Data-plane host; resolved through the control plane when unset
    pub host: Option<String>,
    /// Control-plane base URL
    pub control_plane_url: String,
    /// Namespace for all vectors
    pub namespace: Option<String>,
    /// Vectors per upsert request
    pub batch_size: usize,
    /// Matches retrieved per question
    pub top_k: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl VectorIndexConfig {
    /// Whether real Pinecone credentials are present
    pub fn is_configured(&self) -> bool {
        !is_placeholder(self.api_key.as_deref()) && !is_placeholder(self.index_name.as_deref())
    }
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            environment: None,
            index_name: None,
            host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            namespace: None,
            batch_size: 100,
            top_k: 3,
            timeout_secs: 30,
        }
    }
}

/// Orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Strategy used when a request does not name one
    pub strategy: AnswerStrategy,
    /// Pause between questions that call a hosted model, in milliseconds
    pub question_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: AnswerStrategy::RuleBased,
            question_delay_ms: 1000,
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write analysis reports for server requests
    pub save_reports: bool,
    /// Directory receiving report files
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_reports: false,
            output_dir: PathBuf::from("."),
        }
    }
}
