//! Configuration loading, validation, and management for Pagewise.
//!
//! Loads configuration from `~/.pagewise/config.toml` with environment
//! variable overrides. Every threshold used by extraction, context assembly,
//! and the retry controller is a tunable here rather than a constant in code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.pagewise/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per response (first attempt's response cap)
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Context budget and relevance selection
    #[serde(default)]
    pub context: ContextConfig,

    /// Page extraction batching and layout reconstruction
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Shrinking retry protocol
    #[serde(default)]
    pub retry: RetryConfig,

    /// Topic detection
    #[serde(default)]
    pub topics: TopicConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "mistral".into()
}
fn default_model() -> String {
    "mistral-small-latest".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("context", &self.context)
            .field("extraction", &self.extraction)
            .field("retry", &self.retry)
            .field("topics", &self.topics)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Context budget and relevance-selection tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Token budget for the assembled document context.
    #[serde(default = "default_context_tokens")]
    pub max_tokens: usize,

    /// Documents shorter than this (in characters) are passed through whole.
    #[serde(default = "default_small_document_chars")]
    pub small_document_chars: usize,

    /// Share of sections always included from the start of the document.
    #[serde(default = "default_intro_fraction")]
    pub intro_fraction: f32,

    /// Minimum number of intro sections.
    #[serde(default = "default_intro_min_sections")]
    pub intro_min_sections: usize,

    /// Relevant sections kept for ordinary documents.
    #[serde(default = "default_relevant_top_n")]
    pub relevant_top_n: usize,

    /// Relevant sections kept once a document has more than
    /// `large_corpus_sections` sections.
    #[serde(default = "default_relevant_top_n_large")]
    pub relevant_top_n_large: usize,

    #[serde(default = "default_large_corpus_sections")]
    pub large_corpus_sections: usize,

    /// At most this many sections are scored; the rest are skipped by stride.
    #[serde(default = "default_score_sample_cap")]
    pub score_sample_cap: usize,

    /// Sections shorter than this that start uppercase get the heading bonus.
    #[serde(default = "default_heading_max_chars")]
    pub heading_max_chars: usize,
}

fn default_context_tokens() -> usize {
    16_000
}
fn default_small_document_chars() -> usize {
    50_000
}
fn default_intro_fraction() -> f32 {
    0.05
}
fn default_intro_min_sections() -> usize {
    5
}
fn default_relevant_top_n() -> usize {
    20
}
fn default_relevant_top_n_large() -> usize {
    40
}
fn default_large_corpus_sections() -> usize {
    1000
}
fn default_score_sample_cap() -> usize {
    1000
}
fn default_heading_max_chars() -> usize {
    100
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_context_tokens(),
            small_document_chars: default_small_document_chars(),
            intro_fraction: default_intro_fraction(),
            intro_min_sections: default_intro_min_sections(),
            relevant_top_n: default_relevant_top_n(),
            relevant_top_n_large: default_relevant_top_n_large(),
            large_corpus_sections: default_large_corpus_sections(),
            score_sample_cap: default_score_sample_cap(),
            heading_max_chars: default_heading_max_chars(),
        }
    }
}

/// Page extraction tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Pages extracted concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Above this page count the batch size is halved.
    #[serde(default = "default_large_document_pages")]
    pub large_document_pages: usize,

    /// Pause between batches, in milliseconds.
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,

    /// Vertical movement beyond this starts a new line.
    #[serde(default = "default_line_epsilon")]
    pub line_epsilon: f32,

    /// Horizontal gap beyond this inserts a space between fragments.
    #[serde(default = "default_word_gap")]
    pub word_gap: f32,
}

fn default_batch_size() -> usize {
    10
}
fn default_large_document_pages() -> usize {
    100
}
fn default_batch_pause_ms() -> u64 {
    10
}
fn default_line_epsilon() -> f32 {
    2.0
}
fn default_word_gap() -> f32 {
    1.0
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            large_document_pages: default_large_document_pages(),
            batch_pause_ms: default_batch_pause_ms(),
            line_epsilon: default_line_epsilon(),
            word_gap: default_word_gap(),
        }
    }
}

/// Shrinking retry protocol tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts with full or shrunk content before the minimal-context attempt.
    #[serde(default = "default_shrink_attempts")]
    pub shrink_attempts: u32,

    /// Wait before each retry, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Content length factor applied per retry.
    #[serde(default = "default_content_shrink")]
    pub content_shrink: f32,

    /// Response token cap factor applied per retry.
    #[serde(default = "default_response_shrink")]
    pub response_shrink: f32,

    /// Characters of document content in the minimal-context attempt.
    #[serde(default = "default_minimal_context_chars")]
    pub minimal_context_chars: usize,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_shrink_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    1000
}
fn default_content_shrink() -> f32 {
    0.7
}
fn default_response_shrink() -> f32 {
    0.8
}
fn default_minimal_context_chars() -> usize {
    4000
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            shrink_attempts: default_shrink_attempts(),
            backoff_ms: default_backoff_ms(),
            content_shrink: default_content_shrink(),
            response_shrink: default_response_shrink(),
            minimal_context_chars: default_minimal_context_chars(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,

    /// Lines longer than this are never topic candidates.
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,
}

fn default_max_topics() -> usize {
    20
}
fn default_max_line_chars() -> usize {
    100
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            max_topics: default_max_topics(),
            max_line_chars: default_max_line_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.pagewise/config.toml).
    ///
    /// Also checks environment variables:
    /// - `PAGEWISE_API_KEY` replaces any configured key; `MISTRAL_API_KEY`
    ///   and `OPENAI_API_KEY` only fill a missing one
    /// - `PAGEWISE_PROVIDER`, `PAGEWISE_MODEL` replace the file's choices,
    ///   including a `[providers.<name>] default_model`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("PAGEWISE_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = lookup("MISTRAL_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("PAGEWISE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("PAGEWISE_MODEL") {
            if let Some(provider) = self.providers.get_mut(&self.default_provider) {
                provider.default_model = Some(model.clone());
            }
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".pagewise")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.context.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_tokens must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.context.intro_fraction) {
            return Err(ConfigError::ValidationError(
                "context.intro_fraction must be between 0.0 and 1.0".into(),
            ));
        }

        if self.extraction.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.batch_size must be >= 1".into(),
            ));
        }

        if self.retry.shrink_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.shrink_attempts must be >= 1".into(),
            ));
        }

        for (name, factor) in [
            ("retry.content_shrink", self.retry.content_shrink),
            ("retry.response_shrink", self.retry.response_shrink),
        ] {
            if factor <= 0.0 || factor >= 1.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be strictly between 0.0 and 1.0"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            context: ContextConfig::default(),
            extraction: ExtractionConfig::default(),
            retry: RetryConfig::default(),
            topics: TopicConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "mistral");
        assert_eq!(config.default_max_tokens, 1024);
        assert_eq!(config.context.small_document_chars, 50_000);
        assert_eq!(config.retry.shrink_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.context.max_tokens, config.context.max_tokens);
        assert_eq!(parsed.extraction.batch_size, config.extraction.batch_size);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shrink_factor_must_shrink() {
        let mut config = AppConfig::default();
        config.retry.content_shrink = 1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry.content_shrink"));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let mut config = AppConfig::default();
        config.extraction.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.default_provider, "mistral");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "open-mistral-nemo"

[context]
max_tokens = 8000

[retry]
backoff_ms = 250
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "open-mistral-nemo");
        assert_eq!(config.context.max_tokens, 8000);
        assert_eq!(config.context.intro_min_sections, 5);
        assert_eq!(config.retry.backoff_ms, 250);
        assert!((config.retry.content_shrink - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_temperature = \"hot\"").unwrap();
        match AppConfig::load_from(file.path()) {
            Err(ConfigError::ParseError { .. }) => {}
            other => panic!("Expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn env_overrides_fill_missing_key() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "MISTRAL_API_KEY" => Some("sk-mistral".into()),
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            "PAGEWISE_MODEL" => Some("mistral-large-latest".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-mistral"));
        assert_eq!(config.default_model, "mistral-large-latest");
        assert_eq!(config.default_provider, "mistral");
    }

    #[test]
    fn vendor_env_keys_do_not_replace_configured_key() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(|key| match key {
            "MISTRAL_API_KEY" | "OPENAI_API_KEY" => Some("from-env".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn pagewise_api_key_beats_configured_key() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(|key| match key {
            "PAGEWISE_API_KEY" => Some("sk-pagewise".into()),
            "MISTRAL_API_KEY" => Some("sk-mistral".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-pagewise"));
    }

    #[test]
    fn pagewise_model_beats_provider_table_model() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "mistral".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("mistral-large-latest".into()),
            },
        );
        config.apply_env_overrides(|key| match key {
            "PAGEWISE_MODEL" => Some("open-mistral-nemo".into()),
            _ => None,
        });
        assert_eq!(config.default_model, "open-mistral-nemo");
        assert_eq!(
            config.providers["mistral"].default_model.as_deref(),
            Some("open-mistral-nemo")
        );
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("mistral-small-latest"));
        assert!(toml_str.contains("[retry]"));
    }
}
