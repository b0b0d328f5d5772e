//! Provider router: selects the completion provider based on config.
//!
//! Endpoint URLs and credentials come only from [`AppConfig`]; nothing here
//! reads the environment.

use crate::openai_compat::OpenAiCompatProvider;
use pagewise_config::AppConfig;
use pagewise_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Routes completion requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` table is registered, and so is the default
/// provider even when it has no table of its own.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let timeout = Duration::from_secs(config.retry.request_timeout_secs);

    let names = config
        .providers
        .keys()
        .chain(std::iter::once(&config.default_provider));
    for name in names {
        if router.get(name).is_none() {
            router.register(name.clone(), endpoint(name, config, timeout));
        }
    }

    router
}

/// One OpenAI-compatible endpoint. A provider's own key and URL win over
/// the top-level key and the well-known URL.
fn endpoint(name: &str, config: &AppConfig, timeout: Duration) -> Arc<dyn Provider> {
    let provider_config = config.providers.get(name);
    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();
    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    Arc::new(OpenAiCompatProvider::with_timeout(name, base_url, api_key, timeout))
}

/// Base URL of a well-known OpenAI-compatible service.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "mistral" => "https://api.mistral.ai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
