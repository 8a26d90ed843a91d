//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`). `expand_path` handles
//! `~` and `${VAR}` in configured paths.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::types::EMBEDDING_DIM;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        // The provider key is commonly exported under its own name.
        figment = figment
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "embedding.remote.api_key".into()))
            .merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                // Hash-only vectors in production make semantic search meaningless.
                let local: bool = self.get("embedding.local.enabled").unwrap_or(false);
                let remote: Option<String> = self.get("embedding.remote.api_key").unwrap_or(None);
                if !local && remote.is_none() {
                    tracing::warn!("no embedding provider configured for production; using hash fallback only");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub store: StoreSettings,
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.embedding.dim == 0 { anyhow::bail!("embedding.dim must be positive"); }
        if self.embedding.max_chars == 0 { anyhow::bail!("embedding.max_chars must be positive"); }
        if self.search.max_limit == 0 || self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            anyhow::bail!("search.default_limit must be within [1, search.max_limit]");
        }
        for (name, t) in [("semantic_threshold", self.search.semantic_threshold), ("semantic_only_threshold", self.search.semantic_only_threshold)] {
            if !(-1.0..=1.0).contains(&t) { anyhow::bail!("search.{} must be within [-1, 1]", name); }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub dim: usize,
    /// Preprocessed text is truncated to this many characters.
    pub max_chars: usize,
    pub tier_timeout_ms: u64,
    /// LRU capacity for provider/model vectors; 0 disables the cache.
    pub cache_capacity: usize,
    pub remote: RemoteSettings,
    pub local: LocalSettings,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dim: EMBEDDING_DIM,
            max_chars: 512,
            tier_timeout_ms: 10_000,
            cache_capacity: 1024,
            remote: RemoteSettings::default(),
            local: LocalSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Absent or `"disabled"` turns the remote tier off.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "text-embedding-004".to_string(),
        }
    }
}

impl RemoteSettings {
    pub fn enabled_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty() && *k != "disabled")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSettings {
    pub enabled: bool,
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    pub model_dir: Option<String>,
    pub max_tokens: usize,
}

impl Default for LocalSettings {
    fn default() -> Self { Self { enabled: true, model_dir: None, max_tokens: 256 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexicalMode {
    Substring,
    Tantivy,
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub max_query_chars: usize,
    /// Semantic cut-off while the lexical pass also runs.
    pub semantic_threshold: f32,
    /// Semantic cut-off when semantic scoring is the only signal.
    pub semantic_only_threshold: f32,
    /// Similarity reported for lexical-only hits.
    pub text_similarity: f32,
    pub lexical: LexicalMode,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            max_query_chars: 500,
            semantic_threshold: 0.5,
            semantic_only_threshold: 0.3,
            text_similarity: 0.5,
            lexical: LexicalMode::Substring,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// JSON snapshot file; `None` keeps documents in memory only.
    pub path: Option<String>,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
