//! Configuration loading, validation, and management for Tierline.
//!
//! Loads configuration from `~/.tierline/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tierline_core::agent::AgentProfile;
use tierline_core::escalation::HumanAgent;
use tierline_core::tool::ToolTrigger;

/// The root configuration structure.
///
/// Maps directly to `~/.tierline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM completion settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Retrieval and fallback thresholds
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Working conversation window
    #[serde(default)]
    pub context: ContextConfig,

    /// Escalation SLA settings
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Durable transcript storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Indexed knowledge source
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Deployed agents
    #[serde(default)]
    pub agents: Vec<AgentProfile>,

    /// Human support roster
    #[serde(default)]
    pub human_agents: Vec<HumanAgent>,

    /// Keyword trigger table override (order is significant)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_triggers: Vec<ToolTrigger>,

    /// Industry guideline overrides (industry key → guideline text)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub industry_guidelines: HashMap<String, String>,
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
            .field("llm", &self.llm)
            .field("retrieval", &self.retrieval)
            .field("context", &self.context)
            .field("escalation", &self.escalation)
            .field("gateway", &self.gateway)
            .field("storage", &self.storage)
            .field("knowledge", &self.knowledge)
            .field("agents", &self.agents.len())
            .field("human_agents", &self.human_agents.len())
            .field("tool_triggers", &self.tool_triggers.len())
            .field("industry_guidelines", &self.industry_guidelines.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name, for logs
    #[serde(default = "default_provider")]
    pub provider: String,

    /// OpenAI-compatible base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on a single completion call
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Below this mean similarity the live fetch is consulted
    #[serde(default = "default_fallback_trigger")]
    pub fallback_trigger: f32,

    /// Effective score floor once the live fetch returned content
    #[serde(default = "default_fallback_floor")]
    pub fallback_floor: f32,

    #[serde(default = "default_max_urls")]
    pub max_urls: usize,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,
}

fn default_limit() -> usize {
    5
}
fn default_similarity_threshold() -> f32 {
    0.3
}
fn default_fallback_trigger() -> f32 {
    0.5
}
fn default_fallback_floor() -> f32 {
    0.5
}
fn default_max_urls() -> usize {
    2
}
fn default_fetch_timeout_ms() -> u64 {
    2_000
}
fn default_max_snippets() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            similarity_threshold: default_similarity_threshold(),
            fallback_trigger: default_fallback_trigger(),
            fallback_floor: default_fallback_floor(),
            max_urls: default_max_urls(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_snippets: default_max_snippets(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Messages kept in the per-session working window
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_window_size() -> usize {
    6
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

/// Response-time SLA per priority, in hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default = "default_sla_urgent")]
    pub sla_urgent_hours: u32,
    #[serde(default = "default_sla_high")]
    pub sla_high_hours: u32,
    #[serde(default = "default_sla_medium")]
    pub sla_medium_hours: u32,
    #[serde(default = "default_sla_low")]
    pub sla_low_hours: u32,
}

fn default_sla_urgent() -> u32 {
    1
}
fn default_sla_high() -> u32 {
    4
}
fn default_sla_medium() -> u32 {
    24
}
fn default_sla_low() -> u32 {
    72
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            sla_urgent_hours: default_sla_urgent(),
            sla_high_hours: default_sla_high(),
            sla_medium_hours: default_sla_medium(),
            sla_low_hours: default_sla_low(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "sqlite" or "in_memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// SQLite file path; defaults to `~/.tierline/transcripts.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_storage_backend() -> String {
    "sqlite".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// JSON file with indexed documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_file: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.tierline/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TIERLINE_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `TIERLINE_MODEL` overrides `llm.model`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("TIERLINE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("TIERLINE_MODEL") {
            config.llm.model = model;
        }

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

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tierline")
    }

    /// Default SQLite transcript location.
    pub fn transcript_path(&self) -> PathBuf {
        self.storage
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("transcripts.db"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.context.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "context.window_size must be at least 1".into(),
            ));
        }

        let r = &self.retrieval;
        for (name, value) in [
            ("similarity_threshold", r.similarity_threshold),
            ("fallback_trigger", r.fallback_trigger),
            ("fallback_floor", r.fallback_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "retrieval.{name} must be within [0, 1]"
                )));
            }
        }

        if r.limit == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.limit must be at least 1".into(),
            ));
        }

        if !matches!(self.storage.backend.as_str(), "sqlite" | "in_memory") {
            return Err(ConfigError::ValidationError(format!(
                "storage.backend must be \"sqlite\" or \"in_memory\", got \"{}\"",
                self.storage.backend
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for agent in &self.agents {
            if !seen.insert((&agent.id, &agent.company_id)) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate agent '{}' for company '{}'",
                    agent.id, agent.company_id
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            context: ContextConfig::default(),
            escalation: EscalationConfig::default(),
            gateway: GatewayConfig::default(),
            storage: StorageConfig::default(),
            knowledge: KnowledgeConfig::default(),
            agents: vec![],
            human_agents: vec![],
            tool_triggers: vec![],
            industry_guidelines: HashMap::new(),
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
