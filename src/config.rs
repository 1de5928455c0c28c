//! @ai:module:intent Configuration structs for pairwise benchmark runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, ModelConfig, JudgeConfig, DomainConfig, RunSettings, OutputConfig, ProviderKind, ModelIdentity
//! @ai:module:stateless true

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for `sleep_between_calls`
pub const MAX_SLEEP_SECONDS: f64 = 3600.0;

/// @ai:intent Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// @ai:intent Environment variable holding the API key, if the provider needs one
    /// @ai:effects pure
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// @ai:intent Stable key identifying a compared model in every statistics map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ModelIdentity {
    /// @ai:intent Alias if set, otherwise "provider/model"
    /// @ai:effects pure
    pub fn display_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!("{}/{}", self.provider, self.model),
        }
    }
}

/// @ai:intent Main configuration for a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub domain: DomainConfig,
    #[serde(default)]
    pub settings: RunSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

/// @ai:intent One of the two models under comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default = "default_model_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Overrides the provider's default API key variable
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// @ai:intent Model acting as the pairwise judge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_judge_provider")]
    pub provider: ProviderKind,
    #[serde(default = "default_judge_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Extra attempts after a reply that cannot be parsed
    #[serde(default = "default_judge_retries")]
    pub max_retries: u32,
}

/// @ai:intent Domain context shared by the models and the judge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(default = "default_domain_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: String,
    /// Role the judge is told the assistant plays
    #[serde(default = "default_role")]
    pub role: String,
}

/// @ai:intent Runtime knobs for the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Seconds to wait before each test case after the first
    #[serde(default = "default_sleep")]
    pub sleep_between_calls: f64,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Abort the whole run on the first gateway failure instead of skipping the case
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default = "default_rate_limit")]
    pub requests_per_minute: u32,
    #[serde(default = "default_gateway_retries")]
    pub gateway_retries: u32,
    #[serde(default)]
    pub dry_run: bool,
}

/// @ai:intent Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_true")]
    pub include_raw_responses: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            models: vec![
                ModelConfig::new(ProviderKind::OpenAi, "gpt-4o-mini"),
                ModelConfig::new(ProviderKind::Anthropic, "claude-3-5-haiku-latest"),
            ],
            capabilities: default_capabilities(),
            judge: JudgeConfig::default(),
            domain: DomainConfig::default(),
            settings: RunSettings::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: default_judge_provider(),
            model: default_judge_model(),
            temperature: 0.0,
            api_key_env: None,
            base_url: None,
            max_retries: default_judge_retries(),
        }
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            name: default_domain_name(),
            description: None,
            system_prompt: String::new(),
            role: default_role(),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            sleep_between_calls: default_sleep(),
            max_items: None,
            concurrency: default_concurrency(),
            fail_fast: false,
            requests_per_minute: default_rate_limit(),
            gateway_retries: default_gateway_retries(),
            dry_run: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            directory: default_output_dir(),
            include_raw_responses: true,
        }
    }
}

fn default_name() -> String {
    "pairwise benchmark".to_string()
}

fn default_capabilities() -> Vec<String> {
    vec!["chat_completion".to_string()]
}

fn default_model_temperature() -> f32 {
    0.2
}

fn default_judge_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_judge_model() -> String {
    "gpt-4o".to_string()
}

fn default_judge_retries() -> u32 {
    2
}

fn default_domain_name() -> String {
    "general".to_string()
}

fn default_role() -> String {
    "a helpful assistant".to_string()
}

fn default_sleep() -> f64 {
    0.2
}

fn default_concurrency() -> usize {
    1
}

fn default_rate_limit() -> u32 {
    60
}

fn default_gateway_retries() -> u32 {
    2
}

fn default_formats() -> Vec<String> {
    vec!["json".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./results")
}

fn default_true() -> bool {
    true
}

impl ModelConfig {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            alias: None,
            temperature: default_model_temperature(),
            max_tokens: None,
            api_key_env: None,
            base_url: None,
        }
    }

    /// @ai:intent Parse a "provider/model" CLI spec
    /// @ai:pre spec contains a '/' separating provider from model
    /// @ai:effects pure
    pub fn from_spec(spec: &str) -> Result<Self, ConfigError> {
        let (provider, model) = spec
            .split_once('/')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| ConfigError::InvalidModelSpec(spec.to_string()))?;

        let mut config = Self::new(provider.parse()?, model);
        config.alias = Some(spec.to_string());
        Ok(config)
    }

    pub fn identity(&self) -> ModelIdentity {
        ModelIdentity {
            provider: self.provider,
            model: self.model.clone(),
            alias: self.alias.clone(),
        }
    }
}

impl DomainConfig {
    /// @ai:intent Load a standalone domain TOML file (optionally nested under [domain])
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct Nested {
            domain: DomainConfig,
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_err = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };

        if content.lines().any(|line| line.trim() == "[domain]") {
            let nested: Nested = toml::from_str(&content).map_err(parse_err)?;
            Ok(nested.domain)
        } else {
            toml::from_str(&content).map_err(parse_err)
        }
    }
}

impl RunSettings {
    /// @ai:intent Delay between case starts; out-of-range values yield no delay
    /// @ai:effects pure
    pub fn sleep_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.sleep_between_calls.clamp(0.0, MAX_SLEEP_SECONDS))
            .unwrap_or_default()
    }
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Reject configurations that cannot run, before any network call
    /// @ai:effects pure
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.len() != 2 {
            return Err(ConfigError::ModelCount(self.models.len()));
        }

        let name_a = self.models[0].identity().display_name();
        let name_b = self.models[1].identity().display_name();
        if name_a == name_b {
            return Err(ConfigError::DuplicateModel(name_a));
        }

        if self.capabilities.is_empty() {
            return Err(ConfigError::NoCapabilities);
        }

        let mut seen = HashSet::new();
        for name in &self.capabilities {
            crate::capability::capability_by_name(name)?;
            let key = crate::capability::normalize_name(name);
            if !seen.insert(key.clone()) {
                return Err(ConfigError::DuplicateCapability(key));
            }
        }

        if self.settings.concurrency == 0 {
            return Err(ConfigError::InvalidSetting(
                "concurrency must be at least 1".to_string(),
            ));
        }

        if self.settings.requests_per_minute == 0 {
            return Err(ConfigError::InvalidSetting(
                "requests_per_minute must be at least 1".to_string(),
            ));
        }

        let sleep = self.settings.sleep_between_calls;
        if !sleep.is_finite() || !(0.0..=MAX_SLEEP_SECONDS).contains(&sleep) {
            return Err(ConfigError::InvalidSetting(format!(
                "sleep_between_calls must be between 0 and {} seconds, got {}",
                MAX_SLEEP_SECONDS, sleep
            )));
        }

        Ok(())
    }
}
