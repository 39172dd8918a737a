//! Pipeline configuration: defaults, optional YAML file, environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Environment variable holding the credential for this provider.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GOOGLE_API_KEY",
        }
    }
}

/// One generative model endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ProviderKind,

    pub model: String,

    /// Credential. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Override of the provider's API base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sampling temperature; omitted from the request when unset.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_model_timeout() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    2
}

impl ModelConfig {
    /// OpenAI `gpt-5-mini`, used to draft reports.
    pub fn generator_default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: "gpt-5-mini".to_string(),
            api_key: None,
            base_url: None,
            temperature: None,
            timeout_secs: default_model_timeout(),
            max_retries: default_max_retries(),
        }
    }

    /// Gemini `gemini-2.5-flash` at temperature 0, used to judge drafts.
    pub fn judge_default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            base_url: None,
            temperature: Some(0.0),
            timeout_secs: default_model_timeout(),
            max_retries: default_max_retries(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// The credential, or a config error naming the variable to set.
    pub fn require_api_key(&self) -> PipelineResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PipelineError::Config {
                message: format!(
                    "missing credential for {} model '{}' (set {})",
                    self.provider.as_str(),
                    self.model,
                    self.provider.api_key_env()
                ),
            })
    }
}

/// SEC EDGAR access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgarConfig {
    /// `Name email` sent as User-Agent; SEC rejects anonymous clients.
    #[serde(default)]
    pub identity: String,

    /// Base URL for `company_tickers.json` and filing archives.
    #[serde(default = "default_edgar_www_url")]
    pub www_url: String,

    /// Base URL for the submissions API.
    #[serde(default = "default_edgar_data_url")]
    pub data_url: String,

    #[serde(default = "default_edgar_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_edgar_www_url() -> String {
    "https://www.sec.gov".to_string()
}

fn default_edgar_data_url() -> String {
    "https://data.sec.gov".to_string()
}

fn default_edgar_timeout() -> u64 {
    60
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            www_url: default_edgar_www_url(),
            data_url: default_edgar_data_url(),
            timeout_secs: default_edgar_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Everything the controller needs, passed in at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of `{company}/{date}/{kind}_{date}.json`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory of `{company}_{form}_{date}.json` filing snapshots.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "ModelConfig::generator_default")]
    pub generator: ModelConfig,

    #[serde(default = "ModelConfig::judge_default")]
    pub judge: ModelConfig,

    #[serde(default)]
    pub edgar: EdgarConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            generator: ModelConfig::generator_default(),
            judge: ModelConfig::judge_default(),
            edgar: EdgarConfig::default(),
        }
    }
}

/// Non-empty value of an environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

impl PipelineConfig {
    /// Defaults overridden by environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `OPENAI_API_KEY` / `GOOGLE_API_KEY` | Model credentials (by provider) |
    /// | `TENQ_OUTPUT_DIR` | Report root |
    /// | `TENQ_CACHE_DIR` | Filing cache directory |
    /// | `TENQ_GENERATOR_MODEL` | Generator model id |
    /// | `TENQ_JUDGE_MODEL` | Judge model id |
    /// | `TENQ_EDGAR_IDENTITY` | EDGAR User-Agent identity |
    /// | `TENQ_HTTP_TIMEOUT` | Timeout in seconds for model requests |
    /// | `TENQ_MAX_RETRIES` | Retries for model and EDGAR requests |
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Load a YAML file, then apply environment overrides.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            message: format!("failed to read config {}: {}", path.display(), e),
        })?;
        let cfg: Self = serde_yaml::from_str(&raw).map_err(|e| PipelineError::Config {
            message: format!("failed to parse config {}: {}", path.display(), e),
        })?;
        Ok(cfg.apply_env())
    }

    pub fn apply_env(mut self) -> Self {
        if let Some(dir) = env_var("TENQ_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_var("TENQ_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(model) = env_var("TENQ_GENERATOR_MODEL") {
            self.generator.model = model;
        }
        if let Some(model) = env_var("TENQ_JUDGE_MODEL") {
            self.judge.model = model;
        }
        if let Some(identity) = env_var("TENQ_EDGAR_IDENTITY") {
            self.edgar.identity = identity;
        }
        if let Some(timeout) = env_parse::<u64>("TENQ_HTTP_TIMEOUT") {
            self.generator.timeout_secs = timeout;
            self.judge.timeout_secs = timeout;
        }
        if let Some(retries) = env_parse::<u32>("TENQ_MAX_RETRIES") {
            self.generator.max_retries = retries;
            self.judge.max_retries = retries;
            self.edgar.max_retries = retries;
        }
        for model in [&mut self.generator, &mut self.judge] {
            if model.api_key.is_none() {
                model.api_key = env_var(model.provider.api_key_env());
            }
        }
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_generator(mut self, model: ModelConfig) -> Self {
        self.generator = model;
        self
    }

    pub fn with_judge(mut self, model: ModelConfig) -> Self {
        self.judge = model;
        self
    }

    pub fn with_edgar_identity(mut self, identity: impl Into<String>) -> Self {
        self.edgar.identity = identity.into();
        self
    }

    /// Models whose credential is still missing.
    pub fn missing_credentials(&self) -> Vec<ProviderKind> {
        let mut missing = Vec::new();
        for model in [&self.generator, &self.judge] {
            if model.require_api_key().is_err() && !missing.contains(&model.provider) {
                missing.push(model.provider);
            }
        }
        missing
    }

    /// Fill the credential of every model served by `provider`.
    pub fn set_credential(&mut self, provider: ProviderKind, key: &str) {
        for model in [&mut self.generator, &mut self.judge] {
            if model.provider == provider {
                model.api_key = Some(key.to_string());
            }
        }
    }
}
