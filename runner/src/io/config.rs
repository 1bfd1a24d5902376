//! Runner configuration stored in `plan-runner.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::completion::{DEFAULT_MIN_CHUNK_CHARS, DEFAULT_SENTINEL};

/// Default config file name, resolved relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "plan-runner.toml";

/// Runner configuration (TOML).
///
/// Every field has a default, so a missing file or a partial file is valid.
/// Scalar knobs can also be overridden per invocation (see [`ConfigOverrides`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Plan document, appended to on every iteration.
    pub document_path: PathBuf,

    /// Chunk written when the document is empty.
    pub title: String,

    /// Case-insensitive marker that ends the loop.
    pub sentinel: String,

    /// Chunks shorter than this many characters end the loop.
    pub min_chunk_chars: usize,

    /// Directory for one-shot `reportN.md` files.
    pub report_dir: PathBuf,

    pub agent: AgentConfig,
    pub model: ModelConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Model calls allowed per loop iteration.
    pub max_steps: u32,

    /// Model calls allowed for a one-shot report.
    pub report_max_steps: u32,

    /// Feed malformed replies back to the model instead of failing.
    pub handle_parsing_errors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f32,

    /// OpenAI-compatible API root (without `/chat/completions`).
    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned per `InternetSearch` call.
    pub max_results: u32,

    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    pub timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from("micro_saas_plan.md"),
            title: "# Micro-SaaS Business Plan\n\n".to_string(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS,
            report_dir: PathBuf::from("."),
            agent: AgentConfig::default(),
            model: ModelConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 5,
            report_max_steps: 10,
            handle_parsing_errors: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "llama3-70b-8192".to_string(),
            temperature: 0.7,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            base_url: "https://api.tavily.com".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.document_path.as_os_str().is_empty() {
            return Err(anyhow!("document_path must not be empty"));
        }
        if self.sentinel.trim().is_empty() {
            return Err(anyhow!("sentinel must not be blank"));
        }
        if self.agent.max_steps == 0 {
            return Err(anyhow!("agent.max_steps must be > 0"));
        }
        if self.agent.report_max_steps == 0 {
            return Err(anyhow!("agent.report_max_steps must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(anyhow!(
                "model.temperature must be within 0.0..=2.0 (got {})",
                self.model.temperature
            ));
        }
        if self.model.name.trim().is_empty() {
            return Err(anyhow!("model.name must not be blank"));
        }
        if self.search.max_results == 0 {
            return Err(anyhow!("search.max_results must be > 0"));
        }
        if self.model.timeout_secs == 0 || self.search.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Apply per-invocation overrides, then re-validate.
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(model) = &overrides.model {
            self.model.name = model.clone();
        }
        if let Some(temperature) = overrides.temperature {
            self.model.temperature = temperature;
        }
        if let Some(max_steps) = overrides.max_steps {
            self.agent.max_steps = max_steps;
        }
        if let Some(max_results) = overrides.search_results {
            self.search.max_results = max_results;
        }
        if let Some(document) = &overrides.document {
            self.document_path = document.clone();
        }
        self.validate()?;
        Ok(self)
    }
}

/// Scalar overrides collected from CLI flags or environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_steps: Option<u32>,
    pub search_results: Option<u32>,
    pub document: Option<PathBuf>,
}

/// Read an API key from the environment variable `name`.
pub fn api_key_from_env(name: &str) -> Result<String> {
    let key = std::env::var(name).with_context(|| format!("read API key from ${name}"))?;
    if key.trim().is_empty() {
        return Err(anyhow!("${name} is set but empty"));
    }
    Ok(key)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RunnerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
