use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gate::types::{Rating, ThresholdSet};

pub const MENTIONS_THRESHOLD_ENV: &str = "RESPONSE_RATING_THRESHOLD_MENTIONS";
pub const FOLLOWERS_THRESHOLD_ENV: &str = "RESPONSE_RATING_THRESHOLD_FOLLOWERS";
pub const MEME_THRESHOLD_ENV: &str = "MEME_RATING_THRESHOLD";

const SCHEMA_FILE_NAME: &str = "echos.schema.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gate: GateRuntimeConfig,
    #[serde(default)]
    pub pipeline: PipelineRuntimeConfig,
    #[serde(default)]
    pub interaction_log: InteractionLogConfig,
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/echos")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_enabled_true() -> bool {
    true
}

fn default_rating_timeout_ms() -> u64 {
    30_000
}

fn default_interaction_log_state_path() -> PathBuf {
    PathBuf::from("./state/interactions.json")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
    /// Also mirror `gate` decisions at INFO to stderr.
    #[serde(default)]
    pub stderr_decisions: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
            stderr_decisions: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateRuntimeConfig {
    #[serde(default)]
    pub thresholds: ThresholdSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRuntimeConfig {
    #[serde(default = "default_rating_timeout_ms")]
    pub rating_timeout_ms: u64,
    /// Chance that a text response goes out as a quote tweet.
    #[serde(default)]
    pub quote_tweet_probability: f64,
    /// Per-author chance of replying to a followed account; absent authors
    /// are always considered.
    #[serde(default)]
    pub follower_reply_probabilities: BTreeMap<String, f64>,
    /// Agent's Twitter handle, used to tell explicit mentions from reply
    /// prefixes. Mention filtering is off when unset.
    #[serde(default)]
    pub agent_handle: Option<String>,
}

impl PipelineRuntimeConfig {
    pub fn rating_timeout(&self) -> Duration {
        Duration::from_millis(self.rating_timeout_ms.max(1))
    }

    pub fn reply_probability(&self, author: &str) -> f64 {
        self.follower_reply_probabilities
            .get(author)
            .copied()
            .unwrap_or(1.0)
    }
}

impl Default for PipelineRuntimeConfig {
    fn default() -> Self {
        Self {
            rating_timeout_ms: default_rating_timeout_ms(),
            quote_tweet_probability: 0.0,
            follower_reply_probabilities: BTreeMap::new(),
            agent_handle: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionLogConfig {
    #[serde(default = "default_interaction_log_state_path")]
    pub state_path: PathBuf,
}

impl Default for InteractionLogConfig {
    fn default() -> Self {
        Self {
            state_path: default_interaction_log_state_path(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// Loads the config file, then applies threshold overrides from `env`.
    pub fn load_with_env<F>(config_path: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize echos config")?;

        config.gate.thresholds = apply_threshold_overrides(config.gate.thresholds, env)?;
        config.pipeline.validate()?;

        if !config.interaction_log.state_path.is_absolute() {
            config.interaction_log.state_path = config_base.join(&config.interaction_log.state_path);
        }

        Ok(config)
    }
}

impl PipelineRuntimeConfig {
    fn validate(&self) -> Result<()> {
        if self.rating_timeout_ms == 0 {
            return Err(anyhow!("pipeline.rating_timeout_ms must be positive"));
        }
        check_probability("pipeline.quote_tweet_probability", self.quote_tweet_probability)?;
        for (author, probability) in &self.follower_reply_probabilities {
            check_probability(
                &format!("pipeline.follower_reply_probabilities.{author}"),
                *probability,
            )?;
        }
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{name} must be within [0, 1], got {value}"));
    }
    Ok(())
}

pub fn apply_threshold_overrides<F>(base: ThresholdSet, env: F) -> Result<ThresholdSet>
where
    F: Fn(&str) -> Option<String>,
{
    let mentions = threshold_override(&env, MENTIONS_THRESHOLD_ENV, base.mentions)?;
    let followers = threshold_override(&env, FOLLOWERS_THRESHOLD_ENV, base.followers)?;
    let meme = threshold_override(&env, MEME_THRESHOLD_ENV, base.meme)?;

    Ok(ThresholdSet::new(mentions, followers, meme)?)
}

fn threshold_override<F>(env: &F, key: &str, fallback: Rating) -> Result<u8>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = env(key) else {
        return Ok(fallback.value());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(fallback.value());
    }
    let value: u8 = trimmed
        .parse()
        .map_err(|_| anyhow!("{key} must be an integer in 0..=10, got '{raw}'"))?;
    Rating::new(value).map_err(|_| anyhow!("{key} must be an integer in 0..=10, got {value}"))?;
    Ok(value)
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let local_default = config_base.join(SCHEMA_FILE_NAME);
    if local_default.exists() {
        return Ok(local_default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or {SCHEMA_FILE_NAME} next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
