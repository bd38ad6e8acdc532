//! Portal configuration.
//!
//! Precedence: built-in defaults < TOML file (`ADR_PORTAL_CONFIG`, default `config/portal`)
//! < environment (`ADR_PORTAL_PORT`, `ADR_PORTAL_SEED__ENABLED`, `ADR_PORTAL_AI__MODEL`, ...).
//!
//! The completion-service key is a secret and is only ever read from the environment:
//! `OPENROUTER_API_KEY`, falling back to `ADR_PORTAL_AI_API_KEY`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "config/portal";
const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub host: String,
    pub port: u16,
    /// `GET /api/calendar/upcoming` page size when `limit` is absent.
    pub upcoming_default_limit: usize,
    /// How many upcoming deadlines the chat router quotes.
    pub deadline_preview: usize,
    pub seed: SeedConfig,
    pub ai: AiSettings,
    #[serde(skip)]
    pub ai_api_key: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upcoming_default_limit: 10,
            deadline_preview: 3,
            seed: SeedConfig::default(),
            ai: AiSettings::default(),
            ai_api_key: None,
        }
    }
}

/// Default deadlines inserted at startup. Illustrative, not regulatory rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    /// Day of the first month after the current quarter.
    pub quarterly_day: u32,
    /// Day of next month.
    pub psur_day: u32,
    /// Day of the current month (next month once passed).
    pub webinar_day: u32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quarterly_day: 15,
            psur_day: 10,
            webinar_day: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// OpenAI-compatible base URL; `/chat/completions` is appended.
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Most recent history turns forwarded with each question.
    pub max_history_turns: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_base: OPENROUTER_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            max_history_turns: 20,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl PortalConfig {
    /// Load from `ADR_PORTAL_CONFIG` (or `config/portal.toml` when present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ADR_PORTAL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = Self::load_from(Some(Path::new(&path)))?;
        cfg.ai_api_key = api_key_from_env();
        Ok(cfg)
    }

    /// Load from an explicit file (skipped if it does not exist) plus `ADR_PORTAL_*` variables.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(p) = path {
            builder = builder.add_source(config::File::from(p).required(false));
        }
        let built = builder
            .add_source(
                config::Environment::with_prefix("ADR_PORTAL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: PortalConfig = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, day) in [
            ("seed.quarterly_day", self.seed.quarterly_day),
            ("seed.psur_day", self.seed.psur_day),
            ("seed.webinar_day", self.seed.webinar_day),
        ] {
            if !(1..=28).contains(&day) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("{} is outside 1..=28", day),
                });
            }
        }
        if self.ai.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "ai.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into().trim().to_string();
        self.ai_api_key = (!key.is_empty()).then_some(key);
        self
    }
}

fn api_key_from_env() -> Option<String> {
    ["OPENROUTER_API_KEY", "ADR_PORTAL_AI_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
