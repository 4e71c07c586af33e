//! Settings Models
//!
//! Application configuration stored in `~/.gem-eye/config.json`, plus the
//! environment and command-line overrides layered on top of it.

use gem_eye_core::ProxyConfig;
use gem_eye_llm::{ProviderConfig, ProviderType, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppResult;

/// Primary credential variable
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Fallback credential variable
pub const API_KEY_FALLBACK_ENV: &str = "API_KEY";
pub const MODEL_ENV: &str = "GEM_EYE_MODEL";
pub const BASE_URL_ENV: &str = "GEM_EYE_BASE_URL";
pub const PROXY_ENV: &str = "GEM_EYE_PROXY";
/// Conventional proxy variables, consulted when `GEM_EYE_PROXY` is unset
pub const HTTPS_PROXY_ENVS: [&str; 2] = ["HTTPS_PROXY", "https_proxy"];

/// Application configuration stored in config.json
///
/// The API key is deliberately absent: it only ever comes from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used for analysis
    #[serde(default = "default_model")]
    pub model: String,
    /// Override for the provider endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Upper bound on generated tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Optional outbound proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    1.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            proxy: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub proxy: Option<ProxyConfig>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(base_url) = update.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(max) = update.max_output_tokens {
            self.max_output_tokens = max;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }

        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("Invalid base_url: {}. Must be an http(s) URL", url));
            }
        }

        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than 0".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }

        Ok(())
    }

    /// Collect environment overrides into a partial update.
    ///
    /// `lookup` abstracts `std::env::var` so tests never touch the process environment.
    pub fn env_overrides<F>(lookup: F) -> AppResult<SettingsUpdate>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let raw_proxy = non_empty(PROXY_ENV)
            .or_else(|| HTTPS_PROXY_ENVS.iter().copied().find_map(|name| non_empty(name)));
        let proxy = match raw_proxy {
            Some(raw) => Some(ProxyConfig::parse(&raw)?),
            None => None,
        };

        Ok(SettingsUpdate {
            model: non_empty(MODEL_ENV),
            base_url: non_empty(BASE_URL_ENV),
            proxy,
            ..Default::default()
        })
    }

    /// Build the provider configuration for an analysis run
    pub fn provider_config(&self, api_key: Option<String>) -> ProviderConfig {
        ProviderConfig {
            provider: ProviderType::Gemini,
            api_key,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_tokens: self.max_output_tokens,
            temperature: self.temperature,
            ..Default::default()
        }
    }
}

/// Resolve the single credential: `GEMINI_API_KEY`, falling back to `API_KEY`.
pub fn resolve_api_key<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    [API_KEY_ENV, API_KEY_FALLBACK_ENV]
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
