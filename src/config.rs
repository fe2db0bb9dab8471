//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_SERVER__HOST, PORT, OPENAI_API_KEY, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! The `APP_` variables use a double-underscore key separator so snake_case
//! field names stay addressable (e.g. `APP_LIMITS__MAX_BODY_BYTES`).
//!
//! The inference API credential is the one setting with no usable default:
//! `validate()` fails when it is empty, which makes a missing `OPENAI_API_KEY`
//! fatal at startup before the server accepts any request.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub limits: LimitsConfig,
}

/// Server-specific configuration settings.
///
/// ## Fields:
/// - `host`: IP address or hostname to bind the server to
/// - `port`: TCP port number to listen on
/// - `static_dir`: directory holding the bundled viewer client served on non-API paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

/// External inference service configuration.
///
/// Points at any OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// ## Fields:
/// - `base_url`: service root, without the `/v1/chat/completions` suffix
/// - `api_key`: bearer credential; empty means "not configured" and fails validation
/// - `model`: chat model identifier sent with every request
/// - `image_detail`: detail hint attached to every image part ("high" per product behavior)
/// - `timeout_secs`: per-request HTTP timeout enforced by the client, not the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub image_detail: String,
    pub timeout_secs: u64,
}

/// Request size limits.
///
/// Image payloads arrive base64-encoded inside JSON bodies, so the JSON limit
/// has to be generous (50 MiB matches the original product limit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
                static_dir: "./static".to_string(),
            },
            inference: InferenceConfig {
                base_url: "https://api.openai.com".to_string(),
                api_key: String::new(),
                model: "gpt-4o".to_string(),
                image_detail: "high".to_string(),
                timeout_secs: 120,
            },
            limits: LimitsConfig {
                max_body_bytes: 50 * 1024 * 1024,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle special cases for HOST, PORT and OPENAI_API_KEY
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__HOST=127.0.0.1`: Override server host
    /// - `APP_INFERENCE__TIMEOUT_SECS=30`: Override the inference timeout
    /// - `HOST=0.0.0.0` / `PORT=3000`: deployment-platform conventions
    /// - `OPENAI_API_KEY=sk-...`: the inference credential (required)
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            // Double underscore separates key segments so snake_case field
            // names like max_body_bytes remain addressable.
            // prefix_separator would otherwise default to the key separator
            // ("__"), which would require APP__SERVER__HOST instead of the
            // documented APP_SERVER__HOST form.
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        // Deployment platforms and the original product use these bare names.
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            settings = settings.set_override("inference.api_key", key)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// An empty API credential is a configuration error: the whole service
    /// exists to relay requests to the inference endpoint, so there is no
    /// degraded mode worth starting in.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.inference.api_key.is_empty() {
            return Err(anyhow::anyhow!(
                "Inference API key is not set (set OPENAI_API_KEY or inference.api_key)"
            ));
        }

        if self.inference.model.is_empty() {
            return Err(anyhow::anyhow!("Inference model cannot be empty"));
        }

        if self.limits.max_body_bytes == 0 {
            return Err(anyhow::anyhow!("Max body size must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.inference.model, "gpt-4o");
        assert_eq!(config.inference.image_detail, "high");
        assert_eq!(config.limits.max_body_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_default_config_missing_credential_is_fatal() {
        let config = AppConfig::default();
        // No credential by default, so validation must refuse to start.
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validates_with_credential() {
        let mut config = AppConfig::default();
        config.inference.api_key = "sk-test-1234".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_port_zero() {
        let mut config = AppConfig::default();
        config.inference.api_key = "sk-test-1234".to_string();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    /// The one test that mutates process environment; keep all env reads and
    /// the cleanup inside so other tests stay parallel-safe.
    #[test]
    fn test_env_overrides_land_in_the_right_fields() {
        env::set_var("PORT", "3000");
        env::set_var("OPENAI_API_KEY", "sk-env-override");
        env::set_var("APP_INFERENCE__TIMEOUT_SECS", "7");

        let result = AppConfig::load();

        env::remove_var("PORT");
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("APP_INFERENCE__TIMEOUT_SECS");

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.inference.api_key, "sk-env-override");
        assert_eq!(config.inference.timeout_secs, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_zero_body_limit() {
        let mut config = AppConfig::default();
        config.inference.api_key = "sk-test-1234".to_string();
        config.limits.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }
}
