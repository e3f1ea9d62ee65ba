//! Application configuration.
//!
//! Loaded from `config/{env}.yaml` with env-var overrides for deployment
//! secrets. The crypto secret is a startup invariant: the token codec is
//! useless without it, so loading fails instead of degrading.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub server: ServerConfig,
    /// PostgreSQL connection URL; when absent the server runs on the
    /// in-memory store (dev mode).
    #[serde(default)]
    pub postgres_url: Option<String>,
    /// Secret signing session tokens. Usually injected via CRYPTO_SECRET.
    #[serde(default)]
    pub crypto_secret: String,
    #[serde(default)]
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub meta: MetaConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CaptchaConfig {
    pub enabled: bool,
    #[serde(default)]
    pub verify_url: String,
    /// Key the client embeds in its widget; served from /meta.
    #[serde(default)]
    pub client_key: String,
    /// Usually injected via CAPTCHA_SECRET.
    #[serde(default)]
    pub secret: String,
}

/// Server self-description served from /meta.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MetaConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AppConfig {
    /// Load `config/{env}.yaml` and apply env-var overrides.
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{env}.yaml");
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {config_path}"))?;
        let mut config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config yaml: {config_path}"))?;

        if let Ok(url) = std::env::var("POSTGRES_URL") {
            config.postgres_url = Some(url);
        }
        if let Ok(secret) = std::env::var("CRYPTO_SECRET") {
            config.crypto_secret = secret;
        }
        if let Ok(secret) = std::env::var("CAPTCHA_SECRET") {
            config.captcha.secret = secret;
        }

        if config.crypto_secret.is_empty() {
            bail!("crypto_secret is not set; provide CRYPTO_SECRET or set it in {config_path}");
        }
        if config.captcha.enabled && (config.captcha.verify_url.is_empty()
            || config.captcha.secret.is_empty())
        {
            bail!("captcha is enabled but verify_url or secret is missing");
        }

        Ok(config)
    }
}
