use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Top-level config (herald.toml + HERALD_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            discord: DiscordConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Browser origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Falls back to the DISCORD_BOT_TOKEN env var when empty.
    #[serde(default)]
    pub bot_token: String,
}

impl DiscordConfig {
    /// Token from config, or the DISCORD_BOT_TOKEN env var.
    pub fn resolve_token(&self) -> Option<String> {
        if !self.bot_token.trim().is_empty() {
            return Some(self.bot_token.trim().to_string());
        }
        std::env::var("DISCORD_BOT_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_cors_origins() -> Vec<String> {
    // The dev origins the browser frontend is served from.
    [
        "http://localhost:3000",
        "http://localhost:3001",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:3001",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Config could not be read or parsed.
#[derive(Debug, thiserror::Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(String);

impl HeraldConfig {
    /// Load config from a TOML file with HERALD_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.herald/herald.toml
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HERALD_").split("_"))
            .extract()
            .map_err(|e| ConfigError(e.to_string()))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.herald/herald.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_dev_frontend_origins() {
        let config = HeraldConfig::default();
        assert_eq!(config.gateway.port, DEFAULT_PORT);
        assert_eq!(config.gateway.bind, DEFAULT_BIND);
        assert!(config
            .gateway
            .cors_origins
            .iter()
            .any(|o| o == "http://localhost:3000"));
    }

    #[test]
    fn configured_token_wins_over_env() {
        let config = DiscordConfig {
            bot_token: "  token-from-file  ".to_string(),
        };
        assert_eq!(config.resolve_token().as_deref(), Some("token-from-file"));
    }
}
