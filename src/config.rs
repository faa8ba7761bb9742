use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Audio
    pub default_volume: f32,
    pub max_queue_size: usize,

    // Fuentes
    pub ytdlp_path: String,
    pub resolve_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Builds a config from an arbitrary key lookup; missing optional keys
    /// fall back to [`Config::default`].
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            // Discord
            discord_token: var("DISCORD_TOKEN").context("DISCORD_TOKEN no está definido")?,
            command_prefix: var("COMMAND_PREFIX").unwrap_or(defaults.command_prefix),

            // Audio
            default_volume: match var("DEFAULT_VOLUME") {
                Some(v) => v.trim().parse().context("DEFAULT_VOLUME inválido")?,
                None => defaults.default_volume,
            },
            max_queue_size: match var("MAX_QUEUE_SIZE") {
                Some(v) => v.trim().parse().context("MAX_QUEUE_SIZE inválido")?,
                None => defaults.max_queue_size,
            },

            // Fuentes
            ytdlp_path: var("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),
            resolve_timeout: match var("RESOLVE_TIMEOUT") {
                Some(v) => humantime::parse_duration(v.trim()).context("RESOLVE_TIMEOUT inválido")?,
                None => defaults.resolve_timeout,
            },
        })
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Token and prefix must not be blank; the prefix must not contain spaces
    /// - Volume must be between 0.0 and 2.0
    /// - Queue size and resolver timeout must be greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("Discord token must not be empty");
        }

        if self.command_prefix.is_empty() || self.command_prefix.contains(char::is_whitespace) {
            anyhow::bail!("Command prefix must be non-empty and contain no spaces, got: {:?}", self.command_prefix);
        }

        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!("Default volume must be between 0.0 and 2.0, got: {}", self.default_volume);
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.resolve_timeout.is_zero() {
            anyhow::bail!("Resolve timeout must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Never includes the Discord token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Commands: prefix '{}'\n  \
            Audio: {}% vol, {} max queue\n  \
            Sources: {} (timeout {})",
            self.command_prefix,
            (self.default_volume * 100.0).round() as u32,
            self.max_queue_size,
            self.ytdlp_path,
            humantime::format_duration(self.resolve_timeout),
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (el token no tiene default)
            discord_token: String::new(),
            command_prefix: "&".to_string(),

            default_volume: 0.5,
            max_queue_size: 1000,

            ytdlp_path: "yt-dlp".to_string(),
            resolve_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|key| vars.get(key).cloned())?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults_apply_when_only_token_is_set() {
        let config = load(&[("DISCORD_TOKEN", "abc")]).unwrap();

        assert_eq!(config.command_prefix, "&");
        assert_eq!(config.max_queue_size, 1000);
        assert_eq!(config.ytdlp_path, "yt-dlp");
        assert_eq!(config.resolve_timeout, Duration::from_secs(30));
        assert_eq!(config.default_volume, 0.5);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = load(&[
            ("DISCORD_TOKEN", "abc"),
            ("COMMAND_PREFIX", "!"),
            ("MAX_QUEUE_SIZE", " 25 "),
            ("YTDLP_PATH", "/usr/local/bin/yt-dlp"),
            ("RESOLVE_TIMEOUT", "1m 30s"),
            ("DEFAULT_VOLUME", "1.2"),
        ])
        .unwrap();

        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.max_queue_size, 25);
        assert_eq!(config.ytdlp_path, "/usr/local/bin/yt-dlp");
        assert_eq!(config.resolve_timeout, Duration::from_secs(90));
        assert_eq!(config.default_volume, 1.2);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "   ")]).is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("MAX_QUEUE_SIZE", "0")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("MAX_QUEUE_SIZE", "many")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("DEFAULT_VOLUME", "3.0")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("RESOLVE_TIMEOUT", "soon")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("RESOLVE_TIMEOUT", "0s")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("COMMAND_PREFIX", "a b")]).is_err());
    }

    #[test]
    fn test_summary_hides_token() {
        let config = load(&[("DISCORD_TOKEN", "super-secret")]).unwrap();
        let summary = config.summary();

        assert!(!summary.contains("super-secret"));
        assert!(summary.contains("prefix '&'"));
        assert!(summary.contains("timeout 30s"));
        assert!(summary.contains("50% vol"));
    }
}
