use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const PFP_ASPECT_RATIO: &str = "1:1";
pub const DEFAULT_MINT_DELAY: Duration = Duration::from_millis(2000);

const API_KEY_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Clone, PartialEq, Eq)]
pub struct ForgeConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_model: String,
    pub text_model: String,
    pub mint_delay: Duration,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            mint_delay: DEFAULT_MINT_DELAY,
        }
    }
}

impl ForgeConfig {
    /// Reads the process environment once. A missing credential is not an
    /// error here; generation calls degrade instead.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            api_key: API_KEY_VARS.iter().find_map(|key| non_empty(*key)),
            ..Self::default()
        };
        if let Some(base) = non_empty("GEMINI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty("PFP_FORGE_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(model) = non_empty("PFP_FORGE_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(raw) = non_empty("PFP_FORGE_MINT_DELAY_MS") {
            let millis: u64 = raw
                .parse()
                .with_context(|| format!("PFP_FORGE_MINT_DELAY_MS is not a number: {raw}"))?;
            config.mint_delay = Duration::from_millis(millis);
        }
        Ok(config)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for ForgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForgeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .field("mint_delay", &self.mint_delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{ForgeConfig, DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_MINT_DELAY};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults_without_credential() -> anyhow::Result<()> {
        let config = ForgeConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config, ForgeConfig::default());
        assert!(!config.has_credential());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.mint_delay, DEFAULT_MINT_DELAY);
        Ok(())
    }

    #[test]
    fn api_key_precedence_skips_blank_values() -> anyhow::Result<()> {
        let config = ForgeConfig::from_lookup(lookup(&[
            ("API_KEY", "   "),
            ("GEMINI_API_KEY", "gemini-key"),
            ("GOOGLE_API_KEY", "google-key"),
        ]))?;
        assert_eq!(config.api_key.as_deref(), Some("gemini-key"));

        let config = ForgeConfig::from_lookup(lookup(&[
            ("API_KEY", "primary"),
            ("GOOGLE_API_KEY", "google-key"),
        ]))?;
        assert_eq!(config.api_key.as_deref(), Some("primary"));
        Ok(())
    }

    #[test]
    fn overrides_apply_and_trim() -> anyhow::Result<()> {
        let config = ForgeConfig::from_lookup(lookup(&[
            ("GEMINI_API_BASE", "http://localhost:9000/v1beta/"),
            ("PFP_FORGE_IMAGE_MODEL", " imagen-test "),
            ("PFP_FORGE_TEXT_MODEL", "text-test"),
            ("PFP_FORGE_MINT_DELAY_MS", "15"),
        ]))?;
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
        assert_eq!(config.image_model, "imagen-test");
        assert_eq!(config.text_model, "text-test");
        assert_eq!(config.mint_delay, Duration::from_millis(15));
        Ok(())
    }

    #[test]
    fn invalid_mint_delay_is_reported() {
        let err = ForgeConfig::from_lookup(lookup(&[("PFP_FORGE_MINT_DELAY_MS", "soon")]))
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.contains("PFP_FORGE_MINT_DELAY_MS"));
    }

    #[test]
    fn debug_output_redacts_credential() {
        let config = ForgeConfig {
            api_key: Some("secret-value".to_string()),
            ..ForgeConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
