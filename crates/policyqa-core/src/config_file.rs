use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ExtractionMethod;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "POLICYQA_MODEL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no Gemini API key configured: set GEMINI_API_KEY (or [api_keys] gemini_api_key in .policyqa.toml)")]
    MissingApiKey,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysConfig>,
    pub llm: Option<LlmSection>,
    pub extraction: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub method: Option<ExtractionMethod>,
    pub include_metadata: Option<bool>,
}

impl ConfigFile {
    pub fn gemini_api_key(&self) -> Option<String> {
        self.api_keys.as_ref().and_then(|a| a.gemini_api_key.clone())
    }

    pub fn model(&self) -> Option<String> {
        self.llm.as_ref().and_then(|l| l.model.clone())
    }

    pub fn base_url(&self) -> Option<String> {
        self.llm.as_ref().and_then(|l| l.base_url.clone())
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.llm.as_ref().and_then(|l| l.timeout_secs)
    }

    pub fn extraction_method(&self) -> Option<ExtractionMethod> {
        self.extraction.as_ref().and_then(|e| e.method)
    }

    pub fn include_metadata(&self) -> Option<bool> {
        self.extraction.as_ref().and_then(|e| e.include_metadata)
    }
}

/// Platform config directory path: `<config_dir>/policyqa/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("policyqa").join("config.toml"))
}

/// Load config by cascading CWD `.policyqa.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".policyqa.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api_keys: Some(ApiKeysConfig {
            gemini_api_key: overlay.gemini_api_key().or_else(|| base.gemini_api_key()),
        }),
        llm: Some(LlmSection {
            model: overlay.model().or_else(|| base.model()),
            base_url: overlay.base_url().or_else(|| base.base_url()),
            timeout_secs: overlay.timeout_secs().or_else(|| base.timeout_secs()),
        }),
        extraction: Some(ExtractionConfig {
            method: overlay
                .extraction_method()
                .or_else(|| base.extraction_method()),
            include_metadata: overlay
                .include_metadata()
                .or_else(|| base.include_metadata()),
        }),
    }
}

/// Settings for the completion service client.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Per-request timeout. `None` leaves the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl LlmConfig {
    /// Resolve settings: explicit values > environment > config file > defaults.
    pub fn resolve(
        api_key: Option<String>,
        model: Option<String>,
        file: &ConfigFile,
    ) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .or_else(|| file.gemini_api_key());
        let model = model
            .or_else(|| std::env::var(MODEL_ENV).ok())
            .or_else(|| file.model())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            api_key,
            model,
            base_url: file
                .base_url()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: file.timeout_secs().map(Duration::from_secs),
        }
    }

    /// Check the settings before any request is made. Returns the trimmed API key.
    pub fn validate(&self) -> Result<String, ConfigError> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model name is empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".into()));
        }
        Ok(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: key.map(str::to_string),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn missing_key_fails_fast() {
        assert!(matches!(
            config_with_key(None).validate(),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            config_with_key(Some("   ")).validate(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn key_is_trimmed() {
        assert_eq!(config_with_key(Some(" AIzaKey \n")).validate().unwrap(), "AIzaKey");
    }

    #[test]
    fn bad_base_url_rejected() {
        let config = LlmConfig {
            base_url: "generativelanguage.googleapis.com".into(),
            ..config_with_key(Some("k"))
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_masks_api_key() {
        let rendered = format!("{:?}", config_with_key(Some("AIzaSecret")));
        assert!(!rendered.contains("AIzaSecret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn explicit_values_win_over_file() {
        let file = ConfigFile {
            api_keys: Some(ApiKeysConfig {
                gemini_api_key: Some("from-file".into()),
            }),
            llm: Some(LlmSection {
                model: Some("gemini-file".into()),
                base_url: Some("http://localhost:8080".into()),
                timeout_secs: Some(30),
            }),
            ..Default::default()
        };
        let config = LlmConfig::resolve(Some("flag-key".into()), Some("flag-model".into()), &file);
        assert_eq!(config.api_key.as_deref(), Some("flag-key"));
        assert_eq!(config.model, "flag-model");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn toml_round_trip() {
        let toml_str = "[api_keys]\ngemini_api_key = \"abc\"\n\n[extraction]\nmethod = \"lopdf\"\ninclude_metadata = false\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.gemini_api_key().as_deref(), Some("abc"));
        assert_eq!(parsed.extraction_method(), Some(ExtractionMethod::Lopdf));
        assert_eq!(parsed.include_metadata(), Some(false));
        assert!(parsed.model().is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            llm: Some(LlmSection {
                model: Some("base-model".into()),
                timeout_secs: Some(60),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            llm: Some(LlmSection {
                model: Some("overlay-model".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        assert_eq!(merged.model().as_deref(), Some("overlay-model"));
        assert_eq!(merged.timeout_secs(), Some(60));
    }

    #[test]
    fn unparsable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(load_from_path(&path).is_none());
        assert!(load_from_path(&dir.path().join("absent.toml")).is_none());
    }
}
