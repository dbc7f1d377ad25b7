use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::utils::i18n::{DEFAULT_LOCALE, is_well_formed_language_code, normalize_language_code};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub language: LanguageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Language filter settings (loaded from the `[language]` section)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Accepted language codes; unset means every locale the i18n system ships
    pub available: Option<Vec<String>>,
    /// Default language; unset means the i18n system's default locale
    pub default_locale: Option<String>,
    /// Whether generated URLs carry a segment for the default language (default: true)
    pub include_default_language: bool,
    /// How language codes are matched (default: relaxed)
    pub matching: MatchingMode,
    /// Whether the `language` option is removed before generation continues (default: true)
    pub strip_language_param: bool,
}

/// Language code matching strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingMode {
    /// Only the configured codes, literally
    Strict,
    /// Configured codes plus any two-letter region variant (`en` also matches `en-RU`)
    #[default]
    Relaxed,
}

impl FromStr for MatchingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(format!("unsupported matching mode: {}", other)),
        }
    }
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or from config.toml in the usual places
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(path: Option<&str>) -> Result<Self, anyhow::Error> {
        // 1. Load from config file
        let mut config = match path.map(str::to_string).or_else(Self::find_config_file) {
            Some(config_path) => Self::from_toml(&config_path)?,
            None => {
                tracing::warn!("Configuration file not found, using defaults");
                Config::default()
            },
        };

        // 2. Override with environment variables
        config.apply_env_overrides();

        // 3. Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST: Server host (default: 0.0.0.0)
    /// - APP_SERVER_PORT: Server port (default: 8080)
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,routing_filter=debug")
    /// - APP_LANGUAGES: Comma-separated language codes (e.g., "en,de,fr")
    /// - APP_DEFAULT_LOCALE: Default language code
    /// - APP_INCLUDE_DEFAULT_LANGUAGE: Prefix default-language URLs too (true/false)
    /// - APP_LANGUAGE_MATCHING: "strict" or "relaxed"
    /// - APP_STRIP_LANGUAGE_PARAM: Remove the language option before generation (true/false)
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Some(port) = var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Some(level) = var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Some(languages) = var("APP_LANGUAGES") {
            let languages: Vec<String> = languages
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect();
            tracing::info!("Override language.available from env: {:?}", languages);
            self.language.available = Some(languages);
        }

        if let Some(locale) = var("APP_DEFAULT_LOCALE") {
            tracing::info!("Override language.default_locale from env: {}", locale);
            self.language.default_locale = Some(locale);
        }

        if let Some(include) = var("APP_INCLUDE_DEFAULT_LANGUAGE")
            && let Ok(include) = include.parse()
        {
            self.language.include_default_language = include;
            tracing::info!(
                "Override language.include_default_language from env: {}",
                self.language.include_default_language
            );
        }

        if let Some(matching) = var("APP_LANGUAGE_MATCHING") {
            match matching.parse::<MatchingMode>() {
                Ok(mode) => {
                    self.language.matching = mode;
                    tracing::info!("Override language.matching from env: {:?}", mode);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_LANGUAGE_MATCHING '{}': {} (keep {:?})",
                    matching,
                    e,
                    self.language.matching
                ),
            }
        }

        if let Some(strip) = var("APP_STRIP_LANGUAGE_PARAM")
            && let Ok(strip) = strip.parse()
        {
            self.language.strip_language_param = strip;
            tracing::info!(
                "Override language.strip_language_param from env: {}",
                self.language.strip_language_param
            );
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if let Some(available) = &self.language.available {
            if available.is_empty() {
                anyhow::bail!("language.available cannot be empty");
            }
            for code in available {
                if !is_well_formed_language_code(&normalize_language_code(code)) {
                    anyhow::bail!("language.available contains invalid code '{}'", code);
                }
            }
        }

        let default_locale =
            normalize_language_code(self.language.default_locale.as_deref().unwrap_or(DEFAULT_LOCALE));
        if !is_well_formed_language_code(&default_locale) {
            anyhow::bail!("language.default_locale '{}' is not a language code", default_locale);
        }

        // Without an explicit list the filter accepts every locale the i18n system ships
        let available: Vec<String> = match &self.language.available {
            Some(available) => available.clone(),
            None => rust_i18n::available_locales!().into_iter().map(|l| l.to_string()).collect(),
        };
        if !available.iter().any(|code| normalize_language_code(code) == default_locale) {
            anyhow::bail!(
                "default locale '{}' is not one of the available languages {:?}",
                default_locale,
                available
            );
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,routing_filter=debug".to_string(), file: None }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            available: None,
            default_locale: None,
            include_default_language: true,
            matching: MatchingMode::Relaxed,
            strip_language_param: true,
        }
    }
}
