//! Configuration management for Antelito
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{AntelitoError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Antelito
///
/// This structure holds everything the application needs: the model
/// provider settings, the document library sources, and chat behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Document library configuration
    #[serde(default)]
    pub library: LibraryConfig,
    /// Chat behavior configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Optional API base URL override (useful for tests and local mocks)
    ///
    /// When set, this base is used to build the streaming endpoint, which
    /// allows tests to point the provider at a mock server.
    #[serde(default)]
    pub api_base: Option<String>,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_base: None,
        }
    }
}

/// Document library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// URL of the global document catalog
    #[serde(default)]
    pub catalog_url: Option<String>,

    /// Override for the library database directory
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

/// Chat behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Environment variable holding the admin password
    #[serde(default = "default_admin_password_env")]
    pub admin_password_env: String,
}

fn default_admin_password_env() -> String {
    "ANTELITO_ADMIN_PASSWORD".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            admin_password_env: default_admin_password_env(),
        }
    }
}

impl Config {
    /// Loads configuration from file, environment, and CLI overrides
    ///
    /// Precedence is CLI over environment over file over defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AntelitoError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AntelitoError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(model) = std::env::var("ANTELITO_MODEL") {
            self.provider.model = model;
        }

        if let Ok(api_base) = std::env::var("ANTELITO_API_BASE") {
            self.provider.api_base = Some(api_base);
        }

        if let Ok(catalog_url) = std::env::var("ANTELITO_CATALOG_URL") {
            self.library.catalog_url = Some(catalog_url);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(ref model) = cli.model {
            self.provider.model = model.clone();
        }

        if let Some(ref catalog_url) = cli.catalog_url {
            self.library.catalog_url = Some(catalog_url.clone());
        }

        if let Some(ref storage_path) = cli.storage_path {
            self.library.storage_path = Some(storage_path.clone());
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is out of range or malformed.
    pub fn validate(&self) -> Result<()> {
        if self.provider.model.is_empty() {
            return Err(AntelitoError::Config("Model cannot be empty".to_string()).into());
        }

        if self.provider.api_key_env.is_empty() {
            return Err(AntelitoError::Config("api_key_env cannot be empty".to_string()).into());
        }

        if let Some(ref url) = self.library.catalog_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AntelitoError::Config(format!(
                    "Invalid catalog_url: {}. Must start with http:// or https://",
                    url
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Reads the API key from the configured environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or empty.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.provider.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(AntelitoError::Config(format!(
                "API key not found: set the {} environment variable",
                self.provider.api_key_env
            ))
            .into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            library: LibraryConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}
