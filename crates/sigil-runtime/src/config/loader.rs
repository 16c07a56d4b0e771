//! Configuration loader using figment.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`sigil.{profile}.toml` / `sigil.{profile}.yaml`)
//! 3. Main config file (`sigil.toml` / `sigil.yaml`)
//! 4. Environment variables (`SIGIL_*`)
//! 5. Programmatic overrides
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML configuration files (`sigil.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`sigil.yaml`, `sigil.yml`, etc.)
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `SIGIL_` prefix with `__` as the nesting
//! separator:
//!
//! - `SIGIL_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `SIGIL_ROUTER__WORKERS=8` → `router.workers = 8`
//! - `SIGIL_INTERACTION__TTL_SECS=600` → `interaction.ttl_secs = 600`
//!
//! # Example
//!
//! ```rust,ignore
//! use sigil_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/sigil.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::SigilConfig;
use super::validation::validate_config;

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name. `prod` and `dev` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `SIGIL_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("SIGIL_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Overrides the search when set.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("sigil"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: SigilConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<SigilConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: SigilConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            prefixes = ?config.router.prefixes,
            workers = config.router.workers,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SigilConfig::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with SIGIL_ prefix");
            figment = figment.merge(
                Env::prefixed("SIGIL_")
                    .ignore(&["PROFILE"])
                    .split("__"),
            );
        }

        // Programmatic overrides win over files and the environment.
        let overrides = std::mem::take(&mut self.figment);
        Ok(figment.merge(overrides))
    }

    /// Merges a single config file, dispatching on its extension.
    ///
    /// Only extensions enabled via feature flags are accepted.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => {
                let _ = figment;
                Err(ConfigError::ParseError(format!(
                    "Unsupported or disabled configuration file format: .{ext}"
                )))
            }
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("sigil"));
        }
        paths
    }

    /// Searches `search_paths × base_names`, merging a profile-specific
    /// variant before its base file. Stops at the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["sigil.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["sigil.yaml", "sigil.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            debug!(paths = ?search_paths, "No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<SigilConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<SigilConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config, SigilConfig::default());
        assert_eq!(config.logging.level.as_str(), "info");
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .file("/nonexistent/sigil.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_programmatic_merge_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = SigilConfig::default();
        overrides.router.workers = 2;
        overrides.logging.level = LogLevel::Debug;

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(overrides)
            .load()
            .unwrap();
        assert_eq!(config.router.workers, 2);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file_and_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sigil.toml"),
            r#"
[router]
prefixes = ["?", "sigil "]
ignore_prefix_case = true
default_help = true

[interaction]
ttl_secs = 600
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("sigil.staging.toml"),
            "[router]\nworkers = 16\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .profile("staging")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.router.prefixes, vec!["?".to_string(), "sigil ".to_string()]);
        assert!(config.router.ignore_prefix_case);
        assert!(config.router.default_help);
        assert_eq!(config.router.workers, 16);
        assert_eq!(config.router.queue_capacity, 1000);
        assert_eq!(config.interaction.ttl_secs, Some(600));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[router]\nworkers = 0\n").unwrap();

        let err = ConfigLoader::new().file(&path).without_env().load().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
