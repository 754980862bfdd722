//! Configuration management for issuedeck.
//!
//! This module handles loading, saving, and managing user configuration,
//! including tracker profiles and application settings. Configuration
//! lives in a TOML file under the platform config directory.

mod profile;
mod settings;

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use profile::Profile;
pub use settings::Settings;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not determine the platform config directory.
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// Could not create the config directory.
    #[error("Could not create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    /// Could not read the config file.
    #[error("Could not read configuration file: {0}")]
    ReadError(std::io::Error),

    /// Could not write the config file.
    #[error("Could not write configuration file: {0}")]
    WriteError(std::io::Error),

    /// The config file is not valid TOML.
    #[error("Could not parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The config could not be serialized.
    #[error("Could not serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A profile or setting failed validation.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The requested profile does not exist.
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application-wide settings.
    #[serde(default)]
    pub settings: Settings,
    /// Configured tracker profiles.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Load the configuration from the default location.
    ///
    /// A missing file is not an error: it yields the default config so
    /// first runs work without a setup step.
    pub fn load() -> Result<Self> {
        let path = Self::config_file()?;
        Self::load_from(&path)
    }

    /// Load the configuration from an explicit path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;

        debug!(path = %path.display(), profiles = config.profiles.len(), "Loaded config");
        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file()?;
        self.save_to(&path)
    }

    /// Save the configuration to an explicit path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(ConfigError::WriteError)?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Validate every profile and check name uniqueness.
    pub fn validate(&self) -> Result<()> {
        for profile in &self.profiles {
            profile.validate()?;
        }

        for (i, profile) in self.profiles.iter().enumerate() {
            if self.profiles[i + 1..].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if let Some(name) = &self.settings.default_profile {
            if !self.profiles.iter().any(|p| &p.name == name) {
                return Err(ConfigError::ValidationError(format!(
                    "default profile '{}' does not exist",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Get a profile by name.
    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// Get the default profile: the configured default, else the first.
    pub fn get_default_profile(&self) -> Option<&Profile> {
        match &self.settings.default_profile {
            Some(name) => self.profiles.iter().find(|p| &p.name == name),
            None => self.profiles.first(),
        }
    }

    /// Add a profile, rejecting duplicates.
    pub fn add_profile(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        if self.profiles.iter().any(|p| p.name == profile.name) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate profile name '{}'",
                profile.name
            )));
        }
        self.profiles.push(profile);
        Ok(())
    }

    /// The config file path: `<config_dir>/issuedeck/config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("issuedeck").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> Profile {
        Profile::new(name.to_string(), "http://localhost:8600".to_string())
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.get_default_profile().is_none());
    }

    #[test]
    fn test_add_and_get_profile() {
        let mut config = Config::default();
        config.add_profile(profile("homelab")).unwrap();

        assert_eq!(config.get_profile("homelab").unwrap().name, "homelab");
        assert!(matches!(
            config.get_profile("ghost"),
            Err(ConfigError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_profile_rejected() {
        let mut config = Config::default();
        config.add_profile(profile("homelab")).unwrap();

        let result = config.add_profile(profile("homelab"));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_default_profile_falls_back_to_first() {
        let mut config = Config::default();
        config.add_profile(profile("first")).unwrap();
        config.add_profile(profile("second")).unwrap();

        assert_eq!(config.get_default_profile().unwrap().name, "first");
    }

    #[test]
    fn test_configured_default_profile_wins() {
        let mut config = Config::default();
        config.add_profile(profile("first")).unwrap();
        config.add_profile(profile("second")).unwrap();
        config.settings.default_profile = Some("second".to_string());

        assert_eq!(config.get_default_profile().unwrap().name, "second");
    }

    #[test]
    fn test_missing_default_profile_fails_validation() {
        let mut config = Config::default();
        config.settings.default_profile = Some("ghost".to_string());

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.add_profile(profile("homelab")).unwrap();
        config.settings.default_profile = Some("homelab".to_string());
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.profiles.len(), 1);
        assert_eq!(reloaded.get_default_profile().unwrap().name, "homelab");
        assert_eq!(reloaded.settings.theme, "dark");
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
