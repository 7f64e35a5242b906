//! Configuration management for tablectl
//!
//! Handles configuration loading from files, environment variables, and command-line arguments.
//! Configuration is stored in TOML format with support for multiple named profiles.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::poll::PollConfig;
use crate::client::DEFAULT_API_URL;

/// Environment variable that overrides a profile's access token
pub const ACCESS_TOKEN_ENV: &str = "TABLECTL_ACCESS_TOKEN";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when `--profile` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    /// Project that jobs run in and unqualified tables resolve against
    pub project_id: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token, plaintext or a `keyring:` reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Processing location sent with jobs and datasets, e.g. `US` or `EU`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollConfig>,
}

impl Profile {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_url: default_api_url(),
            access_token: None,
            location: None,
            poll: None,
        }
    }

    /// Get the resolved access token (with keyring support)
    ///
    /// `TABLECTL_ACCESS_TOKEN` wins over the stored value, so a token can be
    /// supplied even when the profile has none.
    pub fn resolve_access_token(&self) -> Result<Option<String>> {
        let store = CredentialStore::new();

        match &self.access_token {
            Some(token) => store
                .get_credential(token, Some(ACCESS_TOKEN_ENV))
                .map(Some)
                .map_err(|e| {
                    ConfigError::CredentialError(format!("Failed to resolve access token: {}", e))
                }),
            None => Ok(std::env::var(ACCESS_TOKEN_ENV).ok()),
        }
    }

    /// Poll settings, falling back to the defaults
    pub fn poll_config(&self) -> PollConfig {
        self.poll.unwrap_or_default()
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}

impl Config {
    /// Resolve the profile name to use
    ///
    /// Resolution order: the explicit name, then `default_profile`, then the
    /// first profile alphabetically.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        if let Some((name, _)) = self.list_profiles().first() {
            return Ok((*name).clone());
        }

        Err(ConfigError::NoProfiles {
            suggestion: "Use 'tablectl profile set <name> --project-id <project>' to create a profile."
                .to_string(),
        })
    }

    /// Look up a profile by name
    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve and look up in one step
    pub fn active_profile(&self, explicit_profile: Option<&str>) -> Result<(String, &Profile)> {
        let name = self.resolve_profile(explicit_profile)?;
        let profile = self.get_profile(&name)?;
        Ok((name, profile))
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/tablectl/config.toml` is used when that directory
    /// exists; otherwise the platform path from `directories`.
    ///
    /// On Linux: ~/.config/tablectl/config.toml
    /// On Windows: %APPDATA%\tablectl\tablectl\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("tablectl")
                    .join("config.toml");

                if linux_style_path
                    .parent()
                    .map(|p| p.exists())
                    .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "tablectl", "tablectl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports `${VAR}` and `${VAR:-default}`. Unset variables without a
    /// default are left as written.
    ///
    /// ```toml
    /// project_id = "${WAREHOUSE_PROJECT:-analytics-dev}"
    /// access_token = "${WAREHOUSE_TOKEN}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(project: &str) -> Profile {
        Profile::new(project)
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        let mut prod = profile("analytics-prod");
        prod.location = Some("EU".to_string());
        prod.poll = Some(PollConfig {
            interval_secs: 5,
            timeout_secs: 0,
        });

        config.set_profile("prod".to_string(), prod.clone());
        config.default_profile = Some("prod".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.default_profile.as_deref(), Some("prod"));
        assert_eq!(deserialized.profiles.get("prod"), Some(&prod));
    }

    #[test]
    fn test_minimal_profile_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[profiles.dev]
project_id = "analytics-dev"
"#,
        )
        .unwrap();

        let dev = config.get_profile("dev").unwrap();
        assert_eq!(dev.api_url, DEFAULT_API_URL);
        assert_eq!(dev.location, None);
        assert_eq!(dev.poll_config(), PollConfig::default());
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), profile("p-z"));
        config.set_profile("alpha".to_string(), profile("p-a"));

        assert_eq!(config.resolve_profile(Some("zeta")).unwrap(), "zeta");
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");
    }

    #[test]
    fn test_resolve_profile_without_profiles() {
        let err = Config::default().resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoProfiles { .. }));
        assert!(err.to_string().contains("tablectl profile set"));
    }

    #[test]
    fn test_get_missing_profile() {
        let err = Config::default().get_profile("nope").unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { name } if name == "nope"));
    }

    #[test]
    fn test_remove_default_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("prod".to_string(), profile("p"));
        config.default_profile = Some("prod".to_string());

        assert!(config.remove_profile("prod").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("prod").is_none());
    }

    #[test]
    fn test_list_profiles_sorted() {
        let mut config = Config::default();
        for name in ["c", "a", "b"] {
            config.set_profile(name.to_string(), profile("p"));
        }
        let names: Vec<_> = config
            .list_profiles()
            .into_iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("TEST_WAREHOUSE_PROJECT", "from-env");
            std::env::remove_var("TEST_MISSING_LOCATION");
        }

        let content = r#"
[profiles.test]
project_id = "${TEST_WAREHOUSE_PROJECT}"
location = "${TEST_MISSING_LOCATION:-US}"
access_token = "${TEST_UNSET_TOKEN}"
"#;

        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("from-env"));
        assert!(expanded.contains("\"US\""));
        assert!(expanded.contains("${TEST_UNSET_TOKEN}"));

        unsafe {
            std::env::remove_var("TEST_WAREHOUSE_PROJECT");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_access_token_env_override() {
        unsafe {
            std::env::set_var(ACCESS_TOKEN_ENV, "env-token");
        }

        let mut with_token = profile("p");
        with_token.access_token = Some("stored-token".to_string());
        assert_eq!(
            with_token.resolve_access_token().unwrap().as_deref(),
            Some("env-token")
        );
        assert_eq!(
            profile("p").resolve_access_token().unwrap().as_deref(),
            Some("env-token")
        );

        unsafe {
            std::env::remove_var(ACCESS_TOKEN_ENV);
        }

        assert_eq!(
            with_token.resolve_access_token().unwrap().as_deref(),
            Some("stored-token")
        );
        assert_eq!(profile("p").resolve_access_token().unwrap(), None);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_profile("prod".to_string(), profile("analytics-prod"));
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.get_profile("prod").unwrap().project_id, "analytics-prod");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.profiles.is_empty());
    }
}
