//! Profile resolution and client construction

use std::path::PathBuf;
use std::time::Duration;

use tablectl_core::{Config, PollConfig, PollOptions, Profile, WarehouseClient};
use tracing::{debug, info, trace, warn};

use crate::error::Result as CliResult;

/// Per-request HTTP timeout; job waits are bounded separately by [`PollOptions`]
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Path the configuration is read from and written to
    pub fn config_file_path(&self) -> Option<PathBuf> {
        self.config_path
            .clone()
            .or_else(|| Config::config_path().ok())
    }

    /// Save `config` to the appropriate location
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        match &self.config_path {
            Some(path) => config.save_to_path(path)?,
            None => config.save()?,
        }
        Ok(())
    }

    pub fn resolve_profile(&self, profile_name: Option<&str>) -> CliResult<(String, &Profile)> {
        trace!("Profile name: {:?}", profile_name);
        let (name, profile) = self.config.active_profile(profile_name)?;
        info!("Using profile: {}", name);
        Ok((name, profile))
    }

    /// Create a client for the resolved profile
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<WarehouseClient> {
        let (name, profile) = self.resolve_profile(profile_name)?;
        debug!(
            profile = %name,
            project_id = %profile.project_id,
            api_url = %profile.api_url,
            "Creating warehouse client"
        );

        let mut builder = WarehouseClient::builder()
            .project_id(&profile.project_id)
            .api_url(&profile.api_url)
            .timeout(REQUEST_TIMEOUT);

        if let Some(location) = &profile.location {
            builder = builder.location(location);
        }

        match profile.resolve_access_token()? {
            Some(token) => builder = builder.access_token(token),
            None => warn!(
                "Profile '{}' has no access token; requests will be unauthenticated",
                name
            ),
        }

        Ok(builder.build()?)
    }

    /// Poll settings for the resolved profile with command-line overrides applied
    pub fn poll_options(
        &self,
        profile_name: Option<&str>,
        wait_timeout: Option<u64>,
        wait_interval: Option<u64>,
    ) -> CliResult<PollOptions> {
        let base = match self.resolve_profile(profile_name) {
            Ok((_, profile)) => profile.poll_config(),
            Err(_) => PollConfig::default(),
        };
        Ok(merge_poll_config(base, wait_timeout, wait_interval).to_options())
    }
}

fn merge_poll_config(
    base: PollConfig,
    wait_timeout: Option<u64>,
    wait_interval: Option<u64>,
) -> PollConfig {
    PollConfig {
        interval_secs: wait_interval.unwrap_or(base.interval_secs),
        timeout_secs: wait_timeout.unwrap_or(base.timeout_secs),
    }
}
