//! Profile command implementations

use colored::Colorize;
use tablectl_core::config::CredentialStore;
use tablectl_core::params::validate_project_id;
use tablectl_core::{PollConfig, Profile};
use tracing::{debug, info, trace};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, TableCtlError};
use crate::output::print_output;

pub async fn handle_profile_command(
    cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        ProfileCommands::List => handle_list(conn_mgr, output_format),
        ProfileCommands::Path => handle_path(conn_mgr, output_format),
        ProfileCommands::Show { name } => handle_show(conn_mgr, name, output_format),
        ProfileCommands::Set {
            name,
            project_id,
            api_url,
            access_token,
            location,
            poll_interval,
            poll_timeout,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            #[cfg(not(feature = "secure-storage"))]
            let use_keyring = &false;

            let update = ProfileUpdate {
                project_id: project_id.as_deref(),
                api_url: api_url.as_deref(),
                access_token: access_token.as_deref(),
                location: location.as_deref(),
                poll_interval: *poll_interval,
                poll_timeout: *poll_timeout,
                use_keyring: *use_keyring,
            };
            handle_set(conn_mgr, name, update)
        }
        ProfileCommands::Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    if output_format.is_structured() {
        let profile_list: Vec<serde_json::Value> = profiles
            .iter()
            .map(|(name, profile)| {
                serde_json::json!({
                    "name": name,
                    "project_id": profile.project_id,
                    "api_url": profile.api_url,
                    "location": profile.location,
                    "is_default": default == Some(name.as_str()),
                })
            })
            .collect();

        let output = serde_json::json!({
            "config_path": conn_mgr.config_file_path().map(|p| p.display().to_string()),
            "profiles": profile_list,
            "count": profile_list.len(),
        });
        print_output(output, output_format)?;
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No profiles configured.");
        println!("Use 'tablectl profile set <name> --project-id <project>' to create a profile.");
        return Ok(());
    }

    for (name, profile) in profiles {
        let marker = if default == Some(name.as_str()) {
            format!(" {}", "(default)".green())
        } else {
            String::new()
        };
        println!(
            "{}{}  {}  {}",
            name.bold(),
            marker,
            profile.project_id,
            profile.api_url.dimmed()
        );
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let path = conn_mgr
        .config_file_path()
        .ok_or_else(|| TableCtlError::Configuration("Could not determine config path".into()))?;

    if output_format.is_structured() {
        print_output(
            serde_json::json!({ "config_path": path.display().to_string() }),
            output_format,
        )?;
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| TableCtlError::ProfileNotFound { name: name.into() })?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    let token = profile.access_token.as_deref().map(token_preview);
    let poll = profile.poll_config();

    if output_format.is_structured() {
        print_output(
            serde_json::json!({
                "name": name,
                "project_id": profile.project_id,
                "api_url": profile.api_url,
                "location": profile.location,
                "access_token": token,
                "poll": poll,
                "is_default": is_default,
            }),
            output_format,
        )?;
        return Ok(());
    }

    println!("Profile: {}", name);
    println!("Project: {}", profile.project_id);
    println!("API URL: {}", profile.api_url);
    if let Some(location) = &profile.location {
        println!("Location: {}", location);
    }
    println!("Access token: {}", token.as_deref().unwrap_or("(not set)"));
    match poll.timeout_secs {
        0 => println!("Polling: every {}s, no timeout", poll.interval_secs),
        secs => println!(
            "Polling: every {}s, timeout {}s",
            poll.interval_secs, secs
        ),
    }
    if is_default {
        println!("Default: yes");
    }
    Ok(())
}

/// Flags passed to `profile set`
struct ProfileUpdate<'a> {
    project_id: Option<&'a str>,
    api_url: Option<&'a str>,
    access_token: Option<&'a str>,
    location: Option<&'a str>,
    poll_interval: Option<u64>,
    poll_timeout: Option<u64>,
    use_keyring: bool,
}

fn handle_set(conn_mgr: &ConnectionManager, name: &str, update: ProfileUpdate<'_>) -> CliResult<()> {
    debug!("Setting profile: {}", name);
    let mut config = conn_mgr.config.clone();
    let existing = config.profiles.get(name).cloned();
    let is_new = existing.is_none();

    let project_id = match (update.project_id, &existing) {
        (Some(project_id), _) => project_id.to_string(),
        (None, Some(profile)) => profile.project_id.clone(),
        (None, None) => {
            return Err(TableCtlError::InvalidInput {
                message: format!("--project-id is required when creating profile '{}'", name),
            });
        }
    };
    validate_project_id(&project_id)?;

    let profile = apply_update(existing, project_id, &update, |token| {
        store_token(name, token, update.use_keyring)
    })?;

    config.set_profile(name.to_string(), profile);
    let became_default = config.default_profile.is_none();
    if became_default {
        config.default_profile = Some(name.to_string());
    }
    conn_mgr.save_config(&config)?;

    info!("Saved profile {}", name);
    if is_new {
        println!("Profile '{}' created successfully.", name);
    } else {
        println!("Profile '{}' updated successfully.", name);
    }
    if became_default {
        println!("Set as default profile.");
    }
    Ok(())
}

/// Merge `profile set` flags onto an existing profile, or build a new one
fn apply_update(
    existing: Option<Profile>,
    project_id: String,
    update: &ProfileUpdate<'_>,
    store_token: impl Fn(&str) -> CliResult<String>,
) -> CliResult<Profile> {
    let mut profile = existing.unwrap_or_else(|| Profile::new(project_id.as_str()));
    profile.project_id = project_id;

    if let Some(api_url) = update.api_url {
        profile.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(location) = update.location {
        profile.location = Some(location.to_string());
    }
    if let Some(token) = update.access_token {
        profile.access_token = Some(store_token(token)?);
    }

    if update.poll_interval.is_some() || update.poll_timeout.is_some() {
        let base = profile.poll.unwrap_or_default();
        profile.poll = Some(PollConfig {
            interval_secs: update.poll_interval.unwrap_or(base.interval_secs),
            timeout_secs: update.poll_timeout.unwrap_or(base.timeout_secs),
        });
    }

    Ok(profile)
}

fn store_token(name: &str, token: &str, use_keyring: bool) -> CliResult<String> {
    if !use_keyring {
        return Ok(token.to_string());
    }

    #[cfg(feature = "secure-storage")]
    {
        let store = CredentialStore::with_keyring();
        Ok(store.store_credential(&format!("{}-access-token", name), token)?)
    }

    #[cfg(not(feature = "secure-storage"))]
    {
        let _ = name;
        Err(TableCtlError::Configuration(
            "Keyring support requires the secure-storage feature".into(),
        ))
    }
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Removing profile: {}", name);
    let mut config = conn_mgr.config.clone();
    let was_default = config.default_profile.as_deref() == Some(name);

    let removed = config
        .remove_profile(name)
        .ok_or_else(|| TableCtlError::ProfileNotFound { name: name.into() })?;

    if let Some(token) = &removed.access_token
        && CredentialStore::is_keyring_reference(token)
    {
        CredentialStore::new().delete_credential(token)?;
    }

    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed successfully.", name);
    if was_default {
        println!("Default profile cleared.");
    }
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(TableCtlError::ProfileNotFound { name: name.into() });
    }

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}

/// Keyring references are shown as-is; plaintext tokens are cut to a prefix
fn token_preview(token: &str) -> String {
    if CredentialStore::is_keyring_reference(token) {
        return token.to_string();
    }
    let prefix: String = token.chars().take(6).collect();
    format!("{}...", prefix)
}
