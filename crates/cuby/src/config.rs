//! Bridges the TOML profiles in `cuby-config` and the global CLI flags into
//! an `IntegrationConfig`.

use cuby_config::{Config, Profile};
use cuby_core::IntegrationConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Profile selected by `--profile`, then `default_profile`, then `"default"`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Resolve the account from the config file with CLI flag overrides.
///
/// Without a matching profile, `--username` plus a password from
/// `CUBY_PASSWORD` (or the keyring) is enough.
pub fn resolve_integration_config(global: &GlobalOpts) -> Result<IntegrationConfig, CliError> {
    let cfg = cuby_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() && global.username.is_none() => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    apply_overrides(&mut profile, global);

    if profile.username.trim().is_empty() {
        return Err(CliError::NoConfig {
            path: cuby_config::config_path().display().to_string(),
        });
    }

    let password = cuby_config::resolve_password(&profile, &profile_name)?;
    let config =
        cuby_config::profile_to_integration_config(&profile, password, cfg.defaults.timeout)?;
    Ok(config)
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref username) = global.username {
        profile.username.clone_from(username);
    }
    if let Some(ref base_url) = global.base_url {
        profile.base_url = Some(base_url.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}
