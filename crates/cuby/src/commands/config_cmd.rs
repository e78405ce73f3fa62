//! Config subcommand handlers.

use std::collections::HashSet;
use std::time::Duration;

use cuby_config::{Config, Profile};
use cuby_core::{ConfigFlow, FlowError, FlowResult, UserInput};
use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn flow_err(err: FlowError, base_url: &str) -> CliError {
    match err {
        FlowError::InvalidAuth => CliError::AuthFailed {
            message: "invalid username or password".into(),
        },
        FlowError::CannotConnect => CliError::ConnectionFailed {
            url: base_url.into(),
            reason: "the cloud did not answer".into(),
        },
        FlowError::NoDevices => CliError::NoDevices,
        FlowError::InvalidInput => CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        },
        FlowError::Unknown => CliError::ApiError {
            code: "unknown".into(),
            message: "unexpected error while verifying the account".into(),
        },
    }
}

/// Usernames already configured under a profile other than `except`.
fn configured_accounts(cfg: &Config, except: &str) -> HashSet<String> {
    cfg.profiles
        .iter()
        .filter(|(name, _)| name.as_str() != except)
        .map(|(_, p)| p.username.clone())
        .collect()
}

fn build_flow(global: &GlobalOpts, timeout: u64) -> Result<ConfigFlow, CliError> {
    let mut flow = ConfigFlow::new()?.with_timeout(Duration::from_secs(timeout));
    if let Some(ref raw) = global.base_url {
        let url: url::Url = raw.parse().map_err(|_| CliError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
        flow = flow.with_base_url(url);
    }
    Ok(flow)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global).await,

        ConfigCommand::Show => {
            let mut cfg = cuby_config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.password.is_some() {
                    profile.password = Some(REDACTED.into());
                }
            }
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n# {e}")),
                |c| {
                    let mut names: Vec<&str> = c.profiles.keys().map(String::as_str).collect();
                    names.sort_unstable();
                    names.join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &cuby_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }
    }
}

// ── Init: interactive wizard ─────────────────────────────────────────

async fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = cuby_config::load_config_or_default();
    let config_path = cuby_config::config_path();
    eprintln!("Cuby CLI configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(config::active_profile_name(global, &cfg))
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Credentials
    let username: String = Input::new()
        .with_prompt("Username (email)")
        .interact_text()
        .map_err(prompt_err)?;
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

    // 3. Token lifetime
    let expiration: u64 = Input::new()
        .with_prompt("Token lifetime in seconds (0 = never expires)")
        .default(0)
        .interact_text()
        .map_err(prompt_err)?;

    // 4. Verify against the cloud
    let timeout = global.timeout.unwrap_or(cfg.defaults.timeout);
    let flow = build_flow(global, timeout)?;
    let existing = configured_accounts(&cfg, &profile_name);
    let mut input = UserInput::new(username.trim(), password.clone());
    input.expiration = expiration;

    eprintln!("   Verifying account...");
    let entry = match flow.step_user(&existing, Some(input)).await {
        FlowResult::CreateEntry(entry) => entry,
        FlowResult::Abort { .. } => {
            return Err(CliError::Conflict {
                resource_type: "account".into(),
                identifier: username.trim().into(),
            });
        }
        form @ FlowResult::Form { .. } => {
            let err = form.base_error().unwrap_or(FlowError::Unknown);
            return Err(flow_err(err, global.base_url.as_deref().unwrap_or("the Cuby cloud")));
        }
    };
    eprintln!("   ✓ Signed in as {}", entry.title);

    // 5. Password storage
    let store_choices = &[
        "Store password in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let password_field = if store_selection == 0 {
        cuby_config::store_password(&profile_name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    // 6. Write config
    let profile = Profile {
        username: entry.unique_id.clone(),
        password: password_field,
        expiration,
        base_url: global.base_url.clone(),
        ca_cert: None,
        timeout: global.timeout,
    };
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());

    let written = cuby_config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", written.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: cuby devices list");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_profiles_count_as_configured() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                username: "a@example.com".into(),
                ..Profile::default()
            },
        );
        cfg.profiles.insert(
            "office".into(),
            Profile {
                username: "b@example.com".into(),
                ..Profile::default()
            },
        );

        let accounts = configured_accounts(&cfg, "home");
        assert!(!accounts.contains("a@example.com"));
        assert!(accounts.contains("b@example.com"));
    }

    #[test]
    fn flow_errors_map_to_exit_codes() {
        use crate::error::exit_code;

        assert_eq!(flow_err(FlowError::InvalidAuth, "x").exit_code(), exit_code::AUTH);
        assert_eq!(
            flow_err(FlowError::CannotConnect, "x").exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(flow_err(FlowError::NoDevices, "x").exit_code(), exit_code::NOT_FOUND);
    }
}
