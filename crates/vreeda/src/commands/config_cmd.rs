//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretName};
use crate::config::{self, Config, Profile, SecretKind};
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";
const DEFAULT_USER_FLOW: &str = "B2C_1_signin";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/api/auth/callback/azure-ad-b2c";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

impl From<SecretName> for SecretKind {
    fn from(name: SecretName) -> Self {
        match name {
            SecretName::ClientSecret => Self::ClientSecret,
            SecretName::SessionSecret => Self::SessionSecret,
            SecretName::AccessToken => Self::AccessToken,
        }
    }
}

/// Copy of the config with plaintext secrets replaced by a mask.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        for secret in [
            &mut profile.access_token,
            &mut profile.client_secret,
            &mut profile.session_secret,
        ] {
            if secret.is_some() {
                *secret = Some(MASK.into());
            }
        }
    }
    cfg
}

fn prompt_text(prompt: &str, default: Option<&str>) -> Result<String, CliError> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_owned());
    }
    input.interact_text().map_err(prompt_err)
}

/// Prompt for a secret and either keep it in the keyring (returns `None`)
/// or hand it back for plaintext storage.
fn prompt_secret(kind: SecretKind, profile_name: &str) -> Result<Option<String>, CliError> {
    let value = Password::new()
        .with_prompt(kind.key())
        .interact()
        .map_err(prompt_err)?;
    if value.is_empty() {
        return Err(CliError::Validation {
            field: kind.key().into(),
            reason: "must not be empty".into(),
        });
    }

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {}?", kind.key()))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        vreeda_config::store_secret(kind, profile_name, &value)?;
        eprintln!("   {} stored in system keyring", kind.key());
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

fn empty_to_none(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.profile_name(None);
            if cfg.profiles.is_empty() {
                output::notice("No profiles configured. Run: vreeda config init", global.quiet);
            } else {
                let lines: Vec<String> = cfg
                    .profiles
                    .keys()
                    .map(|name| {
                        let marker = if name == default { " *" } else { "" };
                        format!("{name}{marker}")
                    })
                    .collect();
                output::print_output(&lines.join("\n"), global.quiet);
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }
            cfg.default_profile = Some(name.clone());
            vreeda_config::save_config(&cfg)?;
            output::notice(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetSecret { kind, value } => {
            let kind = SecretKind::from(kind);
            let cfg = config::load_config_or_default();
            let profile_name = cfg.profile_name(global.profile.as_deref()).to_owned();

            let value = match value {
                Some(v) => v,
                None => Password::new()
                    .with_prompt(kind.key())
                    .interact()
                    .map_err(prompt_err)?,
            };
            if value.is_empty() {
                return Err(CliError::Validation {
                    field: kind.key().into(),
                    reason: "must not be empty".into(),
                });
            }

            vreeda_config::store_secret(kind, &profile_name, &value)?;
            output::notice(
                &format!("Stored {} for profile '{profile_name}'", kind.key()),
                global.quiet,
            );
            Ok(())
        }
    }
}

/// Interactive wizard: adds or replaces one profile and makes it the default.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path();
    eprintln!("vreeda configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let profile_name = prompt_text("Profile name", Some("default"))?;
    let api_url = prompt_text(
        "Device API URL",
        Some("http://localhost:3000/api/vreeda/"),
    )?;
    let tenant = empty_to_none(prompt_text("Azure AD B2C tenant (blank to skip sign-in)", Some(""))?);

    let mut profile = Profile {
        api_url,
        tenant: tenant.clone(),
        user_flow: DEFAULT_USER_FLOW.into(),
        redirect_uri: DEFAULT_REDIRECT_URI.into(),
        ..Profile::default()
    };

    if tenant.is_some() {
        profile.client_id = Some(prompt_text("Client id", None)?);
        profile.user_flow = prompt_text("User flow", Some(DEFAULT_USER_FLOW))?;
        profile.redirect_uri = prompt_text("Redirect URI", Some(DEFAULT_REDIRECT_URI))?;
        profile.client_secret = prompt_secret(SecretKind::ClientSecret, &profile_name)?;
        profile.session_secret = prompt_secret(SecretKind::SessionSecret, &profile_name)?;
    }

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    let written = vreeda_config::save_config(&cfg)?;

    output::notice(
        &format!(
            "\nConfiguration written to {}\n  Active profile: {profile_name}\n\n  Test it: vreeda devices list",
            written.display()
        ),
        global.quiet,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                api_url: "http://localhost:3000/api/vreeda/".into(),
                client_secret: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let masked = redacted(&cfg);
        let profile = &masked.profiles["home"];
        assert_eq!(profile.client_secret.as_deref(), Some(MASK));
        assert_eq!(profile.session_secret, None);
        assert_eq!(profile.api_url, "http://localhost:3000/api/vreeda/");
    }
}
