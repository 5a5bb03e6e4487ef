use crate::auth::{clear_stored_token, resolve_token, store_token, AccessToken, TokenSource};
use crate::cli::AuthCommands;
use crate::commands::common::{read_piped_stdin, CliContext};
use crate::config_profiles::RemoteKind;
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, context: &CliContext) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { profile, token } => {
            let config = context.load_config()?;
            let profile_name = context.profile_name(&config, profile.as_deref());
            let raw = match token {
                Some(token) => Some(token),
                None => read_piped_stdin()?,
            };
            let token = raw
                .and_then(|raw| AccessToken::new(raw).ok())
                .ok_or(CliError::EmptyToken)?;
            run_auth_login(&profile_name, &token)?;

            let uses_drive = config
                .profile(&profile_name)
                .is_some_and(|profile| profile.remote == Some(RemoteKind::Drive));
            if !uses_drive {
                println!(
                    "Note: profile '{profile_name}' does not sync to Drive. Run `tabsync config init --profile {profile_name} --remote drive`."
                );
            }
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let config = context.load_config()?;
            let profile_name = context.profile_name(&config, profile.as_deref());
            println!("{}", auth_status_line(&profile_name)?);
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let config = context.load_config()?;
            let profile_name = context.profile_name(&config, profile.as_deref());
            clear_stored_token(&profile_name)?;
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}

pub fn run_auth_login(profile_name: &str, token: &AccessToken) -> Result<(), CliError> {
    store_token(profile_name, token)?;
    println!("Stored Drive access token for profile '{profile_name}'");
    Ok(())
}

pub fn auth_status_line(profile_name: &str) -> Result<String, CliError> {
    let line = match resolve_token(profile_name)? {
        Some((_, TokenSource::Environment)) => {
            format!("Profile '{profile_name}' uses the token from TABSYNC_DRIVE_TOKEN")
        }
        Some((_, TokenSource::Keychain)) => {
            format!("Profile '{profile_name}' has a stored Drive access token")
        }
        None => format!("Profile '{profile_name}' is not signed in."),
    };
    Ok(line)
}
