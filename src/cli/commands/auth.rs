//! `login`, `logout` and `passwd`.

use super::{backend, open_tracker};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::remote::Authenticator;
use crate::ui::messages::{info, success, warning};

fn require_network(cli: &Cli) -> AppResult<()> {
    if cli.offline {
        return Err(AppError::CapabilityUnavailable(
            "this command needs the backend (remove --offline)".into(),
        ));
    }
    Ok(())
}

/// Logins are case-insensitive and never carry surrounding blanks.
pub fn normalize_login(raw: &str) -> AppResult<String> {
    let login = raw.trim().to_lowercase();
    if login.is_empty() {
        return Err(AppError::Validation("login must not be empty".into()));
    }
    Ok(login)
}

pub async fn login(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Login { user, password } = &cli.command else {
        return Ok(());
    };
    let user = normalize_login(user)?;
    if password.is_empty() {
        return Err(AppError::Validation("password must not be empty".into()));
    }
    require_network(cli)?;

    let mut tracker = open_tracker(cfg)?;
    let auth = backend(tracker.conn(), cfg)?;
    let grant = auth.login(&user, password).await?;
    tracker.sign_in(&grant)?;

    let name = if grant.full_name.is_empty() {
        grant.login.as_str()
    } else {
        grant.full_name.as_str()
    };
    success(format!("Signed in as {name}."));
    if grant.must_change_password {
        warning("First access: change your password with `tagtrack passwd`.");
    }
    tracker.close()
}

pub fn logout(cfg: &Config) -> AppResult<()> {
    let mut tracker = open_tracker(cfg)?;
    if !tracker.operator().logged_in {
        info("Nobody is signed in.");
        return tracker.close();
    }
    tracker.sign_out()?;
    success("Signed out.");
    tracker.close()
}

pub async fn passwd(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Passwd { current, new } = &cli.command else {
        return Ok(());
    };
    if current.is_empty() || new.is_empty() {
        return Err(AppError::Validation(
            "both the current and the new password are required".into(),
        ));
    }
    require_network(cli)?;

    let tracker = open_tracker(cfg)?;
    let login = match (&tracker.operator().login, tracker.operator().logged_in) {
        (Some(login), true) => login.clone(),
        _ => return Err(AppError::LoginRequired),
    };

    let auth = backend(tracker.conn(), cfg)?;
    auth.change_password(&login, current, new).await?;
    success("Password changed.");
    tracker.close()
}
