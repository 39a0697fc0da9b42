use crate::cli::parser::Commands;
use crate::config::Config;
use crate::config::migrate::{migrate_file, missing_keys};
use crate::db::initialize::init_db;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{keys, set_setting};
use crate::errors::{AppError, AppResult};
use crate::remote::HttpBackend;
use crate::ui::messages::{info, success, warning};
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Config {
        print_config,
        check,
        migrate,
        edit_config,
        editor,
        api_url,
    } = cmd
    else {
        return Ok(());
    };

    let path = Config::config_file();

    if *print_config {
        println!("📄 Current configuration:\n");
        let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
        println!("{yaml}");
    }

    if *check {
        if !path.exists() {
            warning(format!("No configuration file at {}", path.display()));
        } else {
            let missing = missing_keys(&path)?;
            if missing.is_empty() {
                success("Configuration file is up to date.");
            } else {
                warning(format!("Missing fields: {}", missing.join(", ")));
                info("Run `tagtrack config --migrate` to add them.");
            }
        }
    }

    if *migrate {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "no configuration file at {} (run `tagtrack init` first)",
                path.display()
            )));
        }
        let added = migrate_file(&path)?;
        if added.is_empty() {
            info("Nothing to migrate.");
        } else {
            success(format!("Added fields: {}", added.join(", ")));
        }
    }

    if let Some(url) = api_url {
        // validates the URL
        let backend = HttpBackend::new(url)?;
        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;
        set_setting(&pool.conn, keys::API_URL, backend.api_url())?;
        ttlog_quiet(&pool.conn, "config_api_url", "", backend.api_url());
        success(format!("Backend endpoint set to {}", backend.api_url()));
    }

    if *edit_config {
        edit(&path, editor.as_deref());
    }

    Ok(())
}

fn edit(path: &std::path::Path, requested: Option<&str>) {
    let default_editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });
    let editor_to_use = requested.map(str::to_string).unwrap_or_else(|| default_editor.clone());

    match Command::new(&editor_to_use).arg(path).status() {
        Ok(s) if s.success() => {
            success(format!("Configuration file edited using '{editor_to_use}'"));
            return;
        }
        _ => warning(format!(
            "Editor '{editor_to_use}' not available, falling back to '{default_editor}'"
        )),
    }

    match Command::new(&default_editor).arg(path).status() {
        Ok(s) if s.success() => success(format!(
            "Configuration file edited using fallback '{default_editor}'"
        )),
        _ => crate::ui::messages::error(format!(
            "Failed to edit configuration file using fallback '{default_editor}'"
        )),
    }
}
