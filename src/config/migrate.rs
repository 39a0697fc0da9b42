//! Configuration file upgrades: detect keys missing from an older YAML file
//! and add them with their default values, leaving every existing value as
//! the operator wrote it.

use super::Config;
use crate::errors::{AppError, AppResult};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Explanatory comments injected after freshly added keys.
fn comment_for(key: &str) -> Option<&'static str> {
    match key {
        "confirmation_policy" => Some(
            "  # confirmation_policy options:\n\
             #   reopen_only → confirm only when leaving CONCLUIDO\n\
             #   strict      → confirm every change away from a non-pending status\n",
        ),
        "geo_command" => Some(
            "  # geo_command: program printing \"lat lon [accuracy]\", e.g. a GPS helper\n",
        ),
        _ => None,
    }
}

fn defaults_mapping(database: &str) -> AppResult<Mapping> {
    let defaults = Config::with_database(database.to_string());
    match serde_yaml::to_value(&defaults).map_err(|e| AppError::Config(e.to_string()))? {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Config("default configuration is not a mapping".into())),
    }
}

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    match serde_yaml::from_str::<Value>(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?
    {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{}: top level must be a mapping",
            path.display()
        ))),
    }
}

/// Keys known to this version that the file at `path` does not define.
pub fn missing_keys(path: &Path) -> AppResult<Vec<String>> {
    let current = read_mapping(path)?;
    let database = current
        .get(Value::String("database".into()))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let mut missing = Vec::new();
    for (k, _) in defaults_mapping(&database)? {
        if !current.contains_key(&k)
            && let Some(name) = k.as_str()
        {
            missing.push(name.to_string());
        }
    }
    Ok(missing)
}

/// Add the missing keys to the file at `path`.
/// Returns the names that were added (empty → file untouched).
pub fn migrate_file(path: &Path) -> AppResult<Vec<String>> {
    let mut current = read_mapping(path)?;
    let database = match current
        .get(Value::String("database".into()))
        .and_then(|v| v.as_str())
    {
        Some(db) => db.to_string(),
        None => Config::database_file().to_string_lossy().to_string(),
    };

    let mut added = Vec::new();
    for (k, v) in defaults_mapping(&database)? {
        if !current.contains_key(&k) {
            if let Some(name) = k.as_str() {
                added.push(name.to_string());
            }
            current.insert(k, v);
        }
    }

    if added.is_empty() {
        return Ok(added);
    }

    let serialized =
        serde_yaml::to_string(&Value::Mapping(current)).map_err(|_| AppError::ConfigSave)?;

    let mut new_content = String::new();
    for line in serialized.lines() {
        new_content.push_str(line);
        new_content.push('\n');

        if let Some((key, _)) = line.split_once(':')
            && added.iter().any(|a| a == key)
            && let Some(comment) = comment_for(key)
        {
            new_content.push_str(comment);
        }
    }

    fs::write(path, new_content).map_err(|_| AppError::ConfigSave)?;
    Ok(added)
}
