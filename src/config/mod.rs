use crate::core::policy::ConfirmationPolicy;
use crate::core::queue::DEFAULT_BATCH_SIZE;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

pub mod migrate;

pub const DEFAULT_API_URL: &str = "https://script.google.com/macros/s/SEU_ID/exec";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Minimum age of the last sync before the periodic check flushes the queue.
    #[serde(default = "default_sync_threshold_minutes")]
    pub sync_threshold_minutes: u64,
    #[serde(default = "default_scheduler_tick_secs")]
    pub scheduler_tick_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_geo_timeout_secs")]
    pub geo_timeout_secs: u64,
    #[serde(default = "default_scan_poll_ms")]
    pub scan_poll_ms: u64,
    #[serde(default = "default_scan_debounce_ms")]
    pub scan_debounce_ms: u64,
    #[serde(default)]
    pub confirmation_policy: ConfirmationPolicy,
    #[serde(default)]
    pub require_login: bool,
    /// External program printing "lat lon [accuracy]" on stdout.
    #[serde(default)]
    pub geo_command: Option<String>,
    #[serde(default = "default_fallback_user")]
    pub fallback_user: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_sync_threshold_minutes() -> u64 {
    60
}
fn default_scheduler_tick_secs() -> u64 {
    60
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_geo_timeout_secs() -> u64 {
    8
}
fn default_scan_poll_ms() -> u64 {
    250
}
fn default_scan_debounce_ms() -> u64 {
    2000
}
fn default_fallback_user() -> String {
    "campo".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file().to_string_lossy().to_string())
    }
}

impl Config {
    pub fn with_database(database: String) -> Self {
        Self {
            database,
            api_url: default_api_url(),
            sync_threshold_minutes: default_sync_threshold_minutes(),
            scheduler_tick_secs: default_scheduler_tick_secs(),
            batch_size: default_batch_size(),
            geo_timeout_secs: default_geo_timeout_secs(),
            scan_poll_ms: default_scan_poll_ms(),
            scan_debounce_ms: default_scan_debounce_ms(),
            confirmation_policy: ConfirmationPolicy::default(),
            require_login: false,
            geo_command: None,
            fallback_user: default_fallback_user(),
        }
    }

    /// False while the endpoint is still the placeholder shipped in new
    /// config files.
    pub fn has_backend(api_url: &str) -> bool {
        let url = api_url.trim();
        !url.is_empty() && url != DEFAULT_API_URL
    }

    /// Periodic check interval, never below one second.
    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_secs(self.scheduler_tick_secs.max(1))
    }

    pub fn sync_threshold(&self) -> Duration {
        Duration::from_secs(self.sync_threshold_minutes.saturating_mul(60))
    }

    /// Return the configuration directory.
    /// `TAGTRACK_HOME` wins over the per-user default (`~/.tagtrack`).
    pub fn config_dir() -> PathBuf {
        if let Ok(dir) = env::var("TAGTRACK_HOME")
            && !dir.trim().is_empty()
        {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tagtrack")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("tagtrack.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("tagtrack.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
            serde_yaml::from_str(&content)
                .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        fs::create_dir_all(Self::config_dir())?;
        let mut file = fs::File::create(Self::config_file())?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize configuration and database files.
    /// Returns the database path that was configured.
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<String> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_db {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            Self::database_file()
        };
        let db_str = db_path.to_string_lossy().to_string();

        if !is_test {
            let config = Config::with_database(db_str.clone());
            config.save()?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(db_str)
    }
}
