//! Unified application error type.
//! All modules (db, core, remote, capability, cli) return AppError to keep
//! the error handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Backend
    // ---------------------------
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    Remote(String),

    // ---------------------------
    // Device capabilities
    // ---------------------------
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    // ---------------------------
    // Session / validation
    // ---------------------------
    #[error("Tag in progress: {held}. Finish it or release it before loading another tag")]
    HoldConflict { held: String },

    #[error("No tag loaded")]
    NoTagHeld,

    #[error("Login required: sign in with `tagtrack login` first")]
    LoginRequired,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    #[error("Export error: {0}")]
    Export(String),
}

pub type AppResult<T> = Result<T, AppError>;
