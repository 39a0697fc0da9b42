//! Command handlers and the wiring they share: opening the session and
//! picking the capability implementations for a one-shot invocation.

pub mod auth;
pub mod config;
pub mod db;
pub mod field;
pub mod init;
pub mod log;
pub mod record;
pub mod sync;
pub mod tag;

use crate::capability::confirm::{AssumeYes, Confirmer, TerminalConfirmer};
use crate::capability::geo::{CommandGeolocator, FixedPosition, Geolocator, NoGeolocation};
use crate::capability::network::{Connectivity, ManualConnectivity, TcpProbe};
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::tracker::{Tracker, TrackerOptions};
use crate::db::pool::DbPool;
use crate::db::queries::{get_setting, keys};
use crate::errors::{AppError, AppResult};
use crate::models::GeoFix;
use crate::remote::HttpBackend;
use rusqlite::Connection;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub fn open_tracker(cfg: &Config) -> AppResult<Tracker> {
    let pool = DbPool::new(&cfg.database)?;
    Tracker::open(pool, TrackerOptions::from(cfg))
}

/// Endpoint stored in the database, else the configured one.
pub fn api_url(conn: &Connection, cfg: &Config) -> AppResult<String> {
    Ok(get_setting(conn, keys::API_URL)?
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| cfg.api_url.clone()))
}

/// HTTP backend, or a `Config` error while no endpoint is set up.
pub fn backend(conn: &Connection, cfg: &Config) -> AppResult<HttpBackend> {
    let url = api_url(conn, cfg)?;
    if !Config::has_backend(&url) {
        return Err(AppError::Config(
            "backend endpoint not configured (set api_url or run `config --api-url`)".into(),
        ));
    }
    HttpBackend::new(&url)
}

pub fn connectivity(cli: &Cli, api_url: &str) -> AppResult<Box<dyn Connectivity>> {
    if cli.offline {
        return Ok(Box::new(ManualConnectivity::new(false)));
    }
    Ok(Box::new(TcpProbe::for_url(api_url, PROBE_TIMEOUT)?))
}

pub fn geolocator(cfg: &Config, fix: Option<GeoFix>) -> Box<dyn Geolocator> {
    if let Some(fix) = fix {
        return Box::new(FixedPosition(fix));
    }
    match cfg.geo_command.as_deref() {
        Some(cmd) if !cmd.trim().is_empty() => Box::new(CommandGeolocator::new(cmd)),
        _ => Box::new(NoGeolocation),
    }
}

pub fn confirmer(yes: bool) -> Box<dyn Confirmer> {
    if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirmer)
    }
}

/// Coordinates given on the command line.
pub fn manual_fix(lat: Option<f64>, lon: Option<f64>, accuracy: Option<f64>) -> AppResult<Option<GeoFix>> {
    match (lat, lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::Validation(format!(
                    "coordinates out of range: {lat}, {lon}"
                )));
            }
            Ok(Some(GeoFix::new(Some(lat), Some(lon), accuracy)))
        }
        _ => Err(AppError::Validation("--lat and --lon go together".into())),
    }
}
