//! Geolocation capability.
//!
//! Acquiring a position never fails an action: a denied, missing or slow
//! locator resolves to an empty fix once the time bound expires.

use crate::errors::{AppError, AppResult};
use crate::models::GeoFix;
use crate::models::geo::coord_from_wire;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> AppResult<GeoFix>;
}

/// No positioning available on this device.
pub struct NoGeolocation;

#[async_trait]
impl Geolocator for NoGeolocation {
    async fn locate(&self) -> AppResult<GeoFix> {
        Err(AppError::CapabilityUnavailable("no geolocation source".into()))
    }
}

/// A position given up front (command line flags).
pub struct FixedPosition(pub GeoFix);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn locate(&self) -> AppResult<GeoFix> {
        Ok(self.0)
    }
}

/// Runs an external program and reads `lat lon [accuracy]` from its stdout.
pub struct CommandGeolocator {
    command_line: String,
}

impl CommandGeolocator {
    pub fn new(command_line: &str) -> Self {
        Self {
            command_line: command_line.trim().to_string(),
        }
    }
}

/// Parse `lat lon [accuracy]`. Fields may be separated by blanks or `;`.
/// A single token is split on commas only when it uses decimal points;
/// comma-decimal output must be separated by blanks or `;`.
pub fn parse_fix(output: &str) -> Option<GeoFix> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;

    let mut fields: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|s| !s.is_empty())
        .collect();
    if fields.len() == 1 && line.contains('.') {
        fields = line.split(',').map(str::trim).collect();
    }

    let get = |i: usize| fields.get(i).and_then(|s| coord_from_wire(s));
    let fix = GeoFix::new(get(0), get(1), get(2));
    if fix.is_empty() { None } else { Some(fix) }
}

#[async_trait]
impl Geolocator for CommandGeolocator {
    async fn locate(&self) -> AppResult<GeoFix> {
        let mut parts = self.command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| AppError::CapabilityUnavailable("empty geo_command".into()))?;

        let output = Command::new(program)
            .args(parts)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::CapabilityUnavailable(format!("{program}: {e}")))?;

        if !output.status.success() {
            return Err(AppError::CapabilityUnavailable(format!(
                "{program} exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_fix(&stdout).ok_or_else(|| {
            AppError::CapabilityUnavailable(format!("{program}: no coordinates in output"))
        })
    }
}

/// Ask `locator` for a position, waiting at most `limit`.
pub async fn acquire(locator: &dyn Geolocator, limit: Duration) -> GeoFix {
    match tokio::time::timeout(limit, locator.locate()).await {
        Ok(Ok(fix)) => fix,
        Ok(Err(e)) => {
            debug!(error = %e, "geolocation unavailable, recording without coordinates");
            GeoFix::empty()
        }
        Err(_) => {
            warn!(?limit, "geolocation timed out, recording without coordinates");
            GeoFix::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_usual_locator_outputs() {
        assert_eq!(
            parse_fix("-23.55 -46.63 12\n"),
            Some(GeoFix::new(Some(-23.55), Some(-46.63), Some(12.0)))
        );
        assert_eq!(
            parse_fix("-23,55;-46,63"),
            Some(GeoFix::new(Some(-23.55), Some(-46.63), None))
        );
        assert_eq!(
            parse_fix("-23.55,-46.63,5"),
            Some(GeoFix::new(Some(-23.55), Some(-46.63), Some(5.0)))
        );
        assert_eq!(parse_fix("no fix"), None);
        assert_eq!(parse_fix(""), None);
    }

    #[test]
    fn lone_comma_decimal_is_one_coordinate() {
        assert_eq!(
            parse_fix("-23,55"),
            Some(GeoFix::new(Some(-23.55), None, None))
        );
        assert_eq!(parse_fix("-23,55,-46,63"), None);
    }

    struct Stalled;

    #[async_trait]
    impl Geolocator for Stalled {
        async fn locate(&self) -> AppResult<GeoFix> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(GeoFix::new(Some(1.0), Some(1.0), None))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_locator_resolves_to_empty_fix() {
        let fix = acquire(&Stalled, Duration::from_secs(8)).await;
        assert!(fix.is_empty());
    }

    #[tokio::test]
    async fn denied_locator_resolves_to_empty_fix() {
        let fix = acquire(&NoGeolocation, Duration::from_secs(8)).await;
        assert!(fix.is_empty());
    }
}
