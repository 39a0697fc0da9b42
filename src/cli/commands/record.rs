//! `record` and `geo`: the event path of the held tag.

use super::sync::after_enqueue;
use super::{backend, confirmer, connectivity, geolocator, manual_fix, open_tracker};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::tracker::{RecordOptions, RecordOutcome};
use crate::errors::AppResult;
use crate::models::Status;
use crate::ui::messages::info;
use crate::ui::render::{print_record_outcome, print_session_status};

pub async fn record(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Record {
        status,
        yes,
        obs,
        direct,
        lat,
        lon,
        accuracy,
    } = &cli.command
    else {
        return Ok(());
    };

    let status: Status = status.parse()?;
    let opts = RecordOptions {
        obs: obs.as_deref().unwrap_or_default().trim().to_string(),
        fix: manual_fix(*lat, *lon, *accuracy)?,
    };

    let mut tracker = open_tracker(cfg)?;
    let locator = geolocator(cfg, None);
    let confirm = confirmer(*yes);

    let outcome = if *direct && !cli.offline {
        let submitter = backend(tracker.conn(), cfg)?;
        let network = connectivity(cli, submitter.api_url())?;
        tracker
            .record_direct(
                status,
                opts,
                locator.as_ref(),
                confirm.as_ref(),
                &submitter,
                network.as_ref(),
            )
            .await?
    } else {
        if *direct {
            info("Offline: the event goes to the queue.");
        }
        tracker
            .record_event(status, opts, locator.as_ref(), confirm.as_ref())
            .await?
    };

    print_record_outcome(&outcome);
    if matches!(outcome, RecordOutcome::Queued(_)) {
        after_enqueue(cli, cfg, &mut tracker).await;
    }
    print_session_status(&tracker);
    tracker.close()
}

pub async fn geo(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let Commands::Geo {
        lat,
        lon,
        accuracy,
    } = &cli.command
    else {
        return Ok(());
    };

    let fix = manual_fix(*lat, *lon, *accuracy)?;
    let mut tracker = open_tracker(cfg)?;
    let locator = geolocator(cfg, None);

    let outcome = tracker.refresh_location(fix, locator.as_ref()).await?;

    print_record_outcome(&outcome);
    if matches!(outcome, RecordOutcome::Queued(_)) {
        after_enqueue(cli, cfg, &mut tracker).await;
    }
    print_session_status(&tracker);
    tracker.close()
}
