//! Backend reconciliation from the command line: `sync`, `refresh`, `queue`.

use super::{backend, connectivity, open_tracker};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::export::ExportLogic;
use crate::core::sync::{SyncEngine, SyncOutcome, Trigger};
use crate::core::tracker::Tracker;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use crate::ui::render::{print_queue, print_refresh_report, print_sync_outcome};
use crate::utils::path::expand_tilde;
use tracing::debug;

pub async fn sync(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let all = matches!(cli.command, Commands::Sync { all: true });
    let mut tracker = open_tracker(cfg)?;

    if cli.offline {
        print_sync_outcome(&SyncOutcome::Offline);
        info(format!("{} events pending.", tracker.queue().size()));
        return tracker.close();
    }

    let sink = backend(tracker.conn(), cfg)?;
    let network = connectivity(cli, sink.api_url())?;
    let engine = SyncEngine::new(&sink, network.as_ref(), cfg.batch_size);

    if all {
        let (sent, last) = engine.sync_all(&mut tracker, Trigger::Manual).await?;
        match last {
            SyncOutcome::Offline if sent == 0 => print_sync_outcome(&last),
            SyncOutcome::Empty if sent == 0 => print_sync_outcome(&last),
            _ => success(format!(
                "{sent} events sent, {} still pending.",
                tracker.queue().size()
            )),
        }
    } else {
        let outcome = engine.sync(&mut tracker, Trigger::Manual).await?;
        print_sync_outcome(&outcome);
    }
    tracker.close()
}

/// Best-effort flush right after an event was queued. Never fails the
/// command that queued the event.
pub async fn after_enqueue(cli: &Cli, cfg: &Config, tracker: &mut Tracker) {
    if cli.offline {
        return;
    }
    let sink = match backend(tracker.conn(), cfg) {
        Ok(sink) => sink,
        Err(e) => {
            debug!(error = %e, "no backend for post-enqueue sync");
            return;
        }
    };
    let network = match connectivity(cli, sink.api_url()) {
        Ok(n) => n,
        Err(e) => {
            debug!(error = %e, "no connectivity probe for post-enqueue sync");
            return;
        }
    };

    let engine = SyncEngine::new(&sink, network.as_ref(), cfg.batch_size);
    match engine.sync(tracker, Trigger::PostEnqueue).await {
        Ok(outcome @ SyncOutcome::Sent { .. }) => print_sync_outcome(&outcome),
        Ok(_) => {}
        Err(e) => warning(format!("Sync postponed: {e}")),
    }
}

pub async fn refresh(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if cli.offline {
        return Err(AppError::CapabilityUnavailable(
            "status table download needs the backend (remove --offline)".into(),
        ));
    }
    let mut tracker = open_tracker(cfg)?;
    let source = backend(tracker.conn(), cfg)?;

    let report = tracker.refresh(&source).await?;
    print_refresh_report(&report);
    tracker.close()
}

pub fn queue(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Queue { list, export } = cmd else {
        return Ok(());
    };
    let tracker = open_tracker(cfg)?;
    let queue = tracker.queue();

    if *list {
        print_queue(queue);
    } else {
        info(format!("{} events pending.", queue.size()));
    }

    if let Some(file) = export {
        let path = expand_tilde(file);
        let written = ExportLogic::queue_csv(queue.iter(), &path)?;
        success(format!("{written} events exported to {}", path.display()));
    }
    tracker.close()
}
