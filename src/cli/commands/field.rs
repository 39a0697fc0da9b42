//! `field`: the interactive session.
//!
//! One task owns the tracker and multiplexes everything that can wake it:
//! operator lines on stdin, decoded scans, the scheduler tick (which also
//! probes connectivity), the visibility signal and Ctrl-C. Confirmation
//! prompts are answered from the same stdin stream while the flow that asked
//! is suspended.

use super::{api_url, backend, geolocator};
use crate::capability::confirm::{ChannelConfirmer, PendingDecision};
use crate::capability::geo::Geolocator;
use crate::capability::network::{
    Connectivity, ConnectivityWatch, ManualConnectivity, TcpProbe, Transition,
};
use crate::capability::scan::{FileCaptureSource, spawn_scan_loop};
use crate::capability::visibility::VisibilityWatch;
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::hold::ScanVerdict;
use crate::core::sync::{Scheduler, SyncEngine, SyncOutcome, Trigger};
use crate::core::tracker::{RecordOptions, RecordOutcome, Tracker};
use crate::errors::{AppError, AppResult};
use crate::models::Status;
use crate::remote::HttpBackend;
use crate::ui::messages::{error, header, info, success, warning};
use crate::ui::render::{
    print_queue, print_record_outcome, print_refresh_report, print_session_status,
    print_sync_outcome, print_tag_view,
};
use chrono::Utc;
use std::future::Future;
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const HELP: &str = "\
  <TAG>              load a tag (typed or pasted)
  /record STATUS [OBS]  record CONCLUIDO, PENDENTE, PENDENTE_OBRA or SEM_ACESSO
  /geo               refresh the location of a completed tag
  /reload            show the held tag again
  /release           release the held tag without recording
  /show              session status
  /queue             list pending events
  /sync              send one batch now
  /refresh           download the status table
  /help              this help
  /quit              leave field mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn is_yes(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "sim"
    )
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Drive `fut` to completion, answering its confirmation questions with
/// lines read from stdin. Stdin closing cancels the pending question.
async fn answering<F, T>(
    fut: F,
    questions: &mut mpsc::Receiver<PendingDecision>,
    lines: &mut mpsc::Receiver<String>,
) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return out,
            Some(question) = questions.recv() => {
                warning(&question.request);
                print!("Confirm [y/N]: ");
                let _ = std::io::stdout().flush();
                match lines.recv().await {
                    Some(line) => question.answer(is_yes(&line)),
                    None => drop(question),
                }
            }
        }
    }
}

struct FieldSession<'a> {
    cfg: &'a Config,
    tracker: Tracker,
    backend: Option<HttpBackend>,
    network: Box<dyn Connectivity>,
    locator: Box<dyn Geolocator>,
    confirmer: ChannelConfirmer,
    questions: mpsc::Receiver<PendingDecision>,
    lines: mpsc::Receiver<String>,
    watch: ConnectivityWatch,
    scheduler: Scheduler,
}

impl FieldSession<'_> {
    async fn sync(&mut self, trigger: Trigger) {
        let Some(sink) = &self.backend else {
            debug!(%trigger, "no backend configured, sync skipped");
            return;
        };
        let engine = SyncEngine::new(sink, self.network.as_ref(), self.cfg.batch_size);
        match engine.sync(&mut self.tracker, trigger).await {
            Ok(outcome) => {
                if trigger == Trigger::Manual || outcome != SyncOutcome::Empty {
                    print_sync_outcome(&outcome);
                }
            }
            Err(e) => warning(format!("Sync failed ({trigger}): {e}")),
        }
    }

    async fn on_tick(&mut self) {
        let online = self.network.is_online().await;
        match self.watch.observe(online) {
            Transition::WentOnline => {
                info("Back online.");
                self.sync(Trigger::ConnectivityRegained).await;
            }
            Transition::WentOffline => warning("Offline: events will be queued."),
            Transition::Unchanged => {}
        }

        if online
            && self.scheduler.is_due(
                Utc::now(),
                self.tracker.last_sync_at(),
                self.tracker.queue().size(),
            )
        {
            self.sync(Trigger::Timer).await;
        }
    }

    fn on_scan(&mut self, value: &str) {
        match self.tracker.hold().check_scan(value) {
            ScanVerdict::Accept(tag) => self.load(&tag),
            ScanVerdict::Ignored { value, held } => {
                tracing::info!(%value, %held, "scan ignored while a tag is held");
                info(format!("{value} ignored (HOLD: {held})"));
            }
            ScanVerdict::Blank => {}
        }
    }

    fn load(&mut self, raw: &str) {
        match self.tracker.load_tag(raw) {
            Ok(view) => {
                if !view.reloaded {
                    success(format!("Loaded {}.", view.tag));
                }
                if !view.lookup.is_registered() {
                    warning("Tag not found in the status table: it will be recorded as a new tag.");
                }
                print_tag_view(&view);
            }
            Err(e) => error(e),
        }
    }

    async fn record(&mut self, args: &str) -> AppResult<()> {
        let (status, obs) = match args.trim().split_once(char::is_whitespace) {
            Some((s, rest)) => (s, rest.trim()),
            None => (args.trim(), ""),
        };
        if status.is_empty() {
            return Err(AppError::Validation("usage: /record STATUS [OBS]".into()));
        }
        let status: Status = status.parse()?;
        let opts = RecordOptions {
            obs: obs.to_string(),
            fix: None,
        };

        let outcome = answering(
            self.tracker.record_event(
                status,
                opts,
                self.locator.as_ref(),
                &self.confirmer,
            ),
            &mut self.questions,
            &mut self.lines,
        )
        .await?;

        print_record_outcome(&outcome);
        if matches!(outcome, RecordOutcome::Queued(_)) {
            self.sync(Trigger::PostEnqueue).await;
        }
        Ok(())
    }

    async fn geo(&mut self) -> AppResult<()> {
        let outcome = self
            .tracker
            .refresh_location(None, self.locator.as_ref())
            .await?;

        print_record_outcome(&outcome);
        if matches!(outcome, RecordOutcome::Queued(_)) {
            self.sync(Trigger::PostEnqueue).await;
        }
        Ok(())
    }

    async fn refresh(&mut self) -> AppResult<()> {
        let Some(source) = &self.backend else {
            return Err(AppError::Config("backend endpoint not configured".into()));
        };
        let report = self.tracker.refresh(source).await?;
        print_refresh_report(&report);
        Ok(())
    }

    async fn on_line(&mut self, line: &str) -> AppResult<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        let Some(command) = line.strip_prefix('/') else {
            self.load(line);
            return Ok(Flow::Continue);
        };

        let (name, args) = command
            .split_once(char::is_whitespace)
            .unwrap_or((command, ""));
        match name.to_lowercase().as_str() {
            "record" | "r" => self.record(args).await?,
            "geo" => self.geo().await?,
            "reload" => print_tag_view(&self.tracker.view()?),
            "release" => match self.tracker.release()? {
                Some(tag) => success(format!("Released {tag}.")),
                None => info("No tag loaded."),
            },
            "show" => print_session_status(&self.tracker),
            "queue" => print_queue(self.tracker.queue()),
            "sync" => self.sync(Trigger::Manual).await,
            "refresh" => self.refresh().await?,
            "help" | "?" => println!("{HELP}"),
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            other => warning(format!("Unknown command /{other}. Type /help.")),
        }
        Ok(Flow::Continue)
    }
}

pub async fn handle(cli: &Cli, cfg: &Config, scan_file: Option<&str>) -> AppResult<()> {
    let tracker = super::open_tracker(cfg)?;
    let url = api_url(tracker.conn(), cfg)?;

    let backend = match backend(tracker.conn(), cfg) {
        Ok(b) => Some(b),
        Err(AppError::Config(msg)) => {
            warning(format!("{msg}: working offline only."));
            None
        }
        Err(e) => return Err(e),
    };
    let network: Box<dyn Connectivity> = match (&backend, cli.offline) {
        (Some(_), false) => Box::new(TcpProbe::for_url(&url, Duration::from_secs(3))?),
        _ => Box::new(ManualConnectivity::new(false)),
    };

    // Interactive stdin is read on a plain thread: a blocked read must not
    // hold the runtime open after /quit. Closing stdin ends the session.
    let (line_tx, lines) = mpsc::channel::<String>(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    let (scan_tx, mut scans) = mpsc::channel::<String>(16);
    let scanner = scan_file.map(|path| {
        info(format!("Watching {path} for scans."));
        spawn_scan_loop(
            FileCaptureSource::new(path),
            Duration::from_millis(cfg.scan_poll_ms),
            Duration::from_millis(cfg.scan_debounce_ms),
            scan_tx.clone(),
        )
    });
    drop(scan_tx);

    let (confirmer, questions) = ChannelConfirmer::channel(1);
    let scheduler = Scheduler::new(cfg.scheduler_tick(), cfg.sync_threshold());

    let mut session = FieldSession {
        cfg,
        tracker,
        backend,
        network,
        locator: geolocator(cfg, None),
        confirmer,
        questions,
        lines,
        watch: ConnectivityWatch::default(),
        scheduler,
    };

    let mut visibility = VisibilityWatch::new()?;
    let mut ticker = tokio::time::interval(session.scheduler.tick);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    header("tagtrack field mode");
    println!("{HELP}\n");
    print_session_status(&session.tracker);
    if let Ok(view) = session.tracker.view() {
        print_tag_view(&view);
    }

    prompt();
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => session.on_tick().await,
            _ = visibility.regained() => {
                debug!("session back in the foreground");
                session.sync(Trigger::VisibilityRegained).await;
            }
            Some(value) = scans.recv() => {
                session.on_scan(&value);
                prompt();
            }
            line = session.lines.recv() => {
                let Some(line) = line else { break };
                match session.on_line(&line).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => error(e),
                }
                prompt();
            }
        }
    }

    if let Some(handle) = scanner {
        handle.abort();
    }

    println!();
    print_session_status(&session.tracker);
    session.tracker.close()
}
