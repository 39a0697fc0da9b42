//! Drains the event queue to the backend, one bounded batch per call.

use crate::capability::network::Connectivity;
use crate::core::tracker::Tracker;
use crate::db::log::ttlog_quiet;
use crate::errors::AppResult;
use crate::remote::{BatchSink, Delivery};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Why a sync was started. Only used for logging; every trigger runs the
/// same flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Timer,
    ConnectivityRegained,
    VisibilityRegained,
    PostEnqueue,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Manual => "manual",
            Trigger::Timer => "timer",
            Trigger::ConnectivityRegained => "connectivity",
            Trigger::VisibilityRegained => "visibility",
            Trigger::PostEnqueue => "post-enqueue",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No transmission attempted; queue and last-sync untouched.
    Offline,
    /// Nothing to send; last-sync touched.
    Empty,
    Sent {
        count: usize,
        remaining: usize,
        delivery: Delivery,
    },
}

pub struct SyncEngine<'a> {
    sink: &'a dyn BatchSink,
    network: &'a dyn Connectivity,
    batch_size: usize,
}

impl<'a> SyncEngine<'a> {
    pub fn new(sink: &'a dyn BatchSink, network: &'a dyn Connectivity, batch_size: usize) -> Self {
        Self {
            sink,
            network,
            batch_size: batch_size.max(1),
        }
    }

    /// Send the oldest batch and remove it from the queue once the sink
    /// returned. A transport error leaves the queue as it was.
    pub async fn sync(&self, tracker: &mut Tracker, trigger: Trigger) -> AppResult<SyncOutcome> {
        if !self.network.is_online().await {
            info!(%trigger, "sync skipped: offline");
            return Ok(SyncOutcome::Offline);
        }

        if tracker.queue().is_empty() {
            debug!(%trigger, "sync skipped: queue empty");
            tracker.touch_last_sync(Utc::now())?;
            return Ok(SyncOutcome::Empty);
        }

        let batch = tracker.next_batch(self.batch_size);
        let delivery = self.sink.dispatch(&batch).await?;
        let count = tracker.commit_batch(&batch)?;
        tracker.touch_last_sync(Utc::now())?;

        let remaining = tracker.queue().size();
        info!(%trigger, count, remaining, ?delivery, "batch sent");
        ttlog_quiet(
            tracker.conn(),
            "sync",
            "",
            &format!("{count} events sent ({trigger}), {remaining} pending"),
        );

        Ok(SyncOutcome::Sent {
            count,
            remaining,
            delivery,
        })
    }

    /// Repeat `sync` until the queue is empty or a round sends nothing.
    /// Returns the total number of events removed.
    pub async fn sync_all(&self, tracker: &mut Tracker, trigger: Trigger) -> AppResult<(usize, SyncOutcome)> {
        let mut total = 0;
        loop {
            let outcome = self.sync(tracker, trigger).await?;
            match outcome {
                SyncOutcome::Sent {
                    count, remaining, ..
                } if count > 0 && remaining > 0 => total += count,
                SyncOutcome::Sent { count, .. } => return Ok((total + count, outcome)),
                SyncOutcome::Offline | SyncOutcome::Empty => return Ok((total, outcome)),
            }
        }
    }
}

/// Periodic sync check: due when the queue is non-empty and the last
/// successful sync is older than the threshold.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    pub tick: Duration,
    pub threshold: Duration,
}

impl Scheduler {
    pub fn new(tick: Duration, threshold: Duration) -> Self {
        Self { tick, threshold }
    }

    pub fn is_due(&self, now: DateTime<Utc>, last_sync: Option<DateTime<Utc>>, queue_len: usize) -> bool {
        if queue_len == 0 {
            return false;
        }
        let Some(last) = last_sync else {
            return true;
        };
        let threshold = ChronoDuration::from_std(self.threshold).unwrap_or(ChronoDuration::MAX);
        now.signed_duration_since(last) >= threshold
    }
}
