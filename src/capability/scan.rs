//! Capture capability: a source that yields decoded tag strings.
//!
//! The polling loop runs as its own task and only forwards values; the
//! hold check happens on the consumer side, one value at a time.

use crate::errors::AppResult;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

#[async_trait]
pub trait CaptureSource: Send {
    /// Latest decoded value, if a new decode happened since the last poll.
    async fn poll_decode(&mut self) -> AppResult<Option<String>>;
}

/// A file an external scanner overwrites with each decoded value.
pub struct FileCaptureSource {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl FileCaptureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
        }
    }
}

#[async_trait]
impl CaptureSource for FileCaptureSource {
    async fn poll_decode(&mut self) -> AppResult<Option<String>> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let modified = meta.modified().ok();
        if modified.is_some() && modified == self.last_modified {
            return Ok(None);
        }
        self.last_modified = modified;

        let content = tokio::fs::read_to_string(&self.path).await?;
        let value = content.lines().next().unwrap_or_default().trim().to_string();
        Ok(if value.is_empty() { None } else { Some(value) })
    }
}

/// Drops a value identical to the previous one seen within `window`.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn accept(&mut self, value: &str, now: Instant) -> bool {
        if let Some((prev, at)) = &self.last
            && prev == value
            && now.duration_since(*at) <= self.window
        {
            return false;
        }
        self.last = Some((value.to_string(), now));
        true
    }
}

/// Poll `source` every `period`, forwarding debounced values to `tx`.
///
/// The task stops when the receiver is dropped or when the returned handle
/// is aborted.
pub fn spawn_scan_loop<S>(
    mut source: S,
    period: Duration,
    debounce: Duration,
    tx: mpsc::Sender<String>,
) -> JoinHandle<()>
where
    S: CaptureSource + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut debouncer = Debouncer::new(debounce);

        loop {
            ticker.tick().await;
            match source.poll_decode().await {
                Ok(Some(value)) => {
                    if !debouncer.accept(&value, Instant::now()) {
                        continue;
                    }
                    debug!(%value, "decoded");
                    if tx.send(value).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "capture source failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_value_is_dropped_inside_the_window_only() {
        let mut d = Debouncer::new(Duration::from_millis(2000));
        let t0 = Instant::now();

        assert!(d.accept("T1", t0));
        assert!(!d.accept("T1", t0 + Duration::from_millis(500)));
        assert!(d.accept("T2", t0 + Duration::from_millis(600)));
        assert!(d.accept("T1", t0 + Duration::from_millis(700)));
        assert!(d.accept("T1", t0 + Duration::from_millis(3000)));
    }

    struct Scripted(Vec<Option<String>>);

    #[async_trait]
    impl CaptureSource for Scripted {
        async fn poll_decode(&mut self) -> AppResult<Option<String>> {
            Ok(if self.0.is_empty() {
                None
            } else {
                self.0.remove(0)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loop_forwards_decoded_values_until_aborted() {
        let source = Scripted(vec![
            Some("A-1".into()),
            Some("A-1".into()),
            None,
            Some("B-2".into()),
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = spawn_scan_loop(
            source,
            Duration::from_millis(250),
            Duration::from_millis(2000),
            tx,
        );

        assert_eq!(rx.recv().await.as_deref(), Some("A-1"));
        assert_eq!(rx.recv().await.as_deref(), Some("B-2"));

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
