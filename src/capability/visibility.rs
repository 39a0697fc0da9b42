//! Foreground visibility: the session was suspended and is back.
//!
//! On Unix this is `SIGCONT` (the job was resumed with `fg`). Other
//! platforms never report a transition.

use crate::errors::AppResult;

pub struct VisibilityWatch {
    #[cfg(unix)]
    resumed: tokio::signal::unix::Signal,
}

impl VisibilityWatch {
    #[cfg(unix)]
    pub fn new() -> AppResult<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        let resumed = signal(SignalKind::from_raw(libc::SIGCONT))?;
        Ok(Self { resumed })
    }

    #[cfg(not(unix))]
    pub fn new() -> AppResult<Self> {
        Ok(Self {})
    }

    /// Resolves each time the session returns to the foreground.
    pub async fn regained(&mut self) {
        #[cfg(unix)]
        {
            if self.resumed.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        #[cfg(not(unix))]
        std::future::pending::<()>().await
    }
}
