//! Connectivity: is the backend reachable right now?

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;

#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Online when a TCP connection to the backend host can be opened.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn for_url(api_url: &str, timeout: Duration) -> AppResult<Self> {
        let url = reqwest::Url::parse(api_url.trim())
            .map_err(|e| AppError::Config(format!("invalid api url '{api_url}': {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| AppError::Config(format!("api url '{api_url}' has no host")))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| AppError::Config(format!("api url '{api_url}' has no port")))?;
        Ok(Self {
            host,
            port,
            timeout,
        })
    }
}

#[async_trait]
impl Connectivity for TcpProbe {
    async fn is_online(&self) -> bool {
        let addr = (self.host.as_str(), self.port);
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }
}

/// Connectivity decided by the caller (`--offline`, tests).
#[derive(Debug, Default)]
pub struct ManualConnectivity {
    online: AtomicBool,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for ManualConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Remembers the last observed state to report offline → online edges.
#[derive(Debug, Default)]
pub struct ConnectivityWatch {
    last: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    WentOnline,
    WentOffline,
}

impl ConnectivityWatch {
    pub fn observe(&mut self, online: bool) -> Transition {
        let prev = self.last.replace(online);
        match (prev, online) {
            (Some(false), true) => Transition::WentOnline,
            (Some(true), false) => Transition::WentOffline,
            _ => Transition::Unchanged,
        }
    }
}
