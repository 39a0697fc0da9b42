//! Backend seams.
//!
//! The backend is two opaque endpoints (a status-table read and an event
//! sink) plus the login helpers. Each concern is its own trait so the core
//! never depends on how the bytes travel.

pub mod http;

use crate::errors::AppResult;
use crate::models::PendingEvent;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

pub use http::HttpBackend;

/// One row of the backend's status table. Every field is optional on the
/// wire; spreadsheet backends also send numbers where text is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTag {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub setor: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub classe: Option<String>,
}

impl RemoteTag {
    pub fn new(tag: &str, status: &str, setor: &str, classe: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            status: Some(status.to_string()),
            setor: Some(setor.to_string()),
            classe: Some(classe.to_string()),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// `GET ?action=base` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusTableResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub tags: Vec<RemoteTag>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a batch delivery.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPayload {
    pub device_id: String,
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(rename = "eventos")]
    pub events: Vec<PendingEvent>,
}

/// What a sink knows after handing a batch over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Request left the device; the response is not observable.
    Assumed,
    /// The backend confirmed it stored the batch.
    Acknowledged,
}

/// Reply to a single direct submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply {
    Accepted,
    /// The backend wants an explicit confirmation; carries its last status.
    NeedsConfirm { last_status: String },
    Rejected(String),
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub login: String,
    pub full_name: String,
    /// First access: the backend asks for a password change.
    pub must_change_password: bool,
}

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Full status table. Fails with `Remote` when the backend reports
    /// `ok:false` or the body cannot be parsed.
    async fn fetch_status_table(&self) -> AppResult<Vec<RemoteTag>>;
}

/// Event ingestion for queued batches.
///
/// Returning `Ok` means the batch was handed over; the caller commits it.
/// With [`Delivery::Assumed`] correctness depends on the backend ignoring
/// an `event_id` it has already stored.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn dispatch(&self, batch: &BatchPayload) -> AppResult<Delivery>;
}

/// Immediate single-event submission with server-side conflict signalling.
#[async_trait]
pub trait EventSubmitter: Send + Sync {
    async fn submit(&self, event: &PendingEvent, confirm: bool) -> AppResult<SubmitReply>;
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, login: &str, password: &str) -> AppResult<LoginGrant>;
    async fn change_password(&self, login: &str, current: &str, new: &str) -> AppResult<()>;
}
