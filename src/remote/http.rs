//! HTTP backend (a single script endpoint that dispatches on `action`).

use super::{
    Authenticator, BatchPayload, BatchSink, Delivery, EventSubmitter, LoginGrant, RemoteTag,
    StatusSource, StatusTableResponse, SubmitReply,
};
use crate::errors::{AppError, AppResult};
use crate::models::PendingEvent;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Plain text keeps the request "simple" for script backends that reject
/// JSON preflights.
const TEXT_PLAIN: &str = "text/plain;charset=utf-8";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    need_confirm: bool,
    #[serde(default, deserialize_with = "super::lenient_string")]
    last_status: Option<String>,
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    nome_completo: Option<String>,
    #[serde(default)]
    trocar_senha: bool,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

impl HttpBackend {
    pub fn new(api_url: &str) -> AppResult<Self> {
        let api_url = api_url.trim();
        reqwest::Url::parse(api_url)
            .map_err(|e| AppError::Config(format!("invalid api url '{api_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn parse_body<T: DeserializeOwned>(text: &str) -> AppResult<T> {
        serde_json::from_str(text).map_err(|_| {
            let snippet: String = text.chars().take(200).collect();
            AppError::Remote(format!("invalid response from server: {snippet}"))
        })
    }

    async fn post_json(&self, payload: &serde_json::Value) -> AppResult<ApiReply> {
        let res = self
            .client
            .post(&self.api_url)
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .body(payload.to_string())
            .send()
            .await?;
        let text = res.text().await?;
        Self::parse_body(&text)
    }
}

#[async_trait]
impl StatusSource for HttpBackend {
    async fn fetch_status_table(&self) -> AppResult<Vec<RemoteTag>> {
        info!(url = %self.api_url, "downloading status table");

        let res = self
            .client
            .get(&self.api_url)
            .query(&[("action", "base")])
            .send()
            .await?;
        let text = res.text().await?;
        let body: StatusTableResponse = Self::parse_body(&text)?;

        if !body.ok {
            return Err(AppError::Remote(
                body.error
                    .unwrap_or_else(|| "failed to download status table".into()),
            ));
        }
        Ok(body.tags)
    }
}

#[async_trait]
impl BatchSink for HttpBackend {
    /// Fire-and-forget: once the request has been sent the batch is
    /// considered delivered, whatever comes back.
    async fn dispatch(&self, batch: &BatchPayload) -> AppResult<Delivery> {
        let body = serde_json::to_string(batch)?;
        let res = self
            .client
            .post(&self.api_url)
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .body(body)
            .send()
            .await?;

        debug!(status = %res.status(), events = batch.events.len(), "batch handed over");
        Ok(Delivery::Assumed)
    }
}

#[async_trait]
impl EventSubmitter for HttpBackend {
    async fn submit(&self, event: &PendingEvent, confirm: bool) -> AppResult<SubmitReply> {
        let payload = json!({
            "action": "evento",
            "evento": event,
            "confirm": confirm,
        });
        let reply = self.post_json(&payload).await?;

        Ok(if reply.ok {
            SubmitReply::Accepted
        } else if reply.need_confirm {
            SubmitReply::NeedsConfirm {
                last_status: reply.last_status.unwrap_or_default(),
            }
        } else {
            SubmitReply::Rejected(reply.error.unwrap_or_else(|| "event rejected".into()))
        })
    }
}

#[async_trait]
impl Authenticator for HttpBackend {
    async fn login(&self, login: &str, password: &str) -> AppResult<LoginGrant> {
        let payload = json!({ "action": "login", "login": login, "senha": password });
        let reply = self.post_json(&payload).await?;

        if !reply.ok {
            return Err(AppError::Remote(
                reply.error.unwrap_or_else(|| "login failed".into()),
            ));
        }
        Ok(LoginGrant {
            login: reply.login.unwrap_or_else(|| login.to_string()),
            full_name: reply.nome_completo.unwrap_or_default(),
            must_change_password: reply.trocar_senha,
        })
    }

    async fn change_password(&self, login: &str, current: &str, new: &str) -> AppResult<()> {
        let payload = json!({
            "action": "trocar_senha",
            "login": login,
            "senhaAtual": current,
            "novaSenha": new,
        });
        let reply = self.post_json(&payload).await?;

        if !reply.ok {
            return Err(AppError::Remote(
                reply.error.unwrap_or_else(|| "password change failed".into()),
            ));
        }
        Ok(())
    }
}
