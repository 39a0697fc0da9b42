//! The inspection session.
//!
//! `Tracker` owns everything a field session mutates: the status cache, the
//! event queue, the tag hold and the operator identity. It is hydrated from
//! the local database on `open` and written back on `close`; every mutation
//! in between is persisted before it becomes visible in memory.

use crate::capability::confirm::{Confirmer, Decision};
use crate::capability::geo::{self, Geolocator};
use crate::capability::network::Connectivity;
use crate::config::Config;
use crate::core::cache::{RefreshReport, StatusCache};
use crate::core::hold::{HoldState, LoadOutcome};
use crate::core::policy::{self, ActionPanel, ConfirmRequest, ConfirmationPolicy, Gate};
use crate::core::queue::EventQueue;
use crate::db::initialize::{ensure_device_id, init_db};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{delete_setting, get_setting, keys, set_setting};
use crate::errors::{AppError, AppResult};
use crate::models::{GeoFix, Lookup, OBS_LOCATION_REFRESH, PendingEvent, Status};
use crate::remote::{BatchPayload, EventSubmitter, LoginGrant, StatusSource, SubmitReply};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub policy: ConfirmationPolicy,
    pub require_login: bool,
    /// Recorded as `usuario` when nobody is logged in.
    pub fallback_user: String,
    pub geo_timeout: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            policy: ConfirmationPolicy::ReopenOnly,
            require_login: false,
            fallback_user: "campo".to_string(),
            geo_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&Config> for TrackerOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            policy: cfg.confirmation_policy,
            require_login: cfg.require_login,
            fallback_user: cfg.fallback_user.clone(),
            geo_timeout: Duration::from_secs(cfg.geo_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operator {
    pub login: Option<String>,
    pub full_name: String,
    pub logged_in: bool,
}

/// What the operator sees after loading a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagView {
    pub tag: String,
    pub lookup: Lookup,
    pub panel: ActionPanel,
    /// The tag was already held (manual refresh of the same tag).
    pub reloaded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    pub obs: String,
    /// Coordinates supplied by the caller; skips the geolocator.
    pub fix: Option<GeoFix>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Stored in the offline queue.
    Queued(PendingEvent),
    /// Accepted by the backend through a direct submission.
    Submitted(PendingEvent),
    /// The operator did not confirm; nothing was recorded and the hold stays.
    Declined {
        request: ConfirmRequest,
        decision: Decision,
    },
}

impl RecordOutcome {
    pub fn event(&self) -> Option<&PendingEvent> {
        match self {
            RecordOutcome::Queued(ev) | RecordOutcome::Submitted(ev) => Some(ev),
            RecordOutcome::Declined { .. } => None,
        }
    }
}

enum Prepared {
    Ready(PendingEvent),
    Declined(RecordOutcome),
}

pub struct Tracker {
    pool: DbPool,
    options: TrackerOptions,
    device_id: String,
    operator: Operator,
    cache: StatusCache,
    queue: EventQueue,
    hold: HoldState,
    last_sync_at: Option<DateTime<Utc>>,
}

impl Tracker {
    /// Open a session on `pool`, creating the schema and the device id on
    /// first use.
    pub fn open(pool: DbPool, options: TrackerOptions) -> AppResult<Self> {
        init_db(&pool.conn)?;
        let conn = &pool.conn;

        let device_id = ensure_device_id(conn)?;

        let operator = Operator {
            login: get_setting(conn, keys::LOGIN)?.filter(|l| !l.is_empty()),
            full_name: get_setting(conn, keys::FULL_NAME)?.unwrap_or_default(),
            logged_in: get_setting(conn, keys::LOGGED_IN)?.as_deref() == Some("1"),
        };

        let last_sync_at = match get_setting(conn, keys::LAST_SYNC_AT)? {
            Some(raw) if !raw.is_empty() => match DateTime::parse_from_rfc3339(&raw) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    warn!(%raw, error = %e, "ignoring unreadable last sync timestamp");
                    None
                }
            },
            _ => None,
        };

        let cache = StatusCache::hydrate(conn)?;
        let queue = EventQueue::hydrate(conn)?;
        let hold = HoldState::restore(get_setting(conn, keys::CURRENT_TAG)?);

        debug!(
            tags = cache.len(),
            pending = queue.size(),
            held = ?hold.current(),
            "session hydrated"
        );

        Ok(Self {
            pool,
            options,
            device_id,
            operator,
            cache,
            queue,
            hold,
            last_sync_at,
        })
    }

    /// Flush session scalars and release the database.
    pub fn close(self) -> AppResult<()> {
        self.persist_hold()?;
        if let Some(at) = self.last_sync_at {
            set_setting(&self.pool.conn, keys::LAST_SYNC_AT, &at.to_rfc3339())?;
        }
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.pool.conn
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn hold(&self) -> &HoldState {
        &self.hold
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    /// Identity written into events and batches.
    pub fn event_user(&self) -> String {
        match &self.operator.login {
            Some(login) if self.operator.logged_in => login.clone(),
            _ => self.options.fallback_user.clone(),
        }
    }

    fn persist_hold(&self) -> AppResult<()> {
        match self.hold.current() {
            Some(tag) => set_setting(&self.pool.conn, keys::CURRENT_TAG, tag),
            None => delete_setting(&self.pool.conn, keys::CURRENT_TAG),
        }
    }

    fn ensure_operator(&self) -> AppResult<()> {
        if self.options.require_login && !self.operator.logged_in {
            return Err(AppError::LoginRequired);
        }
        Ok(())
    }

    // ---------------------------
    // Hold
    // ---------------------------

    pub fn lookup(&self, tag: &str) -> Lookup {
        self.cache.lookup(tag)
    }

    fn view_of(&self, tag: &str, reloaded: bool) -> TagView {
        let lookup = self.cache.lookup(tag);
        let panel = ActionPanel::for_lookup(&lookup);
        TagView {
            tag: tag.to_string(),
            lookup,
            panel,
            reloaded,
        }
    }

    /// Load a scanned or typed tag. Fails with `HoldConflict` while another
    /// tag is in progress.
    pub fn load_tag(&mut self, raw: &str) -> AppResult<TagView> {
        match self.hold.load(raw)? {
            LoadOutcome::Loaded(tag) => {
                self.persist_hold()?;
                ttlog_quiet(&self.pool.conn, "load", &tag, "Tag loaded");
                Ok(self.view_of(&tag, false))
            }
            LoadOutcome::Reloaded(tag) => Ok(self.view_of(&tag, true)),
        }
    }

    /// Current state of the held tag.
    pub fn view(&self) -> AppResult<TagView> {
        let tag = self.hold.require()?;
        Ok(self.view_of(tag, true))
    }

    /// Drop the hold without recording anything.
    pub fn release(&mut self) -> AppResult<Option<String>> {
        let released = self.hold.release();
        if let Some(tag) = &released {
            self.persist_hold()?;
            ttlog_quiet(&self.pool.conn, "release", tag, "Hold released without event");
        }
        Ok(released)
    }

    // ---------------------------
    // Recording
    // ---------------------------

    async fn prepare_event(
        &self,
        status: Status,
        opts: RecordOptions,
        locator: &dyn Geolocator,
        confirmer: &dyn Confirmer,
    ) -> AppResult<Prepared> {
        self.ensure_operator()?;
        let tag = self.hold.require()?.to_string();
        let current = self.cache.lookup(&tag);
        let mut obs = opts.obs;

        if let Gate::Confirm(request) = policy::evaluate(self.options.policy, &tag, &current, status)
        {
            let decision = confirmer.confirm(&request).await;
            if !decision.is_confirmed() {
                debug!(%tag, ?decision, "status change not confirmed");
                return Ok(Prepared::Declined(RecordOutcome::Declined { request, decision }));
            }
            if request.is_location_refresh() && obs.is_empty() {
                obs = OBS_LOCATION_REFRESH.to_string();
            }
        }

        let fix = match opts.fix {
            Some(fix) => fix,
            None => geo::acquire(locator, self.options.geo_timeout).await,
        };

        Ok(Prepared::Ready(PendingEvent::new(
            &tag,
            status,
            &self.event_user(),
            fix,
            &self.device_id,
            &obs,
        )))
    }

    /// Reflect an accepted event locally: cache status, hold cleared.
    fn settle(&mut self, event: &PendingEvent) -> AppResult<()> {
        self.cache
            .apply_local_status_update(&self.pool.conn, &event.tag, event.status)?;
        self.hold.complete();
        self.persist_hold()
    }

    fn commit_event(&mut self, event: PendingEvent) -> AppResult<PendingEvent> {
        self.queue.enqueue(&self.pool.conn, event.clone())?;
        self.settle(&event)?;

        ttlog_quiet(
            &self.pool.conn,
            "record",
            &event.tag,
            &format!(
                "{} -> {} (user={}) queued",
                event.tag,
                event.status.to_wire(),
                event.user
            ),
        );
        Ok(event)
    }

    /// Record a new status for the held tag into the offline queue.
    ///
    /// Gated by the confirmation policy; on success the hold is cleared.
    pub async fn record_event(
        &mut self,
        status: Status,
        opts: RecordOptions,
        locator: &dyn Geolocator,
        confirmer: &dyn Confirmer,
    ) -> AppResult<RecordOutcome> {
        match self.prepare_event(status, opts, locator, confirmer).await? {
            Prepared::Ready(event) => Ok(RecordOutcome::Queued(self.commit_event(event)?)),
            Prepared::Declined(outcome) => Ok(outcome),
        }
    }

    /// Location-only refresh, offered for completed tags. Records straight
    /// away: same status, fresh coordinates.
    pub async fn refresh_location(
        &mut self,
        fix: Option<GeoFix>,
        locator: &dyn Geolocator,
    ) -> AppResult<RecordOutcome> {
        self.ensure_operator()?;
        let tag = self.hold.require()?.to_string();
        if self.cache.lookup(&tag).status() != Some(Status::Completed) {
            return Err(AppError::Validation(format!(
                "location refresh is only available for {} tags",
                Status::Completed
            )));
        }

        let fix = match fix {
            Some(fix) => fix,
            None => geo::acquire(locator, self.options.geo_timeout).await,
        };
        let event = PendingEvent::new(
            &tag,
            Status::Completed,
            &self.event_user(),
            fix,
            &self.device_id,
            OBS_LOCATION_REFRESH,
        );
        Ok(RecordOutcome::Queued(self.commit_event(event)?))
    }

    /// Submit the event straight to the backend, honouring a server-side
    /// confirmation request. Falls back to the queue when offline or when
    /// the request cannot be sent.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_direct(
        &mut self,
        status: Status,
        opts: RecordOptions,
        locator: &dyn Geolocator,
        confirmer: &dyn Confirmer,
        submitter: &dyn EventSubmitter,
        network: &dyn Connectivity,
    ) -> AppResult<RecordOutcome> {
        let event = match self.prepare_event(status, opts, locator, confirmer).await? {
            Prepared::Ready(event) => event,
            Prepared::Declined(outcome) => return Ok(outcome),
        };

        if !network.is_online().await {
            debug!(tag = %event.tag, "offline, queueing instead of submitting");
            return Ok(RecordOutcome::Queued(self.commit_event(event)?));
        }

        let mut confirm = false;
        loop {
            match submitter.submit(&event, confirm).await {
                Ok(SubmitReply::Accepted) => {
                    self.settle(&event)?;
                    ttlog_quiet(
                        &self.pool.conn,
                        "submit",
                        &event.tag,
                        &format!("{} -> {} (user={})", event.tag, event.status.to_wire(), event.user),
                    );
                    return Ok(RecordOutcome::Submitted(event));
                }
                Ok(SubmitReply::NeedsConfirm { last_status }) if !confirm => {
                    let request = ConfirmRequest::ServerConflict {
                        tag: event.tag.clone(),
                        last_status,
                        to: event.status,
                    };
                    let decision = confirmer.confirm(&request).await;
                    if !decision.is_confirmed() {
                        return Ok(RecordOutcome::Declined { request, decision });
                    }
                    confirm = true;
                }
                Ok(SubmitReply::NeedsConfirm { last_status }) => {
                    return Err(AppError::Remote(format!(
                        "backend still asks for confirmation (last status {last_status})"
                    )));
                }
                Ok(SubmitReply::Rejected(reason)) => return Err(AppError::Remote(reason)),
                Err(AppError::Http(e)) => {
                    warn!(error = %e, tag = %event.tag, "direct submission failed, queueing");
                    return Ok(RecordOutcome::Queued(self.commit_event(event)?));
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ---------------------------
    // Backend reconciliation
    // ---------------------------

    /// Replace the status cache with the backend's table.
    pub async fn refresh(&mut self, source: &dyn StatusSource) -> AppResult<RefreshReport> {
        let report = self.cache.refresh(&self.pool.conn, source).await?;
        ttlog_quiet(
            &self.pool.conn,
            "refresh",
            "",
            &format!("Status table downloaded: {} tags", report.tags),
        );
        Ok(report)
    }

    /// Batch of the oldest pending events, wrapped for the sink.
    pub fn next_batch(&self, max: usize) -> BatchPayload {
        BatchPayload {
            device_id: self.device_id.clone(),
            user: self.event_user(),
            events: self.queue.drain_batch(max),
        }
    }

    /// Remove a dispatched batch from the queue.
    pub fn commit_batch(&mut self, batch: &BatchPayload) -> AppResult<usize> {
        self.queue.commit_sent(&self.pool.conn, &batch.events)
    }

    pub fn touch_last_sync(&mut self, at: DateTime<Utc>) -> AppResult<()> {
        set_setting(&self.pool.conn, keys::LAST_SYNC_AT, &at.to_rfc3339())?;
        self.last_sync_at = Some(at);
        Ok(())
    }

    // ---------------------------
    // Operator
    // ---------------------------

    pub fn sign_in(&mut self, grant: &LoginGrant) -> AppResult<()> {
        let conn = &self.pool.conn;
        set_setting(conn, keys::LOGIN, &grant.login)?;
        set_setting(conn, keys::FULL_NAME, &grant.full_name)?;
        set_setting(conn, keys::LOGGED_IN, "1")?;

        self.operator = Operator {
            login: Some(grant.login.clone()),
            full_name: grant.full_name.clone(),
            logged_in: true,
        };
        ttlog_quiet(conn, "login", &grant.login, "Operator signed in");
        Ok(())
    }

    pub fn sign_out(&mut self) -> AppResult<()> {
        let conn = &self.pool.conn;
        set_setting(conn, keys::LOGGED_IN, "0")?;
        delete_setting(conn, keys::LOGIN)?;
        delete_setting(conn, keys::FULL_NAME)?;

        if let Some(login) = self.operator.login.take() {
            ttlog_quiet(conn, "logout", &login, "Operator signed out");
        }
        self.operator = Operator::default();
        Ok(())
    }
}
