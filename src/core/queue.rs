//! Durable queue of events waiting for transmission.
//!
//! Order is most-recent-first: new events go to the front, batches are taken
//! from the back (oldest). Every mutation is one SQLite transaction and the
//! in-memory copy is only touched after that transaction succeeded, so a
//! crash can never leave a half-written queue.

use crate::db::queries::{delete_pending_events, insert_pending_event, load_pending_events};
use crate::errors::{AppError, AppResult};
use crate::models::PendingEvent;
use rusqlite::Connection;
use std::collections::VecDeque;
use uuid::Uuid;

/// Upper bound of events per transmitted batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<PendingEvent>,
}

impl EventQueue {
    pub fn hydrate(conn: &Connection) -> AppResult<Self> {
        let events = load_pending_events(conn)?.into();
        Ok(Self { events })
    }

    pub fn size(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &PendingEvent> {
        self.events.iter()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.events.iter().any(|e| e.event_id == *id)
    }

    /// Insert at the front and persist.
    pub fn enqueue(&mut self, conn: &Connection, event: PendingEvent) -> AppResult<()> {
        if self.contains(&event.event_id) {
            return Err(AppError::Validation(format!(
                "duplicate event id {}",
                event.event_id
            )));
        }
        let tx = conn.unchecked_transaction()?;
        insert_pending_event(&tx, &event)?;
        tx.commit()?;

        self.events.push_front(event);
        Ok(())
    }

    /// Up to `max` of the oldest events, in queue order. Nothing is removed.
    pub fn drain_batch(&self, max: usize) -> Vec<PendingEvent> {
        let start = self.events.len().saturating_sub(max);
        self.events.range(start..).cloned().collect()
    }

    /// Remove the `count` oldest events.
    pub fn commit_batch(&mut self, conn: &Connection, count: usize) -> AppResult<usize> {
        let batch = self.drain_batch(count);
        self.commit_sent(conn, &batch)
    }

    /// Remove exactly the events of a batch that was handed to the
    /// transport. Events already gone are skipped, so committing the same
    /// batch twice removes nothing the second time.
    pub fn commit_sent(&mut self, conn: &Connection, batch: &[PendingEvent]) -> AppResult<usize> {
        let ids: Vec<Uuid> = batch.iter().map(|e| e.event_id).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        delete_pending_events(conn, &ids)?;

        let before = self.events.len();
        self.events.retain(|e| !ids.contains(&e.event_id));
        Ok(before - self.events.len())
    }
}
