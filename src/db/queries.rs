use crate::errors::{AppError, AppResult};
use crate::models::{PendingEvent, Status, TagRecord};
use chrono::{DateTime, Local, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use uuid::Uuid;

/// Keys of the `settings` table.
pub mod keys {
    pub const API_URL: &str = "api_url";
    pub const DEVICE_ID: &str = "device_id";
    pub const LAST_SYNC_AT: &str = "last_sync_at";
    pub const CURRENT_TAG: &str = "current_tag";
    pub const LOGIN: &str = "login";
    pub const FULL_NAME: &str = "full_name";
    pub const LOGGED_IN: &str = "logged_in";
}

// ---------------------------
// settings
// ---------------------------

pub fn get_setting(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn delete_setting(conn: &Connection, key: &str) -> AppResult<()> {
    conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
    Ok(())
}

// ---------------------------
// tags (status cache)
// ---------------------------

pub fn load_tags(conn: &Connection) -> AppResult<Vec<(String, TagRecord)>> {
    let mut stmt = conn.prepare("SELECT tag, status, sector, class FROM tags ORDER BY tag ASC")?;
    let rows = stmt.query_map([], map_tag_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn map_tag_row(row: &Row) -> Result<(String, TagRecord)> {
    let tag: String = row.get("tag")?;
    let status_str: String = row.get("status")?;
    let status = parse_status_column(&status_str)?;

    Ok((
        tag,
        TagRecord {
            status,
            sector: row.get("sector")?,
            class: row.get("class")?,
        },
    ))
}

/// Replace the whole table in one transaction: either every row of the new
/// snapshot is stored or the previous snapshot stays intact.
pub fn replace_tags<'a, I>(conn: &Connection, rows: I) -> AppResult<()>
where
    I: IntoIterator<Item = (&'a String, &'a TagRecord)>,
{
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM tags", [])?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO tags (tag, status, sector, class) VALUES (?1, ?2, ?3, ?4)")?;
        for (tag, rec) in rows {
            stmt.execute(params![tag, rec.status.to_wire(), rec.sector, rec.class])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn update_tag_status(conn: &Connection, tag: &str, status: Status) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE tags SET status = ?1 WHERE tag = ?2",
        params![status.to_wire(), tag],
    )?;
    Ok(n)
}

// ---------------------------
// pending_events (offline queue)
// ---------------------------

/// Load the queue, most recent first.
pub fn load_pending_events(conn: &Connection) -> AppResult<Vec<PendingEvent>> {
    let mut stmt = conn.prepare("SELECT * FROM pending_events ORDER BY seq DESC")?;
    let rows = stmt.query_map([], map_event_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn map_event_row(row: &Row) -> Result<PendingEvent> {
    let id_str: String = row.get("event_id")?;
    let event_id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let ts_str: String = row.get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let status_str: String = row.get("status")?;
    let status = parse_status_column(&status_str)?;

    Ok(PendingEvent {
        event_id,
        timestamp,
        tag: row.get("tag")?,
        status,
        user: row.get("user")?,
        lat: row.get("lat")?,
        lon: row.get("lon")?,
        accuracy: row.get("accuracy")?,
        device_id: row.get("device_id")?,
        obs: row.get("obs")?,
    })
}

fn parse_status_column(raw: &str) -> Result<Status> {
    Status::from_wire(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidStatus(raw.to_string())),
        )
    })
}

pub fn insert_pending_event(conn: &Connection, ev: &PendingEvent) -> AppResult<()> {
    conn.execute(
        "INSERT INTO pending_events
            (event_id, timestamp, tag, status, user, lat, lon, accuracy, device_id, obs, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            ev.event_id.to_string(),
            ev.timestamp_str(),
            ev.tag,
            ev.status.to_wire(),
            ev.user,
            ev.lat,
            ev.lon,
            ev.accuracy,
            ev.device_id,
            ev.obs,
            Local::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Delete the given events in one transaction. Ids no longer present are
/// ignored, so repeating a removal is harmless.
pub fn delete_pending_events(conn: &Connection, ids: &[Uuid]) -> AppResult<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut removed = 0;
    {
        let mut stmt = tx.prepare("DELETE FROM pending_events WHERE event_id = ?1")?;
        for id in ids {
            removed += stmt.execute([id.to_string()])?;
        }
    }
    tx.commit()?;
    Ok(removed)
}

pub fn count_pending_events(conn: &Connection) -> AppResult<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM pending_events", [], |row| row.get(0))?;
    Ok(n)
}
