use crate::db::log::ttlog_quiet;
use crate::db::migrate::run_pending_migrations;
use crate::db::queries::{get_setting, keys, set_setting};
use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::time::Duration;
use uuid::Uuid;

/// Bring the schema up to date. Tables only ever come from migrations.
pub fn init_db(conn: &Connection) -> AppResult<()> {
    // the field session and one-shot commands may share the file
    conn.busy_timeout(Duration::from_secs(5))?;

    let applied = run_pending_migrations(conn).map_err(|e| AppError::Migration(e.to_string()))?;
    if applied > 0 {
        tracing::debug!(applied, "schema upgraded");
    }
    Ok(())
}

/// Stable identifier of this installation, generated on first use.
pub fn ensure_device_id(conn: &Connection) -> AppResult<String> {
    if let Some(id) = get_setting(conn, keys::DEVICE_ID)?.filter(|id| !id.trim().is_empty()) {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    set_setting(conn, keys::DEVICE_ID, &id)?;
    ttlog_quiet(conn, "init", &id, "Generated device identifier");
    Ok(id)
}
