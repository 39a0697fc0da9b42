use rusqlite::{Connection, OptionalExtension, Result};

/// One schema step, applied at most once and recorded in the `log` table.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20260105_0001_create_settings",
        description: "Created settings table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS settings (
            key    TEXT PRIMARY KEY,
            value  TEXT NOT NULL
        );
        "#,
    },
    Migration {
        version: "20260105_0002_create_tags",
        description: "Created tags table (status cache)",
        sql: r#"
        CREATE TABLE IF NOT EXISTS tags (
            tag     TEXT PRIMARY KEY,
            status  TEXT NOT NULL DEFAULT 'PENDENTE',
            sector  TEXT NOT NULL DEFAULT '',
            class   TEXT NOT NULL DEFAULT ''
        );
        "#,
    },
    Migration {
        version: "20260105_0003_create_pending_events",
        description: "Created pending_events table (offline queue)",
        sql: r#"
        CREATE TABLE IF NOT EXISTS pending_events (
            seq        INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id   TEXT NOT NULL UNIQUE,
            timestamp  TEXT NOT NULL,
            tag        TEXT NOT NULL,
            status     TEXT NOT NULL,
            user       TEXT NOT NULL,
            lat        REAL,
            lon        REAL,
            accuracy   REAL,
            device_id  TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_pending_events_tag ON pending_events(tag);
        "#,
    },
    Migration {
        version: "20260114_0004_add_obs_to_pending_events",
        description: "Added obs column to pending_events",
        sql: "ALTER TABLE pending_events ADD COLUMN obs TEXT NOT NULL DEFAULT '';",
    },
];

/// Ensure that the `log` table exists: it is both the audit log and the
/// registry of applied migrations.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(m.sql)?;
    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.version, m.description],
    )?;
    tx.commit()?;

    tracing::info!(version = m.version, "migration applied");
    Ok(())
}

/// Public entry point: run all pending migrations, in order.
///
/// Invoked by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m)?;
        applied += 1;
    }

    Ok(applied)
}

/// Versions recorded as applied, oldest first.
pub fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
