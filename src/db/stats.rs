use crate::db::pool::DbPool;
use crate::db::migrate::applied_versions;
use crate::db::queries::{count_pending_events, get_setting, keys};
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_kb = (file_size as f64) / 1024.0;

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.1} KB", CYAN, RESET, file_kb);

    //
    // 2) STATUS CACHE
    //
    let tags: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
    println!("{}• Cached tags:{} {}{}{}", CYAN, RESET, GREEN, tags, RESET);

    let mut stmt = pool
        .conn
        .prepare("SELECT status, COUNT(*) FROM tags GROUP BY status ORDER BY status ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for r in rows {
        let (status, n) = r?;
        println!("    {:<14} {}", status, n);
    }

    //
    // 3) QUEUE
    //
    let pending = count_pending_events(&pool.conn)?;
    println!(
        "{}• Pending events:{} {}{}{}",
        CYAN, RESET, GREEN, pending, RESET
    );

    let oldest: Option<String> = pool
        .conn
        .query_row(
            "SELECT timestamp FROM pending_events ORDER BY seq ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(ts) = oldest {
        println!("    oldest: {}", ts);
    }

    //
    // 4) LAST SYNC
    //
    let last_sync = get_setting(&pool.conn, keys::LAST_SYNC_AT)?
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    println!("{}• Last sync:{} {}", CYAN, RESET, last_sync);

    //
    // 5) SCHEMA
    //
    let versions = applied_versions(&pool.conn)?;
    let latest = versions.last().map(String::as_str).unwrap_or("--");
    println!(
        "{}• Schema:{} {} migrations (latest {})",
        CYAN,
        RESET,
        versions.len(),
        latest
    );

    println!();
    Ok(())
}
