use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::tracker::{Tracker, TrackerOptions};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped in test mode)
///  - the SQLite database with all pending migrations
///  - the device identifier
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let db_path = Config::init_all(cli.db.clone(), cli.test)?;

    println!("⚙️  Initializing tagtrack…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", &db_path);

    let pool = DbPool::new(&db_path)?;
    let tracker = Tracker::open(pool, TrackerOptions::from(cfg))?;

    println!("📱 Device id  : {}", tracker.device_id());
    ttlog_quiet(
        tracker.conn(),
        "init",
        "",
        &format!("Database initialized at {}", &db_path),
    );
    tracker.close()?;

    println!("🎉 tagtrack initialization completed!");
    Ok(())
}
