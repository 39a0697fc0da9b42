//! tagtrack library root.
//! Exposes the CLI parser, the async `run()` entry point and the session
//! modules, so integration tests can drive the tracker without the binary.

pub mod capability;
pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod remote;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use tracing_subscriber::EnvFilter;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => commands::init::handle(cli, cfg),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg),
        Commands::Login { .. } => commands::auth::login(cli, cfg).await,
        Commands::Logout => commands::auth::logout(cfg),
        Commands::Passwd { .. } => commands::auth::passwd(cli, cfg).await,
        Commands::Refresh => commands::sync::refresh(cli, cfg).await,
        Commands::Load { tag } => commands::tag::load(tag, cfg),
        Commands::Show => commands::tag::show(cfg),
        Commands::Release => commands::tag::release(cfg),
        Commands::Lookup { tag } => commands::tag::lookup(tag, cfg),
        Commands::Record { .. } => commands::record::record(cli, cfg).await,
        Commands::Geo { .. } => commands::record::geo(cli, cfg).await,
        Commands::Sync { .. } => commands::sync::sync(cli, cfg).await,
        Commands::Queue { .. } => commands::sync::queue(&cli.command, cfg),
        Commands::Field { scan_file } => {
            commands::field::handle(cli, cfg, scan_file.as_deref()).await
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "tagtrack=warn",
        1 => "tagtrack=info",
        _ => "tagtrack=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point used by main.rs
pub async fn run() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // config is loaded once; --db wins over the configured database
    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg).await
}
