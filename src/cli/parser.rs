use clap::{Parser, Subcommand};

/// Command-line interface definition for tagtrack
/// Offline-first field inspection: scan a tag, record its status, sync later
#[derive(Parser)]
#[command(
    name = "tagtrack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Offline-first field inspection tracker: load a tag, record its status, sync when online",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Treat the backend as unreachable: events are only queued
    #[arg(global = true, long = "offline")]
    pub offline: bool,

    /// Print diagnostics on stderr (repeat for more detail)
    #[arg(global = true, short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their default values")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/vim/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,

        #[arg(
            long = "api-url",
            value_name = "URL",
            help = "Store a backend endpoint for this database (overrides api_url)"
        )]
        api_url: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "tail", value_name = "N", help = "Only the last N rows")]
        tail: Option<usize>,
    },

    /// Sign in against the backend
    Login {
        #[arg(long = "user", short = 'u')]
        user: String,

        #[arg(long = "password", short = 'p')]
        password: String,
    },

    /// Forget the signed-in operator
    Logout,

    /// Change the operator password
    Passwd {
        #[arg(long = "current")]
        current: String,

        #[arg(long = "new")]
        new: String,
    },

    /// Download the backend status table and replace the local cache
    Refresh,

    /// Load a tag (scanned or typed) and hold it until an event is recorded
    Load {
        /// Tag identifier
        tag: String,
    },

    /// Show the held tag and the actions available for it
    Show,

    /// Release the held tag without recording anything
    Release,

    /// Look a tag up in the local status cache
    Lookup {
        /// Tag identifier
        tag: String,
    },

    /// Record a status for the held tag
    Record {
        /// CONCLUIDO, PENDENTE, PENDENTE_OBRA, SEM_ACESSO (English names accepted)
        status: String,

        #[arg(long = "yes", short = 'y', help = "Answer yes to any confirmation")]
        yes: bool,

        #[arg(long = "obs", help = "Free text observation")]
        obs: Option<String>,

        #[arg(long = "direct", help = "Submit immediately instead of queueing")]
        direct: bool,

        #[arg(long = "lat", requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long = "lon", requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long = "accuracy")]
        accuracy: Option<f64>,
    },

    /// Refresh the location of a completed tag
    Geo {
        #[arg(long = "lat", requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long = "lon", requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long = "accuracy")]
        accuracy: Option<f64>,
    },

    /// Send queued events to the backend
    Sync {
        #[arg(long = "all", help = "Keep sending batches until the queue is empty")]
        all: bool,
    },

    /// Inspect the offline queue
    Queue {
        #[arg(long = "list", help = "List pending events, newest first")]
        list: bool,

        #[arg(long = "export", value_name = "FILE", help = "Write pending events as CSV")]
        export: Option<String>,
    },

    /// Interactive field session: scans, commands and background sync
    Field {
        #[arg(
            long = "scan-file",
            value_name = "FILE",
            help = "File a scanner overwrites with each decoded tag"
        )]
        scan_file: Option<String>,
    },
}
