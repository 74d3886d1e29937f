//! kvlite CLI
//!
//! Command-line access to a kvlite database file.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use kvlite::{Config, Store, SyncMode};
use tracing_subscriber::{fmt, EnvFilter};

/// kvlite CLI
#[derive(Parser, Debug)]
#[command(name = "kvlite-cli")]
#[command(about = "CLI for the kvlite key-value store")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(short, long, default_value = "./kvlite.db")]
    db: String,

    /// fsync behaviour for writes
    #[arg(long, value_enum, default_value = "off")]
    sync: SyncArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SyncArg {
    Off,
    Normal,
    Full,
}

impl From<SyncArg> for SyncMode {
    fn from(arg: SyncArg) -> Self {
        match arg {
            SyncArg::Off => SyncMode::Off,
            SyncArg::Normal => SyncMode::Normal,
            SyncArg::Full => SyncMode::Full,
        }
    }
}

fn main() -> ExitCode {
    // Initialize tracing/logging (stderr keeps stdout clean for values)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,kvlite=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .path(&args.db)
        .synchronous(args.sync.into())
        .build();

    let store = match Store::open(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Commands::Get { key } => store.get(&key).map(|value| match value {
            Some(v) => println!("{}", v),
            None => println!("(nil)"),
        }),
        Commands::Put { key, value } => store.put(&key, &value).map(|()| println!("OK")),
        Commands::Del { key } => store.delete(&key).map(|()| println!("OK")),
    };

    let closed = store.close();

    match result.and(closed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
