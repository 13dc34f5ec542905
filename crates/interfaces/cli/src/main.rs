mod commands;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use vaadly_config::AppConfig;
use vaadly_model::Entrance;
use vaadly_store::{DocumentStore, RedbKv};

#[derive(Debug, Parser)]
#[command(
    name = "vaadly",
    version,
    about = "Bookkeeping for a residential building committee"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "vaadly.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dashboard summary for the current building.
    Status,
    /// Manage buildings.
    Buildings {
        #[command(subcommand)]
        command: BuildingCommands,
    },
    /// Manage the rolling daily snapshot history.
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Write the full document to a portable JSON file.
    Export {
        /// Destination path; defaults to a dated file name.
        #[arg(value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Replace the document with an imported JSON file (schema-healed).
    Import {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Tenant roster CSV import/export for the current building.
    Tenants {
        #[command(subcommand)]
        command: TenantCommands,
    },
    /// Delete all data and start over with a default document.
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum BuildingCommands {
    List,
    Add {
        name: String,
    },
    /// Make another building current; unknown ids are ignored.
    Switch {
        id: String,
    },
    /// Delete a building. The last remaining building cannot be deleted.
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum BackupCommands {
    /// Take today's snapshot if it has not been taken yet.
    Run,
    /// Snapshot now and write the bytes to a file.
    Force {
        #[arg(value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List retained snapshots, newest first.
    List,
    /// Delete all but the newest retained snapshots.
    Prune,
}

#[derive(Debug, Subcommand)]
enum TenantCommands {
    /// Append tenants parsed from a roster CSV to the current building.
    ImportCsv {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Entrance assigned to every imported tenant.
        #[arg(long, value_enum, default_value = "a")]
        entrance: CliEntrance,
    },
    /// Write the current building's roster as CSV.
    ExportCsv {
        #[arg(value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEntrance {
    A,
    B,
    C,
    D,
}

impl From<CliEntrance> for Entrance {
    fn from(value: CliEntrance) -> Self {
        match value {
            CliEntrance::A => Entrance::A,
            CliEntrance::B => Entrance::B,
            CliEntrance::C => Entrance::C,
            CliEntrance::D => Entrance::D,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.telemetry.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let kv = RedbKv::open(config.database_path())?;
    let mut store = DocumentStore::open(Box::new(kv))?;
    store.set_backup_retention(config.backup.retention);

    // The silent daily snapshot runs right after the store opens, before
    // the requested command; failures are logged, never fatal.
    let today = Local::now().date_naive();
    if store.run_daily_backup_if_due(today) {
        tracing::info!(%today, "daily backup written");
    }

    match cli.command {
        Commands::Status => commands::status(&store, today),
        Commands::Buildings { command } => commands::buildings(&mut store, command),
        Commands::Backup { command } => commands::backup(&mut store, command, today),
        Commands::Export { output } => commands::export(&store, output, today),
        Commands::Import { path } => commands::import(&mut store, &path),
        Commands::Tenants { command } => commands::tenants(&mut store, command, today),
        Commands::Reset { yes } => commands::reset(&mut store, yes),
    }
}
