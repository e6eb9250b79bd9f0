//! quarry-ledger CLI
//!
//! Inspects the migration ledger of a configured database.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use quarry::migration::{DEFAULT_LEDGER_TABLE, Ledger};
use quarry::{Database, DatabaseConfig, DialectKind};

/// Migration ledger tool for quarry databases.
#[derive(Parser)]
#[command(name = "quarry-ledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database dialect: mysql, mariadb or sqlite.
    #[arg(long, env = "QUARRY_DIALECT", default_value = "sqlite")]
    dialect: DialectKind,

    /// SQLite database file. In-memory when omitted.
    #[arg(long, env = "QUARRY_PATH")]
    path: Option<PathBuf>,

    /// Server host.
    #[arg(long, env = "QUARRY_HOST", default_value = "localhost")]
    host: String,

    /// Server port.
    #[arg(long, env = "QUARRY_PORT", default_value_t = 3306)]
    port: u16,

    /// Server user.
    #[arg(short, long, env = "QUARRY_USER", default_value = "root")]
    user: String,

    /// Server password.
    #[arg(long, env = "QUARRY_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Server database name.
    #[arg(short, long, env = "QUARRY_DATABASE")]
    database: Option<String>,

    /// Value substituted for `%prefix%` in table names.
    #[arg(long, env = "QUARRY_PREFIX", default_value = "")]
    prefix: String,

    /// Ledger table name.
    #[arg(long, default_value = DEFAULT_LEDGER_TABLE)]
    ledger_table: String,

    /// Enable verbose output, including every SQL statement.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the ledger table if it does not exist.
    Init,

    /// List ledger entries in insertion order.
    Show {
        /// Only show entries for this migration.
        #[arg(short, long)]
        migration: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> DatabaseConfig {
        let config = match self.dialect {
            DialectKind::Sqlite => match &self.path {
                Some(path) => DatabaseConfig::sqlite(path.clone()),
                None => DatabaseConfig::sqlite_memory(),
            },
            DialectKind::MySql | DialectKind::MariaDb => DatabaseConfig {
                dialect: self.dialect,
                host: self.host.clone(),
                port: self.port,
                user: self.user.clone(),
                password: self.password.clone(),
                database: self.database.clone(),
                ..DatabaseConfig::default()
            },
        };
        config.with_prefix(&self.prefix).with_debug(self.verbose)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db = Database::connect(cli.config()).await?;
    let ledger = Ledger::new(&cli.ledger_table);

    match &cli.command {
        Commands::Init => {
            info!(table = %cli.ledger_table, "Initializing migration ledger...");
            ledger.init(&db).await?;
            info!("Ledger table ready.");
        }

        Commands::Show { migration } => {
            ledger.init(&db).await?;
            let entries = ledger.list(&db).await?;
            let entries: Vec<_> = entries
                .iter()
                .filter(|e| migration.as_ref().is_none_or(|m| &e.migration == m))
                .collect();

            if entries.is_empty() {
                info!("No migrations have been recorded yet.");
            } else {
                println!("\nRecorded migrations:");
                println!("{:-<60}", "");
                for entry in entries {
                    let at = entry
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(" [X] {} ({at})", entry.migration);
                }
                println!();
            }
        }
    }

    db.close().await;
    Ok(())
}
