//! # SICONI Back Office
//!
//! Command-line front end for the workshop's sales counter and stock room.
//!
//! ## Usage
//! ```bash
//! siconi init
//! siconi product add --code TRJ-001 --name "Traje entero" --price 20 --stock 10
//! siconi sale register --item TRJ-001:3 --paid 30 --method pago-movil
//! siconi payment add PED-0001 30
//! siconi report summary --from 2024-05-01 --to 2024-05-31 --out
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr, `RUST_LOG` or the default filter)
//! 2. Load [`config::AppConfig`] from `SICONI_*` variables
//! 3. Open the database and apply migrations
//! 4. Run one command, print its JSON result on stdout
//!
//! Failures print a JSON [`error::CliError`] on stderr and exit non-zero.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use siconi_db::{Database, DbConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;

use commands::client::ClientAction;
use commands::payment::PaymentAction;
use commands::product::ProductAction;
use commands::report::ReportAction;
use commands::sale::SaleAction;
use commands::stock::StockAction;
use commands::supplier::SupplierAction;
use commands::user::UserAction;
use commands::Context;
use config::AppConfig;
use error::CliResult;

#[derive(Parser)]
#[command(name = "siconi")]
#[command(author, version, about = "SICONI back office: sales, payments and inventory")]
struct Cli {
    /// Database file (overrides SICONI_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database file and apply migrations
    Init,
    /// Catalog
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Stock adjustments and the movement history
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },
    Supplier {
        #[command(subcommand)]
        action: SupplierAction,
    },
    /// Orders: register, inspect, deliver, invoice
    Sale {
        #[command(subcommand)]
        action: SaleAction,
    },
    Payment {
        #[command(subcommand)]
        action: PaymentAction,
    },
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
    /// Back office accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!(code = ?e.code, "Command failed: {}", e.message);
            let body = serde_json::to_string_pretty(&e).unwrap_or_else(|_| e.to_string());
            eprintln!("{}", body);
            std::process::exit(e.code.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<String> {
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.db {
        config.database_path = path;
    }

    info!(db = %config.database_path.display(), "Opening database");
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let ctx = Context::new(db, config);

    let result = match cli.command {
        Commands::Init => commands::init(&ctx).await,
        Commands::Product { action } => commands::product::run(&ctx, action).await,
        Commands::Stock { action } => commands::stock::run(&ctx, action).await,
        Commands::Client { action } => commands::client::run(&ctx, action).await,
        Commands::Supplier { action } => commands::supplier::run(&ctx, action).await,
        Commands::Sale { action } => commands::sale::run(&ctx, action).await,
        Commands::Payment { action } => commands::payment::run(&ctx, action).await,
        Commands::Report { action } => commands::report::run(&ctx, action).await,
        Commands::User { action } => commands::user::run(&ctx, action).await,
    };

    ctx.db.close().await;

    Ok(serde_json::to_string_pretty(&result?)?)
}

/// Logs go to stderr so stdout stays valid JSON.
///
/// - `RUST_LOG=debug` - everything at debug
/// - `RUST_LOG=siconi_db=trace` - one crate only
/// - Default: `info,siconi=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,siconi=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
