use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use casebook::{api, config::ServerConfig, db, models::*, snapshot};

#[derive(Parser)]
#[command(name = "casebook")]
#[command(about = "Teaching-session snapshots for case-based legal teaching")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API (overrides CASEBOOK_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database file (overrides CASEBOOK_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Reject snapshot writes that fail validation
        #[arg(long)]
        strict: bool,
    },
    /// Validate a stored snapshot JSON file
    Validate {
        file: PathBuf,
    },
    /// Build a snapshot envelope from an application-state JSON file
    Convert {
        file: PathBuf,

        /// URL of the generated slide deck
        #[arg(long)]
        asset_url: Option<String>,

        /// Fail instead of warning when the envelope does not validate
        #[arg(long)]
        strict: bool,

        /// Record the save as manual rather than automatic
        #[arg(long)]
        manual: bool,
    },
    /// Rebuild the application state from a stored snapshot JSON file
    Restore {
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "casebook=debug,tower_http=debug".into()),
    );

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let port = config.port;
    let app = api::create_router(api::AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Casebook server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ServerConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { port, db, strict }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if db.is_some() {
                config.db_path = db;
            }
            config.strict_snapshots |= strict;
            serve(config).await?;
        }
        Some(Commands::Validate { file }) => {
            let report = snapshot::validate(&read_json(&file)?);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success {
                anyhow::bail!("{} is not a valid snapshot", file.display());
            }
        }
        Some(Commands::Convert {
            file,
            asset_url,
            strict,
            manual,
        }) => {
            let state: ApplicationState = serde_json::from_value(read_json(&file)?)
                .with_context(|| format!("{} is not an application state", file.display()))?;
            let mut options = config.conversion_options();
            options.strict |= strict;
            if manual {
                options = options.with_save_type(SaveType::Manual);
            }
            let envelope = snapshot::to_database(&state, asset_url.as_deref(), &options)?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Some(Commands::Restore { file }) => {
            let session = DatabaseSession::new(Uuid::nil(), read_json(&file)?);
            let options = config.conversion_options().with_sync_stores(false);
            let state = snapshot::to_store(&session, &options, None)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        None => serve(config).await?,
    }

    Ok(())
}
