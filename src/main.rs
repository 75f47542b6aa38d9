use clap::{Parser, Subcommand};
use migration::MigratorTrait;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

use llinatge::app::App;
use llinatge::rebuild::{self, NivellsRebuildPayload};
use llinatge::{closure, jobs, settings, storage};

#[derive(Parser, Debug)]
#[command(name = "llinatge", version, about = "Genealogy platform admin tools")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Rebuild the territorial closure table
    RebuildClosure {
        /// Rebuild a single municipality instead of all of them
        #[arg(long)]
        municipi: Option<i64>,
    },
    /// Rebuild per-level statistics and demographics
    RebuildNivells {
        /// What to recompute: demografia, stats or all
        #[arg(long, default_value = "all")]
        kind: String,
        /// Target level id
        #[arg(long)]
        nivell: Option<i64>,
        /// Recompute every level
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;

    // init storage (database)
    let db = storage::init(&settings.database).await?;

    match cli.command {
        Command::Migrate => {
            migration::Migrator::up(&db, None).await.into_diagnostic()?;
            tracing::info!("Migrations applied");
        }
        Command::RebuildClosure { municipi } => match municipi {
            Some(id) => {
                closure::rebuild_for(&db, id).await?;
                tracing::info!(municipi = id, "Closure rebuilt");
            }
            None => {
                let summary = closure::rebuild_all(&db).await?;
                tracing::info!(
                    processed = summary.processed,
                    failed = summary.failed,
                    "Closure rebuilt"
                );
            }
        },
        Command::RebuildNivells { kind, nivell, all } => {
            let payload = NivellsRebuildPayload {
                kind,
                nivell_id: nivell.unwrap_or(0),
                all,
            };
            let app = App::new(db, &settings);
            let job_id = app
                .jobs
                .create(
                    jobs::KIND_NIVELLS_REBUILD,
                    &serde_json::to_value(&payload).into_diagnostic()?,
                    None,
                )
                .await?;
            let bulk_id = app.bulk_jobs.new_job("rebuild", "nivells", &payload.kind);

            rebuild::run(app.clone(), job_id, bulk_id, payload).await;

            match app.jobs.get(job_id).await? {
                Some(job) if job.status == "done" => {
                    tracing::info!(job_id, result = ?job.result_json, "Rebuild finished");
                }
                Some(job) => {
                    tracing::error!(job_id, error = ?job.error_text, "Rebuild failed");
                    std::process::exit(1);
                }
                None => {
                    tracing::error!(job_id, "Rebuild job vanished");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
