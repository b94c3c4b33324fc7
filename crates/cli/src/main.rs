use anyhow::Context;
use bookshelf_app::bootstrap;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Virtual bookshelf service and admin tasks
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the resolved configuration with secrets redacted
    Config,
    /// Create the indexes declared by every module and exit
    EnsureIndexes,
    /// Print collection counts and top reviewers as JSON
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => bootstrap::serve(settings).await,
        Command::Config => {
            println!("{settings:#?}");
            Ok(())
        }
        Command::EnsureIndexes => {
            let db = bootstrap::open_database(&settings).await?;
            bootstrap::ensure_indexes(&settings, &db).await?;
            tracing::info!("indexes ensured");
            Ok(())
        }
        Command::Stats => {
            let db = bootstrap::open_database(&settings).await?;
            let counts = db.counts().await.context("failed to fetch stats")?;
            let top_reviewers = db
                .top_reviewers(bookshelf_app::stats::TOP_REVIEWERS_LIMIT)
                .await
                .context("failed to fetch top reviewers")?;
            let report = serde_json::json!({
                "stats": counts,
                "topReviewers": top_reviewers,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
