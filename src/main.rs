use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use book_scraper::config::Config;
use book_scraper::logging;
use book_scraper::pipeline::ingestion::read_feed;
use book_scraper::pipeline::{BookStore, InMemoryBookStore, ItemPipeline, SqliteBookStore};

#[derive(Parser)]
#[command(name = "book_scraper")]
#[command(about = "Normalize scraped book listings and store them without duplicates")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the book table if it does not exist
    Init,
    /// Run a JSON-lines item feed through the pipeline
    Ingest {
        /// Feed exported by the crawler, one item per line
        #[arg(long)]
        input: PathBuf,
        /// Normalize and dedup in memory without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a stored book as JSON
    Show {
        #[arg(long)]
        title: String,
    },
    /// Print the number of stored books
    Stats,
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn BookStore>> {
    let store = SqliteBookStore::open(&config.database.path).with_context(|| {
        format!(
            "Failed to open book database at {}",
            config.database.path.display()
        )
    })?;
    store
        .ensure_schema()
        .await
        .context("Failed to prepare book schema")?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)?;
    let _log_guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init => {
            let store = open_store(&config).await?;
            info!("Book table ready at {}", config.database.path.display());
            store.close().await?;
        }
        Commands::Ingest { input, dry_run } => {
            let store: Arc<dyn BookStore> = if dry_run {
                let store: Arc<dyn BookStore> = Arc::new(InMemoryBookStore::new());
                store.ensure_schema().await?;
                store
            } else {
                open_store(&config).await?
            };

            let items = read_feed(&input)
                .with_context(|| format!("Failed to open feed {}", input.display()))?;
            let pipeline = ItemPipeline::new(store.clone());
            let result = pipeline.run(items).await;

            println!("\n📊 Pipeline Results:");
            println!("   Total items: {}", result.total_items);
            println!("   Inserted: {}", result.inserted);
            println!("   Skipped (duplicates): {}", result.skipped);
            println!("   Rejected: {}", result.rejected);
            println!("   Storage failures: {}", result.failed);
            println!("   Duration: {:.2}s", result.duration_secs);

            if !result.errors.is_empty() {
                warn!("{} errors encountered during pipeline run", result.errors.len());
                println!("\n⚠️  Errors encountered:");
                for error in &result.errors {
                    println!("   - {}", error);
                }
            }

            store.close().await?;
            if result.aborted {
                error!("Pipeline aborted: store became unusable");
                anyhow::bail!("pipeline aborted after {} items", result.total_items);
            }
        }
        Commands::Show { title } => {
            let store = open_store(&config).await?;
            match store.get_by_title(&title).await? {
                Some(book) => println!("{}", serde_json::to_string_pretty(&book)?),
                None => println!("No book titled {:?}", title),
            }
            store.close().await?;
        }
        Commands::Stats => {
            let store = open_store(&config).await?;
            println!("Stored books: {}", store.count().await?);
            store.close().await?;
        }
    }
    Ok(())
}
