//! Person Search Sync - command line entry point.
//!
//! Rebuilds the person index from the row store, runs searches against it, and
//! compares lookup latency between the two stores.

use anyhow::Result;
use clap::{Parser, Subcommand};
use person_search_sync::client::{AsyncSearchClient, AsyncSearchClientImpl};
use person_search_sync::repositories::{
    ElasticIndexGateway, InMemoryRowStore, RowStoreGateway, SearchIndexGateway, SqlRowStore,
};
use person_search_sync::{
    CancelSignal, Config, PersonLookup, PersonSearchService, PersonSearchServiceImpl,
    PipelineError, ResultSet, SearchClient, SearchIntent,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rejected documents printed after a rebuild.
const MAX_PRINTED_FAILURES: usize = 10;

#[derive(Parser)]
#[command(name = "person-search-sync")]
#[command(about = "Sync person records into a search index and query them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Delete, recreate and repopulate the index from the row store
    Rebuild {
        /// Rows per page and documents per bulk write
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Search the index
    Search {
        #[command(subcommand)]
        intent: SearchCommand,
    },

    /// Compare row-store and index lookup latency
    Compare {
        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,

        /// Preferred-name pattern in SQL LIKE syntax (e.g. "Rah%")
        #[arg(long)]
        preferred: String,

        /// Timed calls per backend
        #[arg(long)]
        iterations: Option<usize>,
    },
}

#[derive(Subcommand)]
enum SearchCommand {
    /// Analyzed match on one field
    Match {
        #[arg(long)]
        field: String,

        #[arg(long)]
        value: String,

        #[arg(long)]
        max: Option<usize>,
    },

    /// First and last name substrings and birth year, all required
    Wildcard {
        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        max: Option<usize>,
    },

    /// Misspelling-tolerant match on one field
    Fuzzy {
        #[arg(long)]
        field: String,

        #[arg(long)]
        value: String,

        /// Maximum edit distance (0-2, default 2)
        #[arg(long)]
        distance: Option<u8>,

        #[arg(long)]
        max: Option<usize>,
    },

    /// First or last name substring or birth year, any one suffices
    Any {
        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        max: Option<usize>,
    },
}

impl SearchCommand {
    fn into_intent(self) -> (SearchIntent, Option<usize>) {
        match self {
            SearchCommand::Match { field, value, max } => {
                (SearchIntent::Match { field, text: value }, max)
            }
            SearchCommand::Wildcard {
                first,
                last,
                year,
                max,
            } => (
                SearchIntent::WildcardRange {
                    first_name: first,
                    last_name: last,
                    birth_year: year,
                },
                max,
            ),
            SearchCommand::Fuzzy {
                field,
                value,
                distance,
                max,
            } => (
                SearchIntent::Fuzzy {
                    field,
                    value,
                    distance,
                },
                max,
            ),
            SearchCommand::Any {
                first,
                last,
                year,
                max,
            } => (
                SearchIntent::AnyOf {
                    first_name: first,
                    last_name: last,
                    birth_year: year,
                },
                max,
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr so stdout carries only command output
    let _ = dotenvy::dotenv();
    let default_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let search_client = SearchClient::new(&config);
    let client = Arc::new(AsyncSearchClientImpl::new(search_client)) as Arc<dyn AsyncSearchClient>;
    let index = Arc::new(ElasticIndexGateway::new(client.clone())) as Arc<dyn SearchIndexGateway>;

    // Searches never touch the row store, so only connect when needed.
    let row_store: Arc<dyn RowStoreGateway> = match &cli.command {
        Command::Search { .. } => Arc::new(InMemoryRowStore::new()),
        _ => {
            info!("Connecting to row store");
            Arc::new(SqlRowStore::connect(config.require_person_db_url()?).await?)
        }
    };

    let service = PersonSearchServiceImpl::from_config(row_store, index, &config);

    match cli.command {
        Command::Rebuild { batch_size } => {
            run_rebuild(&service, &config, batch_size).await?;
        }
        Command::Search { intent } => {
            let (intent, max) = intent.into_intent();
            let result = service.search(&intent, max).await?;
            print_results(&result);
        }
        Command::Compare {
            first,
            last,
            preferred,
            iterations,
        } => {
            let lookup = PersonLookup::new(first, last, preferred);
            let report = service
                .compare_performance(&lookup, iterations.unwrap_or(config.harness_iterations))
                .await?;
            println!("{}", report);
        }
    }

    let metrics = client.metrics().summary();
    info!(
        "HTTP requests: {} ({} errors, avg {:.1} ms)",
        metrics.http_requests_total, metrics.http_errors_total, metrics.http_duration_avg_ms
    );
    Ok(())
}

async fn run_rebuild(
    service: &PersonSearchServiceImpl,
    config: &Config,
    batch_size: Option<usize>,
) -> Result<()> {
    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current batch");
            on_interrupt.cancel();
        }
    });

    let batch_size = batch_size.unwrap_or(config.sync_batch_size);
    match service
        .rebuild_index(&config.person_table, &config.search_index, batch_size, cancel)
        .await
    {
        Ok(summary) => {
            println!("Rebuild of {} complete", config.search_index);
            println!("{}", summary);
            for failure in summary.failures.iter().take(MAX_PRINTED_FAILURES) {
                println!("  rejected: {}", failure.cause);
            }
            if summary.failures.len() > MAX_PRINTED_FAILURES {
                println!(
                    "  ... and {} more",
                    summary.failures.len() - MAX_PRINTED_FAILURES
                );
            }
            Ok(())
        }
        Err(e) => {
            if let PipelineError::Aborted { summary, .. } = &e {
                println!("{}", summary);
            }
            Err(e.into())
        }
    }
}

fn print_results(result: &ResultSet) {
    println!(
        "{} matches ({} shown)",
        result.total_matches,
        result.documents.len()
    );
    for document in &result.documents {
        match serde_json::to_string(document) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Could not render document: {}", e),
        }
    }
}
