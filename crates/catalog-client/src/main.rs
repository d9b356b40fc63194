//! Catalog client CLI application.

use anyhow::{Context, Result};
use catalog_client::{Catalog, CatalogKind, Facet, FilterSpec};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top-ranked entries
    Top {
        #[arg(short, long, default_value = "anime")]
        kind: CatalogKind,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Upstream filter, e.g. airing, upcoming, bypopularity, favorite
        #[arg(short, long)]
        filter: Option<String>,
        /// Keep loading pages while upstream reports more (infinite scroll)
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Currently airing season
    Seasonal {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Search by title and/or structured filters
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(short, long, default_value = "anime")]
        kind: CatalogKind,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Full record for one entry
    Detail {
        id: u32,
        #[arg(short, long, default_value = "anime")]
        kind: CatalogKind,
    },
    /// Secondary records: characters, staff, recommendations, videos
    Facet {
        id: u32,
        facet: Facet,
        #[arg(short, long, default_value = "anime")]
        kind: CatalogKind,
    },
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    /// Genre code to include (repeatable)
    #[arg(long = "genre")]
    genres: Vec<u32>,
    /// Genre code to exclude (repeatable)
    #[arg(long = "exclude")]
    genres_exclude: Vec<u32>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    rating: Option<String>,
    /// Entry type, e.g. tv, movie, manga, novel
    #[arg(long = "type")]
    entry_type: Option<String>,
}

impl From<FilterArgs> for FilterSpec {
    fn from(args: FilterArgs) -> Self {
        FilterSpec {
            genres: args.genres,
            genres_exclude: args.genres_exclude,
            status: args.status,
            rating: args.rating,
            entry_type: args.entry_type,
            ..Default::default()
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, &config.log_dir(), "catalog-client");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    let catalog = Catalog::from_config(&config).context("Failed to initialize catalog")?;
    let stream = catalog.orchestrator();

    match args.command {
        Command::Top {
            kind,
            page,
            filter,
            pages,
        } => {
            stream
                .fetch_listing(kind, page, filter.as_deref(), false)
                .await
                .context("Failed to fetch top listing")?;

            for _ in 1..pages.max(1) {
                let pagination = stream.pagination();
                if !pagination.has_next_page {
                    break;
                }
                stream
                    .fetch_listing(kind, pagination.current_page + 1, filter.as_deref(), true)
                    .await
                    .context("Failed to fetch next page")?;
            }

            let state = stream.snapshot();
            info!(
                items = state.items.len(),
                current_page = state.pagination.current_page,
                last_visible_page = state.pagination.last_visible_page,
                "Listing loaded"
            );
            print_json(&state.items)?;
        }
        Command::Seasonal { page } => {
            stream
                .fetch_seasonal(page, false)
                .await
                .context("Failed to fetch seasonal listing")?;
            print_json(&stream.items())?;
        }
        Command::Search {
            query,
            kind,
            page,
            filters,
        } => {
            let filters = FilterSpec::from(filters);
            let results = stream
                .search(&query, kind, &filters, page, false)
                .await
                .context("Search failed")?;

            match results {
                Some(items) => print_json(&items)?,
                None => info!(query = %query, "Nothing to search for"),
            }
        }
        Command::Detail { id, kind } => {
            let item = stream
                .fetch_detail(kind, id)
                .await
                .with_context(|| format!("Failed to load {} {}", kind, id))?;
            print_json(&item)?;
        }
        Command::Facet { id, facet, kind } => {
            let payload = catalog.get_facet(kind, id, facet).await;
            print_json(&payload)?;
        }
    }

    Ok(())
}
