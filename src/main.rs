mod browser;
mod config;
mod error;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod sources;
mod storage;
mod utils;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::browser::FetchTiming;
use crate::browser::chromium::ChromiumProvider;
use crate::config::AppConfig;
use crate::models::{QuoteOutcome, SourceId};
use crate::pipeline::{QuotePipeline, rank_by_price};
use crate::scraper::http_client::{SearchIndex, SerpApiClient};
use crate::scraper::resolver::LinkResolver;
use crate::scraper::{ConfiguredSource, PharmacySource};
use crate::sources::SearchStrategy;
use crate::storage::{CsvSink, to_json_record};

#[derive(Parser)]
#[command(name = "pharma-quote", about = "Online pharmacy price quotes", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one product on one pharmacy and print it as a JSON record
    Quote {
        #[arg(short, long, value_enum)]
        source: SourceId,

        /// Free-text product query, e.g. "Cetcip 10mg"
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Compare a product across every pharmacy, cheapest first
    Compare {
        #[arg(required = true)]
        query: Vec<String>,

        /// Print `{"prices": [...]}` instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Append quotes to the per-pharmacy CSV stores
    Collect {
        /// Queries given inline (each argument is one query)
        queries: Vec<String>,

        /// File with one query per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Restrict to these pharmacies (default: all)
        #[arg(short, long = "source", value_enum)]
        sources: Vec<SourceId>,
    },

    /// List pharmacies and the link strategy each one will use
    Sources,

    /// Show stored quotes for one pharmacy, newest last
    History {
        #[arg(short, long, value_enum)]
        source: SourceId,

        /// Only the last N rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Search index (when credentialed) → shared resolver.
fn build_resolver(config: &AppConfig) -> Result<Arc<LinkResolver>> {
    let index: Option<Arc<dyn SearchIndex>> = match SerpApiClient::from_config(&config.search)? {
        Some(client) => Some(Arc::new(client)),
        None => {
            warn!("No search index credential; index-only pharmacies will report not found");
            None
        }
    };
    Ok(Arc::new(LinkResolver::new(
        index,
        config.browser.navigation_timeout(),
        config.browser.settle_delay(),
    )))
}

fn build_sources(resolver: &Arc<LinkResolver>, ids: &[SourceId]) -> Vec<Arc<dyn PharmacySource>> {
    sources::all()
        .into_iter()
        .filter(|a| ids.is_empty() || ids.contains(&a.id))
        .map(|a| {
            Arc::new(ConfiguredSource::new(a, Arc::clone(resolver))) as Arc<dyn PharmacySource>
        })
        .collect()
}

fn build_pipeline(config: &AppConfig) -> Arc<QuotePipeline> {
    Arc::new(QuotePipeline::new(
        Arc::new(ChromiumProvider::new(&config.browser)),
        FetchTiming::from(&config.browser),
    ))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "pharma_quote=info,warn",
        1 => "pharma_quote=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Quote { source, query } => {
            let query = query.join(" ");
            let _t = utils::Timer::start(format!("{} quote for {:?}", source, query));

            let resolver = build_resolver(&config)?;
            let source = ConfiguredSource::new(sources::adapter(source), resolver);
            let outcome = build_pipeline(&config).quote(&source, &query).await;

            println!("{}", to_json_record(&outcome)?);
            if outcome.quote().is_none() {
                return Ok(ExitCode::from(1));
            }
        }

        Command::Compare { query, json } => {
            let query = query.join(" ");
            let _t = utils::Timer::start(format!("Compare {:?}", query));

            let resolver = build_resolver(&config)?;
            let all = build_sources(&resolver, &[]);
            let outcomes = build_pipeline(&config)
                .compare(&all, &query, config.pipeline.concurrency)
                .await;
            let ranked = rank_by_price(&outcomes);

            if json {
                let doc = if ranked.is_empty() {
                    serde_json::json!({ "prices": ranked, "error": "No prices found from sources" })
                } else {
                    serde_json::json!({ "prices": ranked })
                };
                println!("{}", doc);
            } else {
                println!("─────────────────────────────────────────────────────────");
                println!("  {}", query);
                println!("─────────────────────────────────────────────────────────");
                for q in &ranked {
                    println!(
                        "  {:<10} {:>10} {:>10} {:>6.2}%  {}",
                        q.pharmacy.label(),
                        utils::fmt_price(q.price),
                        utils::fmt_price(q.mrp),
                        q.discount_percent,
                        q.link
                    );
                }
                for o in outcomes.iter().filter(|o| o.quote().is_none_or(|q| q.price.is_none())) {
                    println!("  {:<10} no price", o.pharmacy().label());
                }
                println!("─────────────────────────────────────────────────────────");
            }
        }

        Command::Collect {
            mut queries,
            file,
            sources: ids,
        } => {
            if let Some(path) = &file {
                queries.extend(loader::load_queries(path)?);
            }
            if queries.is_empty() {
                bail!("No queries given; pass them inline or with --file");
            }

            let _t = utils::Timer::start(format!("Collect {} queries", queries.len()));
            let sink = CsvSink::open(&config.output.dir)?;
            let resolver = build_resolver(&config)?;
            let selected = build_sources(&resolver, &ids);
            let pipeline = build_pipeline(&config);

            let mut stored = 0usize;
            let mut missing = 0usize;
            for query in &queries {
                let outcomes = pipeline
                    .compare(&selected, query, config.pipeline.concurrency)
                    .await;
                for outcome in &outcomes {
                    match outcome {
                        QuoteOutcome::Found(q) => {
                            sink.append(q)?;
                            stored += 1;
                        }
                        QuoteOutcome::NotFound(_) => missing += 1,
                    }
                }
            }

            info!("Done: {} quotes stored, {} not found", stored, missing);
        }

        Command::Sources => {
            let resolver = build_resolver(&config)?;
            for adapter in sources::all() {
                let active = match resolver.active_strategy(adapter) {
                    Some(SearchStrategy::OnSite { search_url, .. }) => {
                        format!("on-site ({})", search_url)
                    }
                    Some(SearchStrategy::SearchIndex { domain }) => {
                        format!("search index (site:{})", domain)
                    }
                    None => "unavailable (no search index credential)".to_string(),
                };
                println!(
                    "  {:<10} {:<26} {:<24} {}",
                    adapter.id.slug(),
                    adapter.origin,
                    adapter.product_url_pattern,
                    active
                );
            }
        }

        Command::History { source, limit } => {
            let sink = CsvSink::open(&config.output.dir)?;
            let path = sink.path_for(source);
            let rows = loader::load_quote_rows(&path)?;
            if rows.is_empty() {
                warn!("No stored quotes in {:?}", path);
            }

            let skip = limit.map_or(0, |n| rows.len().saturating_sub(n));
            for row in rows.iter().skip(skip) {
                let when = row
                    .scraped_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:<16} {:<40} {:>10} {:>10} {:>6.2}%",
                    when,
                    row.name.as_deref().unwrap_or("-"),
                    utils::fmt_price(row.price),
                    utils::fmt_price(row.mrp),
                    row.discount_percent
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
