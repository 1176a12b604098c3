use clap::{Parser, Subcommand};
use showcal_core::domain::ScrapedEvent;
use showcal_core::export::MatchClass;
use showcal_discovery::apis::ProviderRegistry;
use showcal_discovery::config::AppConfig;
use showcal_discovery::observability::{logging, metrics};
use showcal_discovery::orchestrator::DiscoveryOrchestrator;
use showcal_discovery::remote::{
    mapper, reconcile, HttpRemote, ImportExecutor, ImportTarget, TargetSelector,
};
use showcal_discovery::selection::{CurationStep, SelectionState};
use showcal_discovery::server::{start_server, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "showcal-discovery")]
#[command(about = "Live-event discovery, curation, and import tool")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the discovery HTTP service
    Serve {
        #[arg(long, default_value_t = 3400)]
        port: u16,
        /// Port for the Prometheus metrics exporter
        #[arg(long, default_value_t = 9400)]
        metrics_port: u16,
    },
    /// One-shot batch preview of configured venues
    Preview {
        /// Comma-separated venue slugs (defaults to every configured venue)
        #[arg(long)]
        venues: Option<String>,
    },
    /// Preview, select everything upcoming, scrape, and write the curated
    /// events to a file for later import
    Curate {
        /// Comma-separated venue slugs
        #[arg(long)]
        venues: String,
        #[arg(long, default_value = "curated.json")]
        out: PathBuf,
    },
    /// Reconcile a curated file against remote backends and import it
    Import {
        #[arg(long)]
        input: PathBuf,
        /// Target name, or "both" for every configured target
        #[arg(long, default_value = "both")]
        target: String,
        /// Actually write; without this flag the import is a dry run
        #[arg(long)]
        commit: bool,
    },
}

fn build_orchestrator(config: &AppConfig) -> DiscoveryOrchestrator {
    DiscoveryOrchestrator::new(config.venues.clone(), ProviderRegistry::with_builtins())
        .with_concurrency(config.discovery.concurrency)
}

fn build_executor(config: &AppConfig) -> anyhow::Result<ImportExecutor> {
    let mut targets = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        let token = target.resolve_token()?;
        targets.push(ImportTarget {
            name: target.name.clone(),
            api: Arc::new(HttpRemote::new(target.base_url.clone(), token)),
        });
    }
    Ok(ImportExecutor::new(targets))
}

fn split_slugs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn run_preview(config: &AppConfig, venues: Option<String>) {
    let orchestrator = build_orchestrator(config);
    let slugs = match venues {
        Some(raw) => split_slugs(&raw),
        None => config.venues.iter().map(|v| v.slug.clone()).collect(),
    };

    let results = orchestrator.preview_batch(&slugs).await;

    println!("\n📊 Preview results:");
    for result in &results {
        match (&result.events, &result.error) {
            (Some(events), _) => {
                println!("   {} — {} upcoming events", result.venue_slug, events.len());
            }
            (None, Some(error)) => {
                println!("   {} — ⚠️  {}", result.venue_slug, error);
            }
            (None, None) => {}
        }
    }
}

async fn run_curate(config: &AppConfig, venues: String, out: PathBuf) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config);
    let slugs = split_slugs(&venues);

    let mut state = SelectionState::new();
    state.choose_venues(slugs.clone());
    state.try_enter(CurationStep::PreviewAndSelect)?;

    let results = orchestrator.preview_batch(&slugs).await;
    for result in results {
        match result.events {
            Some(stubs) => {
                state.record_preview(&result.venue_slug, stubs);
                state.select_all(&result.venue_slug);
            }
            None => warn!(
                venue = %result.venue_slug,
                error = result.error.as_deref().unwrap_or("unknown"),
                "venue preview failed, skipping"
            ),
        }
    }

    for slug in slugs {
        let selected = state.selected_ids(&slug);
        if selected.is_empty() {
            continue;
        }
        match orchestrator.scrape(&slug, &selected).await {
            Ok(events) => {
                let added = state.accumulate_scraped(events);
                info!(venue = %slug, added, "scrape accumulated");
            }
            Err(e) => warn!(venue = %slug, error = %e, "scrape failed, skipping venue"),
        }
    }

    state.try_enter(CurationStep::Import)?;

    let accumulated = state.accumulated();
    std::fs::write(&out, serde_json::to_string_pretty(accumulated)?)?;
    println!(
        "✅ Curated {} events into {}",
        accumulated.len(),
        out.display()
    );
    Ok(())
}

async fn run_import(
    config: &AppConfig,
    input: PathBuf,
    target: String,
    commit: bool,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&input)?;
    let events: Vec<ScrapedEvent> = serde_json::from_str(&raw)?;
    let batch = mapper::batch_from_events(&events, &config.venues, !commit);

    let executor = build_executor(config)?;
    let selector = TargetSelector::parse_arg(&target);
    let selected = executor.select(&selector)?;

    println!("\n🔎 Reconciliation:");
    let reconciliations = reconcile::reconcile_targets(&selected, &batch.shows).await;
    for (name, outcome) in &reconciliations {
        match outcome {
            Ok(matches) => {
                let new = matches.iter().filter(|m| m.class == MatchClass::New).count();
                let updatable = matches
                    .iter()
                    .filter(|m| m.class == MatchClass::ExistingUpdatable)
                    .count();
                println!(
                    "   {} — {} new, {} updatable, {} unchanged",
                    name,
                    new,
                    updatable,
                    matches.len() - new - updatable
                );
            }
            Err(e) => println!("   {} — ⚠️  {}", name, e),
        }
    }

    // Artist/venue identity lives in each backend's canonical store; ask
    // every selected target how it would match them.
    println!("\n👥 Artist/venue matching:");
    for target in &selected {
        match target.api.import_preview(&batch.shows).await {
            Ok(preview) => {
                let new_artists = preview.artists.iter().filter(|a| a.will_create).count();
                let new_venues = preview.venues.iter().filter(|v| v.will_create).count();
                println!(
                    "   {} — {} new artists, {} new venues, can import: {}",
                    target.name, new_artists, new_venues, preview.can_import
                );
            }
            Err(e) => println!("   {} — ⚠️  {}", target.name, e),
        }
    }

    if !commit {
        println!("\n🧪 Dry run (pass --commit to write)");
    }

    let outcome = executor.run(&selector, &batch).await?;

    println!("\n📊 Import results:");
    for (name, report) in &outcome.results {
        println!(
            "   {} — shows: {}/{} imported, {} duplicate, {} updated, {} errors",
            name,
            report.shows.imported,
            report.shows.total,
            report.shows.duplicates,
            report.shows.updated,
            report.shows.errors
        );
        for message in &report.shows.messages {
            println!("      - {}", message);
        }
    }
    for (name, error) in &outcome.failures {
        println!("   {} — ❌ {}", name, error);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = AppConfig::load_default()?;

    match cli.command {
        Commands::Serve { port, metrics_port } => {
            metrics::install_exporter(metrics_port);
            let state = Arc::new(AppState {
                orchestrator: build_orchestrator(&config),
            });
            start_server(state, port).await?;
        }
        Commands::Preview { venues } => {
            run_preview(&config, venues).await;
        }
        Commands::Curate { venues, out } => {
            run_curate(&config, venues, out).await?;
        }
        Commands::Import {
            input,
            target,
            commit,
        } => {
            run_import(&config, input, target, commit).await?;
        }
    }
    Ok(())
}
