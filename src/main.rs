use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use smartcity_advisor::clients::GeminiRestClient;
use smartcity_advisor::config::{self, Config, RuntimeConfig};
use smartcity_advisor::context::{Building, GridSnapshot, Route, TimeRange};
use smartcity_advisor::{
    CredentialHolder, Domain, JsonFileStore, KeyValueStore, MemoryStore, MockCatalog,
    RecommendationResolver, Resolution, ResolveRequest,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "smartcity-advisor")]
#[command(about = "Smart city operational recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a recommendation from free-text context
    Resolve {
        /// energy, transport or grid
        #[arg(long)]
        domain: Domain,
        /// Context text forwarded to the model
        #[arg(long, default_value = "")]
        context: String,
        /// Explicit entity key (building name, route id)
        #[arg(long)]
        entity: Option<String>,
        /// Print the full resolution as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve for a known building, route or the grid
    Analyze {
        #[command(subcommand)]
        target: AnalyzeTarget,
        /// Print the full resolution as JSON
        #[arg(long, global = true)]
        json: bool,
    },
    /// Manage the stored API credential
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// List canned recommendations
    Catalog {
        #[arg(long)]
        domain: Option<Domain>,
    },
}

#[derive(Subcommand)]
enum AnalyzeTarget {
    Building {
        name: String,
        #[arg(long, default_value = "Daily")]
        range: TimeRange,
        /// Current load in kW (defaults to the building's base load)
        #[arg(long)]
        load: Option<f64>,
    },
    Route {
        id: String,
        #[arg(long, default_value = "Weekly")]
        range: TimeRange,
    },
    Grid {
        #[arg(long, default_value = "Monthly")]
        range: TimeRange,
        #[arg(long)]
        frequency: Option<f64>,
        #[arg(long)]
        demand: Option<f64>,
        #[arg(long)]
        battery: Option<f64>,
    },
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Store a new credential (an empty value disables the external call)
    Set { value: String },
    /// Show whether a credential is stored
    Show,
    /// Remove the stored credential
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may set RUST_LOG, so read it before the subscriber goes up, and
    // install the subscriber before Config::load so its warnings are kept.
    config::load_env_files();
    tracing_subscriber::fmt()
        .with_env_filter(RuntimeConfig::load_from_env().log_level.as_str())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {:#}", e);
        e
    })?;

    let cli = Cli::parse();
    let resolver = build_resolver(&config)?;

    match cli.command {
        Commands::Resolve {
            domain,
            context,
            entity,
            json,
        } => {
            let mut request = ResolveRequest::new(domain, context);
            if let Some(entity) = entity {
                request = request.with_entity(entity);
            }
            let resolution = resolver.resolve_detailed(&request).await;
            print_resolution(&resolution, json)?;
        }
        Commands::Analyze { target, json } => {
            let request = analyze_request(target)?;
            let resolution = resolver.resolve_detailed(&request).await;
            print_resolution(&resolution, json)?;
        }
        Commands::Credential { action } => match action {
            CredentialAction::Set { value } => {
                resolver.set_credential(value)?;
                println!("Credential saved.");
            }
            CredentialAction::Show => match resolver.get_credential() {
                Some(value) if !value.is_empty() => println!("Credential: {}", mask(&value)),
                _ => println!("No credential set; using the built-in simulation engine."),
            },
            CredentialAction::Clear => {
                resolver.clear_credential()?;
                println!("Credential cleared.");
            }
        },
        Commands::Catalog { domain } => {
            let domains = domain.map(|d| vec![d]).unwrap_or_else(|| Domain::ALL.to_vec());
            for domain in domains {
                println!("[{}]", domain);
                for (key, rec) in resolver.catalog().specific(domain) {
                    println!("  {} ({}, {})", key, rec.impact_tier, rec.savings_label);
                }
                for (i, rec) in resolver.catalog().generic(domain).iter().enumerate() {
                    println!("  generic #{} ({}, {})", i, rec.impact_tier, rec.savings_label);
                }
            }
        }
    }

    Ok(())
}

fn build_resolver(config: &Config) -> Result<RecommendationResolver> {
    let store: Arc<dyn KeyValueStore> = match config.storage.resolved_path() {
        Some(path) => {
            info!("Using credential storage at {}", path.display());
            Arc::new(JsonFileStore::new(path))
        }
        None => {
            warn!("No config directory available; credential will not persist");
            Arc::new(MemoryStore::new())
        }
    };
    let credentials = Arc::new(CredentialHolder::load(store));
    let mut resolver = RecommendationResolver::new(credentials);

    if let Some(path) = &config.catalog.path {
        resolver = resolver.with_catalog(MockCatalog::load(path)?);
        info!("Loaded catalog override from {}", path.display());
    }

    match GeminiRestClient::from_config(&config.gemini) {
        Ok(client) => resolver = resolver.with_backend(Arc::new(client)),
        Err(e) => warn!("Generative backend unavailable, using canned answers only: {}", e),
    }

    Ok(resolver)
}

fn analyze_request(target: AnalyzeTarget) -> Result<ResolveRequest> {
    match target {
        AnalyzeTarget::Building { name, range, load } => {
            let building = Building::find(&name)
                .ok_or_else(|| anyhow::anyhow!("unknown building '{}'", name))?;
            let load = load.unwrap_or(f64::from(building.base_load_kw));
            Ok(building.request(range, load))
        }
        AnalyzeTarget::Route { id, range } => {
            let route = Route::find(&id).ok_or_else(|| anyhow::anyhow!("unknown route '{}'", id))?;
            Ok(route.request(range))
        }
        AnalyzeTarget::Grid {
            range,
            frequency,
            demand,
            battery,
        } => {
            let defaults = GridSnapshot::default();
            let snapshot = GridSnapshot {
                frequency_hz: frequency.unwrap_or(defaults.frequency_hz),
                demand_mw: demand.unwrap_or(defaults.demand_mw),
                battery_pct: battery.unwrap_or(defaults.battery_pct),
            };
            Ok(snapshot.request(range))
        }
    }
}

fn print_resolution(resolution: &Resolution, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(resolution)?);
        return Ok(());
    }
    let rec = &resolution.recommendation;
    println!("Impact: {}  Savings: {}", rec.impact_tier, rec.savings_label);
    for (i, action) in rec.actions.iter().enumerate() {
        println!("  {}. {}", i + 1, action);
    }
    if resolution.is_degraded() {
        eprintln!("(external model unavailable; showing simulated recommendation)");
    }
    Ok(())
}

fn mask(value: &str) -> String {
    let tail: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}
