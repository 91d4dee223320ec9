use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tourplan::recommender::{self, RecommendationQuery};
use tourplan::{AppState, TourPlanConfig, TourPlanError, web};

#[derive(Parser)]
#[command(name = "tourplan", version, about = "Xuzhou attraction recommender and itinerary planner")]
struct Cli {
    /// Configuration file (defaults to ~/.config/tourplan/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank attractions for the given interests
    Recommend {
        #[command(flatten)]
        query: QueryArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compose an itinerary for selected or top-ranked attractions
    Plan {
        #[command(flatten)]
        query: QueryArgs,
        /// Attraction to include; repeat for several
        #[arg(short, long = "select")]
        select: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List known areas, themes and audiences
    Areas,
}

#[derive(Args)]
struct QueryArgs {
    /// Theme of interest; repeat for several
    #[arg(short, long = "theme")]
    themes: Vec<String>,
    /// Audience; repeat for several
    #[arg(short, long = "audience")]
    audiences: Vec<String>,
    /// Preferred area
    #[arg(long)]
    area: Option<String>,
    /// First visiting date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Number of visiting days starting at --start
    #[arg(long, default_value_t = 1, requires = "start")]
    days: u32,
    /// Maximum number of attractions
    #[arg(short = 'n', long)]
    limit: Option<usize>,
}

impl QueryArgs {
    fn into_query(self, top_n: usize) -> Result<RecommendationQuery, TourPlanError> {
        let dates = self
            .start
            .map(|start| recommender::date_span(start, self.days))
            .transpose()?;
        Ok(RecommendationQuery {
            themes: self.themes,
            audiences: self.audiences,
            area: self.area,
            dates,
            limit: recommender::limit_or_default(self.limit, top_n),
        })
    }
}

fn init_tracing(config: &TourPlanConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tourplan={level},tower_http={level}")));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TourPlanConfig::load_from_path(cli.config)?;
    init_tracing(&config, cli.verbose);
    info!("TourPlan {} starting", tourplan::VERSION);

    let state = AppState::from_config(&config)?;

    match cli.command {
        Commands::Recommend { query, json } => {
            let query = query.into_query(state.top_n).map_err(report)?;
            let candidates = state.recommender.recommend(&query);
            if json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                for (i, candidate) in candidates.iter().enumerate() {
                    println!(
                        "{}. {} (评分: {:.1}/5, 评论数: {}) [{}]",
                        i + 1,
                        candidate.name(),
                        candidate.score,
                        candidate.info.comment_count,
                        candidate.info.area
                    );
                }
            }
        }
        Commands::Plan {
            query,
            select,
            json,
        } => {
            let mut query = query.into_query(state.top_n).map_err(report)?;
            if !select.is_empty() {
                query.limit = None;
            }
            let ranked = state.recommender.recommend(&query);
            let chosen = if select.is_empty() {
                ranked
            } else {
                recommender::select_by_name(ranked, &select).map_err(report)?
            };
            if chosen.is_empty() {
                return Err(report(TourPlanError::validation("no attractions available to plan")));
            }

            let itinerary = state
                .composer
                .compose(&chosen, query.dates.as_deref())
                .await;
            if json {
                println!("{}", serde_json::to_string_pretty(&itinerary)?);
            } else {
                print!("{itinerary}");
            }
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            web::run(state, &host, port, config.server.max_body_bytes)
                .await
                .with_context(|| "Server stopped")?;
        }
        Commands::Areas => {
            let catalog = state.recommender.catalog();
            let areas = state.recommender.areas();
            println!("Areas:");
            for area in catalog.areas() {
                let neighbours: Vec<String> = catalog
                    .areas()
                    .iter()
                    .filter(|other| areas.is_adjacent(area, other))
                    .cloned()
                    .collect();
                println!("  {area} (adjacent: {})", neighbours.join("、"));
            }
            println!("Themes: {}", catalog.themes().join("、"));
            println!("Audiences: {}", catalog.audiences().join("、"));
        }
    }

    Ok(())
}

fn report(error: TourPlanError) -> anyhow::Error {
    eprintln!("{}", error.user_message());
    error.into()
}
