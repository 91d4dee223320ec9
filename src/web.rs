use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::{self, AppState};
use crate::cache::PersistentCache;
use crate::config::TourPlanConfig;
use crate::descriptions::DescriptionService;
use crate::generator::{OfflineGenerator, OllamaGenerator, TextGenerator};
use crate::itinerary::ItineraryComposer;
use crate::recommender::Recommender;

impl AppState {
    /// Load the catalog and wire up generation as configured
    pub fn from_config(config: &TourPlanConfig) -> Result<Self> {
        let recommender = Recommender::from_files(
            &config.data.graph_path,
            &config.data.records_path,
            config.data.regions_path.as_deref().map(Path::new),
        )
        .with_context(|| "Failed to load attraction data")?;

        let generator: Arc<dyn TextGenerator> = if config.generator.enabled {
            Arc::new(OllamaGenerator::from_config(&config.generator)?)
        } else {
            tracing::info!("Text generation disabled, using fallback texts");
            Arc::new(OfflineGenerator)
        };

        let mut descriptions = DescriptionService::new(Arc::clone(&generator))
            .with_temperature(config.generator.description_temperature);
        if config.cache.enabled {
            let cache = PersistentCache::open(config.cache_dir())
                .with_context(|| "Failed to open description cache")?;
            let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
            descriptions = descriptions.with_cache(cache, ttl);
        }

        let composer = ItineraryComposer::new(generator, Arc::clone(recommender.areas()), descriptions)
            .with_temperature(config.generator.narrative_temperature);

        Ok(Self {
            recommender: Arc::new(recommender),
            composer: Arc::new(composer),
            top_n: config.defaults.top_n,
        })
    }
}

pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(state))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
}

pub async fn run(state: AppState, host: &str, port: u16, max_body_bytes: usize) -> Result<()> {
    let app = app(state, max_body_bytes);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app).await.context("Web server failed")?;
    Ok(())
}
