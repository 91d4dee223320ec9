//! JSON API handlers mounted under `/api`

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::TourPlanError;
use crate::itinerary::ItineraryComposer;
use crate::models::{Itinerary, ScoredCandidate};
use crate::recommender::{self, RecommendationQuery, Recommender};

/// Shared state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub composer: Arc<ItineraryComposer>,
    /// Candidates returned when a request sets no limit; 0 returns all
    pub top_n: usize,
}

#[derive(Debug, Serialize)]
pub struct Facets {
    pub themes: Vec<String>,
    pub audiences: Vec<String>,
    pub areas: Vec<String>,
}

/// Inclusive visiting date range
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateRangeInput {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub audiences: Vec<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub dates: Option<DateRangeInput>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RecommendRequest {
    fn into_query(self, top_n: usize) -> Result<RecommendationQuery, TourPlanError> {
        let dates = self
            .dates
            .map(|range| recommender::date_range(range.start, range.end))
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

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub count: usize,
    pub candidates: Vec<ScoredCandidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanRequest {
    #[serde(flatten)]
    pub query: RecommendRequest,
    /// Attractions to plan; the top recommendations when empty
    #[serde(default)]
    pub selected: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A handler failure rendered as a JSON error body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<TourPlanError> for ApiError {
    fn from(error: TourPlanError) -> Self {
        let status = match error {
            TourPlanError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/facets", get(get_facets))
        .route("/recommend", post(recommend))
        .route("/plan", post(plan))
        .with_state(state)
}

async fn get_facets(State(state): State<AppState>) -> Json<Facets> {
    let catalog = state.recommender.catalog();
    Json(Facets {
        themes: catalog.themes().to_vec(),
        audiences: catalog.audiences().to_vec(),
        areas: catalog.areas().to_vec(),
    })
}

async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let query = request.into_query(state.top_n)?;
    let candidates = state.recommender.recommend(&query);
    Ok(Json(RecommendResponse {
        count: candidates.len(),
        candidates,
    }))
}

async fn plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<Itinerary>, ApiError> {
    let selected = request.selected;
    let mut query = request.query.into_query(state.top_n)?;
    if !selected.is_empty() {
        query.limit = None;
    }
    let dates = query.dates.clone();
    let ranked = state.recommender.recommend(&query);

    let chosen = if selected.is_empty() {
        ranked
    } else {
        recommender::select_by_name(ranked, &selected)?
    };
    if chosen.is_empty() {
        return Err(TourPlanError::validation("no attractions available to plan").into());
    }

    info!("Planning itinerary for {} attractions", chosen.len());
    let itinerary = state.composer.compose(&chosen, dates.as_deref()).await;
    Ok(Json(itinerary))
}
