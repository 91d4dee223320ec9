//! `TourPlan` - Attraction recommendation and itinerary planning for Xuzhou
//!
//! This library scores attractions from a tourism knowledge graph against a
//! visitor's interests, orders a selection into a low-transfer route and
//! composes a day-by-day itinerary with generated narratives.

pub mod api;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod descriptions;
pub mod error;
pub mod extras;
pub mod generator;
pub mod graph;
pub mod itinerary;
pub mod models;
pub mod opening_hours;
pub mod recommender;
pub mod region;
pub mod route;
pub mod scoring;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use cache::PersistentCache;
pub use config::TourPlanConfig;
pub use dataset::{AttractionRecord, Catalog, RecordStore};
pub use descriptions::DescriptionService;
pub use error::TourPlanError;
pub use generator::{GenerationRequest, OfflineGenerator, OllamaGenerator, TextGenerator};
pub use graph::AttractionGraph;
pub use itinerary::ItineraryComposer;
pub use models::{Attraction, Itinerary, ScoredCandidate};
pub use opening_hours::{OpeningHoursCache, is_open};
pub use recommender::{RecommendationQuery, Recommender};
pub use region::AreaMap;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TourPlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
