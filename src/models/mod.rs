//! Data models for the TourPlan application
//!
//! This module contains the core domain models organized by concern:
//! - Attraction: joined graph and record data for one point of interest
//! - Candidate: scored recommendation results
//! - Itinerary: ordered visiting plans with narratives and extras

pub mod attraction;
pub mod candidate;
pub mod itinerary;

// Re-export all public types for convenient access
pub use attraction::{Attraction, Rating, Tag, UNKNOWN_AREA};
pub use candidate::{CandidateInfo, ScoreBreakdown, ScoredCandidate};
pub use itinerary::{
    AttractionDetail, Dish, Extras, FoodRecommendation, Itinerary, ItineraryDay, Narrative,
    Restaurant,
};
