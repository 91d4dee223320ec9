//! Scored recommendation candidates

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::attraction::Attraction;

/// Per-term contributions to a raw score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub theme: f64,
    pub audience: f64,
    pub area: f64,
    pub rating: f64,
    pub comments: f64,
    pub seasonal: f64,
    pub opening_penalty: f64,
}

impl ScoreBreakdown {
    /// Raw score on the 0-100 scale
    #[must_use]
    pub fn raw_total(&self) -> f64 {
        self.theme + self.audience + self.area + self.rating + self.comments + self.seasonal
            - self.opening_penalty
    }
}

/// Snapshot of the attraction fields shown next to a score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub name: String,
    /// Rating actually used for scoring, after clamping or synthesis
    pub rating: f64,
    pub comment_count: u64,
    pub address: String,
    pub opening_hours: String,
    pub area: String,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    #[serde(skip)]
    pub attraction: Arc<Attraction>,
    /// Final score in [1.0, 5.0]
    pub score: f64,
    pub info: CandidateInfo,
}

impl ScoredCandidate {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.attraction.name
    }
}
