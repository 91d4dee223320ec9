//! Attraction scoring
//!
//! A raw score on a 0-100 scale is the sum of six weighted terms minus an
//! opening-hours penalty; the raw score is then rescaled linearly into
//! [1.0, 5.0] and rounded to one decimal.
//!
//! | term            | range |
//! |-----------------|-------|
//! | theme match     | 0-30  |
//! | audience match  | 0-25  |
//! | area match      | 0-20  |
//! | base rating     | 0-10  |
//! | comment volume  | 1-8   |
//! | seasonal bonus  | 0-2   |
//! | opening penalty | 0-5   |

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::models::{Attraction, Rating, ScoreBreakdown};
use crate::opening_hours::OpeningHoursCache;
use crate::region::AreaMap;

pub const THEME_WEIGHT: f64 = 30.0;
pub const AUDIENCE_WEIGHT: f64 = 25.0;
pub const AREA_WEIGHT: f64 = 20.0;
pub const ADJACENT_AREA_SCORE: f64 = 14.0;
pub const DISTANT_AREA_SCORE: f64 = 8.0;
pub const RATING_WEIGHT: f64 = 10.0;
pub const MAX_OPENING_PENALTY: f64 = 5.0;
pub const MAX_RAW_SCORE: f64 = 100.0;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

/// Below this share of open days the opening penalty applies
pub const OPEN_FRACTION_THRESHOLD: f64 = 0.8;

/// Rating used when the record holds text that is not a number
pub const DEFAULT_RATING: f64 = 3.5;

/// Themes earning the winter bonus in December to February
pub const WINTER_THEMES: [&str; 2] = ["冰雪", "冬季运动"];
/// Themes earning the flower bonus in March and April
pub const FLOWER_THEMES: [&str; 1] = ["赏花"];

/// `(lower bound inclusive, bonus)`, highest band first
const COMMENT_BANDS: [(u64, f64); 5] = [(5000, 8.0), (1000, 6.0), (200, 4.0), (50, 2.0), (0, 1.0)];

/// What a visitor asked for
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreQuery<'a> {
    pub themes: &'a [String],
    pub audiences: &'a [String],
    pub target_area: Option<&'a str>,
    /// Requested visiting dates, empty when no date filter applies
    pub dates: &'a [NaiveDate],
}

/// Share of requested labels the attraction carries, scaled to `weight`.
///
/// Nothing requested earns the full weight.
#[must_use]
pub fn match_score(requested: &[String], has: impl Fn(&str) -> bool, weight: f64) -> f64 {
    let requested: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
    if requested.is_empty() {
        return weight;
    }
    let matched = requested.iter().filter(|label| has(label)).count();
    weight * matched as f64 / requested.len() as f64
}

#[must_use]
pub fn area_score(area: &str, target: Option<&str>, areas: &AreaMap) -> f64 {
    match target {
        None => AREA_WEIGHT,
        Some(target) if target == area => AREA_WEIGHT,
        Some(target) if areas.is_adjacent(target, area) => ADJACENT_AREA_SCORE,
        Some(_) => DISTANT_AREA_SCORE,
    }
}

/// Rating inferred from graph connectivity, clamped into [3.0, 4.75]
#[must_use]
pub fn synthesize_rating(theme_count: usize, audience_count: usize, degree: usize) -> f64 {
    let hundred_point = 70.0
        + 10.0 * (theme_count as f64).ln_1p()
        + 8.0 * (audience_count as f64).ln_1p()
        + 5.0 * (degree as f64).ln_1p();
    hundred_point.clamp(60.0, 95.0) / 20.0
}

/// The rating folded into the score, with explicit fallbacks
#[must_use]
pub fn effective_rating(attraction: &Attraction) -> f64 {
    match attraction.rating {
        Rating::Rated(rating) => rating.clamp(MIN_SCORE, MAX_SCORE),
        Rating::Unrated => synthesize_rating(
            attraction.themes.len(),
            attraction.audiences.len(),
            attraction.degree,
        )
        .clamp(MIN_SCORE, MAX_SCORE),
        Rating::Unparseable => DEFAULT_RATING,
    }
}

#[must_use]
pub fn comment_bonus(comment_count: u64) -> f64 {
    COMMENT_BANDS
        .iter()
        .find(|(lower, _)| comment_count >= *lower)
        .map_or(1.0, |(_, bonus)| *bonus)
}

/// Bonus for seasonal themes, judged on the first requested date
#[must_use]
pub fn seasonal_bonus(attraction: &Attraction, dates: &[NaiveDate]) -> f64 {
    let Some(first) = dates.first() else {
        return 0.0;
    };
    let has_any = |labels: &[&str]| labels.iter().any(|label| attraction.has_theme(label));

    match first.month() {
        12 | 1 | 2 if has_any(&WINTER_THEMES) => 2.0,
        3 | 4 if has_any(&FLOWER_THEMES) => 1.0,
        _ => 0.0,
    }
}

/// Share of `dates` on which the attraction is open; 1.0 for no dates
pub fn open_fraction(attraction: &Attraction, dates: &[NaiveDate], hours: &OpeningHoursCache) -> f64 {
    if dates.is_empty() {
        return 1.0;
    }
    let open_days = dates
        .iter()
        .filter(|date| hours.is_open(&attraction.opening_hours, Some(**date)))
        .count();
    open_days as f64 / dates.len() as f64
}

#[must_use]
pub fn opening_penalty(open_fraction: f64) -> f64 {
    if open_fraction < OPEN_FRACTION_THRESHOLD {
        MAX_OPENING_PENALTY * (1.0 - open_fraction)
    } else {
        0.0
    }
}

/// Map a raw 0-100 score into [1.0, 5.0], rounded to one decimal
#[must_use]
pub fn rescale(raw: f64) -> f64 {
    let scaled = MIN_SCORE + (MAX_SCORE - MIN_SCORE) * raw / MAX_RAW_SCORE;
    ((scaled * 10.0).round() / 10.0).clamp(MIN_SCORE, MAX_SCORE)
}

/// Score one attraction; `None` when it is closed on every requested date
pub fn score_attraction(
    attraction: &Attraction,
    query: &ScoreQuery<'_>,
    areas: &AreaMap,
    hours: &OpeningHoursCache,
) -> Option<ScoreBreakdown> {
    let fraction = open_fraction(attraction, query.dates, hours);
    if fraction <= 0.0 {
        return None;
    }

    Some(ScoreBreakdown {
        theme: match_score(query.themes, |label| attraction.has_theme(label), THEME_WEIGHT),
        audience: match_score(
            query.audiences,
            |label| attraction.has_audience(label),
            AUDIENCE_WEIGHT,
        ),
        area: area_score(&attraction.area, query.target_area, areas),
        rating: RATING_WEIGHT * effective_rating(attraction) / MAX_SCORE,
        comments: comment_bonus(attraction.comment_count),
        seasonal: seasonal_bonus(attraction, query.dates),
        opening_penalty: opening_penalty(fraction),
    })
}
