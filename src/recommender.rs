//! Attraction recommendation
//!
//! The [`Recommender`] owns the catalog, the region table and the
//! opening-hours cache for its whole lifetime. Queries only read the
//! catalog, so one recommender can serve many concurrent requests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::dataset::{Catalog, RecordStore};
use crate::graph::AttractionGraph;
use crate::models::{CandidateInfo, ScoredCandidate};
use crate::opening_hours::OpeningHoursCache;
use crate::region::AreaMap;
use crate::scoring::{self, ScoreQuery};
use crate::{Result, TourPlanError};

/// Longest date range a query may span
pub const MAX_SPAN_DAYS: u32 = 30;

/// A visitor's recommendation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub audiences: Vec<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub dates: Option<Vec<NaiveDate>>,
    /// Return at most this many candidates; all when absent
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RecommendationQuery {
    fn target_area(&self) -> Option<&str> {
        self.area
            .as_deref()
            .map(str::trim)
            .filter(|area| !area.is_empty())
    }
}

/// Consecutive dates starting at `start`, inclusive of the first day
pub fn date_span(start: NaiveDate, days: u32) -> Result<Vec<NaiveDate>> {
    if days == 0 {
        return Err(TourPlanError::validation("date range must cover at least one day"));
    }
    if days > MAX_SPAN_DAYS {
        return Err(TourPlanError::validation(format!(
            "date range cannot exceed {MAX_SPAN_DAYS} days"
        )));
    }
    Ok((0..days)
        .map(|offset| start + Duration::days(i64::from(offset)))
        .collect())
}

/// Dates from `start` through `end`, both inclusive
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if end < start {
        return Err(TourPlanError::validation(format!(
            "end date {end} is before start date {start}"
        )));
    }
    let days = u32::try_from((end - start).num_days() + 1)
        .map_err(|_| TourPlanError::validation("date range is too long"))?;
    date_span(start, days)
}

pub struct Recommender {
    catalog: Catalog,
    areas: Arc<AreaMap>,
    hours: OpeningHoursCache,
}

impl Recommender {
    #[must_use]
    pub fn new(catalog: Catalog, areas: Arc<AreaMap>) -> Self {
        Self {
            catalog,
            areas,
            hours: OpeningHoursCache::new(),
        }
    }

    /// Load the graph, records and optional region table from disk
    pub fn from_files(
        graph_path: impl AsRef<Path>,
        records_path: impl AsRef<Path>,
        region_path: Option<&Path>,
    ) -> Result<Self> {
        let graph = AttractionGraph::load(graph_path)?;
        let records = RecordStore::load(records_path)?;
        let areas = match region_path {
            Some(path) => AreaMap::load(path)?,
            None => AreaMap::xuzhou(),
        };
        let catalog = Catalog::build(&graph, &records, &areas);
        Ok(Self::new(catalog, Arc::new(areas)))
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn areas(&self) -> &Arc<AreaMap> {
        &self.areas
    }

    #[must_use]
    pub fn opening_hours(&self) -> &OpeningHoursCache {
        &self.hours
    }

    /// Whether a named attraction is open on a date; unknown names count as open
    pub fn check_opening_status(&self, name: &str, date: Option<NaiveDate>) -> bool {
        self.catalog
            .get(name)
            .is_none_or(|attraction| self.hours.is_open(&attraction.opening_hours, date))
    }

    /// Score every attraction and return them best first
    #[instrument(skip(self, query), fields(themes = ?query.themes, audiences = ?query.audiences, area = ?query.area))]
    pub fn recommend(&self, query: &RecommendationQuery) -> Vec<ScoredCandidate> {
        let dates = query.dates.as_deref().unwrap_or_default();
        let score_query = ScoreQuery {
            themes: &query.themes,
            audiences: &query.audiences,
            target_area: query.target_area(),
            dates,
        };

        let mut candidates: Vec<ScoredCandidate> = self
            .catalog
            .attractions()
            .iter()
            .filter_map(|attraction| {
                let Some(breakdown) =
                    scoring::score_attraction(attraction, &score_query, &self.areas, &self.hours)
                else {
                    debug!("{} is closed for the whole date range", attraction.name);
                    return None;
                };
                Some(ScoredCandidate {
                    attraction: Arc::clone(attraction),
                    score: scoring::rescale(breakdown.raw_total()),
                    info: CandidateInfo {
                        name: attraction.name.clone(),
                        rating: scoring::effective_rating(attraction),
                        comment_count: attraction.comment_count,
                        address: attraction.address.clone(),
                        opening_hours: attraction.opening_hours.clone(),
                        area: attraction.area.clone(),
                        breakdown,
                    },
                })
            })
            .collect();

        rank(&mut candidates);
        if let Some(limit) = query.limit {
            candidates.truncate(limit);
        }

        info!(
            "Recommended {} of {} attractions",
            candidates.len(),
            self.catalog.len()
        );
        candidates
    }
}

/// The requested limit, else `top_n`; a `top_n` of 0 means no limit
#[must_use]
pub fn limit_or_default(requested: Option<usize>, top_n: usize) -> Option<usize> {
    requested.or((top_n > 0).then_some(top_n))
}

/// Keep the ranked candidates named in `selected`, in selection order
pub fn select_by_name(ranked: Vec<ScoredCandidate>, selected: &[String]) -> Result<Vec<ScoredCandidate>> {
    let mut seen = HashSet::new();
    let mut chosen = Vec::with_capacity(selected.len());
    for name in selected {
        let name = name.trim();
        if !seen.insert(name) {
            continue;
        }
        match ranked.iter().find(|candidate| candidate.name() == name) {
            Some(candidate) => chosen.push(candidate.clone()),
            None => {
                warn!("Selected attraction '{}' is unknown or closed", name);
                return Err(TourPlanError::validation(format!(
                    "attraction '{name}' is unknown or closed on the requested dates"
                )));
            }
        }
    }
    Ok(chosen)
}

/// Order by score, then comment count, both descending
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.info.comment_count.cmp(&a.info.comment_count))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::AttractionRecord;
    use crate::graph::{NodeKind, Relation};
    use serde_json::json;

    fn recommender() -> Recommender {
        let mut graph = AttractionGraph::new();
        let theme = graph.add_node(NodeKind::Theme, "两汉文化", None, None);
        let nature = graph.add_node(NodeKind::Theme, "自然风光", None, None);

        let mut records = Vec::new();
        for (name, topic, comments, hours) in [
            ("龟山汉墓", &theme, "3200", "全天开放"),
            ("云龙湖", &nature, "12000", "全天开放"),
            ("汉文化景区", &theme, "800", "不开放"),
        ] {
            let id = graph.add_node(NodeKind::Attraction, name, None, None);
            graph.add_edge(&id, topic, Relation::HasTheme, 3.0);
            records.push(AttractionRecord {
                name: name.to_string(),
                rating: Some(json!(4.6)),
                comment_count: Some(json!(comments)),
                address: Some("江苏省徐州市鼓楼区".to_string()),
                opening_hours: Some(hours.to_string()),
                description: None,
            });
        }

        let areas = AreaMap::xuzhou();
        let catalog = Catalog::build(&graph, &RecordStore::from_records(records), &areas);
        Recommender::new(catalog, Arc::new(areas))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_theme_query_ranks_matches_first() {
        let recommender = recommender();
        let query = RecommendationQuery {
            themes: vec!["两汉文化".to_string()],
            ..RecommendationQuery::default()
        };
        let results = recommender.recommend(&query);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name(), "龟山汉墓");
        assert_eq!(results[1].name(), "汉文化景区");
        assert_eq!(results[2].name(), "云龙湖");
    }

    #[test]
    fn test_tie_broken_by_comment_count() {
        let recommender = recommender();
        let results = recommender.recommend(&RecommendationQuery::default());
        // 云龙湖 earns the larger comment bonus, the other two tie on score
        assert_eq!(results[0].name(), "云龙湖");
        assert_eq!(results[1].name(), "龟山汉墓");
        assert!(results[1].score >= results[2].score);
    }

    #[test]
    fn test_limit_truncates() {
        let recommender = recommender();
        let query = RecommendationQuery {
            limit: Some(1),
            ..RecommendationQuery::default()
        };
        assert_eq!(recommender.recommend(&query).len(), 1);
    }

    #[test]
    fn test_closed_attractions_are_dropped_for_dates() {
        let recommender = recommender();
        let query = RecommendationQuery {
            dates: Some(date_span(date(2024, 6, 1), 3).unwrap()),
            ..RecommendationQuery::default()
        };
        let results = recommender.recommend(&query);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.name() != "汉文化景区"));
        assert_eq!(recommender.opening_hours().len(), 6);
        assert_eq!(recommender.opening_hours().parsed_specs(), 2);
    }

    #[test]
    fn test_check_opening_status() {
        let recommender = recommender();
        assert!(!recommender.check_opening_status("汉文化景区", Some(date(2024, 6, 1))));
        assert!(recommender.check_opening_status("云龙湖", Some(date(2024, 6, 1))));
        assert!(recommender.check_opening_status("不存在", Some(date(2024, 6, 1))));
        assert!(!recommender.check_opening_status("汉文化景区", None));
        assert!(recommender.check_opening_status("云龙湖", None));
    }

    #[test]
    fn test_limit_or_default() {
        assert_eq!(limit_or_default(Some(3), 10), Some(3));
        assert_eq!(limit_or_default(None, 10), Some(10));
        assert_eq!(limit_or_default(None, 0), None);
        assert_eq!(limit_or_default(Some(2), 0), Some(2));
    }

    #[test]
    fn test_select_by_name_keeps_selection_order() {
        let recommender = recommender();
        let ranked = recommender.recommend(&RecommendationQuery::default());
        let selected = vec![
            "汉文化景区".to_string(),
            " 云龙湖 ".to_string(),
            "汉文化景区".to_string(),
        ];
        let chosen = select_by_name(ranked, &selected).unwrap();
        let names: Vec<&str> = chosen.iter().map(ScoredCandidate::name).collect();
        assert_eq!(names, vec!["汉文化景区", "云龙湖"]);
    }

    #[test]
    fn test_select_by_name_rejects_unknown_and_closed() {
        let recommender = recommender();
        let ranked = recommender.recommend(&RecommendationQuery::default());
        let err = select_by_name(ranked, &["不存在".to_string()]).unwrap_err();
        assert!(matches!(err, TourPlanError::Validation { .. }));

        let dated = RecommendationQuery {
            dates: Some(vec![date(2024, 6, 1)]),
            ..RecommendationQuery::default()
        };
        let ranked = recommender.recommend(&dated);
        assert!(select_by_name(ranked, &["汉文化景区".to_string()]).is_err());
    }

    #[test]
    fn test_date_span_and_range() {
        let days = date_span(date(2024, 12, 30), 3).unwrap();
        assert_eq!(days, vec![date(2024, 12, 30), date(2024, 12, 31), date(2025, 1, 1)]);
        assert_eq!(date_range(date(2024, 5, 1), date(2024, 5, 3)).unwrap().len(), 3);
        assert!(date_span(date(2024, 5, 1), 0).is_err());
        assert!(date_span(date(2024, 5, 1), 31).is_err());
        assert!(date_range(date(2024, 5, 3), date(2024, 5, 1)).is_err());
    }

    #[test]
    fn test_blank_area_means_no_target() {
        let query = RecommendationQuery {
            area: Some("  ".to_string()),
            ..RecommendationQuery::default()
        };
        assert_eq!(query.target_area(), None);
    }
}
