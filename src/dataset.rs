//! Dataset loading
//!
//! Joins the attraction graph with the flat record store into an immutable
//! catalog of [`Attraction`]s. Attractions present in only one of the two
//! sources are skipped, never reported as errors.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::Result;
use crate::graph::{AttractionGraph, Node, NodeKind, Relation};
use crate::models::attraction::parse_comment_count;
use crate::models::{Attraction, Rating, Tag, UNKNOWN_AREA};
use crate::region::AreaMap;

/// One row of the record store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttractionRecord {
    #[serde(alias = "名称")]
    pub name: String,
    #[serde(default, alias = "评分")]
    pub rating: Option<Value>,
    #[serde(default, alias = "评论数")]
    pub comment_count: Option<Value>,
    #[serde(default, alias = "enhanced_address")]
    pub address: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Attraction records keyed by name
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: HashMap<String, AttractionRecord>,
}

impl RecordStore {
    /// Later records with the same name replace earlier ones
    #[must_use]
    pub fn from_records(records: Vec<AttractionRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.name.trim().to_string(), record))
            .collect();
        Self { records }
    }

    /// Load a JSON array of records
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading attraction records from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let records: Vec<AttractionRecord> = serde_json::from_str(&content)?;
        let store = Self::from_records(records);
        info!("Loaded {} attraction records", store.len());
        Ok(store)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttractionRecord> {
        self.records.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

/// The immutable set of attractions a recommender works on
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    attractions: Vec<Arc<Attraction>>,
    themes: Vec<String>,
    audiences: Vec<String>,
    areas: Vec<String>,
}

impl Catalog {
    /// Join graph attractions with their records
    #[must_use]
    pub fn build(graph: &AttractionGraph, records: &RecordStore, area_map: &AreaMap) -> Self {
        let known_areas: Vec<String> = graph
            .labels(NodeKind::Area)
            .into_iter()
            .chain(area_map.areas())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut attractions = Vec::new();
        let mut joined_names = BTreeSet::new();

        for node in graph.nodes_of_kind(NodeKind::Attraction) {
            let Some(record) = records.get(&node.name) else {
                warn!("Attraction '{}' has no record, skipping", node.name);
                continue;
            };
            joined_names.insert(node.name.as_str());
            attractions.push(Arc::new(Self::join(graph, node, record, &known_areas)));
        }

        let orphaned = records
            .names()
            .filter(|name| !joined_names.contains(name))
            .count();
        if orphaned > 0 {
            warn!("{} records have no attraction in the graph, skipping", orphaned);
        }

        info!(
            "Catalog built with {} attractions across {} areas",
            attractions.len(),
            known_areas.len()
        );

        Self {
            attractions,
            themes: graph.labels(NodeKind::Theme),
            audiences: graph.labels(NodeKind::Audience),
            areas: known_areas,
        }
    }

    fn join(
        graph: &AttractionGraph,
        node: &Node,
        record: &AttractionRecord,
        known_areas: &[String],
    ) -> Attraction {
        let to_tags = |pairs: Vec<(String, f64)>| {
            pairs
                .into_iter()
                .map(|(label, weight)| Tag { label, weight })
                .collect::<Vec<_>>()
        };

        let address = node
            .address
            .clone()
            .or_else(|| record.address.clone())
            .unwrap_or_default();
        let opening_hours = record
            .opening_hours
            .clone()
            .or_else(|| node.opening_hours.clone())
            .unwrap_or_default();

        let area = resolve_area(&address, known_areas)
            .map(str::to_string)
            .or_else(|| {
                graph
                    .related(&node.id, Relation::LocatedIn)
                    .into_iter()
                    .next()
                    .map(|(label, _)| label)
            })
            .unwrap_or_else(|| UNKNOWN_AREA.to_string());

        Attraction {
            name: node.name.clone(),
            rating: Rating::from_value(record.rating.as_ref()),
            comment_count: parse_comment_count(record.comment_count.as_ref()),
            address,
            opening_hours,
            description: record
                .description
                .clone()
                .filter(|description| !description.trim().is_empty()),
            themes: to_tags(graph.related(&node.id, Relation::HasTheme)),
            audiences: to_tags(graph.related(&node.id, Relation::SuitableFor)),
            degree: graph.degree(&node.id),
            area,
        }
    }

    #[must_use]
    pub fn attractions(&self) -> &[Arc<Attraction>] {
        &self.attractions
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Attraction>> {
        self.attractions.iter().find(|attraction| attraction.name == name)
    }

    #[must_use]
    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    #[must_use]
    pub fn audiences(&self) -> &[String] {
        &self.audiences
    }

    #[must_use]
    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attractions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attractions.is_empty()
    }
}

/// The longest known area name contained in an address
#[must_use]
pub fn resolve_area<'a>(address: &str, known_areas: &'a [String]) -> Option<&'a str> {
    known_areas
        .iter()
        .filter(|area| !area.is_empty() && address.contains(area.as_str()))
        .max_by_key(|area| area.chars().count())
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, address: &str) -> AttractionRecord {
        AttractionRecord {
            name: name.to_string(),
            rating: Some(json!(4.6)),
            comment_count: Some(json!("2,310条点评")),
            address: Some(address.to_string()),
            opening_hours: Some("全天开放".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_record_aliases() {
        let records: Vec<AttractionRecord> = serde_json::from_str(
            r#"[{"名称": "云龙湖", "评分": "4.8", "评论数": "1.2万", "enhanced_address": "江苏省徐州市泉山区湖中路", "opening_hours": "全天开放"}]"#,
        )
        .unwrap();
        assert_eq!(records[0].name, "云龙湖");
        assert_eq!(records[0].address.as_deref(), Some("江苏省徐州市泉山区湖中路"));
    }

    #[test]
    fn test_resolve_area_prefers_longest_match() {
        let areas = vec!["铜山".to_string(), "铜山区".to_string(), "沛县".to_string()];
        assert_eq!(resolve_area("江苏省徐州市铜山区汉王镇", &areas), Some("铜山区"));
        assert_eq!(resolve_area("南京市玄武区", &areas), None);
    }

    #[test]
    fn test_build_joins_and_skips_unmatched() {
        let mut graph = AttractionGraph::new();
        let lake = graph.add_node(NodeKind::Attraction, "云龙湖", None, None);
        graph.add_node(NodeKind::Attraction, "无记录景点", None, None);
        let theme = graph.add_node(NodeKind::Theme, "自然风光", None, None);
        graph.add_edge(&lake, &theme, Relation::HasTheme, 2.0);

        let records = RecordStore::from_records(vec![
            record("云龙湖", "江苏省徐州市泉山区湖中路"),
            record("不在图谱", "江苏省徐州市云龙区"),
        ]);

        let catalog = Catalog::build(&graph, &records, &AreaMap::xuzhou());
        assert_eq!(catalog.len(), 1);

        let lake = catalog.get("云龙湖").unwrap();
        assert_eq!(lake.area, "泉山区");
        assert_eq!(lake.comment_count, 2310);
        assert_eq!(lake.rating, Rating::Rated(4.6));
        assert!(lake.has_theme("自然风光"));
        assert_eq!(lake.degree, 1);
        assert_eq!(catalog.themes(), &["自然风光".to_string()]);
    }

    #[test]
    fn test_area_falls_back_to_graph_then_unknown() {
        let mut graph = AttractionGraph::new();
        let a = graph.add_node(NodeKind::Attraction, "甲", None, None);
        graph.add_node(NodeKind::Attraction, "乙", None, None);
        let area = graph.add_node(NodeKind::Area, "贾汪区", None, None);
        graph.add_edge(&a, &area, Relation::LocatedIn, 1.0);

        let records =
            RecordStore::from_records(vec![record("甲", "某路1号"), record("乙", "某路2号")]);
        let catalog = Catalog::build(&graph, &records, &AreaMap::xuzhou());

        assert_eq!(catalog.get("甲").unwrap().area, "贾汪区");
        assert_eq!(catalog.get("乙").unwrap().area, UNKNOWN_AREA);
    }
}
