//! Area adjacency and travel times
//!
//! Areas are the districts and counties of Xuzhou. Two areas may be
//! adjacent, and a pair of areas may have a known driving time in minutes.
//! Both relations are symmetric.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, TourPlanError};

/// Travel time used for any pair of areas missing from the table
pub const DEFAULT_TRAVEL_MINUTES: u32 = 90;

/// Buffer added between two stops inside the same area
pub const SAME_AREA_OVERHEAD_MINUTES: u32 = 15;

/// Parking and navigation overhead between stops in different areas
pub const CROSS_AREA_OVERHEAD_MINUTES: u32 = 30;

/// Serialized form of a region table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionTable {
    #[serde(default)]
    pub adjacency: HashMap<String, Vec<String>>,
    /// `(area, area, minutes)` triples
    #[serde(default)]
    pub travel_times: Vec<(String, String, u32)>,
}

/// Symmetric adjacency and travel-time lookups between areas
#[derive(Debug, Clone, Default)]
pub struct AreaMap {
    adjacency: HashMap<String, HashSet<String>>,
    travel_times: HashMap<(String, String), u32>,
}

impl AreaMap {
    /// Build from a table, mirroring every relation.
    ///
    /// A pair listed twice with different times is rejected.
    pub fn from_table(table: &RegionTable) -> Result<Self> {
        let mut map = AreaMap::default();

        for (area, neighbours) in &table.adjacency {
            for neighbour in neighbours {
                map.add_adjacency(area, neighbour);
            }
        }

        for (a, b, minutes) in &table.travel_times {
            if a == b {
                return Err(TourPlanError::validation(format!(
                    "travel time listed from area '{a}' to itself"
                )));
            }
            if let Some(existing) = map.travel_times.get(&(a.clone(), b.clone())) {
                if existing != minutes {
                    return Err(TourPlanError::validation(format!(
                        "conflicting travel times between '{a}' and '{b}': {existing} vs {minutes}"
                    )));
                }
            }
            map.travel_times.insert((a.clone(), b.clone()), *minutes);
            map.travel_times.insert((b.clone(), a.clone()), *minutes);
        }

        debug!(
            "Region table with {} areas and {} travel-time entries",
            map.areas().len(),
            map.travel_times.len()
        );
        Ok(map)
    }

    /// Load a region table from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let table: RegionTable = serde_json::from_str(&content)?;
        Self::from_table(&table)
    }

    /// The district relations of Xuzhou
    #[must_use]
    pub fn xuzhou() -> Self {
        let adjacency = [
            ("云龙区", vec!["泉山区", "鼓楼区"]),
            ("泉山区", vec!["云龙区", "铜山区"]),
            ("鼓楼区", vec!["云龙区", "贾汪区"]),
            ("铜山区", vec!["泉山区", "睢宁县"]),
            ("贾汪区", vec!["鼓楼区", "邳州市"]),
            ("邳州市", vec!["贾汪区", "新沂市"]),
            ("新沂市", vec!["邳州市"]),
            ("睢宁县", vec!["铜山区"]),
            ("沛县", vec!["丰县"]),
            ("丰县", vec!["沛县"]),
        ];
        let travel_times = [
            ("云龙区", "泉山区", 20),
            ("云龙区", "鼓楼区", 15),
            ("泉山区", "铜山区", 25),
            ("鼓楼区", "贾汪区", 40),
            ("铜山区", "睢宁县", 60),
            ("贾汪区", "邳州市", 50),
            ("邳州市", "新沂市", 45),
            ("沛县", "丰县", 30),
        ];

        let mut map = AreaMap::default();
        for (area, neighbours) in adjacency {
            for neighbour in neighbours {
                map.add_adjacency(area, neighbour);
            }
        }
        for (a, b, minutes) in travel_times {
            map.travel_times.insert((a.to_string(), b.to_string()), minutes);
            map.travel_times.insert((b.to_string(), a.to_string()), minutes);
        }
        map
    }

    fn add_adjacency(&mut self, a: &str, b: &str) {
        self.adjacency
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    /// Every area named by either relation, sorted
    #[must_use]
    pub fn areas(&self) -> Vec<String> {
        let mut areas: Vec<String> = self
            .adjacency
            .keys()
            .cloned()
            .chain(self.travel_times.keys().map(|(a, _)| a.clone()))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        areas.sort();
        areas
    }

    #[must_use]
    pub fn is_adjacent(&self, a: &str, b: &str) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|neighbours| neighbours.contains(b))
    }

    /// Driving time in minutes: 0 within an area, 90 for unknown pairs
    #[must_use]
    pub fn travel_time(&self, a: &str, b: &str) -> u32 {
        if a == b {
            return 0;
        }
        self.travel_times
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or(DEFAULT_TRAVEL_MINUTES)
    }

    /// Cost of moving between two stops, including the transfer overhead
    #[must_use]
    pub fn transfer_cost(&self, a: &str, b: &str) -> u32 {
        let overhead = if a == b {
            SAME_AREA_OVERHEAD_MINUTES
        } else {
            CROSS_AREA_OVERHEAD_MINUTES
        };
        self.travel_time(a, b) + overhead
    }
}
