//! Attraction knowledge graph
//!
//! A directed multigraph stored as adjacency lists. Node identifiers are
//! typed (`Attraction_<name>`, `Theme_<name>`, `Audience_<name>`,
//! `Area_<name>`) and edges carry a relation and a numeric weight.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Attraction,
    Theme,
    Audience,
    Area,
}

impl NodeKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "Attraction" => Some(NodeKind::Attraction),
            "Theme" => Some(NodeKind::Theme),
            "Audience" => Some(NodeKind::Audience),
            "Area" => Some(NodeKind::Area),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Attraction => "Attraction",
            NodeKind::Theme => "Theme",
            NodeKind::Audience => "Audience",
            NodeKind::Area => "Area",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "HAS_THEME")]
    HasTheme,
    #[serde(rename = "SUITABLE_FOR")]
    SuitableFor,
    #[serde(rename = "LOCATED_IN")]
    LocatedIn,
}

impl Relation {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "HAS_THEME" => Some(Relation::HasTheme),
            "SUITABLE_FOR" => Some(Relation::SuitableFor),
            "LOCATED_IN" => Some(Relation::LocatedIn),
            _ => None,
        }
    }
}

/// Build the typed identifier of a node, e.g. `Theme_两汉文化`
#[must_use]
pub fn node_id(kind: NodeKind, name: &str) -> String {
    format!("{kind}_{name}")
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Label without the type prefix
    pub name: String,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    target: usize,
    relation: Relation,
    weight: f64,
}

/// Node as it appears in a graph file
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
}

/// Edge as it appears in a graph file
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub relation: String,
    #[serde(default = "default_edge_weight")]
    pub weight: f64,
}

fn default_edge_weight() -> f64 {
    1.0
}

/// On-disk form of the graph
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct AttractionGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    outgoing: Vec<Vec<Edge>>,
    in_degree: Vec<usize>,
}

impl AttractionGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading attraction graph from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let document: GraphDocument = serde_json::from_str(&content)?;
        let graph = Self::from_document(document);
        info!(
            "Loaded attraction graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Build from a parsed document, skipping malformed nodes and edges
    #[must_use]
    pub fn from_document(document: GraphDocument) -> Self {
        let mut graph = Self::new();

        for record in document.nodes {
            let Some(kind) = NodeKind::parse(&record.kind) else {
                warn!("Skipping node {} with unknown type '{}'", record.id, record.kind);
                continue;
            };
            let name = record.name.unwrap_or_else(|| label_from_id(&record.id, kind));
            graph.insert_node(Node {
                id: record.id,
                kind,
                name,
                address: record.address,
                opening_hours: record.opening_hours,
            });
        }

        for record in document.edges {
            let Some(relation) = Relation::parse(&record.relation) else {
                warn!(
                    "Skipping edge {} -> {} with unknown relation '{}'",
                    record.source, record.target, record.relation
                );
                continue;
            };
            if !graph.add_edge(&record.source, &record.target, relation, record.weight) {
                warn!(
                    "Skipping edge {} -> {}: endpoint not in graph",
                    record.source, record.target
                );
            }
        }

        graph
    }

    /// Add a node unless its identifier already exists; returns the identifier
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        name: &str,
        address: Option<String>,
        opening_hours: Option<String>,
    ) -> String {
        let id = node_id(kind, name);
        self.insert_node(Node {
            id: id.clone(),
            kind,
            name: name.to_string(),
            address,
            opening_hours,
        });
        id
    }

    fn insert_node(&mut self, node: Node) {
        if self.index.contains_key(&node.id) {
            return;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.in_degree.push(0);
    }

    /// Add a weighted edge between existing nodes; false if either is missing
    pub fn add_edge(&mut self, source: &str, target: &str, relation: Relation, weight: f64) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        self.outgoing[from].push(Edge {
            target: to,
            relation,
            weight,
        });
        self.in_degree[to] += 1;
        true
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |node| node.kind == kind)
    }

    /// Sorted labels of every node of a kind
    #[must_use]
    pub fn labels(&self, kind: NodeKind) -> Vec<String> {
        let mut labels: Vec<String> = self
            .nodes_of_kind(kind)
            .map(|node| node.name.clone())
            .collect();
        labels.sort();
        labels
    }

    /// Labels and weights of the targets reached from `id` through `relation`
    #[must_use]
    pub fn related(&self, id: &str, relation: Relation) -> Vec<(String, f64)> {
        let Some(&i) = self.index.get(id) else {
            return Vec::new();
        };
        self.outgoing[i]
            .iter()
            .filter(|edge| edge.relation == relation)
            .map(|edge| (self.nodes[edge.target].name.clone(), edge.weight))
            .collect()
    }

    /// Incoming plus outgoing edges, counting parallel edges separately
    #[must_use]
    pub fn degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map_or(0, |&i| self.outgoing[i].len() + self.in_degree[i])
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum()
    }
}

fn label_from_id(id: &str, kind: NodeKind) -> String {
    let prefix = format!("{kind}_");
    match id.strip_prefix(&prefix) {
        Some(label) => label.to_string(),
        None => id.rsplit('_').next().unwrap_or(id).to_string(),
    }
}
