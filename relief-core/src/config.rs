// Static scenario configuration: network, centers, request generator

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::centers::CenterRegistry;
use crate::engine::AllocationEngine;
use crate::error::ConfigError;
use crate::geography::LocationGraph;
use crate::producer::ProducerConfig;
use crate::types::ResourceBundle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub a: String,
    pub b: String,
    /// Signed so a negative value in a file is reported, not wrapped.
    pub distance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterConfig {
    pub name: String,
    /// Graph location; the center's name when absent.
    #[serde(default)]
    pub location: Option<String>,
    pub food: u32,
    pub water: u32,
    pub medicine: u32,
}

impl CenterConfig {
    pub fn new(name: impl Into<String>, food: u32, water: u32, medicine: u32) -> Self {
        Self {
            name: name.into(),
            location: None,
            food,
            water,
            medicine,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(&self.name)
    }

    pub fn stock(&self) -> ResourceBundle {
        ResourceBundle::new(self.food, self.water, self.medicine)
    }
}

/// Everything fixed at startup. Topology and centers do not change mid-run.
///
/// Fields missing from a file are empty, never borrowed from [`ScenarioConfig::demo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,
    #[serde(default)]
    pub centers: Vec<CenterConfig>,
    #[serde(default)]
    pub producer: ProducerConfig,
}

impl ScenarioConfig {
    /// Three centers over a small town network.
    pub fn demo() -> Self {
        let locations: Vec<String> = [
            "Center A", "Center B", "Center C", "Riverside", "Old Town", "Hilltop", "Harbor",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let edge = |a: &str, b: &str, distance| EdgeConfig {
            a: a.to_string(),
            b: b.to_string(),
            distance,
        };
        let edges = vec![
            edge("Center A", "Riverside", 4),
            edge("Center A", "Old Town", 9),
            edge("Center B", "Old Town", 3),
            edge("Center B", "Hilltop", 7),
            edge("Center C", "Harbor", 5),
            edge("Center C", "Hilltop", 12),
            edge("Riverside", "Harbor", 6),
            edge("Old Town", "Riverside", 8),
        ];

        let centers = vec![
            CenterConfig::new("Center A", 100, 100, 50),
            CenterConfig::new("Center B", 80, 60, 40),
            CenterConfig::new("Center C", 120, 90, 70),
        ];

        let producer = ProducerConfig::default()
            .with_locations(["Riverside", "Old Town", "Hilltop", "Harbor"]);

        Self {
            locations,
            edges,
            centers,
            producer,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the network. Center locations are added as nodes automatically.
    pub fn build_graph(&self) -> Result<LocationGraph, ConfigError> {
        let mut graph = LocationGraph::new();
        for location in &self.locations {
            graph.add_location(location.as_str());
        }
        for center in &self.centers {
            graph.add_location(center.location());
        }
        for e in &self.edges {
            graph.add_edge(&e.a, &e.b, e.distance)?;
        }
        Ok(graph)
    }

    pub fn build_registry(&self) -> Result<CenterRegistry, ConfigError> {
        let mut registry = CenterRegistry::new();
        for center in &self.centers {
            registry.register(center.name.as_str(), center.location(), center.stock())?;
        }
        Ok(registry)
    }

    pub fn build_engine(&self) -> Result<AllocationEngine, ConfigError> {
        Ok(AllocationEngine::new(self.build_graph()?, self.build_registry()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::Distance;

    #[test]
    fn default_scenario_builds() {
        let config = ScenarioConfig::demo();
        let engine = config.build_engine().unwrap();
        assert_eq!(engine.centers().len(), 3);
        assert_eq!(engine.graph().location_count(), 7);
        assert!(config.producer.validate().is_ok());
        let dist = engine.graph().shortest_distances("Harbor");
        assert_eq!(dist.get("Center C"), Distance::Finite(5));
        assert_eq!(dist.get("Center A"), Distance::Finite(10));
    }

    #[test]
    fn json_with_defaults_and_explicit_location() {
        let json = r#"{
            "locations": ["Depot", "Camp"],
            "edges": [{"a": "Depot", "b": "Camp", "distance": 7}],
            "centers": [
                {"name": "North", "location": "Depot", "food": 5, "water": 6, "medicine": 7},
                {"name": "Field", "food": 1, "water": 1, "medicine": 1}
            ]
        }"#;
        let config = ScenarioConfig::from_json_str(json).unwrap();
        assert_eq!(config.producer, ProducerConfig::default());

        let engine = config.build_engine().unwrap();
        assert!(engine.graph().contains("Field"));
        let north = engine.centers().find_by_name("North").unwrap();
        assert_eq!(engine.centers().get(north).unwrap().location(), "Depot");
        assert_eq!(
            engine.centers().stock(north),
            Some(ResourceBundle::new(5, 6, 7))
        );
    }

    #[test]
    fn missing_sections_stay_empty() {
        let json = r#"{
            "locations": ["Depot"],
            "centers": [{"name": "North", "location": "Depot", "food": 3, "water": 2, "medicine": 1}]
        }"#;
        let config = ScenarioConfig::from_json_str(json).unwrap();
        assert!(config.edges.is_empty());
        assert!(config.producer.locations.is_empty());

        let engine = config.build_engine().unwrap();
        assert_eq!(engine.graph().location_count(), 1);
        assert_eq!(engine.graph().edge_count(), 0);
        assert_eq!(engine.centers().len(), 1);
    }

    #[test]
    fn empty_document_is_an_empty_scenario() {
        let config = ScenarioConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ScenarioConfig::default());
        assert!(config.build_engine().unwrap().centers().is_empty());
    }

    #[test]
    fn negative_edge_in_file_is_reported() {
        let json = r#"{"locations": ["A", "B"], "edges": [{"a": "A", "b": "B", "distance": -3}]}"#;
        let config = ScenarioConfig::from_json_str(json).unwrap();
        assert!(matches!(config.build_graph(), Err(ConfigError::Graph(_))));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            ScenarioConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn roundtrips_through_json() {
        let config = ScenarioConfig::demo();
        let text = config.to_json_pretty().unwrap();
        assert_eq!(ScenarioConfig::from_json_str(&text).unwrap(), config);
    }
}
