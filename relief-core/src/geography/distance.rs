// Path lengths over the location network

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Shortest-path length from a source.
///
/// Variant order makes every finite distance sort before `Unreachable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Finite(u64),
    Unreachable,
}

impl Distance {
    pub fn finite(self) -> Option<u64> {
        match self {
            Distance::Finite(d) => Some(d),
            Distance::Unreachable => None,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Finite(d) => write!(f, "{}", d),
            Distance::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Result of a single-source shortest-path run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestDistances {
    source: String,
    distances: HashMap<String, Distance>,
}

impl ShortestDistances {
    pub(crate) fn new(source: String, distances: HashMap<String, Distance>) -> Self {
        Self { source, distances }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distance to `location`; anything the graph does not know is unreachable.
    pub fn get(&self, location: &str) -> Distance {
        self.distances
            .get(location)
            .copied()
            .unwrap_or(Distance::Unreachable)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Distance)> {
        self.distances.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn into_map(self) -> HashMap<String, Distance> {
        self.distances
    }
}
