use std::fmt;

use crate::request::Request;
use crate::types::ResourceBundle;

/// Rejected graph configuration call. The graph is left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    InvalidEdge {
        a: String,
        b: String,
        distance: i64,
        fault: EdgeFault,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeFault {
    UnknownLocation(String),
    NegativeDistance,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::InvalidEdge {
                a,
                b,
                distance,
                fault,
            } => match fault {
                EdgeFault::UnknownLocation(name) => write!(
                    f,
                    "invalid edge {} -- {} ({}): unknown location {}",
                    a, b, distance, name
                ),
                EdgeFault::NegativeDistance => write!(
                    f,
                    "invalid edge {} -- {}: negative distance {}",
                    a, b, distance
                ),
            },
        }
    }
}

impl std::error::Error for GraphError {}

/// Failure to apply an allocation to a center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The center no longer holds enough stock (stale or raced feasibility check).
    InsufficientStock {
        center: String,
        available: ResourceBundle,
        needed: ResourceBundle,
    },
    UnknownCenter,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::InsufficientStock {
                center,
                available,
                needed,
            } => write!(
                f,
                "insufficient stock at {}: have [{}], need [{}]",
                center, available, needed
            ),
            AllocationError::UnknownCenter => write!(f, "center is not registered"),
        }
    }
}

impl std::error::Error for AllocationError {}

/// Request rejected at the intake boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    UrgencyOutOfRange { urgency: u8 },
    EmptyLocation,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::UrgencyOutOfRange { urgency } => write!(
                f,
                "urgency {} outside {}..={}",
                urgency,
                crate::types::Urgency::MIN,
                crate::types::Urgency::MAX
            ),
            RequestError::EmptyLocation => write!(f, "request location is empty"),
        }
    }
}

impl std::error::Error for RequestError {}

/// The consuming side of the queue is gone; carries the undelivered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueClosed(pub Request);

impl fmt::Display for QueueClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request queue closed, dropped {}", self.0)
    }
}

impl std::error::Error for QueueClosed {}

/// Errors raised while loading or building a scenario.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Graph(GraphError),
    DuplicateCenter { name: String },
    InvalidProducer { reason: String },
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<GraphError> for ConfigError {
    fn from(e: GraphError) -> Self {
        ConfigError::Graph(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "scenario parse error: {}", e),
            ConfigError::Graph(e) => write!(f, "graph error: {}", e),
            ConfigError::DuplicateCenter { name } => {
                write!(f, "relief center registered twice: {}", name)
            }
            ConfigError::InvalidProducer { reason } => {
                write!(f, "invalid producer config: {}", reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Graph(e) => Some(e),
            ConfigError::DuplicateCenter { .. } | ConfigError::InvalidProducer { .. } => None,
        }
    }
}
