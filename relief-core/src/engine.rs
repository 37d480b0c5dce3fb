//! Greedy, proximity-aware allocation of requests to relief centers.
//!
//! For each request:
//! 1. Shortest distances from the request's location over the network.
//! 2. Centers ranked by (distance, registration order). Centers with no path
//!    are ranked last but stay eligible: distance is a preference, not a
//!    constraint. With no distance data at all this degrades to first-fit in
//!    registration order.
//! 3. The first center whose atomic check-and-commit succeeds wins. A commit
//!    that loses a race with another allocation moves on to the next center.
//! 4. If nobody can cover the request it is rejected and dropped.
//!
//! Every request handed to [`AllocationEngine::allocate`] produces exactly one
//! [`Allocation`] and exactly one `outcome` event.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::centers::CenterRegistry;
use crate::error::AllocationError;
use crate::geography::{Distance, LocationGraph};
use crate::queue::RequestQueue;
use crate::request::Request;
use crate::types::{CenterId, ResourceBundle};

/// A center's place in the ranking for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCenter {
    pub id: CenterId,
    pub name: String,
    pub distance: Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Stock was short when checked.
    Infeasible,
    /// Looked feasible, but another commit took the stock first.
    Raced,
    Committed,
}

/// One center visited while walking the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub center: String,
    pub distance: Distance,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed {
        center: CenterId,
        center_name: String,
        distance: Distance,
        remaining: ResourceBundle,
    },
    Rejected,
}

/// Terminal result for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub request: Request,
    pub outcome: Outcome,
    /// Centers tried, in ranking order, up to and including the winner.
    pub attempts: Vec<Attempt>,
    pub timestamp_ms: u64,
}

impl Allocation {
    pub fn is_committed(&self) -> bool {
        matches!(self.outcome, Outcome::Committed { .. })
    }

    pub fn center_name(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Committed { center_name, .. } => Some(center_name),
            Outcome::Rejected => None,
        }
    }

    pub fn center(&self) -> Option<CenterId> {
        match self.outcome {
            Outcome::Committed { center, .. } => Some(center),
            Outcome::Rejected => None,
        }
    }
}

/// Owns the static network and the centers; shared by reference between
/// threads that allocate concurrently.
#[derive(Debug, Default)]
pub struct AllocationEngine {
    graph: LocationGraph,
    centers: CenterRegistry,
}

impl AllocationEngine {
    pub fn new(graph: LocationGraph, centers: CenterRegistry) -> Self {
        Self { graph, centers }
    }

    pub fn graph(&self) -> &LocationGraph {
        &self.graph
    }

    pub fn centers(&self) -> &CenterRegistry {
        &self.centers
    }

    /// All centers ordered by distance from the request, ties by registration.
    pub fn rank(&self, request: &Request) -> Vec<RankedCenter> {
        let distances = self.graph.shortest_distances(request.location());
        let mut ranked: Vec<RankedCenter> = self
            .centers
            .list()
            .map(|(id, center)| RankedCenter {
                id,
                name: center.name().to_string(),
                distance: distances.get(center.location()),
            })
            .collect();
        // Stable sort keeps registration order among equal distances.
        ranked.sort_by_key(|c| c.distance);
        ranked
    }

    /// Allocate one request to the nearest center able to cover it.
    pub fn allocate(&self, request: Request) -> Allocation {
        let mut attempts = Vec::new();
        let mut outcome = Outcome::Rejected;

        for candidate in self.rank(&request) {
            if !self.centers.can_fulfill(candidate.id, &request) {
                attempts.push(Attempt {
                    center: candidate.name,
                    distance: candidate.distance,
                    verdict: Verdict::Infeasible,
                });
                continue;
            }

            match self.centers.commit(candidate.id, &request) {
                Ok(remaining) => {
                    attempts.push(Attempt {
                        center: candidate.name.clone(),
                        distance: candidate.distance,
                        verdict: Verdict::Committed,
                    });
                    outcome = Outcome::Committed {
                        center: candidate.id,
                        center_name: candidate.name,
                        distance: candidate.distance,
                        remaining,
                    };
                    break;
                }
                Err(AllocationError::InsufficientStock { .. }) => {
                    #[cfg(feature = "instrument")]
                    tracing::debug!(
                        target: "allocation",
                        center = candidate.name.as_str(),
                        "commit lost race, trying next center"
                    );
                    attempts.push(Attempt {
                        center: candidate.name,
                        distance: candidate.distance,
                        verdict: Verdict::Raced,
                    });
                }
                Err(AllocationError::UnknownCenter) => {
                    attempts.push(Attempt {
                        center: candidate.name,
                        distance: candidate.distance,
                        verdict: Verdict::Infeasible,
                    });
                }
            }
        }

        let allocation = Allocation {
            request,
            outcome,
            attempts,
            timestamp_ms: now_ms(),
        };
        report(&allocation);
        allocation
    }

    /// Block for the next request and allocate it.
    pub fn dispatch_next(&self, queue: &mut RequestQueue) -> Allocation {
        self.allocate(queue.pop())
    }

    /// Allocate the next request if one is waiting.
    pub fn try_dispatch_next(&self, queue: &mut RequestQueue) -> Option<Allocation> {
        queue.try_pop().map(|request| self.allocate(request))
    }

    /// Allocate everything currently queued, in dispatch order.
    pub fn drain(&self, queue: &mut RequestQueue) -> Vec<Allocation> {
        std::iter::from_fn(|| self.try_dispatch_next(queue)).collect()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Emit the single `outcome` event for a finished request.
fn report(allocation: &Allocation) {
    #[cfg(feature = "instrument")]
    {
        let request = &allocation.request;
        match &allocation.outcome {
            Outcome::Committed {
                center_name,
                distance,
                ..
            } => tracing::info!(
                target: "outcome",
                location = request.location(),
                urgency = u64::from(request.urgency().level()),
                origin = request.origin().name(),
                outcome = "committed",
                center = center_name.as_str(),
                distance = %distance,
                attempts = allocation.attempts.len() as u64,
                timestamp_ms = allocation.timestamp_ms,
            ),
            Outcome::Rejected => tracing::info!(
                target: "outcome",
                location = request.location(),
                urgency = u64::from(request.urgency().level()),
                origin = request.origin().name(),
                outcome = "rejected",
                attempts = allocation.attempts.len() as u64,
                timestamp_ms = allocation.timestamp_ms,
            ),
        }
    }
    #[cfg(not(feature = "instrument"))]
    let _ = allocation;
}
