//! Undirected weighted network of named locations.
//!
//! Locations are interned to dense indices so the adjacency list and the
//! Dijkstra frontier work on `usize` instead of hashing strings per relaxation.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{EdgeFault, GraphError};

use super::distance::{Distance, ShortestDistances};

#[derive(Debug, Clone, Default)]
pub struct LocationGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    /// node -> (neighbor, distance); every edge appears once per endpoint
    adj: Vec<Vec<(usize, u64)>>,
}

impl LocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // === Construction ===

    /// Add a location. Adding a name that already exists is a no-op.
    pub fn add_location(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.index.contains_key(&name) {
            return;
        }
        let idx = self.names.len();
        self.index.insert(name.clone(), idx);
        self.names.push(name);
        self.adj.push(Vec::new());
    }

    /// Connect `a` and `b` in both directions.
    ///
    /// Both endpoints must already exist and `distance` must be non-negative;
    /// otherwise nothing is inserted.
    pub fn add_edge(&mut self, a: &str, b: &str, distance: i64) -> Result<(), GraphError> {
        let invalid = |fault| GraphError::InvalidEdge {
            a: a.to_string(),
            b: b.to_string(),
            distance,
            fault,
        };

        let ia = *self
            .index
            .get(a)
            .ok_or_else(|| invalid(EdgeFault::UnknownLocation(a.to_string())))?;
        let ib = *self
            .index
            .get(b)
            .ok_or_else(|| invalid(EdgeFault::UnknownLocation(b.to_string())))?;
        let weight = u64::try_from(distance).map_err(|_| invalid(EdgeFault::NegativeDistance))?;

        self.adj[ia].push((ib, weight));
        self.adj[ib].push((ia, weight));
        Ok(())
    }

    // === Queries ===

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Locations in insertion order.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn location_count(&self) -> usize {
        self.names.len()
    }

    /// Undirected edge count (each stored twice internally).
    pub fn edge_count(&self) -> usize {
        self.adj.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Direct neighbors of `name` with edge distances.
    pub fn neighbors(&self, name: &str) -> Vec<(&str, u64)> {
        match self.index.get(name) {
            Some(&idx) => self.adj[idx]
                .iter()
                .map(|&(n, d)| (self.names[n].as_str(), d))
                .collect(),
            None => Vec::new(),
        }
    }

    // === Shortest paths ===

    /// Dijkstra from `source` over all known locations.
    ///
    /// A source the graph does not know yields every location as unreachable.
    pub fn shortest_distances(&self, source: &str) -> ShortestDistances {
        let mut dist: Vec<Option<u64>> = vec![None; self.names.len()];

        if let Some(&start) = self.index.get(source) {
            dist[start] = Some(0);
            let mut frontier = BinaryHeap::new();
            frontier.push(Reverse((0u64, start)));

            while let Some(Reverse((d, node))) = frontier.pop() {
                // Stale entry: a shorter path was settled after this push.
                if dist[node].is_some_and(|best| d > best) {
                    continue;
                }
                for &(next, weight) in &self.adj[node] {
                    let candidate = d.saturating_add(weight);
                    if dist[next].is_none_or(|best| candidate < best) {
                        dist[next] = Some(candidate);
                        frontier.push(Reverse((candidate, next)));
                    }
                }
            }
        }

        let distances = self
            .names
            .iter()
            .zip(dist)
            .map(|(name, d)| {
                let d = d.map_or(Distance::Unreachable, Distance::Finite);
                (name.clone(), d)
            })
            .collect();

        ShortestDistances::new(source.to_string(), distances)
    }
}
