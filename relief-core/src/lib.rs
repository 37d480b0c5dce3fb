//! Emergency relief dispatch.
//!
//! Relief requests arrive continuously and are matched to a fixed set of
//! relief centers with finite stock. Requests are served most urgent first;
//! each goes to the nearest center (shortest path over the location network)
//! that can cover all of its needs, or is rejected.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geography`] | Location network and Dijkstra shortest distances |
//! | [`queue`] | Priority queue fed over a channel, pluggable ordering |
//! | [`centers`] | Relief centers and the atomic stock commit |
//! | [`engine`] | Ranking and greedy nearest-feasible allocation |
//! | [`producer`] | Background synthetic request generator |
//! | [`config`] | Scenario configuration (serde) |
//! | [`world`] | Composed simulation state and dispatch loops |
//!
//! With the default `instrument` feature every processed request emits one
//! `tracing` event at target `"outcome"`, and every generated request one at
//! target `"request"`.

pub mod centers;
pub mod config;
pub mod engine;
pub mod error;
pub mod geography;
pub mod producer;
pub mod queue;
pub mod request;
pub mod types;
pub mod world;

#[cfg(feature = "instrument")]
pub use instrument;

pub use centers::{CenterRegistry, CenterSnapshot, ReliefCenter};
pub use config::{CenterConfig, EdgeConfig, ScenarioConfig};
pub use engine::{AllocationEngine, Allocation, Attempt, Outcome, RankedCenter, Verdict};
pub use error::{AllocationError, ConfigError, EdgeFault, GraphError, QueueClosed, RequestError};
pub use geography::{Distance, LocationGraph, ShortestDistances};
pub use producer::{
    ProducerConfig, ProducerExit, ProducerHandle, ProducerReport, QuantityRange, RequestProducer,
};
pub use queue::{ByUrgency, ByUrgencyThenSize, OrderingPolicy, Priority, RequestQueue, RequestSender};
pub use request::{Request, RequestOrigin};
pub use types::{CenterId, Location, Quantity, Resource, ResourceBundle, Urgency};
pub use world::{DispatchStats, ReliefWorld};
