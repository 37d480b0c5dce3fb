// Composed dispatch state: engine, queue and the optional producer

use std::time::Duration;

use crate::centers::CenterSnapshot;
use crate::config::ScenarioConfig;
use crate::engine::{Allocation, AllocationEngine};
use crate::error::ConfigError;
use crate::producer::{ProducerConfig, ProducerHandle, ProducerReport, RequestProducer};
use crate::queue::{OrderingPolicy, RequestQueue, RequestSender};
use crate::request::Request;

/// Running totals over every allocation this world has made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub committed: u64,
    pub rejected: u64,
}

impl DispatchStats {
    pub fn processed(&self) -> u64 {
        self.committed + self.rejected
    }

    fn record(&mut self, allocation: &Allocation) {
        if allocation.is_committed() {
            self.committed += 1;
        } else {
            self.rejected += 1;
        }
    }
}

/// The whole simulation, built once at startup and owned by the consumer.
pub struct ReliefWorld {
    engine: AllocationEngine,
    queue: RequestQueue,
    producer: Option<ProducerHandle>,
    producer_config: ProducerConfig,
    stats: DispatchStats,
}

impl ReliefWorld {
    pub fn new(engine: AllocationEngine, queue: RequestQueue) -> Self {
        Self {
            engine,
            queue,
            producer: None,
            producer_config: ProducerConfig::default(),
            stats: DispatchStats::default(),
        }
    }

    pub fn from_config(config: &ScenarioConfig) -> Result<Self, ConfigError> {
        Self::from_config_with_policy(config, crate::queue::ByUrgency)
    }

    pub fn from_config_with_policy(
        config: &ScenarioConfig,
        policy: impl OrderingPolicy + 'static,
    ) -> Result<Self, ConfigError> {
        let mut world = Self::new(config.build_engine()?, RequestQueue::with_policy(policy));
        world.producer_config = config.producer.clone();
        Ok(world)
    }

    pub fn engine(&self) -> &AllocationEngine {
        &self.engine
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    // === Intake ===

    pub fn submit(&mut self, request: Request) {
        self.queue.push(request);
    }

    pub fn sender(&self) -> RequestSender {
        self.queue.sender()
    }

    pub fn pending(&mut self) -> Vec<Request> {
        self.queue.pending()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn centers(&self) -> Vec<CenterSnapshot> {
        self.engine.centers().snapshot()
    }

    // === Producer ===

    /// Start the configured generator. A producer already running is kept;
    /// one that has ended on its own is reaped and replaced.
    pub fn start_producer(&mut self) -> Result<(), ConfigError> {
        if self.producer_running() {
            return Ok(());
        }
        if let Some(finished) = self.producer.take() {
            finished.join();
        }
        let handle = RequestProducer::spawn(self.producer_config.clone(), self.queue.sender())?;
        self.producer = Some(handle);
        Ok(())
    }

    pub fn producer_running(&self) -> bool {
        self.producer.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Stop the generator. Everything it sent stays queued.
    pub fn stop_producer(&mut self) -> Option<ProducerReport> {
        self.producer.take().map(ProducerHandle::stop)
    }

    // === Dispatch ===

    /// Allocate the most urgent pending request, if any (interactive path).
    pub fn dispatch_one(&mut self) -> Option<Allocation> {
        let allocation = self.engine.try_dispatch_next(&mut self.queue)?;
        self.stats.record(&allocation);
        Some(allocation)
    }

    /// Block for the next request and allocate it.
    pub fn dispatch_blocking(&mut self) -> Allocation {
        let allocation = self.engine.dispatch_next(&mut self.queue);
        self.stats.record(&allocation);
        allocation
    }

    /// Allocate everything queued right now.
    pub fn dispatch_all(&mut self) -> Vec<Allocation> {
        let allocations = self.engine.drain(&mut self.queue);
        for allocation in &allocations {
            self.stats.record(allocation);
        }
        allocations
    }

    /// Automatic mode: keep allocating until no request arrives for
    /// `idle_timeout`, or `limit` requests have been processed.
    pub fn run_until_idle(&mut self, idle_timeout: Duration, limit: Option<usize>) -> Vec<Allocation> {
        let mut allocations = Vec::new();
        while limit.is_none_or(|max| allocations.len() < max) {
            let Some(request) = self.queue.pop_timeout(idle_timeout) else {
                break;
            };
            let allocation = self.engine.allocate(request);
            self.stats.record(&allocation);
            allocations.push(allocation);
        }
        allocations
    }
}

impl Drop for ReliefWorld {
    fn drop(&mut self) {
        let _ = self.stop_producer();
    }
}
