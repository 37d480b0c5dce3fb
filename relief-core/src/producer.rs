//! Background generator of synthetic relief requests.
//!
//! The producer runs on its own thread and owns nothing shared: it draws from
//! its own RNG and hands finished requests to a [`RequestSender`]. Stopping is
//! cooperative. The stop signal wakes the inter-request wait early and is
//! observed before the next request is synthesized, so a push is never cut
//! short.

use std::ops::RangeInclusive;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::centers::CenterSnapshot;
use crate::error::ConfigError;
use crate::queue::RequestSender;
use crate::request::{Request, RequestOrigin};
use crate::types::{ResourceBundle, Urgency};

/// Inclusive bounds for a randomly drawn quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRange {
    pub min: u32,
    pub max: u32,
}

impl QuantityRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn as_range(&self) -> RangeInclusive<u32> {
        self.min..=self.max
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> u32 {
        rng.random_range(self.as_range())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    /// Locations requests are drawn from.
    pub locations: Vec<String>,
    pub urgency: QuantityRange,
    pub food: QuantityRange,
    pub water: QuantityRange,
    pub medicine: QuantityRange,
    /// Fixed seed for reproducible runs; OS entropy otherwise.
    pub seed: Option<u64>,
    /// Stop on its own after this many requests.
    pub max_requests: Option<u64>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2_000,
            max_interval_ms: 5_999,
            locations: Vec::new(),
            urgency: QuantityRange::new(1, 10),
            food: QuantityRange::new(10, 59),
            water: QuantityRange::new(10, 59),
            medicine: QuantityRange::new(5, 34),
            seed: None,
            max_requests: None,
        }
    }
}

impl ProducerConfig {
    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interval_ms(mut self, min: u64, max: u64) -> Self {
        self.min_interval_ms = min;
        self.max_interval_ms = max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_requests(mut self, max: u64) -> Self {
        self.max_requests = Some(max);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidProducer { reason });
        if self.locations.is_empty() {
            return invalid("no locations to draw requests from".to_string());
        }
        if self.locations.iter().any(|l| l.trim().is_empty()) {
            return invalid("blank location name".to_string());
        }
        if self.min_interval_ms > self.max_interval_ms {
            return invalid(format!(
                "interval {}..={} ms is empty",
                self.min_interval_ms, self.max_interval_ms
            ));
        }
        if self.urgency.min < u32::from(Urgency::MIN) || self.urgency.max > u32::from(Urgency::MAX) {
            return invalid(format!(
                "urgency {}..={} outside {}..={}",
                self.urgency.min,
                self.urgency.max,
                Urgency::MIN,
                Urgency::MAX
            ));
        }
        for (name, range) in [
            ("urgency", self.urgency),
            ("food", self.food),
            ("water", self.water),
            ("medicine", self.medicine),
        ] {
            if range.min > range.max {
                return invalid(format!("{} range {}..={} is empty", name, range.min, range.max));
            }
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Draw one request from a validated config.
pub fn synthesize_request<R: Rng>(rng: &mut R, config: &ProducerConfig) -> Option<Request> {
    if config.locations.is_empty() {
        return None;
    }
    let location = &config.locations[rng.random_range(0..config.locations.len())];
    let level = u8::try_from(config.urgency.sample(rng)).ok()?;
    let urgency = Urgency::new(level)?;
    let needs = ResourceBundle::new(
        config.food.sample(rng),
        config.water.sample(rng),
        config.medicine.sample(rng),
    );
    Request::with_needs(location.as_str(), urgency, needs, RequestOrigin::Generated).ok()
}

const NGO_FOOD: QuantityRange = QuantityRange::new(500, 5_000);
const NGO_WATER: QuantityRange = QuantityRange::new(500, 5_000);
const NGO_MEDICINE: QuantityRange = QuantityRange::new(100, 1_000);

/// Synthesize `count` NGO-style centers spread over `locations`.
///
/// Names look like `NGO-1A2B3C4D`; a repeated name draws again.
pub fn generate_centers<R: Rng>(rng: &mut R, count: usize, locations: &[String]) -> Vec<CenterSnapshot> {
    let mut centers: Vec<CenterSnapshot> = Vec::with_capacity(count);
    if locations.is_empty() {
        return centers;
    }
    while centers.len() < count {
        let name = format!("NGO-{:08X}", rng.random::<u32>());
        if centers.iter().any(|c| c.name == name) {
            continue;
        }
        centers.push(CenterSnapshot {
            name,
            location: locations[rng.random_range(0..locations.len())].clone(),
            stock: ResourceBundle::new(
                NGO_FOOD.sample(rng),
                NGO_WATER.sample(rng),
                NGO_MEDICINE.sample(rng),
            ),
        });
    }
    centers
}

/// Why the producer thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerExit {
    Stopped,
    /// Reached `max_requests`.
    Exhausted,
    /// The queue was dropped; the request in hand was discarded.
    QueueClosed,
    /// The thread panicked.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    pub generated: u64,
    pub exit: ProducerExit,
}

/// Running producer thread.
pub struct ProducerHandle {
    stop_tx: Sender<()>,
    join: JoinHandle<ProducerReport>,
}

impl ProducerHandle {
    /// Signal the producer and wait for it to finish its current cycle.
    pub fn stop(self) -> ProducerReport {
        // Already exited if the receiver is gone.
        let _ = self.stop_tx.send(());
        self.join()
    }

    /// Wait for the producer to end on its own (`max_requests` or closed queue).
    pub fn join(self) -> ProducerReport {
        self.join.join().unwrap_or(ProducerReport {
            generated: 0,
            exit: ProducerExit::Failed,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

pub struct RequestProducer;

impl RequestProducer {
    /// Validate `config` and start generating into `sender`.
    pub fn spawn(config: ProducerConfig, sender: RequestSender) -> Result<ProducerHandle, ConfigError> {
        config.validate()?;
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let join = thread::Builder::new()
            .name("request-producer".to_string())
            .spawn(move || run(config, sender, stop_rx))?;
        Ok(ProducerHandle { stop_tx, join })
    }
}

fn run(config: ProducerConfig, sender: RequestSender, stop_rx: Receiver<()>) -> ProducerReport {
    let mut rng = config.rng();
    let mut generated = 0u64;

    let exit = loop {
        if config.max_requests.is_some_and(|max| generated >= max) {
            break ProducerExit::Exhausted;
        }

        let wait = Duration::from_millis(
            rng.random_range(config.min_interval_ms..=config.max_interval_ms),
        );
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break ProducerExit::Stopped,
        }

        let Some(request) = synthesize_request(&mut rng, &config) else {
            continue;
        };

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "request",
            location = request.location(),
            urgency = u64::from(request.urgency().level()),
            food = u64::from(request.food_needed()),
            water = u64::from(request.water_needed()),
            medicine = u64::from(request.medicine_needed()),
        );

        if sender.push(request).is_err() {
            break ProducerExit::QueueClosed;
        }
        generated += 1;
    };

    ProducerReport { generated, exit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::RequestQueue;

    fn fast_config() -> ProducerConfig {
        ProducerConfig::default()
            .with_locations(["Harbor", "Hilltop"])
            .with_interval_ms(0, 2)
            .with_seed(7)
    }

    #[test]
    fn synthesized_requests_stay_in_bounds() {
        let config = fast_config();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let req = synthesize_request(&mut rng, &config).unwrap();
            assert!(config.locations.iter().any(|l| l == req.location()));
            assert!((1..=10).contains(&req.urgency().level()));
            assert!((10..=59).contains(&req.food_needed()));
            assert!((10..=59).contains(&req.water_needed()));
            assert!((5..=34).contains(&req.medicine_needed()));
            assert_eq!(req.origin(), RequestOrigin::Generated);
        }
    }

    #[test]
    fn same_seed_same_requests() {
        let config = fast_config();
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..20).map(|_| synthesize_request(&mut rng, &config)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..20).map(|_| synthesize_request(&mut rng, &config)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        assert!(ProducerConfig::default().validate().is_err(), "no locations");
        assert!(fast_config().with_interval_ms(10, 5).validate().is_err());
        let mut cfg = fast_config();
        cfg.urgency = QuantityRange::new(0, 10);
        assert!(cfg.validate().is_err());
        let mut cfg = fast_config();
        cfg.food = QuantityRange::new(9, 3);
        assert!(cfg.validate().is_err());
        assert!(fast_config().validate().is_ok());
    }

    #[test]
    fn producer_stops_after_max_requests() {
        let mut queue = RequestQueue::new();
        let handle = RequestProducer::spawn(fast_config().with_max_requests(5), queue.sender()).unwrap();
        let report = handle.join();
        assert_eq!(report, ProducerReport { generated: 5, exit: ProducerExit::Exhausted });
        assert_eq!(queue.pending().len(), 5);
    }

    #[test]
    fn stop_signal_ends_the_loop() {
        let queue = RequestQueue::new();
        let config = fast_config().with_interval_ms(1, 5);
        let handle = RequestProducer::spawn(config, queue.sender()).unwrap();
        thread::sleep(Duration::from_millis(30));
        let report = handle.stop();
        assert_eq!(report.exit, ProducerExit::Stopped);
        assert_eq!(queue.len() as u64, report.generated);
    }

    #[test]
    fn dropped_queue_ends_only_the_producer() {
        let queue = RequestQueue::new();
        let handle = RequestProducer::spawn(fast_config(), queue.sender()).unwrap();
        drop(queue);
        let report = handle.join();
        assert_eq!(report.exit, ProducerExit::QueueClosed);
    }

    #[test]
    fn generated_centers_use_ngo_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        let locations = vec!["Harbor".to_string(), "Hilltop".to_string()];
        let centers = generate_centers(&mut rng, 25, &locations);
        assert_eq!(centers.len(), 25);
        for c in &centers {
            assert!(c.name.starts_with("NGO-") && c.name.len() == 12);
            assert!(locations.contains(&c.location));
            assert!((500..=5_000).contains(&c.stock.food));
            assert!((500..=5_000).contains(&c.stock.water));
            assert!((100..=1_000).contains(&c.stock.medicine));
        }
        assert!(generate_centers(&mut rng, 3, &[]).is_empty());
    }
}
