// Ordering policies for the dispatch queue

use crate::request::Request;

/// Ranking key for queued requests. Larger keys are dispatched first;
/// equal keys are dispatched in arrival order.
pub type Priority = i64;

/// Decides dispatch order without the request type knowing about it.
///
/// Implemented for closures, so a one-off policy can be written inline:
///
/// ```ignore
/// let queue = RequestQueue::with_policy(|r: &Request| -(r.needs().total() as i64));
/// ```
pub trait OrderingPolicy: Send {
    fn priority(&self, request: &Request) -> Priority;
}

impl<F> OrderingPolicy for F
where
    F: Fn(&Request) -> Priority + Send,
{
    fn priority(&self, request: &Request) -> Priority {
        self(request)
    }
}

/// Most urgent first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByUrgency;

impl OrderingPolicy for ByUrgency {
    fn priority(&self, request: &Request) -> Priority {
        Priority::from(request.urgency().level())
    }
}

/// Urgency first, then the request needing the least total supply.
///
/// Among equally urgent requests, small requests are cheaper to satisfy and
/// are less likely to exhaust a center needed by the next one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByUrgencyThenSize;

impl OrderingPolicy for ByUrgencyThenSize {
    fn priority(&self, request: &Request) -> Priority {
        // Total need is at most 3 * u32::MAX, which fits below 2^34.
        let size = i64::try_from(request.needs().total()).unwrap_or(i64::MAX >> 8);
        (Priority::from(request.urgency().level()) << 40) - size
    }
}
