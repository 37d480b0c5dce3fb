//! Dispatch queue for pending relief requests.
//!
//! Producers never touch the queue's state. They hold a [`RequestSender`] and
//! send finished `Request` values over an unbounded crossbeam channel. The
//! consumer owns the [`RequestQueue`], which moves everything that has arrived
//! on the channel into a priority heap before each pop. Arrival order is the
//! order in which requests come off the channel.

pub mod policy;

pub use policy::*;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::error::QueueClosed;
use crate::request::Request;

#[derive(Debug)]
struct Queued {
    priority: Priority,
    seq: u64,
    request: Request,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Max-heap: higher priority first, then lower sequence number.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cloneable handle producers use to submit requests.
#[derive(Debug, Clone)]
pub struct RequestSender {
    tx: Sender<Request>,
}

impl RequestSender {
    /// Submit a request. Never blocks; fails only once the queue is gone.
    pub fn push(&self, request: Request) -> Result<(), QueueClosed> {
        self.tx.send(request).map_err(|e| QueueClosed(e.into_inner()))
    }
}

pub struct RequestQueue {
    tx: Sender<Request>,
    rx: Receiver<Request>,
    pending: BinaryHeap<Queued>,
    next_seq: u64,
    policy: Box<dyn OrderingPolicy>,
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestQueue {
    /// Queue ordered by urgency, most urgent first.
    pub fn new() -> Self {
        Self::with_policy(ByUrgency)
    }

    pub fn with_policy(policy: impl OrderingPolicy + 'static) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            pending: BinaryHeap::new(),
            next_seq: 0,
            policy: Box::new(policy),
        }
    }

    pub fn sender(&self) -> RequestSender {
        RequestSender {
            tx: self.tx.clone(),
        }
    }

    /// Enqueue from the consumer side.
    pub fn push(&mut self, request: Request) {
        // Anything already sent arrived before this request.
        self.absorb();
        self.enqueue(request);
    }

    /// Block until a request is available and return the highest-priority one.
    pub fn pop(&mut self) -> Request {
        loop {
            if let Some(request) = self.try_pop() {
                return request;
            }
            // The queue holds its own sender, so `recv` only returns with data.
            if let Ok(request) = self.rx.recv() {
                self.enqueue(request);
            }
        }
    }

    pub fn try_pop(&mut self) -> Option<Request> {
        self.absorb();
        self.pending.pop().map(|q| q.request)
    }

    /// Like [`pop`](Self::pop) but gives up after `timeout` with nothing queued.
    pub fn pop_timeout(&mut self, timeout: Duration) -> Option<Request> {
        if let Some(request) = self.try_pop() {
            return Some(request);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(request) => {
                self.enqueue(request);
                self.try_pop()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Advisory count: producers may be sending concurrently.
    pub fn len(&self) -> usize {
        self.pending.len() + self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending requests in the order they would be dispatched.
    pub fn pending(&mut self) -> Vec<Request> {
        self.absorb();
        let mut ordered = self.pending.iter().collect::<Vec<_>>();
        ordered.sort_by(|a, b| b.cmp(a));
        ordered.into_iter().map(|q| q.request.clone()).collect()
    }

    fn absorb(&mut self) {
        while let Ok(request) = self.rx.try_recv() {
            self.enqueue(request);
        }
    }

    fn enqueue(&mut self, request: Request) {
        let priority = self.policy.priority(&request);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Queued {
            priority,
            seq,
            request,
        });
    }
}
