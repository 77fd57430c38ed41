use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::chain::Next;
use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Global middleware counting requests, latency and response classes.
///
/// One instance is shared by every request; all counters are atomics updated
/// with `Ordering::Relaxed`, so reads are eventually consistent.
///
/// Requests whose chain returns an error are counted under `5xx`; the
/// dispatcher renders those as `500`.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    status_2xx: AtomicUsize,
    status_3xx: AtomicUsize,
    status_4xx: AtomicUsize,
    status_5xx: AtomicUsize,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub request_count: usize,
    pub average_latency_us: u64,
    pub status_2xx: usize,
    pub status_3xx: usize,
    pub status_4xx: usize,
    pub status_5xx: usize,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean processing time; zero before the first request.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses counted for a status class (`2` for 2xx and so on).
    pub fn status_class_count(&self, class: u16) -> usize {
        match class {
            2 => self.status_2xx.load(Ordering::Relaxed),
            3 => self.status_3xx.load(Ordering::Relaxed),
            4 => self.status_4xx.load(Ordering::Relaxed),
            5 => self.status_5xx.load(Ordering::Relaxed),
            _ => 0,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            request_count: self.request_count(),
            average_latency_us: self.average_latency().as_micros() as u64,
            status_2xx: self.status_class_count(2),
            status_3xx: self.status_class_count(3),
            status_4xx: self.status_class_count(4),
            status_5xx: self.status_class_count(5),
        }
    }

    fn record_status(&self, status: u16) {
        let counter = match status / 100 {
            2 => &self.status_2xx,
            3 => &self.status_3xx,
            4 => &self.status_4xx,
            5 => &self.status_5xx,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Middleware for MetricsMiddleware {
    fn process(&self, req: &mut HandlerRequest, next: Next<'_>) -> anyhow::Result<HandlerResponse> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let result = next.run(req);

        self.total_latency_ns
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        match &result {
            Ok(res) => self.record_status(res.status),
            Err(_) => self.record_status(500),
        }
        result
    }
}
