use std::collections::BTreeMap;

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use crate::client::StatsEndpoint;

// HdrHistogram range: 1 µs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

/// Wall time of every stats request, per endpoint.
/// Shared between the HTTP client (writer) and the orchestrator (reader).
pub struct RequestTimings {
    inner: Mutex<BTreeMap<StatsEndpoint, EndpointTimings>>,
}

struct EndpointTimings {
    hist: Histogram<u64>,
    failures: u64,
}

/// Read-only view of one endpoint's timings. Latencies are in µs.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSnapshot {
    pub endpoint: StatsEndpoint,
    pub requests: u64,
    pub failures: u64,
    pub min_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl EndpointTimings {
    fn new() -> Self {
        Self {
            hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                .expect("histogram creation"),
            failures: 0,
        }
    }

    // Only created on first record, so the histogram is never empty here.
    fn snapshot(&self, endpoint: StatsEndpoint) -> EndpointSnapshot {
        EndpointSnapshot {
            endpoint,
            requests: self.hist.len(),
            failures: self.failures,
            min_us: self.hist.min(),
            p50_us: self.hist.value_at_quantile(0.5),
            p99_us: self.hist.value_at_quantile(0.99),
            max_us: self.hist.max(),
        }
    }
}

impl RequestTimings {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record one request. Failed requests count towards latency as well.
    pub fn record(&self, endpoint: StatsEndpoint, elapsed_us: u64, success: bool) {
        let mut inner = self.inner.lock();
        let entry = inner.entry(endpoint).or_insert_with(EndpointTimings::new);
        // clamp into the histogram's range
        let _ = entry.hist.record(elapsed_us.clamp(HIST_LOW, HIST_HIGH));
        if !success {
            entry.failures += 1;
        }
    }

    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        self.inner
            .lock()
            .iter()
            .map(|(endpoint, t)| t.snapshot(*endpoint))
            .collect()
    }
}

impl Default for RequestTimings {
    fn default() -> Self {
        Self::new()
    }
}
