//! Hierarchical run statistics produced by the load-test runner.
//!
//! One [`ScenarioStats`] arrives per scenario per reporting window, with all
//! aggregates (counts, RPS, percentiles, byte totals) already computed by
//! the runner. The sink reads them for the duration of one mapping call and
//! forwards the values verbatim.

/// Request count and throughput for one outcome.
#[derive(Clone, Debug, Default)]
pub struct RequestStats {
    /// Number of requests.
    pub count: u64,
    /// Requests per second.
    pub rps: f64,
}

/// Counts of OK-request latencies falling into fixed buckets.
#[derive(Clone, Debug, Default)]
pub struct LatencyCountStats {
    /// Latencies <= 800 ms.
    pub less_or_eq_800: u64,
    /// Latencies > 800 ms and < 1200 ms.
    pub more_800_less_1200: u64,
    /// Latencies >= 1200 ms.
    pub more_or_eq_1200: u64,
}

/// Latency distribution for one outcome, in milliseconds.
#[derive(Clone, Debug, Default)]
pub struct LatencyStats {
    /// Minimum latency.
    pub min_ms: f64,
    /// Mean latency.
    pub mean_ms: f64,
    /// Maximum latency.
    pub max_ms: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// 50th percentile.
    pub percent50: f64,
    /// 75th percentile.
    pub percent75: f64,
    /// 95th percentile.
    pub percent95: f64,
    /// 99th percentile.
    pub percent99: f64,
    /// Fixed-bucket latency counts.
    pub latency_count: LatencyCountStats,
}

/// Data-transfer distribution for one outcome, in bytes.
#[derive(Clone, Debug, Default)]
pub struct DataTransferStats {
    /// Minimum transfer per request.
    pub min_bytes: u64,
    /// Mean transfer per request.
    pub mean_bytes: u64,
    /// Maximum transfer per request.
    pub max_bytes: u64,
    /// Total bytes transferred.
    pub all_bytes: u64,
    /// 50th percentile.
    pub percent50: u64,
    /// 75th percentile.
    pub percent75: u64,
    /// 95th percentile.
    pub percent95: u64,
    /// 99th percentile.
    pub percent99: u64,
}

/// Occurrence count for one status code.
#[derive(Clone, Debug)]
pub struct StatusCodeStats {
    /// The status code as reported by the tested service.
    pub status_code: String,
    /// Number of responses with this code.
    pub count: u64,
}

/// The shared aggregate shape for the Ok and Fail sides of a step or
/// scenario.
#[derive(Clone, Debug, Default)]
pub struct OutcomeStats {
    /// Request count and throughput.
    pub request: RequestStats,
    /// Latency distribution.
    pub latency: LatencyStats,
    /// Data-transfer distribution.
    pub data_transfer: DataTransferStats,
    /// Status-code counters.
    pub status_codes: Vec<StatusCodeStats>,
}

/// Aggregate result of one logical request step.
#[derive(Clone, Debug)]
pub struct StepStats {
    /// Step name.
    pub step_name: String,
    /// Aggregates over successful requests.
    pub ok: OutcomeStats,
    /// Aggregates over failed requests.
    pub fail: OutcomeStats,
}

impl StepStats {
    /// Create step stats from precomputed Ok/Fail aggregates.
    pub fn new(step_name: impl Into<String>, ok: OutcomeStats, fail: OutcomeStats) -> Self {
        Self { step_name: step_name.into(), ok, fail }
    }
}

/// Current load-simulation mode of a scenario.
#[derive(Clone, Debug, Default)]
pub struct LoadSimulationStats {
    /// Simulation name (e.g. "keep_constant").
    pub simulation_name: String,
    /// Current simulation value (copies, rate, ...).
    pub value: i64,
}

/// One scenario's aggregate result for a reporting window.
#[derive(Clone, Debug)]
pub struct ScenarioStats {
    /// Scenario name.
    pub scenario_name: String,
    /// Scenario-level rollup over successful requests.
    pub ok: OutcomeStats,
    /// Scenario-level rollup over failed requests.
    pub fail: OutcomeStats,
    /// Per-step aggregates, in scenario order.
    pub step_stats: Vec<StepStats>,
    /// Current load-simulation mode.
    pub load_simulation: LoadSimulationStats,
}

/// Node-level cumulative statistics delivered once at run end.
#[derive(Clone, Debug)]
pub struct NodeStats {
    /// Final per-scenario aggregates.
    pub scenario_stats: Vec<ScenarioStats>,
}
