//! Pure transformation of run statistics into tagged time-series points.
//!
//! Mapping is synchronous and free of shared mutable state: every call
//! computes its points from its own input and its own session id, so the
//! sink can run it concurrently from multiple scenario execution units
//! without locking.
//!
//! Field and tag names emitted here are a frozen contract with downstream
//! dashboards. Values are forwarded verbatim from the input aggregates; the
//! mapper never recomputes or rounds.
use crate::{
    config::CustomTag,
    context::SinkContext,
    point::{Point, MEASUREMENT},
    stats::{ScenarioStats, StepStats},
};

/// Name of the synthetic step carrying the scenario-level rollup.
///
/// Appending it to every scenario lets all step-shaped points share one
/// schema; dashboards select it via the `step` tag.
pub const GLOBAL_INFO_STEP: &str = "global information";

/// Attaches identity context and operator tags to every point.
#[derive(Clone, Debug)]
pub struct TagEnricher {
    context: SinkContext,
    custom_tags: Vec<CustomTag>,
}

impl TagEnricher {
    /// Create an enricher from the run context and the configured tags.
    pub fn new(context: SinkContext, custom_tags: Vec<CustomTag>) -> Self {
        Self { context, custom_tags }
    }

    /// The session id of the current run.
    pub fn session_id(&self) -> &str {
        &self.context.test_info.session_id
    }

    /// The run context this enricher was built from.
    pub fn context(&self) -> &SinkContext {
        &self.context
    }

    /// Apply the standard tag set, the `session_id` field and the custom
    /// tags to a point.
    ///
    /// The session id is a field rather than a tag to keep tag cardinality
    /// bounded. Custom tags are applied after the standard set in
    /// configuration order, so duplicate keys resolve last-write-wins.
    pub fn enrich(&self, point: Point, session_id: &str) -> Point {
        let node = &self.context.node_info;
        let test = &self.context.test_info;

        let point = point
            .field("session_id", session_id)
            .tag("current_operation", node.current_operation.to_string())
            .tag("node_type", node.node_type.to_string())
            .tag("test_suite", test.test_suite.clone())
            .tag("test_name", test.test_name.clone())
            .tag("cluster_id", test.cluster_id.clone());

        self.custom_tags
            .iter()
            .fold(point, |p, t| p.tag(t.key.clone(), t.value.clone()))
    }
}

/// The three independent point batches produced from one stats batch.
#[derive(Debug, Default)]
pub struct MappedBatches {
    /// One point per step (including the synthetic global step) per scenario.
    pub step_points: Vec<Point>,
    /// One latency-bucket point per scenario.
    pub latency_points: Vec<Point>,
    /// One point per (outcome, status code) entry per scenario.
    pub status_points: Vec<Point>,
}

/// Map a batch of scenario statistics into the three point batches.
pub fn map_batch(stats: &[ScenarioStats], enricher: &TagEnricher, session_id: &str) -> MappedBatches {
    MappedBatches {
        step_points: stats
            .iter()
            .map(with_global_info_step)
            .flat_map(|scn| map_step_points(&scn, enricher, session_id))
            .collect(),
        latency_points: stats.iter().map(|scn| map_latency_count(scn, enricher, session_id)).collect(),
        status_points: stats
            .iter()
            .flat_map(|scn| map_status_codes(scn, enricher, session_id))
            .collect(),
    }
}

/// Return a copy of the scenario with the [`GLOBAL_INFO_STEP`] appended.
///
/// The synthetic step's Ok/Fail aggregates equal the scenario-level rollup.
pub fn with_global_info_step(scenario: &ScenarioStats) -> ScenarioStats {
    let mut scenario = scenario.clone();
    let global = StepStats::new(GLOBAL_INFO_STEP, scenario.ok.clone(), scenario.fail.clone());
    scenario.step_stats.push(global);
    scenario
}

/// Emit one step-schema point per step of the scenario.
pub fn map_step_points(scenario: &ScenarioStats, enricher: &TagEnricher, session_id: &str) -> Vec<Point> {
    let simulation = &scenario.load_simulation;

    scenario
        .step_stats
        .iter()
        .map(|step| {
            let ok_r = &step.ok.request;
            let ok_l = &step.ok.latency;
            let ok_d = &step.ok.data_transfer;

            let f_r = &step.fail.request;
            let f_l = &step.fail.latency;
            let f_d = &step.fail.data_transfer;

            let point = Point::measurement(MEASUREMENT)
                .field("all.request.count", ok_r.count + f_r.count)
                .field("all.datatransfer.all", ok_d.all_bytes + f_d.all_bytes)
                // OK
                .field("ok.request.count", ok_r.count)
                .field("ok.request.rps", ok_r.rps)
                .field("ok.latency.min", ok_l.min_ms)
                .field("ok.latency.mean", ok_l.mean_ms)
                .field("ok.latency.max", ok_l.max_ms)
                .field("ok.latency.stddev", ok_l.std_dev)
                .field("ok.latency.percent50", ok_l.percent50)
                .field("ok.latency.percent75", ok_l.percent75)
                .field("ok.latency.percent95", ok_l.percent95)
                .field("ok.latency.percent99", ok_l.percent99)
                .field("ok.datatransfer.min", ok_d.min_bytes)
                .field("ok.datatransfer.mean", ok_d.mean_bytes)
                .field("ok.datatransfer.max", ok_d.max_bytes)
                .field("ok.datatransfer.all", ok_d.all_bytes)
                .field("ok.datatransfer.percent50", ok_d.percent50)
                .field("ok.datatransfer.percent75", ok_d.percent75)
                .field("ok.datatransfer.percent95", ok_d.percent95)
                .field("ok.datatransfer.percent99", ok_d.percent99)
                // FAIL
                .field("fail.request.count", f_r.count)
                .field("fail.request.rps", f_r.rps)
                .field("fail.latency.min", f_l.min_ms)
                .field("fail.latency.mean", f_l.mean_ms)
                .field("fail.latency.max", f_l.max_ms)
                .field("fail.latency.stddev", f_l.std_dev)
                .field("fail.latency.percent50", f_l.percent50)
                .field("fail.latency.percent75", f_l.percent75)
                .field("fail.latency.percent95", f_l.percent95)
                .field("fail.latency.percent99", f_l.percent99)
                .field("fail.datatransfer.min", f_d.min_bytes)
                .field("fail.datatransfer.mean", f_d.mean_bytes)
                .field("fail.datatransfer.max", f_d.max_bytes)
                .field("fail.datatransfer.all", f_d.all_bytes)
                .field("fail.datatransfer.percent50", f_d.percent50)
                .field("fail.datatransfer.percent75", f_d.percent75)
                .field("fail.datatransfer.percent95", f_d.percent95)
                .field("fail.datatransfer.percent99", f_d.percent99)
                .field("simulation.value", simulation.value);

            enricher
                .enrich(point, session_id)
                .tag("step", step.step_name.clone())
                .tag("scenario", scenario.scenario_name.clone())
        })
        .collect()
}

/// Emit the latency-bucket point for a scenario.
///
/// Buckets count OK-request latencies only, matching the dashboard contract.
pub fn map_latency_count(scenario: &ScenarioStats, enricher: &TagEnricher, session_id: &str) -> Point {
    let buckets = &scenario.ok.latency.latency_count;

    let point = Point::measurement(MEASUREMENT)
        .field("latency_count.less_or_eq_800", buckets.less_or_eq_800)
        .field("latency_count.more_800_less_1200", buckets.more_800_less_1200)
        .field("latency_count.more_or_eq_1200", buckets.more_or_eq_1200);

    enricher
        .enrich(point, session_id)
        .tag("scenario", scenario.scenario_name.clone())
}

/// Emit one point per (outcome, status code) entry of a scenario.
///
/// Ok entries come before Fail entries; a code appearing on both sides is
/// emitted twice, once per outcome.
pub fn map_status_codes(scenario: &ScenarioStats, enricher: &TagEnricher, session_id: &str) -> Vec<Point> {
    scenario
        .ok
        .status_codes
        .iter()
        .chain(&scenario.fail.status_codes)
        .map(|s| {
            let point = Point::measurement(MEASUREMENT)
                .tag("status_code.status", s.status_code.clone())
                .field("status_code.count", s.count);

            enricher
                .enrich(point, session_id)
                .tag("scenario", scenario.scenario_name.clone())
        })
        .collect()
}
