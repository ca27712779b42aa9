//! The reporting sink lifecycle and write dispatch.
//!
//! A load-test runner drives a sink through `init` → `start` → repeated
//! `save_realtime_stats` → `save_final_stats` → `stop` → `dispose`. Calling
//! the write path out of order never silently succeeds: methods invoked
//! before `init` return [`SinkError::NotInitialized`].
use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use log::{debug, error};

use crate::{
    config::{CustomTag, SinkConfig, SinkSettings},
    context::SinkContext,
    error::{ConfigError, SinkError},
    mapping::{self, MappedBatches, TagEnricher},
    point::{Point, MEASUREMENT},
    stats::{NodeStats, ScenarioStats},
    writer::{PointWriter, PointWriterFactory},
};

/// Name of this sink, used in logs and runner registration.
pub const SINK_NAME: &str = "influx-sink";

/// The contract a load-test runner drives a reporting sink through.
#[async_trait]
pub trait ReportingSink: Send + Sync {
    /// Name of the sink.
    fn name(&self) -> &'static str;

    /// Bind the execution context and build the backend client from the raw
    /// configuration section.
    ///
    /// Fails fatally when no backend client can be constructed; the runner
    /// decides whether the load test continues without reporting.
    async fn init(&mut self, context: SinkContext, raw: serde_json::Value) -> Result<(), SinkError>;

    /// Emit the one-time cluster-registration point.
    async fn start(&self) -> Result<(), SinkError>;

    /// Report the latest reporting window. Invoked zero or more times,
    /// possibly concurrently from multiple scenario execution units.
    async fn save_realtime_stats(&self, stats: &[ScenarioStats]) -> Result<(), SinkError>;

    /// Report the cumulative statistics once at run end.
    async fn save_final_stats(&self, stats: &NodeStats) -> Result<(), SinkError>;

    /// Hint that no further realtime stats will arrive.
    ///
    /// Does not flush or await outstanding writes: batches submitted just
    /// before `stop` may still be in flight when it returns.
    async fn stop(&self) -> Result<(), SinkError>;

    /// Release the backend client. Idempotent.
    fn dispose(&mut self);
}

/// A reporting sink that maps run statistics into InfluxDB points.
///
/// The backend is an opaque [`PointWriter`] built at init time by a
/// [`PointWriterFactory`], or injected pre-built via
/// [`with_writer`](InfluxSink::with_writer). One writer handle is shared by
/// all call sites after init; the sink never serializes access to it.
pub struct InfluxSink {
    factory: Option<Box<dyn PointWriterFactory>>,
    writer: Option<Arc<dyn PointWriter>>,
    custom_tags: Vec<CustomTag>,
    enricher: Option<TagEnricher>,
}

impl InfluxSink {
    /// Create a sink that builds its backend client from configuration.
    pub fn new(factory: impl PointWriterFactory + 'static) -> Self {
        Self {
            factory: Some(Box::new(factory)),
            writer: None,
            custom_tags: Vec::new(),
            enricher: None,
        }
    }

    /// Create a sink around a pre-built writer.
    ///
    /// `init` must still be called to bind the execution context; the
    /// configuration section may be absent (`null`) in that case.
    pub fn with_writer(writer: Arc<dyn PointWriter>, custom_tags: Vec<CustomTag>) -> Self {
        Self { factory: None, writer: Some(writer), custom_tags, enricher: None }
    }

    /// The custom tags applied to every emitted point.
    pub fn custom_tags(&self) -> &[CustomTag] {
        &self.custom_tags
    }

    /// The backend writer, once initialized.
    pub fn writer(&self) -> Option<&Arc<dyn PointWriter>> {
        self.writer.as_ref()
    }

    fn pipeline(&self) -> Result<(&Arc<dyn PointWriter>, &TagEnricher), SinkError> {
        match (&self.writer, &self.enricher) {
            (Some(writer), Some(enricher)) => Ok((writer, enricher)),
            _ => Err(SinkError::NotInitialized),
        }
    }

    async fn save_scenario_stats(&self, stats: &[ScenarioStats]) -> Result<(), SinkError> {
        let (writer, enricher) = self.pipeline()?;
        let batches = mapping::map_batch(stats, enricher, enricher.session_id());
        dispatch(writer.as_ref(), batches).await
    }
}

/// Fan the three point batches out to the backend concurrently and join.
///
/// All three writes run to completion; a failure in one batch does not
/// cancel the others or roll back points the backend already accepted. The
/// combined result carries the first failure, if any.
async fn dispatch(writer: &dyn PointWriter, batches: MappedBatches) -> Result<(), SinkError> {
    let MappedBatches { step_points, latency_points, status_points } = batches;

    let (steps, latency, status) = tokio::join!(
        writer.write_points(step_points),
        writer.write_points(latency_points),
        writer.write_points(status_points),
    );

    [steps, latency, status]
        .into_iter()
        .collect::<anyhow::Result<()>>()
        .map_err(SinkError::Write)
}

#[async_trait]
impl ReportingSink for InfluxSink {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    async fn init(&mut self, context: SinkContext, raw: serde_json::Value) -> Result<(), SinkError> {
        if !raw.is_null() {
            let settings = SinkSettings::from_value(raw)?;
            let config = SinkConfig::resolve(settings)?;

            if let Some(factory) = &self.factory {
                let writer = factory
                    .connect(&config.client)
                    .map_err(|e| SinkError::Config(ConfigError::Client(e)))?;
                self.writer = Some(writer);
            }
            self.custom_tags = config.custom_tags;
        }

        if self.writer.is_none() {
            error!("reporting sink {SINK_NAME} failed to initialize: check the config structure");
            return Err(SinkError::Config(ConfigError::NoClient));
        }

        if !self.custom_tags.is_empty() {
            debug!(
                "{SINK_NAME} custom tags: {}",
                self.custom_tags.iter().map(|t| format!("{}={}", t.key, t.value)).join(", ")
            );
        }

        self.enricher = Some(TagEnricher::new(context, self.custom_tags.clone()));
        Ok(())
    }

    async fn start(&self) -> Result<(), SinkError> {
        let (writer, enricher) = self.pipeline()?;

        let point = Point::measurement(MEASUREMENT)
            .field("cluster.node_count", 1u64)
            .field("cluster.node_cpu_count", enricher.context().node_info.cores_count);
        let point = enricher.enrich(point, enricher.session_id());

        writer.write_points(vec![point]).await.map_err(SinkError::Write)
    }

    async fn save_realtime_stats(&self, stats: &[ScenarioStats]) -> Result<(), SinkError> {
        self.save_scenario_stats(stats).await
    }

    async fn save_final_stats(&self, stats: &NodeStats) -> Result<(), SinkError> {
        self.save_scenario_stats(&stats.scenario_stats).await
    }

    async fn stop(&self) -> Result<(), SinkError> {
        debug!("{SINK_NAME} stopped; in-flight writes are not awaited");
        Ok(())
    }

    fn dispose(&mut self) {
        if self.writer.take().is_some() {
            debug!("{SINK_NAME} backend client released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use serde_json::json;

    use crate::{
        config::ClientConfig,
        context::{NodeInfo, NodeType, Operation, TestInfo},
        point::FieldValue,
        stats::{LoadSimulationStats, OutcomeStats, StatusCodeStats, StepStats},
    };

    /// Records every submitted batch; optionally fails batches that contain
    /// a given field key.
    #[derive(Default)]
    struct RecordingWriter {
        batches: Mutex<Vec<Vec<Point>>>,
        fail_on_field: Option<&'static str>,
    }

    impl RecordingWriter {
        fn failing_on(field: &'static str) -> Self {
            Self { batches: Mutex::default(), fail_on_field: Some(field) }
        }

        fn batches(&self) -> Vec<Vec<Point>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PointWriter for RecordingWriter {
        async fn write_points(&self, points: Vec<Point>) -> anyhow::Result<()> {
            let rejected = self
                .fail_on_field
                .is_some_and(|f| points.iter().any(|p| p.field_value(f).is_some()));
            self.batches.lock().unwrap().push(points);
            if rejected {
                return Err(anyhow!("backend rejected batch"));
            }
            Ok(())
        }
    }

    fn context() -> SinkContext {
        SinkContext {
            node_info: NodeInfo {
                node_type: NodeType::SingleNode,
                current_operation: Operation::Bombing,
                cores_count: 16,
            },
            test_info: TestInfo {
                session_id: "session-42".into(),
                test_suite: "reporting".into(),
                test_name: "influx_demo".into(),
                cluster_id: "cluster-1".into(),
            },
        }
    }

    fn scenario(steps: usize) -> ScenarioStats {
        ScenarioStats {
            scenario_name: "checkout".into(),
            ok: OutcomeStats {
                status_codes: vec![StatusCodeStats { status_code: "200".into(), count: 10 }],
                ..Default::default()
            },
            fail: OutcomeStats::default(),
            step_stats: (0..steps)
                .map(|i| StepStats::new(format!("step_{i}"), OutcomeStats::default(), OutcomeStats::default()))
                .collect(),
            load_simulation: LoadSimulationStats::default(),
        }
    }

    async fn initialized_sink(writer: Arc<RecordingWriter>) -> InfluxSink {
        let mut sink = InfluxSink::with_writer(writer, Vec::new());
        sink.init(context(), serde_json::Value::Null).await.unwrap();
        sink
    }

    #[tokio::test]
    async fn init_builds_writer_through_factory() {
        let connected = Arc::new(Mutex::new(Vec::new()));
        let seen = connected.clone();
        let factory = move |config: &ClientConfig| -> anyhow::Result<Arc<dyn PointWriter>> {
            seen.lock().unwrap().push(config.clone());
            Ok(Arc::new(RecordingWriter::default()))
        };

        let mut sink = InfluxSink::new(factory);
        sink.init(context(), json!({ "url": "http://h:8086", "database": "db1" }))
            .await
            .unwrap();

        let seen = connected.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], ClientConfig::V1 { database, .. } if database == "db1"));
        assert!(sink.writer().is_some());
    }

    #[tokio::test]
    async fn init_fails_fast_on_unresolvable_config() {
        let factory = |_: &ClientConfig| -> anyhow::Result<Arc<dyn PointWriter>> {
            Ok(Arc::new(RecordingWriter::default()))
        };

        let mut sink = InfluxSink::new(factory);
        let err = sink.init(context(), json!({ "url": "http://h:8086" })).await.unwrap_err();

        assert!(matches!(err, SinkError::Config(ConfigError::MissingField("org"))));
        assert!(sink.writer().is_none());
    }

    #[tokio::test]
    async fn init_without_config_or_writer_fails() {
        let factory = |_: &ClientConfig| -> anyhow::Result<Arc<dyn PointWriter>> {
            Ok(Arc::new(RecordingWriter::default()))
        };

        let mut sink = InfluxSink::new(factory);
        let err = sink.init(context(), serde_json::Value::Null).await.unwrap_err();
        assert!(matches!(err, SinkError::Config(ConfigError::NoClient)));
    }

    #[tokio::test]
    async fn init_propagates_factory_failure() {
        let factory = |_: &ClientConfig| -> anyhow::Result<Arc<dyn PointWriter>> {
            Err(anyhow!("connection refused"))
        };

        let mut sink = InfluxSink::new(factory);
        let err = sink
            .init(context(), json!({ "url": "http://h:8086", "database": "db1" }))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Config(ConfigError::Client(_))));
    }

    #[tokio::test]
    async fn write_path_before_init_is_not_silent() {
        let sink = InfluxSink::with_writer(Arc::new(RecordingWriter::default()), Vec::new());

        assert!(matches!(sink.start().await, Err(SinkError::NotInitialized)));
        assert!(matches!(
            sink.save_realtime_stats(&[scenario(1)]).await,
            Err(SinkError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn start_emits_one_cluster_registration_point() {
        let writer = Arc::new(RecordingWriter::default());
        let sink = initialized_sink(writer.clone()).await;

        sink.start().await.unwrap();

        let batches = writer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);

        let point = &batches[0][0];
        assert_eq!(point.field_value("cluster.node_count"), Some(&FieldValue::UInt(1)));
        assert_eq!(point.field_value("cluster.node_cpu_count"), Some(&FieldValue::UInt(16)));
        assert_eq!(point.field_value("session_id"), Some(&FieldValue::Text("session-42".into())));
        assert_eq!(point.tag_value("node_type"), Some("SingleNode"));
        assert_eq!(point.tag_value("test_name"), Some("influx_demo"));
    }

    #[tokio::test]
    async fn realtime_stats_fan_out_as_three_batches() {
        let writer = Arc::new(RecordingWriter::default());
        let sink = initialized_sink(writer.clone()).await;

        sink.save_realtime_stats(&[scenario(2)]).await.unwrap();

        let batches = writer.batches();
        assert_eq!(batches.len(), 3);

        let mut sizes: Vec<_> = batches.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        // 1 latency point, 1 status-code point, 2 steps + global.
        assert_eq!(sizes, [1, 1, 3]);
    }

    #[tokio::test]
    async fn final_stats_use_the_same_pipeline() {
        let writer = Arc::new(RecordingWriter::default());
        let sink = initialized_sink(writer.clone()).await;

        let node = NodeStats { scenario_stats: vec![scenario(1), scenario(1)] };
        sink.save_final_stats(&node).await.unwrap();

        let batches = writer.batches();
        assert_eq!(batches.len(), 3);
        let total: usize = batches.iter().map(Vec::len).sum();
        // Per scenario: 2 step points, 1 latency point, 1 status point.
        assert_eq!(total, 8);
    }

    #[tokio::test]
    async fn one_failing_batch_fails_the_join_without_cancelling_the_rest() {
        let writer = Arc::new(RecordingWriter::failing_on("status_code.count"));
        let sink = initialized_sink(writer.clone()).await;

        let err = sink.save_realtime_stats(&[scenario(1)]).await.unwrap_err();
        assert!(matches!(err, SinkError::Write(_)));

        // All three batches reached the backend despite the failure.
        assert_eq!(writer.batches().len(), 3);
    }

    #[tokio::test]
    async fn custom_tags_from_config_reach_every_point() {
        let writer = Arc::new(RecordingWriter::default());
        let shared = writer.clone();
        let factory = move |_: &ClientConfig| -> anyhow::Result<Arc<dyn PointWriter>> {
            Ok(shared.clone())
        };

        let mut sink = InfluxSink::new(factory);
        sink.init(
            context(),
            json!({
                "url": "http://h:8086",
                "database": "db1",
                "customTags": [{ "key": "env", "value": "staging" }],
            }),
        )
        .await
        .unwrap();
        assert_eq!(sink.custom_tags().len(), 1);

        sink.start().await.unwrap();
        sink.save_realtime_stats(&[scenario(1)]).await.unwrap();

        for point in writer.batches().iter().flatten() {
            assert_eq!(point.tag_value("env"), Some("staging"));
        }
    }

    #[tokio::test]
    async fn dispose_twice_does_not_fault() {
        let writer = Arc::new(RecordingWriter::default());
        let mut sink = initialized_sink(writer).await;

        sink.dispose();
        sink.dispose();
        assert!(sink.writer().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_saves_share_one_writer_without_locking() {
        let writer = Arc::new(RecordingWriter::default());
        let sink = Arc::new(initialized_sink(writer.clone()).await);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let sink = sink.clone();
            tasks.push(tokio::spawn(async move {
                sink.save_realtime_stats(&[scenario(2)]).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let batches = writer.batches();
        assert_eq!(batches.len(), 3 * 8);
        for point in batches.iter().flatten() {
            assert_eq!(
                point.field_value("session_id"),
                Some(&FieldValue::Text("session-42".into()))
            );
        }
    }
}
