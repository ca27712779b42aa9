//! An InfluxDB reporting sink for load-test runners.
//!
//! This crate turns the hierarchical statistics a load-generation engine
//! produces per reporting window into flat, tagged time-series points and
//! writes them to an InfluxDB backend, so operators can visualize
//! throughput, latency percentiles, data transfer and status-code
//! distributions of a running test.
//!
//! ## Features
//!
//! - **Dual-protocol backends**: a single configuration block resolves to
//!   either an InfluxDB v1.8 (username/password/database) or v2.x
//!   (token/org/bucket) client at init time.
//! - **Stable point schema**: field and tag names are a versioned contract
//!   with downstream dashboards.
//! - **Pure mapping pipeline**: statistics map to points without shared
//!   mutable state, so reporting calls can run concurrently.
//! - **Opaque backend**: the wire protocol lives behind the [`PointWriter`]
//!   trait; bring any client library.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use anyhow::Result;
//! use async_trait::async_trait;
//! use blast_influx_sink::{InfluxSink, Point, PointWriter, ReportingSink};
//! use serde_json::json;
//!
//! struct MyInfluxClient;
//!
//! #[async_trait]
//! impl PointWriter for MyInfluxClient {
//!     async fn write_points(&self, points: Vec<Point>) -> Result<()> {
//!         // hand the batch to your InfluxDB client library
//!         Ok(())
//!     }
//! }
//!
//! # async fn run(context: blast_influx_sink::SinkContext) -> Result<()> {
//! let mut sink = InfluxSink::with_writer(Arc::new(MyInfluxClient), Vec::new());
//! sink.init(context, json!({ "url": "http://localhost:8086", "database": "loadtests" })).await?;
//! sink.start().await?;
//! // ... sink.save_realtime_stats(&stats).await? per reporting window ...
//! sink.stop().await?;
//! sink.dispose();
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

mod error;
mod point;

pub mod config;
pub mod context;
pub mod mapping;
pub mod sink;
pub mod stats;
pub mod writer;

pub use crate::{
    config::{ClientConfig, CustomTag, SinkConfig, SinkSettings},
    context::{NodeInfo, NodeType, Operation, SinkContext, TestInfo},
    error::{ConfigError, SinkError},
    point::{FieldValue, Point, MEASUREMENT},
    sink::{InfluxSink, ReportingSink, SINK_NAME},
    stats::{NodeStats, ScenarioStats, StepStats},
    writer::{PointWriter, PointWriterFactory},
};
