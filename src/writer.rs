//! The opaque backend capability the sink writes through.
//!
//! The wire protocol and network client of the time-series backend live in
//! a collaborator library; this crate only depends on the ability to submit
//! point batches asynchronously. A [`PointWriterFactory`] bridges the gap
//! between a resolved [`ClientConfig`](crate::config::ClientConfig) and a
//! live writer at init time.
use std::sync::Arc;

use async_trait::async_trait;

use crate::{config::ClientConfig, point::Point};

/// An asynchronous writer of time-series point batches.
///
/// Implementations must support concurrent use: the sink shares one handle
/// across all call sites after init and does not serialize access to it.
/// Retry, backoff and timeouts belong to the implementation, not to the
/// sink.
#[async_trait]
pub trait PointWriter: Send + Sync {
    /// Write a batch of points to the backend.
    async fn write_points(&self, points: Vec<Point>) -> anyhow::Result<()>;
}

/// Builds a [`PointWriter`] from a resolved backend configuration.
///
/// Construction failures surface as configuration errors at init time, so
/// an unreachable or misconfigured backend never degrades into silent point
/// loss on the first write.
pub trait PointWriterFactory: Send + Sync {
    /// Connect to the backend described by `config`.
    fn connect(&self, config: &ClientConfig) -> anyhow::Result<Arc<dyn PointWriter>>;
}

impl<F> PointWriterFactory for F
where
    F: Fn(&ClientConfig) -> anyhow::Result<Arc<dyn PointWriter>> + Send + Sync,
{
    fn connect(&self, config: &ClientConfig) -> anyhow::Result<Arc<dyn PointWriter>> {
        self(config)
    }
}
