//! Error types for the reporting sink.
use thiserror::Error;

/// Errors raised while resolving the sink configuration.
///
/// All variants are fatal: an unreportable sink must fail at
/// [`init`](crate::sink::ReportingSink::init) rather than silently
/// losing observability data on the first write.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The backend url is missing or empty.
    #[error("influxdb url is missing or empty")]
    MissingUrl,

    /// A field required by the selected protocol is missing or empty.
    #[error("mandatory field `{0}` is missing or empty")]
    MissingField(&'static str),

    /// The raw configuration section could not be deserialized.
    #[error("invalid sink configuration")]
    Parse(#[from] serde_json::Error),

    /// The backend client could not be constructed from the resolved
    /// configuration.
    #[error("backend client could not be constructed")]
    Client(#[source] anyhow::Error),

    /// Neither a configuration section nor a pre-built client was supplied.
    #[error("no backend client could be constructed from the configuration")]
    NoClient,
}

/// Errors surfaced through the sink lifecycle.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Configuration resolution failed during `init`.
    #[error("sink initialization failed")]
    Config(#[from] ConfigError),

    /// A lifecycle method was called before `init` completed.
    #[error("sink is not initialized")]
    NotInitialized,

    /// The backend rejected or failed a point batch write.
    ///
    /// Write failures are not retried at this layer; they propagate to the
    /// caller, which decides whether the load test continues without
    /// reporting.
    #[error("point batch write failed")]
    Write(#[source] anyhow::Error),
}
