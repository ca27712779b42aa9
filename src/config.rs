//! Sink configuration: raw settings and backend protocol resolution.
//!
//! The raw settings block arrives from the runner's infra configuration as a
//! JSON section. Resolution picks exactly one backend protocol at init time:
//! a non-empty `database` selects the v1.8 (username/password/database)
//! protocol, otherwise the v2.x (token/org/bucket) protocol is built. The
//! chosen variant is immutable for the sink's lifetime and never
//! re-discriminated on the write path.
use serde::Deserialize;

use crate::error::ConfigError;

/// An operator-declared tag applied to every emitted point.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CustomTag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Raw sink settings, deserialized from the runner's infra configuration.
///
/// Key casing follows the external configuration schema.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SinkSettings {
    /// Backend url. Mandatory.
    pub url: Option<String>,
    /// Database name; non-empty selects the v1.8 protocol.
    pub database: Option<String>,
    /// Username. Optional for both protocols.
    pub user_name: Option<String>,
    /// Password. Optional for both protocols.
    pub password: Option<String>,
    /// Authentication token (v2.x only).
    pub token: Option<String>,
    /// Organization (mandatory for v2.x).
    pub org: Option<String>,
    /// Bucket (mandatory for v2.x).
    pub bucket: Option<String>,
    /// Operator-declared tags, applied to every point in order.
    pub custom_tags: Vec<CustomTag>,
}

impl SinkSettings {
    /// Deserialize settings from a raw JSON configuration section.
    pub fn from_value(raw: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(raw)?)
    }
}

/// The resolved backend protocol variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientConfig {
    /// InfluxDB v1.8: name/password/database authentication.
    V1 {
        /// Backend url.
        url: String,
        /// Target database.
        database: String,
        /// Username, if configured.
        username: Option<String>,
        /// Password, if configured.
        password: Option<String>,
        /// Retention policy. Fixed to `"autogen"`.
        retention_policy: &'static str,
    },
    /// InfluxDB v2.x: token/org/bucket authentication.
    V2 {
        /// Backend url.
        url: String,
        /// Organization.
        org: String,
        /// Bucket.
        bucket: String,
        /// Authentication token, if configured.
        token: Option<String>,
        /// Username, if configured.
        username: Option<String>,
        /// Password, if configured.
        password: Option<String>,
    },
}

impl ClientConfig {
    /// The backend url of either protocol variant.
    pub fn url(&self) -> &str {
        match self {
            Self::V1 { url, .. } | Self::V2 { url, .. } => url,
        }
    }
}

/// The fully resolved sink configuration.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    /// Backend client configuration.
    pub client: ClientConfig,
    /// Custom tags, possibly empty but never absent.
    pub custom_tags: Vec<CustomTag>,
}

impl SinkConfig {
    /// Resolve raw settings into a concrete backend configuration.
    ///
    /// Fails fast with a [`ConfigError`] when no client can be built; the
    /// error is raised at init time, never deferred to the first write.
    pub fn resolve(settings: SinkSettings) -> Result<Self, ConfigError> {
        let url = non_empty(settings.url).ok_or(ConfigError::MissingUrl)?;

        let client = match non_empty(settings.database) {
            Some(database) => ClientConfig::V1 {
                url,
                database,
                username: non_empty(settings.user_name),
                password: non_empty(settings.password),
                retention_policy: "autogen",
            },
            None => ClientConfig::V2 {
                url,
                org: non_empty(settings.org).ok_or(ConfigError::MissingField("org"))?,
                bucket: non_empty(settings.bucket).ok_or(ConfigError::MissingField("bucket"))?,
                token: non_empty(settings.token),
                username: non_empty(settings.user_name),
                password: non_empty(settings.password),
            },
        };

        Ok(Self { client, custom_tags: settings.custom_tags })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
