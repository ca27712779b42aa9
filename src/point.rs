//! The time-series point produced by the mapping pipeline.
use chrono::{DateTime, Utc};

/// The single measurement name shared by every point this sink emits.
///
/// Field and tag keys under this measurement are a versioned contract with
/// downstream dashboards; renaming any of them breaks existing queries.
pub const MEASUREMENT: &str = "nbomber";

/// A field value on a [`Point`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit unsigned integer.
    UInt(u64),
    /// UTF-8 string.
    Text(String),
    /// Boolean value.
    Bool(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::UInt(v.into())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// One time-series observation: measurement name, tags, fields and an
/// optional timestamp.
///
/// Tags and fields keep insertion order; writing a key twice overwrites the
/// earlier value in place (last-write-wins). A `None` timestamp means the
/// backend assigns the write time.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: &'static str,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<DateTime<Utc>>,
}

impl Point {
    /// Create a new point for the given measurement.
    pub fn measurement(name: &'static str) -> Self {
        Self { measurement: name, tags: Vec::new(), fields: Vec::new(), timestamp: None }
    }

    /// Add a tag, overwriting the value if the key already exists.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.tags, key.into(), value.into());
        self
    }

    /// Add a field, overwriting the value if the key already exists.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        upsert(&mut self.fields, key.into(), value.into());
        self
    }

    /// Pin an explicit timestamp instead of the backend write time.
    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// The measurement name.
    pub fn measurement_name(&self) -> &'static str {
        self.measurement
    }

    /// Tags in insertion order.
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// The explicit timestamp, if any.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Look up a tag value by key.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Look up a field value by key.
    pub fn field_value(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => *v = value,
        None => entries.push((key, value)),
    }
}
