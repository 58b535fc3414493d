//! Metric sample sink
//!
//! Entities, metric sets and the JSON payload that carries them out of the
//! process. Response records describe themselves through [`MarshalMetrics`].

pub mod timings;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::{CollectError, Result};

pub use timings::RequestTimings;

/// Version of the payload layout written to stdout.
pub const PROTOCOL_VERSION: &str = "3";

// ─── Points ──────────────────────────────────────────────────────

/// How the backend should interpret a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Point-in-time value
    Gauge,
    /// Monotonic counter, reported per second by the backend
    Rate,
    /// Monotonic counter, reported as the change since the last sample
    Delta,
    /// Descriptive string
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub name: String,
    pub value: MetricValue,
    pub source_type: SourceType,
}

/// A string key/value pair identifying a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// ─── Metric set ──────────────────────────────────────────────────

/// One sample: an event type, identifying attributes and ordered points.
#[derive(Debug, Clone)]
pub struct MetricSet {
    event_type: String,
    attributes: Vec<Attribute>,
    points: Vec<MetricPoint>,
}

impl MetricSet {
    pub fn new(event_type: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            event_type: event_type.into(),
            attributes,
            points: Vec::new(),
        }
    }

    /// Set a point, replacing any earlier point of the same name.
    pub fn set_metric(
        &mut self,
        name: &str,
        value: impl Into<MetricValue>,
        source_type: SourceType,
    ) {
        let point = MetricPoint {
            name: name.to_string(),
            value: value.into(),
            source_type,
        };
        match self.points.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = point,
            None => self.points.push(point),
        }
    }

    // Absent source fields produce no point at all.

    pub fn gauge<V: Into<MetricValue>>(&mut self, name: &str, value: Option<V>) {
        if let Some(v) = value {
            self.set_metric(name, v, SourceType::Gauge);
        }
    }

    pub fn rate<V: Into<MetricValue>>(&mut self, name: &str, value: Option<V>) {
        if let Some(v) = value {
            self.set_metric(name, v, SourceType::Rate);
        }
    }

    pub fn delta<V: Into<MetricValue>>(&mut self, name: &str, value: Option<V>) {
        if let Some(v) = value {
            self.set_metric(name, v, SourceType::Delta);
        }
    }

    pub fn attribute(&mut self, name: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.set_metric(name, v, SourceType::Attribute);
        }
    }

    /// Copy every field of `record` into this set.
    pub fn marshal_metrics<M: MarshalMetrics + ?Sized>(&mut self, record: &M) {
        record.marshal_metrics(self);
    }
}

#[cfg(test)]
impl MetricSet {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn attribute_value(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&MetricPoint> {
        self.points.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Serialize for MetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map =
            serializer.serialize_map(Some(1 + self.attributes.len() + self.points.len()))?;
        map.serialize_entry("event_type", &self.event_type)?;
        for attr in &self.attributes {
            map.serialize_entry(&attr.key, &attr.value)?;
        }
        for point in &self.points {
            map.serialize_entry(&point.name, &point.value)?;
        }
        map.end()
    }
}

/// Implemented by every response record that can be published.
pub trait MarshalMetrics {
    fn marshal_metrics(&self, set: &mut MetricSet);
}

// ─── Entities ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    #[serde(rename = "entity")]
    pub metadata: EntityMetadata,
    pub metrics: Vec<MetricSet>,
}

impl Entity {
    /// Start a new sample attached to this entity.
    pub fn new_metric_set(
        &mut self,
        event_type: impl Into<String>,
        attributes: Vec<Attribute>,
    ) -> &mut MetricSet {
        self.metrics.push(MetricSet::new(event_type, attributes));
        let last = self.metrics.len() - 1;
        &mut self.metrics[last]
    }
}

/// All entities published during one collection run.
#[derive(Debug)]
pub struct Integration {
    name: String,
    version: String,
    entities: Vec<Entity>,
}

/// Serialized form of a finished run.
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub name: &'a str,
    pub protocol_version: &'static str,
    pub integration_version: &'a str,
    pub timestamp: DateTime<Utc>,
    pub data: &'a [Entity],
}

impl Integration {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            entities: Vec::new(),
        }
    }

    /// Look up the entity for `(name, namespace)`, creating it on first use.
    pub fn entity(&mut self, name: &str, namespace: &str) -> Result<&mut Entity> {
        if name.trim().is_empty() || namespace.trim().is_empty() {
            return Err(CollectError::EntityCreation {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        }

        let idx = match self
            .entities
            .iter()
            .position(|e| e.metadata.name == name && e.metadata.namespace == namespace)
        {
            Some(idx) => idx,
            None => {
                self.entities.push(Entity {
                    metadata: EntityMetadata {
                        name: name.to_string(),
                        namespace: namespace.to_string(),
                    },
                    metrics: Vec::new(),
                });
                self.entities.len() - 1
            }
        };
        Ok(&mut self.entities[idx])
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn payload(&self) -> Payload<'_> {
        Payload {
            name: &self.name,
            protocol_version: PROTOCOL_VERSION,
            integration_version: &self.version,
            timestamp: Utc::now(),
            data: &self.entities,
        }
    }
}

#[cfg(test)]
impl Integration {
    pub fn find_entity(&self, name: &str, namespace: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.metadata.name == name && e.metadata.namespace == namespace)
    }

    /// Number of entities in `namespace`.
    pub fn count_in(&self, namespace: &str) -> usize {
        self.entities
            .iter()
            .filter(|e| e.metadata.namespace == namespace)
            .count()
    }
}
