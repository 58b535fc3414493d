use std::collections::HashMap;

use serde::Deserialize;

use super::{IndexActivity, Store};
use crate::metrics::{MarshalMetrics, MetricSet};

/// `GET /_stats`: cluster-wide totals plus a per-index summary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommonMetrics {
    #[serde(rename = "_all")]
    pub all: CommonAll,
    pub indices: HashMap<String, IndexSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommonAll {
    pub primaries: Option<IndexActivity>,
}

impl MarshalMetrics for CommonAll {
    fn marshal_metrics(&self, set: &mut MetricSet) {
        if let Some(primaries) = &self.primaries {
            primaries.marshal_with_prefix("primaries", set);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShardGroup {
    pub store: Store,
}

/// Per-index entry of the common stats. Only the store sizes are used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexSummary {
    pub primaries: ShardGroup,
    #[serde(rename = "total")]
    pub totals: ShardGroup,
}

impl IndexSummary {
    pub fn primary_store_size(&self) -> Option<i64> {
        self.primaries.store.size_in_bytes
    }

    pub fn store_size(&self) -> Option<i64> {
        self.totals.store.size_in_bytes
    }
}
