//! Typed payloads for the four stats endpoints
//!
//! Every numeric field is optional: a field the cluster did not report is
//! left out of the sample rather than published as zero.

pub mod cluster;
pub mod common;
pub mod index;
pub mod node;

use serde::{Deserialize, Deserializer};

use crate::metrics::MetricSet;

pub use cluster::ClusterResponse;
pub use common::{CommonMetrics, IndexSummary};
pub use index::IndexStats;
pub use node::NodeResponse;

// ─── Shared index activity block ─────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Docs {
    pub count: Option<i64>,
    pub deleted: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Store {
    pub size_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Indexing {
    pub index_total: Option<i64>,
    pub index_time_in_millis: Option<i64>,
    pub index_current: Option<i64>,
    pub delete_total: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Get {
    pub total: Option<i64>,
    pub time_in_millis: Option<i64>,
    pub exists_total: Option<i64>,
    pub missing_total: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Search {
    pub open_contexts: Option<i64>,
    pub query_total: Option<i64>,
    pub query_time_in_millis: Option<i64>,
    pub query_current: Option<i64>,
    pub fetch_total: Option<i64>,
    pub fetch_time_in_millis: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Merges {
    pub current: Option<i64>,
    pub total: Option<i64>,
    pub total_time_in_millis: Option<i64>,
    pub total_size_in_bytes: Option<i64>,
}

/// Shape shared by `refresh`, `flush` and `warmer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimedTotal {
    pub total: Option<i64>,
    pub total_time_in_millis: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Cache {
    pub memory_size_in_bytes: Option<i64>,
    pub evictions: Option<i64>,
    pub hit_count: Option<i64>,
    pub miss_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Segments {
    pub count: Option<i64>,
    pub memory_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Translog {
    pub operations: Option<i64>,
    pub size_in_bytes: Option<i64>,
}

/// Document, store and operation counters. Appears under a node's `indices`
/// and under `_all.primaries` in the common stats.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexActivity {
    pub docs: Docs,
    pub store: Store,
    pub indexing: Indexing,
    pub get: Get,
    pub search: Search,
    pub merges: Merges,
    pub refresh: TimedTotal,
    pub flush: TimedTotal,
    pub fielddata: Cache,
    pub query_cache: Cache,
    pub segments: Segments,
    pub translog: Translog,
}

impl IndexActivity {
    /// Write every counter under `prefix` (e.g. `indices.docs`).
    pub fn marshal_with_prefix(&self, prefix: &str, set: &mut MetricSet) {
        let name = |suffix: &str| format!("{prefix}.{suffix}");

        set.gauge(&name("docs"), self.docs.count);
        set.gauge(&name("docsDeleted"), self.docs.deleted);
        set.gauge(&name("storeSizeInBytes"), self.store.size_in_bytes);

        set.rate(&name("indexing.docsIndexed"), self.indexing.index_total);
        set.delta(
            &name("indexing.timeIndexingDocumentsInMilliseconds"),
            self.indexing.index_time_in_millis,
        );
        set.gauge(
            &name("indexing.documentsCurrentlyIndexing"),
            self.indexing.index_current,
        );
        set.rate(&name("indexing.docsDeleted"), self.indexing.delete_total);

        set.rate(&name("get.requests"), self.get.total);
        set.delta(&name("get.timeGetRequestsInMilliseconds"), self.get.time_in_millis);
        set.rate(&name("get.requestsDocumentExists"), self.get.exists_total);
        set.rate(&name("get.requestsDocumentMissing"), self.get.missing_total);

        set.gauge(&name("search.openContexts"), self.search.open_contexts);
        set.rate(&name("search.queries"), self.search.query_total);
        set.delta(
            &name("search.queryTimeInMilliseconds"),
            self.search.query_time_in_millis,
        );
        set.gauge(&name("search.queriesInProgress"), self.search.query_current);
        set.rate(&name("search.fetches"), self.search.fetch_total);
        set.delta(
            &name("search.fetchTimeInMilliseconds"),
            self.search.fetch_time_in_millis,
        );

        set.gauge(&name("merges.currentActive"), self.merges.current);
        set.rate(&name("merges.total"), self.merges.total);
        set.delta(
            &name("merges.totalTimeInMilliseconds"),
            self.merges.total_time_in_millis,
        );
        set.rate(&name("merges.totalSizeInBytes"), self.merges.total_size_in_bytes);

        set.rate(&name("refresh.total"), self.refresh.total);
        set.delta(
            &name("refresh.totalTimeInMilliseconds"),
            self.refresh.total_time_in_millis,
        );
        set.rate(&name("flush.total"), self.flush.total);
        set.delta(
            &name("flush.totalTimeInMilliseconds"),
            self.flush.total_time_in_millis,
        );

        set.gauge(&name("fielddata.sizeInBytes"), self.fielddata.memory_size_in_bytes);
        set.rate(&name("fielddata.evictions"), self.fielddata.evictions);
        set.gauge(&name("queryCache.sizeInBytes"), self.query_cache.memory_size_in_bytes);
        set.rate(&name("queryCache.evictions"), self.query_cache.evictions);
        set.rate(&name("queryCache.hits"), self.query_cache.hit_count);
        set.rate(&name("queryCache.misses"), self.query_cache.miss_count);

        set.gauge(&name("segments.count"), self.segments.count);
        set.gauge(&name("segments.memoryInBytes"), self.segments.memory_in_bytes);
        set.gauge(&name("translog.operations"), self.translog.operations);
        set.gauge(&name("translog.sizeInBytes"), self.translog.size_in_bytes);
    }
}

// ─── Lenient numbers ─────────────────────────────────────────────

/// `_cat` APIs report numbers as strings; accept either form, and treat
/// null, empty or unparsable values as absent.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(v)) => Some(v),
        // fractional values truncate toward zero
        Some(Raw::Float(v)) => Some(v as i64),
        Some(Raw::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
        }
        None => None,
    })
}
