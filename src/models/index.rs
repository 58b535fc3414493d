use serde::Deserialize;

use super::{lenient_i64, IndexSummary};
use crate::error::{CollectError, Result};
use crate::metrics::{MarshalMetrics, MetricSet};

/// One row of `GET /_cat/indices?format=json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexStats {
    #[serde(rename = "index")]
    pub name: Option<String>,
    pub health: Option<String>,
    pub status: Option<String>,
    pub uuid: Option<String>,
    #[serde(rename = "pri", deserialize_with = "lenient_i64")]
    pub primary_shards: Option<i64>,
    #[serde(rename = "rep", deserialize_with = "lenient_i64")]
    pub replica_shards: Option<i64>,
    #[serde(rename = "docs.count", deserialize_with = "lenient_i64")]
    pub docs_count: Option<i64>,
    #[serde(rename = "docs.deleted", deserialize_with = "lenient_i64")]
    pub docs_deleted: Option<i64>,

    // Filled from the common stats, never from this payload.
    #[serde(skip)]
    pub primary_store_size: Option<i64>,
    #[serde(skip)]
    pub store_size: Option<i64>,
}

impl IndexStats {
    /// Copy the store sizes of the matching common-stats entry. Both must be
    /// present; on error the record is left untouched.
    pub fn apply_summary(&mut self, summary: &IndexSummary) -> Result<()> {
        let (Some(primary), Some(total)) = (summary.primary_store_size(), summary.store_size())
        else {
            return Err(CollectError::MissingStoreSize(
                self.name.clone().unwrap_or_default(),
            ));
        };
        self.primary_store_size = Some(primary);
        self.store_size = Some(total);
        Ok(())
    }
}

impl MarshalMetrics for IndexStats {
    fn marshal_metrics(&self, set: &mut MetricSet) {
        set.attribute("index.health", self.health.as_deref());
        set.attribute("index.status", self.status.as_deref());
        set.attribute("index.uuid", self.uuid.as_deref());
        set.gauge("index.primaryShards", self.primary_shards);
        set.gauge("index.replicaShards", self.replica_shards);
        set.gauge("index.docs", self.docs_count);
        set.gauge("index.docsDeleted", self.docs_deleted);
        set.gauge("index.primaryStoreSizeInBytes", self.primary_store_size);
        set.gauge("index.storeSizeInBytes", self.store_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValue;

    const CAT: &str = r#"[
        {"health": "green", "status": "open", "index": "logs-1", "uuid": "u1",
         "pri": "1", "rep": "1", "docs.count": "12", "docs.deleted": "0",
         "store.size": "999", "pri.store.size": "500"},
        {"health": "red", "status": "close", "uuid": "u2"}
    ]"#;

    #[test]
    fn test_cat_rows_decode_strings() {
        let rows: Vec<IndexStats> = serde_json::from_str(CAT).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some("logs-1"));
        assert_eq!(rows[0].docs_count, Some(12));
        assert_eq!(rows[0].primary_shards, Some(1));
        // sizes come only from the common stats
        assert_eq!(rows[0].store_size, None);
        assert!(rows[1].name.is_none());
    }

    #[test]
    fn test_apply_summary_sets_sizes() {
        let mut rows: Vec<IndexStats> = serde_json::from_str(CAT).unwrap();
        let summary: IndexSummary = serde_json::from_str(
            r#"{"primaries": {"store": {"size_in_bytes": 100}}, "total": {"store": {"size_in_bytes": 200}}}"#,
        )
        .unwrap();
        rows[0].apply_summary(&summary).unwrap();

        let mut set = MetricSet::new("ElasticsearchIndexSample", Vec::new());
        set.marshal_metrics(&rows[0]);
        assert_eq!(set.len(), 9);
        assert_eq!(
            set.get("index.primaryStoreSizeInBytes").unwrap().value,
            MetricValue::Int(100)
        );
        assert_eq!(
            set.get("index.storeSizeInBytes").unwrap().value,
            MetricValue::Int(200)
        );
    }

    #[test]
    fn test_apply_summary_requires_both_sizes() {
        let mut rows: Vec<IndexStats> = serde_json::from_str(CAT).unwrap();

        let no_store: IndexSummary = serde_json::from_str(r#"{"primaries": {}}"#).unwrap();
        assert!(matches!(
            rows[0].apply_summary(&no_store),
            Err(CollectError::MissingStoreSize(name)) if name == "logs-1"
        ));

        let primaries_only: IndexSummary =
            serde_json::from_str(r#"{"primaries": {"store": {"size_in_bytes": 100}}}"#).unwrap();
        assert!(rows[0].apply_summary(&primaries_only).is_err());
        assert_eq!(rows[0].primary_store_size, None);
        assert_eq!(rows[0].store_size, None);
    }
}
