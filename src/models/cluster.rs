use serde::Deserialize;

use crate::metrics::{MarshalMetrics, MetricSet};

/// `GET /_cluster/health`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterResponse {
    #[serde(rename = "cluster_name")]
    pub name: Option<String>,
    pub status: Option<String>,
    pub number_of_nodes: Option<i64>,
    pub number_of_data_nodes: Option<i64>,
    pub active_primary_shards: Option<i64>,
    pub active_shards: Option<i64>,
    pub relocating_shards: Option<i64>,
    pub initializing_shards: Option<i64>,
    pub unassigned_shards: Option<i64>,
    pub delayed_unassigned_shards: Option<i64>,
    pub number_of_pending_tasks: Option<i64>,
    pub active_shards_percent_as_number: Option<f64>,
}

impl MarshalMetrics for ClusterResponse {
    fn marshal_metrics(&self, set: &mut MetricSet) {
        set.attribute("clusterName", self.name.as_deref());
        set.attribute("cluster.status", self.status.as_deref());
        set.gauge("cluster.nodes", self.number_of_nodes);
        set.gauge("cluster.dataNodes", self.number_of_data_nodes);
        set.gauge("shards.primaryActive", self.active_primary_shards);
        set.gauge("shards.active", self.active_shards);
        set.gauge("shards.relocating", self.relocating_shards);
        set.gauge("shards.initializing", self.initializing_shards);
        set.gauge("shards.unassigned", self.unassigned_shards);
        set.gauge("shards.delayedUnassigned", self.delayed_unassigned_shards);
        set.gauge("cluster.pendingTasks", self.number_of_pending_tasks);
        set.gauge("shards.activePercent", self.active_shards_percent_as_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricValue, SourceType};

    #[test]
    fn test_cluster_health_marshals_every_field() {
        let resp: ClusterResponse = serde_json::from_str(
            r#"{
                "cluster_name": "prod",
                "status": "yellow",
                "timed_out": false,
                "number_of_nodes": 3,
                "number_of_data_nodes": 3,
                "active_primary_shards": 10,
                "active_shards": 18,
                "relocating_shards": 0,
                "initializing_shards": 0,
                "unassigned_shards": 2,
                "delayed_unassigned_shards": 0,
                "number_of_pending_tasks": 0,
                "active_shards_percent_as_number": 90.0
            }"#,
        )
        .unwrap();
        assert_eq!(resp.name.as_deref(), Some("prod"));

        let mut set = MetricSet::new("ElasticsearchClusterSample", Vec::new());
        set.marshal_metrics(&resp);

        assert_eq!(set.len(), 12);
        let status = set.get("cluster.status").unwrap();
        assert_eq!(status.source_type, SourceType::Attribute);
        assert_eq!(status.value, MetricValue::Text("yellow".into()));
        assert_eq!(
            set.get("shards.activePercent").unwrap().value,
            MetricValue::Float(90.0)
        );
    }

    #[test]
    fn test_missing_cluster_name_decodes_as_none() {
        let resp: ClusterResponse = serde_json::from_str(r#"{"status": "green"}"#).unwrap();
        assert!(resp.name.is_none());
    }
}
