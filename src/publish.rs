use crate::error::Result;
use crate::metrics::{Attribute, Integration, MarshalMetrics};

/// Event type for a namespace: `node` → `ElasticsearchNodeSample`.
pub fn sample_name(namespace: &str) -> String {
    let mut chars = namespace.chars();
    let title: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("Elasticsearch{title}Sample")
}

/// Attach a fresh sample for `record` to the `(name, namespace)` entity.
pub fn set_metrics_response<M: MarshalMetrics + ?Sized>(
    integration: &mut Integration,
    record: &M,
    name: &str,
    namespace: &str,
) -> Result<()> {
    let entity = integration.entity(name, namespace)?;

    let display_name = entity.metadata.name.clone();
    let entity_name = format!("{}:{}", entity.metadata.namespace, entity.metadata.name);

    let set = entity.new_metric_set(
        sample_name(namespace),
        vec![
            Attribute::new("displayName", display_name),
            Attribute::new("entityName", entity_name),
        ],
    );
    set.marshal_metrics(record);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectError;
    use crate::models::ClusterResponse;

    #[test]
    fn test_sample_names() {
        assert_eq!(sample_name("node"), "ElasticsearchNodeSample");
        assert_eq!(sample_name("cluster"), "ElasticsearchClusterSample");
        assert_eq!(sample_name("index"), "ElasticsearchIndexSample");
        assert_eq!(sample_name("common"), "ElasticsearchCommonSample");
    }

    #[test]
    fn test_set_metrics_response_attributes() {
        let mut integration = Integration::new("test", "0.0.1");
        let cluster = ClusterResponse {
            name: Some("prod".into()),
            number_of_nodes: Some(3),
            ..Default::default()
        };

        set_metrics_response(&mut integration, &cluster, "prod", "cluster").unwrap();

        let entity = integration.find_entity("prod", "cluster").unwrap();
        assert_eq!(entity.metrics.len(), 1);
        let set = &entity.metrics[0];
        assert_eq!(set.event_type(), "ElasticsearchClusterSample");
        assert_eq!(set.attribute_value("displayName"), Some("prod"));
        assert_eq!(set.attribute_value("entityName"), Some("cluster:prod"));
        assert!(set.get("cluster.nodes").is_some());
    }

    #[test]
    fn test_invalid_entity_name_fails() {
        let mut integration = Integration::new("test", "0.0.1");
        let err = set_metrics_response(
            &mut integration,
            &ClusterResponse::default(),
            "",
            "cluster",
        )
        .unwrap_err();
        assert!(matches!(err, CollectError::EntityCreation { .. }));
    }
}
