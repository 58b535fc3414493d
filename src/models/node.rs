use std::collections::BTreeMap;

use serde::Deserialize;

use super::IndexActivity;
use crate::metrics::{MarshalMetrics, MetricSet};

/// `GET /_nodes/stats`. Keyed by node id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeResponse {
    pub nodes: BTreeMap<String, NodeStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeStats {
    pub name: Option<String>,
    pub host: Option<String>,
    pub ip: Option<String>,
    pub indices: Option<IndexActivity>,
    pub jvm: Option<Jvm>,
    pub os: Option<Os>,
    pub process: Option<Process>,
    pub transport: Option<Transport>,
    pub http: Option<Http>,
    pub fs: Option<Fs>,
    pub thread_pool: BTreeMap<String, ThreadPool>,
    pub breakers: BTreeMap<String, Breaker>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmMem {
    pub heap_used_in_bytes: Option<i64>,
    pub heap_used_percent: Option<i64>,
    pub heap_committed_in_bytes: Option<i64>,
    pub heap_max_in_bytes: Option<i64>,
    pub non_heap_used_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmThreads {
    pub count: Option<i64>,
    pub peak_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GcCollector {
    pub collection_count: Option<i64>,
    pub collection_time_in_millis: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JvmGc {
    pub collectors: BTreeMap<String, GcCollector>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Jvm {
    pub mem: JvmMem,
    pub threads: JvmThreads,
    pub gc: JvmGc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OsCpu {
    pub percent: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OsMem {
    pub free_in_bytes: Option<i64>,
    pub used_in_bytes: Option<i64>,
    pub used_percent: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OsSwap {
    pub free_in_bytes: Option<i64>,
    pub used_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Os {
    pub cpu: OsCpu,
    pub mem: OsMem,
    pub swap: OsSwap,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessCpu {
    pub percent: Option<i64>,
    pub total_in_millis: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessMem {
    pub total_virtual_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Process {
    pub open_file_descriptors: Option<i64>,
    pub max_file_descriptors: Option<i64>,
    pub cpu: ProcessCpu,
    pub mem: ProcessMem,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transport {
    pub server_open: Option<i64>,
    pub rx_count: Option<i64>,
    pub rx_size_in_bytes: Option<i64>,
    pub tx_count: Option<i64>,
    pub tx_size_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Http {
    pub current_open: Option<i64>,
    pub total_opened: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FsTotal {
    pub total_in_bytes: Option<i64>,
    pub free_in_bytes: Option<i64>,
    pub available_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fs {
    pub total: FsTotal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadPool {
    pub threads: Option<i64>,
    pub queue: Option<i64>,
    pub active: Option<i64>,
    pub rejected: Option<i64>,
    pub completed: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Breaker {
    pub estimated_size_in_bytes: Option<i64>,
    pub limit_size_in_bytes: Option<i64>,
    pub tripped: Option<i64>,
}

impl MarshalMetrics for NodeStats {
    fn marshal_metrics(&self, set: &mut MetricSet) {
        set.attribute("node.name", self.name.as_deref());
        set.attribute("node.hostname", self.host.as_deref());
        set.attribute("node.ip", self.ip.as_deref());

        if let Some(indices) = &self.indices {
            indices.marshal_with_prefix("indices", set);
        }

        if let Some(jvm) = &self.jvm {
            set.gauge("jvm.mem.heapUsedInBytes", jvm.mem.heap_used_in_bytes);
            set.gauge("jvm.mem.usedPercent", jvm.mem.heap_used_percent);
            set.gauge("jvm.mem.heapCommittedInBytes", jvm.mem.heap_committed_in_bytes);
            set.gauge("jvm.mem.heapMaxInBytes", jvm.mem.heap_max_in_bytes);
            set.gauge("jvm.mem.nonHeapUsedInBytes", jvm.mem.non_heap_used_in_bytes);
            set.gauge("jvm.threads", jvm.threads.count);
            set.gauge("jvm.threadsPeak", jvm.threads.peak_count);
            for (collector, gc) in &jvm.gc.collectors {
                set.rate(
                    &format!("jvm.gc.{collector}.collections"),
                    gc.collection_count,
                );
                set.delta(
                    &format!("jvm.gc.{collector}.collectionTimeInMilliseconds"),
                    gc.collection_time_in_millis,
                );
            }
        }

        if let Some(os) = &self.os {
            set.gauge("os.cpuPercent", os.cpu.percent);
            set.gauge("os.memFreeInBytes", os.mem.free_in_bytes);
            set.gauge("os.memUsedInBytes", os.mem.used_in_bytes);
            set.gauge("os.memUsedPercent", os.mem.used_percent);
            set.gauge("os.swapFreeInBytes", os.swap.free_in_bytes);
            set.gauge("os.swapUsedInBytes", os.swap.used_in_bytes);
        }

        if let Some(process) = &self.process {
            set.gauge("process.openFileDescriptors", process.open_file_descriptors);
            set.gauge("process.maxFileDescriptors", process.max_file_descriptors);
            set.gauge("process.cpuPercent", process.cpu.percent);
            set.delta("process.cpuTimeInMilliseconds", process.cpu.total_in_millis);
            set.gauge("process.virtualMemoryInBytes", process.mem.total_virtual_in_bytes);
        }

        if let Some(transport) = &self.transport {
            set.gauge("transport.connectionsOpened", transport.server_open);
            set.rate("transport.packetsReceived", transport.rx_count);
            set.rate("transport.receivedInBytes", transport.rx_size_in_bytes);
            set.rate("transport.packetsSent", transport.tx_count);
            set.rate("transport.sentInBytes", transport.tx_size_in_bytes);
        }

        if let Some(http) = &self.http {
            set.gauge("http.currentOpenConnections", http.current_open);
            set.rate("http.openedConnections", http.total_opened);
        }

        if let Some(fs) = &self.fs {
            set.gauge("fs.totalSizeInBytes", fs.total.total_in_bytes);
            set.gauge("fs.unallocatedBytesInBytes", fs.total.free_in_bytes);
            set.gauge("fs.bytesAvailableJvmInBytes", fs.total.available_in_bytes);
        }

        for (pool, tp) in &self.thread_pool {
            set.gauge(&format!("threadpool.{pool}.threads"), tp.threads);
            set.gauge(&format!("threadpool.{pool}.queue"), tp.queue);
            set.gauge(&format!("threadpool.{pool}.active"), tp.active);
            set.rate(&format!("threadpool.{pool}.rejected"), tp.rejected);
            set.rate(&format!("threadpool.{pool}.completed"), tp.completed);
        }

        for (breaker, b) in &self.breakers {
            set.gauge(
                &format!("breakers.{breaker}.estimatedSizeInBytes"),
                b.estimated_size_in_bytes,
            );
            set.gauge(
                &format!("breakers.{breaker}.limitSizeInBytes"),
                b.limit_size_in_bytes,
            );
            set.rate(&format!("breakers.{breaker}.tripped"), b.tripped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricValue, SourceType};

    const NODES: &str = r#"{
        "cluster_name": "es",
        "nodes": {
            "z4kJ8bQXR": {
                "name": "node-1",
                "host": "10.0.0.5",
                "ip": "10.0.0.5:9300",
                "indices": {"docs": {"count": 1200, "deleted": 3}, "store": {"size_in_bytes": 4096}},
                "jvm": {
                    "mem": {"heap_used_in_bytes": 512, "heap_used_percent": 40},
                    "threads": {"count": 77},
                    "gc": {"collectors": {"young": {"collection_count": 9, "collection_time_in_millis": 120}}}
                },
                "thread_pool": {"search": {"threads": 4, "queue": 0, "rejected": 2}},
                "breakers": {"fielddata": {"estimated_size_in_bytes": 0, "limit_size_in_bytes": 1024, "tripped": 0}}
            }
        }
    }"#;

    #[test]
    fn test_node_response_decodes_and_marshals() {
        let resp: NodeResponse = serde_json::from_str(NODES).unwrap();
        assert_eq!(resp.nodes.len(), 1);
        let node = &resp.nodes["z4kJ8bQXR"];
        assert_eq!(node.name.as_deref(), Some("node-1"));

        let mut set = MetricSet::new("ElasticsearchNodeSample", Vec::new());
        set.marshal_metrics(node);

        assert_eq!(
            set.get("node.hostname").unwrap().value,
            MetricValue::Text("10.0.0.5".into())
        );
        assert_eq!(set.get("indices.docs").unwrap().value, MetricValue::Int(1200));
        assert_eq!(set.get("jvm.mem.usedPercent").unwrap().value, MetricValue::Int(40));
        assert_eq!(
            set.get("jvm.gc.young.collections").unwrap().source_type,
            SourceType::Rate
        );
        assert_eq!(
            set.get("threadpool.search.rejected").unwrap().value,
            MetricValue::Int(2)
        );
        assert!(set.get("breakers.fielddata.limitSizeInBytes").is_some());
        // no os/process/fs blocks in the payload
        assert!(set.get("os.cpuPercent").is_none());
        assert!(set.get("fs.totalSizeInBytes").is_none());
    }

    #[test]
    fn test_empty_node_has_no_points() {
        let mut set = MetricSet::new("ElasticsearchNodeSample", Vec::new());
        set.marshal_metrics(&NodeStats::default());
        assert!(set.is_empty());
    }
}
