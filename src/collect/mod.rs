//! Collection orchestrator
//!
//! Runs the nodes, cluster, common and indices flows in that order. A failing
//! flow is logged and recorded in the [`RunSummary`]; it never stops the flows
//! after it. Within a flow, a failing record is recorded as [`Skipped`] and
//! its siblings are still published.

pub mod indices;

use std::fmt;

use tracing::{error, info};

use crate::client::{StatsClient, StatsEndpoint};
use crate::config::CollectConfig;
use crate::error::{CollectError, Result};
use crate::metrics::Integration;
use crate::models::{ClusterResponse, CommonMetrics, NodeResponse};
use crate::publish::set_metrics_response;

pub use indices::populate_indices_metrics;

/// Entity name of the cluster-wide primaries aggregate.
pub const COMMON_ENTITY_NAME: &str = "commonMetrics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Nodes,
    Cluster,
    Common,
    Indices,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nodes => "nodes",
            Self::Cluster => "cluster",
            Self::Common => "common",
            Self::Indices => "indices",
        })
    }
}

/// A record that was not published, and why.
#[derive(Debug)]
pub struct Skipped {
    pub identity: String,
    pub error: CollectError,
}

/// Outcome of a flow that got as far as publishing.
#[derive(Debug)]
pub struct FlowReport {
    pub flow: Flow,
    pub published: usize,
    /// Records left out by the indices regex
    pub filtered: usize,
    pub skipped: Vec<Skipped>,
}

impl FlowReport {
    pub fn new(flow: Flow) -> Self {
        Self {
            flow,
            published: 0,
            filtered: 0,
            skipped: Vec::new(),
        }
    }

    pub fn skip(&mut self, identity: impl Into<String>, error: CollectError) {
        self.skipped.push(Skipped {
            identity: identity.into(),
            error,
        });
    }
}

/// Per-flow outcomes of one run, in execution order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(Flow, Result<FlowReport>)>,
}

impl RunSummary {
    /// Store a flow outcome, logging its failure or skips.
    fn record(&mut self, flow: Flow, outcome: Result<FlowReport>) {
        match &outcome {
            Ok(report) => {
                for skipped in &report.skipped {
                    error!(
                        %flow,
                        identity = %skipped.identity,
                        error = %skipped.error,
                        "skipped record"
                    );
                }
                info!(
                    flow = %report.flow,
                    published = report.published,
                    filtered = report.filtered,
                    skipped = report.skipped.len(),
                    "flow complete"
                );
            }
            Err(e) => error!(%flow, error = %e, "There was an error populating metrics for {flow}"),
        }
        self.outcomes.push((flow, outcome));
    }

    pub fn published(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|(_, o)| o.as_ref().ok())
            .map(|r| r.published)
            .sum()
    }

    pub fn failed_flows(&self) -> Vec<Flow> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_err())
            .map(|(f, _)| *f)
            .collect()
    }
}

#[cfg(test)]
impl RunSummary {
    pub fn outcome(&self, flow: Flow) -> Option<&Result<FlowReport>> {
        self.outcomes
            .iter()
            .find(|(f, _)| *f == flow)
            .map(|(_, outcome)| outcome)
    }
}

// ─── Entry point ─────────────────────────────────────────────────

/// Run every flow once against `client`, publishing into `integration`.
pub async fn populate_metrics<C: StatsClient>(
    integration: &mut Integration,
    client: &C,
    config: &CollectConfig,
) -> RunSummary {
    let mut summary = RunSummary::default();

    let nodes = populate_nodes_metrics(integration, client).await;
    summary.record(Flow::Nodes, nodes);

    let cluster = populate_cluster_metrics(integration, client).await;
    summary.record(Flow::Cluster, cluster);

    // The indices flow needs the common response even if publishing it failed.
    let common = match fetch_common_metrics(client).await {
        Ok(common) => {
            let published = publish_common_metrics(integration, &common, config);
            summary.record(Flow::Common, published);
            Some(common)
        }
        Err(e) => {
            summary.record(Flow::Common, Err(e));
            None
        }
    };

    if config.collect_indices {
        let outcome = match &common {
            Some(common) => populate_indices_metrics(integration, client, common, config).await,
            None => Err(CollectError::CommonStatsUnavailable),
        };
        summary.record(Flow::Indices, outcome);
    }

    summary
}

// ─── Flows ───────────────────────────────────────────────────────

pub async fn populate_nodes_metrics<C: StatsClient>(
    integration: &mut Integration,
    client: &C,
) -> Result<FlowReport> {
    info!("Collecting node metrics");
    let resp: NodeResponse = client.request(StatsEndpoint::Nodes).await?;

    let mut report = FlowReport::new(Flow::Nodes);
    for (node_id, node) in &resp.nodes {
        match set_metrics_response(integration, node, node_id, "node") {
            Ok(()) => report.published += 1,
            Err(e) => report.skip(node_id, e),
        }
    }
    Ok(report)
}

pub async fn populate_cluster_metrics<C: StatsClient>(
    integration: &mut Integration,
    client: &C,
) -> Result<FlowReport> {
    info!("Collecting cluster metrics");
    let resp: ClusterResponse = client.request(StatsEndpoint::Cluster).await?;

    let name = resp
        .name
        .as_deref()
        .ok_or(CollectError::MissingIdentity("cluster"))?;
    set_metrics_response(integration, &resp, name, "cluster")?;

    let mut report = FlowReport::new(Flow::Cluster);
    report.published = 1;
    Ok(report)
}

pub async fn fetch_common_metrics<C: StatsClient>(client: &C) -> Result<CommonMetrics> {
    info!("Collecting common metrics");
    Ok(client.request(StatsEndpoint::Common).await?)
}

/// Publish the primaries aggregate when enabled.
pub fn publish_common_metrics(
    integration: &mut Integration,
    common: &CommonMetrics,
    config: &CollectConfig,
) -> Result<FlowReport> {
    let mut report = FlowReport::new(Flow::Common);
    if config.collect_primaries {
        set_metrics_response(integration, &common.all, COMMON_ENTITY_NAME, "common")?;
        report.published = 1;
    }
    Ok(report)
}
