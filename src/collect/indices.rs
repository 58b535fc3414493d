//! Per-index publication: cross-reference with the common stats, filter by
//! name, then gate the whole batch on the cardinality limit.

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, info};

use super::{Flow, FlowReport};
use crate::client::{StatsClient, StatsEndpoint};
use crate::config::CollectConfig;
use crate::error::{CollectError, Result};
use crate::metrics::Integration;
use crate::models::{CommonMetrics, IndexStats, IndexSummary};
use crate::publish::set_metrics_response;

/// Most indices published in one run. Over this, none are.
pub const INDEX_LIMIT: usize = 100;

pub const INDEX_NAMESPACE: &str = "index";

pub async fn populate_indices_metrics<C: StatsClient>(
    integration: &mut Integration,
    client: &C,
    common: &CommonMetrics,
    config: &CollectConfig,
) -> Result<FlowReport> {
    info!("Collecting indices metrics");
    let indices: Vec<IndexStats> = client.request(StatsEndpoint::Indices).await?;

    let regex = build_regex(config.indices_regex.as_deref())?;

    set_indices_stats_metrics_response(integration, indices, common, regex.as_ref())
}

/// Compile the configured pattern. Absent or empty selects every index.
pub fn build_regex(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern {
        Some(p) if !p.is_empty() => Ok(Some(Regex::new(p)?)),
        _ => Ok(None),
    }
}

/// Exact, case-sensitive lookup of `name` in the common-stats index map.
pub fn get_index_from_common<'a>(
    name: &str,
    indices: &'a HashMap<String, IndexSummary>,
) -> Result<&'a IndexSummary> {
    indices
        .get(name)
        .ok_or_else(|| CollectError::IndexNotFound(name.to_string()))
}

/// Drop unnamed, non-matching and unknown indices, and those without both
/// store sizes; enrich the rest with their sizes. Input order is preserved.
pub fn select_indices(
    records: Vec<IndexStats>,
    common: &CommonMetrics,
    regex: Option<&Regex>,
    report: &mut FlowReport,
) -> Vec<(String, IndexStats)> {
    let mut selected = Vec::with_capacity(records.len());

    for mut record in records {
        let Some(name) = record.name.clone() else {
            report.skip("<unnamed>", CollectError::MissingIdentity("index"));
            continue;
        };

        if let Some(re) = regex {
            if !re.is_match(&name) {
                debug!(index = %name, "index does not match regex, skipping");
                report.filtered += 1;
                continue;
            }
        }

        let enriched = get_index_from_common(&name, &common.indices)
            .and_then(|summary| record.apply_summary(summary));
        if let Err(error) = enriched {
            report.skip(&name, error);
            continue;
        }

        selected.push((name, record));
    }

    selected
}

/// All-or-nothing: a truncated index set would look complete downstream.
pub fn enforce_index_limit(count: usize) -> Result<()> {
    if count > INDEX_LIMIT {
        return Err(CollectError::CardinalityExceeded {
            count,
            limit: INDEX_LIMIT,
        });
    }
    Ok(())
}

pub fn set_indices_stats_metrics_response(
    integration: &mut Integration,
    records: Vec<IndexStats>,
    common: &CommonMetrics,
    regex: Option<&Regex>,
) -> Result<FlowReport> {
    let mut report = FlowReport::new(Flow::Indices);

    let selected = select_indices(records, common, regex, &mut report);
    enforce_index_limit(selected.len())?;

    for (name, stats) in &selected {
        match set_metrics_response(integration, stats, name, INDEX_NAMESPACE) {
            Ok(()) => report.published += 1,
            Err(error) => report.skip(name, error),
        }
    }

    Ok(report)
}
