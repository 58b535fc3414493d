use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::client::StatsClient;
use crate::collect::{populate_metrics, RunSummary};
use crate::config::CollectConfig;
use crate::metrics::{Integration, RequestTimings};

pub const INTEGRATION_NAME: &str = "elasticsearch-stats-collector";
pub const INTEGRATION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One collection run into a fresh `Integration`.
pub async fn collect_once<C: StatsClient>(
    client: &C,
    config: &CollectConfig,
    timings: &RequestTimings,
) -> (Integration, RunSummary) {
    let run_id = Uuid::new_v4();

    async {
        let mut integration = Integration::new(INTEGRATION_NAME, INTEGRATION_VERSION);
        let summary = populate_metrics(&mut integration, client, config).await;

        for snap in timings.snapshot() {
            debug!(
                endpoint = %snap.endpoint,
                requests = snap.requests,
                failures = snap.failures,
                p50_us = snap.p50_us,
                p99_us = snap.p99_us,
                max_us = snap.max_us,
                "request latency"
            );
        }
        info!(
            entities = integration.entities().len(),
            published = summary.published(),
            failed_flows = summary.failed_flows().len(),
            "collection finished"
        );

        (integration, summary)
    }
    .instrument(info_span!("collect", %run_id))
    .await
}

/// Serialize a finished run for stdout.
pub fn render(integration: &Integration, pretty: bool) -> serde_json::Result<String> {
    let payload = integration.payload();
    if pretty {
        serde_json::to_string_pretty(&payload)
    } else {
        serde_json::to_string(&payload)
    }
}

/// Write one rendered payload as a single line of `out`.
pub fn emit<W: Write>(out: &mut W, integration: &Integration, pretty: bool) -> anyhow::Result<()> {
    writeln!(out, "{}", render(integration, pretty)?)?;
    out.flush()?;
    Ok(())
}

pub async fn run_once<C: StatsClient>(
    client: &C,
    config: &CollectConfig,
    timings: &RequestTimings,
    pretty: bool,
) -> anyhow::Result<()> {
    let (integration, _) = collect_once(client, config, timings).await;
    emit(&mut io::stdout().lock(), &integration, pretty)
}

/// Collect every `period` until Ctrl-C.
pub async fn run_every<C: StatsClient>(
    period: Duration,
    client: &C,
    config: &CollectConfig,
    timings: &RequestTimings,
    pretty: bool,
) -> anyhow::Result<()> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    run_until(period, client, config, timings, pretty, &mut io::stdout(), shutdown).await;
    Ok(())
}

/// Collect every `period` into `out` until `shutdown` resolves. A slow run
/// delays the next tick instead of queueing a burst; a run whose payload
/// cannot be written is logged and the loop carries on.
pub async fn run_until<C, W, F>(
    period: Duration,
    client: &C,
    config: &CollectConfig,
    timings: &RequestTimings,
    pretty: bool,
    out: &mut W,
    shutdown: F,
) -> usize
where
    C: StatsClient,
    W: Write,
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = IntervalStream::new(interval);
    tokio::pin!(shutdown);

    info!(period_secs = period.as_secs(), "collecting on an interval");
    let mut runs = 0;
    loop {
        tokio::select! {
            tick = ticks.next() => {
                if tick.is_none() {
                    break;
                }
                let (integration, _) = collect_once(client, config, timings).await;
                runs += 1;
                if let Err(e) = emit(out, &integration, pretty) {
                    error!(error = %e, "could not write payload");
                }
            }
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixture::FixtureClient;
    use crate::client::StatsEndpoint;

    #[tokio::test]
    async fn test_collect_once_renders_payload() {
        let client = FixtureClient::new()
            .with(StatsEndpoint::Nodes, r#"{"nodes": {"n1": {"name": "node-1"}}}"#)
            .with(StatsEndpoint::Cluster, r#"{"cluster_name": "prod"}"#)
            .with(StatsEndpoint::Common, r#"{"_all": {}, "indices": {}}"#);
        let timings = RequestTimings::new();

        let (integration, summary) =
            collect_once(&client, &CollectConfig::default(), &timings).await;
        assert!(summary.failed_flows().is_empty());

        let json: serde_json::Value =
            serde_json::from_str(&render(&integration, false).unwrap()).unwrap();
        assert_eq!(json["name"], INTEGRATION_NAME);
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["metrics"][0]["event_type"], "ElasticsearchNodeSample");
        assert_eq!(data[0]["metrics"][0]["entityName"], "node:n1");
        assert_eq!(data[1]["metrics"][0]["event_type"], "ElasticsearchClusterSample");
    }

    #[tokio::test]
    async fn test_each_run_starts_empty() {
        let client = FixtureClient::new().with(StatsEndpoint::Cluster, r#"{"cluster_name": "c"}"#);
        let timings = RequestTimings::new();
        let config = CollectConfig::default();

        let (first, _) = collect_once(&client, &config, &timings).await;
        let (second, _) = collect_once(&client, &config, &timings).await;

        assert_eq!(first.entities().len(), 1);
        assert_eq!(second.entities().len(), 1);
        assert_eq!(second.entities()[0].metrics.len(), 1);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_writes_one_line_per_run() {
        let client = FixtureClient::new().with(StatsEndpoint::Cluster, r#"{"cluster_name": "c"}"#);
        let timings = RequestTimings::new();
        let mut out = Vec::new();

        let shutdown = tokio::time::sleep(Duration::from_millis(35));
        let runs = run_until(
            Duration::from_millis(10),
            &client,
            &CollectConfig::default(),
            &timings,
            false,
            &mut out,
            shutdown,
        )
        .await;

        assert!(runs >= 3);
        let lines: Vec<&str> = std::str::from_utf8(&out).unwrap().lines().collect();
        assert_eq!(lines.len(), runs);
        for line in lines {
            let json: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(json["data"].as_array().unwrap().len(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_does_not_stop_interval() {
        let client = FixtureClient::new().with(StatsEndpoint::Cluster, r#"{"cluster_name": "c"}"#);
        let timings = RequestTimings::new();

        let shutdown = tokio::time::sleep(Duration::from_millis(35));
        let runs = run_until(
            Duration::from_millis(10),
            &client,
            &CollectConfig::default(),
            &timings,
            false,
            &mut BrokenPipe,
            shutdown,
        )
        .await;

        assert!(runs >= 3);
        assert!(emit(&mut BrokenPipe, &Integration::new("t", "0"), false).is_err());
    }

    #[test]
    fn test_pretty_render_is_indented() {
        let integration = Integration::new(INTEGRATION_NAME, INTEGRATION_VERSION);
        let out = render(&integration, true).unwrap();
        assert!(out.contains("\n  \"name\""));
        assert!(out.contains("\"data\": []"));
    }
}
