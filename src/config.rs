use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;

// ─── Command line ────────────────────────────────────────────────

/// Polls Elasticsearch stats endpoints and prints metric samples as JSON.
#[derive(Parser, Debug, Clone)]
#[command(name = "elasticsearch-stats-collector", version, about)]
pub struct Args {
    /// Hostname or IP of the Elasticsearch node to query
    #[arg(long, env = "ES_HOSTNAME", default_value = "localhost")]
    pub hostname: String,

    /// Port the Elasticsearch REST API listens on
    #[arg(long, env = "ES_PORT", default_value_t = 9200)]
    pub port: u16,

    /// Username for HTTP basic auth
    #[arg(long, env = "ES_USERNAME")]
    pub username: Option<String>,

    /// Password for HTTP basic auth
    #[arg(long, env = "ES_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Talk to the cluster over https
    #[arg(long, env = "ES_USE_SSL")]
    pub use_ssl: bool,

    /// Extra PEM root certificate(s) to trust
    #[arg(long, env = "ES_CA_BUNDLE_FILE")]
    pub ca_bundle_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "ES_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Publish one entity per index
    #[arg(long, env = "ES_COLLECT_INDICES")]
    pub collect_indices: bool,

    /// Publish the cluster-wide primaries aggregate
    #[arg(long, env = "ES_COLLECT_PRIMARIES")]
    pub collect_primaries: bool,

    /// Only publish indices whose name matches this regex
    #[arg(long, env = "ES_INDICES_REGEX")]
    pub indices_regex: Option<String>,

    /// Collect every N seconds instead of once
    #[arg(long)]
    pub interval: Option<u64>,

    /// Indent the JSON payload
    #[arg(long)]
    pub pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

// ─── Validated configuration ─────────────────────────────────────

/// Everything the HTTP client needs to reach the cluster.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub hostname: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
    pub use_ssl: bool,
    pub ca_bundle_file: Option<PathBuf>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.hostname, self.port)
    }
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub collect: CollectConfig,
    /// `None` runs a single collection.
    pub interval: Option<Duration>,
    pub pretty: bool,
}

/// Switches that shape a collection run. Passed by reference into every flow.
#[derive(Debug, Clone, Default)]
pub struct CollectConfig {
    pub collect_indices: bool,
    pub collect_primaries: bool,
    /// Compiled by the indices flow, so a bad pattern only fails that flow.
    pub indices_regex: Option<String>,
}

impl Args {
    /// Validate the raw arguments and split them into client and collection settings.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::EmptyHostname);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.interval == Some(0) {
            return Err(ConfigError::InvalidInterval);
        }
        if self.ca_bundle_file.is_some() && !self.use_ssl {
            return Err(ConfigError::CaBundleWithoutSsl);
        }

        let credentials = match (self.username, self.password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteCredentials),
        };

        let client = ClientConfig {
            hostname: self.hostname,
            port: self.port,
            credentials,
            use_ssl: self.use_ssl,
            ca_bundle_file: self.ca_bundle_file,
            timeout: Duration::from_secs(self.timeout),
        };

        let collect = CollectConfig {
            collect_indices: self.collect_indices,
            collect_primaries: self.collect_primaries,
            indices_regex: self.indices_regex.filter(|r| !r.is_empty()),
        };

        Ok(Config {
            client,
            collect,
            interval: self.interval.map(Duration::from_secs),
            pretty: self.pretty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["elasticsearch-stats-collector"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config.client.base_url(), "http://localhost:9200");
        assert_eq!(config.client.timeout, Duration::from_secs(30));
        assert!(config.client.credentials.is_none());
        assert!(!config.collect.collect_indices);
        assert!(config.collect.indices_regex.is_none());
        assert!(config.interval.is_none());
    }

    #[test]
    fn test_ssl_and_credentials() {
        let client = parse(&[
            "--hostname",
            "es.local",
            "--port",
            "9243",
            "--use-ssl",
            "--username",
            "elastic",
            "--password",
            "changeme",
        ])
        .into_config()
        .unwrap()
        .client;
        assert_eq!(client.base_url(), "https://es.local:9243");
        assert_eq!(
            client.credentials,
            Some(("elastic".to_string(), "changeme".to_string()))
        );
    }

    #[test]
    fn test_rejects_half_credentials() {
        let err = parse(&["--username", "elastic"]).into_config().unwrap_err();
        assert_eq!(err, ConfigError::IncompleteCredentials);
    }

    #[test]
    fn test_rejects_ca_bundle_without_ssl() {
        let err = parse(&["--ca-bundle-file", "/tmp/ca.pem"])
            .into_config()
            .unwrap_err();
        assert_eq!(err, ConfigError::CaBundleWithoutSsl);
    }

    #[test]
    fn test_interval_mode() {
        let config = parse(&["--interval", "15"]).into_config().unwrap();
        assert_eq!(config.interval, Some(Duration::from_secs(15)));
        assert_eq!(
            parse(&["--interval", "0"]).into_config().unwrap_err(),
            ConfigError::InvalidInterval
        );
    }

    #[test]
    fn test_rejects_zero_port_and_timeout() {
        assert_eq!(
            parse(&["--port", "0"]).into_config().unwrap_err(),
            ConfigError::InvalidPort
        );
        assert_eq!(
            parse(&["--timeout", "0"]).into_config().unwrap_err(),
            ConfigError::InvalidTimeout
        );
    }

    #[test]
    fn test_empty_regex_selects_everything() {
        let collect = parse(&["--collect-indices", "--indices-regex", ""])
            .into_config()
            .unwrap()
            .collect;
        assert!(collect.collect_indices);
        assert!(collect.indices_regex.is_none());
    }
}
