use crate::alert_feed::DEFAULT_FEED_CAPACITY;
use crate::classifier::Thresholds;
use crate::merge::DEFAULT_NOMINAL_TEMPERATURE;
use crate::models::ZoneTopologyEntry;
use crate::telemetry_repo::DEFAULT_REQUEST_TIMEOUT;
use crate::topology::{NodeResolver, Topology};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub polling: PollingConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Omitted: built-in seven-zone layout with nodes N01..N07.
    #[serde(default)]
    pub topology: Option<TopologyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// e.g. "http://127.0.0.1:8000/api"; /nodeData/ and /nodeHistory/ are appended.
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// How often to log poll counters at INFO level.
    pub stats_log_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
    /// Demo trigger; unset disables synthetic SOS events.
    #[serde(default)]
    pub synthetic_sos_interval_secs: Option<u64>,
}

fn default_feed_capacity() -> usize {
    DEFAULT_FEED_CAPACITY
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            feed_capacity: default_feed_capacity(),
            synthetic_sos_interval_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max notifications buffered per /ws/notifications client (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Temperature shown for zones without a usable reading.
    #[serde(default = "default_nominal_temperature")]
    pub nominal_temperature: f64,
}

fn default_nominal_temperature() -> f64 {
    DEFAULT_NOMINAL_TEMPERATURE
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            nominal_temperature: default_nominal_temperature(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    pub zones: Vec<ZoneTopologyEntry>,
    #[serde(default)]
    pub node_map: BTreeMap<String, String>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Topology table and resolver, validated together.
    pub fn build_topology(&self) -> anyhow::Result<(Topology, NodeResolver)> {
        match &self.topology {
            None => Ok((Topology::builtin(), NodeResolver::builtin())),
            Some(t) => {
                let topology = Topology::new(t.zones.clone())?;
                let resolver = NodeResolver::new(t.node_map.clone(), &topology)?;
                Ok((topology, resolver))
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.telemetry.base_url.starts_with("http://")
                || self.telemetry.base_url.starts_with("https://"),
            "telemetry.base_url must be an http(s) URL, got {:?}",
            self.telemetry.base_url
        );
        anyhow::ensure!(
            self.telemetry.request_timeout_ms > 0,
            "telemetry.request_timeout_ms must be > 0, got {}",
            self.telemetry.request_timeout_ms
        );
        anyhow::ensure!(
            self.polling.interval_ms > 0,
            "polling.interval_ms must be > 0, got {}",
            self.polling.interval_ms
        );
        anyhow::ensure!(
            self.polling.stats_log_interval_secs > 0,
            "polling.stats_log_interval_secs must be > 0, got {}",
            self.polling.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.alerts.feed_capacity > 0,
            "alerts.feed_capacity must be > 0, got {}",
            self.alerts.feed_capacity
        );
        if let Some(secs) = self.alerts.synthetic_sos_interval_secs {
            anyhow::ensure!(
                secs > 0,
                "alerts.synthetic_sos_interval_secs must be > 0 when set, got {}",
                secs
            );
        }
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        let t = &self.thresholds;
        anyhow::ensure!(
            t.warning_pm25 <= t.danger_pm25,
            "thresholds.warning_pm25 ({}) must not exceed thresholds.danger_pm25 ({})",
            t.warning_pm25,
            t.danger_pm25
        );
        anyhow::ensure!(
            self.dashboard.nominal_temperature.is_finite(),
            "dashboard.nominal_temperature must be finite"
        );
        self.build_topology()?;
        Ok(())
    }
}
