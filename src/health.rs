//! Service health monitor.
//!
//! Probes every registered service with `GET <base>/api/health` and
//! publishes the resulting [`StatusMap`] through a `tokio::sync::watch`
//! channel. A sweep probes all services concurrently and waits for every
//! probe to settle; one slow or dead service cannot stall or hide another.
//!
//! ```text
//!   interval tick ──► sweep() ──► join_all(probe × 12) ──► watch::send_replace
//!        ▲                                                        │
//!        └──────────────── health_interval ◄──────────────────────┘
//! ```
//!
//! Consumers only ever see complete maps: the map is replaced after a sweep
//! finishes, never patched probe by probe.

use crate::config::ClientConfig;
use crate::error::DocdashError;
use crate::registry::{ServiceRegistry, ToolId};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Last known liveness of one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// No sweep has completed yet.
    Checking,
    Online,
    Offline,
}

impl ServiceStatus {
    pub fn is_online(self) -> bool {
        self == ServiceStatus::Online
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Checking => "checking",
            ServiceStatus::Online => "online",
            ServiceStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of every registered tool. Always has one entry per [`ToolId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusMap(BTreeMap<ToolId, ServiceStatus>);

impl StatusMap {
    /// Every tool in `checking`.
    pub fn checking() -> Self {
        Self::uniform(ServiceStatus::Checking)
    }

    /// Every tool set to the same status.
    pub fn uniform(status: ServiceStatus) -> Self {
        Self(ToolId::ALL.into_iter().map(|t| (t, status)).collect())
    }

    pub fn get(&self, tool: ToolId) -> ServiceStatus {
        self.0
            .get(&tool)
            .copied()
            .unwrap_or(ServiceStatus::Checking)
    }

    pub fn set(&mut self, tool: ToolId, status: ServiceStatus) {
        self.0.insert(tool, status);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToolId, ServiceStatus)> + '_ {
        self.0.iter().map(|(t, s)| (*t, *s))
    }

    pub fn online_count(&self) -> usize {
        self.0.values().filter(|s| s.is_online()).count()
    }
}

impl Default for StatusMap {
    fn default() -> Self {
        Self::checking()
    }
}

impl FromIterator<(ToolId, ServiceStatus)> for StatusMap {
    fn from_iter<I: IntoIterator<Item = (ToolId, ServiceStatus)>>(iter: I) -> Self {
        let mut map = Self::checking();
        for (tool, status) in iter {
            map.set(tool, status);
        }
        map
    }
}

/// Periodically probes every service in a [`ServiceRegistry`].
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    client: reqwest::Client,
    config: ClientConfig,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ServiceRegistry>, config: ClientConfig) -> Result<Self, DocdashError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.probe_timeout())
            .build()
            .map_err(|e| DocdashError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            registry,
            client,
            config,
        })
    }

    /// Probe one service. A 2xx within the probe timeout is `online`
    /// unless the body reports `"status": "degraded"` or `"unhealthy"`
    /// (the service is up but missing a library it needs to do work).
    /// Every other outcome is `offline`.
    pub async fn probe(&self, tool: ToolId) -> ServiceStatus {
        let url = self.registry.get(tool).health_url();
        let request = async {
            let resp = self.client.get(&url).send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        match time::timeout(self.config.probe_timeout(), request).await {
            Ok(Ok((status, body))) if status.is_success() => match unhealthy_state(&body) {
                Some(state) => {
                    debug!("{} health reports '{}'", tool, state);
                    ServiceStatus::Offline
                }
                None => ServiceStatus::Online,
            },
            Ok(Ok((status, _))) => {
                debug!("{} health returned HTTP {}", tool, status.as_u16());
                ServiceStatus::Offline
            }
            Ok(Err(e)) => {
                debug!("{} health probe failed: {}", tool, e);
                ServiceStatus::Offline
            }
            Err(_) => {
                debug!(
                    "{} health probe timed out after {}ms",
                    tool, self.config.probe_timeout_ms
                );
                ServiceStatus::Offline
            }
        }
    }

    /// Probe every service concurrently and wait for all of them.
    pub async fn sweep(&self) -> StatusMap {
        let probes = self.registry.iter().map(|d| {
            let tool = d.id;
            async move { (tool, self.probe(tool).await) }
        });
        let map: StatusMap = join_all(probes).await.into_iter().collect();
        debug!(
            "Health sweep: {}/{} online",
            map.online_count(),
            self.registry.len()
        );
        map
    }

    /// Sweep now, then every `health_interval`, publishing each complete map.
    ///
    /// Returns when every receiver has been dropped.
    pub async fn run(self, tx: watch::Sender<StatusMap>) {
        let mut ticker = time::interval(self.config.health_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_online: Option<usize> = None;

        loop {
            ticker.tick().await;
            let map = self.sweep().await;

            let online = map.online_count();
            if last_online != Some(online) {
                info!("{}/{} services online", online, self.registry.len());
                last_online = Some(online);
            }

            tx.send_replace(map);
            if tx.is_closed() {
                warn!("All status receivers dropped; stopping health monitor");
                return;
            }
        }
    }

    /// Start [`run`](Self::run) on the current runtime.
    ///
    /// The receiver starts with every tool in `checking`.
    pub fn spawn(self) -> (watch::Receiver<StatusMap>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(StatusMap::checking());
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }
}

/// The `status` field of a health body, when it says the service cannot
/// do work. Non-JSON bodies and other values count as healthy.
fn unhealthy_state(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let state = value.get("status")?.as_str()?;
    ["degraded", "unhealthy"]
        .iter()
        .any(|s| state.eq_ignore_ascii_case(s))
        .then(|| state.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_map_is_all_checking() {
        let map = StatusMap::default();
        assert_eq!(map.iter().count(), ToolId::ALL.len());
        assert!(map.iter().all(|(_, s)| s == ServiceStatus::Checking));
        assert_eq!(map.online_count(), 0);
    }

    #[test]
    fn collecting_partial_results_keeps_every_tool() {
        let map: StatusMap = [(ToolId::PdfMerge, ServiceStatus::Online)]
            .into_iter()
            .collect();
        assert_eq!(map.get(ToolId::PdfMerge), ServiceStatus::Online);
        assert_eq!(map.get(ToolId::Plagiarism), ServiceStatus::Checking);
        assert_eq!(map.iter().count(), ToolId::ALL.len());
    }

    #[test]
    fn degraded_health_body_is_unhealthy() {
        assert_eq!(
            unhealthy_state(br#"{"status":"degraded","error":"No module named 'fitz'"}"#).as_deref(),
            Some("degraded")
        );
        assert_eq!(
            unhealthy_state(br#"{"status":"unhealthy","engines":[]}"#).as_deref(),
            Some("unhealthy")
        );
        assert_eq!(unhealthy_state(br#"{"status":"healthy"}"#), None);
        assert_eq!(unhealthy_state(b"OK"), None);
        assert_eq!(unhealthy_state(br#"{"service":"x"}"#), None);
    }

    #[test]
    fn status_serialises_lowercase() {
        let json = serde_json::to_string(&StatusMap::uniform(ServiceStatus::Offline)).unwrap();
        assert!(json.contains("\"pdf-merge\":\"offline\""), "got: {json}");
    }

    #[tokio::test]
    async fn unreachable_services_are_offline() {
        // Port 9 (discard) on loopback: nothing listens there in CI.
        let registry = ServiceRegistry::builder()
            .host("http://127.0.0.1")
            .base_url(ToolId::PdfToWord, "http://127.0.0.1:9")
            .build()
            .unwrap();
        let monitor = HealthMonitor::new(
            Arc::new(registry),
            ClientConfig::builder().probe_timeout_ms(200).build().unwrap(),
        )
        .unwrap();
        assert_eq!(monitor.probe(ToolId::PdfToWord).await, ServiceStatus::Offline);
    }
}
