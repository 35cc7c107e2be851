//! Client configuration.
//!
//! All timing knobs for the health monitor and the dispatcher live in
//! [`ClientConfig`], built via [`ClientConfigBuilder`]. The endpoint map
//! itself is not configuration: it lives in [`crate::registry`].

use crate::error::DocdashError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Configuration shared by the health monitor and the dispatcher.
///
/// # Example
/// ```rust
/// use docdash::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .probe_timeout_ms(500)
///     .health_interval_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.probe_timeout_ms, 500);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Per-probe timeout for health checks, in milliseconds. Range: 1–999. Default: 800.
    ///
    /// A probe that has not answered in time counts as `offline`.
    pub probe_timeout_ms: u64,

    /// Delay between health sweeps, in seconds. Default: 30.
    pub health_interval_secs: u64,

    /// TCP connect timeout for dispatch requests, in seconds. Default: 10.
    ///
    /// Only the connect phase is bounded; once a request is sent it runs to
    /// completion (conversion jobs can take minutes).
    pub connect_timeout_secs: u64,

    /// Synthetic progress: increment per tick, in percent. Default: 10.
    pub progress_step: u8,

    /// Synthetic progress: tick period, in milliseconds. Default: 300.
    pub progress_tick_ms: u64,

    /// Synthetic progress: value held until the response arrives. Range: 1–99. Default: 90.
    pub progress_cap: u8,

    /// Optional progress sink for dispatches.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 800,
            health_interval_secs: 30,
            connect_timeout_secs: 10,
            progress_step: 10,
            progress_tick_ms: 300,
            progress_cap: 90,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("probe_timeout_ms", &self.probe_timeout_ms)
            .field("health_interval_secs", &self.health_interval_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("progress_step", &self.progress_step)
            .field("progress_tick_ms", &self.progress_tick_ms)
            .field("progress_cap", &self.progress_cap)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn DispatchProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn probe_timeout_ms(mut self, ms: u64) -> Self {
        self.config.probe_timeout_ms = ms;
        self
    }

    pub fn health_interval_secs(mut self, secs: u64) -> Self {
        self.config.health_interval_secs = secs.max(1);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_step(mut self, step: u8) -> Self {
        self.config.progress_step = step.max(1);
        self
    }

    pub fn progress_tick_ms(mut self, ms: u64) -> Self {
        self.config.progress_tick_ms = ms.max(10);
        self
    }

    pub fn progress_cap(mut self, cap: u8) -> Self {
        self.config.progress_cap = cap;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, DocdashError> {
        let c = &self.config;
        if c.probe_timeout_ms == 0 || c.probe_timeout_ms >= 1000 {
            return Err(DocdashError::InvalidConfig(format!(
                "probe timeout must be 1–999 ms, got {}",
                c.probe_timeout_ms
            )));
        }
        if c.progress_cap == 0 || c.progress_cap >= 100 {
            return Err(DocdashError::InvalidConfig(format!(
                "progress cap must be 1–99, got {}",
                c.progress_cap
            )));
        }
        Ok(self.config)
    }
}
