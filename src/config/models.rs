//! Configuration data structures for the proxy binary and embedders.
//!
//! These types map directly to YAML (also JSON / TOML) configuration files and
//! include defaults so that a minimal config only needs a `target`.
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Ceilings for in-memory buffering.
///
/// Interception needs the complete response body in memory, and forwarding
/// copies the request body; both are capped so a single exchange cannot
/// exhaust memory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BodyLimits {
    /// Largest inbound request body that will be forwarded (bytes)
    pub max_request_body_bytes: usize,
    /// Largest upstream response body that will be buffered (bytes)
    pub max_response_body_bytes: usize,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 2 * 1024 * 1024,
            max_response_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Logging output settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProxyConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Bare hostname or full URL of the upstream
    pub target: String,
    #[serde(default)]
    pub limits: BodyLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProxyConfig {
    /// Create a new proxy configuration builder
    pub fn builder() -> ProxyConfigBuilder {
        ProxyConfigBuilder::default()
    }
}

/// Builder for ProxyConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct ProxyConfigBuilder {
    listen_addr: Option<String>,
    target: Option<String>,
    limits: Option<BodyLimits>,
    logging: Option<LoggingConfig>,
}

impl ProxyConfigBuilder {
    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the upstream target
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the buffering ceilings
    pub fn limits(mut self, limits: BodyLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set logging output
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the final ProxyConfig
    pub fn build(self) -> Result<ProxyConfig, String> {
        let target = self.target.ok_or_else(|| "target is required".to_string())?;

        Ok(ProxyConfig {
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            target,
            limits: self.limits.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        })
    }
}
