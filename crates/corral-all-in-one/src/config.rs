use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Host the UDP telemetry listener binds to
    #[serde(default = "default_udp_host")]
    pub udp_host: String,

    /// Port the UDP telemetry listener binds to
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,

    /// Host the HTTP API binds to
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// Port the HTTP API binds to
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Tags silent for longer than this many milliseconds are flipped offline
    #[serde(default = "default_hibernation_timeout_ms")]
    pub hibernation_timeout_ms: i64,

    /// How often the hibernation sweep runs, in milliseconds
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_udp_host() -> String {
    "0.0.0.0".to_string()
}

fn default_udp_port() -> u16 {
    7000
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_hibernation_timeout_ms() -> i64 {
    5_000
}

fn default_sweep_interval_ms() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("CORRAL"))
            .build()?
            .try_deserialize()
    }

    pub fn udp_bind_addr(&self) -> String {
        format!("{}:{}", self.udp_host, self.udp_port)
    }

    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
