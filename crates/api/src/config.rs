//! Application configuration loaded from environment variables.

use std::str::FromStr;

use domain::TransitionPolicy;
use saga::WorkflowConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL URL; in-memory storage when unset
/// - `EVENT_BUS_CAPACITY`: messages a slow consumer may fall behind (default: `1024`)
/// - `COMPENSATE_PARTIAL_RESERVATIONS`: release earlier reservations when
///   order creation fails part-way (default: `true`)
/// - `ENFORCE_STATUS_TRANSITIONS`: reject status changes the transition
///   table forbids (default: `true`)
/// - `AUTO_PAYMENT`: charge every new order through the payment mock (default: `false`)
/// - `SEED_DEMO_DATA`: load demo users, products and stock at startup (default: `false`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub event_bus_capacity: usize,
    pub compensate_partial_reservations: bool,
    pub enforce_status_transitions: bool,
    pub auto_payment: bool,
    pub seed_demo_data: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parsed(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            event_bus_capacity: parsed(&lookup, "EVENT_BUS_CAPACITY")
                .filter(|c| *c > 0)
                .unwrap_or(defaults.event_bus_capacity),
            compensate_partial_reservations: flag(&lookup, "COMPENSATE_PARTIAL_RESERVATIONS")
                .unwrap_or(defaults.compensate_partial_reservations),
            enforce_status_transitions: flag(&lookup, "ENFORCE_STATUS_TRANSITIONS")
                .unwrap_or(defaults.enforce_status_transitions),
            auto_payment: flag(&lookup, "AUTO_PAYMENT").unwrap_or(defaults.auto_payment),
            seed_demo_data: flag(&lookup, "SEED_DEMO_DATA").unwrap_or(defaults.seed_demo_data),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the workflow switches derived from this configuration.
    pub fn workflow(&self) -> WorkflowConfig {
        WorkflowConfig {
            compensate_partial_reservations: self.compensate_partial_reservations,
            transition_policy: if self.enforce_status_transitions {
                TransitionPolicy::Strict
            } else {
                TransitionPolicy::Permissive
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            event_bus_capacity: 1024,
            compensate_partial_reservations: true,
            enforce_status_transitions: true,
            auto_payment: false,
            seed_demo_data: false,
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    match lookup(key)?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
