use std::time::Duration;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read once at startup from the environment. Every value has a default so a
// bare `cargo run` against local ScyllaDB and Redpanda works.
//
// ============================================================================

pub const ENV_ORDER_STORE: &str = "ORDER_STORE";
pub const ENV_SCYLLA_NODES: &str = "SCYLLA_NODES";
pub const ENV_SCYLLA_KEYSPACE: &str = "SCYLLA_KEYSPACE";
pub const ENV_REMINDER_SINK: &str = "REMINDER_SINK";
pub const ENV_REDPANDA_BROKERS: &str = "REDPANDA_BROKERS";
pub const ENV_REMINDER_TOPIC: &str = "REMINDER_TOPIC";
pub const ENV_REMINDER_RECIPIENT: &str = "REMINDER_RECIPIENT";
pub const ENV_SCAN_INTERVAL_SECS: &str = "SCAN_INTERVAL_SECS";
pub const ENV_SCAN_LOOKAHEAD_DAYS: &str = "SCAN_LOOKAHEAD_DAYS";
pub const ENV_HTTP_PORT: &str = "HTTP_PORT";
pub const ENV_METRICS_PORT: &str = "METRICS_PORT";

/// Ten years. Keeps `now + lookahead` well inside the calendar range.
pub const MAX_LOOKAHEAD_DAYS: u64 = 3650;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{raw}'")]
    NotPositive { key: &'static str, raw: String },

    #[error("{key} must be one of {allowed}, got '{raw}'")]
    UnknownChoice {
        key: &'static str,
        allowed: &'static str,
        raw: String,
    },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("{key} must be at most {max}, got '{raw}'")]
    TooLarge {
        key: &'static str,
        max: u64,
        raw: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Scylla,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSink {
    Redpanda,
    Log,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub scylla_nodes: Vec<String>,
    pub scylla_keyspace: String,
    pub reminder_sink: ReminderSink,
    pub redpanda_brokers: String,
    pub reminder_topic: String,
    pub reminder_recipient: Option<String>,
    pub scan_interval: Duration,
    pub scan_lookahead_days: i64,
    pub http_port: u16,
    pub metrics_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Scylla,
            scylla_nodes: vec!["127.0.0.1:9042".to_string()],
            scylla_keyspace: "orders_ks".to_string(),
            reminder_sink: ReminderSink::Redpanda,
            redpanda_brokers: "127.0.0.1:9092".to_string(),
            reminder_topic: "order-reminders".to_string(),
            reminder_recipient: None,
            scan_interval: Duration::from_secs(60),
            scan_lookahead_days: 3,
            http_port: 5000,
            metrics_port: 9090,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading keys through `get_env`.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store = match non_empty(&get_env, ENV_ORDER_STORE)?.as_deref() {
            None => defaults.store,
            Some("scylla") => StoreBackend::Scylla,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::UnknownChoice {
                    key: ENV_ORDER_STORE,
                    allowed: "scylla, memory",
                    raw: other.to_string(),
                })
            }
        };

        let reminder_sink = match non_empty(&get_env, ENV_REMINDER_SINK)?.as_deref() {
            None => defaults.reminder_sink,
            Some("redpanda") => ReminderSink::Redpanda,
            Some("log") => ReminderSink::Log,
            Some(other) => {
                return Err(ConfigError::UnknownChoice {
                    key: ENV_REMINDER_SINK,
                    allowed: "redpanda, log",
                    raw: other.to_string(),
                })
            }
        };

        let scylla_nodes = match non_empty(&get_env, ENV_SCYLLA_NODES)? {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|node| !node.is_empty())
                .map(String::from)
                .collect(),
            None => defaults.scylla_nodes,
        };

        let scan_interval_secs = parse_positive(
            &get_env,
            ENV_SCAN_INTERVAL_SECS,
            defaults.scan_interval.as_secs(),
        )?;
        let scan_lookahead_days = parse_positive(
            &get_env,
            ENV_SCAN_LOOKAHEAD_DAYS,
            defaults.scan_lookahead_days as u64,
        )?;
        if scan_lookahead_days > MAX_LOOKAHEAD_DAYS {
            return Err(ConfigError::TooLarge {
                key: ENV_SCAN_LOOKAHEAD_DAYS,
                max: MAX_LOOKAHEAD_DAYS,
                raw: scan_lookahead_days.to_string(),
            });
        }

        Ok(Self {
            store,
            scylla_nodes,
            scylla_keyspace: non_empty(&get_env, ENV_SCYLLA_KEYSPACE)?
                .unwrap_or(defaults.scylla_keyspace),
            reminder_sink,
            redpanda_brokers: non_empty(&get_env, ENV_REDPANDA_BROKERS)?
                .unwrap_or(defaults.redpanda_brokers),
            reminder_topic: non_empty(&get_env, ENV_REMINDER_TOPIC)?
                .unwrap_or(defaults.reminder_topic),
            reminder_recipient: get_env(ENV_REMINDER_RECIPIENT)
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            scan_interval: Duration::from_secs(scan_interval_secs),
            scan_lookahead_days: scan_lookahead_days as i64,
            http_port: parse_port(&get_env, ENV_HTTP_PORT, defaults.http_port)?,
            metrics_port: parse_port(&get_env, ENV_METRICS_PORT, defaults.metrics_port)?,
        })
    }
}

/// `None` when unset; an error when set to blank.
fn non_empty<F>(get_env: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Err(ConfigError::Empty { key }),
        Some(raw) => Ok(Some(raw.trim().to_string())),
    }
}

fn parse_positive<F>(get_env: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get_env(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::NotPositive { key, raw }),
    }
}

fn parse_port<F>(get_env: &F, key: &'static str, default: u16) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_positive(get_env, key, u64::from(default))?;
    u16::try_from(value).map_err(|_| ConfigError::NotPositive {
        key,
        raw: value.to_string(),
    })
}
