//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use broker::BrokerConfig;
use resilience::CallGuardConfig;
use selection::SelectionWeights;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `BROKER_URL` — message broker endpoint (default: `"nats://localhost:4222"`)
/// - `BROKER_MAX_RECONNECT_ATTEMPTS`, `BROKER_BACKOFF_BASE_MS`,
///   `BROKER_BACKOFF_CAP_MS`, `BROKER_BUFFER_CAPACITY` — broker client tuning
/// - `BREAKER_FAILURE_THRESHOLD`, `BREAKER_COOLDOWN_SECS`,
///   `CALL_TIMEOUT_MS`, `RETRY_MAX_ATTEMPTS` — outbound call guard tuning
/// - `SELECTION_WEIGHT_DISTANCE`, `SELECTION_WEIGHT_COST`,
///   `SELECTION_WEIGHT_QUALITY`, `SELECTION_WEIGHT_AVAILABILITY` — ranking weights
/// - `RESERVATION_TTL_SECS` — pending hold lifetime (default: 24 hours)
/// - `EXPIRY_SWEEP_INTERVAL_SECS` — background sweep cadence (default: 60)
///
/// Unset variables fall back to defaults; a variable that is set but
/// unparseable is a startup error.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub broker_url: String,
    pub broker: BrokerConfig,
    pub guard: CallGuardConfig,
    pub weights: SelectionWeights,
    pub reservation_ttl: chrono::Duration,
    pub sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Config::default();

        config.host = env::var("HOST").unwrap_or(config.host);
        config.port = parse_env("PORT", config.port)?;
        config.log_level = env::var("RUST_LOG").unwrap_or(config.log_level);

        config.broker_url = env::var("BROKER_URL").unwrap_or(config.broker_url);
        config.broker.max_reconnect_attempts = parse_env(
            "BROKER_MAX_RECONNECT_ATTEMPTS",
            config.broker.max_reconnect_attempts,
        )?;
        config.broker.backoff_base =
            millis_env("BROKER_BACKOFF_BASE_MS", config.broker.backoff_base)?;
        config.broker.backoff_cap = millis_env("BROKER_BACKOFF_CAP_MS", config.broker.backoff_cap)?;
        config.broker.buffer_capacity =
            parse_env("BROKER_BUFFER_CAPACITY", config.broker.buffer_capacity)?;

        config.guard.breaker.failure_threshold = parse_env(
            "BREAKER_FAILURE_THRESHOLD",
            config.guard.breaker.failure_threshold,
        )?;
        config.guard.breaker.cooldown =
            secs_env("BREAKER_COOLDOWN_SECS", config.guard.breaker.cooldown)?;
        config.guard.call_timeout = millis_env("CALL_TIMEOUT_MS", config.guard.call_timeout)?;
        config.guard.retry.max_attempts =
            parse_env("RETRY_MAX_ATTEMPTS", config.guard.retry.max_attempts)?;

        config.weights = SelectionWeights {
            distance: parse_env("SELECTION_WEIGHT_DISTANCE", config.weights.distance)?,
            cost: parse_env("SELECTION_WEIGHT_COST", config.weights.cost)?,
            quality: parse_env("SELECTION_WEIGHT_QUALITY", config.weights.quality)?,
            availability: parse_env("SELECTION_WEIGHT_AVAILABILITY", config.weights.availability)?,
        };

        let ttl_secs = parse_env("RESERVATION_TTL_SECS", config.reservation_ttl.num_seconds())?;
        config.reservation_ttl = chrono::Duration::seconds(ttl_secs);
        config.sweep_interval = secs_env("EXPIRY_SWEEP_INTERVAL_SECS", config.sweep_interval)?;

        Ok(config)
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            broker_url: "nats://localhost:4222".to_string(),
            broker: BrokerConfig::default(),
            guard: CallGuardConfig::default(),
            weights: SelectionWeights::default(),
            reservation_ttl: chrono::Duration::hours(24),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| format!("invalid {name}={raw}: {err}")),
        Err(_) => Ok(default),
    }
}

fn millis_env(name: &str, default: Duration) -> Result<Duration, String> {
    Ok(Duration::from_millis(parse_env(
        name,
        default.as_millis() as u64,
    )?))
}

fn secs_env(name: &str, default: Duration) -> Result<Duration, String> {
    Ok(Duration::from_secs(parse_env(name, default.as_secs())?))
}
