//! Application configuration loaded from environment variables.

use std::str::FromStr;

use domain::{AccrualMode, LoyaltyConfig};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: Postgres connection string; in-memory store when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `LOYALTY_EARN_RATE`: currency units per earned point (default: `10000`)
/// - `LOYALTY_REDEEM_VALUE`: currency value of a redeemed point (default: `500`)
/// - `LOYALTY_HISTORY_LIMIT`: transactions shown with the balance (default: `20`)
/// - `LOYALTY_ACCRUAL`: `inline` or `background` (default: `inline`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub loyalty: LoyaltyConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let lookup = &lookup;

        let loyalty = LoyaltyConfig::new(
            parse_var(lookup, "LOYALTY_EARN_RATE").unwrap_or(defaults.loyalty.earn_rate),
            parse_var(lookup, "LOYALTY_REDEEM_VALUE").unwrap_or(defaults.loyalty.redeem_value),
            parse_var(lookup, "LOYALTY_HISTORY_LIMIT").unwrap_or(defaults.loyalty.history_limit),
            lookup("LOYALTY_ACCRUAL")
                .and_then(|v| v.parse::<AccrualMode>().ok())
                .unwrap_or_default(),
        );

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_var(lookup, "DATABASE_MAX_CONNECTIONS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.database_max_connections),
            loyalty,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 10,
            loyalty: LoyaltyConfig::default(),
        }
    }
}
