//! Process-wide configuration, read once from the environment at startup.
//!
//! The resulting [`Config`] is immutable and passed explicitly into the
//! backend and server constructors; per-request code never touches the
//! environment.

use storm_api_query::filter::Limits;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable required by the selected backend is unset.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing variable.
        name: String,
    },

    /// A variable is set to an unusable value.
    #[error("Invalid value for {name}: '{value}'")]
    Invalid {
        /// Name of the variable.
        name: String,
        /// The offending value.
        value: String,
    },
}

/// Which backend variant serves queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// AWS Athena over the Glue table.
    Athena,
    /// `DuckDB` over local Parquet files.
    DuckDb,
}

/// Athena connection settings.
#[derive(Debug, Clone)]
pub struct AthenaConfig {
    /// AWS region.
    pub region: String,
    /// Athena workgroup.
    pub workgroup: String,
    /// Glue database name.
    pub database: String,
    /// Storm events table name.
    pub table: String,
    /// S3 location for query output.
    pub output_s3: String,
    /// Fixed poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Poll deadline in seconds.
    pub poll_timeout_secs: u64,
}

/// Local Parquet settings.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Directory holding the Parquet files.
    pub parquet_dir: String,
    /// Glob pattern for data files within the directory.
    pub pattern: String,
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected backend variant.
    pub backend: BackendKind,
    /// Athena settings (used when `backend` is [`BackendKind::Athena`]).
    pub athena: AthenaConfig,
    /// Local Parquet settings (used when `backend` is
    /// [`BackendKind::DuckDb`]).
    pub local: LocalConfig,
    /// Row limit bounds for the query layer.
    pub limits: Limits,
    /// HTTP bind address.
    pub bind_addr: String,
    /// HTTP port.
    pub port: u16,
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the backend selector is unknown, a
    /// numeric variable doesn't parse, or the Athena backend is selected
    /// without `ATHENA_OUTPUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match env_or("STORM_BACKEND", "duckdb").to_lowercase().as_str() {
            "athena" => BackendKind::Athena,
            "duckdb" => BackendKind::DuckDb,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORM_BACKEND".to_string(),
                    value: other.to_string(),
                });
            }
        };

        let output_s3 = match std::env::var("ATHENA_OUTPUT") {
            Ok(v) => v,
            Err(_) if backend == BackendKind::Athena => {
                return Err(ConfigError::MissingEnv {
                    name: "ATHENA_OUTPUT".to_string(),
                });
            }
            Err(_) => String::new(),
        };

        let athena = AthenaConfig {
            region: env_or("AWS_REGION", "us-east-2"),
            workgroup: env_or("ATHENA_WORKGROUP", "primary"),
            database: env_or("ATHENA_DATABASE", "stormevents"),
            table: env_or("ATHENA_TABLE", "stormevents"),
            output_s3,
            poll_interval_ms: env_parsed("ATHENA_POLL_INTERVAL_MS", 500)?,
            poll_timeout_secs: env_parsed("ATHENA_POLL_TIMEOUT_SECS", 120)?,
        };

        let local = LocalConfig {
            parquet_dir: env_or("PARQUET_DIR", "./data/parquet"),
            pattern: env_or("PARQUET_GLOB", "*.parquet"),
        };

        let limits = Limits {
            default: env_parsed("DEFAULT_LIMIT", 1_000)?,
            max: env_parsed("MAX_LIMIT", 100_000)?,
        };

        Ok(Self {
            backend,
            athena,
            local,
            limits,
            bind_addr: env_or("BIND_ADDR", "127.0.0.1"),
            port: env_parsed("PORT", 8080)?,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value: raw,
        }),
    }
}
