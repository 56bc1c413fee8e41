#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query backends for the StormEvents API.
//!
//! Two interchangeable implementations of [`EventBackend`]: AWS Athena
//! (asynchronous submit-then-poll execution over the Glue table) and
//! `DuckDB` (synchronous in-process execution over local Parquet files).
//! Both render the same predicate text and feed the same normalizer, so
//! their output is byte-identical for logically identical data. The
//! variant is selected once at startup from [`config::Config`].

pub mod athena;
pub mod config;
pub mod files;
pub mod local;
pub mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use storm_api_models::{EventFilter, EventRecord, SummaryRow};

/// Errors that can occur during backend execution.
///
/// Validation errors never reach this type; a backend is only ever handed an
/// already-validated [`EventFilter`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// `StartQueryExecution` failed.
    #[error("Failed to submit Athena query: {source}")]
    Submit {
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `GetQueryExecution` failed while polling.
    #[error("Failed to poll Athena execution {execution_id}: {source}")]
    Poll {
        /// The execution being polled.
        execution_id: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `GetQueryResults` failed after a successful execution.
    #[error("Failed to fetch Athena results for {execution_id}: {source}")]
    Results {
        /// The execution whose results were requested.
        execution_id: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The execution reached `FAILED` or `CANCELLED`.
    #[error("Athena query {state}: {reason}")]
    QueryFailed {
        /// Terminal state reported by Athena.
        state: String,
        /// Athena's `StateChangeReason`, verbatim.
        reason: String,
    },

    /// The poll deadline expired before the execution finished.
    #[error("Athena query {execution_id} did not finish within {timeout_secs}s")]
    QueryTimeout {
        /// The abandoned execution.
        execution_id: String,
        /// The configured deadline.
        timeout_secs: u64,
    },

    /// No local data files match the configured pattern.
    #[error("no data available: no files matching '{pattern}' in {dir}")]
    NoData {
        /// The configured data directory.
        dir: String,
        /// The configured glob pattern.
        pattern: String,
    },

    /// `DuckDB` query error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// The blocking query task panicked or was cancelled.
    #[error("query task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl BackendError {
    /// Whether this error reflects a failure reported by the remote query
    /// engine (mapped to 502) rather than a local fault (mapped to 500).
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Submit { .. }
                | Self::Poll { .. }
                | Self::Results { .. }
                | Self::QueryFailed { .. }
                | Self::QueryTimeout { .. }
        )
    }
}

/// A data-access backend for storm event queries.
///
/// Implementations translate a validated filter into backend-specific query
/// text, execute it, and return rows already normalized into the fixed
/// output schema.
#[async_trait]
pub trait EventBackend: Send + Sync {
    /// Returns filtered event rows, ordered by date descending.
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, BackendError>;

    /// Returns per-group counts within the filtered set, ordered by count
    /// descending.
    async fn summarize(&self, filter: &EventFilter) -> Result<Vec<SummaryRow>, BackendError>;

    /// Backend identity and configuration for the health endpoint.
    async fn health(&self) -> serde_json::Value;
}

/// Constructs the backend selected by the configuration.
///
/// Called once at startup; the returned trait object is shared across all
/// requests.
pub async fn connect(config: &config::Config) -> Arc<dyn EventBackend> {
    match config.backend {
        config::BackendKind::Athena => {
            Arc::new(athena::AthenaBackend::connect(config.athena.clone()).await)
        }
        config::BackendKind::DuckDb => Arc::new(local::DuckDbBackend::new(config.local.clone())),
    }
}
