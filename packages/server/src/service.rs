//! Per-request orchestration: validate → build predicate → dispatch →
//! normalize → respond.
//!
//! No step is retried; the first failure terminates the request with a
//! structured error that the handlers map onto the HTTP status taxonomy.

use std::sync::Arc;

use storm_api_backend::{BackendError, EventBackend};
use storm_api_models::{EventRecord, ItemsResponse, SummaryRow};
use storm_api_query::FilterError;
use storm_api_query::filter::{Limits, RawEventQuery, parse_filter};

/// A request failure, either rejected input or a backend fault.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request's parameters were rejected.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The backend failed to execute the query.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Orchestrates queries against the backend selected at startup.
pub struct EventService {
    backend: Arc<dyn EventBackend>,
    limits: Limits,
}

impl EventService {
    /// Creates the service over an already-constructed backend.
    #[must_use]
    pub const fn new(backend: Arc<dyn EventBackend>, limits: Limits) -> Self {
        Self { backend, limits }
    }

    /// Validates the raw query and returns the filtered event rows.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Filter`] for rejected input and
    /// [`ServiceError::Backend`] for execution failures.
    pub async fn list_events(
        &self,
        raw: &RawEventQuery,
    ) -> Result<ItemsResponse<EventRecord>, ServiceError> {
        let filter = parse_filter(raw, self.limits)?;
        let items = self.backend.list_events(&filter).await?;
        Ok(ItemsResponse::new(items))
    }

    /// Validates the raw query and returns per-group counts.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Filter`] for rejected input and
    /// [`ServiceError::Backend`] for execution failures.
    pub async fn summarize(
        &self,
        raw: &RawEventQuery,
    ) -> Result<ItemsResponse<SummaryRow>, ServiceError> {
        let filter = parse_filter(raw, self.limits)?;
        let items = self.backend.summarize(&filter).await?;
        Ok(ItemsResponse::new(items))
    }

    /// Backend identity and configuration for the health endpoint.
    pub async fn health(&self) -> serde_json::Value {
        self.backend.health().await
    }
}
