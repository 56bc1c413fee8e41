//! Local `DuckDB` backend over Parquet files.
//!
//! Executes the rendered predicate directly against the columnar file set —
//! no polling, no string round-trip. A fresh in-memory connection is opened
//! per call inside `spawn_blocking` and dropped on every exit path, so no
//! execution context outlives its request. Rows still pass through the
//! normalizer so the output shape matches the Athena variant exactly.

use async_trait::async_trait;
use duckdb::Connection;
use storm_api_models::{EventFilter, EventRecord, SummaryRow};
use storm_api_query::normalize::normalize_record;
use storm_api_query::predicate::Predicate;

use crate::config::LocalConfig;
use crate::{BackendError, EventBackend, files, sql};

/// `DuckDB`-backed implementation of [`EventBackend`].
pub struct DuckDbBackend {
    config: LocalConfig,
}

impl DuckDbBackend {
    /// Creates the backend for the configured Parquet directory.
    #[must_use]
    pub const fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    /// Scans the data directory on a blocking thread; directory reads
    /// don't belong on the async executor any more than queries do.
    async fn scan_files(&self) -> Result<Vec<std::path::PathBuf>, BackendError> {
        let dir = std::path::PathBuf::from(&self.config.parquet_dir);
        let pattern = self.config.pattern.clone();
        Ok(tokio::task::spawn_blocking(move || files::matching_files(&dir, &pattern)).await?)
    }

    /// Fails with [`BackendError::NoData`] unless at least one data file
    /// matches the configured pattern.
    ///
    /// Checked before any query text is built: an empty filtered result is
    /// a valid outcome and must stay distinguishable from a backend with no
    /// data at all.
    async fn check_data_present(&self) -> Result<(), BackendError> {
        if self.scan_files().await?.is_empty() {
            return Err(BackendError::NoData {
                dir: self.config.parquet_dir.clone(),
                pattern: self.config.pattern.clone(),
            });
        }
        Ok(())
    }

    /// The `read_parquet` relation over the configured glob.
    fn relation(&self) -> String {
        let glob = format!("{}/{}", self.config.parquet_dir, self.config.pattern);
        // Single quotes doubled per SQL string-literal rules; the path comes
        // from configuration, not the request.
        format!("read_parquet('{}')", glob.replace('\'', "''"))
    }

    /// Runs a synchronous `DuckDB` query on a blocking thread, mapping each
    /// row with `map_row`. The connection lives only for this call.
    async fn query<T, F>(&self, query: String, map_row: F) -> Result<Vec<T>, BackendError>
    where
        T: Send + 'static,
        F: Fn(&duckdb::Row<'_>) -> Result<T, duckdb::Error> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_in_memory()?;
            fetch_mapped(&conn, &query, map_row)
        })
        .await?
    }
}

#[async_trait]
impl EventBackend for DuckDbBackend {
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, BackendError> {
        self.check_data_present().await?;
        let pred = Predicate::for_filter(filter);
        let query = sql::select_events(&self.relation(), &pred, filter.limit);
        log::debug!("DuckDB events query: {query}");

        let records = self.query(query, event_from_row).await?;
        Ok(records.into_iter().map(normalize_record).collect())
    }

    async fn summarize(&self, filter: &EventFilter) -> Result<Vec<SummaryRow>, BackendError> {
        self.check_data_present().await?;
        let pred = Predicate::for_filter(filter);
        let query = sql::select_summary(&self.relation(), filter.group_by, &pred);
        log::debug!("DuckDB summary query: {query}");

        self.query(query, summary_from_row).await
    }

    async fn health(&self) -> serde_json::Value {
        let files = match self.scan_files().await {
            Ok(files) => files.len(),
            Err(e) => {
                log::warn!("Health-check file scan failed: {e}");
                0
            }
        };
        serde_json::json!({
            "status": "ok",
            "backend": "duckdb",
            "parquet_dir": self.config.parquet_dir,
            "pattern": self.config.pattern,
            "files": files,
        })
    }
}

/// Prepares and runs `query` on `conn`, collecting one `T` per row.
fn fetch_mapped<T, F>(conn: &Connection, query: &str, map_row: F) -> Result<Vec<T>, BackendError>
where
    F: Fn(&duckdb::Row<'_>) -> Result<T, duckdb::Error>,
{
    let mut stmt = conn.prepare(query)?;
    let mut rows = stmt.query([])?;

    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        results.push(map_row(row)?);
    }

    Ok(results)
}

/// Maps a natively-typed events row. The projection in [`sql::select_events`]
/// fixes the column order and types.
fn event_from_row(row: &duckdb::Row<'_>) -> Result<EventRecord, duckdb::Error> {
    Ok(EventRecord {
        event_id: row.get(0)?,
        event_type: row.get(1)?,
        magnitude: row.get(2)?,
        lon: row.get(3)?,
        lat: row.get(4)?,
        date: row.get(5)?,
    })
}

/// Maps a summary row from [`sql::select_summary`].
fn summary_from_row(row: &duckdb::Row<'_>) -> Result<SummaryRow, duckdb::Error> {
    Ok(SummaryRow {
        key: row.get(0)?,
        n: row.get(1)?,
    })
}
