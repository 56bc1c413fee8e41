//! AWS Athena backend.
//!
//! Queries are submitted with `StartQueryExecution`, polled on a fixed
//! interval until they leave `QUEUED`/`RUNNING`, and fetched once with
//! `GetQueryResults`. Result cells arrive as strings (with a header row at
//! the top of the first page); they are parsed into the typed output schema
//! with null-tolerant parsing and then normalized like any other row.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::types::{
    QueryExecutionContext, QueryExecutionState, QueryExecutionStatus, ResultConfiguration, Row,
};
use storm_api_models::{EventFilter, EventRecord, SummaryRow};
use storm_api_query::normalize::normalize_record;
use storm_api_query::predicate::Predicate;
use storm_api_query::values::{parse_opt_f64, parse_opt_i64, parse_opt_string};

use crate::config::AthenaConfig;
use crate::{BackendError, EventBackend, sql};

/// Athena-backed implementation of [`EventBackend`].
pub struct AthenaBackend {
    client: aws_sdk_athena::Client,
    config: AthenaConfig,
}

impl AthenaBackend {
    /// Builds the Athena client from the ambient AWS credential chain and
    /// the configured region.
    pub async fn connect(config: AthenaConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        Self {
            client: aws_sdk_athena::Client::new(&sdk_config),
            config,
        }
    }

    /// Submits query text for asynchronous execution and returns the
    /// execution ID.
    async fn submit(&self, query: &str) -> Result<String, BackendError> {
        log::debug!("Submitting Athena query: {query}");

        let output = self
            .client
            .start_query_execution()
            .query_string(query)
            .work_group(&self.config.workgroup)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&self.config.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&self.config.output_s3)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| BackendError::Submit {
                source: Box::new(e),
            })?;

        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| BackendError::Submit {
                source: "StartQueryExecution returned no execution id".into(),
            })
    }

    /// Polls the execution on a fixed interval until it reaches a terminal
    /// state, then returns for `SUCCEEDED` or fails with the backend's
    /// stated reason.
    ///
    /// The loop suspends between polls (`tokio::time::sleep`), so it
    /// composes with per-request timeouts and drops cleanly if the caller
    /// is cancelled. On deadline expiry a best-effort
    /// `StopQueryExecution` is issued before failing.
    async fn wait_until_complete(&self, execution_id: &str) -> Result<(), BackendError> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let deadline = Instant::now() + Duration::from_secs(self.config.poll_timeout_secs);

        loop {
            let output = self
                .client
                .get_query_execution()
                .query_execution_id(execution_id)
                .send()
                .await
                .map_err(|e| BackendError::Poll {
                    execution_id: execution_id.to_string(),
                    source: Box::new(e),
                })?;

            let status = output.query_execution().and_then(|q| q.status());

            match poll_step(status, Instant::now() >= deadline) {
                PollStep::Done => return Ok(()),
                PollStep::Failed { state, reason } => {
                    log::error!("Athena execution {execution_id} {state}: {reason}");
                    return Err(BackendError::QueryFailed { state, reason });
                }
                PollStep::Expired => {
                    self.stop_execution(execution_id).await;
                    return Err(BackendError::QueryTimeout {
                        execution_id: execution_id.to_string(),
                        timeout_secs: self.config.poll_timeout_secs,
                    });
                }
                PollStep::Wait => tokio::time::sleep(interval).await,
            }
        }
    }

    /// Best-effort cancellation of an execution we gave up waiting on.
    async fn stop_execution(&self, execution_id: &str) {
        if let Err(e) = self
            .client
            .stop_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
        {
            log::warn!("Failed to stop abandoned Athena execution {execution_id}: {e}");
        }
    }

    /// Fetches all result pages for a succeeded execution.
    ///
    /// The first row of the first page is the column header and is skipped;
    /// the remaining rows are the string-typed data rows.
    async fn fetch_rows(&self, execution_id: &str) -> Result<Vec<Row>, BackendError> {
        let mut rows = Vec::new();
        let mut next_token: Option<String> = None;
        let mut first_page = true;

        loop {
            let mut request = self
                .client
                .get_query_results()
                .query_execution_id(execution_id);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            let output = request.send().await.map_err(|e| BackendError::Results {
                execution_id: execution_id.to_string(),
                source: Box::new(e),
            })?;

            if let Some(result_set) = output.result_set() {
                let page = result_set.rows();
                let skip = if first_page { 1 } else { 0 };
                rows.extend(page.iter().skip(skip).cloned());
            }
            first_page = false;

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(rows)
    }

    /// Submit, poll to completion, and fetch the raw data rows.
    async fn execute(&self, query: &str) -> Result<Vec<Row>, BackendError> {
        let execution_id = self.submit(query).await?;
        log::debug!("Started Athena execution {execution_id}");
        self.wait_until_complete(&execution_id).await?;
        self.fetch_rows(&execution_id).await
    }
}

#[async_trait]
impl EventBackend for AthenaBackend {
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, BackendError> {
        let pred = Predicate::for_filter(filter);
        let query = sql::select_events(&self.config.table, &pred, filter.limit);
        let rows = self.execute(&query).await?;
        Ok(rows
            .iter()
            .map(event_from_row)
            .map(normalize_record)
            .collect())
    }

    async fn summarize(&self, filter: &EventFilter) -> Result<Vec<SummaryRow>, BackendError> {
        let pred = Predicate::for_filter(filter);
        let query = sql::select_summary(&self.config.table, filter.group_by, &pred);
        let rows = self.execute(&query).await?;
        Ok(rows.iter().map(summary_from_row).collect())
    }

    async fn health(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "backend": "athena",
            "workgroup": self.config.workgroup,
            "database": self.config.database,
            "table": self.config.table,
            "output_s3": self.config.output_s3,
            "region": self.config.region,
        })
    }
}

/// What to do after one `GetQueryExecution` poll.
#[derive(Debug, PartialEq, Eq)]
enum PollStep {
    /// Execution succeeded; results can be fetched.
    Done,
    /// Not terminal yet; poll again after the interval.
    Wait,
    /// Terminal failure, carrying the state name and stated reason.
    Failed { state: String, reason: String },
    /// Deadline passed without reaching a terminal state.
    Expired,
}

/// Decides the next poll-loop action from one execution status snapshot.
///
/// A terminal state always wins over the deadline: a result that already
/// failed (or succeeded) is reported as such even if the deadline passed
/// during the poll. `QUEUED`, `RUNNING`, a missing status, and states this
/// SDK version doesn't know all keep polling.
fn poll_step(status: Option<&QueryExecutionStatus>, expired: bool) -> PollStep {
    match status.and_then(|s| s.state()) {
        Some(QueryExecutionState::Succeeded) => PollStep::Done,
        Some(terminal @ (QueryExecutionState::Failed | QueryExecutionState::Cancelled)) => {
            PollStep::Failed {
                state: terminal.as_str().to_string(),
                reason: status
                    .and_then(|s| s.state_change_reason())
                    .unwrap_or_default()
                    .to_string(),
            }
        }
        _ if expired => PollStep::Expired,
        _ => PollStep::Wait,
    }
}

/// Returns the string value of cell `index`, if present.
fn cell(row: &Row, index: usize) -> Option<&str> {
    row.data().get(index).and_then(|d| d.var_char_value())
}

/// Casts a 6-column events row into the output schema.
///
/// Only the two shapes produced by this crate's own query builders ever
/// reach these casts; a different column count is a bug in query
/// construction, and surplus cells are ignored rather than guessed at.
fn event_from_row(row: &Row) -> EventRecord {
    EventRecord {
        event_id: parse_opt_i64(cell(row, 0)),
        event_type: parse_opt_string(cell(row, 1)),
        magnitude: parse_opt_f64(cell(row, 2)),
        lon: parse_opt_f64(cell(row, 3)),
        lat: parse_opt_f64(cell(row, 4)),
        date: parse_opt_string(cell(row, 5)),
    }
}

/// Casts a 2-column summary row into `(key, count)`.
fn summary_from_row(row: &Row) -> SummaryRow {
    SummaryRow {
        key: parse_opt_string(cell(row, 0)),
        n: parse_opt_i64(cell(row, 1)).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_athena::types::Datum;

    fn row(cells: &[&str]) -> Row {
        let mut builder = Row::builder();
        for c in cells {
            builder = builder.data(Datum::builder().var_char_value(*c).build());
        }
        builder.build()
    }

    fn status(state: QueryExecutionState, reason: Option<&str>) -> QueryExecutionStatus {
        let mut builder = QueryExecutionStatus::builder().state(state);
        if let Some(r) = reason {
            builder = builder.state_change_reason(r);
        }
        builder.build()
    }

    #[test]
    fn poll_succeeded_is_done() {
        let s = status(QueryExecutionState::Succeeded, None);
        assert_eq!(poll_step(Some(&s), false), PollStep::Done);
    }

    #[test]
    fn poll_failed_carries_stated_reason() {
        let s = status(
            QueryExecutionState::Failed,
            Some("SYNTAX_ERROR: line 1:8: Column 'event_idd' cannot be resolved"),
        );
        assert_eq!(
            poll_step(Some(&s), false),
            PollStep::Failed {
                state: "FAILED".to_string(),
                reason: "SYNTAX_ERROR: line 1:8: Column 'event_idd' cannot be resolved"
                    .to_string(),
            }
        );
    }

    #[test]
    fn poll_cancelled_fails_even_without_reason() {
        let s = status(QueryExecutionState::Cancelled, None);
        assert_eq!(
            poll_step(Some(&s), false),
            PollStep::Failed {
                state: "CANCELLED".to_string(),
                reason: String::new(),
            }
        );
    }

    #[test]
    fn poll_queued_and_running_keep_polling() {
        for state in [QueryExecutionState::Queued, QueryExecutionState::Running] {
            let s = status(state, None);
            assert_eq!(poll_step(Some(&s), false), PollStep::Wait);
        }
    }

    #[test]
    fn poll_unknown_state_keeps_polling() {
        let s = status(QueryExecutionState::from("REBALANCING"), None);
        assert_eq!(poll_step(Some(&s), false), PollStep::Wait);
    }

    #[test]
    fn poll_missing_status_keeps_polling() {
        assert_eq!(poll_step(None, false), PollStep::Wait);
    }

    #[test]
    fn poll_deadline_expires_only_in_non_terminal_states() {
        let running = status(QueryExecutionState::Running, None);
        assert_eq!(poll_step(Some(&running), true), PollStep::Expired);
        assert_eq!(poll_step(None, true), PollStep::Expired);

        let succeeded = status(QueryExecutionState::Succeeded, None);
        assert_eq!(poll_step(Some(&succeeded), true), PollStep::Done);

        let failed = status(QueryExecutionState::Failed, Some("out of capacity"));
        assert!(matches!(
            poll_step(Some(&failed), true),
            PollStep::Failed { .. }
        ));
    }

    #[test]
    fn casts_events_row() {
        let record = event_from_row(&row(&[
            "2", "Tornado", "2.7", "-83.7", "42.3", "2023-07-02",
        ]));
        assert_eq!(
            record,
            EventRecord {
                event_id: Some(2),
                event_type: Some("Tornado".to_string()),
                magnitude: Some(2.7),
                lon: Some(-83.7),
                lat: Some(42.3),
                date: Some("2023-07-02".to_string()),
            }
        );
    }

    #[test]
    fn tolerates_float_rendered_integer_id() {
        let record = event_from_row(&row(&["3.0", "Flood", "", "-83.8", "42.25", "2023-07-03"]));
        assert_eq!(record.event_id, Some(3));
        assert_eq!(record.magnitude, None);
    }

    #[test]
    fn null_sentinels_become_none() {
        let record = event_from_row(&row(&["", "", "NaN", "inf", "-inf", ""]));
        assert_eq!(
            record,
            EventRecord {
                event_id: None,
                event_type: None,
                magnitude: None,
                lon: None,
                lat: None,
                date: None,
            }
        );
    }

    #[test]
    fn missing_cells_become_none() {
        let record = event_from_row(&row(&["1", "Hail"]));
        assert_eq!(record.event_id, Some(1));
        assert_eq!(record.magnitude, None);
        assert_eq!(record.date, None);
    }

    #[test]
    fn casts_summary_row() {
        let summary = summary_from_row(&row(&["Hail", "42"]));
        assert_eq!(
            summary,
            SummaryRow {
                key: Some("Hail".to_string()),
                n: 42,
            }
        );
    }

    #[test]
    fn summary_missing_count_defaults_to_zero() {
        let summary = summary_from_row(&row(&["Hail"]));
        assert_eq!(summary.n, 0);
    }
}
