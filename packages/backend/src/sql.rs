//! Query text shared by both backends.
//!
//! The projection casts every column to a fixed type (`BIGINT`, `VARCHAR`,
//! `DOUBLE`) so Athena and `DuckDB` hand the normalizer the same shapes.
//! The only inputs are a rendered [`Predicate`] (validated literals), a
//! relation name from configuration, and the allow-listed group-by column.

use storm_api_models::GroupBy;
use storm_api_query::predicate::Predicate;

/// Renders the event listing query: filtered rows, newest first.
#[must_use]
pub fn select_events(relation: &str, pred: &Predicate, limit: u32) -> String {
    format!(
        "SELECT CAST(event_id AS BIGINT) AS event_id, \
                CAST(type AS VARCHAR) AS type, \
                CAST(magnitude AS DOUBLE) AS magnitude, \
                CAST(lon AS DOUBLE) AS lon, \
                CAST(lat AS DOUBLE) AS lat, \
                CAST(date AS VARCHAR) AS date \
         FROM {relation} WHERE {} ORDER BY date DESC LIMIT {limit}",
        pred.to_sql()
    )
}

/// Renders the summary query: one row per distinct group value, largest
/// group first.
#[must_use]
pub fn select_summary(relation: &str, group_by: GroupBy, pred: &Predicate) -> String {
    let column = group_by.column();
    format!(
        "SELECT CAST({column} AS VARCHAR) AS key, COUNT(*) AS n \
         FROM {relation} WHERE {} GROUP BY 1 ORDER BY n DESC",
        pred.to_sql()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use storm_api_models::{BoundingBox, EventFilter};

    fn filter() -> EventFilter {
        EventFilter {
            start: Some(chrono_date(2023, 7, 1)),
            end: Some(chrono_date(2023, 7, 3)),
            bbox: Some(BoundingBox::new(-84.0, 42.0, -83.0, 43.0)),
            limit: 10,
            group_by: GroupBy::Type,
        }
    }

    fn chrono_date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn events_query_orders_and_limits() {
        let pred = Predicate::for_filter(&filter());
        let sql = select_events("stormevents", &pred, 10);
        assert!(sql.starts_with("SELECT CAST(event_id AS BIGINT)"));
        assert!(sql.contains("FROM stormevents WHERE lon >= -180"));
        assert!(sql.contains("date >= DATE '2023-07-01'"));
        assert!(sql.ends_with("ORDER BY date DESC LIMIT 10"));
    }

    #[test]
    fn summary_query_groups_on_allowed_column_only() {
        let pred = Predicate::for_filter(&filter());
        let sql = select_summary("stormevents", GroupBy::Type, &pred);
        assert!(sql.starts_with("SELECT CAST(type AS VARCHAR) AS key, COUNT(*) AS n"));
        assert!(sql.ends_with("GROUP BY 1 ORDER BY n DESC"));
    }
}
