#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value types shared across the StormEvents API crates.
//!
//! These types represent one request's validated filter constraints and the
//! fixed output record shapes. Each request constructs its own
//! [`EventFilter`] from raw query parameters and discards it afterwards;
//! nothing here carries shared mutable state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 lon/lat coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub min_lon: f64,
    /// Southern latitude boundary.
    pub min_lat: f64,
    /// Eastern longitude boundary.
    pub max_lon: f64,
    /// Northern latitude boundary.
    pub max_lat: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }
}

/// The allow-listed set of group-by columns for summary queries.
///
/// This enum is the only path by which request text can become a column
/// name in rendered SQL, so every variant must map to a fixed, known
/// column of the storm events table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Group by the event type column (`"Hail"`, `"Tornado"`, ...).
    Type,
}

impl GroupBy {
    /// All values accepted by the API, for error messages.
    pub const ALLOWED: &'static [&'static str] = &["type"];

    /// The SQL column this variant projects and groups on.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Type => "type",
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "type" => Ok(Self::Type),
            _ => Err(()),
        }
    }
}

/// One request's validated filter constraints.
///
/// Immutable after construction; see `storm_api_query::filter` for the
/// validation rules that produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    /// Minimum event date (inclusive).
    pub start: Option<NaiveDate>,
    /// Maximum event date (inclusive).
    pub end: Option<NaiveDate>,
    /// Spatial bounding box filter.
    pub bbox: Option<BoundingBox>,
    /// Maximum number of rows to return.
    pub limit: u32,
    /// Column to group on for summary queries.
    pub group_by: GroupBy,
}

/// A storm event row in the fixed, JSON-safe output schema.
///
/// Every float field is `None` when the source value was missing or
/// non-finite; `date` is rendered `YYYY-MM-DD`. Both backends produce this
/// exact shape so responses are byte-identical regardless of which one
/// served the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// NOAA event identifier.
    pub event_id: Option<i64>,
    /// Event type name.
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Event magnitude (units depend on the event type).
    pub magnitude: Option<f64>,
    /// Longitude (WGS84).
    pub lon: Option<f64>,
    /// Latitude (WGS84).
    pub lat: Option<f64>,
    /// Event begin date as `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// One group in a summary query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Distinct value of the grouped column.
    pub key: Option<String>,
    /// Number of filtered rows with that value.
    pub n: i64,
}

/// Response envelope for the events and summary endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ItemsResponse<T> {
    /// Number of items returned.
    pub count: usize,
    /// The result rows.
    pub items: Vec<T>,
}

impl<T> ItemsResponse<T> {
    /// Wraps a result set in the `{count, items}` envelope.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}
