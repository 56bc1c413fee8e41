#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The backend-neutral query layer for the StormEvents API.
//!
//! Turns raw query-string input into a validated [`storm_api_models::EventFilter`],
//! renders filters into SQL predicates whose only inputs are already-validated
//! numbers and dates, and normalizes heterogeneous backend rows into the
//! fixed JSON-safe output schema.

pub mod filter;
pub mod normalize;
pub mod predicate;
pub mod values;

/// Errors produced by input validation.
///
/// All variants map to 4xx responses; none are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A date parameter was not `YYYY-MM-DD`.
    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    BadDate {
        /// The offending raw string.
        value: String,
    },

    /// `start` was after `end`.
    #[error("start must be <= end")]
    InvertedDateRange,

    /// A bbox parameter violated its format or ordering constraint.
    #[error("{reason}")]
    BadBbox {
        /// Which constraint was violated.
        reason: String,
    },

    /// The group-by value is not in the allow-list.
    #[error("unsupported groupby '{value}': allowed values are {allowed:?}")]
    UnsupportedGroupBy {
        /// The offending raw string.
        value: String,
        /// The allow-listed values.
        allowed: &'static [&'static str],
    },

    /// The limit parameter was outside the configured bounds.
    #[error("limit must be between 1 and {max}, got {value}")]
    LimitOutOfRange {
        /// The offending value.
        value: i64,
        /// The configured upper bound.
        max: u32,
    },
}
