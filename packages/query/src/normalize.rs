//! Normalization of raw backend rows into the fixed output schema.
//!
//! Applied per emitted row for both backends, so the JSON shape is
//! identical whether the source was native DuckDB values or string-parsed
//! Athena cells. Non-finite floats become `null`; everything else passes
//! through unchanged. Idempotent.

use storm_api_models::EventRecord;

/// Replaces non-finite floats with `None`, leaving finite values untouched.
#[must_use]
pub fn normalize_f64(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Normalizes one event record into the JSON-safe output shape.
#[must_use]
pub fn normalize_record(record: EventRecord) -> EventRecord {
    EventRecord {
        magnitude: normalize_f64(record.magnitude),
        lon: normalize_f64(record.lon),
        lat: normalize_f64(record.lat),
        ..record
    }
}
