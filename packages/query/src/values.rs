//! Parsing of string-typed result cells from the cloud backend.
//!
//! Athena result rows arrive as strings regardless of the column type.
//! Missing cells, empty strings, and non-finite sentinels all map to `None`
//! rather than erroring, matching how the normalizer treats native values.

/// Parses an optional float cell.
///
/// Returns `None` for a missing cell, an empty string, an unparseable
/// string, or a value that parses to a non-finite float (`"NaN"`, `"inf"`,
/// `"-inf"`, any case).
#[must_use]
pub fn parse_opt_f64(cell: Option<&str>) -> Option<f64> {
    let s = cell?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses an optional integer cell via float-then-truncate.
///
/// The float round-trip tolerates values Athena renders as `"3.0"`. A
/// fractional part is truncated but logged, since a non-integral identifier
/// points at an upstream data-quality problem.
#[must_use]
#[allow(clippy::cast_precision_loss)] // i64 range endpoints as f64 bounds
pub fn parse_opt_i64(cell: Option<&str>) -> Option<i64> {
    let v = parse_opt_f64(cell)?;
    if v.trunc() != v {
        log::warn!("truncating fractional integer cell {v} -> {}", v.trunc());
    }
    if v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        #[allow(clippy::cast_possible_truncation)]
        Some(v as i64)
    } else {
        None
    }
}

/// Parses an optional string cell, mapping empty strings to `None`.
#[must_use]
pub fn parse_opt_string(cell: Option<&str>) -> Option<String> {
    let s = cell?;
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_float() {
        assert_eq!(parse_opt_f64(Some("2.7")), Some(2.7));
        assert_eq!(parse_opt_f64(Some("-83.75")), Some(-83.75));
    }

    #[test]
    fn float_sentinels_map_to_none() {
        for s in ["", "NaN", "nan", "inf", "-inf", "Infinity", "-Infinity"] {
            assert_eq!(parse_opt_f64(Some(s)), None, "{s:?}");
        }
        assert_eq!(parse_opt_f64(None), None);
    }

    #[test]
    fn unparseable_float_maps_to_none() {
        assert_eq!(parse_opt_f64(Some("hail")), None);
    }

    #[test]
    fn parses_integer_via_float_truncate() {
        assert_eq!(parse_opt_i64(Some("3")), Some(3));
        assert_eq!(parse_opt_i64(Some("3.0")), Some(3));
        assert_eq!(parse_opt_i64(Some("3.7")), Some(3));
    }

    #[test]
    fn integer_sentinels_map_to_none() {
        assert_eq!(parse_opt_i64(Some("")), None);
        assert_eq!(parse_opt_i64(Some("NaN")), None);
        assert_eq!(parse_opt_i64(None), None);
    }

    #[test]
    fn empty_string_cell_is_none() {
        assert_eq!(parse_opt_string(Some("")), None);
        assert_eq!(parse_opt_string(Some("Hail")), Some("Hail".to_string()));
        assert_eq!(parse_opt_string(None), None);
    }
}
