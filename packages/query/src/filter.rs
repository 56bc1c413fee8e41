//! Validation of raw query-string parameters into an [`EventFilter`].
//!
//! Validation is all-or-nothing: the first violated constraint fails the
//! whole request and no partially-built filter ever escapes.

use chrono::NaiveDate;
use storm_api_models::{BoundingBox, EventFilter, GroupBy};

use crate::FilterError;

/// Row-limit bounds, read once from configuration at startup.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Limit applied when the request doesn't supply one.
    pub default: u32,
    /// Upper bound on the requested limit.
    pub max: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default: 1_000,
            max: 100_000,
        }
    }
}

/// Raw, unvalidated query parameters as they arrive from the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct RawEventQuery {
    /// Start date string (`YYYY-MM-DD`).
    pub start: Option<String>,
    /// End date string (`YYYY-MM-DD`).
    pub end: Option<String>,
    /// Bounding box string (`minLon,minLat,maxLon,maxLat`).
    pub bbox: Option<String>,
    /// Row limit.
    pub limit: Option<i64>,
    /// Group-by column name.
    pub groupby: Option<String>,
}

/// Validates raw query parameters into an [`EventFilter`].
///
/// # Errors
///
/// Returns [`FilterError`] naming the first violated constraint: malformed
/// or inverted dates, malformed bbox, out-of-bounds limit, or a group-by
/// value outside the allow-list.
pub fn parse_filter(raw: &RawEventQuery, limits: Limits) -> Result<EventFilter, FilterError> {
    let start = raw.start.as_deref().map(parse_date).transpose()?;
    let end = raw.end.as_deref().map(parse_date).transpose()?;

    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(FilterError::InvertedDateRange);
    }

    let bbox = raw.bbox.as_deref().map(parse_bbox).transpose()?;

    let limit = match raw.limit {
        None => limits.default,
        Some(n) if n >= 1 && n <= i64::from(limits.max) => {
            u32::try_from(n).map_err(|_| FilterError::LimitOutOfRange {
                value: n,
                max: limits.max,
            })?
        }
        Some(n) => {
            return Err(FilterError::LimitOutOfRange {
                value: n,
                max: limits.max,
            });
        }
    };

    let group_by = match raw.groupby.as_deref() {
        None => GroupBy::Type,
        Some(s) => s
            .parse::<GroupBy>()
            .map_err(|()| FilterError::UnsupportedGroupBy {
                value: s.to_string(),
                allowed: GroupBy::ALLOWED,
            })?,
    };

    Ok(EventFilter {
        start,
        end,
        bbox,
        limit,
        group_by,
    })
}

/// Parses a `YYYY-MM-DD` date string.
///
/// # Errors
///
/// Returns [`FilterError::BadDate`] naming the offending string.
pub fn parse_date(s: &str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| FilterError::BadDate {
        value: s.to_string(),
    })
}

/// Parses a `minLon,minLat,maxLon,maxLat` bounding box string.
///
/// # Errors
///
/// Returns [`FilterError::BadBbox`] on wrong arity, non-numeric or
/// non-finite parts, or `min >= max` on either axis.
pub fn parse_bbox(s: &str) -> Result<BoundingBox, FilterError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(FilterError::BadBbox {
            reason: "bbox must be 'minLon,minLat,maxLon,maxLat'".to_string(),
        });
    }

    let mut nums = [0.0f64; 4];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        // NaN/inf parse as f64 but have no SQL literal form; reject here so
        // they never reach a rendered predicate.
        *slot = part
            .parse()
            .ok()
            .filter(|n: &f64| n.is_finite())
            .ok_or_else(|| FilterError::BadBbox {
                reason: "bbox values must be numbers".to_string(),
            })?;
    }

    let [min_lon, min_lat, max_lon, max_lat] = nums;
    if min_lon >= max_lon || min_lat >= max_lat {
        return Err(FilterError::BadBbox {
            reason: "bbox must be min<max for each axis".to_string(),
        });
    }

    Ok(BoundingBox::new(min_lon, min_lat, max_lon, max_lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(bbox: Option<&str>) -> RawEventQuery {
        RawEventQuery {
            bbox: bbox.map(String::from),
            ..RawEventQuery::default()
        }
    }

    #[test]
    fn parses_full_query() {
        let query = RawEventQuery {
            start: Some("2023-07-01".to_string()),
            end: Some("2023-07-03".to_string()),
            bbox: Some("-84,42,-83,43".to_string()),
            limit: Some(10),
            groupby: Some("type".to_string()),
        };
        let filter = parse_filter(&query, Limits::default()).unwrap();
        assert_eq!(filter.start, Some(NaiveDate::from_ymd_opt(2023, 7, 1).unwrap()));
        assert_eq!(filter.end, Some(NaiveDate::from_ymd_opt(2023, 7, 3).unwrap()));
        assert_eq!(filter.bbox, Some(BoundingBox::new(-84.0, 42.0, -83.0, 43.0)));
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.group_by, GroupBy::Type);
    }

    #[test]
    fn defaults_limit_and_groupby() {
        let filter = parse_filter(&RawEventQuery::default(), Limits::default()).unwrap();
        assert_eq!(filter.limit, 1_000);
        assert_eq!(filter.group_by, GroupBy::Type);
        assert!(filter.start.is_none());
        assert!(filter.bbox.is_none());
    }

    #[test]
    fn rejects_malformed_date_naming_value() {
        let query = RawEventQuery {
            start: Some("07/01/2023".to_string()),
            ..RawEventQuery::default()
        };
        let err = parse_filter(&query, Limits::default()).unwrap_err();
        assert_eq!(
            err,
            FilterError::BadDate {
                value: "07/01/2023".to_string()
            }
        );
        assert!(err.to_string().contains("07/01/2023"));
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn rejects_inverted_date_range() {
        let query = RawEventQuery {
            start: Some("2023-07-03".to_string()),
            end: Some("2023-07-01".to_string()),
            ..RawEventQuery::default()
        };
        let err = parse_filter(&query, Limits::default()).unwrap_err();
        assert_eq!(err, FilterError::InvertedDateRange);
    }

    #[test]
    fn rejects_bbox_wrong_arity() {
        let err = parse_filter(&raw(Some("-84,42,-83")), Limits::default()).unwrap_err();
        assert!(matches!(err, FilterError::BadBbox { .. }));
    }

    #[test]
    fn rejects_bbox_non_numeric() {
        let err = parse_filter(&raw(Some("-84,42,east,43")), Limits::default()).unwrap_err();
        assert!(matches!(err, FilterError::BadBbox { .. }));
        assert!(err.to_string().contains("numbers"));
    }

    #[test]
    fn rejects_bbox_non_finite_values() {
        for bad in ["nan,0,1,1", "-inf,0,inf,1", "0,0,1,NaN", "inf,0,1,1"] {
            let err = parse_filter(&raw(Some(bad)), Limits::default()).unwrap_err();
            assert!(matches!(err, FilterError::BadBbox { .. }), "{bad}");
            assert!(err.to_string().contains("numbers"), "{bad}");
        }
    }

    #[test]
    fn rejects_bbox_inverted_lon_axis() {
        let err = parse_filter(&raw(Some("-83,42,-84,43")), Limits::default()).unwrap_err();
        assert!(err.to_string().contains("min<max"));
    }

    #[test]
    fn rejects_bbox_inverted_lat_axis() {
        let err = parse_filter(&raw(Some("-84,43,-83,42")), Limits::default()).unwrap_err();
        assert!(err.to_string().contains("min<max"));
    }

    #[test]
    fn accepts_bbox_with_spaces() {
        let bbox = parse_bbox(" -84 , 42 , -83 , 43 ").unwrap();
        assert_eq!(bbox, BoundingBox::new(-84.0, 42.0, -83.0, 43.0));
    }

    #[test]
    fn rejects_limit_out_of_bounds() {
        for bad in [0i64, -5, 100_001] {
            let query = RawEventQuery {
                limit: Some(bad),
                ..RawEventQuery::default()
            };
            let err = parse_filter(&query, Limits::default()).unwrap_err();
            assert!(matches!(err, FilterError::LimitOutOfRange { .. }), "{bad}");
        }
    }

    #[test]
    fn rejects_disallowed_groupby_listing_allowed_set() {
        let query = RawEventQuery {
            groupby: Some("state".to_string()),
            ..RawEventQuery::default()
        };
        let err = parse_filter(&query, Limits::default()).unwrap_err();
        assert_eq!(
            err,
            FilterError::UnsupportedGroupBy {
                value: "state".to_string(),
                allowed: &["type"],
            }
        );
        assert!(err.to_string().contains("type"));
    }
}
