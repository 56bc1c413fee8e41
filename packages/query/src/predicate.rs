//! Backend-neutral filter predicates and their SQL rendering.
//!
//! A [`Predicate`] is an ordered list of conjunctive clauses. Every bound is
//! an already-validated float or date — never a raw request string — so the
//! rendered text is injection-safe by construction. Clause order is
//! preserved so rendered queries are reproducible.

use std::fmt::Write as _;

use chrono::NaiveDate;
use storm_api_models::EventFilter;

/// Comparison operator for a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl Op {
    const fn sql(self) -> &'static str {
        match self {
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

/// A typed clause bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// A validated numeric bound.
    Number(f64),
    /// A validated date bound.
    Date(NaiveDate),
}

/// One `column op bound` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Fixed column name (never request-derived).
    pub column: &'static str,
    /// Comparison operator.
    pub op: Op,
    /// Validated bound value.
    pub bound: Bound,
}

/// An ordered, conjunctive set of filter clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Builds the predicate for a validated filter.
    ///
    /// The coordinate sanity bounds (`lon` in [-180, 180], `lat` in
    /// [-90, 90]) are always present so malformed source rows never survive
    /// into results, followed by date bounds and bbox bounds when set.
    #[must_use]
    pub fn for_filter(filter: &EventFilter) -> Self {
        let mut clauses = vec![
            clause("lon", Op::Ge, Bound::Number(-180.0)),
            clause("lon", Op::Le, Bound::Number(180.0)),
            clause("lat", Op::Ge, Bound::Number(-90.0)),
            clause("lat", Op::Le, Bound::Number(90.0)),
        ];

        if let Some(start) = filter.start {
            clauses.push(clause("date", Op::Ge, Bound::Date(start)));
        }
        if let Some(end) = filter.end {
            clauses.push(clause("date", Op::Le, Bound::Date(end)));
        }

        if let Some(bbox) = filter.bbox {
            clauses.push(clause("lon", Op::Ge, Bound::Number(bbox.min_lon)));
            clauses.push(clause("lon", Op::Le, Bound::Number(bbox.max_lon)));
            clauses.push(clause("lat", Op::Ge, Bound::Number(bbox.min_lat)));
            clauses.push(clause("lat", Op::Le, Bound::Number(bbox.max_lat)));
        }

        Self { clauses }
    }

    /// The clauses in build order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Renders the predicate as SQL text, clauses joined with ` AND `.
    ///
    /// Valid for both Athena and DuckDB: numeric literals from `f64`, date
    /// literals as `DATE 'YYYY-MM-DD'`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for (i, c) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            match c.bound {
                Bound::Number(n) => write!(sql, "{} {} {n}", c.column, c.op.sql()),
                Bound::Date(d) => {
                    write!(sql, "{} {} DATE '{}'", c.column, c.op.sql(), d.format("%Y-%m-%d"))
                }
            }
            .unwrap();
        }
        sql
    }
}

const fn clause(column: &'static str, op: Op, bound: Bound) -> Clause {
    Clause { column, op, bound }
}
