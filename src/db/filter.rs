//! Shared WHERE-clause construction for the filtered list screens.
//!
//! Every list endpoint funnels its optional criteria through [`FilterBuilder`]
//! so that the COUNT and SELECT sides of a paginated query are built from one
//! `Condition` value and cannot drift apart.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, Value};

/// Inclusive day range used by every dated list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub const DEFAULT_WINDOW_DAYS: i64 = 30;

    /// Resolves optional bounds against today: a missing end means "today",
    /// a missing start means a trailing 30-day window.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or_else(|| today - Duration::days(Self::DEFAULT_WINDOW_DAYS));
        Self { start, end }
    }

    fn start_bound(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN))
    }

    /// First instant after the range; the end date itself stays inclusive.
    fn end_bound_exclusive(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&(self.end.and_time(NaiveTime::MIN) + Duration::days(1)))
    }
}

/// Accumulates optional list filters into a single `Condition`.
///
/// Absent or blank criteria are "no filter", never an error; numeric ids
/// at or below zero mean "no filter" as well.
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    condition: Condition,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self {
            condition: Condition::all(),
        }
    }

    /// Constrains a timestamp column to an inclusive day range.
    pub fn date_range<C: ColumnTrait>(mut self, column: C, range: &DateRange) -> Self {
        self.condition = self
            .condition
            .add(column.gte(range.start_bound()))
            .add(column.lt(range.end_bound_exclusive()));
        self
    }

    /// Adds an exact-match predicate when the value is present.
    pub fn equals<C, V>(mut self, column: C, value: Option<V>) -> Self
    where
        C: ColumnTrait,
        V: Into<Value>,
    {
        if let Some(value) = value {
            self.condition = self.condition.add(column.eq(value));
        }
        self
    }

    /// Adds a foreign-key predicate; `None` and ids <= 0 are unfiltered.
    pub fn foreign_key<C: ColumnTrait>(mut self, column: C, id: Option<i64>) -> Self {
        if let Some(id) = id.filter(|id| *id > 0) {
            self.condition = self.condition.add(column.eq(id));
        }
        self
    }

    /// Adds a case-insensitive `%term%` match over the page's searchable
    /// columns, OR-ed together; each column contributes one predicate.
    pub fn search<I>(mut self, term: Option<&str>, columns: I) -> Self
    where
        I: IntoIterator<Item = SimpleExpr>,
    {
        let term = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => term,
            None => return self,
        };
        let needle = format!("%{}%", term.to_lowercase());

        let mut any = Condition::any();
        for column in columns {
            any = any.add(Expr::expr(Func::lower(column)).like(needle.as_str()));
        }
        self.condition = self.condition.add(any);
        self
    }

    /// Returns the combined condition; with no filters set this is an empty
    /// conjunction, i.e. no WHERE restriction at all.
    pub fn build(self) -> Condition {
        self.condition
    }
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
