use chrono::NaiveDate;

use super::query_parser::DateRange;

/// A boolean filter over a record collection, still independent of any
/// particular entity. Field names are plain strings here; they are resolved
/// against real columns in [`super::conditions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// At least one of the inner predicates holds. Empty means nothing matches.
    Any(Vec<Predicate>),
    /// All inner predicates hold. Empty means everything matches.
    All(Vec<Predicate>),
    Compare { field: String, lookup: Lookup },
    /// Matches no record.
    Nothing,
}

/// Comparison applied to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Case-insensitive substring match on the field's text form
    IContains(String),
    /// Case-insensitive equality on the field's text form
    IExact(String),
    /// Typed equality
    Exact(Operand),
    /// `true` for `IS NULL`, `false` for `IS NOT NULL`
    IsNull(bool),
    /// Inclusive range over the date part of the field
    Date(DateRange),
}

/// Typed right-hand side of [`Lookup::Exact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for Operand {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Operand> for sea_orm::Value {
    fn from(operand: Operand) -> Self {
        match operand {
            Operand::Text(text) => text.into(),
            Operand::Integer(int) => int.into(),
            Operand::Boolean(flag) => flag.into(),
            Operand::Date(date) => date.into(),
        }
    }
}

impl Predicate {
    pub fn compare(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Compare {
            field: field.into(),
            lookup,
        }
    }

    pub fn icontains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, Lookup::IContains(value.into()))
    }

    pub fn iexact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, Lookup::IExact(value.into()))
    }

    pub fn exact(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::compare(field, Lookup::Exact(value.into()))
    }

    pub fn is_null(field: impl Into<String>, null: bool) -> Self {
        Self::compare(field, Lookup::IsNull(null))
    }

    pub fn date_range(field: impl Into<String>, range: DateRange) -> Self {
        Self::compare(field, Lookup::Date(range))
    }
}
