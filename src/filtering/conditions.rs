use std::str::FromStr;

use sea_orm::{
    Condition, EntityTrait, QueryFilter, Select,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};

use super::predicate::{Lookup, Predicate};
use super::query_parser::{DateRange, SearchParser};
use super::search::{SearchConfig, compile};
use crate::errors::SearchError;

/// Escape LIKE wildcards so user input only ever matches literally.
/// Escapes: `%` (match any) and `_` (match single char), and the escape
/// character itself.
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// A condition no row satisfies.
#[must_use]
pub fn match_nothing() -> Condition {
    Condition::all().add(Expr::val(1).eq(0))
}

fn resolve_column<E: EntityTrait>(field: &str) -> Result<E::Column, SearchError> {
    E::Column::from_str(field).map_err(|_| SearchError::UnknownField(field.to_string()))
}

fn column_expr<E: EntityTrait>(column: E::Column) -> Expr {
    Expr::col((E::default(), column))
}

/// `UPPER(CAST(col AS TEXT))`, so that `:` and `=` work on any column type.
fn upper_text<E: EntityTrait>(column: E::Column) -> Expr {
    Expr::expr(Func::upper(
        column_expr::<E>(column).cast_as(Alias::new("TEXT")),
    ))
}

/// `DATE(col)`
fn date_part<E: EntityTrait>(column: E::Column) -> Expr {
    Expr::expr(Func::cust(Alias::new("DATE")).arg(column_expr::<E>(column)))
}

fn lookup_expr<E: EntityTrait>(column: E::Column, lookup: &Lookup) -> SimpleExpr {
    match lookup {
        Lookup::IContains(value) => {
            let pattern = format!("%{}%", escape_like_wildcards(value).to_uppercase());
            upper_text::<E>(column).like(LikeExpr::new(pattern).escape('\\'))
        }
        Lookup::IExact(value) => upper_text::<E>(column).eq(value.to_uppercase()),
        Lookup::Exact(operand) => {
            column_expr::<E>(column).eq(sea_orm::Value::from(operand.clone()))
        }
        Lookup::IsNull(true) => column_expr::<E>(column).is_null(),
        Lookup::IsNull(false) => column_expr::<E>(column).is_not_null(),
        Lookup::Date(DateRange::Until(to)) => date_part::<E>(column).lte(*to),
        Lookup::Date(DateRange::Since(from)) => date_part::<E>(column).gte(*from),
        Lookup::Date(DateRange::Between(from, to)) => date_part::<E>(column).between(*from, *to),
    }
}

/// Resolve every field of `predicate` against `E`'s columns and build the
/// matching Sea-ORM condition.
///
/// # Errors
///
/// [`SearchError::UnknownField`] for the first field `E` does not have.
pub fn predicate_to_condition<E: EntityTrait>(
    predicate: &Predicate,
) -> Result<Condition, SearchError> {
    match predicate {
        Predicate::Any(inner) if inner.is_empty() => Ok(match_nothing()),
        Predicate::Any(inner) => inner
            .iter()
            .try_fold(Condition::any(), |condition, predicate| {
                Ok(condition.add(predicate_to_condition::<E>(predicate)?))
            }),
        Predicate::All(inner) => inner
            .iter()
            .try_fold(Condition::all(), |condition, predicate| {
                Ok(condition.add(predicate_to_condition::<E>(predicate)?))
            }),
        Predicate::Compare { field, lookup } => {
            let column = resolve_column::<E>(field)?;
            Ok(Condition::all().add(lookup_expr::<E>(column, lookup)))
        }
        Predicate::Nothing => Ok(match_nothing()),
    }
}

/// Filter backend: search string in, Sea-ORM condition out.
///
/// Parse errors and transformer errors are returned to the caller. A filter on
/// a field the entity does not have is not: search input comes straight from
/// users, so the whole search fails closed and matches nothing.
#[derive(Debug, Clone, Copy)]
pub struct SearchFilter<'a> {
    parser: SearchParser,
    config: &'a SearchConfig,
}

impl<'a> SearchFilter<'a> {
    #[must_use]
    pub const fn new(config: &'a SearchConfig) -> Self {
        Self {
            parser: SearchParser::new(),
            config,
        }
    }

    /// Condition for `search`, or `None` when the search does not restrict
    /// anything.
    ///
    /// # Errors
    ///
    /// [`SearchError::Parse`] and [`SearchError::Transformer`].
    pub fn condition<E: EntityTrait>(
        &self,
        search: &str,
    ) -> Result<Option<Condition>, SearchError> {
        let parsed = self.parser.parse_query(search)?;
        let Some(predicate) = compile(&parsed, self.config)? else {
            return Ok(None);
        };

        match predicate_to_condition::<E>(&predicate) {
            Ok(condition) => Ok(Some(condition)),
            Err(SearchError::UnknownField(field)) => {
                tracing::debug!(
                    field = %field,
                    entity = %E::default().table_name(),
                    "search references unknown field, matching nothing"
                );
                Ok(Some(match_nothing()))
            }
            Err(err) => Err(err),
        }
    }

    /// Apply `search` (if any) to `select`.
    ///
    /// # Errors
    ///
    /// See [`SearchFilter::condition`].
    pub fn filter_select<E: EntityTrait>(
        &self,
        select: Select<E>,
        search: Option<&str>,
    ) -> Result<Select<E>, SearchError> {
        let Some(search) = search else {
            return Ok(select);
        };
        Ok(match self.condition::<E>(search)? {
            Some(condition) => select.filter(condition),
            None => select,
        })
    }
}
