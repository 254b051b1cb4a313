//! Compiling a [`ParsedQuery`] into a [`Predicate`].
//!
//! A resource declares which fields bare terms are searched in and, optionally,
//! transformers that take over individual filter names:
//!
//! ```rust,ignore
//! let config = SearchConfig::new(["title", "body"])
//!     .rename("by", "author")
//!     .transform("status", |value| match value {
//!         "draft" => Ok(Predicate::is_null("published_at", true)),
//!         _ => Ok(Predicate::is_null("published_at", false)),
//!     });
//! ```
//!
//! Everything the compiler produces is OR-ed together: a record matches when
//! any term is found in any search field, or any filter holds. Search here is
//! deliberately permissive; callers that need `AND` semantics between terms
//! should not rely on it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::predicate::Predicate;
use super::query_parser::{Delimiter, FilterValue, ParsedQuery};
use crate::errors::{SearchError, TransformError};

/// Transformer key that takes over bare term search.
pub const TERM_KEY: &str = "__term";

/// Signature of a function transformer.
pub type TransformFn = dyn Fn(&str) -> Result<Predicate, TransformError> + Send + Sync;

/// Caller-supplied override for one filter name (or for bare terms).
///
/// Transformers are trusted code. An error returned by one is handed back to
/// the caller as [`SearchError::Transformer`] without being inspected.
#[derive(Clone)]
pub enum Transformer {
    /// Use a different physical column, keep the default comparison.
    Rename(String),
    /// Build the predicate from the raw value.
    Function(Arc<TransformFn>),
}

impl Transformer {
    pub fn rename(column: impl Into<String>) -> Self {
        Self::Rename(column.into())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<Predicate, TransformError> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename(column) => f.debug_tuple("Rename").field(column).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Per-resource search settings. Built once, shared read-only between
/// requests.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    search_fields: Vec<String>,
    transformers: HashMap<String, Transformer>,
    term_transformer: Option<Transformer>,
}

impl SearchConfig {
    /// Search bare terms in `search_fields`.
    pub fn new<I, S>(search_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            search_fields: search_fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Register a transformer for `field`. The key [`TERM_KEY`] registers the
    /// term transformer instead.
    #[must_use]
    pub fn transformer(mut self, field: impl Into<String>, transformer: Transformer) -> Self {
        let field = field.into();
        if field == TERM_KEY {
            self.term_transformer = Some(transformer);
        } else {
            self.transformers.insert(field, transformer);
        }
        self
    }

    /// Let users write `field` for the physical column `column`.
    #[must_use]
    pub fn rename(self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.transformer(field, Transformer::rename(column))
    }

    #[must_use]
    pub fn transform<F>(self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> Result<Predicate, TransformError> + Send + Sync + 'static,
    {
        self.transformer(field, Transformer::function(f))
    }

    /// Replace per-field term search with `f`.
    #[must_use]
    pub fn terms_with<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Predicate, TransformError> + Send + Sync + 'static,
    {
        self.transformer(TERM_KEY, Transformer::function(f))
    }
}

/// Build the predicate for `parsed`.
///
/// Returns `Ok(None)` when the query produced no fragment at all (empty
/// query, or no terms and no search fields), meaning "do not filter".
///
/// # Errors
///
/// Only [`SearchError::Transformer`], passed through from a transformer.
pub fn compile(
    parsed: &ParsedQuery,
    config: &SearchConfig,
) -> Result<Option<Predicate>, SearchError> {
    let mut fragments = Vec::new();

    match &config.term_transformer {
        // The term transformer replaces default term search, it does not add to it.
        Some(transformer) => {
            for term in &parsed.terms {
                fragments.push(transform_term(transformer, term)?);
            }
        }
        None => {
            for field in &config.search_fields {
                for term in &parsed.terms {
                    fragments.push(Predicate::icontains(field.as_str(), term.as_str()));
                }
            }
        }
    }

    for (field, value) in &parsed.filters {
        fragments.push(compile_filter(field, value, config)?);
    }

    tracing::debug!(
        terms = parsed.terms.len(),
        filters = parsed.filters.len(),
        fragments = fragments.len(),
        "compiled search predicate"
    );

    if fragments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Predicate::Any(fragments)))
    }
}

fn transform_term(transformer: &Transformer, term: &str) -> Result<Predicate, SearchError> {
    match transformer {
        Transformer::Function(f) => f(term).map_err(SearchError::Transformer),
        Transformer::Rename(column) => Ok(Predicate::icontains(column.as_str(), term)),
    }
}

fn compile_filter(
    field: &str,
    value: &FilterValue,
    config: &SearchConfig,
) -> Result<Predicate, SearchError> {
    let transformer = config.transformers.get(field);
    let column = match transformer {
        Some(Transformer::Rename(column)) => column.as_str(),
        _ => field,
    };

    match value {
        // Ranges are structural: they compile the same with or without a function transformer.
        FilterValue::DateRange(range) => Ok(Predicate::date_range(column, *range)),
        FilterValue::Match { delimiter, value } => match transformer {
            Some(Transformer::Function(f)) => f(value).map_err(SearchError::Transformer),
            _ => Ok(match delimiter {
                Delimiter::Contains => Predicate::icontains(column, value.as_str()),
                Delimiter::Exact => Predicate::iexact(column, value.as_str()),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::query_parser::{DateRange, parse_query};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn compiled(query: &str, config: &SearchConfig) -> Option<Predicate> {
        compile(&parse_query(query).unwrap(), config).unwrap()
    }

    #[test]
    fn test_empty_query_compiles_to_nothing() {
        let config = SearchConfig::new(["title"]);
        assert_eq!(compiled("", &config), None);
    }

    #[test]
    fn test_terms_search_every_field() {
        let config = SearchConfig::new(["title", "body"]);
        assert_eq!(
            compiled("malice palace", &config),
            Some(Predicate::Any(vec![
                Predicate::icontains("title", "malice"),
                Predicate::icontains("title", "palace"),
                Predicate::icontains("body", "malice"),
                Predicate::icontains("body", "palace"),
            ]))
        );
    }

    #[test]
    fn test_terms_without_search_fields_produce_nothing() {
        assert_eq!(compiled("hello", &SearchConfig::default()), None);
    }

    #[test]
    fn test_delimiter_picks_comparison() {
        let config = SearchConfig::default();
        assert_eq!(
            compiled("title:malice author=Ann", &config),
            Some(Predicate::Any(vec![
                Predicate::iexact("author", "Ann"),
                Predicate::icontains("title", "malice"),
            ]))
        );
    }

    #[test]
    fn test_term_transformer_replaces_field_search() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let config = SearchConfig::new(["title", "body"]).terms_with(move |term| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Predicate::iexact("code", term))
        });

        assert_eq!(
            compiled("v3i2 v4", &config),
            Some(Predicate::Any(vec![
                Predicate::iexact("code", "v3i2"),
                Predicate::iexact("code", "v4"),
            ]))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_term_key_routes_to_term_transformer() {
        let config = SearchConfig::new(["title"])
            .transformer(TERM_KEY, Transformer::function(|_| Ok(Predicate::Nothing)));
        assert_eq!(
            compiled("anything", &config),
            Some(Predicate::Any(vec![Predicate::Nothing]))
        );
    }

    #[test]
    fn test_field_transformer_overrides_default_comparison() {
        let config = SearchConfig::default()
            .transform("role", |value| Ok(Predicate::exact("role_rank", value.len() as i64)));
        assert_eq!(
            compiled("role=Editor", &config),
            Some(Predicate::Any(vec![Predicate::exact("role_rank", 6_i64)]))
        );
    }

    #[test]
    fn test_rename_keeps_default_comparison() {
        let config = SearchConfig::default().rename("by", "author");
        assert_eq!(
            compiled("by:ann", &config),
            Some(Predicate::Any(vec![Predicate::icontains("author", "ann")]))
        );
    }

    #[test]
    fn test_date_range_takes_precedence_over_transformer() {
        let config = SearchConfig::default()
            .transform("published", |_| Err("should not be called".into()))
            .rename("since", "published_at");
        let from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(
            compiled("published:(2020-01-01,) since:(2020-01-01,)", &config),
            Some(Predicate::Any(vec![
                Predicate::date_range("published", DateRange::Since(from)),
                Predicate::date_range("published_at", DateRange::Since(from)),
            ]))
        );
    }

    #[test]
    fn test_transformer_error_passes_through() {
        let config = SearchConfig::default().transform("volume", |value| {
            value
                .parse::<i64>()
                .map(|n| Predicate::exact("volume_num", n))
                .map_err(Into::into)
        });
        let err = compile(&parse_query("volume:three").unwrap(), &config).unwrap_err();
        match err {
            SearchError::Transformer(inner) => {
                assert_eq!(inner.to_string(), "invalid digit found in string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_terms_and_filters_are_or_ed() {
        let config = SearchConfig::new(["title"]);
        assert_eq!(
            compiled("hello is:me", &config),
            Some(Predicate::Any(vec![
                Predicate::icontains("title", "hello"),
                Predicate::icontains("is", "me"),
            ]))
        );
    }
}
