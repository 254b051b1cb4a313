//! GitHub-style search query parsing.
//!
//! A query is a whitespace separated mix of bare terms and filter clauses:
//!
//! ```text
//! malice title:"Malice\" in the Palace" role=Editor published:(2020-01-01,2020-06-01)
//! ```
//!
//! - `field:value` is a loose ("contains") filter, `field=value` an exact one.
//! - Values and terms may be single or double quoted, with `\` escaping the
//!   quote character and itself. `''` is a valid, empty value.
//! - `field:(from,to)`, `field:(,to)` and `field:(from,)` are date ranges with
//!   ISO-8601 (`YYYY-MM-DD`) bounds.
//!
//! The grammar lives in `grammar.pest`.

use chrono::NaiveDate;
use pest::{
    Parser,
    error::{Error as PestError, InputLocation},
    iterators::Pair,
};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::ParseError;

/// Longest query the parser will look at, in bytes.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

mod grammar {
    use pest_derive::Parser;

    #[derive(Parser)]
    #[grammar = "filtering/grammar.pest"]
    pub struct QueryGrammar;
}

use grammar::{QueryGrammar, Rule};

/// How a filter value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `field:value`, case-insensitive substring match
    Contains,
    /// `field=value`, case-insensitive exact match
    Exact,
}

impl Delimiter {
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Contains => ':',
            Self::Exact => '=',
        }
    }
}

/// A parenthesised date range. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateRange {
    /// `(from,to)`
    Between(NaiveDate, NaiveDate),
    /// `(,to)`
    Until(NaiveDate),
    /// `(from,)`
    Since(NaiveDate),
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Between(from, to) => write!(
                f,
                "({},{})",
                from.format(DATE_FORMAT),
                to.format(DATE_FORMAT)
            ),
            Self::Until(to) => write!(f, "(,{})", to.format(DATE_FORMAT)),
            Self::Since(from) => write!(f, "({},)", from.format(DATE_FORMAT)),
        }
    }
}

/// Right-hand side of a filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Match { delimiter: Delimiter, value: String },
    DateRange(DateRange),
}

impl FilterValue {
    pub fn contains(value: impl Into<String>) -> Self {
        Self::Match {
            delimiter: Delimiter::Contains,
            value: value.into(),
        }
    }

    pub fn exact(value: impl Into<String>) -> Self {
        Self::Match {
            delimiter: Delimiter::Exact,
            value: value.into(),
        }
    }
}

/// Bare terms in input order, and filters keyed by field name.
///
/// A field given twice keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub terms: Vec<String>,
    pub filters: BTreeMap<String, FilterValue>,
}

impl ParsedQuery {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.filters.is_empty()
    }
}

/// Writes the query back in the grammar it was parsed from, so that
/// `parse_query(&parsed.to_string()) == Ok(parsed)`.
impl fmt::Display for ParsedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut separator = "";
        for term in &self.terms {
            write!(f, "{separator}")?;
            write_word(f, term, false)?;
            separator = " ";
        }
        for (field, value) in &self.filters {
            write!(f, "{separator}{field}")?;
            match value {
                FilterValue::Match { delimiter, value } => {
                    write!(f, "{}", delimiter.as_char())?;
                    write_word(f, value, true)?;
                }
                FilterValue::DateRange(range) => write!(f, ":{range}")?,
            }
            separator = " ";
        }
        Ok(())
    }
}

fn is_strict_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, '\'' | '"' | ':' | '='))
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &str, filter_value: bool) -> fmt::Result {
    // A filter value starting with `(` could be read back as a date range.
    let bare = !word.is_empty()
        && word.chars().all(is_strict_char)
        && !(filter_value && word.starts_with('('));
    if bare {
        return write!(f, "{word}");
    }
    f.write_str("\"")?;
    for c in word.chars() {
        if matches!(c, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

/// Parser for search query strings.
///
/// Holds no state; one instance can serve any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchParser;

impl SearchParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Split `query` into bare terms and filter clauses.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the query does not fit the grammar
    /// (unterminated quote, stray `:`/`=`), when a date range bound is not a
    /// real calendar date, or when the query is longer than
    /// [`MAX_SEARCH_QUERY_LENGTH`].
    pub fn parse_query(&self, query: &str) -> Result<ParsedQuery, ParseError> {
        if query.len() > MAX_SEARCH_QUERY_LENGTH {
            return Err(ParseError::new(
                query,
                format!("query is longer than {MAX_SEARCH_QUERY_LENGTH} bytes"),
            ));
        }

        let mut pairs = QueryGrammar::parse(Rule::query, query)
            .map_err(|err| grammar_error(query, &err))?;

        let mut parsed = ParsedQuery::default();
        let Some(root) = pairs.next() else {
            return Ok(parsed);
        };
        for pair in root.into_inner() {
            match pair.as_rule() {
                Rule::filter => {
                    let (field, value) = filter_clause(query, pair)?;
                    parsed.filters.insert(field, value);
                }
                Rule::single_quoted | Rule::double_quoted | Rule::strict_word => {
                    parsed.terms.push(word_value(&pair));
                }
                _ => {}
            }
        }

        tracing::trace!(
            terms = parsed.terms.len(),
            filters = parsed.filters.len(),
            "parsed search query"
        );
        Ok(parsed)
    }
}

/// Parse with a default [`SearchParser`].
///
/// # Errors
///
/// See [`SearchParser::parse_query`].
pub fn parse_query(query: &str) -> Result<ParsedQuery, ParseError> {
    SearchParser::new().parse_query(query)
}

fn grammar_error(query: &str, err: &PestError<Rule>) -> ParseError {
    if let Some(position) = unterminated_quote(query) {
        return ParseError::new(query, "unterminated quoted string").at(position);
    }
    let position = match err.location {
        InputLocation::Pos(pos) | InputLocation::Span((pos, _)) => pos,
    };
    let message = match query.get(position..).and_then(|rest| rest.chars().next()) {
        Some(c) => format!("unexpected '{c}'"),
        None => "unexpected end of query".to_string(),
    };
    ParseError::new(query, message).at(position)
}

/// Byte offset of the first quote that is never closed.
fn unterminated_quote(query: &str) -> Option<usize> {
    let mut chars = query.char_indices();
    while let Some((start, c)) = chars.next() {
        if c != '"' && c != '\'' {
            continue;
        }
        let mut closed = false;
        while let Some((_, inner)) = chars.next() {
            if inner == '\\' {
                chars.next();
            } else if inner == c {
                closed = true;
                break;
            }
        }
        if !closed {
            return Some(start);
        }
    }
    None
}

fn filter_clause(query: &str, pair: Pair<'_, Rule>) -> Result<(String, FilterValue), ParseError> {
    let mut field = String::new();
    let mut delimiter = Delimiter::Contains;
    let mut value = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::field => field = part.as_str().to_string(),
            Rule::delimiter => {
                delimiter = if part.as_str() == "=" {
                    Delimiter::Exact
                } else {
                    Delimiter::Contains
                };
            }
            Rule::date_range => value = Some(FilterValue::DateRange(date_range(query, part)?)),
            Rule::single_quoted | Rule::double_quoted | Rule::strict_word => {
                value = Some(FilterValue::Match {
                    delimiter,
                    value: word_value(&part),
                });
            }
            _ => {}
        }
    }

    let value =
        value.ok_or_else(|| ParseError::new(query, format!("filter '{field}' has no value")))?;
    Ok((field, value))
}

fn date_range(query: &str, pair: Pair<'_, Rule>) -> Result<DateRange, ParseError> {
    let Some(shape) = pair.into_inner().next() else {
        return Err(ParseError::new(query, "empty date range"));
    };
    let rule = shape.as_rule();
    let dates = shape
        .into_inner()
        .map(|date| parse_date(query, &date))
        .collect::<Result<Vec<_>, _>>()?;

    match (rule, dates.as_slice()) {
        (Rule::between, &[from, to]) => Ok(DateRange::Between(from, to)),
        (Rule::until, &[to]) => Ok(DateRange::Until(to)),
        (Rule::since, &[from]) => Ok(DateRange::Since(from)),
        _ => Err(ParseError::new(query, "malformed date range")),
    }
}

fn parse_date(query: &str, pair: &Pair<'_, Rule>) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(pair.as_str(), DATE_FORMAT).map_err(|err| {
        ParseError::new(query, format!("invalid date '{}': {err}", pair.as_str()))
            .at(pair.as_span().start())
    })
}

fn word_value(pair: &Pair<'_, Rule>) -> String {
    match pair.as_rule() {
        Rule::single_quoted | Rule::double_quoted => pair
            .clone()
            .into_inner()
            .next()
            .map_or_else(String::new, |inner| unescape(inner.as_str())),
        _ => pair.as_str().to_string(),
    }
}

/// `\x` becomes `x` for any character `x`.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
