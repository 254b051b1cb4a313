//! # Search & Filtering
//!
//! Turns the `search` and `sort` query parameters of a list endpoint into a
//! Sea-ORM condition and ordering.
//!
//! ## Pipeline
//!
//! 1. **[`query_parser`]**: the raw search string becomes a [`ParsedQuery`]
//!    (bare terms plus `field:value` / `field=value` / `field:(from,to)` filters).
//! 2. **[`search`]**: a [`SearchConfig`] turns the parsed query into a
//!    [`Predicate`]. Terms are searched in every configured field unless a term
//!    transformer is set; filters go through their transformer if they have
//!    one; everything is OR-ed.
//! 3. **[`conditions`]**: field names are resolved against the entity's
//!    columns. A field the entity lacks makes the search match nothing instead
//!    of failing the request.
//! 4. **[`sort`]**: `sort=title` / `sort=-title`.
//!
//! ## Query Examples
//!
//! ```rust,ignore
//! // Any article mentioning "malice" in its title or body
//! GET /articles?search=malice
//!
//! // Quoted phrases and exact matches
//! GET /articles?search="Malice in the Palace" by=Ann
//!
//! // Date ranges (inclusive, either side may be open)
//! GET /articles?search=published:(2020-01-01,2020-06-01)
//! GET /issues?search=published:(,2020-06-01)
//!
//! // Issue short codes, newest first
//! GET /issues?search=v3i2&sort=-publish_date
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use masthead::filtering::{SearchConfig, SearchFilter};
//!
//! let config = SearchConfig::new(["title", "body"]).rename("by", "author");
//! let select = SearchFilter::new(&config)
//!     .filter_select(article::Entity::find(), Some("malice by:ann"))?;
//! ```

pub mod conditions;
pub mod predicate;
pub mod query_parser;
pub mod search;
pub mod sort;

pub use conditions::{SearchFilter, match_nothing, predicate_to_condition};
pub use predicate::{Lookup, Operand, Predicate};
pub use query_parser::{
    DateRange, Delimiter, FilterValue, MAX_SEARCH_QUERY_LENGTH, ParsedQuery, SearchParser,
    parse_query,
};
pub use search::{SearchConfig, TERM_KEY, Transformer, compile};
pub use sort::{apply_sort, parse_sort};
