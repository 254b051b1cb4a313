//! Search for a periodical's content management system.
//!
//! Users type GitHub-style queries (`malice by:ann published:(2020-01-01,)`);
//! [`filtering`] parses them, compiles them against a resource's
//! [`SearchConfig`] and turns the result into a Sea-ORM condition. List
//! endpoints built on [`SearchableResource`] and [`routes::list`] add sorting
//! and pagination on top.

pub mod content;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod routes;
pub mod traits;
pub mod user;

pub use errors::{ApiError, ParseError, SearchError, TransformError};
pub use filtering::{
    DateRange, Delimiter, FilterValue, Lookup, Operand, ParsedQuery, Predicate, SearchConfig,
    SearchFilter, SearchParser, Transformer, compile, parse_query,
};
pub use models::SearchOptions;
pub use traits::SearchableResource;
