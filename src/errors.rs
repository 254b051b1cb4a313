//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - [`ParseError`] and [`SearchError`] come out of the search core. They know
//!   nothing about HTTP.
//! - [`ApiError`] is what request handlers return. It maps to a status code,
//!   sends a sanitized JSON body and logs internal details through `tracing`.
//!
//! A malformed query (`published:(2020-13-01,)`, an unterminated quote) is the
//! user's fault and becomes a `400`. A filter on a field the resource does not
//! have is *not* an error at all: the filter fails closed and the list comes
//! back empty (see [`crate::filtering::SearchFilter`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use masthead::ApiError;
//!
//! async fn my_handler() -> Result<Json<Vec<issue::Model>>, ApiError> {
//!     let condition = SearchFilter::new(&CONFIG).condition::<issue::Entity>(query)?;
//!     let issues = issue::Entity::find().filter(condition).all(db).await?;
//!     Ok(Json(issues))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Error returned by a search transformer. Transformers are trusted caller
/// code; whatever they return is passed through unmodified.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// A search string that does not fit the query grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The offending query, verbatim
    pub query: String,
    /// What went wrong
    pub message: String,
    /// Byte offset into `query`, when the grammar could pin one down
    pub position: Option<usize>,
}

impl ParseError {
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            message: message.into(),
            position: None,
        }
    }

    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(
                f,
                "invalid search query {:?} at position {position}: {}",
                self.query, self.message
            ),
            None => write!(f, "invalid search query {:?}: {}", self.query, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Everything that can go wrong between a raw search string and a
/// database condition.
#[derive(Debug)]
pub enum SearchError {
    /// The query string does not parse
    Parse(ParseError),
    /// A filter references a field the entity does not have
    UnknownField(String),
    /// The sort directive names a column the entity does not have
    UnknownSortField(String),
    /// A caller-supplied transformer failed
    Transformer(TransformError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => err.fmt(f),
            Self::UnknownField(field) => write!(f, "unknown search field '{field}'"),
            Self::UnknownSortField(field) => write!(f, "unknown sort field '{field}'"),
            Self::Transformer(err) => write!(f, "search transformer failed: {err}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Transformer(err) => Some(err.as_ref()),
            Self::UnknownField(_) | Self::UnknownSortField(_) => None,
        }
    }
}

impl From<ParseError> for SearchError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - Invalid input from user
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 400 Bad Request error
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(ApiError::bad_request("Cannot sort by 'colour'"));
    /// ```
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    fn user_message(&self) -> String {
        match self {
            Self::BadRequest { message }
            | Self::Database { message, .. }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// Convert SeaORM `DbErr` to `ApiError`: always a 500, details logged only.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}

/// Convert a `SearchError` to `ApiError`
///
/// - Parse and sort errors → 400 with the reason
/// - Transformer errors → 500 (details logged only)
/// - Unknown filter fields normally never get here because the filter fails
///   closed; if one does, it is the client's problem → 400
impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Parse(parse) => {
                Self::bad_request(format!("Invalid search query: {}", parse.message))
            }
            SearchError::UnknownSortField(field) => {
                Self::bad_request(format!("Cannot sort by '{field}'"))
            }
            SearchError::UnknownField(field) => {
                Self::bad_request(format!("Cannot search by '{field}'"))
            }
            SearchError::Transformer(inner) => {
                Self::internal("Search failed", Some(inner.to_string()))
            }
        }
    }
}
