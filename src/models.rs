use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Page size when the request does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 25;
/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u64 = 100;
/// Largest offset the database drivers accept (they bind it as `i64`).
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Query parameters for searching, sorting and paging a list endpoint.
///
/// # Searching
/// `search` takes a GitHub-style query:
/// - **Bare terms** are looked up in the resource's search fields: `malice palace`
/// - **Loose filters** (substring, case-insensitive): `title:malice`
/// - **Exact filters** (case-insensitive): `author="Ann Smith"`
/// - **Date ranges**, inclusive, either end open: `published:(2020-01-01,2020-06-01)`,
///   `published:(,2020-06-01)`, `published:(2020-01-01,)`
///
/// # Sorting
/// `sort` is a column name, prefixed with `-` for descending order, for example `-publish_date`.
///
/// # Pagination
/// `page` (1-based) and `per_page`, for example `page=2&per_page=10`.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct SearchOptions {
    /// GitHub-style search query.
    ///
    /// Example: `malice by:ann published:(2020-01-01,)`
    #[param(example = "malice by:ann published:(2020-01-01,)")]
    pub search: Option<String>,
    /// Column to sort by, `-` prefix for descending.
    ///
    /// Example: `-publish_date`
    #[param(example = "-publish_date")]
    pub sort: Option<String>,
    /// Page number (1-based).
    ///
    /// Example: `1`
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Number of items per page.
    ///
    /// Example: `25`
    #[param(example = 25)]
    pub per_page: Option<u64>,
}

impl SearchOptions {
    /// `(offset, limit)` for the requested page. Page 0 is treated as page 1,
    /// `per_page` is clamped to `1..=MAX_PAGE_SIZE` and the offset never
    /// exceeds `i64::MAX`.
    #[must_use]
    pub fn pagination(&self) -> (u64, u64) {
        let limit = self
            .per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        ((page - 1).saturating_mul(limit).min(MAX_OFFSET), limit)
    }
}
