use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;

use crate::errors::ApiError;
use crate::models::SearchOptions;
use crate::traits::SearchableResource;

/// Header carrying the number of records matching the search, before paging.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// `GET /<resource>?search=..&sort=..&page=..&per_page=..`
///
/// # Errors
///
/// `400` for a malformed search or unknown sort column; `500` on database or
/// transformer failure. A search on an unknown field is a `200` with an empty
/// list.
pub async fn list<T>(
    Query(options): Query<SearchOptions>,
    State(db): State<DatabaseConnection>,
) -> Result<(HeaderMap, Json<Vec<T>>), ApiError>
where
    T: SearchableResource + Serialize,
    <T::EntityType as EntityTrait>::Model: Sync,
{
    let (items, total) = T::search(&db, &options).await?;

    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));
    Ok((headers, Json(items)))
}
