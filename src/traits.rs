use async_trait::async_trait;
use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, QuerySelect, Select, sea_query::Order,
};

use crate::errors::ApiError;
use crate::filtering::{SearchConfig, SearchFilter, apply_sort};
use crate::models::SearchOptions;

/// A list endpoint backed by a Sea-ORM entity and searchable with the query
/// language in [`crate::filtering`].
#[async_trait]
pub trait SearchableResource: Sized + Send + Sync + 'static
where
    Self: From<<Self::EntityType as EntityTrait>::Model>,
    <Self::EntityType as EntityTrait>::Model: Sync,
{
    type EntityType: EntityTrait + Sync;

    const RESOURCE_NAME_PLURAL: &'static str;

    /// Search fields and transformers for this resource.
    fn search_config() -> &'static SearchConfig;

    /// Order used when the request has no `sort`.
    fn default_order() -> (<Self::EntityType as EntityTrait>::Column, Order);

    /// The filtered and sorted select, before pagination.
    ///
    /// # Errors
    ///
    /// `400` for a malformed search or an unknown sort column, `500` when a
    /// transformer fails.
    fn search_select(options: &SearchOptions) -> Result<Select<Self::EntityType>, ApiError> {
        let select = SearchFilter::new(Self::search_config())
            .filter_select(Self::EntityType::find(), options.search.as_deref())?;
        Ok(apply_sort(select, options.sort.as_deref(), Self::default_order())?)
    }

    /// One page of matching records, and how many records match in total.
    ///
    /// The search is parsed and compiled once; the same select serves the
    /// count and the page.
    async fn search(
        db: &DatabaseConnection,
        options: &SearchOptions,
    ) -> Result<(Vec<Self>, u64), ApiError> {
        let select = Self::search_select(options)?;
        let total = select.clone().count(db).await?;

        let (offset, limit) = options.pagination();
        let models = select.offset(offset).limit(limit).all(db).await?;
        tracing::debug!(
            resource = Self::RESOURCE_NAME_PLURAL,
            count = models.len(),
            total,
            "search returned records"
        );
        Ok((models.into_iter().map(Self::from).collect(), total))
    }
}
