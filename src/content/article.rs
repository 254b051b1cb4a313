use std::sync::LazyLock;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Order;
use serde::{Deserialize, Serialize};

use crate::errors::TransformError;
use crate::filtering::{Predicate, SearchConfig};
use crate::traits::SearchableResource;

/// An article, optionally placed in an issue and published.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    /// A secondary title, usually typeset smaller below the title.
    pub sub_title: String,
    pub author: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub issue_id: Option<i32>,
    pub published_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::issue::Entity",
        from = "Column::IssueId",
        to = "super::issue::Column::Id"
    )]
    Issue,
}

impl Related<super::issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issue.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// `status:draft` / `status:published`; any other status matches nothing.
fn status_filter(value: &str) -> Result<Predicate, TransformError> {
    let published_at = Column::PublishedAt.as_str();
    Ok(match value.trim().to_ascii_lowercase().as_str() {
        "draft" => Predicate::is_null(published_at, true),
        "published" => Predicate::is_null(published_at, false),
        _ => Predicate::Nothing,
    })
}

/// Search settings for articles:
///
/// - bare terms: `title` and `body`
/// - `by:<author>`, `status:draft|published`
/// - `published:(2020-01-01,2020-06-01)` on `published_at`
pub static SEARCH_CONFIG: LazyLock<SearchConfig> = LazyLock::new(|| {
    SearchConfig::new([Column::Title.as_str(), Column::Body.as_str()])
        .rename("by", Column::Author.as_str())
        .rename("published", Column::PublishedAt.as_str())
        .transform("status", status_filter)
});

impl SearchableResource for Model {
    type EntityType = Entity;

    const RESOURCE_NAME_PLURAL: &'static str = "articles";

    fn search_config() -> &'static SearchConfig {
        &SEARCH_CONFIG
    }

    fn default_order() -> (Column, Order) {
        (Column::Title, Order::Asc)
    }
}
