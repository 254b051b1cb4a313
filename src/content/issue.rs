use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Order;
use serde::{Deserialize, Serialize};

use crate::errors::TransformError;
use crate::filtering::{Predicate, SearchConfig};
use crate::traits::SearchableResource;

/// An issue of the publication.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub volume_num: i32,
    pub issue_num: i32,
    pub publish_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::article::Entity")]
    Article,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Short code, e.g. `v3i2`.
    #[must_use]
    pub fn short_name(&self) -> String {
        IssueCode::new(self.volume_num, Some(self.issue_num)).to_string()
    }

    /// e.g. `Volume 3, Issue 2`.
    #[must_use]
    pub fn long_name(&self) -> String {
        format!("Volume {}, Issue {}", self.volume_num, self.issue_num)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Issue {}", self.short_name())
    }
}

/// `v<volume>` or `v<volume>i<issue>`, case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueCode {
    pub volume: i32,
    pub issue: Option<i32>,
}

impl IssueCode {
    #[must_use]
    pub const fn new(volume: i32, issue: Option<i32>) -> Self {
        Self { volume, issue }
    }

    /// Predicate selecting the issue(s) this code names.
    #[must_use]
    pub fn predicate(self) -> Predicate {
        let volume = Predicate::exact(Column::VolumeNum.as_str(), self.volume);
        match self.issue {
            Some(issue) => Predicate::All(vec![
                volume,
                Predicate::exact(Column::IssueNum.as_str(), issue),
            ]),
            None => volume,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issue {
            Some(issue) => write!(f, "v{}i{issue}", self.volume),
            None => write!(f, "v{}", self.volume),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIssueCode(pub String);

impl fmt::Display for InvalidIssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an issue code like v3i2", self.0)
    }
}

impl std::error::Error for InvalidIssueCode {}

fn parse_number(digits: &str) -> Option<i32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for IssueCode {
    type Err = InvalidIssueCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidIssueCode(s.to_string());
        let lower = s.trim().to_ascii_lowercase();
        let rest = lower.strip_prefix('v').ok_or_else(invalid)?;
        let (volume, issue) = match rest.split_once('i') {
            Some((volume, issue)) => (volume, Some(parse_number(issue).ok_or_else(invalid)?)),
            None => (rest, None),
        };
        let volume = parse_number(volume).ok_or_else(invalid)?;
        Ok(Self::new(volume, issue))
    }
}

/// A bare term is an issue code; anything else matches no issue.
fn code_term(term: &str) -> Result<Predicate, TransformError> {
    Ok(term
        .parse::<IssueCode>()
        .map_or(Predicate::Nothing, IssueCode::predicate))
}

fn number_filter(column: Column) -> impl Fn(&str) -> Result<Predicate, TransformError> {
    move |value| {
        Ok(parse_number(value.trim())
            .map_or(Predicate::Nothing, |n| Predicate::exact(column.as_str(), n)))
    }
}

/// Search settings for issues:
///
/// - bare terms: issue codes (`v3i2`, `v3`)
/// - `code:v3i2`, `volume:3`, `issue:2`
/// - `published:(2020-01-01,)` on `publish_date`
pub static SEARCH_CONFIG: LazyLock<SearchConfig> = LazyLock::new(|| {
    SearchConfig::default()
        .terms_with(code_term)
        .transform("code", code_term)
        .transform("volume", number_filter(Column::VolumeNum))
        .transform("issue", number_filter(Column::IssueNum))
        .rename("published", Column::PublishDate.as_str())
});

impl SearchableResource for Model {
    type EntityType = Entity;

    const RESOURCE_NAME_PLURAL: &'static str = "issues";

    fn search_config() -> &'static SearchConfig {
        &SEARCH_CONFIG
    }

    fn default_order() -> (Column, Order) {
        (Column::PublishDate, Order::Desc)
    }
}
