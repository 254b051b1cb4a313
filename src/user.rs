//! Staff accounts and their editorial roles.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Order, StringLen};
use serde::{Deserialize, Serialize};

use crate::errors::TransformError;
use crate::filtering::{Predicate, SearchConfig};
use crate::traits::SearchableResource;

/// Editorial role. Ordered by privilege: an editor can do everything a
/// copyeditor can, and so on down.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "contributor")]
    Contributor,
    #[sea_orm(string_value = "copyeditor")]
    Copyeditor,
    #[sea_orm(string_value = "editor")]
    Editor,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Contributor, Self::Copyeditor, Self::Editor];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contributor => "contributor",
            Self::Copyeditor => "copyeditor",
            Self::Editor => "editor",
        }
    }

    #[must_use]
    pub fn at_least(self, minimum: Self) -> bool {
        self >= minimum
    }

    /// Every role with at least the privileges of `self`, lowest first.
    pub fn implied_roles(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |role| role.at_least(self))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// `role:copyeditor` finds copyeditors and editors.
fn role_filter(value: &str) -> Result<Predicate, TransformError> {
    let Ok(minimum) = value.parse::<Role>() else {
        return Ok(Predicate::Nothing);
    };
    Ok(Predicate::Any(
        minimum
            .implied_roles()
            .map(|role| Predicate::iexact(Column::Role.as_str(), role.as_str()))
            .collect(),
    ))
}

pub static SEARCH_CONFIG: LazyLock<SearchConfig> = LazyLock::new(|| {
    SearchConfig::new([Column::Username.as_str(), Column::Email.as_str()])
        .transform("role", role_filter)
});

impl SearchableResource for Model {
    type EntityType = Entity;

    const RESOURCE_NAME_PLURAL: &'static str = "users";

    fn search_config() -> &'static SearchConfig {
        &SEARCH_CONFIG
    }

    fn default_order() -> (Column, Order) {
        (Column::Username, Order::Asc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::{compile, parse_query};

    #[test]
    fn test_roles_are_ordered_by_privilege() {
        assert!(Role::Editor.at_least(Role::Copyeditor));
        assert!(Role::Copyeditor.at_least(Role::Copyeditor));
        assert!(!Role::Contributor.at_least(Role::Copyeditor));
    }

    #[test]
    fn test_implied_roles() {
        assert_eq!(
            Role::Copyeditor.implied_roles().collect::<Vec<_>>(),
            vec![Role::Copyeditor, Role::Editor]
        );
        assert_eq!(Role::Contributor.implied_roles().count(), 3);
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("Editor".parse(), Ok(Role::Editor));
        assert_eq!(" copyeditor ".parse(), Ok(Role::Copyeditor));
        assert_eq!(
            "publisher".parse::<Role>(),
            Err(UnknownRole("publisher".to_string()))
        );
        assert_eq!(Role::Contributor.to_string(), "contributor");
    }

    #[test]
    fn test_role_filter_matches_higher_roles() {
        let predicate = compile(&parse_query("role:copyeditor").unwrap(), &SEARCH_CONFIG)
            .unwrap()
            .unwrap();
        assert_eq!(
            predicate,
            Predicate::Any(vec![Predicate::Any(vec![
                Predicate::iexact("role", "copyeditor"),
                Predicate::iexact("role", "editor"),
            ])])
        );
    }

    #[test]
    fn test_unknown_role_matches_nothing() {
        assert_eq!(role_filter("publisher").unwrap(), Predicate::Nothing);
    }
}
