use std::str::FromStr;

use sea_orm::{EntityTrait, QueryOrder, Select, sea_query::Order};

use crate::errors::SearchError;

/// Parse a `sort` directive: a column name, optionally prefixed with `-` for
/// descending order. Blank input means "no directive".
///
/// The column must exist on `E`; nothing else is checked.
///
/// # Errors
///
/// [`SearchError::UnknownSortField`] when `E` has no such column.
pub fn parse_sort<E: EntityTrait>(sort: &str) -> Result<Option<(E::Column, Order)>, SearchError> {
    let sort = sort.trim();
    if sort.is_empty() {
        return Ok(None);
    }

    let (name, order) = match sort.strip_prefix('-') {
        Some(name) => (name, Order::Desc),
        None => (sort, Order::Asc),
    };

    E::Column::from_str(name)
        .map(|column| Some((column, order)))
        .map_err(|_| SearchError::UnknownSortField(name.to_string()))
}

/// Order `select` by `sort`, falling back to `default` when there is no
/// directive.
///
/// # Errors
///
/// See [`parse_sort`].
pub fn apply_sort<E: EntityTrait>(
    select: Select<E>,
    sort: Option<&str>,
    default: (E::Column, Order),
) -> Result<Select<E>, SearchError> {
    let directive = match sort {
        Some(sort) => parse_sort::<E>(sort)?,
        None => None,
    };
    let (column, order) = directive.unwrap_or(default);
    Ok(select.order_by(column, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::issue;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_ascending_by_default() {
        let (column, order) = parse_sort::<issue::Entity>("volume_num").unwrap().unwrap();
        assert!(matches!(column, issue::Column::VolumeNum));
        assert!(matches!(order, Order::Asc));
    }

    #[test]
    fn test_dash_prefix_is_descending() {
        let (column, order) = parse_sort::<issue::Entity>("-publish_date").unwrap().unwrap();
        assert!(matches!(column, issue::Column::PublishDate));
        assert!(matches!(order, Order::Desc));
    }

    #[test]
    fn test_blank_sort_is_no_directive() {
        assert!(parse_sort::<issue::Entity>("").unwrap().is_none());
        assert!(parse_sort::<issue::Entity>("  ").unwrap().is_none());
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let err = parse_sort::<issue::Entity>("-colour").unwrap_err();
        assert!(matches!(err, SearchError::UnknownSortField(field) if field == "colour"));
    }

    #[test]
    fn test_apply_sort_falls_back_to_default() {
        let sql = apply_sort(
            issue::Entity::find(),
            None,
            (issue::Column::Id, Order::Asc),
        )
        .unwrap()
        .build(DbBackend::Sqlite)
        .to_string();
        assert!(sql.ends_with("ORDER BY \"issues\".\"id\" ASC"), "{sql}");

        let sql = apply_sort(
            issue::Entity::find(),
            Some("-issue_num"),
            (issue::Column::Id, Order::Asc),
        )
        .unwrap()
        .build(DbBackend::Sqlite)
        .to_string();
        assert!(sql.ends_with("ORDER BY \"issues\".\"issue_num\" DESC"), "{sql}");
    }
}
