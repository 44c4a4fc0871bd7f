//! Shared query parameter types for API handlers.
//!
//! Grid endpoints (`/rows`, `/export`) accept the same view parameters, so
//! they are parsed once here into a [`GridQuery`].

use serde::Deserialize;
use shelfwatch_core::error::CoreError;
use shelfwatch_core::grid::{ColumnFilter, GridQuery, SortSpec};
use shelfwatch_core::schema::CollectionSchema;
use shelfwatch_core::store::SortDirection;

/// View parameters for grid listings and exports.
///
/// ```text
/// ?sort=fine&direction=desc&filter=status=Pending,offense:noise&page=0&columns=a,b
/// ```
///
/// `filter` is a comma-separated list of `column:text` (substring) or
/// `column=value` (exact) predicates. A comma only starts a new predicate
/// when the text after it opens with `column:` or `column=`, so
/// `description:late, again` is one filter. `page` is zero-based.
#[derive(Debug, Default, Deserialize)]
pub struct GridParams {
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
    pub filter: Option<String>,
    pub page: Option<usize>,
    pub columns: Option<String>,
}

impl GridParams {
    /// Resolve into a [`GridQuery`], rejecting columns the schema does not have.
    pub fn grid_query(&self, schema: &CollectionSchema) -> Result<GridQuery, CoreError> {
        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(column) => {
                let sortable = schema.column(column).is_some_and(|c| c.sortable);
                if !sortable {
                    return Err(CoreError::Validation(format!(
                        "Cannot sort by '{column}'"
                    )));
                }
                Some(SortSpec {
                    column: column.to_string(),
                    direction: self.direction.unwrap_or_default(),
                })
            }
        };

        let filters = split_filters(self.filter.as_deref().unwrap_or_default())
            .into_iter()
            .map(|raw| {
                let filter: ColumnFilter = raw.trim().parse()?;
                if schema.column(&filter.column).is_none() {
                    return Err(CoreError::Validation(format!(
                        "Unknown filter column '{}'",
                        filter.column
                    )));
                }
                Ok(filter)
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(GridQuery {
            sort,
            filters,
            page: self.page.unwrap_or(0),
        })
    }

    /// Requested export columns, or `None` when the caller wants the defaults.
    pub fn column_keys(&self) -> Option<Vec<String>> {
        let keys: Vec<String> = split_list(self.columns.as_deref())
            .map(str::to_string)
            .collect();
        (!keys.is_empty()).then_some(keys)
    }
}

/// Split a filter list on the commas that begin a new `column:` or
/// `column=` predicate; other commas belong to the preceding value.
fn split_filters(raw: &str) -> Vec<String> {
    let mut predicates: Vec<String> = Vec::new();
    for segment in raw.split(',') {
        if segment.trim().is_empty() {
            continue;
        }
        match predicates.last_mut() {
            Some(last) if !starts_predicate(segment) => {
                last.push(',');
                last.push_str(segment);
            }
            _ => predicates.push(segment.to_string()),
        }
    }
    predicates
}

fn starts_predicate(segment: &str) -> bool {
    let Some(end) = segment.find([':', '=']) else {
        return false;
    };
    let column = segment[..end].trim();
    !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use shelfwatch_core::grid::Matcher;
    use shelfwatch_core::schema::offenses_schema;

    use super::*;

    #[test]
    fn empty_params_give_default_view() {
        let query = GridParams::default().grid_query(&offenses_schema()).unwrap();
        assert_eq!(query, GridQuery::default());
    }

    #[test]
    fn sort_filter_and_page_are_parsed() {
        let params = GridParams {
            sort: Some("fine".into()),
            direction: Some(SortDirection::Desc),
            filter: Some("status=Pending, student_id:S-1".into()),
            page: Some(2),
            columns: None,
        };
        let query = params.grid_query(&offenses_schema()).unwrap();

        let sort = query.sort.unwrap();
        assert_eq!(sort.column, "fine");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0].matcher, Matcher::Equals("Pending".into()));
        assert_eq!(query.filters[1].column, "student_id");
        assert_eq!(query.page, 2);
    }

    #[test]
    fn commas_inside_a_filter_value_are_kept() {
        let params = GridParams {
            filter: Some("description:late, again,status=Pending".into()),
            ..Default::default()
        };
        let query = params.grid_query(&offenses_schema()).unwrap();
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0].column, "description");
        assert_eq!(query.filters[0].matcher, Matcher::Contains("late, again".into()));
        assert_eq!(query.filters[1].matcher, Matcher::Equals("Pending".into()));
    }

    #[test]
    fn blank_filter_segments_are_ignored() {
        let params = GridParams {
            filter: Some(" , status=Pending,".into()),
            ..Default::default()
        };
        let query = params.grid_query(&offenses_schema()).unwrap();
        assert_eq!(query.filters.len(), 1);
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        let params = GridParams {
            sort: Some("actions".into()),
            ..Default::default()
        };
        assert_matches!(
            params.grid_query(&offenses_schema()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn unknown_filter_column_is_rejected() {
        let params = GridParams {
            filter: Some("shoe_size=9".into()),
            ..Default::default()
        };
        assert_matches!(
            params.grid_query(&offenses_schema()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn column_keys_skip_blanks() {
        let params = GridParams {
            columns: Some(" fine, ,status ".into()),
            ..Default::default()
        };
        assert_eq!(
            params.column_keys(),
            Some(vec!["fine".to_string(), "status".to_string()])
        );
        assert_eq!(GridParams::default().column_keys(), None);
    }
}
