//! Presentation-only sorting, filtering, and pagination over loaded rows.
//!
//! Nothing here touches the store. Order of application is fixed: sort,
//! then filter, then slice out the requested page.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::row::{RowViewModel, SENTINEL};
use crate::store::SortDirection;

/// Column and direction to sort by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// How a filter matches a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Matcher {
    /// Case-insensitive substring.
    Contains(String),
    /// Case-insensitive whole-cell equality.
    Equals(String),
}

/// A per-column predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub matcher: Matcher,
}

impl ColumnFilter {
    pub fn contains(column: &str, needle: &str) -> Self {
        Self {
            column: column.into(),
            matcher: Matcher::Contains(needle.into()),
        }
    }

    pub fn equals(column: &str, value: &str) -> Self {
        Self {
            column: column.into(),
            matcher: Matcher::Equals(value.into()),
        }
    }

    pub fn matches(&self, row: &RowViewModel) -> bool {
        let cell = row.cell(&self.column).to_lowercase();
        match &self.matcher {
            Matcher::Contains(needle) => cell.contains(&needle.to_lowercase()),
            Matcher::Equals(value) => cell == value.to_lowercase(),
        }
    }
}

impl FromStr for ColumnFilter {
    type Err = CoreError;

    /// Parse `column:text` (substring) or `column=value` (exact).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, matcher) = match (s.find(':'), s.find('=')) {
            (Some(c), Some(e)) if e < c => (&s[..e], Matcher::Equals(s[e + 1..].into())),
            (Some(c), _) => (&s[..c], Matcher::Contains(s[c + 1..].into())),
            (None, Some(e)) => (&s[..e], Matcher::Equals(s[e + 1..].into())),
            (None, None) => {
                return Err(CoreError::Validation(format!(
                    "Invalid filter '{s}'. Expected column:text or column=value"
                )))
            }
        };
        let column = column.trim();
        if column.is_empty() {
            return Err(CoreError::Validation(format!(
                "Invalid filter '{s}': missing column"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            matcher,
        })
    }
}

/// Current view state of a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridQuery {
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub filters: Vec<ColumnFilter>,
    /// Zero-based page index.
    #[serde(default)]
    pub page: usize,
}

/// One rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct GridPage {
    pub rows: Vec<RowViewModel>,
    pub page: usize,
    pub page_size: usize,
    /// Rows matching the filters, across all pages.
    pub total_rows: usize,
    pub total_pages: usize,
}

/// Sort key for one non-sentinel cell. Numeric cells order before text cells.
#[derive(Debug)]
enum CellKey {
    Number(f64),
    Text(String),
}

impl CellKey {
    fn of(cell: &str) -> Self {
        match cell.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellKey::Number(n),
            _ => CellKey::Text(cell.to_lowercase()),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellKey::Number(x), CellKey::Number(y)) => x.total_cmp(y),
            (CellKey::Number(_), CellKey::Text(_)) => Ordering::Less,
            (CellKey::Text(_), CellKey::Number(_)) => Ordering::Greater,
            (CellKey::Text(x), CellKey::Text(y)) => x.cmp(y),
        }
    }
}

/// Compare two cells: sentinel last, numbers numerically ahead of text,
/// text case-insensitively.
fn compare_cells(a: &str, b: &str, direction: SortDirection) -> Ordering {
    match (a == SENTINEL, b == SENTINEL) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => direction.apply(CellKey::of(a).compare(&CellKey::of(b))),
    }
}

/// Sorted and filtered rows, before pagination.
pub fn visible_rows(rows: &[RowViewModel], query: &GridQuery) -> Vec<RowViewModel> {
    let mut sorted: Vec<&RowViewModel> = rows.iter().collect();
    if let Some(sort) = &query.sort {
        // Stable sort: ties keep load order.
        sorted.sort_by(|a, b| compare_cells(a.cell(&sort.column), b.cell(&sort.column), sort.direction));
    }
    sorted
        .into_iter()
        .filter(|row| query.filters.iter().all(|f| f.matches(row)))
        .cloned()
        .collect()
}

/// Render one page. A page index past the end clamps to the last page.
pub fn paginate(rows: &[RowViewModel], query: &GridQuery, page_size: usize) -> GridPage {
    let visible = visible_rows(rows, query);
    let page_size = page_size.max(1);
    let total_rows = visible.len();
    let total_pages = total_rows.div_ceil(page_size).max(1);
    let page = query.page.min(total_pages - 1);

    let rows = visible
        .into_iter()
        .skip(page * page_size)
        .take(page_size)
        .collect();

    GridPage {
        rows,
        page,
        page_size,
        total_rows,
        total_pages,
    }
}
