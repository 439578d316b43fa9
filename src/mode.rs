// Report shape detection.
//
// Query and page exports share the same wide day-indexed layout; they differ
// in which metric roles are present and in the order of the subject columns.
use std::fmt;

use serde::Serialize;

use crate::columns::{Role, RoleGroups};
use crate::error::{ReportError, Result};
use crate::types::Table;

pub const QUERY_COLUMN: &str = "Query";
pub const LEGACY_QUERY_COLUMN: &str = "Indicator";
pub const PAGE_COLUMN: &str = "Url";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    Query,
    Page,
}

impl ReportMode {
    /// Tag used in output file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            ReportMode::Query => "semantics",
            ReportMode::Page => "pages",
        }
    }

    /// Role whose group must be non-empty for the mode to make sense.
    pub fn required_role(self) -> Role {
        match self {
            ReportMode::Query => Role::Demand,
            ReportMode::Page => Role::Shows,
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::Query => f.write_str("query"),
            ReportMode::Page => f.write_str("page"),
        }
    }
}

/// `None` means the table matches neither shape.
pub fn detect(table: &Table, groups: &RoleGroups) -> Option<ReportMode> {
    if groups.has(Role::Demand) {
        return Some(ReportMode::Query);
    }
    match (table.column_index(PAGE_COLUMN), table.column_index(QUERY_COLUMN)) {
        (Some(page), Some(query)) if page < query => Some(ReportMode::Page),
        _ => None,
    }
}

/// Same as [`detect`] but undetermined is an error.
pub fn require(table: &Table, groups: &RoleGroups) -> Result<ReportMode> {
    detect(table, groups).ok_or(ReportError::ModeUndetermined)
}

/// Index of the column holding the query text: `Query`, or the older
/// `Indicator` header.
pub fn query_column(table: &Table) -> Option<usize> {
    table
        .column_index(QUERY_COLUMN)
        .or_else(|| table.column_index(LEGACY_QUERY_COLUMN))
}
