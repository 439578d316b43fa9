// Row-wise reduction of the day-indexed role groups into summary metrics.
//
// Missing-value policy, one entry per derived metric:
//
// | metric                     | rounding | missing cells          | undefined |
// |----------------------------|----------|------------------------|-----------|
// | demand/shows/clicks sum    | none     | counted as 0           | -         |
// | demand/shows/clicks mean   | 0 dp     | skipped                | 0         |
// | ctr mean                   | 1 dp     | skipped                | 0         |
// | position mean / median     | 1 dp     | skipped, zeros dropped | 0         |
// | coverage                   | 1 dp     | via the sums           | NaN       |
//
// Position 0 means "not ranked", hence the zero exclusion. Coverage keeps NaN
// when there was no demand so the report shows it as undefined.
use tracing::{debug, info};

use crate::classify::{BrandMatch, Intent};
use crate::columns::{Role, RoleGroups};
use crate::error::{ReportError, Result};
use crate::mode::{query_column, ReportMode, PAGE_COLUMN, QUERY_COLUMN};
use crate::types::Table;
use crate::util::{average, median, round_to};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedMetrics {
    pub word_count: usize,
    pub demand_sum: f64,
    pub demand_mean: f64,
    pub shows_sum: f64,
    pub shows_mean: f64,
    pub clicks_sum: f64,
    pub clicks_mean: f64,
    pub ctr_mean: f64,
    pub position_mean: f64,
    pub position_median: f64,
    pub coverage: f64,
}

/// One input row after aggregation. `subject` is the query text in query
/// mode and the page path in page mode.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub subject: String,
    pub query: Option<String>,
    pub metrics: DerivedMetrics,
    pub brand: Option<BrandMatch>,
    pub intent: Option<Intent>,
}

/// Result of aggregation plus the context later stages need.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub mode: ReportMode,
    /// Day columns of the primary volume role.
    pub days: usize,
    /// Page mode only: the export carries a query column.
    pub has_query: bool,
    pub rows: Vec<AggregatedRow>,
}

/// Number of whitespace-separated tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn group_values(table: &Table, row: usize, cols: &[usize]) -> Vec<f64> {
    cols.iter().filter_map(|&c| table.number(row, c)).collect()
}

fn group_sum(table: &Table, row: usize, cols: &[usize]) -> f64 {
    group_values(table, row, cols).iter().sum()
}

fn group_mean(table: &Table, row: usize, cols: &[usize], decimals: u32) -> f64 {
    round_to(average(&group_values(table, row, cols)), decimals)
}

fn non_zero(values: Vec<f64>) -> Vec<f64> {
    values.into_iter().filter(|v| *v != 0.0).collect()
}

/// `100 * shows / demand`; NaN when there is no demand.
pub fn coverage(shows_sum: f64, demand_sum: f64) -> f64 {
    if demand_sum == 0.0 {
        return f64::NAN;
    }
    round_to(shows_sum / demand_sum * 100.0, 1)
}

pub fn row_metrics(table: &Table, row: usize, groups: &RoleGroups, subject: &str) -> DerivedMetrics {
    let demand = groups.get(Role::Demand);
    let shows = groups.get(Role::Shows);
    let clicks = groups.get(Role::Clicks);
    let positions = non_zero(group_values(table, row, groups.get(Role::Position)));

    let demand_sum = group_sum(table, row, demand);
    let shows_sum = group_sum(table, row, shows);
    DerivedMetrics {
        word_count: word_count(subject),
        demand_sum,
        demand_mean: group_mean(table, row, demand, 0),
        shows_sum,
        shows_mean: group_mean(table, row, shows, 0),
        clicks_sum: group_sum(table, row, clicks),
        clicks_mean: group_mean(table, row, clicks, 0),
        ctr_mean: group_mean(table, row, groups.get(Role::Ctr), 1),
        position_mean: round_to(average(&positions), 1),
        position_median: round_to(median(positions), 1),
        coverage: coverage(shows_sum, demand_sum),
    }
}

/// Compute derived metrics for every row. The input table is left untouched.
pub fn aggregate(table: &Table, groups: &RoleGroups, mode: ReportMode) -> Result<Aggregated> {
    let required = mode.required_role();
    if !groups.has(required) {
        return Err(ReportError::MissingRequiredRole { mode, role: required });
    }
    for role in Role::ALL {
        debug!(%role, columns = groups.days(role), "role group");
    }

    let (subject_col, query_col) = match mode {
        ReportMode::Query => {
            let col = query_column(table).ok_or_else(|| ReportError::MissingColumn {
                mode,
                column: QUERY_COLUMN.to_string(),
            })?;
            (col, None)
        }
        ReportMode::Page => {
            let col = table
                .column_index(PAGE_COLUMN)
                .ok_or_else(|| ReportError::MissingColumn {
                    mode,
                    column: PAGE_COLUMN.to_string(),
                })?;
            (col, query_column(table))
        }
    };

    let rows: Vec<AggregatedRow> = (0..table.len())
        .map(|row| {
            let subject = table.text(row, subject_col).trim().to_string();
            let metrics = row_metrics(table, row, groups, &subject);
            AggregatedRow {
                query: query_col.map(|c| table.text(row, c).trim().to_string()),
                subject,
                metrics,
                brand: None,
                intent: None,
            }
        })
        .collect();

    let days = groups.days(required);
    info!(%mode, rows = rows.len(), days, "aggregated metrics");
    Ok(Aggregated {
        mode,
        days,
        has_query: query_col.is_some(),
        rows,
    })
}
