// One report run: detect, classify columns, aggregate, label, project and
// tabulate. Everything here is in memory; nothing touches the filesystem.
use tracing::info;

use crate::aggregate::aggregate;
use crate::classify::label_rows;
use crate::columns::classify;
use crate::error::{ReportError, Result};
use crate::mode::{self, ReportMode};
use crate::project::{self, ColumnOptions};
use crate::types::{Sheet, Table, WordFrequencyRow};
use crate::words::tabulate;

#[derive(Debug, Clone, Default)]
pub struct RunParams {
    /// Forced report mode; `None` means detect from the table.
    pub mode: Option<ReportMode>,
    pub site_url: String,
    pub brand_terms: Vec<String>,
    pub min_frequency: u64,
    pub intent: bool,
    pub median: bool,
    pub glossary: bool,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub mode: ReportMode,
    pub days: usize,
    pub rows_loaded: usize,
    pub rows_processed: usize,
    pub words: Vec<WordFrequencyRow>,
    /// Sheets in workbook order; the first one is the main table.
    pub sheets: Vec<Sheet>,
}

/// Forced or detected mode, checked against the columns the mode needs so
/// an unusable export is rejected before any operator prompt.
pub fn resolve_mode(table: &Table, forced: Option<ReportMode>) -> Result<ReportMode> {
    let groups = classify(&table.columns);
    let mode = match forced {
        Some(mode) => mode,
        None => mode::require(table, &groups)?,
    };
    let role = mode.required_role();
    if !groups.has(role) {
        return Err(ReportError::MissingRequiredRole { mode, role });
    }
    info!(%mode, forced = forced.is_some(), "report mode");
    Ok(mode)
}

pub fn run(table: &Table, params: &RunParams) -> Result<Report> {
    let groups = classify(&table.columns);
    let mode = resolve_mode(table, params.mode)?;

    let aggregated = aggregate(table, &groups, mode)?;
    let (rows, words, sheets) = match mode {
        ReportMode::Query => {
            let labelled = label_rows(&aggregated.rows, &params.brand_terms, params.intent);
            let rows = project::select(&labelled, mode, params.min_frequency);
            let words = tabulate(rows.iter().map(|r| r.subject.as_str()));
            let opts = ColumnOptions {
                median: params.median,
                brand: !params.brand_terms.is_empty(),
                intent: params.intent,
            };
            let mut sheets = vec![
                project::query_sheet(&rows, aggregated.days, opts),
                project::words_sheet(&words),
            ];
            if params.glossary {
                sheets.push(project::glossary_sheet());
            }
            (rows, words, sheets)
        }
        ReportMode::Page => {
            let rows = project::select(&aggregated.rows, mode, params.min_frequency);
            let sheets = vec![project::page_sheet(
                &rows,
                aggregated.days,
                &params.site_url,
                aggregated.has_query,
            )];
            (rows, Vec::new(), sheets)
        }
    };

    info!(rows = rows.len(), words = words.len(), "report built");
    Ok(Report {
        mode,
        days: aggregated.days,
        rows_loaded: table.len(),
        rows_processed: rows.len(),
        words,
        sheets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    fn table(cols: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            cols.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn query_table() -> Table {
        table(
            &["Query", "d1_demand", "d2_demand", "d1_shows", "d2_shows", "d1_position", "d2_position"],
            &[
                &["билет в театр", "5", "5", "4", "4", "3", "5"],
                &["где купить билет", "0", "0", "0", "0", "0", "0"],
                &["купить билет", "25", "25", "10", "0", "1", "0"],
            ],
        )
    }

    fn params() -> RunParams {
        RunParams {
            median: true,
            ..RunParams::default()
        }
    }

    fn subjects(sheet: &Sheet) -> Vec<Cell> {
        sheet.rows.iter().map(|r| r[0].clone()).collect()
    }

    #[test]
    fn query_report_filters_sorts_and_counts_words() {
        let p = RunParams {
            min_frequency: 10,
            ..params()
        };
        let report = run(&query_table(), &p).unwrap();
        assert_eq!(report.mode, ReportMode::Query);
        assert_eq!(report.days, 2);
        assert_eq!(report.rows_loaded, 3);
        assert_eq!(report.rows_processed, 2);
        assert_eq!(
            subjects(&report.sheets[0]),
            [
                Cell::Text("купить билет".to_string()),
                Cell::Text("билет в театр".to_string())
            ]
        );
        assert_eq!(report.words[0].word, "билет");
        assert_eq!(report.words[0].count, 2);
        assert_eq!(report.words.iter().map(|w| w.count).sum::<usize>(), 5);
        assert_eq!(report.sheets.len(), 2);
        assert_eq!(report.sheets[1].name, project::WORDS_SHEET);
    }

    #[test]
    fn labels_and_glossary_are_optional() {
        let p = RunParams {
            brand_terms: vec!["Театр".to_string()],
            intent: true,
            glossary: true,
            ..params()
        };
        let report = run(&query_table(), &p).unwrap();
        let main = &report.sheets[0];
        assert_eq!(main.headers.last().map(String::as_str), Some("Коммерциализация"));
        let brand_col = main.headers.iter().position(|h| h == "Бренд").unwrap();
        // Sorted: купить билет (50), билет в театр (10), где купить билет (0).
        assert_eq!(main.rows[0][brand_col], Cell::Text("Нет".to_string()));
        assert_eq!(main.rows[1][brand_col], Cell::Text("Да".to_string()));
        assert_eq!(
            main.rows[2].last(),
            Some(&Cell::Text("Информационный".to_string()))
        );
        assert_eq!(report.sheets[2].name, project::GLOSSARY_SHEET);
    }

    #[test]
    fn page_report_has_single_sheet() {
        let t = table(
            &["Url", "Query", "d1_shows", "d1_clicks", "d1_ctr"],
            &[&["/a", "слон", "2", "1", "50"], &["/b", "кит", "8", "0", "0"]],
        );
        let p = RunParams {
            site_url: "https://site.ru".to_string(),
            ..params()
        };
        let report = run(&t, &p).unwrap();
        assert_eq!(report.mode, ReportMode::Page);
        assert!(report.words.is_empty());
        assert_eq!(report.sheets.len(), 1);
        assert_eq!(
            subjects(&report.sheets[0]),
            [
                Cell::Text("https://site.ru/b".to_string()),
                Cell::Text("https://site.ru/a".to_string())
            ]
        );
    }

    #[test]
    fn empty_page_report_keeps_query_column() {
        let t = table(&["Url", "Query", "d1_shows"], &[]);
        let report = run(&t, &params()).unwrap();
        assert_eq!(report.rows_processed, 0);
        assert_eq!(report.sheets[0].headers.len(), 9);
        assert_eq!(report.sheets[0].headers[2], "Поисковый запрос");
    }

    #[test]
    fn mode_is_resolved_before_running() {
        let page = table(&["Url", "Query", "d1_shows"], &[]);
        assert_eq!(resolve_mode(&page, None).unwrap(), ReportMode::Page);
        let query = table(&["Query", "d1_demand"], &[]);
        assert_eq!(resolve_mode(&query, None).unwrap(), ReportMode::Query);
        assert!(matches!(
            resolve_mode(&query, Some(ReportMode::Page)),
            Err(ReportError::MissingRequiredRole { .. })
        ));
        let unknown = table(&["Query"], &[]);
        assert!(matches!(
            resolve_mode(&unknown, None),
            Err(ReportError::ModeUndetermined)
        ));
    }

    #[test]
    fn undetermined_mode_aborts() {
        let t = table(&["Query", "d1_shows"], &[&["a", "1"]]);
        let err = run(&t, &params()).unwrap_err();
        assert!(matches!(err, ReportError::ModeUndetermined));
    }

    #[test]
    fn forced_query_mode_still_needs_demand() {
        let t = table(&["Url", "Query", "d1_shows"], &[&["/a", "a", "1"]]);
        let p = RunParams {
            mode: Some(ReportMode::Query),
            ..params()
        };
        let err = run(&t, &p).unwrap_err();
        assert!(matches!(err, ReportError::MissingRequiredRole { .. }));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let t = query_table();
        let first = run(&t, &params()).unwrap();
        let second = run(&t, &params()).unwrap();
        assert_eq!(format!("{:?}", first.sheets), format!("{:?}", second.sheets));
        assert_eq!(first.words, second.words);
    }
}
