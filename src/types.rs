use chrono::NaiveDateTime;
use serde::Serialize;
use tabled::Tabled;

use crate::mode::ReportMode;
use crate::util::parse_f64_safe;

/// The loaded export: header plus raw text cells. Numeric columns are parsed
/// on access so subject text like `2024` is never mistaken for a number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Raw cell text, empty for cells past the end of a short record.
    pub fn text(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Numeric value of a cell, `None` when missing or not a number.
    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        parse_f64_safe(Some(self.text(row, col)))
    }
}

/// A single value in an output sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

/// A rendered output sheet: header captions and one cell vector per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct WordFrequencyRow {
    #[serde(rename = "Слово")]
    #[tabled(rename = "Слово")]
    pub word: String,
    #[serde(rename = "Количество")]
    #[tabled(rename = "Количество")]
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: String,
    pub output: String,
    pub mode: ReportMode,
    pub days: usize,
    pub rows_loaded: usize,
    pub rows_processed: usize,
    pub distinct_words: usize,
    pub generated_at: NaiveDateTime,
}
