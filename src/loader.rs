use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::error::{ReportError, Result};
use crate::types::Table;

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

pub fn is_workbook(path: &Path) -> bool {
    has_extension(path, &WORKBOOK_EXTENSIONS)
}

/// Pick the delimiter that occurs most often in the header line; comma when
/// the line has none of them.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .map(|d| (header_line.bytes().filter(|b| *b == d).count(), d))
        .filter(|(count, _)| *count > 0)
        .max_by_key(|(count, _)| *count)
        .map(|(_, d)| d)
        .unwrap_or(b',')
}

fn read_header_line(path: &Path) -> Result<String> {
    let mut line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut line)?;
    Ok(line)
}

/// Headers trimmed (and BOM-stripped), rows padded or cut to header width.
fn build_table(header: Vec<String>, records: Vec<Vec<String>>) -> Table {
    let columns: Vec<String> = header
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut long_rows = 0usize;
    let rows: Vec<Vec<String>> = records
        .into_iter()
        .map(|mut row| {
            if row.len() > columns.len() {
                long_rows += 1;
            }
            row.resize(columns.len(), String::new());
            row
        })
        .collect();
    if long_rows > 0 {
        warn!(long_rows, "dropped cells beyond the header width");
    }
    info!(rows = rows.len(), columns = columns.len(), "loaded export");
    Table::new(columns, rows)
}

/// Load an export into memory: workbooks by extension, anything else as
/// delimited text. Short records are padded with empty cells so every row
/// has one cell per header.
pub fn load_table(path: &Path, delimiter: Option<u8>) -> Result<Table> {
    if !path.exists() {
        return Err(ReportError::InputNotFound(path.to_path_buf()));
    }
    if is_workbook(path) {
        load_workbook(path)
    } else {
        load_csv(path, delimiter)
    }
}

fn load_csv(path: &Path, delimiter: Option<u8>) -> Result<Table> {
    let delimiter = match delimiter {
        Some(d) => d,
        None => sniff_delimiter(&read_header_line(path)?),
    };
    debug!(path = %path.display(), delimiter = %(delimiter as char).escape_default(), "reading export");

    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;
    let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();
    for record in rdr.records() {
        records.push(record?.iter().map(str::to_string).collect());
    }
    Ok(build_table(header, records))
}

fn workbook_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// First worksheet of the workbook; its first row is the header.
fn load_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ReportError::EmptyWorkbook(path.to_path_buf()))?;
    debug!(path = %path.display(), %sheet, "reading workbook");

    let range = workbook.worksheet_range(&sheet)?;
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(workbook_cell).collect())
        .unwrap_or_default();
    let records = rows.map(|r| r.iter().map(workbook_cell).collect()).collect();
    Ok(build_table(header, records))
}

/// CSV and workbook exports in `dir`, sorted by name.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && (has_extension(p, &["csv"]) || is_workbook(p)))
        .collect();
    files.sort();
    Ok(files)
}
