use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::info;

use crate::error::Result;
use crate::project::{GLOSSARY_SHEET, QUERY_SHEET, WORDS_SHEET};
use crate::types::{Cell, Sheet};
use crate::util::format_number;

const MAX_AUTO_WIDTH: usize = 50;

/// Column widths per sheet: fixed for the query, word and glossary sheets,
/// fitted to content (capped) for the page sheet.
fn column_widths(sheet: &Sheet) -> Vec<f64> {
    let n = sheet.headers.len();
    match sheet.name.as_str() {
        QUERY_SHEET => (0..n).map(|i| if i == 0 { 50.0 } else { 25.0 }).collect(),
        WORDS_SHEET => vec![25.0; n],
        GLOSSARY_SHEET => vec![100.0; n],
        _ => (0..n)
            .map(|i| {
                let longest = sheet
                    .rows
                    .iter()
                    .map(|r| r.get(i).map(cell_text).unwrap_or_default().chars().count())
                    .chain(std::iter::once(sheet.headers[i].chars().count()))
                    .max()
                    .unwrap_or(0);
                (longest + 2).min(MAX_AUTO_WIDTH) as f64
            })
            .collect(),
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => n.to_string(),
    }
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet, header_format: &Format) -> Result<()> {
    ws.set_name(&sheet.name)?;
    for (col, header) in sheet.headers.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, header, header_format)?;
    }
    for (r, row) in sheet.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => {
                    ws.write_string(r, col as u16, s)?;
                }
                Cell::Number(n) if n.is_finite() => {
                    ws.write_number(r, col as u16, *n)?;
                }
                // Undefined values stay blank.
                Cell::Number(_) => {}
            }
        }
    }
    for (col, width) in column_widths(sheet).into_iter().enumerate() {
        ws.set_column_width(col as u16, width)?;
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Write all sheets into one workbook. The file is saved next to `path` and
/// renamed into place only once complete.
pub fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    for sheet in sheets {
        let ws = workbook.add_worksheet();
        write_sheet(ws, sheet, &header_format)?;
    }

    let tmp = partial_path(path);
    if let Err(e) = workbook.save(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    std::fs::rename(&tmp, path)?;
    info!(path = %path.display(), sheets = sheets.len(), "workbook saved");
    Ok(())
}

fn preview_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) if n.fract() == 0.0 => format_number(*n, 0),
        Cell::Number(n) => format_number(*n, 1),
    }
}

/// Markdown table of the first `max_rows` rows of a sheet.
pub fn render_sheet_preview(sheet: &Sheet, max_rows: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(sheet.headers.iter().cloned());
    for row in sheet.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(preview_cell));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_sheet(sheet: &Sheet, max_rows: usize) {
    println!("{}", sheet.name);
    if sheet.rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}\n", render_sheet_preview(sheet, max_rows));
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
