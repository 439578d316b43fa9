// Entry point and operator flow.
//
// One run processes one search-console export:
// - pick the input (argument or a numbered list of CSV/XLSX files),
// - detect the report type, then ask only for the parameters it uses,
// - build the whole report in memory, then write a single workbook,
// - print a preview and wait for the operator before exiting.
mod aggregate;
mod classify;
mod columns;
mod error;
mod loader;
mod mode;
mod output;
mod pipeline;
mod project;
mod types;
mod util;
mod words;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use error::ReportError;
use mode::ReportMode;
use pipeline::{Report, RunParams};
use types::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Auto,
    Query,
    Page,
}

/// Query Monitor Report - search-console export to spreadsheet report
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input CSV or XLSX export (prompted from the current directory when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Site address, e.g. https://site.ru
    #[arg(short, long)]
    site: Option<String>,

    /// Comma-separated brand terms, e.g. "Yandex, Яндекс, ya"
    #[arg(short, long)]
    brands: Option<String>,

    /// Minimum total demand for a query to be kept
    #[arg(long)]
    min_frequency: Option<u64>,

    /// Report type
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    /// Add the query intent column
    #[arg(long)]
    intent: bool,

    /// Drop the median position column
    #[arg(long)]
    no_median: bool,

    /// Add a sheet explaining the columns
    #[arg(long)]
    glossary: bool,

    /// Field delimiter (sniffed from the header line when omitted)
    #[arg(long)]
    delimiter: Option<char>,

    /// Directory for the generated workbook
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Rows shown in the console preview
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Exit without waiting for Enter
    #[arg(long)]
    no_wait: bool,
}

/// Print `prompt` and read one trimmed line. A closed input is an error, so
/// re-prompting loops end instead of spinning.
fn read_line_from<R: BufRead>(input: &mut R, prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(buf.trim().to_string())
}

fn read_line(prompt: &str) -> io::Result<String> {
    read_line_from(&mut io::stdin().lock(), prompt)
}

fn wait_for_enter() {
    let _ = read_line("\nНажмите Enter для завершения...");
}

/// Re-prompts until a valid 1-based number is entered.
fn choose_file<R: BufRead>(files: &[PathBuf], input: &mut R) -> io::Result<PathBuf> {
    loop {
        let choice = read_line_from(input, "\nВыберите номер файла: ")?;
        match choice.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => return Ok(files[n - 1].clone()),
            Ok(_) => println!("Неверный номер. Попробуйте еще раз."),
            Err(_) => println!("Введите число."),
        }
    }
}

/// Numbered list of exports in the current directory.
fn select_file() -> anyhow::Result<PathBuf> {
    let dir = Path::new(".");
    let files = loader::list_input_files(dir)?;
    if files.is_empty() {
        return Err(ReportError::NoInputFiles(dir.to_path_buf()).into());
    }
    println!("\nДоступные файлы:");
    for (i, file) in files.iter().enumerate() {
        println!("[{}] {}", i + 1, file.display());
    }
    Ok(choose_file(&files, &mut io::stdin().lock())?)
}

/// The csv reader takes a single byte, so only ASCII delimiters are usable.
fn delimiter_byte(c: char) -> Result<u8, ReportError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ReportError::InvalidOperatorInput {
            value: c.to_string(),
            reason: "delimiter must be a single ASCII character".to_string(),
        })
    }
}

fn parse_min_frequency(input: &str) -> Result<u64, ReportError> {
    match util::parse_u64_safe(input) {
        None => Ok(0),
        Some(Ok(n)) => Ok(n),
        Some(Err(e)) => Err(ReportError::InvalidOperatorInput {
            value: input.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn prompt_min_frequency() -> anyhow::Result<u64> {
    loop {
        let input = read_line(
            "\nВведите минимальную суммарную частотность запросов (Enter для 0): ",
        )?;
        match parse_min_frequency(&input) {
            Ok(n) => return Ok(n),
            Err(e) => println!("{e}. Введите целое число."),
        }
    }
}

/// Host part of a site URL: `https://site.ru/path` -> `site.ru`.
fn domain_of(site_url: &str) -> &str {
    site_url
        .rsplit("//")
        .next()
        .and_then(|rest| rest.split('/').next())
        .unwrap_or("")
}

fn output_file_name(input: &Path, site_url: &str, mode: ReportMode, stamp: &str) -> String {
    let base = match domain_of(site_url) {
        "" => input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string()),
        domain => domain.to_string(),
    };
    format!("{base}-{}-{stamp}.xlsx", mode.file_tag())
}

fn print_report(report: &Report, output: &Path, preview_rows: usize) {
    println!("\n***");
    if let Some(main) = report.sheets.first() {
        output::preview_sheet(main, preview_rows);
    }
    if !report.words.is_empty() {
        println!("{}", project::WORDS_SHEET);
        output::preview_table_rows(&report.words, preview_rows);
    }
    println!("Результат сохранен в файл {}", output.display());
    let processed = util::format_int(report.rows_processed);
    match report.mode {
        ReportMode::Query => println!("Обработано поисковых запросов: {processed}"),
        ReportMode::Page => println!("Обработано адресов страниц: {processed}"),
    }
    println!("***");
}

fn run(args: &Args) -> anyhow::Result<()> {
    let input = match &args.input {
        Some(path) => path.clone(),
        None => select_file()?,
    };
    let delimiter = args.delimiter.map(delimiter_byte).transpose()?;
    let table = loader::load_table(&input, delimiter)
        .with_context(|| format!("failed to load {}", input.display()))?;

    let forced = match args.mode {
        ModeArg::Auto => None,
        ModeArg::Query => Some(ReportMode::Query),
        ModeArg::Page => Some(ReportMode::Page),
    };
    let mode = pipeline::resolve_mode(&table, forced)?;
    match mode {
        ReportMode::Query => println!("\nОбнаружен отчет по поисковым запросам."),
        ReportMode::Page => println!("\nОбнаружен отчет по страницам."),
    }

    let site_url = match &args.site {
        Some(s) => s.trim().to_string(),
        None => read_line("\nПожалуйста, введите адрес сайта в формате https://site.ru: ")?,
    };
    let (brands, min_frequency) = match mode {
        ReportMode::Query => {
            let brands = match &args.brands {
                Some(b) => b.clone(),
                None => read_line(
                    "\nВведите брендовые запросы, например: Yandex, Яндекс, ya (или Enter для пропуска): ",
                )?,
            };
            let min_frequency = match args.min_frequency {
                Some(n) => n,
                None => prompt_min_frequency()?,
            };
            (brands, min_frequency)
        }
        ReportMode::Page => (String::new(), 0),
    };

    let params = RunParams {
        mode: Some(mode),
        site_url,
        brand_terms: classify::parse_brand_terms(&brands),
        min_frequency,
        intent: args.intent,
        median: !args.no_median,
        glossary: args.glossary,
    };
    debug!(?params, "run parameters");

    println!("Обработка...");
    let report = pipeline::run(&table, &params)?;

    let now = Local::now().naive_local();
    let file_name = output_file_name(
        &input,
        &params.site_url,
        report.mode,
        &now.format("%Y-%m-%d %H-%M-%S").to_string(),
    );
    let output_path = args.output_dir.join(file_name);
    output::write_workbook(&output_path, &report.sheets)?;
    info!(path = %output_path.display(), "report written");

    print_report(&report, &output_path, args.preview_rows);
    if args.json {
        let summary = RunSummary {
            input: input.display().to_string(),
            output: output_path.display().to_string(),
            mode: report.mode,
            days: report.days,
            rows_loaded: report.rows_loaded,
            rows_processed: report.rows_processed,
            distinct_words: report.words.len(),
            generated_at: now,
        };
        println!("{}", output::to_json(&summary)?);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let result = run(&args);
    if let Err(e) = &result {
        eprintln!("\nОшибка: {e:#}");
    }
    if !args.no_wait {
        wait_for_enter();
    }
    if result.is_err() {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_from_site_url() {
        assert_eq!(domain_of("https://site.ru"), "site.ru");
        assert_eq!(domain_of("https://site.ru/catalog/"), "site.ru");
        assert_eq!(domain_of("site.ru"), "site.ru");
        assert_eq!(domain_of(""), "");
    }

    #[test]
    fn output_name_uses_domain_or_input_stem() {
        let input = Path::new("exports/wm.csv");
        assert_eq!(
            output_file_name(input, "https://site.ru", ReportMode::Query, "2024-01-02 03-04-05"),
            "site.ru-semantics-2024-01-02 03-04-05.xlsx"
        );
        assert_eq!(
            output_file_name(input, "", ReportMode::Page, "2024-01-02 03-04-05"),
            "wm-pages-2024-01-02 03-04-05.xlsx"
        );
    }

    #[test]
    fn blank_threshold_defaults_to_zero() {
        assert_eq!(parse_min_frequency("").unwrap(), 0);
        assert_eq!(parse_min_frequency(" 25 ").unwrap(), 25);
        assert!(matches!(
            parse_min_frequency("много"),
            Err(ReportError::InvalidOperatorInput { .. })
        ));
    }

    #[test]
    fn closed_input_ends_file_choice() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.xlsx")];
        let err = choose_file(&files, &mut &b""[..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        // Invalid answers re-prompt until the input runs out.
        let err = choose_file(&files, &mut &b"x\n7\n"[..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn file_choice_skips_invalid_answers() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.xlsx")];
        let chosen = choose_file(&files, &mut &b"x\n0\n 2 \n"[..]).unwrap();
        assert_eq!(chosen, PathBuf::from("b.xlsx"));
    }

    #[test]
    fn empty_line_is_not_closed_input() {
        assert_eq!(read_line_from(&mut &b"\n"[..], "").unwrap(), "");
        assert!(read_line_from(&mut &b""[..], "").is_err());
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert_eq!(delimiter_byte('\t').unwrap(), b'\t');
        assert!(matches!(
            delimiter_byte('§'),
            Err(ReportError::InvalidOperatorInput { .. })
        ));
    }

    #[test]
    fn cli_flags_parse() {
        let args = Args::parse_from([
            "query_monitor_report",
            "--input",
            "wm.csv",
            "--mode",
            "page",
            "--min-frequency",
            "10",
            "--no-wait",
        ]);
        assert_eq!(args.mode, ModeArg::Page);
        assert_eq!(args.min_frequency, Some(10));
        assert!(args.no_wait);
        assert!(!args.no_median);
    }
}
