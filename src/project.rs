// Filtering, ordering and column selection for the output sheets.
use std::cmp::Ordering;

use tracing::info;

use crate::aggregate::{AggregatedRow, DerivedMetrics};
use crate::mode::ReportMode;
use crate::types::{Cell, Sheet, WordFrequencyRow};

pub const QUERY_SHEET: &str = "Семантическое ядро";
pub const WORDS_SHEET: &str = "Статистика слов";
pub const GLOSSARY_SHEET: &str = "Пояснения";
pub const PAGES_SHEET: &str = "Страницы";

/// Optional columns of the query sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnOptions {
    pub median: bool,
    pub brand: bool,
    pub intent: bool,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            median: true,
            brand: false,
            intent: false,
        }
    }
}

fn volume(mode: ReportMode, m: &DerivedMetrics) -> f64 {
    match mode {
        ReportMode::Query => m.demand_sum,
        ReportMode::Page => m.shows_sum,
    }
}

/// Keep rows at or above `min_frequency` (query mode only) and sort them by
/// descending volume. The sort is stable, equal volumes keep input order.
pub fn select(rows: &[AggregatedRow], mode: ReportMode, min_frequency: u64) -> Vec<AggregatedRow> {
    let threshold = min_frequency as f64;
    let mut kept: Vec<AggregatedRow> = rows
        .iter()
        .filter(|r| mode == ReportMode::Page || r.metrics.demand_sum >= threshold)
        .cloned()
        .collect();
    kept.sort_by(|a, b| {
        volume(mode, &b.metrics)
            .partial_cmp(&volume(mode, &a.metrics))
            .unwrap_or(Ordering::Equal)
    });
    info!(%mode, input = rows.len(), kept = kept.len(), min_frequency, "selected rows");
    kept
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn num(n: f64) -> Cell {
    Cell::Number(n)
}

pub fn query_sheet(rows: &[AggregatedRow], days: usize, opts: ColumnOptions) -> Sheet {
    let mut headers = vec![
        "Поисковые запросы".to_string(),
        "Кол-во слов".to_string(),
        "Ср. позиция".to_string(),
    ];
    if opts.median {
        headers.push("Медианная позиция".to_string());
    }
    headers.extend([
        "Ср. дн. частотность".to_string(),
        format!("Сум. частотность за {days} дн"),
        "Ср. число кликов".to_string(),
        format!("Сум. кликов за {days} дн."),
        "Охват".to_string(),
    ]);
    if opts.brand {
        headers.push("Бренд".to_string());
    }
    if opts.intent {
        headers.push("Коммерциализация".to_string());
    }

    let rows = rows
        .iter()
        .map(|r| {
            let m = &r.metrics;
            let mut cells = vec![text(&r.subject), num(m.word_count as f64), num(m.position_mean)];
            if opts.median {
                cells.push(num(m.position_median));
            }
            cells.extend([
                num(m.demand_mean),
                num(m.demand_sum),
                num(m.clicks_mean),
                num(m.clicks_sum),
                num(m.coverage),
            ]);
            if opts.brand {
                cells.push(text(r.brand.map(|b| b.label()).unwrap_or("")));
            }
            if opts.intent {
                cells.push(text(r.intent.map(|i| i.label()).unwrap_or("")));
            }
            cells
        })
        .collect();

    Sheet {
        name: QUERY_SHEET.to_string(),
        headers,
        rows,
    }
}

/// Full URL is the site URL and path glued together as-is. `with_query`
/// follows the export's columns, not the rows, so an empty result keeps the
/// same header.
pub fn page_sheet(rows: &[AggregatedRow], days: usize, site_url: &str, with_query: bool) -> Sheet {
    let mut headers = vec!["Полный URL".to_string(), "Путь".to_string()];
    if with_query {
        headers.push("Поисковый запрос".to_string());
    }
    headers.extend([
        "Ср. позиция".to_string(),
        "Ср. дн. показов".to_string(),
        format!("Сум. показов за {days} дн"),
        "Ср. число кликов".to_string(),
        format!("Сум. кликов за {days} дн."),
        "Ср. CTR".to_string(),
    ]);

    let rows = rows
        .iter()
        .map(|r| {
            let m = &r.metrics;
            let mut cells = vec![text(&format!("{site_url}{}", r.subject)), text(&r.subject)];
            if with_query {
                cells.push(text(r.query.as_deref().unwrap_or("")));
            }
            cells.extend([
                num(m.position_mean),
                num(m.shows_mean),
                num(m.shows_sum),
                num(m.clicks_mean),
                num(m.clicks_sum),
                num(m.ctr_mean),
            ]);
            cells
        })
        .collect();

    Sheet {
        name: PAGES_SHEET.to_string(),
        headers,
        rows,
    }
}

pub fn words_sheet(words: &[WordFrequencyRow]) -> Sheet {
    Sheet {
        name: WORDS_SHEET.to_string(),
        headers: vec!["Слово".to_string(), "Количество".to_string()],
        rows: words
            .iter()
            .map(|w| vec![text(&w.word), num(w.count as f64)])
            .collect(),
    }
}

/// Static explanation of the query sheet columns.
pub fn glossary_sheet() -> Sheet {
    const LINES: [&str; 11] = [
        "'Поисковые запросы': Поисковый запрос",
        "'Кол-во слов': Количество слов в запросе",
        "'Ср. позиция': Средняя позиция запроса за период (без учета 0)",
        "'Медианная позиция': Медианная позиция запроса за период (без учета 0)",
        "'Ср. дн. частотность': Среднедневная частотность запроса (округлено до целых)",
        "'Сум. частотность': Суммарная частотность запроса за период",
        "'Ср. число кликов': Среднее число кликов в день",
        "'Сум. кликов': Суммарное число кликов за период",
        "'Охват': Отношение показов к спросу в процентах (округлено до десятых)",
        "'Бренд': Запросы с вхождением бренда",
        "'Коммерциализация': Тип запроса (Информационный, Коммерческий, Неизвестно)",
    ];
    Sheet {
        name: GLOSSARY_SHEET.to_string(),
        headers: vec!["Пояснение".to_string()],
        rows: LINES.iter().map(|l| vec![text(l)]).collect(),
    }
}
