use std::collections::HashSet;

use once_cell::sync::Lazy;
use tracing::info;

use crate::aggregate::AggregatedRow;

static INFORMATIONAL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "где", "зачем", "как", "какой", "какая", "какие", "какое", "каков", "когда", "который",
        "которая", "которое", "кто", "куда", "откуда", "почему", "сколько", "чей", "что",
    ]
    .into_iter()
    .collect()
});

static COMMERCIAL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "цена", "цены", "цене", "купить", "стоимость", "москва", "москве", "москвы",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandMatch {
    Match,
    NoMatch,
}

impl BrandMatch {
    pub fn label(self) -> &'static str {
        match self {
            BrandMatch::Match => "Да",
            BrandMatch::NoMatch => "Нет",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Informational,
    Commercial,
    Unknown,
}

impl Intent {
    pub fn label(self) -> &'static str {
        match self {
            Intent::Informational => "Информационный",
            Intent::Commercial => "Коммерческий",
            Intent::Unknown => "Неизвестно",
        }
    }
}

/// Split an operator-entered list like `Yandex, Яндекс, ya`. Blank entries
/// are dropped.
pub fn parse_brand_terms(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive "subject contains term" test.
pub fn classify_brand<S: AsRef<str>>(subject: &str, brand_terms: &[S]) -> BrandMatch {
    let subject = subject.to_lowercase();
    let hit = brand_terms
        .iter()
        .any(|term| subject.contains(&term.as_ref().to_lowercase()));
    if hit {
        BrandMatch::Match
    } else {
        BrandMatch::NoMatch
    }
}

/// The first whole token found in either keyword list decides the label;
/// informational keywords are checked before commercial ones.
pub fn classify_intent(subject: &str) -> Intent {
    for token in subject.split_whitespace() {
        let token = token.to_lowercase();
        if INFORMATIONAL_KEYWORDS.contains(token.as_str()) {
            return Intent::Informational;
        }
        if COMMERCIAL_KEYWORDS.contains(token.as_str()) {
            return Intent::Commercial;
        }
    }
    Intent::Unknown
}

/// Attach labels to aggregated rows. Brand labels are only added when terms
/// were supplied; intent labels only when requested.
pub fn label_rows(rows: &[AggregatedRow], brand_terms: &[String], intent: bool) -> Vec<AggregatedRow> {
    let labelled: Vec<AggregatedRow> = rows
        .iter()
        .map(|row| AggregatedRow {
            brand: (!brand_terms.is_empty()).then(|| classify_brand(&row.subject, brand_terms)),
            intent: intent.then(|| classify_intent(&row.subject)),
            ..row.clone()
        })
        .collect();
    if !brand_terms.is_empty() {
        let brand_rows = labelled
            .iter()
            .filter(|r| r.brand == Some(BrandMatch::Match))
            .count();
        info!(terms = brand_terms.len(), brand_rows, "brand classification");
    }
    labelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DerivedMetrics;

    #[test]
    fn brand_match_is_case_insensitive() {
        assert_eq!(classify_brand("YA test", &["ya"]), BrandMatch::Match);
        assert_eq!(classify_brand("купить в Яндекс Маркете", &["яндекс"]), BrandMatch::Match);
        assert_eq!(classify_brand("test", &["ya"]), BrandMatch::NoMatch);
    }

    #[test]
    fn brand_match_only_checks_subject_contains_term() {
        assert_eq!(classify_brand("ya", &["yandex"]), BrandMatch::NoMatch);
    }

    #[test]
    fn empty_brand_list_never_matches() {
        let none: [&str; 0] = [];
        assert_eq!(classify_brand("YA test", &none), BrandMatch::NoMatch);
        assert_eq!(classify_brand("", &none), BrandMatch::NoMatch);
    }

    #[test]
    fn parses_comma_separated_terms() {
        assert_eq!(parse_brand_terms(" Yandex, Яндекс ,,ya "), vec!["Yandex", "Яндекс", "ya"]);
        assert!(parse_brand_terms("   ").is_empty());
    }

    #[test]
    fn first_matching_token_decides_intent() {
        assert_eq!(classify_intent("где купить билет"), Intent::Informational);
        assert_eq!(classify_intent("купить билет где"), Intent::Commercial);
        assert_eq!(classify_intent("Цена билета"), Intent::Commercial);
        assert_eq!(classify_intent("билет в театр"), Intent::Unknown);
        assert_eq!(classify_intent(""), Intent::Unknown);
    }

    #[test]
    fn intent_matches_whole_tokens_only() {
        assert_eq!(classify_intent("покупка ценник"), Intent::Unknown);
        assert_eq!(classify_intent("каквоз"), Intent::Unknown);
    }

    #[test]
    fn label_rows_leaves_input_untouched() {
        let rows = vec![AggregatedRow {
            subject: "где купить ya".to_string(),
            query: None,
            metrics: DerivedMetrics::default(),
            brand: None,
            intent: None,
        }];
        let labelled = label_rows(&rows, &["YA".to_string()], true);
        assert_eq!(labelled[0].brand, Some(BrandMatch::Match));
        assert_eq!(labelled[0].intent, Some(Intent::Informational));
        assert_eq!(rows[0].brand, None);

        let plain = label_rows(&rows, &[], false);
        assert_eq!(plain[0].brand, None);
        assert_eq!(plain[0].intent, None);
    }
}
