use std::collections::HashMap;

use crate::types::WordFrequencyRow;

/// Count whitespace-separated tokens exactly as written (case and
/// punctuation kept). Rows are sorted by descending count; ties keep the
/// order in which the words were first seen.
pub fn tabulate<'a, I>(subjects: I) -> Vec<WordFrequencyRow>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut rows: Vec<WordFrequencyRow> = Vec::new();
    for subject in subjects {
        for word in subject.split_whitespace() {
            match index.get(word) {
                Some(&i) => rows[i].count += 1,
                None => {
                    index.insert(word, rows.len());
                    rows.push(WordFrequencyRow {
                        word: word.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_map(rows: &[WordFrequencyRow]) -> HashMap<&str, usize> {
        rows.iter().map(|r| (r.word.as_str(), r.count)).collect()
    }

    #[test]
    fn counts_tokens_across_rows() {
        let rows = tabulate(["a b a", "b c"]);
        let expected: HashMap<&str, usize> = [("a", 2), ("b", 2), ("c", 1)].into_iter().collect();
        assert_eq!(as_map(&rows), expected);
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), 5);
    }

    #[test]
    fn sorted_by_descending_count() {
        let rows = tabulate(["x y", "y z", "z y"]);
        assert_eq!(rows[0].word, "y");
        assert!(rows.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(rows[1].word, "z");
    }

    #[test]
    fn tokens_are_case_sensitive_and_keep_punctuation() {
        let rows = tabulate(["Слон слон слон,"]);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.count == 1));
    }

    #[test]
    fn empty_input() {
        assert!(tabulate(std::iter::empty()).is_empty());
        assert!(tabulate(["", "   "]).is_empty());
    }
}
